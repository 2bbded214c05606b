use crate::error::MalformedRecordError;
use crate::model::{OpenStreets, SeatingArea};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;
use shared::geocoding::Coordinates;
use shared::open_data::RawRecord;

const SUBMISSION_PARSE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Canonical attributes of one raw record, before geocoding and capacity estimation.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRecord {
    pub id: String,
    pub name: String,
    pub address: String,
    pub zipcode: String,
    pub license: String,
    pub submitted_at: DateTime<Utc>,
    pub coordinates: Option<Coordinates>,
    pub sidewalk: SeatingArea,
    pub roadway: SeatingArea,
    pub openstreets: OpenStreets,
}

pub fn normalize(raw: &RawRecord) -> Result<NormalizedRecord, MalformedRecordError> {
    let id = required_str(raw, "globalid")?.trim_matches(['{', '}']);
    if id.is_empty() {
        return Err(MalformedRecordError::EmptyField("globalid"));
    }

    let submitted = required_str(raw, "time_of_submission")?;
    let submitted_at = NaiveDateTime::parse_from_str(submitted, SUBMISSION_PARSE_FORMAT)
        .map_err(|source| MalformedRecordError::InvalidTimestamp {
            value: submitted.to_string(),
            source,
        })?
        .and_utc();

    let mut record = NormalizedRecord {
        id: id.to_string(),
        name: required_str(raw, "doing_business_as_dba")?.to_string(),
        address: required_str(raw, "business_address")?.to_string(),
        zipcode: required_str(raw, "zip")?.to_string(),
        license: required_str(raw, "sla_license_type")?.to_string(),
        submitted_at,
        coordinates: None,
        sidewalk: SeatingArea::inactive(),
        roadway: SeatingArea::inactive(),
        openstreets: OpenStreets::default(),
    };

    if flag_equals(raw, "approved_for_sidewalk_seating", "yes") {
        record.sidewalk = SeatingArea::active(
            required_dimension(raw, "sidewalk_dimensions_length")?,
            required_dimension(raw, "sidewalk_dimensions_width")?,
        );
    }

    if flag_equals(raw, "approved_for_roadway_seating", "yes") {
        record.roadway = SeatingArea::active(
            required_dimension(raw, "roadway_dimensions_length")?,
            required_dimension(raw, "roadway_dimensions_width")?,
        );
    }

    if flag_equals(raw, "seating_interest_sidewalk", "openstreets") {
        record.openstreets.status = true;
    }

    // `latitude` and `longitude` arrive together
    if raw.contains_key("latitude") {
        record.coordinates = Some(Coordinates {
            lat: required_float(raw, "latitude")?,
            lng: required_float(raw, "longitude")?,
        });
    }

    Ok(record)
}

fn required<'a>(
    raw: &'a RawRecord,
    field: &'static str,
) -> Result<&'a Value, MalformedRecordError> {
    match raw.get(field) {
        None | Some(Value::Null) => Err(MalformedRecordError::MissingField(field)),
        Some(value) => Ok(value),
    }
}

fn required_str<'a>(
    raw: &'a RawRecord,
    field: &'static str,
) -> Result<&'a str, MalformedRecordError> {
    required(raw, field)?
        .as_str()
        .ok_or(MalformedRecordError::WrongType {
            field,
            expected: "string",
        })
}

fn required_dimension(raw: &RawRecord, field: &'static str) -> Result<u32, MalformedRecordError> {
    let invalid = |value: &Value| MalformedRecordError::InvalidInteger {
        field,
        value: value.to_string(),
    };
    match required(raw, field)? {
        Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| MalformedRecordError::InvalidInteger {
                field,
                value: s.clone(),
            }),
        value @ Value::Number(n) => n
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .ok_or_else(|| invalid(value)),
        value => Err(invalid(value)),
    }
}

fn required_float(raw: &RawRecord, field: &'static str) -> Result<f64, MalformedRecordError> {
    let value = required(raw, field)?;
    let parsed = match value {
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Number(n) => n.as_f64(),
        _ => None,
    };
    parsed
        .filter(|f| f.is_finite())
        .ok_or_else(|| MalformedRecordError::InvalidFloat {
            field,
            value: value.to_string(),
        })
}

fn flag_equals(raw: &RawRecord, field: &str, expected: &str) -> bool {
    matches!(raw.get(field), Some(Value::String(s)) if s == expected)
}
