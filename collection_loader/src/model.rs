use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared::geocoding::Coordinates;
use shared::store::{DocumentRef, Fields};

pub const ESTABLISHMENTS_COLLECTION: &str = "establishments";

/// A sidewalk or roadway seating footprint. Dimensions are in feet and only present
/// when the area is approved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatingArea {
    pub status: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
}

impl SeatingArea {
    pub const fn inactive() -> Self {
        Self {
            status: false,
            length: None,
            width: None,
        }
    }

    pub const fn active(length: u32, width: u32) -> Self {
        Self {
            status: true,
            length: Some(length),
            width: Some(width),
        }
    }

    /// `(length, width)` of an approved area.
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        if self.status {
            self.length.zip(self.width)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenStreets {
    pub status: bool,
}

/// An outdoor dining establishment as stored in the document collection.
///
/// `id` is the document key and is not part of the stored fields. Field order here is
/// the stored field order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Establishment {
    #[serde(skip)]
    pub id: String,
    pub name: String,
    pub address: String,
    pub zipcode: String,
    pub license: String,
    pub submitted_at: DateTime<Utc>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub sidewalk: SeatingArea,
    pub roadway: SeatingArea,
    pub openstreets: OpenStreets,
    pub capacity: u32,
}

impl Establishment {
    pub fn coordinates(&self) -> Option<Coordinates> {
        self.lat
            .zip(self.lng)
            .map(|(lat, lng)| Coordinates { lat, lng })
    }

    pub fn document_ref(&self, collection: &str) -> DocumentRef {
        DocumentRef::new(collection, self.id.clone())
    }

    pub fn to_fields(&self) -> Result<Fields, serde_json::Error> {
        match serde_json::to_value(self)? {
            Value::Object(fields) => Ok(fields),
            _ => Err(serde::ser::Error::custom(
                "establishment did not serialize to an object",
            )),
        }
    }

    pub fn from_document(
        id: impl Into<String>,
        fields: Fields,
    ) -> Result<Self, serde_json::Error> {
        let mut establishment: Self = serde_json::from_value(Value::Object(fields))?;
        establishment.id = id.into();
        Ok(establishment)
    }
}
