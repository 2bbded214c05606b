use crate::capacity::accumulate;
use crate::error::MalformedRecordError;
use crate::geolocation::resolve;
use crate::model::Establishment;
use crate::normalize::{NormalizedRecord, normalize};
use shared::geocoding::Geocoder;
use shared::open_data::RawRecord;
use tracing::trace;

/// Builds the establishment for one raw record, geocoding its address only when the
/// record carries no coordinates of its own.
pub async fn build_establishment<G: Geocoder>(
    raw: &RawRecord,
    geocoder: &G,
) -> Result<Establishment, MalformedRecordError> {
    let NormalizedRecord {
        id,
        name,
        address,
        zipcode,
        license,
        submitted_at,
        coordinates,
        sidewalk,
        roadway,
        openstreets,
    } = normalize(raw)?;

    let coordinates = match coordinates {
        Some(coordinates) => Some(coordinates),
        None => {
            trace!(id, "record has no coordinates, geocoding address");
            resolve(geocoder, &address).await
        }
    };

    // Sidewalk and roadway seats add up
    let capacity = [&sidewalk, &roadway].into_iter().fold(0, accumulate);

    Ok(Establishment {
        id,
        name,
        address,
        zipcode,
        license,
        submitted_at,
        lat: coordinates.map(|c| c.lat),
        lng: coordinates.map(|c| c.lng),
        sidewalk,
        roadway,
        openstreets,
        capacity,
    })
}
