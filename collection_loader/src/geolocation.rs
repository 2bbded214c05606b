use shared::geocoding::{Coordinates, Geocoder};
use tracing::warn;

/// Joins the whitespace-separated tokens of `address` with `+`.
pub fn address_query(address: &str) -> String {
    address.split_whitespace().collect::<Vec<_>>().join("+")
}

/// Looks up coordinates for `address`.
///
/// Lookup failures are not errors: the establishment keeps null coordinates and the
/// failure is reported as a warning.
pub async fn resolve<G: Geocoder>(geocoder: &G, address: &str) -> Option<Coordinates> {
    let query = address_query(address);
    if query.is_empty() {
        warn!("no address to geocode, leaving coordinates unresolved");
        return None;
    }

    match geocoder.geocode(&query).await {
        Ok(coordinates) => Some(coordinates),
        Err(e) => {
            warn!(
                error = ?e,
                address,
                "failed to geocode address, leaving coordinates unresolved"
            );
            None
        }
    }
}
