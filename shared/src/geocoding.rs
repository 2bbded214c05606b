use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{instrument, trace};

pub const GOOGLE_GEOCODE_ENDPOINT: &str = "https://maps.googleapis.com/maps/api/geocode/json";

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("geocoding request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("geocoding service responded with HTTP {0}")]
    Status(StatusCode),
    #[error("geocoding service returned status {0}")]
    Api(String),
    #[error("geocoding service returned no results")]
    NoResults,
}

pub trait Geocoder {
    /// Looks up `address_query`, an address whose tokens are already joined with `+`.
    fn geocode(
        &self,
        address_query: &str,
    ) -> impl Future<Output = Result<Coordinates, GeocodeError>> + Send;
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: Coordinates,
}

impl GeocodeResponse {
    fn into_first_location(self) -> Result<Coordinates, GeocodeError> {
        match self.results.into_iter().next() {
            Some(result) => Ok(result.geometry.location),
            None if self.status == "OK" || self.status == "ZERO_RESULTS" => {
                Err(GeocodeError::NoResults)
            }
            None => Err(GeocodeError::Api(self.status)),
        }
    }
}

#[derive(Clone)]
pub struct GoogleGeocoder {
    client: reqwest::Client,
    api_key: String,
}

impl GoogleGeocoder {
    pub fn new(client: reqwest::Client, api_key: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
        }
    }

    /// Builds the lookup request for a `+`-joined address query.
    ///
    /// Form encoding turns spaces into `+`, so the tokens are passed space-separated.
    fn request(&self, address_query: &str) -> Result<reqwest::Request, reqwest::Error> {
        let address = address_query.replace('+', " ");
        self.client
            .get(GOOGLE_GEOCODE_ENDPOINT)
            .query(&[("address", address.as_str()), ("key", self.api_key.as_str())])
            .build()
    }
}

impl Geocoder for GoogleGeocoder {
    #[instrument(skip(self))]
    async fn geocode(&self, address_query: &str) -> Result<Coordinates, GeocodeError> {
        let request = self.request(address_query)?;
        let response = self.client.execute(request).await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(GeocodeError::Status(status));
        }

        let location = response
            .json::<GeocodeResponse>()
            .await?
            .into_first_location()?;
        trace!(lat = location.lat, lng = location.lng, "geocoded address");

        Ok(location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> Result<Coordinates, GeocodeError> {
        serde_json::from_value::<GeocodeResponse>(value)
            .unwrap()
            .into_first_location()
    }

    #[test]
    fn takes_first_result_location() {
        let location = parse(json!({
            "status": "OK",
            "results": [
                { "geometry": { "location": { "lat": 40.7128, "lng": -74.006 } } },
                { "geometry": { "location": { "lat": 1.0, "lng": 2.0 } } }
            ]
        }))
        .unwrap();

        assert_eq!(
            location,
            Coordinates {
                lat: 40.7128,
                lng: -74.006
            }
        );
    }

    #[test]
    fn empty_results_are_an_error() {
        let err = parse(json!({ "status": "ZERO_RESULTS", "results": [] })).unwrap_err();
        assert!(matches!(err, GeocodeError::NoResults));
    }

    #[test]
    fn denied_requests_surface_api_status() {
        let err = parse(json!({
            "status": "REQUEST_DENIED",
            "error_message": "The provided API key is invalid."
        }))
        .unwrap_err();
        assert!(matches!(err, GeocodeError::Api(status) if status == "REQUEST_DENIED"));
    }

    #[test]
    fn address_tokens_go_out_as_encoded_spaces() {
        let geocoder = GoogleGeocoder::new(reqwest::Client::new(), "k");
        let request = geocoder.request("425+Lafayette+St").unwrap();

        assert_eq!(
            request.url().as_str(),
            "https://maps.googleapis.com/maps/api/geocode/json?address=425+Lafayette+St&key=k"
        );
    }

    #[test]
    fn other_address_characters_are_escaped() {
        let geocoder = GoogleGeocoder::new(reqwest::Client::new(), "k");
        let request = geocoder.request("12-14+W+4th+St,+#2").unwrap();

        assert_eq!(
            request.url().query(),
            Some("address=12-14+W+4th+St%2C+%232&key=k")
        );
    }
}
