//! Nominatim / OpenStreetMap geocoder client.
//!
//! The public instance requires an identifying `User-Agent` and allows at
//! most one request per second. The client sets the header; spacing the
//! requests is the caller's job (see [`crate::rate_limit`]).
//!
//! See <https://nominatim.org/release-docs/develop/api/Search/>

use std::time::Duration;

use async_trait::async_trait;
use trip_map_itinerary_models::Coordinates;

use crate::service_registry::{GeocodingService, ProviderConfig};
use crate::{GeocodeError, GeocodedPlace, PlaceLookup};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// A [`PlaceLookup`] backed by a Nominatim search endpoint.
#[derive(Debug, Clone)]
pub struct NominatimClient {
    client: reqwest::Client,
    base_url: String,
}

impl NominatimClient {
    /// Builds a client that sends `user_agent` with every request.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::Http`] if the HTTP client cannot be built.
    pub fn new(base_url: &str, user_agent: &str) -> Result<Self, GeocodeError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
        })
    }

    /// Builds a client from a service registry entry.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::Http`] if the HTTP client cannot be built.
    pub fn from_service(service: &GeocodingService) -> Result<Self, GeocodeError> {
        match &service.provider {
            ProviderConfig::Nominatim {
                base_url,
                user_agent,
                ..
            } => Self::new(base_url, user_agent),
        }
    }
}

#[async_trait]
impl PlaceLookup for NominatimClient {
    async fn lookup(&self, query: &str) -> Result<Option<GeocodedPlace>, GeocodeError> {
        geocode_freeform(&self.client, &self.base_url, query).await
    }
}

/// Geocodes a free-form place name using Nominatim.
///
/// # Errors
///
/// Returns [`GeocodeError`] if the HTTP request or response parsing fails.
pub async fn geocode_freeform(
    client: &reqwest::Client,
    base_url: &str,
    query: &str,
) -> Result<Option<GeocodedPlace>, GeocodeError> {
    let resp = client
        .get(base_url)
        .query(&[("q", query), ("format", "jsonv2"), ("limit", "1")])
        .send()
        .await?;

    let status = resp.status();
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return Err(GeocodeError::RateLimited);
    }
    if !status.is_success() {
        return Err(GeocodeError::Status { status });
    }

    let body: serde_json::Value = resp.json().await?;
    parse_response(&body)
}

/// Parses a Nominatim JSON response, keeping only the first result.
fn parse_response(body: &serde_json::Value) -> Result<Option<GeocodedPlace>, GeocodeError> {
    let results = body.as_array().ok_or_else(|| GeocodeError::Parse {
        message: "Nominatim response is not an array".to_string(),
    })?;

    let Some(first) = results.first() else {
        return Ok(None);
    };

    let latitude = parse_coordinate(first, "lat")?;
    let longitude = parse_coordinate(first, "lon")?;
    let display_name = first["display_name"].as_str().map(String::from);

    Ok(Some(GeocodedPlace {
        coordinates: Coordinates::new(latitude, longitude),
        display_name,
    }))
}

/// Nominatim encodes coordinates as strings; accept plain numbers too.
fn parse_coordinate(result: &serde_json::Value, field: &str) -> Result<f64, GeocodeError> {
    let value = &result[field];
    value
        .as_str()
        .and_then(|s| s.parse::<f64>().ok())
        .or_else(|| value.as_f64())
        .ok_or_else(|| GeocodeError::Parse {
            message: format!("Missing {field} in Nominatim response"),
        })
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt as _, AsyncWriteExt as _};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    use super::*;

    const USER_AGENT: &str = "trip-map-test/1.0";

    /// Serves a single canned HTTP response and hands back the raw request.
    async fn serve_once(status_line: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}/search", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut chunk = [0_u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&chunk[..n]);
            }

            let response = format!(
                "HTTP/1.1 {status_line}\r\ncontent-type: application/json\r\n\
                 content-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).await.unwrap();
            stream.shutdown().await.ok();
            String::from_utf8_lossy(&request).into_owned()
        });

        (base_url, handle)
    }

    #[tokio::test]
    async fn sends_encoded_query_and_user_agent() {
        let (base_url, server) =
            serve_once("200 OK", r#"[{"lat":"48.2083537","lon":"16.3725042"}]"#).await;
        let client = NominatimClient::new(&base_url, USER_AGENT).unwrap();

        let place = client.lookup("Vienna, Austria").await.unwrap().unwrap();
        assert!((place.coordinates.latitude - 48.208_353_7).abs() < 1e-6);

        let request = server.await.unwrap();
        let request_line = request.lines().next().unwrap();
        assert!(request_line.starts_with("GET /search?"), "{request_line}");
        assert!(
            request_line.contains("q=Vienna%2C+Austria")
                || request_line.contains("q=Vienna%2C%20Austria"),
            "{request_line}"
        );
        assert!(request_line.contains("format=jsonv2"), "{request_line}");
        assert!(
            request
                .to_lowercase()
                .contains(&format!("user-agent: {USER_AGENT}")),
            "{request}"
        );
    }

    #[tokio::test]
    async fn no_results_is_none() {
        let (base_url, server) = serve_once("200 OK", "[]").await;
        let client = NominatimClient::new(&base_url, USER_AGENT).unwrap();

        assert!(client.lookup("Atlantis").await.unwrap().is_none());
        server.await.unwrap();
    }

    #[tokio::test]
    async fn too_many_requests_is_rate_limited() {
        let (base_url, server) = serve_once("429 Too Many Requests", "[]").await;
        let client = NominatimClient::new(&base_url, USER_AGENT).unwrap();

        let result = client.lookup("Vienna, Austria").await;
        assert!(matches!(result, Err(GeocodeError::RateLimited)), "{result:?}");
        server.await.unwrap();
    }

    #[tokio::test]
    async fn server_error_is_a_status_error() {
        let (base_url, server) = serve_once("503 Service Unavailable", "").await;
        let client = NominatimClient::new(&base_url, USER_AGENT).unwrap();

        let result = client.lookup("Vienna, Austria").await;
        assert!(
            matches!(
                result,
                Err(GeocodeError::Status { status }) if status == reqwest::StatusCode::SERVICE_UNAVAILABLE
            ),
            "{result:?}"
        );
        server.await.unwrap();
    }

    #[test]
    fn parses_nominatim_result() {
        let body = serde_json::json!([{
            "lat": "48.2083537",
            "lon": "16.3725042",
            "display_name": "Wien, Österreich"
        }, {
            "lat": "0",
            "lon": "0"
        }]);
        let result = parse_response(&body).unwrap().unwrap();
        assert!((result.coordinates.latitude - 48.208_353_7).abs() < 1e-6);
        assert!((result.coordinates.longitude - 16.372_504_2).abs() < 1e-6);
        assert_eq!(result.display_name.as_deref(), Some("Wien, Österreich"));
    }

    #[test]
    fn parses_numeric_coordinates() {
        let body = serde_json::json!([{ "lat": 48.8566, "lon": 2.3522 }]);
        let result = parse_response(&body).unwrap().unwrap();
        assert!((result.coordinates.latitude - 48.8566).abs() < 1e-9);
        assert_eq!(result.display_name, None);
    }

    #[test]
    fn parses_nominatim_empty() {
        let body = serde_json::json!([]);
        assert!(parse_response(&body).unwrap().is_none());
    }

    #[test]
    fn rejects_non_array_body() {
        let body = serde_json::json!({ "error": "Unable to geocode" });
        assert!(matches!(
            parse_response(&body),
            Err(GeocodeError::Parse { .. })
        ));
    }

    #[test]
    fn rejects_result_without_lat() {
        let body = serde_json::json!([{ "lon": "2.35" }]);
        assert!(parse_response(&body).is_err());
    }
}
