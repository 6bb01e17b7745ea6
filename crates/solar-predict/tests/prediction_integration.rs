//! Integration tests for PredictionClient using wiremock.

use solar_core::error::{ErrorKind, PredictionError};
use solar_location::Coordinate;
use solar_predict::{PredictionClient, PredictionRequest};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn request(lat: f64, lon: f64, panel_area: f64) -> PredictionRequest {
    PredictionRequest::new(Coordinate::new(lat, lon).unwrap(), panel_area).unwrap()
}

fn payload(solar_energy: f64) -> serde_json::Value {
    serde_json::json!({
        "solar_irradiance": 4.56,
        "solar_energy": solar_energy,
        "panel_area": 25.0,
        "efficiency": 0.18,
        "weather": {
            "temperature": 303.15,
            "humidity": 70,
            "pressure": 1009,
            "wind_speed": 3.6,
            "temp_min": 302.0,
            "temp_max": 304.1,
            "precipitation": 0.0
        },
        "aqi": { "AQI": 92, "Category": "Satisfactory" },
        "co2_offset": 16.81
    })
}

#[tokio::test]
async fn test_predict_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/solar-prediction/"))
        .and(query_param("lat", "19.076"))
        .and(query_param("lon", "72.8777"))
        .and(query_param("panel_area", "25.0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(payload(20.5)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = PredictionClient::new(&mock_server.uri(), None).unwrap();
    let result = client.predict(&request(19.076, 72.8777, 25.0)).await.unwrap();

    assert_eq!(result.solar_energy, Some(20.5));
    assert_eq!(result.solar_irradiance, Some(4.56));
    assert_eq!(result.co2_offset, Some(16.81));
    assert_eq!(result.weather.as_ref().and_then(|w| w.wind_speed), Some(3.6));
    assert_eq!(
        result.aqi.as_ref().and_then(|a| a.category.as_deref()),
        Some("Satisfactory")
    );
}

#[tokio::test]
async fn test_predict_bad_request_surfaces_error_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/solar-prediction/"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": "Invalid or missing lat/lon/panel_area"
        })))
        .mount(&mock_server)
        .await;

    let client = PredictionClient::new(&mock_server.uri(), None).unwrap();
    let err = client
        .predict(&request(10.0, 10.0, 1.0))
        .await
        .unwrap_err();

    match &err {
        PredictionError::Status { status, message } => {
            assert_eq!(*status, 400);
            assert_eq!(message, "Invalid or missing lat/lon/panel_area");
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(err.kind(), ErrorKind::Backend);
}

#[tokio::test]
async fn test_predict_server_error_is_backend_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/solar-prediction/"))
        .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
            "error": "Could not fetch data"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = PredictionClient::new(&mock_server.uri(), None).unwrap();
    let err = client
        .predict(&request(10.0, 10.0, 1.0))
        .await
        .unwrap_err();

    assert!(matches!(err, PredictionError::Status { status: 500, .. }));
    assert_eq!(err.kind(), ErrorKind::Backend);
}

#[tokio::test]
async fn test_predict_plain_text_error_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/solar-prediction/"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&mock_server)
        .await;

    let client = PredictionClient::new(&mock_server.uri(), None).unwrap();
    let err = client
        .predict(&request(10.0, 10.0, 1.0))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        PredictionError::Status { status: 502, ref message } if message == "Bad Gateway"
    ));
}

#[tokio::test]
async fn test_predict_unparseable_body_is_backend_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/solar-prediction/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&mock_server)
        .await;

    let client = PredictionClient::new(&mock_server.uri(), None).unwrap();
    let err = client
        .predict(&request(10.0, 10.0, 1.0))
        .await
        .unwrap_err();

    assert!(matches!(err, PredictionError::InvalidResponse(_)));
    assert_eq!(err.kind(), ErrorKind::Backend);
}

#[tokio::test]
async fn test_predict_unreachable_is_backend_unreachable() {
    // Port 9 (discard) is closed on test machines
    let client = PredictionClient::new("http://127.0.0.1:9", None).unwrap();
    let err = client
        .predict(&request(10.0, 10.0, 1.0))
        .await
        .unwrap_err();

    assert!(matches!(err, PredictionError::Unreachable(_)));
    assert_eq!(err.kind(), ErrorKind::BackendUnreachable);
    assert_eq!(err.user_message(), "Backend request failed.");
}

#[tokio::test]
async fn test_predict_does_not_retry() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/solar-prediction/"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = PredictionClient::new(&mock_server.uri(), None).unwrap();
    let result = client.predict(&request(10.0, 10.0, 1.0)).await;
    assert!(result.is_err());
}
