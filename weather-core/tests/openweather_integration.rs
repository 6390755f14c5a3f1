//! Integration tests for the OpenWeather client and the fetch orchestration
//! against a mock HTTP server.

use std::sync::Arc;

use weather_core::{
    Condition, FetchError, IpGeolocator, OpenWeatherClient, SearchError, Units, ViewState,
    WeatherOrchestrator, WeatherView,
};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn current_body() -> serde_json::Value {
    serde_json::json!({
        "name": "London",
        "main": { "temp": 15.2, "feels_like": 14.8, "humidity": 70 },
        "weather": [{ "main": "Rain", "description": "light rain" }],
        "wind": { "speed": 3.1 }
    })
}

/// 40 three-hour points starting 2024-01-01 00:00:00.
fn forecast_body() -> serde_json::Value {
    let start = 1_704_067_200_i64;
    let list: Vec<_> = (0..40)
        .map(|i| {
            let dt = start + i * 3 * 3600;
            let day = 1 + i / 8;
            let hour = (i % 8) * 3;
            serde_json::json!({
                "dt": dt,
                "main": { "temp": 10.0 + i as f64, "feels_like": 9.0, "humidity": 80 },
                "weather": [{ "main": "Clouds", "description": "overcast clouds" }],
                "dt_txt": format!("2024-01-{day:02} {hour:02}:00:00"),
            })
        })
        .collect();

    serde_json::json!({ "cod": "200", "cnt": 40, "list": list, "city": { "name": "London" } })
}

async fn mount_weather(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .and(query_param("lat", "51.5074"))
        .and(query_param("lon", "-0.1278"))
        .and(query_param("units", "metric"))
        .and(query_param("appid", "KEY"))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_body()))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/forecast"))
        .and(query_param("appid", "KEY"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body()))
        .mount(server)
        .await;
}

fn orchestrator(server: &MockServer, api_key: Option<&str>) -> WeatherOrchestrator {
    let api = OpenWeatherClient::new(api_key.map(str::to_owned), server.uri(), Units::Metric);
    // Location lookups are refused, so any geolocation attempt fails loudly.
    let geo = IpGeolocator::new(format!("{}/ip", server.uri()), false);
    WeatherOrchestrator::new(Arc::new(api), Arc::new(geo))
}

#[tokio::test]
async fn test_london_end_to_end() {
    let server = MockServer::start().await;
    mount_weather(&server).await;

    let view = WeatherView::new(orchestrator(&server, Some("KEY")));
    let state = view.load(Some(51.5074), Some(-0.1278)).await;

    let report = state.report().expect("ready state");
    assert_eq!(report.snapshot.location_name, "London");
    assert_eq!(report.snapshot.temperature, 15.2);
    assert_eq!(report.snapshot.condition, Condition::Rain);
    assert_eq!(report.forecast.len(), 5);
    assert!(report.forecast.iter().all(|f| f.time_text.ends_with("12:00:00")));
    assert_eq!(report.forecast[0].time_text, "2024-01-01 12:00:00");
    assert_eq!(report.forecast[4].time_text, "2024-01-05 12:00:00");
}

#[tokio::test]
async fn test_non_success_status_is_upstream_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_body()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/data/2.5/forecast"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(serde_json::json!({ "cod": 401, "message": "Invalid API key" })),
        )
        .mount(&server)
        .await;

    let err = orchestrator(&server, Some("KEY"))
        .fetch(Some(51.5074), Some(-0.1278))
        .await
        .unwrap_err();

    match err {
        FetchError::Upstream { endpoint, message } => {
            assert_eq!(endpoint, "forecast");
            assert_eq!(message, "Invalid API key");
        }
        other => panic!("expected upstream error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_malformed_body_is_upstream_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/data/2.5/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body()))
        .mount(&server)
        .await;

    let err = orchestrator(&server, Some("KEY"))
        .fetch(Some(1.0), Some(2.0))
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::Upstream { endpoint: "current", .. }));
}

#[tokio::test]
async fn test_incomplete_current_body_is_not_ready() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "name": "London",
            "main": { "temp": 15.2 },
            "weather": []
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/data/2.5/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body()))
        .mount(&server)
        .await;

    let err = orchestrator(&server, Some("KEY"))
        .fetch(Some(51.5074), Some(-0.1278))
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Upstream { endpoint: "current", .. }), "{err:?}");

    let view = WeatherView::new(orchestrator(&server, Some("KEY")));
    let state = view.load(Some(51.5074), Some(-0.1278)).await;
    assert!(matches!(state, ViewState::Error(_)), "{state:?}");
}

#[tokio::test]
async fn test_permission_denied_makes_no_network_calls() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = orchestrator(&server, Some("KEY"))
        .fetch(None, None)
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::PermissionDenied));
    server.verify().await;
}

#[tokio::test]
async fn test_missing_api_key_makes_no_network_calls() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = orchestrator(&server, None)
        .fetch(Some(51.5074), Some(-0.1278))
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::Configuration(_)));
    server.verify().await;
}

#[tokio::test]
async fn test_device_location_used_when_allowed() {
    let server = MockServer::start().await;
    mount_weather(&server).await;

    Mock::given(method("GET"))
        .and(path("/ip"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "success",
            "lat": 51.5074,
            "lon": -0.1278
        })))
        .expect(1)
        .mount(&server)
        .await;

    let api = OpenWeatherClient::new(Some("KEY".into()), server.uri(), Units::Metric);
    let geo = IpGeolocator::new(format!("{}/ip", server.uri()), true);
    let orch = WeatherOrchestrator::new(Arc::new(api), Arc::new(geo));

    let report = orch.fetch(None, None).await.unwrap();
    assert_eq!(report.snapshot.location_name, "London");
    server.verify().await;
}

#[tokio::test]
async fn test_refresh_failure_keeps_data() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_body()))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/data/2.5/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body()))
        .mount(&server)
        .await;

    let view = WeatherView::new(orchestrator(&server, Some("KEY")));
    view.load(Some(51.5074), Some(-0.1278)).await;
    let state = view.refresh(Some(51.5074), Some(-0.1278)).await;

    match state {
        ViewState::Ready { report, notice } => {
            assert_eq!(report.snapshot.location_name, "London");
            assert_eq!(report.forecast.len(), 5);
            assert!(notice.unwrap().contains("500"));
        }
        other => panic!("expected Ready, got {other:?}"),
    }
}

#[tokio::test]
async fn test_search_returns_candidates() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/geo/1.0/direct"))
        .and(query_param("q", "Springfield"))
        .and(query_param("limit", "5"))
        .and(query_param("appid", "KEY"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {
                "name": "Springfield",
                "lat": 39.7817,
                "lon": -89.6501,
                "country": "US",
                "state": "Illinois"
            },
            {
                "name": "Springfield",
                "local_names": { "en": "Springfield" },
                "lat": 37.2153,
                "lon": -93.2982,
                "country": "US",
                "state": "Missouri"
            }
        ])))
        .mount(&server)
        .await;

    let client = OpenWeatherClient::new(Some("KEY".into()), server.uri(), Units::Metric);
    let results = client.search("  Springfield ").await.unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].state.as_deref(), Some("Illinois"));
    assert_eq!(results[1].display_name(), "Springfield, Missouri, US");
}

#[tokio::test]
async fn test_search_failure_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/geo/1.0/direct"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal"))
        .mount(&server)
        .await;

    let client = OpenWeatherClient::new(Some("KEY".into()), server.uri(), Units::Metric);
    let err = client.search("London").await.unwrap_err();

    assert!(matches!(err, SearchError::Status { .. }));
    assert_eq!(err.user_message(), "Could not fetch locations.");
}

#[tokio::test]
async fn test_search_empty_result() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/geo/1.0/direct"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&server)
        .await;

    let client = OpenWeatherClient::new(Some("KEY".into()), server.uri(), Units::Metric);
    assert!(client.search("Atlantis").await.unwrap().is_empty());
}
