//! Router-level tests against a mock database.

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use chrono::{FixedOffset, TimeZone};
use sea_orm::{DatabaseBackend, DatabaseConnection, DbErr, MockDatabase, Transaction, Value};
use serde_json::Value as Json;
use std::collections::BTreeMap;
use std::sync::Arc;
use tower::ServiceExt;

use fukuoka_data_api::common::AppState;
use fukuoka_data_api::config::{Config, Deployment};
use fukuoka_data_api::routes::build_router;

type Row = BTreeMap<&'static str, Value>;

fn test_config() -> Config {
    Config {
        database_url: "postgres://unused".to_string(),
        api_host: "127.0.0.1".to_string(),
        api_port: 3000,
        api_base_url: "http://localhost:3000".to_string(),
        disable_rate_limiting: true,
        rate_limit_replenish_ms: 100,
        rate_limit_burst: 60,
        deployment: Deployment::Local,
    }
}

fn mock(db: MockDatabase) -> Arc<DatabaseConnection> {
    Arc::new(db.into_connection())
}

fn app(db: &Arc<DatabaseConnection>) -> Router {
    build_router(AppState::new(Arc::clone(db), test_config()))
}

/// Statements issued so far. Call once the router has been dropped.
fn transaction_log(db: Arc<DatabaseConnection>) -> Vec<Transaction> {
    Arc::try_unwrap(db)
        .ok()
        .expect("router still holds the connection")
        .into_transaction_log()
}

async fn get(app: Router, uri: &str) -> (StatusCode, Json) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Json::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Json::Null)
    };
    (status, body)
}

fn measurement_row(id: i32, hour: i32, value: Option<f64>) -> Row {
    BTreeMap::from([
        ("id", Value::from(id)),
        ("date", Value::from(20_230_401)),
        ("hour", Value::from(hour)),
        ("value", Value::Double(value)),
        ("unit", Value::from("ppm")),
        ("lat", Value::from(33.66_f64)),
        ("lng", Value::from(130.44_f64)),
        ("station", Value::from("kashii")),
        ("station_kanji", Value::from("香椎")),
        ("measurement_type", Value::from("no2")),
        ("measurement_type_kanji", Value::from("二酸化窒素")),
    ])
}

fn dam_level_row(id: i32, hour: u32, value: i32) -> Row {
    let observed = FixedOffset::east_opt(0)
        .unwrap()
        .with_ymd_and_hms(2025, 8, 9, hour, 0, 0)
        .unwrap();
    BTreeMap::from([
        ("id", Value::from(id)),
        ("dam_id", Value::from(8)),
        ("dam_name", Value::from("Ino")),
        ("dam_name_jp", Value::from("猪野ダム")),
        ("observation_time", Value::from(observed)),
        ("dam_value", Value::from(value)),
    ])
}


#[tokio::test]
async fn measurements_are_returned_in_camel_case() {
    let db = mock(MockDatabase::new(DatabaseBackend::Postgres).append_query_results([vec![
        measurement_row(1, 1, Some(0.012)),
        measurement_row(2, 2, None),
    ]]));

    let (status, body) = get(app(&db), "/measurements?station=kashii&type=no2&date=20230401").await;

    assert_eq!(status, StatusCode::OK);
    let rows = body.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["stationKanji"], "香椎");
    assert_eq!(rows[0]["measurementType"], "no2");
    assert_eq!(rows[0]["value"], 0.012);
    assert!(rows[1]["value"].is_null());

    let log = format!("{:?}", transaction_log(db));
    assert!(log.contains("INNER JOIN"), "{log}");
    assert!(log.contains("LIMIT"), "{log}");
}

#[tokio::test]
async fn invalid_date_is_rejected_before_querying() {
    let db = mock(MockDatabase::new(DatabaseBackend::Postgres));

    let (status, body) = get(app(&db), "/measurements?date=19991231").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid date");
    assert!(transaction_log(db).is_empty());
}

#[tokio::test]
async fn non_numeric_limit_is_rejected() {
    let db = mock(MockDatabase::new(DatabaseBackend::Postgres));

    let (status, body) = get(app(&db), "/measurements?limit=ten").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("limit"));
}

#[tokio::test]
async fn repeated_parameter_is_a_json_400() {
    let db = mock(MockDatabase::new(DatabaseBackend::Postgres));

    let (status, body) = get(app(&db), "/measurements?limit=1&limit=2").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("limit"), "{body}");

    let (status, body) = get(app(&db), "/dams?dam=ino&dam=egawa").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string(), "{body}");
    assert!(transaction_log(db).is_empty());
}

#[tokio::test]
async fn empty_result_is_not_found() {
    let db = mock(MockDatabase::new(DatabaseBackend::Postgres).append_query_results([Vec::<Row>::new()]));

    let (status, body) = get(app(&db), "/measurements?station=nowhere").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "No data found");
}

#[tokio::test]
async fn database_failure_is_a_generic_500() {
    let db = mock(
        MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_errors([DbErr::Custom("connection reset".to_string())]),
    );

    let (status, body) = get(app(&db), "/measurements").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Internal server error");
    assert!(!body.to_string().contains("connection reset"));
}

#[tokio::test]
async fn dam_levels_newest_first() {
    let db = mock(
        MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![BTreeMap::from([("id", Value::from(8))])]])
            .append_query_results([vec![dam_level_row(12, 10, 91), dam_level_row(11, 9, 90)]]),
    );

    let (status, body) = get(app(&db), "/dams?dam=ino&date=20250809").await;

    assert_eq!(status, StatusCode::OK);
    let rows = body.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["damName"], "Ino");
    assert_eq!(rows[0]["damNameJp"], "猪野ダム");
    assert_eq!(rows[0]["damValue"], 91);
    assert_eq!(rows[0]["observationTime"], "2025-08-09T10:00:00Z");

    let log = transaction_log(db);
    assert_eq!(log.len(), 2);
    let levels_query = format!("{:?}", log[1]);
    assert!(levels_query.contains("DESC"), "{levels_query}");
}

#[tokio::test]
async fn unknown_dam_skips_the_levels_query() {
    let db = mock(MockDatabase::new(DatabaseBackend::Postgres).append_query_results([Vec::<Row>::new()]));

    let (status, body) = get(app(&db), "/dams?dam=999999").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "No data found");
    assert_eq!(transaction_log(db).len(), 1);
}

#[tokio::test]
async fn malformed_dam_date_is_rejected() {
    let db = mock(MockDatabase::new(DatabaseBackend::Postgres));

    let (status, body) = get(app(&db), "/dams?date=2025-08-09").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid date format");
}

#[tokio::test]
async fn healthz_reports_ok() {
    let db = mock(MockDatabase::new(DatabaseBackend::Postgres));

    let (status, _) = get(app(&db), "/healthz").await;

    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn healthz_unavailable_without_database() {
    let db = Arc::new(DatabaseConnection::Disconnected);

    let (status, body) = get(app(&db), "/healthz").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "Database unavailable");
}

#[tokio::test]
async fn openapi_lists_known_codes() {
    let db = mock(MockDatabase::new(DatabaseBackend::Postgres));

    let (status, body) = get(app(&db), "/openapi.json").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/measurements"].is_object());
    assert!(body["paths"]["/dams"].is_object());
    let doc = body.to_string();
    assert!(doc.contains("kashii"));
    assert!(doc.contains("pm25"));
}

#[tokio::test]
async fn doc_index_lists_endpoints() {
    let db = mock(MockDatabase::new(DatabaseBackend::Postgres));

    let (status, body) = get(app(&db), "/doc").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["endpoints"].as_array().unwrap().len(), 5);
}
