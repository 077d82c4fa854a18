//! HTTP round-trip tests against the full router on an ephemeral port,
//! backed by the in-memory store.

#![allow(clippy::panic, clippy::indexing_slicing, clippy::float_cmp)]

use std::net::SocketAddr;
use std::sync::Arc;

use reqwest::StatusCode;
use serde_json::{Value, json};
use tokio::net::TcpListener;

use fuel_ledger::api;
use fuel_ledger::app_state::AppState;
use fuel_ledger::domain::ResolutionStrategy;
use fuel_ledger::persistence::{MemoryStore, RecordStore};
use fuel_ledger::service::LedgerService;

struct TestServer {
    base: String,
    client: reqwest::Client,
}

impl TestServer {
    async fn start() -> Self {
        let service = LedgerService::new(
            Arc::new(RecordStore::Memory(MemoryStore::new())),
            ResolutionStrategy::FillToFill,
            true,
        );
        let app = api::build_router().with_state(AppState::new(service));

        let Ok(listener) = TcpListener::bind("127.0.0.1:0").await else {
            panic!("cannot bind test listener");
        };
        let Ok(addr) = listener.local_addr() else {
            panic!("listener has no address");
        };
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            base: base_url(addr),
            client: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> (StatusCode, Value) {
        let Ok(response) = request.send().await else {
            panic!("request failed");
        };
        let status = response.status();
        let body = response.json::<Value>().await.unwrap_or(Value::Null);
        (status, body)
    }

    async fn get(&self, path: &str) -> (StatusCode, Value) {
        self.send(self.client.get(self.url(path))).await
    }

    async fn post(&self, path: &str, body: &Value) -> (StatusCode, Value) {
        self.send(self.client.post(self.url(path)).json(body)).await
    }

    async fn delete(&self, path: &str) -> (StatusCode, Value) {
        self.send(self.client.delete(self.url(path))).await
    }
}

fn base_url(addr: SocketAddr) -> String {
    format!("http://{addr}")
}

fn fill_body(day: u32, odometer: u32, fuel_amount: f64, climate_control: bool) -> Value {
    json!({
        "timestamp": format!("2024-03-{day:02}T08:00:00Z"),
        "odometer": odometer,
        "fuel_amount": fuel_amount,
        "price_total": fuel_amount * 15000.0,
        "climate_control": climate_control,
    })
}

#[tokio::test]
async fn health_reports_backend_and_strategy() {
    let server = TestServer::start().await;
    let (status, body) = server.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["storage_backend"], "memory");
    assert_eq!(body["strategy"], "fill_to_fill");

    let (status, body) = server.get("/config/strategies").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn fills_resolve_scenario_a_over_http() {
    let server = TestServer::start().await;
    let (status, first) = server.post("/api/v1/fills", &fill_body(1, 1000, 8.0, true)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(first["fill"]["economy"].is_null());

    server.post("/api/v1/fills", &fill_body(5, 1400, 10.0, true)).await;
    server.post("/api/v1/fills", &fill_body(9, 1850, 12.0, false)).await;

    let (status, list) = server.get("/api/v1/fills").await;
    assert_eq!(status, StatusCode::OK);
    let data = &list["data"];
    assert_eq!(data.as_array().map(Vec::len), Some(3));
    assert!(data[0]["distance_since_prior_fill"].is_null());
    assert_eq!(data[1]["distance_since_prior_fill"], 400);
    assert_eq!(data[1]["economy"], 40.0);
    assert_eq!(data[2]["distance_since_prior_fill"], 450);
    assert_eq!(data[2]["economy"], 37.5);
}

#[tokio::test]
async fn deleting_middle_fill_remeasures_successor() {
    let server = TestServer::start().await;
    server.post("/api/v1/fills", &fill_body(1, 1000, 10.0, true)).await;
    let (_, middle) = server.post("/api/v1/fills", &fill_body(2, 1200, 10.0, true)).await;
    server.post("/api/v1/fills", &fill_body(3, 1400, 10.0, true)).await;

    let Some(id) = middle["fill"]["id"].as_str() else {
        panic!("created fill has no id");
    };
    let (status, change) = server.delete(&format!("/api/v1/fills/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(change["fill"].is_null());
    assert_eq!(change["recomputed"].as_array().map(Vec::len), Some(1));

    let (_, list) = server.get("/api/v1/fills").await;
    assert_eq!(list["data"][1]["distance_since_prior_fill"], 400);

    let (status, error) = server.delete(&format!("/api/v1/fills/{id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error["error"]["code"], 2001);
}

#[tokio::test]
async fn invalid_fill_is_rejected_with_field() {
    let server = TestServer::start().await;
    let (status, error) = server
        .post("/api/v1/fills", &fill_body(1, 1000, 0.0, false))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["error"]["code"], 1001);
    assert_eq!(error["error"]["details"], "fuel_amount");

    let (_, list) = server.get("/api/v1/fills").await;
    assert_eq!(list["data"].as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn report_shows_insufficient_partitions() {
    let server = TestServer::start().await;
    server.post("/api/v1/fills", &fill_body(1, 1000, 10.0, true)).await;
    server.post("/api/v1/fills", &fill_body(2, 1400, 10.0, true)).await;

    let (status, report) = server.get("/api/v1/report").await;
    assert_eq!(status, StatusCode::OK);
    let fills = &report["fills"];
    assert_eq!(fills["mean_economy"]["status"], "value");
    assert_eq!(fills["mean_economy"]["value"], 40.0);
    assert_eq!(fills["economy_by_climate_control"]["when_false"]["status"], "insufficient_data");
    assert!(fills["economy_by_climate_control"]["when_false"].get("value").is_none());
    assert_eq!(report["trips"]["mean_distance"]["status"], "insufficient_data");

    let (status, error) = server.get("/api/v1/report?strategy=guesswork").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["error"]["code"], 1002);

    let (status, explicit) = server.get("/api/v1/report?strategy=explicit_odometer").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(explicit["fills"]["strategy"], "explicit_odometer");
    assert_eq!(explicit["fills"]["history"], "insufficient");
}

#[tokio::test]
async fn trip_session_over_http() {
    let server = TestServer::start().await;
    let (_, session) = server.get("/api/v1/trips/session").await;
    assert_eq!(session["state"], "idle");

    let (status, session) = server
        .post("/api/v1/trips/session/start", &json!({ "start_odometer": 3000 }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(session["state"], "trip_in_progress");
    assert_eq!(session["start_odometer"], 3000);

    let (status, error) = server
        .post("/api/v1/trips/session/start", &json!({ "start_odometer": 3001 }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error["error"]["code"], 2003);

    let (status, _) = server
        .post("/api/v1/trips/session/finish", &json!({ "end_odometer": 2999 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, change) = server
        .post(
            "/api/v1/trips/session/finish",
            &json!({ "end_odometer": 3045, "climate_control_used": true, "board_remaining_range": 120 }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(change["trip"]["distance"], 45);

    let (_, session) = server.get("/api/v1/trips/session").await;
    assert_eq!(session["state"], "idle");

    let (_, trips) = server.get("/api/v1/trips").await;
    assert_eq!(trips["data"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn trip_estimates_are_labeled() {
    let server = TestServer::start().await;
    server.post("/api/v1/fills", &fill_body(1, 1000, 10.0, true)).await;
    server.post("/api/v1/fills", &fill_body(2, 1400, 10.0, true)).await;
    let (status, _) = server
        .post(
            "/api/v1/trips",
            &json!({
                "timestamp": "2024-03-03T08:00:00Z",
                "odometer_start": 1400,
                "odometer_end": 1480,
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, estimates) = server.get("/api/v1/report/trip-estimates").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(estimates["data"][0]["mode"], "historical_average");
    assert_eq!(estimates["data"][0]["estimated_fuel_used"], 2.0);
}

#[tokio::test]
async fn openapi_document_is_served() {
    let server = TestServer::start().await;
    let (status, doc) = server.get("/api-docs/openapi.json").await;
    assert_eq!(status, StatusCode::OK);
    assert!(doc["paths"].get("/api/v1/fills").is_some());
}
