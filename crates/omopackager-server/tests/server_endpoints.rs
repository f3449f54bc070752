use std::sync::Arc;

use omopackager_core::{PersonId, Timestamp};
use omopackager_export::{ExportConfig, Exporter, FixedClock};
use omopackager_server::{AppState, build_app, handlers::REJECTED_ROWS_HEADER, middleware::REQUEST_ID_HEADER};
use omopackager_warehouse::{InMemoryWarehouse, MeasurementRow, PersonRow};
use serde_json::Value;
use time::macros::datetime;
use tokio::task::JoinHandle;

const PATIENT: PersonId = PersonId::new(7);

fn warehouse() -> InMemoryWarehouse {
    InMemoryWarehouse::new()
        .with_person(PersonRow {
            person_id: PATIENT,
            gender_concept_id: Some(8532),
            birth_datetime: Some(Timestamp::new(datetime!(1980-02-29 00:00:00 UTC))),
            last_visit_start: None,
            has_death: false,
        })
        .with_measurements(
            PATIENT,
            [
                MeasurementRow {
                    measurement_id: 1,
                    assay_id: Some("LOINC:8867-4".into()),
                    assay_label: Some("Heart rate".into()),
                    value_as_number: Some(72.0),
                    unit_id: Some("UCUM:/min".into()),
                    unit_label: Some("per minute".into()),
                    measurement_datetime: Some(Timestamp::new(datetime!(2022-04-01 10:00:00 UTC))),
                    ..Default::default()
                },
                // No assay code; skipped
                MeasurementRow {
                    measurement_id: 2,
                    value_as_number: Some(1.0),
                    measurement_datetime: Some(Timestamp::new(datetime!(2022-04-01 10:00:00 UTC))),
                    ..Default::default()
                },
            ],
        )
}

async fn start_server() -> (String, tokio::sync::oneshot::Sender<()>, JoinHandle<()>) {
    omopackager_server::init_tracing();
    let exporter = Exporter::new(Arc::new(warehouse()), ExportConfig::new("TEST"))
        .with_clock(FixedClock(Timestamp::new(datetime!(2024-06-01 00:00:00 UTC))));
    let app = build_app(AppState::new(exporter), std::time::Duration::from_secs(10));

    // Bind to an ephemeral port
    let listener = tokio::net::TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0))
        .await
        .expect("bind");
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = tokio::sync::oneshot::channel::<()>();

    let server = tokio::spawn(async move {
        let _ = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = rx.await;
            })
            .await;
    });

    (format!("http://{addr}"), tx, server)
}

#[tokio::test]
async fn server_endpoints_work() {
    let (base, shutdown_tx, handle) = start_server().await;
    let client = reqwest::Client::new();

    // GET /
    let resp = client.get(format!("{base}/")).send().await.unwrap();
    assert!(resp.status().is_success());
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["service"], "OMOPackager");
    assert_eq!(body["status"], "ok");

    // GET /healthz
    let resp = client.get(format!("{base}/healthz")).send().await.unwrap();
    assert!(resp.status().is_success());
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "ok");

    // GET /readyz
    let resp = client.get(format!("{base}/readyz")).send().await.unwrap();
    assert!(resp.status().is_success());
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "ready");

    // shutdown
    let _ = shutdown_tx.send(());
    let _ = handle.await;
}

#[tokio::test]
async fn export_endpoint_returns_phenopacket() {
    let (base, shutdown_tx, handle) = start_server().await;
    let client = reqwest::Client::new();

    let resp = client
        .get(format!("{base}/phenopacket/7"))
        .header(REQUEST_ID_HEADER, "req-123")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::OK);
    assert_eq!(resp.headers()[REQUEST_ID_HEADER], "req-123");
    assert_eq!(resp.headers()[REJECTED_ROWS_HEADER], "1");

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["id"], "TEST:7");
    assert_eq!(body["subject"]["id"], "7");
    assert_eq!(body["subject"]["sex"], "FEMALE");
    assert!(body["subject"].get("vitalStatus").is_none());
    assert_eq!(body["measurements"].as_array().map(Vec::len), Some(1));
    assert!(body.get("medicalActions").is_none());
    assert_eq!(body["metaData"]["createdBy"], "OMOPackager");
    assert_eq!(body["metaData"]["created"], "2024-06-01T00:00:00Z");

    let _ = shutdown_tx.send(());
    let _ = handle.await;
}

#[tokio::test]
async fn export_endpoint_error_statuses() {
    let (base, shutdown_tx, handle) = start_server().await;
    let client = reqwest::Client::new();

    // Unknown person
    let resp = client.get(format!("{base}/phenopacket/404")).send().await.unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::NOT_FOUND);
    assert!(resp.headers().contains_key(REQUEST_ID_HEADER));
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "not_found");

    // Malformed id
    let resp = client.get(format!("{base}/phenopacket/abc")).send().await.unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "invalid_person_id");

    let _ = shutdown_tx.send(());
    let _ = handle.await;
}

#[tokio::test]
async fn builder_accepts_injected_warehouse() {
    let mut cfg = omopackager_server::AppConfig::default();
    cfg.server.host = "127.0.0.1".into();
    cfg.export.id_prefix = "SITE".into();
    let server = omopackager_server::ServerBuilder::new()
        .with_config(cfg)
        .with_warehouse(Arc::new(warehouse()))
        .build()
        .await;
    assert!(server.is_ok());
}
