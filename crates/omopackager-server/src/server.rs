use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::{
    BoxError, Json, Router,
    error_handling::HandleErrorLayer,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::get,
};
use omopackager_db_postgres::PostgresWarehouse;
use omopackager_export::Exporter;
use omopackager_warehouse::DynWarehouse;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tower::{ServiceBuilder, timeout::TimeoutLayer};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::{config::AppConfig, handlers, middleware as app_middleware};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub exporter: Exporter,
    /// Fired on shutdown; in-flight exports stop with `Cancelled`.
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(exporter: Exporter) -> Self {
        Self {
            exporter,
            shutdown: CancellationToken::new(),
        }
    }
}

pub struct OmopackagerServer {
    addr: SocketAddr,
    app: Router,
    shutdown: CancellationToken,
}

pub fn build_app(state: AppState, request_timeout: Duration) -> Router {
    Router::new()
        // Health and info endpoints
        .route("/", get(handlers::root))
        .route("/healthz", get(handlers::healthz))
        .route("/readyz", get(handlers::readyz))
        .route("/phenopacket/{person_id}", get(handlers::export_phenopacket))
        .with_state(state)
        // Middleware stack, innermost first: timeout, cors, compression, trace, request id
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle_timeout_error))
                .layer(TimeoutLayer::new(request_timeout)),
        )
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    use tracing::field::Empty;
                    let req_id = req
                        .headers()
                        .get(app_middleware::REQUEST_ID_HEADER)
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or_default()
                        .to_string();
                    tracing::info_span!(
                        "http.request",
                        http.method = %req.method(),
                        http.target = %req.uri(),
                        http.status_code = Empty,
                        request_id = %req_id
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>, latency: Duration, span: &tracing::Span| {
                        span.record("http.status_code", tracing::field::display(res.status().as_u16()));
                        tracing::info!(
                            http.status = %res.status().as_u16(),
                            elapsed_ms = %latency.as_millis(),
                            "request handled"
                        );
                    },
                ),
        )
        .layer(middleware::from_fn(app_middleware::request_id))
}

async fn handle_timeout_error(err: BoxError) -> impl IntoResponse {
    if err.is::<tower::timeout::error::Elapsed>() {
        (
            StatusCode::GATEWAY_TIMEOUT,
            Json(json!({ "error": "timeout", "message": "request timed out" })),
        )
    } else {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "internal", "message": format!("unhandled internal error: {err}") })),
        )
    }
}

pub struct ServerBuilder {
    addr: SocketAddr,
    config: AppConfig,
    warehouse: Option<DynWarehouse>,
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerBuilder {
    pub fn new() -> Self {
        let cfg = AppConfig::default();
        Self {
            addr: cfg.addr(),
            config: cfg,
            warehouse: None,
        }
    }

    pub fn with_addr(mut self, addr: SocketAddr) -> Self {
        self.addr = addr;
        self
    }

    pub fn with_config(mut self, cfg: AppConfig) -> Self {
        self.addr = cfg.addr();
        self.config = cfg;
        self
    }

    /// Use this warehouse instead of connecting to PostgreSQL.
    pub fn with_warehouse(mut self, warehouse: DynWarehouse) -> Self {
        self.warehouse = Some(warehouse);
        self
    }

    pub async fn build(self) -> anyhow::Result<OmopackagerServer> {
        let warehouse: DynWarehouse = match self.warehouse {
            Some(w) => w,
            None => {
                let pg = PostgresWarehouse::new(self.config.storage.postgres.to_backend_config()).await?;
                Arc::new(pg)
            }
        };
        tracing::info!(
            backend = warehouse.backend_name(),
            id_prefix = %self.config.export.id_prefix,
            worker_pool_size = self.config.export.worker_pool_size,
            "exporter ready"
        );

        let state = AppState::new(Exporter::new(warehouse, self.config.export.clone()));
        let shutdown = state.shutdown.clone();
        let app = build_app(state, self.config.request_timeout());

        Ok(OmopackagerServer {
            addr: self.addr,
            app,
            shutdown,
        })
    }
}

impl OmopackagerServer {
    pub async fn run(self) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        tracing::info!("listening on {}", self.addr);
        let shutdown = self.shutdown.clone();
        axum::serve(listener, self.app)
            .with_graceful_shutdown(async move {
                shutdown_signal().await;
                shutdown.cancel();
            })
            .await?;
        Ok(())
    }
}

async fn shutdown_signal() {
    // Wait for Ctrl+C
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
