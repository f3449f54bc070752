pub mod config;
pub mod handlers;
pub mod middleware;
pub mod observability;
pub mod server;

pub use config::{AppConfig, LogFormat, LoggingConfig, PostgresStorageConfig, ServerConfig, StorageConfig};
pub use observability::{init_tracing, init_tracing_with};
pub use server::{AppState, OmopackagerServer, ServerBuilder, build_app};
