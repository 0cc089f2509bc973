pub mod client;
pub mod config;
pub mod errors;
pub mod metrics;
pub mod routes;

pub use client::{ClientError, DEFAULT_API_URL, DealflowClient};
pub use config::{AppConfig, LogFormat};
pub use errors::ApiError;
pub use metrics::{Metrics, MetricsSnapshot};
pub use routes::{AppState, build_router};
