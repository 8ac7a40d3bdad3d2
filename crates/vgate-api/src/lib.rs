//! Axum HTTP API server.
//!
//! This crate provides:
//! - `POST /uploads`: multipart intake and synchronous job dispatch
//! - `GET /tch`: a static HTML page
//! - Health, readiness and Prometheus metrics endpoints

pub mod config;
pub mod dispatch;
pub mod error;
pub mod handlers;
pub mod intake;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use dispatch::JobDispatcher;
pub use error::{ApiError, ApiResult};
pub use intake::{Intake, StoredUpload};
pub use routes::create_router;
pub use state::AppState;
