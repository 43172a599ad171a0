//! `persona-server` exposes a [`persona_rag::PersonaPipeline`] over HTTP.
//! The pipeline is built once before the listener opens; `POST /ask` then
//! answers questions statelessly.

pub mod config;
pub mod error;
pub mod server;
pub mod telemetry;

pub use config::{AppConfig, ConfigError, ServerConfig};
pub use error::ApiError;
pub use server::{AppState, AskRequest, AskResponse, app_router, run_server};
pub use telemetry::init_telemetry;
