//! Incident Tracker API
//!
//! REST service for internal operational incidents: create, list/filter,
//! update status, and delete. Validation lives in the store; the HTTP layer
//! only translates requests and responses.

pub mod config;
pub mod error;
pub mod handlers;
pub mod store;
pub mod types;

use axum::{
  routing::{get, patch},
  Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use config::Config;
pub use error::{BackendError, ConfigError, StoreError, ValidationError};
pub use store::{IncidentBackend, IncidentStore, MemoryBackend, PostgresBackend};
pub use types::{Incident, Severity, Status};

/// Build the full HTTP surface around a store.
pub fn router(store: IncidentStore) -> Router {
  Router::new()
    .route("/health", get(handlers::health))
    .route(
      "/incidents",
      get(handlers::list_incidents).post(handlers::create_incident),
    )
    .route(
      "/incidents/:id",
      patch(handlers::update_incident).delete(handlers::delete_incident),
    )
    .layer(TraceLayer::new_for_http())
    .layer(CorsLayer::permissive())
    .with_state(store)
}
