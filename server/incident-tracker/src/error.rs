//! Structured error types for the incident tracker.

use thiserror::Error;

use crate::types::{literal_list, Severity, Status};

/// Input rejected before any write is attempted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
  #[error("missing required field(s): {}", .0.join(", "))]
  MissingFields(Vec<String>),

  #[error("invalid severity: {0:?}")]
  InvalidSeverity(String),

  #[error("invalid status: {0:?}")]
  InvalidStatus(String),

  #[error("malformed body: {0}")]
  MalformedBody(String),
}

impl ValidationError {
  pub fn malformed(msg: impl Into<String>) -> Self {
    Self::MalformedBody(msg.into())
  }

  /// Human-readable hint listing the accepted values, when there is one.
  pub fn hint(&self) -> Option<String> {
    match self {
      Self::InvalidSeverity(_) => Some(format!(
        "Severity must be one of: {}",
        literal_list(&Severity::ALL, Severity::as_str)
      )),
      Self::InvalidStatus(_) => Some(format!(
        "Status must be one of: {}",
        literal_list(&Status::ALL, Status::as_str)
      )),
      Self::MalformedBody(detail) => Some(detail.clone()),
      Self::MissingFields(_) => None,
    }
  }
}

/// Failure inside a storage backend.
#[derive(Debug, Error)]
pub enum BackendError {
  #[error("database: {0}")]
  Database(#[from] sqlx_core::Error),

  #[error("corrupt record {id}: {reason}")]
  Corrupt { id: i64, reason: String },
}

impl BackendError {
  pub fn corrupt(id: i64, reason: impl Into<String>) -> Self {
    Self::Corrupt {
      id,
      reason: reason.into(),
    }
  }
}

/// Errors surfaced by `IncidentStore` operations.
#[derive(Debug, Error)]
pub enum StoreError {
  #[error("validation: {0}")]
  Validation(#[from] ValidationError),

  #[error("incident not found: {0}")]
  NotFound(i64),

  #[error("backend: {0}")]
  Backend(#[from] BackendError),
}

/// Errors while loading configuration from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("invalid {var}: {value:?}: {reason}")]
  Invalid {
    var: &'static str,
    value: String,
    reason: String,
  },
}

impl ConfigError {
  pub fn invalid(var: &'static str, value: &str, reason: impl ToString) -> Self {
    Self::Invalid {
      var,
      value: value.to_string(),
      reason: reason.to_string(),
    }
  }
}
