//! Core types for the incident tracker (JSON contracts + domain model).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Severity / Status (closed sets)
// ---------------------------------------------------------------------------

/// Priority label. Matching is case-sensitive against the canonical literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
  Low,
  Medium,
  High,
}

impl Severity {
  pub const ALL: [Severity; 3] = [Self::Low, Self::Medium, Self::High];

  pub fn as_str(self) -> &'static str {
    match self {
      Self::Low => "Low",
      Self::Medium => "Medium",
      Self::High => "High",
    }
  }
}

impl FromStr for Severity {
  type Err = UnknownLiteral;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Self::ALL
      .into_iter()
      .find(|v| v.as_str() == s)
      .ok_or_else(|| UnknownLiteral(s.to_string()))
  }
}

impl fmt::Display for Severity {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Lifecycle label. Any value may follow any other; there is no workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
  Open,
  #[serde(rename = "In Progress")]
  InProgress,
  Resolved,
}

impl Status {
  pub const ALL: [Status; 3] = [Self::Open, Self::InProgress, Self::Resolved];

  pub fn as_str(self) -> &'static str {
    match self {
      Self::Open => "Open",
      Self::InProgress => "In Progress",
      Self::Resolved => "Resolved",
    }
  }
}

impl FromStr for Status {
  type Err = UnknownLiteral;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Self::ALL
      .into_iter()
      .find(|v| v.as_str() == s)
      .ok_or_else(|| UnknownLiteral(s.to_string()))
  }
}

impl fmt::Display for Status {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// A string that is not one of an enum's canonical literals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownLiteral(pub String);

/// Join canonical literals for error messages ("Low, Medium, High").
pub fn literal_list<T: Copy>(values: &[T], as_str: fn(T) -> &'static str) -> String {
  values.iter().map(|v| as_str(*v)).collect::<Vec<_>>().join(", ")
}

// ---------------------------------------------------------------------------
// Incident
// ---------------------------------------------------------------------------

/// A tracked operational issue. Only `status` changes after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Incident {
  pub id: i64,
  pub title: String,
  pub description: String,
  pub reported_by: String,
  pub severity: Severity,
  pub status: Status,
  pub timestamp: DateTime<Utc>,
}

/// Validated record handed to a backend for insertion; the backend assigns `id`.
#[derive(Debug, Clone)]
pub struct NewIncident {
  pub title: String,
  pub description: String,
  pub reported_by: String,
  pub severity: Severity,
  pub status: Status,
  pub timestamp: DateTime<Utc>,
}

impl NewIncident {
  pub fn into_incident(self, id: i64) -> Incident {
    Incident {
      id,
      title: self.title,
      description: self.description,
      reported_by: self.reported_by,
      severity: self.severity,
      status: self.status,
      timestamp: self.timestamp,
    }
  }
}

/// Validated list filter; `None` fields match everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IncidentFilter {
  pub status: Option<Status>,
  pub severity: Option<Severity>,
}

impl IncidentFilter {
  pub fn matches(&self, incident: &Incident) -> bool {
    self.status.map_or(true, |s| incident.status == s)
      && self.severity.map_or(true, |s| incident.severity == s)
  }
}

// ---------------------------------------------------------------------------
// Inbound types (JSON contract: what the client sends)
// ---------------------------------------------------------------------------

/// POST /incidents body. Fields are raw JSON values so that a wrong type is
/// reported by the store as a missing field, together with all the others.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateIncidentRequest {
  #[serde(default)]
  pub title: Option<Value>,
  #[serde(default)]
  pub description: Option<Value>,
  #[serde(default)]
  pub reported_by: Option<Value>,
  #[serde(default)]
  pub severity: Option<Value>,
}

/// PATCH /incidents/{id} body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateStatusRequest {
  #[serde(default)]
  pub status: Option<Value>,
}

/// GET /incidents query string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
  #[serde(default)]
  pub status: Option<String>,
  #[serde(default)]
  pub severity: Option<String>,
}

// ---------------------------------------------------------------------------
// Output types (JSON contract: what we send back)
// ---------------------------------------------------------------------------

/// Structured error body for every non-2xx response.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
  pub error: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub message: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub missing: Option<Vec<String>>,
}

impl ErrorBody {
  pub fn new(error: impl Into<String>) -> Self {
    Self {
      error: error.into(),
      message: None,
      missing: None,
    }
  }

  pub fn with_message(mut self, message: impl Into<String>) -> Self {
    self.message = Some(message.into());
    self
  }

  pub fn with_missing(mut self, missing: Vec<String>) -> Self {
    self.missing = Some(missing);
    self
  }
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteConfirmation {
  pub message: String,
  pub deleted_incident: Incident,
}
