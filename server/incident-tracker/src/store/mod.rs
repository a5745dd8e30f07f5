//! Incident store: domain validation over a pluggable storage backend.
//!
//! All input checks happen here, before the backend is touched, so a rejected
//! request never leaves a partial write behind. Backends only persist.

mod memory;
mod postgres;

use async_trait::async_trait;
use chrono::{SubsecRound, Utc};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::{BackendError, StoreError, ValidationError};
use crate::types::{
  CreateIncidentRequest, Incident, IncidentFilter, ListQuery, NewIncident, Severity, Status,
  UpdateStatusRequest,
};

pub use memory::MemoryBackend;
pub use postgres::PostgresBackend;

pub type BackendResult<T> = Result<T, BackendError>;

/// Storage capability the store depends on.
///
/// Implementations must allocate ids from a counter that only grows, so an id
/// is never handed out twice, even after its record is removed.
#[async_trait]
pub trait IncidentBackend: Send + Sync + 'static {
  async fn insert(&self, record: NewIncident) -> BackendResult<Incident>;
  async fn get(&self, id: i64) -> BackendResult<Option<Incident>>;
  /// Matching records in ascending id order.
  async fn list(&self, filter: IncidentFilter) -> BackendResult<Vec<Incident>>;
  /// Overwrite `status`; `None` when the id does not exist.
  async fn set_status(&self, id: i64, status: Status) -> BackendResult<Option<Incident>>;
  /// Delete and return the record; `None` when the id does not exist.
  async fn remove(&self, id: i64) -> BackendResult<Option<Incident>>;
}

/// The four incident operations plus their validation rules.
#[derive(Clone)]
pub struct IncidentStore {
  backend: Arc<dyn IncidentBackend>,
}

impl IncidentStore {
  pub fn new(backend: Arc<dyn IncidentBackend>) -> Self {
    Self { backend }
  }

  pub fn in_memory() -> Self {
    Self::new(Arc::new(MemoryBackend::new()))
  }

  pub async fn create(&self, req: CreateIncidentRequest) -> Result<Incident, StoreError> {
    let record = validate_create(req, Utc::now().trunc_subsecs(6)).inspect_err(|e| {
      warn!(error = %e, "create rejected");
    })?;
    let incident = self.backend.insert(record).await?;
    info!(id = incident.id, severity = %incident.severity, "incident created");
    Ok(incident)
  }

  pub async fn list(&self, query: ListQuery) -> Result<Vec<Incident>, StoreError> {
    let filter = validate_filter(&query).inspect_err(|e| {
      warn!(error = %e, "list rejected");
    })?;
    let incidents = self.backend.list(filter).await?;
    debug!(
      status = ?filter.status,
      severity = ?filter.severity,
      count = incidents.len(),
      "incidents listed"
    );
    Ok(incidents)
  }

  /// `body` is the outcome of decoding the request body. Unknown ids are
  /// reported before any problem with the body or the status value.
  pub async fn update_status(
    &self,
    id: i64,
    body: Result<UpdateStatusRequest, ValidationError>,
  ) -> Result<Incident, StoreError> {
    if self.backend.get(id).await?.is_none() {
      debug!(id, "update for unknown incident");
      return Err(StoreError::NotFound(id));
    }

    let status = body.and_then(|req| parse_status(req.status)).inspect_err(|e| {
      warn!(id, error = %e, "status update rejected");
    })?;

    // The record can vanish between the lookup and the write.
    let updated = self
      .backend
      .set_status(id, status)
      .await?
      .ok_or(StoreError::NotFound(id))?;
    info!(id, status = %updated.status, "incident status updated");
    Ok(updated)
  }

  pub async fn delete(&self, id: i64) -> Result<Incident, StoreError> {
    match self.backend.remove(id).await? {
      Some(removed) => {
        info!(id, "incident deleted");
        Ok(removed)
      }
      None => {
        debug!(id, "delete for unknown incident");
        Err(StoreError::NotFound(id))
      }
    }
  }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate_create(
  req: CreateIncidentRequest,
  now: chrono::DateTime<Utc>,
) -> Result<NewIncident, ValidationError> {
  let mut missing = Vec::new();
  // Absent, non-string or whitespace-only values count as missing.
  let mut take = |name: &str, value: Option<Value>| match value {
    Some(Value::String(v)) if !v.trim().is_empty() => v,
    _ => {
      missing.push(name.to_string());
      String::new()
    }
  };
  let title = take("title", req.title);
  let description = take("description", req.description);
  let reported_by = take("reported_by", req.reported_by);
  let severity = take("severity", req.severity);
  if !missing.is_empty() {
    return Err(ValidationError::MissingFields(missing));
  }

  let severity = severity
    .parse::<Severity>()
    .map_err(|e| ValidationError::InvalidSeverity(e.0))?;

  Ok(NewIncident {
    title,
    description,
    reported_by,
    severity,
    status: Status::Open,
    timestamp: now,
  })
}

/// Empty filter values are treated as absent; anything else must be a literal.
fn validate_filter(query: &ListQuery) -> Result<IncidentFilter, ValidationError> {
  let status = match query.status.as_deref() {
    None | Some("") => None,
    Some(raw) => Some(
      raw
        .parse::<Status>()
        .map_err(|e| ValidationError::InvalidStatus(e.0))?,
    ),
  };
  let severity = match query.severity.as_deref() {
    None | Some("") => None,
    Some(raw) => Some(
      raw
        .parse::<Severity>()
        .map_err(|e| ValidationError::InvalidSeverity(e.0))?,
    ),
  };
  Ok(IncidentFilter { status, severity })
}

fn parse_status(raw: Option<Value>) -> Result<Status, ValidationError> {
  match raw {
    None => Err(ValidationError::MissingFields(vec!["status".to_string()])),
    Some(Value::String(raw)) => raw
      .parse::<Status>()
      .map_err(|e| ValidationError::InvalidStatus(e.0)),
    Some(other) => Err(ValidationError::InvalidStatus(other.to_string())),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn request(title: &str, description: &str, reported_by: &str, severity: &str) -> CreateIncidentRequest {
    CreateIncidentRequest {
      title: Some(json!(title)),
      description: Some(json!(description)),
      reported_by: Some(json!(reported_by)),
      severity: Some(json!(severity)),
    }
  }

  fn status(value: Value) -> Result<UpdateStatusRequest, ValidationError> {
    Ok(UpdateStatusRequest {
      status: Some(value),
    })
  }

  #[test]
  fn create_reports_every_missing_field_in_order() {
    let req = CreateIncidentRequest {
      title: None,
      description: Some(json!("   ")),
      reported_by: Some(json!("ops")),
      severity: Some(json!(3)),
    };
    let err = validate_create(req, Utc::now()).unwrap_err();
    assert_eq!(
      err,
      ValidationError::MissingFields(vec![
        "title".to_string(),
        "description".to_string(),
        "severity".to_string(),
      ])
    );
  }

  #[test]
  fn create_rejects_unknown_severity() {
    let err = validate_create(request("t", "d", "r", "Critical"), Utc::now()).unwrap_err();
    assert_eq!(err, ValidationError::InvalidSeverity("Critical".to_string()));
  }

  #[test]
  fn create_defaults_status_and_keeps_input_verbatim() {
    let now = Utc::now();
    let record = validate_create(request(" Outage ", "d", "r", "Low"), now).unwrap();
    assert_eq!(record.title, " Outage ");
    assert_eq!(record.status, Status::Open);
    assert_eq!(record.severity, Severity::Low);
    assert_eq!(record.timestamp, now);
  }

  #[test]
  fn empty_filter_values_are_ignored() {
    let query = ListQuery {
      status: Some(String::new()),
      severity: Some("High".to_string()),
    };
    let filter = validate_filter(&query).unwrap();
    assert_eq!(filter.status, None);
    assert_eq!(filter.severity, Some(Severity::High));
  }

  #[test]
  fn unknown_filter_values_are_rejected() {
    let bad_status = ListQuery {
      status: Some("Closed".to_string()),
      severity: None,
    };
    assert!(matches!(
      validate_filter(&bad_status),
      Err(ValidationError::InvalidStatus(_))
    ));
    let bad_severity = ListQuery {
      status: None,
      severity: Some("low".to_string()),
    };
    assert!(matches!(
      validate_filter(&bad_severity),
      Err(ValidationError::InvalidSeverity(_))
    ));
  }

  #[tokio::test]
  async fn update_checks_existence_before_status() {
    let store = IncidentStore::in_memory();
    let err = store.update_status(42, status(json!("Closed"))).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound(42)));
    let err = store
      .update_status(42, Err(ValidationError::malformed("expected value")))
      .await
      .unwrap_err();
    assert!(matches!(err, StoreError::NotFound(42)));

    let created = store.create(request("t", "d", "r", "High")).await.unwrap();
    let err = store.update_status(created.id, status(json!("Closed"))).await.unwrap_err();
    assert!(matches!(err, StoreError::Validation(ValidationError::InvalidStatus(_))));
    let err = store.update_status(created.id, status(json!(3))).await.unwrap_err();
    assert!(matches!(err, StoreError::Validation(ValidationError::InvalidStatus(_))));
    let err = store
      .update_status(created.id, Ok(UpdateStatusRequest::default()))
      .await
      .unwrap_err();
    assert!(matches!(err, StoreError::Validation(ValidationError::MissingFields(_))));
    let err = store
      .update_status(created.id, Err(ValidationError::malformed("expected value")))
      .await
      .unwrap_err();
    assert!(matches!(err, StoreError::Validation(ValidationError::MalformedBody(_))));
  }

  #[tokio::test]
  async fn any_status_may_follow_any_other() {
    let store = IncidentStore::in_memory();
    let created = store.create(request("t", "d", "r", "Medium")).await.unwrap();
    for next in ["Resolved", "Open", "In Progress", "Open", "Resolved", "In Progress"] {
      let updated = store.update_status(created.id, status(json!(next))).await.unwrap();
      assert_eq!(updated.status.as_str(), next);
    }
  }
}
