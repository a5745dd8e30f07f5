//! HTTP handlers for the incident tracker.
//!
//! Each route delegates to exactly one store operation; this layer only
//! translates request shapes in and store results/errors out.

use axum::{
  extract::{rejection::JsonRejection, Path, Query, State},
  http::StatusCode,
  response::{IntoResponse, Response},
  Json,
};
use tracing::error;

use crate::error::{StoreError, ValidationError};
use crate::store::IncidentStore;
use crate::types::{
  CreateIncidentRequest, DeleteConfirmation, ErrorBody, Incident, ListQuery, UpdateStatusRequest,
};

pub async fn health() -> &'static str {
  "ok"
}

pub async fn create_incident(
  State(store): State<IncidentStore>,
  payload: Result<Json<CreateIncidentRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Incident>), ApiError> {
  let Json(req) = payload.map_err(malformed)?;
  let incident = store.create(req).await?;
  Ok((StatusCode::CREATED, Json(incident)))
}

pub async fn list_incidents(
  State(store): State<IncidentStore>,
  Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Incident>>, ApiError> {
  Ok(Json(store.list(query).await?))
}

pub async fn update_incident(
  State(store): State<IncidentStore>,
  Path(raw_id): Path<String>,
  payload: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> Result<Json<Incident>, ApiError> {
  let id = parse_id(&raw_id)?;
  // Body problems are reported by the store, after it has resolved the id.
  let body = payload
    .map(|Json(req)| req)
    .map_err(|rejection| ValidationError::malformed(rejection.body_text()));
  Ok(Json(store.update_status(id, body).await?))
}

pub async fn delete_incident(
  State(store): State<IncidentStore>,
  Path(raw_id): Path<String>,
) -> Result<Json<DeleteConfirmation>, ApiError> {
  let id = parse_id(&raw_id)?;
  let deleted_incident = store.delete(id).await?;
  Ok(Json(DeleteConfirmation {
    message: "Incident deleted successfully".to_string(),
    deleted_incident,
  }))
}

/// A non-integer id cannot name an incident, so it is reported as not found.
fn parse_id(raw: &str) -> Result<i64, ApiError> {
  raw.parse::<i64>().map_err(|_| ApiError::NotFound)
}

fn malformed(rejection: JsonRejection) -> ApiError {
  ApiError::Validation(ValidationError::malformed(rejection.body_text()))
}

// ---------------------------------------------------------------------------
// Error responses
// ---------------------------------------------------------------------------

/// Store failures rendered as HTTP responses.
#[derive(Debug)]
pub enum ApiError {
  Validation(ValidationError),
  NotFound,
  Internal,
}

impl From<StoreError> for ApiError {
  fn from(err: StoreError) -> Self {
    match err {
      StoreError::Validation(v) => Self::Validation(v),
      StoreError::NotFound(_) => Self::NotFound,
      StoreError::Backend(e) => {
        error!(error = %e, "backend failure");
        Self::Internal
      }
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, body) = match self {
      Self::Validation(v) => {
        let body = match &v {
          ValidationError::MissingFields(fields) => {
            ErrorBody::new("Missing required field(s)").with_missing(fields.clone())
          }
          ValidationError::InvalidSeverity(_) => ErrorBody::new("Invalid severity"),
          ValidationError::InvalidStatus(_) => ErrorBody::new("Invalid status"),
          ValidationError::MalformedBody(_) => ErrorBody::new("No JSON data provided"),
        };
        let body = match v.hint() {
          Some(hint) => body.with_message(hint),
          None => body,
        };
        (StatusCode::BAD_REQUEST, body)
      }
      Self::NotFound => (StatusCode::NOT_FOUND, ErrorBody::new("Incident not found")),
      Self::Internal => (
        StatusCode::INTERNAL_SERVER_ERROR,
        ErrorBody::new("Internal server error"),
      ),
    };
    (status, Json(body)).into_response()
  }
}
