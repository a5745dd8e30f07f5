//! PostgreSQL backend on sqlx-core + sqlx-postgres.
//!
//! `id` is a BIGSERIAL: the sequence only moves forward, so deleted ids are
//! never reissued. Every operation is one statement, hence atomic.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx_core::query::query;
use sqlx_core::row::Row;
use sqlx_postgres::{PgPool, PgPoolOptions, PgRow, Postgres};
use tracing::info;

use super::{BackendResult, IncidentBackend};
use crate::error::BackendError;
use crate::types::{Incident, IncidentFilter, NewIncident, Severity, Status};

const SCHEMA_SQL: &str = r#"
  CREATE TABLE IF NOT EXISTS incidents (
    id          BIGSERIAL PRIMARY KEY,
    title       TEXT NOT NULL,
    description TEXT NOT NULL,
    reported_by TEXT NOT NULL,
    severity    TEXT NOT NULL CHECK (severity IN ('Low', 'Medium', 'High')),
    status      TEXT NOT NULL CHECK (status IN ('Open', 'In Progress', 'Resolved')),
    timestamp   TIMESTAMPTZ NOT NULL
  )
"#;

const RETURNING: &str = "RETURNING id, title, description, reported_by, severity, status, timestamp";

#[derive(Debug, Clone)]
pub struct PostgresBackend {
  pool: PgPool,
}

impl PostgresBackend {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }

  pub async fn connect(database_url: &str, max_connections: u32) -> BackendResult<Self> {
    let pool = PgPoolOptions::new()
      .max_connections(max_connections)
      .connect(database_url)
      .await?;
    Ok(Self::new(pool))
  }

  /// Create the `incidents` table when it does not exist yet.
  pub async fn ensure_schema(&self) -> BackendResult<()> {
    query::<Postgres>(SCHEMA_SQL).execute(&self.pool).await?;
    info!("incidents table ready");
    Ok(())
  }
}

fn decode_row(row: &PgRow) -> BackendResult<Incident> {
  let id: i64 = row.try_get("id")?;
  let severity: String = row.try_get("severity")?;
  let status: String = row.try_get("status")?;
  let timestamp: DateTime<Utc> = row.try_get("timestamp")?;
  let (severity, status) = decode_literals(id, &severity, &status)?;

  Ok(Incident {
    id,
    title: row.try_get("title")?,
    description: row.try_get("description")?,
    reported_by: row.try_get("reported_by")?,
    severity,
    status,
    timestamp,
  })
}

/// Stored enum columns must hold canonical literals; anything else is corruption.
fn decode_literals(id: i64, severity: &str, status: &str) -> BackendResult<(Severity, Status)> {
  let severity = severity
    .parse::<Severity>()
    .map_err(|e| BackendError::corrupt(id, format!("severity {:?}", e.0)))?;
  let status = status
    .parse::<Status>()
    .map_err(|e| BackendError::corrupt(id, format!("status {:?}", e.0)))?;
  Ok((severity, status))
}

#[async_trait]
impl IncidentBackend for PostgresBackend {
  async fn insert(&self, record: NewIncident) -> BackendResult<Incident> {
    let sql = format!(
      "INSERT INTO incidents (title, description, reported_by, severity, status, timestamp)
       VALUES ($1, $2, $3, $4, $5, $6) {RETURNING}"
    );
    let row = query::<Postgres>(&sql)
      .bind(record.title)
      .bind(record.description)
      .bind(record.reported_by)
      .bind(record.severity.as_str())
      .bind(record.status.as_str())
      .bind(record.timestamp)
      .fetch_one(&self.pool)
      .await?;
    decode_row(&row)
  }

  async fn get(&self, id: i64) -> BackendResult<Option<Incident>> {
    let row = query::<Postgres>(
      "SELECT id, title, description, reported_by, severity, status, timestamp
       FROM incidents WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(&self.pool)
    .await?;
    row.as_ref().map(decode_row).transpose()
  }

  async fn list(&self, filter: IncidentFilter) -> BackendResult<Vec<Incident>> {
    let rows = query::<Postgres>(
      "SELECT id, title, description, reported_by, severity, status, timestamp
       FROM incidents
       WHERE ($1::text IS NULL OR status = $1)
         AND ($2::text IS NULL OR severity = $2)
       ORDER BY id ASC",
    )
    .bind(filter.status.map(Status::as_str))
    .bind(filter.severity.map(Severity::as_str))
    .fetch_all(&self.pool)
    .await?;
    rows.iter().map(decode_row).collect()
  }

  async fn set_status(&self, id: i64, status: Status) -> BackendResult<Option<Incident>> {
    let sql = format!("UPDATE incidents SET status = $1 WHERE id = $2 {RETURNING}");
    let row = query::<Postgres>(&sql)
      .bind(status.as_str())
      .bind(id)
      .fetch_optional(&self.pool)
      .await?;
    row.as_ref().map(decode_row).transpose()
  }

  async fn remove(&self, id: i64) -> BackendResult<Option<Incident>> {
    let sql = format!("DELETE FROM incidents WHERE id = $1 {RETURNING}");
    let row = query::<Postgres>(&sql)
      .bind(id)
      .fetch_optional(&self.pool)
      .await?;
    row.as_ref().map(decode_row).transpose()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::SubsecRound;

  #[test]
  fn canonical_literals_decode() {
    let (severity, status) = decode_literals(1, "High", "In Progress").unwrap();
    assert_eq!(severity, Severity::High);
    assert_eq!(status, Status::InProgress);
  }

  #[test]
  fn unknown_literals_are_corrupt_records() {
    let err = decode_literals(4, "Critical", "Open").unwrap_err();
    assert!(matches!(err, BackendError::Corrupt { id: 4, ref reason } if reason.contains("Critical")));

    let err = decode_literals(5, "Low", "closed").unwrap_err();
    assert!(matches!(err, BackendError::Corrupt { id: 5, ref reason } if reason.starts_with("status")));
  }

  /// Needs a disposable database: `DATABASE_URL=postgres://... cargo test -- --ignored`.
  #[tokio::test]
  #[ignore]
  async fn round_trip_against_live_database() {
    let Ok(url) = std::env::var("DATABASE_URL") else {
      return;
    };
    let backend = PostgresBackend::connect(&url, 2).await.unwrap();
    backend.ensure_schema().await.unwrap();

    let record = NewIncident {
      title: "Page is broken".to_string(),
      description: "Users can not search for books".to_string(),
      reported_by: "a@b.com".to_string(),
      severity: Severity::High,
      status: Status::Open,
      timestamp: Utc::now().trunc_subsecs(6),
    };
    let created = backend.insert(record.clone()).await.unwrap();
    assert_eq!(created, record.into_incident(created.id));
    assert_eq!(backend.get(created.id).await.unwrap(), Some(created.clone()));

    let updated = backend.set_status(created.id, Status::Resolved).await.unwrap().unwrap();
    assert_eq!(updated.status, Status::Resolved);
    assert_eq!(updated.timestamp, created.timestamp);

    let matching = backend
      .list(IncidentFilter {
        status: Some(Status::Resolved),
        severity: Some(Severity::High),
      })
      .await
      .unwrap();
    assert!(matching.iter().any(|i| i.id == created.id));

    assert_eq!(backend.remove(created.id).await.unwrap(), Some(updated));
    assert_eq!(backend.remove(created.id).await.unwrap(), None);

    let next = backend
      .insert(NewIncident {
        title: "t".to_string(),
        description: "d".to_string(),
        reported_by: "r".to_string(),
        severity: Severity::Low,
        status: Status::Open,
        timestamp: Utc::now().trunc_subsecs(6),
      })
      .await
      .unwrap();
    assert!(next.id > created.id);
    backend.remove(next.id).await.unwrap();
  }
}
