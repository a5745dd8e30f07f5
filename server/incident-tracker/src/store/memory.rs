//! In-memory backend; used by tests and when no database is configured.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::{BackendResult, IncidentBackend};
use crate::types::{Incident, IncidentFilter, NewIncident, Status};

#[derive(Debug)]
struct Table {
  /// Next id to hand out. Only ever incremented.
  next_id: i64,
  rows: BTreeMap<i64, Incident>,
}

/// A single mutex guards both the id counter and the rows, so concurrent
/// requests see a serialized sequence of writes.
#[derive(Debug)]
pub struct MemoryBackend {
  table: Mutex<Table>,
}

impl MemoryBackend {
  pub fn new() -> Self {
    Self {
      table: Mutex::new(Table {
        next_id: 1,
        rows: BTreeMap::new(),
      }),
    }
  }

  fn lock(&self) -> MutexGuard<'_, Table> {
    // Every mutation is a single map operation, so a poisoned table is still consistent.
    self.table.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

impl Default for MemoryBackend {
  fn default() -> Self {
    Self::new()
  }
}

#[async_trait]
impl IncidentBackend for MemoryBackend {
  async fn insert(&self, record: NewIncident) -> BackendResult<Incident> {
    let mut table = self.lock();
    let id = table.next_id;
    table.next_id += 1;
    let incident = record.into_incident(id);
    table.rows.insert(id, incident.clone());
    Ok(incident)
  }

  async fn get(&self, id: i64) -> BackendResult<Option<Incident>> {
    Ok(self.lock().rows.get(&id).cloned())
  }

  async fn list(&self, filter: IncidentFilter) -> BackendResult<Vec<Incident>> {
    Ok(
      self
        .lock()
        .rows
        .values()
        .filter(|incident| filter.matches(incident))
        .cloned()
        .collect(),
    )
  }

  async fn set_status(&self, id: i64, status: Status) -> BackendResult<Option<Incident>> {
    let mut table = self.lock();
    Ok(table.rows.get_mut(&id).map(|incident| {
      incident.status = status;
      incident.clone()
    }))
  }

  async fn remove(&self, id: i64) -> BackendResult<Option<Incident>> {
    Ok(self.lock().rows.remove(&id))
  }
}
