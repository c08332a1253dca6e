use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::{Error, Metric, MetricsStore, RawRecord, Result, SourceType};

/// Capability set implemented by every data source variant.
///
/// Variants differ only in how they validate credentials, pull raw records,
/// and normalize them; `load` and `last_sync_status` are shared over the
/// injected store. Connectors hold no mutable state, so a shared or fresh
/// instance behaves identically.
#[async_trait]
pub trait Connector: Send + Sync {
    fn source_type(&self) -> SourceType;

    /// Store backing the shared load/status operations.
    fn store(&self) -> &Arc<dyn MetricsStore>;

    /// Validate that `credentials` carry every field this source requires.
    /// Performs no network round-trip.
    async fn connect(&self, credentials: &Value) -> Result<()>;

    /// Pull the raw records for the current sync window. The sequence is
    /// finite and not restartable.
    async fn extract(&self, credentials: &Value) -> Result<Vec<RawRecord>>;

    /// Normalize raw records into metrics. Pure: `now` is the only clock,
    /// so identical inputs always produce identical output.
    fn transform(&self, records: &[RawRecord], now: DateTime<Utc>) -> Vec<Metric>;

    /// Persist metrics, returning how many were written. Empty input is a
    /// no-op success. Retry policy belongs to the caller.
    async fn load(&self, metrics: Vec<Metric>) -> Result<usize> {
        if metrics.is_empty() {
            return Ok(0);
        }
        let count = metrics.len();
        self.store().insert_metrics(metrics).await?;
        Ok(count)
    }

    /// Outcome of the most recent sync attempt for `connection_id`.
    async fn last_sync_status(&self, connection_id: Uuid) -> Result<SyncStatus> {
        match self.store().latest_sync_log(connection_id).await? {
            Some(entry) => Ok(SyncStatus {
                last_sync: Some(entry.created_at),
                state: if entry.success {
                    SyncState::Success
                } else {
                    SyncState::Failed
                },
            }),
            None => Ok(SyncStatus {
                last_sync: None,
                state: SyncState::NeverSynced,
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SyncState {
    NeverSynced,
    Success,
    Failed,
}

/// Connector-side view of a connection's sync history.
#[derive(Debug, Clone, Serialize)]
pub struct SyncStatus {
    pub last_sync: Option<DateTime<Utc>>,
    pub state: SyncState,
}

/// Deserialize the typed credential struct for `source_type`, mapping any
/// missing or malformed field to `Error::InvalidCredentials`.
pub fn parse_credentials<T: DeserializeOwned>(
    source_type: SourceType,
    credentials: &Value,
) -> Result<T> {
    serde_json::from_value(credentials.clone()).map_err(|e| Error::InvalidCredentials {
        source_type,
        reason: e.to_string(),
    })
}

/// Reject credential fields that are present but blank.
pub fn require_non_empty(source_type: SourceType, fields: &[(&str, &str)]) -> Result<()> {
    for (name, value) in fields {
        if value.trim().is_empty() {
            return Err(Error::InvalidCredentials {
                source_type,
                reason: format!("{name} must not be empty"),
            });
        }
    }
    Ok(())
}
