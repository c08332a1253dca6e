use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::{Metric, Result, SourceType};

/// Lifecycle state of a configured connection.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Active,
    Inactive,
    Error,
}

impl ConnectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionStatus::Active => "active",
            ConnectionStatus::Inactive => "inactive",
            ConnectionStatus::Error => "error",
        }
    }
}

/// A persisted, named, credentialed link to one external source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Connection {
    pub id: Uuid,

    pub name: String,

    /// Immutable after creation; there is deliberately no update path.
    #[serde(rename = "type")]
    pub source_type: SourceType,

    pub status: ConnectionStatus,

    /// Source-specific credential blob. Shape is validated by the
    /// connector's `connect`, not by the store.
    pub credentials: Value,

    pub created_at: DateTime<Utc>,

    pub last_sync_at: Option<DateTime<Utc>>,
}

/// Payload for registering a new connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewConnection {
    pub name: String,

    #[serde(rename = "type")]
    pub source_type: SourceType,

    pub credentials: Value,
}

/// Append-only audit record of one sync attempt. Never mutated, and kept
/// when its connection is deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncLogEntry {
    pub id: Uuid,

    pub connection_id: Uuid,

    pub records_processed: usize,

    pub success: bool,

    /// Present only on failure.
    pub error: Option<String>,

    pub created_at: DateTime<Utc>,
}

impl SyncLogEntry {
    pub fn succeeded(
        connection_id: Uuid,
        records_processed: usize,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            connection_id,
            records_processed,
            success: true,
            error: None,
            created_at,
        }
    }

    pub fn failed(connection_id: Uuid, error: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            connection_id,
            records_processed: 0,
            success: false,
            error: Some(error.into()),
            created_at,
        }
    }
}

/// Narrow storage interface the pipeline and connectors read and write
/// through. Implementations serialize writes to their own rows; callers add
/// no row-level locking on top.
#[async_trait]
pub trait MetricsStore: Send + Sync {
    // Connection records
    async fn list_connections(
        &self,
        status: Option<ConnectionStatus>,
    ) -> Result<Vec<Connection>>;
    async fn get_connection(&self, id: Uuid) -> Result<Option<Connection>>;
    async fn insert_connection(&self, connection: Connection) -> Result<Connection>;
    async fn update_connection_last_sync(&self, id: Uuid, at: DateTime<Utc>) -> Result<()>;
    async fn update_connection_status(&self, id: Uuid, status: ConnectionStatus) -> Result<()>;
    async fn delete_connection(&self, id: Uuid) -> Result<()>;

    // Sync audit log
    async fn insert_sync_log(&self, entry: SyncLogEntry) -> Result<()>;
    async fn latest_sync_log(&self, connection_id: Uuid) -> Result<Option<SyncLogEntry>>;
    async fn list_sync_logs(&self, connection_id: Uuid) -> Result<Vec<SyncLogEntry>>;

    // Metrics
    async fn insert_metrics(&self, metrics: Vec<Metric>) -> Result<()>;
    async fn metrics_by_feature(&self, feature_id: &str) -> Result<Vec<Metric>>;
    async fn metrics_by_time_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        metric_name: Option<&str>,
    ) -> Result<Vec<Metric>>;
}
