use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future;
use serde::Serialize;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    Connection, ConnectionStatus, Connector, Error, MetricsStore, NewConnection, Registry, Result,
    SourceType, SyncLogEntry, SyncState,
};

const DEFAULT_STAGE_TIMEOUT: Duration = Duration::from_secs(30);

/// Outcome of one sync run for a single connection.
#[derive(Debug, Clone, Serialize)]
pub struct SyncResult {
    pub connection_id: Uuid,
    pub synced_at: Option<DateTime<Utc>>,
    pub records_processed: usize,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SyncResult {
    fn failed(connection_id: Uuid, error: impl Into<String>) -> Self {
        Self {
            connection_id,
            synced_at: None,
            records_processed: 0,
            success: false,
            error: Some(error.into()),
        }
    }
}

/// Connection record combined with the connector's view of its last sync.
#[derive(Debug, Clone, Serialize)]
pub struct StatusSummary {
    pub id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub source_type: SourceType,
    pub status: ConnectionStatus,
    pub last_sync: Option<DateTime<Utc>>,
    pub sync_state: SyncState,
}

/// Drives connections through connect → extract → transform → load and
/// records every outcome. Constructed once at startup and shared by
/// reference; there is no global instance.
pub struct EtlPipeline {
    store: Arc<dyn MetricsStore>,
    registry: Arc<Registry>,
    stage_timeout: Duration,
    sync_locks: Mutex<HashMap<Uuid, Arc<Mutex<()>>>>,
}

impl EtlPipeline {
    pub fn new(store: Arc<dyn MetricsStore>, registry: Arc<Registry>) -> Self {
        Self {
            store,
            registry,
            stage_timeout: DEFAULT_STAGE_TIMEOUT,
            sync_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Cap on each extract/load call; expiry counts as a failed sync.
    pub fn with_stage_timeout(mut self, stage_timeout: Duration) -> Self {
        self.stage_timeout = stage_timeout;
        self
    }

    /// Register a new connection once its connector vouches for the
    /// credentials. Nothing is persisted when validation fails.
    pub async fn create_connection(&self, data: NewConnection) -> Result<Connection> {
        let connector = self.registry.resolve(data.source_type)?;
        connector.connect(&data.credentials).await?;

        let connection = Connection {
            id: Uuid::new_v4(),
            name: data.name,
            source_type: data.source_type,
            status: ConnectionStatus::Active,
            credentials: data.credentials,
            created_at: Utc::now(),
            last_sync_at: None,
        };

        info!(connection = %connection.id, source = %connection.source_type, "registered connection");
        self.store.insert_connection(connection).await
    }

    /// Run one sync for `connection_id`. Stage failures are logged and
    /// returned as an unsuccessful result; setup and store failures
    /// propagate as errors.
    pub async fn sync_connection(&self, connection_id: Uuid) -> Result<SyncResult> {
        let connection = self
            .store
            .get_connection(connection_id)
            .await?
            .ok_or(Error::ConnectionNotFound(connection_id))?;
        let connector = self.registry.resolve(connection.source_type)?;

        // At most one in-flight sync per connection; syncs of different
        // connections stay concurrent.
        let lock = self.sync_lock(connection_id).await;
        let _guard = lock.lock().await;

        match self.run_stages(connector.as_ref(), &connection).await {
            Ok(count) => {
                let synced_at = Utc::now();
                self.store
                    .update_connection_last_sync(connection_id, synced_at)
                    .await?;
                self.store
                    .insert_sync_log(SyncLogEntry::succeeded(connection_id, count, synced_at))
                    .await?;
                info!(connection = %connection_id, records = count, "sync completed");
                Ok(SyncResult {
                    connection_id,
                    synced_at: Some(synced_at),
                    records_processed: count,
                    success: true,
                    error: None,
                })
            }
            Err(e) => {
                warn!(connection = %connection_id, error = %e, "sync failed");
                self.store
                    .insert_sync_log(SyncLogEntry::failed(
                        connection_id,
                        e.to_string(),
                        Utc::now(),
                    ))
                    .await?;
                Ok(SyncResult::failed(connection_id, e.to_string()))
            }
        }
    }

    async fn run_stages(
        &self,
        connector: &dyn Connector,
        connection: &Connection,
    ) -> Result<usize> {
        let raw = timeout(self.stage_timeout, connector.extract(&connection.credentials))
            .await
            .map_err(|_| Error::StageTimeout {
                stage: "extract",
                timeout: self.stage_timeout,
            })??;

        let metrics = connector.transform(&raw, Utc::now());

        timeout(self.stage_timeout, connector.load(metrics))
            .await
            .map_err(|_| Error::StageTimeout {
                stage: "load",
                timeout: self.stage_timeout,
            })?
    }

    /// Sync every active connection concurrently. One connection's failure
    /// never aborts the batch; the result list covers every active
    /// connection.
    pub async fn run_full_pipeline(&self) -> Result<Vec<SyncResult>> {
        let connections = self
            .store
            .list_connections(Some(ConnectionStatus::Active))
            .await?;
        info!(connections = connections.len(), "running full pipeline");

        let results = future::join_all(connections.iter().map(|connection| async move {
            match self.sync_connection(connection.id).await {
                Ok(result) => result,
                Err(e) => {
                    error!(connection = %connection.id, error = %e, "sync errored");
                    SyncResult::failed(connection.id, e.to_string())
                }
            }
        }))
        .await;

        Ok(results)
    }

    /// Remove a connection. Sync logs and previously loaded metrics are
    /// kept for audit.
    pub async fn delete_connection(&self, connection_id: Uuid) -> Result<()> {
        self.store
            .get_connection(connection_id)
            .await?
            .ok_or(Error::ConnectionNotFound(connection_id))?;
        self.store.delete_connection(connection_id).await?;
        self.sync_locks.lock().await.remove(&connection_id);
        info!(connection = %connection_id, "deleted connection");
        Ok(())
    }

    /// Connection fields combined with the connector's last-sync view; the
    /// latest log timestamp stands in when the record itself has never
    /// recorded a sync.
    pub async fn connection_status(&self, connection_id: Uuid) -> Result<StatusSummary> {
        let connection = self
            .store
            .get_connection(connection_id)
            .await?
            .ok_or(Error::ConnectionNotFound(connection_id))?;
        let connector = self.registry.resolve(connection.source_type)?;
        let sync_status = connector.last_sync_status(connection_id).await?;

        Ok(StatusSummary {
            id: connection.id,
            name: connection.name,
            source_type: connection.source_type,
            status: connection.status,
            last_sync: connection.last_sync_at.or(sync_status.last_sync),
            sync_state: sync_status.state,
        })
    }

    /// Explicit status transition. The pipeline itself never flips a
    /// connection out of Active, however often it fails.
    pub async fn set_connection_status(
        &self,
        connection_id: Uuid,
        status: ConnectionStatus,
    ) -> Result<()> {
        self.store
            .get_connection(connection_id)
            .await?
            .ok_or(Error::ConnectionNotFound(connection_id))?;
        self.store
            .update_connection_status(connection_id, status)
            .await
    }

    /// All connections, optionally filtered by status.
    pub async fn list_connections(
        &self,
        status: Option<ConnectionStatus>,
    ) -> Result<Vec<Connection>> {
        self.store.list_connections(status).await
    }

    /// Audit trail for one connection. Works for deleted connections too,
    /// since their logs are retained.
    pub async fn sync_logs(&self, connection_id: Uuid) -> Result<Vec<SyncLogEntry>> {
        self.store.list_sync_logs(connection_id).await
    }

    async fn sync_lock(&self, connection_id: Uuid) -> Arc<Mutex<()>> {
        self.sync_locks
            .lock()
            .await
            .entry(connection_id)
            .or_default()
            .clone()
    }
}
