use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use metricsink_core::{
    Connection, ConnectionStatus, Metric, MetricsStore, Result, SyncLogEntry,
};

/// In-memory store. The default backend when no database is configured and
/// the double for pipeline tests. A single lock serializes writes, which
/// keeps last-sync updates and log inserts from interleaving across rows.
#[derive(Default)]
pub struct MemoryMetricsStore {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    connections: HashMap<Uuid, Connection>,
    sync_logs: Vec<SyncLogEntry>,
    metrics: Vec<Metric>,
}

impl MemoryMetricsStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MetricsStore for MemoryMetricsStore {
    async fn list_connections(
        &self,
        status: Option<ConnectionStatus>,
    ) -> Result<Vec<Connection>> {
        let inner = self.inner.read().await;
        let mut connections: Vec<Connection> = inner
            .connections
            .values()
            .filter(|c| status.is_none_or(|s| c.status == s))
            .cloned()
            .collect();
        connections.sort_by_key(|c| c.created_at);
        Ok(connections)
    }

    async fn get_connection(&self, id: Uuid) -> Result<Option<Connection>> {
        Ok(self.inner.read().await.connections.get(&id).cloned())
    }

    async fn insert_connection(&self, connection: Connection) -> Result<Connection> {
        let mut inner = self.inner.write().await;
        inner.connections.insert(connection.id, connection.clone());
        Ok(connection)
    }

    async fn update_connection_last_sync(&self, id: Uuid, at: DateTime<Utc>) -> Result<()> {
        let mut inner = self.inner.write().await;
        let connection = inner
            .connections
            .get_mut(&id)
            .ok_or_else(|| anyhow::anyhow!("connection '{id}' not found"))?;
        connection.last_sync_at = Some(at);
        Ok(())
    }

    async fn update_connection_status(&self, id: Uuid, status: ConnectionStatus) -> Result<()> {
        let mut inner = self.inner.write().await;
        let connection = inner
            .connections
            .get_mut(&id)
            .ok_or_else(|| anyhow::anyhow!("connection '{id}' not found"))?;
        connection.status = status;
        Ok(())
    }

    async fn delete_connection(&self, id: Uuid) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner
            .connections
            .remove(&id)
            .ok_or_else(|| anyhow::anyhow!("connection '{id}' not found"))?;
        Ok(())
    }

    async fn insert_sync_log(&self, entry: SyncLogEntry) -> Result<()> {
        self.inner.write().await.sync_logs.push(entry);
        Ok(())
    }

    async fn latest_sync_log(&self, connection_id: Uuid) -> Result<Option<SyncLogEntry>> {
        let inner = self.inner.read().await;
        // max_by_key keeps the last maximal entry, so insertion order breaks
        // timestamp ties.
        Ok(inner
            .sync_logs
            .iter()
            .filter(|entry| entry.connection_id == connection_id)
            .max_by_key(|entry| entry.created_at)
            .cloned())
    }

    async fn list_sync_logs(&self, connection_id: Uuid) -> Result<Vec<SyncLogEntry>> {
        let inner = self.inner.read().await;
        let mut entries: Vec<SyncLogEntry> = inner
            .sync_logs
            .iter()
            .filter(|entry| entry.connection_id == connection_id)
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(entries)
    }

    async fn insert_metrics(&self, metrics: Vec<Metric>) -> Result<()> {
        self.inner.write().await.metrics.extend(metrics);
        Ok(())
    }

    async fn metrics_by_feature(&self, feature_id: &str) -> Result<Vec<Metric>> {
        let inner = self.inner.read().await;
        Ok(inner
            .metrics
            .iter()
            .filter(|metric| metric.feature_id == feature_id)
            .cloned()
            .collect())
    }

    async fn metrics_by_time_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        metric_name: Option<&str>,
    ) -> Result<Vec<Metric>> {
        let inner = self.inner.read().await;
        Ok(inner
            .metrics
            .iter()
            .filter(|metric| metric.recorded_at >= start && metric.recorded_at <= end)
            .filter(|metric| metric_name.is_none_or(|name| metric.metric_name == name))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use metricsink_core::SourceType;
    use serde_json::json;

    fn connection(status: ConnectionStatus) -> Connection {
        Connection {
            id: Uuid::new_v4(),
            name: "test".to_string(),
            source_type: SourceType::Figma,
            status,
            credentials: json!({}),
            created_at: Utc::now(),
            last_sync_at: None,
        }
    }

    #[tokio::test]
    async fn status_filter_narrows_listing() {
        let store = MemoryMetricsStore::new();
        store
            .insert_connection(connection(ConnectionStatus::Active))
            .await
            .unwrap();
        store
            .insert_connection(connection(ConnectionStatus::Inactive))
            .await
            .unwrap();

        assert_eq!(store.list_connections(None).await.unwrap().len(), 2);
        assert_eq!(
            store
                .list_connections(Some(ConnectionStatus::Active))
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn latest_sync_log_picks_newest_entry() {
        let store = MemoryMetricsStore::new();
        let id = Uuid::new_v4();
        let older = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let newer = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();

        store
            .insert_sync_log(SyncLogEntry::failed(id, "boom", older))
            .await
            .unwrap();
        store
            .insert_sync_log(SyncLogEntry::succeeded(id, 4, newer))
            .await
            .unwrap();

        let latest = store.latest_sync_log(id).await.unwrap().unwrap();
        assert!(latest.success);
        assert_eq!(latest.created_at, newer);

        assert!(store.latest_sync_log(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn deleting_a_connection_keeps_its_logs() {
        let store = MemoryMetricsStore::new();
        let conn = connection(ConnectionStatus::Active);
        let id = conn.id;
        store.insert_connection(conn).await.unwrap();
        store
            .insert_sync_log(SyncLogEntry::succeeded(id, 4, Utc::now()))
            .await
            .unwrap();

        store.delete_connection(id).await.unwrap();
        assert!(store.get_connection(id).await.unwrap().is_none());
        assert_eq!(store.list_sync_logs(id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn time_range_filter_is_inclusive_and_name_aware() {
        let store = MemoryMetricsStore::new();
        let at = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        store
            .insert_metrics(vec![
                Metric::new("page_views", 10.0, at, "dashboard", SourceType::GoogleAnalytics),
                Metric::new("bounce_rate", 25.0, at, "dashboard", SourceType::GoogleAnalytics),
            ])
            .await
            .unwrap();

        let all = store.metrics_by_time_range(at, at, None).await.unwrap();
        assert_eq!(all.len(), 2);

        let views = store
            .metrics_by_time_range(at, at, Some("page_views"))
            .await
            .unwrap();
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].metric_value, 10.0);
    }
}
