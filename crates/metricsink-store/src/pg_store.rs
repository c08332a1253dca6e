use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use metricsink_core::{
    Connection, ConnectionStatus, Metric, MetricsStore, Result, SourceType, SyncLogEntry,
};

/// PostgreSQL-backed store. Expects the `data_connections`, `sync_logs` and
/// `design_metrics` tables; per-row write serialization is the database's
/// transaction discipline.
pub struct PgMetricsStore {
    pool: PgPool,
}

impl PgMetricsStore {
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPool::connect(database_url)
            .await
            .context("Failed to connect to PostgreSQL")?;

        Ok(Self { pool })
    }
}

fn parse_status(raw: &str) -> anyhow::Result<ConnectionStatus> {
    match raw {
        "active" => Ok(ConnectionStatus::Active),
        "inactive" => Ok(ConnectionStatus::Inactive),
        "error" => Ok(ConnectionStatus::Error),
        other => anyhow::bail!("unknown connection status '{other}'"),
    }
}

fn connection_from_row(row: &PgRow) -> anyhow::Result<Connection> {
    let source_type: String = row.get("source_type");
    let status: String = row.get("status");

    Ok(Connection {
        id: row.get("id"),
        name: row.get("name"),
        source_type: source_type.parse::<SourceType>()?,
        status: parse_status(&status)?,
        credentials: row.get("credentials"),
        created_at: row.get("created_at"),
        last_sync_at: row.get("last_sync_at"),
    })
}

fn sync_log_from_row(row: &PgRow) -> SyncLogEntry {
    SyncLogEntry {
        id: row.get("id"),
        connection_id: row.get("connection_id"),
        records_processed: row.get::<i64, _>("records_processed") as usize,
        success: row.get("success"),
        error: row.get("error"),
        created_at: row.get("created_at"),
    }
}

fn metric_from_row(row: &PgRow) -> Metric {
    Metric {
        metric_name: row.get("metric_name"),
        metric_value: row.get("metric_value"),
        recorded_at: row.get("recorded_at"),
        feature_id: row.get("feature_id"),
        user_segment: row.get("user_segment"),
        platform_type: row.get("platform_type"),
    }
}

const CONNECTION_COLUMNS: &str =
    "id, name, source_type, status, credentials, created_at, last_sync_at";
const SYNC_LOG_COLUMNS: &str =
    "id, connection_id, records_processed, success, error, created_at";
const METRIC_COLUMNS: &str =
    "metric_name, metric_value, recorded_at, feature_id, user_segment, platform_type";

#[async_trait]
impl MetricsStore for PgMetricsStore {
    async fn list_connections(
        &self,
        status: Option<ConnectionStatus>,
    ) -> Result<Vec<Connection>> {
        let rows = match status {
            Some(status) => {
                sqlx::query(&format!(
                    "SELECT {CONNECTION_COLUMNS} FROM data_connections
                     WHERE status = $1 ORDER BY created_at"
                ))
                .bind(status.as_str())
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query(&format!(
                    "SELECT {CONNECTION_COLUMNS} FROM data_connections ORDER BY created_at"
                ))
                .fetch_all(&self.pool)
                .await
            }
        }
        .context("Failed to list connections")?;

        let connections = rows
            .iter()
            .map(connection_from_row)
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok(connections)
    }

    async fn get_connection(&self, id: Uuid) -> Result<Option<Connection>> {
        let row = sqlx::query(&format!(
            "SELECT {CONNECTION_COLUMNS} FROM data_connections WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get connection")?;

        Ok(match row {
            Some(row) => Some(connection_from_row(&row)?),
            None => None,
        })
    }

    async fn insert_connection(&self, connection: Connection) -> Result<Connection> {
        sqlx::query(
            "INSERT INTO data_connections
                 (id, name, source_type, status, credentials, created_at, last_sync_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(connection.id)
        .bind(&connection.name)
        .bind(connection.source_type.as_str())
        .bind(connection.status.as_str())
        .bind(&connection.credentials)
        .bind(connection.created_at)
        .bind(connection.last_sync_at)
        .execute(&self.pool)
        .await
        .context("Failed to insert connection")?;

        Ok(connection)
    }

    async fn update_connection_last_sync(&self, id: Uuid, at: DateTime<Utc>) -> Result<()> {
        let result = sqlx::query("UPDATE data_connections SET last_sync_at = $2 WHERE id = $1")
            .bind(id)
            .bind(at)
            .execute(&self.pool)
            .await
            .context("Failed to update last sync time")?;

        if result.rows_affected() == 0 {
            return Err(anyhow::anyhow!("connection '{id}' not found").into());
        }

        Ok(())
    }

    async fn update_connection_status(&self, id: Uuid, status: ConnectionStatus) -> Result<()> {
        let result = sqlx::query("UPDATE data_connections SET status = $2 WHERE id = $1")
            .bind(id)
            .bind(status.as_str())
            .execute(&self.pool)
            .await
            .context("Failed to update connection status")?;

        if result.rows_affected() == 0 {
            return Err(anyhow::anyhow!("connection '{id}' not found").into());
        }

        Ok(())
    }

    async fn delete_connection(&self, id: Uuid) -> Result<()> {
        // Sync logs and metrics are deliberately not cascade-deleted.
        let result = sqlx::query("DELETE FROM data_connections WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete connection")?;

        if result.rows_affected() == 0 {
            return Err(anyhow::anyhow!("connection '{id}' not found").into());
        }

        Ok(())
    }

    async fn insert_sync_log(&self, entry: SyncLogEntry) -> Result<()> {
        sqlx::query(
            "INSERT INTO sync_logs
                 (id, connection_id, records_processed, success, error, created_at)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(entry.id)
        .bind(entry.connection_id)
        .bind(entry.records_processed as i64)
        .bind(entry.success)
        .bind(&entry.error)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await
        .context("Failed to insert sync log")?;

        Ok(())
    }

    async fn latest_sync_log(&self, connection_id: Uuid) -> Result<Option<SyncLogEntry>> {
        let row = sqlx::query(&format!(
            "SELECT {SYNC_LOG_COLUMNS} FROM sync_logs
             WHERE connection_id = $1
             ORDER BY created_at DESC LIMIT 1"
        ))
        .bind(connection_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get latest sync log")?;

        Ok(row.as_ref().map(sync_log_from_row))
    }

    async fn list_sync_logs(&self, connection_id: Uuid) -> Result<Vec<SyncLogEntry>> {
        let rows = sqlx::query(&format!(
            "SELECT {SYNC_LOG_COLUMNS} FROM sync_logs
             WHERE connection_id = $1
             ORDER BY created_at DESC"
        ))
        .bind(connection_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list sync logs")?;

        Ok(rows.iter().map(sync_log_from_row).collect())
    }

    async fn insert_metrics(&self, metrics: Vec<Metric>) -> Result<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to open metrics transaction")?;

        for metric in &metrics {
            sqlx::query(
                "INSERT INTO design_metrics
                     (metric_name, metric_value, recorded_at, feature_id, user_segment, platform_type)
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(&metric.metric_name)
            .bind(metric.metric_value)
            .bind(metric.recorded_at)
            .bind(&metric.feature_id)
            .bind(&metric.user_segment)
            .bind(&metric.platform_type)
            .execute(&mut *tx)
            .await
            .context("Failed to insert metric")?;
        }

        tx.commit().await.context("Failed to commit metrics")?;
        Ok(())
    }

    async fn metrics_by_feature(&self, feature_id: &str) -> Result<Vec<Metric>> {
        let rows = sqlx::query(&format!(
            "SELECT {METRIC_COLUMNS} FROM design_metrics
             WHERE feature_id = $1
             ORDER BY recorded_at"
        ))
        .bind(feature_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list metrics by feature")?;

        Ok(rows.iter().map(metric_from_row).collect())
    }

    async fn metrics_by_time_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        metric_name: Option<&str>,
    ) -> Result<Vec<Metric>> {
        let rows = match metric_name {
            Some(name) => {
                sqlx::query(&format!(
                    "SELECT {METRIC_COLUMNS} FROM design_metrics
                     WHERE recorded_at BETWEEN $1 AND $2 AND metric_name = $3
                     ORDER BY recorded_at"
                ))
                .bind(start)
                .bind(end)
                .bind(name)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query(&format!(
                    "SELECT {METRIC_COLUMNS} FROM design_metrics
                     WHERE recorded_at BETWEEN $1 AND $2
                     ORDER BY recorded_at"
                ))
                .bind(start)
                .bind(end)
                .fetch_all(&self.pool)
                .await
            }
        }
        .context("Failed to list metrics by time range")?;

        Ok(rows.iter().map(metric_from_row).collect())
    }
}
