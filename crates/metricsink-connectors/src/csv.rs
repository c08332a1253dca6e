use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use metricsink_core::{
    parse_credentials, Connector, ConnectorFactory, Error, Metric, MetricsStore, RawRecord,
    Result, SourceType,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CsvSettings {
    /// Column-to-field mapping, in row order: feature, metric name, value,
    /// recorded-at date.
    mappings: Vec<String>,
}

/// Reads metric rows from uploaded CSV files.
pub struct CsvConnector {
    store: Arc<dyn MetricsStore>,
}

impl CsvConnector {
    pub fn new(store: Arc<dyn MetricsStore>) -> Self {
        Self { store }
    }
}

fn parse_recorded_at(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(at.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[async_trait]
impl Connector for CsvConnector {
    fn source_type(&self) -> SourceType {
        SourceType::Csv
    }

    fn store(&self) -> &Arc<dyn MetricsStore> {
        &self.store
    }

    async fn connect(&self, credentials: &Value) -> Result<()> {
        let settings: CsvSettings = parse_credentials(SourceType::Csv, credentials)?;
        if settings.mappings.is_empty() {
            return Err(Error::InvalidCredentials {
                source_type: SourceType::Csv,
                reason: "mappings must not be empty".to_string(),
            });
        }
        Ok(())
    }

    async fn extract(&self, _credentials: &Value) -> Result<Vec<RawRecord>> {
        // Sample sync window standing in for a parsed upload.
        Ok(vec![
            RawRecord::Row(vec![
                "Dashboard".to_string(),
                "DesignTime".to_string(),
                "87".to_string(),
                "2023-05-01".to_string(),
            ]),
            RawRecord::Row(vec![
                "Payments".to_string(),
                "ImplementationTime".to_string(),
                "92".to_string(),
                "2023-05-02".to_string(),
            ]),
            RawRecord::Row(vec![
                "Accounts".to_string(),
                "UsabilityScore".to_string(),
                "85".to_string(),
                "2023-05-03".to_string(),
            ]),
            RawRecord::Row(vec![
                "Dashboard".to_string(),
                "UsabilityScore".to_string(),
                "90".to_string(),
                "2023-05-04".to_string(),
            ]),
        ])
    }

    /// Rows carry their own timestamps, so `now` is unused. Rows that fail
    /// to parse are skipped rather than producing non-numeric metrics.
    fn transform(&self, records: &[RawRecord], _now: DateTime<Utc>) -> Vec<Metric> {
        records
            .iter()
            .filter_map(|record| match record {
                RawRecord::Row(fields) => {
                    let [feature, metric_name, value, date] = fields.as_slice() else {
                        warn!(fields = fields.len(), "skipping row with wrong field count");
                        return None;
                    };

                    let Ok(metric_value) = value.trim().parse::<f64>() else {
                        warn!(value = %value, "skipping row with non-numeric value");
                        return None;
                    };
                    let Some(recorded_at) = parse_recorded_at(date) else {
                        warn!(date = %date, "skipping row with unparsable date");
                        return None;
                    };

                    Some(Metric::new(
                        metric_name.to_lowercase(),
                        metric_value,
                        recorded_at,
                        feature.to_lowercase(),
                        SourceType::Csv,
                    ))
                }
                other => {
                    warn!(record = ?other, "skipping record from another source");
                    None
                }
            })
            .collect()
    }
}

pub struct CsvConnectorFactory;

impl ConnectorFactory for CsvConnectorFactory {
    fn source_type(&self) -> SourceType {
        SourceType::Csv
    }

    fn create(&self, store: Arc<dyn MetricsStore>) -> Box<dyn Connector> {
        Box::new(CsvConnector::new(store))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use metricsink_store::MemoryMetricsStore;
    use serde_json::json;

    fn connector() -> CsvConnector {
        CsvConnector::new(Arc::new(MemoryMetricsStore::new()))
    }

    #[tokio::test]
    async fn connect_rejects_empty_mappings() {
        let c = connector();
        assert!(c
            .connect(&json!({"mappings": ["feature", "metric", "value", "date"]}))
            .await
            .is_ok());
        assert!(c.connect(&json!({"mappings": []})).await.is_err());
        assert!(c.connect(&json!({})).await.is_err());
    }

    #[tokio::test]
    async fn transform_uses_positional_fields() {
        let c = connector();
        let records = vec![RawRecord::Row(vec![
            "Dashboard".to_string(),
            "DesignTime".to_string(),
            "87".to_string(),
            "2023-05-01".to_string(),
        ])];

        let metrics = c.transform(&records, Utc::now());
        assert_eq!(metrics.len(), 1);
        assert_eq!(metrics[0].feature_id, "dashboard");
        assert_eq!(metrics[0].metric_name, "designtime");
        assert_eq!(metrics[0].metric_value, 87.0);
        assert_eq!(
            metrics[0].recorded_at,
            Utc.with_ymd_and_hms(2023, 5, 1, 0, 0, 0).unwrap()
        );
        assert_eq!(metrics[0].platform_type, "csv");
    }

    #[tokio::test]
    async fn transform_skips_bad_rows() {
        let c = connector();
        let records = vec![
            RawRecord::Row(vec!["Dashboard".to_string(), "DesignTime".to_string()]),
            RawRecord::Row(vec![
                "Dashboard".to_string(),
                "DesignTime".to_string(),
                "not-a-number".to_string(),
                "2023-05-01".to_string(),
            ]),
            RawRecord::Row(vec![
                "Dashboard".to_string(),
                "DesignTime".to_string(),
                "87".to_string(),
                "yesterday".to_string(),
            ]),
            RawRecord::Row(vec![
                "Payments".to_string(),
                "UsabilityScore".to_string(),
                "92".to_string(),
                "2023-05-02".to_string(),
            ]),
        ];

        let metrics = c.transform(&records, Utc::now());
        assert_eq!(metrics.len(), 1);
        assert_eq!(metrics[0].feature_id, "payments");
    }
}
