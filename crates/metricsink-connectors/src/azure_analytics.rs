use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use metricsink_core::{
    parse_credentials, require_non_empty, Connector, ConnectorFactory, Metric, MetricsStore,
    RawRecord, Result, SourceType,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AzureAnalyticsCredentials {
    app_id: String,
    api_key: String,
}

/// Pulls API request aggregates out of Azure Application Insights.
pub struct AzureAnalyticsConnector {
    store: Arc<dyn MetricsStore>,
}

impl AzureAnalyticsConnector {
    pub fn new(store: Arc<dyn MetricsStore>) -> Self {
        Self { store }
    }
}

/// Second non-empty path segment, lowercased; API routes are shaped
/// `/api/<feature>/...`.
fn feature_from_api_path(path: &str) -> String {
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .nth(1)
        .map(|segment| segment.to_lowercase())
        .unwrap_or_else(|| "other".to_string())
}

#[async_trait]
impl Connector for AzureAnalyticsConnector {
    fn source_type(&self) -> SourceType {
        SourceType::AzureAnalytics
    }

    fn store(&self) -> &Arc<dyn MetricsStore> {
        &self.store
    }

    async fn connect(&self, credentials: &Value) -> Result<()> {
        let creds: AzureAnalyticsCredentials =
            parse_credentials(SourceType::AzureAnalytics, credentials)?;
        require_non_empty(
            SourceType::AzureAnalytics,
            &[("appId", &creds.app_id), ("apiKey", &creds.api_key)],
        )
    }

    async fn extract(&self, _credentials: &Value) -> Result<Vec<RawRecord>> {
        // Sample sync window standing in for the App Insights query API.
        Ok(vec![
            RawRecord::ApiTraffic {
                path: "/api/dashboard".to_string(),
                requests: 2300,
                duration_ms: 185.0,
                failure_rate: 0.02,
            },
            RawRecord::ApiTraffic {
                path: "/api/accounts".to_string(),
                requests: 1850,
                duration_ms: 210.0,
                failure_rate: 0.03,
            },
            RawRecord::ApiTraffic {
                path: "/api/payments".to_string(),
                requests: 3200,
                duration_ms: 230.0,
                failure_rate: 0.01,
            },
            RawRecord::ApiTraffic {
                path: "/api/profile".to_string(),
                requests: 1450,
                duration_ms: 190.0,
                failure_rate: 0.04,
            },
        ])
    }

    fn transform(&self, records: &[RawRecord], now: DateTime<Utc>) -> Vec<Metric> {
        records
            .iter()
            .flat_map(|record| match record {
                RawRecord::ApiTraffic {
                    path,
                    requests,
                    duration_ms,
                    failure_rate,
                } => {
                    let feature = feature_from_api_path(path);
                    vec![
                        Metric::new(
                            "api_requests",
                            *requests as f64,
                            now,
                            feature.clone(),
                            SourceType::AzureAnalytics,
                        ),
                        Metric::new(
                            "api_response_time",
                            *duration_ms,
                            now,
                            feature.clone(),
                            SourceType::AzureAnalytics,
                        ),
                        // Failure rate arrives as a fraction.
                        Metric::new(
                            "api_failure_rate",
                            failure_rate * 100.0,
                            now,
                            feature,
                            SourceType::AzureAnalytics,
                        ),
                    ]
                }
                other => {
                    warn!(record = ?other, "skipping record from another source");
                    Vec::new()
                }
            })
            .collect()
    }
}

pub struct AzureAnalyticsConnectorFactory;

impl ConnectorFactory for AzureAnalyticsConnectorFactory {
    fn source_type(&self) -> SourceType {
        SourceType::AzureAnalytics
    }

    fn create(&self, store: Arc<dyn MetricsStore>) -> Box<dyn Connector> {
        Box::new(AzureAnalyticsConnector::new(store))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use metricsink_store::MemoryMetricsStore;
    use serde_json::json;

    fn connector() -> AzureAnalyticsConnector {
        AzureAnalyticsConnector::new(Arc::new(MemoryMetricsStore::new()))
    }

    #[tokio::test]
    async fn connect_requires_app_id_and_api_key() {
        let c = connector();
        assert!(c
            .connect(&json!({"appId": "app", "apiKey": "key"}))
            .await
            .is_ok());
        assert!(c.connect(&json!({"appId": "app"})).await.is_err());
        assert!(c.connect(&json!({"apiKey": "key"})).await.is_err());
    }

    #[tokio::test]
    async fn transform_tags_by_second_path_segment() {
        let c = connector();
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let records = vec![
            RawRecord::ApiTraffic {
                path: "/api/Payments".to_string(),
                requests: 3200,
                duration_ms: 230.0,
                failure_rate: 0.01,
            },
            RawRecord::ApiTraffic {
                path: "/health".to_string(),
                requests: 10,
                duration_ms: 2.0,
                failure_rate: 0.0,
            },
        ];

        let metrics = c.transform(&records, now);
        assert_eq!(metrics.len(), 6);
        assert_eq!(metrics[0].metric_name, "api_requests");
        assert_eq!(metrics[0].feature_id, "payments");
        assert_eq!(metrics[2].metric_name, "api_failure_rate");
        assert_eq!(metrics[2].metric_value, 1.0);
        // No second segment: falls back to "other".
        assert_eq!(metrics[3].feature_id, "other");
    }
}
