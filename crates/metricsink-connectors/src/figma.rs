use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use metricsink_core::{
    parse_credentials, require_non_empty, AssetKind, Connector, ConnectorFactory, Metric,
    MetricsStore, RawRecord, Result, SourceType,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FigmaCredentials {
    api_key: String,
    team_id: String,
}

/// Pulls component and style usage out of a Figma team library.
pub struct FigmaConnector {
    store: Arc<dyn MetricsStore>,
}

impl FigmaConnector {
    pub fn new(store: Arc<dyn MetricsStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Connector for FigmaConnector {
    fn source_type(&self) -> SourceType {
        SourceType::Figma
    }

    fn store(&self) -> &Arc<dyn MetricsStore> {
        &self.store
    }

    async fn connect(&self, credentials: &Value) -> Result<()> {
        let creds: FigmaCredentials = parse_credentials(SourceType::Figma, credentials)?;
        require_non_empty(
            SourceType::Figma,
            &[("apiKey", &creds.api_key), ("teamId", &creds.team_id)],
        )
    }

    async fn extract(&self, _credentials: &Value) -> Result<Vec<RawRecord>> {
        // Sample sync window standing in for the Figma REST API.
        let last_updated = Utc::now();
        Ok(vec![
            RawRecord::DesignAsset {
                kind: AssetKind::Component,
                name: "Button".to_string(),
                variants: Some(4),
                usage: 86,
                last_updated,
            },
            RawRecord::DesignAsset {
                kind: AssetKind::Component,
                name: "Card".to_string(),
                variants: Some(3),
                usage: 52,
                last_updated,
            },
            RawRecord::DesignAsset {
                kind: AssetKind::Style,
                name: "Colors".to_string(),
                variants: None,
                usage: 124,
                last_updated,
            },
            RawRecord::DesignAsset {
                kind: AssetKind::Style,
                name: "Typography".to_string(),
                variants: None,
                usage: 98,
                last_updated,
            },
        ])
    }

    fn transform(&self, records: &[RawRecord], now: DateTime<Utc>) -> Vec<Metric> {
        records
            .iter()
            .filter_map(|record| match record {
                RawRecord::DesignAsset {
                    kind, name, usage, ..
                } => {
                    let (metric_name, prefix) = match kind {
                        AssetKind::Component => ("component_usage", "component"),
                        AssetKind::Style => ("style_usage", "style"),
                    };
                    Some(
                        Metric::new(
                            metric_name,
                            f64::from(*usage),
                            now,
                            format!("{}_{}", prefix, name.to_lowercase()),
                            SourceType::Figma,
                        )
                        .with_segment("designers"),
                    )
                }
                other => {
                    warn!(record = ?other, "skipping record from another source");
                    None
                }
            })
            .collect()
    }
}

pub struct FigmaConnectorFactory;

impl ConnectorFactory for FigmaConnectorFactory {
    fn source_type(&self) -> SourceType {
        SourceType::Figma
    }

    fn create(&self, store: Arc<dyn MetricsStore>) -> Box<dyn Connector> {
        Box::new(FigmaConnector::new(store))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use metricsink_store::MemoryMetricsStore;
    use serde_json::json;

    fn connector() -> FigmaConnector {
        FigmaConnector::new(Arc::new(MemoryMetricsStore::new()))
    }

    #[tokio::test]
    async fn connect_requires_api_key_and_team_id() {
        let c = connector();
        assert!(c
            .connect(&json!({"apiKey": "x", "teamId": "y"}))
            .await
            .is_ok());
        assert!(c.connect(&json!({"apiKey": "x"})).await.is_err());
        assert!(c.connect(&json!({"teamId": "y"})).await.is_err());
        assert!(c.connect(&json!({})).await.is_err());
        assert!(c
            .connect(&json!({"apiKey": "", "teamId": "y"}))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn transform_maps_components_and_styles() {
        let c = connector();
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let records = c.extract(&json!({})).await.unwrap();
        let metrics = c.transform(&records, now);

        assert_eq!(metrics.len(), 4);
        assert_eq!(metrics[0].metric_name, "component_usage");
        assert_eq!(metrics[0].feature_id, "component_button");
        assert_eq!(metrics[0].metric_value, 86.0);
        assert_eq!(metrics[0].user_segment.as_deref(), Some("designers"));
        assert_eq!(metrics[0].platform_type, "figma");
        assert_eq!(metrics[2].metric_name, "style_usage");
        assert_eq!(metrics[2].feature_id, "style_colors");
        assert_eq!(metrics[3].feature_id, "style_typography");
    }

    #[tokio::test]
    async fn transform_is_pure() {
        let c = connector();
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let records = c.extract(&json!({})).await.unwrap();
        assert_eq!(c.transform(&records, now), c.transform(&records, now));
    }
}
