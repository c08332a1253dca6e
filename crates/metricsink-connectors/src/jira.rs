use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use metricsink_core::{
    parse_credentials, require_non_empty, Connector, ConnectorFactory, Metric, MetricsStore,
    RawRecord, Result, SourceType,
};

/// Keywords matched against issue summaries to derive the feature tag.
const FEATURE_KEYWORDS: [&str; 3] = ["dashboard", "payment", "account"];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JiraCredentials {
    domain: String,
    api_token: String,
    email: String,
    project_key: String,
}

/// Pulls design-impact issues out of a Jira project.
pub struct JiraConnector {
    store: Arc<dyn MetricsStore>,
}

impl JiraConnector {
    pub fn new(store: Arc<dyn MetricsStore>) -> Self {
        Self { store }
    }
}

/// Earliest case-insensitive keyword occurrence in the summary wins.
fn feature_for_summary(summary: &str) -> String {
    let lowered = summary.to_lowercase();
    FEATURE_KEYWORDS
        .iter()
        .filter_map(|keyword| lowered.find(keyword).map(|at| (at, *keyword)))
        .min_by_key(|(at, _)| *at)
        .map(|(_, keyword)| keyword.to_string())
        .unwrap_or_else(|| "other".to_string())
}

fn whole_days(span: Duration) -> f64 {
    (span.num_seconds() as f64 / 86_400.0).round()
}

#[async_trait]
impl Connector for JiraConnector {
    fn source_type(&self) -> SourceType {
        SourceType::Jira
    }

    fn store(&self) -> &Arc<dyn MetricsStore> {
        &self.store
    }

    async fn connect(&self, credentials: &Value) -> Result<()> {
        let creds: JiraCredentials = parse_credentials(SourceType::Jira, credentials)?;
        require_non_empty(
            SourceType::Jira,
            &[
                ("domain", &creds.domain),
                ("apiToken", &creds.api_token),
                ("email", &creds.email),
                ("projectKey", &creds.project_key),
            ],
        )
    }

    async fn extract(&self, _credentials: &Value) -> Result<Vec<RawRecord>> {
        // Sample sync window standing in for a Jira JQL search.
        let now = Utc::now();
        Ok(vec![
            RawRecord::Issue {
                key: "FIN-123".to_string(),
                summary: "Update payment flow design".to_string(),
                status: "Done".to_string(),
                labels: vec!["design-impact".to_string(), "ux-improvement".to_string()],
                created: now - Duration::days(3),
                resolved: Some(now),
            },
            RawRecord::Issue {
                key: "FIN-145".to_string(),
                summary: "Dashboard component inconsistency".to_string(),
                status: "In Progress".to_string(),
                labels: vec!["design-impact".to_string(), "bug".to_string()],
                created: now - Duration::days(1),
                resolved: None,
            },
            RawRecord::Issue {
                key: "FIN-167".to_string(),
                summary: "Improve account section navigation".to_string(),
                status: "Done".to_string(),
                labels: vec!["design-impact".to_string(), "enhancement".to_string()],
                created: now - Duration::days(5),
                resolved: Some(now),
            },
        ])
    }

    fn transform(&self, records: &[RawRecord], now: DateTime<Utc>) -> Vec<Metric> {
        records
            .iter()
            .flat_map(|record| match record {
                RawRecord::Issue {
                    summary,
                    status,
                    created,
                    resolved,
                    ..
                } => {
                    let feature = feature_for_summary(summary);
                    let mut metrics = Vec::with_capacity(2);

                    if status == "Done" {
                        if let Some(resolved) = resolved {
                            metrics.push(Metric::new(
                                "design_time_to_resolution",
                                whole_days(*resolved - *created),
                                now,
                                feature.clone(),
                                SourceType::Jira,
                            ));
                        }
                    }

                    metrics.push(Metric::new(
                        "design_issue_count",
                        1.0,
                        now,
                        feature,
                        SourceType::Jira,
                    ));

                    metrics
                }
                other => {
                    warn!(record = ?other, "skipping record from another source");
                    Vec::new()
                }
            })
            .collect()
    }
}

pub struct JiraConnectorFactory;

impl ConnectorFactory for JiraConnectorFactory {
    fn source_type(&self) -> SourceType {
        SourceType::Jira
    }

    fn create(&self, store: Arc<dyn MetricsStore>) -> Box<dyn Connector> {
        Box::new(JiraConnector::new(store))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use metricsink_store::MemoryMetricsStore;
    use serde_json::json;

    fn connector() -> JiraConnector {
        JiraConnector::new(Arc::new(MemoryMetricsStore::new()))
    }

    fn full_credentials() -> Value {
        json!({
            "domain": "example.atlassian.net",
            "apiToken": "t",
            "email": "design@example.com",
            "projectKey": "FIN"
        })
    }

    #[tokio::test]
    async fn connect_requires_all_four_fields() {
        let c = connector();
        assert!(c.connect(&full_credentials()).await.is_ok());

        for missing in ["domain", "apiToken", "email", "projectKey"] {
            let mut creds = full_credentials();
            creds.as_object_mut().unwrap().remove(missing);
            assert!(c.connect(&creds).await.is_err(), "{missing} should be required");
        }
    }

    #[tokio::test]
    async fn done_issue_emits_resolution_time_in_whole_days() {
        let c = connector();
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let records = vec![RawRecord::Issue {
            key: "FIN-1".to_string(),
            summary: "Update payment flow design".to_string(),
            status: "Done".to_string(),
            labels: vec![],
            created: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            resolved: Some(Utc.with_ymd_and_hms(2024, 1, 4, 0, 0, 0).unwrap()),
        }];

        let metrics = c.transform(&records, now);
        assert_eq!(metrics.len(), 2);
        assert_eq!(metrics[0].metric_name, "design_time_to_resolution");
        assert_eq!(metrics[0].metric_value, 3.0);
        assert_eq!(metrics[0].feature_id, "payment");
        assert_eq!(metrics[1].metric_name, "design_issue_count");
        assert_eq!(metrics[1].metric_value, 1.0);
    }

    #[tokio::test]
    async fn open_issue_only_counts() {
        let c = connector();
        let now = Utc::now();
        let records = vec![RawRecord::Issue {
            key: "FIN-2".to_string(),
            summary: "Polish onboarding copy".to_string(),
            status: "In Progress".to_string(),
            labels: vec![],
            created: now,
            resolved: None,
        }];

        let metrics = c.transform(&records, now);
        assert_eq!(metrics.len(), 1);
        assert_eq!(metrics[0].metric_name, "design_issue_count");
        assert_eq!(metrics[0].feature_id, "other");
    }

    #[test]
    fn feature_match_is_case_insensitive_and_earliest_wins() {
        assert_eq!(feature_for_summary("Dashboard component drift"), "dashboard");
        assert_eq!(feature_for_summary("ACCOUNT page overhaul"), "account");
        assert_eq!(
            feature_for_summary("Fix payment widget on dashboard"),
            "payment"
        );
        assert_eq!(feature_for_summary("Misc cleanup"), "other");
    }
}
