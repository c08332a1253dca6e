use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::SourceType;

/// Normalized unit persisted by the load step. References its originating
/// connection only through the platform/feature tags, so metrics outlive a
/// deleted connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub metric_name: String,

    /// Always numeric; fractional source values are pre-multiplied into the
    /// 0-100 range by transform.
    pub metric_value: f64,

    pub recorded_at: DateTime<Utc>,

    /// Product feature this measurement is grouped under.
    pub feature_id: String,

    pub user_segment: Option<String>,

    /// Tag of the source type that produced this metric.
    pub platform_type: String,
}

impl Metric {
    pub fn new(
        metric_name: impl Into<String>,
        metric_value: f64,
        recorded_at: DateTime<Utc>,
        feature_id: impl Into<String>,
        source_type: SourceType,
    ) -> Self {
        Self {
            metric_name: metric_name.into(),
            metric_value,
            recorded_at,
            feature_id: feature_id.into(),
            user_segment: Some("all".to_string()),
            platform_type: source_type.as_str().to_string(),
        }
    }

    pub fn with_segment(mut self, segment: impl Into<String>) -> Self {
        self.user_segment = Some(segment.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Component,
    Style,
}

/// Source-specific payload pulled by extract, before normalization.
/// Lives only within a single pipeline run and is never persisted.
#[derive(Debug, Clone, PartialEq)]
pub enum RawRecord {
    /// Figma component or style with its usage count.
    DesignAsset {
        kind: AssetKind,
        name: String,
        variants: Option<u32>,
        usage: u32,
        last_updated: DateTime<Utc>,
    },

    /// Jira issue flagged as design-impacting.
    Issue {
        key: String,
        summary: String,
        status: String,
        labels: Vec<String>,
        created: DateTime<Utc>,
        resolved: Option<DateTime<Utc>>,
    },

    /// Google Analytics page-path aggregate.
    PageTraffic {
        path: String,
        page_views: u64,
        avg_time_on_page: f64,
        bounce_rate: f64,
    },

    /// Azure Application Insights API-path aggregate.
    ApiTraffic {
        path: String,
        requests: u64,
        duration_ms: f64,
        failure_rate: f64,
    },

    /// Power BI feature delivery rollup.
    FeatureDelivery {
        feature: String,
        design_time: f64,
        implementation_time: f64,
        usability_score: f64,
    },

    /// One parsed CSV row, fields in column-mapping order.
    Row(Vec<String>),
}
