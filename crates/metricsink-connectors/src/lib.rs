//! Connector variants for every supported data source. Each module pairs a
//! typed credentials struct with the extract/transform rules for that
//! source; persistence and status lookups are shared via the core trait.

mod azure_analytics;
mod csv;
mod figma;
mod google_analytics;
mod jira;
mod power_bi;

pub use azure_analytics::{AzureAnalyticsConnector, AzureAnalyticsConnectorFactory};
pub use csv::{CsvConnector, CsvConnectorFactory};
pub use figma::{FigmaConnector, FigmaConnectorFactory};
pub use google_analytics::{GoogleAnalyticsConnector, GoogleAnalyticsConnectorFactory};
pub use jira::{JiraConnector, JiraConnectorFactory};
pub use power_bi::{PowerBiConnector, PowerBiConnectorFactory};

use std::sync::Arc;

use metricsink_core::Registry;

/// Register every built-in connector factory.
pub fn register_all(registry: &mut Registry) {
    registry.register(Arc::new(FigmaConnectorFactory));
    registry.register(Arc::new(JiraConnectorFactory));
    registry.register(Arc::new(GoogleAnalyticsConnectorFactory));
    registry.register(Arc::new(AzureAnalyticsConnectorFactory));
    registry.register(Arc::new(PowerBiConnectorFactory));
    registry.register(Arc::new(CsvConnectorFactory));
}
