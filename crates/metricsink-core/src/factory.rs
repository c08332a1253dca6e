use std::sync::Arc;

use crate::{Connector, MetricsStore, SourceType};

/// Factory trait for creating connectors.
pub trait ConnectorFactory: Send + Sync {
    /// Source type this factory builds connectors for.
    fn source_type(&self) -> SourceType;

    /// Create a connector bound to the given store.
    fn create(&self, store: Arc<dyn MetricsStore>) -> Box<dyn Connector>;
}
