use std::collections::HashMap;
use std::sync::Arc;

use crate::{Connector, ConnectorFactory, Error, MetricsStore, Result, SourceType};

/// Registry mapping source types to connector factories.
pub struct Registry {
    factories: HashMap<SourceType, Arc<dyn ConnectorFactory>>,
    store: Arc<dyn MetricsStore>,
}

impl Registry {
    pub fn new(store: Arc<dyn MetricsStore>) -> Self {
        Self {
            factories: HashMap::new(),
            store,
        }
    }

    /// Register a connector factory.
    pub fn register(&mut self, factory: Arc<dyn ConnectorFactory>) {
        self.factories.insert(factory.source_type(), factory);
    }

    /// Resolve a connector for a source type.
    pub fn resolve(&self, source_type: SourceType) -> Result<Box<dyn Connector>> {
        self.factories
            .get(&source_type)
            .map(|factory| factory.create(self.store.clone()))
            .ok_or_else(|| Error::UnsupportedSourceType(source_type.to_string()))
    }

    /// List all registered source types.
    pub fn source_types(&self) -> Vec<SourceType> {
        self.factories.keys().copied().collect()
    }
}
