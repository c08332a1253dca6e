mod connector;
mod error;
mod factory;
mod metric;
mod pipeline;
mod registry;
mod scheduler;
mod source;
mod store;

pub use connector::{parse_credentials, require_non_empty, Connector, SyncState, SyncStatus};
pub use error::{Error, Result};
pub use factory::ConnectorFactory;
pub use metric::{AssetKind, Metric, RawRecord};
pub use pipeline::{EtlPipeline, StatusSummary, SyncResult};
pub use registry::Registry;
pub use scheduler::{schedule_jobs, SchedulerHandle};
pub use source::SourceType;
pub use store::{
    Connection, ConnectionStatus, MetricsStore, NewConnection, SyncLogEntry,
};
