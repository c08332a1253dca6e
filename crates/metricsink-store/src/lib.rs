mod memory;
mod pg_store;

pub use memory::MemoryMetricsStore;
pub use pg_store::PgMetricsStore;
