//! Resource lifecycle core for the Jikoni order and shop services.
//! Orders and shops share one generic service, repository and decorator
//! chain, instantiated per resource type.

pub mod config;
pub mod context;
pub mod db;
pub mod endpoint;
pub mod error;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ConfigError, LoggingConfig, StoreConfig};
pub use context::CallContext;
pub use db::{open_store, open_store_in_memory, DbError, DbResult, Store};
pub use endpoint::{
    bearer_token, CreateRequest, DeleteRequest, Endpoint, ListRequest, UpdateRequest,
    ViewRequest,
};
pub use error::{ErrorClass, ErrorKind, Operation, ResourceError, ResourceResult};
pub use logging::{default_log_level, init_from_config, init_logging, logging_status};
pub use model::order::{Order, OrderFilter, OrderPlace, OrderStatus};
pub use model::shop::{Shop, ShopFilter};
pub use model::{Entity, EntityValidationError, Metadata, PageMetadata, ResultPage};
pub use repo::order_repo::OrderRepository;
pub use repo::shop_repo::ShopRepository;
pub use repo::{ResourceRepository, SqliteRepository};
pub use service::{
    instrument, CoreService, InMemoryMetrics, LoggingMiddleware, Method, MetricsMiddleware,
    MetricsRecorder, ResourceService,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
