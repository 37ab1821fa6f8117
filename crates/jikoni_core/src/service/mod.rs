//! Resource services and the decorators composed around them.
//!
//! # Responsibility
//! - Define the service contract shared by the core service and decorators.
//! - Compose the production chain `Metrics(Logging(Core))`.
//!
//! # Invariants
//! - Decorators forward every call unchanged and never alter its result.
//! - Each decorator observes every call exactly once, on success and
//!   failure alike.

use crate::context::CallContext;
use crate::error::ResourceResult;
use crate::model::{Entity, PageMetadata, ResultPage};
use std::sync::Arc;

pub mod logging;
pub mod metrics;
pub mod resource_service;

pub use logging::{LoggingMiddleware, CALL_LOG_TARGET};
pub use metrics::{InMemoryMetrics, MethodMetrics, MetricsMiddleware, MetricsRecorder};
pub use resource_service::CoreService;

/// Service method, labelled per resource in logs and metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Create,
    View,
    List,
    Update,
    Delete,
}

impl Method {
    pub const ALL: [Method; 5] = [
        Self::Create,
        Self::View,
        Self::List,
        Self::Update,
        Self::Delete,
    ];

    pub fn verb(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::View => "view",
            Self::List => "list",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }

    /// `create_order`, `list_orders`, ...
    pub fn label<E: Entity>(self) -> String {
        match self {
            Self::List => format!("{}_{}", self.verb(), E::COLLECTION),
            _ => format!("{}_{}", self.verb(), E::KIND),
        }
    }
}

/// Token-threaded resource lifecycle contract.
///
/// The token is passed through to every layer; no layer authorizes it.
pub trait ResourceService<E: Entity>: Send + Sync {
    /// Validates and stamps `entity`, then persists it. Returns the new id.
    fn create(&self, ctx: &CallContext, token: &str, entity: E) -> ResourceResult<String>;

    fn view(&self, ctx: &CallContext, token: &str, id: &str) -> ResourceResult<E>;

    fn list(
        &self,
        ctx: &CallContext,
        token: &str,
        page: &PageMetadata<E::Filter>,
    ) -> ResourceResult<ResultPage<E>>;

    /// Applies the non-empty fields of `entity` to the stored entity.
    fn update(&self, ctx: &CallContext, token: &str, entity: E) -> ResourceResult<()>;

    /// Idempotent: absent ids succeed.
    fn delete(&self, ctx: &CallContext, token: &str, id: &str) -> ResourceResult<()>;
}

impl<E: Entity, S: ResourceService<E> + ?Sized> ResourceService<E> for Arc<S> {
    fn create(&self, ctx: &CallContext, token: &str, entity: E) -> ResourceResult<String> {
        (**self).create(ctx, token, entity)
    }

    fn view(&self, ctx: &CallContext, token: &str, id: &str) -> ResourceResult<E> {
        (**self).view(ctx, token, id)
    }

    fn list(
        &self,
        ctx: &CallContext,
        token: &str,
        page: &PageMetadata<E::Filter>,
    ) -> ResourceResult<ResultPage<E>> {
        (**self).list(ctx, token, page)
    }

    fn update(&self, ctx: &CallContext, token: &str, entity: E) -> ResourceResult<()> {
        (**self).update(ctx, token, entity)
    }

    fn delete(&self, ctx: &CallContext, token: &str, id: &str) -> ResourceResult<()> {
        (**self).delete(ctx, token, id)
    }
}

impl<E: Entity, S: ResourceService<E> + ?Sized> ResourceService<E> for Box<S> {
    fn create(&self, ctx: &CallContext, token: &str, entity: E) -> ResourceResult<String> {
        (**self).create(ctx, token, entity)
    }

    fn view(&self, ctx: &CallContext, token: &str, id: &str) -> ResourceResult<E> {
        (**self).view(ctx, token, id)
    }

    fn list(
        &self,
        ctx: &CallContext,
        token: &str,
        page: &PageMetadata<E::Filter>,
    ) -> ResourceResult<ResultPage<E>> {
        (**self).list(ctx, token, page)
    }

    fn update(&self, ctx: &CallContext, token: &str, entity: E) -> ResourceResult<()> {
        (**self).update(ctx, token, entity)
    }

    fn delete(&self, ctx: &CallContext, token: &str, id: &str) -> ResourceResult<()> {
        (**self).delete(ctx, token, id)
    }
}

/// Production decorator order: metrics outermost, then logging.
pub fn instrument<E, S>(
    core: S,
    recorder: Arc<dyn MetricsRecorder>,
) -> MetricsMiddleware<LoggingMiddleware<S>>
where
    E: Entity,
    S: ResourceService<E>,
{
    MetricsMiddleware::new(LoggingMiddleware::new(core), recorder)
}
