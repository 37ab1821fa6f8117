//! Call logging decorator.
//!
//! # Invariants
//! - Exactly one record per call, written after the inner call returns.
//! - Records never carry the token or metadata payloads.

use crate::context::CallContext;
use crate::error::{ErrorClass, ResourceError, ResourceResult};
use crate::model::{Entity, PageMetadata, ResultPage};
use crate::service::{Method, ResourceService};
use log::{error, info, warn};
use std::time::Instant;

/// Log target of call records.
pub const CALL_LOG_TARGET: &str = "jikoni::calls";

/// Logs one `event=resource_call` record per call.
#[derive(Debug, Clone)]
pub struct LoggingMiddleware<S> {
    inner: S,
}

impl<S> LoggingMiddleware<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

fn record<E: Entity>(
    method: Method,
    started_at: Instant,
    fields: &str,
    outcome: Result<String, &ResourceError>,
) {
    let duration_ms = started_at.elapsed().as_millis();
    let label = method.label::<E>();
    match outcome {
        Ok(result_fields) => info!(
            target: CALL_LOG_TARGET,
            "event=resource_call module=service status=ok resource={} method={label} duration_ms={duration_ms} {fields}{result_fields}",
            E::KIND
        ),
        Err(err) if err.kind().class() == ErrorClass::Server => error!(
            target: CALL_LOG_TARGET,
            "event=resource_call module=service status=error resource={} method={label} duration_ms={duration_ms} {fields} error_kind={} error={:?}",
            E::KIND,
            err.kind().as_str(),
            failure_text(err)
        ),
        Err(err) => warn!(
            target: CALL_LOG_TARGET,
            "event=resource_call module=service status=error resource={} method={label} duration_ms={duration_ms} {fields} error_kind={} error={:?}",
            E::KIND,
            err.kind().as_str(),
            failure_text(err)
        ),
    }
}

fn failure_text(err: &ResourceError) -> String {
    match err.cause_text() {
        Some(cause) => format!("{err}: {cause}"),
        None => err.to_string(),
    }
}

impl<E: Entity, S: ResourceService<E>> ResourceService<E> for LoggingMiddleware<S> {
    fn create(&self, ctx: &CallContext, token: &str, entity: E) -> ResourceResult<String> {
        let started_at = Instant::now();
        let fields = entity.log_fields();
        let result = self.inner.create(ctx, token, entity);
        match &result {
            Ok(id) => record::<E>(Method::Create, started_at, &fields, Ok(format!(" id={id}"))),
            Err(err) => record::<E>(Method::Create, started_at, &fields, Err(err)),
        }
        result
    }

    fn view(&self, ctx: &CallContext, token: &str, id: &str) -> ResourceResult<E> {
        let started_at = Instant::now();
        let result = self.inner.view(ctx, token, id);
        let fields = format!("id={id}");
        match &result {
            Ok(entity) => record::<E>(
                Method::View,
                started_at,
                &fields,
                Ok(format!(" {}", entity.log_fields())),
            ),
            Err(err) => record::<E>(Method::View, started_at, &fields, Err(err)),
        }
        result
    }

    fn list(
        &self,
        ctx: &CallContext,
        token: &str,
        page: &PageMetadata<E::Filter>,
    ) -> ResourceResult<ResultPage<E>> {
        let started_at = Instant::now();
        let result = self.inner.list(ctx, token, page);
        let fields = format!("offset={} limit={}", page.offset, page.limit);
        match &result {
            Ok(found) => record::<E>(
                Method::List,
                started_at,
                &fields,
                Ok(format!(" total={} returned={}", found.total, found.items.len())),
            ),
            Err(err) => record::<E>(Method::List, started_at, &fields, Err(err)),
        }
        result
    }

    fn update(&self, ctx: &CallContext, token: &str, entity: E) -> ResourceResult<()> {
        let started_at = Instant::now();
        let fields = format!("id={} {}", entity.id(), entity.log_fields());
        let result = self.inner.update(ctx, token, entity);
        match &result {
            Ok(()) => record::<E>(Method::Update, started_at, &fields, Ok(String::new())),
            Err(err) => record::<E>(Method::Update, started_at, &fields, Err(err)),
        }
        result
    }

    fn delete(&self, ctx: &CallContext, token: &str, id: &str) -> ResourceResult<()> {
        let started_at = Instant::now();
        let result = self.inner.delete(ctx, token, id);
        let fields = format!("id={id}");
        match &result {
            Ok(()) => record::<E>(Method::Delete, started_at, &fields, Ok(String::new())),
            Err(err) => record::<E>(Method::Delete, started_at, &fields, Err(err)),
        }
        result
    }
}
