//! Call metrics decorator and in-process recorder.
//!
//! # Responsibility
//! - Count calls and record latency per method label.
//! - Keep a process-local registry that can be rendered as text exposition.
//!
//! # Invariants
//! - Every call is observed once, whatever its outcome.
//! - The decorator never inspects or alters the call result.

use crate::context::CallContext;
use crate::error::ResourceResult;
use crate::model::{Entity, PageMetadata, ResultPage};
use crate::service::{Method, ResourceService};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::Arc;
use std::time::{Duration, Instant};

pub const REQUEST_COUNT: &str = "request_count";
pub const REQUEST_LATENCY: &str = "request_latency_microseconds";

/// Upper bounds (inclusive) of the latency buckets, in microseconds.
pub const LATENCY_BUCKETS_US: [u64; 10] = [
    100, 500, 1_000, 5_000, 10_000, 50_000, 100_000, 500_000, 1_000_000, 5_000_000,
];

/// Sink for per-method call observations.
pub trait MetricsRecorder: Send + Sync {
    /// Counts one call of `method` and records its latency.
    fn observe(&self, method: &str, elapsed: Duration);
}

/// Counter and latency distribution of one method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodMetrics {
    pub request_count: u64,
    pub latency_sum_us: u64,
    pub latency_min_us: u64,
    pub latency_max_us: u64,
    /// Non-cumulative counts per bucket of [`LATENCY_BUCKETS_US`], plus a
    /// final overflow slot.
    pub buckets: Vec<u64>,
}

impl Default for MethodMetrics {
    fn default() -> Self {
        Self {
            request_count: 0,
            latency_sum_us: 0,
            latency_min_us: 0,
            latency_max_us: 0,
            buckets: vec![0; LATENCY_BUCKETS_US.len() + 1],
        }
    }
}

impl MethodMetrics {
    fn record(&mut self, elapsed_us: u64) {
        if self.request_count == 0 {
            self.latency_min_us = elapsed_us;
            self.latency_max_us = elapsed_us;
        } else {
            self.latency_min_us = self.latency_min_us.min(elapsed_us);
            self.latency_max_us = self.latency_max_us.max(elapsed_us);
        }
        self.request_count += 1;
        self.latency_sum_us = self.latency_sum_us.saturating_add(elapsed_us);

        let slot = LATENCY_BUCKETS_US
            .iter()
            .position(|bound| elapsed_us <= *bound)
            .unwrap_or(LATENCY_BUCKETS_US.len());
        self.buckets[slot] += 1;
    }
}

/// Process-local metrics registry keyed by method label.
#[derive(Debug)]
pub struct InMemoryMetrics {
    prefix: String,
    methods: Mutex<BTreeMap<String, MethodMetrics>>,
}

impl InMemoryMetrics {
    /// Metric names become `<namespace>_<subsystem>_<name>`.
    pub fn new(namespace: &str, subsystem: &str) -> Self {
        Self {
            prefix: format!("{}_{}", sanitize(namespace), sanitize(subsystem)),
            methods: Mutex::new(BTreeMap::new()),
        }
    }

    /// Registry for a named service, e.g. `jikoni-orders` ->
    /// `jikoni_orders_api_*`.
    pub fn for_service(service_name: &str) -> Self {
        Self::new(service_name, "api")
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Full metric name for `name`.
    pub fn metric_name(&self, name: &str) -> String {
        format!("{}_{name}", self.prefix)
    }

    pub fn snapshot(&self, method: &str) -> Option<MethodMetrics> {
        self.methods.lock().get(method).cloned()
    }

    pub fn request_count(&self, method: &str) -> u64 {
        self.snapshot(method).map_or(0, |metrics| metrics.request_count)
    }

    /// Total calls across every method.
    pub fn total_requests(&self) -> u64 {
        self.methods
            .lock()
            .values()
            .map(|metrics| metrics.request_count)
            .sum()
    }

    /// Renders counters and cumulative histograms in Prometheus text format.
    pub fn render(&self) -> String {
        let methods = self.methods.lock();
        let count_name = self.metric_name(REQUEST_COUNT);
        let latency_name = self.metric_name(REQUEST_LATENCY);
        let mut out = String::new();

        let _ = writeln!(out, "# TYPE {count_name} counter");
        for (method, metrics) in methods.iter() {
            let _ = writeln!(
                out,
                "{count_name}{{method=\"{method}\"}} {}",
                metrics.request_count
            );
        }

        let _ = writeln!(out, "# TYPE {latency_name} histogram");
        for (method, metrics) in methods.iter() {
            let mut cumulative = 0;
            for (bound, count) in LATENCY_BUCKETS_US.iter().zip(&metrics.buckets) {
                cumulative += count;
                let _ = writeln!(
                    out,
                    "{latency_name}_bucket{{method=\"{method}\",le=\"{bound}\"}} {cumulative}"
                );
            }
            let _ = writeln!(
                out,
                "{latency_name}_bucket{{method=\"{method}\",le=\"+Inf\"}} {}",
                metrics.request_count
            );
            let _ = writeln!(
                out,
                "{latency_name}_sum{{method=\"{method}\"}} {}",
                metrics.latency_sum_us
            );
            let _ = writeln!(
                out,
                "{latency_name}_count{{method=\"{method}\"}} {}",
                metrics.request_count
            );
        }
        out
    }
}

impl MetricsRecorder for InMemoryMetrics {
    fn observe(&self, method: &str, elapsed: Duration) {
        let elapsed_us = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);
        self.methods
            .lock()
            .entry(method.to_string())
            .or_default()
            .record(elapsed_us);
    }
}

fn sanitize(name: &str) -> String {
    name.replace(['-', '.', ' '], "_")
}

/// Counts calls and records their latency in a [`MetricsRecorder`].
#[derive(Clone)]
pub struct MetricsMiddleware<S> {
    inner: S,
    recorder: Arc<dyn MetricsRecorder>,
}

impl<S> MetricsMiddleware<S> {
    pub fn new(inner: S, recorder: Arc<dyn MetricsRecorder>) -> Self {
        Self { inner, recorder }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn observe<E: Entity>(&self, method: Method, started_at: Instant) {
        self.recorder
            .observe(&method.label::<E>(), started_at.elapsed());
    }
}

impl<S: std::fmt::Debug> std::fmt::Debug for MetricsMiddleware<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsMiddleware")
            .field("inner", &self.inner)
            .finish_non_exhaustive()
    }
}

impl<E: Entity, S: ResourceService<E>> ResourceService<E> for MetricsMiddleware<S> {
    fn create(&self, ctx: &CallContext, token: &str, entity: E) -> ResourceResult<String> {
        let started_at = Instant::now();
        let result = self.inner.create(ctx, token, entity);
        self.observe::<E>(Method::Create, started_at);
        result
    }

    fn view(&self, ctx: &CallContext, token: &str, id: &str) -> ResourceResult<E> {
        let started_at = Instant::now();
        let result = self.inner.view(ctx, token, id);
        self.observe::<E>(Method::View, started_at);
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
        self.observe::<E>(Method::List, started_at);
        result
    }

    fn update(&self, ctx: &CallContext, token: &str, entity: E) -> ResourceResult<()> {
        let started_at = Instant::now();
        let result = self.inner.update(ctx, token, entity);
        self.observe::<E>(Method::Update, started_at);
        result
    }

    fn delete(&self, ctx: &CallContext, token: &str, id: &str) -> ResourceResult<()> {
        let started_at = Instant::now();
        let result = self.inner.delete(ctx, token, id);
        self.observe::<E>(Method::Delete, started_at);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::{InMemoryMetrics, MetricsRecorder, LATENCY_BUCKETS_US};
    use std::time::Duration;

    #[test]
    fn names_follow_namespace_and_subsystem() {
        let metrics = InMemoryMetrics::for_service("jikoni-orders");
        assert_eq!(
            metrics.metric_name("request_count"),
            "jikoni_orders_api_request_count"
        );
    }

    #[test]
    fn observations_accumulate_per_method() {
        let metrics = InMemoryMetrics::for_service("jikoni-orders");
        metrics.observe("create_order", Duration::from_micros(50));
        metrics.observe("create_order", Duration::from_micros(2_000));
        metrics.observe("list_orders", Duration::from_secs(10));

        let create = metrics.snapshot("create_order").unwrap();
        assert_eq!(create.request_count, 2);
        assert_eq!(create.latency_sum_us, 2_050);
        assert_eq!(create.latency_min_us, 50);
        assert_eq!(create.latency_max_us, 2_000);
        assert_eq!(create.buckets[0], 1);
        assert_eq!(create.buckets[3], 1);

        let list = metrics.snapshot("list_orders").unwrap();
        assert_eq!(list.buckets[LATENCY_BUCKETS_US.len()], 1);
        assert_eq!(metrics.total_requests(), 3);
        assert!(metrics.snapshot("view_order").is_none());
    }

    #[test]
    fn render_emits_cumulative_buckets() {
        let metrics = InMemoryMetrics::for_service("jikoni-shops");
        metrics.observe("view_shop", Duration::from_micros(700));
        let text = metrics.render();
        assert!(text.contains("jikoni_shops_api_request_count{method=\"view_shop\"} 1"));
        assert!(text.contains(
            "jikoni_shops_api_request_latency_microseconds_bucket{method=\"view_shop\",le=\"500\"} 0"
        ));
        assert!(text.contains(
            "jikoni_shops_api_request_latency_microseconds_bucket{method=\"view_shop\",le=\"1000\"} 1"
        ));
        assert!(text.contains("jikoni_shops_api_request_latency_microseconds_count{method=\"view_shop\"} 1"));
    }
}
