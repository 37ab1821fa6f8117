//! CLI smoke entry point.
//!
//! # Responsibility
//! - Open the configured store and run one lifecycle pass per resource
//!   through the full endpoint -> metrics -> logging -> core chain.
//! - Create the order against the live shop, then delete both.
//! - Print results as JSON lines for quick local sanity checks.

use jikoni_core::{
    instrument, CallContext, CoreService, CreateRequest, DeleteRequest, Endpoint, Entity,
    InMemoryMetrics, ListRequest, LoggingConfig, Method, Order, OrderPlace, OrderRepository,
    OrderStatus, ResourceService, Shop, ShopRepository, Store, StoreConfig, UpdateRequest,
    ViewRequest,
};
use log::info;
use serde::Serialize;
use std::error::Error;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

const SMOKE_TOKEN: &str = "cli-smoke";
const CALL_TIMEOUT: Duration = Duration::from_secs(5);

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("jikoni_cli error={err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let logging = LoggingConfig::from_env();
    jikoni_core::init_from_config(&logging)?;

    let config = StoreConfig::from_env()?;
    let store = jikoni_core::open_store(&config)?;
    println!("jikoni_core version={}", jikoni_core::core_version());

    let linked = run_smoke(&store)?;
    println!(
        "order={} vendor={} vendor_name={:?}",
        linked.order_id, linked.vendor_id, linked.vendor_name
    );

    info!("event=cli_smoke module=cli status=ok store={store:?}");
    Ok(())
}

/// Smoke order with the shop it was linked to.
#[derive(Debug)]
struct LinkedOrder {
    order_id: String,
    vendor_id: String,
    vendor_name: String,
}

/// Exercises shops, then orders against the live shop, then deletes both.
fn run_smoke(store: &Store) -> Result<LinkedOrder, Box<dyn Error>> {
    let shop_metrics = Arc::new(InMemoryMetrics::for_service("jikoni-shops"));
    let shops = Endpoint::new(instrument::<Shop, _>(
        CoreService::new(ShopRepository::new(store.clone())),
        shop_metrics.clone(),
    ));
    let shop = Shop::new("Mama Oliech", "orders@oliech.example", "+254700000000");
    let vendor_id = exercise(&shops, shop, Shop {
        number: "+254711111111".to_string(),
        ..Shop::default()
    })?;

    let order_metrics = Arc::new(InMemoryMetrics::for_service("jikoni-orders"));
    let orders = Endpoint::new(instrument::<Order, _>(
        CoreService::new(OrderRepository::new(store.clone())),
        order_metrics.clone(),
    ));
    let mut order = Order::new("pilau", 450, OrderPlace::InHouse, OrderStatus::Ordered);
    order.vendor = vendor_id.clone();
    let order_id = exercise(&orders, order, Order {
        status: OrderStatus::Paid.as_str().to_string(),
        ..Order::default()
    })?;

    let ctx = CallContext::with_timeout(CALL_TIMEOUT);
    let placed = orders.view(&ctx, &ViewRequest::new(SMOKE_TOKEN, order_id.as_str()))?;
    let vendor = shops.view(&ctx, &ViewRequest::new(SMOKE_TOKEN, placed.vendor.as_str()))?;

    orders.delete(&ctx, &DeleteRequest::new(SMOKE_TOKEN, order_id.as_str()))?;
    shops.delete(&ctx, &DeleteRequest::new(SMOKE_TOKEN, vendor_id.as_str()))?;
    report::<Shop>(&shop_metrics);
    report::<Order>(&order_metrics);

    Ok(LinkedOrder {
        order_id,
        vendor_id,
        vendor_name: vendor.name,
    })
}

/// Creates, views, lists, updates and re-views one entity. Returns the
/// created id; the entity is left in place for dependent calls.
fn exercise<E, S>(endpoint: &Endpoint<E, S>, entity: E, changes: E) -> Result<String, Box<dyn Error>>
where
    E: Entity + Serialize,
    S: ResourceService<E>,
{
    let ctx = CallContext::with_timeout(CALL_TIMEOUT);

    let id = endpoint.create(&ctx, CreateRequest::new(SMOKE_TOKEN, entity))?;
    info!("event=cli_smoke module=cli status=ok resource={} id={id}", E::KIND);

    let created = endpoint.view(&ctx, &ViewRequest::new(SMOKE_TOKEN, id.as_str()))?;
    println!("{}", serde_json::to_string(&created)?);

    let page = endpoint.list(
        &ctx,
        &ListRequest::from_query(SMOKE_TOKEN, [("limit", "10")])?,
    )?;
    println!(
        "{} total={} returned={}",
        E::COLLECTION,
        page.total,
        page.items.len()
    );

    endpoint.update(&ctx, UpdateRequest::new(SMOKE_TOKEN, id.as_str(), changes))?;
    let updated = endpoint.view(&ctx, &ViewRequest::new(SMOKE_TOKEN, id.as_str()))?;
    println!("{}", serde_json::to_string(&updated)?);
    Ok(id)
}

fn report<E: Entity>(metrics: &InMemoryMetrics) {
    for method in Method::ALL {
        let label = method.label::<E>();
        println!(
            "{} method={label} count={}",
            metrics.metric_name(jikoni_core::service::metrics::REQUEST_COUNT),
            metrics.request_count(&label)
        );
    }
}
