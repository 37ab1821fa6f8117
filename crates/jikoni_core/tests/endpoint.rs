use jikoni_core::{
    bearer_token, open_store_in_memory, CallContext, CoreService, CreateRequest, DeleteRequest,
    Endpoint, ErrorClass, ErrorKind, ListRequest, Order, OrderPlace, OrderRepository,
    OrderStatus, PageMetadata, ResourceRepository, ResourceResult, ResultPage, UpdateRequest,
    ViewRequest,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Repository that counts calls and delegates to SQLite.
struct CountingRepository {
    inner: OrderRepository,
    calls: AtomicUsize,
}

impl CountingRepository {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: OrderRepository::new(open_store_in_memory().unwrap()),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn hit(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

impl ResourceRepository<Order> for CountingRepository {
    fn save(&self, ctx: &CallContext, entity: &Order) -> ResourceResult<String> {
        self.hit();
        self.inner.save(ctx, entity)
    }

    fn retrieve_by_id(&self, ctx: &CallContext, id: &str) -> ResourceResult<Order> {
        self.hit();
        self.inner.retrieve_by_id(ctx, id)
    }

    fn retrieve_all(
        &self,
        ctx: &CallContext,
        page: &PageMetadata<jikoni_core::OrderFilter>,
    ) -> ResourceResult<ResultPage<Order>> {
        self.hit();
        self.inner.retrieve_all(ctx, page)
    }

    fn update(&self, ctx: &CallContext, entity: &Order) -> ResourceResult<()> {
        self.hit();
        self.inner.update(ctx, entity)
    }

    fn delete(&self, ctx: &CallContext, id: &str) -> ResourceResult<()> {
        self.hit();
        self.inner.delete(ctx, id)
    }
}

type OrderEndpoint = Endpoint<Order, CoreService<Order, Arc<CountingRepository>>>;

fn endpoint() -> (OrderEndpoint, Arc<CountingRepository>) {
    let repo = CountingRepository::new();
    (Endpoint::new(CoreService::new(repo.clone())), repo)
}

fn chai() -> Order {
    Order::new("chai", 50, OrderPlace::InHouse, OrderStatus::Ordered)
}

#[test]
fn full_lifecycle_through_endpoint() {
    let (endpoint, repo) = endpoint();
    let ctx = CallContext::background();
    let token = bearer_token("Bearer kitchen-token").unwrap();

    let id = endpoint
        .create(&ctx, CreateRequest::new(token.as_str(), chai()))
        .unwrap();
    let viewed = endpoint
        .view(&ctx, &ViewRequest::new(token.as_str(), id.as_str()))
        .unwrap();
    assert_eq!(viewed.name, "chai");

    endpoint
        .update(
            &ctx,
            UpdateRequest::new(
                token.as_str(),
                id.as_str(),
                Order {
                    price: 60,
                    ..Order::default()
                },
            ),
        )
        .unwrap();

    let listed = endpoint
        .list(
            &ctx,
            &ListRequest::from_query(token.as_str(), [("price", "60")]).unwrap(),
        )
        .unwrap();
    assert_eq!(listed.total, 1);
    assert_eq!(listed.items[0].id, id);

    endpoint
        .delete(&ctx, &DeleteRequest::new(token.as_str(), id.as_str()))
        .unwrap();
    assert_eq!(repo.calls(), 5);
}

#[test]
fn out_of_range_limits_fail_before_storage() {
    let (endpoint, repo) = endpoint();
    let ctx = CallContext::background();

    for limit in [0, 101, 1_000] {
        let request = ListRequest::new("token", PageMetadata::window(0, limit));
        let err = endpoint.list(&ctx, &request).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidLimit);
        assert_eq!(err.kind().class(), ErrorClass::Client);
    }
    assert_eq!(repo.calls(), 0);

    for limit in [1, 100] {
        let request = ListRequest::new("token", PageMetadata::window(0, limit));
        endpoint.list(&ctx, &request).unwrap();
    }
    assert_eq!(repo.calls(), 2);
}

#[test]
fn missing_token_and_id_fail_before_storage() {
    let (endpoint, repo) = endpoint();
    let ctx = CallContext::background();

    let err = endpoint
        .create(&ctx, CreateRequest::new("", chai()))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MissingToken);
    assert_eq!(err.kind().class(), ErrorClass::Unauthorized);

    let err = endpoint
        .view(&ctx, &ViewRequest::new("token", ""))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MissingId);

    let err = endpoint
        .update(&ctx, UpdateRequest::new("token", "", chai()))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MissingId);

    let err = endpoint
        .delete(&ctx, &DeleteRequest::new("", "id"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MissingToken);

    assert_eq!(repo.calls(), 0);
}

#[test]
fn invalid_entities_fail_before_storage() {
    let (endpoint, repo) = endpoint();
    let mut order = chai();
    order.place = "rooftop".to_string();

    let err = endpoint
        .create(&CallContext::background(), CreateRequest::new("token", order))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(repo.calls(), 0);
}

#[test]
fn any_non_empty_token_is_accepted() {
    let (endpoint, _) = endpoint();
    let id = endpoint
        .create(
            &CallContext::background(),
            CreateRequest::new("definitely-not-verified", chai()),
        )
        .unwrap();
    assert!(!id.is_empty());
}
