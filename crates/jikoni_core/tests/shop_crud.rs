use jikoni_core::{
    open_store_in_memory, CallContext, CoreService, ErrorKind, PageMetadata, ResourceService,
    Shop, ShopFilter, ShopRepository,
};
use serde_json::json;

const TOKEN: &str = "token";

fn service() -> CoreService<Shop, ShopRepository> {
    CoreService::new(ShopRepository::new(open_store_in_memory().unwrap()))
}

#[test]
fn shop_lifecycle() {
    let svc = service();
    let ctx = CallContext::background();

    let mut shop = Shop::new("Mama Oliech", "orders@oliech.example", "+254700000000");
    shop.metadata = json!({"city": "Nairobi", "open": true})
        .as_object()
        .cloned()
        .unwrap();
    let id = svc.create(&ctx, TOKEN, shop.clone()).unwrap();

    let loaded = svc.view(&ctx, TOKEN, &id).unwrap();
    assert_eq!(loaded.name, shop.name);
    assert_eq!(loaded.email, shop.email);
    assert_eq!(loaded.number, shop.number);
    assert_eq!(loaded.metadata, shop.metadata);

    svc.update(
        &ctx,
        TOKEN,
        Shop {
            id: id.clone(),
            email: "hello@oliech.example".to_string(),
            ..Shop::default()
        },
    )
    .unwrap();
    let updated = svc.view(&ctx, TOKEN, &id).unwrap();
    assert_eq!(updated.email, "hello@oliech.example");
    assert_eq!(updated.name, "Mama Oliech");
    assert_eq!(updated.number, "+254700000000");
    assert!(updated.created_at <= updated.updated_at);

    svc.delete(&ctx, TOKEN, &id).unwrap();
    assert_eq!(
        svc.view(&ctx, TOKEN, &id).unwrap_err().kind(),
        ErrorKind::NotFound
    );
}

#[test]
fn permissive_contact_fields_are_stored_verbatim() {
    let svc = service();
    let ctx = CallContext::background();
    let id = svc
        .create(&ctx, TOKEN, Shop::new("Kibanda", "not an email", "n/a"))
        .unwrap();
    let loaded = svc.view(&ctx, TOKEN, &id).unwrap();
    assert_eq!(loaded.email, "not an email");
    assert_eq!(loaded.number, "n/a");
}

#[test]
fn shops_filter_by_email_and_metadata() {
    let svc = service();
    let ctx = CallContext::background();

    let mut nairobi = Shop::new("Java House", "java@example.com", "1");
    nairobi.metadata = json!({"city": "Nairobi"}).as_object().cloned().unwrap();
    let mut mombasa = Shop::new("Java House Coast", "java@example.com", "2");
    mombasa.metadata = json!({"city": "Mombasa"}).as_object().cloned().unwrap();
    svc.create(&ctx, TOKEN, nairobi).unwrap();
    svc.create(&ctx, TOKEN, mombasa).unwrap();
    svc.create(&ctx, TOKEN, Shop::new("Artcaffe", "art@example.com", "3"))
        .unwrap();

    let by_email = PageMetadata::default().with_filter(ShopFilter {
        email: "java@example.com".to_string(),
        ..ShopFilter::default()
    });
    assert_eq!(svc.list(&ctx, TOKEN, &by_email).unwrap().total, 2);

    let by_city = PageMetadata::default().with_filter(ShopFilter {
        email: "java@example.com".to_string(),
        metadata: json!({"city": "Mombasa"}).as_object().cloned().unwrap(),
        ..ShopFilter::default()
    });
    let page = svc.list(&ctx, TOKEN, &by_city).unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].name, "Java House Coast");
}
