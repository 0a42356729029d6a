//! HTTP-level tests against the full actix app, backed by the in-memory
//! order store and scripted catalog/payment fakes.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use async_trait::async_trait;
use bigdecimal::BigDecimal;
use serde_json::{json, Value};
use uuid::Uuid;

use orders_service::application::order_service::{OrderService, OrderServiceSettings};
use orders_service::configure;
use orders_service::domain::errors::{CatalogError, GatewayError};
use orders_service::domain::ports::{
    PaymentGateway, PaymentSessionRequest, Product, ProductCatalog,
};
use orders_service::infrastructure::InMemoryOrderRepository;

struct FakeCatalog {
    products: Mutex<HashMap<String, Product>>,
    down: bool,
}

impl FakeCatalog {
    fn with(products: &[(&str, &str, &str)]) -> Self {
        let products = products
            .iter()
            .map(|(id, name, price)| {
                let product = Product {
                    id: id.to_string(),
                    name: name.to_string(),
                    price: BigDecimal::from_str(price).unwrap(),
                };
                (id.to_string(), product)
            })
            .collect();
        Self {
            products: Mutex::new(products),
            down: false,
        }
    }

    fn down() -> Self {
        Self {
            products: Mutex::new(HashMap::new()),
            down: true,
        }
    }
}

#[async_trait]
impl ProductCatalog for FakeCatalog {
    async fn validate_products(&self, ids: &[String]) -> Result<Vec<Product>, CatalogError> {
        if self.down {
            return Err(CatalogError::Unavailable("connection refused".to_string()));
        }
        let products = self.products.lock().unwrap();
        let unknown: Vec<String> = ids
            .iter()
            .filter(|id| !products.contains_key(*id))
            .cloned()
            .collect();
        if !unknown.is_empty() {
            return Err(CatalogError::UnknownProducts(unknown));
        }
        Ok(ids.iter().map(|id| products[id].clone()).collect())
    }
}

#[derive(Default)]
struct FakeGateway {
    requests: Mutex<Vec<PaymentSessionRequest>>,
    fail: bool,
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn create_payment_session(
        &self,
        request: PaymentSessionRequest,
    ) -> Result<Value, GatewayError> {
        if self.fail {
            return Err(GatewayError::Unavailable("gateway down".to_string()));
        }
        let session = json!({
            "session_id": format!("cs_{}", request.order_id),
            "url": "https://checkout.example/session",
        });
        self.requests.lock().unwrap().push(request);
        Ok(session)
    }
}

fn order_service(
    repo: &InMemoryOrderRepository,
    catalog: FakeCatalog,
    gateway: Arc<FakeGateway>,
) -> web::Data<OrderService> {
    web::Data::new(OrderService::new(
        Arc::new(repo.clone()),
        Arc::new(catalog),
        gateway,
        OrderServiceSettings::default(),
    ))
}

macro_rules! app {
    ($service:expr) => {
        test::init_service(App::new().app_data($service).configure(configure)).await
    };
}

fn widget_catalog() -> FakeCatalog {
    FakeCatalog::with(&[("P1", "Widget", "10"), ("P2", "Gadget", "4.50")])
}

#[actix_web::test]
async fn health_reports_ok() {
    let repo = InMemoryOrderRepository::new();
    let app = app!(order_service(&repo, widget_catalog(), Arc::default()));

    let resp = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({ "status": "ok" }));
}

#[actix_web::test]
async fn order_lifecycle_over_http() {
    let repo = InMemoryOrderRepository::new();
    let gateway = Arc::new(FakeGateway::default());
    let app = app!(order_service(&repo, widget_catalog(), gateway.clone()));

    // create
    let req = test::TestRequest::post()
        .uri("/orders")
        .set_json(json!({ "items": [{ "product_id": "P1", "quantity": 2 }] }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Value = test::read_body_json(resp).await;

    let order = &created["order"];
    let id = order["id"].as_str().expect("id should be a string").to_string();
    assert_eq!(order["total_amount"], "20");
    assert_eq!(order["total_items"], 2);
    assert_eq!(order["status"], "PENDING");
    assert_eq!(order["paid"], false);
    assert_eq!(order["items"][0]["name"], "Widget");
    assert_eq!(order["items"][0]["price"], "10");
    assert_eq!(created["payment_session"]["session_id"], format!("cs_{id}"));

    {
        let sent = gateway.requests.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].items[0].name, "Widget");
        assert_eq!(sent[0].items[0].quantity, 2);
    }

    // settle, using the payment service's camelCase field names
    let req = test::TestRequest::post()
        .uri("/events/payment-succeeded")
        .set_json(json!({
            "orderId": id,
            "stripePaymentId": "ch_3Nx",
            "receiptUrl": "https://pay.example/receipts/ch_3Nx",
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::ACCEPTED);

    // read back
    let req = test::TestRequest::get().uri(&format!("/orders/{id}")).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let fetched: Value = test::read_body_json(resp).await;
    assert_eq!(fetched["status"], "PAID");
    assert_eq!(fetched["paid"], true);
    assert_eq!(fetched["payment_reference"], "ch_3Nx");
    assert_eq!(fetched["items"][0]["product_id"], "P1");

    let receipts = repo_receipts(&repo, &id);
    assert_eq!(receipts, 1);
}

fn repo_receipts(repo: &InMemoryOrderRepository, id: &str) -> usize {
    use orders_service::domain::ports::OrderRepository;
    let id = Uuid::parse_str(id).unwrap();
    repo.find_receipts(id).unwrap().len()
}

#[actix_web::test]
async fn unknown_products_are_a_bad_request_and_store_nothing() {
    let repo = InMemoryOrderRepository::new();
    let gateway = Arc::new(FakeGateway::default());
    let app = app!(order_service(&repo, widget_catalog(), gateway.clone()));

    let req = test::TestRequest::post()
        .uri("/orders")
        .set_json(json!({ "items": [
            { "product_id": "P1", "quantity": 1 },
            { "product_id": "P9", "quantity": 1 },
        ] }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], 400);
    assert!(body["message"].as_str().unwrap().contains("P9"));
    assert_eq!(repo.write_count(), 0);
    assert!(gateway.requests.lock().unwrap().is_empty());
}

#[actix_web::test]
async fn empty_items_and_bad_quantities_are_rejected() {
    let repo = InMemoryOrderRepository::new();
    let app = app!(order_service(&repo, widget_catalog(), Arc::default()));

    for body in [
        json!({ "items": [] }),
        json!({ "items": [{ "product_id": "P1", "quantity": 0 }] }),
        json!({ "items": [{ "product_id": "P1", "quantity": -3 }] }),
        json!({ "items": [{ "product_id": "P1" }] }),
        json!({ "lines": [] }),
    ] {
        let req = test::TestRequest::post().uri("/orders").set_json(&body).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "body {body}");
    }
    assert_eq!(repo.write_count(), 0);
}

#[actix_web::test]
async fn catalog_outage_is_service_unavailable() {
    let repo = InMemoryOrderRepository::new();
    let app = app!(order_service(&repo, FakeCatalog::down(), Arc::default()));

    let req = test::TestRequest::post()
        .uri("/orders")
        .set_json(json!({ "items": [{ "product_id": "P1", "quantity": 1 }] }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(repo.write_count(), 0);
}

#[actix_web::test]
async fn payment_session_failure_keeps_the_order_pending() {
    let repo = InMemoryOrderRepository::new();
    let gateway = Arc::new(FakeGateway {
        fail: true,
        ..FakeGateway::default()
    });
    let app = app!(order_service(&repo, widget_catalog(), gateway));

    let req = test::TestRequest::post()
        .uri("/orders")
        .set_json(json!({ "items": [{ "product_id": "P2", "quantity": 3 }] }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    let body: Value = test::read_body_json(resp).await;
    let id = body["order_id"].as_str().expect("order id in body").to_string();

    let req = test::TestRequest::get().uri(&format!("/orders/{id}")).to_request();
    let fetched: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(fetched["status"], "PENDING");
    assert_eq!(fetched["total_amount"], "13.50");
}

#[actix_web::test]
async fn unknown_or_malformed_ids() {
    let repo = InMemoryOrderRepository::new();
    let app = app!(order_service(&repo, widget_catalog(), Arc::default()));
    let missing = Uuid::new_v4();

    let req = test::TestRequest::get().uri(&format!("/orders/{missing}")).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Order not found");

    let req = test::TestRequest::get().uri("/orders/not-a-uuid").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::patch()
        .uri(&format!("/orders/{missing}/status"))
        .set_json(json!({ "status": "DELIVERED" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::post()
        .uri("/events/payment-succeeded")
        .set_json(json!({
            "order_id": missing,
            "payment_reference": "ch_1",
            "receipt_url": "https://pay.example/r/1",
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn change_status_and_filter_the_listing() {
    let repo = InMemoryOrderRepository::new();
    let app = app!(order_service(&repo, widget_catalog(), Arc::default()));

    let mut ids = Vec::new();
    for _ in 0..3 {
        let req = test::TestRequest::post()
            .uri("/orders")
            .set_json(json!({ "items": [{ "product_id": "P1", "quantity": 1 }] }))
            .to_request();
        let created: Value = test::call_and_read_body_json(&app, req).await;
        ids.push(created["order"]["id"].as_str().unwrap().to_string());
    }

    let req = test::TestRequest::patch()
        .uri(&format!("/orders/{}/status", ids[1]))
        .set_json(json!({ "status": "DELIVERED" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "DELIVERED");

    let req = test::TestRequest::patch()
        .uri(&format!("/orders/{}/status", ids[1]))
        .set_json(json!({ "status": "SHIPPED" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::get()
        .uri("/orders?status=DELIVERED")
        .to_request();
    let page: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(page["meta"], json!({ "total": 1, "page": 1, "last_page": 1 }));
    assert_eq!(page["data"][0]["id"], ids[1]);

    let req = test::TestRequest::get().uri("/orders?page=2&limit=2").to_request();
    let page: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(page["meta"], json!({ "total": 3, "page": 2, "last_page": 2 }));
    assert_eq!(page["data"].as_array().unwrap().len(), 1);
    assert_eq!(page["data"][0]["id"], ids[2]);

    let req = test::TestRequest::get().uri("/orders?status=LOST").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn empty_listing_has_no_pages() {
    let repo = InMemoryOrderRepository::new();
    let app = app!(order_service(&repo, widget_catalog(), Arc::default()));

    let req = test::TestRequest::get().uri("/orders").to_request();
    let page: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(page["data"], json!([]));
    assert_eq!(page["meta"], json!({ "total": 0, "page": 1, "last_page": 0 }));
}

#[actix_web::test]
async fn huge_page_number_returns_an_empty_page() {
    let repo = InMemoryOrderRepository::new();
    let app = app!(order_service(&repo, widget_catalog(), Arc::default()));

    let req = test::TestRequest::post()
        .uri("/orders")
        .set_json(json!({ "items": [{ "product_id": "P1", "quantity": 1 }] }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let req = test::TestRequest::get()
        .uri("/orders?page=9223372036854775807")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let page: Value = test::read_body_json(resp).await;
    assert_eq!(page["data"], json!([]));
    assert_eq!(page["meta"]["total"], 1);
    assert_eq!(page["meta"]["last_page"], 1);
}
