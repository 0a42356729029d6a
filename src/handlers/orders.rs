use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::application::order_service::OrderService;
use crate::domain::order::{
    CreatedOrder, OrderDetails, OrderItemDetails, OrderItemInput, OrderPage, OrderRecord,
    PaymentSucceeded,
};
use crate::domain::status::OrderStatus;
use crate::errors::AppError;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrderItemRequest {
    #[serde(alias = "productId")]
    pub product_id: String,
    pub quantity: i32,
}

/// Prices are resolved from the product catalog, never taken from the caller.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    pub items: Vec<CreateOrderItemRequest>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderResponse {
    pub id: Uuid,
    /// Decimal amount as a string, e.g. "19.98"
    pub total_amount: String,
    pub total_items: i32,
    pub status: OrderStatus,
    pub paid: bool,
    pub payment_reference: Option<String>,
    pub created_at: String,
}

impl From<OrderRecord> for OrderResponse {
    fn from(o: OrderRecord) -> Self {
        Self {
            id: o.id,
            total_amount: o.total_amount.to_string(),
            total_items: o.total_items,
            status: o.status,
            paid: o.paid,
            payment_reference: o.payment_reference,
            created_at: o.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderItemResponse {
    pub product_id: String,
    pub name: String,
    pub quantity: i32,
    /// Price captured when the order was created
    pub price: String,
}

impl From<OrderItemDetails> for OrderItemResponse {
    fn from(i: OrderItemDetails) -> Self {
        Self {
            product_id: i.product_id,
            name: i.name,
            quantity: i.quantity,
            price: i.price.to_string(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderDetailsResponse {
    #[serde(flatten)]
    pub order: OrderResponse,
    pub items: Vec<OrderItemResponse>,
}

impl From<OrderDetails> for OrderDetailsResponse {
    fn from(d: OrderDetails) -> Self {
        Self {
            order: d.order.into(),
            items: d.items.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreateOrderResponse {
    pub order: OrderDetailsResponse,
    /// Session descriptor returned by the payment service, passed through as is
    #[schema(value_type = Object)]
    pub payment_session: serde_json::Value,
}

impl From<CreatedOrder> for CreateOrderResponse {
    fn from(c: CreatedOrder) -> Self {
        Self {
            order: c.order.into(),
            payment_session: c.payment_session,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ChangeOrderStatusRequest {
    pub status: OrderStatus,
}

/// Notification sent by the payment service once a charge has succeeded.
#[derive(Debug, Deserialize, ToSchema)]
pub struct PaymentSucceededEvent {
    #[serde(alias = "orderId")]
    pub order_id: Uuid,
    #[serde(alias = "externalPaymentReference", alias = "stripePaymentId")]
    pub payment_reference: String,
    #[serde(alias = "receiptUrl")]
    pub receipt_url: String,
}

// ── Pagination ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct ListOrdersParams {
    /// Page number (1-based). Defaults to 1.
    #[serde(default = "default_page")]
    pub page: i64,
    /// Number of items per page. Defaults to 10, maximum 100.
    #[serde(default = "default_limit")]
    pub limit: i64,
    /// Only return orders in this status.
    pub status: Option<OrderStatus>,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    10
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PageMeta {
    pub total: i64,
    pub page: i64,
    pub last_page: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListOrdersResponse {
    pub data: Vec<OrderResponse>,
    pub meta: PageMeta,
}

impl From<OrderPage> for ListOrdersResponse {
    fn from(p: OrderPage) -> Self {
        Self {
            data: p.data.into_iter().map(Into::into).collect(),
            meta: PageMeta {
                total: p.total,
                page: p.page,
                last_page: p.last_page,
            },
        }
    }
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /orders
///
/// Validates the products against the catalog, stores the order with the
/// catalog's prices and opens a payment session for it.
#[utoipa::path(
    post,
    path = "/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created with a payment session", body = CreateOrderResponse),
        (status = 400, description = "Empty order, bad quantity or unknown products"),
        (status = 502, description = "Order created but the payment session failed"),
        (status = 503, description = "Product catalog unavailable"),
    ),
    tag = "orders"
)]
pub async fn create_order(
    service: web::Data<OrderService>,
    body: web::Json<CreateOrderRequest>,
) -> Result<HttpResponse, AppError> {
    let items = body
        .into_inner()
        .items
        .into_iter()
        .map(|i| OrderItemInput {
            product_id: i.product_id,
            quantity: i.quantity,
        })
        .collect();

    let created = service.create_order(items).await?;

    Ok(HttpResponse::Created().json(CreateOrderResponse::from(created)))
}

/// GET /orders
///
/// Returns a page of orders (without their items), oldest first.
#[utoipa::path(
    get,
    path = "/orders",
    params(
        ("page" = Option<i64>, Query, description = "Page number (1-based, default 1)"),
        ("limit" = Option<i64>, Query, description = "Items per page (default 10, max 100)"),
        ("status" = Option<OrderStatus>, Query, description = "Filter by status"),
    ),
    responses(
        (status = 200, description = "Paginated list of orders", body = ListOrdersResponse),
        (status = 400, description = "Invalid query parameters"),
    ),
    tag = "orders"
)]
pub async fn list_orders(
    service: web::Data<OrderService>,
    query: web::Query<ListOrdersParams>,
) -> Result<HttpResponse, AppError> {
    let params = query.into_inner();

    let page = service
        .find_all(params.page, params.limit, params.status)
        .await?;

    Ok(HttpResponse::Ok().json(ListOrdersResponse::from(page)))
}

/// GET /orders/{id}
///
/// Returns the order with its items named after the current catalog data.
#[utoipa::path(
    get,
    path = "/orders/{id}",
    params(
        ("id" = Uuid, Path, description = "Order UUID"),
    ),
    responses(
        (status = 200, description = "Order found", body = OrderDetailsResponse),
        (status = 404, description = "Order not found"),
        (status = 503, description = "Product catalog unavailable"),
    ),
    tag = "orders"
)]
pub async fn get_order(
    service: web::Data<OrderService>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let details = service.find_one(path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(OrderDetailsResponse::from(details)))
}

/// PATCH /orders/{id}/status
#[utoipa::path(
    patch,
    path = "/orders/{id}/status",
    params(
        ("id" = Uuid, Path, description = "Order UUID"),
    ),
    request_body = ChangeOrderStatusRequest,
    responses(
        (status = 200, description = "Order in the requested status", body = OrderResponse),
        (status = 404, description = "Order not found"),
    ),
    tag = "orders"
)]
pub async fn change_order_status(
    service: web::Data<OrderService>,
    path: web::Path<Uuid>,
    body: web::Json<ChangeOrderStatusRequest>,
) -> Result<HttpResponse, AppError> {
    let order = service
        .change_status(path.into_inner(), body.into_inner().status)
        .await?;

    Ok(HttpResponse::Ok().json(OrderResponse::from(order)))
}

/// POST /events/payment-succeeded
///
/// Fire-and-forget settlement. Answers 404 for unknown orders so the sender
/// can redeliver later.
#[utoipa::path(
    post,
    path = "/events/payment-succeeded",
    request_body = PaymentSucceededEvent,
    responses(
        (status = 202, description = "Settlement applied"),
        (status = 404, description = "Order not found"),
    ),
    tag = "events"
)]
pub async fn payment_succeeded(
    service: web::Data<OrderService>,
    body: web::Json<PaymentSucceededEvent>,
) -> Result<HttpResponse, AppError> {
    let event = body.into_inner();

    service
        .payment_succeeded(PaymentSucceeded {
            order_id: event.order_id,
            payment_reference: event.payment_reference,
            receipt_url: event.receipt_url,
        })
        .await?;

    Ok(HttpResponse::Accepted().finish())
}
