use async_trait::async_trait;
use bigdecimal::BigDecimal;
use uuid::Uuid;

use super::errors::{CatalogError, DomainError, GatewayError};
use super::order::{
    ListResult, NewOrder, OrderRecord, OrderWithItems, PaymentSucceeded, ReceiptRecord,
};
use super::status::OrderStatus;

/// Transactional persistence for orders, their lines and receipts.
///
/// Implementations are blocking; callers on an async runtime must move calls
/// onto the blocking pool.
pub trait OrderRepository: Send + Sync + 'static {
    /// Insert the order and all of its lines in one transaction.
    fn create(&self, order: NewOrder) -> Result<OrderWithItems, DomainError>;
    fn find_by_id(&self, id: Uuid) -> Result<Option<OrderWithItems>, DomainError>;
    fn find_order(&self, id: Uuid) -> Result<Option<OrderRecord>, DomainError>;
    /// Page through orders by `created_at`, then `id`, ascending.
    fn list(
        &self,
        page: i64,
        limit: i64,
        status: Option<OrderStatus>,
    ) -> Result<ListResult, DomainError>;
    /// Fails with [`DomainError::NotFound`] when no row was updated.
    fn update_status(&self, id: Uuid, status: OrderStatus) -> Result<OrderRecord, DomainError>;
    /// Mark the order paid and attach a receipt, in one transaction and
    /// without looking at the current status.
    fn mark_paid(&self, payment: &PaymentSucceeded) -> Result<OrderRecord, DomainError>;
    fn find_receipts(&self, order_id: Uuid) -> Result<Vec<ReceiptRecord>, DomainError>;
}

/// A product as currently known by the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub price: BigDecimal,
}

/// Resolves product ids to their current name and price.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// Look up every id in one call. Unknown ids fail the whole call.
    async fn validate_products(&self, ids: &[String]) -> Result<Vec<Product>, CatalogError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaymentLineItem {
    pub name: String,
    pub price: BigDecimal,
    pub quantity: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaymentSessionRequest {
    pub order_id: Uuid,
    pub currency: String,
    pub items: Vec<PaymentLineItem>,
}

/// Opens payment sessions for committed orders.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Returns the gateway's session descriptor untouched.
    async fn create_payment_session(
        &self,
        request: PaymentSessionRequest,
    ) -> Result<serde_json::Value, GatewayError>;
}
