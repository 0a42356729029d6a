use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::errors::DomainError;
use super::status::OrderStatus;

/// One requested line of a new order. Prices are never taken from the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderItemInput {
    pub product_id: String,
    pub quantity: i32,
}

/// A priced line ready to be persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrderItem {
    pub product_id: String,
    pub quantity: i32,
    pub price: BigDecimal,
}

/// Everything the store needs to insert an order and its lines atomically.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub total_amount: BigDecimal,
    pub total_items: i32,
    pub items: Vec<NewOrderItem>,
}

impl NewOrder {
    /// Build an order from lines whose prices are already resolved.
    ///
    /// Fails with [`DomainError::Validation`] when the item count does not
    /// fit the stored `total_items`.
    pub fn from_items(items: Vec<NewOrderItem>) -> Result<Self, DomainError> {
        let total_items = items
            .iter()
            .try_fold(0i32, |acc, item| acc.checked_add(item.quantity))
            .ok_or_else(|| {
                DomainError::Validation(format!(
                    "an order may hold at most {} items in total",
                    i32::MAX
                ))
            })?;
        let total_amount = items
            .iter()
            .map(|item| &item.price * BigDecimal::from(item.quantity))
            .sum();
        Ok(Self {
            total_amount,
            total_items,
            items,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderRecord {
    pub id: Uuid,
    pub total_amount: BigDecimal,
    pub total_items: i32,
    pub status: OrderStatus,
    pub paid: bool,
    pub payment_reference: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderItemRecord {
    pub product_id: String,
    pub quantity: i32,
    pub price: BigDecimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderWithItems {
    pub order: OrderRecord,
    pub items: Vec<OrderItemRecord>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReceiptRecord {
    pub id: Uuid,
    pub order_id: Uuid,
    pub receipt_url: String,
    pub created_at: DateTime<Utc>,
}

/// Settlement notification from the payment service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentSucceeded {
    pub order_id: Uuid,
    pub payment_reference: String,
    pub receipt_url: String,
}

#[derive(Debug, Clone)]
pub struct ListResult {
    pub items: Vec<OrderRecord>,
    pub total: i64,
}

// ── Read views ───────────────────────────────────────────────────────────────

/// A line item decorated with the product's display name.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderItemDetails {
    pub product_id: String,
    pub name: String,
    pub quantity: i32,
    pub price: BigDecimal,
}

/// An order together with its named line items.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderDetails {
    pub order: OrderRecord,
    pub items: Vec<OrderItemDetails>,
}

/// Result of a successful creation: the order and the gateway's session.
#[derive(Debug, Clone)]
pub struct CreatedOrder {
    pub order: OrderDetails,
    pub payment_session: serde_json::Value,
}

#[derive(Debug, Clone)]
pub struct OrderPage {
    pub data: Vec<OrderRecord>,
    pub total: i64,
    pub page: i64,
    pub last_page: i64,
}

impl OrderPage {
    pub fn new(result: ListResult, page: i64, limit: i64) -> Self {
        let last_page = if result.total == 0 {
            0
        } else {
            (result.total + limit - 1) / limit
        };
        Self {
            data: result.items,
            total: result.total,
            page,
            last_page,
        }
    }
}
