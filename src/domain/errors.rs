use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Order not found")]
    NotFound,
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("Upstream service failure: {0}")]
    Upstream(String),
    /// The order is committed but no payment session could be opened for it.
    #[error("Order {order_id} was created but the payment session failed: {reason}")]
    PaymentSession { order_id: Uuid, reason: String },
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Failures reported by the product catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Unknown products: {}", .0.join(", "))]
    UnknownProducts(Vec<String>),
    #[error("Product catalog rejected the request: {0}")]
    Rejected(String),
    #[error("Product catalog unavailable: {0}")]
    Unavailable(String),
    #[error("Product catalog timed out")]
    Timeout,
}

/// Failures reported by the payment gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Payment gateway rejected the request: {0}")]
    Rejected(String),
    #[error("Payment gateway unavailable: {0}")]
    Unavailable(String),
    #[error("Payment gateway timed out")]
    Timeout,
}
