use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::errors::DomainError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Order not found")]
    NotFound,

    #[error("{0}")]
    BadRequest(String),

    #[error("Upstream service unavailable: {0}")]
    Upstream(String),

    #[error("Order {order_id} was created but its payment session failed: {reason}")]
    PaymentSession { order_id: Uuid, reason: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<DomainError> for AppError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::NotFound => AppError::NotFound,
            DomainError::Validation(msg) => AppError::BadRequest(msg),
            DomainError::Upstream(msg) => AppError::Upstream(msg),
            DomainError::PaymentSession { order_id, reason } => {
                AppError::PaymentSession { order_id, reason }
            }
            DomainError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

impl actix_web::ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Upstream(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::PaymentSession { .. } => StatusCode::BAD_GATEWAY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        // Only caller-correctable messages leave the service verbatim.
        let body = match self {
            AppError::NotFound | AppError::BadRequest(_) => json!({
                "status": status.as_u16(),
                "message": self.to_string(),
            }),
            AppError::Upstream(detail) => {
                log::warn!("Upstream failure: {detail}");
                json!({
                    "status": status.as_u16(),
                    "message": "Upstream service unavailable, retry later",
                })
            }
            // Already logged with its cause where the session failed.
            AppError::PaymentSession { order_id, .. } => {
                json!({
                    "status": status.as_u16(),
                    "message": "Order created but payment session could not be opened",
                    "order_id": order_id,
                })
            }
            AppError::Internal(detail) => {
                log::error!("Internal error: {detail}");
                json!({
                    "status": status.as_u16(),
                    "message": "Internal server error",
                })
            }
        };
        HttpResponse::build(status).json(body)
    }
}
