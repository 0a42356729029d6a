use std::time::Duration;

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use reqwest::Client;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::errors::GatewayError;
use crate::domain::ports::{PaymentGateway, PaymentSessionRequest};

use super::json::decimal_as_number;

#[derive(Debug, Serialize)]
struct PaymentSessionBody {
    #[serde(rename = "orderId")]
    order_id: Uuid,
    currency: String,
    items: Vec<PaymentItemBody>,
}

#[derive(Debug, Serialize)]
struct PaymentItemBody {
    name: String,
    #[serde(serialize_with = "decimal_as_number")]
    price: BigDecimal,
    quantity: i32,
}

impl From<PaymentSessionRequest> for PaymentSessionBody {
    fn from(request: PaymentSessionRequest) -> Self {
        Self {
            order_id: request.order_id,
            currency: request.currency,
            items: request
                .items
                .into_iter()
                .map(|item| PaymentItemBody {
                    name: item.name,
                    price: item.price,
                    quantity: item.quantity,
                })
                .collect(),
        }
    }
}

/// Payment service reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpPaymentGateway {
    base_url: String,
    http: Client,
}

impl HttpPaymentGateway {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: Client::builder().timeout(timeout).build()?,
        })
    }
}

fn transport_error(e: reqwest::Error) -> GatewayError {
    if e.is_timeout() {
        GatewayError::Timeout
    } else {
        GatewayError::Unavailable(e.to_string())
    }
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    async fn create_payment_session(
        &self,
        request: PaymentSessionRequest,
    ) -> Result<serde_json::Value, GatewayError> {
        let url = format!("{}/payments/create-payment-session", self.base_url);

        let response = self
            .http
            .post(&url)
            .json(&PaymentSessionBody::from(request))
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = format!("create payment session failed with status {status}: {text}");
            return Err(if status.is_client_error() {
                GatewayError::Rejected(message)
            } else {
                GatewayError::Unavailable(message)
            });
        }

        response.json().await.map_err(transport_error)
    }
}
