use std::time::Duration;

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::domain::errors::CatalogError;
use crate::domain::ports::{Product, ProductCatalog};

use super::json::{decimal_from_number_or_string, string_from_number_or_string};

#[derive(Debug, Serialize)]
struct ValidateProductsRequest<'a> {
    ids: &'a [String],
}

#[derive(Debug, Deserialize)]
struct ProductPayload {
    #[serde(deserialize_with = "string_from_number_or_string")]
    id: String,
    name: String,
    #[serde(deserialize_with = "decimal_from_number_or_string")]
    price: BigDecimal,
}

#[derive(Debug, Default, Deserialize)]
struct CatalogErrorPayload {
    #[serde(default)]
    message: Option<String>,
    #[serde(default, alias = "unknownIds")]
    unknown_ids: Vec<serde_json::Value>,
}

/// Product catalog reached over HTTP.
///
/// `POST {base_url}/products/validate` with `{"ids": [...]}` answers with the
/// matching products, or a 4xx naming the ids it does not know.
#[derive(Debug, Clone)]
pub struct HttpProductCatalog {
    base_url: String,
    http: Client,
}

impl HttpProductCatalog {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: Client::builder().timeout(timeout).build()?,
        })
    }
}

fn transport_error(e: reqwest::Error) -> CatalogError {
    if e.is_timeout() {
        CatalogError::Timeout
    } else {
        CatalogError::Unavailable(e.to_string())
    }
}

#[async_trait]
impl ProductCatalog for HttpProductCatalog {
    async fn validate_products(&self, ids: &[String]) -> Result<Vec<Product>, CatalogError> {
        let url = format!("{}/products/validate", self.base_url);

        let response = self
            .http
            .post(&url)
            .json(&ValidateProductsRequest { ids })
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if status.is_success() {
            let products: Vec<ProductPayload> = response.json().await.map_err(transport_error)?;
            return Ok(products
                .into_iter()
                .map(|p| Product {
                    id: p.id,
                    name: p.name,
                    price: p.price,
                })
                .collect());
        }

        match status {
            StatusCode::BAD_REQUEST | StatusCode::NOT_FOUND | StatusCode::UNPROCESSABLE_ENTITY => {
                let body: CatalogErrorPayload = response.json().await.unwrap_or_default();
                if body.unknown_ids.is_empty() {
                    Err(CatalogError::Rejected(
                        body.message.unwrap_or_else(|| status.to_string()),
                    ))
                } else {
                    Err(CatalogError::UnknownProducts(
                        body.unknown_ids
                            .into_iter()
                            .map(|id| match id {
                                serde_json::Value::String(s) => s,
                                other => other.to_string(),
                            })
                            .collect(),
                    ))
                }
            }
            _ => {
                let text = response.text().await.unwrap_or_default();
                Err(CatalogError::Unavailable(format!(
                    "validate products failed with status {status}: {text}"
                )))
            }
        }
    }
}
