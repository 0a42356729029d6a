use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use crate::domain::errors::{CatalogError, DomainError, GatewayError};
use crate::domain::order::{
    CreatedOrder, NewOrder, NewOrderItem, OrderDetails, OrderItemDetails, OrderItemInput,
    OrderPage, OrderRecord, OrderWithItems, PaymentSucceeded,
};
use crate::domain::ports::{
    OrderRepository, PaymentGateway, PaymentLineItem, PaymentSessionRequest, Product,
    ProductCatalog,
};
use crate::domain::status::{transition, OrderStatus, Transition};

pub const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Clone)]
pub struct OrderServiceSettings {
    /// Upper bound for every catalog or gateway call.
    pub remote_timeout: Duration,
    pub currency: String,
}

impl Default for OrderServiceSettings {
    fn default() -> Self {
        Self {
            remote_timeout: Duration::from_secs(5),
            currency: "usd".to_string(),
        }
    }
}

/// Orchestrates order creation, settlement and the enriched read path.
///
/// Store calls run on the blocking pool and are never interleaved with a
/// remote call: the catalog is consulted before the write and the payment
/// gateway after the commit.
pub struct OrderService {
    repo: Arc<dyn OrderRepository>,
    catalog: Arc<dyn ProductCatalog>,
    payments: Arc<dyn PaymentGateway>,
    settings: OrderServiceSettings,
}

impl OrderService {
    pub fn new(
        repo: Arc<dyn OrderRepository>,
        catalog: Arc<dyn ProductCatalog>,
        payments: Arc<dyn PaymentGateway>,
        settings: OrderServiceSettings,
    ) -> Self {
        Self {
            repo,
            catalog,
            payments,
            settings,
        }
    }

    /// Price the items against the catalog, persist the order and open a
    /// payment session for it.
    ///
    /// Nothing is written unless every product is known. If the payment
    /// session cannot be opened the order stays committed as `PENDING` and
    /// [`DomainError::PaymentSession`] carries its id.
    pub async fn create_order(
        &self,
        items: Vec<OrderItemInput>,
    ) -> Result<CreatedOrder, DomainError> {
        if items.is_empty() {
            return Err(DomainError::Validation(
                "an order needs at least one item".to_string(),
            ));
        }
        if let Some(item) = items.iter().find(|item| item.quantity <= 0) {
            return Err(DomainError::Validation(format!(
                "quantity for product {} must be positive",
                item.product_id
            )));
        }

        // 1. One catalog round trip for every distinct product
        let ids = distinct_product_ids(items.iter().map(|item| item.product_id.as_str()));
        let products = self
            .fetch_products(&ids)
            .await
            .map_err(|e| match e {
                CatalogError::UnknownProducts(_) | CatalogError::Rejected(_) => {
                    DomainError::Validation(e.to_string())
                }
                CatalogError::Unavailable(_) | CatalogError::Timeout => {
                    DomainError::Upstream(e.to_string())
                }
            })?;

        let missing: Vec<&str> = ids
            .iter()
            .filter(|id| !products.contains_key(*id))
            .map(String::as_str)
            .collect();
        if !missing.is_empty() {
            return Err(DomainError::Validation(format!(
                "Unknown products: {}",
                missing.join(", ")
            )));
        }

        // 2. Snapshot the catalog prices; totals follow from them
        let new_items = items
            .into_iter()
            .map(|item| {
                let product = lookup(&products, &item.product_id)?;
                Ok(NewOrderItem {
                    price: product.price.clone(),
                    product_id: item.product_id,
                    quantity: item.quantity,
                })
            })
            .collect::<Result<Vec<_>, DomainError>>()?;
        let new_order = NewOrder::from_items(new_items)?;

        // 3. Insert order and items atomically
        let created = self.with_repo(move |repo| repo.create(new_order)).await?;
        let order_id = created.order.id;
        log::info!(
            "Order {} created with {} items, total {}",
            order_id,
            created.order.total_items,
            created.order.total_amount
        );

        // 4. Names come from the response already in hand
        let order = decorate(created, &products)?;

        // 5. Payment session, only once the order is durable
        let request = PaymentSessionRequest {
            order_id,
            currency: self.settings.currency.clone(),
            items: order
                .items
                .iter()
                .map(|item| PaymentLineItem {
                    name: item.name.clone(),
                    price: item.price.clone(),
                    quantity: item.quantity,
                })
                .collect(),
        };
        let payment_session = match self.open_payment_session(request).await {
            Ok(session) => session,
            Err(e) => {
                log::error!(
                    "Order {} is PENDING without a payment session: {}",
                    order_id,
                    e
                );
                return Err(DomainError::PaymentSession {
                    order_id,
                    reason: e.to_string(),
                });
            }
        };

        Ok(CreatedOrder {
            order,
            payment_session,
        })
    }

    /// Page through orders, optionally restricted to one status.
    pub async fn find_all(
        &self,
        page: i64,
        limit: i64,
        status: Option<OrderStatus>,
    ) -> Result<OrderPage, DomainError> {
        let page = page.max(1);
        let limit = limit.clamp(1, MAX_PAGE_SIZE);

        let result = self
            .with_repo(move |repo| repo.list(page, limit, status))
            .await?;

        Ok(OrderPage::new(result, page, limit))
    }

    /// Fetch an order with its items named after the catalog's current data.
    ///
    /// Prices stay the ones captured at creation.
    pub async fn find_one(&self, id: Uuid) -> Result<OrderDetails, DomainError> {
        let order = self
            .with_repo(move |repo| repo.find_by_id(id))
            .await?
            .ok_or(DomainError::NotFound)?;

        let ids = distinct_product_ids(order.items.iter().map(|item| item.product_id.as_str()));
        let products = if ids.is_empty() {
            HashMap::new()
        } else {
            self.fetch_products(&ids)
                .await
                .map_err(|e| DomainError::Upstream(e.to_string()))?
        };

        decorate(order, &products)
    }

    /// Move an order to `status`. Requesting the current status writes nothing.
    pub async fn change_status(
        &self,
        id: Uuid,
        status: OrderStatus,
    ) -> Result<OrderRecord, DomainError> {
        let current = self
            .with_repo(move |repo| repo.find_order(id))
            .await?
            .ok_or(DomainError::NotFound)?;

        match transition(current.status, status) {
            Transition::Unchanged => {
                log::debug!("Order {} already {}", id, status);
                Ok(current)
            }
            Transition::Changed(next) => {
                let updated = self
                    .with_repo(move |repo| repo.update_status(id, next))
                    .await?;
                log::info!("Order {} moved from {} to {}", id, current.status, next);
                Ok(updated)
            }
        }
    }

    /// Apply a payment confirmation.
    ///
    /// Every delivery re-applies the update and records another receipt; there
    /// is no deduplication on the payment reference.
    pub async fn payment_succeeded(
        &self,
        payment: PaymentSucceeded,
    ) -> Result<OrderRecord, DomainError> {
        log::info!(
            "Payment succeeded for order {} (reference {}, receipt {})",
            payment.order_id,
            payment.payment_reference,
            payment.receipt_url
        );

        let order_id = payment.order_id;
        match self.with_repo(move |repo| repo.mark_paid(&payment)).await {
            Ok(order) => Ok(order),
            Err(DomainError::NotFound) => {
                log::warn!("Payment received for unknown order {}", order_id);
                Err(DomainError::NotFound)
            }
            Err(e) => {
                log::error!("Failed to settle order {}: {}", order_id, e);
                Err(e)
            }
        }
    }

    async fn with_repo<T, F>(&self, f: F) -> Result<T, DomainError>
    where
        F: FnOnce(&dyn OrderRepository) -> Result<T, DomainError> + Send + 'static,
        T: Send + 'static,
    {
        let repo = Arc::clone(&self.repo);
        tokio::task::spawn_blocking(move || f(repo.as_ref()))
            .await
            .map_err(|e| DomainError::Internal(format!("order store task failed: {e}")))?
    }

    async fn fetch_products(
        &self,
        ids: &[String],
    ) -> Result<HashMap<String, Product>, CatalogError> {
        let products = tokio::time::timeout(
            self.settings.remote_timeout,
            self.catalog.validate_products(ids),
        )
        .await
        .map_err(|_| CatalogError::Timeout)??;

        Ok(products
            .into_iter()
            .map(|product| (product.id.clone(), product))
            .collect())
    }

    async fn open_payment_session(
        &self,
        request: PaymentSessionRequest,
    ) -> Result<serde_json::Value, GatewayError> {
        tokio::time::timeout(
            self.settings.remote_timeout,
            self.payments.create_payment_session(request),
        )
        .await
        .map_err(|_| GatewayError::Timeout)?
    }
}

/// Distinct ids in first-seen order.
fn distinct_product_ids<'a>(ids: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    ids.filter(|id| seen.insert(*id))
        .map(str::to_string)
        .collect()
}

fn lookup<'a>(
    products: &'a HashMap<String, Product>,
    product_id: &str,
) -> Result<&'a Product, DomainError> {
    products.get(product_id).ok_or_else(|| {
        DomainError::Upstream(format!("product catalog did not return product {product_id}"))
    })
}

fn decorate(
    order: OrderWithItems,
    products: &HashMap<String, Product>,
) -> Result<OrderDetails, DomainError> {
    let items = order
        .items
        .into_iter()
        .map(|item| {
            let name = lookup(products, &item.product_id)?.name.clone();
            Ok(OrderItemDetails {
                product_id: item.product_id,
                name,
                quantity: item.quantity,
                price: item.price,
            })
        })
        .collect::<Result<_, DomainError>>()?;

    Ok(OrderDetails {
        order: order.order,
        items,
    })
}
