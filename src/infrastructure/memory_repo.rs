use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::order::{
    ListResult, NewOrder, OrderItemRecord, OrderRecord, OrderWithItems, PaymentSucceeded,
    ReceiptRecord,
};
use crate::domain::ports::OrderRepository;
use crate::domain::status::OrderStatus;

#[derive(Debug, Default)]
struct InMemoryState {
    orders: HashMap<Uuid, OrderRecord>,
    items: HashMap<Uuid, Vec<OrderItemRecord>>,
    receipts: Vec<ReceiptRecord>,
    writes: usize,
    last_created: Option<DateTime<Utc>>,
}

impl InMemoryState {
    /// Creation timestamps strictly increase, so listing order follows
    /// insertion order even when the clock does not move between inserts.
    fn next_created_at(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let at = match self.last_created {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.last_created = Some(at);
        at
    }
}

/// Process-local order store.
///
/// Each operation holds the lock for its whole duration, which gives the same
/// all-or-nothing behaviour as a database transaction. Every write is counted
/// so callers can check that idempotent operations did not touch the store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryOrderRepository {
    state: Arc<RwLock<InMemoryState>>,
}

impl InMemoryOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of write operations applied so far.
    pub fn write_count(&self) -> usize {
        self.read().map(|state| state.writes).unwrap_or_default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, InMemoryState>, DomainError> {
        self.state
            .read()
            .map_err(|e| DomainError::Internal(format!("order store lock poisoned: {e}")))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, InMemoryState>, DomainError> {
        self.state
            .write()
            .map_err(|e| DomainError::Internal(format!("order store lock poisoned: {e}")))
    }
}

impl OrderRepository for InMemoryOrderRepository {
    fn create(&self, order: NewOrder) -> Result<OrderWithItems, DomainError> {
        let mut state = self.write()?;

        let record = OrderRecord {
            id: Uuid::new_v4(),
            total_amount: order.total_amount,
            total_items: order.total_items,
            status: OrderStatus::Pending,
            paid: false,
            payment_reference: None,
            created_at: state.next_created_at(),
        };
        let items: Vec<OrderItemRecord> = order
            .items
            .into_iter()
            .map(|item| OrderItemRecord {
                product_id: item.product_id,
                quantity: item.quantity,
                price: item.price,
            })
            .collect();

        state.orders.insert(record.id, record.clone());
        state.items.insert(record.id, items.clone());
        state.writes += 1;

        Ok(OrderWithItems {
            order: record,
            items,
        })
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<OrderWithItems>, DomainError> {
        let state = self.read()?;
        Ok(state.orders.get(&id).map(|order| OrderWithItems {
            order: order.clone(),
            items: state.items.get(&id).cloned().unwrap_or_default(),
        }))
    }

    fn find_order(&self, id: Uuid) -> Result<Option<OrderRecord>, DomainError> {
        Ok(self.read()?.orders.get(&id).cloned())
    }

    fn list(
        &self,
        page: i64,
        limit: i64,
        status: Option<OrderStatus>,
    ) -> Result<ListResult, DomainError> {
        let state = self.read()?;

        let mut matching: Vec<&OrderRecord> = state
            .orders
            .values()
            .filter(|order| status.map_or(true, |s| order.status == s))
            .collect();
        matching.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

        let offset = usize::try_from((page - 1).saturating_mul(limit)).unwrap_or(usize::MAX);
        let limit = usize::try_from(limit).unwrap_or_default();

        Ok(ListResult {
            total: matching.len() as i64,
            items: matching
                .into_iter()
                .skip(offset)
                .take(limit)
                .cloned()
                .collect(),
        })
    }

    fn update_status(&self, id: Uuid, status: OrderStatus) -> Result<OrderRecord, DomainError> {
        let mut state = self.write()?;
        let order = state.orders.get_mut(&id).ok_or(DomainError::NotFound)?;
        order.status = status;
        let updated = order.clone();
        state.writes += 1;
        Ok(updated)
    }

    fn mark_paid(&self, payment: &PaymentSucceeded) -> Result<OrderRecord, DomainError> {
        let mut state = self.write()?;
        let order = state
            .orders
            .get_mut(&payment.order_id)
            .ok_or(DomainError::NotFound)?;
        order.status = OrderStatus::Paid;
        order.paid = true;
        order.payment_reference = Some(payment.payment_reference.clone());
        let updated = order.clone();

        state.receipts.push(ReceiptRecord {
            id: Uuid::new_v4(),
            order_id: payment.order_id,
            receipt_url: payment.receipt_url.clone(),
            created_at: Utc::now(),
        });
        state.writes += 1;
        Ok(updated)
    }

    fn find_receipts(&self, order_id: Uuid) -> Result<Vec<ReceiptRecord>, DomainError> {
        Ok(self
            .read()?
            .receipts
            .iter()
            .filter(|receipt| receipt.order_id == order_id)
            .cloned()
            .collect())
    }
}
