use chrono::Utc;
use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::order::{
    ListResult, NewOrder, OrderRecord, OrderWithItems, PaymentSucceeded, ReceiptRecord,
};
use crate::domain::ports::OrderRepository;
use crate::domain::status::OrderStatus;
use crate::schema::{order_items, order_receipts, orders};

use super::models::{
    NewOrderItemRow, NewOrderRow, NewReceiptRow, OrderItemRow, OrderRow, ReceiptRow,
};

// ── Error conversions (infrastructure concern only) ──────────────────────────

impl From<diesel::result::Error> for DomainError {
    fn from(e: diesel::result::Error) -> Self {
        DomainError::Internal(e.to_string())
    }
}

impl From<r2d2::Error> for DomainError {
    fn from(e: r2d2::Error) -> Self {
        DomainError::Internal(e.to_string())
    }
}

// ── Repository ────────────────────────────────────────────────────────────────

/// PostgreSQL order store. Concurrent writes to one order are last-write-wins
/// at row level; no application lock is taken.
pub struct DieselOrderRepository {
    pool: DbPool,
}

impl DieselOrderRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl OrderRepository for DieselOrderRepository {
    fn create(&self, order: NewOrder) -> Result<OrderWithItems, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            // 1. Insert the order
            let order_id = Uuid::new_v4();
            let row = diesel::insert_into(orders::table)
                .values(&NewOrderRow {
                    id: order_id,
                    total_amount: order.total_amount.clone(),
                    total_items: order.total_items,
                    status: OrderStatus::Pending.as_str().to_string(),
                })
                .returning(OrderRow::as_returning())
                .get_result(conn)?;

            // 2. Insert its items with their snapshot prices
            let new_items: Vec<NewOrderItemRow> = order
                .items
                .iter()
                .zip(0..)
                .map(|(item, line_number)| NewOrderItemRow {
                    id: Uuid::new_v4(),
                    order_id,
                    line_number,
                    product_id: item.product_id.clone(),
                    price: item.price.clone(),
                    quantity: item.quantity,
                })
                .collect();
            let mut items = diesel::insert_into(order_items::table)
                .values(&new_items)
                .returning(OrderItemRow::as_returning())
                .get_results::<OrderItemRow>(conn)?;
            items.sort_by_key(|item| item.line_number);

            Ok(OrderWithItems {
                order: row.try_into()?,
                items: items.into_iter().map(Into::into).collect(),
            })
        })
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<OrderWithItems>, DomainError> {
        let mut conn = self.pool.get()?;

        let order = orders::table
            .filter(orders::id.eq(id))
            .select(OrderRow::as_select())
            .first(&mut conn)
            .optional()?;

        let Some(order) = order else {
            return Ok(None);
        };

        let items = OrderItemRow::belonging_to(&order)
            .order(order_items::line_number.asc())
            .select(OrderItemRow::as_select())
            .load(&mut conn)?;

        Ok(Some(OrderWithItems {
            order: order.try_into()?,
            items: items.into_iter().map(Into::into).collect(),
        }))
    }

    fn find_order(&self, id: Uuid) -> Result<Option<OrderRecord>, DomainError> {
        let mut conn = self.pool.get()?;

        orders::table
            .filter(orders::id.eq(id))
            .select(OrderRow::as_select())
            .first(&mut conn)
            .optional()?
            .map(OrderRecord::try_from)
            .transpose()
    }

    fn list(
        &self,
        page: i64,
        limit: i64,
        status: Option<OrderStatus>,
    ) -> Result<ListResult, DomainError> {
        let mut conn = self.pool.get()?;

        // Saturates: a page past the end is empty, never an error.
        let offset = (page - 1).saturating_mul(limit);
        conn.transaction::<_, DomainError, _>(|conn| {
            let total: i64 = match status {
                Some(status) => orders::table
                    .filter(orders::status.eq(status.as_str()))
                    .count()
                    .get_result(conn)?,
                None => orders::table.count().get_result(conn)?,
            };

            let mut query = orders::table.select(OrderRow::as_select()).into_boxed();
            if let Some(status) = status {
                query = query.filter(orders::status.eq(status.as_str()));
            }
            let rows = query
                .order((orders::created_at.asc(), orders::id.asc()))
                .limit(limit)
                .offset(offset)
                .load(conn)?;

            Ok(ListResult {
                items: rows
                    .into_iter()
                    .map(OrderRecord::try_from)
                    .collect::<Result<_, _>>()?,
                total,
            })
        })
    }

    fn update_status(&self, id: Uuid, status: OrderStatus) -> Result<OrderRecord, DomainError> {
        let mut conn = self.pool.get()?;

        diesel::update(orders::table.find(id))
            .set((
                orders::status.eq(status.as_str()),
                orders::updated_at.eq(Utc::now()),
            ))
            .returning(OrderRow::as_returning())
            .get_result(&mut conn)
            .optional()?
            .ok_or(DomainError::NotFound)?
            .try_into()
    }

    fn mark_paid(&self, payment: &PaymentSucceeded) -> Result<OrderRecord, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let row = diesel::update(orders::table.find(payment.order_id))
                .set((
                    orders::status.eq(OrderStatus::Paid.as_str()),
                    orders::paid.eq(true),
                    orders::payment_reference.eq(Some(payment.payment_reference.as_str())),
                    orders::updated_at.eq(Utc::now()),
                ))
                .returning(OrderRow::as_returning())
                .get_result(conn)
                .optional()?
                .ok_or(DomainError::NotFound)?;

            diesel::insert_into(order_receipts::table)
                .values(&NewReceiptRow {
                    id: Uuid::new_v4(),
                    order_id: payment.order_id,
                    receipt_url: payment.receipt_url.clone(),
                })
                .execute(conn)?;

            row.try_into()
        })
    }

    fn find_receipts(&self, order_id: Uuid) -> Result<Vec<ReceiptRecord>, DomainError> {
        let mut conn = self.pool.get()?;

        let rows = order_receipts::table
            .filter(order_receipts::order_id.eq(order_id))
            .order((order_receipts::created_at.asc(), order_receipts::id.asc()))
            .select(ReceiptRow::as_select())
            .load(&mut conn)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
