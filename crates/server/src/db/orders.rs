//! Order repository for database operations.
//!
//! Order creation inserts the header and every line item in a single
//! transaction; nothing is visible until all inserts succeed. Seller
//! notifications are the caller's responsibility and happen after commit.

use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use bazaar_core::{Email, OrderId, OrderItemId, Price, ProductId, UserId};

use super::RepositoryError;
use crate::models::order::ProductSnapshotView;
use crate::models::{NewOrder, NewOrderItem, Order, OrderItemView, UserSummary};

const ORDER_COLUMNS: &str = "id, user_id, shipping_address, payment_method,
     items_price, tax_price, shipping_price, total_price,
     is_paid, paid_at, payment_result, is_delivered, delivered_at,
     created_at, updated_at";

/// Internal row type for order header queries.
#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    user_id: Uuid,
    shipping_address: Option<Value>,
    payment_method: String,
    items_price: Price,
    tax_price: Price,
    shipping_price: Price,
    total_price: Price,
    is_paid: bool,
    paid_at: Option<DateTime<Utc>>,
    payment_result: Option<Value>,
    is_delivered: bool,
    delivered_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        Self {
            id: OrderId::new(row.id),
            user_id: UserId::new(row.user_id),
            shipping_address: row.shipping_address,
            payment_method: row.payment_method,
            items_price: row.items_price,
            tax_price: row.tax_price,
            shipping_price: row.shipping_price,
            total_price: row.total_price,
            is_paid: row.is_paid,
            paid_at: row.paid_at,
            payment_result: row.payment_result,
            is_delivered: row.is_delivered,
            delivered_at: row.delivered_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Internal row type for line items with the live product joined in.
#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    id: Uuid,
    product_id: Uuid,
    name: String,
    qty: i32,
    image: Option<String>,
    price: Price,
    product_title: Option<String>,
    product_description: Option<String>,
    product_price: Option<Price>,
    product_image: Option<String>,
    product_created_by: Option<Uuid>,
}

impl From<OrderItemRow> for OrderItemView {
    fn from(row: OrderItemRow) -> Self {
        let product = match (
            row.product_title,
            row.product_description,
            row.product_price,
            row.product_image,
            row.product_created_by,
        ) {
            (Some(title), Some(description), Some(price), Some(image), Some(created_by)) => {
                Some(ProductSnapshotView {
                    id: ProductId::new(row.product_id),
                    title,
                    description,
                    price,
                    image,
                    created_by: UserId::new(created_by),
                })
            }
            _ => None,
        };

        Self {
            id: OrderItemId::new(row.id),
            product_id: ProductId::new(row.product_id),
            name: row.name,
            qty: row.qty,
            image: row.image,
            price: row.price,
            product,
        }
    }
}

/// An order with its line items and buyer summary resolved.
#[derive(Debug)]
pub struct OrderWithItems {
    pub order: Order,
    pub items: Vec<OrderItemView>,
    pub user: Option<UserSummary>,
}

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create an order header and all of its line items atomically.
    ///
    /// The transaction commits only after every insert succeeds; a failure
    /// partway leaves nothing persisted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any insert fails.
    pub async fn create_with_items(
        &self,
        new: NewOrder,
        items: &[NewOrderItem],
    ) -> Result<OrderId, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let order_id = sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO orders (user_id, shipping_address, payment_method,
                                 items_price, tax_price, shipping_price, total_price)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING id",
        )
        .bind(new.user_id)
        .bind(new.shipping_address)
        .bind(new.payment_method)
        .bind(new.items_price)
        .bind(new.tax_price)
        .bind(new.shipping_price)
        .bind(new.total_price)
        .fetch_one(&mut *tx)
        .await?;

        for item in items {
            sqlx::query(
                "INSERT INTO order_items (order_id, product_id, name, qty, image, price)
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(order_id)
            .bind(item.product_id)
            .bind(&item.name)
            .bind(item.qty)
            .bind(item.image.as_deref())
            .bind(item.price)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(OrderId::new(order_id))
    }

    /// Get an order with items, item products, and buyer expanded.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn get(&self, id: OrderId) -> Result<Option<OrderWithItems>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let order: Order = row.into();
        let items = self.items_for(order.id).await?;
        let user = self.buyer_summary(order.user_id).await?;

        Ok(Some(OrderWithItems { order, items, user }))
    }

    /// Flip the paid flag, stamp the time, and store the payment payload
    /// verbatim. Repeat calls overwrite the timestamp and payload.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn mark_paid(
        &self,
        id: OrderId,
        payment_result: Value,
    ) -> Result<OrderWithItems, RepositoryError> {
        let result = sqlx::query(
            "UPDATE orders
             SET is_paid = true, paid_at = now(), payment_result = $2, updated_at = now()
             WHERE id = $1",
        )
        .bind(id)
        .bind(payment_result)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        self.get(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Flip the delivered flag and stamp the time.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn mark_delivered(&self, id: OrderId) -> Result<OrderWithItems, RepositoryError> {
        let result = sqlx::query(
            "UPDATE orders
             SET is_delivered = true, delivered_at = now(), updated_at = now()
             WHERE id = $1",
        )
        .bind(id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        self.get(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// All orders placed by a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_by_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<OrderWithItems>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        self.expand_all(rows).await
    }

    /// All orders in the system, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_all(&self) -> Result<Vec<OrderWithItems>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        self.expand_all(rows).await
    }

    async fn expand_all(
        &self,
        rows: Vec<OrderRow>,
    ) -> Result<Vec<OrderWithItems>, RepositoryError> {
        let mut expanded = Vec::with_capacity(rows.len());
        for row in rows {
            let order: Order = row.into();
            let items = self.items_for(order.id).await?;
            let user = self.buyer_summary(order.user_id).await?;
            expanded.push(OrderWithItems { order, items, user });
        }
        Ok(expanded)
    }

    async fn items_for(&self, order_id: OrderId) -> Result<Vec<OrderItemView>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderItemRow>(
            "SELECT i.id, i.product_id, i.name, i.qty, i.image, i.price,
                    p.title AS product_title, p.description AS product_description,
                    p.price AS product_price, p.image AS product_image,
                    p.created_by AS product_created_by
             FROM order_items i
             LEFT JOIN products p ON p.id = i.product_id
             WHERE i.order_id = $1
             ORDER BY i.created_at ASC",
        )
        .bind(order_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn buyer_summary(
        &self,
        user_id: UserId,
    ) -> Result<Option<UserSummary>, RepositoryError> {
        let row = sqlx::query_as::<_, (Uuid, String, String)>(
            "SELECT id, name, email FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        row.map(|(id, name, email)| {
            Ok(UserSummary {
                id: UserId::new(id),
                name,
                email: Email::parse(&email).map_err(|e| {
                    RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
                })?,
            })
        })
        .transpose()
    }
}
