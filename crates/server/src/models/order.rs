//! Order domain types.
//!
//! An order exclusively owns its line items (cascade delete). Each line item
//! snapshots the product's name, image and price at order time; later product
//! edits never change a placed order.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use bazaar_core::{OrderId, OrderItemId, Price, ProductId, UserId};

use super::user::UserSummary;

/// An order header.
///
/// `is_paid` and `is_delivered` are independent one-way flags; nothing in the
/// model forces payment before delivery.
#[derive(Debug, Clone)]
pub struct Order {
    pub id: OrderId,
    /// The buyer.
    pub user_id: UserId,
    /// Structured shipping address, stored opaquely.
    pub shipping_address: Option<Value>,
    pub payment_method: String,
    pub items_price: Price,
    pub tax_price: Price,
    pub shipping_price: Price,
    /// Caller-supplied total; not recomputed from line items.
    pub total_price: Price,
    pub is_paid: bool,
    pub paid_at: Option<DateTime<Utc>>,
    /// Opaque payment confirmation payload, stored verbatim.
    pub payment_result: Option<Value>,
    pub is_delivered: bool,
    pub delivered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for creating an order header.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: UserId,
    pub shipping_address: Option<Value>,
    pub payment_method: String,
    pub items_price: Price,
    pub tax_price: Price,
    pub shipping_price: Price,
    pub total_price: Price,
}

/// Fields for creating one line item.
#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub product_id: ProductId,
    pub name: String,
    pub qty: i32,
    pub image: Option<String>,
    pub price: Price,
}

/// A line item with its live product expanded (if it still exists).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemView {
    pub id: OrderItemId,
    pub product_id: ProductId,
    pub name: String,
    pub qty: i32,
    pub image: Option<String>,
    pub price: Price,
    /// The referenced product as it exists now; the snapshot fields above
    /// are authoritative for what was ordered.
    pub product: Option<ProductSnapshotView>,
}

/// The live product embedded under a line item.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSnapshotView {
    pub id: ProductId,
    pub title: String,
    pub description: String,
    pub price: Price,
    pub image: String,
    pub created_by: UserId,
}

/// An order with items and buyer expanded, as returned by all order endpoints.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    pub id: OrderId,
    pub user_id: UserId,
    pub shipping_address: Option<Value>,
    pub payment_method: String,
    pub items_price: Price,
    pub tax_price: Price,
    pub shipping_price: Price,
    pub total_price: Price,
    pub is_paid: bool,
    pub paid_at: Option<DateTime<Utc>>,
    pub payment_result: Option<Value>,
    pub is_delivered: bool,
    pub delivered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub order_items: Vec<OrderItemView>,
    /// The buyer's public summary.
    pub user: Option<UserSummary>,
}

impl OrderView {
    /// Build a view from an order, its items, and an optional buyer summary.
    #[must_use]
    pub fn new(order: Order, order_items: Vec<OrderItemView>, user: Option<UserSummary>) -> Self {
        Self {
            id: order.id,
            user_id: order.user_id,
            shipping_address: order.shipping_address,
            payment_method: order.payment_method,
            items_price: order.items_price,
            tax_price: order.tax_price,
            shipping_price: order.shipping_price,
            total_price: order.total_price,
            is_paid: order.is_paid,
            paid_at: order.paid_at,
            payment_result: order.payment_result,
            is_delivered: order.is_delivered,
            delivered_at: order.delivered_at,
            created_at: order.created_at,
            updated_at: order.updated_at,
            order_items,
            user,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_view_serializes_camel_case() {
        let order = Order {
            id: OrderId::random(),
            user_id: UserId::random(),
            shipping_address: Some(serde_json::json!({"city": "Lahore"})),
            payment_method: "PayPal".to_owned(),
            items_price: Price::ZERO,
            tax_price: Price::ZERO,
            shipping_price: Price::ZERO,
            total_price: Price::parse("10.00").expect("valid"),
            is_paid: false,
            paid_at: None,
            payment_result: None,
            is_delivered: false,
            delivered_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let view = OrderView::new(order, vec![], None);
        let json = serde_json::to_value(&view).expect("serialize");

        assert!(json.get("isPaid").is_some());
        assert!(json.get("shippingAddress").is_some());
        assert!(json.get("orderItems").is_some());
        assert!(json.get("is_paid").is_none());
    }
}
