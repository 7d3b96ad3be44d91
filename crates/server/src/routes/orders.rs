//! Order placement and lifecycle handlers.
//!
//! Placement inserts the order and all line items in one transaction, then
//! sends one seller notification per line item after the commit. Notification
//! failures are logged and never fail the order.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
};
use serde::Deserialize;
use serde_json::Value;

use bazaar_core::{OrderId, ProductId, UserId};

use crate::db::{OrderRepository, OrderWithItems, ProductRepository};
use crate::error::AppError;
use crate::middleware::RequireAuth;
use crate::models::{CurrentUser, NewOrder, NewOrderItem, OrderView};
use crate::services::{SellerNotification, notify_sellers};
use crate::state::AppState;

use super::{coerce_price, coerce_price_or_zero};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/orders", get(list_all).post(create))
        .route("/api/orders/myorders", get(my_orders))
        .route("/api/orders/{id}", get(get_one))
        .route("/api/orders/{id}/pay", put(pay))
        .route("/api/orders/{id}/deliver", put(deliver))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateOrderRequest {
    order_items: Option<Vec<OrderItemInput>>,
    shipping_address: Option<Value>,
    payment_method: Option<String>,
    items_price: Option<Value>,
    tax_price: Option<Value>,
    shipping_price: Option<Value>,
    total_price: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct OrderItemInput {
    product: Option<ProductId>,
    name: Option<String>,
    qty: Option<i32>,
    image: Option<String>,
    price: Option<Value>,
}

fn view(expanded: OrderWithItems) -> OrderView {
    OrderView::new(expanded.order, expanded.items, expanded.user)
}

/// Validate one raw line item into the persistable form.
fn validate_item(item: OrderItemInput) -> Result<NewOrderItem, AppError> {
    let product_id = item
        .product
        .ok_or_else(|| AppError::Validation("Order item is missing a product".to_owned()))?;

    let name = item
        .name
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| AppError::Validation("Order item is missing a name".to_owned()))?;

    let qty = item.qty.unwrap_or(1);
    if qty < 1 {
        return Err(AppError::Validation(
            "Quantity cannot be less than 1".to_owned(),
        ));
    }

    let price = item
        .price
        .ok_or_else(|| AppError::Validation("Order item is missing a price".to_owned()))?;
    let price = coerce_price("price", &price)?;

    Ok(NewOrderItem {
        product_id,
        name,
        qty,
        image: item.image,
        price,
    })
}

/// Build the notification batch for a freshly committed order, one entry per
/// line item whose seller still resolves.
async fn notification_batch(
    state: &AppState,
    order_id: OrderId,
    buyer: &CurrentUser,
    items: &[NewOrderItem],
) -> Result<Vec<SellerNotification>, AppError> {
    let products = ProductRepository::new(state.pool());
    let mut batch = Vec::with_capacity(items.len());

    for item in items {
        let Some((product, owner)) = products.get_with_owner(item.product_id).await? else {
            tracing::warn!(
                product_id = %item.product_id,
                order_id = %order_id,
                "Ordered product no longer exists; seller not notified"
            );
            continue;
        };

        let Some(owner) = owner else {
            tracing::warn!(
                product_id = %product.id,
                order_id = %order_id,
                "Ordered product has no resolvable seller; not notified"
            );
            continue;
        };

        batch.push(SellerNotification {
            seller_name: owner.name,
            seller_email: owner.email,
            product_title: product.title,
            product_description: product.description,
            product_price: item.price,
            order_id,
            customer_name: buyer.name.clone(),
            customer_email: buyer.email.clone(),
            quantity: item.qty,
        });
    }

    Ok(batch)
}

/// Validate a raw order request into the persistable header and items.
///
/// Nothing is rejected after this point, so a failure here means nothing
/// reaches the database.
fn validate_order(
    request: CreateOrderRequest,
    buyer: UserId,
) -> Result<(NewOrder, Vec<NewOrderItem>), AppError> {
    let raw_items = request.order_items.unwrap_or_default();
    if raw_items.is_empty() {
        return Err(AppError::Validation("No order items".to_owned()));
    }

    let payment_method = request
        .payment_method
        .filter(|m| !m.trim().is_empty())
        .ok_or_else(|| AppError::Validation("Payment method is required".to_owned()))?;

    let items = raw_items
        .into_iter()
        .map(validate_item)
        .collect::<Result<Vec<_>, _>>()?;

    // Totals are taken from the client as-is; they are not recomputed here.
    let new_order = NewOrder {
        user_id: buyer,
        shipping_address: request.shipping_address,
        payment_method,
        items_price: coerce_price_or_zero("itemsPrice", request.items_price.as_ref())?,
        tax_price: coerce_price_or_zero("taxPrice", request.tax_price.as_ref())?,
        shipping_price: coerce_price_or_zero("shippingPrice", request.shipping_price.as_ref())?,
        total_price: coerce_price_or_zero("totalPrice", request.total_price.as_ref())?,
    };

    Ok((new_order, items))
}

async fn create(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    Json(request): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderView>), AppError> {
    let (new_order, items) = validate_order(request, current.id)?;

    let orders = OrderRepository::new(state.pool());
    let order_id = orders.create_with_items(new_order, &items).await?;

    tracing::info!(order_id = %order_id, user_id = %current.id, "Order placed");

    // The order is committed; notifications are strictly best-effort from
    // here on.
    if let Some(notifier) = state.notifier() {
        match notification_batch(&state, order_id, &current, &items).await {
            Ok(batch) => {
                notify_sellers(notifier.as_ref(), &batch).await;
            }
            Err(e) => tracing::warn!(
                order_id = %order_id,
                error = %e,
                "Failed to build seller notifications"
            ),
        }
    }

    let expanded = orders
        .get(order_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Order".to_owned()))?;

    Ok((StatusCode::CREATED, Json(view(expanded))))
}

async fn get_one(
    State(state): State<AppState>,
    RequireAuth(_current): RequireAuth,
    Path(id): Path<OrderId>,
) -> Result<Json<OrderView>, AppError> {
    let expanded = OrderRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Order".to_owned()))?;

    Ok(Json(view(expanded)))
}

async fn pay(
    State(state): State<AppState>,
    RequireAuth(_current): RequireAuth,
    Path(id): Path<OrderId>,
    Json(payment_result): Json<Value>,
) -> Result<Json<OrderView>, AppError> {
    // The payment payload is stored verbatim; no gateway verification here.
    let expanded = OrderRepository::new(state.pool())
        .mark_paid(id, payment_result)
        .await
        .map_err(|e| match e {
            crate::db::RepositoryError::NotFound => AppError::NotFound("Order".to_owned()),
            other => other.into(),
        })?;

    tracing::info!(order_id = %id, "Order marked paid");

    Ok(Json(view(expanded)))
}

async fn deliver(
    State(state): State<AppState>,
    RequireAuth(_current): RequireAuth,
    Path(id): Path<OrderId>,
) -> Result<Json<OrderView>, AppError> {
    let expanded = OrderRepository::new(state.pool())
        .mark_delivered(id)
        .await
        .map_err(|e| match e {
            crate::db::RepositoryError::NotFound => AppError::NotFound("Order".to_owned()),
            other => other.into(),
        })?;

    tracing::info!(order_id = %id, "Order marked delivered");

    Ok(Json(view(expanded)))
}

async fn my_orders(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
) -> Result<Json<Vec<OrderView>>, AppError> {
    let orders = OrderRepository::new(state.pool())
        .list_by_user(current.id)
        .await?
        .into_iter()
        .map(view)
        .collect();

    Ok(Json(orders))
}

async fn list_all(
    State(state): State<AppState>,
    RequireAuth(_current): RequireAuth,
) -> Result<Json<Vec<OrderView>>, AppError> {
    let orders = OrderRepository::new(state.pool())
        .list_all()
        .await?
        .into_iter()
        .map(view)
        .collect();

    Ok(Json(orders))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_item(qty: Option<i32>) -> OrderItemInput {
        OrderItemInput {
            product: Some(ProductId::random()),
            name: Some("Running Shoes".to_owned()),
            qty,
            image: None,
            price: Some(serde_json::json!("49.99")),
        }
    }

    #[test]
    fn quantity_below_one_is_rejected() {
        assert!(validate_item(raw_item(Some(0))).is_err());
        assert!(validate_item(raw_item(Some(-3))).is_err());
        assert!(validate_item(raw_item(Some(1))).is_ok());
    }

    #[test]
    fn missing_quantity_defaults_to_one() {
        let item = validate_item(raw_item(None)).expect("valid");
        assert_eq!(item.qty, 1);
    }

    #[test]
    fn item_without_product_or_price_is_rejected() {
        let mut missing_product = raw_item(Some(1));
        missing_product.product = None;
        assert!(validate_item(missing_product).is_err());

        let mut missing_price = raw_item(Some(1));
        missing_price.price = None;
        assert!(validate_item(missing_price).is_err());
    }

    fn order_request(items: Option<Vec<OrderItemInput>>) -> CreateOrderRequest {
        CreateOrderRequest {
            order_items: items,
            shipping_address: None,
            payment_method: Some("PayPal".to_owned()),
            items_price: None,
            tax_price: None,
            shipping_price: None,
            total_price: None,
        }
    }

    #[test]
    fn order_without_items_is_rejected_before_persistence() {
        let buyer = UserId::random();

        let empty = validate_order(order_request(Some(vec![])), buyer);
        assert!(matches!(empty, Err(AppError::Validation(msg)) if msg == "No order items"));

        let absent = validate_order(order_request(None), buyer);
        assert!(matches!(absent, Err(AppError::Validation(msg)) if msg == "No order items"));
    }

    #[test]
    fn order_without_payment_method_is_rejected() {
        let mut request = order_request(Some(vec![raw_item(Some(1))]));
        request.payment_method = None;
        assert!(matches!(
            validate_order(request, UserId::random()),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn valid_order_request_carries_buyer_and_items() {
        let buyer = UserId::random();
        let (new_order, items) =
            validate_order(order_request(Some(vec![raw_item(Some(2))])), buyer)
                .expect("valid");

        assert_eq!(new_order.user_id, buyer);
        assert_eq!(new_order.payment_method, "PayPal");
        assert_eq!(items.len(), 1);
        assert_eq!(items.first().map(|i| i.qty), Some(2));
    }

    #[test]
    fn order_request_reads_camel_case_fields() {
        let request: CreateOrderRequest = serde_json::from_value(serde_json::json!({
            "orderItems": [{"product": uuid::Uuid::new_v4(), "name": "Shoes", "qty": 2, "price": 49.99}],
            "shippingAddress": {"city": "Lahore"},
            "paymentMethod": "PayPal",
            "totalPrice": "99.98"
        }))
        .expect("deserialize");

        assert_eq!(request.payment_method.as_deref(), Some("PayPal"));
        assert_eq!(request.order_items.map(|i| i.len()), Some(1));
        assert!(request.shipping_address.is_some());
        assert!(request.items_price.is_none());
    }
}
