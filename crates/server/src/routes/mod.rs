//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! # Auth
//! POST /api/auth/register          - Create user, returns identity + token
//! POST /api/auth/login             - Authenticate, returns identity + token
//! GET  /api/auth/profile           - Current user's profile (token)
//! PUT  /api/auth/profile           - Update current user's profile (token)
//!
//! # Products
//! GET    /api/products             - Paginated list, optional keyword filter
//! POST   /api/products             - Create product owned by caller (token)
//! GET    /api/products/my-products - Caller's products (token)
//! GET    /api/products/{id}        - Fetch one
//! PUT    /api/products/{id}        - Update, owner-only (token)
//! DELETE /api/products/{id}        - Delete, owner-only (token)
//!
//! # Orders
//! POST /api/orders                 - Create order + items, notify sellers (token)
//! GET  /api/orders/myorders        - Caller's orders (token)
//! GET  /api/orders                 - All orders (token)
//! GET  /api/orders/{id}            - Fetch one (token)
//! PUT  /api/orders/{id}/pay        - Mark paid (token)
//! PUT  /api/orders/{id}/deliver    - Mark delivered (token)
//! ```

pub mod auth;
pub mod orders;
pub mod products;

use axum::Router;
use serde_json::Value;

use bazaar_core::Price;

use crate::error::AppError;
use crate::state::AppState;

/// Build the full API router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .merge(products::router())
        .merge(orders::router())
}

/// Coerce a JSON value into a [`Price`].
///
/// Accepts both JSON numbers and numeric strings, the same inputs the old
/// clients send. Anything else, or a negative amount, is a validation error.
pub(crate) fn coerce_price(field: &str, value: &Value) -> Result<Price, AppError> {
    let parsed = match value {
        Value::Number(n) => Price::parse(&n.to_string()),
        Value::String(s) => Price::parse(s),
        _ => {
            return Err(AppError::Validation(format!(
                "{field} must be a non-negative number"
            )));
        }
    };

    parsed.map_err(|_| AppError::Validation(format!("{field} must be a non-negative number")))
}

/// Coerce an optional JSON value into a [`Price`], defaulting to zero.
pub(crate) fn coerce_price_or_zero(
    field: &str,
    value: Option<&Value>,
) -> Result<Price, AppError> {
    value.map_or(Ok(Price::ZERO), |v| coerce_price(field, v))
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use serde_json::json;

    use super::*;

    #[test]
    fn coerces_numbers_and_numeric_strings() {
        let from_number = coerce_price("price", &json!(19.99)).expect("number");
        let from_string = coerce_price("price", &json!("19.99")).expect("string");
        assert_eq!(from_number.amount(), Decimal::new(1999, 2));
        assert_eq!(from_number, from_string);
    }

    #[test]
    fn rejects_negative_and_non_numeric_input() {
        assert!(coerce_price("price", &json!(-1)).is_err());
        assert!(coerce_price("price", &json!("free")).is_err());
        assert!(coerce_price("price", &json!({"amount": 5})).is_err());
        assert!(coerce_price("price", &json!(null)).is_err());
    }

    #[test]
    fn missing_optional_price_defaults_to_zero() {
        assert_eq!(
            coerce_price_or_zero("taxPrice", None).expect("default"),
            Price::ZERO
        );
        assert_eq!(
            coerce_price_or_zero("taxPrice", Some(&json!("2.50"))).expect("value"),
            Price::parse("2.50").expect("valid")
        );
    }
}
