//! Domain types for the marketplace.
//!
//! These are validated in-memory representations; the raw database rows live
//! in the `db` module and convert into these via `TryFrom`.

pub mod order;
pub mod product;
pub mod user;

pub use order::{NewOrder, NewOrderItem, Order, OrderItemView, OrderView};
pub use product::{MAX_TITLE_LENGTH, NewProduct, Product, ProductPatch, ProductView};
pub use user::{CurrentUser, User, UserSummary, UserView};
