//! Application services: token issuance, password hashing, email dispatch.

pub mod email;
pub mod password;
pub mod token;

pub use email::{EmailService, Notifier, SellerNotification, notify_sellers};
pub use password::{hash_password, verify_password};
pub use token::{TokenError, TokenService};
