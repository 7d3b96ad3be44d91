//! Database access for the marketplace `PostgreSQL` schema.
//!
//! ## Tables
//!
//! - `users` - Accounts with hashed passwords and roles
//! - `products` - Listings owned by a user
//! - `orders` - Order headers (paid/delivered flags, price components)
//! - `order_items` - Per-product snapshots, cascade-deleted with the order
//!
//! # Migrations
//!
//! Migrations live in `crates/server/migrations/` and are applied on
//! startup before the server accepts traffic.
//!
//! Queries use the runtime `query_as` API with explicit row structs that
//! convert into the domain types from `crate::models`.

pub mod orders;
pub mod products;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use orders::{OrderRepository, OrderWithItems};
pub use products::{PAGE_SIZE, ProductPage, ProductRepository};
pub use users::{UserRepository, UserUpdate};

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Map a sqlx error to `Conflict` when it is a unique violation.
pub(crate) fn conflict_on_unique(err: sqlx::Error, message: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = err
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(message.to_owned());
    }
    RepositoryError::Database(err)
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
