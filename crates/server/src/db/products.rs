//! Product repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use bazaar_core::{Email, Price, ProductId, UserId};

use super::RepositoryError;
use crate::models::{NewProduct, Product, UserSummary};

/// Fixed page size for the public product listing.
pub const PAGE_SIZE: i64 = 10;

const PRODUCT_WITH_OWNER: &str = "SELECT p.id, p.title, p.description, p.price, p.image,
            p.created_by, p.created_at, p.updated_at,
            u.id AS owner_id, u.name AS owner_name, u.email AS owner_email
     FROM products p
     LEFT JOIN users u ON u.id = p.created_by";

/// Internal row type for product queries with the seller joined in.
#[derive(Debug, sqlx::FromRow)]
struct ProductWithOwnerRow {
    id: Uuid,
    title: String,
    description: String,
    price: Price,
    image: String,
    created_by: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    owner_id: Option<Uuid>,
    owner_name: Option<String>,
    owner_email: Option<String>,
}

impl TryFrom<ProductWithOwnerRow> for (Product, Option<UserSummary>) {
    type Error = RepositoryError;

    fn try_from(row: ProductWithOwnerRow) -> Result<Self, Self::Error> {
        let owner = match (row.owner_id, row.owner_name, row.owner_email) {
            (Some(id), Some(name), Some(email)) => Some(UserSummary {
                id: UserId::new(id),
                name,
                email: Email::parse(&email).map_err(|e| {
                    RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
                })?,
            }),
            _ => None,
        };

        let product = Product {
            id: ProductId::new(row.id),
            title: row.title,
            description: row.description,
            price: row.price,
            image: row.image,
            created_by: UserId::new(row.created_by),
            created_at: row.created_at,
            updated_at: row.updated_at,
        };

        Ok((product, owner))
    }
}

/// Internal row type for bare product queries.
#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: Uuid,
    title: String,
    description: String,
    price: Price,
    image: String,
    created_by: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: ProductId::new(row.id),
            title: row.title,
            description: row.description,
            price: row.price,
            image: row.image,
            created_by: UserId::new(row.created_by),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// One page of the public product listing.
#[derive(Debug)]
pub struct ProductPage {
    pub products: Vec<(Product, Option<UserSummary>)>,
    pub total: i64,
}

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List one page of products, optionally filtered by a case-insensitive
    /// substring match on the title.
    ///
    /// Pages are 1-indexed with a fixed size of [`PAGE_SIZE`]. An
    /// out-of-range page yields an empty set with the correct total.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list(
        &self,
        page: i64,
        keyword: Option<&str>,
    ) -> Result<ProductPage, RepositoryError> {
        let pattern = keyword.map(|k| format!("%{k}%"));
        let offset = (page - 1) * PAGE_SIZE;

        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM products WHERE ($1::text IS NULL OR title ILIKE $1)",
        )
        .bind(pattern.as_deref())
        .fetch_one(self.pool)
        .await?;

        let rows = sqlx::query_as::<_, ProductWithOwnerRow>(&format!(
            "{PRODUCT_WITH_OWNER}
             WHERE ($1::text IS NULL OR p.title ILIKE $1)
             ORDER BY p.created_at DESC
             LIMIT $2 OFFSET $3"
        ))
        .bind(pattern.as_deref())
        .bind(PAGE_SIZE)
        .bind(offset)
        .fetch_all(self.pool)
        .await?;

        let products = rows
            .into_iter()
            .map(TryInto::try_into)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ProductPage { products, total })
    }

    /// Get a product with its seller expanded.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn get_with_owner(
        &self,
        id: ProductId,
    ) -> Result<Option<(Product, Option<UserSummary>)>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductWithOwnerRow>(&format!(
            "{PRODUCT_WITH_OWNER} WHERE p.id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Get a bare product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            "SELECT id, title, description, price, image, created_by, created_at, updated_at
             FROM products WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Create a new product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, new: NewProduct) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            "INSERT INTO products (title, description, price, image, created_by)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id, title, description, price, image, created_by, created_at, updated_at",
        )
        .bind(new.title)
        .bind(new.description)
        .bind(new.price)
        .bind(new.image)
        .bind(new.created_by)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Persist a patched product. The caller is responsible for the
    /// ownership check; this replaces the mutable columns wholesale.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update(&self, product: &Product) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            "UPDATE products
             SET title = $2, description = $3, price = $4, image = $5, updated_at = now()
             WHERE id = $1
             RETURNING id, title, description, price, image, created_by, created_at, updated_at",
        )
        .bind(product.id)
        .bind(&product.title)
        .bind(&product.description)
        .bind(product.price)
        .bind(&product.image)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn delete(&self, id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// All products owned by a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_by_owner(
        &self,
        owner: UserId,
    ) -> Result<Vec<(Product, Option<UserSummary>)>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductWithOwnerRow>(&format!(
            "{PRODUCT_WITH_OWNER}
             WHERE p.created_by = $1
             ORDER BY p.created_at DESC"
        ))
        .bind(owner)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }
}
