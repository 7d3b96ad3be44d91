//! Product domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use bazaar_core::{Price, ProductId, UserId};

use super::user::UserSummary;

/// Maximum length of a product title.
pub const MAX_TITLE_LENGTH: usize = 100;

/// A product listed on the marketplace.
#[derive(Debug, Clone)]
pub struct Product {
    /// Unique product ID.
    pub id: ProductId,
    /// Listing title (non-empty, at most 100 chars).
    pub title: String,
    /// Listing description (non-empty).
    pub description: String,
    /// Asking price (non-negative).
    pub price: Price,
    /// Image URI or embedded data reference.
    pub image: String,
    /// The seller who created the listing.
    pub created_by: UserId,
    /// When the listing was created.
    pub created_at: DateTime<Utc>,
    /// When the listing was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Ownership predicate used by every owner-only operation.
    #[must_use]
    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.created_by == user_id
    }
}

/// Fields for creating a product.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub title: String,
    pub description: String,
    pub price: Price,
    pub image: String,
    pub created_by: UserId,
}

/// A partial update to a product.
///
/// `None` means "field not supplied, keep the stored value". A supplied value
/// is applied verbatim, so an explicit empty string does clear a field; the
/// old falsy-skips behavior is not reproduced.
#[derive(Debug, Clone, Default)]
pub struct ProductPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<Price>,
    pub image: Option<String>,
}

impl ProductPatch {
    /// Apply the supplied fields to a product, leaving the rest intact.
    pub fn apply(self, product: &mut Product) {
        if let Some(title) = self.title {
            product.title = title;
        }
        if let Some(description) = self.description {
            product.description = description;
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(image) = self.image {
            product.image = image;
        }
    }
}

/// A product with its seller expanded, as returned by list/detail endpoints.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductView {
    pub id: ProductId,
    pub title: String,
    pub description: String,
    pub price: Price,
    pub image: String,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// The seller's public summary; absent if the account no longer resolves.
    pub user: Option<UserSummary>,
}

impl ProductView {
    /// Build a view from a product and an optional owner summary.
    #[must_use]
    pub fn new(product: Product, user: Option<UserSummary>) -> Self {
        Self {
            id: product.id,
            title: product.title,
            description: product.description,
            price: product.price,
            image: product.image,
            created_by: product.created_by,
            created_at: product.created_at,
            updated_at: product.updated_at,
            user,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_product(owner: UserId) -> Product {
        Product {
            id: ProductId::random(),
            title: "Running Shoes".to_owned(),
            description: "Barely worn".to_owned(),
            price: Price::parse("49.99").expect("valid"),
            image: "https://img.example.com/shoes.jpg".to_owned(),
            created_by: owner,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn ownership_predicate_matches_creator_only() {
        let owner = UserId::random();
        let product = sample_product(owner);
        assert!(product.is_owned_by(owner));
        assert!(!product.is_owned_by(UserId::random()));
    }

    #[test]
    fn patch_applies_only_supplied_fields() {
        let owner = UserId::random();
        let mut product = sample_product(owner);
        let original_price = product.price;

        ProductPatch {
            title: Some("Trail Shoes".to_owned()),
            ..Default::default()
        }
        .apply(&mut product);

        assert_eq!(product.title, "Trail Shoes");
        assert_eq!(product.description, "Barely worn");
        assert_eq!(product.price, original_price);
    }

    #[test]
    fn patch_with_all_fields_replaces_everything() {
        let owner = UserId::random();
        let mut product = sample_product(owner);

        ProductPatch {
            title: Some("Boots".to_owned()),
            description: Some("New in box".to_owned()),
            price: Some(Price::parse("99.00").expect("valid")),
            image: Some("https://img.example.com/boots.jpg".to_owned()),
        }
        .apply(&mut product);

        assert_eq!(product.title, "Boots");
        assert_eq!(product.description, "New in box");
        assert_eq!(product.price, Price::parse("99.00").expect("valid"));
        assert_eq!(product.image, "https://img.example.com/boots.jpg");
        assert!(product.is_owned_by(owner));
    }
}
