//! User domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use bazaar_core::{Email, UserId, UserRole};

/// A full user record, including the password hash.
///
/// Never serialized; handlers return [`UserView`] instead.
#[derive(Debug, Clone)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Email address (unique across all users).
    pub email: Email,
    /// Argon2 PHC-format password hash. Never the plaintext.
    pub password_hash: String,
    /// Account role.
    pub role: UserRole,
    /// Optional phone number.
    pub phone: Option<String>,
    /// Optional avatar reference.
    pub avatar: Option<String>,
    /// When the user registered.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
}

/// The public view of a user, safe for client responses.
#[derive(Debug, Clone, Serialize)]
pub struct UserView {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    pub role: UserRole,
    pub phone: Option<String>,
    pub avatar: Option<String>,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            phone: user.phone,
            avatar: user.avatar,
        }
    }
}

/// A minimal user reference embedded in product and order responses.
#[derive(Debug, Clone, Serialize)]
pub struct UserSummary {
    pub id: UserId,
    pub name: String,
    pub email: Email,
}

/// The authenticated identity attached to a request by the auth middleware.
///
/// Resolved against the user store on every protected request; holds no
/// password material.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    pub role: UserRole,
}

impl From<User> for CurrentUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            id: UserId::random(),
            name: "Amina".to_owned(),
            email: Email::parse("amina@example.com").expect("valid"),
            password_hash: "$argon2id$v=19$m=19456,t=2,p=1$abc$def".to_owned(),
            role: UserRole::User,
            phone: Some("555-0100".to_owned()),
            avatar: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn view_excludes_password_hash() {
        let user = sample_user();
        let view = UserView::from(user.clone());
        let json = serde_json::to_string(&view).expect("serialize");
        assert!(!json.contains("argon2"));
        assert!(!json.contains("password"));
        assert!(json.contains("amina@example.com"));
        assert_eq!(view.id, user.id);
    }
}
