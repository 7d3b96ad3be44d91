//! Registration, login, and profile handlers.
//!
//! Successful registration and login both return the user's public identity
//! with a fresh token alongside it; clients send that token back in the
//! `x-auth-token` header.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};

use bazaar_core::Email;

use crate::db::{UserRepository, UserUpdate};
use crate::error::AppError;
use crate::middleware::RequireAuth;
use crate::models::UserView;
use crate::services::{hash_password, verify_password};
use crate::state::AppState;

/// Minimum accepted password length.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Maximum accepted display name length.
pub const MAX_NAME_LENGTH: usize = 50;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/profile", get(profile).put(update_profile))
}

/// All fields optional so missing input surfaces as a validation error
/// rather than a deserialization rejection.
#[derive(Debug, Deserialize)]
struct RegisterRequest {
    name: Option<String>,
    email: Option<String>,
    password: Option<String>,
    phone: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    email: Option<String>,
    password: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UpdateProfileRequest {
    name: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    password: Option<String>,
}

/// The identity payload returned by register and login: the public user
/// fields with a token alongside them.
#[derive(Debug, Serialize)]
struct AuthResponse {
    #[serde(flatten)]
    user: UserView,
    token: String,
}

fn validate_name(name: &str) -> Result<(), AppError> {
    if name.trim().is_empty() {
        return Err(AppError::Validation("Name is required".to_owned()));
    }
    if name.len() > MAX_NAME_LENGTH {
        return Err(AppError::Validation(format!(
            "Name cannot exceed {MAX_NAME_LENGTH} characters"
        )));
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), AppError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AppError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let name = request
        .name
        .ok_or_else(|| AppError::Validation("Name is required".to_owned()))?;
    validate_name(&name)?;

    let email = request
        .email
        .ok_or_else(|| AppError::Validation("Email is required".to_owned()))?;
    let email = Email::parse(&email)
        .map_err(|_| AppError::Validation("Please enter a valid email".to_owned()))?;

    let password = request
        .password
        .ok_or_else(|| AppError::Validation("Password is required".to_owned()))?;
    validate_password(&password)?;

    let repo = UserRepository::new(state.pool());

    if repo.get_by_email(&email).await?.is_some() {
        return Err(AppError::Conflict("User already exists".to_owned()));
    }

    let password_hash =
        hash_password(&password).map_err(|e| AppError::Internal(e.to_string()))?;

    let user = repo
        .create(&name, &email, &password_hash, request.phone.as_deref())
        .await?;

    let token = state
        .tokens()
        .issue(user.id)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    tracing::info!(user_id = %user.id, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user: user.into(),
            token,
        }),
    ))
}

async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let (Some(email), Some(password)) = (request.email, request.password) else {
        return Err(AppError::BadCredentials);
    };

    // An unparseable email can't match a stored account.
    let email = Email::parse(&email).map_err(|_| AppError::BadCredentials)?;

    let user = UserRepository::new(state.pool())
        .get_by_email(&email)
        .await?
        .ok_or(AppError::BadCredentials)?;

    if !verify_password(&password, &user.password_hash) {
        return Err(AppError::BadCredentials);
    }

    let token = state
        .tokens()
        .issue(user.id)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    tracing::info!(user_id = %user.id, "User logged in");

    Ok(Json(AuthResponse {
        user: user.into(),
        token,
    }))
}

async fn profile(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
) -> Result<Json<UserView>, AppError> {
    let user = UserRepository::new(state.pool())
        .get_by_id(current.id)
        .await?
        .ok_or_else(|| AppError::NotFound("User".to_owned()))?;

    Ok(Json(user.into()))
}

async fn update_profile(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<UserView>, AppError> {
    let repo = UserRepository::new(state.pool());

    if let Some(name) = &request.name {
        validate_name(name)?;
    }

    let email = match request.email {
        Some(raw) => {
            let email = Email::parse(&raw)
                .map_err(|_| AppError::Validation("Please enter a valid email".to_owned()))?;
            if email != current.email && repo.email_taken_by_other(&email, current.id).await? {
                return Err(AppError::Conflict("Email already in use".to_owned()));
            }
            Some(email)
        }
        None => None,
    };

    let password_hash = match request.password {
        Some(password) => {
            validate_password(&password)?;
            Some(hash_password(&password).map_err(|e| AppError::Internal(e.to_string()))?)
        }
        None => None,
    };

    let updated = repo
        .update(
            current.id,
            UserUpdate {
                name: request.name,
                email,
                phone: request.phone,
                password_hash,
            },
        )
        .await
        .map_err(|e| match e {
            crate::db::RepositoryError::NotFound => AppError::NotFound("User".to_owned()),
            other => other.into(),
        })?;

    tracing::info!(user_id = %updated.id, "Profile updated");

    Ok(Json(updated.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_passwords_are_rejected() {
        assert!(validate_password("12345").is_err());
        assert!(validate_password("123456").is_ok());
    }

    #[test]
    fn name_length_is_bounded() {
        assert!(validate_name("Amina").is_ok());
        assert!(validate_name("").is_err());
        assert!(validate_name("   ").is_err());
        assert!(validate_name(&"x".repeat(MAX_NAME_LENGTH)).is_ok());
        assert!(validate_name(&"x".repeat(MAX_NAME_LENGTH + 1)).is_err());
    }

    #[test]
    fn auth_response_flattens_user_fields_next_to_token() {
        use bazaar_core::{UserId, UserRole};

        let response = AuthResponse {
            user: UserView {
                id: UserId::random(),
                name: "Amina".to_owned(),
                email: Email::parse("amina@example.com").expect("valid"),
                role: UserRole::User,
                phone: None,
                avatar: None,
            },
            token: "abc.def.ghi".to_owned(),
        };

        let json = serde_json::to_value(&response).expect("serialize");
        assert_eq!(json["name"], "Amina");
        assert_eq!(json["token"], "abc.def.ghi");
        assert!(json.get("user").is_none());
    }
}
