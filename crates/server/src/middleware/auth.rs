//! Authentication middleware and extractor.
//!
//! Protected routes take the [`RequireAuth`] extractor, which reads the
//! signed token from the `x-auth-token` request header, verifies it, and
//! resolves it to a live user record. A missing, invalid, or dead token
//! rejects the request with 401 (a store failure is a 500 instead); the
//! handler never runs without an attached identity.

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, request::Parts},
};

use crate::db::UserRepository;
use crate::error::AppError;
use crate::models::CurrentUser;
use crate::state::AppState;

/// The request header carrying the identity token.
///
/// A custom header rather than `Authorization: Bearer`; this is the contract
/// clients already speak.
pub const AUTH_HEADER: &str = "x-auth-token";

/// Extractor that requires an authenticated user.
///
/// Performs one user-store lookup per protected request; there is no
/// identity caching.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(user): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", user.name)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

/// Pull the token out of the request headers, if present and readable.
fn token_from_headers(headers: &HeaderMap) -> Option<&str> {
    headers.get(AUTH_HEADER)?.to_str().ok()
}

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = token_from_headers(&parts.headers).ok_or(AppError::Unauthorized)?;

        let user_id = state.tokens().verify(token).map_err(|e| {
            tracing::debug!(error = %e, "Token verification failed");
            AppError::Unauthorized
        })?;

        // A store failure is the server's problem, not the token's; only a
        // missing user means the token is dead (it outlived the account).
        let user = UserRepository::new(state.pool())
            .get_by_id(user_id)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "User lookup during auth failed");
                AppError::from(e)
            })?
            .ok_or(AppError::Unauthorized)?;

        Ok(Self(user.into()))
    }
}

#[cfg(test)]
mod tests {
    use axum::http::{HeaderValue, StatusCode};
    use axum::response::IntoResponse;

    use super::*;
    use crate::db::RepositoryError;

    #[test]
    fn token_is_read_from_custom_header() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTH_HEADER, HeaderValue::from_static("abc.def.ghi"));
        assert_eq!(token_from_headers(&headers), Some("abc.def.ghi"));
    }

    #[test]
    fn missing_header_yields_none() {
        let headers = HeaderMap::new();
        assert_eq!(token_from_headers(&headers), None);
    }

    #[test]
    fn store_failure_during_lookup_is_a_server_error_not_a_bad_token() {
        // Same translation the extractor applies to a failed user lookup.
        let err = AppError::from(RepositoryError::Database(sqlx::Error::PoolTimedOut));
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn bearer_authorization_header_is_not_honored() {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::AUTHORIZATION,
            HeaderValue::from_static("Bearer abc.def.ghi"),
        );
        assert_eq!(token_from_headers(&headers), None);
    }
}
