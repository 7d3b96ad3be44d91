//! Identity token service.
//!
//! Issues and verifies signed, time-limited HS256 tokens that embed the user
//! id. There is no server-side session table; the token is the session.

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use bazaar_core::UserId;

use crate::config::JwtConfig;

/// Claims stored in the token.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Claims {
    /// User ID (subject).
    sub: String,
    /// Expiration timestamp.
    exp: i64,
    /// Issued-at timestamp.
    iat: i64,
}

/// Token errors.
///
/// Verification failures never carry key material; the messages are safe to
/// surface in logs.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token has expired")]
    Expired,

    #[error("invalid token")]
    Invalid,

    #[error("token generation failed: {0}")]
    GenerationFailed(String),
}

/// Issues and verifies identity tokens.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiry: Duration,
}

impl TokenService {
    /// Create a token service from configuration.
    #[must_use]
    pub fn from_config(config: &JwtConfig) -> Self {
        Self::new(config.secret.expose_secret().as_bytes(), config.expiry_days)
    }

    /// Create a token service from a raw secret and a lifetime in days.
    #[must_use]
    pub fn new(secret: &[u8], expiry_days: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            expiry: Duration::days(expiry_days),
        }
    }

    /// Issue a signed token for a user.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::GenerationFailed` if signing fails.
    pub fn issue(&self, user_id: UserId) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            exp: (now + self.expiry).timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| TokenError::GenerationFailed(e.to_string()))
    }

    /// Verify a token and return the embedded user id.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Expired` for an expired token and
    /// `TokenError::Invalid` for a malformed token or a bad signature.
    pub fn verify(&self, token: &str) -> Result<UserId, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["sub", "exp", "iat"]);

        let token_data =
            decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
                match e.kind() {
                    ErrorKind::ExpiredSignature => TokenError::Expired,
                    _ => TokenError::Invalid,
                }
            })?;

        token_data.claims.sub.parse().map_err(|_| TokenError::Invalid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test-secret-test-secret-test-secret!";

    #[test]
    fn issued_token_verifies_to_same_user() {
        let service = TokenService::new(SECRET, 30);
        let user_id = UserId::random();

        let token = service.issue(user_id).expect("issue");
        let verified = service.verify(&token).expect("verify");

        assert_eq!(verified, user_id);
    }

    #[test]
    fn expired_token_is_rejected() {
        // Negative lifetime puts the expiration in the past. Note the default
        // validation leeway is 60 seconds, so expire well beyond it.
        let service = TokenService::new(SECRET, -2);
        let token = service.issue(UserId::random()).expect("issue");

        assert!(matches!(service.verify(&token), Err(TokenError::Expired)));
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let issuer = TokenService::new(b"some-other-secret-some-other-secret!", 30);
        let verifier = TokenService::new(SECRET, 30);

        let token = issuer.issue(UserId::random()).expect("issue");
        assert!(matches!(verifier.verify(&token), Err(TokenError::Invalid)));
    }

    #[test]
    fn garbage_token_is_rejected() {
        let service = TokenService::new(SECRET, 30);
        assert!(matches!(
            service.verify("not.a.token"),
            Err(TokenError::Invalid)
        ));
        assert!(matches!(service.verify(""), Err(TokenError::Invalid)));
    }
}
