//! Authentication
//!
//! Sessions are bearer JWTs issued by the identity provider. The token only
//! names the user; role and department are always read from the user
//! directory so that a demoted or deactivated account takes effect at once.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use core_kernel::UserId;
use domain_claims::{Actor, UserDirectory};

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject (user ID)
    pub sub: String,
    /// Expiration timestamp
    pub exp: i64,
    /// Issued at timestamp
    pub iat: i64,
}

/// Auth errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing bearer token")]
    MissingToken,
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token expired")]
    TokenExpired,
    #[error("Unknown user")]
    UnknownUser,
    #[error("Account is inactive")]
    Inactive,
}

/// Creates a signed token for `user_id`
pub fn create_token(user_id: UserId, secret: &str, expiration_secs: u64) -> Result<String, AuthError> {
    let now = Utc::now();
    let ttl = Duration::try_seconds(i64::try_from(expiration_secs).unwrap_or(i64::MAX))
        .ok_or(AuthError::InvalidToken)?;
    let exp = now.checked_add_signed(ttl).ok_or(AuthError::InvalidToken)?;

    let claims = TokenClaims {
        sub: user_id.as_uuid().to_string(),
        exp: exp.timestamp(),
        iat: now.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|_| AuthError::InvalidToken)
}

/// Validates a token's signature and expiry
pub fn validate_token(token: &str, secret: &str) -> Result<TokenClaims, AuthError> {
    let token_data = decode::<TokenClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        _ => AuthError::InvalidToken,
    })?;

    Ok(token_data.claims)
}

/// Extracts the token from an `Authorization: Bearer ...` header value
pub fn bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
    header
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AuthError::MissingToken)
}

/// Resolves a token to the acting user
///
/// Role and department come from the directory, never from the token.
///
/// # Arguments
///
/// * `users` - Directory the token subject is looked up in
/// * `token` - Bearer token without the `Bearer ` prefix
/// * `secret` - HMAC secret the token was signed with
///
/// # Returns
///
/// The [`Actor`] for the token's user
///
/// # Errors
///
/// - `InvalidToken` for a bad signature, expiry or subject
/// - `UnknownUser` when the subject is not registered
/// - `Inactive` when the account is disabled
pub async fn authenticate(
    users: &dyn UserDirectory,
    token: &str,
    secret: &str,
) -> Result<Actor, AuthError> {
    let claims = validate_token(token, secret)?;
    let user_id: UserId = claims.sub.parse().map_err(|_| AuthError::InvalidToken)?;

    let user = users.get_user(user_id).await.map_err(|e| {
        if e.is_not_found() {
            AuthError::UnknownUser
        } else {
            warn!(error = %e, "User lookup failed during authentication");
            AuthError::InvalidToken
        }
    })?;

    if !user.is_active {
        return Err(AuthError::Inactive);
    }
    Ok(user.actor())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn test_token_round_trip() {
        let id = UserId::new();
        let token = create_token(id, SECRET, 60).unwrap();
        let claims = validate_token(&token, SECRET).unwrap();
        assert_eq!(claims.sub, id.as_uuid().to_string());
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_wrong_secret_is_invalid() {
        let token = create_token(UserId::new(), SECRET, 60).unwrap();
        assert!(matches!(
            validate_token(&token, "other-secret"),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn test_expired_token() {
        let claims = TokenClaims {
            sub: UserId::new().as_uuid().to_string(),
            exp: Utc::now().timestamp() - 3600,
            iat: Utc::now().timestamp() - 7200,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();
        assert!(matches!(validate_token(&token, SECRET), Err(AuthError::TokenExpired)));
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token(Some("Bearer abc")).unwrap(), "abc");
        assert!(bearer_token(Some("Basic abc")).is_err());
        assert!(bearer_token(Some("Bearer ")).is_err());
        assert!(bearer_token(None).is_err());
    }
}
