// Copyright 2025 Memophor Labs
// SPDX-License-Identifier: Apache-2.0

//! Token issuance and verification.
//!
//! A single static credential pair may exchange itself for a short-lived
//! HS256 JWT. Verification checks the signature and an exact, zero-leeway
//! expiry against the caller-supplied clock.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::Credentials;

/// Access token lifetime: 5 minutes, not renewable.
pub const TOKEN_LIFETIME_SECS: i64 = 5 * 60;

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // Subject (username)
    pub iat: i64,    // Issued at
    pub exp: i64,    // Expiration time
}

/// Identity carried by a verified token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subject(pub String);

#[derive(Debug, Clone)]
pub struct AccessToken {
    pub token: String,
    pub subject: Subject,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("username and password are required")]
    MissingCredentials,
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error("missing bearer token")]
    MissingToken,
    #[error("invalid token")]
    InvalidToken,
    #[error("token has expired")]
    ExpiredToken,
    #[error("failed to sign token: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),
}

#[derive(Clone)]
pub struct TokenService {
    credentials: Credentials,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl TokenService {
    pub fn new(credentials: Credentials, secret: &str) -> Self {
        Self {
            credentials,
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Exchange the configured credential pair for a signed access token.
    pub fn issue_token(
        &self,
        username: Option<&str>,
        password: Option<&str>,
    ) -> Result<AccessToken, AuthError> {
        self.issue_at(username, password, Utc::now())
    }

    pub fn issue_at(
        &self,
        username: Option<&str>,
        password: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<AccessToken, AuthError> {
        let (Some(username), Some(password)) = (
            username.filter(|u| !u.is_empty()),
            password.filter(|p| !p.is_empty()),
        ) else {
            return Err(AuthError::MissingCredentials);
        };

        // Plain comparison: there is exactly one configured pair, nothing is stored.
        if username != self.credentials.username || password != self.credentials.password {
            return Err(AuthError::InvalidCredentials);
        }

        self.sign(username, now)
    }

    /// Verify a presented token and return its subject.
    pub fn authorize(&self, token: &str) -> Result<Subject, AuthError> {
        self.authorize_at(token, Utc::now())
    }

    /// Valid iff the signature verifies and `now < exp`.
    pub fn authorize_at(&self, token: &str, now: DateTime<Utc>) -> Result<Subject, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            tracing::debug!(error = %e, "token failed verification");
            AuthError::InvalidToken
        })?;

        if now.timestamp() >= token_data.claims.exp {
            return Err(AuthError::ExpiredToken);
        }

        Ok(Subject(token_data.claims.sub))
    }

    fn sign(&self, username: &str, now: DateTime<Utc>) -> Result<AccessToken, AuthError> {
        let expires_at = now + Duration::seconds(TOKEN_LIFETIME_SECS);
        let claims = Claims {
            sub: username.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(AuthError::Signing)?;

        Ok(AccessToken {
            token,
            subject: Subject(claims.sub),
            expires_at,
        })
    }
}

/// Extract bearer token from Authorization header
pub fn extract_bearer_token(auth_header: Option<&str>) -> Result<&str, AuthError> {
    let header = auth_header.ok_or(AuthError::MissingToken)?;
    let (scheme, token) = header
        .trim()
        .split_once(' ')
        .ok_or(AuthError::InvalidToken)?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::InvalidToken);
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::InvalidToken);
    }

    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    fn service(secret: &str) -> TokenService {
        TokenService::new(
            Credentials {
                username: "ash".to_string(),
                password: "pallet-town".to_string(),
            },
            secret,
        )
    }

    #[test]
    fn issued_token_is_accepted_until_expiry() {
        let svc = service("s3cret");
        let issued_at = Utc::now();
        let token = assert_ok!(svc.issue_at(Some("ash"), Some("pallet-town"), issued_at));

        assert_eq!(token.expires_at, issued_at + Duration::seconds(TOKEN_LIFETIME_SECS));

        let subject = assert_ok!(svc.authorize_at(&token.token, issued_at));
        assert_eq!(subject, Subject("ash".to_string()));

        let just_before = issued_at + Duration::seconds(TOKEN_LIFETIME_SECS - 1);
        assert_ok!(svc.authorize_at(&token.token, just_before));
    }

    #[test]
    fn token_is_rejected_at_and_after_expiry_boundary() {
        let svc = service("s3cret");
        let issued_at = Utc::now();
        let token = svc
            .issue_at(Some("ash"), Some("pallet-town"), issued_at)
            .unwrap();

        let boundary = issued_at + Duration::seconds(TOKEN_LIFETIME_SECS);
        assert!(matches!(
            svc.authorize_at(&token.token, boundary),
            Err(AuthError::ExpiredToken)
        ));
        assert!(matches!(
            svc.authorize_at(&token.token, boundary + Duration::hours(1)),
            Err(AuthError::ExpiredToken)
        ));
    }

    #[test]
    fn missing_or_empty_fields_are_distinct_from_mismatch() {
        let svc = service("s3cret");
        for (user, pass) in [
            (None, Some("pallet-town")),
            (Some("ash"), None),
            (None, None),
            (Some(""), Some("pallet-town")),
            (Some("ash"), Some("")),
        ] {
            assert!(matches!(
                svc.issue_token(user, pass),
                Err(AuthError::MissingCredentials)
            ));
        }

        assert!(matches!(
            svc.issue_token(Some("ash"), Some("viridian")),
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            svc.issue_token(Some("gary"), Some("pallet-town")),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn token_signed_with_other_secret_is_invalid() {
        let token = service("other").issue_token(Some("ash"), Some("pallet-town")).unwrap();
        assert!(matches!(
            service("s3cret").authorize(&token.token),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn garbage_token_is_invalid() {
        let svc = service("s3cret");
        assert_err!(svc.authorize("not-a-jwt"));
        assert!(matches!(svc.authorize("a.b.c"), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn bearer_header_parsing() {
        assert_eq!(extract_bearer_token(Some("Bearer abc.def")).unwrap(), "abc.def");
        assert_eq!(extract_bearer_token(Some("bearer abc")).unwrap(), "abc");
        assert!(matches!(extract_bearer_token(None), Err(AuthError::MissingToken)));
        assert!(matches!(
            extract_bearer_token(Some("Basic dXNlcjpwYXNz")),
            Err(AuthError::InvalidToken)
        ));
        assert!(matches!(
            extract_bearer_token(Some("Bearer ")),
            Err(AuthError::InvalidToken)
        ));
        assert!(matches!(
            extract_bearer_token(Some("Bearer")),
            Err(AuthError::InvalidToken)
        ));
    }
}
