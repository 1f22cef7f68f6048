//! Token codec: signed, time-bounded JWTs for access and refresh tokens.
//!
//! Both kinds share one claim shape but are signed with independent secrets,
//! so a leaked access token can never pass as a refresh token (and vice versa).
//! Expiry is checked against a caller-supplied clock.

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::config::SessionConfig;

/// Token kind. Each kind has its own secret and lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    /// Short-lived, never stored server-side.
    Access,
    /// Long-lived, one stored value per principal.
    Refresh,
}

/// JWT claims shared by both token kinds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (principal UUID)
    pub sub: String,
    /// Token kind
    #[serde(rename = "typ")]
    pub kind: TokenKind,
    /// Issued at (Unix timestamp)
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
    /// Random per-token id, keeps tokens minted in the same second distinct
    pub jti: String,
}

/// A freshly minted token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    /// The JWT token string
    pub token: String,
    pub kind: TokenKind,
    /// Issued at timestamp (Unix seconds)
    pub issued_at: u64,
    /// Expiration timestamp (Unix seconds)
    pub expires_at: u64,
    /// Token lifetime in seconds
    pub ttl: u64,
}

struct KindKeys {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: u64,
}

impl KindKeys {
    fn new(secret: &[u8], ttl: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            ttl,
        }
    }
}

/// Issues and verifies access and refresh tokens.
pub struct TokenCodec {
    access: KindKeys,
    refresh: KindKeys,
}

impl TokenCodec {
    pub fn new(access_secret: &[u8], access_ttl: u64, refresh_secret: &[u8], refresh_ttl: u64) -> Self {
        Self {
            access: KindKeys::new(access_secret, access_ttl),
            refresh: KindKeys::new(refresh_secret, refresh_ttl),
        }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(
            &config.access_token_secret,
            config.access_token_ttl,
            &config.refresh_token_secret,
            config.refresh_token_ttl,
        )
    }

    fn keys(&self, kind: TokenKind) -> &KindKeys {
        match kind {
            TokenKind::Access => &self.access,
            TokenKind::Refresh => &self.refresh,
        }
    }

    /// Lifetime in seconds for tokens of the given kind.
    pub fn ttl(&self, kind: TokenKind) -> u64 {
        self.keys(kind).ttl
    }

    /// Mint a token of `kind` for `principal_id`, valid from `now` for the kind's TTL.
    pub fn issue(
        &self,
        kind: TokenKind,
        principal_id: &str,
        now: u64,
    ) -> Result<IssuedToken, CodecError> {
        let keys = self.keys(kind);
        let exp = now.saturating_add(keys.ttl);

        let claims = Claims {
            sub: principal_id.to_string(),
            kind,
            iat: now,
            exp,
            jti: uuid::Uuid::new_v4().to_string(),
        };

        let token = jsonwebtoken::encode(&Header::default(), &claims, &keys.encoding_key)
            .map_err(CodecError::Encoding)?;

        Ok(IssuedToken {
            token,
            kind,
            issued_at: now,
            expires_at: exp,
            ttl: keys.ttl,
        })
    }

    /// Verify a token of `kind` and return the principal id it was issued to.
    ///
    /// The signature is checked before expiry, so a forged expired token
    /// reports `BadSignature`, not `Expired`.
    pub fn verify(&self, kind: TokenKind, token: &str, now: u64) -> Result<String, CodecError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        // Expiry is checked below against the caller's clock.
        validation.validate_exp = false;

        let token_data =
            jsonwebtoken::decode::<Claims>(token, &self.keys(kind).decoding_key, &validation)
                .map_err(|e| match e.kind() {
                    ErrorKind::InvalidSignature => CodecError::BadSignature,
                    _ => CodecError::Malformed,
                })?;

        let claims = token_data.claims;
        if claims.kind != kind || claims.sub.is_empty() {
            return Err(CodecError::Malformed);
        }

        if now >= claims.exp {
            return Err(CodecError::Expired);
        }

        Ok(claims.sub)
    }
}

/// Current Unix time in seconds.
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Errors that can occur during token operations.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("malformed token")]
    Malformed,
    #[error("token signature mismatch")]
    BadSignature,
    #[error("token expired")]
    Expired,
    /// Only reachable through a broken key configuration.
    #[error("failed to encode token: {0}")]
    Encoding(#[source] jsonwebtoken::errors::Error),
}
