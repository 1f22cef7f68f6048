//! Session configuration: token secrets, lifetimes and cookie flags.

/// Minimum secret length in bytes for either token kind.
pub const MIN_SECRET_LENGTH: usize = 32;

/// Default access token lifetime: 15 minutes.
pub const DEFAULT_ACCESS_TOKEN_TTL: u64 = 15 * 60;

/// Default refresh token lifetime: 7 days.
pub const DEFAULT_REFRESH_TOKEN_TTL: u64 = 7 * 24 * 60 * 60;

/// Longest lifetime accepted for either token kind (one year, in seconds).
pub const MAX_TOKEN_TTL: u64 = 365 * 24 * 60 * 60;

/// Attributes applied to the `accessToken` / `refreshToken` cookies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CookieFlags {
    pub http_only: bool,
    pub secure: bool,
}

impl Default for CookieFlags {
    fn default() -> Self {
        Self {
            http_only: true,
            secure: true,
        }
    }
}

#[derive(Clone)]
pub struct SessionConfig {
    pub access_token_secret: Vec<u8>,
    /// Access token lifetime in seconds
    pub access_token_ttl: u64,
    pub refresh_token_secret: Vec<u8>,
    /// Refresh token lifetime in seconds
    pub refresh_token_ttl: u64,
    pub cookie_flags: CookieFlags,
    /// Clear the stored refresh token when a rotated-out token is replayed.
    pub revoke_on_reuse: bool,
}

impl std::fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionConfig")
            .field("access_token_secret", &"<redacted>")
            .field("access_token_ttl", &self.access_token_ttl)
            .field("refresh_token_secret", &"<redacted>")
            .field("refresh_token_ttl", &self.refresh_token_ttl)
            .field("cookie_flags", &self.cookie_flags)
            .field("revoke_on_reuse", &self.revoke_on_reuse)
            .finish()
    }
}

impl SessionConfig {
    /// Config with default lifetimes and cookie flags.
    pub fn new(access_token_secret: Vec<u8>, refresh_token_secret: Vec<u8>) -> Self {
        Self {
            access_token_secret,
            access_token_ttl: DEFAULT_ACCESS_TOKEN_TTL,
            refresh_token_secret,
            refresh_token_ttl: DEFAULT_REFRESH_TOKEN_TTL,
            cookie_flags: CookieFlags::default(),
            revoke_on_reuse: false,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.access_token_secret.len() < MIN_SECRET_LENGTH {
            return Err(ConfigError::SecretTooShort("access"));
        }
        if self.refresh_token_secret.len() < MIN_SECRET_LENGTH {
            return Err(ConfigError::SecretTooShort("refresh"));
        }
        if self.access_token_secret == self.refresh_token_secret {
            return Err(ConfigError::SharedSecret);
        }
        if self.access_token_ttl == 0 || self.refresh_token_ttl == 0 {
            return Err(ConfigError::ZeroTtl);
        }
        if self.access_token_ttl > MAX_TOKEN_TTL || self.refresh_token_ttl > MAX_TOKEN_TTL {
            return Err(ConfigError::TtlTooLong);
        }
        if self.access_token_ttl >= self.refresh_token_ttl {
            return Err(ConfigError::TtlOrder);
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} token secret is shorter than {min} bytes", min = MIN_SECRET_LENGTH)]
    SecretTooShort(&'static str),
    #[error("access and refresh tokens must use different secrets")]
    SharedSecret,
    #[error("token lifetimes must be greater than zero")]
    ZeroTtl,
    #[error("token lifetimes must not exceed {max} seconds", max = MAX_TOKEN_TTL)]
    TtlTooLong,
    #[error("access token lifetime must be shorter than refresh token lifetime")]
    TtlOrder,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> SessionConfig {
        SessionConfig::new(vec![b'a'; 32], vec![b'r'; 32])
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = valid();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.access_token_ttl, 900);
        assert_eq!(config.refresh_token_ttl, 604_800);
        assert!(config.cookie_flags.http_only && config.cookie_flags.secure);
    }

    #[test]
    fn test_short_secret_rejected() {
        let mut config = valid();
        config.refresh_token_secret = b"short".to_vec();
        assert_eq!(config.validate(), Err(ConfigError::SecretTooShort("refresh")));
    }

    #[test]
    fn test_shared_secret_rejected() {
        let mut config = valid();
        config.refresh_token_secret = config.access_token_secret.clone();
        assert_eq!(config.validate(), Err(ConfigError::SharedSecret));
    }

    #[test]
    fn test_ttl_rules() {
        let mut config = valid();
        config.access_token_ttl = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroTtl));

        let mut config = valid();
        config.access_token_ttl = config.refresh_token_ttl;
        assert_eq!(config.validate(), Err(ConfigError::TtlOrder));
    }

    #[test]
    fn test_ttl_upper_bound() {
        let mut config = valid();
        config.refresh_token_ttl = u64::MAX;
        assert_eq!(config.validate(), Err(ConfigError::TtlTooLong));

        let mut config = valid();
        config.refresh_token_ttl = MAX_TOKEN_TTL;
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let rendered = format!("{:?}", valid());
        assert!(!rendered.contains("aaaa"));
        assert!(rendered.contains("<redacted>"));
    }
}
