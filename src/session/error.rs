use crate::jwt::CodecError;
use crate::store::StoreError;

/// Failures of the session core.
///
/// Every variant except `IssuanceFailed` and `StoreUnavailable` means the
/// caller presented a bad credential. Those all collapse into one uniform
/// "unauthenticated" response at the HTTP boundary; the variant itself is
/// only used for logging.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("malformed token")]
    Malformed,
    #[error("bad token signature")]
    BadSignature,
    #[error("token expired")]
    Expired,
    #[error("principal not found")]
    PrincipalNotFound,
    #[error("refresh token does not match the stored token")]
    TokenReuseDetected,
    #[error("no credential presented")]
    NoCredential,
    #[error("session issuance failed: {0}")]
    IssuanceFailed(String),
    #[error("credential store unavailable: {0}")]
    StoreUnavailable(#[source] StoreError),
}

impl SessionError {
    /// True for failures caused by the server rather than the credential.
    pub fn is_server_fault(&self) -> bool {
        matches!(
            self,
            SessionError::IssuanceFailed(_) | SessionError::StoreUnavailable(_)
        )
    }

    /// Stable label for audit logs.
    pub fn audit_label(&self) -> &'static str {
        match self {
            SessionError::Malformed => "malformed",
            SessionError::BadSignature => "bad_signature",
            SessionError::Expired => "expired",
            SessionError::PrincipalNotFound => "principal_not_found",
            SessionError::TokenReuseDetected => "token_reuse_detected",
            SessionError::NoCredential => "no_credential",
            SessionError::IssuanceFailed(_) => "issuance_failed",
            SessionError::StoreUnavailable(_) => "store_unavailable",
        }
    }
}

impl From<CodecError> for SessionError {
    fn from(e: CodecError) -> Self {
        match e {
            CodecError::Malformed => SessionError::Malformed,
            CodecError::BadSignature => SessionError::BadSignature,
            CodecError::Expired => SessionError::Expired,
            CodecError::Encoding(e) => SessionError::IssuanceFailed(e.to_string()),
        }
    }
}
