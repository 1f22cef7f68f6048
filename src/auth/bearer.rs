//! Bearer credential lookup: `accessToken` cookie first, then the
//! `Authorization: Bearer` header. Empty values count as absent.

use axum::http::{HeaderMap, header};

use super::cookie::{ACCESS_COOKIE_NAME, get_cookie};

/// Where a bearer credential can be read from, in lookup order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    Cookie,
    AuthorizationHeader,
}

pub const CREDENTIAL_SOURCES: [CredentialSource; 2] = [
    CredentialSource::Cookie,
    CredentialSource::AuthorizationHeader,
];

fn authorization_bearer(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    Some(token.trim())
}

/// Read the access token from `source`, if present and non-empty.
pub fn read_credential(headers: &HeaderMap, source: CredentialSource) -> Option<&str> {
    let token = match source {
        CredentialSource::Cookie => get_cookie(headers, ACCESS_COOKIE_NAME),
        CredentialSource::AuthorizationHeader => authorization_bearer(headers),
    }?;
    (!token.is_empty()).then_some(token)
}

/// First credential found across the configured sources.
pub fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    CREDENTIAL_SOURCES
        .iter()
        .find_map(|source| read_credential(headers, *source))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_cookie_wins_over_header() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("accessToken=from-cookie"));
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer from-header"),
        );

        assert_eq!(extract_bearer(&headers), Some("from-cookie"));
    }

    #[test]
    fn test_header_used_without_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer from-header"),
        );

        assert_eq!(extract_bearer(&headers), Some("from-header"));
    }

    #[test]
    fn test_empty_cookie_falls_through_to_header() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("accessToken="));
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("bearer from-header"),
        );

        assert_eq!(extract_bearer(&headers), Some("from-header"));
    }

    #[test]
    fn test_non_bearer_scheme_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Basic dXNlcjpwYXNz"),
        );

        assert_eq!(extract_bearer(&headers), None);
    }

    #[test]
    fn test_nothing_present() {
        assert_eq!(extract_bearer(&HeaderMap::new()), None);

        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(extract_bearer(&headers), None);
    }
}
