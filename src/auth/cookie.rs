//! Session cookies: parsing the Cookie header and building Set-Cookie values.

use axum::http::{HeaderMap, header};

use crate::config::CookieFlags;

/// Cookie name for the access token.
pub const ACCESS_COOKIE_NAME: &str = "accessToken";

/// Cookie name for the refresh token.
pub const REFRESH_COOKIE_NAME: &str = "refreshToken";

/// Extract a cookie value from the Cookie header.
pub fn get_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    let cookie_header = headers.get(header::COOKIE)?.to_str().ok()?;
    for part in cookie_header.split(';') {
        let part = part.trim();
        if let Some((key, value)) = part.split_once('=') {
            if key.trim() == name {
                return Some(value.trim());
            }
        }
    }
    None
}

fn attributes(flags: CookieFlags) -> String {
    let mut attrs = String::from("; SameSite=Strict; Path=/");
    if flags.http_only {
        attrs.push_str("; HttpOnly");
    }
    if flags.secure {
        attrs.push_str("; Secure");
    }
    attrs
}

/// Set-Cookie value carrying `token` for `max_age` seconds.
pub fn session_cookie(name: &str, token: &str, max_age: u64, flags: CookieFlags) -> String {
    format!("{}={}; Max-Age={}{}", name, token, max_age, attributes(flags))
}

/// Set-Cookie value that removes the cookie.
pub fn clear_cookie(name: &str, flags: CookieFlags) -> String {
    format!("{}=; Max-Age=0{}", name, attributes(flags))
}

/// Set-Cookie values removing both session cookies.
pub fn clear_session_cookies(flags: CookieFlags) -> [String; 2] {
    [
        clear_cookie(ACCESS_COOKIE_NAME, flags),
        clear_cookie(REFRESH_COOKIE_NAME, flags),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_get_cookie_simple() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("accessToken=abc123"));

        assert_eq!(get_cookie(&headers, "accessToken"), Some("abc123"));
    }

    #[test]
    fn test_get_cookie_multiple() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("foo=bar; accessToken=abc123; refreshToken=xyz789"),
        );

        assert_eq!(get_cookie(&headers, "accessToken"), Some("abc123"));
        assert_eq!(get_cookie(&headers, "refreshToken"), Some("xyz789"));
        assert_eq!(get_cookie(&headers, "foo"), Some("bar"));
    }

    #[test]
    fn test_get_cookie_not_found() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("foo=bar"));

        assert_eq!(get_cookie(&headers, "accessToken"), None);
        assert_eq!(get_cookie(&HeaderMap::new(), "accessToken"), None);
    }

    #[test]
    fn test_session_cookie_flags() {
        let flags = CookieFlags {
            http_only: true,
            secure: true,
        };
        let cookie = session_cookie(ACCESS_COOKIE_NAME, "tok", 900, flags);
        assert_eq!(
            cookie,
            "accessToken=tok; Max-Age=900; SameSite=Strict; Path=/; HttpOnly; Secure"
        );

        let insecure = CookieFlags {
            http_only: true,
            secure: false,
        };
        let cookie = session_cookie(REFRESH_COOKIE_NAME, "tok", 60, insecure);
        assert!(cookie.contains("HttpOnly"));
        assert!(!cookie.contains("Secure"));
    }

    #[test]
    fn test_clear_session_cookies() {
        let [access, refresh] = clear_session_cookies(CookieFlags::default());
        assert!(access.starts_with("accessToken=;") && access.contains("Max-Age=0"));
        assert!(refresh.starts_with("refreshToken=;") && refresh.contains("Max-Age=0"));
    }
}
