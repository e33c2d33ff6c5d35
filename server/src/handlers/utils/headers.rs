use anyhow::{Result, anyhow};
use hyper::header::{HeaderMap, HeaderValue};
use std::fmt;
use std::time::Duration;
use tracing::{debug, warn};

/// Name of the cookie carrying the login JWT.
pub const AUTH_COOKIE: &str = "auth-token";

/// Lifetime of the auth cookie; matches the token TTL.
pub const AUTH_COOKIE_MAX_AGE: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    Strict,
    Lax,
}

impl fmt::Display for SameSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SameSite::Strict => write!(f, "Strict"),
            SameSite::Lax => write!(f, "Lax"),
        }
    }
}

/// Extract a header value as a string
pub fn get_header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers.get(name).and_then(|v| v.to_str().ok()).map(|s| {
        debug!("Retrieved header: {}", name);
        s.to_string()
    })
}

/// Extract cookie value by name. Every `Cookie` header line is searched.
pub fn get_cookie(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    headers
        .get_all("cookie")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find_map(|cookies| {
            cookies.split(';').find_map(|cookie| {
                let mut parts = cookie.trim().splitn(2, '=');
                let name = parts.next()?.trim();
                let value = parts.next()?.trim();
                if name == cookie_name {
                    debug!("Cookie found: {}", cookie_name);
                    Some(value.to_string())
                } else {
                    None
                }
            })
        })
}

/// Set a cookie with options
pub fn set_cookie(
    name: &str,
    value: &str,
    max_age: Option<Duration>,
    path: Option<&str>,
    http_only: bool,
    secure: bool,
    same_site: SameSite,
) -> Result<HeaderValue> {
    let mut cookie = format!("{}={}", name, value);

    if let Some(age) = max_age {
        cookie.push_str(&format!("; Max-Age={}", age.as_secs()));
    }

    if let Some(p) = path {
        cookie.push_str(&format!("; Path={}", p));
    }

    if http_only {
        cookie.push_str("; HttpOnly");
    }

    if secure {
        cookie.push_str("; Secure");
    }

    cookie.push_str(&format!("; SameSite={}", same_site));

    debug!("Setting cookie: {}", name);

    HeaderValue::from_str(&cookie).map_err(|e| {
        warn!("Failed to create cookie header for {}: {}", name, e);
        anyhow!("Invalid cookie value: {}", e)
    })
}

/// The `auth-token` cookie issued at login.
pub fn create_auth_cookie(token: &str, secure: bool) -> Result<HeaderValue> {
    set_cookie(
        AUTH_COOKIE,
        token,
        Some(AUTH_COOKIE_MAX_AGE),
        Some("/"),
        true,
        secure,
        SameSite::Lax,
    )
}

/// Expire the `auth-token` cookie immediately.
pub fn delete_auth_cookie(secure: bool) -> Result<HeaderValue> {
    debug!("Deleting cookie: {}", AUTH_COOKIE);
    set_cookie(
        AUTH_COOKIE,
        "",
        Some(Duration::from_secs(0)),
        Some("/"),
        true,
        secure,
        SameSite::Lax,
    )
}

/// Extract bearer token from Authorization header
/// Format: "Authorization: Bearer <token>"
pub fn get_bearer_token(headers: &HeaderMap) -> Option<String> {
    get_header_value(headers, "authorization").and_then(|auth| {
        auth.strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(|t| {
                debug!("Bearer token extracted");
                t.to_string()
            })
    })
}

/// Extract the login JWT from the `auth-token` cookie, falling back to a
/// Bearer header for clients that manage the token themselves. Both carry
/// the same token; an empty cookie (left behind by logout) counts as absent.
pub fn extract_auth_token(headers: &HeaderMap) -> Option<String> {
    if let Some(token) = get_cookie(headers, AUTH_COOKIE).filter(|t| !t.is_empty()) {
        debug!("Using token from {} cookie", AUTH_COOKIE);
        return Some(token);
    }

    if let Some(token) = get_bearer_token(headers) {
        debug!("Using token from Bearer header");
        return Some(token);
    }

    debug!("No token found in {} cookie or Bearer header", AUTH_COOKIE);
    None
}

/// Add permissive CORS headers, used on responses the gate produces itself.
pub fn add_cors_headers(headers: &mut HeaderMap) {
    headers.insert(
        "access-control-allow-origin",
        HeaderValue::from_static("*"),
    );
    headers.insert(
        "access-control-allow-methods",
        HeaderValue::from_static("GET, POST, PUT, DELETE, OPTIONS"),
    );
    headers.insert(
        "access-control-allow-headers",
        HeaderValue::from_static("Content-Type, Authorization"),
    );
    headers.insert("access-control-max-age", HeaderValue::from_static("86400"));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.append(*k, HeaderValue::from_str(v).unwrap());
        }
        map
    }

    #[test]
    fn cookie_found_among_others() {
        let h = headers(&[("cookie", "theme=dark; auth-token=abc.def.ghi; lang=en")]);
        assert_eq!(get_cookie(&h, AUTH_COOKIE).as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn cookie_searched_across_header_lines() {
        let h = headers(&[("cookie", "theme=dark"), ("cookie", "auth-token=t")]);
        assert_eq!(get_cookie(&h, AUTH_COOKIE).as_deref(), Some("t"));
    }

    #[test]
    fn cookie_name_must_match_exactly() {
        let h = headers(&[("cookie", "xauth-token=abc")]);
        assert!(get_cookie(&h, AUTH_COOKIE).is_none());
    }

    #[test]
    fn auth_cookie_attributes() {
        let v = create_auth_cookie("tok", false).unwrap();
        let s = v.to_str().unwrap();
        assert!(s.starts_with("auth-token=tok"));
        assert!(s.contains("Max-Age=86400"));
        assert!(s.contains("HttpOnly"));
        assert!(s.contains("SameSite=Lax"));
        assert!(!s.contains("Secure"));
    }

    #[test]
    fn auth_cookie_is_secure_over_tls() {
        let v = create_auth_cookie("tok", true).unwrap();
        assert!(v.to_str().unwrap().contains("; Secure"));
    }

    #[test]
    fn deleted_cookie_expires_now() {
        let v = delete_auth_cookie(false).unwrap();
        let s = v.to_str().unwrap();
        assert!(s.starts_with("auth-token=;"));
        assert!(s.contains("Max-Age=0"));
    }

    #[test]
    fn cookie_value_with_newline_is_rejected() {
        assert!(set_cookie("a", "b\nc", None, None, false, false, SameSite::Strict).is_err());
    }

    #[test]
    fn bearer_token_extracted() {
        let h = headers(&[("authorization", "Bearer xyz")]);
        assert_eq!(get_bearer_token(&h).as_deref(), Some("xyz"));
    }

    #[test]
    fn basic_auth_is_not_a_bearer_token() {
        let h = headers(&[("authorization", "Basic dXNlcjpwYXNz")]);
        assert!(get_bearer_token(&h).is_none());
    }

    #[test]
    fn cookie_preferred_over_bearer() {
        let h = headers(&[
            ("cookie", "auth-token=from-cookie"),
            ("authorization", "Bearer from-header"),
        ]);
        assert_eq!(extract_auth_token(&h).as_deref(), Some("from-cookie"));
    }

    #[test]
    fn empty_cookie_falls_back_to_bearer() {
        let h = headers(&[
            ("cookie", "auth-token="),
            ("authorization", "Bearer from-header"),
        ]);
        assert_eq!(extract_auth_token(&h).as_deref(), Some("from-header"));
    }

    #[test]
    fn no_token_anywhere() {
        assert!(extract_auth_token(&HeaderMap::new()).is_none());
    }
}
