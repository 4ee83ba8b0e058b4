//! Session cookie plumbing.
//!
//! Both tokens travel as SameSite=None cookies because the SPA and the API
//! live on different domains; HttpOnly keeps them out of script reach, and
//! Secure is only relaxed for local development.

use axum::http::header::COOKIE;
use axum::http::HeaderMap;
use chrono::Duration;

use crate::state::CookieSettings;

pub const ACCESS_COOKIE: &str = "access_token";
pub const REFRESH_COOKIE: &str = "refresh_token";

/// Extracts one cookie's value from the request headers.
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let raw = headers.get(COOKIE)?.to_str().ok()?;
    raw.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key == name).then(|| value.to_string())
    })
}

/// Builds the `Set-Cookie` value for a session token.
pub fn set_cookie(name: &str, value: &str, max_age: Duration, settings: &CookieSettings) -> String {
    let secure = if settings.secure { "; Secure" } else { "" };
    format!(
        "{name}={value}; HttpOnly{secure}; SameSite=None; Path=/; Domain={domain}; Max-Age={max_age}",
        domain = settings.domain,
        max_age = max_age.num_seconds(),
    )
}

/// Builds the `Set-Cookie` value that discards a session token.
pub fn clear_cookie(name: &str, settings: &CookieSettings) -> String {
    let secure = if settings.secure { "; Secure" } else { "" };
    format!(
        "{name}=; HttpOnly{secure}; SameSite=None; Path=/; Domain={domain}; Max-Age=0",
        domain = settings.domain,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn settings() -> CookieSettings {
        CookieSettings { domain: "forum.example".into(), secure: true }
    }

    #[test]
    fn finds_cookie_among_several() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; access_token=abc.def.ghi; lang=en"),
        );

        assert_eq!(cookie_value(&headers, ACCESS_COOKIE).as_deref(), Some("abc.def.ghi"));
        assert_eq!(cookie_value(&headers, REFRESH_COOKIE), None);
    }

    #[test]
    fn set_cookie_carries_session_attributes() {
        let value = set_cookie(ACCESS_COOKIE, "tok", Duration::minutes(15), &settings());
        assert_eq!(
            value,
            "access_token=tok; HttpOnly; Secure; SameSite=None; Path=/; \
             Domain=forum.example; Max-Age=900"
        );
    }

    #[test]
    fn clear_cookie_expires_immediately() {
        let value = clear_cookie(REFRESH_COOKIE, &settings());
        assert!(value.starts_with("refresh_token=;"));
        assert!(value.ends_with("Max-Age=0"));
    }
}
