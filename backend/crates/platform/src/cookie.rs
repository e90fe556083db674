//! Session Cookie
//!
//! Reads and writes the cookie that carries a client's throttling identity.

use std::fmt;
use std::time::Duration;

use axum::http::{HeaderMap, HeaderValue, header};

pub const SESSION_COOKIE_NAME: &str = "session_id";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SameSite {
    Strict,
    #[default]
    Lax,
    None,
}

impl fmt::Display for SameSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
            SameSite::None => "None",
        })
    }
}

/// Attributes of the session cookie
#[derive(Debug, Clone)]
pub struct CookieConfig {
    pub name: String,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: SameSite,
    pub path: String,
    /// `None` keeps the cookie for the browser session only
    pub max_age: Option<Duration>,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self::session()
    }
}

impl CookieConfig {
    /// `session_id`, HttpOnly, Secure, SameSite=Lax, whole site
    pub fn session() -> Self {
        Self {
            name: SESSION_COOKIE_NAME.to_owned(),
            secure: true,
            http_only: true,
            same_site: SameSite::Lax,
            path: "/".to_owned(),
            max_age: None,
        }
    }

    /// Render a `Set-Cookie` value carrying `value`.
    pub fn build_set_cookie(&self, value: &str) -> String {
        let mut parts = vec![format!("{}={}", self.name, value)];
        if self.http_only {
            parts.push("HttpOnly".to_owned());
        }
        if self.secure {
            parts.push("Secure".to_owned());
        }
        parts.push(format!("SameSite={}", self.same_site));
        parts.push(format!("Path={}", self.path));
        if let Some(max_age) = self.max_age {
            parts.push(format!("Max-Age={}", max_age.as_secs()));
        }
        parts.join("; ")
    }
}

/// Value of the first cookie called `name`, searching every `Cookie` header.
pub fn extract_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_owned())
}

/// `None` if `value` holds bytes a header cannot carry.
pub fn set_cookie_header(config: &CookieConfig, value: &str) -> Option<HeaderValue> {
    HeaderValue::from_str(&config.build_set_cookie(value)).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_cookie_attributes() {
        assert_eq!(
            CookieConfig::session().build_set_cookie("abc"),
            "session_id=abc; HttpOnly; Secure; SameSite=Lax; Path=/"
        );
    }

    #[test]
    fn test_relaxed_cookie_with_max_age() {
        let config = CookieConfig {
            secure: false,
            same_site: SameSite::Strict,
            max_age: Some(Duration::from_secs(3600)),
            ..CookieConfig::session()
        };

        let cookie = config.build_set_cookie("s1");
        assert_eq!(
            cookie,
            "session_id=s1; HttpOnly; SameSite=Strict; Path=/; Max-Age=3600"
        );
    }

    #[test]
    fn test_extract_from_single_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; session_id=abc123; lang=en"),
        );

        assert_eq!(
            extract_cookie(&headers, SESSION_COOKIE_NAME).as_deref(),
            Some("abc123")
        );
        assert_eq!(extract_cookie(&headers, "lang").as_deref(), Some("en"));
        assert_eq!(extract_cookie(&headers, "absent"), None);
    }

    #[test]
    fn test_extract_across_headers() {
        let mut headers = HeaderMap::new();
        headers.append(header::COOKIE, HeaderValue::from_static("theme=dark"));
        headers.append(header::COOKIE, HeaderValue::from_static("session_id=xyz"));

        assert_eq!(
            extract_cookie(&headers, SESSION_COOKIE_NAME).as_deref(),
            Some("xyz")
        );
    }

    #[test]
    fn test_unrepresentable_value_yields_none() {
        assert!(set_cookie_header(&CookieConfig::session(), "bad\nvalue").is_none());
    }
}
