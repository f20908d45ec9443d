//! Cookie parsing for the booking service session.
//!
//! The service keeps its login in a handful of cookies. `LoginValid` carries
//! the server-asserted expiry as local wall-clock time (`YYYY-MM-DD HH:MM`),
//! which is what the session manager uses to decide when to renew.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// Cookie carrying the login expiry.
pub const LOGIN_VALID_COOKIE: &str = "LoginValid";

/// Cookies that must be present for the service to accept a session.
pub const REQUIRED_COOKIES: &[&str] = &[
    "FpsPartnerDeviceIdentifier",
    LOGIN_VALID_COOKIE,
    "FpsExternalIdentity",
    "ASP.NET_SessionId",
];

const LOGIN_VALID_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Cookie name/value map.
pub type CookieMap = BTreeMap<String, String>;

/// A cookie parsed from a `Set-Cookie` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetCookie {
    /// Cookie name.
    pub name: String,
    /// Cookie value.
    pub value: String,
    /// `expires=` attribute, if present and parseable.
    pub expires: Option<DateTime<Utc>>,
}

// ============================================================================
// Header Parsing
// ============================================================================

/// Parses a `Cookie` header value (`a=1; b=2`).
pub fn parse_cookie_header(header: &str) -> CookieMap {
    header
        .split(';')
        .filter_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            Some((name.to_string(), value.trim().to_string()))
        })
        .collect()
}

/// Parses a single `Set-Cookie` header value.
pub fn parse_set_cookie(header: &str) -> Option<SetCookie> {
    let mut parts = header.split(';');
    let (name, value) = parts.next()?.trim().split_once('=')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }

    let expires = parts.find_map(|attr| {
        let (key, val) = attr.trim().split_once('=')?;
        if key.trim().eq_ignore_ascii_case("expires") {
            parse_cookie_expires(val.trim())
        } else {
            None
        }
    });

    Some(SetCookie {
        name: name.to_string(),
        value: value.trim().to_string(),
        expires,
    })
}

/// Parses an `expires=` attribute (`Fri, 20-Jun-2025 14:48:56 GMT` or RFC 2822).
pub fn parse_cookie_expires(value: &str) -> Option<DateTime<Utc>> {
    let trimmed = value.trim().trim_end_matches("GMT").trim();

    for format in ["%a, %d-%b-%Y %H:%M:%S", "%a, %d %b %Y %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(naive.and_utc());
        }
    }

    DateTime::parse_from_rfc2822(value.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

// ============================================================================
// Raw HTTP Text
// ============================================================================

static REQUEST_COOKIE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^\s*Cookie:\s*(.+?)\s*$").expect("Invalid regex")
});

static RESPONSE_COOKIE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^\s*Set-Cookie:\s*(.+?)\s*$").expect("Invalid regex")
});

/// Extracts cookies from a captured raw HTTP request (its `Cookie:` header).
pub fn cookies_from_request_text(text: &str) -> CookieMap {
    REQUEST_COOKIE_RE
        .captures_iter(text)
        .flat_map(|caps| parse_cookie_header(&caps[1]))
        .collect()
}

/// Extracts cookies from a captured raw HTTP response (its `Set-Cookie:` headers).
pub fn cookies_from_response_text(text: &str) -> CookieMap {
    RESPONSE_COOKIE_RE
        .captures_iter(text)
        .filter_map(|caps| parse_set_cookie(&caps[1]))
        .map(|c| (c.name, c.value))
        .collect()
}

// ============================================================================
// Validation
// ============================================================================

/// Returns the required cookie names missing from `cookies`.
pub fn missing_required(cookies: &CookieMap) -> Vec<&'static str> {
    REQUIRED_COOKIES
        .iter()
        .copied()
        .filter(|name| cookies.get(*name).is_none_or(|v| v.trim().is_empty()))
        .collect()
}

/// Parses a `LoginValid` value as local time.
///
/// Captured values are often URL-encoded (`2025-06-20%2016:48`).
pub fn parse_login_valid(value: &str) -> Option<DateTime<Utc>> {
    let decoded: String = url::form_urlencoded::parse(format!("v={value}").as_bytes())
        .next()
        .map(|(_, v)| v.into_owned())?;

    let naive = NaiveDateTime::parse_from_str(decoded.trim(), LOGIN_VALID_FORMAT).ok()?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Formats an instant as a `LoginValid` value.
pub fn format_login_valid(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format(LOGIN_VALID_FORMAT).to_string()
}

/// Derives the session expiry from a cookie set.
pub fn login_expiry(cookies: &CookieMap) -> Option<DateTime<Utc>> {
    cookies.get(LOGIN_VALID_COOKIE).and_then(|v| parse_login_valid(v))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    const REQUEST: &str = "POST /Boka/occasion-bundles HTTP/1.1\r\n\
Host: fp.trafikverket.se\r\n\
Cookie: FpsPartnerDeviceIdentifier=dev1; LoginValid=2025-06-20 16:48; FpsExternalIdentity=ext; ASP.NET_SessionId=sess\r\n\
Content-Type: application/json\r\n\r\n{}";

    const RESPONSE: &str = "HTTP/1.1 200 OK\r\n\
Set-Cookie: LoginValid=2025-06-20 17:18; expires=Fri, 20-Jun-2025 15:18:00 GMT; path=/\r\n\
Set-Cookie: ASP.NET_SessionId=new; path=/; HttpOnly\r\n\r\n";

    #[test]
    fn test_parse_cookie_header() {
        let cookies = parse_cookie_header("a=1; b = 2 ;c=x=y; =bad; junk");
        assert_eq!(cookies.get("a").map(String::as_str), Some("1"));
        assert_eq!(cookies.get("b").map(String::as_str), Some("2"));
        assert_eq!(cookies.get("c").map(String::as_str), Some("x=y"));
        assert_eq!(cookies.len(), 3);
    }

    #[test]
    fn test_parse_set_cookie_with_expires() {
        let cookie =
            parse_set_cookie("LoginValid=2025-06-20 17:18; expires=Fri, 20-Jun-2025 15:18:00 GMT; path=/")
                .unwrap();
        assert_eq!(cookie.name, "LoginValid");
        assert_eq!(cookie.value, "2025-06-20 17:18");

        let expires = cookie.expires.unwrap();
        assert_eq!((expires.day(), expires.hour(), expires.minute()), (20, 15, 18));
    }

    #[test]
    fn test_parse_cookie_expires_rfc2822() {
        let expires = parse_cookie_expires("Fri, 20 Jun 2025 15:18:00 GMT").unwrap();
        assert_eq!(expires.hour(), 15);
        assert!(parse_cookie_expires("not a date").is_none());
    }

    #[test]
    fn test_cookies_from_request_text() {
        let cookies = cookies_from_request_text(REQUEST);
        assert_eq!(cookies.len(), 4);
        assert!(missing_required(&cookies).is_empty());
    }

    #[test]
    fn test_cookies_from_response_text() {
        let cookies = cookies_from_response_text(RESPONSE);
        assert_eq!(cookies.get("ASP.NET_SessionId").map(String::as_str), Some("new"));
        assert_eq!(cookies.get("LoginValid").map(String::as_str), Some("2025-06-20 17:18"));
    }

    #[test]
    fn test_missing_required() {
        let mut cookies = CookieMap::new();
        cookies.insert("LoginValid".into(), "2025-06-20 16:48".into());
        cookies.insert("ASP.NET_SessionId".into(), String::new());

        let missing = missing_required(&cookies);
        assert_eq!(
            missing,
            vec!["FpsPartnerDeviceIdentifier", "FpsExternalIdentity", "ASP.NET_SessionId"]
        );
    }

    #[test]
    fn test_parse_login_valid_plain_and_encoded() {
        let plain = parse_login_valid("2025-06-20 16:48").unwrap();
        let encoded = parse_login_valid("2025-06-20%2016%3A48").unwrap();
        assert_eq!(plain, encoded);

        let local = plain.with_timezone(&Local);
        assert_eq!((local.hour(), local.minute()), (16, 48));
        assert!(parse_login_valid("tomorrow").is_none());
    }

    #[test]
    fn test_login_valid_format_roundtrip() {
        let at = Utc::now().with_second(0).unwrap().with_nanosecond(0).unwrap();
        assert_eq!(parse_login_valid(&format_login_valid(at)), Some(at));
    }
}
