//! HTTP client with tracing and a domain allowlist.
//!
//! Every request the booking adapter makes goes through [`HttpClient`], which
//! refuses hosts outside the allowlist and carries the session cookies as a
//! raw `Cookie` header.

use reqwest::{Client, Response, StatusCode, header};
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

use crate::error::HttpError;

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default user agent.
pub const DEFAULT_USER_AGENT: &str = concat!("ridewatch/", env!("CARGO_PKG_VERSION"));

// ============================================================================
// HTTP Client
// ============================================================================

/// HTTP client wrapper with tracing and domain allowlist.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: Client,
    allowed_domains: Option<Vec<String>>,
}

impl HttpClient {
    /// Creates a client with the default timeout and user agent.
    pub fn new() -> Result<Self, HttpError> {
        Self::with_options(DEFAULT_TIMEOUT, DEFAULT_USER_AGENT)
    }

    /// Creates a client with a custom timeout and user agent.
    pub fn with_options(timeout: Duration, user_agent: &str) -> Result<Self, HttpError> {
        let inner = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;

        Ok(Self {
            inner,
            allowed_domains: None,
        })
    }

    /// Restricts requests to the given domains and their subdomains.
    #[must_use]
    pub fn allow_domains<I, S>(mut self, domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_domains = Some(domains.into_iter().map(Into::into).collect());
        self
    }

    /// Checks if a URL's host is allowed.
    fn check_domain(&self, url: &str) -> Result<(), HttpError> {
        let parsed = Url::parse(url).map_err(|e| HttpError::InvalidUrl(e.to_string()))?;

        let Some(ref allowed) = self.allowed_domains else {
            return Ok(());
        };

        let host = parsed
            .host_str()
            .ok_or_else(|| HttpError::InvalidUrl("No host in URL".to_string()))?;

        let permitted = allowed
            .iter()
            .any(|domain| host == domain || host.ends_with(&format!(".{domain}")));

        if permitted {
            Ok(())
        } else {
            Err(HttpError::DomainNotAllowed(host.to_string()))
        }
    }

    /// Performs a POST request with a JSON body and a `Cookie` header.
    #[instrument(skip(self, body, cookies), fields(url = %url))]
    pub async fn post_json_with_cookies<T: serde::Serialize + ?Sized>(
        &self,
        url: &str,
        body: &T,
        cookies: &str,
    ) -> Result<Response, HttpError> {
        self.check_domain(url)?;
        let cookie = header::HeaderValue::from_str(cookies)
            .map_err(|e| HttpError::InvalidHeader(e.to_string()))?;

        debug!("POST request with cookies");
        let response = self
            .inner
            .post(url)
            .header(header::COOKIE, cookie)
            .header(header::ACCEPT, "application/json, text/plain, */*")
            .json(body)
            .send()
            .await
            .map_err(map_send_error)?;

        debug!(status = %response.status(), "Response received");
        Ok(response)
    }
}

fn map_send_error(err: reqwest::Error) -> HttpError {
    if err.is_timeout() {
        HttpError::Timeout
    } else {
        HttpError::Request(err)
    }
}

// ============================================================================
// Response Extensions
// ============================================================================

/// Extension trait for Response handling.
pub trait ResponseExt {
    /// Check if the response indicates rate limiting.
    fn is_rate_limited(&self) -> bool;

    /// Get the Retry-After header value in seconds.
    fn retry_after_secs(&self) -> Option<u64>;

    /// Raw `Set-Cookie` header values.
    fn set_cookie_headers(&self) -> Vec<String>;
}

impl ResponseExt for Response {
    fn is_rate_limited(&self) -> bool {
        self.status() == StatusCode::TOO_MANY_REQUESTS
    }

    fn retry_after_secs(&self) -> Option<u64> {
        self.headers()
            .get(header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse().ok())
    }

    fn set_cookie_headers(&self) -> Vec<String> {
        self.headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(str::to_string)
            .collect()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_allowlist() {
        let client = HttpClient::new().unwrap().allow_domains(["trafikverket.se"]);

        assert!(client.check_domain("https://fp.trafikverket.se/Boka/getCookie").is_ok());
        assert!(client.check_domain("https://trafikverket.se/").is_ok());
        assert!(client.check_domain("https://trafikverket.se.evil.com/").is_err());
        assert!(client.check_domain("https://evil.com/steal").is_err());
    }

    #[test]
    fn test_unrestricted_client_still_validates_urls() {
        let client = HttpClient::new().unwrap();
        assert!(client.check_domain("https://any.domain.com").is_ok());
        assert!(matches!(
            client.check_domain("not-a-valid-url"),
            Err(HttpError::InvalidUrl(_))
        ));
    }
}
