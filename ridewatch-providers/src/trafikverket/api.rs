//! HTTP client for the Trafikverket booking service.

use async_trait::async_trait;
use chrono::NaiveDate;
use ridewatch_core::{ExamType, Session};
use ridewatch_fetch::cookies::{self, CookieMap};
use ridewatch_fetch::{
    ApiError, HttpClient, HttpError, Renewal, ResponseExt, SessionRenewer, SlotBatch, SlotFilters,
    SlotSource,
};
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use super::parser;

// ============================================================================
// Constants
// ============================================================================

/// Booking API base URL.
pub const API_BASE: &str = "https://fp.trafikverket.se";

/// Domain all requests are restricted to.
pub const ALLOWED_DOMAIN: &str = "trafikverket.se";

const OCCASION_BUNDLES_ENDPOINT: &str = "/Boka/occasion-bundles";
const GET_COOKIE_ENDPOINT: &str = "/Boka/getCookie";

/// Slot queries can take a while on the service side.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

const LICENCE_ID_B: u32 = 5;
const VEHICLE_TYPE_ID: u32 = 2;
const TACHOGRAPH_TYPE_ID: u32 = 1;
const OCCASION_CHOICE_ID: u32 = 1;
const LANGUAGE_ID: u32 = 4;

/// Query start date when no lower bound is configured.
const EPOCH_START_DATE: &str = "1970-01-01T00:00:00.000Z";

// ============================================================================
// Request Building
// ============================================================================

/// Builds the occasion-bundles request body for one location.
pub fn build_occasion_query(
    ssn: &str,
    exam_type: ExamType,
    location_id: u32,
    start_date: Option<NaiveDate>,
) -> Value {
    let exam_id = exam_type.service_id();
    let start = start_date.map_or_else(
        || EPOCH_START_DATE.to_string(),
        |d| format!("{}T00:00:00.000Z", d.format("%Y-%m-%d")),
    );

    json!({
        "bookingSession": {
            "socialSecurityNumber": ssn,
            "licenceId": LICENCE_ID_B,
            "bookingModeId": 0,
            "ignoreDebt": false,
            "ignoreBookingHindrance": false,
            "examinationTypeId": exam_id,
            "excludeExaminationCategories": [],
            "rescheduleTypeId": 0,
            "paymentIsActive": false,
            "paymentReference": null,
            "paymentUrl": null,
            "searchedMonths": 0
        },
        "occasionBundleQuery": {
            "startDate": start,
            "searchedMonths": 0,
            "locationId": location_id,
            "nearbyLocationIds": [],
            "languageId": LANGUAGE_ID,
            "vehicleTypeId": VEHICLE_TYPE_ID,
            "tachographTypeId": TACHOGRAPH_TYPE_ID,
            "occasionChoiceId": OCCASION_CHOICE_ID,
            "examinationTypeId": exam_id
        }
    })
}

// ============================================================================
// Client
// ============================================================================

/// Trafikverket booking API client.
#[derive(Debug, Clone)]
pub struct TrafikverketClient {
    http: HttpClient,
    base_url: String,
}

impl TrafikverketClient {
    /// Creates a client sending the given user agent.
    pub fn new(user_agent: &str) -> Result<Self, HttpError> {
        let http = HttpClient::with_options(REQUEST_TIMEOUT, user_agent)?.allow_domains([ALLOWED_DOMAIN]);
        Ok(Self {
            http,
            base_url: API_BASE.to_string(),
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    /// Fetches the slots of one location.
    #[instrument(skip(self, session))]
    pub async fn fetch_location(
        &self,
        session: &Session,
        exam_type: ExamType,
        location_id: u32,
        start_date: Option<NaiveDate>,
    ) -> Result<SlotBatch, ApiError> {
        let body = build_occasion_query(&session.subject, exam_type, location_id, start_date);
        let response = self
            .http
            .post_json_with_cookies(&self.url(OCCASION_BUNDLES_ENDPOINT), &body, &session.cookie_header())
            .await?;

        let status = response.status().as_u16();
        let retry_after = response.retry_after_secs();
        let text = response.text().await?;
        debug!(status, len = text.len(), "Occasion bundles response");

        parser::check_status(status, &text, retry_after)?;
        parser::parse_bundles(&text, exam_type, location_id)
    }
}

#[async_trait]
impl SlotSource for TrafikverketClient {
    fn id(&self) -> &str {
        "trafikverket"
    }

    async fn fetch_slots(
        &self,
        session: &Session,
        exam_type: ExamType,
        filters: &SlotFilters,
    ) -> Result<SlotBatch, ApiError> {
        if filters.location_ids.is_empty() {
            return Err(ApiError::Malformed("no location ids to query".to_string()));
        }

        let mut batch = SlotBatch::default();
        for &location_id in &filters.location_ids {
            let part = self
                .fetch_location(session, exam_type, location_id, filters.date_from)
                .await?;
            batch.extend(part);
        }

        let before = batch.slots.len();
        batch.retain_matching(filters);
        debug!(
            exam = %exam_type,
            fetched = before,
            kept = batch.slots.len(),
            "Applied slot filters"
        );
        Ok(batch)
    }
}

#[async_trait]
impl SessionRenewer for TrafikverketClient {
    #[instrument(skip(self, session), fields(generation = session.generation))]
    async fn renew(&self, session: &Session) -> Result<Renewal, ApiError> {
        let body = json!({ "key": cookies::LOGIN_VALID_COOKIE });
        let response = self
            .http
            .post_json_with_cookies(&self.url(GET_COOKIE_ENDPOINT), &body, &session.cookie_header())
            .await?;

        let status = response.status().as_u16();
        let retry_after = response.retry_after_secs();
        let set_cookies = response.set_cookie_headers();
        let text = response.text().await.unwrap_or_default();

        parser::check_status(status, &text, retry_after)?;

        let renewal = renewal_from_headers(&set_cookies);
        if renewal.cookies.is_empty() {
            warn!("Renewal response carried no cookies");
            return Err(ApiError::Malformed("renewal response set no cookies".to_string()));
        }

        info!(count = renewal.cookies.len(), "Received renewed cookies");
        Ok(renewal)
    }
}

/// Collects `Set-Cookie` values into a renewal, keeping the earliest expiry.
pub fn renewal_from_headers(headers: &[String]) -> Renewal {
    let mut jar = CookieMap::new();
    let mut expires_hint = None;

    for parsed in headers.iter().filter_map(|h| cookies::parse_set_cookie(h)) {
        if let Some(expires) = parsed.expires {
            expires_hint = Some(match expires_hint {
                Some(earliest) if earliest < expires => earliest,
                _ => expires,
            });
        }
        jar.insert(parsed.name, parsed.value);
    }

    Renewal {
        cookies: jar,
        expires_hint,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_build_occasion_query() {
        let query = build_occasion_query("199001011234", ExamType::Korprov, 1000140, None);

        assert_eq!(query["bookingSession"]["socialSecurityNumber"], "199001011234");
        assert_eq!(query["bookingSession"]["licenceId"], 5);
        assert_eq!(query["bookingSession"]["examinationTypeId"], 12);
        assert_eq!(query["occasionBundleQuery"]["locationId"], 1000140);
        assert_eq!(query["occasionBundleQuery"]["startDate"], EPOCH_START_DATE);
        assert_eq!(query["occasionBundleQuery"]["vehicleTypeId"], 2);
        assert_eq!(query["occasionBundleQuery"]["tachographTypeId"], 1);
        assert_eq!(query["occasionBundleQuery"]["occasionChoiceId"], 1);
        assert_eq!(query["occasionBundleQuery"]["languageId"], 4);
    }

    #[test]
    fn test_build_query_with_start_date() {
        let query = build_occasion_query(
            "1",
            ExamType::Kunskapsprov,
            1,
            NaiveDate::from_ymd_opt(2025, 6, 20),
        );
        assert_eq!(query["occasionBundleQuery"]["startDate"], "2025-06-20T00:00:00.000Z");
        assert_eq!(query["occasionBundleQuery"]["examinationTypeId"], 3);
    }

    #[test]
    fn test_renewal_from_headers_keeps_earliest_expiry() {
        let headers = vec![
            "LoginValid=2025-06-20 17:18; expires=Fri, 20-Jun-2025 15:18:00 GMT; path=/".to_string(),
            "ASP.NET_SessionId=new; expires=Fri, 20-Jun-2025 14:00:00 GMT; path=/".to_string(),
            "garbage".to_string(),
        ];

        let renewal = renewal_from_headers(&headers);
        assert_eq!(renewal.cookies.len(), 2);
        assert_eq!(renewal.expires_hint.unwrap().hour(), 14);
    }

    #[test]
    fn test_client_is_restricted_to_service_domain() {
        let client = TrafikverketClient::new("test-agent").unwrap();
        assert_eq!(client.id(), "trafikverket");
        assert_eq!(client.url(GET_COOKIE_ENDPOINT), "https://fp.trafikverket.se/Boka/getCookie");
    }
}
