//! Trafikverket driving-licence booking service.
//!
//! ## Endpoints
//!
//! - `POST https://fp.trafikverket.se/Boka/occasion-bundles` - bookable occasions
//!   for one location and examination type
//! - `POST https://fp.trafikverket.se/Boka/getCookie` - extends the login and
//!   returns fresh cookies via `Set-Cookie`
//!
//! ## Usage
//!
//! ```ignore
//! use ridewatch_providers::trafikverket::TrafikverketClient;
//!
//! let client = Arc::new(TrafikverketClient::new(&config.user_agent)?);
//! let batch = client.fetch_slots(&session, ExamType::Korprov, &filters).await?;
//! ```

mod api;
pub(crate) mod parser;

pub use api::{
    ALLOWED_DOMAIN, API_BASE, TrafikverketClient, build_occasion_query, renewal_from_headers,
};
pub use parser::{check_status, is_session_expired_body, parse_bundles};
