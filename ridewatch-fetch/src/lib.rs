// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # RideWatch Fetch
//!
//! Session lifecycle and remote-service plumbing for RideWatch.
//!
//! ## Session
//!
//! - [`session::SessionManager`] - keeps the login alive, single-writer renewal
//! - [`cookies`] - cookie parsing and `LoginValid` handling
//! - [`shutdown`] - stop signal shared by background tasks
//!
//! ## Remote Boundary
//!
//! - [`source::SlotSource`] / [`source::SessionRenewer`] - traits the adapter implements
//! - [`host::http`] - HTTP client with tracing and domain allowlist
//! - [`retry::RetryPolicy`] - bounded retries with exponential backoff
//!
//! ## Example
//!
//! ```ignore
//! use ridewatch_fetch::{SessionConfig, SessionManager};
//!
//! let manager = SessionManager::initialize(&ssn, cookies, renewer, SessionConfig::default())?;
//! let session = manager.ensure_fresh().await?;
//! let batch = source.fetch_slots(&session, exam_type, &filters).await?;
//! ```

pub mod cookies;
pub mod error;
pub mod host;
pub mod retry;
pub mod session;
pub mod shutdown;
pub mod source;

// Errors
pub use error::{ApiError, HttpError, SessionError};

// Host APIs
pub use host::http::{HttpClient, ResponseExt};

// Session
pub use cookies::CookieMap;
pub use session::{SessionConfig, SessionInfo, SessionManager};
pub use shutdown::{StopHandle, StopSignal, stop_channel};

// Remote boundary
pub use retry::{Exhausted, RetryPolicy};
pub use source::{RejectedRecord, Renewal, SessionRenewer, SlotBatch, SlotFilters, SlotSource};
