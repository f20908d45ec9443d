// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # RideWatch Providers
//!
//! Concrete adapters for the remote booking service.
//!
//! | Service | Slots | Renewal |
//! |---------|-------|---------|
//! | Trafikverket | ✅ | ✅ |
//!
//! Each adapter implements [`ridewatch_fetch::SlotSource`] and
//! [`ridewatch_fetch::SessionRenewer`], so the monitor and the session
//! manager never see service-specific types.

pub mod trafikverket;

pub use trafikverket::TrafikverketClient;
