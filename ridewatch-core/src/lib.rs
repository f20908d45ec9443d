// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # `RideWatch` Core
//!
//! Core types and models for the `RideWatch` slot monitor.
//!
//! This crate provides the foundational abstractions used across all other
//! `RideWatch` crates:
//!
//! - Domain models (examination types, slots, sessions, change events)
//! - Error types
//!
//! ## Key Types
//!
//! ### Slots
//! - [`ExamType`] - The examination a slot is bookable for
//! - [`Slot`] - One observed appointment ("ride")
//! - [`SlotId`] - Stable identity derived from location, time and exam type
//!
//! ### Session
//! - [`Session`] - Cookie set, expiry and subject of the authenticated account
//! - [`SessionState`] - Lifecycle state (fresh, renewing, invalid)
//!
//! ### Reporting
//! - [`ChangeEvent`] - Added/removed/heartbeat/error event
//! - [`DiffResult`] - Added slots and removed identities of one poll

pub mod error;
pub mod models;

// Re-export error types
pub use error::CoreError;

// Re-export all model types
pub use models::{
    // Exam types
    ExamType,
    // Slot types
    START_TIME_FORMAT,
    Slot,
    SlotId,
    // Session types
    Session,
    SessionState,
    // Events
    ChangeEvent,
    ChangeKind,
    DiffResult,
};
