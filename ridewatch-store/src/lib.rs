// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # RideWatch Store
//!
//! Durable state for RideWatch.
//!
//! This crate provides:
//!
//! - **RideStore**: SQLite record of every observed ride, with logical deletion
//! - **Config**: the JSON configuration file (credentials, filters, intervals)
//! - **Persistence**: atomic, owner-only JSON file I/O
//!
//! ## Usage
//!
//! ```ignore
//! use ridewatch_store::{Config, RideQuery, RideStore};
//!
//! let config = Config::load_from(&Config::default_path()).await?;
//! let store = RideStore::open(&config.database_path())?;
//!
//! store.upsert(&slots)?;
//! let rides = store.query(&RideQuery::for_exam(config.exam_type))?;
//! ```

pub mod config;
pub mod error;
pub mod persistence;
pub mod ride_store;

pub use config::{Config, MAX_RETENTION_DAYS};
pub use error::StoreError;
pub use persistence::{
    default_config_dir, default_config_path, default_data_dir, default_database_path, load_json,
    save_json,
};
pub use ride_store::{RideQuery, RideStats, RideStore};

#[cfg(test)]
mod persistence_tests;
