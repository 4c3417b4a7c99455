//! Core application logic for the Şükür journal
//!
//! This crate contains the journal, prayer and message services, the streak
//! and badge engine, the profile, settings and PIN lock, backup and restore,
//! and the review prompt and ad cadence bookkeeping.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod ads;
pub mod backup;
pub mod clock;
pub mod context;
pub mod duas;
pub mod gamification;
pub mod ids;
pub mod journal;
pub mod messages;
pub mod prayers;
pub mod profiles;
pub mod records;
pub mod review;
pub mod sanitize;
pub mod security;
pub mod settings;

pub use context::{AppContext, EntrySaved};
