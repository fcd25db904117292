//! trello-gcal-sync - one-way sync from a Trello list to Google Calendar
//!
//! Every card on the configured list that does not yet carry the marker
//! comment becomes an all-day calendar event on the card's creation date,
//! after which the marker is appended to the card.

pub mod api;
pub mod auth;
pub mod config;
pub mod env_vars;
pub mod error;
pub mod logging;
pub mod services;

pub use error::SyncError;
