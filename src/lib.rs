//! snipbin - a pastebin-style content-sharing service
//!
//! This library provides the core functionality for the snipbin service:
//! short-lived text posts with optional expiration dates, anonymous or
//! owned, with credential-gated mutation and privileged listing.

pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
