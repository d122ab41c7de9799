//! Lost & Found QR Core - Shared domain types.
//!
//! This crate provides the validated types used across the workspace:
//! - `server` - HTTP service, stores and presentation views
//! - `cli` - Command-line tools for migrations and offline QR rendering
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access, no HTTP.
//! Every constructor validates its input, so a value of one of these types is
//! always safe to persist or display.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, owner names, phone numbers and codes

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
