//! Lost & Found QR server library.
//!
//! This crate provides the service as a library, allowing the router to be
//! driven from integration tests and the QR encoder to be reused by the CLI.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod notify;
pub mod qr;
pub mod routes;
pub mod services;
pub mod state;
pub mod views;
