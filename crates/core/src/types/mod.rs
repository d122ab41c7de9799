//! Core types for Lost & Found QR.
//!
//! This module provides type-safe wrappers for the owner and scan domain.

pub mod id;
pub mod owner_name;
pub mod phone;
pub mod unique_code;

pub use id::*;
pub use owner_name::{OwnerName, OwnerNameError};
pub use phone::{Phone, PhoneError};
pub use unique_code::{UniqueCode, UniqueCodeError};
