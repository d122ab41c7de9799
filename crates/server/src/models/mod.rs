//! Domain models for the service.
//!
//! These types represent validated domain objects separate from database row
//! types. Row structs live next to the queries in [`crate::db`].

pub mod owner;
pub mod scan;

pub use owner::{NewOwner, Owner};
pub use scan::{ClientInfo, NewScan, ScanEvent};
