//! Types shared by both sides of the UI/backend command boundary.

pub mod domain;
pub mod error;
pub mod protocol;
