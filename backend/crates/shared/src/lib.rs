//! Shared Kernel - vocabulary every backend crate agrees on
//!
//! - Unified error type ([`error::app_error::AppError`]) and result alias
//! - Typed identifiers for scenarios, sessions and graph entities
//!
//! Only things with the same meaning across all crates belong here.

pub mod error {
    pub mod app_error;
    pub mod conversions;
    pub mod kind;
}
pub mod id;
