//! Presentation Layer
//!
//! HTTP handlers, DTOs, the session throttle gate and the router.

pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod router;
