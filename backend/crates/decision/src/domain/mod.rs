//! Domain Layer
//!
//! - Entities of the decision graph that the API mutates
//! - Repository traits (implemented in `infra`)

pub mod entities;
pub mod repository;
