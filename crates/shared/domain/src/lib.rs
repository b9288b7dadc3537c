//! Domain layer - Core business entities and value objects.
//!
//! This crate contains pure domain logic with no infrastructure dependencies.
//! The `Record` capability defined here is what the generic cache-aside
//! repository is parameterized over.

pub mod constants;
pub mod error;
pub mod record;
pub mod user;
pub mod validation;

pub use constants::*;
pub use error::{DomainError, DomainResult};
pub use record::Record;
pub use user::{CreateUser, User, UserPatch};
pub use validation::{require_fields, validate_password_reset};
