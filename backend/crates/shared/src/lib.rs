//! Shared Kernel - Domain-crossing minimal core
//!
//! Vocabulary every DropJar crate agrees on:
//! - Error classification ([`error::kind::ErrorKind`]) and the unified
//!   [`error::app_error::AppError`]
//! - Field-level validation failures ([`error::validation::ValidationErrors`])
//! - Typed UUID identifiers ([`id::Id`])
//!
//! Only things whose meaning is identical in every domain belong here.

pub mod error {
    pub mod app_error;
    pub mod kind;
    pub mod validation;
}
pub mod id;
