//! Presentation Layer
//!
//! HTTP handlers, DTOs, views, router, and middleware.

pub mod dto;
pub mod flash;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod views;

pub use handlers::AuthAppState;
pub use middleware::{Principal, require_auth_session};
pub use router::{auth_router, protect};
