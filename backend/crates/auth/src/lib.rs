//! Auth (Authentication) Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Business logic, entities, repository traits
//! - `application/` - Use cases and application services
//! - `infra/` - Database and in-memory repository implementations
//! - `presentation/` - HTTP handlers, forms, views, router, session gate
//!
//! ## Features
//! - Registration with first/last name, email and password
//! - Email activation through a single-use, time-limited token
//! - Server-side sessions with signed cookie tokens
//! - Concurrent-session cap; evicted sessions see a session-expired page
//! - Path allow-list and optional per-path role rules
//!
//! ## Security Model
//! - Passwords hashed with Argon2id, NFKC-normalized first
//! - Session cookies are `HttpOnly` and HMAC-SHA256 signed
//! - Registration and activation each commit in one transaction

mod html;

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

// Re-exports for convenience
pub use application::config::AuthConfig;
pub use error::{AuthError, AuthResult};
pub use infra::{memory::MemoryAuthRepository, postgres::PgAuthRepository};
pub use presentation::{AuthAppState, Principal, auth_router, protect};

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

// Convenience re-exports
pub mod config {
    pub use crate::application::config::*;
}

pub mod models {
    pub use crate::domain::entity::*;
    pub use crate::domain::value_object::*;
    pub use crate::presentation::dto::*;
}

pub mod handlers {
    pub use crate::presentation::handlers::*;
}

pub mod store {
    pub use crate::domain::repository::AuthStore;
    pub use crate::infra::{MemoryAuthRepository, PgAuthRepository};
}

pub mod router {
    pub use crate::presentation::router::*;
}

pub mod middleware {
    pub use crate::presentation::middleware::*;
}

pub mod views {
    pub use crate::presentation::views::*;
}
