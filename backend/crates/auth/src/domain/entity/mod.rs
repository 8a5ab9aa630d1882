//! Entity Module

pub mod account;
pub mod auth_session;
pub mod verification_token;

pub use account::{Account, NewAccount};
pub use auth_session::AuthSession;
pub use verification_token::VerificationToken;
