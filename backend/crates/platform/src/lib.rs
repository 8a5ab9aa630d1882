//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Cryptographic utilities (HMAC-SHA256, Base64, random secrets)
//! - Password hashing (Argon2id)
//! - Cookie management
//! - Outbound mail delivery off the request path

pub mod cookie;
pub mod crypto;
pub mod mail;
pub mod password;
