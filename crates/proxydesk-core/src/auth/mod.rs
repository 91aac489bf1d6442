//! Authentication module for the operator's admin session.
//!
//! This module provides:
//! - `SessionStore`: the bearer token, its durable copy, and change notifications
//! - `CredentialStore`: the operator's admin password in the OS keychain
//!
//! The token is persisted under the fixed key `jwt_token` and lives until an
//! explicit logout or the first authorization failure.

pub mod credentials;
pub mod session;

pub use credentials::CredentialStore;
pub use session::{SessionFile, SessionStore};
