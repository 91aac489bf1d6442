//! Data models for the proxy admin API.
//!
//! - `CredentialRecord`, `UsersResponse`, `NewUser`: proxy user accounts
//! - `StatusSnapshot`: the service status feed
//! - `LoginResponse`: the admin login reply

pub mod status;
pub mod user;

pub use status::StatusSnapshot;
pub use user::{CredentialRecord, LoginRequest, LoginResponse, NewUser, UsersResponse};
