//! REST client module for the proxy admin API.
//!
//! This module provides the `AuthorizedClient`, the one place where the
//! session's bearer token is attached to outbound requests and where an
//! authorization failure is turned into a logout.
//!
//! The API is served under `/api`: `/api/admin/login` issues tokens and
//! `/api/proxy/*` manages users and reports service status.

pub mod client;
pub mod error;

pub use client::AuthorizedClient;
pub use error::ApiError;
