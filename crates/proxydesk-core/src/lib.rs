//! Core library for proxydesk, a control panel for a SOCKS5 proxy's user accounts.
//!
//! This crate holds everything that is not terminal rendering:
//!
//! - `auth`: `SessionStore` (the bearer token and its durable copy) and the
//!   keychain-backed `CredentialStore` for the operator's login
//! - `api`: `AuthorizedClient`, the single authorization boundary for every
//!   administrative request, and the `ApiError` taxonomy
//! - `guard`: the `RouteGuard` state machine choosing login vs. admin surface
//! - `resources`: `ResourceManager` for listing, creating and deleting proxy users
//! - `poller`: the cancellable `StatusPoller`
//! - `admin`: `AdminSurface`, which composes the above for the admin view
//! - `notify`, `sequence`, `models`, `config`, `utils`: supporting types

pub mod admin;
pub mod api;
pub mod auth;
pub mod config;
pub mod guard;
pub mod models;
pub mod notify;
pub mod poller;
pub mod resources;
pub mod sequence;
pub mod utils;

pub use admin::AdminSurface;
pub use api::{ApiError, AuthorizedClient};
pub use auth::{CredentialStore, SessionStore};
pub use config::Config;
pub use guard::{Route, RouteGuard, RouteState, View};
pub use notify::Notifications;
pub use poller::StatusPoller;
pub use resources::{Confirmation, DeleteOutcome, PendingDeletion, ResourceManager};
