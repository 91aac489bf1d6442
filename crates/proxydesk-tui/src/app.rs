//! Application state for the proxydesk terminal UI.
//!
//! `App` owns the session store, the one authorized API client, the route
//! guard and, while the operator is logged in, the admin surface. Route
//! transitions observed on the guard mount and unmount the admin surface.

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info, warn};

use proxydesk_core::guard::View;
use proxydesk_core::{
    AdminSurface, ApiError, AuthorizedClient, Config, Confirmation, CredentialStore,
    PendingDeletion, RouteGuard, RouteState, SessionStore,
};

// ============================================================================
// Constants
// ============================================================================

/// Maximum length for the admin username input
const MAX_USERNAME_LENGTH: usize = 64;

/// Maximum length for password inputs.
/// 128 chars accommodates password managers and passphrases.
const MAX_PASSWORD_LENGTH: usize = 128;

/// Environment variables pre-filling the login form
const USERNAME_ENV_VAR: &str = "PROXYDESK_USERNAME";
const PASSWORD_ENV_VAR: &str = "PROXYDESK_PASSWORD";

const LOGIN_FAILED: &str = "Login failed";

// ============================================================================
// UI State Types
// ============================================================================

/// Overall application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    ConfirmingDelete,
    ConfirmingQuit,
    Quitting,
}

/// Login form focus state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginFocus {
    Username,
    Password,
    Button,
}

impl LoginFocus {
    pub fn next(&self) -> Self {
        match self {
            LoginFocus::Username => LoginFocus::Password,
            LoginFocus::Password => LoginFocus::Button,
            LoginFocus::Button => LoginFocus::Username,
        }
    }

    pub fn prev(&self) -> Self {
        match self {
            LoginFocus::Username => LoginFocus::Button,
            LoginFocus::Password => LoginFocus::Username,
            LoginFocus::Button => LoginFocus::Password,
        }
    }
}

/// Focus on the admin surface: the user list or a create-form field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminFocus {
    Users,
    NewUsername,
    NewPassword,
}

impl AdminFocus {
    pub fn next(&self) -> Self {
        match self {
            AdminFocus::Users => AdminFocus::NewUsername,
            AdminFocus::NewUsername => AdminFocus::NewPassword,
            AdminFocus::NewPassword => AdminFocus::Users,
        }
    }

    pub fn prev(&self) -> Self {
        match self {
            AdminFocus::Users => AdminFocus::NewPassword,
            AdminFocus::NewUsername => AdminFocus::Users,
            AdminFocus::NewPassword => AdminFocus::NewUsername,
        }
    }

    pub fn in_form(&self) -> bool {
        !matches!(self, AdminFocus::Users)
    }
}

// ============================================================================
// Main Application Struct
// ============================================================================

pub struct App {
    // Core services
    pub config: Config,
    session: Arc<SessionStore>,
    client: AuthorizedClient,
    guard: RouteGuard,

    // UI State
    pub state: AppState,

    // Login form state
    pub login_username: String,
    pub login_password: String,
    pub login_focus: LoginFocus,
    pub login_error: Option<String>,

    // Admin surface, present only while authenticated
    pub admin: Option<AdminSurface>,
    pub admin_focus: AdminFocus,
    pub user_selection: usize,
    pub pending_delete: Option<PendingDeletion>,
}

impl App {
    /// Build the services. The session is not read until `start`.
    pub fn new(config: Config, cache_dir: &Path) -> Result<Self> {
        let session = Arc::new(SessionStore::new(cache_dir));
        let guard = RouteGuard::new(&session);
        let client = AuthorizedClient::new(
            &config.base_url(),
            config.request_timeout(),
            session.clone(),
        )?;
        debug!(?cache_dir, "Services constructed");

        let login_username = std::env::var(USERNAME_ENV_VAR)
            .ok()
            .or_else(|| config.last_username.clone())
            .unwrap_or_default();
        let login_password = std::env::var(PASSWORD_ENV_VAR)
            .ok()
            .or_else(|| CredentialStore::recall(&login_username))
            .unwrap_or_default();

        Ok(Self {
            config,
            session,
            client,
            guard,
            state: AppState::Normal,
            login_username,
            login_password,
            login_focus: LoginFocus::Username,
            login_error: None,
            admin: None,
            admin_focus: AdminFocus::Users,
            user_selection: 0,
            pending_delete: None,
        })
    }

    /// Read the stored session and show the matching surface
    pub async fn start(&mut self) {
        let state = self.guard.start(&self.session);
        self.enter(state).await;
    }

    pub fn view(&self) -> View {
        self.guard.view()
    }

    /// Tear down the admin surface (and its poller) before exit
    pub fn shutdown(&mut self) {
        if let Some(admin) = self.admin.take() {
            admin.teardown();
        }
    }

    // =========================================================================
    // Routing
    // =========================================================================

    /// Drain background results and apply any session change
    pub async fn check_background_tasks(&mut self) {
        if let Some(admin) = self.admin.as_mut() {
            admin.process_updates();
        }
        self.sync_route().await;
    }

    async fn sync_route(&mut self) {
        if let Some(state) = self.guard.sync() {
            self.enter(state).await;
        }
    }

    async fn enter(&mut self, state: RouteState) {
        match state {
            RouteState::Loading => {}
            RouteState::Authenticated => {
                if self.admin.is_none() {
                    self.admin_focus = AdminFocus::Users;
                    self.user_selection = 0;
                    let surface =
                        AdminSurface::activate(self.client.clone(), self.config.poll_interval())
                            .await;
                    self.admin = Some(surface);
                }
            }
            RouteState::Unauthenticated => {
                self.shutdown();
                self.pending_delete = None;
                if self.state == AppState::ConfirmingDelete {
                    self.state = AppState::Normal;
                }
                self.start_login();
            }
        }
    }

    // =========================================================================
    // Login / Logout
    // =========================================================================

    /// Reset the login form focus for a fresh attempt
    pub fn start_login(&mut self) {
        self.login_focus = if self.login_username.is_empty() {
            LoginFocus::Username
        } else {
            LoginFocus::Password
        };
    }

    /// Attempt login with the credentials from the login form
    pub async fn attempt_login(&mut self) {
        let username = self.login_username.clone();
        let password = self.login_password.clone();
        self.login_error = None;

        let token = match self.client.login(&username, &password).await {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "Login failed");
                if matches!(e, ApiError::Validation { status: 401, .. }) {
                    // A remembered password the server rejects is stale
                    if let Err(e) = CredentialStore::forget(&username) {
                        warn!(error = %e, "Failed to remove stale credentials");
                    }
                }
                self.login_error = Some(match e {
                    ApiError::Network(_) => {
                        format!("Unable to reach {}", self.config.base_url())
                    }
                    e => e.user_message(LOGIN_FAILED),
                });
                return;
            }
        };

        if let Err(e) = self.session.set_authenticated(token) {
            warn!(error = %e, "Session not persisted, continuing in memory");
        }

        if let Err(e) = CredentialStore::remember(&username, &password) {
            warn!(error = %e, "Failed to store credentials");
        }
        self.config.last_username = Some(username);
        if let Err(e) = self.config.save() {
            warn!(error = %e, "Failed to save config");
        }

        self.login_password.clear();
        info!("Login successful");
        self.sync_route().await;
    }

    pub async fn logout(&mut self) {
        if self.session.logout() {
            info!("Operator logged out");
        }
        self.sync_route().await;
    }

    // =========================================================================
    // Admin actions
    // =========================================================================

    pub fn user_count(&self) -> usize {
        self.admin
            .as_ref()
            .map_or(0, |a| a.resources.users().len())
    }

    pub fn select_next(&mut self) {
        let max_index = self.user_count().saturating_sub(1);
        self.user_selection = (self.user_selection + 1).min(max_index);
    }

    pub fn select_prev(&mut self) {
        self.user_selection = self.user_selection.saturating_sub(1);
    }

    fn clamp_selection(&mut self) {
        self.user_selection = clamp_index(self.user_selection, self.user_count());
    }

    pub async fn refresh_users(&mut self) {
        if let Some(admin) = self.admin.as_mut() {
            let _ = admin.refresh_users().await;
        }
        self.clamp_selection();
        self.sync_route().await;
    }

    pub fn refresh_status(&mut self) {
        if let Some(admin) = self.admin.as_mut() {
            admin.refresh_status();
        }
    }

    pub async fn submit_new_user(&mut self) {
        if let Some(admin) = self.admin.as_mut() {
            if admin.create_user().await.is_ok() {
                self.admin_focus = AdminFocus::Users;
            }
        }
        self.clamp_selection();
        self.sync_route().await;
    }

    /// Ask for confirmation before deleting the selected user
    pub fn request_delete(&mut self) {
        let Some(admin) = self.admin.as_ref() else {
            return;
        };
        let Some(user) = admin.resources.users().get(self.user_selection) else {
            return;
        };
        self.pending_delete = Some(admin.request_delete(&user.username));
        self.state = AppState::ConfirmingDelete;
    }

    pub async fn answer_delete(&mut self, confirmation: Confirmation) {
        self.state = AppState::Normal;
        let Some(pending) = self.pending_delete.take() else {
            return;
        };
        if let Some(admin) = self.admin.as_mut() {
            let _ = admin.delete_user(pending, confirmation).await;
        }
        self.clamp_selection();
        self.sync_route().await;
    }
}

/// Keep a selection index inside a list of `len` items
fn clamp_index(index: usize, len: usize) -> usize {
    index.min(len.saturating_sub(1))
}

// ============================================================================
// Input validation helpers (exported for use in input.rs)
// ============================================================================

/// Check if a character is valid for input (no control characters)
fn is_valid_input_char(c: char) -> bool {
    !c.is_control()
}

/// Check if a username character should be accepted
pub fn can_add_username_char(current_len: usize, c: char) -> bool {
    current_len < MAX_USERNAME_LENGTH && is_valid_input_char(c)
}

/// Check if a password character should be accepted
pub fn can_add_password_char(current_len: usize, c: char) -> bool {
    current_len < MAX_PASSWORD_LENGTH && is_valid_input_char(c)
}

// ============================================================================
// Tests
// ============================================================================
