//! Proxy user management: list, create and delete credential records.
//!
//! The held list only ever reflects what the server returned. Mutations
//! are followed by a full re-list instead of being applied locally.

use std::collections::HashSet;

use tracing::{debug, info};

use crate::api::{ApiError, AuthorizedClient};
use crate::models::{CredentialRecord, NewUser};
use crate::notify::Notifications;

const LIST_FAILED: &str = "Failed to fetch users";
const CREATE_FAILED: &str = "Failed to create user";
const DELETE_FAILED: &str = "Failed to delete user";
const MISSING_FIELDS: &str = "Username and password are required";

/// Operator's answer to a deletion prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Accepted,
    Declined,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    Declined,
}

/// First half of a deletion: names the user and carries the prompt to
/// show. Nothing has been sent yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingDeletion {
    username: String,
}

impl PendingDeletion {
    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn prompt(&self) -> String {
        format!("Are you sure you want to delete user {}?", self.username)
    }
}

pub struct ResourceManager {
    client: AuthorizedClient,
    users: Vec<CredentialRecord>,
    /// Create-user form; cleared after a successful create
    pub form: NewUser,
}

impl ResourceManager {
    pub fn new(client: AuthorizedClient) -> Self {
        Self {
            client,
            users: Vec::new(),
            form: NewUser::default(),
        }
    }

    pub fn users(&self) -> &[CredentialRecord] {
        &self.users
    }

    /// Replace the held list with the server's. On failure the previous
    /// list stays and an error is posted.
    pub async fn list(&mut self, notes: &mut Notifications) -> Result<(), ApiError> {
        match self.client.list_users().await {
            Ok(users) => {
                self.users = Self::unique_by_username(users);
                debug!(count = self.users.len(), "User list replaced");
                Ok(())
            }
            Err(e) => {
                Self::report(notes, &e, LIST_FAILED);
                Err(e)
            }
        }
    }

    /// Operator-initiated re-list
    pub async fn refresh(&mut self, notes: &mut Notifications) -> Result<(), ApiError> {
        notes.clear();
        self.list(notes).await
    }

    /// Submit the create form. Both fields must be filled in; an incomplete
    /// form never reaches the network.
    ///
    /// The create itself posts at most one notification. If it succeeds and
    /// the follow-up list then fails, the list error is posted as well, so
    /// both slots are live: the user exists but the list shown is stale.
    /// The same holds for `delete`.
    pub async fn create(&mut self, notes: &mut Notifications) -> Result<(), ApiError> {
        notes.clear();

        if !self.form.is_complete() {
            let e = ApiError::IncompleteInput(MISSING_FIELDS);
            Self::report(notes, &e, CREATE_FAILED);
            return Err(e);
        }

        if let Err(e) = self.client.create_user(&self.form).await {
            Self::report(notes, &e, CREATE_FAILED);
            return Err(e);
        }

        let username = std::mem::take(&mut self.form.username);
        self.form.clear();
        info!(username = %username, "Proxy user created");
        notes.success(format!("User {} created successfully", username));

        // A failed re-list is reported on its own; the create still succeeded
        let _ = self.list(notes).await;
        Ok(())
    }

    pub fn request_delete(&self, username: &str) -> PendingDeletion {
        PendingDeletion {
            username: username.to_string(),
        }
    }

    /// Second half of a deletion. A declined confirmation sends nothing and
    /// leaves notifications untouched.
    pub async fn delete(
        &mut self,
        pending: PendingDeletion,
        confirmation: Confirmation,
        notes: &mut Notifications,
    ) -> Result<DeleteOutcome, ApiError> {
        if confirmation == Confirmation::Declined {
            debug!(username = %pending.username, "Deletion declined");
            return Ok(DeleteOutcome::Declined);
        }

        notes.clear();

        if let Err(e) = self.client.delete_user(&pending.username).await {
            Self::report(notes, &e, DELETE_FAILED);
            return Err(e);
        }

        info!(username = %pending.username, "Proxy user deleted");
        notes.success(format!("User {} deleted successfully", pending.username));

        let _ = self.list(notes).await;
        Ok(DeleteOutcome::Deleted)
    }

    /// Delete `username` after asking `confirm`, which sees the pending
    /// deletion (and its prompt) and answers synchronously.
    pub async fn delete_with<F>(
        &mut self,
        username: &str,
        confirm: F,
        notes: &mut Notifications,
    ) -> Result<DeleteOutcome, ApiError>
    where
        F: FnOnce(&PendingDeletion) -> bool,
    {
        let pending = self.request_delete(username);
        let confirmation = if confirm(&pending) {
            Confirmation::Accepted
        } else {
            Confirmation::Declined
        };
        self.delete(pending, confirmation, notes).await
    }

    /// Authorization failures end the session instead of posting a notice
    fn report(notes: &mut Notifications, error: &ApiError, fallback: &str) {
        if error.is_unauthorized() {
            return;
        }
        notes.error(error.user_message(fallback));
    }

    fn unique_by_username(users: Vec<CredentialRecord>) -> Vec<CredentialRecord> {
        let mut seen = HashSet::new();
        users
            .into_iter()
            .filter(|u| seen.insert(u.username.clone()))
            .collect()
    }
}
