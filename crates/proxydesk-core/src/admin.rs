//! The admin surface: everything that exists while the operator is logged in.
//!
//! `AdminSurface` owns the user list, the notifications, the latest status
//! snapshot and the status poller. Poller ticks and manual status refreshes
//! run as background tasks and report back over an MPSC channel, which the
//! surface drains on the caller's loop. Status results are applied in
//! issue order; late responses from older fetches are dropped.

use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::api::{ApiError, AuthorizedClient};
use crate::models::StatusSnapshot;
use crate::notify::Notifications;
use crate::poller::StatusPoller;
use crate::resources::{Confirmation, DeleteOutcome, PendingDeletion, ResourceManager};
use crate::sequence::{Sequenced, Sequencer, Ticket};

/// Buffer size for the background result channel.
/// One poll per period plus the odd manual refresh never comes close.
const CHANNEL_BUFFER_SIZE: usize = 16;

const STATUS_FAILED: &str = "Failed to fetch proxy status";

/// Results sent from background tasks back to the surface
#[derive(Debug)]
pub enum AdminUpdate {
    Status(Ticket, Result<StatusSnapshot, ApiError>),
}

pub struct AdminSurface {
    client: AuthorizedClient,
    pub resources: ResourceManager,
    pub notifications: Notifications,
    status: Sequenced<Option<StatusSnapshot>>,
    sequencer: Sequencer,
    poller: Option<StatusPoller>,
    updates_tx: mpsc::Sender<AdminUpdate>,
    updates_rx: mpsc::Receiver<AdminUpdate>,
}

impl AdminSurface {
    /// Mount the surface: start polling status (first fetch right away)
    /// and load the user list.
    pub async fn activate(client: AuthorizedClient, poll_interval: Duration) -> Self {
        let mut surface = Self::new(client);
        surface.start_polling(poll_interval);
        let _ = surface.resources.list(&mut surface.notifications).await;
        info!("Admin surface activated");
        surface
    }

    fn new(client: AuthorizedClient) -> Self {
        let (updates_tx, updates_rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);
        Self {
            resources: ResourceManager::new(client.clone()),
            client,
            notifications: Notifications::default(),
            status: Sequenced::new(None),
            sequencer: Sequencer::default(),
            poller: None,
            updates_tx,
            updates_rx,
        }
    }

    fn start_polling(&mut self, period: Duration) {
        let client = self.client.clone();
        let sequencer = self.sequencer.clone();
        let tx = self.updates_tx.clone();
        self.poller = Some(StatusPoller::spawn(period, move || {
            let ticket = sequencer.issue();
            Self::fetch_status(client.clone(), ticket, tx.clone())
        }));
    }

    async fn fetch_status(client: AuthorizedClient, ticket: Ticket, tx: mpsc::Sender<AdminUpdate>) {
        let result = client.fetch_status().await;
        if tx.send(AdminUpdate::Status(ticket, result)).await.is_err() {
            debug!("Admin surface gone, status result dropped");
        }
    }

    /// Unmount the surface. The poller is cancelled before anything else
    /// is dropped, and results still queued are discarded with the channel.
    pub fn teardown(mut self) {
        if let Some(poller) = self.poller.take() {
            poller.cancel();
        }
        info!("Admin surface torn down");
    }

    pub fn is_polling(&self) -> bool {
        self.poller.as_ref().is_some_and(|p| p.is_running())
    }

    // =========================================================================
    // Status
    // =========================================================================

    pub fn status(&self) -> Option<&StatusSnapshot> {
        self.status.get().as_ref()
    }

    /// Operator-requested status fetch, sequenced with the poller's ticks
    pub fn refresh_status(&mut self) {
        self.notifications.clear();
        let ticket = self.sequencer.issue();
        tokio::spawn(Self::fetch_status(
            self.client.clone(),
            ticket,
            self.updates_tx.clone(),
        ));
    }

    /// Apply every background result received so far. Returns how many
    /// were processed.
    pub fn process_updates(&mut self) -> usize {
        let mut processed = 0;
        while let Ok(update) = self.updates_rx.try_recv() {
            self.apply_update(update);
            processed += 1;
        }
        processed
    }

    /// Wait for the next background result and apply it
    pub async fn next_update(&mut self) {
        if let Some(update) = self.updates_rx.recv().await {
            self.apply_update(update);
        }
    }

    fn apply_update(&mut self, update: AdminUpdate) {
        match update {
            AdminUpdate::Status(ticket, Ok(snapshot)) => {
                let label = snapshot.status_label.clone();
                if self.status.apply(ticket, Some(snapshot)) {
                    debug!(?ticket, status = %label, "Status snapshot applied");
                } else {
                    debug!(?ticket, "Discarding out-of-order status snapshot");
                }
            }
            AdminUpdate::Status(ticket, Err(e)) => {
                if !self.status.settle(ticket) {
                    debug!(?ticket, error = %e, "Discarding out-of-order status failure");
                } else if !e.is_unauthorized() {
                    // Previous snapshot stays on screen
                    self.notifications.error(e.user_message(STATUS_FAILED));
                }
            }
        }
    }

    // =========================================================================
    // Users
    // =========================================================================

    pub async fn refresh_users(&mut self) -> Result<(), ApiError> {
        self.resources.refresh(&mut self.notifications).await
    }

    pub async fn create_user(&mut self) -> Result<(), ApiError> {
        self.resources.create(&mut self.notifications).await
    }

    pub fn request_delete(&self, username: &str) -> PendingDeletion {
        self.resources.request_delete(username)
    }

    pub async fn delete_user(
        &mut self,
        pending: PendingDeletion,
        confirmation: Confirmation,
    ) -> Result<DeleteOutcome, ApiError> {
        self.resources
            .delete(pending, confirmation, &mut self.notifications)
            .await
    }
}
