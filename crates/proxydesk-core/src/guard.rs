//! Route guard deciding which top-level surface is shown.
//!
//! The guard starts in `Loading`, settles exactly once when the session
//! store has been initialized, and from then on follows the session:
//! a logout of any kind moves it to `Unauthenticated`, a successful login
//! moves it to `Authenticated`.

use tokio::sync::watch;
use tracing::{debug, info};

use crate::auth::SessionStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteState {
    Loading,
    Authenticated,
    Unauthenticated,
}

/// Top-level navigable surfaces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Admin,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Login => "/login",
            Route::Admin => "/",
        }
    }

    pub fn from_path(path: &str) -> Option<Self> {
        match path {
            "/login" => Some(Route::Login),
            "/" | "" => Some(Route::Admin),
            _ => None,
        }
    }
}

/// What to draw for the current state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Placeholder,
    Login,
    Admin,
}

/// Outcome of asking the guard for a route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Render(View),
    Redirect(Route),
}

pub struct RouteGuard {
    state: RouteState,
    session: watch::Receiver<Option<String>>,
}

impl RouteGuard {
    pub fn new(session: &SessionStore) -> Self {
        Self {
            state: RouteState::Loading,
            session: session.subscribe(),
        }
    }

    pub fn state(&self) -> RouteState {
        self.state
    }

    /// Initialize the session store and leave `Loading`. Only the first
    /// call does anything; later calls return the current state.
    pub fn start(&mut self, store: &SessionStore) -> RouteState {
        if self.state != RouteState::Loading {
            return self.state;
        }
        store.initialize();
        let authenticated = self.session.borrow_and_update().is_some();
        self.state = Self::state_for(authenticated);
        info!(state = ?self.state, "Route guard settled");
        self.state
    }

    /// Apply any session change seen since the last call. Returns the new
    /// state when a transition happened.
    pub fn sync(&mut self) -> Option<RouteState> {
        if self.state == RouteState::Loading {
            return None;
        }
        match self.session.has_changed() {
            Ok(true) => self.apply_session(),
            _ => None,
        }
    }

    /// Wait for the next transition. Returns `None` once the session store
    /// is gone.
    pub async fn changed(&mut self) -> Option<RouteState> {
        loop {
            if self.session.changed().await.is_err() {
                return None;
            }
            if self.state == RouteState::Loading {
                continue;
            }
            if let Some(state) = self.apply_session() {
                return Some(state);
            }
        }
    }

    fn apply_session(&mut self) -> Option<RouteState> {
        let authenticated = self.session.borrow_and_update().is_some();
        let next = Self::state_for(authenticated);
        if next == self.state {
            debug!(state = ?next, "Session changed without a route transition");
            return None;
        }
        info!(from = ?self.state, to = ?next, "Route transition");
        self.state = next;
        Some(next)
    }

    fn state_for(authenticated: bool) -> RouteState {
        if authenticated {
            RouteState::Authenticated
        } else {
            RouteState::Unauthenticated
        }
    }

    pub fn view(&self) -> View {
        match self.state {
            RouteState::Loading => View::Placeholder,
            RouteState::Authenticated => View::Admin,
            RouteState::Unauthenticated => View::Login,
        }
    }

    /// Resolve a requested path against the current state: render it when
    /// allowed, otherwise redirect to the surface that is.
    pub fn navigate(&self, path: &str) -> Navigation {
        let requested = Route::from_path(path);
        match (self.state, requested) {
            (RouteState::Loading, _) => Navigation::Render(View::Placeholder),
            (RouteState::Authenticated, Some(Route::Admin)) => Navigation::Render(View::Admin),
            (RouteState::Authenticated, _) => Navigation::Redirect(Route::Admin),
            (RouteState::Unauthenticated, Some(Route::Login)) => Navigation::Render(View::Login),
            (RouteState::Unauthenticated, _) => Navigation::Redirect(Route::Login),
        }
    }
}
