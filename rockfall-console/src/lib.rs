pub mod config;
pub mod handlers;
pub mod middleware;
pub mod services;
pub mod startup;

use rockfall_access::session::SessionManager;
use std::sync::Arc;

/// Shared application state: the session manager owning the current principal.
#[derive(Clone)]
pub struct AppState {
    pub session: Arc<SessionManager>,
}

impl AppState {
    pub fn new(session: Arc<SessionManager>) -> Self {
        Self { session }
    }
}
