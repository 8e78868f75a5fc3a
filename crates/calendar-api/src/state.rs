//! Shared application state.

use std::sync::Arc;

use calendar_core::id::IdGenerator;
use calendar_core::storage::EventStorage;
use tokio_util::sync::CancellationToken;

use crate::config::StorageKind;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Configured event storage backend.
    pub event_storage: Arc<dyn EventStorage>,
    /// Identifier generator for new events.
    pub id_generator: Arc<dyn IdGenerator>,
    /// Which backend `event_storage` is.
    pub storage_kind: StorageKind,
    /// Process-wide shutdown signal; each request works under a child token.
    pub shutdown: CancellationToken,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(
        event_storage: Arc<dyn EventStorage>,
        id_generator: Arc<dyn IdGenerator>,
        storage_kind: StorageKind,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            event_storage,
            id_generator,
            storage_kind,
            shutdown,
        }
    }

    /// Cancellation token for a single request.
    #[must_use]
    pub fn request_token(&self) -> CancellationToken {
        self.shutdown.child_token()
    }
}
