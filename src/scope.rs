//! Ambient selection state borrowed by the selector store.
//!
//! The store never owns the currently selected service or the current time
//! range; it reads them through these traits at call time. The `Shared*`
//! implementations are what the application wires in, and the only writers
//! live on them, outside the store.

use std::sync::{PoisonError, RwLock};

use crate::duration::Duration;
use crate::model::SelectedService;

/// Read-only access to the currently selected service, if any.
pub trait ScopeHolder: Send + Sync {
    fn current_service(&self) -> Option<SelectedService>;
}

/// Read-only access to the currently selected time range.
pub trait DurationHolder: Send + Sync {
    fn duration_time(&self) -> Duration;
}

/// In-process scope holder for the current service selection.
#[derive(Debug, Default)]
pub struct SharedScope {
    current: RwLock<Option<SelectedService>>,
}

impl SharedScope {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a user selection.
    pub fn select(&self, service: SelectedService) {
        *self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(service);
    }

    /// Drop the current selection.
    pub fn clear(&self) {
        *self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }
}

impl ScopeHolder for SharedScope {
    fn current_service(&self) -> Option<SelectedService> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// In-process holder for the current query time range.
#[derive(Debug)]
pub struct SharedDuration {
    current: RwLock<Duration>,
}

impl SharedDuration {
    #[must_use]
    pub fn new(duration: Duration) -> Self {
        Self {
            current: RwLock::new(duration),
        }
    }

    /// Replace the current time range.
    pub fn set(&self, duration: Duration) {
        *self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner) = duration;
    }
}

impl Default for SharedDuration {
    fn default() -> Self {
        Self::new(Duration::default())
    }
}

impl DurationHolder for SharedDuration {
    fn duration_time(&self) -> Duration {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
