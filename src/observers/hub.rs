//! Observer Hub
//!
//! The four registries every data instance carries, with dispatch helpers.

use crate::error::Error;
use crate::observers::{
    Available, AvailableObserver, ChangeEvent, DataObserver, ErrorObserver, LoadingObserver,
    Observers,
};

/// Registries for data, loading, available and error observers
#[derive(Debug, Default)]
pub struct ObserverHub {
    pub data: Observers<dyn DataObserver>,
    pub loading: Observers<dyn LoadingObserver>,
    pub available: Observers<dyn AvailableObserver>,
    pub error: Observers<dyn ErrorObserver>,
}

impl ObserverHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dispatch a change; empty ranges are dropped
    pub fn notify_change(&self, event: ChangeEvent) {
        if event.is_empty() {
            return;
        }
        self.data.for_each(|o| o.on_change(event));
    }

    pub fn notify_loading(&self, loading: bool) {
        self.loading.for_each(|o| o.on_loading_change(loading));
    }

    pub fn notify_available(&self, available: Available) {
        self.available.for_each(|o| o.on_available_change(available));
    }

    pub fn notify_error(&self, error: &Error) {
        self.error.for_each(|o| o.on_error(error));
    }
}
