//! Observers
//!
//! Callback contracts consumed by presentation layers, the copy-on-write
//! registry that multicasts to them, and the change-event vocabulary.
//!
//! ## Dispatch
//!
//! ```text
//! source mutation ──► ObserverHub::notify_change(event)
//!                          │ snapshot of registered observers
//!                          ▼
//!                   DataObserver::on_change(event)  (owner thread only)
//! ```

mod events;
mod hub;
mod recorder;
mod registry;

pub use events::*;
pub use hub::*;
pub use recorder::*;
pub use registry::*;

use crate::error::Error;

/// Receives structured change notifications
pub trait DataObserver {
    fn on_change(&self, event: ChangeEvent);
}

/// Receives loading flag changes
pub trait LoadingObserver {
    fn on_loading_change(&self, loading: bool);
}

/// Receives available count changes
pub trait AvailableObserver {
    fn on_available_change(&self, available: Available);
}

/// Receives load failures
pub trait ErrorObserver {
    fn on_error(&self, error: &Error);
}

impl<F: Fn(ChangeEvent)> DataObserver for F {
    fn on_change(&self, event: ChangeEvent) {
        self(event)
    }
}

impl<F: Fn(bool)> LoadingObserver for F {
    fn on_loading_change(&self, loading: bool) {
        self(loading)
    }
}

impl<F: Fn(Available)> AvailableObserver for F {
    fn on_available_change(&self, available: Available) {
        self(available)
    }
}

impl<F: Fn(&Error)> ErrorObserver for F {
    fn on_error(&self, error: &Error) {
        self(error)
    }
}
