//! Subscription forwarding for data wrappers.
//!
//! A wrapper only subscribes to its inner data while it has observers of the
//! same kind itself. Each kind is counted separately.

use crate::data::{ObserverHooks, ObserverKind, Observable};
use crate::error::Error;
use crate::observers::{
    Available, AvailableObserver, ChangeEvent, DataObserver, ErrorObserver, LoadingObserver,
};
use std::cell::Cell;
use std::rc::{Rc, Weak};

/// Receives notifications forwarded from the inner data.
///
/// Defaults republish unchanged through the wrapper's own hub.
pub(crate) trait Relay: ObserverHooks {
    fn relay_change(&self, event: ChangeEvent) {
        self.hub().notify_change(event);
    }

    fn relay_loading(&self, loading: bool) {
        self.hub().notify_loading(loading);
    }

    fn relay_available(&self, available: Available) {
        self.hub().notify_available(available);
    }

    fn relay_error(&self, error: &Error) {
        self.hub().notify_error(error);
    }
}

/// What a `sync` call did to the inner subscription
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Subscription {
    Started,
    Stopped,
    Unchanged,
}

pub(crate) struct Forwarding {
    inner: Rc<dyn Observable>,
    data: Rc<dyn DataObserver>,
    loading: Rc<dyn LoadingObserver>,
    available: Rc<dyn AvailableObserver>,
    error: Rc<dyn ErrorObserver>,
    forwarding: [Cell<bool>; 4],
}

impl Forwarding {
    /// Build forwarding observers that deliver to `owner` for as long as it lives
    pub fn new<W: Relay + 'static>(inner: Rc<dyn Observable>, owner: &Weak<W>) -> Self {
        let data = {
            let owner = owner.clone();
            Rc::new(move |event: ChangeEvent| {
                if let Some(owner) = owner.upgrade() {
                    owner.relay_change(event);
                }
            })
        };
        let loading = {
            let owner = owner.clone();
            Rc::new(move |loading: bool| {
                if let Some(owner) = owner.upgrade() {
                    owner.relay_loading(loading);
                }
            })
        };
        let available = {
            let owner = owner.clone();
            Rc::new(move |available: Available| {
                if let Some(owner) = owner.upgrade() {
                    owner.relay_available(available);
                }
            })
        };
        let error = {
            let owner = owner.clone();
            Rc::new(move |error: &Error| {
                if let Some(owner) = owner.upgrade() {
                    owner.relay_error(error);
                }
            })
        };

        Self {
            inner,
            data,
            loading,
            available,
            error,
            forwarding: Default::default(),
        }
    }

    pub fn is_forwarding(&self, kind: ObserverKind) -> bool {
        self.slot(kind).get()
    }

    /// Subscribe to or unsubscribe from the inner data so that it matches `count`
    pub fn sync(&self, kind: ObserverKind, count: usize) -> Subscription {
        let slot = self.slot(kind);
        let wanted = count > 0;
        if slot.get() == wanted {
            return Subscription::Unchanged;
        }
        slot.set(wanted);

        match (kind, wanted) {
            (ObserverKind::Data, true) => self.inner.register_data_observer(self.data.clone()),
            (ObserverKind::Data, false) => self.inner.unregister_data_observer(&self.data),
            (ObserverKind::Loading, true) => {
                self.inner.register_loading_observer(self.loading.clone())
            }
            (ObserverKind::Loading, false) => self.inner.unregister_loading_observer(&self.loading),
            (ObserverKind::Available, true) => {
                self.inner.register_available_observer(self.available.clone())
            }
            (ObserverKind::Available, false) => {
                self.inner.unregister_available_observer(&self.available)
            }
            (ObserverKind::Error, true) => self.inner.register_error_observer(self.error.clone()),
            (ObserverKind::Error, false) => self.inner.unregister_error_observer(&self.error),
        }

        tracing::trace!(
            "{:?} forwarding {}",
            kind,
            if wanted { "started" } else { "stopped" }
        );
        if wanted {
            Subscription::Started
        } else {
            Subscription::Stopped
        }
    }

    fn slot(&self, kind: ObserverKind) -> &Cell<bool> {
        let index = match kind {
            ObserverKind::Data => 0,
            ObserverKind::Loading => 1,
            ObserverKind::Available => 2,
            ObserverKind::Error => 3,
        };
        &self.forwarding[index]
    }
}

impl std::fmt::Debug for Forwarding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Forwarding")
            .field("data", &self.is_forwarding(ObserverKind::Data))
            .field("loading", &self.is_forwarding(ObserverKind::Loading))
            .field("available", &self.is_forwarding(ObserverKind::Available))
            .field("error", &self.is_forwarding(ObserverKind::Error))
            .finish()
    }
}
