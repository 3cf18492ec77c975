//! Recording Observer
//!
//! An observer of every kind that keeps what it receives. Handy for debugging
//! a pipeline of views and for asserting on notification sequences.

use crate::error::Error;
use crate::observers::{
    Available, AvailableObserver, ChangeEvent, DataObserver, ErrorObserver, LoadingObserver,
};
use std::cell::RefCell;
use std::rc::Rc;

/// One received notification
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notification {
    Change(ChangeEvent),
    Loading(bool),
    Available(Available),
    Error(String),
}

/// Records notifications in arrival order
#[derive(Debug, Default)]
pub struct Recorder {
    received: RefCell<Vec<Notification>>,
}

impl Recorder {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Everything received so far, in order
    pub fn notifications(&self) -> Vec<Notification> {
        self.received.borrow().clone()
    }

    /// Drain everything received so far
    pub fn take(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.received.borrow_mut())
    }

    pub fn clear(&self) {
        self.received.borrow_mut().clear();
    }

    pub fn changes(&self) -> Vec<ChangeEvent> {
        self.received
            .borrow()
            .iter()
            .filter_map(|n| match n {
                Notification::Change(event) => Some(*event),
                _ => None,
            })
            .collect()
    }

    pub fn loading(&self) -> Vec<bool> {
        self.received
            .borrow()
            .iter()
            .filter_map(|n| match n {
                Notification::Loading(loading) => Some(*loading),
                _ => None,
            })
            .collect()
    }

    pub fn available(&self) -> Vec<Available> {
        self.received
            .borrow()
            .iter()
            .filter_map(|n| match n {
                Notification::Available(available) => Some(*available),
                _ => None,
            })
            .collect()
    }

    pub fn errors(&self) -> Vec<String> {
        self.received
            .borrow()
            .iter()
            .filter_map(|n| match n {
                Notification::Error(message) => Some(message.clone()),
                _ => None,
            })
            .collect()
    }

    /// Replay the recorded changes against `initial` size.
    ///
    /// Returns `None` as soon as an event falls outside the running size, or
    /// on a full change.
    pub fn shadow_size(&self, initial: usize) -> Option<usize> {
        self.changes()
            .iter()
            .try_fold(initial, |size, event| event.apply_to_size(size))
    }

    fn push(&self, notification: Notification) {
        self.received.borrow_mut().push(notification);
    }
}

impl DataObserver for Recorder {
    fn on_change(&self, event: ChangeEvent) {
        self.push(Notification::Change(event));
    }
}

impl LoadingObserver for Recorder {
    fn on_loading_change(&self, loading: bool) {
        self.push(Notification::Loading(loading));
    }
}

impl AvailableObserver for Recorder {
    fn on_available_change(&self, available: Available) {
        self.push(Notification::Available(available));
    }
}

impl ErrorObserver for Recorder {
    fn on_error(&self, error: &Error) {
        self.push(Notification::Error(error.to_string()));
    }
}
