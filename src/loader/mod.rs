//! Incremental Data
//!
//! A data source whose elements are produced in increments by a background
//! worker. Loading is driven by visibility: the worker starts when the data
//! becomes shown and dirty, pauses between increments until something asks
//! for more, and is released after a hide timeout.
//!
//! ## State Machine
//!
//! ```text
//!            start (shown + dirty)          increment delivered
//!   Idle ─────────────────────────► Running ───────────────────► AwaitingResume
//!                                     ▲                                │
//!                                     └──── proceed / look-ahead ──────┤
//!                                                                      │ remaining == 0
//!   stop (invalidate, refresh, hide timeout, close) ──► Stopped        ▼
//!                                                                  Exhausted
//! ```
//!
//! Worker results are marshaled through a [`Mailbox`] and applied on the
//! owner context, so the element list needs no locking.

mod increment;
pub mod runtime;
mod worker;

pub use increment::*;
pub use runtime::FutureLoader;

use crate::config::LoaderConfig;
use crate::data::{DataSource, Elements, Intent, Loadable, ObserverHooks, ObserverKind};
use crate::error::Result;
use crate::lifecycle::{VisibilityListener, VisibilityTracker};
use crate::looper::{Looper, Mailbox};
use crate::observers::{Available, ObserverHub};
use parking_lot::Mutex;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use std::sync::Arc;
use std::time::Duration;
use worker::{SharedLoader, Worker, WorkerEvent, WorkerMessage};

/// Where the loader is in its cycle
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum LoaderState {
    /// No worker has run since the contents became dirty
    #[default]
    Idle,
    /// An increment is being loaded
    Running,
    /// Waiting for a proceed signal before loading the next increment
    AwaitingResume,
    /// The loader reported no more data
    Exhausted,
    /// The worker was stopped before running out of data
    Stopped,
}

#[derive(Debug)]
struct LoadState {
    loading: bool,
    available: Available,
    dirty: bool,
    errored: bool,
    phase: LoaderState,
    worker: Option<Worker>,
    runs: u64,
}

impl Default for LoadState {
    fn default() -> Self {
        Self {
            loading: false,
            available: Available::Indeterminate,
            dirty: true,
            errored: false,
            phase: LoaderState::Idle,
            worker: None,
            runs: 0,
        }
    }
}

/// Data loaded in increments by a background worker
pub struct IncrementalData<T: Send + 'static> {
    looper: Looper,
    hub: ObserverHub,
    elements: Elements<T>,
    loader: SharedLoader<T>,
    state: RefCell<LoadState>,
    tracker: VisibilityTracker,
    mailbox: Mailbox<WorkerMessage<T>>,
    look_ahead_row_count: Cell<i32>,
    auto_invalidate_delay: Cell<Option<Duration>>,
}

impl<T: Clone + Send + 'static> IncrementalData<T> {
    /// Create with the default configuration
    pub fn new(looper: &Looper, loader: impl IncrementalLoader<T> + 'static) -> Rc<Self> {
        Self::build(looper, LoaderConfig::default(), Box::new(loader))
    }

    /// Data loaded in one piece by `load`, like a plain array fetched in the background.
    ///
    /// Shares the visibility lifecycle: loads when first shown and again after
    /// an invalidate, refresh or hide timeout.
    pub fn load_all(
        looper: &Looper,
        mut load: impl FnMut() -> Result<Vec<T>> + Send + 'static,
    ) -> Rc<Self> {
        Self::new(
            looper,
            FnLoader(move |_: &LoadContext| load().map(|elements| Some(Increment::last(elements)))),
        )
    }

    pub fn with_config(
        looper: &Looper,
        config: LoaderConfig,
        loader: impl IncrementalLoader<T> + 'static,
    ) -> Result<Rc<Self>> {
        config.validate()?;
        Ok(Self::build(looper, config, Box::new(loader)))
    }

    fn build(
        looper: &Looper,
        config: LoaderConfig,
        loader: Box<dyn IncrementalLoader<T>>,
    ) -> Rc<Self> {
        Rc::new_cyclic(|weak: &Weak<Self>| {
            let mailbox = {
                let weak = weak.clone();
                looper.mailbox(move |message: WorkerMessage<T>| {
                    if let Some(data) = weak.upgrade() {
                        data.on_worker_message(message);
                    }
                })
            };
            let listener: Weak<dyn VisibilityListener> = weak.clone();

            Self {
                looper: looper.clone(),
                hub: ObserverHub::new(),
                elements: Elements::new(Vec::new()),
                loader: Arc::new(Mutex::new(loader)),
                state: RefCell::new(LoadState::default()),
                tracker: VisibilityTracker::new(looper.clone(), config.hide_timeout, listener),
                mailbox,
                look_ahead_row_count: Cell::new(config.look_ahead_row_count),
                auto_invalidate_delay: Cell::new(config.auto_invalidate_delay),
            }
        })
    }

    pub fn config(&self) -> LoaderConfig {
        LoaderConfig {
            look_ahead_row_count: self.look_ahead_row_count.get(),
            auto_invalidate_delay: self.auto_invalidate_delay.get(),
            hide_timeout: self.tracker.hide_timeout(),
        }
    }

    /// Negative disables look-ahead loading
    pub fn set_look_ahead_row_count(&self, rows: i32) {
        self.look_ahead_row_count.set(rows);
    }

    pub fn set_auto_invalidate_delay(&self, delay: Option<Duration>) {
        self.auto_invalidate_delay.set(delay);
    }

    /// Takes effect from the next hide
    pub fn set_hide_timeout(&self, timeout: Option<Duration>) {
        self.tracker.set_hide_timeout(timeout);
    }

    pub fn loader_state(&self) -> LoaderState {
        self.state.borrow().phase
    }

    pub fn is_shown(&self) -> bool {
        self.tracker.is_shown()
    }

    pub fn is_closed(&self) -> bool {
        self.tracker.is_closed()
    }

    pub fn is_dirty(&self) -> bool {
        self.state.borrow().dirty
    }

    /// Whether the last increment failed and has not been retried
    pub fn has_error(&self) -> bool {
        self.state.borrow().errored
    }

    /// Ask the worker for the next increment
    pub fn load_next(&self) {
        self.proceed();
    }

    /// Remove all elements and mark the contents dirty
    pub fn clear(&self) {
        self.elements.clear(&self.hub);
        self.state.borrow_mut().dirty = true;
    }

    /// Stop loading and release the contents. Terminal.
    pub fn close(&self) {
        if self.tracker.is_closed() {
            return;
        }
        tracing::debug!("Closing incremental data");
        self.tracker.close();
        self.stop_worker();
        self.elements.clear(&self.hub);
        self.looper.close_mailbox(&self.mailbox);
    }

    pub fn push(&self, element: T) {
        self.elements.push(&self.hub, element);
    }

    pub fn extend(&self, elements: impl IntoIterator<Item = T>) {
        self.elements
            .extend(&self.hub, elements.into_iter().collect());
    }

    pub fn insert(&self, index: usize, element: T) -> Result<()> {
        self.elements.insert_all(&self.hub, index, vec![element])
    }

    pub fn insert_all(&self, index: usize, elements: impl IntoIterator<Item = T>) -> Result<()> {
        self.elements
            .insert_all(&self.hub, index, elements.into_iter().collect())
    }

    pub fn set(&self, index: usize, element: T) -> Result<T> {
        self.elements.set(&self.hub, index, element)
    }

    pub fn remove(&self, index: usize) -> Result<T> {
        let mut removed = self.elements.remove_range(&self.hub, index, 1)?;
        Ok(removed.remove(0))
    }

    pub fn remove_range(&self, start: usize, count: usize) -> Result<Vec<T>> {
        self.elements.remove_range(&self.hub, start, count)
    }

    pub fn move_range(&self, from: usize, to: usize, count: usize) -> Result<()> {
        self.elements.move_range(&self.hub, from, to, count)
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.elements.to_vec()
    }

    fn proceed(&self) {
        let mut state = self.state.borrow_mut();
        state.errored = false;
        if let Some(worker) = &state.worker {
            worker.proceed();
        }
    }

    fn start_if_needed(&self) {
        if self.tracker.is_shown() {
            self.start_worker();
        }
    }

    fn start_worker(&self) {
        if self.tracker.is_closed() {
            return;
        }
        let run = {
            let mut state = self.state.borrow_mut();
            if !state.dirty || state.worker.is_some() {
                return;
            }
            state.runs += 1;
            state.runs
        };

        match Worker::spawn(run, self.loader.clone(), self.mailbox.clone()) {
            Ok(worker) => {
                {
                    let mut state = self.state.borrow_mut();
                    state.dirty = false;
                    state.worker = Some(worker);
                    state.phase = LoaderState::Running;
                }
                self.set_loading(true);
            }
            Err(e) => {
                tracing::error!("Could not start loader: {}", e);
                self.hub.notify_error(&e);
            }
        }
    }

    fn stop_worker(&self) {
        let worker = {
            let mut state = self.state.borrow_mut();
            let worker = state.worker.take();
            if worker.is_some() {
                state.phase = LoaderState::Stopped;
            }
            worker
        };
        if let Some(worker) = worker {
            worker.interrupt();
            self.set_loading(false);
        }
    }

    fn on_worker_message(&self, message: WorkerMessage<T>) {
        let current = self.state.borrow().worker.as_ref().map(|worker| worker.run);
        if current != Some(message.run) {
            tracing::trace!("Discarding message from stopped worker {}", message.run);
            return;
        }

        match message.event {
            WorkerEvent::Loading(loading) => {
                self.state.borrow_mut().phase = if loading {
                    LoaderState::Running
                } else {
                    LoaderState::AwaitingResume
                };
                self.set_loading(loading);
            }
            WorkerEvent::Available(available) => self.set_available(available),
            WorkerEvent::Batch {
                overwrite: true,
                elements,
            } => self.elements.overwrite(&self.hub, elements),
            WorkerEvent::Batch {
                overwrite: false,
                elements,
            } => self.elements.extend(&self.hub, elements),
            WorkerEvent::Failed(e) => {
                {
                    let mut state = self.state.borrow_mut();
                    state.errored = true;
                    state.phase = LoaderState::AwaitingResume;
                }
                self.hub.notify_error(&e);
            }
            WorkerEvent::Finished => {
                let mut state = self.state.borrow_mut();
                state.worker = None;
                state.phase = LoaderState::Exhausted;
                tracing::trace!("Worker {} exhausted", message.run);
            }
        }
    }

    fn set_loading(&self, loading: bool) {
        let previous = std::mem::replace(&mut self.state.borrow_mut().loading, loading);
        if previous != loading {
            self.hub.notify_loading(loading);
        }
    }

    fn set_available(&self, available: Available) {
        let previous = std::mem::replace(&mut self.state.borrow_mut().available, available);
        if previous != available {
            self.hub.notify_available(available);
        }
    }
}

impl<T: Clone + Send + 'static> DataSource<T> for IncrementalData<T> {
    fn get_with(&self, position: usize, intent: Intent) -> Result<T> {
        if intent == Intent::Presentation {
            if let Ok(look_ahead) = usize::try_from(self.look_ahead_row_count.get()) {
                if position.saturating_add(1).saturating_add(look_ahead) >= self.size() {
                    self.proceed();
                }
            }
        }
        self.elements.get(position)
    }

    fn size(&self) -> usize {
        self.elements.len()
    }
}

impl<T: Clone + Send + 'static> Loadable for IncrementalData<T> {
    fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    fn available(&self) -> Available {
        self.state.borrow().available
    }

    /// Contents stay visible; a worker in progress stops and the next show reloads
    fn invalidate(&self) {
        if self.tracker.is_closed() {
            return;
        }
        self.state.borrow_mut().dirty = true;
        if self.tracker.is_shown() {
            self.stop_worker();
        }
    }

    /// Restart loading now, whether shown or not
    fn refresh(&self) {
        if self.tracker.is_closed() {
            return;
        }
        self.state.borrow_mut().dirty = true;
        self.set_available(Available::Indeterminate);
        self.stop_worker();
        self.start_worker();
    }

    fn reload(&self) {
        if self.tracker.is_closed() {
            return;
        }
        self.clear();
        self.refresh();
    }
}

impl<T: Clone + Send + 'static> ObserverHooks for IncrementalData<T> {
    fn hub(&self) -> &ObserverHub {
        &self.hub
    }

    fn on_observers_changed(&self, kind: ObserverKind, count: usize) {
        if kind != ObserverKind::Data {
            return;
        }
        if count > 0 {
            self.tracker.notify_shown();
        } else {
            self.tracker.notify_hidden();
        }
    }
}

impl<T: Clone + Send + 'static> VisibilityListener for IncrementalData<T> {
    fn on_shown(&self, hidden_for: Duration) {
        if self.state.borrow().errored {
            self.proceed();
        }
        if let Some(delay) = self.auto_invalidate_delay.get() {
            if hidden_for >= delay {
                tracing::trace!("Hidden for {:?}, invalidating", hidden_for);
                self.state.borrow_mut().dirty = true;
            }
        }
        if self.state.borrow().dirty {
            self.stop_worker();
            self.elements.clear(&self.hub);
        }
        self.start_if_needed();
    }

    fn on_hidden(&self, shown_for: Duration) {
        tracing::trace!("Hidden after {:?}", shown_for);
    }

    fn on_hide_timeout(&self) {
        tracing::trace!("Hide timeout elapsed; clearing and stopping worker");
        self.elements.clear(&self.hub);
        self.stop_worker();
        self.state.borrow_mut().dirty = true;
    }
}

impl<T: Send + 'static> Drop for IncrementalData<T> {
    fn drop(&mut self) {
        if let Some(worker) = self.state.get_mut().worker.take() {
            worker.interrupt();
        }
        self.looper.close_mailbox(&self.mailbox);
    }
}

impl<T: Send + 'static> std::fmt::Debug for IncrementalData<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("IncrementalData")
            .field("size", &self.elements.len())
            .field("loading", &state.loading)
            .field("available", &state.available)
            .field("dirty", &state.dirty)
            .field("phase", &state.phase)
            .field("tracker", &self.tracker)
            .finish()
    }
}
