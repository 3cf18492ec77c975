//! Visibility Lifecycle
//!
//! Tracks whether a data instance is shown (has at least one data observer),
//! how long it has been hidden, and fires a hide timeout on the owner context.
//!
//! ## States
//!
//! ```text
//!            notify_shown                 notify_hidden
//!   Hidden ───────────────► Shown ───────────────────────► Hidden
//!     │                                                      │
//!     │ hide_timeout elapses while still hidden              │
//!     └──────────────────► on_hide_timeout() ◄───────────────┘
//!
//!   close() from any state ──► Closed (terminal)
//! ```

use crate::looper::{Looper, TimerHandle};
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::{Duration, Instant};

/// Callbacks for visibility transitions, invoked on the owner context
pub trait VisibilityListener {
    /// Became shown after being hidden for `hidden_for` (`Duration::MAX` on first show)
    fn on_shown(&self, hidden_for: Duration);

    /// Became hidden after being shown for `shown_for`
    fn on_hidden(&self, shown_for: Duration);

    /// Stayed hidden for the configured hide timeout
    fn on_hide_timeout(&self);
}

#[derive(Debug, Default)]
struct TrackerState {
    shown: bool,
    closed: bool,
    shown_at: Option<Instant>,
    hidden_at: Option<Instant>,
    timeout: Option<TimerHandle>,
    hide_timeout: Option<Duration>,
}

/// Shown/hidden bookkeeping for one data instance
#[derive(Clone)]
pub struct VisibilityTracker {
    looper: Looper,
    state: Rc<RefCell<TrackerState>>,
    listener: Weak<dyn VisibilityListener>,
}

impl VisibilityTracker {
    pub fn new(
        looper: Looper,
        hide_timeout: Option<Duration>,
        listener: Weak<dyn VisibilityListener>,
    ) -> Self {
        Self {
            looper,
            state: Rc::new(RefCell::new(TrackerState {
                hide_timeout,
                ..TrackerState::default()
            })),
            listener,
        }
    }

    pub fn is_shown(&self) -> bool {
        self.state.borrow().shown
    }

    pub fn is_closed(&self) -> bool {
        self.state.borrow().closed
    }

    /// Whether a hide timeout is currently armed
    pub fn has_pending_timeout(&self) -> bool {
        self.state.borrow().timeout.is_some()
    }

    pub fn hide_timeout(&self) -> Option<Duration> {
        self.state.borrow().hide_timeout
    }

    /// Applies to the next hide
    pub fn set_hide_timeout(&self, hide_timeout: Option<Duration>) {
        self.state.borrow_mut().hide_timeout = hide_timeout;
    }

    /// Transition to shown. No-op if already shown or closed.
    pub fn notify_shown(&self) {
        let now = self.looper.now();
        let hidden_for = {
            let mut state = self.state.borrow_mut();
            if state.shown || state.closed {
                return;
            }
            state.shown = true;
            state.shown_at = Some(now);
            if let Some(timeout) = state.timeout.take() {
                timeout.cancel();
            }
            state
                .hidden_at
                .map_or(Duration::MAX, |at| now.saturating_duration_since(at))
        };

        tracing::debug!("Shown after being hidden for {:?}", hidden_for);
        if let Some(listener) = self.listener.upgrade() {
            listener.on_shown(hidden_for);
        }
    }

    /// Transition to hidden. No-op if already hidden or closed.
    pub fn notify_hidden(&self) {
        let now = self.looper.now();
        let (shown_for, hide_timeout) = {
            let mut state = self.state.borrow_mut();
            if !state.shown || state.closed {
                return;
            }
            state.shown = false;
            state.hidden_at = Some(now);
            let shown_for = state
                .shown_at
                .map_or(Duration::ZERO, |at| now.saturating_duration_since(at));
            (shown_for, state.hide_timeout)
        };

        if let Some(delay) = hide_timeout {
            let handle = self.schedule_timeout(delay);
            self.state.borrow_mut().timeout = Some(handle);
        }

        tracing::debug!("Hidden after being shown for {:?}", shown_for);
        if let Some(listener) = self.listener.upgrade() {
            listener.on_hidden(shown_for);
        }
    }

    /// Terminal. Cancels any pending hide timeout.
    pub fn close(&self) {
        let timeout = {
            let mut state = self.state.borrow_mut();
            if state.closed {
                return;
            }
            state.closed = true;
            state.shown = false;
            state.timeout.take()
        };
        if let Some(timeout) = timeout {
            timeout.cancel();
        }
    }

    fn schedule_timeout(&self, delay: Duration) -> TimerHandle {
        let state = Rc::downgrade(&self.state);
        let listener = self.listener.clone();
        self.looper.post_delayed(delay, move || {
            let Some(state) = state.upgrade() else {
                return;
            };
            {
                let mut state = state.borrow_mut();
                state.timeout = None;
                if state.shown || state.closed {
                    return;
                }
            }
            tracing::debug!("Hide timeout of {:?} elapsed", delay);
            if let Some(listener) = listener.upgrade() {
                listener.on_hide_timeout();
            }
        })
    }
}

impl std::fmt::Debug for VisibilityTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("VisibilityTracker")
            .field("shown", &state.shown)
            .field("closed", &state.closed)
            .field("hide_timeout", &state.hide_timeout)
            .finish()
    }
}
