//! Owner Context
//!
//! A single-threaded task queue. All observer dispatch and state mutation
//! happens on the thread that owns the `Looper`; background workers reach it
//! only through a [`Mailbox`].
//!
//! ## Pattern
//!
//! ```text
//! worker thread                      owner thread
//!      │                                  │
//!      │ mailbox.post(msg) ──channel──►  run_pending()
//!      │                                  │
//!      │                                  ▼
//!      │                            handler(msg)  ──► observers
//! ```

mod clock;
mod mailbox;
mod timer;

pub use clock::*;
pub use mailbox::Mailbox;

use crate::constants::{LOOPER_BATCH_SIZE, LOOPER_POLL_INTERVAL_MS};
use ahash::AHashMap;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use mailbox::Envelope;
use std::any::Any;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use std::time::{Duration, Instant};
use timer::{TimerQueue, TimerTask};

type Handler = Rc<dyn Fn(Box<dyn Any + Send>)>;

struct LooperInner {
    clock: Rc<dyn Clock>,
    tx: Sender<Envelope>,
    rx: Receiver<Envelope>,
    handlers: RefCell<AHashMap<u64, Handler>>,
    timers: RefCell<TimerQueue>,
    next_id: Cell<u64>,
}

impl LooperInner {
    fn next_id(&self) -> u64 {
        let id = self.next_id.get().wrapping_add(1);
        self.next_id.set(id);
        id
    }
}

/// Serialized task queue for the owner thread
#[derive(Clone)]
pub struct Looper {
    inner: Rc<LooperInner>,
}

impl Looper {
    /// Create a looper driven by the system clock
    pub fn new() -> Self {
        Self::with_clock(Rc::new(SystemClock))
    }

    /// Create a looper driven by a custom clock
    pub fn with_clock(clock: Rc<dyn Clock>) -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        Self {
            inner: Rc::new(LooperInner {
                clock,
                tx,
                rx,
                handlers: RefCell::new(AHashMap::new()),
                timers: RefCell::new(TimerQueue::default()),
                next_id: Cell::new(0),
            }),
        }
    }

    /// Current time according to this looper's clock
    pub fn now(&self) -> Instant {
        self.inner.clock.now()
    }

    /// Register a handler and return the endpoint that feeds it
    pub fn mailbox<M, F>(&self, handler: F) -> Mailbox<M>
    where
        M: Send + 'static,
        F: Fn(M) + 'static,
    {
        let slot = self.inner.next_id();
        let handler: Handler = Rc::new(move |payload: Box<dyn Any + Send>| {
            match payload.downcast::<M>() {
                Ok(message) => handler(*message),
                Err(_) => tracing::warn!("Mailbox {} received a message of the wrong type", slot),
            }
        });
        self.inner.handlers.borrow_mut().insert(slot, handler);
        Mailbox::new(slot, self.inner.tx.clone())
    }

    /// Detach a mailbox's handler; messages still queued for it are dropped
    pub fn close_mailbox<M: Send + 'static>(&self, mailbox: &Mailbox<M>) {
        self.inner.handlers.borrow_mut().remove(&mailbox.slot());
    }

    /// Run `task` on this context after `delay`
    pub fn post_delayed(&self, delay: Duration, task: impl FnOnce() + 'static) -> TimerHandle {
        let id = self.inner.next_id();
        let deadline = self.now() + delay;
        self.inner
            .timers
            .borrow_mut()
            .schedule(id, deadline, Box::new(task));
        tracing::debug!("Scheduled timer {} in {:?}", id, delay);
        TimerHandle {
            id,
            looper: Rc::downgrade(&self.inner),
        }
    }

    /// Number of timers that are scheduled and not cancelled
    pub fn pending_timers(&self) -> usize {
        self.inner.timers.borrow().len()
    }

    /// Run every queued message and every due timer. Returns the number of tasks run.
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        loop {
            let mut progressed = false;

            for _ in 0..LOOPER_BATCH_SIZE {
                match self.inner.rx.try_recv() {
                    Ok(envelope) => {
                        self.dispatch(envelope);
                        ran += 1;
                        progressed = true;
                    }
                    Err(_) => break,
                }
            }

            while let Some(task) = self.pop_due_timer() {
                task();
                ran += 1;
                progressed = true;
            }

            if !progressed {
                return ran;
            }
        }
    }

    /// Pump until `predicate` holds or `timeout` of wall-clock time elapses
    pub fn run_until(&self, mut predicate: impl FnMut() -> bool, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            self.run_pending();
            if predicate() {
                return true;
            }

            let now = Instant::now();
            if now >= deadline {
                return false;
            }

            let mut wait = (deadline - now).min(Duration::from_millis(LOOPER_POLL_INTERVAL_MS));
            if let Some(next) = self.inner.timers.borrow_mut().next_deadline() {
                wait = wait.min(next.saturating_duration_since(self.now()));
            }

            match self.inner.rx.recv_timeout(wait) {
                Ok(envelope) => self.dispatch(envelope),
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {}
            }
        }
    }

    fn dispatch(&self, envelope: Envelope) {
        let handler = self.inner.handlers.borrow().get(&envelope.slot).cloned();
        match handler {
            Some(handler) => handler(envelope.payload),
            None => tracing::trace!("Dropping message for closed mailbox {}", envelope.slot),
        }
    }

    fn pop_due_timer(&self) -> Option<TimerTask> {
        let now = self.now();
        self.inner.timers.borrow_mut().pop_due(now)
    }
}

impl Default for Looper {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Looper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Looper")
            .field("handlers", &self.inner.handlers.borrow().len())
            .field("timers", &self.pending_timers())
            .finish()
    }
}

/// Cancels a scheduled timer
#[derive(Debug)]
pub struct TimerHandle {
    id: u64,
    looper: Weak<LooperInner>,
}

impl TimerHandle {
    /// Cancel the timer. Returns `false` if it already fired or was cancelled.
    pub fn cancel(&self) -> bool {
        match self.looper.upgrade() {
            Some(inner) => {
                let cancelled = inner.timers.borrow_mut().cancel(self.id);
                if cancelled {
                    tracing::debug!("Cancelled timer {}", self.id);
                }
                cancelled
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_mailbox_delivers_in_order() {
        let looper = Looper::new();
        let received = Rc::new(RefCell::new(Vec::new()));
        let sink = received.clone();
        let mailbox = looper.mailbox(move |n: u32| sink.borrow_mut().push(n));

        let worker_mailbox = mailbox.clone();
        std::thread::spawn(move || {
            for n in 0..5 {
                worker_mailbox.post(n);
            }
        })
        .join()
        .expect("join");

        assert_eq!(looper.run_pending(), 5);
        assert_eq!(*received.borrow(), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_closed_mailbox_drops_messages() {
        let looper = Looper::new();
        let hits = Rc::new(Cell::new(0));
        let counter = hits.clone();
        let mailbox = looper.mailbox(move |_: ()| counter.set(counter.get() + 1));

        mailbox.post(());
        looper.close_mailbox(&mailbox);
        looper.run_pending();
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn test_timer_fires_when_due() {
        let clock = Rc::new(ManualClock::new());
        let looper = Looper::with_clock(clock.clone());
        let fired = Rc::new(Cell::new(false));
        let flag = fired.clone();
        looper.post_delayed(Duration::from_secs(10), move || flag.set(true));

        looper.run_pending();
        assert!(!fired.get());

        clock.advance(Duration::from_secs(10));
        looper.run_pending();
        assert!(fired.get());
        assert_eq!(looper.pending_timers(), 0);
    }

    #[test]
    fn test_cancelled_timer_never_fires() {
        let clock = Rc::new(ManualClock::new());
        let looper = Looper::with_clock(clock.clone());
        let fired = Rc::new(Cell::new(false));
        let flag = fired.clone();
        let handle = looper.post_delayed(Duration::from_millis(5), move || flag.set(true));

        assert!(handle.cancel());
        assert!(!handle.cancel());
        clock.advance(Duration::from_secs(1));
        looper.run_pending();
        assert!(!fired.get());
    }

    #[test]
    fn test_run_until_waits_for_worker() {
        let looper = Looper::new();
        let done = Rc::new(Cell::new(false));
        let flag = done.clone();
        let mailbox = looper.mailbox(move |_: ()| flag.set(true));

        let started = Arc::new(AtomicBool::new(false));
        let started_worker = started.clone();
        std::thread::spawn(move || {
            started_worker.store(true, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(20));
            mailbox.post(());
        });

        assert!(looper.run_until(|| done.get(), Duration::from_secs(5)));
        assert!(started.load(Ordering::SeqCst));
    }
}
