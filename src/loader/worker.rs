//! Loader Worker
//!
//! The background side of an incremental data instance. One thread per run,
//! blocked on a [`Gate`] between increments; results travel back to the
//! owner context through a [`Mailbox`].
//!
//! ## Loop
//!
//! ```text
//! ┌──► Loading(true) ──► load() ──► Available + Batch ──► Loading(false)
//! │                          │ Err                            │
//! │                          └──► Failed ─────────────────────┤
//! │                                                           ▼
//! └───────────── gate.block() ◄──── more? ─── no ──► Finished (exit)
//!                    │ interrupted
//!                    ▼
//!                  exit
//! ```

use crate::constants::WORKER_THREAD_NAME;
use crate::error::{Error, Result};
use crate::loader::{IncrementalLoader, LoadContext};
use crate::looper::Mailbox;
use crate::observers::Available;
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use tokio::sync::Notify;

/// Cancellation flag observable from blocking and async code
#[derive(Debug, Default)]
pub(crate) struct Interrupt {
    raised: AtomicBool,
    notify: Notify,
}

impl Interrupt {
    pub fn raise(&self) {
        self.raised.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    pub fn is_raised(&self) -> bool {
        self.raised.load(Ordering::SeqCst)
    }

    pub async fn wait(&self) {
        loop {
            let notified = self.notify.notified();
            if self.is_raised() {
                return;
            }
            notified.await;
        }
    }
}

/// Blocks the worker between increments until told to proceed or stop.
///
/// A proceed issued while the worker is busy is latched, so it is not lost.
#[derive(Debug, Default)]
pub(crate) struct Gate {
    proceed: Mutex<bool>,
    condvar: Condvar,
    interrupt: Arc<Interrupt>,
}

impl Gate {
    pub fn proceed(&self) {
        let mut proceed = self.proceed.lock();
        *proceed = true;
        self.condvar.notify_one();
    }

    pub fn interrupt(&self) {
        self.interrupt.raise();
        let _guard = self.proceed.lock();
        self.condvar.notify_all();
    }

    pub fn is_interrupted(&self) -> bool {
        self.interrupt.is_raised()
    }

    pub fn interrupt_handle(&self) -> Arc<Interrupt> {
        self.interrupt.clone()
    }

    /// Wait for a proceed. Fails with [`Error::Interrupted`] once interrupted.
    pub fn block(&self) -> Result<()> {
        let mut proceed = self.proceed.lock();
        loop {
            if self.interrupt.is_raised() {
                return Err(Error::Interrupted);
            }
            if *proceed {
                *proceed = false;
                return Ok(());
            }
            self.condvar.wait(&mut proceed);
        }
    }
}

/// What the worker reports to the owner context
#[derive(Debug)]
pub(crate) enum WorkerEvent<T> {
    Loading(bool),
    Available(Available),
    /// `overwrite` replaces the current contents instead of appending
    Batch { overwrite: bool, elements: Vec<T> },
    Failed(Error),
    Finished,
}

/// A worker event tagged with the run that produced it
#[derive(Debug)]
pub(crate) struct WorkerMessage<T> {
    pub run: u64,
    pub event: WorkerEvent<T>,
}

pub(crate) type SharedLoader<T> = Arc<Mutex<Box<dyn IncrementalLoader<T>>>>;

/// Handle to a running worker; dropping it does not stop the thread
#[derive(Debug)]
pub(crate) struct Worker {
    pub run: u64,
    gate: Arc<Gate>,
    _thread: JoinHandle<()>,
}

impl Worker {
    pub fn spawn<T: Send + 'static>(
        run: u64,
        loader: SharedLoader<T>,
        mailbox: Mailbox<WorkerMessage<T>>,
    ) -> Result<Self> {
        let gate = Arc::new(Gate::default());
        let worker_gate = gate.clone();
        let thread = std::thread::Builder::new()
            .name(format!("{}-{}", WORKER_THREAD_NAME, run))
            .spawn(move || work(run, &loader, &worker_gate, &mailbox))
            .map_err(|source| Error::Spawn { source })?;

        tracing::trace!("Worker {} started", run);
        Ok(Self {
            run,
            gate,
            _thread: thread,
        })
    }

    pub fn proceed(&self) {
        self.gate.proceed();
    }

    /// Fire-and-forget stop
    pub fn interrupt(&self) {
        tracing::trace!("Worker {} interrupted", self.run);
        self.gate.interrupt();
    }
}

fn work<T: Send + 'static>(
    run: u64,
    loader: &SharedLoader<T>,
    gate: &Gate,
    mailbox: &Mailbox<WorkerMessage<T>>,
) {
    let post = |event: WorkerEvent<T>| mailbox.post(WorkerMessage { run, event });
    let mut offset = 0;
    let mut page = 0;

    loop {
        if gate.is_interrupted() {
            break;
        }
        post(WorkerEvent::Loading(true));

        let cx = LoadContext::new(offset, page, gate.interrupt_handle());
        let result = loader.lock().load(&cx);

        let more = match result {
            Ok(Some(increment)) => {
                let count = increment.elements.len();
                let more = increment.remaining.has_more();
                post(WorkerEvent::Available(increment.remaining));
                post(WorkerEvent::Batch {
                    overwrite: page == 0,
                    elements: increment.elements,
                });
                offset += count;
                page += 1;
                more
            }
            Ok(None) => {
                if page == 0 {
                    post(WorkerEvent::Batch {
                        overwrite: true,
                        elements: Vec::new(),
                    });
                }
                post(WorkerEvent::Available(Available::Exhausted));
                false
            }
            Err(e) if e.is_interrupted() || gate.is_interrupted() => {
                post(WorkerEvent::Loading(false));
                break;
            }
            Err(e) => {
                tracing::error!("Worker {} failed to load increment {}: {}", run, page, e);
                post(WorkerEvent::Failed(e));
                true
            }
        };

        post(WorkerEvent::Loading(false));
        if !more {
            post(WorkerEvent::Finished);
            break;
        }
        if gate.block().is_err() {
            break;
        }
    }

    tracing::trace!("Worker {} exiting", run);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_latched_proceed() {
        let gate = Gate::default();
        gate.proceed();
        assert!(gate.block().is_ok());
    }

    #[test]
    fn test_interrupt_releases_blocked_worker() {
        let gate = Arc::new(Gate::default());
        let blocked = gate.clone();
        let handle = std::thread::spawn(move || blocked.block());

        std::thread::sleep(Duration::from_millis(20));
        gate.interrupt();
        let result = handle.join().expect("join");
        assert!(matches!(result, Err(Error::Interrupted)));
    }

    #[test]
    fn test_interrupt_wakes_async_waiter() {
        let interrupt = Arc::new(Interrupt::default());
        let raiser = interrupt.clone();
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            raiser.raise();
        });
        crate::loader::runtime::block_on(interrupt.wait()).expect("runtime");
        assert!(interrupt.is_raised());
    }
}
