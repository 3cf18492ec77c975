//! Mailbox
//!
//! Typed, thread-safe posting endpoint into the owner context.

use crossbeam_channel::Sender;
use std::any::Any;
use std::marker::PhantomData;

/// Message in flight to a mailbox handler
pub(crate) struct Envelope {
    pub(crate) slot: u64,
    pub(crate) payload: Box<dyn Any + Send>,
}

/// Sends messages of type `M` to a handler running on the owner thread
pub struct Mailbox<M> {
    slot: u64,
    tx: Sender<Envelope>,
    _marker: PhantomData<fn(M)>,
}

impl<M: Send + 'static> Mailbox<M> {
    pub(crate) fn new(slot: u64, tx: Sender<Envelope>) -> Self {
        Self {
            slot,
            tx,
            _marker: PhantomData,
        }
    }

    /// Queue a message. Returns `false` if the owner context is gone.
    pub fn post(&self, message: M) -> bool {
        self.tx
            .send(Envelope {
                slot: self.slot,
                payload: Box::new(message),
            })
            .is_ok()
    }

    pub(crate) fn slot(&self) -> u64 {
        self.slot
    }
}

impl<M> Clone for Mailbox<M> {
    fn clone(&self) -> Self {
        Self {
            slot: self.slot,
            tx: self.tx.clone(),
            _marker: PhantomData,
        }
    }
}

impl<M> std::fmt::Debug for Mailbox<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mailbox").field("slot", &self.slot).finish()
    }
}
