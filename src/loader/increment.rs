//! Load contract
//!
//! Concrete sources supply an [`IncrementalLoader`]. It is called on the
//! worker thread, one increment at a time, and may block.

use crate::error::Result;
use crate::loader::worker::Interrupt;
use crate::observers::Available;
use std::sync::Arc;

/// One batch of loaded elements
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Increment<T> {
    pub elements: Vec<T>,
    /// How many more elements could follow this batch
    pub remaining: Available,
}

impl<T> Increment<T> {
    pub fn new(elements: Vec<T>, remaining: Available) -> Self {
        Self {
            elements,
            remaining,
        }
    }

    /// More elements follow, count unknown
    pub fn more(elements: Vec<T>) -> Self {
        Self::new(elements, Available::Indeterminate)
    }

    /// The final batch
    pub fn last(elements: Vec<T>) -> Self {
        Self::new(elements, Available::Exhausted)
    }
}

/// What the worker knows when requesting an increment
pub struct LoadContext {
    offset: usize,
    page: usize,
    interrupt: Arc<Interrupt>,
}

impl LoadContext {
    pub(crate) fn new(offset: usize, page: usize, interrupt: Arc<Interrupt>) -> Self {
        Self {
            offset,
            page,
            interrupt,
        }
    }

    /// Elements delivered so far in this run
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Increments delivered so far in this run
    pub fn page(&self) -> usize {
        self.page
    }

    /// Long-running loads should poll this and return [`Error::Interrupted`](crate::Error::Interrupted)
    pub fn is_interrupted(&self) -> bool {
        self.interrupt.is_raised()
    }

    /// Resolves once the worker is asked to stop
    pub async fn interrupted(&self) {
        self.interrupt.wait().await;
    }

    pub(crate) fn interrupt(&self) -> Arc<Interrupt> {
        self.interrupt.clone()
    }
}

impl std::fmt::Debug for LoadContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadContext")
            .field("offset", &self.offset)
            .field("page", &self.page)
            .field("interrupted", &self.is_interrupted())
            .finish()
    }
}

/// Produces elements one increment at a time.
///
/// Returning `Ok(None)` means there is no more data. Returning
/// [`Error::Interrupted`](crate::Error::Interrupted) ends the run quietly; any
/// other error is reported to error observers.
pub trait IncrementalLoader<T>: Send {
    fn load(&mut self, cx: &LoadContext) -> Result<Option<Increment<T>>>;
}

/// Adapts a closure to [`IncrementalLoader`]
pub struct FnLoader<F>(pub F);

impl<T, F> IncrementalLoader<T> for FnLoader<F>
where
    F: FnMut(&LoadContext) -> Result<Option<Increment<T>>> + Send,
{
    fn load(&mut self, cx: &LoadContext) -> Result<Option<Increment<T>>> {
        (self.0)(cx)
    }
}

impl<T, L: IncrementalLoader<T> + ?Sized> IncrementalLoader<T> for Box<L> {
    fn load(&mut self, cx: &LoadContext) -> Result<Option<Increment<T>>> {
        (**self).load(cx)
    }
}
