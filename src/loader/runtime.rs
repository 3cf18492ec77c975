//! Tokio Runtime Bridge
//!
//! Loader workers are plain threads, but many load implementations are
//! async clients. This module drives their futures on a shared tokio runtime
//! and cancels them when the worker is interrupted.
//!
//! ## Pattern
//!
//! ```text
//! worker thread
//!       │
//!       ▼
//! FutureLoader::load(cx)
//!       │
//!       ▼
//! block_on(select! { load future, cx.interrupted() })
//!       │
//!       ▼
//! Increment, or Error::Interrupted if the worker was stopped
//! ```

use crate::error::{Error, Result};
use crate::loader::{Increment, IncrementalLoader, LoadContext};
use std::future::Future;
use std::sync::OnceLock;
use tokio::runtime::Runtime;

/// Global tokio runtime instance
static TOKIO_RUNTIME: OnceLock<Runtime> = OnceLock::new();

/// Get or initialize the global tokio runtime
fn get_runtime() -> Result<&'static Runtime> {
    if let Some(runtime) = TOKIO_RUNTIME.get() {
        return Ok(runtime);
    }
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .thread_name("reactive-data-runtime")
        .enable_time()
        .build()
        .map_err(|source| Error::Runtime { source })?;
    tracing::debug!("Tokio runtime started");
    Ok(TOKIO_RUNTIME.get_or_init(|| runtime))
}

/// Block the calling thread on a future.
///
/// **Warning**: must not be called from inside an async context.
pub fn block_on<F: Future>(future: F) -> Result<F::Output> {
    Ok(get_runtime()?.block_on(future))
}

/// Adapts an async load function to the blocking [`IncrementalLoader`] contract.
///
/// The closure receives the offset and page of the requested increment. The
/// in-flight future is dropped as soon as the worker is interrupted.
pub struct FutureLoader<F> {
    load: F,
}

impl<F> FutureLoader<F> {
    pub fn new(load: F) -> Self {
        Self { load }
    }
}

impl<T, F, Fut> IncrementalLoader<T> for FutureLoader<F>
where
    F: FnMut(usize, usize) -> Fut + Send,
    Fut: Future<Output = Result<Option<Increment<T>>>>,
{
    fn load(&mut self, cx: &LoadContext) -> Result<Option<Increment<T>>> {
        let future = (self.load)(cx.offset(), cx.page());
        let interrupt = cx.interrupt();
        block_on(async move {
            tokio::select! {
                result = future => result,
                _ = interrupt.wait() => Err(Error::Interrupted),
            }
        })?
    }
}

impl<F> std::fmt::Debug for FutureLoader<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FutureLoader").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::worker::Interrupt;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn test_future_loader_returns_increment() {
        let mut loader = FutureLoader::new(|offset: usize, _page: usize| async move {
            tokio::time::sleep(Duration::from_millis(1)).await;
            Ok::<_, Error>(Some(Increment::last(vec![offset, offset + 1])))
        });
        let cx = LoadContext::new(4, 1, Arc::new(Interrupt::default()));
        let increment = loader.load(&cx).expect("load").expect("increment");
        assert_eq!(increment.elements, vec![4, 5]);
    }

    #[test]
    fn test_interrupt_cancels_future() {
        let mut loader = FutureLoader::new(|_: usize, _: usize| async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok::<_, Error>(Some(Increment::<u8>::more(Vec::new())))
        });
        let interrupt = Arc::new(Interrupt::default());
        let cx = LoadContext::new(0, 0, interrupt.clone());

        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            interrupt.raise();
        });
        let err = loader.load(&cx).expect_err("interrupted");
        assert!(err.is_interrupted());
    }
}
