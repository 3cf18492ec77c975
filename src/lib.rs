//! Reactive Data Library
//!
//! Reactive, incrementally loaded collections for presentation layers: data
//! sources that broadcast fine-grained change notifications, filtered and
//! transformed views kept in step with them, and a background loader driven
//! by visibility.

pub mod config;
pub mod constants;
pub mod data;
pub mod error;
pub mod lifecycle;
pub mod loader;
pub mod looper;
pub mod observers;

pub use config::LoaderConfig;
pub use data::{
    Data, DataIter, DataSource, DataWatcher, FilterData, ImmutableData, Intent, LimitData,
    ListData, Loadable, Observable, ObserverHooks, ObserverKind, TransformData, datas,
};
pub use error::{Error, Result};
pub use loader::{
    FnLoader, FutureLoader, Increment, IncrementalData, IncrementalLoader, LoadContext,
    LoaderState,
};
pub use looper::{Clock, Looper, ManualClock, Mailbox, SystemClock, TimerHandle};
pub use observers::{
    Available, AvailableObserver, ChangeEvent, DataObserver, ErrorObserver, LoadingObserver,
    Recorder,
};
