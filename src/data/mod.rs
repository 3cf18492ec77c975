//! Data
//!
//! Reactive element sequences and derived views over them.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────┐   ChangeEvent   ┌───────────────────────────┐
//! │ ListData             │ ──────────────► │ FilterData / TransformData│
//! │ IncrementalData      │                 │ LimitData                 │
//! │ ImmutableData        │ ◄────────────── │ (re-emit in view space)   │
//! └──────────────────────┘   get(inner)    └───────────────────────────┘
//!                                                       │
//!                                                       ▼ ChangeEvent
//!                                             presentation observers
//! ```
//!
//! A source is any type implementing [`DataSource`], [`Observable`] and
//! [`Loadable`]; the union is [`Data`]. Sources that keep their observers in an
//! [`ObserverHub`] implement [`ObserverHooks`] and get [`Observable`] for free.

pub mod datas;

mod elements;
mod filter;
mod immutable;
mod iter;
mod limit;
mod list;
mod transform;
mod watcher;
mod wrapper;

pub use filter::FilterData;
pub use immutable::ImmutableData;
pub use iter::DataIter;
pub use limit::LimitData;
pub use list::ListData;
pub use transform::TransformData;
pub use watcher::DataWatcher;

pub(crate) use elements::Elements;
pub(crate) use wrapper::{Forwarding, Relay, Subscription};

use crate::error::Result;
use crate::observers::{
    Available, AvailableObserver, DataObserver, ErrorObserver, LoadingObserver, ObserverHub,
};
use std::rc::Rc;

/// Why an element is being read
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Intent {
    /// Plain access with no side effects
    #[default]
    Plain,
    /// The element is about to be presented; incremental sources may load ahead
    Presentation,
}

/// Positional, sized access to elements
pub trait DataSource<T> {
    /// Element at `position`, interpreting the read per `intent`
    fn get_with(&self, position: usize, intent: Intent) -> Result<T>;

    fn get(&self, position: usize) -> Result<T> {
        self.get_with(position, Intent::Plain)
    }

    fn size(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.size() == 0
    }
}

/// Registration for the four observer kinds. Registration is idempotent.
pub trait Observable {
    fn register_data_observer(&self, observer: Rc<dyn DataObserver>);
    fn unregister_data_observer(&self, observer: &Rc<dyn DataObserver>);
    fn register_loading_observer(&self, observer: Rc<dyn LoadingObserver>);
    fn unregister_loading_observer(&self, observer: &Rc<dyn LoadingObserver>);
    fn register_available_observer(&self, observer: Rc<dyn AvailableObserver>);
    fn unregister_available_observer(&self, observer: &Rc<dyn AvailableObserver>);
    fn register_error_observer(&self, observer: Rc<dyn ErrorObserver>);
    fn unregister_error_observer(&self, observer: &Rc<dyn ErrorObserver>);
}

/// Loading state and reload controls
pub trait Loadable {
    /// Whether elements are currently being loaded or updated
    fn is_loading(&self) -> bool;

    /// How many more elements could be loaded
    fn available(&self) -> Available {
        Available::Unknown
    }

    /// Mark contents stale without clearing them; reloaded at the next suitable time
    fn invalidate(&self);

    /// Reload without clearing first
    fn refresh(&self);

    /// Clear, then reload
    fn reload(&self);
}

/// A complete reactive data source
pub trait Data<T>: DataSource<T> + Observable + Loadable {}

impl<T, D: DataSource<T> + Observable + Loadable + ?Sized> Data<T> for D {}

/// Observer kinds, used by registration hooks
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ObserverKind {
    Data,
    Loading,
    Available,
    Error,
}

/// Skeleton for sources that keep observers in an [`ObserverHub`].
///
/// `on_observers_changed` runs after every registration that changed
/// membership, with the new count for that kind.
pub trait ObserverHooks {
    fn hub(&self) -> &ObserverHub;

    fn on_observers_changed(&self, _kind: ObserverKind, _count: usize) {}
}

impl<H: ObserverHooks + ?Sized> Observable for H {
    fn register_data_observer(&self, observer: Rc<dyn DataObserver>) {
        if self.hub().data.register(observer) {
            self.on_observers_changed(ObserverKind::Data, self.hub().data.len());
        }
    }

    fn unregister_data_observer(&self, observer: &Rc<dyn DataObserver>) {
        if self.hub().data.unregister(observer) {
            self.on_observers_changed(ObserverKind::Data, self.hub().data.len());
        }
    }

    fn register_loading_observer(&self, observer: Rc<dyn LoadingObserver>) {
        if self.hub().loading.register(observer) {
            self.on_observers_changed(ObserverKind::Loading, self.hub().loading.len());
        }
    }

    fn unregister_loading_observer(&self, observer: &Rc<dyn LoadingObserver>) {
        if self.hub().loading.unregister(observer) {
            self.on_observers_changed(ObserverKind::Loading, self.hub().loading.len());
        }
    }

    fn register_available_observer(&self, observer: Rc<dyn AvailableObserver>) {
        if self.hub().available.register(observer) {
            self.on_observers_changed(ObserverKind::Available, self.hub().available.len());
        }
    }

    fn unregister_available_observer(&self, observer: &Rc<dyn AvailableObserver>) {
        if self.hub().available.unregister(observer) {
            self.on_observers_changed(ObserverKind::Available, self.hub().available.len());
        }
    }

    fn register_error_observer(&self, observer: Rc<dyn ErrorObserver>) {
        if self.hub().error.register(observer) {
            self.on_observers_changed(ObserverKind::Error, self.hub().error.len());
        }
    }

    fn unregister_error_observer(&self, observer: &Rc<dyn ErrorObserver>) {
        if self.hub().error.unregister(observer) {
            self.on_observers_changed(ObserverKind::Error, self.hub().error.len());
        }
    }
}
