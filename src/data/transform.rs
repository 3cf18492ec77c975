//! Element-wise projection of another data instance.

use crate::data::{
    Data, DataSource, Forwarding, Intent, Loadable, Observable, ObserverHooks, ObserverKind, Relay,
};
use crate::error::Result;
use crate::observers::{Available, ObserverHub};
use std::rc::Rc;

/// Applies a function to every element read from `inner`.
///
/// Positions are unchanged, so every notification is forwarded as is.
pub struct TransformData<S, T> {
    inner: Rc<dyn Data<S>>,
    transform: Box<dyn Fn(S) -> T>,
    hub: ObserverHub,
    forwarding: Forwarding,
}

impl<S: 'static, T: 'static> TransformData<S, T> {
    pub fn new(inner: Rc<dyn Data<S>>, transform: impl Fn(S) -> T + 'static) -> Rc<Self> {
        Rc::new_cyclic(|weak| {
            let observable: Rc<dyn Observable> = inner.clone();
            Self {
                forwarding: Forwarding::new(observable, weak),
                inner,
                transform: Box::new(transform),
                hub: ObserverHub::new(),
            }
        })
    }
}

impl<S: 'static, T: 'static> DataSource<T> for TransformData<S, T> {
    fn get_with(&self, position: usize, intent: Intent) -> Result<T> {
        self.inner.get_with(position, intent).map(&self.transform)
    }

    fn size(&self) -> usize {
        self.inner.size()
    }
}

impl<S: 'static, T: 'static> Loadable for TransformData<S, T> {
    fn is_loading(&self) -> bool {
        self.inner.is_loading()
    }

    fn available(&self) -> Available {
        self.inner.available()
    }

    fn invalidate(&self) {
        self.inner.invalidate();
    }

    fn refresh(&self) {
        self.inner.refresh();
    }

    fn reload(&self) {
        self.inner.reload();
    }
}

impl<S: 'static, T: 'static> ObserverHooks for TransformData<S, T> {
    fn hub(&self) -> &ObserverHub {
        &self.hub
    }

    fn on_observers_changed(&self, kind: ObserverKind, count: usize) {
        self.forwarding.sync(kind, count);
    }
}

impl<S: 'static, T: 'static> Relay for TransformData<S, T> {}

impl<S, T> std::fmt::Debug for TransformData<S, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformData")
            .field("forwarding", &self.forwarding)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ListData;
    use crate::observers::{ChangeEvent, DataObserver, Recorder};

    #[test]
    fn test_maps_and_forwards() {
        let list = ListData::from_vec(vec![1, 2, 3]);
        let view = TransformData::new(list.clone(), |n: i32| n * 10);
        let recorder = Recorder::new();
        view.register_data_observer(recorder.clone());

        assert_eq!(view.get(2).expect("get"), 30);
        list.push(4);
        assert_eq!(view.size(), 4);
        assert_eq!(recorder.changes(), vec![ChangeEvent::inserted(3, 1)]);

        let observer: Rc<dyn DataObserver> = recorder.clone();
        view.unregister_data_observer(&observer);
        list.push(5);
        assert_eq!(recorder.changes().len(), 1);
    }
}
