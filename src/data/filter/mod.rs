//! Filtered View
//!
//! Presents the elements of an inner data instance that satisfy a predicate,
//! keeping a sorted position index in step with the inner notifications
//! instead of rebuilding it.
//!
//! ## Patching
//!
//! ```text
//! inner event                 index patch                      view event
//! ─────────────────────────   ──────────────────────────────   ──────────────────────
//! changed [s, s+c)            re-test each position            changed/removed/inserted
//! inserted s, c               shift keys >= s by +c, add hits  inserted (one run)
//! removed s, c                drop keys in range, shift by -c  removed (one run)
//! moved f -> t, c             drop, shift the gap, re-test     moved, or removed+inserted
//! ```
//!
//! The index is only kept current while the view has data observers. A read
//! without one fails with [`Error::Unobserved`].

mod index;

use crate::data::{
    Data, DataSource, Forwarding, Intent, Loadable, Observable, ObserverHooks, ObserverKind,
    Relay, Subscription,
};
use crate::error::{Error, Result};
use crate::observers::{Available, ChangeEvent, ObserverHub};
use index::FilterIndex;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Accumulates adjacent single-position changes into one range
#[derive(Default)]
struct ChangedRun {
    start: usize,
    count: usize,
}

impl ChangedRun {
    fn push(&mut self, hub: &ObserverHub, view: usize) {
        if self.count > 0 && self.start + self.count == view {
            self.count += 1;
            return;
        }
        self.flush(hub);
        self.start = view;
        self.count = 1;
    }

    fn flush(&mut self, hub: &ObserverHub) {
        if self.count > 0 {
            hub.notify_change(ChangeEvent::changed(self.start, self.count));
            self.count = 0;
        }
    }
}

/// A view over the elements of `inner` for which the predicate holds
pub struct FilterData<T> {
    inner: Rc<dyn Data<T>>,
    predicate: Box<dyn Fn(&T) -> bool>,
    hub: ObserverHub,
    forwarding: Forwarding,
    index: RefCell<FilterIndex>,
    dirty: Cell<bool>,
    loading: Cell<bool>,
    available: Cell<Available>,
}

impl<T: Clone + 'static> FilterData<T> {
    pub fn new(inner: Rc<dyn Data<T>>, predicate: impl Fn(&T) -> bool + 'static) -> Rc<Self> {
        Rc::new_cyclic(|weak| {
            let observable: Rc<dyn Observable> = inner.clone();
            Self {
                forwarding: Forwarding::new(observable, weak),
                inner,
                predicate: Box::new(predicate),
                hub: ObserverHub::new(),
                index: RefCell::new(FilterIndex::default()),
                dirty: Cell::new(true),
                loading: Cell::new(false),
                available: Cell::new(Available::Unknown),
            }
        })
    }

    /// Inner position of the element at view `position`
    pub fn inner_position(&self, position: usize) -> Option<usize> {
        self.index.borrow().key(position)
    }

    fn is_observed(&self) -> bool {
        self.forwarding.is_forwarding(ObserverKind::Data)
    }

    fn includes(&self, position: usize) -> Result<bool> {
        self.inner
            .get(position)
            .map(|element| (self.predicate)(&element))
    }

    fn rebuild(&self) {
        let size = self.inner.size();
        let mut keys = Vec::new();
        for position in 0..size {
            match self.includes(position) {
                Ok(true) => keys.push(position),
                Ok(false) => {}
                Err(e) => {
                    tracing::error!("Filter rebuild stopped at {}: {}", position, e);
                    break;
                }
            }
        }
        tracing::trace!("Filter index rebuilt: {} of {} included", keys.len(), size);
        self.index.borrow_mut().reset(keys);
    }

    /// Give up on patching: the next `size()` rebuilds and observers are told to re-read
    fn abandon_index(&self, error: Error) {
        tracing::error!("Filter index abandoned: {}", error);
        self.dirty.set(true);
        self.hub.notify_change(ChangeEvent::Changed);
    }

    fn evaluate(&self, range: std::ops::Range<usize>) -> Result<Vec<usize>> {
        let mut included = Vec::new();
        for position in range {
            if self.includes(position)? {
                included.push(position);
            }
        }
        Ok(included)
    }

    fn apply(&self, event: ChangeEvent) {
        if self.dirty.get() {
            self.hub.notify_change(ChangeEvent::Changed);
            return;
        }

        let patched = match event {
            ChangeEvent::Changed => self.on_full_change(),
            ChangeEvent::RangeChanged { start, count } => self.on_range_changed(start, count),
            ChangeEvent::RangeInserted { start, count } => self.on_inserted(start, count),
            ChangeEvent::RangeRemoved { start, count } => {
                self.on_removed(start, count);
                Ok(())
            }
            ChangeEvent::RangeMoved { from, to, count } => self.on_moved(from, to, count),
        };

        if let Err(e) = patched {
            self.abandon_index(e);
        }
    }

    fn on_full_change(&self) -> Result<()> {
        let size = self.inner.size();
        let (view, stale) = self.index.borrow_mut().remove_range(size..usize::MAX);
        self.hub.notify_change(ChangeEvent::removed(view, stale));
        self.on_range_changed(0, size)
    }

    fn on_range_changed(&self, start: usize, count: usize) -> Result<()> {
        let mut run = ChangedRun::default();
        for position in start..start + count {
            let included = match self.includes(position) {
                Ok(included) => included,
                Err(e) => {
                    run.flush(&self.hub);
                    return Err(e);
                }
            };

            let current = self.index.borrow().find(position);
            match (current, included) {
                (Ok(view), true) => run.push(&self.hub, view),
                (Ok(view), false) => {
                    run.flush(&self.hub);
                    self.index.borrow_mut().remove_at(view);
                    self.hub.notify_change(ChangeEvent::removed(view, 1));
                }
                (Err(view), true) => {
                    run.flush(&self.hub);
                    self.index.borrow_mut().insert_at(view, position);
                    self.hub.notify_change(ChangeEvent::inserted(view, 1));
                }
                (Err(_), false) => {}
            }
        }
        run.flush(&self.hub);
        Ok(())
    }

    fn on_inserted(&self, start: usize, count: usize) -> Result<()> {
        let included = self.evaluate(start..start + count)?;
        let view = {
            let mut index = self.index.borrow_mut();
            index.shift(start..usize::MAX, count as isize);
            index.insert_run(&included)
        };
        self.hub
            .notify_change(ChangeEvent::inserted(view, included.len()));
        Ok(())
    }

    fn on_removed(&self, start: usize, count: usize) {
        let (view, removed) = {
            let mut index = self.index.borrow_mut();
            let removed = index.remove_range(start..start + count);
            index.shift(start + count..usize::MAX, -(count as isize));
            removed
        };
        self.hub.notify_change(ChangeEvent::removed(view, removed));
    }

    fn on_moved(&self, from: usize, to: usize, count: usize) -> Result<()> {
        if count == 0 {
            return Ok(());
        }

        let (from_view, removed) = {
            let mut index = self.index.borrow_mut();
            let removed = index.remove_range(from..from + count);
            if to > from {
                index.shift(from + count..to + count, -(count as isize));
            } else if to < from {
                index.shift(to..from, count as isize);
            }
            removed
        };

        let included = self.evaluate(to..to + count)?;
        let to_view = self.index.borrow_mut().insert_run(&included);

        if removed == included.len() {
            self.hub
                .notify_change(ChangeEvent::moved(from_view, to_view, removed));
        } else {
            // The moved elements no longer agree with the index; report them separately
            self.hub.notify_change(ChangeEvent::removed(from_view, removed));
            self.hub
                .notify_change(ChangeEvent::inserted(to_view, included.len()));
        }
        Ok(())
    }

    fn set_loading(&self, loading: bool) {
        if self.loading.replace(loading) != loading {
            self.hub.notify_loading(loading);
        }
    }

    fn set_available(&self, available: Available) {
        if self.available.replace(available) != available {
            self.hub.notify_available(available);
        }
    }
}

impl<T: Clone + 'static> DataSource<T> for FilterData<T> {
    fn get_with(&self, position: usize, intent: Intent) -> Result<T> {
        if !self.is_observed() {
            return Err(Error::Unobserved);
        }

        let size = self.size();
        let inner = self
            .index
            .borrow()
            .key(position)
            .ok_or(Error::OutOfRange { position, size })?;

        let inner_size = self.inner.size();
        if inner >= inner_size {
            return Err(Error::IndexInconsistency {
                position,
                inner,
                inner_size,
            });
        }
        self.inner.get_with(inner, intent)
    }

    fn size(&self) -> usize {
        if self.dirty.get() {
            self.rebuild();
            if self.is_observed() {
                self.dirty.set(false);
            }
        }
        self.index.borrow().len()
    }
}

impl<T: Clone + 'static> Loadable for FilterData<T> {
    fn is_loading(&self) -> bool {
        if self.forwarding.is_forwarding(ObserverKind::Loading) {
            self.loading.get()
        } else {
            self.inner.is_loading()
        }
    }

    fn available(&self) -> Available {
        if self.forwarding.is_forwarding(ObserverKind::Available) {
            self.available.get()
        } else {
            self.inner.available()
        }
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

impl<T: Clone + 'static> ObserverHooks for FilterData<T> {
    fn hub(&self) -> &ObserverHub {
        &self.hub
    }

    fn on_observers_changed(&self, kind: ObserverKind, count: usize) {
        let subscription = self.forwarding.sync(kind, count);
        match (kind, subscription) {
            (ObserverKind::Data, Subscription::Started) => {
                self.dirty.set(true);
                self.size();
            }
            (ObserverKind::Data, Subscription::Stopped) => self.dirty.set(true),
            (ObserverKind::Loading, Subscription::Started) => {
                self.set_loading(self.inner.is_loading())
            }
            (ObserverKind::Available, Subscription::Started) => {
                self.set_available(self.inner.available())
            }
            _ => {}
        }
    }
}

impl<T: Clone + 'static> Relay for FilterData<T> {
    fn relay_change(&self, event: ChangeEvent) {
        self.apply(event);
    }

    fn relay_loading(&self, loading: bool) {
        self.set_loading(loading);
    }

    fn relay_available(&self, available: Available) {
        self.set_available(available);
    }
}

impl<T> std::fmt::Debug for FilterData<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterData")
            .field("included", &self.index.borrow().len())
            .field("dirty", &self.dirty.get())
            .field("forwarding", &self.forwarding)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ListData;
    use crate::observers::{DataObserver, Recorder};

    const ANIMALS: [&str; 6] = ["bear", "cat", "foo", "bar", "baz", "fish"];

    fn animals() -> Rc<ListData<String>> {
        ListData::from_vec(ANIMALS.iter().map(|s| s.to_string()).collect())
    }

    fn with_b(list: &Rc<ListData<String>>) -> (Rc<FilterData<String>>, Rc<Recorder>) {
        let view = FilterData::new(list.clone(), |s: &String| s.contains('b'));
        let recorder = Recorder::new();
        view.register_data_observer(recorder.clone());
        (view, recorder)
    }

    fn contents(view: &FilterData<String>) -> Vec<String> {
        (0..view.size())
            .map(|i| view.get(i).expect("element"))
            .collect()
    }

    #[test]
    fn test_initial_contents() {
        let list = animals();
        let (view, recorder) = with_b(&list);
        assert_eq!(contents(&view), vec!["bear", "bar", "baz"]);
        assert!(recorder.changes().is_empty());
    }

    #[test]
    fn test_unobserved_read_fails() {
        let list = animals();
        let view = FilterData::new(list.clone(), |s: &String| s.contains('b'));
        assert_eq!(view.size(), 3);
        assert!(matches!(view.get(0), Err(Error::Unobserved)));
    }

    #[test]
    fn test_out_of_range() {
        let list = animals();
        let (view, _recorder) = with_b(&list);
        assert!(matches!(
            view.get(3),
            Err(Error::OutOfRange {
                position: 3,
                size: 3
            })
        ));
    }

    #[test]
    fn test_change_keeps_included_element() {
        let list = animals();
        let (view, recorder) = with_b(&list);
        list.set(3, "boo".to_string()).expect("set");
        assert_eq!(recorder.changes(), vec![ChangeEvent::changed(1, 1)]);
        assert_eq!(contents(&view), vec!["bear", "boo", "baz"]);
    }

    #[test]
    fn test_change_excludes_and_includes() {
        let list = animals();
        let (view, recorder) = with_b(&list);
        list.set(0, "ant".to_string()).expect("set");
        list.set(5, "bison".to_string()).expect("set");
        assert_eq!(
            recorder.changes(),
            vec![ChangeEvent::removed(0, 1), ChangeEvent::inserted(2, 1)]
        );
        assert_eq!(contents(&view), vec!["bar", "baz", "bison"]);
    }

    #[test]
    fn test_insert_shifts_existing_positions() {
        let list = animals();
        let (view, recorder) = with_b(&list);
        list.insert_all(1, vec!["bee".to_string(), "ant".to_string(), "boa".to_string()])
            .expect("insert");
        assert_eq!(recorder.changes(), vec![ChangeEvent::inserted(1, 2)]);
        assert_eq!(contents(&view), vec!["bear", "bee", "boa", "bar", "baz"]);
        assert_eq!(recorder.shadow_size(3), Some(5));
    }

    #[test]
    fn test_remove_shifts_existing_positions() {
        let list = animals();
        let (view, recorder) = with_b(&list);
        list.remove_range(2, 2).expect("remove");
        assert_eq!(recorder.changes(), vec![ChangeEvent::removed(1, 1)]);
        assert_eq!(contents(&view), vec!["bear", "baz"]);
        assert_eq!(view.inner_position(1), Some(2));
    }

    #[test]
    fn test_move_to_end() {
        let list = animals();
        let (view, recorder) = with_b(&list);
        list.move_range(0, 5, 1).expect("move");
        assert_eq!(list.to_vec(), vec!["cat", "foo", "bar", "baz", "fish", "bear"]);
        assert_eq!(contents(&view), vec!["bar", "baz", "bear"]);
        assert_eq!(recorder.changes(), vec![ChangeEvent::moved(0, 2, 1)]);
    }

    #[test]
    fn test_move_of_excluded_is_silent() {
        let list = animals();
        let (view, recorder) = with_b(&list);
        list.move_range(1, 4, 2).expect("move");
        assert!(recorder.changes().is_empty());
        assert_eq!(contents(&view), vec!["bear", "bar", "baz"]);
    }

    #[test]
    fn test_overlapping_backward_move() {
        let list = animals();
        let (view, recorder) = with_b(&list);
        list.move_range(3, 1, 3).expect("move");
        assert_eq!(list.to_vec(), vec!["bear", "bar", "baz", "fish", "cat", "foo"]);
        assert_eq!(contents(&view), vec!["bear", "bar", "baz"]);
        assert_eq!(recorder.changes(), vec![ChangeEvent::moved(1, 1, 2)]);
    }

    #[test]
    fn test_full_change_trims_stale_entries() {
        let list = animals();
        let (view, recorder) = with_b(&list);
        list.replace_all(vec!["bob".to_string(), "cat".to_string()]);
        assert_eq!(contents(&view), vec!["bob"]);
        assert_eq!(recorder.shadow_size(3), Some(1));
    }

    #[test]
    fn test_reregistration_rebuilds() {
        let list = animals();
        let (view, recorder) = with_b(&list);
        let observer: Rc<dyn DataObserver> = recorder.clone();
        view.unregister_data_observer(&observer);

        list.push("bat".to_string());
        assert!(recorder.changes().is_empty());

        view.register_data_observer(observer);
        assert_eq!(contents(&view), vec!["bear", "bar", "baz", "bat"]);
    }

    #[test]
    fn test_forwards_loading_once_per_change() {
        let list = animals();
        let view = FilterData::new(list.clone(), |s: &String| s.contains('b'));
        let recorder = Recorder::new();
        view.register_loading_observer(recorder.clone());
        view.register_loading_observer(recorder.clone());
        assert!(!view.is_loading());
        assert!(recorder.loading().is_empty());
    }

    /// Source whose contents can shrink without telling anyone
    struct Untrustworthy {
        hub: ObserverHub,
        items: RefCell<Vec<i32>>,
    }

    impl DataSource<i32> for Untrustworthy {
        fn get_with(&self, position: usize, _intent: Intent) -> Result<i32> {
            let items = self.items.borrow();
            items.get(position).copied().ok_or(Error::OutOfRange {
                position,
                size: items.len(),
            })
        }

        fn size(&self) -> usize {
            self.items.borrow().len()
        }
    }

    impl Loadable for Untrustworthy {
        fn is_loading(&self) -> bool {
            false
        }

        fn invalidate(&self) {}

        fn refresh(&self) {}

        fn reload(&self) {}
    }

    impl ObserverHooks for Untrustworthy {
        fn hub(&self) -> &ObserverHub {
            &self.hub
        }
    }

    #[test]
    fn test_silent_shrink_is_reported_as_inconsistency() {
        let source = Rc::new(Untrustworthy {
            hub: ObserverHub::new(),
            items: RefCell::new(vec![2, 4, 5, 6]),
        });
        let view = FilterData::new(source.clone(), |n: &i32| n % 2 == 0);
        let recorder = Recorder::new();
        view.register_data_observer(recorder.clone());
        assert_eq!(view.size(), 3);

        source.items.borrow_mut().truncate(2);

        assert_eq!(view.get(1).expect("still in range"), 4);
        match view.get(2) {
            Err(Error::IndexInconsistency {
                position,
                inner,
                inner_size,
            }) => assert_eq!((position, inner, inner_size), (2, 3, 2)),
            other => panic!("expected inconsistency, got {:?}", other),
        }
    }
}
