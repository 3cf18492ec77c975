//! Caps another data instance at a fixed number of elements.

use crate::data::{
    Data, DataSource, Forwarding, Intent, Loadable, Observable, ObserverHooks, ObserverKind, Relay,
};
use crate::error::{Error, Result};
use crate::observers::{Available, ChangeEvent, ObserverHub};
use std::cell::Cell;
use std::rc::Rc;

/// Exposes at most `limit` leading elements of `inner`
pub struct LimitData<T> {
    inner: Rc<dyn Data<T>>,
    limit: Cell<usize>,
    hub: ObserverHub,
    forwarding: Forwarding,
}

impl<T: Clone + 'static> LimitData<T> {
    pub fn new(inner: Rc<dyn Data<T>>, limit: usize) -> Rc<Self> {
        Rc::new_cyclic(|weak| {
            let observable: Rc<dyn Observable> = inner.clone();
            Self {
                forwarding: Forwarding::new(observable, weak),
                inner,
                limit: Cell::new(limit),
                hub: ObserverHub::new(),
            }
        })
    }

    pub fn limit(&self) -> usize {
        self.limit.get()
    }

    /// Change the cap, announcing the elements that appear or disappear
    pub fn set_limit(&self, limit: usize) {
        let before = self.size();
        self.limit.set(limit);
        let after = self.size();
        if after > before {
            self.hub
                .notify_change(ChangeEvent::inserted(before, after - before));
        } else if before > after {
            self.hub
                .notify_change(ChangeEvent::removed(after, before - after));
        }
    }

    /// Translate an inner event into view events
    fn clip(&self, event: ChangeEvent) -> Vec<ChangeEvent> {
        let limit = self.limit.get();
        let inner_size = self.inner.size();
        match event {
            ChangeEvent::Changed => vec![ChangeEvent::Changed],
            ChangeEvent::RangeChanged { start, count } if start < limit => {
                vec![ChangeEvent::changed(start, count.min(limit - start))]
            }
            ChangeEvent::RangeInserted { start, count } if start < limit => {
                let before = inner_size.saturating_sub(count).min(limit);
                let inserted = count.min(limit - start);
                let after = inner_size.min(limit);
                // Elements pushed past the cap drop off the end
                let overflow = before + inserted - after;
                vec![
                    ChangeEvent::inserted(start, inserted),
                    ChangeEvent::removed(after, overflow),
                ]
            }
            ChangeEvent::RangeRemoved { start, count } if start < limit => {
                let before = (inner_size + count).min(limit);
                let removed = count.min(limit - start);
                let after = inner_size.min(limit);
                // Elements beyond the cap slide into view
                let pulled = after - (before - removed);
                vec![
                    ChangeEvent::removed(start, removed),
                    ChangeEvent::inserted(before - removed, pulled),
                ]
            }
            ChangeEvent::RangeMoved { from, to, count } => {
                let visible = |start: usize| start + count <= limit;
                let hidden = |start: usize| start >= limit;
                if visible(from) && visible(to) {
                    vec![event]
                } else if hidden(from) && hidden(to) {
                    Vec::new()
                } else {
                    vec![ChangeEvent::Changed]
                }
            }
            _ => Vec::new(),
        }
    }
}

impl<T: Clone + 'static> DataSource<T> for LimitData<T> {
    fn get_with(&self, position: usize, intent: Intent) -> Result<T> {
        let size = self.size();
        if position >= size {
            return Err(Error::OutOfRange { position, size });
        }
        self.inner.get_with(position, intent)
    }

    fn size(&self) -> usize {
        self.inner.size().min(self.limit.get())
    }
}

impl<T: Clone + 'static> Loadable for LimitData<T> {
    fn is_loading(&self) -> bool {
        self.inner.is_loading()
    }

    fn available(&self) -> Available {
        if self.inner.size() > self.limit.get() {
            Available::Exhausted
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

impl<T: Clone + 'static> ObserverHooks for LimitData<T> {
    fn hub(&self) -> &ObserverHub {
        &self.hub
    }

    fn on_observers_changed(&self, kind: ObserverKind, count: usize) {
        self.forwarding.sync(kind, count);
    }
}

impl<T: Clone + 'static> Relay for LimitData<T> {
    fn relay_change(&self, event: ChangeEvent) {
        for clipped in self.clip(event) {
            self.hub.notify_change(clipped);
        }
    }
}

impl<T> std::fmt::Debug for LimitData<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LimitData")
            .field("limit", &self.limit.get())
            .field("forwarding", &self.forwarding)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ListData;
    use crate::observers::Recorder;

    fn setup(items: Vec<i32>, limit: usize) -> (Rc<ListData<i32>>, Rc<LimitData<i32>>, Rc<Recorder>) {
        let list = ListData::from_vec(items);
        let view = LimitData::new(list.clone(), limit);
        let recorder = Recorder::new();
        view.register_data_observer(recorder.clone());
        (list, view, recorder)
    }

    #[test]
    fn test_insert_pushes_tail_out() {
        let (list, view, recorder) = setup((0..10).collect(), 5);
        list.insert_all(2, vec![100, 101]).expect("insert");
        assert_eq!(
            recorder.changes(),
            vec![ChangeEvent::inserted(2, 2), ChangeEvent::removed(5, 2)]
        );
        assert_eq!(recorder.shadow_size(5), Some(view.size()));
        assert_eq!(view.get(4).expect("get"), 2);
    }

    #[test]
    fn test_remove_pulls_tail_in() {
        let (list, view, recorder) = setup((0..10).collect(), 5);
        list.remove_range(1, 2).expect("remove");
        assert_eq!(
            recorder.changes(),
            vec![ChangeEvent::removed(1, 2), ChangeEvent::inserted(3, 2)]
        );
        assert_eq!(recorder.shadow_size(5), Some(5));
        assert_eq!(view.get(4).expect("get"), 6);
    }

    #[test]
    fn test_growth_below_limit() {
        let (list, view, recorder) = setup(vec![1, 2], 5);
        list.push(3);
        assert_eq!(recorder.changes(), vec![ChangeEvent::inserted(2, 1)]);
        assert_eq!(view.size(), 3);
    }

    #[test]
    fn test_changes_past_limit_are_hidden() {
        let (list, _view, recorder) = setup((0..10).collect(), 5);
        list.set(7, 70).expect("set");
        list.move_range(6, 8, 2).expect("move");
        assert!(recorder.changes().is_empty());

        list.move_range(3, 7, 2).expect("move");
        assert_eq!(recorder.changes(), vec![ChangeEvent::Changed]);
    }

    #[test]
    fn test_set_limit_announces_difference() {
        let (_list, view, recorder) = setup((0..10).collect(), 5);
        view.set_limit(7);
        view.set_limit(3);
        assert_eq!(
            recorder.changes(),
            vec![ChangeEvent::inserted(5, 2), ChangeEvent::removed(3, 4)]
        );
    }
}
