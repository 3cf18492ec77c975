//! In-memory mutable data.

use crate::data::{DataSource, Elements, Intent, Loadable, ObserverHooks};
use crate::error::Result;
use crate::observers::{Available, ChangeEvent, ObserverHub};
use std::rc::Rc;

/// A mutable element list that notifies observers of every edit
pub struct ListData<T> {
    hub: ObserverHub,
    elements: Elements<T>,
}

impl<T: Clone + 'static> ListData<T> {
    pub fn new() -> Rc<Self> {
        Self::from_vec(Vec::new())
    }

    pub fn from_vec(elements: Vec<T>) -> Rc<Self> {
        Rc::new(Self {
            hub: ObserverHub::new(),
            elements: Elements::new(elements),
        })
    }

    pub fn push(&self, element: T) {
        self.elements.push(&self.hub, element);
    }

    pub fn extend(&self, elements: impl IntoIterator<Item = T>) {
        self.elements
            .extend(&self.hub, elements.into_iter().collect());
    }

    pub fn insert(&self, index: usize, element: T) -> Result<()> {
        self.elements.insert_all(&self.hub, index, vec![element])
    }

    pub fn insert_all(&self, index: usize, elements: impl IntoIterator<Item = T>) -> Result<()> {
        self.elements
            .insert_all(&self.hub, index, elements.into_iter().collect())
    }

    /// Replace the element at `index`, returning the previous one
    pub fn set(&self, index: usize, element: T) -> Result<T> {
        self.elements.set(&self.hub, index, element)
    }

    pub fn remove(&self, index: usize) -> Result<T> {
        let mut removed = self.elements.remove_range(&self.hub, index, 1)?;
        Ok(removed.remove(0))
    }

    pub fn remove_range(&self, start: usize, count: usize) -> Result<Vec<T>> {
        self.elements.remove_range(&self.hub, start, count)
    }

    /// Move `count` elements from `from` so that the first ends up at `to`
    pub fn move_range(&self, from: usize, to: usize, count: usize) -> Result<()> {
        self.elements.move_range(&self.hub, from, to, count)
    }

    /// Swap in new contents, announced as a full change
    pub fn replace_all(&self, elements: impl IntoIterator<Item = T>) {
        self.elements.replace_silently(elements.into_iter().collect());
        self.hub.notify_change(ChangeEvent::Changed);
    }

    pub fn clear(&self) {
        self.elements.clear(&self.hub);
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.elements.to_vec()
    }
}

impl<T: Clone + 'static> DataSource<T> for ListData<T> {
    fn get_with(&self, position: usize, _intent: Intent) -> Result<T> {
        self.elements.get(position)
    }

    fn size(&self) -> usize {
        self.elements.len()
    }
}

impl<T> Loadable for ListData<T> {
    fn is_loading(&self) -> bool {
        false
    }

    fn available(&self) -> Available {
        Available::Exhausted
    }

    fn invalidate(&self) {}

    fn refresh(&self) {}

    fn reload(&self) {}
}

impl<T> ObserverHooks for ListData<T> {
    fn hub(&self) -> &ObserverHub {
        &self.hub
    }
}

impl<T> std::fmt::Debug for ListData<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListData")
            .field("observers", &self.hub.data.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Observable;
    use crate::observers::Recorder;

    #[test]
    fn test_edits_notify_and_keep_size_consistent() {
        let list = ListData::from_vec(vec![1, 2, 3]);
        let recorder = Recorder::new();
        list.register_data_observer(recorder.clone());

        list.push(4);
        list.insert(0, 0).expect("insert");
        list.set(2, 20).expect("set");
        list.remove(1).expect("remove");
        list.move_range(0, 2, 2).expect("move");
        list.extend(vec![7, 8]);
        list.remove_range(1, 3).expect("remove range");

        assert_eq!(recorder.shadow_size(3), Some(list.size()));
        assert_eq!(list.to_vec(), vec![3, 7, 8]);
    }

    #[test]
    fn test_replace_all_is_full_change() {
        let list = ListData::from_vec(vec!["a"]);
        let recorder = Recorder::new();
        list.register_data_observer(recorder.clone());
        list.replace_all(["b", "c"]);
        assert_eq!(recorder.changes(), vec![ChangeEvent::Changed]);
        assert_eq!(list.size(), 2);
    }

    #[test]
    fn test_not_loadable() {
        let list: Rc<ListData<u8>> = ListData::new();
        assert!(!list.is_loading());
        assert_eq!(list.available(), Available::Exhausted);
        assert!(list.is_empty());
    }
}
