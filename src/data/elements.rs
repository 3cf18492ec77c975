//! Element storage with change notification.
//!
//! Every mutation completes and releases its borrow before the matching event
//! is dispatched, so observers may read back into the owning data.

use crate::error::{Error, Result};
use crate::observers::{ChangeEvent, ObserverHub};
use std::cell::RefCell;

pub(crate) struct Elements<T> {
    items: RefCell<Vec<T>>,
}

impl<T> Elements<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items: RefCell::new(items),
        }
    }

    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }
}

impl<T: Clone> Elements<T> {

    pub fn get(&self, position: usize) -> Result<T> {
        let items = self.items.borrow();
        items.get(position).cloned().ok_or(Error::OutOfRange {
            position,
            size: items.len(),
        })
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.items.borrow().clone()
    }

    pub fn push(&self, hub: &ObserverHub, item: T) {
        let start = {
            let mut items = self.items.borrow_mut();
            items.push(item);
            items.len() - 1
        };
        hub.notify_change(ChangeEvent::inserted(start, 1));
    }

    pub fn extend(&self, hub: &ObserverHub, new_items: Vec<T>) {
        let count = new_items.len();
        let start = {
            let mut items = self.items.borrow_mut();
            let start = items.len();
            items.extend(new_items);
            start
        };
        hub.notify_change(ChangeEvent::inserted(start, count));
    }

    pub fn insert_all(&self, hub: &ObserverHub, index: usize, new_items: Vec<T>) -> Result<()> {
        let count = new_items.len();
        {
            let mut items = self.items.borrow_mut();
            check_bounds(index, items.len() + 1)?;
            items.splice(index..index, new_items);
        }
        hub.notify_change(ChangeEvent::inserted(index, count));
        Ok(())
    }

    pub fn set(&self, hub: &ObserverHub, index: usize, item: T) -> Result<T> {
        let previous = {
            let mut items = self.items.borrow_mut();
            check_bounds(index, items.len())?;
            std::mem::replace(&mut items[index], item)
        };
        hub.notify_change(ChangeEvent::changed(index, 1));
        Ok(previous)
    }

    pub fn remove_range(&self, hub: &ObserverHub, start: usize, count: usize) -> Result<Vec<T>> {
        let removed: Vec<T> = {
            let mut items = self.items.borrow_mut();
            check_range(start, count, items.len())?;
            items.drain(start..start + count).collect()
        };
        hub.notify_change(ChangeEvent::removed(start, count));
        Ok(removed)
    }

    /// Move `count` items so the first lands at `to`; both ranges must fit the current length
    pub fn move_range(&self, hub: &ObserverHub, from: usize, to: usize, count: usize) -> Result<()> {
        {
            let mut items = self.items.borrow_mut();
            check_range(from, count, items.len())?;
            check_range(to, count, items.len())?;
            if from == to || count == 0 {
                return Ok(());
            }
            let moved: Vec<T> = items.drain(from..from + count).collect();
            items.splice(to..to, moved);
        }
        hub.notify_change(ChangeEvent::moved(from, to, count));
        Ok(())
    }

    /// Replace all contents: a change over the common prefix, then an insert or removal for the rest
    pub fn overwrite(&self, hub: &ObserverHub, new_items: Vec<T>) {
        let new_len = new_items.len();
        let mut incoming = new_items.into_iter();
        let (old_len, common) = {
            let mut items = self.items.borrow_mut();
            let old_len = items.len();
            for (slot, item) in items.iter_mut().zip(incoming.by_ref()) {
                *slot = item;
            }
            (old_len, old_len.min(new_len))
        };
        hub.notify_change(ChangeEvent::changed(0, common));

        if new_len > old_len {
            self.items.borrow_mut().extend(incoming);
            hub.notify_change(ChangeEvent::inserted(old_len, new_len - old_len));
        } else if old_len > new_len {
            self.items.borrow_mut().truncate(new_len);
            hub.notify_change(ChangeEvent::removed(new_len, old_len - new_len));
        }
    }

    /// Swap contents without notifying; the caller announces the change
    pub fn replace_silently(&self, items: Vec<T>) {
        *self.items.borrow_mut() = items;
    }

    /// Remove everything. Returns the number of items removed.
    pub fn clear(&self, hub: &ObserverHub) -> usize {
        let count = {
            let mut items = self.items.borrow_mut();
            let count = items.len();
            items.clear();
            count
        };
        hub.notify_change(ChangeEvent::removed(0, count));
        count
    }
}

fn check_bounds(position: usize, size: usize) -> Result<()> {
    if position < size {
        Ok(())
    } else {
        Err(Error::OutOfRange { position, size })
    }
}

fn check_range(start: usize, count: usize, size: usize) -> Result<()> {
    match start.checked_add(count) {
        Some(end) if end <= size => Ok(()),
        _ => Err(Error::OutOfRange {
            position: start.saturating_add(count),
            size,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observers::Recorder;
    use std::rc::Rc;

    fn setup(items: Vec<i32>) -> (Elements<i32>, ObserverHub, Rc<Recorder>) {
        let hub = ObserverHub::new();
        let recorder = Recorder::new();
        hub.data.register(recorder.clone());
        (Elements::new(items), hub, recorder)
    }

    #[test]
    fn test_len_needs_no_clone() {
        struct Handle;
        let elements = Elements::new(vec![Handle, Handle]);
        assert_eq!(elements.len(), 2);
    }

    #[test]
    fn test_overwrite_grows() {
        let (elements, hub, recorder) = setup(vec![1, 2]);
        elements.overwrite(&hub, vec![5, 6, 7, 8]);
        assert_eq!(elements.to_vec(), vec![5, 6, 7, 8]);
        assert_eq!(
            recorder.changes(),
            vec![ChangeEvent::changed(0, 2), ChangeEvent::inserted(2, 2)]
        );
    }

    #[test]
    fn test_overwrite_shrinks() {
        let (elements, hub, recorder) = setup(vec![1, 2, 3]);
        elements.overwrite(&hub, vec![9]);
        assert_eq!(elements.to_vec(), vec![9]);
        assert_eq!(
            recorder.changes(),
            vec![ChangeEvent::changed(0, 1), ChangeEvent::removed(1, 2)]
        );
        assert_eq!(recorder.shadow_size(3), Some(1));
    }

    #[test]
    fn test_move_range_forward_and_back() {
        let (elements, hub, recorder) = setup(vec![0, 1, 2, 3, 4, 5]);
        elements.move_range(&hub, 0, 3, 2).expect("move");
        assert_eq!(elements.to_vec(), vec![2, 3, 4, 0, 1, 5]);
        elements.move_range(&hub, 3, 0, 2).expect("move");
        assert_eq!(elements.to_vec(), vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(
            recorder.changes(),
            vec![ChangeEvent::moved(0, 3, 2), ChangeEvent::moved(3, 0, 2)]
        );
    }

    #[test]
    fn test_bounds_checked() {
        let (elements, hub, recorder) = setup(vec![1, 2]);
        assert!(elements.set(&hub, 2, 0).is_err());
        assert!(elements.insert_all(&hub, 3, vec![0]).is_err());
        assert!(elements.remove_range(&hub, 1, 2).is_err());
        assert!(elements.move_range(&hub, 0, 1, 2).is_err());
        assert!(recorder.changes().is_empty());
    }
}
