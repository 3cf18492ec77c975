//! Observer Registry
//!
//! Copy-on-write multicast set. Registration replaces the shared snapshot, so
//! a dispatch in progress keeps iterating the observers it started with.

use std::cell::RefCell;
use std::rc::Rc;

/// Idempotent, identity-keyed set of observers of one kind
pub struct Observers<O: ?Sized> {
    snapshot: RefCell<Rc<[Rc<O>]>>,
}

impl<O: ?Sized> Observers<O> {
    pub fn new() -> Self {
        Self {
            snapshot: RefCell::new(Rc::from(Vec::new())),
        }
    }

    /// Add an observer. Returns `false` if it was already registered.
    pub fn register(&self, observer: Rc<O>) -> bool {
        let mut snapshot = self.snapshot.borrow_mut();
        if snapshot.iter().any(|o| Rc::ptr_eq(o, &observer)) {
            return false;
        }
        let mut next: Vec<Rc<O>> = snapshot.iter().cloned().collect();
        next.push(observer);
        *snapshot = Rc::from(next);
        true
    }

    /// Remove an observer. Returns `false` if it was not registered.
    pub fn unregister(&self, observer: &Rc<O>) -> bool {
        let mut snapshot = self.snapshot.borrow_mut();
        let Some(index) = snapshot.iter().position(|o| Rc::ptr_eq(o, observer)) else {
            return false;
        };
        let mut next: Vec<Rc<O>> = snapshot.iter().cloned().collect();
        next.remove(index);
        *snapshot = Rc::from(next);
        true
    }

    pub fn contains(&self, observer: &Rc<O>) -> bool {
        self.snapshot.borrow().iter().any(|o| Rc::ptr_eq(o, observer))
    }

    pub fn len(&self) -> usize {
        self.snapshot.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current membership, detached from later registrations
    pub fn snapshot(&self) -> Rc<[Rc<O>]> {
        self.snapshot.borrow().clone()
    }

    /// Invoke `f` for each observer registered when the dispatch began
    pub fn for_each(&self, mut f: impl FnMut(&O)) {
        let snapshot = self.snapshot();
        for observer in snapshot.iter() {
            f(observer);
        }
    }
}

impl<O: ?Sized> Default for Observers<O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O: ?Sized> std::fmt::Debug for Observers<O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observers")
            .field("count", &self.len())
            .finish()
    }
}
