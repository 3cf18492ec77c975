//! Sorted position index for filtered views.
//!
//! Keys are the inner positions of included elements, strictly ascending; a
//! key's slot in the vector is its view position.

use std::ops::Range;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct FilterIndex {
    keys: Vec<usize>,
}

impl FilterIndex {
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Inner position behind view position `view`
    pub fn key(&self, view: usize) -> Option<usize> {
        self.keys.get(view).copied()
    }

    #[cfg(test)]
    pub fn keys(&self) -> &[usize] {
        &self.keys
    }

    /// View slot of the first key at or after `inner`
    pub fn lower_bound(&self, inner: usize) -> usize {
        self.keys.partition_point(|&key| key < inner)
    }

    /// `Ok(view)` if `inner` is included, otherwise `Err(view)` where it would be inserted
    pub fn find(&self, inner: usize) -> Result<usize, usize> {
        self.keys.binary_search(&inner)
    }

    pub fn reset(&mut self, keys: Vec<usize>) {
        debug_assert!(keys.windows(2).all(|pair| pair[0] < pair[1]));
        self.keys = keys;
    }

    pub fn insert_at(&mut self, view: usize, inner: usize) {
        self.keys.insert(view, inner);
    }

    pub fn remove_at(&mut self, view: usize) -> usize {
        self.keys.remove(view)
    }

    /// Insert ascending keys that all fall in one gap. Returns the view slot of the first.
    pub fn insert_run(&mut self, run: &[usize]) -> usize {
        let Some(&first) = run.first() else {
            return 0;
        };
        let view = self.lower_bound(first);
        self.keys.splice(view..view, run.iter().copied());
        view
    }

    /// Remove keys in `inner`. Returns the view slot they started at and how many were removed.
    pub fn remove_range(&mut self, inner: Range<usize>) -> (usize, usize) {
        let start = self.lower_bound(inner.start);
        let end = self.lower_bound(inner.end);
        self.keys.drain(start..end);
        (start, end - start)
    }

    /// Add `delta` to every key in `inner`. The shifted keys must not cross any other key.
    pub fn shift(&mut self, inner: Range<usize>, delta: isize) {
        let start = self.lower_bound(inner.start);
        let end = self.lower_bound(inner.end);
        for key in &mut self.keys[start..end] {
            *key = key.wrapping_add_signed(delta);
        }
    }
}
