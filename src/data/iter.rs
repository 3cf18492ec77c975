//! Position-based iteration over a data source.

use crate::data::DataSource;
use std::marker::PhantomData;

/// Iterates positions `0..size()`, re-reading the size at each step.
///
/// Iteration stops early at the first element that can no longer be read.
pub struct DataIter<'a, T, D: DataSource<T> + ?Sized> {
    source: &'a D,
    position: usize,
    _element: PhantomData<fn() -> T>,
}

impl<'a, T, D: DataSource<T> + ?Sized> DataIter<'a, T, D> {
    pub fn new(source: &'a D) -> Self {
        Self {
            source,
            position: 0,
            _element: PhantomData,
        }
    }
}

impl<T, D: DataSource<T> + ?Sized> Iterator for DataIter<'_, T, D> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if self.position >= self.source.size() {
            return None;
        }
        match self.source.get(self.position) {
            Ok(element) => {
                self.position += 1;
                Some(element)
            }
            Err(e) => {
                tracing::debug!("Iteration stopped at {}: {}", self.position, e);
                self.position = usize::MAX;
                None
            }
        }
    }
}
