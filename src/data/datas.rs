//! Constructors and combinators for data instances.

use crate::data::{
    Data, DataIter, DataSource, FilterData, ImmutableData, LimitData, TransformData,
};
use std::rc::Rc;

/// View of the elements of `source` that satisfy `predicate`
pub fn filter<T: Clone + 'static>(
    source: Rc<dyn Data<T>>,
    predicate: impl Fn(&T) -> bool + 'static,
) -> Rc<FilterData<T>> {
    FilterData::new(source, predicate)
}

/// View applying `transform` to each element of `source`
pub fn map<S: 'static, T: 'static>(
    source: Rc<dyn Data<S>>,
    transform: impl Fn(S) -> T + 'static,
) -> Rc<TransformData<S, T>> {
    TransformData::new(source, transform)
}

/// View of at most the first `limit` elements of `source`
pub fn limit<T: Clone + 'static>(source: Rc<dyn Data<T>>, limit: usize) -> Rc<LimitData<T>> {
    LimitData::new(source, limit)
}

pub fn iter<T, D: DataSource<T> + ?Sized>(source: &D) -> DataIter<'_, T, D> {
    DataIter::new(source)
}

/// Snapshot of the current contents
pub fn to_vec<T, D: DataSource<T> + ?Sized>(source: &D) -> Vec<T> {
    iter(source).collect()
}

pub fn immutable<T: Clone + 'static>(elements: Vec<T>) -> Rc<ImmutableData<T>> {
    ImmutableData::new(elements)
}

pub fn empty<T: Clone + 'static>() -> Rc<ImmutableData<T>> {
    ImmutableData::new(Vec::new())
}
