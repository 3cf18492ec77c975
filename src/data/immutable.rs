//! Fixed contents that never notify.

use crate::data::{DataSource, Intent, Loadable, ObserverHooks};
use crate::error::{Error, Result};
use crate::observers::{Available, ObserverHub};
use std::rc::Rc;

pub struct ImmutableData<T> {
    hub: ObserverHub,
    elements: Vec<T>,
}

impl<T: Clone + 'static> ImmutableData<T> {
    pub fn new(elements: Vec<T>) -> Rc<Self> {
        Rc::new(Self {
            hub: ObserverHub::new(),
            elements,
        })
    }
}

impl<T: Clone + 'static> DataSource<T> for ImmutableData<T> {
    fn get_with(&self, position: usize, _intent: Intent) -> Result<T> {
        self.elements
            .get(position)
            .cloned()
            .ok_or(Error::OutOfRange {
                position,
                size: self.elements.len(),
            })
    }

    fn size(&self) -> usize {
        self.elements.len()
    }
}

impl<T> Loadable for ImmutableData<T> {
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

impl<T> ObserverHooks for ImmutableData<T> {
    fn hub(&self) -> &ObserverHub {
        &self.hub
    }
}

impl<T> std::fmt::Debug for ImmutableData<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImmutableData")
            .field("size", &self.elements.len())
            .finish()
    }
}
