//! Change Events
//!
//! The vocabulary of structured change notifications emitted by data sources,
//! and the `Available` count broadcast alongside them.

/// A structured change to an element sequence
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChangeEvent {
    /// Everything may have changed, including the size
    Changed,
    /// Elements in `[start, start + count)` were replaced in place
    RangeChanged { start: usize, count: usize },
    /// `count` elements were inserted at `start`
    RangeInserted { start: usize, count: usize },
    /// `count` elements were removed from `start`
    RangeRemoved { start: usize, count: usize },
    /// `count` elements moved so the first now sits at `to`
    RangeMoved { from: usize, to: usize, count: usize },
}

impl ChangeEvent {
    pub fn changed(start: usize, count: usize) -> Self {
        ChangeEvent::RangeChanged { start, count }
    }

    pub fn inserted(start: usize, count: usize) -> Self {
        ChangeEvent::RangeInserted { start, count }
    }

    pub fn removed(start: usize, count: usize) -> Self {
        ChangeEvent::RangeRemoved { start, count }
    }

    pub fn moved(from: usize, to: usize, count: usize) -> Self {
        ChangeEvent::RangeMoved { from, to, count }
    }

    /// Signed size delta implied by this event; `None` for a full change
    pub fn size_delta(&self) -> Option<isize> {
        match *self {
            ChangeEvent::Changed => None,
            ChangeEvent::RangeInserted { count, .. } => Some(count as isize),
            ChangeEvent::RangeRemoved { count, .. } => Some(-(count as isize)),
            ChangeEvent::RangeChanged { .. } | ChangeEvent::RangeMoved { .. } => Some(0),
        }
    }

    /// Size after applying this event to a sequence of `size` elements.
    ///
    /// Returns `None` if the event addresses positions outside the sequence,
    /// or if it is a full change (whose resulting size is unknowable).
    pub fn apply_to_size(&self, size: usize) -> Option<usize> {
        match *self {
            ChangeEvent::Changed => None,
            ChangeEvent::RangeChanged { start, count } => {
                (start.checked_add(count)? <= size).then_some(size)
            }
            ChangeEvent::RangeInserted { start, count } => {
                (start <= size).then(|| size + count)
            }
            ChangeEvent::RangeRemoved { start, count } => {
                (start.checked_add(count)? <= size).then(|| size - count)
            }
            ChangeEvent::RangeMoved { from, to, count } => {
                let fits = from.checked_add(count)? <= size && to.checked_add(count)? <= size;
                fits.then_some(size)
            }
        }
    }

    /// Whether the event carries no effective change
    pub fn is_empty(&self) -> bool {
        match *self {
            ChangeEvent::Changed => false,
            ChangeEvent::RangeChanged { count, .. }
            | ChangeEvent::RangeInserted { count, .. }
            | ChangeEvent::RangeRemoved { count, .. }
            | ChangeEvent::RangeMoved { count, .. } => count == 0,
        }
    }
}

/// How many more elements can be loaded beyond the current contents
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Available {
    /// Not known; distinct from exhausted
    #[default]
    Unknown,
    /// No more elements can be loaded
    Exhausted,
    /// At least this many more (always > 0)
    AtLeast(usize),
    /// More are available, count unknown
    Indeterminate,
}

impl Available {
    /// Map a remaining-count estimate; `0` is exhausted, `usize::MAX` indeterminate
    pub fn from_remaining(remaining: usize) -> Self {
        match remaining {
            0 => Available::Exhausted,
            usize::MAX => Available::Indeterminate,
            n => Available::AtLeast(n),
        }
    }

    /// Whether another load could yield elements
    pub fn has_more(&self) -> bool {
        !matches!(self, Available::Exhausted)
    }

    /// Known count, if any
    pub fn count(&self) -> Option<usize> {
        match *self {
            Available::Exhausted => Some(0),
            Available::AtLeast(n) => Some(n),
            Available::Unknown | Available::Indeterminate => None,
        }
    }
}
