//! One-shot timers on the owner context.
//!
//! Deadlines sit in a min-heap; tasks sit in a map keyed by timer id, so a
//! cancel is a single map removal and stale heap entries are skipped on pop.

use ahash::AHashMap;
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::time::Instant;

pub(crate) type TimerTask = Box<dyn FnOnce()>;

#[derive(Default)]
pub(crate) struct TimerQueue {
    deadlines: BinaryHeap<Reverse<(Instant, u64)>>,
    tasks: AHashMap<u64, TimerTask>,
}

impl TimerQueue {
    pub(crate) fn schedule(&mut self, id: u64, deadline: Instant, task: TimerTask) {
        self.deadlines.push(Reverse((deadline, id)));
        self.tasks.insert(id, task);
    }

    pub(crate) fn cancel(&mut self, id: u64) -> bool {
        self.tasks.remove(&id).is_some()
    }

    /// Pop the earliest live task whose deadline has passed
    pub(crate) fn pop_due(&mut self, now: Instant) -> Option<TimerTask> {
        while let Some(Reverse((deadline, id))) = self.deadlines.peek().copied() {
            if deadline > now {
                return None;
            }
            self.deadlines.pop();
            if let Some(task) = self.tasks.remove(&id) {
                return Some(task);
            }
        }
        None
    }

    /// Earliest live deadline
    pub(crate) fn next_deadline(&mut self) -> Option<Instant> {
        while let Some(Reverse((deadline, id))) = self.deadlines.peek().copied() {
            if self.tasks.contains_key(&id) {
                return Some(deadline);
            }
            self.deadlines.pop();
        }
        None
    }

    pub(crate) fn len(&self) -> usize {
        self.tasks.len()
    }
}
