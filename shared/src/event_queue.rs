use std::{cmp::Reverse, collections::BinaryHeap, collections::HashMap};

/// Deferred events keyed by simulation time in milliseconds.
///
/// Events due at the same instant come out in the order they were scheduled.
pub struct EventQueue<T> {
    heap: BinaryHeap<Reverse<(u64, u64)>>,
    items: HashMap<u64, T>,
    next_seq: u64,
}

impl<T> Default for EventQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> EventQueue<T> {
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            items: HashMap::new(),
            next_seq: 0,
        }
    }

    pub fn schedule(&mut self, fire_at_ms: u64, item: T) {
        let seq = self.next_seq;
        self.next_seq = self.next_seq.wrapping_add(1);
        self.items.insert(seq, item);
        self.heap.push(Reverse((fire_at_ms, seq)));
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.heap.peek().map(|Reverse((fire_at, _))| *fire_at)
    }

    /// Removes and returns the earliest event due at or before `now_ms`
    pub fn pop_due(&mut self, now_ms: u64) -> Option<T> {
        let Reverse((fire_at, _)) = self.heap.peek()?;
        if *fire_at > now_ms {
            return None;
        }
        let Reverse((_, seq)) = self.heap.pop()?;
        self.items.remove(&seq)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
