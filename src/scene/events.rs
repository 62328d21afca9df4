use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

/// Deferred actions the scene schedules against its own clock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneEvent {
    /// One bird of the arrival burst
    SpawnBird,
    /// Recurring check that may add another bird
    SpawnCheck,
    /// Open the audio output and start the song cadence
    StartSong,
    /// Pick and play the next call, then schedule the one after
    Song,
    /// Second chirp answering the first
    Chirp,
}

impl SceneEvent {
    /// Birds spawned for the current tree; dropped when the tree is replaced
    pub fn is_bird_event(self) -> bool {
        matches!(self, Self::SpawnBird | Self::SpawnCheck)
    }
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    at: f64,
    seq: u64,
    event: SceneEvent,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.at
            .total_cmp(&other.at)
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

/// Min-heap of `(fire_at, event)`. Events due at the same time fire in the
/// order they were scheduled.
#[derive(Debug, Default)]
pub struct EventQueue {
    heap: BinaryHeap<Reverse<Entry>>,
    next_seq: u64,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, at: f64, event: SceneEvent) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Reverse(Entry { at, seq, event }));
    }

    /// Remove and return the earliest event due at or before `now`
    pub fn pop_due(&mut self, now: f64) -> Option<SceneEvent> {
        if self.heap.peek().is_some_and(|Reverse(e)| e.at <= now) {
            self.heap.pop().map(|Reverse(e)| e.event)
        } else {
            None
        }
    }

    /// Keep only events matching the predicate
    pub fn retain(&mut self, mut keep: impl FnMut(SceneEvent) -> bool) {
        self.heap.retain(|Reverse(e)| keep(e.event));
    }

    pub fn clear(&mut self) {
        self.heap.clear();
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn count(&self, event: SceneEvent) -> usize {
        self.heap.iter().filter(|Reverse(e)| e.event == event).count()
    }

    /// Fire time of the next pending event
    pub fn next_at(&self) -> Option<f64> {
        self.heap.peek().map(|Reverse(e)| e.at)
    }
}
