//! Lock-free pattern handoff from the editing thread to the audio thread.
//!
//! The editor publishes immutable `Arc<Pattern>` snapshots over a
//! single-producer/single-consumer ring. Once per block the audio thread
//! adopts the newest one and sends the snapshots it replaced back over a
//! second ring, so the last reference is always dropped (and the pattern
//! freed) on the publishing side.

use alloc::sync::Arc;

use boom_ir::Pattern;
use ringbuf::traits::{Consumer, Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};

/// Snapshots that can be in flight before `publish` starts rejecting.
pub const PATTERN_QUEUE_DEPTH: usize = 8;

/// Create a connected publisher/reader pair starting from `initial`.
pub fn pattern_slot(initial: Arc<Pattern>) -> (PatternPublisher, PatternReader) {
    let (updates_tx, updates_rx) = HeapRb::<Arc<Pattern>>::new(PATTERN_QUEUE_DEPTH).split();
    // Every retired snapshot was once an update; twice the depth never fills
    // while the publisher collects before each publish.
    let (retired_tx, retired_rx) = HeapRb::<Arc<Pattern>>::new(PATTERN_QUEUE_DEPTH * 2).split();

    (
        PatternPublisher { updates: updates_tx, retired: retired_rx },
        PatternReader { current: initial, updates: updates_rx, retired: retired_tx },
    )
}

/// Editing-thread end of the handoff.
pub struct PatternPublisher {
    updates: HeapProd<Arc<Pattern>>,
    retired: HeapCons<Arc<Pattern>>,
}

impl PatternPublisher {
    /// Offer a new snapshot to the audio thread.
    ///
    /// Gives the snapshot back when the queue is full; the audio thread has
    /// stopped consuming, and a later publish will carry the newer state.
    pub fn publish(&mut self, pattern: Arc<Pattern>) -> Result<(), Arc<Pattern>> {
        self.collect_retired();
        self.updates.try_push(pattern)
    }

    /// Drop snapshots the audio thread no longer uses. Returns how many.
    pub fn collect_retired(&mut self) -> usize {
        let mut freed = 0;
        while let Some(old) = self.retired.try_pop() {
            drop(old);
            freed += 1;
        }
        freed
    }
}

/// Audio-thread end of the handoff.
pub struct PatternReader {
    current: Arc<Pattern>,
    updates: HeapCons<Arc<Pattern>>,
    retired: HeapProd<Arc<Pattern>>,
}

impl PatternReader {
    /// Adopt the newest published snapshot, if any. Realtime safe.
    ///
    /// Returns true when the current pattern changed.
    pub fn refresh(&mut self) -> bool {
        let mut changed = false;
        while let Some(next) = self.updates.try_pop() {
            let old = core::mem::replace(&mut self.current, next);
            // Only drops here if the publisher went away
            let _ = self.retired.try_push(old);
            changed = true;
        }
        changed
    }

    /// The pattern used for the current block.
    pub fn current(&self) -> &Pattern {
        &self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boom_ir::Note;

    fn pattern_with(n: usize) -> Arc<Pattern> {
        let notes = (0..n).map(|i| Note::drum(0, i as i32 * 24, 24, 100)).collect();
        Arc::new(Pattern::from_notes(notes))
    }

    #[test]
    fn reader_starts_with_initial() {
        let (_tx, rx) = pattern_slot(pattern_with(3));
        assert_eq!(rx.current().len(), 3);
    }

    #[test]
    fn refresh_adopts_newest() {
        let (mut tx, mut rx) = pattern_slot(pattern_with(0));
        tx.publish(pattern_with(1)).unwrap();
        tx.publish(pattern_with(2)).unwrap();

        assert!(rx.refresh());
        assert_eq!(rx.current().len(), 2);
        assert!(!rx.refresh());
    }

    #[test]
    fn replaced_snapshots_return_to_publisher() {
        let (mut tx, mut rx) = pattern_slot(pattern_with(0));
        let first = pattern_with(1);
        tx.publish(first.clone()).unwrap();
        rx.refresh();
        tx.publish(pattern_with(2)).unwrap();
        rx.refresh();

        // initial and `first` were retired; only our clone keeps `first` alive
        assert_eq!(tx.collect_retired(), 2);
        assert_eq!(Arc::strong_count(&first), 1);
    }

    #[test]
    fn full_queue_rejects_publish() {
        let (mut tx, mut rx) = pattern_slot(pattern_with(0));
        for i in 0..PATTERN_QUEUE_DEPTH {
            tx.publish(pattern_with(i)).unwrap();
        }
        let rejected = tx.publish(pattern_with(42)).unwrap_err();
        assert_eq!(rejected.len(), 42);

        rx.refresh();
        assert!(tx.publish(pattern_with(42)).is_ok());
        rx.refresh();
        assert_eq!(rx.current().len(), 42);
    }
}
