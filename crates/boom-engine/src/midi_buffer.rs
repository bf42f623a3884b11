//! Fixed-capacity, sample-ordered MIDI output for one block.

use boom_ir::{BlockEvent, EventOrder};
use heapless::Vec;

/// Most events a single block can carry.
pub const MIDI_BUFFER_CAPACITY: usize = 512;

/// Events for the current block, kept sorted by sample offset.
///
/// Storage is inline, so pushing never allocates. At equal offsets events
/// are ordered by [`EventOrder`], then by insertion.
#[derive(Clone, Debug, Default)]
pub struct MidiBuffer {
    events: Vec<(BlockEvent, EventOrder), MIDI_BUFFER_CAPACITY>,
    /// Events rejected because the block was full (lifetime total).
    dropped: u64,
}

impl MidiBuffer {
    /// Create an empty buffer.
    pub const fn new() -> Self {
        Self { events: Vec::new(), dropped: 0 }
    }

    /// Insert an event at its sorted position.
    ///
    /// Returns false (and counts a drop) when the buffer is full.
    pub fn push(&mut self, event: BlockEvent, order: EventOrder) -> bool {
        let key = (event.sample_offset, order);
        let pos = self
            .events
            .partition_point(|(e, o)| (e.sample_offset, *o) <= key);
        match self.events.insert(pos, (event, order)) {
            Ok(()) => true,
            Err(_) => {
                self.dropped = self.dropped.wrapping_add(1);
                false
            }
        }
    }

    /// Iterate events in playback order.
    pub fn iter(&self) -> impl Iterator<Item = &BlockEvent> + '_ {
        self.events.iter().map(|(e, _)| e)
    }

    /// Get an event by playback index.
    pub fn get(&self, index: usize) -> Option<&BlockEvent> {
        self.events.get(index).map(|(e, _)| e)
    }

    /// Clear all events (start of every block).
    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Total events dropped for lack of space since creation.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boom_ir::MidiMessage;

    fn on(offset: u32, pitch: u8) -> BlockEvent {
        BlockEvent::new(offset, MidiMessage::note_on(0, pitch, 100))
    }

    fn off(offset: u32, pitch: u8) -> BlockEvent {
        BlockEvent::new(offset, MidiMessage::note_off(0, pitch))
    }

    #[test]
    fn events_sorted_by_offset() {
        let mut buf = MidiBuffer::new();
        buf.push(on(300, 36), EventOrder::Trigger);
        buf.push(on(10, 37), EventOrder::Trigger);
        buf.push(on(150, 38), EventOrder::Trigger);

        let offsets: std::vec::Vec<u32> = buf.iter().map(|e| e.sample_offset).collect();
        assert_eq!(offsets, [10, 150, 300]);
    }

    #[test]
    fn release_precedes_trigger_at_same_offset() {
        let mut buf = MidiBuffer::new();
        buf.push(on(64, 36), EventOrder::Trigger);
        buf.push(off(64, 36), EventOrder::Release);

        assert_eq!(buf.get(0), Some(&off(64, 36)));
        assert_eq!(buf.get(1), Some(&on(64, 36)));
    }

    #[test]
    fn instant_pair_precedes_trigger() {
        let mut buf = MidiBuffer::new();
        buf.push(on(0, 40), EventOrder::Trigger);
        buf.push(on(0, 40), EventOrder::Instant);
        buf.push(off(0, 40), EventOrder::Instant);

        let kinds: std::vec::Vec<bool> = buf.iter().map(|e| e.message.is_note_on()).collect();
        assert_eq!(kinds, [true, false, true]);
    }

    #[test]
    fn equal_keys_keep_insertion_order() {
        let mut buf = MidiBuffer::new();
        buf.push(on(5, 36), EventOrder::Trigger);
        buf.push(on(5, 37), EventOrder::Trigger);
        buf.push(on(5, 38), EventOrder::Trigger);

        let pitches: std::vec::Vec<u8> = buf.iter().map(|e| e.message.pitch()).collect();
        assert_eq!(pitches, [36, 37, 38]);
    }

    #[test]
    fn full_buffer_drops_and_counts() {
        let mut buf = MidiBuffer::new();
        for i in 0..MIDI_BUFFER_CAPACITY {
            assert!(buf.push(on(i as u32, 36), EventOrder::Trigger));
        }
        assert!(!buf.push(on(0, 37), EventOrder::Trigger));
        assert_eq!(buf.len(), MIDI_BUFFER_CAPACITY);
        assert_eq!(buf.dropped(), 1);
    }

    #[test]
    fn clear_keeps_drop_count() {
        let mut buf = MidiBuffer::new();
        for i in 0..=MIDI_BUFFER_CAPACITY {
            buf.push(on(i as u32, 36), EventOrder::Trigger);
        }
        assert_eq!(buf.dropped(), 1);

        buf.clear();
        assert!(buf.is_empty());
        assert_eq!(buf.dropped(), 1);
    }
}
