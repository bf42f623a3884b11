//! MIDI messages and per-block timed events.

/// A channel voice message produced by the scheduler.
///
/// `channel` is the 0-based wire channel (plugin channel 1 = 0).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MidiMessage {
    NoteOn { channel: u8, pitch: u8, velocity: u8 },
    NoteOff { channel: u8, pitch: u8, velocity: u8 },
}

impl MidiMessage {
    pub const fn note_on(channel: u8, pitch: u8, velocity: u8) -> Self {
        Self::NoteOn { channel, pitch, velocity }
    }

    /// Note off with release velocity 0.
    pub const fn note_off(channel: u8, pitch: u8) -> Self {
        Self::NoteOff { channel, pitch, velocity: 0 }
    }

    pub const fn channel(&self) -> u8 {
        match *self {
            Self::NoteOn { channel, .. } | Self::NoteOff { channel, .. } => channel,
        }
    }

    pub const fn pitch(&self) -> u8 {
        match *self {
            Self::NoteOn { pitch, .. } | Self::NoteOff { pitch, .. } => pitch,
        }
    }

    pub const fn velocity(&self) -> u8 {
        match *self {
            Self::NoteOn { velocity, .. } | Self::NoteOff { velocity, .. } => velocity,
        }
    }

    pub const fn is_note_on(&self) -> bool {
        matches!(self, Self::NoteOn { .. })
    }

    /// Raw three-byte encoding (status, data1, data2).
    pub const fn to_bytes(&self) -> [u8; 3] {
        let status = match self {
            Self::NoteOn { .. } => 0x90,
            Self::NoteOff { .. } => 0x80,
        };
        [
            status | (self.channel() & 0x0F),
            self.pitch() & 0x7F,
            self.velocity() & 0x7F,
        ]
    }
}

/// A MIDI message placed at a sample offset inside one processing block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BlockEvent {
    /// Offset from the first sample of the block
    pub sample_offset: u32,
    pub message: MidiMessage,
}

impl BlockEvent {
    pub const fn new(sample_offset: u32, message: MidiMessage) -> Self {
        Self { sample_offset, message }
    }
}

/// Rank of an event among others at the same position.
///
/// Releases of sounding notes go before new attacks so a retriggered pitch
/// never overlaps itself. Both events of a zero-length note share the
/// `Instant` rank and are pushed together, so the pair stays adjacent and
/// finishes before a longer note on the same pitch starts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EventOrder {
    Release,
    Instant,
    Trigger,
}
