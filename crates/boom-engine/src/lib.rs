//! Realtime engine for BOOM.
//!
//! Schedules the current pattern as sample-accurate MIDI for each audio
//! block, following the host transport and wrapping at the loop end.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod clock;
mod midi_buffer;
mod params;
mod pattern_slot;
mod processor;
pub mod scheduler;

pub use clock::FreeRunningTransport;
pub use midi_buffer::{MidiBuffer, MIDI_BUFFER_CAPACITY};
pub use params::SharedParams;
pub use pattern_slot::{pattern_slot, PatternPublisher, PatternReader, PATTERN_QUEUE_DEPTH};
pub use processor::Processor;
pub use scheduler::{schedule_block, BlockTiming, Voicing};
