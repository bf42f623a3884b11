//! Core types for BOOM.
//!
//! This crate defines the data shared by the pattern editors and the
//! realtime scheduler: tick timing, notes and patterns, drum lanes,
//! engine parameters, host transport snapshots and MIDI events.
//!
//! Designed to be `no_std` compatible with the `alloc` crate.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod drum_rows;
mod event;
mod params;
mod pattern;
mod ticks;
mod transport;

pub use drum_rows::{DrumRows, DEFAULT_DRUM_ROWS, MAX_DRUM_ROWS};
pub use event::{BlockEvent, EventOrder, MidiMessage};
pub use params::{Bars, Engine, ParseParamError, MAX_SEED};
pub use pattern::{Note, Pattern, DEFAULT_VELOCITY, DRUM_BASE_PITCH};
pub use ticks::{
    floor_mod, pattern_length_ticks, ParseTimeSignatureError, TimeSignature, DEFAULT_TEMPO,
    TICKS_PER_QUARTER, TICKS_PER_SIXTEENTH,
};
pub use transport::TransportSnapshot;
