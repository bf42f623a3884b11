//! Standalone audio clock and MIDI output for BOOM.

mod cpal_backend;
mod midir_sink;
mod sinks;
mod traits;

pub use cpal_backend::LivePlayback;
pub use midir_sink::{list_midi_devices, MidirSink};
pub use sinks::{LogSink, RecordingSink};
pub use traits::{AudioError, MidiSink};
