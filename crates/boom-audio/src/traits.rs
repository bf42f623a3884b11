//! MIDI sink trait and error types.

use boom_ir::MidiMessage;

/// Error type for audio and MIDI device operations.
#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error("no audio output device available")]
    NoDevice,

    #[error("audio device init error: {0}")]
    DeviceInit(String),

    #[error("audio stream create error: {0}")]
    StreamCreate(String),

    #[error("playback error: {0}")]
    Playback(String),

    #[error("MIDI init error: {0}")]
    MidiInit(String),

    #[error("no MIDI output port matching {0:?}")]
    MidiPortNotFound(String),

    #[error("MIDI connect error: {0}")]
    MidiConnect(String),

    #[error("MIDI send error: {0}")]
    MidiSend(String),
}

/// Destination for scheduled MIDI messages, driven from the dispatch thread.
pub trait MidiSink: Send {
    /// Name shown in logs.
    fn name(&self) -> &str;

    /// Deliver one message now.
    fn send(&mut self, message: &MidiMessage) -> Result<(), AudioError>;
}
