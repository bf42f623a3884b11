//! Sinks that do not need MIDI hardware.

use std::sync::{Arc, Mutex};

use boom_ir::MidiMessage;
use tracing::info;

use crate::traits::{AudioError, MidiSink};

/// Writes every message to the log. Used when no MIDI port is configured.
#[derive(Debug, Default)]
pub struct LogSink;

impl MidiSink for LogSink {
    fn name(&self) -> &str {
        "log"
    }

    fn send(&mut self, message: &MidiMessage) -> Result<(), AudioError> {
        info!(
            on = message.is_note_on(),
            channel = message.channel() + 1,
            pitch = message.pitch(),
            velocity = message.velocity(),
            "MIDI"
        );
        Ok(())
    }
}

/// Collects messages in memory so they can be inspected after playback.
#[derive(Clone, Debug, Default)]
pub struct RecordingSink {
    messages: Arc<Mutex<Vec<MidiMessage>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything received so far.
    pub fn messages(&self) -> Vec<MidiMessage> {
        match self.messages.lock() {
            Ok(messages) => messages.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl MidiSink for RecordingSink {
    fn name(&self) -> &str {
        "recording"
    }

    fn send(&mut self, message: &MidiMessage) -> Result<(), AudioError> {
        let mut messages = self
            .messages
            .lock()
            .map_err(|e| AudioError::MidiSend(e.to_string()))?;
        messages.push(*message);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_sink_shares_messages_between_clones() {
        let sink = RecordingSink::new();
        let mut writer = sink.clone();
        writer.send(&MidiMessage::note_on(0, 36, 100)).unwrap();
        writer.send(&MidiMessage::note_off(0, 36)).unwrap();

        assert_eq!(
            sink.messages(),
            [MidiMessage::note_on(0, 36, 100), MidiMessage::note_off(0, 36)]
        );
    }

    #[test]
    fn log_sink_accepts_everything() {
        let mut sink = LogSink;
        assert!(sink.send(&MidiMessage::note_on(9, 42, 64)).is_ok());
        assert_eq!(sink.name(), "log");
    }
}
