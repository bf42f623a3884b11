//! MIDI output through midir.

use midir::{MidiOutput, MidiOutputConnection};
use tracing::info;

use boom_ir::MidiMessage;

use crate::traits::{AudioError, MidiSink};

const CLIENT_NAME: &str = "boom";

/// Names of the MIDI output ports on this system.
pub fn list_midi_devices() -> Result<Vec<String>, AudioError> {
    let output = MidiOutput::new(CLIENT_NAME).map_err(|e| AudioError::MidiInit(e.to_string()))?;
    Ok(output
        .ports()
        .iter()
        .filter_map(|port| output.port_name(port).ok())
        .collect())
}

/// A connected midir output port.
pub struct MidirSink {
    name: String,
    connection: MidiOutputConnection,
}

impl MidirSink {
    /// Connect to the first port whose name contains `device`, or to the
    /// first port at all when `device` is `None`.
    pub fn connect(device: Option<&str>) -> Result<Self, AudioError> {
        let output =
            MidiOutput::new(CLIENT_NAME).map_err(|e| AudioError::MidiInit(e.to_string()))?;

        let wanted = device.unwrap_or_default();
        let port = output
            .ports()
            .into_iter()
            .find(|port| {
                output
                    .port_name(port)
                    .map(|name| name.contains(wanted))
                    .unwrap_or(false)
            })
            .ok_or_else(|| AudioError::MidiPortNotFound(wanted.to_string()))?;

        let name = output
            .port_name(&port)
            .map_err(|e| AudioError::MidiConnect(e.to_string()))?;
        let connection = output
            .connect(&port, "boom output")
            .map_err(|e| AudioError::MidiConnect(e.to_string()))?;

        info!(device = name, "Connected MIDI output.");
        Ok(Self { name, connection })
    }
}

impl MidiSink for MidirSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn send(&mut self, message: &MidiMessage) -> Result<(), AudioError> {
        self.connection
            .send(&message.to_bytes())
            .map_err(|e| AudioError::MidiSend(e.to_string()))
    }
}
