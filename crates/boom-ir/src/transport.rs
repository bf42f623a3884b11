//! Host transport state, read once per block.

use crate::ticks::{TimeSignature, DEFAULT_TEMPO};

/// What the host reports about its playhead for the current block.
///
/// Hosts may omit tempo, meter or position; the accessors fall back to
/// 120 BPM, 4/4 and the song start instead of failing.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TransportSnapshot {
    pub is_playing: bool,
    pub bpm: Option<f64>,
    pub time_signature: Option<TimeSignature>,
    /// Playhead position in quarter notes
    pub position_quarter_notes: Option<f64>,
}

impl TransportSnapshot {
    /// A playing transport with every field reported.
    pub fn playing(bpm: f64, time_signature: TimeSignature, position_quarter_notes: f64) -> Self {
        Self {
            is_playing: true,
            bpm: Some(bpm),
            time_signature: Some(time_signature),
            position_quarter_notes: Some(position_quarter_notes),
        }
    }

    /// A stopped transport.
    pub fn stopped() -> Self {
        Self::default()
    }

    pub fn tempo(&self) -> f64 {
        self.bpm.unwrap_or(DEFAULT_TEMPO)
    }

    /// Reported meter, or 4/4 when it is missing or malformed.
    pub fn time_signature(&self) -> TimeSignature {
        self.time_signature
            .filter(|ts| ts.is_valid())
            .unwrap_or_default()
    }

    pub fn position(&self) -> f64 {
        self.position_quarter_notes.unwrap_or(0.0)
    }
}
