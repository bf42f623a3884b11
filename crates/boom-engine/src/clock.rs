//! A free-running transport for standalone playback and offline rendering.
//!
//! Stands in for a host playhead: it holds tempo and meter, and advances its
//! quarter-note position by the duration of each processed block.

use boom_ir::{TimeSignature, TransportSnapshot};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FreeRunningTransport {
    bpm: f64,
    time_signature: TimeSignature,
    position_quarter_notes: f64,
    playing: bool,
}

impl FreeRunningTransport {
    /// A stopped transport at position 0.
    pub fn new(bpm: f64, time_signature: TimeSignature) -> Self {
        Self {
            bpm,
            time_signature,
            position_quarter_notes: 0.0,
            playing: false,
        }
    }

    pub fn play(&mut self) {
        self.playing = true;
    }

    pub fn stop(&mut self) {
        self.playing = false;
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Jump to a position in quarter notes.
    pub fn seek(&mut self, position_quarter_notes: f64) {
        self.position_quarter_notes = position_quarter_notes;
    }

    pub fn position(&self) -> f64 {
        self.position_quarter_notes
    }

    pub fn set_tempo(&mut self, bpm: f64) {
        self.bpm = bpm;
    }

    pub fn set_time_signature(&mut self, time_signature: TimeSignature) {
        self.time_signature = time_signature;
    }

    /// What a host would report for the next block.
    pub fn snapshot(&self) -> TransportSnapshot {
        TransportSnapshot {
            is_playing: self.playing,
            bpm: Some(self.bpm),
            time_signature: Some(self.time_signature),
            position_quarter_notes: Some(self.position_quarter_notes),
        }
    }

    /// Move the playhead forward by `samples` frames. Does nothing when
    /// stopped or when the rate is unusable.
    pub fn advance(&mut self, samples: u32, sample_rate: f64) {
        if !self.playing || !(sample_rate > 0.0) {
            return;
        }
        let seconds = samples as f64 / sample_rate;
        self.position_quarter_notes += seconds * self.bpm / 60.0;
    }
}

impl Default for FreeRunningTransport {
    fn default() -> Self {
        Self::new(boom_ir::DEFAULT_TEMPO, TimeSignature::FOUR_FOUR)
    }
}
