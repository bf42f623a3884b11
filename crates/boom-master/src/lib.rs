//! Headless controller for BOOM.
//!
//! Owns the authoritative pattern and parameters, applies the pattern tools
//! with undo/redo, and provides offline rendering, MIDI export and live
//! playback that the CLI (or any other front end) can share.

mod flip;
mod undo;

use std::path::Path;
use std::sync::Arc;

use boom_audio::LivePlayback;
use boom_engine::{pattern_slot, FreeRunningTransport, PatternPublisher, Processor, SharedParams};
use tracing::{debug, info, warn};

// Re-export common types so callers don't need boom-ir/boom-audio directly.
pub use boom_audio::{list_midi_devices, AudioError, LogSink, MidiSink, MidirSink, RecordingSink};
pub use boom_formats::FormatError;
pub use boom_ir::{
    Bars, DrumRows, Engine, MidiMessage, Note, Pattern, TimeSignature, MAX_SEED,
    TICKS_PER_SIXTEENTH,
};

pub use flip::{flip_pattern, MAX_FLIP_SWAPS};
pub use undo::{EditSnapshot, UndoStack};

/// Error type for controller operations.
#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    #[error("the {0} engine has no drum rows")]
    NotDrumEngine(Engine),

    #[error("drum row {0} does not exist")]
    InvalidRow(u8),

    #[error("step {0} is outside the loop")]
    InvalidStep(u32),

    #[error("seed {0} is above the maximum of 1000000")]
    InvalidSeed(u32),

    #[error("invalid tempo {0} BPM")]
    InvalidTempo(f64),

    #[error("invalid time signature {0}")]
    InvalidTimeSignature(TimeSignature),

    #[error("MIDI channel {0} is outside 1-16")]
    InvalidChannel(u8),

    #[error("invalid render settings: {0}")]
    InvalidRender(&'static str),

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Audio(#[from] AudioError),
}

/// A scheduled MIDI message at an absolute sample position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderedEvent {
    pub sample: u64,
    pub message: MidiMessage,
}

/// Headless BOOM controller: owns a pattern and manages playback.
pub struct Controller {
    pattern: Arc<Pattern>,
    drum_rows: DrumRows,
    params: Arc<SharedParams>,
    seed: u32,
    bpm: f64,
    time_signature: TimeSignature,
    undo: UndoStack,
    playback: Option<PlaybackHandle>,
}

struct PlaybackHandle {
    publisher: PatternPublisher,
    live: LivePlayback,
}

impl Controller {
    pub fn new() -> Self {
        Self {
            pattern: Arc::new(Pattern::new()),
            drum_rows: DrumRows::default(),
            params: Arc::new(SharedParams::default()),
            seed: 0,
            bpm: boom_ir::DEFAULT_TEMPO,
            time_signature: TimeSignature::FOUR_FOUR,
            undo: UndoStack::new(),
            playback: None,
        }
    }

    // --- Parameters ---

    pub fn engine(&self) -> Engine {
        self.params.engine()
    }

    pub fn set_engine(&mut self, engine: Engine) {
        self.params.set_engine(engine);
    }

    pub fn bars(&self) -> Bars {
        self.params.bars()
    }

    pub fn set_bars(&mut self, bars: Bars) {
        self.params.set_bars(bars);
    }

    /// Output channel, 1-16.
    pub fn midi_channel(&self) -> u8 {
        self.params.channel() + 1
    }

    pub fn set_midi_channel(&mut self, channel: u8) -> Result<(), ControllerError> {
        if !(1..=16).contains(&channel) {
            return Err(ControllerError::InvalidChannel(channel));
        }
        self.params.set_channel(channel - 1);
        Ok(())
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    pub fn set_seed(&mut self, seed: u32) -> Result<(), ControllerError> {
        if seed > MAX_SEED {
            return Err(ControllerError::InvalidSeed(seed));
        }
        self.seed = seed;
        Ok(())
    }

    pub fn tempo(&self) -> f64 {
        self.bpm
    }

    /// Tempo used for rendering, export and standalone playback.
    pub fn set_tempo(&mut self, bpm: f64) -> Result<(), ControllerError> {
        if !(bpm.is_finite() && bpm > 0.0) {
            return Err(ControllerError::InvalidTempo(bpm));
        }
        self.bpm = bpm;
        Ok(())
    }

    pub fn time_signature(&self) -> TimeSignature {
        self.time_signature
    }

    pub fn set_time_signature(&mut self, ts: TimeSignature) -> Result<(), ControllerError> {
        if !ts.is_valid() {
            return Err(ControllerError::InvalidTimeSignature(ts));
        }
        self.time_signature = ts;
        Ok(())
    }

    // --- Pattern editing ---

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    pub fn drum_rows(&self) -> &DrumRows {
        &self.drum_rows
    }

    /// Replace the whole pattern.
    pub fn set_pattern(&mut self, pattern: Pattern) {
        let drum_rows = self.drum_rows.clone();
        self.commit(pattern, drum_rows);
    }

    /// Number of sixteenth steps in the current loop.
    pub fn steps(&self) -> u32 {
        let ticks = boom_ir::pattern_length_ticks(self.bars().count(), self.time_signature);
        (ticks / TICKS_PER_SIXTEENTH as f64) as u32
    }

    /// Toggle one drum grid cell. Returns true when a note was added.
    pub fn toggle_drum_cell(&mut self, row: u8, step: u32) -> Result<bool, ControllerError> {
        self.require_drums()?;
        if row as usize >= self.drum_rows.len() {
            return Err(ControllerError::InvalidRow(row));
        }
        if step >= self.steps() {
            return Err(ControllerError::InvalidStep(step));
        }

        let mut pattern = (*self.pattern).clone();
        let added = pattern.toggle_drum_cell(row, step);
        let drum_rows = self.drum_rows.clone();
        self.commit(pattern, drum_rows);
        Ok(added)
    }

    /// Bumppit: rotate the drum lanes up by one, notes following their lane.
    pub fn bump_drum_rows(&mut self) -> Result<(), ControllerError> {
        self.require_drums()?;
        let mut pattern = (*self.pattern).clone();
        let mut drum_rows = self.drum_rows.clone();
        drum_rows.bump(&mut pattern);
        debug!(top = drum_rows.name(0), "Bumped drum rows.");
        self.commit(pattern, drum_rows);
        Ok(())
    }

    /// Flippit: swap start times of a few note pairs chosen by the seed.
    /// Returns how many pairs were swapped.
    pub fn flip(&mut self) -> usize {
        let mut pattern = (*self.pattern).clone();
        let swaps = flip_pattern(&mut pattern, self.seed);
        if swaps > 0 {
            let drum_rows = self.drum_rows.clone();
            self.commit(pattern, drum_rows);
        }
        debug!(seed = self.seed, swaps, "Flipped pattern.");
        swaps
    }

    /// Rolls: replace the pattern with an eighth-note fill on row 1.
    pub fn generate_rolls(&mut self) -> Result<(), ControllerError> {
        self.require_drums()?;
        let fill = Pattern::roll_fill(self.bars().count(), self.time_signature);
        info!(notes = fill.len(), "Generated rolls.");
        self.set_pattern(fill);
        Ok(())
    }

    /// Returns false when there was nothing to undo.
    pub fn undo(&mut self) -> bool {
        let Some(snapshot) = self.undo.undo().cloned() else {
            return false;
        };
        self.restore(snapshot);
        true
    }

    /// Returns false when there was nothing to redo.
    pub fn redo(&mut self) -> bool {
        let Some(snapshot) = self.undo.redo().cloned() else {
            return false;
        };
        self.restore(snapshot);
        true
    }

    pub fn can_undo(&self) -> bool {
        self.undo.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.undo.can_redo()
    }

    fn require_drums(&self) -> Result<(), ControllerError> {
        let engine = self.engine();
        if !engine.is_drum_mode() {
            return Err(ControllerError::NotDrumEngine(engine));
        }
        Ok(())
    }

    fn snapshot(&self) -> EditSnapshot {
        EditSnapshot {
            pattern: (*self.pattern).clone(),
            drum_rows: self.drum_rows.clone(),
        }
    }

    /// Apply an edit, record it for undo and hand it to the audio thread.
    fn commit(&mut self, pattern: Pattern, drum_rows: DrumRows) {
        let before = self.snapshot();
        let after = EditSnapshot { pattern, drum_rows };
        self.undo.push(before, after.clone());
        self.restore(after);
    }

    fn restore(&mut self, snapshot: EditSnapshot) {
        self.pattern = Arc::new(snapshot.pattern);
        self.drum_rows = snapshot.drum_rows;
        self.publish();
    }

    fn publish(&mut self) {
        if let Some(pb) = self.playback.as_mut() {
            if pb.publisher.publish(self.pattern.clone()).is_err() {
                warn!("Pattern queue full, update deferred to the next edit.");
            }
        }
    }

    // --- Offline rendering ---

    /// Run a fresh processor for `cycles` loop cycles from position 0 and
    /// collect every event at its absolute sample position.
    pub fn render(
        &self,
        sample_rate: u32,
        block_size: u32,
        cycles: u32,
    ) -> Result<Vec<RenderedEvent>, ControllerError> {
        if sample_rate == 0 {
            return Err(ControllerError::InvalidRender("sample rate must be positive"));
        }
        if block_size == 0 {
            return Err(ControllerError::InvalidRender("block size must be positive"));
        }

        let (_publisher, reader) = pattern_slot(self.pattern.clone());
        let params = Arc::new(SharedParams::new(self.engine(), self.bars(), self.params.channel()));
        let mut processor = Processor::new(reader, params);
        processor.prepare(sample_rate as f64);

        let mut transport = FreeRunningTransport::new(self.bpm, self.time_signature);
        transport.play();

        let loop_ticks = boom_ir::pattern_length_ticks(self.bars().count(), self.time_signature);
        let loop_quarters = loop_ticks / boom_ir::TICKS_PER_QUARTER as f64;
        let loop_seconds = loop_quarters * 60.0 / self.bpm;
        let total_samples = (loop_seconds * sample_rate as f64 * cycles as f64).round() as u64;

        let mut events = Vec::new();
        let mut rendered: u64 = 0;
        while rendered < total_samples {
            let frames = (total_samples - rendered).min(block_size as u64) as u32;
            let snapshot = transport.snapshot();
            for event in processor.process_block(Some(&snapshot), frames).iter() {
                events.push(RenderedEvent {
                    sample: rendered + event.sample_offset as u64,
                    message: event.message,
                });
            }
            transport.advance(frames, sample_rate as f64);
            rendered += frames as u64;
        }

        let dropped = processor.midi().dropped();
        if dropped > 0 {
            warn!(dropped, "Render dropped events, blocks too large.");
        }
        info!(events = events.len(), samples = total_samples, cycles, "Rendered pattern.");
        Ok(events)
    }

    // --- MIDI export ---

    fn export_settings(&self) -> boom_formats::ExportSettings {
        boom_formats::ExportSettings {
            num_bars: self.bars().count(),
            time_signature: self.time_signature,
            bpm: self.bpm,
            engine: self.engine(),
            channel: self.params.channel(),
            track_name: format!("BOOM {}", self.engine()),
        }
    }

    /// The pattern as Standard MIDI File bytes.
    pub fn export_midi(&self) -> Result<Vec<u8>, ControllerError> {
        Ok(boom_formats::export_pattern(&self.pattern, &self.export_settings())?)
    }

    pub fn export_midi_to(&self, path: impl AsRef<Path>) -> Result<(), ControllerError> {
        let path = path.as_ref();
        boom_formats::write_pattern(path, &self.pattern, &self.export_settings())?;
        info!(path = %path.display(), notes = self.pattern.len(), "Exported MIDI.");
        Ok(())
    }

    // --- Real-time playback ---

    /// Start standalone playback on the default audio device, sending MIDI
    /// to `sink`. Edits made while playing are heard from the next block.
    pub fn play(&mut self, sink: Box<dyn MidiSink>) -> Result<(), ControllerError> {
        self.stop();

        let (publisher, reader) = pattern_slot(self.pattern.clone());
        let processor = Processor::new(reader, self.params.clone());
        let transport = FreeRunningTransport::new(self.bpm, self.time_signature);
        let live = LivePlayback::start(processor, transport, sink)?;

        self.playback = Some(PlaybackHandle { publisher, live });
        Ok(())
    }

    pub fn stop(&mut self) {
        if let Some(mut pb) = self.playback.take() {
            pb.live.stop();
            pb.publisher.collect_retired();
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playback.is_some()
    }
}

impl Default for Controller {
    fn default() -> Self {
        Self::new()
    }
}
