//! Session files: engine settings and a starting pattern for the CLI.

use std::path::Path;

use boom_ir::{Bars, Engine, Note, Pattern, TimeSignature, DEFAULT_VELOCITY, TICKS_PER_QUARTER};
use boom_master::{Controller, ControllerError};
use config::{Config, Environment, File};
use serde::Deserialize;
use tracing::debug;

/// Prefix of environment variables that override session values.
pub const ENV_PREFIX: &str = "BOOM";

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("session load/parse error: {0}")]
    Load(#[from] config::ConfigError),

    #[error("unknown engine {0:?} (expected 808, Bass or Drums)")]
    InvalidEngine(String),

    #[error("unsupported bar count {0} (expected 4 or 8)")]
    InvalidBars(u32),

    #[error("malformed time signature {0:?}")]
    InvalidTimeSignature(String),

    #[error(transparent)]
    Controller(#[from] ControllerError),
}

/// One note of the starting pattern.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct NoteConfig {
    /// Pitch for the melodic engines.
    #[serde(default)]
    pub pitch: u8,
    /// Drum lane for the drum engine.
    #[serde(default)]
    pub row: u8,
    /// Start in ticks (96 per quarter note).
    pub start: i32,
    #[serde(default = "default_length")]
    pub length: i32,
    #[serde(default = "default_velocity")]
    pub velocity: u8,
}

fn default_length() -> i32 {
    TICKS_PER_QUARTER as i32
}

fn default_velocity() -> u8 {
    DEFAULT_VELOCITY
}

impl From<&NoteConfig> for Note {
    fn from(n: &NoteConfig) -> Self {
        Note {
            pitch: n.pitch,
            row: n.row,
            start_tick: n.start,
            length_ticks: n.length,
            velocity: n.velocity,
        }
    }
}

/// The configuration for one BOOM session.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct SessionConfig {
    pub engine: String,
    pub bars: u32,
    pub bpm: f64,
    pub time_signature: String,
    pub seed: u32,
    pub sample_rate: u32,
    pub block_size: u32,
    /// 1-16
    pub midi_channel: u8,
    /// Output port name (substring match); log only when unset.
    pub midi_device: Option<String>,
    /// Start from a Rolls fill instead of `notes`.
    pub rolls: bool,
    pub notes: Vec<NoteConfig>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            engine: Engine::default().label().to_string(),
            bars: Bars::default().count(),
            bpm: boom_ir::DEFAULT_TEMPO,
            time_signature: TimeSignature::FOUR_FOUR.to_string(),
            seed: 0,
            sample_rate: 48_000,
            block_size: 512,
            midi_channel: 1,
            midi_device: None,
            rolls: false,
            notes: Vec::new(),
        }
    }
}

impl SessionConfig {
    /// Parse a session file (format from its extension), with `BOOM_*`
    /// environment variables taking precedence.
    pub fn load(path: &Path) -> Result<Self, SessionError> {
        let session = Config::builder()
            .add_source(File::from(path))
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()?
            .try_deserialize::<SessionConfig>()?;
        debug!(path = %path.display(), notes = session.notes.len(), "Loaded session.");
        Ok(session)
    }

    pub fn engine(&self) -> Result<Engine, SessionError> {
        self.engine
            .parse()
            .map_err(|_| SessionError::InvalidEngine(self.engine.clone()))
    }

    pub fn bars(&self) -> Result<Bars, SessionError> {
        Bars::from_count(self.bars).ok_or(SessionError::InvalidBars(self.bars))
    }

    pub fn time_signature(&self) -> Result<TimeSignature, SessionError> {
        self.time_signature
            .parse()
            .map_err(|_| SessionError::InvalidTimeSignature(self.time_signature.clone()))
    }

    pub fn pattern(&self) -> Pattern {
        Pattern::from_notes(self.notes.iter().map(Note::from).collect())
    }

    /// Build a controller holding this session's settings and pattern.
    pub fn controller(&self) -> Result<Controller, SessionError> {
        let mut ctrl = Controller::new();
        ctrl.set_engine(self.engine()?);
        ctrl.set_bars(self.bars()?);
        ctrl.set_time_signature(self.time_signature()?)?;
        ctrl.set_tempo(self.bpm)?;
        ctrl.set_seed(self.seed)?;
        ctrl.set_midi_channel(self.midi_channel)?;

        if self.rolls {
            ctrl.generate_rolls()?;
        } else {
            ctrl.set_pattern(self.pattern());
        }
        Ok(ctrl)
    }
}
