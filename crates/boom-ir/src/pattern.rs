//! Note and pattern types for one loop cycle.

use alloc::vec::Vec;

use crate::ticks::{TimeSignature, TICKS_PER_QUARTER, TICKS_PER_SIXTEENTH};

/// MIDI pitch of drum row 0. Row `r` plays `DRUM_BASE_PITCH + r`.
pub const DRUM_BASE_PITCH: u8 = 35;

/// Velocity of notes added from the drum grid.
pub const DEFAULT_VELOCITY: u8 = 100;

/// A musical event within one loop cycle.
///
/// `start_tick` and `length_ticks` are signed so malformed input survives
/// construction; [`Note::start`] and [`Note::length`] clamp them to zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Note {
    /// MIDI note number (melodic engines)
    pub pitch: u8,
    /// Drum lane index (drum engine)
    pub row: u8,
    /// Offset from the loop start in ticks
    pub start_tick: i32,
    /// Duration in ticks
    pub length_ticks: i32,
    /// 0-127
    pub velocity: u8,
}

impl Default for Note {
    fn default() -> Self {
        Self {
            pitch: 0,
            row: 0,
            start_tick: 0,
            length_ticks: TICKS_PER_QUARTER as i32,
            velocity: DEFAULT_VELOCITY,
        }
    }
}

impl Note {
    /// A note on a drum lane.
    pub const fn drum(row: u8, start_tick: i32, length_ticks: i32, velocity: u8) -> Self {
        Self { pitch: 0, row, start_tick, length_ticks, velocity }
    }

    /// A pitched note for the 808 and Bass engines.
    pub const fn melodic(pitch: u8, start_tick: i32, length_ticks: i32, velocity: u8) -> Self {
        Self { pitch, row: 0, start_tick, length_ticks, velocity }
    }

    /// Start tick, negative values clamped to zero.
    pub fn start(&self) -> u32 {
        self.start_tick.max(0) as u32
    }

    /// Length in ticks, negative values clamped to zero.
    pub fn length(&self) -> u32 {
        self.length_ticks.max(0) as u32
    }

    /// Tick at which the note releases.
    pub fn end(&self) -> u64 {
        self.start() as u64 + self.length() as u64
    }

    /// MIDI pitch for the active engine.
    pub fn midi_pitch(&self, drum_mode: bool) -> u8 {
        if drum_mode {
            DRUM_BASE_PITCH.saturating_add(self.row).min(127)
        } else {
            self.pitch.min(127)
        }
    }

    /// Velocity clamped into the MIDI range.
    pub fn midi_velocity(&self) -> u8 {
        self.velocity.min(127)
    }
}

/// One loop cycle's worth of notes. Playback does not depend on order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Pattern {
    notes: Vec<Note>,
}

impl Pattern {
    /// Create an empty pattern.
    pub fn new() -> Self {
        Self { notes: Vec::new() }
    }

    pub fn from_notes(notes: Vec<Note>) -> Self {
        Self { notes }
    }

    pub fn push(&mut self, note: Note) {
        self.notes.push(note);
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn notes_mut(&mut self) -> &mut [Note] {
        &mut self.notes
    }

    pub fn iter(&self) -> core::slice::Iter<'_, Note> {
        self.notes.iter()
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn clear(&mut self) {
        self.notes.clear();
    }

    /// Toggle the drum-grid cell at (`row`, `step`), where a step is one
    /// sixteenth note.
    ///
    /// Removes every note on that row starting at the step's tick, or adds a
    /// sixteenth-long note at the default velocity if there was none.
    /// Returns true when a note was added; a step whose tick does not fit
    /// the tick range leaves the pattern untouched.
    pub fn toggle_drum_cell(&mut self, row: u8, step: u32) -> bool {
        let Some(tick) = step
            .checked_mul(TICKS_PER_SIXTEENTH)
            .and_then(|t| i32::try_from(t).ok())
        else {
            return false;
        };
        let before = self.notes.len();
        self.notes.retain(|n| !(n.row == row && n.start_tick == tick));
        if self.notes.len() != before {
            return false;
        }
        self.notes.push(Note::drum(
            row,
            tick,
            TICKS_PER_SIXTEENTH as i32,
            DEFAULT_VELOCITY,
        ));
        true
    }

    /// Build a roll fill: straight eighth notes on row 1 across `bars` bars.
    pub fn roll_fill(bars: u32, time_signature: TimeSignature) -> Self {
        const ROLL_ROW: u8 = 1;
        const ROLL_VELOCITY: u8 = 90;
        let eighth = (TICKS_PER_QUARTER / 2) as i32;
        let ticks_per_bar = time_signature.ticks_per_bar() as i32;
        let per_bar = ticks_per_bar / eighth;

        let mut fill = Pattern::new();
        for bar in 0..bars as i32 {
            for i in 0..per_bar {
                fill.push(Note::drum(
                    ROLL_ROW,
                    bar * ticks_per_bar + i * eighth,
                    eighth,
                    ROLL_VELOCITY,
                ));
            }
        }
        fill
    }
}

impl<'a> IntoIterator for &'a Pattern {
    type Item = &'a Note;
    type IntoIter = core::slice::Iter<'a, Note>;

    fn into_iter(self) -> Self::IntoIter {
        self.notes.iter()
    }
}
