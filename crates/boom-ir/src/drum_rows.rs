//! Drum lane names for the drum grid.

use arrayvec::ArrayVec;

use crate::pattern::Pattern;

/// Most lanes the grid can hold.
pub const MAX_DRUM_ROWS: usize = 16;

/// Lanes a fresh drum grid starts with, top to bottom.
pub const DEFAULT_DRUM_ROWS: [&str; 7] = [
    "Kick",
    "Snare/Clap",
    "Hi-Hat",
    "Open Hat",
    "Perc 1",
    "Perc 2",
    "Perc 3",
];

/// Ordered drum lane names. Row `i` of a note refers to `names()[i]`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DrumRows {
    names: ArrayVec<&'static str, MAX_DRUM_ROWS>,
}

impl DrumRows {
    /// Build from names; anything past [`MAX_DRUM_ROWS`] is dropped.
    pub fn from_names(names: &[&'static str]) -> Self {
        Self {
            names: names.iter().copied().take(MAX_DRUM_ROWS).collect(),
        }
    }

    pub fn names(&self) -> &[&'static str] {
        &self.names
    }

    pub fn name(&self, row: u8) -> Option<&'static str> {
        self.names.get(row as usize).copied()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Bump every lane up by one.
    ///
    /// The lane names rotate up (the top lane wraps to the bottom) and every
    /// note on a known row `r` moves to `(r + 1) % rows`. Notes on rows past
    /// the table are left alone.
    pub fn bump(&mut self, pattern: &mut Pattern) {
        let rows = self.names.len();
        if rows == 0 {
            return;
        }

        let mut remap = [0u8; MAX_DRUM_ROWS];
        for (i, slot) in remap.iter_mut().enumerate().take(rows) {
            *slot = ((i + 1) % rows) as u8;
        }
        for note in pattern.notes_mut() {
            if (note.row as usize) < rows {
                note.row = remap[note.row as usize];
            }
        }

        self.names.rotate_left(1);
    }
}

impl Default for DrumRows {
    fn default() -> Self {
        Self::from_names(&DEFAULT_DRUM_ROWS)
    }
}
