//! File formats for BOOM.
//!
//! Writes patterns as Standard MIDI Files for dragging into a DAW.

mod smf_export;

pub use smf_export::{export_pattern, write_pattern, ExportSettings, SMF_TICKS_PER_QUARTER};

/// Error type for pattern export.
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("tempo {0} BPM cannot be stored in a MIDI file")]
    InvalidTempo(f64),

    #[error("time signature {0} cannot be stored in a MIDI file")]
    UnsupportedTimeSignature(boom_ir::TimeSignature),

    #[error("failed to write MIDI file: {0}")]
    Io(#[from] std::io::Error),
}
