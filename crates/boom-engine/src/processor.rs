//! Per-block MIDI processor.

use alloc::sync::Arc;

use boom_ir::{Pattern, TransportSnapshot};

use crate::midi_buffer::MidiBuffer;
use crate::params::SharedParams;
use crate::pattern_slot::PatternReader;
use crate::scheduler::{schedule_block, BlockTiming, Voicing};

/// Turns the current pattern into MIDI for each audio block.
///
/// Owned by the audio thread. Everything `process_block` touches is
/// preallocated, so it is safe to call from a realtime callback.
pub struct Processor {
    /// Latest pattern snapshot from the editor
    pattern: PatternReader,
    /// Engine, bars and channel
    params: Arc<SharedParams>,
    /// Output events of the last block
    midi: MidiBuffer,
    /// Host sample rate; 0 until prepared
    sample_rate: f64,
}

impl Processor {
    pub fn new(pattern: PatternReader, params: Arc<SharedParams>) -> Self {
        Self {
            pattern,
            params,
            midi: MidiBuffer::new(),
            sample_rate: 0.0,
        }
    }

    /// Set the sample rate before processing starts or when it changes.
    pub fn prepare(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate;
        self.midi.clear();
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn params(&self) -> &SharedParams {
        &self.params
    }

    /// The pattern the next block will read.
    pub fn pattern(&self) -> &Pattern {
        self.pattern.current()
    }

    /// Events produced by the last `process_block`.
    pub fn midi(&self) -> &MidiBuffer {
        &self.midi
    }

    /// Produce the MIDI events for one block of `block_size` samples.
    ///
    /// The buffer is cleared first. A missing or stopped transport, or any
    /// unusable timing input, leaves it empty.
    pub fn process_block(
        &mut self,
        transport: Option<&TransportSnapshot>,
        block_size: u32,
    ) -> &MidiBuffer {
        #[cfg(feature = "alloc_check")]
        assert_no_alloc::assert_no_alloc(|| self.run_block(transport, block_size));
        #[cfg(not(feature = "alloc_check"))]
        self.run_block(transport, block_size);

        &self.midi
    }

    fn run_block(&mut self, transport: Option<&TransportSnapshot>, block_size: u32) {
        self.midi.clear();
        self.pattern.refresh();

        let Some(transport) = transport else {
            return;
        };
        let bars = self.params.bars().count();
        let Some(timing) = BlockTiming::new(transport, bars, self.sample_rate, block_size) else {
            return;
        };

        let voicing = Voicing {
            drum_mode: self.params.engine().is_drum_mode(),
            channel: self.params.channel(),
        };
        schedule_block(self.pattern.current(), &timing, voicing, &mut self.midi);
    }
}
