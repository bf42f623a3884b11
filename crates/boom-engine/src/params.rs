//! Parameters shared between the editing thread and the audio thread.

use core::sync::atomic::{AtomicU8, Ordering};

use boom_ir::{Bars, Engine};

/// Engine, loop length and MIDI channel, readable from the audio thread
/// without locking.
#[derive(Debug)]
pub struct SharedParams {
    engine: AtomicU8,
    bars: AtomicU8,
    /// 0-based
    channel: AtomicU8,
}

impl SharedParams {
    pub fn new(engine: Engine, bars: Bars, channel: u8) -> Self {
        Self {
            engine: AtomicU8::new(engine.index()),
            bars: AtomicU8::new(bars.index()),
            channel: AtomicU8::new(channel & 0x0F),
        }
    }

    pub fn engine(&self) -> Engine {
        Engine::from_index(self.engine.load(Ordering::Relaxed)).unwrap_or_default()
    }

    pub fn set_engine(&self, engine: Engine) {
        self.engine.store(engine.index(), Ordering::Relaxed);
    }

    pub fn bars(&self) -> Bars {
        Bars::from_index(self.bars.load(Ordering::Relaxed)).unwrap_or_default()
    }

    pub fn set_bars(&self, bars: Bars) {
        self.bars.store(bars.index(), Ordering::Relaxed);
    }

    pub fn channel(&self) -> u8 {
        self.channel.load(Ordering::Relaxed)
    }

    /// Set the 0-based output channel (masked to 0..=15).
    pub fn set_channel(&self, channel: u8) {
        self.channel.store(channel & 0x0F, Ordering::Relaxed);
    }
}

impl Default for SharedParams {
    fn default() -> Self {
        Self::new(Engine::default(), Bars::default(), 0)
    }
}
