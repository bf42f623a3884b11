//! Loop-synchronized pattern-to-MIDI scheduling.
//!
//! Each block is scheduled from scratch: the host position is folded into
//! the loop, the block's tick window is computed from tempo and sample rate,
//! and every note whose start or end lands in that window (in the previous,
//! current or next loop cycle) becomes a note-on or note-off at the matching
//! sample offset. Nothing is carried between blocks.

use boom_ir::{
    floor_mod, pattern_length_ticks, BlockEvent, EventOrder, MidiMessage, Pattern,
    TransportSnapshot, TICKS_PER_QUARTER,
};

use crate::midi_buffer::MidiBuffer;

/// Loop cycles checked relative to the one containing the block start.
///
/// The next cycle catches events after the wrap point when a block straddles
/// it; the previous cycle catches note-offs of notes that run past the loop
/// end once the transport has wrapped.
const LOOP_CYCLES: [f64; 3] = [-1.0, 0.0, 1.0];

/// The tick window covered by one processing block.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BlockTiming {
    /// Length of one loop cycle in ticks
    pub pattern_length_ticks: f64,
    /// Loop-relative tick at the first sample (inclusive)
    pub start_ticks: f64,
    /// Loop-relative tick one past the last sample (exclusive)
    pub end_ticks: f64,
    pub ticks_per_second: f64,
    sample_rate: f64,
    block_size: u32,
}

impl BlockTiming {
    /// Compute the window for a block, or `None` when the block must stay
    /// silent: transport stopped, tempo or sample rate unusable, empty block,
    /// or a loop with no length.
    pub fn new(
        transport: &TransportSnapshot,
        num_bars: u32,
        sample_rate: f64,
        block_size: u32,
    ) -> Option<Self> {
        if !transport.is_playing || block_size == 0 {
            return None;
        }
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return None;
        }
        let bpm = transport.tempo();
        if !(bpm.is_finite() && bpm > 0.0) {
            return None;
        }

        let pattern_length_ticks = pattern_length_ticks(num_bars, transport.time_signature());
        if !(pattern_length_ticks > 0.0) {
            return None;
        }

        let position = transport.position();
        if !position.is_finite() {
            return None;
        }
        let ticks_per_quarter = TICKS_PER_QUARTER as f64;
        let loop_pos_ticks = floor_mod(position * ticks_per_quarter, pattern_length_ticks);

        let ticks_per_second = (bpm / 60.0) * ticks_per_quarter;
        let block_seconds = block_size as f64 / sample_rate;

        Some(Self {
            pattern_length_ticks,
            start_ticks: loop_pos_ticks,
            end_ticks: loop_pos_ticks + block_seconds * ticks_per_second,
            ticks_per_second,
            sample_rate,
            block_size,
        })
    }

    /// True if `tick` falls in `[start_ticks, end_ticks)`.
    pub fn contains(&self, tick: f64) -> bool {
        tick >= self.start_ticks && tick < self.end_ticks
    }

    /// Sample offset of a loop-relative tick, clamped into the block.
    pub fn tick_to_sample(&self, tick: f64) -> u32 {
        let seconds = (tick - self.start_ticks) / self.ticks_per_second;
        let sample = libm::round(seconds * self.sample_rate);
        let last = (self.block_size - 1) as f64;
        sample.clamp(0.0, last) as u32
    }

    pub fn block_size(&self) -> u32 {
        self.block_size
    }
}

/// How notes turn into MIDI messages.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Voicing {
    /// Notes address drum rows (`35 + row`) instead of pitches
    pub drum_mode: bool,
    /// 0-based MIDI channel
    pub channel: u8,
}

/// Schedule every note event of `pattern` that lands inside `timing`.
///
/// Events are added to `out` at their sample offsets; `out` is not cleared.
/// Notes starting at or past the loop length are outside the loop and stay
/// silent. A note is held for at most one loop, so its release always comes
/// before its next attack.
pub fn schedule_block(
    pattern: &Pattern,
    timing: &BlockTiming,
    voicing: Voicing,
    out: &mut MidiBuffer,
) {
    let loop_len = timing.pattern_length_ticks;

    for note in pattern {
        let start = note.start() as f64;
        if start >= loop_len {
            continue;
        }
        let length = note.length();
        let end = start + (length as f64).min(loop_len);
        let pitch = note.midi_pitch(voicing.drum_mode);
        let (on_order, off_order) = if length == 0 {
            (EventOrder::Instant, EventOrder::Instant)
        } else {
            (EventOrder::Trigger, EventOrder::Release)
        };

        for cycle in LOOP_CYCLES {
            let offset = cycle * loop_len;

            let on_tick = start + offset;
            if timing.contains(on_tick) {
                out.push(
                    BlockEvent::new(
                        timing.tick_to_sample(on_tick),
                        MidiMessage::note_on(voicing.channel, pitch, note.midi_velocity()),
                    ),
                    on_order,
                );
            }

            let off_tick = end + offset;
            if timing.contains(off_tick) {
                out.push(
                    BlockEvent::new(
                        timing.tick_to_sample(off_tick),
                        MidiMessage::note_off(voicing.channel, pitch),
                    ),
                    off_order,
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boom_ir::{Note, TimeSignature};
    use std::vec::Vec;

    const SR: f64 = 48_000.0;
    const DRUMS: Voicing = Voicing { drum_mode: true, channel: 0 };

    fn playing_at(position: f64) -> TransportSnapshot {
        TransportSnapshot::playing(120.0, TimeSignature::FOUR_FOUR, position)
    }

    fn run(pattern: &Pattern, transport: &TransportSnapshot, block: u32, voicing: Voicing) -> Vec<BlockEvent> {
        let mut out = MidiBuffer::new();
        if let Some(timing) = BlockTiming::new(transport, 4, SR, block) {
            schedule_block(pattern, &timing, voicing, &mut out);
        }
        out.iter().copied().collect()
    }

    fn one_note(note: Note) -> Pattern {
        Pattern::from_notes(std::vec![note])
    }

    #[test]
    fn first_note_on_at_sample_zero_off_beyond_block() {
        let pattern = one_note(Note::drum(1, 0, 48, 90));
        let events = run(&pattern, &playing_at(0.0), 1000, DRUMS);

        // 48 ticks = 0.25 s = 12000 samples, outside this 1000-sample block
        assert_eq!(events, [BlockEvent::new(0, MidiMessage::note_on(0, 36, 90))]);
    }

    #[test]
    fn note_off_lands_in_later_block() {
        let pattern = one_note(Note::drum(1, 0, 48, 90));
        // 12000 samples = 0.5 quarter notes
        let events = run(&pattern, &playing_at(0.5), 1000, DRUMS);
        assert_eq!(events, [BlockEvent::new(0, MidiMessage::note_off(0, 36))]);
    }

    #[test]
    fn timing_for_common_time() {
        // 1500 samples at 48 kHz = 1/32 s = 6 ticks at 120 BPM
        let timing = BlockTiming::new(&playing_at(0.0), 4, SR, 1500).unwrap();
        assert_eq!(timing.pattern_length_ticks, 1536.0);
        assert_eq!(timing.ticks_per_second, 192.0);
        assert_eq!(timing.start_ticks, 0.0);
        assert_eq!(timing.end_ticks, 6.0);
    }

    #[test]
    fn position_folds_into_loop() {
        // 16 quarter notes = one 4-bar loop
        let timing = BlockTiming::new(&playing_at(17.0), 4, SR, 1000).unwrap();
        assert_eq!(timing.start_ticks, 96.0);
    }

    #[test]
    fn negative_position_uses_floored_modulo() {
        let timing = BlockTiming::new(&playing_at(-1.0), 4, SR, 1000).unwrap();
        assert_eq!(timing.start_ticks, 1536.0 - 96.0);
    }

    #[test]
    fn wrap_point_inside_block_catches_loop_start() {
        let pattern = one_note(Note::drum(0, 0, 24, 100));
        // 15.96875 qn = tick 1533; block covers ticks 1533..1537
        let events = run(&pattern, &playing_at(15.96875), 1000, DRUMS);

        // 3 ticks into the block = 3 / 192 s = 750 samples
        assert_eq!(events, [BlockEvent::new(750, MidiMessage::note_on(0, 35, 100))]);
    }

    #[test]
    fn long_note_released_after_wrap() {
        // Ends at tick 1600, i.e. tick 64 of the next cycle
        let pattern = one_note(Note::drum(2, 1500, 100, 100));
        // 0.625 qn = tick 60; block of 1500 samples covers 60..66
        let events = run(&pattern, &playing_at(0.625), 1500, DRUMS);

        // 4 ticks = 1000 samples
        assert_eq!(events, [BlockEvent::new(1000, MidiMessage::note_off(0, 37))]);
    }

    #[test]
    fn note_ending_exactly_on_loop_length_released_at_loop_start() {
        let pattern = one_note(Note::drum(0, 1488, 48, 100));
        let at_start = run(&pattern, &playing_at(0.0), 1000, DRUMS);
        assert_eq!(at_start, [BlockEvent::new(0, MidiMessage::note_off(0, 35))]);
    }

    #[test]
    fn zero_length_note_on_then_off() {
        let pattern = one_note(Note::drum(0, 2, 0, 100));
        let events = run(&pattern, &playing_at(0.0), 1000, DRUMS);

        assert_eq!(events.len(), 2);
        assert_eq!(events[0], BlockEvent::new(500, MidiMessage::note_on(0, 35, 100)));
        assert_eq!(events[1], BlockEvent::new(500, MidiMessage::note_off(0, 35)));
    }

    #[test]
    fn zero_length_note_keeps_coincident_note_sounding() {
        let bass = Voicing { drum_mode: false, channel: 0 };
        let pattern = Pattern::from_notes(std::vec![
            Note::melodic(40, 2, 0, 100),
            Note::melodic(40, 2, 96, 100),
        ]);
        let expected = [
            BlockEvent::new(500, MidiMessage::note_on(0, 40, 100)),
            BlockEvent::new(500, MidiMessage::note_off(0, 40)),
            BlockEvent::new(500, MidiMessage::note_on(0, 40, 100)),
        ];
        assert_eq!(run(&pattern, &playing_at(0.0), 1000, bass), expected);

        let reversed = Pattern::from_notes(pattern.iter().rev().copied().collect());
        assert_eq!(run(&reversed, &playing_at(0.0), 1000, bass), expected);
    }

    #[test]
    fn note_longer_than_loop_released_before_next_attack() {
        // 3072 ticks is two 4-bar loops; held for one loop only
        let pattern = one_note(Note::melodic(36, 0, 3072, 100));
        let bass = Voicing { drum_mode: false, channel: 0 };
        let events = run(&pattern, &playing_at(16.0), 1500, bass);

        assert_eq!(
            events,
            [
                BlockEvent::new(0, MidiMessage::note_off(0, 36)),
                BlockEvent::new(0, MidiMessage::note_on(0, 36, 100)),
            ]
        );
    }

    #[test]
    fn negative_length_treated_as_zero() {
        let pattern = one_note(Note::drum(0, 2, -30, 100));
        let events = run(&pattern, &playing_at(0.0), 1000, DRUMS);

        assert_eq!(events.len(), 2);
        assert!(events[0].message.is_note_on());
        assert!(!events[1].message.is_note_on());
        assert_eq!(events[1].sample_offset, 500);
    }

    #[test]
    fn retrigger_releases_before_attack() {
        let pattern = Pattern::from_notes(std::vec![
            Note::drum(0, 0, 2, 100),
            Note::drum(0, 2, 24, 110),
        ]);
        let events = run(&pattern, &playing_at(0.0), 1000, DRUMS);

        assert_eq!(
            events,
            [
                BlockEvent::new(0, MidiMessage::note_on(0, 35, 100)),
                BlockEvent::new(500, MidiMessage::note_off(0, 35)),
                BlockEvent::new(500, MidiMessage::note_on(0, 35, 110)),
            ]
        );
    }

    #[test]
    fn melodic_engine_uses_pitch_and_channel() {
        let pattern = one_note(Note::melodic(43, 0, 96, 77));
        let voicing = Voicing { drum_mode: false, channel: 3 };
        let events = run(&pattern, &playing_at(0.0), 1000, voicing);
        assert_eq!(events, [BlockEvent::new(0, MidiMessage::note_on(3, 43, 77))]);
    }

    #[test]
    fn velocity_passes_through() {
        let pattern = one_note(Note::drum(0, 0, 96, 1));
        let events = run(&pattern, &playing_at(0.0), 1000, DRUMS);
        assert_eq!(events[0].message.velocity(), 1);
    }

    #[test]
    fn stopped_transport_is_silent() {
        let pattern = one_note(Note::drum(0, 0, 24, 100));
        let mut transport = playing_at(0.0);
        transport.is_playing = false;
        assert!(run(&pattern, &transport, 1000, DRUMS).is_empty());
    }

    #[test]
    fn invalid_tempo_is_silent() {
        let pattern = one_note(Note::drum(0, 0, 24, 100));
        for bpm in [0.0, -120.0, f64::NAN, f64::INFINITY] {
            let transport = TransportSnapshot { bpm: Some(bpm), ..playing_at(0.0) };
            assert!(run(&pattern, &transport, 1000, DRUMS).is_empty(), "bpm {}", bpm);
        }
    }

    #[test]
    fn missing_tempo_defaults_to_120() {
        let transport = TransportSnapshot { bpm: None, ..playing_at(0.0) };
        let timing = BlockTiming::new(&transport, 4, SR, 1000).unwrap();
        assert_eq!(timing.ticks_per_second, 192.0);
    }

    #[test]
    fn missing_time_signature_defaults_to_four_four() {
        let transport = TransportSnapshot { time_signature: None, ..playing_at(0.0) };
        let timing = BlockTiming::new(&transport, 4, SR, 1000).unwrap();
        assert_eq!(timing.pattern_length_ticks, 1536.0);
    }

    #[test]
    fn empty_block_and_bad_sample_rate_are_silent() {
        let t = playing_at(0.0);
        assert!(BlockTiming::new(&t, 4, SR, 0).is_none());
        assert!(BlockTiming::new(&t, 4, 0.0, 512).is_none());
        assert!(BlockTiming::new(&t, 4, -44_100.0, 512).is_none());
    }

    #[test]
    fn zero_bars_is_silent() {
        assert!(BlockTiming::new(&playing_at(0.0), 0, SR, 512).is_none());
    }

    #[test]
    fn notes_past_loop_length_are_skipped() {
        // bar 5 of an 8-bar pattern while 4 bars are selected
        let pattern = one_note(Note::drum(0, 1536 + 2, 24, 100));
        for pos in [0.0, 15.96875] {
            assert!(run(&pattern, &playing_at(pos), 1000, DRUMS).is_empty());
        }
    }

    #[test]
    fn empty_pattern_is_silent() {
        assert!(run(&Pattern::new(), &playing_at(0.0), 1000, DRUMS).is_empty());
    }

    #[test]
    fn same_position_same_events() {
        let pattern = Pattern::from_notes(std::vec![
            Note::drum(0, 1, 24, 100),
            Note::drum(3, 3, 10, 80),
        ]);
        let a = run(&pattern, &playing_at(0.0), 1000, DRUMS);
        let b = run(&pattern, &playing_at(0.0), 1000, DRUMS);
        assert!(!a.is_empty());
        assert_eq!(a, b);
    }

    #[test]
    fn tick_to_sample_is_monotonic_and_clamped() {
        let timing = BlockTiming::new(&playing_at(2.0), 4, SR, 1000).unwrap();
        let mut last = 0;
        let mut tick = timing.start_ticks;
        while tick < timing.end_ticks {
            let s = timing.tick_to_sample(tick);
            assert!(s >= last);
            assert!(s < 1000);
            last = s;
            tick += 0.01;
        }
        assert_eq!(timing.tick_to_sample(timing.start_ticks - 5.0), 0);
        assert_eq!(timing.tick_to_sample(timing.end_ticks + 5.0), 999);
    }
}
