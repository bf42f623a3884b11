//! Standard MIDI File export.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use boom_ir::{
    pattern_length_ticks, Engine, EventOrder, Pattern, TimeSignature, DEFAULT_TEMPO,
    TICKS_PER_QUARTER,
};
use midly::num::{u15, u24, u28, u4, u7};
use midly::{Format, Header, MetaMessage, MidiMessage, Smf, Timing, TrackEvent, TrackEventKind};

use crate::FormatError;

/// Pulses per quarter note written to the file header; matches the
/// internal tick grid so no rescaling happens.
pub const SMF_TICKS_PER_QUARTER: u16 = TICKS_PER_QUARTER as u16;

/// How a pattern is rendered into a file.
#[derive(Clone, Debug, PartialEq)]
pub struct ExportSettings {
    pub num_bars: u32,
    pub time_signature: TimeSignature,
    pub bpm: f64,
    pub engine: Engine,
    /// 0-based MIDI channel
    pub channel: u8,
    pub track_name: String,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            num_bars: 4,
            time_signature: TimeSignature::FOUR_FOUR,
            bpm: DEFAULT_TEMPO,
            engine: Engine::default(),
            channel: 0,
            track_name: String::from("BOOM"),
        }
    }
}

/// Note event at an absolute tick, before delta encoding.
struct Timed {
    tick: u32,
    order: EventOrder,
    on: bool,
    key: u8,
    vel: u8,
}

/// Encode one loop cycle of `pattern` as a single-track SMF.
///
/// Notes starting past the loop length are left out, matching playback.
/// Coincident events follow the same release/trigger order as the realtime
/// scheduler.
pub fn export_pattern(pattern: &Pattern, settings: &ExportSettings) -> Result<Vec<u8>, FormatError> {
    let tempo = micros_per_quarter(settings.bpm)?;
    let (numerator, denominator_pow) = time_signature_fields(settings.time_signature)?;

    let timed = collect_events(pattern, settings);

    let mut track: Vec<TrackEvent> = Vec::with_capacity(timed.len() + 4);
    track.push(meta(MetaMessage::TrackName(settings.track_name.as_bytes())));
    track.push(meta(MetaMessage::Tempo(u24::new(tempo))));
    track.push(meta(MetaMessage::TimeSignature(numerator, denominator_pow, 24, 8)));

    let channel = u4::new(settings.channel & 0x0F);
    let mut last_tick = 0;
    for ev in &timed {
        let message = if ev.on {
            MidiMessage::NoteOn { key: u7::new(ev.key), vel: u7::new(ev.vel) }
        } else {
            MidiMessage::NoteOff { key: u7::new(ev.key), vel: u7::new(0) }
        };
        track.push(TrackEvent {
            delta: u28::new(ev.tick - last_tick),
            kind: TrackEventKind::Midi { channel, message },
        });
        last_tick = ev.tick;
    }

    // End of track lands on the loop end so the clip keeps its full length
    let loop_end = loop_length(settings) as u32;
    track.push(TrackEvent {
        delta: u28::new(loop_end.saturating_sub(last_tick)),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });

    let mut smf = Smf::new(Header::new(
        Format::SingleTrack,
        Timing::Metrical(u15::new(SMF_TICKS_PER_QUARTER)),
    ));
    smf.tracks.push(track);

    let mut bytes = Vec::new();
    smf.write_std(&mut bytes)?;
    Ok(bytes)
}

/// Export `pattern` straight to a `.mid` file.
pub fn write_pattern(
    path: impl AsRef<Path>,
    pattern: &Pattern,
    settings: &ExportSettings,
) -> Result<(), FormatError> {
    let bytes = export_pattern(pattern, settings)?;
    let mut out = BufWriter::new(File::create(path)?);
    std::io::Write::write_all(&mut out, &bytes)?;
    std::io::Write::flush(&mut out)?;
    Ok(())
}

fn loop_length(settings: &ExportSettings) -> f64 {
    pattern_length_ticks(settings.num_bars, settings.time_signature)
}

fn collect_events(pattern: &Pattern, settings: &ExportSettings) -> Vec<Timed> {
    let loop_len = loop_length(settings);
    let drum_mode = settings.engine.is_drum_mode();
    let mut timed = Vec::with_capacity(pattern.len() * 2);

    for note in pattern {
        if note.start() as f64 >= loop_len {
            continue;
        }
        let key = note.midi_pitch(drum_mode);
        // Held for one loop at most
        let length = (note.length() as f64).min(loop_len) as u32;
        let (on_order, off_order) = if length == 0 {
            (EventOrder::Instant, EventOrder::Instant)
        } else {
            (EventOrder::Trigger, EventOrder::Release)
        };
        timed.push(Timed {
            tick: note.start(),
            order: on_order,
            on: true,
            key,
            vel: note.midi_velocity(),
        });
        timed.push(Timed {
            tick: note.start() + length,
            order: off_order,
            on: false,
            key,
            vel: 0,
        });
    }

    // Stable, so equal keys keep pattern order
    timed.sort_by_key(|e| (e.tick, e.order));
    timed
}

fn meta(message: MetaMessage<'_>) -> TrackEvent<'_> {
    TrackEvent { delta: u28::new(0), kind: TrackEventKind::Meta(message) }
}

fn micros_per_quarter(bpm: f64) -> Result<u32, FormatError> {
    if !(bpm.is_finite() && bpm > 0.0) {
        return Err(FormatError::InvalidTempo(bpm));
    }
    let micros = (60_000_000.0 / bpm).round();
    if micros < 1.0 || micros > u24::max_value().as_int() as f64 {
        return Err(FormatError::InvalidTempo(bpm));
    }
    Ok(micros as u32)
}

/// Numerator and log2 denominator as stored in the time signature meta event.
fn time_signature_fields(ts: TimeSignature) -> Result<(u8, u8), FormatError> {
    let numerator = u8::try_from(ts.numerator).ok().filter(|n| *n > 0);
    match numerator {
        Some(n) if ts.denominator.is_power_of_two() => Ok((n, ts.denominator.trailing_zeros() as u8)),
        _ => Err(FormatError::UnsupportedTimeSignature(ts)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tempo_conversion() {
        assert_eq!(micros_per_quarter(120.0).unwrap(), 500_000);
        assert_eq!(micros_per_quarter(90.0).unwrap(), 666_667);
        assert!(micros_per_quarter(0.0).is_err());
        assert!(micros_per_quarter(f64::NAN).is_err());
        assert!(micros_per_quarter(1.0).is_err());
    }

    #[test]
    fn time_signature_encoding() {
        assert_eq!(time_signature_fields(TimeSignature::FOUR_FOUR).unwrap(), (4, 2));
        assert_eq!(time_signature_fields(TimeSignature::new(7, 8)).unwrap(), (7, 3));
        assert_eq!(time_signature_fields(TimeSignature::new(2, 4)).unwrap(), (2, 2));
        assert!(time_signature_fields(TimeSignature::new(5, 6)).is_err());
        assert!(time_signature_fields(TimeSignature::new(0, 4)).is_err());
    }

    #[test]
    fn events_ordered_release_first() {
        let pattern = Pattern::from_notes(vec![
            boom_ir::Note::drum(0, 24, 24, 100),
            boom_ir::Note::drum(0, 0, 24, 100),
        ]);
        let events = collect_events(&pattern, &ExportSettings::default());
        let summary: Vec<(u32, bool)> = events.iter().map(|e| (e.tick, e.on)).collect();
        assert_eq!(summary, [(0, true), (24, false), (24, true), (48, false)]);
    }

    #[test]
    fn zero_length_pair_precedes_coincident_attack() {
        let pattern = Pattern::from_notes(vec![
            boom_ir::Note::drum(0, 24, 24, 100),
            boom_ir::Note::drum(0, 24, 0, 100),
        ]);
        let events = collect_events(&pattern, &ExportSettings::default());
        let summary: Vec<(u32, bool)> = events.iter().map(|e| (e.tick, e.on)).collect();
        assert_eq!(summary, [(24, true), (24, false), (24, true), (48, false)]);
    }

    #[test]
    fn note_held_for_one_loop_at_most() {
        let pattern = Pattern::from_notes(vec![boom_ir::Note::melodic(36, 96, 3072, 100)]);
        let events = collect_events(&pattern, &ExportSettings::default());
        let summary: Vec<(u32, bool)> = events.iter().map(|e| (e.tick, e.on)).collect();
        assert_eq!(summary, [(96, true), (96 + 1536, false)]);
    }
}
