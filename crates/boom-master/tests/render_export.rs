//! Offline render and MIDI export through the controller.

use boom_master::{Bars, Controller, Engine, MidiMessage, Note, Pattern, TimeSignature};
use midly::{MidiMessage as SmfMessage, Smf, TrackEventKind};

const SR: u32 = 48_000;
/// Exactly 6 ticks at 120 BPM
const BLOCK: u32 = 1500;

fn ons(events: &[boom_master::RenderedEvent]) -> Vec<(u64, MidiMessage)> {
    events
        .iter()
        .filter(|e| e.message.is_note_on())
        .map(|e| (e.sample, e.message))
        .collect()
}

#[test]
fn rolls_render_at_eighth_note_spacing() {
    let mut c = Controller::new();
    c.generate_rolls().unwrap();

    let events = c.render(SR, BLOCK, 1).unwrap();
    let on = ons(&events);
    assert_eq!(on.len(), 32);
    for (i, (sample, message)) in on.iter().enumerate() {
        // 48 ticks = 0.25 s
        assert_eq!(*sample, i as u64 * 12_000);
        assert_eq!(*message, MidiMessage::note_on(0, 36, 90));
    }

    let offs = events.len() - on.len();
    assert_eq!(offs, 32);
}

#[test]
fn render_is_sorted_and_repeatable() {
    let mut c = Controller::new();
    c.toggle_drum_cell(0, 0).unwrap();
    c.toggle_drum_cell(1, 4).unwrap();
    c.toggle_drum_cell(2, 6).unwrap();

    let a = c.render(SR, BLOCK, 2).unwrap();
    let b = c.render(SR, BLOCK, 2).unwrap();
    assert_eq!(a, b);
    assert!(a.windows(2).all(|w| w[0].sample <= w[1].sample));
    assert_eq!(ons(&a).len(), 6);
}

#[test]
fn melodic_engine_renders_pitches_on_selected_channel() {
    let mut c = Controller::new();
    c.set_engine(Engine::EightOhEight);
    c.set_midi_channel(2).unwrap();
    c.set_pattern(Pattern::from_notes(vec![Note::melodic(33, 96, 96, 120)]));

    let events = c.render(SR, BLOCK, 1).unwrap();
    assert_eq!(
        ons(&events),
        [(24_000, MidiMessage::note_on(1, 33, 120))]
    );
}

#[test]
fn eight_bars_doubles_render_length() {
    let mut c = Controller::new();
    c.set_bars(Bars::Eight);
    c.set_pattern(Pattern::from_notes(vec![Note::drum(0, 1536, 24, 100)]));

    // The note sits in bar 5, only audible with eight bars selected
    let events = c.render(SR, BLOCK, 1).unwrap();
    assert_eq!(ons(&events), [(384_000, MidiMessage::note_on(0, 35, 100))]);

    c.set_bars(Bars::Four);
    assert!(ons(&c.render(SR, BLOCK, 1).unwrap()).is_empty());
}

#[test]
fn exported_file_matches_pattern() {
    let mut c = Controller::new();
    c.set_tempo(100.0).unwrap();
    c.set_time_signature(TimeSignature::new(3, 4)).unwrap();
    c.toggle_drum_cell(0, 0).unwrap();
    c.toggle_drum_cell(3, 8).unwrap();

    let bytes = c.export_midi().unwrap();
    let smf = Smf::parse(&bytes).unwrap();

    let mut tick = 0;
    let mut notes = Vec::new();
    for ev in &smf.tracks[0] {
        tick += ev.delta.as_int();
        if let TrackEventKind::Midi { message: SmfMessage::NoteOn { key, .. }, .. } = ev.kind {
            notes.push((tick, key.as_int()));
        }
    }
    assert_eq!(notes, [(0, 35), (192, 38)]);
}

#[test]
fn export_to_file() {
    let dir = std::env::temp_dir().join(format!("boom-master-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("pattern.mid");

    let mut c = Controller::new();
    c.generate_rolls().unwrap();
    c.export_midi_to(&path).unwrap();

    let bytes = std::fs::read(&path).unwrap();
    std::fs::remove_dir_all(&dir).unwrap();
    assert!(Smf::parse(&bytes).is_ok());
}
