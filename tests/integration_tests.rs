//! Integration tests for the ledsong compiler
//!
//! Tests the full pipeline from Standard MIDI File bytes to the delta-encoded
//! schedule and the generated Arduino header.

use ledsong::{
    compile_midi, to_arduino_header, CompileOptions, LedsongError, SwitchState, TempoOverride,
};
use midly::num::{u15, u24, u28, u4, u7};
use midly::{Format, Header, MetaMessage, MidiMessage, Smf, Timing, TrackEvent, TrackEventKind};

fn note(delta: u32, key: u8, on: bool) -> TrackEvent<'static> {
    let message = if on {
        MidiMessage::NoteOn {
            key: u7::new(key),
            vel: u7::new(100),
        }
    } else {
        MidiMessage::NoteOff {
            key: u7::new(key),
            vel: u7::new(64),
        }
    };
    TrackEvent {
        delta: u28::new(delta),
        kind: TrackEventKind::Midi {
            channel: u4::new(0),
            message,
        },
    }
}

fn meta(delta: u32, message: MetaMessage<'static>) -> TrackEvent<'static> {
    TrackEvent {
        delta: u28::new(delta),
        kind: TrackEventKind::Meta(message),
    }
}

/// E D C (half) C at 110 BPM, 480 ticks per beat, tempo on its own track.
fn three_note_tune() -> Vec<u8> {
    let mut smf = Smf::new(Header::new(Format::Parallel, Timing::Metrical(u15::new(480))));
    smf.tracks.push(vec![
        meta(0, MetaMessage::Tempo(u24::new(545_455))),
        meta(0, MetaMessage::EndOfTrack),
    ]);
    smf.tracks.push(vec![
        meta(0, MetaMessage::TrackName(b"melody")),
        note(0, 52, true),
        note(480, 52, false),
        note(0, 50, true),
        note(480, 50, false),
        note(0, 48, true),
        note(960, 48, false),
        note(0, 48, true),
        note(480, 48, false),
        meta(0, MetaMessage::EndOfTrack),
    ]);
    let mut buf = Vec::new();
    smf.write(&mut buf).unwrap();
    buf
}

#[test]
fn test_compile_midi_schedule() {
    let compilation = compile_midi(&three_note_tune(), &CompileOptions::default()).unwrap();

    assert_eq!(compilation.chosen_pitches, vec![48, 50, 52]);
    assert!(!compilation.stats.truncated);
    assert_eq!(compilation.stats.forced_retriggers, 0);

    let schedule: Vec<(u32, u8, bool)> = compilation
        .events
        .iter()
        .map(|e| (e.delta_ms, e.actuator, e.state == SwitchState::On))
        .collect();
    assert_eq!(
        schedule,
        vec![
            (0, 2, true),
            (545, 2, false),
            (0, 1, true),
            (545, 1, false),
            (0, 0, true),
            (1091, 0, false),
            (35, 0, true), // repeated C waits out the minimum gap
            (510, 0, false),
        ]
    );
    assert_eq!(compilation.duration_ms(), 2726);
}

#[test]
fn test_compile_midi_header() {
    let options = CompileOptions::default();
    let compilation = compile_midi(&three_note_tune(), &options).unwrap();
    let h = to_arduino_header(&compilation, &options.outputs, "Three Notes.mid");

    assert!(h.contains("// Base tempo: 110.00 BPM"));
    assert!(h.contains("// Effective output tempo: 110.00 BPM"));
    assert!(h.contains("// Minimum OFF gap between repeated notes: 35 ms"));
    assert!(h.contains("//   RED(D2) <- MIDI note 48"));
    assert!(h.contains("//   BLUE(D4) <- MIDI note 52"));
    assert!(!h.contains("WHITE(D5)"));
    assert!(h.contains("  { 0u, 4u, 1u },\n  { 545u, 4u, 0u },"));
    assert!(h.contains("  { 35u, 2u, 1u },\n  { 510u, 2u, 0u },\n};"));
    assert!(h.contains("const uint32_t SONG_LEN = 8u;"));
}

#[test]
fn test_compile_midi_with_multiplier() {
    let mut options = CompileOptions::default();
    options.tempo = TempoOverride::Multiplier(2.0);
    let compilation = compile_midi(&three_note_tune(), &options).unwrap();

    assert_eq!(compilation.scale_factor, 0.5);
    assert!((compilation.effective_bpm - 220.0).abs() < 0.01);
    let last = compilation.timeline().last().copied().unwrap();
    assert_eq!(last.time_ms, 1363);
}

#[test]
fn test_compile_midi_json() {
    let compilation = compile_midi(&three_note_tune(), &CompileOptions::default()).unwrap();
    let json = serde_json::to_string(&compilation).unwrap();

    assert!(json.contains("\"deltaMs\":545"));
    assert!(json.contains("\"state\":\"on\""));
    assert!(json.contains("\"forcedRetriggers\":0"));
    assert!(json.contains("\"chosenPitches\":[48,50,52]"));
}

#[test]
fn test_compile_is_repeatable() {
    let bytes = three_note_tune();
    let options = CompileOptions::with_actuator_count(2).unwrap();
    let first = compile_midi(&bytes, &options).unwrap();
    let second = compile_midi(&bytes, &options).unwrap();

    assert_eq!(first, second);
    assert!(first.stats.truncated);
    assert_eq!(first.chosen_pitches, vec![48, 50]);
    assert_eq!(first.stats.skipped_note_ons, 1);
}

#[test]
fn test_config_checked_before_parsing() {
    let mut options = CompileOptions::default();
    options.outputs.clear();
    let err = compile_midi(b"garbage", &options).unwrap_err();
    assert!(matches!(err, LedsongError::InvalidConfig(_)));

    let mut options = CompileOptions::default();
    options.tempo = TempoOverride::Bpm(-90.0);
    let err = compile_midi(b"garbage", &options).unwrap_err();
    assert!(matches!(err, LedsongError::InvalidConfig(_)));
}

#[test]
fn test_parse_error_propagates() {
    let err = compile_midi(b"MThd garbage", &CompileOptions::default()).unwrap_err();
    assert!(matches!(err, LedsongError::ParseError { .. }));
}

#[test]
fn test_file_without_notes() {
    let mut smf = Smf::new(Header::new(Format::SingleTrack, Timing::Metrical(u15::new(96))));
    smf.tracks.push(vec![
        meta(0, MetaMessage::Tempo(u24::new(500_000))),
        meta(96, MetaMessage::EndOfTrack),
    ]);
    let mut bytes = Vec::new();
    smf.write(&mut bytes).unwrap();

    let err = compile_midi(&bytes, &CompileOptions::default()).unwrap_err();
    assert!(matches!(err, LedsongError::EmptyInput));
}
