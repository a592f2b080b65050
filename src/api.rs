//! # Public API
//!
//! Main entry points of the ledsong compiler.
//!
//! ## Compilation Functions
//!
//! - [`compile_events()`] - Compile an already-parsed note stream
//! - [`compile_midi()`] - Decode SMF bytes, then compile
//!
//! ## Typical Usage
//!
//! ```rust
//! use ledsong::{compile_events, CompileOptions, RawEvent};
//!
//! let events = [
//!     RawEvent::NoteOn { tick_delta: 0, pitch: 60, velocity: 100 },
//!     RawEvent::NoteOff { tick_delta: 480, pitch: 60 },
//! ];
//!
//! let compilation = compile_events(&events, 480, &CompileOptions::default())?;
//! assert_eq!(compilation.events.len(), 2);
//! assert_eq!(compilation.events[1].delta_ms, 500);
//! # Ok::<(), ledsong::LedsongError>(())
//! ```

use log::{debug, info, warn};
use serde::Serialize;

use crate::config::{CompileOptions, TempoOverride};
use crate::error::LedsongError;
use crate::midi::read_smf;
use crate::timeline::{
    build_timeline, check_alternation, count_note_ons, decode_deltas, encode_deltas,
    initial_tempo, scale_timeline, select_notes, ActuatorMap, CompilationStats, DeltaEvent,
    GapRules, RawEvent, TimelineEvent,
};

/// Everything one compilation produces.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Compilation {
    /// Chosen pitches, ascending; index i drives actuator i.
    pub chosen_pitches: Vec<u8>,
    pub actuator_map: ActuatorMap,
    /// Final schedule. Its length is the record count.
    pub events: Vec<DeltaEvent>,
    pub stats: CompilationStats,
    /// Tempo of the first tempo change in the stream, or 120.
    pub base_bpm: f64,
    pub effective_bpm: f64,
    /// Multiplier applied to every timestamp.
    pub scale_factor: f64,
    pub tempo: TempoOverride,
    pub gaps: GapRules,
}

impl Compilation {
    /// Absolute timestamps, rebuilt by summing the delays.
    pub fn timeline(&self) -> Vec<TimelineEvent> {
        decode_deltas(&self.events)
    }

    /// Total running time of the schedule in milliseconds.
    pub fn duration_ms(&self) -> u64 {
        self.events.iter().map(|e| e.delta_ms as u64).sum()
    }
}

/// Compile a merged, chronological note stream.
///
/// # Pipeline
/// 1. Validate options
/// 2. Count note-ons and choose pitches for the available actuators
/// 3. Walk the stream into an absolute-time timeline
/// 4. Rescale for the tempo override, if any
/// 5. Delta-encode
///
/// # Errors
/// [`LedsongError::InvalidConfig`] for bad options or a zero
/// `ticks_per_beat`, [`LedsongError::EmptyInput`] when the stream has no
/// note-ons.
pub fn compile_events(
    events: &[RawEvent],
    ticks_per_beat: u16,
    options: &CompileOptions,
) -> Result<Compilation, LedsongError> {
    options.validate()?;
    if ticks_per_beat == 0 {
        return Err(LedsongError::InvalidConfig(
            "ticks per beat must be positive".to_string(),
        ));
    }

    let counts = count_note_ons(events);
    let selection = select_notes(&counts, options.actuator_count())?;

    let built = build_timeline(events, &selection.map, ticks_per_beat, options.gaps);

    let base_bpm = 60_000_000.0 / initial_tempo(events) as f64;
    let (scale_factor, effective_bpm) = options.tempo.resolve(base_bpm)?;
    let timeline = scale_timeline(&built.events, scale_factor)?;
    debug!(
        "tempo {:.2} -> {:.2} BPM (factor {:.4})",
        base_bpm, effective_bpm, scale_factor
    );

    check_alternation(&timeline)?;
    let deltas = encode_deltas(&timeline)?;

    let stats = CompilationStats {
        truncated: selection.truncated,
        ..built.stats
    };
    if stats.skipped_note_ons > 0 {
        warn!("{} note_on events had no actuator and were skipped", stats.skipped_note_ons);
    }
    if stats.unmatched_note_offs > 0 {
        warn!("{} unmatched note_off events ignored", stats.unmatched_note_offs);
    }
    info!(
        "compiled {} events on {} actuators ({} forced retriggers)",
        deltas.len(),
        selection.map.len(),
        stats.forced_retriggers
    );

    Ok(Compilation {
        chosen_pitches: selection.pitches,
        actuator_map: selection.map,
        events: deltas,
        stats,
        base_bpm,
        effective_bpm,
        scale_factor,
        tempo: options.tempo,
        gaps: options.gaps,
    })
}

/// Decode a Standard MIDI File and compile it.
///
/// # Errors
/// [`LedsongError::ParseError`] when the file cannot be decoded, otherwise as
/// [`compile_events()`].
pub fn compile_midi(bytes: &[u8], options: &CompileOptions) -> Result<Compilation, LedsongError> {
    options.validate()?;
    let song = read_smf(bytes)?;
    compile_events(&song.events, song.ticks_per_beat, options)
}
