//! # Standard MIDI File Front End
//!
//! Turns SMF bytes into the flat [`RawEvent`] stream the timeline compiler
//! consumes.
//!
//! ## What happens here
//! - The header's ticks-per-beat is read; SMPTE (timecode) files are rejected
//! - Every track is walked to absolute ticks, then all tracks are merged into
//!   one chronological stream. Events at the same tick keep track order, then
//!   their order inside the track.
//! - `NoteOn` with velocity 0 becomes `NoteOff`
//! - Everything except notes and tempo changes is dropped. The ticks those
//!   messages spanned are not lost: deltas are recomputed from absolute ticks.
//!
//! ## Example
//! ```rust,no_run
//! let bytes = std::fs::read("song.mid").unwrap();
//! let song = ledsong::midi::read_smf(&bytes)?;
//! println!("{} events at {} ticks/beat", song.events.len(), song.ticks_per_beat);
//! # Ok::<(), ledsong::LedsongError>(())
//! ```

use log::debug;
use midly::{MetaMessage, MidiMessage, Smf, Timing, TrackEventKind};

use crate::error::LedsongError;
use crate::timeline::RawEvent;

/// A decoded MIDI file, reduced to what the compiler needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MidiSong {
    pub ticks_per_beat: u16,
    pub track_count: usize,
    /// Merged, chronological note and tempo messages.
    pub events: Vec<RawEvent>,
}

/// Kept message before tick deltas are known.
#[derive(Debug, Clone, Copy)]
enum Kept {
    NoteOn { pitch: u8, velocity: u8 },
    NoteOff { pitch: u8 },
    Tempo(u32),
}

/// Decode an SMF byte buffer.
///
/// # Errors
/// [`LedsongError::ParseError`] for malformed files, timecode-based timing,
/// a zero ticks-per-beat division or a zero tempo.
pub fn read_smf(bytes: &[u8]) -> Result<MidiSong, LedsongError> {
    let smf = Smf::parse(bytes).map_err(|e| LedsongError::ParseError {
        track: None,
        message: e.to_string(),
    })?;

    let ticks_per_beat = match smf.header.timing {
        Timing::Metrical(tpb) => tpb.as_int(),
        Timing::Timecode(fps, sub) => {
            return Err(LedsongError::ParseError {
                track: None,
                message: format!(
                    "timecode timing ({} fps, {} subframes) is not supported",
                    fps.as_int(),
                    sub
                ),
            })
        }
    };
    if ticks_per_beat == 0 {
        return Err(LedsongError::ParseError {
            track: None,
            message: "ticks per beat is zero".to_string(),
        });
    }

    // (absolute tick, track, index in track, message)
    let mut timed: Vec<(u64, usize, usize, Kept)> = Vec::new();
    for (track_idx, track) in smf.tracks.iter().enumerate() {
        let mut abs_ticks = 0u64;
        for (event_idx, event) in track.iter().enumerate() {
            abs_ticks += event.delta.as_int() as u64;
            let kept = match event.kind {
                TrackEventKind::Meta(MetaMessage::Tempo(tempo)) => {
                    let us_per_beat = tempo.as_int();
                    if us_per_beat == 0 {
                        return Err(LedsongError::ParseError {
                            track: Some(track_idx),
                            message: "tempo of 0 microseconds per beat".to_string(),
                        });
                    }
                    Kept::Tempo(us_per_beat)
                }
                TrackEventKind::Midi { message, .. } => match message {
                    MidiMessage::NoteOn { key, vel } if vel.as_int() > 0 => Kept::NoteOn {
                        pitch: key.as_int(),
                        velocity: vel.as_int(),
                    },
                    MidiMessage::NoteOn { key, .. } | MidiMessage::NoteOff { key, .. } => {
                        Kept::NoteOff {
                            pitch: key.as_int(),
                        }
                    }
                    _ => continue,
                },
                _ => continue,
            };
            timed.push((abs_ticks, track_idx, event_idx, kept));
        }
    }
    timed.sort_by_key(|&(tick, track, idx, _)| (tick, track, idx));

    let mut events = Vec::with_capacity(timed.len());
    let mut previous = 0u64;
    for (tick, track, _, kept) in timed {
        let tick_delta = u32::try_from(tick - previous).map_err(|_| LedsongError::ParseError {
            track: Some(track),
            message: format!("gap of {} ticks is too long", tick - previous),
        })?;
        previous = tick;
        events.push(match kept {
            Kept::NoteOn { pitch, velocity } => RawEvent::NoteOn {
                tick_delta,
                pitch,
                velocity,
            },
            Kept::NoteOff { pitch } => RawEvent::NoteOff { tick_delta, pitch },
            Kept::Tempo(us_per_beat) => RawEvent::TempoChange {
                tick_delta,
                us_per_beat,
            },
        });
    }

    debug!(
        "read {} tracks at {} ticks/beat, {} note/tempo events",
        smf.tracks.len(),
        ticks_per_beat,
        events.len()
    );

    Ok(MidiSong {
        ticks_per_beat,
        track_count: smf.tracks.len(),
        events,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use midly::num::{u15, u24, u28, u4, u7};
    use midly::{Format, Header, Track, TrackEvent};

    fn note(delta: u32, key: u8, vel: u8, on: bool) -> TrackEvent<'static> {
        let message = if on {
            MidiMessage::NoteOn {
                key: u7::new(key),
                vel: u7::new(vel),
            }
        } else {
            MidiMessage::NoteOff {
                key: u7::new(key),
                vel: u7::new(vel),
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

    fn encode(timing: Timing, tracks: Vec<Track<'static>>) -> Vec<u8> {
        let mut smf = Smf::new(Header::new(Format::Parallel, timing));
        smf.tracks = tracks;
        let mut buf = Vec::new();
        smf.write(&mut buf).unwrap();
        buf
    }

    #[test]
    fn test_merges_tracks_chronologically() {
        let tempo_track = vec![
            meta(0, MetaMessage::Tempo(u24::new(600_000))),
            meta(960, MetaMessage::Tempo(u24::new(400_000))),
            meta(0, MetaMessage::EndOfTrack),
        ];
        let melody = vec![
            note(0, 60, 100, true),
            note(480, 60, 0, false),
            note(0, 62, 90, true),
            note(480, 62, 0, true), // velocity 0 note-on is a note-off
            meta(0, MetaMessage::EndOfTrack),
        ];
        let bytes = encode(Timing::Metrical(u15::new(480)), vec![tempo_track, melody]);

        let song = read_smf(&bytes).unwrap();
        assert_eq!(song.ticks_per_beat, 480);
        assert_eq!(song.track_count, 2);
        assert_eq!(
            song.events,
            vec![
                RawEvent::TempoChange {
                    tick_delta: 0,
                    us_per_beat: 600_000,
                },
                RawEvent::NoteOn {
                    tick_delta: 0,
                    pitch: 60,
                    velocity: 100,
                },
                RawEvent::NoteOff {
                    tick_delta: 480,
                    pitch: 60,
                },
                RawEvent::NoteOn {
                    tick_delta: 0,
                    pitch: 62,
                    velocity: 90,
                },
                RawEvent::TempoChange {
                    tick_delta: 480,
                    us_per_beat: 400_000,
                },
                RawEvent::NoteOff {
                    tick_delta: 0,
                    pitch: 62,
                },
            ]
        );
    }

    #[test]
    fn test_dropped_messages_keep_their_ticks() {
        let track = vec![
            note(0, 60, 100, true),
            TrackEvent {
                delta: u28::new(100),
                kind: TrackEventKind::Midi {
                    channel: u4::new(0),
                    message: MidiMessage::ProgramChange {
                        program: u7::new(5),
                    },
                },
            },
            note(380, 60, 0, false),
            meta(0, MetaMessage::EndOfTrack),
        ];
        let bytes = encode(Timing::Metrical(u15::new(480)), vec![track]);

        let song = read_smf(&bytes).unwrap();
        assert_eq!(song.events.len(), 2);
        assert_eq!(
            song.events[1],
            RawEvent::NoteOff {
                tick_delta: 480,
                pitch: 60,
            }
        );
    }

    #[test]
    fn test_rejects_timecode() {
        let bytes = encode(
            Timing::Timecode(midly::Fps::Fps25, 40),
            vec![vec![meta(0, MetaMessage::EndOfTrack)]],
        );
        let err = read_smf(&bytes).unwrap_err();
        assert!(matches!(err, LedsongError::ParseError { track: None, .. }));
    }

    #[test]
    fn test_rejects_zero_tempo() {
        let track = vec![
            meta(0, MetaMessage::Tempo(u24::new(0))),
            meta(0, MetaMessage::EndOfTrack),
        ];
        let bytes = encode(Timing::Metrical(u15::new(96)), vec![track]);
        let err = read_smf(&bytes).unwrap_err();
        assert!(matches!(err, LedsongError::ParseError { track: Some(0), .. }));
    }

    #[test]
    fn test_rejects_garbage() {
        let err = read_smf(b"not a midi file").unwrap_err();
        assert!(matches!(err, LedsongError::ParseError { .. }));
    }
}
