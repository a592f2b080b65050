//! Tick to millisecond conversion

use super::types::{RawEvent, DEFAULT_TEMPO_US_PER_BEAT};

/// Tempo-aware tick clock for one compilation run.
///
/// A tempo change only affects ticks converted after it; time already
/// elapsed is never reinterpreted.
#[derive(Debug, Clone)]
pub struct TempoClock {
    ticks_per_beat: u16,
    us_per_beat: u32,
}

impl TempoClock {
    pub fn new(ticks_per_beat: u16) -> Self {
        Self {
            ticks_per_beat,
            us_per_beat: DEFAULT_TEMPO_US_PER_BEAT,
        }
    }

    pub fn tempo(&self) -> u32 {
        self.us_per_beat
    }

    pub fn set_tempo(&mut self, us_per_beat: u32) {
        self.us_per_beat = us_per_beat;
    }

    /// Milliseconds spanned by `tick_delta` ticks at the current tempo,
    /// rounded to nearest (halves away from zero).
    pub fn advance(&self, tick_delta: u32) -> u64 {
        ticks_to_ms(tick_delta, self.ticks_per_beat, self.us_per_beat)
    }
}

/// Tempo of the first tempo change in the stream, or the 120 BPM default.
pub fn initial_tempo(events: &[RawEvent]) -> u32 {
    events
        .iter()
        .find_map(|e| match *e {
            RawEvent::TempoChange { us_per_beat, .. } => Some(us_per_beat),
            _ => None,
        })
        .unwrap_or(DEFAULT_TEMPO_US_PER_BEAT)
}

/// `round(1000 * ticks * tempo / (ticks_per_beat * 1_000_000))` in integer math.
pub fn ticks_to_ms(tick_delta: u32, ticks_per_beat: u16, us_per_beat: u32) -> u64 {
    if ticks_per_beat == 0 {
        return 0;
    }
    // ms = ticks * tempo / (tpb * 1000)
    let numerator = tick_delta as u128 * us_per_beat as u128;
    let denominator = ticks_per_beat as u128 * 1_000;
    ((numerator * 2 + denominator) / (denominator * 2)) as u64
}
