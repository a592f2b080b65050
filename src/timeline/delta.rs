//! Delta-time encoding
//!
//! Playback firmware only needs "wait, then switch", so the final schedule
//! stores the delay before each event instead of absolute timestamps.

use super::types::{DeltaEvent, TimelineEvent};
use crate::error::LedsongError;

/// Encode a sorted timeline as consecutive differences.
///
/// The first delta is measured from time zero. Each later delta is measured
/// from the event right before it; a timestamp earlier than its predecessor
/// (an unsorted input) encodes as a zero delay.
///
/// # Errors
/// [`LedsongError::InvalidConfig`] if a single gap does not fit in 32 bits,
/// which no real song reaches (about 49 days).
pub fn encode_deltas(timeline: &[TimelineEvent]) -> Result<Vec<DeltaEvent>, LedsongError> {
    let mut previous = 0u64;
    timeline
        .iter()
        .map(|event| {
            let gap = event.time_ms.saturating_sub(previous);
            previous = event.time_ms;
            let delta_ms = u32::try_from(gap).map_err(|_| {
                LedsongError::InvalidConfig(format!(
                    "gap of {} ms exceeds 32-bit delay field",
                    gap
                ))
            })?;
            Ok(DeltaEvent {
                delta_ms,
                actuator: event.actuator,
                state: event.state,
            })
        })
        .collect()
}

/// Rebuild absolute times by cumulative summation.
pub fn decode_deltas(deltas: &[DeltaEvent]) -> Vec<TimelineEvent> {
    let mut now = 0u64;
    deltas
        .iter()
        .map(|d| {
            now += d.delta_ms as u64;
            TimelineEvent::new(now, d.actuator, d.state)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::types::SwitchState::{Off, On};

    #[test]
    fn test_first_delta_counts_from_zero() {
        let timeline = vec![
            TimelineEvent::new(35, 2, On),
            TimelineEvent::new(545, 2, Off),
            TimelineEvent::new(545, 1, On),
        ];
        let deltas = encode_deltas(&timeline).unwrap();
        let gaps: Vec<u32> = deltas.iter().map(|d| d.delta_ms).collect();
        assert_eq!(gaps, vec![35, 510, 0]);
        assert_eq!(deltas[2].actuator, 1);
        assert_eq!(deltas[2].state, On);
    }

    #[test]
    fn test_decode_restores_times() {
        let timeline = vec![
            TimelineEvent::new(0, 0, On),
            TimelineEvent::new(250, 0, Off),
            TimelineEvent::new(250, 3, On),
            TimelineEvent::new(1200, 3, Off),
        ];
        let deltas = encode_deltas(&timeline).unwrap();
        assert_eq!(decode_deltas(&deltas), timeline);
    }

    #[test]
    fn test_unsorted_input_measures_from_predecessor() {
        let timeline = vec![
            TimelineEvent::new(10, 0, On),
            TimelineEvent::new(5, 1, On),
            TimelineEvent::new(7, 1, Off),
        ];
        let gaps: Vec<u32> = encode_deltas(&timeline)
            .unwrap()
            .iter()
            .map(|d| d.delta_ms)
            .collect();
        assert_eq!(gaps, vec![10, 0, 2]);
    }

    #[test]
    fn test_empty() {
        assert!(encode_deltas(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_oversized_gap() {
        let timeline = vec![TimelineEvent::new(u32::MAX as u64 + 1, 0, On)];
        assert!(matches!(
            encode_deltas(&timeline),
            Err(LedsongError::InvalidConfig(_))
        ));
    }
}
