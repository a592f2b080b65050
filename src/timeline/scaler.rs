//! Tempo rescaling of an absolute timeline

use std::collections::HashMap;

use super::builder::sort_timeline;
use super::types::{SwitchState, TimelineEvent};
use crate::error::LedsongError;

/// Scale factor that turns `original_bpm` playback into `target_bpm`.
///
/// Below 1.0 the song plays faster, above 1.0 slower.
pub fn scale_factor(original_bpm: f64, target_bpm: f64) -> Result<f64, LedsongError> {
    if !(target_bpm.is_finite() && target_bpm > 0.0) {
        return Err(LedsongError::InvalidConfig(format!(
            "target tempo must be positive, got {}",
            target_bpm
        )));
    }
    if !(original_bpm.is_finite() && original_bpm > 0.0) {
        return Err(LedsongError::InvalidConfig(format!(
            "original tempo must be positive, got {}",
            original_bpm
        )));
    }
    Ok(original_bpm / target_bpm)
}

/// Multiply every timestamp by `factor` and restore timeline order.
///
/// Times are rounded to the nearest millisecond. Rounding can squeeze an On
/// and its Off onto the same millisecond, which the Off-before-On order would
/// then flip; such an Off is pushed one millisecond past its On instead. A
/// factor of exactly 1.0 returns the timeline untouched.
pub fn scale_timeline(
    timeline: &[TimelineEvent],
    factor: f64,
) -> Result<Vec<TimelineEvent>, LedsongError> {
    if !(factor.is_finite() && factor > 0.0) {
        return Err(LedsongError::InvalidConfig(format!(
            "tempo scale factor must be positive, got {}",
            factor
        )));
    }
    if factor == 1.0 {
        return Ok(timeline.to_vec());
    }

    let mut last_per_actuator: HashMap<u8, u64> = HashMap::new();
    let mut scaled: Vec<TimelineEvent> = timeline
        .iter()
        .map(|event| {
            let raw = (event.time_ms as f64 * factor).round().max(0.0) as u64;
            let time_ms = match (last_per_actuator.get(&event.actuator), event.state) {
                (Some(&last), SwitchState::Off) => raw.max(last + 1),
                (Some(&last), SwitchState::On) => raw.max(last),
                (None, _) => raw,
            };
            last_per_actuator.insert(event.actuator, time_ms);
            TimelineEvent { time_ms, ..*event }
        })
        .collect();

    sort_timeline(&mut scaled);
    Ok(scaled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::SwitchState::{Off, On};

    fn ev(time_ms: u64, actuator: u8, state: SwitchState) -> TimelineEvent {
        TimelineEvent::new(time_ms, actuator, state)
    }

    #[test]
    fn test_identity_factor() {
        let timeline = vec![ev(0, 0, On), ev(500, 0, Off), ev(535, 1, On), ev(900, 1, Off)];
        assert_eq!(scale_timeline(&timeline, 1.0).unwrap(), timeline);
    }

    #[test]
    fn test_slow_down_120_to_90() {
        let factor = scale_factor(120.0, 90.0).unwrap();
        assert!((factor - 4.0 / 3.0).abs() < 1e-12);

        let timeline = vec![ev(0, 0, On), ev(300, 0, Off), ev(450, 1, On), ev(1000, 1, Off)];
        let scaled = scale_timeline(&timeline, factor).unwrap();
        let times: Vec<u64> = scaled.iter().map(|e| e.time_ms).collect();
        assert_eq!(times, vec![0, 400, 600, 1333]);
    }

    #[test]
    fn test_speed_up_keeps_pulses_open() {
        // At 0.1x, On@3 and Off@4 both round to 0
        let timeline = vec![ev(3, 0, On), ev(4, 0, Off)];
        let scaled = scale_timeline(&timeline, 0.1).unwrap();
        assert_eq!(scaled, vec![ev(0, 0, On), ev(1, 0, Off)]);
    }

    #[test]
    fn test_resort_after_rounding() {
        // Off@6 on actuator 1 and On@5 on actuator 0 collide at 0.5x
        let timeline = vec![ev(0, 1, On), ev(5, 0, On), ev(6, 1, Off), ev(20, 0, Off)];
        let scaled = scale_timeline(&timeline, 0.5).unwrap();
        assert_eq!(
            scaled,
            vec![ev(0, 1, On), ev(3, 1, Off), ev(3, 0, On), ev(10, 0, Off)]
        );
    }

    #[test]
    fn test_rejects_non_positive() {
        assert!(matches!(
            scale_timeline(&[], 0.0),
            Err(LedsongError::InvalidConfig(_))
        ));
        assert!(matches!(
            scale_timeline(&[], -2.0),
            Err(LedsongError::InvalidConfig(_))
        ));
        assert!(matches!(
            scale_factor(120.0, 0.0),
            Err(LedsongError::InvalidConfig(_))
        ));
        assert!(matches!(
            scale_factor(120.0, f64::NAN),
            Err(LedsongError::InvalidConfig(_))
        ));
    }
}
