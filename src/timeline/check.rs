//! Structural checks over a finished timeline.

use std::collections::HashMap;

use super::types::{SwitchState, TimelineEvent};
use crate::error::LedsongError;

/// Every actuator must alternate On, Off, On, Off ... and end Off.
pub fn check_alternation(timeline: &[TimelineEvent]) -> Result<(), LedsongError> {
    let mut last: HashMap<u8, SwitchState> = HashMap::new();

    for (index, event) in timeline.iter().enumerate() {
        let previous = last.insert(event.actuator, event.state);
        let broken = match (previous, event.state) {
            (None, SwitchState::Off) => Some("Off before any On"),
            (Some(SwitchState::On), SwitchState::On) => Some("two On entries in a row"),
            (Some(SwitchState::Off), SwitchState::Off) => Some("two Off entries in a row"),
            _ => None,
        };
        if let Some(message) = broken {
            return Err(LedsongError::InvariantViolation {
                actuator: event.actuator,
                index,
                message: message.to_string(),
            });
        }
    }

    let mut dangling: Vec<u8> = last
        .into_iter()
        .filter(|&(_, state)| state == SwitchState::On)
        .map(|(actuator, _)| actuator)
        .collect();
    dangling.sort_unstable();
    match dangling.first() {
        Some(&actuator) => Err(LedsongError::InvariantViolation {
            actuator,
            index: timeline.len(),
            message: "still On at the end of the timeline".to_string(),
        }),
        None => Ok(()),
    }
}

/// Non-decreasing time, Off before On at equal time.
pub fn is_ordered(timeline: &[TimelineEvent]) -> bool {
    timeline
        .windows(2)
        .all(|pair| pair[0].order_key() <= pair[1].order_key())
}
