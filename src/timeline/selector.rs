//! Pitch selection and actuator assignment

use std::collections::BTreeMap;

use log::{debug, warn};

use super::types::{ActuatorMap, RawEvent};
use crate::error::LedsongError;

/// Outcome of choosing which pitches get an actuator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub map: ActuatorMap,
    /// Chosen pitches, ascending. Index i drives actuator i.
    pub pitches: Vec<u8>,
    /// More distinct pitches were played than there are actuators.
    pub truncated: bool,
}

/// Per-pitch count of note-ons with nonzero velocity.
pub fn count_note_ons(events: &[RawEvent]) -> BTreeMap<u8, u32> {
    let mut counts = BTreeMap::new();
    for event in events {
        if let RawEvent::NoteOn { pitch, velocity, .. } = *event {
            if velocity > 0 {
                *counts.entry(pitch).or_insert(0) += 1;
            }
        }
    }
    counts
}

/// Choose up to `actuator_count` pitches from note-on counts.
///
/// The most frequent pitches win; equal counts go to the lower pitch. The
/// winners are then assigned actuator ids in ascending pitch order, so the
/// lowest chosen note always drives actuator 0.
///
/// # Errors
/// [`LedsongError::EmptyInput`] when `counts` is empty, and
/// [`LedsongError::InvalidConfig`] when `actuator_count` is zero.
pub fn select_notes(
    counts: &BTreeMap<u8, u32>,
    actuator_count: usize,
) -> Result<Selection, LedsongError> {
    if actuator_count == 0 {
        return Err(LedsongError::InvalidConfig(
            "actuator count must be at least 1".to_string(),
        ));
    }
    if counts.is_empty() {
        return Err(LedsongError::EmptyInput);
    }

    let mut ranked: Vec<(u8, u32)> = counts.iter().map(|(&p, &c)| (p, c)).collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

    let mut pitches: Vec<u8> = ranked
        .iter()
        .take(actuator_count)
        .map(|&(pitch, _)| pitch)
        .collect();
    pitches.sort_unstable();

    let truncated = counts.len() > actuator_count;
    if truncated {
        let dropped: Vec<u8> = ranked
            .iter()
            .skip(actuator_count)
            .map(|&(pitch, _)| pitch)
            .collect();
        warn!(
            "{} distinct pitches for {} actuators; dropping {:?}",
            counts.len(),
            actuator_count,
            dropped
        );
    }
    debug!("selected pitches {:?}", pitches);

    Ok(Selection {
        map: ActuatorMap::from_sorted_pitches(&pitches),
        pitches,
        truncated,
    })
}
