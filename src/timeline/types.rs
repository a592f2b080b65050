//! Timeline type definitions
//!
//! This module defines the event and bookkeeping types that flow through the
//! timeline pipeline, from the parsed note stream to the delta-encoded schedule.

use std::collections::BTreeMap;

use serde::Serialize;

/// Default tempo when a stream carries no tempo change: 120 BPM.
pub const DEFAULT_TEMPO_US_PER_BEAT: u32 = 500_000;

/// One message of the merged, chronological input stream.
///
/// Each variant carries the ticks elapsed since the previous message of the
/// stream, whatever kind that message was.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawEvent {
    NoteOn {
        tick_delta: u32,
        pitch: u8,
        velocity: u8,
    },
    NoteOff { tick_delta: u32, pitch: u8 },
    TempoChange { tick_delta: u32, us_per_beat: u32 },
}

impl RawEvent {
    pub fn tick_delta(&self) -> u32 {
        match *self {
            RawEvent::NoteOn { tick_delta, .. }
            | RawEvent::NoteOff { tick_delta, .. }
            | RawEvent::TempoChange { tick_delta, .. } => tick_delta,
        }
    }
}

/// Binary output state
///
/// `Off` orders before `On`, so sorting by `(time, state)` releases an
/// actuator before any activation at the same instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SwitchState {
    Off,
    On,
}

impl SwitchState {
    pub fn is_on(self) -> bool {
        self == SwitchState::On
    }
}

/// One absolute-time actuator transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEvent {
    pub time_ms: u64,
    pub actuator: u8,
    pub state: SwitchState,
}

impl TimelineEvent {
    pub fn new(time_ms: u64, actuator: u8, state: SwitchState) -> Self {
        Self {
            time_ms,
            actuator,
            state,
        }
    }

    /// Sort key: time ascending, then Off before On.
    pub fn order_key(&self) -> (u64, SwitchState) {
        (self.time_ms, self.state)
    }
}

/// One delta-encoded actuator transition.
///
/// `delta_ms` is the delay before this event, measured from the previous one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeltaEvent {
    pub delta_ms: u32,
    pub actuator: u8,
    pub state: SwitchState,
}

/// Pitch to actuator assignment chosen by the note selector.
///
/// Immutable once built. Actuator ids are dense, `0..len()`, and follow
/// ascending pitch order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ActuatorMap {
    slots: BTreeMap<u8, u8>,
}

impl ActuatorMap {
    /// Build a map from pitches already in ascending order.
    pub(crate) fn from_sorted_pitches(pitches: &[u8]) -> Self {
        let slots = pitches
            .iter()
            .enumerate()
            .map(|(id, &pitch)| (pitch, id as u8))
            .collect();
        Self { slots }
    }

    pub fn actuator_for(&self, pitch: u8) -> Option<u8> {
        self.slots.get(&pitch).copied()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// `(pitch, actuator)` pairs in ascending pitch (and therefore id) order.
    pub fn iter(&self) -> impl Iterator<Item = (u8, u8)> + '_ {
        self.slots.iter().map(|(&pitch, &id)| (pitch, id))
    }
}

/// Non-fatal conditions recorded while compiling.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompilationStats {
    pub forced_retriggers: u32,
    pub skipped_note_ons: u32,
    pub unmatched_note_offs: u32,
    /// More distinct pitches existed than actuator slots.
    pub truncated: bool,
}
