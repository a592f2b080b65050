//! Timeline builder
//!
//! Walks the merged note stream once and turns it into absolute-time actuator
//! transitions. Each actuator runs a two-state machine (idle/active); all of
//! them share one running clock driven by the [`TempoClock`].
//!
//! ## Conflict rules
//! - A note-on for an idle actuator opens it, but never sooner than
//!   `min_gap_ms` after that actuator last closed. Two short pulses close
//!   together would otherwise read as one.
//! - A note-on for an active actuator is a *retrigger*: the actuator is closed
//!   right away and reopened `retrigger_gap_ms` later, so the output is visibly
//!   off for a moment even when the source notes touch.
//! - An Off is never scheduled at or before the On it closes. When an On was
//!   pushed later by the gap rule, its Off moves to at least one millisecond
//!   after it, keeping every actuator strictly alternating On/Off.
//! - Anything still active when the stream ends is closed `retrigger_gap_ms`
//!   after the last event, in ascending actuator order.

use log::debug;
use serde::Serialize;

use super::clock::TempoClock;
use super::types::{ActuatorMap, CompilationStats, RawEvent, SwitchState, TimelineEvent};

/// Gap constants enforced between transitions of the same actuator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GapRules {
    pub min_gap_ms: u64,
    pub retrigger_gap_ms: u64,
}

impl Default for GapRules {
    fn default() -> Self {
        Self {
            min_gap_ms: 35,
            retrigger_gap_ms: 35,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct ActuatorState {
    active: bool,
    last_on_ms: u64,
    last_off_ms: Option<u64>,
}

/// Result of one walk over the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltTimeline {
    /// Sorted by time, Off before On at equal time.
    pub events: Vec<TimelineEvent>,
    /// `truncated` is left unset; that belongs to selection.
    pub stats: CompilationStats,
    /// Running clock value after the last input event.
    pub end_ms: u64,
}

/// Single-use state machine over one note stream.
pub struct TimelineBuilder<'a> {
    map: &'a ActuatorMap,
    gaps: GapRules,
    clock: TempoClock,
    now_ms: u64,
    actuators: Vec<ActuatorState>,
    events: Vec<TimelineEvent>,
    stats: CompilationStats,
}

impl<'a> TimelineBuilder<'a> {
    pub fn new(map: &'a ActuatorMap, ticks_per_beat: u16, gaps: GapRules) -> Self {
        Self {
            map,
            gaps,
            clock: TempoClock::new(ticks_per_beat),
            now_ms: 0,
            actuators: vec![ActuatorState::default(); map.len()],
            events: Vec::new(),
            stats: CompilationStats::default(),
        }
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Feed the next message of the stream.
    pub fn push(&mut self, event: &RawEvent) {
        // Elapsed time counts even for messages that end up ignored.
        self.now_ms = self.now_ms.saturating_add(self.clock.advance(event.tick_delta()));

        match *event {
            RawEvent::TempoChange { us_per_beat, .. } => self.clock.set_tempo(us_per_beat),
            RawEvent::NoteOn { pitch, velocity, .. } if velocity > 0 => {
                match self.map.actuator_for(pitch) {
                    Some(id) => self.note_on(id),
                    None => self.stats.skipped_note_ons += 1,
                }
            }
            // A zero-velocity note-on is a note-off.
            RawEvent::NoteOn { pitch, .. } | RawEvent::NoteOff { pitch, .. } => {
                if let Some(id) = self.map.actuator_for(pitch) {
                    self.note_off(id);
                }
            }
        }
    }

    fn note_on(&mut self, id: u8) {
        let now = self.now_ms;
        let state = self.actuators[id as usize];

        let on_at = if state.active {
            let off_at = self.emit_off(id, now);
            self.stats.forced_retriggers += 1;
            let earliest = off_at.saturating_add(self.gaps.retrigger_gap_ms);
            match state.last_off_ms {
                Some(prev) => earliest.max(prev.saturating_add(self.gaps.min_gap_ms)),
                None => earliest,
            }
        } else {
            match state.last_off_ms {
                Some(prev) => now.max(prev.saturating_add(self.gaps.min_gap_ms)),
                None => now,
            }
        };

        self.events.push(TimelineEvent::new(on_at, id, SwitchState::On));
        let slot = &mut self.actuators[id as usize];
        slot.active = true;
        slot.last_on_ms = on_at;
    }

    fn note_off(&mut self, id: u8) {
        if self.actuators[id as usize].active {
            self.emit_off(id, self.now_ms);
            self.actuators[id as usize].active = false;
        } else {
            self.stats.unmatched_note_offs += 1;
        }
    }

    /// Close `id` at `at`, or just after its last On if that is later.
    fn emit_off(&mut self, id: u8, at: u64) -> u64 {
        let slot = &mut self.actuators[id as usize];
        let off_at = at.max(slot.last_on_ms.saturating_add(1));
        slot.last_off_ms = Some(off_at);
        self.events.push(TimelineEvent::new(off_at, id, SwitchState::Off));
        off_at
    }

    /// Close dangling actuators and return the sorted timeline.
    pub fn finish(mut self) -> BuiltTimeline {
        let close_at = self.now_ms.saturating_add(self.gaps.retrigger_gap_ms);
        for id in 0..self.actuators.len() {
            if self.actuators[id].active {
                self.emit_off(id as u8, close_at);
                self.actuators[id].active = false;
            }
        }

        sort_timeline(&mut self.events);
        debug!(
            "built {} transitions over {} ms ({} retriggers, {} skipped, {} unmatched)",
            self.events.len(),
            self.now_ms,
            self.stats.forced_retriggers,
            self.stats.skipped_note_ons,
            self.stats.unmatched_note_offs
        );

        BuiltTimeline {
            events: self.events,
            stats: self.stats,
            end_ms: self.now_ms,
        }
    }
}

/// Walk `events` in order and build the absolute-time timeline.
pub fn build_timeline(
    events: &[RawEvent],
    map: &ActuatorMap,
    ticks_per_beat: u16,
    gaps: GapRules,
) -> BuiltTimeline {
    let mut builder = TimelineBuilder::new(map, ticks_per_beat, gaps);
    for event in events {
        builder.push(event);
    }
    builder.finish()
}

/// Stable sort by time, Off before On at equal time.
pub fn sort_timeline(events: &mut [TimelineEvent]) {
    events.sort_by_key(TimelineEvent::order_key);
}
