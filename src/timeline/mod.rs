//! # Timeline Module
//!
//! The core of the compiler: turns a merged MIDI-style note stream into a
//! delta-encoded on/off schedule for a handful of physical outputs.
//!
//! Nothing in this module touches files or the console.
//!
//! ## Pipeline
//! 1. `clock` - tempo-aware tick to millisecond conversion
//! 2. `selector` - picks the most played pitches, one per actuator
//! 3. `builder` - per-actuator state machines over one shared running clock
//! 4. `scaler` - optional rescaling for a tempo override
//! 5. `delta` - absolute times to consecutive delays
//!
//! `check` holds the structural checks a finished timeline must pass.
//!
//! ## Ordering
//! A timeline is always sorted by time, with Off before On at the same
//! millisecond, so an output is released before it is re-activated. Every
//! actuator strictly alternates On, Off, On, Off and ends Off.
//!
//! ## Example
//! ```rust
//! use ledsong::timeline::{
//!     build_timeline, count_note_ons, select_notes, GapRules, RawEvent, SwitchState,
//! };
//!
//! let events = [
//!     RawEvent::NoteOn { tick_delta: 0, pitch: 60, velocity: 100 },
//!     RawEvent::NoteOff { tick_delta: 480, pitch: 60 },
//! ];
//!
//! let selection = select_notes(&count_note_ons(&events), 4).unwrap();
//! let built = build_timeline(&events, &selection.map, 480, GapRules::default());
//!
//! assert_eq!(built.events.len(), 2);
//! assert_eq!(built.events[1].time_ms, 500);
//! assert_eq!(built.events[1].state, SwitchState::Off);
//! ```

mod builder;
mod check;
mod clock;
mod delta;
mod scaler;
mod selector;
mod types;


pub use builder::{build_timeline, sort_timeline, BuiltTimeline, GapRules, TimelineBuilder};
pub use check::{check_alternation, is_ordered};
pub use clock::{initial_tempo, ticks_to_ms, TempoClock};
pub use delta::{decode_deltas, encode_deltas};
pub use scaler::{scale_factor, scale_timeline};
pub use selector::{count_note_ons, select_notes, Selection};
pub use types::{
    ActuatorMap, CompilationStats, DeltaEvent, RawEvent, SwitchState, TimelineEvent,
    DEFAULT_TEMPO_US_PER_BEAT,
};
