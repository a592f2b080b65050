pub mod api;
pub mod config;
pub mod error;
pub mod header;
pub mod midi;
pub mod timeline;

pub use api::{compile_events, compile_midi, Compilation};
pub use config::{CompileOptions, Output, TempoOverride};
pub use error::*;
pub use header::{next_version_path, to_arduino_header, write_versioned};
pub use midi::{read_smf, MidiSong};
pub use timeline::{
    ActuatorMap, CompilationStats, DeltaEvent, GapRules, RawEvent, SwitchState, TimelineEvent,
};
