//! # Error Types
//!
//! This module defines all error types for the ledsong compiler.
//!
//! Fatal conditions are errors; recoverable oddities in the note stream
//! (unmapped note-ons, unmatched note-offs, retriggers, pitch truncation) are
//! counted in [`CompilationStats`](crate::CompilationStats) instead and never
//! abort a run.
//!
//! ## Error Types
//! - `EmptyInput` - The stream has no note-on events at all
//! - `InvalidConfig` - Actuator count or tempo override rejected before compiling
//! - `ParseError` - The Standard MIDI File could not be decoded
//! - `ConfigError` - The YAML options file is malformed
//! - `Serialize` - A compilation could not be rendered as JSON
//! - `Io` - Reading or writing a file failed
//! - `InvariantViolation` - A timeline broke strict On/Off alternation
//!
//! ## Usage
//! ```rust
//! use ledsong::{compile_events, CompileOptions, LedsongError};
//!
//! match compile_events(&[], 480, &CompileOptions::default()) {
//!     Ok(compilation) => println!("{} events", compilation.events.len()),
//!     Err(LedsongError::EmptyInput) => eprintln!("nothing to play"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedsongError {
    /// No note-on events anywhere in the stream.
    ///
    /// # Example
    /// ```
    /// # use ledsong::LedsongError;
    /// let err = LedsongError::EmptyInput;
    /// assert_eq!(err.to_string(), "No note_on events found; the stream has no notes to map");
    /// ```
    #[error("No note_on events found; the stream has no notes to map")]
    EmptyInput,

    /// Configuration rejected before compilation starts.
    ///
    /// # Example
    /// ```
    /// # use ledsong::LedsongError;
    /// let err = LedsongError::InvalidConfig("actuator count must be at least 1".to_string());
    /// assert_eq!(err.to_string(), "Invalid configuration: actuator count must be at least 1");
    /// ```
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The MIDI source could not be decoded.
    ///
    /// `track` is set when the failure can be pinned to one track chunk.
    #[error(
        "Parse error{}: {message}",
        .track.map(|t| format!(" in track {}", t)).unwrap_or_default()
    )]
    ParseError {
        track: Option<usize>,
        message: String,
    },

    /// The YAML options file is malformed.
    #[error("Invalid options file: {0}")]
    ConfigError(String),

    /// Rendering a compilation as JSON failed.
    #[error("Serialization failed: {0}")]
    Serialize(String),

    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Two consecutive entries for one actuator have the same state.
    ///
    /// # Example
    /// ```
    /// # use ledsong::LedsongError;
    /// let err = LedsongError::InvariantViolation {
    ///     actuator: 2,
    ///     index: 7,
    ///     message: "two On entries in a row".to_string(),
    /// };
    /// assert_eq!(
    ///     err.to_string(),
    ///     "Timeline invariant violated for actuator 2 at event 7: two On entries in a row"
    /// );
    /// ```
    #[error("Timeline invariant violated for actuator {actuator} at event {index}: {message}")]
    InvariantViolation {
        actuator: u8,
        index: usize,
        message: String,
    },
}
