//! # Compile Options
//!
//! Everything the compiler needs besides the note stream: the physical
//! outputs, the gap rules and an optional tempo override.
//!
//! Options can be written as a small YAML file:
//!
//! ```yaml
//! actuators:
//!   - label: RED(D2)
//!     pin: 2
//!   - label: GREEN(D3)
//!     pin: 3
//! min-gap-ms: 35
//! retrigger-gap-ms: 35
//! bpm: 90
//! ```
//!
//! Every key is optional. `actuator-count: N` may replace the `actuators`
//! list to get N default outputs on consecutive pins starting at D2. At most
//! one of `bpm` and `multiplier` may be set.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::LedsongError;
use crate::timeline::GapRules;

/// Actuator ids are stored in a byte.
pub const MAX_ACTUATORS: usize = 256;

/// Largest accepted gap, the range of one encoded delta.
pub const MAX_GAP_MS: u64 = u32::MAX as u64;

const DEFAULT_COLORS: [&str; 4] = ["RED", "GREEN", "BLUE", "WHITE"];
const FIRST_DEFAULT_PIN: usize = 2;

/// One physical output. Its position in [`CompileOptions::outputs`] is its
/// actuator id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Output {
    pub label: String,
    pub pin: u8,
}

impl Output {
    fn default_for(index: usize) -> Self {
        let pin = (FIRST_DEFAULT_PIN + index).min(u8::MAX as usize) as u8;
        let name = DEFAULT_COLORS
            .get(index)
            .map(|c| c.to_string())
            .unwrap_or_else(|| format!("OUT{}", index));
        Self {
            label: format!("{}(D{})", name, pin),
            pin,
        }
    }
}

/// How playback speed relates to the source file's own tempo.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TempoOverride {
    #[default]
    Original,
    /// Play at this many beats per minute.
    Bpm(f64),
    /// Play this many times faster than the source.
    Multiplier(f64),
}

impl TempoOverride {
    /// Scale factor for timestamps and the resulting output tempo, given the
    /// source's base tempo.
    pub fn resolve(self, base_bpm: f64) -> Result<(f64, f64), LedsongError> {
        match self {
            TempoOverride::Original => Ok((1.0, base_bpm)),
            TempoOverride::Bpm(target) => {
                let factor = crate::timeline::scale_factor(base_bpm, target)?;
                Ok((factor, target))
            }
            TempoOverride::Multiplier(m) => {
                check_positive("tempo multiplier", m)?;
                Ok((1.0 / m, base_bpm * m))
            }
        }
    }

    /// Human-readable summary used in generated headers.
    pub fn describe(self) -> String {
        match self {
            TempoOverride::Original => "original timing".to_string(),
            TempoOverride::Bpm(bpm) => format!("target {:.2} BPM", bpm),
            TempoOverride::Multiplier(m) => format!("multiplier x{:.3}", m),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompileOptions {
    pub outputs: Vec<Output>,
    pub gaps: GapRules,
    pub tempo: TempoOverride,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            outputs: default_outputs(DEFAULT_COLORS.len()),
            gaps: GapRules::default(),
            tempo: TempoOverride::Original,
        }
    }
}

/// Raw options for YAML deserialization
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct RawOptions {
    actuators: Option<Vec<Output>>,
    actuator_count: Option<usize>,
    min_gap_ms: Option<u64>,
    retrigger_gap_ms: Option<u64>,
    bpm: Option<f64>,
    multiplier: Option<f64>,
}

impl CompileOptions {
    /// `count` default outputs: RED, GREEN, BLUE, WHITE on D2..D5, then
    /// `OUTn` on the following pins.
    ///
    /// The count is checked before any output is built.
    pub fn with_actuator_count(count: usize) -> Result<Self, LedsongError> {
        check_actuator_count(count)?;
        Ok(Self {
            outputs: default_outputs(count),
            ..Self::default()
        })
    }

    pub fn actuator_count(&self) -> usize {
        self.outputs.len()
    }

    /// Parse options from YAML. Missing keys take their defaults.
    pub fn from_yaml(content: &str) -> Result<Self, LedsongError> {
        let raw: RawOptions = if content.trim().is_empty() {
            RawOptions::default()
        } else {
            serde_yaml::from_str(content).map_err(|e| LedsongError::ConfigError(e.to_string()))?
        };

        let mut options = match (raw.actuators, raw.actuator_count) {
            (Some(_), Some(_)) => {
                return Err(LedsongError::ConfigError(
                    "set either actuators or actuator-count, not both".to_string(),
                ))
            }
            (Some(outputs), None) => Self {
                outputs,
                ..Self::default()
            },
            (None, Some(count)) => Self::with_actuator_count(count)?,
            (None, None) => Self::default(),
        };

        if let Some(ms) = raw.min_gap_ms {
            options.gaps.min_gap_ms = ms;
        }
        if let Some(ms) = raw.retrigger_gap_ms {
            options.gaps.retrigger_gap_ms = ms;
        }
        options.tempo = match (raw.bpm, raw.multiplier) {
            (Some(_), Some(_)) => {
                return Err(LedsongError::ConfigError(
                    "set either bpm or multiplier, not both".to_string(),
                ))
            }
            (Some(bpm), None) => TempoOverride::Bpm(bpm),
            (None, Some(m)) => TempoOverride::Multiplier(m),
            (None, None) => TempoOverride::Original,
        };

        Ok(options)
    }

    pub fn load(path: &Path) -> Result<Self, LedsongError> {
        let content = fs::read_to_string(path).map_err(|source| LedsongError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&content)
    }

    /// Reject configurations the compiler cannot honour.
    pub fn validate(&self) -> Result<(), LedsongError> {
        check_actuator_count(self.outputs.len())?;
        check_gap("min-gap-ms", self.gaps.min_gap_ms)?;
        check_gap("retrigger-gap-ms", self.gaps.retrigger_gap_ms)?;
        match self.tempo {
            TempoOverride::Original => Ok(()),
            TempoOverride::Bpm(bpm) => check_positive("target tempo", bpm),
            TempoOverride::Multiplier(m) => check_positive("tempo multiplier", m),
        }
    }
}

fn default_outputs(count: usize) -> Vec<Output> {
    (0..count).map(Output::default_for).collect()
}

fn check_actuator_count(count: usize) -> Result<(), LedsongError> {
    if count == 0 {
        return Err(LedsongError::InvalidConfig(
            "actuator count must be at least 1".to_string(),
        ));
    }
    if count > MAX_ACTUATORS {
        return Err(LedsongError::InvalidConfig(format!(
            "at most {} actuators are supported, got {}",
            MAX_ACTUATORS, count
        )));
    }
    Ok(())
}

/// Gaps must fit the 32-bit delta field of the output.
fn check_gap(what: &str, ms: u64) -> Result<(), LedsongError> {
    if ms > MAX_GAP_MS {
        return Err(LedsongError::InvalidConfig(format!(
            "{} must be at most {} ms, got {}",
            what, MAX_GAP_MS, ms
        )));
    }
    Ok(())
}

fn check_positive(what: &str, value: f64) -> Result<(), LedsongError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(LedsongError::InvalidConfig(format!(
            "{} must be positive, got {}",
            what, value
        )))
    }
}
