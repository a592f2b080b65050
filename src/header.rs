//! Arduino header output
//!
//! Renders a [`Compilation`] as a C header holding a `PROGMEM` table of
//! `{ delay, pin, on }` records, and picks a fresh `_vN` file name so earlier
//! outputs are never overwritten.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use crate::api::Compilation;
use crate::config::Output;
use crate::error::LedsongError;

/// Render a compilation as an Arduino header with a `PROGMEM` event table.
///
/// `outputs` supplies the label and pin of each actuator id; `source_name`
/// only appears in the leading comment.
pub fn to_arduino_header(
    compilation: &Compilation,
    outputs: &[Output],
    source_name: &str,
) -> String {
    let mut h = String::new();

    h.push_str("#pragma once\n");
    h.push_str("#include <Arduino.h>\n");
    h.push_str("#include <avr/pgmspace.h>\n\n");

    // Summary comment
    let stats = &compilation.stats;
    let _ = writeln!(h, "// Auto-generated from: {}", comment_safe(source_name));
    let _ = writeln!(h, "// Base tempo: {:.2} BPM", compilation.base_bpm);
    let _ = writeln!(h, "// Tempo override: {}", compilation.tempo.describe());
    let _ = writeln!(h, "// Effective output tempo: {:.2} BPM", compilation.effective_bpm);
    let _ = writeln!(h, "// Forced retriggers: {}", stats.forced_retriggers);
    let _ = writeln!(
        h,
        "// Minimum OFF gap between repeated notes: {} ms",
        compilation.gaps.min_gap_ms
    );
    let _ = writeln!(h, "// Unmapped note_on events skipped: {}", stats.skipped_note_ons);
    let _ = writeln!(h, "// Unmatched note_off events ignored: {}", stats.unmatched_note_offs);
    if stats.truncated {
        h.push_str("// WARNING: more distinct notes than outputs; extra notes were dropped\n");
    }
    h.push('\n');

    h.push_str("// Note -> pin mapping used for this file:\n");
    for (pitch, id) in compilation.actuator_map.iter() {
        let label = outputs
            .get(id as usize)
            .map(|o| comment_safe(&o.label))
            .unwrap_or_else(|| format!("OUT{}", id));
        let _ = writeln!(h, "//   {} <- MIDI note {}", label, pitch);
    }
    h.push('\n');

    h.push_str("typedef struct {\n");
    h.push_str("  uint32_t dt_ms;  // delay BEFORE this event\n");
    h.push_str("  uint8_t  pin;    // Arduino digital pin\n");
    h.push_str("  uint8_t  on;     // 1=ON, 0=OFF\n");
    h.push_str("} LedEvent;\n\n");

    h.push_str("const LedEvent SONG[] PROGMEM = {\n");
    for event in &compilation.events {
        let pin = outputs
            .get(event.actuator as usize)
            .map(|o| o.pin)
            .unwrap_or(event.actuator);
        let _ = writeln!(
            h,
            "  {{ {}u, {}u, {}u }},",
            event.delta_ms,
            pin,
            u8::from(event.state.is_on())
        );
    }
    h.push_str("};\n\n");

    let _ = writeln!(h, "const uint32_t SONG_LEN = {}u;", compilation.events.len());

    h
}

/// Keep user text from closing or splitting a `//` comment.
fn comment_safe(text: &str) -> String {
    text.replace(['\n', '\r'], " ")
}

/// First path that does not exist yet: `path` itself, then `stem_v1.ext`,
/// `stem_v2.ext` and so on.
pub fn next_version_path(path: &Path) -> PathBuf {
    if !path.exists() {
        return path.to_path_buf();
    }
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = path.extension().map(|e| e.to_string_lossy().into_owned());
    let parent = path.parent().unwrap_or_else(|| Path::new(""));

    let mut version = 1u32;
    loop {
        let name = match &ext {
            Some(ext) => format!("{}_v{}.{}", stem, version, ext),
            None => format!("{}_v{}", stem, version),
        };
        let candidate = parent.join(name);
        if !candidate.exists() {
            return candidate;
        }
        version += 1;
    }
}

/// Write `contents` to the next free versioned path derived from `path`.
pub fn write_versioned(path: &Path, contents: &str) -> Result<PathBuf, LedsongError> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(|source| LedsongError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }
    let target = next_version_path(path);
    fs::write(&target, contents).map_err(|source| LedsongError::Io {
        path: target.clone(),
        source,
    })?;
    Ok(target)
}
