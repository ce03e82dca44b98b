//! Permission-mode string resolution.
//!
//! Descriptor mode fields are octal strings (`"755"`). This module turns
//! them into numeric permission bits, with a sentinel for "unset" so the
//! caller's default applies instead.

use log::warn;

/// Sentinel meaning "no mode configured; inherit the caller's default".
pub const UNSET_MODE: i32 = -1;

/// Parse an octal permission string into numeric permission bits.
///
/// Returns [`UNSET_MODE`] for `None` or blank input. Malformed strings are
/// logged and degrade to [`UNSET_MODE`] rather than failing the run.
#[must_use]
pub fn parse_mode(value: Option<&str>) -> i32 {
    let Some(raw) = value else {
        return UNSET_MODE;
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return UNSET_MODE;
    }

    match i32::from_str_radix(trimmed, 8) {
        Ok(mode) if mode >= 0 => mode,
        _ => {
            warn!("ignoring malformed mode string {trimmed:?}; using default mode instead");
            UNSET_MODE
        }
    }
}
