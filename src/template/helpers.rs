// ABOUTME: Value transformations backing the template helpers
// ABOUTME: Casing, quoting, truncation, URL escaping and duration/date formatting

use chrono::{DateTime, Local, Utc};
use chrono_tz::Tz;
use thiserror::Error;

use super::layout;

/// Failure raised by a helper body. Surfaced to the caller as a render error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HelperError {
    #[error("{helper} requires a non-empty string")]
    EmptyInput { helper: &'static str },

    #[error("{helper} length must not be negative, got {length}")]
    NegativeLength { helper: &'static str, length: i64 },

    #[error("{helper} timestamp {timestamp} is out of range")]
    TimestampOutOfRange { helper: &'static str, timestamp: i64 },
}

pub fn uppercase(s: &str) -> String {
    s.to_uppercase()
}

pub fn lowercase(s: &str) -> String {
    s.to_lowercase()
}

pub fn trim_prefix<'a>(s: &'a str, prefix: &str) -> &'a str {
    s.strip_prefix(prefix).unwrap_or(s)
}

pub fn trim_suffix<'a>(s: &'a str, suffix: &str) -> &'a str {
    s.strip_suffix(suffix).unwrap_or(s)
}

pub fn join(items: &[String], separator: &str) -> String {
    items.join(separator)
}

/// Upper-cases the first code point and leaves the rest untouched.
pub fn uppercase_first(s: &str) -> Result<String, HelperError> {
    let mut chars = s.chars();
    let first = chars.next().ok_or(HelperError::EmptyInput {
        helper: "uppercasefirst",
    })?;

    let mut out = String::with_capacity(s.len());
    out.extend(first.to_uppercase());
    out.push_str(chars.as_str());
    Ok(out)
}

/// Keeps at most `length` code points.
pub fn truncate(s: &str, length: i64) -> Result<String, HelperError> {
    if length < 0 {
        return Err(HelperError::NegativeLength {
            helper: "truncate",
            length,
        });
    }

    let length = length as usize;
    match s.char_indices().nth(length) {
        Some((byte_idx, _)) => Ok(s[..byte_idx].to_string()),
        None => Ok(s.to_string()),
    }
}

/// Double-quoted literal with Go-style escapes.
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\u{07}' => out.push_str("\\a"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0c}' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{0b}' => out.push_str("\\v"),
            c if is_printable(c) => out.push(c),
            c if (c as u32) < 0x80 => out.push_str(&format!("\\x{:02x}", c as u32)),
            c if (c as u32) < 0x10000 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push_str(&format!("\\U{:08x}", c as u32)),
        }
    }
    out.push('"');
    out
}

fn is_printable(c: char) -> bool {
    if c == ' ' {
        return true;
    }
    !(c.is_control() || c.is_whitespace() || is_format(c) || is_unprintable_range(c))
}

/// Format characters (Unicode category Cf).
fn is_format(c: char) -> bool {
    matches!(
        c as u32,
        0x00AD
            | 0x0600..=0x0605
            | 0x061C
            | 0x06DD
            | 0x070F
            | 0x0890..=0x0891
            | 0x08E2
            | 0x180E
            | 0x200B..=0x200F
            | 0x202A..=0x202E
            | 0x2060..=0x2064
            | 0x2066..=0x206F
            | 0xFEFF
            | 0xFFF9..=0xFFFB
            | 0x110BD
            | 0x110CD
            | 0x13430..=0x1343F
            | 0x1BCA0..=0x1BCA3
            | 0x1D173..=0x1D17A
            | 0xE0001
            | 0xE0020..=0xE007F
    )
}

/// Private use areas and noncharacters, which have no printable glyph.
fn is_unprintable_range(c: char) -> bool {
    let cp = c as u32;
    matches!(cp, 0xE000..=0xF8FF | 0xF0000..=0x10FFFF | 0xFDD0..=0xFDEF)
        || cp & 0xFFFE == 0xFFFE
}

/// Query-string escaping: space becomes `+`, everything outside
/// `[A-Za-z0-9-._~]` is percent-encoded.
pub fn urlencode(s: &str) -> String {
    s.split(' ')
        .map(|part| urlencoding::encode(part).into_owned())
        .collect::<Vec<_>>()
        .join("+")
}

/// Elapsed time between two Unix timestamps. The difference is truncated
/// toward zero before formatting.
pub fn duration(started: f64, finished: f64) -> String {
    let secs = (finished - started).trunc() as i64;
    format!("{}\n", format_duration(secs))
}

/// Elapsed time from `start` until now, both in whole seconds.
pub fn since(start: i64) -> String {
    since_at(start, Utc::now().timestamp())
}

pub(crate) fn since_at(start: i64, now: i64) -> String {
    format!("{}\n", format_duration(now.saturating_sub(start)))
}

/// Formats whole seconds the way Go prints a `time.Duration`:
/// `0s`, `45s`, `2m5s`, `26h0m1s`, `-3s`.
pub fn format_duration(secs: i64) -> String {
    if secs == 0 {
        return "0s".to_string();
    }

    let sign = if secs < 0 { "-" } else { "" };
    let total = secs.unsigned_abs();
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;

    if hours > 0 {
        format!("{}{}h{}m{}s", sign, hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}{}m{}s", sign, minutes, seconds)
    } else {
        format!("{}{}s", sign, seconds)
    }
}

/// Formats a Unix timestamp with a Go reference layout.
///
/// An empty zone, `Local`, or a name that does not resolve to an IANA zone
/// all format in the process's local timezone.
pub fn datetime(timestamp: f64, pattern: &str, zone: &str) -> Result<String, HelperError> {
    let secs = timestamp.trunc() as i64;
    let utc = DateTime::<Utc>::from_timestamp(secs, 0).ok_or(HelperError::TimestampOutOfRange {
        helper: "datetime",
        timestamp: secs,
    })?;

    let formatted = match resolve_zone(zone) {
        Some(tz) => layout::format(&utc.with_timezone(&tz), pattern),
        None => layout::format(&utc.with_timezone(&Local), pattern),
    };
    Ok(formatted)
}

fn resolve_zone(zone: &str) -> Option<Tz> {
    if zone.is_empty() || zone == "Local" {
        return None;
    }
    zone.parse::<Tz>().ok()
}
