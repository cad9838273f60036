use crate::error::ReportError::InvalidTimestamp;
use crate::error::ReportResult;
use chrono::{Duration, NaiveDateTime, Timelike};

const DATE_TIME_LEN: usize = 19;
const MICROS_DIGITS: usize = 6;

/// Normalize a k6 timestamp into a whole-second bucket key.
///
/// Accepted forms:
/// - `YYYY-MM-DD HH:MM:SS`
/// - `YYYY-MM-DDTHH:MM:SS[.fraction]Z`
///
/// The zone marker (a trailing `Z`, or a numeric offset) is dropped without
/// conversion, the value is treated as naive wall-clock time.
/// The sub-second part is truncated, never rounded.
pub fn normalize(raw: &str) -> ReportResult<NaiveDateTime> {
    let instant = parse_instant(raw)?;
    instant
        .with_nanosecond(0)
        .ok_or_else(|| InvalidTimestamp(raw.to_string()))
}

/// Parse a k6 timestamp keeping microsecond precision.
pub fn parse_instant(raw: &str) -> ReportResult<NaiveDateTime> {
    let trimmed = raw.trim();
    let trimmed = trimmed
        .strip_suffix(['Z', 'z'])
        .unwrap_or(trimmed);

    if trimmed.len() < DATE_TIME_LEN || !trimmed.is_char_boundary(DATE_TIME_LEN) {
        return Err(InvalidTimestamp(raw.to_string()));
    }
    let (head, tail) = trimmed.split_at(DATE_TIME_LEN);

    let base = NaiveDateTime::parse_from_str(head, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(head, "%Y-%m-%d %H:%M:%S"))
        .map_err(|e| InvalidTimestamp(format!("{}: {}", raw, e)))?;

    let micros = fraction_micros(tail).ok_or_else(|| InvalidTimestamp(raw.to_string()))?;
    Ok(base + Duration::microseconds(micros))
}

/// Microseconds encoded by whatever follows `HH:MM:SS`.
///
/// `None` when the tail is neither empty, a `.fraction`, nor a zone offset.
fn fraction_micros(tail: &str) -> Option<i64> {
    let fraction = match tail.chars().next() {
        None => return Some(0),
        Some('+') | Some('-') => return valid_offset(tail).then_some(0),
        Some('.') => &tail[1..],
        Some(_) => return None,
    };

    let (fraction, offset) = match fraction.find(['+', '-']) {
        Some(idx) => fraction.split_at(idx),
        None => (fraction, ""),
    };
    if !offset.is_empty() && !valid_offset(offset) {
        return None;
    }

    let mut digits: String = fraction
        .chars()
        .filter(|c| c.is_ascii_digit())
        .take(MICROS_DIGITS)
        .collect();
    while digits.len() < MICROS_DIGITS {
        digits.push('0');
    }
    digits.parse::<i64>().ok()
}

fn valid_offset(offset: &str) -> bool {
    let body = &offset[1..];
    !body.is_empty() && body.chars().all(|c| c.is_ascii_digit() || c == ':')
}
