//! Specialized editors - per-type input interpretation for boolean,
//! enumerated, numeric and date/date-time fields
//!
//! All functions operate on the single raw string held for a field plus
//! its constraint metadata. The only state that outlives a keystroke is
//! the session's segment cursor and typed-digit buffer for date input.

use chrono::{Datelike, Local, NaiveDate, Timelike};

use crate::constants::{YEAR_MAX, YEAR_MIN};

// ========================
// Boolean / Enum cycles
// ========================

/// Cyclic toggle over `[true, false]`, or `[true, false, null]` when
/// nullable. An unset field steps to the first state.
pub fn toggle_bool(current: &str, nullable: bool, dir: i32) -> String {
    let states: &[&str] = if nullable {
        &["true", "false", "null"]
    } else {
        &["true", "false"]
    };
    cycle(states, current, dir)
}

/// Cyclic toggle over `["", ...variants]` (plus `"null"` when nullable);
/// the empty string displays as unset.
pub fn cycle_enum(current: &str, variants: &[String], nullable: bool, dir: i32) -> String {
    let mut states: Vec<&str> = Vec::with_capacity(variants.len() + 2);
    states.push("");
    states.extend(variants.iter().map(String::as_str));
    if nullable {
        states.push("null");
    }
    cycle(&states, current, dir)
}

fn cycle(states: &[&str], current: &str, dir: i32) -> String {
    let len = states.len() as i32;
    let next = match states.iter().position(|s| *s == current) {
        Some(pos) => (pos as i32 + dir).rem_euclid(len),
        // Unknown/unset value: forward lands on the first state
        None => {
            if dir >= 0 {
                0
            } else {
                len - 1
            }
        }
    };
    states[next as usize].to_string()
}

// ========================
// Numeric keystroke filters
// ========================

/// Would appending `c` keep `current` a prefix of `-?\d+`?
pub fn accepts_integer(current: &str, c: char) -> bool {
    match c {
        '-' => current.is_empty(),
        _ => c.is_ascii_digit(),
    }
}

/// Would appending `c` keep `current` a prefix of `-?\d*\.?\d*`?
pub fn accepts_number(current: &str, c: char) -> bool {
    match c {
        '-' => current.is_empty(),
        '.' => !current.contains('.'),
        _ => c.is_ascii_digit(),
    }
}

// ========================
// Date / date-time segments
// ========================

/// Segment order: year, month, day, hour, minute, second
pub fn segment_count(has_time: bool) -> usize {
    if has_time {
        6
    } else {
        3
    }
}

/// Natural digit width of a segment (4 for year, 2 otherwise)
pub fn segment_width(segment: usize) -> usize {
    if segment == 0 {
        4
    } else {
        2
    }
}

#[derive(Clone, Copy, Debug)]
struct DateParts {
    y: i32,
    mo: u32,
    d: u32,
    h: u32,
    mi: u32,
    s: u32,
}

impl DateParts {
    fn now() -> Self {
        let now = Local::now().naive_local();
        DateParts {
            y: now.year(),
            mo: now.month(),
            d: now.day(),
            h: now.hour(),
            mi: now.minute(),
            s: now.second(),
        }
    }

    fn parse(value: &str, has_time: bool) -> Option<Self> {
        if has_time {
            let dt = chrono::NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S").ok()?;
            Some(DateParts {
                y: dt.year(),
                mo: dt.month(),
                d: dt.day(),
                h: dt.hour(),
                mi: dt.minute(),
                s: dt.second(),
            })
        } else {
            let d = NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()?;
            Some(DateParts {
                y: d.year(),
                mo: d.month(),
                d: d.day(),
                h: 0,
                mi: 0,
                s: 0,
            })
        }
    }

    fn format(&self, has_time: bool) -> String {
        if has_time {
            format!(
                "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}",
                self.y, self.mo, self.d, self.h, self.mi, self.s
            )
        } else {
            format!("{:04}-{:02}-{:02}", self.y, self.mo, self.d)
        }
    }

    fn get(&self, segment: usize) -> i64 {
        match segment {
            0 => self.y as i64,
            1 => self.mo as i64,
            2 => self.d as i64,
            3 => self.h as i64,
            4 => self.mi as i64,
            _ => self.s as i64,
        }
    }

    fn set(&mut self, segment: usize, raw: i64) {
        // Year clamps at the calendar bounds, cyclic segments wrap
        match segment {
            0 => self.y = raw.clamp(YEAR_MIN as i64, YEAR_MAX as i64) as i32,
            1 => self.mo = wrap(raw, 1, 12),
            2 => self.d = wrap(raw, 1, days_in_month(self.y, self.mo) as i64),
            3 => self.h = wrap(raw, 0, 23),
            4 => self.mi = wrap(raw, 0, 59),
            _ => self.s = wrap(raw, 0, 59),
        }
        // Changing year or month can invalidate the day (Feb 30 et al.)
        let max_day = days_in_month(self.y, self.mo);
        if self.d > max_day {
            self.d = max_day;
        }
    }
}

fn wrap(raw: i64, min: i64, max: i64) -> u32 {
    let span = max - min + 1;
    (min + (raw - min).rem_euclid(span)) as u32
}

/// Day count of a calendar month, leap years included
pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (ny, nm) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(ny, nm, 1)
        .and_then(|d| d.pred_opt())
        .map(|d| d.day())
        .unwrap_or(31)
}

/// Step the selected segment by `delta`, re-clamped against calendar
/// bounds. An unparsable or empty value starts from the current clock.
pub fn bump(value: &str, segment: usize, delta: i64, has_time: bool) -> String {
    let mut parts = DateParts::parse(value, has_time).unwrap_or_else(DateParts::now);
    parts.set(segment, parts.get(segment) + delta);
    parts.format(has_time)
}

/// Accumulate a typed digit into the segment's buffer, overwriting the
/// segment. Returns the new value and whether the buffer filled the
/// segment's natural width (caller advances the cursor and clears the
/// buffer).
pub fn type_digit(
    value: &str,
    segment: usize,
    buffer: &mut String,
    c: char,
    has_time: bool,
) -> (String, bool) {
    if !c.is_ascii_digit() {
        return (value.to_string(), false);
    }
    let width = segment_width(segment);
    if buffer.len() >= width {
        buffer.clear();
    }
    buffer.push(c);

    let mut parts = DateParts::parse(value, has_time).unwrap_or_else(DateParts::now);
    let typed: i64 = buffer.parse().unwrap_or(0);
    // Partial input clamps instead of wrapping so "0" for month reads as 1
    match segment {
        0 => parts.y = typed.clamp(YEAR_MIN as i64, YEAR_MAX as i64) as i32,
        1 => parts.mo = typed.clamp(1, 12) as u32,
        2 => parts.d = typed.clamp(1, days_in_month(parts.y, parts.mo) as i64) as u32,
        3 => parts.h = typed.clamp(0, 23) as u32,
        4 => parts.mi = typed.clamp(0, 59) as u32,
        _ => parts.s = typed.clamp(0, 59) as u32,
    }

    let full = buffer.len() >= width;
    if full {
        buffer.clear();
    }
    (parts.format(has_time), full)
}

/// Whole value from the local clock
pub fn now_string(has_time: bool) -> String {
    DateParts::now().format(has_time)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bool_toggle_from_unset() {
        // unset -> true -> false -> true (2-state cycle)
        let v1 = toggle_bool("", false, 1);
        assert_eq!(v1, "true");
        let v2 = toggle_bool(&v1, false, 1);
        assert_eq!(v2, "false");
        let v3 = toggle_bool(&v2, false, 1);
        assert_eq!(v3, "true");
    }

    #[test]
    fn test_bool_toggle_nullable_three_states() {
        let v = toggle_bool("false", true, 1);
        assert_eq!(v, "null");
        let v = toggle_bool(&v, true, 1);
        assert_eq!(v, "true");
        assert_eq!(toggle_bool("true", true, -1), "null");
    }

    #[test]
    fn test_enum_cycle_includes_unset() {
        let variants = vec!["red".to_string(), "green".to_string()];
        let v = cycle_enum("", &variants, false, 1);
        assert_eq!(v, "red");
        let v = cycle_enum(&v, &variants, false, 1);
        assert_eq!(v, "green");
        let v = cycle_enum(&v, &variants, false, 1);
        assert_eq!(v, "");
        assert_eq!(cycle_enum("", &variants, true, -1), "null");
    }

    #[test]
    fn test_integer_filter() {
        assert!(accepts_integer("", '-'));
        assert!(!accepts_integer("1", '-'));
        assert!(accepts_integer("-", '4'));
        assert!(!accepts_integer("12", '.'));
        assert!(!accepts_integer("12", 'a'));
    }

    #[test]
    fn test_number_filter() {
        assert!(accepts_number("", '-'));
        assert!(accepts_number("3", '.'));
        assert!(!accepts_number("3.1", '.'));
        assert!(!accepts_number("3", 'e'));
    }

    #[test]
    fn test_bump_day_wraps_at_february_end() {
        // Non-leap year: no Feb 29, and never Feb 30
        assert_eq!(bump("2023-02-28", 2, 1, false), "2023-02-01");
        // Leap year has a 29th
        assert_eq!(bump("2024-02-28", 2, 1, false), "2024-02-29");
    }

    #[test]
    fn test_bump_month_reclamps_day() {
        assert_eq!(bump("2023-01-31", 1, 1, false), "2023-02-28");
    }

    #[test]
    fn test_bump_month_wraps() {
        assert_eq!(bump("2023-12-15", 1, 1, false), "2023-01-15");
        assert_eq!(bump("2023-01-15", 1, -1, false), "2023-12-15");
    }

    #[test]
    fn test_year_clamps_at_bounds() {
        assert_eq!(bump("2100-06-01", 0, 1, false), "2100-06-01");
        assert_eq!(bump("1900-06-01", 0, -1, false), "1900-06-01");
    }

    #[test]
    fn test_bump_datetime_segments() {
        assert_eq!(bump("2023-05-01T23:59:59", 3, 1, true), "2023-05-01T00:59:59");
        assert_eq!(bump("2023-05-01T10:59:00", 4, 1, true), "2023-05-01T10:00:00");
    }

    #[test]
    fn test_type_digits_overwrite_and_advance() {
        let mut buffer = String::new();
        let (v, done) = type_digit("2023-05-10", 1, &mut buffer, '0', false);
        assert_eq!(v, "2023-01-10");
        assert!(!done);
        let (v, done) = type_digit(&v, 1, &mut buffer, '7', false);
        assert_eq!(v, "2023-07-10");
        assert!(done);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_type_year_needs_four_digits() {
        let mut buffer = String::new();
        let mut value = "2023-05-10".to_string();
        for (i, c) in ['1', '9', '9', '9'].iter().enumerate() {
            let (v, done) = type_digit(&value, 0, &mut buffer, *c, false);
            value = v;
            assert_eq!(done, i == 3);
        }
        assert_eq!(value, "1999-05-10");
    }

    #[test]
    fn test_days_in_month() {
        assert_eq!(days_in_month(2023, 2), 28);
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(2023, 12), 31);
        assert_eq!(days_in_month(2023, 4), 30);
    }
}
