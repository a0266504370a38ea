// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Natural-language date parsing and slot discovery for the appointment
//! booking sub-flow (§4.4).

use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Weekday};

/// Slot granularity; the business-hours window itself comes from each
/// business's own `CalendarConfig.hours_start`/`hours_end`.
const SLOT_MINUTES: i64 = 30;
/// How far forward the calendar availability walk looks before giving up.
pub const MAX_WALK_FORWARD_DAYS: u32 = 14;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DateParseError {
    #[error("could not understand '{0}' as a date")]
    Unrecognized(String),
}

/// Parse a handful of common spoken-date phrasings into a `NaiveDate`.
/// Accepts `"October 16, 2025"`, `"16 October 2025"`, and ISO `"2025-10-16"`.
/// Relative phrases ("tomorrow", "next Tuesday") are the realtime model's
/// job to resolve against its own notion of "now" before calling the tool;
/// this parser only handles absolute dates that reach us as text.
pub fn parse_date(text: &str) -> Result<NaiveDate, DateParseError> {
    let trimmed = text.trim();

    if let Ok(d) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(d);
    }
    if let Ok(d) = NaiveDate::parse_from_str(trimmed, "%B %d, %Y") {
        return Ok(d);
    }
    if let Ok(d) = NaiveDate::parse_from_str(trimmed, "%d %B %Y") {
        return Ok(d);
    }
    if let Ok(d) = NaiveDate::parse_from_str(trimmed, "%B %d %Y") {
        return Ok(d);
    }

    Err(DateParseError::Unrecognized(trimmed.to_string()))
}

fn is_business_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Generate the 30-minute slot start times for a single business day within
/// `[hours_start, hours_end)` (each `HH:MM`, e.g. a business's configured
/// `CalendarConfig.hours_start`/`hours_end`), in `HH:MM` 24-hour form.
/// Returns an empty vec for a weekend date or an unparseable window.
pub fn slots_for_day(date: NaiveDate, hours_start: &str, hours_end: &str) -> Vec<String> {
    if !is_business_day(date) {
        return Vec::new();
    }
    let (Ok(start), Ok(end)) = (
        NaiveTime::parse_from_str(hours_start, "%H:%M"),
        NaiveTime::parse_from_str(hours_end, "%H:%M"),
    ) else {
        return Vec::new();
    };

    let mut slots = Vec::new();
    let mut cur = start;
    while cur < end {
        slots.push(cur.format("%H:%M").to_string());
        cur += Duration::minutes(SLOT_MINUTES);
    }
    slots
}

/// Format a `HH:MM` slot for speech, e.g. `"14:00"` -> `"2:00 PM"`.
pub fn format_slot_for_speech(slot: &str) -> Option<String> {
    let time = NaiveTime::parse_from_str(slot, "%H:%M").ok()?;
    Some(time.format("%-I:%M %p").to_string())
}

/// Walk forward from `from` (exclusive) looking for the next business day
/// that has at least one slot remaining after removing `booked`, up to
/// [`MAX_WALK_FORWARD_DAYS`]. Returns `None` if the whole window is booked
/// solid or every day in it is a weekend.
pub fn next_available_day(
    from: NaiveDate,
    hours_start: &str,
    hours_end: &str,
    is_booked: impl Fn(NaiveDate, &str) -> bool,
) -> Option<(NaiveDate, Vec<String>)> {
    for offset in 1..=MAX_WALK_FORWARD_DAYS {
        let candidate = from + Duration::days(offset as i64);
        let open: Vec<String> = slots_for_day(candidate, hours_start, hours_end)
            .into_iter()
            .filter(|s| !is_booked(candidate, s))
            .collect();
        if !open.is_empty() {
            return Some((candidate, open));
        }
    }
    None
}
