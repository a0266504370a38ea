// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Regex-family fallback intent classifier (§4.4). Used only when the
//! realtime model's own function-calling doesn't surface an explicit tool
//! call, e.g. to detect an emergency-transfer phrase buried in a
//! transcript fragment before it reaches the model.

use regex::Regex;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    BookAppointment,
    CancelAppointment,
    EmergencyTransfer,
    Goodbye,
    None,
}

struct Patterns {
    book: Regex,
    cancel: Regex,
    emergency: Regex,
    goodbye: Regex,
}

static PATTERNS: OnceLock<Patterns> = OnceLock::new();

fn patterns() -> &'static Patterns {
    PATTERNS.get_or_init(|| Patterns {
        book: Regex::new(r"(?i)\b(book|schedule|set up|make)\b.{0,20}\b(appointment|meeting|call|demo)\b")
            .unwrap(),
        cancel: Regex::new(r"(?i)\b(cancel|reschedule|call off)\b.{0,20}\b(appointment|meeting|demo)\b")
            .unwrap(),
        emergency: Regex::new(r"(?i)\b(emergency|urgent|immediately|right now)\b.{0,20}\b(human|someone|person|agent|representative|transfer)\b")
            .unwrap(),
        goodbye: Regex::new(r"(?i)\b(bye|goodbye|that's all|nothing else|hang up)\b").unwrap(),
    })
}

/// Classify the loudest signal in `text`. Order matters: emergency beats
/// everything, and an explicit goodbye only fires when nothing else does.
pub fn classify(text: &str) -> Intent {
    let p = patterns();
    if p.emergency.is_match(text) {
        Intent::EmergencyTransfer
    } else if p.cancel.is_match(text) {
        Intent::CancelAppointment
    } else if p.book.is_match(text) {
        Intent::BookAppointment
    } else if p.goodbye.is_match(text) {
        Intent::Goodbye
    } else {
        Intent::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_booking_request() {
        assert_eq!(classify("I'd like to book an appointment"), Intent::BookAppointment);
        assert_eq!(classify("can we schedule a demo for next week"), Intent::BookAppointment);
    }

    #[test]
    fn detects_cancel_request() {
        assert_eq!(classify("I need to cancel my appointment"), Intent::CancelAppointment);
    }

    #[test]
    fn emergency_phrase_takes_priority_over_booking() {
        let text = "this is an emergency, I need to talk to a human right now, not book an appointment";
        assert_eq!(classify(text), Intent::EmergencyTransfer);
    }

    #[test]
    fn detects_goodbye_only_when_nothing_else_matches() {
        assert_eq!(classify("okay, bye"), Intent::Goodbye);
        assert_eq!(classify("bye, but first cancel my appointment"), Intent::CancelAppointment);
    }

    #[test]
    fn unrelated_text_yields_none() {
        assert_eq!(classify("what's the weather like"), Intent::None);
    }
}
