// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Fallback name/email extractor (§4.5). Not a tool: run by the gateway on
//! every finalized caller transcript fragment so `Session.user_info` stays
//! populated even when the model never calls `update_user_info` itself.

use regex::Regex;
use std::sync::OnceLock;

struct Patterns {
    name: Regex,
    email: Regex,
}

static PATTERNS: OnceLock<Patterns> = OnceLock::new();

fn patterns() -> &'static Patterns {
    PATTERNS.get_or_init(|| Patterns {
        name: Regex::new(r"(?i)\b(?:my name is|this is|i'm|i am|call me)\s+([a-z][a-z'-]*(?:\s+[a-z][a-z'-]*){0,2})")
            .unwrap(),
        email: Regex::new(r"(?i)\b[a-z0-9._%+-]+@[a-z0-9.-]+\.[a-z]{2,}\b").unwrap(),
    })
}

/// Words that occasionally follow the name phrases but aren't names
/// ("I'm calling about...", "I'm not sure...").
const STOP_WORDS: &[&str] = &[
    "calling", "not", "just", "also", "still", "here", "trying", "looking", "wondering",
    "sorry", "afraid", "glad", "happy", "going",
];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedInfo {
    pub name: Option<String>,
    pub email: Option<String>,
}

impl ExtractedInfo {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none()
    }
}

/// Extracts whatever a name/email regex pass can find in `text`. Returns an
/// empty [`ExtractedInfo`] when nothing matches; callers should no-op on
/// that rather than overwrite a previously collected value with nothing.
pub fn extract(text: &str) -> ExtractedInfo {
    let p = patterns();

    let name = p.name.captures(text).and_then(|caps| {
        let candidate = caps.get(1)?.as_str().trim();
        let first_word = candidate.split_whitespace().next()?.to_lowercase();
        if STOP_WORDS.contains(&first_word.as_str()) {
            return None;
        }
        Some(title_case(candidate))
    });

    let email = p.email.find(text).map(|m| m.as_str().to_string());

    ExtractedInfo { name, email }
}

fn title_case(words: &str) -> String {
    words
        .split_whitespace()
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_name_after_my_name_is() {
        let info = extract("hi, my name is jane doe and I have a question");
        assert_eq!(info.name.as_deref(), Some("Jane Doe"));
    }

    #[test]
    fn extracts_name_after_im() {
        let info = extract("i'm carlos, calling about my invoice");
        assert_eq!(info.name.as_deref(), Some("Carlos"));
    }

    #[test]
    fn rejects_stop_word_following_im() {
        let info = extract("i'm calling about my invoice");
        assert!(info.name.is_none());
    }

    #[test]
    fn extracts_email_anywhere_in_text() {
        let info = extract("you can reach me at Jane.Doe+info@example.co.uk if needed");
        assert_eq!(info.email.as_deref(), Some("Jane.Doe+info@example.co.uk"));
    }

    #[test]
    fn extracts_both_name_and_email_from_one_fragment() {
        let info = extract("call me Sam, my email is sam@example.com");
        assert_eq!(info.name.as_deref(), Some("Sam"));
        assert_eq!(info.email.as_deref(), Some("sam@example.com"));
    }

    #[test]
    fn unrelated_text_yields_nothing() {
        let info = extract("what time do you close on Friday");
        assert!(info.is_empty());
    }
}
