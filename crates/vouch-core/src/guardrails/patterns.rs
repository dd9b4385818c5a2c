//! Shared detection patterns for guardrails.
//!
//! Personal data categories plus the URL extractor. Patterns are digit-run
//! and shape heuristics: no category implies semantic validation (the
//! credit card pattern is not a Luhn check).

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

lazy_static! {
    /// Email address pattern (RFC 5322 simplified)
    pub static ref EMAIL_PATTERN: Regex = Regex::new(
        r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}"
    ).unwrap();

    /// US phone number pattern (with optional country code)
    pub static ref PHONE_PATTERN: Regex = Regex::new(
        r"(?:\+?1[-.\s]?)?(?:\([0-9]{3}\)|\b[0-9]{3})[-.\s]?[0-9]{3}[-.\s]?[0-9]{4}\b"
    ).unwrap();

    /// Social Security Number pattern (XXX-XX-XXXX)
    pub static ref SSN_PATTERN: Regex = Regex::new(
        r"\b\d{3}-\d{2}-\d{4}\b"
    ).unwrap();

    /// Credit card number pattern (16 digits with optional separators)
    pub static ref CREDIT_CARD_PATTERN: Regex = Regex::new(
        r"\b\d{4}[\s-]?\d{4}[\s-]?\d{4}[\s-]?\d{4}\b"
    ).unwrap();

    /// Dotted-quad IPv4 address
    pub static ref IP_ADDRESS_PATTERN: Regex = Regex::new(
        r"\b(?:(?:25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d)\.){3}(?:25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d)\b"
    ).unwrap();

    /// http(s) links; trailing sentence punctuation is stripped separately
    pub static ref URL_PATTERN: Regex = Regex::new(
        r#"(?i)\bhttps?://[^\s<>"'`{}|\\^\[\]]+"#
    ).unwrap();
}

/// Built-in personal data categories, in scan order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum PiiCategory {
    Email,
    Phone,
    Ssn,
    CreditCard,
    IpAddress,
}

impl PiiCategory {
    pub const ALL: [PiiCategory; 5] = [
        PiiCategory::Email,
        PiiCategory::Phone,
        PiiCategory::Ssn,
        PiiCategory::CreditCard,
        PiiCategory::IpAddress,
    ];

    /// Identifier used in metadata and suite files.
    pub fn as_str(&self) -> &'static str {
        match self {
            PiiCategory::Email => "email",
            PiiCategory::Phone => "phone",
            PiiCategory::Ssn => "ssn",
            PiiCategory::CreditCard => "creditCard",
            PiiCategory::IpAddress => "ipAddress",
        }
    }

    pub fn pattern(&self) -> &'static Regex {
        match self {
            PiiCategory::Email => &EMAIL_PATTERN,
            PiiCategory::Phone => &PHONE_PATTERN,
            PiiCategory::Ssn => &SSN_PATTERN,
            PiiCategory::CreditCard => &CREDIT_CARD_PATTERN,
            PiiCategory::IpAddress => &IP_ADDRESS_PATTERN,
        }
    }
}

/// Extract http(s) URLs, stripping trailing sentence punctuation.
///
/// Returns distinct URLs only, in first-occurrence order, so callers that
/// score per URL count each link once.
pub fn extract_urls(content: &str) -> Vec<String> {
    let mut urls: Vec<String> = Vec::new();

    for m in URL_PATTERN.find_iter(content) {
        let url = trim_sentence_punctuation(m.as_str());
        if !url.is_empty() && !urls.iter().any(|u| u == url) {
            urls.push(url.to_string());
        }
    }

    urls
}

/// Drop trailing sentence punctuation. A closing parenthesis is only dropped
/// while it is unbalanced, so `.../Rust_(language)` keeps its `)`.
fn trim_sentence_punctuation(mut url: &str) -> &str {
    while let Some(last) = url.chars().next_back() {
        let strip = match last {
            '.' | ',' | ';' | ':' | '!' | '?' => true,
            ')' => url.matches(')').count() > url.matches('(').count(),
            _ => false,
        };
        if !strip {
            break;
        }
        url = &url[..url.len() - last.len_utf8()];
    }
    url
}
