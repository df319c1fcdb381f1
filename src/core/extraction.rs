//! Pulls FRA claim fields out of OCR text (English and Hindi forms).
//!
//! Matching runs on the lowercased text, so extracted values are lowercase.

use crate::domain::model::FraFields;
use regex::{Captures, Regex};
use std::sync::LazyLock;

const EXCERPT_LENGTH: usize = 200;

fn pattern(source: &str) -> Regex {
    Regex::new(source).expect("extraction pattern must compile")
}

static NAME_PATTERNS: LazyLock<[Regex; 2]> = LazyLock::new(|| {
    [
        pattern(r"(?i)(?:name|नाम|applicant|आवेदक|claimant|दावेदार)[\s:]*([^\n\r,]+)"),
        pattern(r"(?i)(?:name|नाम)[\s:]*([A-Za-z\x{0900}-\x{097F}\s]+)"),
    ]
});

static VILLAGE_PATTERNS: LazyLock<[Regex; 2]> = LazyLock::new(|| {
    [
        pattern(r"(?i)(?:village|गाँव|ग्राम|village name|ग्राम का नाम)[\s:]*([^\n\r,]+)"),
        pattern(r"(?i)(?:village|गाँव|ग्राम)[\s:]*([A-Za-z\x{0900}-\x{097F}\s]+)"),
    ]
});

static AREA_PATTERNS: LazyLock<[Regex; 2]> = LazyLock::new(|| {
    [
        pattern(
            r"(?i)(?:area|क्षेत्रफल|जमीन|land)[\s:]*([0-9.,\s]+)\s*(hectare|acre|हेक्टेयर|एकड़|sq\.?\s*m|sq\.?\s*ft)",
        ),
        pattern(r"(?i)([0-9.,\s]+)\s*(hectare|acre|हेक्टेयर|एकड़|sq\.?\s*m|sq\.?\s*ft)"),
    ]
});

static STATUS_LABEL: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"(?i)(?:status|स्थिति|claim status|दावा स्थिति)[\s:]*([^\n\r,]+)"));

static STATUS_WORD: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"(?i)(?:approved|स्वीकृत|rejected|अस्वीकृत|pending|लंबित)"));

// "अस्वीकृत" contains "स्वीकृत", so rejection is checked first.
const STATUS_KEYWORDS: [(&str, &[&str]); 3] = [
    ("rejected", &["rejected", "अस्वीकृत", "denied"]),
    ("approved", &["approved", "स्वीकृत", "accepted"]),
    ("pending", &["pending", "लंबित", "under review"]),
];

fn first_match<'t>(patterns: &[Regex], text: &'t str) -> Option<Captures<'t>> {
    patterns.iter().find_map(|re| re.captures(text))
}

fn group(caps: &Captures<'_>, index: usize) -> Option<String> {
    caps.get(index).map(|m| m.as_str().trim().to_string())
}

fn classify_status(text: &str) -> Option<&'static str> {
    STATUS_KEYWORDS
        .iter()
        .find(|(_, words)| words.iter().any(|w| text.contains(w)))
        .map(|(status, _)| *status)
}

pub fn extract_fra_fields(text: &str) -> FraFields {
    let text = text.to_lowercase();
    let mut fields = FraFields::default();

    if let Some(caps) = first_match(&*NAME_PATTERNS, &text) {
        fields.claimant_name = group(&caps, 1);
    }

    if let Some(caps) = first_match(&*VILLAGE_PATTERNS, &text) {
        fields.village = group(&caps, 1);
    }

    if let Some(caps) = first_match(&*AREA_PATTERNS, &text) {
        fields.area = group(&caps, 1);
        fields.area_units = group(&caps, 2);
    }

    let labelled = STATUS_LABEL
        .captures(&text)
        .and_then(|caps| group(&caps, 1))
        .or_else(|| STATUS_WORD.find(&text).map(|m| m.as_str().to_string()));
    fields.claim_status = labelled
        .as_deref()
        .and_then(classify_status)
        .or_else(|| classify_status(&text))
        .map(str::to_string);

    tracing::debug!(
        "Extracted fields: name={:?} village={:?} area={:?} status={:?}",
        fields.claimant_name,
        fields.village,
        fields.area,
        fields.claim_status
    );
    fields
}

/// First `max_length` characters, with `...` appended when truncated.
pub fn text_excerpt(text: &str, max_length: usize) -> String {
    if text.chars().count() <= max_length {
        return text.to_string();
    }
    let head: String = text.chars().take(max_length).collect();
    format!("{}...", head)
}

pub fn default_excerpt(text: &str) -> String {
    text_excerpt(text, EXCERPT_LENGTH)
}
