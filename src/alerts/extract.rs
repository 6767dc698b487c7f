// Text extraction for notifications whose structured fields are missing.
//
// The backend does not always fill in blood type, hospital or donor fields, so
// these pull an approximate value out of the free text. Every function is pure
// and returns `None` when nothing usable is found; callers pick the default.
use std::sync::LazyLock;

use regex::Regex;

static BLOOD_TYPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(AB|A|B|O)(?:([+-])|\s+(?i:(positive|negative|pos|neg))\b)")
        .expect("blood type pattern is valid")
});

static REQUEST_TITLE_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*(?:(?:critical|urgent|high[- ]priority|emergency)\s+)?blood\s+(?:request|needed)(?:\s+near\s+you)?\s+(?:at|from)\s+(.+)$",
    )
    .expect("request title pattern is valid")
});

static DONOR_ACCEPTED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:Donor\s+)?([A-Z][\w.'-]*(?:\s+[A-Z][\w.'-]*)*)\s+(?:has\s+)?accepted\b")
        .expect("donor pattern is valid")
});

/// Where a free-text fragment ends: a dash, clause punctuation or a bracket.
const SEGMENT_TERMINATORS: &[&str] = &[" - ", " – ", " — ", ",", ";", "(", "!", "\n"];

/// Find an ABO/Rh blood type such as `O+`, `AB-` or `A positive`, normalized to `A+` form.
pub fn extract_blood_type(text: &str) -> Option<String> {
    let caps = BLOOD_TYPE.captures(text)?;
    let group = caps.get(1)?.as_str();
    let sign = match (caps.get(2), caps.get(3)) {
        (Some(symbol), _) => symbol.as_str().to_string(),
        (None, Some(word)) if word.as_str().to_ascii_lowercase().starts_with("pos") => {
            "+".to_string()
        }
        (None, Some(_)) => "-".to_string(),
        (None, None) => return None,
    };
    Some(format!("{}{}", group, sign))
}

/// Hospital name from a request title such as
/// `"Critical Blood Request Near You at City Hospital - O+ needed"`.
pub fn extract_hospital_from_title(title: &str) -> Option<String> {
    let caps = REQUEST_TITLE_PREFIX.captures(title)?;
    clean_segment(caps.get(1)?.as_str())
}

/// Text following the first `" at "`, cut at the end of the clause.
pub fn extract_after_at(text: &str) -> Option<String> {
    extract_after(text, " at ")
}

/// Text following the first `" in "`, cut at the end of the clause.
pub fn extract_location(text: &str) -> Option<String> {
    extract_after(text, " in ")
}

/// Hospital for a blood request: known title prefixes first, then `" at "` in
/// the title, then `" at "` in the message.
pub fn extract_request_hospital(title: &str, message: &str) -> Option<String> {
    extract_hospital_from_title(title)
        .or_else(|| extract_hospital_from_title(message))
        .or_else(|| extract_after_at(title))
        .or_else(|| extract_after_at(message))
}

/// Donor name from phrasing like `"Jane Doe has accepted your blood request"`.
pub fn extract_donor_name(text: &str) -> Option<String> {
    let caps = DONOR_ACCEPTED.captures(text)?;
    let name = caps.get(1)?.as_str().trim();
    let lowered = name.to_ascii_lowercase();
    if name.is_empty() || lowered == "a donor" || lowered == "someone" || lowered == "donor" {
        return None;
    }
    Some(name.to_string())
}

fn extract_after(text: &str, marker: &str) -> Option<String> {
    let start = text.find(marker)? + marker.len();
    clean_segment(&text[start..])
}

fn clean_segment(segment: &str) -> Option<String> {
    let end = SEGMENT_TERMINATORS
        .iter()
        .filter_map(|terminator| segment.find(terminator))
        .chain(sentence_end(segment))
        .min()
        .unwrap_or(segment.len());

    let cleaned = segment[..end]
        .trim()
        .trim_end_matches(['.', ':', '!', '?'])
        .trim();

    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned.to_string())
    }
}

/// First `". "` that closes a sentence rather than an abbreviation like `St.` or `Dr.`.
fn sentence_end(segment: &str) -> Option<usize> {
    segment.match_indices(". ").map(|(idx, _)| idx).find(|&idx| {
        let word = segment[..idx].rsplit(' ').next().unwrap_or("");
        word.chars().count() > 3
    })
}
