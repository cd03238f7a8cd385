//! Invitation code helpers.
//!
//! Every flow that accepts a code from the outside world (RSVP gate, gallery,
//! lodging page, configured code lists) goes through [`normalize_code`] so the
//! same input always resolves to the same stored key.

use lazy_static::lazy_static;
use regex::Regex;

/// Length of a canonical invitation code.
pub const CODE_LENGTH: usize = 6;

lazy_static! {
    static ref CANONICAL_CODE_REGEX: Regex = Regex::new(r"^[A-Z0-9]{6}$").unwrap();
}

/// Normalizes user input into the canonical code form: trimmed, ASCII upper-case.
pub fn normalize_code(input: &str) -> String {
    input.trim().to_ascii_uppercase()
}

/// Returns true if `code` is already in canonical form.
pub fn is_canonical_code(code: &str) -> bool {
    CANONICAL_CODE_REGEX.is_match(code)
}

/// Parses a comma-separated list of codes.
///
/// Entries are trimmed and normalized; empty entries are dropped. Duplicates
/// are kept only once, first occurrence wins.
pub fn parse_code_list(raw: &str) -> Vec<String> {
    let mut codes: Vec<String> = Vec::new();
    for entry in raw.split(',') {
        let code = normalize_code(entry);
        if code.is_empty() || codes.contains(&code) {
            continue;
        }
        codes.push(code);
    }
    codes
}
