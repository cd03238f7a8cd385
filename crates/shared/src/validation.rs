//! Common validation utilities.

use std::collections::HashSet;
use validator::ValidationError;

/// Maximum number of guests listed under a single invitation code.
pub const MAX_GUESTS_PER_CODE: usize = 30;

/// Maximum length of a guest name.
pub const MAX_GUEST_NAME_LENGTH: usize = 80;

/// Validates a guest list: non-empty, bounded, no blank or duplicate names.
pub fn validate_guest_names(names: &[String]) -> Result<(), ValidationError> {
    if names.is_empty() || names.len() > MAX_GUESTS_PER_CODE {
        let mut err = ValidationError::new("guest_count");
        err.message = Some(
            format!("An invitation must list between 1 and {MAX_GUESTS_PER_CODE} guests").into(),
        );
        return Err(err);
    }

    let mut seen = HashSet::new();
    for name in names {
        let trimmed = name.trim();
        if trimmed.is_empty() || trimmed.chars().count() > MAX_GUEST_NAME_LENGTH {
            let mut err = ValidationError::new("guest_name");
            err.message = Some(
                format!("Guest names must be 1 to {MAX_GUEST_NAME_LENGTH} characters").into(),
            );
            return Err(err);
        }
        if !seen.insert(trimmed) {
            let mut err = ValidationError::new("guest_name_duplicate");
            err.message = Some(format!("Guest '{trimmed}' is listed twice").into());
            return Err(err);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_validate_guest_names_ok() {
        assert!(validate_guest_names(&names(&["Alice", "Bob"])).is_ok());
    }

    #[test]
    fn test_validate_guest_names_empty_list() {
        assert!(validate_guest_names(&[]).is_err());
    }

    #[test]
    fn test_validate_guest_names_blank_entry() {
        assert!(validate_guest_names(&names(&["Alice", "  "])).is_err());
    }

    #[test]
    fn test_validate_guest_names_duplicate() {
        let err = validate_guest_names(&names(&["Alice", "Alice "])).unwrap_err();
        assert_eq!(err.code, "guest_name_duplicate");
    }

    #[test]
    fn test_validate_guest_names_too_many() {
        let many: Vec<String> = (0..=MAX_GUESTS_PER_CODE).map(|i| format!("Guest {i}")).collect();
        assert!(validate_guest_names(&many).is_err());
    }
}
