//! Reusable validation rules for admin request payloads.

use validator::ValidationError;

/// Minimum length of a moderation reason, counted in characters after trimming.
pub const MIN_REASON_LEN: usize = 10;

/// Maximum length of any free-text reason or note.
pub const MAX_REASON_LEN: usize = 1000;

lazy_static::lazy_static! {
    pub static ref DISCOUNT_CODE_REGEX: regex::Regex =
        regex::Regex::new(r"^[A-Z0-9_-]{3,32}$").unwrap();
}

/// Validates a moderation reason (suspension, rejection, refund, ...).
pub fn validate_reason(reason: &str) -> Result<(), ValidationError> {
    let len = reason.trim().chars().count();
    if len < MIN_REASON_LEN {
        let mut err = ValidationError::new("reason_too_short");
        err.message = Some("Reason must be at least 10 characters".into());
        return Err(err);
    }
    if len > MAX_REASON_LEN {
        let mut err = ValidationError::new("reason_too_long");
        err.message = Some("Reason must not exceed 1000 characters".into());
        return Err(err);
    }
    Ok(())
}

/// Validates an optional free-text note.
pub fn validate_note(note: &str) -> Result<(), ValidationError> {
    if note.chars().count() > MAX_REASON_LEN {
        let mut err = ValidationError::new("note_too_long");
        err.message = Some("Note must not exceed 1000 characters".into());
        return Err(err);
    }
    Ok(())
}

/// Validates a discount code after upper-casing.
pub fn validate_discount_code(code: &str) -> Result<(), ValidationError> {
    if DISCOUNT_CODE_REGEX.is_match(&normalize_discount_code(code)) {
        Ok(())
    } else {
        let mut err = ValidationError::new("discount_code_format");
        err.message = Some(
            "Code must be 3-32 characters of A-Z, 0-9, underscore or hyphen".into(),
        );
        Err(err)
    }
}

/// Canonical stored form of a discount code.
pub fn normalize_discount_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// Escapes `%`, `_` and `\` so a user-supplied term matches literally inside
/// an `ILIKE '%' || $n || '%'` pattern.
pub fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_reason() {
        assert!(validate_reason("spamming repeatedly").is_ok());
        assert!(validate_reason("0123456789").is_ok());
        assert!(validate_reason("too short").is_err());
        assert!(validate_reason("   padded   ").is_err());
        assert!(validate_reason(&"x".repeat(1001)).is_err());
    }

    #[test]
    fn test_validate_reason_counts_chars_not_bytes() {
        // 10 two-byte characters
        assert!(validate_reason("éééééééééé").is_ok());
        assert!(validate_reason("ééééé").is_err());
    }

    #[test]
    fn test_validate_reason_message() {
        let err = validate_reason("nope").unwrap_err();
        assert_eq!(
            err.message.unwrap().to_string(),
            "Reason must be at least 10 characters"
        );
    }

    #[test]
    fn test_validate_note() {
        assert!(validate_note("").is_ok());
        assert!(validate_note(&"n".repeat(1000)).is_ok());
        assert!(validate_note(&"n".repeat(1001)).is_err());
    }

    #[test]
    fn test_validate_discount_code() {
        assert!(validate_discount_code("SUMMER_2024").is_ok());
        assert!(validate_discount_code("welcome-10").is_ok());
        assert!(validate_discount_code("AB").is_err());
        assert!(validate_discount_code("HAS SPACE").is_err());
        assert!(validate_discount_code(&"A".repeat(33)).is_err());
    }

    #[test]
    fn test_normalize_discount_code() {
        assert_eq!(normalize_discount_code("  spring50 "), "SPRING50");
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("plain"), "plain");
        assert_eq!(escape_like("50%_off"), "50\\%\\_off");
        assert_eq!(escape_like("a\\b"), "a\\\\b");
    }
}
