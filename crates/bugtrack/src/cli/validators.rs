//! CLI input validation functions.
//!
//! These validators are used by clap's `value_parser` attribute. They only
//! normalize and reject malformed input; whether a required field is blank
//! is decided by the mutation guard so the rule lives in one place.

/// Maximum length of a title or category name.
pub const MAX_NAME_LENGTH: usize = 200;

/// Trim a single-line text value (title, name, status).
///
/// Blank input is allowed through as `""`.
pub fn validate_line(s: &str) -> Result<String, String> {
    let s = s.trim();

    if s.contains('\n') || s.contains('\r') {
        return Err("Value cannot contain newline characters".to_string());
    }

    if s.chars().count() > MAX_NAME_LENGTH {
        return Err(format!(
            "Value cannot exceed {MAX_NAME_LENGTH} characters, got {}",
            s.chars().count()
        ));
    }

    Ok(s.to_string())
}

/// Parse a positive record id.
pub fn validate_id(s: &str) -> Result<i64, String> {
    let s = s.trim().trim_start_matches('#');
    let id: i64 = s
        .parse()
        .map_err(|_| format!("Invalid id '{s}'. Expected a positive integer"))?;

    if id <= 0 {
        return Err(format!("Invalid id '{id}'. Ids start at 1"));
    }
    Ok(id)
}
