use validator::ValidationError;

/// Rejects whitespace-only values that would otherwise pass a length rule.
/// Request models pair this with `#[serde(default)]`, so a missing field
/// arrives as an empty string and reports as required rather than as a
/// deserialization error.
pub fn validate_required(value: &String) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("is_required");
        error.message = Some(std::borrow::Cow::from("This field is required"));
        Err(error)
    } else {
        Ok(())
    }
}

/// Canonical form for stored email addresses. Registration, login, profile
/// updates and newsletter lookups all pass through this, so `Foo@x.com` and
/// `foo@x.com` resolve to the same account.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_rejects_blank_and_empty_values() {
        assert!(validate_required(&String::new()).is_err());
        assert!(validate_required(&"   ".to_string()).is_err());
        assert!(validate_required(&"x".to_string()).is_ok());
    }

    #[test]
    fn email_normalization_folds_case_and_trims() {
        assert_eq!(normalize_email("  Foo@Example.COM "), "foo@example.com");
        assert_eq!(normalize_email("already@lower.dev"), "already@lower.dev");
    }
}
