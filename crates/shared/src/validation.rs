//! Common validation utilities.

use validator::ValidationError;

/// Maximum length of a setting key (e.g. `system.gdpr`).
pub const MAX_KEY_LENGTH: usize = 128;

/// Maximum length of a field or enum name.
pub const MAX_NAME_LENGTH: usize = 64;

/// Maximum number of options a select-like field or enum may carry.
pub const MAX_OPTIONS: usize = 500;

lazy_static::lazy_static! {
    /// Dotted lowercase identifier: `system.gdpr`, `app.invoice`.
    pub static ref SETTING_KEY_REGEX: regex::Regex =
        regex::Regex::new(r"^[a-z][a-z0-9_]*(\.[a-z][a-z0-9_]*)*$").unwrap();

    /// snake_case identifier used for field and enum names.
    pub static ref NAME_REGEX: regex::Regex =
        regex::Regex::new(r"^[a-z][a-z0-9_]*$").unwrap();

    /// Bare file extension without the leading dot.
    static ref EXTENSION_REGEX: regex::Regex =
        regex::Regex::new(r"^[a-z0-9]{1,10}$").unwrap();
}

/// Validates a setting key.
pub fn validate_setting_key(key: &str) -> Result<(), ValidationError> {
    if key.is_empty() || key.len() > MAX_KEY_LENGTH {
        let mut err = ValidationError::new("setting_key_length");
        err.message = Some(format!("Setting key must be 1-{} characters", MAX_KEY_LENGTH).into());
        return Err(err);
    }
    if !SETTING_KEY_REGEX.is_match(key) {
        let mut err = ValidationError::new("setting_key_format");
        err.message = Some("Setting key must be lowercase dotted segments (e.g. system.gdpr)".into());
        return Err(err);
    }
    Ok(())
}

/// Validates a field or enum name.
pub fn validate_name(name: &str) -> Result<(), ValidationError> {
    if name.is_empty() || name.len() > MAX_NAME_LENGTH {
        let mut err = ValidationError::new("name_length");
        err.message = Some(format!("Name must be 1-{} characters", MAX_NAME_LENGTH).into());
        return Err(err);
    }
    if !NAME_REGEX.is_match(name) {
        let mut err = ValidationError::new("name_format");
        err.message = Some("Name must be snake_case (lowercase letters, digits, underscores)".into());
        return Err(err);
    }
    Ok(())
}

/// Validates a list of allowed file extensions.
pub fn validate_extensions(extensions: &[String]) -> Result<(), ValidationError> {
    if extensions.is_empty() {
        let mut err = ValidationError::new("extensions_empty");
        err.message = Some("At least one allowed extension is required".into());
        return Err(err);
    }
    if let Some(bad) = extensions.iter().find(|e| !EXTENSION_REGEX.is_match(e)) {
        let mut err = ValidationError::new("extension_format");
        err.message = Some(format!("Invalid file extension: {}", bad).into());
        return Err(err);
    }
    Ok(())
}

/// Validates that option values are non-empty, unique and within bounds.
pub fn validate_option_values<'a, I>(values: I) -> Result<(), ValidationError>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = std::collections::HashSet::new();
    for value in values {
        if value.trim().is_empty() {
            let mut err = ValidationError::new("option_value_empty");
            err.message = Some("Option values cannot be empty".into());
            return Err(err);
        }
        if !seen.insert(value) {
            let mut err = ValidationError::new("option_value_duplicate");
            err.message = Some(format!("Duplicate option value: {}", value).into());
            return Err(err);
        }
    }
    if seen.len() > MAX_OPTIONS {
        let mut err = ValidationError::new("options_too_many");
        err.message = Some(format!("At most {} options are allowed", MAX_OPTIONS).into());
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use fake::faker::lorem::en::Word;
    use fake::Fake;

    #[test]
    fn test_validate_setting_key() {
        assert!(validate_setting_key("system.gdpr").is_ok());
        assert!(validate_setting_key("app.invoice").is_ok());
        assert!(validate_setting_key("school.academic_session").is_ok());
        assert!(validate_setting_key("otp").is_ok());
    }

    #[test]
    fn test_validate_setting_key_rejects_bad_format() {
        assert!(validate_setting_key("").is_err());
        assert!(validate_setting_key("System.GDPR").is_err());
        assert!(validate_setting_key("system..gdpr").is_err());
        assert!(validate_setting_key(".gdpr").is_err());
        assert!(validate_setting_key("system.").is_err());
        assert!(validate_setting_key("1system").is_err());
    }

    #[test]
    fn test_validate_setting_key_length() {
        let long = format!("a{}", "b".repeat(MAX_KEY_LENGTH));
        let err = validate_setting_key(&long).unwrap_err();
        assert_eq!(err.code, "setting_key_length");
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("passport_photo").is_ok());
        assert!(validate_name("blood_group2").is_ok());
        assert!(validate_name("Passport").is_err());
        assert!(validate_name("passport-photo").is_err());
        assert!(validate_name("_private").is_err());
        assert!(validate_name("").is_err());
    }

    #[test]
    fn test_validate_name_with_random_words() {
        for _ in 0..20 {
            let word: String = Word().fake();
            let name = word.to_lowercase();
            if name.chars().all(|c| c.is_ascii_lowercase()) {
                assert!(validate_name(&name).is_ok(), "{} should be valid", name);
            }
        }
    }

    #[test]
    fn test_validate_extensions() {
        assert!(validate_extensions(&["jpg".to_string(), "png".to_string()]).is_ok());
        assert!(validate_extensions(&[]).is_err());
        let err = validate_extensions(&[".jpg".to_string()]).unwrap_err();
        assert_eq!(err.message.unwrap().to_string(), "Invalid file extension: .jpg");
    }

    #[test]
    fn test_validate_option_values() {
        assert!(validate_option_values(["a", "b", "c"]).is_ok());
        assert!(validate_option_values(["a", " "]).is_err());
        let err = validate_option_values(["a", "b", "a"]).unwrap_err();
        assert_eq!(err.code, "option_value_duplicate");
    }
}
