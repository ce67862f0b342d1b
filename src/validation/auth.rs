use crate::error::{AppError, Result};

/// Validates a display name.
///
/// # Arguments
///
/// * `name` - The name to validate.
///
/// # Returns
///
/// A `Result<()>` indicating whether the name is valid.
pub fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(AppError::Validation("Name cannot be empty".to_string()));
    }

    if name.len() > 255 {
        return Err(AppError::Validation(
            "Name must be at most 255 characters".to_string(),
        ));
    }

    Ok(())
}

/// Validates a password.
///
/// # Arguments
///
/// * `password` - The password to validate.
///
/// # Returns
///
/// A `Result<()>` indicating whether the password is valid.
pub fn validate_password(password: &str) -> Result<()> {
    if password.len() < 8 {
        return Err(AppError::Validation(
            "Password must be at least 8 characters long".to_string(),
        ));
    }

    if password.len() > 128 {
        return Err(AppError::Validation(
            "Password must be at most 128 characters".to_string(),
        ));
    }

    Ok(())
}

/// Checks that the confirmation repeats the password.
pub fn validate_password_match(password: &str, confirmation: &str) -> Result<()> {
    if password != confirmation {
        return Err(AppError::Validation("Passwords do not match".to_string()));
    }
    Ok(())
}

/// Terms and privacy consent are mandatory; marketing consent is not.
pub fn validate_consents(terms: bool, privacy: bool) -> Result<()> {
    if !terms || !privacy {
        return Err(AppError::Validation(
            "You must agree to Terms & Conditions and Privacy Policy".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_length_bounds() {
        assert!(validate_password("short").is_err());
        assert!(validate_password("password").is_ok());
        assert!(validate_password(&"x".repeat(128)).is_ok());
        assert!(validate_password(&"x".repeat(129)).is_err());
    }

    #[test]
    fn name_must_not_be_blank() {
        assert!(validate_name("   ").is_err());
        assert!(validate_name("Demo User").is_ok());
    }

    #[test]
    fn confirmation_and_consents() {
        assert!(validate_password_match("password123", "password124").is_err());
        assert!(validate_password_match("password123", "password123").is_ok());
        assert!(validate_consents(true, false).is_err());
        assert!(validate_consents(false, true).is_err());
        assert!(validate_consents(true, true).is_ok());
    }
}
