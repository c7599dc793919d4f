//! Field validation applied by the stores before any write.

use std::sync::OnceLock;

use regex::Regex;

use crate::shared::error::{IdentityError, Result};

const MAX_NAME_LENGTH: usize = 256;

fn email_regex() -> &'static Regex {
    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("email pattern compiles")
    })
}

pub fn validate_email(email: &str) -> Result<()> {
    if email.trim().is_empty() {
        return Err(IdentityError::validation("Email is required"));
    }
    if !email_regex().is_match(email) {
        return Err(IdentityError::validation(format!("Email '{}' is invalid", email)));
    }
    Ok(())
}

pub fn validate_user_name(user_name: &str) -> Result<()> {
    validate_name("User name", user_name)?;
    if user_name.chars().any(char::is_whitespace) {
        return Err(IdentityError::validation(format!(
            "User name '{}' must not contain whitespace",
            user_name
        )));
    }
    Ok(())
}

pub fn validate_role_name(name: &str) -> Result<()> {
    validate_name("Role name", name)
}

fn validate_name(label: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(IdentityError::validation(format!("{} is required", label)));
    }
    if value.chars().count() > MAX_NAME_LENGTH {
        return Err(IdentityError::validation(format!(
            "{} must be at most {} characters",
            label, MAX_NAME_LENGTH
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email() {
        assert!(validate_email("alice@example.com").is_ok());
        assert!(validate_email("a.b+c@sub.example.org").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("not-an-email").is_err());
        assert!(validate_email("alice@localhost").is_err());
    }

    #[test]
    fn test_names() {
        assert!(validate_user_name("alice").is_ok());
        assert!(validate_user_name("al ice").is_err());
        assert!(validate_user_name("  ").is_err());
        assert!(validate_role_name("Content Editors").is_ok());
        assert!(validate_role_name(&"x".repeat(300)).is_err());
    }
}
