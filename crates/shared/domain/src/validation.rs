//! Input presence checks shared by the user flows.

use crate::error::{DomainError, DomainResult};

/// Fail with a validation error naming `fields` when any value is empty.
pub fn require_fields(values: &[&str], fields: &str) -> DomainResult<()> {
    if values.iter().any(|v| v.is_empty()) {
        return Err(DomainError::validation(format!(
            "Missing required fields: {}",
            fields
        )));
    }
    Ok(())
}

/// Validate the inputs of a password reset completion.
pub fn validate_password_reset(
    username: &str,
    new_password: &str,
    confirmation_code: &str,
) -> DomainResult<()> {
    require_fields(
        &[username, new_password, confirmation_code],
        "username, newPassword, or confirmationCode",
    )
}
