//! Common validation utilities.

use chrono_tz::Tz;
use validator::ValidationError;

/// Maximum length of an external user identifier.
pub const MAX_USER_ID_LENGTH: usize = 128;

/// Validates an external user identifier.
/// - Must be 1 to 128 characters
/// - Must not contain whitespace
pub fn validate_user_id(user_id: &str) -> Result<(), ValidationError> {
    if user_id.is_empty() || user_id.chars().count() > MAX_USER_ID_LENGTH {
        let mut err = ValidationError::new("user_id_length");
        err.message = Some("User ID must be 1-128 characters".into());
        return Err(err);
    }

    if user_id.chars().any(char::is_whitespace) {
        let mut err = ValidationError::new("user_id_whitespace");
        err.message = Some("User ID must not contain whitespace".into());
        return Err(err);
    }

    Ok(())
}

/// Validates that a timezone is a known IANA name (e.g. `Europe/Prague`).
pub fn validate_timezone(timezone: &str) -> Result<(), ValidationError> {
    if timezone.parse::<Tz>().is_ok() {
        Ok(())
    } else {
        let mut err = ValidationError::new("timezone_unknown");
        err.message = Some("Timezone must be a valid IANA timezone name".into());
        Err(err)
    }
}
