use once_cell::sync::Lazy;
use regex::Regex;

use super::types::ReservationRequest;
use crate::error::{ReserveError, Result};

pub const USERNAME_REQUIRED_MESSAGE: &str = "Username is required.";
pub const DISCORD_REQUIRED_MESSAGE: &str = "Discord username is required.";
pub const EMAIL_REQUIRED_MESSAGE: &str = "Email is required.";
pub const EMAIL_INVALID_MESSAGE: &str = "Please enter a valid email address.";
pub const USERNAME_TOO_SHORT_MESSAGE: &str = "Username must be at least 3 characters.";
pub const USERNAME_CHARSET_MESSAGE: &str = "Only letters, numbers, and underscores are allowed.";

pub const MIN_USERNAME_LEN: usize = 3;

static USERNAME_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-zA-Z0-9_]+$").unwrap());

// Deliberately loose: something@something.something with no whitespace
static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

/// Check the form fields in order, stopping at the first problem.
///
/// Only presence and the email shape are checked here; the username rules
/// belong to the availability check.
pub fn validate_form(request: &ReservationRequest) -> Result<()> {
    if request.username.trim().is_empty() {
        return Err(ReserveError::validation(USERNAME_REQUIRED_MESSAGE));
    }
    if request.discord_handle.trim().is_empty() {
        return Err(ReserveError::validation(DISCORD_REQUIRED_MESSAGE));
    }
    if request.email.trim().is_empty() {
        return Err(ReserveError::validation(EMAIL_REQUIRED_MESSAGE));
    }
    if !EMAIL_REGEX.is_match(&request.email) {
        return Err(ReserveError::validation(EMAIL_INVALID_MESSAGE));
    }
    Ok(())
}

/// First username rule the candidate breaks, if any
pub fn username_rule_violation(username: &str) -> Option<&'static str> {
    if username.is_empty() {
        return Some(USERNAME_REQUIRED_MESSAGE);
    }
    // Counted in UTF-16 code units, the way the browser measures the input
    if username.encode_utf16().count() < MIN_USERNAME_LEN {
        return Some(USERNAME_TOO_SHORT_MESSAGE);
    }
    if !USERNAME_REGEX.is_match(username) {
        return Some(USERNAME_CHARSET_MESSAGE);
    }
    None
}
