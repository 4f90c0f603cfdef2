//! Input validation utilities

use regex::Regex;
use std::sync::OnceLock;

/// Maximum length of a chat message, in characters
pub const MAX_MESSAGE_CHARS: usize = 2000;

/// Validate phone number
pub fn validate_phone(phone: &str) -> Result<(), String> {
    static PHONE_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = PHONE_REGEX
        .get_or_init(|| Regex::new(r"^\+?[0-9 ()-]{6,20}$").expect("Failed to compile phone regex"));

    if !regex.is_match(phone) {
        return Err("Invalid phone number format".to_string());
    }

    Ok(())
}

/// Validate and trim a chat message
pub fn validate_message_text(text: &str) -> Result<String, String> {
    let text = text.trim();

    if text.is_empty() {
        return Err("Message cannot be empty".to_string());
    }

    if text.chars().count() > MAX_MESSAGE_CHARS {
        return Err(format!(
            "Message must be at most {} characters long",
            MAX_MESSAGE_CHARS
        ));
    }

    Ok(text.to_string())
}

/// Validate the requested length of a session
pub fn validate_session_duration(minutes: i32) -> Result<(), String> {
    if !(15..=240).contains(&minutes) {
        return Err("Estimated duration must be between 15 and 240 minutes".to_string());
    }

    Ok(())
}

/// Validate the time a session actually took
pub fn validate_actual_duration(minutes: i32) -> Result<(), String> {
    if !(1..=24 * 60).contains(&minutes) {
        return Err("Actual duration must be between 1 and 1440 minutes".to_string());
    }

    Ok(())
}
