use crate::error::{AppError, AppResult};
use regex::Regex;
use std::sync::OnceLock;

fn kenyan_phone_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\+254\d{9}$").expect("static regex"))
}

/// Normalise a Kenyan mobile number to `+254XXXXXXXXX`.
///
/// Accepts the local `07…`/`01…` form and the bare `254…` form.
pub fn normalize_kenyan_phone(phone: &str) -> AppResult<String> {
    let phone = phone.trim();
    let normalized = if phone.starts_with("+254") {
        phone.to_string()
    } else if let Some(rest) = phone.strip_prefix('0') {
        format!("+254{rest}")
    } else if phone.starts_with("254") {
        format!("+{phone}")
    } else {
        return Err(AppError::ValidationError(
            "Invalid Kenyan phone number format".to_string(),
        ));
    };

    if !kenyan_phone_regex().is_match(&normalized) {
        return Err(AppError::ValidationError(
            "Phone number must be 13 digits including +254".to_string(),
        ));
    }

    Ok(normalized)
}

/// Strip spaces and dashes and check the digit count of a card number.
pub fn normalize_card_number(card: &str) -> AppResult<String> {
    let digits: String = card.chars().filter(|c| *c != ' ' && *c != '-').collect();

    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::ValidationError(
            "Card number must contain only digits".to_string(),
        ));
    }
    if ![13, 14, 15, 16, 19].contains(&digits.len()) {
        return Err(AppError::ValidationError(
            "Invalid card number length".to_string(),
        ));
    }

    Ok(digits)
}
