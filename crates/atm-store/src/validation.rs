//! Field validation for account creation and editing.
//!
//! Centralized the way `users-core::validation` centralizes password and
//! username rules, but scoped to the much smaller constraint set this
//! system needs (`§3` of the design).

use crate::error::ValidationError;

/// The reserved administrator username — no cardholder account may claim it.
pub const RESERVED_ADMIN_USERNAME: &str = "admin";

pub const MIN_PHONE: u64 = 6_000_000_000;
pub const MAX_PHONE: u64 = 9_999_999_999;

/// Title-case a holder name: uppercase the first letter of each
/// whitespace-separated word, lowercase the rest.
pub fn title_case(name: &str) -> String {
    name.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn validate_holder_name(name: &str) -> Result<String, ValidationError> {
    let trimmed = name.trim();
    if trimmed.chars().filter(|c| c.is_ascii_graphic() || *c == ' ').count() < 3 {
        return Err(ValidationError::HolderNameTooShort);
    }
    Ok(title_case(trimmed))
}

pub fn validate_phone(phone: u64) -> Result<u64, ValidationError> {
    if (MIN_PHONE..=MAX_PHONE).contains(&phone) {
        Ok(phone)
    } else {
        Err(ValidationError::PhoneOutOfRange)
    }
}

pub fn validate_username(username: &str) -> Result<String, ValidationError> {
    if username.is_empty() || username.len() > 20 || username.eq_ignore_ascii_case(RESERVED_ADMIN_USERNAME) {
        return Err(ValidationError::InvalidUsername);
    }
    Ok(username.to_string())
}

pub fn validate_password(password: &str) -> Result<String, ValidationError> {
    if password.is_empty() || password.len() > 20 {
        return Err(ValidationError::InvalidPassword);
    }
    Ok(password.to_string())
}

pub fn validate_rfid(rfid: &str) -> Result<String, ValidationError> {
    if rfid.len() != 8 {
        return Err(ValidationError::InvalidRfidLength);
    }
    Ok(rfid.to_string())
}

pub fn validate_pin(pin: &str) -> Result<String, ValidationError> {
    if pin.len() != 4 || !pin.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidPin);
    }
    Ok(pin.to_string())
}

pub fn validate_opening_balance(amount: f64) -> Result<f64, ValidationError> {
    if amount > 0.0 {
        Ok(amount)
    } else {
        Err(ValidationError::NonPositiveOpeningBalance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_cases_multi_word_names() {
        assert_eq!(title_case("alice ANN smith"), "Alice Ann Smith");
    }

    #[test]
    fn rejects_reserved_admin_username() {
        assert!(validate_username("admin").is_err());
        assert!(validate_username("Admin").is_err());
        assert!(validate_username("alice").is_ok());
    }

    #[test]
    fn phone_range_boundaries() {
        assert!(validate_phone(5_999_999_999).is_err());
        assert!(validate_phone(6_000_000_000).is_ok());
        assert!(validate_phone(9_999_999_999).is_ok());
        assert!(validate_phone(10_000_000_000).is_err());
    }

    #[test]
    fn pin_must_be_four_digits() {
        assert!(validate_pin("1234").is_ok());
        assert!(validate_pin("123").is_err());
        assert!(validate_pin("12a4").is_err());
    }
}
