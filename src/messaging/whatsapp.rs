//! WhatsApp click-to-chat links.
//!
//! Messages are not sent through an API; the recipient's device opens a
//! prefilled chat from a `wa.me` link.

use thiserror::Error;
use url::form_urlencoded;

pub const MIN_DIGITS: usize = 8;
pub const MAX_DIGITS: usize = 15;

#[derive(Debug, Error, PartialEq)]
pub enum PhoneError {
    #[error("Phone number contains invalid character '{0}'")]
    InvalidCharacter(char),
    #[error("Phone number must have between 8 and 15 digits, got {0}")]
    InvalidLength(usize),
}

/// Normalises a phone number to international digits without a `+`.
///
/// `+44 7700 900123` and `0044 7700 900123` are already international.
/// A single leading `0` is a national number and gets `default_country_code`.
pub fn normalize_phone(raw: &str, default_country_code: &str) -> Result<String, PhoneError> {
    let trimmed = raw.trim();
    let international = trimmed.starts_with('+');
    let body = trimmed.strip_prefix('+').unwrap_or(trimmed);

    let mut digits = String::with_capacity(body.len());
    for c in body.chars() {
        match c {
            '0'..='9' => digits.push(c),
            ' ' | '-' | '.' | '(' | ')' | '/' => {}
            other => return Err(PhoneError::InvalidCharacter(other)),
        }
    }

    let normalized = if international {
        digits
    } else if let Some(rest) = digits.strip_prefix("00") {
        rest.to_string()
    } else if let Some(rest) = digits.strip_prefix('0') {
        let cc: String = default_country_code.chars().filter(char::is_ascii_digit).collect();
        format!("{cc}{rest}")
    } else {
        digits
    };

    if !(MIN_DIGITS..=MAX_DIGITS).contains(&normalized.len()) {
        return Err(PhoneError::InvalidLength(normalized.len()));
    }
    Ok(normalized)
}

/// Percent-encodes a message for a query string, spaces as `%20`.
pub fn encode_message(message: &str) -> String {
    form_urlencoded::byte_serialize(message.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

pub fn click_to_chat_link(phone_digits: &str, message: &str) -> String {
    format!("https://wa.me/{}?text={}", phone_digits, encode_message(message))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_international_formats() {
        assert_eq!(normalize_phone("+44 7700 900123", "44").unwrap(), "447700900123");
        assert_eq!(normalize_phone("0044 (7700) 900-123", "1").unwrap(), "447700900123");
        assert_eq!(normalize_phone("+1 415.555.0100", "44").unwrap(), "14155550100");
    }

    #[test]
    fn test_national_number_gets_default_country_code() {
        assert_eq!(normalize_phone("07700 900123", "44").unwrap(), "447700900123");
        assert_eq!(normalize_phone("07700 900123", "+44").unwrap(), "447700900123");
    }

    #[test]
    fn test_invalid_numbers() {
        assert_eq!(
            normalize_phone("07700 9001x3", "44"),
            Err(PhoneError::InvalidCharacter('x'))
        );
        assert_eq!(normalize_phone("+44 12", "44"), Err(PhoneError::InvalidLength(4)));
        assert_eq!(
            normalize_phone("+44 1234 5678 9012 3456", "44"),
            Err(PhoneError::InvalidLength(18))
        );
        assert!(normalize_phone("", "44").is_err());
    }

    #[test]
    fn test_click_to_chat_link() {
        let link = click_to_chat_link("447700900123", "Kick-off at 10:00 & bring shin pads + water");
        assert_eq!(
            link,
            "https://wa.me/447700900123?text=Kick-off%20at%2010%3A00%20%26%20bring%20shin%20pads%20%2B%20water"
        );
    }

    #[test]
    fn test_message_newlines_and_unicode() {
        assert_eq!(encode_message("Hi\nJosé"), "Hi%0AJos%C3%A9");
    }
}
