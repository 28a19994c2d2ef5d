//! User-input validation for the admin wizards and the checkout flow.
//!
//! Everything a user types during a multi-step flow passes through here
//! before it reaches storage; invalid input re-prompts without advancing
//! the dialog state.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::core::config;
use crate::core::error::AppError;

/// Validation errors
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Price could not be parsed as a positive decimal amount
    #[error("Please enter a price like 99 or 99.50")]
    InvalidPrice(String),

    /// Title empty or too long
    #[error("Title must be 1-{max} characters")]
    InvalidTitle { max: usize },

    /// Description too long
    #[error("Description must be at most {max} characters")]
    InvalidDescription { max: usize },

    /// Shipping address empty or too long
    #[error("Address must be 1-{max} characters")]
    InvalidAddress { max: usize },

    /// Phone number does not look like a phone number
    #[error("Please enter a phone number like +66 81 234 5678")]
    InvalidPhone(String),

    /// Image reference is not an http(s) URL
    #[error("Image must be an http(s) link, or send - to skip")]
    InvalidImageUrl(String),
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation(err.to_string())
    }
}

static PHONE_RE: Lazy<Regex> = Lazy::new(|| {
    // Digits with optional leading + and common separators, 7-20 chars
    #[allow(clippy::unwrap_used)]
    Regex::new(r"^\+?[0-9][0-9 ()\-]{5,18}[0-9]$").unwrap()
});

/// Parses a price entered by an admin into the smallest currency unit.
///
/// Accepts a plain integer ("99") or a decimal with up to two places
/// ("99.50"); the result is cents. Zero and negative amounts are rejected.
pub fn parse_price(input: &str) -> Result<i64, ValidationError> {
    let trimmed = input.trim().trim_start_matches('$');
    let invalid = || ValidationError::InvalidPrice(input.to_string());

    let (whole, frac) = match trimmed.split_once('.') {
        Some((w, f)) => (w, f),
        None => (trimmed, ""),
    };

    if whole.is_empty() || !whole.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    if frac.len() > 2 || !frac.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }

    let whole: i64 = whole.parse().map_err(|_| invalid())?;
    let cents_frac: i64 = match frac.len() {
        0 => 0,
        1 => frac.parse::<i64>().map_err(|_| invalid())? * 10,
        _ => frac.parse().map_err(|_| invalid())?,
    };

    let cents = whole.checked_mul(100).and_then(|w| w.checked_add(cents_frac)).ok_or_else(invalid)?;
    if cents <= 0 {
        return Err(invalid());
    }
    Ok(cents)
}

/// Validates a product or category title.
pub fn validate_title(input: &str) -> Result<String, ValidationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() || trimmed.chars().count() > config::catalog::MAX_TITLE_LEN {
        return Err(ValidationError::InvalidTitle {
            max: config::catalog::MAX_TITLE_LEN,
        });
    }
    Ok(trimmed.to_string())
}

/// Validates a product description.
pub fn validate_description(input: &str) -> Result<String, ValidationError> {
    let trimmed = input.trim();
    if trimmed.chars().count() > config::catalog::MAX_DESCRIPTION_LEN {
        return Err(ValidationError::InvalidDescription {
            max: config::catalog::MAX_DESCRIPTION_LEN,
        });
    }
    Ok(trimmed.to_string())
}

/// Validates a shipping address.
pub fn validate_address(input: &str) -> Result<String, ValidationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() || trimmed.chars().count() > config::checkout::MAX_ADDRESS_LEN {
        return Err(ValidationError::InvalidAddress {
            max: config::checkout::MAX_ADDRESS_LEN,
        });
    }
    Ok(trimmed.to_string())
}

/// Validates a contact phone number.
pub fn validate_phone(input: &str) -> Result<String, ValidationError> {
    let trimmed = input.trim();
    if !PHONE_RE.is_match(trimmed) {
        return Err(ValidationError::InvalidPhone(input.to_string()));
    }
    Ok(trimmed.to_string())
}

/// Validates an image reference: an http(s) URL, or `-` meaning no image.
pub fn validate_image_ref(input: &str) -> Result<Option<String>, ValidationError> {
    let trimmed = input.trim();
    if trimmed == "-" {
        return Ok(None);
    }
    match url::Url::parse(trimmed) {
        Ok(parsed) if parsed.scheme() == "http" || parsed.scheme() == "https" => Ok(Some(trimmed.to_string())),
        _ => Err(ValidationError::InvalidImageUrl(input.to_string())),
    }
}

/// Derives a slug id from a title: lowercase ASCII alphanumerics joined
/// by underscores ("Royal Haze" -> "royal_haze").
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut last_was_sep = true;
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_was_sep = false;
        } else if !last_was_sep {
            slug.push('_');
            last_was_sep = true;
        }
    }
    while slug.ends_with('_') {
        slug.pop();
    }
    if slug.is_empty() {
        slug.push_str("item");
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_whole_and_decimal_prices() {
        assert_eq!(parse_price("99").ok(), Some(9900));
        assert_eq!(parse_price("99.5").ok(), Some(9950));
        assert_eq!(parse_price("99.50").ok(), Some(9950));
        assert_eq!(parse_price("$13.00").ok(), Some(1300));
        assert_eq!(parse_price(" 5 ").ok(), Some(500));
    }

    #[test]
    fn rejects_junk_prices() {
        assert!(parse_price("free").is_err());
        assert!(parse_price("-5").is_err());
        assert!(parse_price("0").is_err());
        assert!(parse_price("1.999").is_err());
        assert!(parse_price("").is_err());
    }

    #[test]
    fn phone_validation() {
        assert!(validate_phone("+66 81 234 5678").is_ok());
        assert!(validate_phone("0812345678").is_ok());
        assert!(validate_phone("call me maybe").is_err());
        assert!(validate_phone("123").is_err());
    }

    #[test]
    fn image_ref_accepts_skip_marker() {
        assert_eq!(validate_image_ref("-").ok(), Some(None));
        assert!(validate_image_ref("https://i.ibb.co/x/p.jpg").is_ok());
        assert!(validate_image_ref("ftp://nope").is_err());
        assert!(validate_image_ref("not a url").is_err());
    }

    #[test]
    fn slugs_are_stable_and_safe() {
        assert_eq!(slugify("Royal Haze"), "royal_haze");
        assert_eq!(slugify("  Premium  Thai!  "), "premium_thai");
        assert_eq!(slugify("🔥🔥🔥"), "item");
    }
}
