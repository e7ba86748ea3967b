use url::Url;
use validator::ValidateEmail;

/// Validates that the input looks like a valid email address
pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    !email.is_empty() && email.validate_email()
}

/// ISO-4217 style currency code: exactly three ASCII letters.
pub fn is_valid_currency(code: &str) -> bool {
    code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic())
}

/// Card tails are display-only but still have to look like one.
pub fn is_valid_last_four(digits: &str) -> bool {
    digits.len() == 4 && digits.chars().all(|c| c.is_ascii_digit())
}

/// Human-facing labels (payment method names, subscription names, share
/// placeholder names): non-blank, bounded.
pub fn is_valid_label(name: &str) -> bool {
    let trimmed = name.trim();
    !trimmed.is_empty() && trimmed.len() <= 120
}

/// Subscription websites: absolute http(s) URLs only.
pub fn is_valid_url(raw: &str) -> bool {
    match Url::parse(raw) {
        Ok(url) => matches!(url.scheme(), "http" | "https"),
        Err(_) => false,
    }
}
