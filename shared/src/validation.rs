//! Validation utilities for the Partner Marketplace

use rust_decimal::Decimal;

/// Largest W-9 upload accepted, in bytes
pub const MAX_TAX_DOC_BYTES: usize = 10 * 1024 * 1024;

/// Largest price or sale amount accepted, in dollars
pub const MAX_AMOUNT_DOLLARS: i64 = 1_000_000_000;

/// Longest message body accepted
pub const MAX_MESSAGE_CHARS: usize = 5000;

// ============================================================================
// General Validations
// ============================================================================

/// Validate email format (basic check)
pub fn validate_email(email: &str) -> Result<(), &'static str> {
    let Some((local, domain)) = email.split_once('@') else {
        return Err("Invalid email format");
    };
    if local.is_empty() || !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.')
    {
        return Err("Invalid email format");
    }
    Ok(())
}

/// Validate password strength
pub fn validate_password(password: &str) -> Result<(), &'static str> {
    if password.len() < 8 {
        return Err("Password must be at least 8 characters");
    }
    Ok(())
}

/// Validate a phone number in local or international format.
/// Accepts: (555) 123-4567, 555-123-4567, +1 555 123 4567, +44 20 7946 0958
pub fn validate_phone(phone: &str) -> Result<(), &'static str> {
    if phone
        .chars()
        .any(|c| !(c.is_ascii_digit() || matches!(c, ' ' | '-' | '(' | ')' | '+' | '.')))
    {
        return Err("Phone number contains invalid characters");
    }
    let digits = phone.chars().filter(|c| c.is_ascii_digit()).count();
    if !(10..=15).contains(&digits) {
        return Err("Phone number must have 10 to 15 digits");
    }
    Ok(())
}

/// Validate an http(s) URL such as a website or logo
pub fn validate_url(url: &str) -> Result<(), &'static str> {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .ok_or("URL must start with http:// or https://")?;
    let host = rest.split(['/', '?', '#']).next().unwrap_or("");
    if host.is_empty() || !host.contains('.') || host.contains(' ') {
        return Err("URL must include a valid host");
    }
    Ok(())
}

/// Validate a booking link; only https is accepted
pub fn validate_calendar_link(url: &str) -> Result<(), &'static str> {
    if !url.starts_with("https://") {
        return Err("Calendar link must use https://");
    }
    validate_url(url)
}

// ============================================================================
// Marketplace Validations
// ============================================================================

/// Validate commission percent is in (0, 100]
pub fn validate_commission_percent(percent: Decimal) -> Result<(), &'static str> {
    if percent <= Decimal::ZERO || percent > Decimal::ONE_HUNDRED {
        return Err("Commission percent must be greater than 0 and at most 100");
    }
    Ok(())
}

/// Validate a price or sale amount is not negative and not absurdly large
pub fn validate_amount(amount: Decimal) -> Result<(), &'static str> {
    if amount < Decimal::ZERO {
        return Err("Amount cannot be negative");
    }
    if amount > Decimal::from(MAX_AMOUNT_DOLLARS) {
        return Err("Amount cannot exceed 1,000,000,000");
    }
    Ok(())
}

/// Validate a short code: ASCII alphanumeric, 6 to 16 characters
pub fn validate_short_code(code: &str) -> Result<(), &'static str> {
    if !(6..=16).contains(&code.len()) {
        return Err("Code must be 6 to 16 characters");
    }
    if !code.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err("Code must be alphanumeric");
    }
    Ok(())
}

/// Validate a chat message body
pub fn validate_message_body(body: &str) -> Result<(), &'static str> {
    if body.trim().is_empty() {
        return Err("Message cannot be empty");
    }
    if body.chars().count() > MAX_MESSAGE_CHARS {
        return Err("Message is too long");
    }
    Ok(())
}

/// Validate a W-9 upload: PDF content type and size limit
pub fn validate_tax_document(content_type: &str, size: usize) -> Result<(), &'static str> {
    if content_type != "application/pdf" {
        return Err("Tax documents must be PDF files");
    }
    if size == 0 {
        return Err("Tax document is empty");
    }
    if size > MAX_TAX_DOC_BYTES {
        return Err("Tax document exceeds 10 MB");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_validate_email() {
        assert!(validate_email("test@example.com").is_ok());
        assert!(validate_email("user.name@domain.co.uk").is_ok());
        assert!(validate_email("invalid").is_err());
        assert!(validate_email("no@domain").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("a@.com").is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("password123").is_ok());
        assert!(validate_password("short").is_err());
    }

    #[test]
    fn test_validate_phone() {
        assert!(validate_phone("(555) 123-4567").is_ok());
        assert!(validate_phone("+1 555 123 4567").is_ok());
        assert!(validate_phone("+44 20 7946 0958").is_ok());
        assert!(validate_phone("12345").is_err());
        assert!(validate_phone("555-CALL-NOW").is_err());
    }

    #[test]
    fn test_validate_url() {
        assert!(validate_url("https://example.com").is_ok());
        assert!(validate_url("http://example.com/path?q=1").is_ok());
        assert!(validate_url("example.com").is_err());
        assert!(validate_url("https://localhost").is_err());
    }

    #[test]
    fn test_validate_calendar_link() {
        assert!(validate_calendar_link("https://calendly.com/acme/intro").is_ok());
        assert!(validate_calendar_link("http://calendly.com/acme/intro").is_err());
    }

    #[test]
    fn test_validate_commission_percent() {
        assert!(validate_commission_percent(Decimal::from(100)).is_ok());
        assert!(validate_commission_percent(Decimal::from_str("0.5").unwrap()).is_ok());
        assert!(validate_commission_percent(Decimal::ZERO).is_err());
        assert!(validate_commission_percent(Decimal::from(101)).is_err());
    }

    #[test]
    fn test_validate_amount_bounds() {
        assert!(validate_amount(Decimal::ZERO).is_ok());
        assert!(validate_amount(Decimal::from(MAX_AMOUNT_DOLLARS)).is_ok());
        assert!(validate_amount(Decimal::from(-1)).is_err());
        assert!(validate_amount(Decimal::from(MAX_AMOUNT_DOLLARS) + Decimal::ONE).is_err());
        assert!(validate_amount(Decimal::MAX).is_err());
    }

    #[test]
    fn test_validate_short_code() {
        assert!(validate_short_code("aB3dE5fG").is_ok());
        assert!(validate_short_code("abc").is_err());
        assert!(validate_short_code("abc-1234").is_err());
    }

    #[test]
    fn test_validate_message_body() {
        assert!(validate_message_body("hi there").is_ok());
        assert!(validate_message_body("   ").is_err());
        assert!(validate_message_body(&"x".repeat(MAX_MESSAGE_CHARS + 1)).is_err());
    }

    #[test]
    fn test_validate_tax_document() {
        assert!(validate_tax_document("application/pdf", 2048).is_ok());
        assert!(validate_tax_document("image/png", 2048).is_err());
        assert!(validate_tax_document("application/pdf", 0).is_err());
        assert!(validate_tax_document("application/pdf", MAX_TAX_DOC_BYTES + 1).is_err());
    }
}
