//! Validation utilities for the Taskboard platform

// ============================================================================
// Account Validations
// ============================================================================

/// Validate email format
pub fn validate_email(email: &str) -> Result<(), &'static str> {
    let email = email.trim();
    let Some((local, domain)) = email.split_once('@') else {
        return Err("Invalid email format");
    };
    if local.is_empty() || domain.contains('@') {
        return Err("Invalid email format");
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) if !host.is_empty() && tld.len() >= 2 => Ok(()),
        _ => Err("Invalid email format"),
    }
}

/// Validate password strength (minimum 8 characters)
pub fn validate_password(password: &str) -> Result<(), &'static str> {
    if password.len() < 8 {
        return Err("Password must be at least 8 characters");
    }
    Ok(())
}

/// Validate a person's display name
pub fn validate_full_name(name: &str) -> Result<(), &'static str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err("Full name is required");
    }
    if trimmed.chars().count() > 100 {
        return Err("Full name must be at most 100 characters");
    }
    Ok(())
}

/// Validate a lock-panel PIN: 4 to 6 ASCII digits
pub fn validate_lock_pin(pin: &str) -> Result<(), &'static str> {
    let len_ok = (4..=6).contains(&pin.len());
    if !len_ok || !pin.chars().all(|c| c.is_ascii_digit()) {
        return Err("PIN must be 4-6 digits");
    }
    Ok(())
}

/// Validate a one-time password: exactly six digits in 100000..=999999
pub fn validate_otp_code(code: i32) -> Result<(), &'static str> {
    if !(100_000..=999_999).contains(&code) {
        return Err("OTP must be a 6-digit code");
    }
    Ok(())
}

// ============================================================================
// Board Validations
// ============================================================================

/// Validate a board, list, card or workspace title
pub fn validate_title(title: &str) -> Result<(), &'static str> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err("Title is required");
    }
    if trimmed.chars().count() > 200 {
        return Err("Title must be at most 200 characters");
    }
    Ok(())
}

/// Validate a board background: a `#rrggbb` colour or an http(s) image URL
pub fn validate_background(background: &str) -> Result<(), &'static str> {
    if let Some(hex) = background.strip_prefix('#') {
        if (hex.len() == 6 || hex.len() == 3) && hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Ok(());
        }
        return Err("Background colour must be a hex value");
    }
    if background.starts_with("https://") || background.starts_with("http://") {
        return Ok(());
    }
    Err("Background must be a hex colour or image URL")
}

/// Validate a comment body
pub fn validate_comment(message: &str) -> Result<(), &'static str> {
    if message.trim().is_empty() {
        return Err("Comment message is required");
    }
    if message.chars().count() > 5000 {
        return Err("Comment must be at most 5000 characters");
    }
    Ok(())
}

// ============================================================================
// Commerce Validations
// ============================================================================

/// Validate a requested cart quantity
pub fn validate_quantity(quantity: i32) -> Result<(), &'static str> {
    if quantity < 1 {
        return Err("Quantity must be at least 1");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email_valid() {
        assert!(validate_email("test@example.com").is_ok());
        assert!(validate_email("user.name@domain.co.uk").is_ok());
    }

    #[test]
    fn test_validate_email_invalid() {
        assert!(validate_email("invalid").is_err());
        assert!(validate_email("no@domain").is_err());
        assert!(validate_email("@.").is_err());
        assert!(validate_email("a@b@c.com").is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("password123").is_ok());
        assert!(validate_password("12345678").is_ok());
        assert!(validate_password("short").is_err());
    }

    #[test]
    fn test_validate_lock_pin() {
        assert!(validate_lock_pin("1234").is_ok());
        assert!(validate_lock_pin("123456").is_ok());
        assert!(validate_lock_pin("123").is_err());
        assert!(validate_lock_pin("1234567").is_err());
        assert!(validate_lock_pin("12a4").is_err());
        assert!(validate_lock_pin("").is_err());
    }

    #[test]
    fn test_validate_otp_code() {
        assert!(validate_otp_code(100000).is_ok());
        assert!(validate_otp_code(999999).is_ok());
        assert!(validate_otp_code(99999).is_err());
        assert!(validate_otp_code(1000000).is_err());
    }

    #[test]
    fn test_validate_title() {
        assert!(validate_title("Sprint 12").is_ok());
        assert!(validate_title("   ").is_err());
        assert!(validate_title(&"x".repeat(201)).is_err());
    }

    #[test]
    fn test_validate_background() {
        assert!(validate_background("#ffffff").is_ok());
        assert!(validate_background("#0af").is_ok());
        assert!(validate_background("https://cdn.example.com/bg.png").is_ok());
        assert!(validate_background("#zzzzzz").is_err());
        assert!(validate_background("blue").is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-3).is_err());
    }
}
