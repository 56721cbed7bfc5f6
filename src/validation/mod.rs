use std::fmt;

pub const POSTAL_CODE_LEN: usize = 8;
pub const TAX_ID_LEN: usize = 11;
pub const STATE_CODE_LEN: usize = 2;
pub const TEXT_MAX_LEN: usize = 255;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

pub type ValidationResult<T = ()> = Result<T, ValidationError>;

pub fn sanitize_string(value: &str) -> String {
    value
        .chars()
        .filter(|ch| !ch.is_control())
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn digits_only(value: &str) -> String {
    value.chars().filter(char::is_ascii_digit).collect()
}

pub fn validate_required(field: &str, value: &str) -> ValidationResult {
    if value.trim().is_empty() {
        return Err(ValidationError::new(field, "must not be empty"));
    }

    Ok(())
}

pub fn validate_max_len(field: &str, value: &str, max_len: usize) -> ValidationResult {
    if value.chars().count() > max_len {
        return Err(ValidationError::new(
            field,
            format!("must be at most {} characters", max_len),
        ));
    }

    Ok(())
}

pub fn validate_len(field: &str, value: &str, min: usize, max: usize) -> ValidationResult {
    let len = value.chars().count();
    if len < min || len > max {
        let message = if min == max {
            format!("must be exactly {} characters", min)
        } else {
            format!("must be between {} and {} characters", min, max)
        };
        return Err(ValidationError::new(field, message));
    }

    Ok(())
}

/// Sanitizes a required free-text field and returns the cleaned value.
pub fn required_text(field: &str, value: &str) -> ValidationResult<String> {
    let value = sanitize_string(value);
    validate_required(field, &value)?;
    validate_max_len(field, &value, TEXT_MAX_LEN)?;
    Ok(value)
}

/// Postal codes arrive as `12345-678` or `12345678`; only the digits are kept.
pub fn validate_postal_code(field: &str, value: &str) -> ValidationResult<String> {
    let value = sanitize_string(value);
    validate_len(field, &value, POSTAL_CODE_LEN, POSTAL_CODE_LEN + 1)?;

    let digits = digits_only(&value);
    if digits.len() != POSTAL_CODE_LEN {
        return Err(ValidationError::new(
            field,
            format!("must contain {} digits", POSTAL_CODE_LEN),
        ));
    }

    Ok(digits)
}

pub fn validate_tax_id(field: &str, value: &str) -> ValidationResult<String> {
    let value = sanitize_string(value);
    validate_len(field, &value, TAX_ID_LEN, TAX_ID_LEN)?;

    if !value.chars().all(|ch| ch.is_ascii_digit()) {
        return Err(ValidationError::new(field, "must contain only digits"));
    }

    Ok(value)
}

pub fn validate_phone(field: &str, value: &str) -> ValidationResult<String> {
    let value = sanitize_string(value);
    let digits = digits_only(&value);
    validate_len(field, &digits, 10, 11)?;
    Ok(digits)
}

pub fn validate_state_code(field: &str, value: &str) -> ValidationResult<String> {
    let value = sanitize_string(value);
    validate_len(field, &value, STATE_CODE_LEN, STATE_CODE_LEN)?;

    if !value.chars().all(|ch| ch.is_ascii_alphabetic()) {
        return Err(ValidationError::new(field, "must contain only letters"));
    }

    Ok(value.to_ascii_uppercase())
}

pub fn validate_email(field: &str, value: &str) -> ValidationResult<String> {
    let value = sanitize_string(value);
    validate_required(field, &value)?;
    validate_max_len(field, &value, TEXT_MAX_LEN)?;

    let valid = match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && !value.contains(' ')
                && domain
                    .split_once('.')
                    .map(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'))
                    .unwrap_or(false)
        }
        None => false,
    };

    if !valid {
        return Err(ValidationError::new(field, "must be a valid email address"));
    }

    Ok(value)
}
