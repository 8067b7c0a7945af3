use bigdecimal::BigDecimal;
use std::fmt;

pub const NAME_MAX_LEN: usize = 64;
pub const PHONE_MAX_LEN: usize = 16;
pub const ADDRESS_MAX_LEN: usize = 64;
pub const NOTE_MAX_LEN: usize = 120;
pub const AMOUNT_INPUT_MAX_LEN: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
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

pub type ValidationResult = Result<(), ValidationError>;

pub fn sanitize_string(value: &str) -> String {
    value
        .chars()
        .filter(|ch| !ch.is_control())
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn validate_required(field: &'static str, value: &str) -> ValidationResult {
    if value.trim().is_empty() {
        return Err(ValidationError::new(field, "must not be empty"));
    }

    Ok(())
}

pub fn validate_max_len(field: &'static str, value: &str, max_len: usize) -> ValidationResult {
    if value.len() > max_len {
        return Err(ValidationError::new(
            field,
            format!("must be at most {} characters", max_len),
        ));
    }

    Ok(())
}

/// Payment addresses look like `alice@pulse`: a local part and a provider
/// tag separated by exactly one `@`, lowercase alphanumerics plus `.` `_` `-`.
pub fn validate_payment_address(address: &str) -> ValidationResult {
    let address = sanitize_string(address);
    validate_required("address", &address)?;
    validate_max_len("address", &address, ADDRESS_MAX_LEN)?;

    let mut parts = address.split('@');
    let (local, provider) = match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(provider), None) => (local, provider),
        _ => {
            return Err(ValidationError::new(
                "address",
                "must contain exactly one '@'",
            ))
        }
    };

    let valid_part = |part: &str| {
        !part.is_empty()
            && part
                .chars()
                .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || "._-".contains(ch))
    };

    if !valid_part(local) || !valid_part(provider) {
        return Err(ValidationError::new(
            "address",
            "must use lowercase letters, digits, '.', '_' or '-'",
        ));
    }

    Ok(())
}

pub fn validate_phone(phone: &str) -> ValidationResult {
    let phone = sanitize_string(phone);
    validate_required("phone", &phone)?;
    validate_max_len("phone", &phone, PHONE_MAX_LEN)?;

    if !phone.chars().all(|ch| ch.is_ascii_digit()) {
        return Err(ValidationError::new("phone", "must contain only digits"));
    }

    Ok(())
}

pub fn validate_display_name(name: &str) -> ValidationResult {
    let name = sanitize_string(name);
    validate_required("name", &name)?;
    validate_max_len("name", &name, NAME_MAX_LEN)
}

pub fn validate_note(note: &str) -> ValidationResult {
    validate_max_len("note", note, NOTE_MAX_LEN)
}

/// Parses a caller-supplied amount into an exact decimal. Accepts plain
/// decimal notation with at most two fraction digits; rejects signs,
/// exponents and zero. The string form is checked before parsing so that
/// sub-minor-unit amounts fail here instead of being rounded silently.
pub fn parse_amount(raw: &str) -> Result<BigDecimal, ValidationError> {
    let raw = sanitize_string(raw);
    validate_required("amount", &raw)?;
    validate_max_len("amount", &raw, AMOUNT_INPUT_MAX_LEN)?;

    let (whole, fraction) = match raw.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (raw.as_str(), ""),
    };

    let digits_only = |part: &str| part.chars().all(|ch| ch.is_ascii_digit());
    if whole.is_empty() || !digits_only(whole) || !digits_only(fraction) || fraction.len() > 2 {
        return Err(ValidationError::new(
            "amount",
            "must be a positive decimal with at most two fraction digits",
        ));
    }

    let amount: BigDecimal = raw
        .parse()
        .map_err(|_| ValidationError::new("amount", "is not a valid decimal"))?;

    if amount <= BigDecimal::from(0) {
        return Err(ValidationError::new("amount", "must be greater than zero"));
    }

    Ok(amount.with_scale(2))
}
