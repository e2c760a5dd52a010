//! Checkout form validation.
//!
//! Validation is a pure function of the entered text. Each field is checked on
//! its own and reports only the first rule it breaks.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use thiserror::Error;

use crate::model::{ContactInfo, Field};

const NAME_MIN_CHARS: usize = 3;
const PHONE_PREFIX: &str = "01";
const PHONE_DIGITS: usize = 11;
const ADDRESS_MIN_CHARS: usize = 20;

/// Why a single field is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("{0} is required")]
    Required(Field),

    #[error("name must be at least 3 characters")]
    NameTooShort,

    #[error("phone number must contain digits only")]
    PhoneNotDigits,
    #[error("phone number must start with 01")]
    PhonePrefix,
    #[error("phone number must be exactly 11 digits")]
    PhoneLength,

    #[error("email address must look like name@example.com")]
    EmailFormat,

    #[error("address must be at least 20 characters")]
    AddressTooShort,
    #[error("address must separate area and district with a comma")]
    AddressStructure,
}

/// Errors keyed by field. A field without an entry is valid.
///
/// Ordered so that iteration and `Display` are identical for identical input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<Field, FieldError>);

impl FieldErrors {
    pub fn is_valid(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: Field) -> Option<FieldError> {
        self.0.get(&field).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, FieldError)> + '_ {
        self.0.iter().map(|(field, err)| (*field, *err))
    }

    /// Only the errors a user should see: fields they have already left.
    pub fn visible(&self, touched: &BTreeSet<Field>) -> FieldErrors {
        FieldErrors(
            self.0
                .iter()
                .filter(|(field, _)| touched.contains(field))
                .map(|(field, err)| (*field, *err))
                .collect(),
        )
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (field, err)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {err}")?;
        }
        Ok(())
    }
}

/// Validate every field of the form.
pub fn validate(contact: &ContactInfo) -> FieldErrors {
    FieldErrors(
        Field::ALL
            .into_iter()
            .filter_map(|field| validate_field(field, contact.get(field)).map(|e| (field, e)))
            .collect(),
    )
}

/// Validate one field's raw text; `None` means valid.
pub fn validate_field(field: Field, value: &str) -> Option<FieldError> {
    let result = match field {
        Field::Name => check_name(value),
        Field::Phone => check_phone(value),
        Field::Email => check_email(value),
        Field::Address => check_address(value),
    };
    result.err()
}

fn check_name(value: &str) -> Result<(), FieldError> {
    let name = value.trim();
    if name.is_empty() {
        return Err(FieldError::Required(Field::Name));
    }
    if name.chars().count() < NAME_MIN_CHARS {
        return Err(FieldError::NameTooShort);
    }
    Ok(())
}

fn check_phone(value: &str) -> Result<(), FieldError> {
    let phone: String = value.chars().filter(|c| !c.is_whitespace()).collect();
    if phone.is_empty() {
        return Err(FieldError::Required(Field::Phone));
    }
    if !phone.chars().all(|c| c.is_ascii_digit()) {
        return Err(FieldError::PhoneNotDigits);
    }
    if !phone.starts_with(PHONE_PREFIX) {
        return Err(FieldError::PhonePrefix);
    }
    if phone.len() != PHONE_DIGITS {
        return Err(FieldError::PhoneLength);
    }
    Ok(())
}

// Optional: blank is fine.
fn check_email(value: &str) -> Result<(), FieldError> {
    let email = value.trim();
    if email.is_empty() {
        return Ok(());
    }
    if is_email_shaped(email) {
        Ok(())
    } else {
        Err(FieldError::EmailFormat)
    }
}

/// `local@domain.tld`: one `@`, no whitespace, dotted domain, TLD of two or more letters.
fn is_email_shaped(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 || labels.iter().any(|label| label.is_empty()) {
        return false;
    }
    labels
        .last()
        .is_some_and(|tld| tld.len() >= 2 && tld.chars().all(char::is_alphabetic))
}

fn check_address(value: &str) -> Result<(), FieldError> {
    let address = value.trim();
    if address.is_empty() {
        return Err(FieldError::Required(Field::Address));
    }
    if address.chars().count() < ADDRESS_MIN_CHARS {
        return Err(FieldError::AddressTooShort);
    }
    let parts = address.split(',').filter(|part| !part.trim().is_empty()).count();
    if parts < 2 {
        return Err(FieldError::AddressStructure);
    }
    Ok(())
}
