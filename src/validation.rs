use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{Client, ClientField};

pub const MAX_PHOTO_BYTES: usize = 5 * 1024 * 1024;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("valid email regex"));
static SIGNUP_EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid signup regex"));

/// Per-field messages keyed by form key (`clientName`, `photo`, ...).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationErrors(BTreeMap<&'static str, String>);

impl ValidationErrors {
    pub fn insert(&mut self, key: &'static str, message: impl Into<String>) {
        self.0.insert(key, message.into());
    }

    pub fn clear(&mut self, key: &str) {
        self.0.remove(key);
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// First message in form order, for the "Please fix: ..." notification.
    pub fn first(&self) -> Option<&str> {
        ClientField::ALL
            .iter()
            .map(|f| f.key())
            .chain(["photo", "name", "password"])
            .find_map(|k| self.get(k))
            .or_else(|| self.0.values().next().map(String::as_str))
    }
}

/// Whole years between `dob` and `today`. `None` for a date in the future.
pub fn compute_age(dob: NaiveDate, today: NaiveDate) -> Option<u32> {
    if dob > today {
        return None;
    }
    let mut age = today.year() - dob.year();
    if (today.month(), today.day()) < (dob.month(), dob.day()) {
        age -= 1;
    }
    u32::try_from(age).ok()
}

pub fn digits_only(input: &str) -> String {
    input.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Digits kept from phone input, capped at ten.
pub fn normalize_phone(input: &str) -> String {
    digits_only(input).chars().take(10).collect()
}

/// Display form of a phone number: `XXX-XXX-XXXX` once complete, partially grouped while typing.
pub fn format_phone(input: &str) -> String {
    let digits = normalize_phone(input);
    match digits.len() {
        0..=3 => digits,
        4..=6 => format!("{}-{}", &digits[..3], &digits[3..]),
        _ => format!("{}-{}-{}", &digits[..3], &digits[3..6], &digits[6..]),
    }
}

pub fn phone_error(digits: &str) -> Option<&'static str> {
    if digits.is_empty() {
        None
    } else if digits.len() != 10 {
        Some("Must be 10 digits")
    } else if !digits.starts_with(['6', '7', '8', '9']) {
        Some("Should start with 6-9")
    } else {
        None
    }
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email.trim())
}

/// Checks applied while a single field is being typed.
pub fn live_field_error(field: ClientField, value: &str) -> Option<String> {
    if value.is_empty() {
        return None;
    }
    if field.is_phone() {
        return phone_error(value).map(str::to_string);
    }
    if field.is_email() && !is_valid_email(value) {
        return Some("Invalid email format".to_string());
    }
    if field == ClientField::Age {
        return match value.trim().parse::<u32>() {
            Ok(age) if (1..=150).contains(&age) => None,
            _ => Some("Age must be between 1-150".to_string()),
        };
    }
    None
}

/// Full-form check run before create or update.
pub fn validate_client(client: &Client, has_photo: bool, today: NaiveDate) -> ValidationErrors {
    let mut errors = ValidationErrors::default();

    required_name(&mut errors, ClientField::ClientName, &client.client_name, "Client name");
    required_name(&mut errors, ClientField::FatherName, &client.father_name, "Father name");

    if client.gender.trim().is_empty() {
        errors.insert(ClientField::Gender.key(), "Please select gender");
    }

    if let Some(dob) = client.dob {
        if dob > today {
            errors.insert(ClientField::Dob.key(), "Date of birth cannot be in the future");
        }
    }

    match client.age {
        Some(age) if (1..=150).contains(&age) => {}
        _ => errors.insert(ClientField::Age.key(), "Please enter a valid age (1-150)"),
    }

    if client.contact.is_empty() {
        errors.insert(ClientField::Contact.key(), "Phone number is required");
    } else if client.contact.len() != 10 || !client.contact.chars().all(|c| c.is_ascii_digit()) {
        errors.insert(ClientField::Contact.key(), "Phone must be exactly 10 digits");
    } else if let Some(msg) = phone_error(&client.contact) {
        errors.insert(ClientField::Contact.key(), msg);
    }

    for field in [ClientField::FatherPhone, ClientField::MotherPhone, ClientField::SpousePhone] {
        if !field.applies_to(client) {
            continue;
        }
        if let Some(msg) = phone_error(&field.value(client)) {
            errors.insert(field.key(), msg);
        }
    }

    for field in [ClientField::Email, ClientField::FatherEmail, ClientField::MotherEmail, ClientField::SpouseEmail] {
        let value = field.value(client);
        if field.applies_to(client) && !value.trim().is_empty() && !is_valid_email(&value) {
            errors.insert(field.key(), "Please enter a valid email address");
        }
    }

    let address = client.address.trim();
    if !address.is_empty() && address.len() < 4 {
        errors.insert(ClientField::Address.key(), "Address should be more detailed");
    }

    if client.nationality.trim().is_empty() {
        errors.insert(ClientField::Nationality.key(), "Nationality is required");
    }

    if !client.family_members.trim().is_empty() {
        match client.family_members.trim().parse::<i64>() {
            Ok(n) if (0..=50).contains(&n) => {}
            _ => errors.insert(ClientField::FamilyMembers.key(), "Please enter a reasonable number (0-50)"),
        }
    }

    if client.is_married() && client.spouse_name.trim().is_empty() {
        errors.insert(ClientField::SpouseName.key(), "Spouse name is required");
    }

    if !has_photo {
        errors.insert("photo", "Photo is required");
    }

    errors
}

fn required_name(errors: &mut ValidationErrors, field: ClientField, value: &str, what: &str) {
    let value = value.trim();
    if value.is_empty() {
        errors.insert(field.key(), format!("{} is required", what));
    } else if value.chars().count() < 2 {
        errors.insert(field.key(), format!("{} must be at least 2 characters", what));
    }
}

pub fn validate_signup(name: &str, email: &str, password: &str) -> ValidationErrors {
    let mut errors = ValidationErrors::default();

    if name.trim().is_empty() {
        errors.insert("name", "Name is required");
    }

    if email.trim().is_empty() {
        errors.insert("email", "Email is required");
    } else if !SIGNUP_EMAIL_RE.is_match(email) {
        errors.insert("email", "Please enter a valid email");
    }

    if password.trim().is_empty() {
        errors.insert("password", "Password is required");
    } else if password.chars().count() < 6 {
        errors.insert("password", "Minimum 6 characters");
    }

    errors
}
