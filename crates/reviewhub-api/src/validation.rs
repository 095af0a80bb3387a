//! Collected, field-keyed request validation
//!
//! Every operation validates against an explicit allow-list of fields and
//! reports all problems of a request in one pass: errors are keyed by field
//! name, cross-field errors live under `non_field_errors`, and company
//! sub-errors are nested under `company`. Unknown or server-derived fields
//! in the input are an error, never silently dropped.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};
use validator::{ValidateEmail, ValidateUrl};

use crate::models::{CompanyPayload, CreateReviewRequest};

pub const NON_FIELD_ERRORS: &str = "non_field_errors";

const REQUIRED: &str = "This field is required.";
const BLANK: &str = "This field may not be blank.";
const NOT_A_STRING: &str = "Not a valid string.";
const NOT_AN_INTEGER: &str = "A valid integer is required.";
const NOT_ALLOWED: &str = "This field is not allowed.";
const NOT_AN_OBJECT: &str = "Invalid data. Expected an object.";

/// Value under one key of the error map: either a list of messages or, for
/// a nested payload, its own field-to-messages map.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum FieldErrorValue {
    Messages(Vec<String>),
    Nested(BTreeMap<String, Vec<String>>),
}

/// Field-keyed error map returned with HTTP 400
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationErrors(pub BTreeMap<String, FieldErrorValue>);

impl ValidationErrors {
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        match self
            .0
            .entry(field.into())
            .or_insert_with(|| FieldErrorValue::Messages(Vec::new()))
        {
            FieldErrorValue::Messages(messages) => messages.push(message.into()),
            // A field never carries both direct messages and a sub-map
            FieldErrorValue::Nested(_) => {}
        }
    }

    /// Attach another error map as the nested errors of `parent`
    pub fn add_nested(&mut self, parent: impl Into<String>, sub: ValidationErrors) {
        let mut nested = BTreeMap::new();
        for (field, value) in sub.0 {
            if let FieldErrorValue::Messages(messages) = value {
                nested.insert(field, messages);
            }
        }
        self.0.insert(parent.into(), FieldErrorValue::Nested(nested));
    }

    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::default();
        errors.add(field, message);
        errors
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Validated sign-up data; `confirm_password` is already consumed and the
/// optional last name resolved to its empty-string default.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

/// Validated login credentials
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

pub fn validate_sign_up(payload: &Value) -> Result<NewUser, ValidationErrors> {
    let obj = as_object(payload)?;
    let mut errors = ValidationErrors::default();

    reject_unknown(
        obj,
        &[
            "email",
            "first_name",
            "last_name",
            "password",
            "confirm_password",
        ],
        &mut errors,
    );

    let email = match string_field(obj, "email", &mut errors) {
        // 254 is the longest address that can appear in an envelope
        Some(email) if email.chars().count() <= 254 && email.as_str().validate_email() => {
            Some(email)
        }
        Some(_) => {
            errors.add("email", "Enter a valid email address.");
            None
        }
        None => None,
    };

    let first_name = bounded_string(obj, "first_name", 150, &mut errors);

    let last_name = match obj.get("last_name") {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) if s.chars().count() > 150 => {
            errors.add(
                "last_name",
                "Ensure this field has no more than 150 characters.",
            );
            String::new()
        }
        Some(Value::String(s)) => s.clone(),
        Some(_) => {
            errors.add("last_name", NOT_A_STRING);
            String::new()
        }
    };

    let password = match string_field(obj, "password", &mut errors) {
        Some(password) => {
            let mut strong = true;
            if password.chars().count() < 8 {
                errors.add(
                    "password",
                    "This password is too short. It must contain at least 8 characters.",
                );
                strong = false;
            }
            if password.chars().all(|c| c.is_ascii_digit()) {
                errors.add("password", "This password is entirely numeric.");
                strong = false;
            }
            strong.then_some(password)
        }
        None => None,
    };

    let confirm_password = string_field(obj, "confirm_password", &mut errors);

    // Compared only once both sides passed their own field-level checks
    if let (Some(password), Some(confirm_password)) = (&password, &confirm_password) {
        if password != confirm_password {
            errors.add(NON_FIELD_ERRORS, "The passwords must be the same.");
        }
    }

    match (email, first_name, password) {
        (Some(email), Some(first_name), Some(password)) if errors.is_empty() => Ok(NewUser {
            email,
            first_name,
            last_name,
            password,
        }),
        _ => Err(errors),
    }
}

pub fn validate_login(payload: &Value) -> Result<Credentials, ValidationErrors> {
    let obj = as_object(payload)?;
    let mut errors = ValidationErrors::default();

    reject_unknown(obj, &["email", "password"], &mut errors);

    let email = string_field(obj, "email", &mut errors);
    let password = string_field(obj, "password", &mut errors);

    match (email, password) {
        (Some(email), Some(password)) if errors.is_empty() => Ok(Credentials { email, password }),
        _ => Err(errors),
    }
}

pub fn validate_review(payload: &Value) -> Result<CreateReviewRequest, ValidationErrors> {
    let obj = as_object(payload)?;
    let mut errors = ValidationErrors::default();

    // ip_address, reviewer and submission_date are server-derived, so they
    // fall out of the allow-list like any other unknown key
    reject_unknown(obj, &["rating", "title", "summary", "company"], &mut errors);

    let rating = match integer_field(obj, "rating", &mut errors) {
        Some(rating) if rating < 1 => {
            errors.add("rating", "Ensure this value is greater than or equal to 1.");
            None
        }
        Some(rating) if rating > 5 => {
            errors.add("rating", "Ensure this value is less than or equal to 5.");
            None
        }
        Some(rating) => Some(rating as i32),
        None => None,
    };

    let title = bounded_string(obj, "title", 64, &mut errors);
    let summary = bounded_string(obj, "summary", 10000, &mut errors);

    let company = match obj.get("company") {
        None | Some(Value::Null) => {
            errors.add("company", REQUIRED);
            None
        }
        Some(value) => match validate_company(value) {
            Ok(company) => Some(company),
            Err(sub) => {
                errors.add_nested("company", sub);
                None
            }
        },
    };

    match (rating, title, summary, company) {
        (Some(rating), Some(title), Some(summary), Some(company)) if errors.is_empty() => {
            Ok(CreateReviewRequest {
                rating,
                title,
                summary,
                company,
            })
        }
        _ => Err(errors),
    }
}

fn validate_company(value: &Value) -> Result<CompanyPayload, ValidationErrors> {
    let obj = as_object(value)?;
    let mut errors = ValidationErrors::default();

    reject_unknown(obj, &["name", "company_id", "website"], &mut errors);

    let name = bounded_string(obj, "name", 64, &mut errors);
    let company_id = integer_field(obj, "company_id", &mut errors);

    let website = match obj.get("website") {
        None | Some(Value::Null) => None,
        // Blank website counts as absent
        Some(Value::String(s)) if s.is_empty() => None,
        Some(Value::String(s)) => {
            if !s.as_str().validate_url() {
                errors.add("website", "Enter a valid URL.");
                None
            } else if s.chars().count() > 200 {
                errors.add(
                    "website",
                    "Ensure this field has no more than 200 characters.",
                );
                None
            } else {
                Some(s.clone())
            }
        }
        Some(_) => {
            errors.add("website", NOT_A_STRING);
            None
        }
    };

    match (name, company_id) {
        (Some(name), Some(company_id)) if errors.is_empty() => Ok(CompanyPayload {
            name,
            company_id,
            website,
        }),
        _ => Err(errors),
    }
}

fn as_object(payload: &Value) -> Result<&Map<String, Value>, ValidationErrors> {
    payload
        .as_object()
        .ok_or_else(|| ValidationErrors::single(NON_FIELD_ERRORS, NOT_AN_OBJECT))
}

fn reject_unknown(obj: &Map<String, Value>, allowed: &[&str], errors: &mut ValidationErrors) {
    for key in obj.keys() {
        if !allowed.contains(&key.as_str()) {
            errors.add(key.as_str(), NOT_ALLOWED);
        }
    }
}

/// Required non-blank string field
fn string_field(obj: &Map<String, Value>, key: &str, errors: &mut ValidationErrors) -> Option<String> {
    match obj.get(key) {
        None | Some(Value::Null) => {
            errors.add(key, REQUIRED);
            None
        }
        Some(Value::String(s)) if s.is_empty() => {
            errors.add(key, BLANK);
            None
        }
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => {
            errors.add(key, NOT_A_STRING);
            None
        }
    }
}

/// Required string field with a maximum length in characters
fn bounded_string(
    obj: &Map<String, Value>,
    key: &str,
    max_chars: usize,
    errors: &mut ValidationErrors,
) -> Option<String> {
    let value = string_field(obj, key, errors)?;
    if value.chars().count() > max_chars {
        errors.add(
            key,
            format!("Ensure this field has no more than {} characters.", max_chars),
        );
        return None;
    }
    Some(value)
}

/// Required integer field; floats, strings and booleans are not coerced
fn integer_field(obj: &Map<String, Value>, key: &str, errors: &mut ValidationErrors) -> Option<i64> {
    match obj.get(key) {
        None | Some(Value::Null) => {
            errors.add(key, REQUIRED);
            None
        }
        Some(Value::Number(n)) => match n.as_i64() {
            Some(i) => Some(i),
            None => {
                errors.add(key, NOT_AN_INTEGER);
                None
            }
        },
        Some(_) => {
            errors.add(key, NOT_AN_INTEGER);
            None
        }
    }
}
