// ============================
// crates/backend-lib/src/validation/mod.rs
// ============================
//! Request validation at the HTTP boundary.

use crate::auth::{validate_password_strength, PasswordRequirements, MIN_PASSWORD_LENGTH};
use crate::error::AppError;
use regex::Regex;
use std::sync::LazyLock;
use tasklive_common::{CreateTaskRequest, LoginRequest, SignupRequest, UpdateTaskRequest};
use thiserror::Error;

const MAX_PASSWORD_LENGTH: usize = 128;
const MAX_EMAIL_LENGTH: usize = 254; // RFC 5321 SMTP limit
const MAX_TITLE_LENGTH: usize = 200;

static EMAIL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap());

/// Possible validation errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    #[error("Invalid password: {0}")]
    InvalidPassword(String),

    #[error("Invalid title: {0}")]
    InvalidTitle(String),

    #[error("Invalid description: {0}")]
    InvalidDescription(String),
}

/// Result type for validation operations
pub type ValidationResult<T> = Result<T, ValidationError>;

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation(err.to_string())
    }
}

/// Validate an email address
pub fn validate_email(email: &str) -> ValidationResult<&str> {
    if email.is_empty() {
        return Err(ValidationError::InvalidEmail(
            "Email address cannot be empty".to_string(),
        ));
    }

    if email.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::InvalidEmail(format!(
            "Email address cannot exceed {MAX_EMAIL_LENGTH} characters"
        )));
    }

    if !EMAIL_REGEX.is_match(email) {
        return Err(ValidationError::InvalidEmail(
            "Invalid email address format".to_string(),
        ));
    }

    Ok(email)
}

/// Validate a new password against the strong-password policy
pub fn validate_password(password: &str) -> ValidationResult<&str> {
    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(ValidationError::InvalidPassword(format!(
            "Password cannot exceed {MAX_PASSWORD_LENGTH} characters"
        )));
    }

    if !validate_password_strength(password, &PasswordRequirements::default()) {
        return Err(ValidationError::InvalidPassword(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters and contain an uppercase letter, a lowercase letter, a number and a symbol"
        )));
    }

    Ok(password)
}

/// Normalize and validate a signup body. The email is lower-cased in place.
pub fn validate_signup(request: &mut SignupRequest) -> ValidationResult<()> {
    request.email = request.email.trim().to_lowercase();
    validate_email(&request.email)?;
    validate_password(&request.password)?;
    Ok(())
}

/// Login only checks presence; credential checks happen in the auth service.
pub fn validate_login(request: &mut LoginRequest) -> ValidationResult<()> {
    request.email = request.email.trim().to_lowercase();
    if request.email.is_empty() {
        return Err(ValidationError::InvalidEmail(
            "Email address cannot be empty".to_string(),
        ));
    }
    if request.password.is_empty() {
        return Err(ValidationError::InvalidPassword(
            "Password cannot be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_title(title: &str) -> ValidationResult<()> {
    if title.trim().is_empty() {
        return Err(ValidationError::InvalidTitle(
            "Title must not be empty".to_string(),
        ));
    }
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(ValidationError::InvalidTitle(format!(
            "Title cannot exceed {MAX_TITLE_LENGTH} characters"
        )));
    }
    Ok(())
}

fn validate_description(description: &str) -> ValidationResult<()> {
    if description.trim().is_empty() {
        return Err(ValidationError::InvalidDescription(
            "Description must not be empty".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_create_task(request: &CreateTaskRequest) -> ValidationResult<()> {
    validate_title(&request.title)?;
    validate_description(&request.description)
}

/// Fields that are present must satisfy the create rules
pub fn validate_update_task(request: &UpdateTaskRequest) -> ValidationResult<()> {
    if let Some(title) = &request.title {
        validate_title(title)?;
    }
    if let Some(description) = &request.description {
        validate_description(description)?;
    }
    Ok(())
}
