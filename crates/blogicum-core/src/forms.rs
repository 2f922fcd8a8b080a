//! Submitted forms and their validation.
//!
//! Every form is cleaned first (surrounding whitespace trimmed, blank optional
//! values dropped) and then validated, so length limits apply to what is
//! actually stored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidateEmail, ValidationError, ValidationErrors};

use crate::domain::{PostFields, ProfileFields};
use crate::error::DomainError;

pub const USERNAME_MAX_CHARS: u64 = 150;

fn default_true() -> bool {
    true
}

/// Post creation and edit form. The author is never part of it.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PostForm {
    #[serde(default)]
    #[validate(length(min = 1, max = 256, message = "must be between 1 and 256 characters"))]
    pub title: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "this field is required"))]
    pub text: String,
    #[validate(required(message = "this field is required"))]
    pub pub_date: Option<DateTime<Utc>>,
    #[serde(default = "default_true")]
    pub is_published: bool,
    #[serde(default)]
    pub category: Option<Uuid>,
    #[serde(default)]
    pub location: Option<Uuid>,
    #[serde(default)]
    #[validate(length(max = 256, message = "must be at most 256 characters"))]
    pub image: Option<String>,
}

impl PostForm {
    pub fn clean(mut self) -> Result<PostFields, DomainError> {
        self.title = self.title.trim().to_string();
        self.text = self.text.trim().to_string();
        self.image = self
            .image
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        self.validate().map_err(into_domain_error)?;

        let pub_date = self
            .pub_date
            .ok_or_else(|| DomainError::Validation(vec!["pub_date: this field is required".into()]))?;

        Ok(PostFields {
            title: self.title,
            text: self.text,
            pub_date,
            is_published: self.is_published,
            category_id: self.category,
            location_id: self.location,
            image: self.image,
        })
    }
}

/// Comment creation and edit form.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct CommentForm {
    #[serde(default)]
    #[validate(length(min = 1, max = 256, message = "must be between 1 and 256 characters"))]
    pub text: String,
}

impl CommentForm {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Returns the text to store.
    pub fn clean(mut self) -> Result<String, DomainError> {
        self.text = self.text.trim().to_string();
        self.validate().map_err(into_domain_error)?;
        Ok(self.text)
    }
}

/// Profile edit form.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ProfileForm {
    #[serde(default)]
    #[validate(length(max = 150, message = "must be at most 150 characters"))]
    pub first_name: String,
    #[serde(default)]
    #[validate(length(max = 150, message = "must be at most 150 characters"))]
    pub last_name: String,
    #[serde(default)]
    #[validate(custom(function = "blank_or_email"))]
    pub email: String,
}

impl ProfileForm {
    pub fn clean(mut self) -> Result<ProfileFields, DomainError> {
        self.first_name = self.first_name.trim().to_string();
        self.last_name = self.last_name.trim().to_string();
        self.email = self.email.trim().to_string();
        self.validate().map_err(into_domain_error)?;

        Ok(ProfileFields {
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
        })
    }
}

/// Sign-up form.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct RegistrationForm {
    #[serde(default)]
    #[validate(custom(function = "valid_username"))]
    pub username: String,
    #[serde(default)]
    #[validate(custom(function = "blank_or_email"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 8, message = "must be at least 8 characters"))]
    pub password: String,
}

impl RegistrationForm {
    pub fn clean(mut self) -> Result<Self, DomainError> {
        self.username = self.username.trim().to_string();
        self.email = self.email.trim().to_string();
        self.validate().map_err(into_domain_error)?;
        Ok(self)
    }
}

fn blank_or_email(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() || value.validate_email() {
        Ok(())
    } else {
        Err(ValidationError::new("email").with_message("enter a valid email address".into()))
    }
}

/// ASCII letters, digits and `@ . + - _`, up to 150 characters.
fn valid_username(value: &str) -> Result<(), ValidationError> {
    let length = value.chars().count() as u64;
    if length == 0 || length > USERNAME_MAX_CHARS {
        return Err(ValidationError::new("length")
            .with_message("must be between 1 and 150 characters".into()));
    }
    if !value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
    {
        return Err(ValidationError::new("username")
            .with_message("may contain only letters, digits and @/./+/-/_".into()));
    }
    Ok(())
}

/// Flatten validator output into sorted `field: message` lines.
fn into_domain_error(errors: ValidationErrors) -> DomainError {
    let mut messages: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| {
                let message = e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| e.code.to_string());
                format!("{}: {}", field, message)
            })
        })
        .collect();
    messages.sort();
    DomainError::Validation(messages)
}
