use std::{fmt, sync::LazyLock};

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const NAME_LEN: (usize, usize) = (3, 20);
const COMMENT_LEN: (usize, usize) = (5, 300);

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("email pattern is valid")
});

/// Customer review as submitted through the review form and persisted by a repository.
///
/// The serialized field names double as the document layout used by the
/// document store: `_id`, `name`, `email`, `comment`, `date`, `approved`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub email: String,
    pub comment: String,
    #[serde(rename = "date", default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "approved", default = "default_approved")]
    pub is_approved: bool,
}

fn default_approved() -> bool {
    true
}

impl Review {
    /// Creates an unsaved, approved review stamped with the current time.
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        comment: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            name: name.into(),
            email: email.into(),
            comment: comment.into(),
            created_at: Utc::now(),
            is_approved: default_approved(),
        }
    }

    /// Returns the normalized email used as the uniqueness key, if the email is not blank.
    pub fn email_key(&self) -> Option<String> {
        email_key(&self.email)
    }

    /// Checks the field constraints a review must satisfy before it is stored.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = Vec::new();

        if let Err(err) = check_length(Field::Name, &self.name, NAME_LEN) {
            errors.push(err);
        }

        if self.email.trim().is_empty() {
            errors.push(ValidationError::Required(Field::Email));
        } else if !EMAIL_PATTERN.is_match(&self.email) {
            errors.push(ValidationError::InvalidEmail);
        }

        if let Err(err) = check_length(Field::Comment, &self.comment, COMMENT_LEN) {
            errors.push(err);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors(errors))
        }
    }
}

/// Normalizes an email into the key reviews are compared by.
///
/// Comparison is case-insensitive and ignores surrounding whitespace. Blank
/// input has no key.
pub fn email_key(email: &str) -> Option<String> {
    let trimmed = email.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

fn check_length(
    field: Field,
    value: &str,
    (min, max): (usize, usize),
) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required(field));
    }
    let len = value.chars().count();
    if len < min || len > max {
        return Err(ValidationError::Length { field, min, max });
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Name,
    Email,
    Comment,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Name => "Name",
            Self::Email => "Email",
            Self::Comment => "Comment",
        };
        f.write_str(label)
    }
}

/// A single violated review constraint. The display text is user facing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    Required(Field),
    #[error("{field} must be between {min} and {max} characters")]
    Length { field: Field, min: usize, max: usize },
    #[error("Invalid email address")]
    InvalidEmail,
}

impl ValidationError {
    pub fn field(&self) -> Field {
        match self {
            Self::Required(field) | Self::Length { field, .. } => *field,
            Self::InvalidEmail => Field::Email,
        }
    }
}

/// Every constraint a review violated, in field order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", .0.first().map(ToString::to_string).unwrap_or_default())]
pub struct ValidationErrors(Vec<ValidationError>);

impl ValidationErrors {
    pub fn errors(&self) -> &[ValidationError] {
        &self.0
    }

    /// Message of the first violation, suitable for a form banner.
    pub fn first_message(&self) -> String {
        self.to_string()
    }
}
