//! Data models for people-service
//!
//! Row types map 1:1 onto the Postgres schema (see `migrations/`). Status
//! and gender are stored as TEXT and surfaced as closed Rust enums.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::ValidationError;

/// Publication state of a person profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Status {
    Draft,
    Published,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Draft => "draft",
            Status::Published => "published",
        }
    }
}

/// Gender of a person. Closed two-valued enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }

    /// Human-readable form used in autocomplete labels.
    pub fn display(&self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Person {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub photo: Option<String>,
    pub status: Status,
    pub gender: Gender,
    pub companion_id: Option<Uuid>,
    pub category_id: Uuid,
    pub author_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Tag {
    pub id: Uuid,
    pub label: String,
    pub slug: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub is_active: bool,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PasswordReset {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub is_used: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ContactMessage {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

static SLUG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").unwrap());

// Letters (any script), spaces and hyphens only.
static PERSONAL_NAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\p{L}\s\-]+$").unwrap());

/// Validator hook for URL slugs.
pub fn validate_slug(slug: &str) -> Result<(), ValidationError> {
    if SLUG_RE.is_match(slug) {
        Ok(())
    } else {
        let mut err = ValidationError::new("slug");
        err.message = Some("slug must contain only lowercase letters, digits and hyphens".into());
        Err(err)
    }
}

/// Validator hook for first/last names: letters, spaces and hyphens.
pub fn validate_personal_name(name: &str) -> Result<(), ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() || !PERSONAL_NAME_RE.is_match(trimmed) {
        let mut err = ValidationError::new("name");
        err.message = Some("only letters, spaces and hyphens are allowed".into());
        Err(err)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        assert_eq!(Status::Published.as_str(), "published");
        assert_eq!(Status::Draft.as_str(), "draft");
        let s: Status = serde_json::from_str("\"draft\"").unwrap();
        assert_eq!(s, Status::Draft);
    }

    #[test]
    fn test_gender_display_label() {
        assert_eq!(Gender::Male.display(), "Male");
        assert_eq!(Gender::Female.as_str(), "female");
    }

    #[test]
    fn test_slug_validation() {
        assert!(validate_slug("marie-curie").is_ok());
        assert!(validate_slug("a1-b2-c3").is_ok());
        assert!(validate_slug("Marie Curie").is_err());
        assert!(validate_slug("-leading").is_err());
        assert!(validate_slug("").is_err());
    }

    #[test]
    fn test_personal_name_accepts_unicode_letters() {
        assert!(validate_personal_name("Marie").is_ok());
        assert!(validate_personal_name("Анна-Мария").is_ok());
        assert!(validate_personal_name("Jean Luc").is_ok());
    }

    #[test]
    fn test_personal_name_rejects_digits_and_empty() {
        assert!(validate_personal_name("R2D2").is_err());
        assert!(validate_personal_name("   ").is_err());
        assert!(validate_personal_name("name!").is_err());
    }
}
