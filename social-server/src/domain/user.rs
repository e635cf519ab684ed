use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::ValidateEmail;

use super::error::DomainError;

const USERNAME_MIN: usize = 3;
const USERNAME_MAX: usize = 64;
const PASSWORD_MIN: usize = 6;
const PASSWORD_MAX: usize = 128;
const NAME_MAX: usize = 64;
const BIO_MAX: usize = 500;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct Profile {
    pub(crate) first_name: Option<String>,
    pub(crate) last_name: Option<String>,
    pub(crate) bio: Option<String>,
}

/// Lightweight projection used wherever a user is referenced from another
/// document. Never carries credentials or contact data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct UserRef {
    pub(crate) id: i64,
    pub(crate) username: String,
    pub(crate) profile: Profile,
}

#[derive(Debug, Clone)]
pub(crate) struct User {
    pub(crate) id: i64,
    pub(crate) username: String,
    pub(crate) email: String,
    pub(crate) profile: Profile,
    pub(crate) followers: Vec<UserRef>,
    pub(crate) following: Vec<UserRef>,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
}

impl User {
    pub(crate) fn followers_count(&self) -> usize {
        self.followers.len()
    }

    pub(crate) fn following_count(&self) -> usize {
        self.following.len()
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct ProfileInput {
    pub(crate) first_name: Option<String>,
    pub(crate) last_name: Option<String>,
    pub(crate) bio: Option<String>,
}

impl ProfileInput {
    fn is_empty(&self) -> bool {
        self.first_name.is_none() && self.last_name.is_none() && self.bio.is_none()
    }
}

#[derive(Debug, Clone)]
pub(crate) struct CreateUserRequest {
    pub(crate) username: String,
    pub(crate) email: String,
    pub(crate) password: String,
    pub(crate) profile: Option<ProfileInput>,
}

impl CreateUserRequest {
    pub(crate) fn validate(self) -> Result<ValidCreateUser, DomainError> {
        let username = normalize_username(&self.username)?;
        let email = normalize_email(&self.email)?;
        validate_password(&self.password)?;
        let profile = match self.profile {
            Some(input) => normalize_profile(input)?,
            None => Profile::default(),
        };

        Ok(ValidCreateUser {
            username,
            email,
            password: self.password,
            profile,
        })
    }
}

#[derive(Debug, Clone)]
pub(crate) struct ValidCreateUser {
    pub(crate) username: String,
    pub(crate) email: String,
    pub(crate) password: String,
    pub(crate) profile: Profile,
}

/// Field-wise edit of a user. `None` leaves the stored value untouched; for
/// profile fields an empty string clears the value.
#[derive(Debug, Clone, Default)]
pub(crate) struct UpdateUserRequest {
    pub(crate) username: Option<String>,
    pub(crate) email: Option<String>,
    pub(crate) password: Option<String>,
    pub(crate) profile: Option<ProfileInput>,
}

impl UpdateUserRequest {
    pub(crate) fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.email.is_none()
            && self.password.is_none()
            && self.profile.as_ref().is_none_or(ProfileInput::is_empty)
    }

    pub(crate) fn validate(self) -> Result<ValidUpdateUser, DomainError> {
        let username = self.username.as_deref().map(normalize_username).transpose()?;
        let email = self.email.as_deref().map(normalize_email).transpose()?;
        if let Some(password) = &self.password {
            validate_password(password)?;
        }

        let (first_name, last_name, bio) = match self.profile {
            Some(input) => (
                input
                    .first_name
                    .map(|value| normalize_optional_text("first_name", &value, NAME_MAX))
                    .transpose()?,
                input
                    .last_name
                    .map(|value| normalize_optional_text("last_name", &value, NAME_MAX))
                    .transpose()?,
                input
                    .bio
                    .map(|value| normalize_optional_text("bio", &value, BIO_MAX))
                    .transpose()?,
            ),
            None => (None, None, None),
        };

        Ok(ValidUpdateUser {
            username,
            email,
            password: self.password,
            first_name,
            last_name,
            bio,
        })
    }
}

/// Outer `Option` means "provided", inner `Option` is the new value (with
/// `None` clearing the field).
#[derive(Debug, Clone, Default)]
pub(crate) struct ValidUpdateUser {
    pub(crate) username: Option<String>,
    pub(crate) email: Option<String>,
    pub(crate) password: Option<String>,
    pub(crate) first_name: Option<Option<String>>,
    pub(crate) last_name: Option<Option<String>>,
    pub(crate) bio: Option<Option<String>>,
}

pub(crate) fn normalize_username(username: &str) -> Result<String, DomainError> {
    let username = username.trim();
    if username.is_empty() {
        return Err(DomainError::Validation {
            field: "username",
            message: "is required",
        });
    }
    let len = username.chars().count();
    if !(USERNAME_MIN..=USERNAME_MAX).contains(&len) {
        return Err(DomainError::Validation {
            field: "username",
            message: "must be 3..64 chars",
        });
    }
    Ok(username.to_string())
}

pub(crate) fn normalize_email(email: &str) -> Result<String, DomainError> {
    let email = email.trim().to_lowercase();
    if !email.validate_email() {
        return Err(DomainError::Validation {
            field: "email",
            message: "must be a valid email",
        });
    }
    Ok(email)
}

fn validate_password(password: &str) -> Result<(), DomainError> {
    let len = password.chars().count();
    if !(PASSWORD_MIN..=PASSWORD_MAX).contains(&len) {
        return Err(DomainError::Validation {
            field: "password",
            message: "must be 6..128 chars",
        });
    }
    Ok(())
}

fn normalize_profile(input: ProfileInput) -> Result<Profile, DomainError> {
    Ok(Profile {
        first_name: input
            .first_name
            .map(|value| normalize_optional_text("first_name", &value, NAME_MAX))
            .transpose()?
            .flatten(),
        last_name: input
            .last_name
            .map(|value| normalize_optional_text("last_name", &value, NAME_MAX))
            .transpose()?
            .flatten(),
        bio: input
            .bio
            .map(|value| normalize_optional_text("bio", &value, BIO_MAX))
            .transpose()?
            .flatten(),
    })
}

fn normalize_optional_text(
    field: &'static str,
    value: &str,
    max: usize,
) -> Result<Option<String>, DomainError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    if value.chars().count() > max {
        return Err(DomainError::Validation {
            field,
            message: "is too long",
        });
    }
    Ok(Some(value.to_string()))
}
