use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{ValidationError, require_text};

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_\-]([\w\-.]*[A-Za-z0-9_\-])?@\w+(\.\w+){1,2}$")
        .expect("email pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            _ => Err(ValidationError::new("role", "Invalid role")),
        }
    }
}

pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if !EMAIL_RE.is_match(email) {
        return Err(ValidationError::new(
            "email",
            format!("{email} is not a valid email"),
        ));
    }
    Ok(())
}

/// 8 to 16 characters, no whitespace, with at least one digit, one
/// upper-case letter, one lower-case letter and one symbol.
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    let len = password.chars().count();
    let strong = (8..=16).contains(&len)
        && !password.chars().any(char::is_whitespace)
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| c.is_uppercase())
        && password.chars().any(|c| c.is_lowercase())
        && password
            .chars()
            .any(|c| !c.is_alphanumeric() && c != '_' && c != ':');
    if !strong {
        return Err(ValidationError::new(
            "password",
            "Please enter a stronger password",
        ));
    }
    Ok(())
}

pub fn validate_age(age: i32) -> Result<(), ValidationError> {
    if age <= 0 {
        return Err(ValidationError::new("age", "Age must be a positive number"));
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct ProfileDraft<'a> {
    pub name: &'a str,
    pub age: i32,
    pub address: &'a str,
    pub contact: &'a str,
}

pub fn validate_profile(profile: &ProfileDraft<'_>) -> Result<(), ValidationError> {
    require_text("name", profile.name)?;
    validate_age(profile.age)?;
    require_text("address", profile.address)?;
    require_text("contact", profile.contact)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_common_emails() {
        assert!(validate_email("user@example.com").is_ok());
        assert!(validate_email("first.last-1@mail.co.in").is_ok());
    }

    #[test]
    fn rejects_malformed_emails() {
        for email in ["", "no-at-sign", ".dot@example.com", "dot.@example.com", "a@b", "a b@c.com"] {
            assert!(validate_email(email).is_err(), "{email} should be rejected");
        }
    }

    #[test]
    fn password_strength_rules() {
        assert!(validate_password("Passw0rd!").is_ok());
        assert!(validate_password("short1!A").is_ok());
        assert!(validate_password("Sh0rt!").is_err());
        assert!(validate_password("alllowercase1!").is_err());
        assert!(validate_password("NoDigits!!").is_err());
        assert!(validate_password("NoSymbol12").is_err());
        assert!(validate_password("Has Space1!").is_err());
        assert!(validate_password("WayTooLongPassw0rd!").is_err());
    }

    #[test]
    fn role_parsing() {
        assert_eq!("admin".parse::<Role>(), Ok(Role::Admin));
        assert!("root".parse::<Role>().is_err());
    }

    #[test]
    fn profile_requires_positive_age_and_text() {
        let ok = ProfileDraft {
            name: "Asha",
            age: 30,
            address: "12 Street",
            contact: "9999999999",
        };
        assert!(validate_profile(&ok).is_ok());
        assert_eq!(
            validate_profile(&ProfileDraft { age: 0, ..ok.clone() })
                .unwrap_err()
                .field,
            "age"
        );
        assert_eq!(
            validate_profile(&ProfileDraft { address: "", ..ok })
                .unwrap_err()
                .field,
            "address"
        );
    }
}
