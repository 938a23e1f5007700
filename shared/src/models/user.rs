//! User account models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::pagination::PageRequest;
use crate::types::UserType;
use crate::validation::{
    self, escape_like, parse_date_bound, parse_page_number, validate_date_range, DateBound,
    ValidationError, ValidationResult,
};

/// Input for registering an account
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterInput {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    pub password: String,
    #[validate(length(min = 1, max = 100, message = "First name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100, message = "Last name is required"))]
    pub last_name: String,
    pub user_type: UserType,
}

impl RegisterInput {
    /// Rules the derive cannot express
    pub fn check(&self) -> ValidationResult<()> {
        validation::validate_password(&self.password)?;
        if self.user_type == UserType::Admin {
            return Err(ValidationError::new(
                "userType",
                "userType should be CUSTOMER or PROVIDER",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginInput {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RefreshInput {
    #[validate(length(min = 1, message = "Refresh token is required"))]
    pub refresh_token: String,
}

/// Token pair handed to the client after login, registration or refresh
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// Raw account listing query, as sent by an administrator
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserQuery {
    #[serde(rename = "type")]
    pub user_type: Option<String>,
    pub name: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

/// Parsed account listing predicates
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserFilter {
    /// Only customers or providers; administrators are never listed
    pub user_type: Option<UserType>,
    /// Prefix of either the first or the last name
    pub name_prefix: Option<String>,
    pub created_from: Option<DateTime<Utc>>,
    pub created_to: Option<DateTime<Utc>>,
}

impl UserFilter {
    pub fn name_pattern(&self) -> Option<String> {
        self.name_prefix
            .as_deref()
            .map(|prefix| format!("{}%", escape_like(prefix)))
    }
}

impl UserQuery {
    pub fn filter(&self) -> ValidationResult<UserFilter> {
        let user_type = match self.user_type.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => match raw.to_uppercase().parse::<UserType>() {
                Ok(t @ (UserType::Customer | UserType::Provider)) => Some(t),
                _ => {
                    return Err(ValidationError::new(
                        "type",
                        "type should be CUSTOMER or PROVIDER",
                    ))
                }
            },
        };

        let created_from = parse_date_bound("startDate", self.start_date.as_deref(), DateBound::Start)?;
        let created_to = parse_date_bound("endDate", self.end_date.as_deref(), DateBound::End)?;
        validate_date_range(created_from, created_to)?;

        let name_prefix = self
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string);

        Ok(UserFilter {
            user_type,
            name_prefix,
            created_from,
            created_to,
        })
    }

    pub fn page_request(&self, default_limit: u32, max_limit: u32) -> PageRequest {
        PageRequest::normalize(
            parse_page_number(self.page.as_deref()),
            parse_page_number(self.limit.as_deref()),
            default_limit,
            max_limit,
        )
    }
}

/// Account counts shown on the administrator dashboard
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserTotals {
    pub total_customer: i64,
    pub total_provider: i64,
}

/// Whether `user_type` is one of `allowed`; an empty list admits everyone
pub fn is_allowed(user_type: UserType, allowed: &[UserType]) -> bool {
    allowed.is_empty() || allowed.contains(&user_type)
}
