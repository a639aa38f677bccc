//! Common transport-layer types shared between the backend and the dashboard frontend.
//! The backend serializes these directly, so the frontend can deserialize API
//! responses without duplicating shapes.

mod company_data;

pub use company_data::{CompanyData, SpreadsheetRow, SpreadsheetUpload};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

/// Generic API response wrapper used by every successful endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Response data
    pub data: T,
    /// Response message
    pub message: String,
    /// Success flag
    pub success: bool,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self {
            data,
            message: message.into(),
            success: true,
        }
    }
}

// ===================== Roles =====================

/// Role carried by a user record and by every issued token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }

    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            other => Err(format!("unknown role '{other}', expected 'user' or 'admin'")),
        }
    }
}

// ===================== Auth =====================

/// Payload returned by a successful login.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct LoginResponse {
    /// Signed bearer token
    pub token: String,
    /// Always "Bearer"
    pub token_type: String,
    /// Token lifetime in seconds
    pub expires_in: i64,
    pub user: UserDto,
}

/// Identity decoded from a verified bearer token.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct IdentityDto {
    pub user_id: i32,
    pub username: String,
    pub role: Role,
    pub expires_at: DateTime<Utc>,
}

// ===================== Users =====================

/// User response model. Password hashes are never part of it.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct UserDto {
    pub id: i32,
    pub username: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

// ===================== Companies =====================

/// Company response model.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct CompanyDto {
    pub id: i32,
    pub name: String,
    pub data: Option<CompanyData>,
    /// Username of the creator, if recorded
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Whether questionnaire answers have been saved for this company
    pub has_questionnaire: bool,
}

/// Result of the bulk company clear.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct ClearCompaniesDto {
    pub deleted: u64,
}

// ===================== Questionnaire =====================

/// Free-form questionnaire answers keyed by question id.
pub type QuestionnaireAnswers = BTreeMap<String, serde_json::Value>;

/// Questionnaire answers embedded on a company.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct QuestionnaireDto {
    pub company_id: i32,
    /// Answer map; empty when nothing has been saved yet
    #[schema(value_type = Object)]
    pub answers: QuestionnaireAnswers,
    pub updated_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
        assert_eq!(serde_json::from_str::<Role>("\"user\"").unwrap(), Role::User);
        assert!(serde_json::from_str::<Role>("\"superuser\"").is_err());
    }

    #[test]
    fn role_parses_case_insensitively() {
        assert_eq!("Admin".parse::<Role>(), Ok(Role::Admin));
        assert_eq!(" user ".parse::<Role>(), Ok(Role::User));
        assert!("root".parse::<Role>().is_err());
    }

    #[test]
    fn api_response_ok_sets_success() {
        let response = ApiResponse::ok(3, "done");
        assert!(response.success);
        assert_eq!(response.message, "done");
        assert_eq!(response.data, 3);
    }
}
