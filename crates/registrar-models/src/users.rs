//! User models and DTOs.
//!
//! A user is the internal record bound to exactly one external identity.
//! Student and teacher profiles hang off it 1:1.

use chrono::{DateTime, NaiveDate, Utc};
use registrar_core::PaginationParams;
use registrar_core::serde::deserialize_optional_string;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

use crate::display::{Labeled, display_id};
use crate::ids::{DepartmentId, StudentId, TeacherId, UserId};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Student,
    Teacher,
    Admin,
    Parent,
}

impl UserRole {
    /// Prefix of display ids for records owned by this role.
    pub fn display_prefix(&self) -> &'static str {
        match self {
            Self::Student => "STU",
            Self::Teacher => "TCH",
            Self::Admin => "ADM",
            Self::Parent => "PAR",
        }
    }
}

impl Labeled for UserRole {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Teacher => "teacher",
            Self::Admin => "admin",
            Self::Parent => "parent",
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[sqlx(type_name = "user_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    Active,
    Inactive,
    Suspended,
}

impl Labeled for UserStatus {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Suspended => "suspended",
        }
    }
}

/// A row of `users`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct User {
    pub id: UserId,
    pub external_id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: UserRole,
    pub status: UserStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Active
    }
}

/// External representation of a user.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserDto {
    pub id: UserId,
    pub display_id: String,
    pub external_id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub role: UserRole,
    pub role_label: String,
    pub status: UserStatus,
    pub status_label: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            display_id: display_id(user.role.display_prefix(), user.id.as_uuid()),
            full_name: user.full_name(),
            role_label: user.role.label(),
            status_label: user.status.label(),
            id: user.id,
            external_id: user.external_id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            role: user.role,
            status: user.status,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Response of `GET /api/me`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProfileResponse {
    #[serde(flatten)]
    pub user: UserDto,
    pub student_id: Option<StudentId>,
    pub teacher_id: Option<TeacherId>,
}

fn validate_profile_fields(dto: &CreateUserDto) -> Result<(), ValidationError> {
    let has_student_fields = dto.student_number.is_some() || dto.credits_required.is_some();
    let has_teacher_fields = dto.title.is_some() || dto.hire_date.is_some();

    if has_student_fields && dto.role != UserRole::Student {
        return Err(ValidationError::new("role_mismatch")
            .with_message("student fields require role student".into()));
    }
    if has_teacher_fields && dto.role != UserRole::Teacher {
        return Err(ValidationError::new("role_mismatch")
            .with_message("teacher fields require role teacher".into()));
    }
    Ok(())
}

/// Create a user bound to an external identity.
///
/// Students and teachers get their profile row in the same transaction;
/// the profile-specific fields are optional.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validate_profile_fields", skip_on_field_errors = true))]
pub struct CreateUserDto {
    #[validate(length(min = 1, max = 255, message = "must be 1-255 characters"))]
    pub external_id: String,
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, max = 100, message = "must be 1-100 characters"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100, message = "must be 1-100 characters"))]
    pub last_name: String,
    pub role: UserRole,
    pub status: Option<UserStatus>,
    /// Student or teacher department
    pub department_id: Option<DepartmentId>,
    /// Student number; generated from the display id when omitted
    #[validate(length(min = 1, max = 32, message = "must be 1-32 characters"))]
    pub student_number: Option<String>,
    #[validate(range(min = 1, max = 400, message = "must be between 1 and 400"))]
    pub credits_required: Option<i32>,
    pub enrollment_date: Option<NaiveDate>,
    #[validate(length(max = 100, message = "must be at most 100 characters"))]
    pub title: Option<String>,
    pub hire_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateUserStatusDto {
    pub status: UserStatus,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct UserFilterParams {
    pub role: Option<UserRole>,
    pub status: Option<UserStatus>,
    /// Matches name or email, case-insensitive
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub search: Option<String>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn user(role: UserRole) -> User {
        User {
            id: UserId::from_uuid(Uuid::from_u128(0xabcdef01_0000_4000_8000_000000000000)),
            external_id: "user_2abc".into(),
            email: "ada@uni.edu".into(),
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            role,
            status: UserStatus::Active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn create_dto(role: UserRole) -> CreateUserDto {
        CreateUserDto {
            external_id: "user_2abc".into(),
            email: "ada@uni.edu".into(),
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            role,
            status: None,
            department_id: None,
            student_number: None,
            credits_required: None,
            enrollment_date: None,
            title: None,
            hire_date: None,
        }
    }

    #[test]
    fn test_dto_carries_display_id_and_labels() {
        let dto = UserDto::from(user(UserRole::Teacher));
        assert_eq!(dto.display_id, "TCH-ABCDEF01");
        assert_eq!(dto.role_label, "Teacher");
        assert_eq!(dto.status_label, "Active");
        assert_eq!(dto.full_name, "Ada Lovelace");
    }

    #[test]
    fn test_role_prefixes() {
        assert_eq!(UserRole::Student.display_prefix(), "STU");
        assert_eq!(UserRole::Admin.display_prefix(), "ADM");
        assert_eq!(UserRole::Parent.display_prefix(), "PAR");
    }

    #[test]
    fn test_role_wire_format() {
        let role: UserRole = serde_json::from_str(r#""parent""#).unwrap();
        assert_eq!(role, UserRole::Parent);
        assert!(serde_json::from_str::<UserRole>(r#""superuser""#).is_err());
    }

    #[test]
    fn test_create_dto_validation() {
        assert!(create_dto(UserRole::Admin).validate().is_ok());

        let mut bad_email = create_dto(UserRole::Admin);
        bad_email.email = "not-an-email".into();
        assert!(bad_email.validate().is_err());

        let mut blank_identity = create_dto(UserRole::Admin);
        blank_identity.external_id = String::new();
        assert!(blank_identity.validate().is_err());
    }

    #[test]
    fn test_profile_fields_must_match_role() {
        let mut dto = create_dto(UserRole::Parent);
        dto.student_number = Some("S-1".into());
        assert!(dto.validate().is_err());

        let mut dto = create_dto(UserRole::Student);
        dto.student_number = Some("S-1".into());
        assert!(dto.validate().is_ok());

        let mut dto = create_dto(UserRole::Student);
        dto.title = Some("Professor".into());
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_profile_response_flattens_user() {
        let response = ProfileResponse {
            user: UserDto::from(user(UserRole::Student)),
            student_id: Some(StudentId::new()),
            teacher_id: None,
        };
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["role"], "student");
        assert_eq!(value["display_id"], "STU-ABCDEF01");
        assert!(value["teacher_id"].is_null());
    }
}
