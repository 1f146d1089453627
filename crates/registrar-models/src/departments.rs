//! Department models and DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::ids::DepartmentId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Department {
    pub id: DepartmentId,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Department with usage counts, returned by the detail endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct DepartmentWithStats {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub department: Department,
    pub course_count: i64,
    pub teacher_count: i64,
    pub student_count: i64,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateDepartmentDto {
    #[validate(length(min = 1, max = 16, message = "must be 1-16 characters"))]
    pub code: String,
    #[validate(length(min = 1, max = 200, message = "must be 1-200 characters"))]
    pub name: String,
    #[validate(length(max = 2000, message = "must be at most 2000 characters"))]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateDepartmentDto {
    #[validate(length(min = 1, max = 16, message = "must be 1-16 characters"))]
    pub code: Option<String>,
    #[validate(length(min = 1, max = 200, message = "must be 1-200 characters"))]
    pub name: Option<String>,
    #[validate(length(max = 2000, message = "must be at most 2000 characters"))]
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_requires_code_and_name() {
        let dto = CreateDepartmentDto {
            code: String::new(),
            name: "Mathematics".into(),
            description: None,
        };
        assert!(dto.validate().is_err());

        let dto = CreateDepartmentDto {
            code: "MATH".into(),
            name: "Mathematics".into(),
            description: None,
        };
        assert!(dto.validate().is_ok());
    }

    #[test]
    fn test_code_length_limit() {
        let dto = UpdateDepartmentDto {
            code: Some("X".repeat(17)),
            ..Default::default()
        };
        assert!(dto.validate().is_err());
    }
}
