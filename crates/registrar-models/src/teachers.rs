//! Teacher profile models and DTOs.

use chrono::{DateTime, NaiveDate, Utc};
use registrar_core::serde::deserialize_optional_string;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::display::{Labeled, display_id};
use crate::ids::{DepartmentId, TeacherId, UserId};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[sqlx(type_name = "teacher_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TeacherStatus {
    Active,
    OnLeave,
    Inactive,
}

impl Labeled for TeacherStatus {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::OnLeave => "on_leave",
            Self::Inactive => "inactive",
        }
    }
}

/// Column list matching [`Teacher`]; `t` = teachers, `u` = users,
/// `d` = departments.
pub const TEACHER_COLUMNS: &str = r#"
    t.id, t.user_id, u.first_name, u.last_name, u.email, t.department_id,
    d.name AS department_name, t.title, t.rating, t.hire_date, t.status,
    (SELECT COUNT(*) FROM courses c WHERE c.teacher_id = t.id) AS course_count,
    t.created_at, t.updated_at"#;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Teacher {
    pub id: TeacherId,
    pub user_id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub department_id: Option<DepartmentId>,
    pub department_name: Option<String>,
    pub title: Option<String>,
    pub rating: Option<f64>,
    pub hire_date: Option<NaiveDate>,
    pub status: TeacherStatus,
    pub course_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TeacherDto {
    pub id: TeacherId,
    pub display_id: String,
    pub user_id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub email: String,
    pub department_id: Option<DepartmentId>,
    pub department_name: Option<String>,
    pub title: Option<String>,
    pub rating: Option<f64>,
    pub hire_date: Option<NaiveDate>,
    pub status: TeacherStatus,
    pub status_label: String,
    pub course_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Teacher> for TeacherDto {
    fn from(teacher: Teacher) -> Self {
        Self {
            display_id: display_id("TCH", teacher.id.as_uuid()),
            full_name: format!("{} {}", teacher.first_name, teacher.last_name),
            status_label: teacher.status.label(),
            id: teacher.id,
            user_id: teacher.user_id,
            first_name: teacher.first_name,
            last_name: teacher.last_name,
            email: teacher.email,
            department_id: teacher.department_id,
            department_name: teacher.department_name,
            title: teacher.title,
            rating: teacher.rating,
            hire_date: teacher.hire_date,
            status: teacher.status,
            course_count: teacher.course_count,
            created_at: teacher.created_at,
            updated_at: teacher.updated_at,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateTeacherDto {
    pub department_id: Option<DepartmentId>,
    #[validate(length(max = 100, message = "must be at most 100 characters"))]
    pub title: Option<String>,
    #[validate(range(min = 0.0, max = 5.0, message = "must be between 0 and 5"))]
    pub rating: Option<f64>,
    pub hire_date: Option<NaiveDate>,
    pub status: Option<TeacherStatus>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct TeacherFilterParams {
    pub department_id: Option<DepartmentId>,
    pub status: Option<TeacherStatus>,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub search: Option<String>,
}
