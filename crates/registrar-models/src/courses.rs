//! Course models and DTOs.

use chrono::{DateTime, Utc};
use registrar_core::PaginationParams;
use registrar_core::serde::deserialize_optional_string;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::display::Labeled;
use crate::ids::{CourseId, DepartmentId, TeacherId};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[sqlx(type_name = "course_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CourseStatus {
    Active,
    Inactive,
    Archived,
}

impl Labeled for CourseStatus {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Archived => "archived",
        }
    }
}

/// Column list matching [`Course`]; `c` = courses, `d` = departments,
/// `t` = teachers, `tu` = the teacher's user. `enrolled_count` covers the
/// active semester only.
pub const COURSE_COLUMNS: &str = r#"
    c.id, c.code, c.name, c.description, c.credits, c.capacity,
    c.teacher_id, tu.first_name || ' ' || tu.last_name AS teacher_name,
    c.department_id, d.name AS department_name, c.status,
    (SELECT COUNT(*) FROM enrollments e
       JOIN semesters es ON es.id = e.semester_id AND es.is_active
       WHERE e.course_id = c.id AND e.status = 'enrolled') AS enrolled_count,
    c.created_at, c.updated_at"#;

/// Join clause that goes with [`COURSE_COLUMNS`].
pub const COURSE_JOINS: &str = r#"
    FROM courses c
    JOIN departments d ON d.id = c.department_id
    LEFT JOIN teachers t ON t.id = c.teacher_id
    LEFT JOIN users tu ON tu.id = t.user_id"#;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Course {
    pub id: CourseId,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub credits: i32,
    pub capacity: Option<i32>,
    pub teacher_id: Option<TeacherId>,
    pub teacher_name: Option<String>,
    pub department_id: DepartmentId,
    pub department_name: String,
    pub status: CourseStatus,
    pub enrolled_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Whether a course with `capacity` seats can take another student when
/// `enrolled` seats are already taken in the semester.
pub fn has_room(capacity: Option<i32>, enrolled: i64) -> bool {
    capacity.is_none_or(|cap| enrolled < i64::from(cap))
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CourseDto {
    #[serde(flatten)]
    pub course: Course,
    pub status_label: String,
}

impl From<Course> for CourseDto {
    fn from(course: Course) -> Self {
        Self {
            status_label: course.status.label(),
            course,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateCourseDto {
    #[validate(length(min = 1, max = 32, message = "must be 1-32 characters"))]
    pub code: String,
    #[validate(length(min = 1, max = 200, message = "must be 1-200 characters"))]
    pub name: String,
    #[validate(length(max = 4000, message = "must be at most 4000 characters"))]
    pub description: Option<String>,
    #[validate(range(min = 1, max = 10, message = "must be between 1 and 10"))]
    pub credits: i32,
    #[validate(range(min = 1, message = "must be positive"))]
    pub capacity: Option<i32>,
    pub teacher_id: Option<TeacherId>,
    pub department_id: DepartmentId,
    pub status: Option<CourseStatus>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateCourseDto {
    #[validate(length(min = 1, max = 32, message = "must be 1-32 characters"))]
    pub code: Option<String>,
    #[validate(length(min = 1, max = 200, message = "must be 1-200 characters"))]
    pub name: Option<String>,
    #[validate(length(max = 4000, message = "must be at most 4000 characters"))]
    pub description: Option<String>,
    #[validate(range(min = 1, max = 10, message = "must be between 1 and 10"))]
    pub credits: Option<i32>,
    #[validate(range(min = 1, message = "must be positive"))]
    pub capacity: Option<i32>,
    pub teacher_id: Option<TeacherId>,
    pub department_id: Option<DepartmentId>,
    pub status: Option<CourseStatus>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct CourseFilterParams {
    pub department_id: Option<DepartmentId>,
    pub teacher_id: Option<TeacherId>,
    pub status: Option<CourseStatus>,
    /// Matches code or name, case-insensitive
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub search: Option<String>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}
