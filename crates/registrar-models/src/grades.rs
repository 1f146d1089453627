//! Grade models and DTOs.

use chrono::{DateTime, Utc};
use registrar_core::PaginationParams;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

use crate::aggregate::{LetterDistribution, grade_points, letter_for_score};
use crate::ids::{CourseId, GradeId, SemesterId, StudentId, UserId};

/// Column list matching [`Grade`]; `g` = grades, `s` = students,
/// `su` = the student's user, `c` = courses, `sem` = semesters.
pub const GRADE_COLUMNS: &str = r#"
    g.id, g.student_id, su.first_name || ' ' || su.last_name AS student_name,
    g.course_id, c.code AS course_code, c.name AS course_name, c.credits,
    g.semester_id, sem.name AS semester_name, g.score, g.letter_grade,
    g.comments, g.graded_by, g.created_at, g.updated_at"#;

pub const GRADE_JOINS: &str = r#"
    FROM grades g
    JOIN students s ON s.id = g.student_id
    JOIN users su ON su.id = s.user_id
    JOIN courses c ON c.id = g.course_id
    JOIN semesters sem ON sem.id = g.semester_id"#;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Grade {
    pub id: GradeId,
    pub student_id: StudentId,
    pub student_name: String,
    pub course_id: CourseId,
    pub course_code: String,
    pub course_name: String,
    pub credits: i32,
    pub semester_id: SemesterId,
    pub semester_name: String,
    pub score: Option<f64>,
    pub letter_grade: Option<String>,
    pub comments: Option<String>,
    pub graded_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn validate_letter(letter: &str) -> Result<(), ValidationError> {
    match grade_points(letter) {
        Some(_) => Ok(()),
        None => Err(ValidationError::new("letter_grade")
            .with_message("must be a letter grade from A+ to F".into())),
    }
}

/// Letter to store for a grade: the explicit letter when given, otherwise
/// the one derived from the score.
pub fn resolve_letter(score: Option<f64>, letter: Option<&str>) -> Option<String> {
    match letter {
        Some(letter) => Some(letter.trim().to_ascii_uppercase()),
        None => score.map(|s| letter_for_score(s).to_string()),
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateGradeDto {
    pub student_id: StudentId,
    pub course_id: CourseId,
    /// Defaults to the active semester
    pub semester_id: Option<SemesterId>,
    #[validate(range(min = 0.0, max = 100.0, message = "must be between 0 and 100"))]
    pub score: Option<f64>,
    /// Derived from the score when omitted
    #[validate(custom(function = "validate_letter"))]
    pub letter_grade: Option<String>,
    #[validate(length(max = 2000, message = "must be at most 2000 characters"))]
    pub comments: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateGradeDto {
    #[validate(range(min = 0.0, max = 100.0, message = "must be between 0 and 100"))]
    pub score: Option<f64>,
    #[validate(custom(function = "validate_letter"))]
    pub letter_grade: Option<String>,
    #[validate(length(max = 2000, message = "must be at most 2000 characters"))]
    pub comments: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct GradeFilterParams {
    pub student_id: Option<StudentId>,
    pub course_id: Option<CourseId>,
    pub semester_id: Option<SemesterId>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct GradeReportParams {
    pub course_id: Option<CourseId>,
    pub semester_id: Option<SemesterId>,
}

/// Score statistics over a set of grades.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GradeReport {
    pub course_id: Option<CourseId>,
    pub semester_id: Option<SemesterId>,
    pub total_grades: i64,
    pub graded_count: i64,
    pub average_score: f64,
    pub pass_mark: f64,
    pub pass_rate: f64,
    pub distribution: LetterDistribution,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create(score: Option<f64>, letter: Option<&str>) -> CreateGradeDto {
        CreateGradeDto {
            student_id: StudentId::new(),
            course_id: CourseId::new(),
            semester_id: None,
            score,
            letter_grade: letter.map(str::to_string),
            comments: None,
        }
    }

    #[test]
    fn test_score_range() {
        assert!(create(Some(100.0), None).validate().is_ok());
        assert!(create(Some(100.5), None).validate().is_err());
        assert!(create(Some(-1.0), None).validate().is_err());
        assert!(create(None, None).validate().is_ok());
    }

    #[test]
    fn test_letter_must_be_on_scale() {
        assert!(create(None, Some("B+")).validate().is_ok());
        assert!(create(None, Some("E")).validate().is_err());
    }

    #[test]
    fn test_resolve_letter() {
        assert_eq!(resolve_letter(Some(91.0), None).as_deref(), Some("A"));
        assert_eq!(resolve_letter(Some(91.0), Some("a-")).as_deref(), Some("A-"));
        assert_eq!(resolve_letter(None, None), None);
    }
}
