//! Recommendation letter requests.
//!
//! A student asks a teacher for a letter. The teacher either submits the
//! letter or declines; both are final.

use chrono::{DateTime, NaiveDate, Utc};
use registrar_core::PaginationParams;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::display::Labeled;
use crate::ids::{RecommendationId, StudentId, TeacherId};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[sqlx(type_name = "recommendation_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RecommendationStatus {
    Pending,
    Submitted,
    Declined,
}

impl RecommendationStatus {
    pub fn can_transition_to(self, next: RecommendationStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Submitted) | (Self::Pending, Self::Declined)
        )
    }
}

impl Labeled for RecommendationStatus {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Submitted => "submitted",
            Self::Declined => "declined",
        }
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    sqlx::Type,
    ToSchema,
)]
#[sqlx(type_name = "recommendation_priority", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RecommendationPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl Labeled for RecommendationPriority {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// Column list matching [`Recommendation`]; `r` = recommendations,
/// `s`/`su` = student and its user, `t`/`tu` = teacher and its user.
pub const RECOMMENDATION_COLUMNS: &str = r#"
    r.id, r.student_id, su.first_name || ' ' || su.last_name AS student_name,
    r.teacher_id, tu.first_name || ' ' || tu.last_name AS teacher_name,
    r.purpose, r.institution, r.notes, r.deadline, r.priority, r.status,
    r.content, r.decline_reason, r.submitted_at, r.created_at, r.updated_at"#;

pub const RECOMMENDATION_JOINS: &str = r#"
    FROM recommendations r
    JOIN students s ON s.id = r.student_id
    JOIN users su ON su.id = s.user_id
    JOIN teachers t ON t.id = r.teacher_id
    JOIN users tu ON tu.id = t.user_id"#;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Recommendation {
    pub id: RecommendationId,
    pub student_id: StudentId,
    pub student_name: String,
    pub teacher_id: TeacherId,
    pub teacher_name: String,
    pub purpose: String,
    pub institution: Option<String>,
    pub notes: Option<String>,
    pub deadline: NaiveDate,
    pub priority: RecommendationPriority,
    pub status: RecommendationStatus,
    pub content: Option<String>,
    pub decline_reason: Option<String>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RecommendationDto {
    #[serde(flatten)]
    pub recommendation: Recommendation,
    pub status_label: String,
    pub priority_label: String,
}

impl From<Recommendation> for RecommendationDto {
    fn from(recommendation: Recommendation) -> Self {
        Self {
            status_label: recommendation.status.label(),
            priority_label: recommendation.priority.label(),
            recommendation,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateRecommendationDto {
    pub teacher_id: TeacherId,
    #[validate(length(min = 1, max = 500, message = "must be 1-500 characters"))]
    pub purpose: String,
    #[validate(length(max = 200, message = "must be at most 200 characters"))]
    pub institution: Option<String>,
    #[validate(length(max = 2000, message = "must be at most 2000 characters"))]
    pub notes: Option<String>,
    /// Must not be in the past
    pub deadline: NaiveDate,
    #[serde(default)]
    pub priority: RecommendationPriority,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct SubmitRecommendationDto {
    #[validate(length(min = 1, max = 20000, message = "must be 1-20000 characters"))]
    pub content: String,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct DeclineRecommendationDto {
    #[validate(length(max = 2000, message = "must be at most 2000 characters"))]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct RecommendationFilterParams {
    pub status: Option<RecommendationStatus>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[cfg(test)]
mod tests {
    use super::*;
    use RecommendationStatus::*;

    #[test]
    fn test_only_pending_moves() {
        assert!(Pending.can_transition_to(Submitted));
        assert!(Pending.can_transition_to(Declined));
        for from in [Submitted, Declined] {
            for to in [Pending, Submitted, Declined] {
                assert!(!from.can_transition_to(to));
            }
        }
        assert!(!Pending.can_transition_to(Pending));
    }

    #[test]
    fn test_priority_defaults_to_medium() {
        let dto: CreateRecommendationDto = serde_json::from_str(
            r#"{"teacher_id":"12345678-1234-1234-1234-123456789abc","purpose":"Graduate school","deadline":"2030-01-15"}"#,
        )
        .unwrap();
        assert_eq!(dto.priority, RecommendationPriority::Medium);
        assert!(dto.validate().is_ok());
    }
}
