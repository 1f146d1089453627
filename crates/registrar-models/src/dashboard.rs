//! Role dashboards. Each is assembled by the dashboard service from
//! aggregator output.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::aggregate::{StudentStatusBreakdown, TrendPoint};
use crate::grades::Grade;
use crate::ids::{CourseId, StudentId};
use crate::semesters::Semester;
use crate::students::StudentDto;
use crate::teachers::TeacherDto;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AdminDashboard {
    pub total_students: i64,
    pub total_teachers: i64,
    pub total_courses: i64,
    pub total_departments: i64,
    pub active_semester: Option<Semester>,
    pub students: StudentStatusBreakdown,
    pub average_score: f64,
    pub pass_rate: f64,
    pub documents_pending: i64,
    pub documents_awaiting_review: i64,
    pub enrollment_trend: Vec<TrendPoint>,
}

/// A student whose average across graded courses is below the threshold.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AtRiskStudent {
    pub student_id: StudentId,
    pub display_id: String,
    pub name: String,
    pub average_score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TeacherCourseSummary {
    pub course_id: CourseId,
    pub code: String,
    pub name: String,
    pub enrolled_count: i64,
    pub average_score: f64,
    pub pass_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TeacherDashboard {
    pub teacher: TeacherDto,
    pub courses: Vec<TeacherCourseSummary>,
    pub student_count: i64,
    pub average_score: f64,
    pub recommendations_pending: i64,
    pub documents_awaiting_review: i64,
    pub at_risk_students: Vec<AtRiskStudent>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StudentDashboard {
    pub student: StudentDto,
    pub average_score: f64,
    pub enrolled_courses: i64,
    pub documents_pending: i64,
    pub documents_overdue: i64,
    pub recommendations_pending: i64,
    pub recent_grades: Vec<Grade>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChildOverview {
    pub student: StudentDto,
    pub average_score: f64,
    pub documents_pending: i64,
    pub recent_grades: Vec<Grade>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ParentDashboard {
    pub children: Vec<ChildOverview>,
}

#[derive(Debug, Clone, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct TrendParams {
    /// Number of months ending with the current one (1-36, default 6)
    pub months: Option<u32>,
}

impl TrendParams {
    pub const DEFAULT_MONTHS: u32 = 6;
    pub const MAX_MONTHS: u32 = 36;

    pub fn months(&self) -> u32 {
        self.months
            .unwrap_or(Self::DEFAULT_MONTHS)
            .clamp(1, Self::MAX_MONTHS)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EnrollmentTrendReport {
    pub months: u32,
    pub points: Vec<TrendPoint>,
    pub total: i64,
}
