use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use registrar_core::{ErrorResponse, PaginationMeta};
use registrar_models::aggregate::{LetterDistribution, StudentStatusBreakdown, TrendPoint};
use registrar_models::courses::{Course, CourseDto, CourseStatus, CreateCourseDto, UpdateCourseDto};
use registrar_models::dashboard::{
    AdminDashboard, AtRiskStudent, ChildOverview, EnrollmentTrendReport, ParentDashboard,
    StudentDashboard, TeacherCourseSummary, TeacherDashboard,
};
use registrar_models::departments::{
    CreateDepartmentDto, Department, DepartmentWithStats, UpdateDepartmentDto,
};
use registrar_models::documents::{
    CreateDocumentDto, DocumentDto, DocumentStatus, ExpireDocumentsResponse, ReviewDecision,
    ReviewDocumentDto, UpdateDocumentStatusDto, UploadDocumentDto,
};
use registrar_models::enrollments::{
    CourseStudentDto, EnrollStudentDto, Enrollment, EnrollmentStatus, UpdateEnrollmentStatusDto,
};
use registrar_models::grades::{CreateGradeDto, Grade, GradeReport, UpdateGradeDto};
use registrar_models::parents::{LinkChildDto, ParentLink};
use registrar_models::recommendations::{
    CreateRecommendationDto, DeclineRecommendationDto, RecommendationDto, RecommendationPriority,
    RecommendationStatus, SubmitRecommendationDto,
};
use registrar_models::semesters::{CreateSemesterDto, Semester, UpdateSemesterDto};
use registrar_models::students::{StudentDto, StudentStatus, StudentSummary, UpdateStudentDto};
use registrar_models::teachers::{TeacherDto, TeacherStatus, UpdateTeacherDto};
use registrar_models::users::{
    CreateUserDto, ProfileResponse, UpdateUserStatusDto, UserDto, UserRole, UserStatus,
};

use crate::utils::response::{HealthResponse, MessageResponse};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::router::health,
        crate::modules::me::controller::get_profile,
        crate::modules::users::controller::create_user,
        crate::modules::users::controller::list_users,
        crate::modules::users::controller::get_user,
        crate::modules::users::controller::update_user_status,
        crate::modules::users::controller::delete_user,
        crate::modules::departments::controller::list_departments,
        crate::modules::departments::controller::get_department,
        crate::modules::departments::controller::create_department,
        crate::modules::departments::controller::update_department,
        crate::modules::departments::controller::delete_department,
        crate::modules::semesters::controller::list_semesters,
        crate::modules::semesters::controller::get_active_semester,
        crate::modules::semesters::controller::create_semester,
        crate::modules::semesters::controller::update_semester,
        crate::modules::semesters::controller::activate_semester,
        crate::modules::semesters::controller::delete_semester,
        crate::modules::students::controller::list_students,
        crate::modules::students::controller::get_student,
        crate::modules::students::controller::update_student,
        crate::modules::students::controller::get_student_summary,
        crate::modules::teachers::controller::list_teachers,
        crate::modules::teachers::controller::get_teacher,
        crate::modules::teachers::controller::update_teacher,
        crate::modules::courses::controller::list_courses,
        crate::modules::courses::controller::get_course,
        crate::modules::courses::controller::create_course,
        crate::modules::courses::controller::update_course,
        crate::modules::courses::controller::delete_course,
        crate::modules::courses::controller::enroll_student,
        crate::modules::courses::controller::update_enrollment_status,
        crate::modules::courses::controller::list_course_students,
        crate::modules::grades::controller::list_grades,
        crate::modules::grades::controller::create_grade,
        crate::modules::grades::controller::update_grade,
        crate::modules::grades::controller::delete_grade,
        crate::modules::documents::controller::list_documents,
        crate::modules::documents::controller::create_document,
        crate::modules::documents::controller::upload_document,
        crate::modules::documents::controller::review_document,
        crate::modules::documents::controller::reset_document,
        crate::modules::documents::controller::change_document_status,
        crate::modules::documents::controller::expire_documents,
        crate::modules::documents::controller::delete_document,
        crate::modules::recommendations::controller::list_recommendations,
        crate::modules::recommendations::controller::create_recommendation,
        crate::modules::recommendations::controller::submit_recommendation,
        crate::modules::recommendations::controller::decline_recommendation,
        crate::modules::recommendations::controller::delete_recommendation,
        crate::modules::parents::controller::link_child,
        crate::modules::parents::controller::unlink_child,
        crate::modules::parents::controller::list_my_children,
        crate::modules::dashboard::controller::admin_dashboard,
        crate::modules::dashboard::controller::teacher_dashboard,
        crate::modules::dashboard::controller::student_dashboard,
        crate::modules::dashboard::controller::parent_dashboard,
        crate::modules::reports::controller::grade_report,
        crate::modules::reports::controller::enrollment_trend_report,
    ),
    components(
        schemas(
            ErrorResponse,
            MessageResponse,
            HealthResponse,
            PaginationMeta,
            UserRole,
            UserStatus,
            UserDto,
            ProfileResponse,
            CreateUserDto,
            UpdateUserStatusDto,
            Department,
            DepartmentWithStats,
            CreateDepartmentDto,
            UpdateDepartmentDto,
            Semester,
            CreateSemesterDto,
            UpdateSemesterDto,
            StudentStatus,
            StudentDto,
            StudentSummary,
            UpdateStudentDto,
            TeacherStatus,
            TeacherDto,
            UpdateTeacherDto,
            CourseStatus,
            Course,
            CourseDto,
            CreateCourseDto,
            UpdateCourseDto,
            EnrollmentStatus,
            Enrollment,
            EnrollStudentDto,
            UpdateEnrollmentStatusDto,
            CourseStudentDto,
            Grade,
            CreateGradeDto,
            UpdateGradeDto,
            GradeReport,
            LetterDistribution,
            DocumentStatus,
            DocumentDto,
            CreateDocumentDto,
            UploadDocumentDto,
            ReviewDecision,
            ReviewDocumentDto,
            UpdateDocumentStatusDto,
            ExpireDocumentsResponse,
            RecommendationStatus,
            RecommendationPriority,
            RecommendationDto,
            CreateRecommendationDto,
            SubmitRecommendationDto,
            DeclineRecommendationDto,
            LinkChildDto,
            ParentLink,
            StudentStatusBreakdown,
            TrendPoint,
            AdminDashboard,
            AtRiskStudent,
            TeacherCourseSummary,
            TeacherDashboard,
            StudentDashboard,
            ChildOverview,
            ParentDashboard,
            EnrollmentTrendReport,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness check"),
        (name = "Profile", description = "The authenticated user"),
        (name = "Users", description = "User accounts and their profiles"),
        (name = "Departments", description = "Academic departments"),
        (name = "Semesters", description = "Semesters and the active semester"),
        (name = "Students", description = "Student records and progress"),
        (name = "Teachers", description = "Teacher profiles"),
        (name = "Courses", description = "Courses and enrollments"),
        (name = "Grades", description = "Grade entry and listing"),
        (name = "Documents", description = "Student document workflow"),
        (name = "Recommendations", description = "Recommendation letter requests"),
        (name = "Parents", description = "Parent to student links"),
        (name = "Dashboard", description = "Role dashboards"),
        (name = "Reports", description = "Grade and enrollment reports")
    ),
    info(
        title = "Registrar API",
        version = "0.1.0",
        description = "Academic records service: students, courses, grades, documents and recommendations, with role-based access for students, teachers, admins and parents.",
        license(
            name = "MIT"
        )
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_api_path_is_documented() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/health",
            "/api/me",
            "/api/semesters/{id}/activate",
            "/api/documents/{id}/reset",
            "/api/parents/me/children",
            "/api/dashboard/parent",
            "/api/reports/enrollment-trend",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }

    #[test]
    fn test_bearer_scheme_registered() {
        let doc = ApiDoc::openapi();
        let components = doc.components.unwrap();
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
