//! Role dashboards.
//!
//! Each dashboard loads the raw rows it needs and hands them to the
//! aggregator in `registrar_models::aggregate`; no statistics are computed
//! in SQL.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use sqlx::{FromRow, PgPool};
use tracing::instrument;

use registrar_config::AcademicConfig;
use registrar_core::AppError;
use registrar_models::aggregate::{
    StudentStanding, average_score, is_at_risk, pass_rate, student_breakdown,
};
use registrar_models::dashboard::{
    AdminDashboard, AtRiskStudent, ChildOverview, ParentDashboard, StudentDashboard,
    TeacherCourseSummary, TeacherDashboard, TrendParams,
};
use registrar_models::display::display_id;
use registrar_models::grades::{GRADE_COLUMNS, GRADE_JOINS, Grade};
use registrar_models::{CourseId, StudentId, TeacherId, UserId};

use crate::modules::parents::service::ParentService;
use crate::modules::reports::service::ReportService;
use crate::modules::semesters::service::SemesterService;
use crate::modules::students::service::StudentService;
use crate::modules::teachers::service::TeacherService;

const RECENT_GRADES: i64 = 5;

#[derive(Debug, FromRow)]
struct CourseRow {
    id: CourseId,
    code: String,
    name: String,
    enrolled_count: i64,
}

#[derive(Debug, FromRow)]
struct TeacherGradeRow {
    course_id: CourseId,
    student_id: StudentId,
    student_name: String,
    score: Option<f64>,
}

pub struct DashboardService;

impl DashboardService {
    async fn student_scores(db: &PgPool, student_id: StudentId) -> Result<Vec<Option<f64>>, AppError> {
        let scores =
            sqlx::query_scalar::<_, Option<f64>>("SELECT score FROM grades WHERE student_id = $1")
                .bind(student_id)
                .fetch_all(db)
                .await?;
        Ok(scores)
    }

    async fn recent_grades(db: &PgPool, student_id: StudentId) -> Result<Vec<Grade>, AppError> {
        let grades = sqlx::query_as::<_, Grade>(&format!(
            "SELECT {GRADE_COLUMNS} {GRADE_JOINS} WHERE g.student_id = $1 ORDER BY g.updated_at DESC, g.id LIMIT $2"
        ))
        .bind(student_id)
        .bind(RECENT_GRADES)
        .fetch_all(db)
        .await?;
        Ok(grades)
    }

    async fn pending_documents(db: &PgPool, student_id: StudentId) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM documents WHERE student_id = $1 AND status = 'pending'",
        )
        .bind(student_id)
        .fetch_one(db)
        .await?;
        Ok(count)
    }

    #[instrument(skip(db, academic))]
    pub async fn admin(
        db: &PgPool,
        academic: &AcademicConfig,
        today: NaiveDate,
    ) -> Result<AdminDashboard, AppError> {
        let (total_students, total_teachers, total_courses, total_departments) =
            sqlx::query_as::<_, (i64, i64, i64, i64)>(
                r#"SELECT
                       (SELECT COUNT(*) FROM students),
                       (SELECT COUNT(*) FROM teachers),
                       (SELECT COUNT(*) FROM courses),
                       (SELECT COUNT(*) FROM departments)"#,
            )
            .fetch_one(db)
            .await?;

        let standings = sqlx::query_as::<_, StudentStanding>("SELECT status, gpa FROM students")
            .fetch_all(db)
            .await?;

        let scores = sqlx::query_scalar::<_, Option<f64>>("SELECT score FROM grades")
            .fetch_all(db)
            .await?;

        let (documents_pending, documents_awaiting_review) = sqlx::query_as::<_, (i64, i64)>(
            r#"SELECT
                   COUNT(*) FILTER (WHERE status = 'pending'),
                   COUNT(*) FILTER (WHERE status = 'uploaded')
               FROM documents"#,
        )
        .fetch_one(db)
        .await?;

        let trend = ReportService::enrollment_trend(db, TrendParams::DEFAULT_MONTHS, today).await?;

        Ok(AdminDashboard {
            total_students,
            total_teachers,
            total_courses,
            total_departments,
            active_semester: SemesterService::find_active(db).await?,
            students: student_breakdown(&standings),
            average_score: average_score(&scores),
            pass_rate: pass_rate(&scores, academic.pass_mark),
            documents_pending,
            documents_awaiting_review,
            enrollment_trend: trend.points,
        })
    }

    #[instrument(skip(db, academic))]
    pub async fn teacher(
        db: &PgPool,
        teacher_id: TeacherId,
        academic: &AcademicConfig,
    ) -> Result<TeacherDashboard, AppError> {
        let teacher = TeacherService::get_teacher(db, teacher_id).await?;

        let courses = sqlx::query_as::<_, CourseRow>(
            r#"SELECT c.id, c.code, c.name,
                      (SELECT COUNT(*) FROM enrollments e
                       WHERE e.course_id = c.id AND e.status = 'enrolled') AS enrolled_count
               FROM courses c
               WHERE c.teacher_id = $1
               ORDER BY c.code"#,
        )
        .bind(teacher_id)
        .fetch_all(db)
        .await?;

        let grades = sqlx::query_as::<_, TeacherGradeRow>(
            r#"SELECT g.course_id, g.student_id,
                      su.first_name || ' ' || su.last_name AS student_name, g.score
               FROM grades g
               JOIN courses c ON c.id = g.course_id
               JOIN students s ON s.id = g.student_id
               JOIN users su ON su.id = s.user_id
               WHERE c.teacher_id = $1"#,
        )
        .bind(teacher_id)
        .fetch_all(db)
        .await?;

        let student_count = sqlx::query_scalar::<_, i64>(
            r#"SELECT COUNT(DISTINCT e.student_id)
               FROM enrollments e
               JOIN courses c ON c.id = e.course_id
               WHERE c.teacher_id = $1 AND e.status = 'enrolled'"#,
        )
        .bind(teacher_id)
        .fetch_one(db)
        .await?;

        let recommendations_pending = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM recommendations WHERE teacher_id = $1 AND status = 'pending'",
        )
        .bind(teacher_id)
        .fetch_one(db)
        .await?;

        let documents_awaiting_review = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM documents WHERE status = 'uploaded'",
        )
        .fetch_one(db)
        .await?;

        let course_summaries = courses
            .into_iter()
            .map(|course| {
                let scores: Vec<Option<f64>> = grades
                    .iter()
                    .filter(|g| g.course_id == course.id)
                    .map(|g| g.score)
                    .collect();
                TeacherCourseSummary {
                    course_id: course.id,
                    code: course.code,
                    name: course.name,
                    enrolled_count: course.enrolled_count,
                    average_score: average_score(&scores),
                    pass_rate: pass_rate(&scores, academic.pass_mark),
                }
            })
            .collect();

        let mut by_student: BTreeMap<StudentId, (&str, Vec<Option<f64>>)> = BTreeMap::new();
        for row in &grades {
            by_student
                .entry(row.student_id)
                .or_insert_with(|| (row.student_name.as_str(), Vec::new()))
                .1
                .push(row.score);
        }

        let mut at_risk_students: Vec<AtRiskStudent> = by_student
            .into_iter()
            .filter(|(_, (_, scores))| scores.iter().any(Option::is_some))
            .filter_map(|(student_id, (name, scores))| {
                let average = average_score(&scores);
                is_at_risk(average, academic.at_risk_threshold).then(|| AtRiskStudent {
                    student_id,
                    display_id: display_id("STU", student_id.as_uuid()),
                    name: name.to_string(),
                    average_score: average,
                })
            })
            .collect();
        at_risk_students.sort_by(|a, b| a.average_score.total_cmp(&b.average_score));

        let all_scores: Vec<Option<f64>> = grades.iter().map(|g| g.score).collect();

        Ok(TeacherDashboard {
            teacher: teacher.into(),
            courses: course_summaries,
            student_count,
            average_score: average_score(&all_scores),
            recommendations_pending,
            documents_awaiting_review,
            at_risk_students,
        })
    }

    #[instrument(skip(db))]
    pub async fn student(
        db: &PgPool,
        student_id: StudentId,
        today: NaiveDate,
    ) -> Result<StudentDashboard, AppError> {
        let student = StudentService::get_student(db, student_id).await?;
        let scores = Self::student_scores(db, student_id).await?;

        let enrolled_courses = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM enrollments WHERE student_id = $1 AND status = 'enrolled'",
        )
        .bind(student_id)
        .fetch_one(db)
        .await?;

        let documents_overdue = sqlx::query_scalar::<_, i64>(
            r#"SELECT COUNT(*) FROM documents
               WHERE student_id = $1 AND status = 'pending' AND due_date < $2"#,
        )
        .bind(student_id)
        .bind(today)
        .fetch_one(db)
        .await?;

        let recommendations_pending = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM recommendations WHERE student_id = $1 AND status = 'pending'",
        )
        .bind(student_id)
        .fetch_one(db)
        .await?;

        Ok(StudentDashboard {
            student: student.into(),
            average_score: average_score(&scores),
            enrolled_courses,
            documents_pending: Self::pending_documents(db, student_id).await?,
            documents_overdue,
            recommendations_pending,
            recent_grades: Self::recent_grades(db, student_id).await?,
        })
    }

    #[instrument(skip(db))]
    pub async fn parent(db: &PgPool, parent_id: UserId) -> Result<ParentDashboard, AppError> {
        let mut children = Vec::new();
        for child in ParentService::list_children(db, parent_id).await? {
            let scores = Self::student_scores(db, child.id).await?;
            children.push(ChildOverview {
                average_score: average_score(&scores),
                documents_pending: Self::pending_documents(db, child.id).await?,
                recent_grades: Self::recent_grades(db, child.id).await?,
                student: child.into(),
            });
        }
        Ok(ParentDashboard { children })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    struct Fixture {
        teacher_id: TeacherId,
        parent_id: UserId,
        strong: StudentId,
        weak: StudentId,
    }

    async fn user(pool: &PgPool, external_id: &str, role: &str) -> uuid::Uuid {
        sqlx::query_scalar(
            "INSERT INTO users (external_id, email, first_name, last_name, role) VALUES ($1, $1 || '@example.com', $1, 'L', $2::user_role) RETURNING id",
        )
        .bind(external_id)
        .bind(role)
        .fetch_one(pool)
        .await
        .unwrap()
    }

    async fn fixture(pool: &PgPool) -> Fixture {
        let dept: uuid::Uuid =
            sqlx::query_scalar("INSERT INTO departments (code, name) VALUES ('CS', 'CS') RETURNING id")
                .fetch_one(pool)
                .await
                .unwrap();
        let teacher_user = user(pool, "tch", "teacher").await;
        let teacher_id = sqlx::query_scalar("INSERT INTO teachers (user_id) VALUES ($1) RETURNING id")
            .bind(teacher_user)
            .fetch_one(pool)
            .await
            .unwrap();
        let course: uuid::Uuid = sqlx::query_scalar(
            "INSERT INTO courses (code, name, credits, department_id, teacher_id) VALUES ('CS1', 'Intro', 3, $1, $2) RETURNING id",
        )
        .bind(dept)
        .bind(teacher_id)
        .fetch_one(pool)
        .await
        .unwrap();
        let semester: uuid::Uuid = sqlx::query_scalar(
            "INSERT INTO semesters (name, start_date, end_date, is_active) VALUES ('Fall', '2025-09-01', '2025-12-20', TRUE) RETURNING id",
        )
        .fetch_one(pool)
        .await
        .unwrap();

        let mut students = Vec::new();
        for (name, score, gpa) in [("strong", 92.0, 4.0), ("weak", 55.0, 0.0)] {
            let user_id = user(pool, name, "student").await;
            let student_id: StudentId = sqlx::query_scalar(
                "INSERT INTO students (user_id, student_number, gpa) VALUES ($1, $2, $3) RETURNING id",
            )
            .bind(user_id)
            .bind(name)
            .bind(gpa)
            .fetch_one(pool)
            .await
            .unwrap();
            sqlx::query(
                "INSERT INTO enrollments (student_id, course_id, semester_id) VALUES ($1, $2, $3)",
            )
            .bind(student_id)
            .bind(course)
            .bind(semester)
            .execute(pool)
            .await
            .unwrap();
            sqlx::query(
                "INSERT INTO grades (student_id, course_id, semester_id, score, letter_grade) VALUES ($1, $2, $3, $4, 'A')",
            )
            .bind(student_id)
            .bind(course)
            .bind(semester)
            .bind(score)
            .execute(pool)
            .await
            .unwrap();
            students.push(student_id);
        }

        let parent_id = UserId::from(user(pool, "par", "parent").await);
        sqlx::query("INSERT INTO parent_students (parent_id, student_id) VALUES ($1, $2)")
            .bind(parent_id)
            .bind(students[1])
            .execute(pool)
            .await
            .unwrap();

        sqlx::query(
            "INSERT INTO documents (student_id, title, document_type, due_date) VALUES ($1, 'Transcript', 'transcript', '2000-01-01')",
        )
        .bind(students[1])
        .execute(pool)
        .await
        .unwrap();

        Fixture {
            teacher_id,
            parent_id,
            strong: students[0],
            weak: students[1],
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_admin_dashboard(pool: PgPool) {
        fixture(&pool).await;
        let today = Utc::now().date_naive();
        let dashboard = DashboardService::admin(&pool, &AcademicConfig::default(), today)
            .await
            .unwrap();

        assert_eq!(dashboard.total_students, 2);
        assert_eq!(dashboard.total_teachers, 1);
        assert_eq!(dashboard.total_courses, 1);
        assert_eq!(dashboard.total_departments, 1);
        assert!(dashboard.active_semester.is_some());
        assert_eq!(dashboard.students.active, 2);
        // The zero GPA is excluded from the mean.
        assert_eq!(dashboard.students.average_gpa, 4.0);
        assert_eq!(dashboard.average_score, 73.5);
        assert_eq!(dashboard.pass_rate, 50.0);
        assert_eq!(dashboard.documents_pending, 1);
        assert_eq!(dashboard.enrollment_trend.len(), TrendParams::DEFAULT_MONTHS as usize);
        assert_eq!(dashboard.enrollment_trend.last().unwrap().count, 2);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_teacher_dashboard_flags_at_risk(pool: PgPool) {
        let f = fixture(&pool).await;
        let dashboard = DashboardService::teacher(&pool, f.teacher_id, &AcademicConfig::default())
            .await
            .unwrap();

        assert_eq!(dashboard.courses.len(), 1);
        assert_eq!(dashboard.courses[0].enrolled_count, 2);
        assert_eq!(dashboard.student_count, 2);
        assert_eq!(dashboard.at_risk_students.len(), 1);
        assert_eq!(dashboard.at_risk_students[0].student_id, f.weak);
        assert_eq!(dashboard.at_risk_students[0].average_score, 55.0);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_student_dashboard(pool: PgPool) {
        let f = fixture(&pool).await;
        let today = Utc::now().date_naive();

        let dashboard = DashboardService::student(&pool, f.weak, today).await.unwrap();
        assert_eq!(dashboard.average_score, 55.0);
        assert_eq!(dashboard.enrolled_courses, 1);
        assert_eq!(dashboard.documents_pending, 1);
        assert_eq!(dashboard.documents_overdue, 1);
        assert_eq!(dashboard.recent_grades.len(), 1);

        let dashboard = DashboardService::student(&pool, f.strong, today).await.unwrap();
        assert_eq!(dashboard.documents_pending, 0);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_parent_dashboard_lists_linked_children_only(pool: PgPool) {
        let f = fixture(&pool).await;
        let dashboard = DashboardService::parent(&pool, f.parent_id).await.unwrap();

        assert_eq!(dashboard.children.len(), 1);
        assert_eq!(dashboard.children[0].student.id, f.weak);
        assert_eq!(dashboard.children[0].documents_pending, 1);
    }
}
