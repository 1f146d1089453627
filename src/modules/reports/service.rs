use chrono::{Duration, NaiveDate};
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::instrument;

use registrar_config::AcademicConfig;
use registrar_core::AppError;
use registrar_models::aggregate::{average_score, letter_distribution, monthly_trend, pass_rate};
use registrar_models::dashboard::EnrollmentTrendReport;
use registrar_models::grades::{GradeReport, GradeReportParams};

use crate::modules::grades::service::GradeService;
use crate::utils::access::RecordScope;

pub struct ReportService;

impl ReportService {
    /// Score statistics over the grades visible to `scope`, optionally
    /// narrowed to one course and one semester.
    #[instrument(skip(db, academic))]
    pub async fn grade_report(
        db: &PgPool,
        scope: &RecordScope,
        params: &GradeReportParams,
        academic: &AcademicConfig,
    ) -> Result<GradeReport, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new(
            "SELECT g.score FROM grades g JOIN courses c ON c.id = g.course_id WHERE TRUE",
        );
        GradeService::push_scope(&mut qb, scope);
        if let Some(course_id) = params.course_id {
            qb.push(" AND g.course_id = ").push_bind(course_id);
        }
        if let Some(semester_id) = params.semester_id {
            qb.push(" AND g.semester_id = ").push_bind(semester_id);
        }

        let scores = qb.build_query_scalar::<Option<f64>>().fetch_all(db).await?;

        Ok(GradeReport {
            course_id: params.course_id,
            semester_id: params.semester_id,
            total_grades: scores.len() as i64,
            graded_count: scores.iter().flatten().count() as i64,
            average_score: average_score(&scores),
            pass_mark: academic.pass_mark,
            pass_rate: pass_rate(&scores, academic.pass_mark),
            distribution: letter_distribution(&scores),
        })
    }

    /// Enrollments per month over the `months` months ending with `today`.
    #[instrument(skip(db))]
    pub async fn enrollment_trend(
        db: &PgPool,
        months: u32,
        today: NaiveDate,
    ) -> Result<EnrollmentTrendReport, AppError> {
        // Coarse lower bound; monthly_trend drops anything before the window.
        let since = today - Duration::days(i64::from(months) * 31);

        let dates = sqlx::query_scalar::<_, NaiveDate>(
            "SELECT (enrolled_at AT TIME ZONE 'UTC')::date FROM enrollments WHERE enrolled_at >= $1",
        )
        .bind(since)
        .fetch_all(db)
        .await?;

        let points = monthly_trend(&dates, months, today);
        let total = points.iter().map(|p| p.count).sum();

        Ok(EnrollmentTrendReport {
            months,
            points,
            total,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use registrar_models::{CourseId, TeacherId};

    struct Fixture {
        teacher_id: TeacherId,
        taught: CourseId,
        other: CourseId,
    }

    async fn fixture(pool: &PgPool) -> Fixture {
        let dept: uuid::Uuid =
            sqlx::query_scalar("INSERT INTO departments (code, name) VALUES ('CS', 'CS') RETURNING id")
                .fetch_one(pool)
                .await
                .unwrap();
        let teacher_user: uuid::Uuid = sqlx::query_scalar(
            "INSERT INTO users (external_id, email, first_name, last_name, role) VALUES ('tch', 'tch@example.com', 'T', 'C', 'teacher') RETURNING id",
        )
        .fetch_one(pool)
        .await
        .unwrap();
        let teacher_id = sqlx::query_scalar("INSERT INTO teachers (user_id) VALUES ($1) RETURNING id")
            .bind(teacher_user)
            .fetch_one(pool)
            .await
            .unwrap();
        let taught = sqlx::query_scalar(
            "INSERT INTO courses (code, name, credits, department_id, teacher_id) VALUES ('CS1', 'Intro', 3, $1, $2) RETURNING id",
        )
        .bind(dept)
        .bind(teacher_id)
        .fetch_one(pool)
        .await
        .unwrap();
        let other = sqlx::query_scalar(
            "INSERT INTO courses (code, name, credits, department_id) VALUES ('CS2', 'Systems', 4, $1) RETURNING id",
        )
        .bind(dept)
        .fetch_one(pool)
        .await
        .unwrap();
        let semester: uuid::Uuid = sqlx::query_scalar(
            "INSERT INTO semesters (name, start_date, end_date, is_active) VALUES ('Fall', '2025-09-01', '2025-12-20', TRUE) RETURNING id",
        )
        .fetch_one(pool)
        .await
        .unwrap();

        for (i, (course, score)) in [(taught, Some(95.0)), (taught, Some(40.0)), (taught, None), (other, Some(75.0))]
            .into_iter()
            .enumerate()
        {
            let user: uuid::Uuid = sqlx::query_scalar(
                "INSERT INTO users (external_id, email, first_name, last_name, role) VALUES ($1, $1 || '@example.com', 'S', 'T', 'student') RETURNING id",
            )
            .bind(format!("stu{i}"))
            .fetch_one(pool)
            .await
            .unwrap();
            let student: uuid::Uuid = sqlx::query_scalar(
                "INSERT INTO students (user_id, student_number) VALUES ($1, $2) RETURNING id",
            )
            .bind(user)
            .bind(format!("S{i}"))
            .fetch_one(pool)
            .await
            .unwrap();
            sqlx::query(
                "INSERT INTO grades (student_id, course_id, semester_id, score) VALUES ($1, $2, $3, $4)",
            )
            .bind(student)
            .bind(course)
            .bind(semester)
            .bind(score)
            .execute(pool)
            .await
            .unwrap();
        }

        Fixture {
            teacher_id,
            taught,
            other,
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_grade_report_all(pool: PgPool) {
        fixture(&pool).await;
        let report = ReportService::grade_report(
            &pool,
            &RecordScope::All,
            &GradeReportParams::default(),
            &AcademicConfig::default(),
        )
        .await
        .unwrap();

        assert_eq!(report.total_grades, 4);
        assert_eq!(report.graded_count, 3);
        assert_eq!(report.average_score, 70.0);
        assert_eq!(report.pass_rate, 66.67);
        assert_eq!(report.distribution.a, 1);
        assert_eq!(report.distribution.c, 1);
        assert_eq!(report.distribution.f, 1);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_grade_report_teacher_scope(pool: PgPool) {
        let f = fixture(&pool).await;
        let report = ReportService::grade_report(
            &pool,
            &RecordScope::Teacher(f.teacher_id),
            &GradeReportParams::default(),
            &AcademicConfig::default(),
        )
        .await
        .unwrap();
        assert_eq!(report.total_grades, 3);
        assert_eq!(report.average_score, 67.5);

        let params = GradeReportParams {
            course_id: Some(f.other),
            semester_id: None,
        };
        let report = ReportService::grade_report(
            &pool,
            &RecordScope::Teacher(f.teacher_id),
            &params,
            &AcademicConfig::default(),
        )
        .await
        .unwrap();
        assert_eq!(report.total_grades, 0);
        assert_eq!(report.average_score, 0.0);
        assert_eq!(report.pass_rate, 0.0);

        let params = GradeReportParams {
            course_id: Some(f.taught),
            semester_id: None,
        };
        let report = ReportService::grade_report(
            &pool,
            &RecordScope::All,
            &params,
            &AcademicConfig::default(),
        )
        .await
        .unwrap();
        assert_eq!(report.total_grades, 3);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_enrollment_trend_zero_filled(pool: PgPool) {
        let f = fixture(&pool).await;
        let semester: uuid::Uuid = sqlx::query_scalar("SELECT id FROM semesters LIMIT 1")
            .fetch_one(&pool)
            .await
            .unwrap();
        let students: Vec<uuid::Uuid> = sqlx::query_scalar("SELECT id FROM students ORDER BY student_number")
            .fetch_all(&pool)
            .await
            .unwrap();

        for (student, enrolled_at) in students.iter().zip(["2025-03-10", "2025-03-28", "2025-05-02", "2024-01-01"]) {
            sqlx::query(
                "INSERT INTO enrollments (student_id, course_id, semester_id, enrolled_at) VALUES ($1, $2, $3, $4::date)",
            )
            .bind(student)
            .bind(f.taught)
            .bind(semester)
            .bind(enrolled_at)
            .execute(&pool)
            .await
            .unwrap();
        }

        let today = NaiveDate::from_ymd_opt(2025, 5, 15).unwrap();
        let report = ReportService::enrollment_trend(&pool, 3, today).await.unwrap();

        let months: Vec<&str> = report.points.iter().map(|p| p.month.as_str()).collect();
        assert_eq!(months, vec!["2025-03", "2025-04", "2025-05"]);
        let counts: Vec<i64> = report.points.iter().map(|p| p.count).collect();
        assert_eq!(counts, vec![2, 0, 1]);
        assert_eq!(report.total, 3);
    }
}
