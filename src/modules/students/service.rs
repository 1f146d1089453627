use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};
use tracing::instrument;

use registrar_config::AcademicConfig;
use registrar_core::{AppError, Paginated};
use registrar_models::StudentId;
use registrar_models::aggregate::{
    AcademicStanding, GradedCredit, academic_standing, average_score, is_at_risk,
    letter_distribution, pass_rate,
};

use crate::modules::students::model::{
    STUDENT_COLUMNS, Student, StudentDto, StudentFilterParams, StudentSummary, UpdateStudentDto,
};
use crate::utils::access::RecordScope;

pub(crate) const STUDENT_FROM: &str = r#"
    FROM students s
    JOIN users u ON u.id = s.user_id
    LEFT JOIN departments d ON d.id = s.department_id"#;

pub struct StudentService;

impl StudentService {
    fn push_filters(
        qb: &mut QueryBuilder<'_, Postgres>,
        scope: &RecordScope,
        filters: &StudentFilterParams,
    ) {
        qb.push(" WHERE TRUE");

        match scope {
            RecordScope::All => {}
            RecordScope::Teacher(teacher_id) => {
                qb.push(
                    " AND EXISTS (SELECT 1 FROM enrollments e JOIN courses c ON c.id = e.course_id \
                     WHERE e.student_id = s.id AND c.teacher_id = ",
                )
                .push_bind(*teacher_id)
                .push(")");
            }
            RecordScope::Students(ids) => {
                qb.push(" AND s.id = ANY(").push_bind(ids.clone()).push(")");
            }
        }

        if let Some(status) = filters.status {
            qb.push(" AND s.status = ").push_bind(status);
        }
        if let Some(department_id) = filters.department_id {
            qb.push(" AND s.department_id = ").push_bind(department_id);
        }
        if let Some(search) = &filters.search {
            let pattern = format!("%{}%", search);
            qb.push(" AND (u.first_name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR u.last_name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR u.email ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR s.student_number ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
    }

    #[instrument(skip(db))]
    pub async fn list_students(
        db: &PgPool,
        scope: &RecordScope,
        filters: &StudentFilterParams,
    ) -> Result<Paginated<StudentDto>, AppError> {
        let mut count_query = QueryBuilder::<Postgres>::new("SELECT COUNT(*)");
        count_query.push(STUDENT_FROM);
        Self::push_filters(&mut count_query, scope, filters);
        let total = count_query
            .build_query_scalar::<i64>()
            .fetch_one(db)
            .await?;

        let mut data_query = QueryBuilder::<Postgres>::new("SELECT");
        data_query.push(STUDENT_COLUMNS).push(STUDENT_FROM);
        Self::push_filters(&mut data_query, scope, filters);
        data_query
            .push(" ORDER BY u.last_name, u.first_name, s.id LIMIT ")
            .push_bind(filters.pagination.limit())
            .push(" OFFSET ")
            .push_bind(filters.pagination.offset());

        let students = data_query
            .build_query_as::<Student>()
            .fetch_all(db)
            .await?;

        Ok(Paginated::new(students, total, &filters.pagination).map(StudentDto::from))
    }

    #[instrument(skip(db))]
    pub async fn get_student(db: &PgPool, id: StudentId) -> Result<Student, AppError> {
        let query = format!("SELECT {STUDENT_COLUMNS} {STUDENT_FROM} WHERE s.id = $1");
        sqlx::query_as::<_, Student>(&query)
            .bind(id)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Student not found")))
    }

    #[instrument(skip(db, dto))]
    pub async fn update_student(
        db: &PgPool,
        id: StudentId,
        dto: UpdateStudentDto,
    ) -> Result<Student, AppError> {
        let updated = sqlx::query_scalar::<_, StudentId>(
            r#"UPDATE students SET
                   student_number = COALESCE($2, student_number),
                   department_id = COALESCE($3, department_id),
                   gpa = COALESCE($4, gpa),
                   credits_earned = COALESCE($5, credits_earned),
                   credits_required = COALESCE($6, credits_required),
                   status = COALESCE($7, status),
                   updated_at = NOW()
               WHERE id = $1
               RETURNING id"#,
        )
        .bind(id)
        .bind(dto.student_number.as_deref().map(str::trim))
        .bind(dto.department_id)
        .bind(dto.gpa)
        .bind(dto.credits_earned)
        .bind(dto.credits_required)
        .bind(dto.status)
        .fetch_optional(db)
        .await
        .map_err(|e| AppError::database(e, "Student number already in use"))?;

        if updated.is_none() {
            return Err(AppError::not_found(anyhow::anyhow!("Student not found")));
        }

        Self::get_student(db, id).await
    }

    #[instrument(skip(db, academic))]
    pub async fn get_summary(
        db: &PgPool,
        id: StudentId,
        academic: &AcademicConfig,
    ) -> Result<StudentSummary, AppError> {
        let student = Self::get_student(db, id).await?;

        let scores = sqlx::query_scalar::<_, Option<f64>>(
            "SELECT score FROM grades WHERE student_id = $1",
        )
        .bind(id)
        .fetch_all(db)
        .await?;

        let enrolled_courses = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM enrollments WHERE student_id = $1 AND status = 'enrolled'",
        )
        .bind(id)
        .fetch_one(db)
        .await?;

        let graded_courses = scores.iter().filter(|s| s.is_some()).count() as i64;
        let average = average_score(&scores);

        Ok(StudentSummary {
            student: student.into(),
            average_score: average,
            pass_rate: pass_rate(&scores, academic.pass_mark),
            graded_courses,
            enrolled_courses,
            distribution: letter_distribution(&scores),
            at_risk: graded_courses > 0 && is_at_risk(average, academic.at_risk_threshold),
        })
    }

    /// Recompute GPA and earned credits from the student's stored grades.
    /// Runs on the caller's connection so grade writes can include it in
    /// their transaction.
    #[instrument(skip(conn))]
    pub async fn recompute_standing(
        conn: &mut PgConnection,
        student_id: StudentId,
    ) -> Result<AcademicStanding, AppError> {
        let grades = sqlx::query_as::<_, GradedCredit>(
            r#"SELECT g.letter_grade, c.credits
               FROM grades g
               JOIN courses c ON c.id = g.course_id
               WHERE g.student_id = $1"#,
        )
        .bind(student_id)
        .fetch_all(&mut *conn)
        .await?;

        let standing = academic_standing(&grades);

        sqlx::query(
            "UPDATE students SET gpa = $2, credits_earned = $3, updated_at = NOW() WHERE id = $1",
        )
        .bind(student_id)
        .bind(standing.gpa)
        .bind(standing.credits_earned)
        .execute(&mut *conn)
        .await?;

        Ok(standing)
    }
}
