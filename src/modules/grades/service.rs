//! Grade persistence.
//!
//! Every write runs in a transaction that also recomputes the student's GPA
//! and earned credits, so the stored standing never lags the grades.

use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};
use tracing::{info, instrument};

use registrar_core::{AppError, Paginated};
use registrar_models::{GradeId, StudentId, UserId};
use registrar_observability::track_grade_recorded;

use crate::modules::grades::model::{
    CreateGradeDto, GRADE_COLUMNS, GRADE_JOINS, Grade, GradeFilterParams, UpdateGradeDto,
    resolve_letter,
};
use crate::modules::semesters::service::SemesterService;
use crate::modules::students::service::StudentService;
use crate::utils::access::RecordScope;

pub struct GradeService;

impl GradeService {
    /// Scope predicate shared by listing, reports and dashboards.
    pub fn push_scope(qb: &mut QueryBuilder<'_, Postgres>, scope: &RecordScope) {
        match scope {
            RecordScope::All => {}
            RecordScope::Teacher(teacher_id) => {
                qb.push(" AND c.teacher_id = ").push_bind(*teacher_id);
            }
            RecordScope::Students(ids) => {
                qb.push(" AND g.student_id = ANY(").push_bind(ids.clone()).push(")");
            }
        }
    }

    fn push_filters(
        qb: &mut QueryBuilder<'_, Postgres>,
        scope: &RecordScope,
        filters: &GradeFilterParams,
    ) {
        qb.push(" WHERE TRUE");
        Self::push_scope(qb, scope);
        if let Some(student_id) = filters.student_id {
            qb.push(" AND g.student_id = ").push_bind(student_id);
        }
        if let Some(course_id) = filters.course_id {
            qb.push(" AND g.course_id = ").push_bind(course_id);
        }
        if let Some(semester_id) = filters.semester_id {
            qb.push(" AND g.semester_id = ").push_bind(semester_id);
        }
    }

    #[instrument(skip(db))]
    pub async fn list_grades(
        db: &PgPool,
        scope: &RecordScope,
        filters: &GradeFilterParams,
    ) -> Result<Paginated<Grade>, AppError> {
        let mut count_query = QueryBuilder::<Postgres>::new("SELECT COUNT(*)");
        count_query.push(GRADE_JOINS);
        Self::push_filters(&mut count_query, scope, filters);
        let total = count_query
            .build_query_scalar::<i64>()
            .fetch_one(db)
            .await?;

        let mut data_query = QueryBuilder::<Postgres>::new("SELECT");
        data_query.push(GRADE_COLUMNS).push(GRADE_JOINS);
        Self::push_filters(&mut data_query, scope, filters);
        data_query
            .push(" ORDER BY g.updated_at DESC, g.id LIMIT ")
            .push_bind(filters.pagination.limit())
            .push(" OFFSET ")
            .push_bind(filters.pagination.offset());

        let grades = data_query.build_query_as::<Grade>().fetch_all(db).await?;
        Ok(Paginated::new(grades, total, &filters.pagination))
    }

    async fn fetch(conn: &mut PgConnection, id: GradeId) -> Result<Grade, AppError> {
        sqlx::query_as::<_, Grade>(&format!(
            "SELECT {GRADE_COLUMNS} {GRADE_JOINS} WHERE g.id = $1"
        ))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Grade not found")))
    }

    #[instrument(skip(db))]
    pub async fn get_grade(db: &PgPool, id: GradeId) -> Result<Grade, AppError> {
        let mut conn = db.acquire().await?;
        Self::fetch(&mut *conn, id).await
    }

    /// Record a grade. Course access is checked by the caller.
    #[instrument(skip(db, dto))]
    pub async fn create_grade(
        db: &PgPool,
        graded_by: UserId,
        dto: CreateGradeDto,
    ) -> Result<Grade, AppError> {
        let student_exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM students WHERE id = $1)",
        )
        .bind(dto.student_id)
        .fetch_one(db)
        .await?;
        if !student_exists {
            return Err(AppError::not_found(anyhow::anyhow!("Student not found")));
        }

        let semester_id = SemesterService::resolve(db, dto.semester_id).await?;
        let letter = resolve_letter(dto.score, dto.letter_grade.as_deref());

        let mut tx = db.begin().await?;

        let id = sqlx::query_scalar::<_, GradeId>(
            r#"INSERT INTO grades
                   (student_id, course_id, semester_id, score, letter_grade, comments, graded_by)
               VALUES ($1, $2, $3, $4, $5, $6, $7)
               RETURNING id"#,
        )
        .bind(dto.student_id)
        .bind(dto.course_id)
        .bind(semester_id)
        .bind(dto.score)
        .bind(letter)
        .bind(dto.comments)
        .bind(graded_by)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            AppError::database(
                e,
                "A grade for this student, course and semester already exists",
            )
        })?;

        StudentService::recompute_standing(&mut *tx, dto.student_id).await?;
        let grade = Self::fetch(&mut *tx, id).await?;
        tx.commit().await?;

        info!(grade_id = %grade.id, student_id = %grade.student_id, "Grade recorded");
        track_grade_recorded("created");
        Ok(grade)
    }

    /// Update score, letter or comments. A new score without a letter
    /// re-derives the letter.
    #[instrument(skip(db, dto))]
    pub async fn update_grade(
        db: &PgPool,
        id: GradeId,
        graded_by: UserId,
        dto: UpdateGradeDto,
    ) -> Result<Grade, AppError> {
        let mut tx = db.begin().await?;
        let current = Self::fetch(&mut *tx, id).await?;

        let score = dto.score.or(current.score);
        let letter = match (dto.score, dto.letter_grade.as_deref()) {
            (None, None) => current.letter_grade.clone(),
            (_, explicit) => resolve_letter(score, explicit),
        };

        sqlx::query(
            r#"UPDATE grades SET
                   score = $2,
                   letter_grade = $3,
                   comments = COALESCE($4, comments),
                   graded_by = $5,
                   updated_at = NOW()
               WHERE id = $1"#,
        )
        .bind(id)
        .bind(score)
        .bind(letter)
        .bind(dto.comments)
        .bind(graded_by)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::database(e, "Grade update conflicts with an existing grade"))?;

        StudentService::recompute_standing(&mut *tx, current.student_id).await?;
        let grade = Self::fetch(&mut *tx, id).await?;
        tx.commit().await?;

        track_grade_recorded("updated");
        Ok(grade)
    }

    #[instrument(skip(db))]
    pub async fn delete_grade(db: &PgPool, id: GradeId) -> Result<(), AppError> {
        let mut tx = db.begin().await?;

        let student_id = sqlx::query_scalar::<_, StudentId>(
            "DELETE FROM grades WHERE id = $1 RETURNING student_id",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Grade not found")))?;

        StudentService::recompute_standing(&mut *tx, student_id).await?;
        tx.commit().await?;

        track_grade_recorded("deleted");
        Ok(())
    }
}
