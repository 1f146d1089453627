use chrono::NaiveDate;
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};
use tracing::{info, instrument};

use registrar_core::{AppError, Paginated};
use registrar_models::teachers::TeacherStatus;
use registrar_models::{Labeled, RecommendationId, StudentId, TeacherId};
use registrar_observability::track_recommendation_decision;

use crate::modules::recommendations::model::{
    CreateRecommendationDto, RECOMMENDATION_COLUMNS, RECOMMENDATION_JOINS, Recommendation,
    RecommendationDto, RecommendationFilterParams, RecommendationStatus,
};
use crate::utils::access::RecordScope;

pub struct RecommendationService;

impl RecommendationService {
    fn push_filters(
        qb: &mut QueryBuilder<'_, Postgres>,
        scope: &RecordScope,
        filters: &RecommendationFilterParams,
    ) {
        qb.push(" WHERE TRUE");
        match scope {
            RecordScope::All => {}
            RecordScope::Teacher(teacher_id) => {
                qb.push(" AND r.teacher_id = ").push_bind(*teacher_id);
            }
            RecordScope::Students(ids) => {
                qb.push(" AND r.student_id = ANY(").push_bind(ids.clone()).push(")");
            }
        }
        if let Some(status) = filters.status {
            qb.push(" AND r.status = ").push_bind(status);
        }
    }

    #[instrument(skip(db))]
    pub async fn list_recommendations(
        db: &PgPool,
        scope: &RecordScope,
        filters: &RecommendationFilterParams,
    ) -> Result<Paginated<RecommendationDto>, AppError> {
        let mut count_query = QueryBuilder::<Postgres>::new("SELECT COUNT(*)");
        count_query.push(RECOMMENDATION_JOINS);
        Self::push_filters(&mut count_query, scope, filters);
        let total = count_query
            .build_query_scalar::<i64>()
            .fetch_one(db)
            .await?;

        let mut data_query = QueryBuilder::<Postgres>::new("SELECT");
        data_query
            .push(RECOMMENDATION_COLUMNS)
            .push(RECOMMENDATION_JOINS);
        Self::push_filters(&mut data_query, scope, filters);
        data_query
            .push(" ORDER BY r.deadline ASC, r.created_at DESC LIMIT ")
            .push_bind(filters.pagination.limit())
            .push(" OFFSET ")
            .push_bind(filters.pagination.offset());

        let rows = data_query
            .build_query_as::<Recommendation>()
            .fetch_all(db)
            .await?;

        Ok(Paginated::new(rows, total, &filters.pagination).map(RecommendationDto::from))
    }

    async fn fetch(
        conn: &mut PgConnection,
        id: RecommendationId,
        lock: bool,
    ) -> Result<Recommendation, AppError> {
        let mut query =
            format!("SELECT {RECOMMENDATION_COLUMNS} {RECOMMENDATION_JOINS} WHERE r.id = $1");
        if lock {
            query.push_str(" FOR UPDATE OF r");
        }
        sqlx::query_as::<_, Recommendation>(&query)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Recommendation not found")))
    }

    #[instrument(skip(db))]
    pub async fn get_recommendation(
        db: &PgPool,
        id: RecommendationId,
    ) -> Result<Recommendation, AppError> {
        let mut conn = db.acquire().await?;
        Self::fetch(&mut *conn, id, false).await
    }

    /// Ask a teacher for a letter. The deadline may be today but not
    /// earlier, and the teacher must be active.
    #[instrument(skip(db, dto))]
    pub async fn create_recommendation(
        db: &PgPool,
        student_id: StudentId,
        dto: CreateRecommendationDto,
        today: NaiveDate,
    ) -> Result<Recommendation, AppError> {
        if dto.deadline < today {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "Deadline must not be in the past"
            )));
        }

        let teacher_status = sqlx::query_scalar::<_, TeacherStatus>(
            "SELECT status FROM teachers WHERE id = $1",
        )
        .bind(dto.teacher_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Teacher not found")))?;

        if teacher_status != TeacherStatus::Active {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "Teacher is not accepting recommendation requests"
            )));
        }

        let id = sqlx::query_scalar::<_, RecommendationId>(
            r#"INSERT INTO recommendations
                   (student_id, teacher_id, purpose, institution, notes, deadline, priority)
               VALUES ($1, $2, $3, $4, $5, $6, $7)
               RETURNING id"#,
        )
        .bind(student_id)
        .bind(dto.teacher_id)
        .bind(dto.purpose.trim())
        .bind(dto.institution.as_deref().map(str::trim))
        .bind(dto.notes)
        .bind(dto.deadline)
        .bind(dto.priority)
        .fetch_one(db)
        .await
        .map_err(|e| AppError::database(e, "Recommendation request already exists"))?;

        info!(recommendation_id = %id, teacher_id = %dto.teacher_id, "Recommendation requested");
        Self::get_recommendation(db, id).await
    }

    async fn decide(
        db: &PgPool,
        id: RecommendationId,
        teacher_id: TeacherId,
        next: RecommendationStatus,
        text: Option<&str>,
    ) -> Result<Recommendation, AppError> {
        let mut tx = db.begin().await?;
        let current = Self::fetch(&mut *tx, id, true).await?;

        if current.teacher_id != teacher_id {
            return Err(AppError::forbidden(
                "This recommendation is addressed to another teacher",
            ));
        }
        if !current.status.can_transition_to(next) {
            return Err(AppError::conflict(anyhow::anyhow!(
                "Recommendation is already {}",
                current.status.as_str()
            )));
        }

        match next {
            RecommendationStatus::Submitted => {
                sqlx::query(
                    r#"UPDATE recommendations
                       SET status = $2, content = $3, submitted_at = NOW(), updated_at = NOW()
                       WHERE id = $1"#,
                )
                .bind(id)
                .bind(next)
                .bind(text)
                .execute(&mut *tx)
                .await?;
            }
            RecommendationStatus::Declined => {
                sqlx::query(
                    r#"UPDATE recommendations
                       SET status = $2, decline_reason = $3, updated_at = NOW()
                       WHERE id = $1"#,
                )
                .bind(id)
                .bind(next)
                .bind(text)
                .execute(&mut *tx)
                .await?;
            }
            RecommendationStatus::Pending => {}
        }

        let updated = Self::fetch(&mut *tx, id, false).await?;
        tx.commit().await?;

        info!(recommendation_id = %id, status = next.as_str(), "Recommendation decided");
        track_recommendation_decision(next.as_str());
        Ok(updated)
    }

    /// Submit the letter. Only the addressed teacher, only while pending.
    #[instrument(skip(db, content))]
    pub async fn submit(
        db: &PgPool,
        id: RecommendationId,
        teacher_id: TeacherId,
        content: &str,
    ) -> Result<Recommendation, AppError> {
        Self::decide(
            db,
            id,
            teacher_id,
            RecommendationStatus::Submitted,
            Some(content.trim()),
        )
        .await
    }

    #[instrument(skip(db, reason))]
    pub async fn decline(
        db: &PgPool,
        id: RecommendationId,
        teacher_id: TeacherId,
        reason: Option<&str>,
    ) -> Result<Recommendation, AppError> {
        Self::decide(db, id, teacher_id, RecommendationStatus::Declined, reason).await
    }

    #[instrument(skip(db))]
    pub async fn delete_recommendation(db: &PgPool, id: RecommendationId) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM recommendations WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow::anyhow!(
                "Recommendation not found"
            )));
        }
        Ok(())
    }
}
