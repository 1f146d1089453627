//! Semester persistence.
//!
//! Activation clears the flag on every semester and sets it on one, inside
//! a single transaction. A partial unique index on `is_active` backs the
//! at-most-one-active rule at the database level.

use sqlx::{PgConnection, PgPool};
use tracing::{info, instrument};

use registrar_core::AppError;
use registrar_models::SemesterId;
use registrar_observability::track_semester_activated;

use crate::modules::semesters::model::{
    CreateSemesterDto, Semester, UpdateSemesterDto, validate_date_range,
};

const SEMESTER_COLUMNS: &str = "id, name, start_date, end_date, is_active, created_at, updated_at";
const DUPLICATE_MESSAGE: &str = "A semester with this name already exists";

pub struct SemesterService;

impl SemesterService {
    #[instrument(skip(db))]
    pub async fn list_semesters(db: &PgPool) -> Result<Vec<Semester>, AppError> {
        let semesters = sqlx::query_as::<_, Semester>(&format!(
            "SELECT {SEMESTER_COLUMNS} FROM semesters ORDER BY start_date DESC"
        ))
        .fetch_all(db)
        .await?;
        Ok(semesters)
    }

    #[instrument(skip(db))]
    pub async fn find_active(db: &PgPool) -> Result<Option<Semester>, AppError> {
        let semester = sqlx::query_as::<_, Semester>(&format!(
            "SELECT {SEMESTER_COLUMNS} FROM semesters WHERE is_active"
        ))
        .fetch_optional(db)
        .await?;
        Ok(semester)
    }

    pub async fn get_active(db: &PgPool) -> Result<Semester, AppError> {
        Self::find_active(db)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("No active semester")))
    }

    /// The semester a write should use: the requested one when given (404 if
    /// unknown), otherwise the active one (400 if none is active).
    #[instrument(skip(db))]
    pub async fn resolve(
        db: &PgPool,
        requested: Option<SemesterId>,
    ) -> Result<SemesterId, AppError> {
        match requested {
            Some(id) => {
                let exists = sqlx::query_scalar::<_, bool>(
                    "SELECT EXISTS (SELECT 1 FROM semesters WHERE id = $1)",
                )
                .bind(id)
                .fetch_one(db)
                .await?;
                if exists {
                    Ok(id)
                } else {
                    Err(AppError::not_found(anyhow::anyhow!("Semester not found")))
                }
            }
            None => Self::find_active(db).await?.map(|s| s.id).ok_or_else(|| {
                AppError::bad_request(anyhow::anyhow!(
                    "No active semester; specify semester_id"
                ))
            }),
        }
    }

    async fn activate_in(conn: &mut PgConnection, id: SemesterId) -> Result<Semester, AppError> {
        sqlx::query("UPDATE semesters SET is_active = FALSE, updated_at = NOW() WHERE is_active AND id <> $1")
            .bind(id)
            .execute(&mut *conn)
            .await?;

        sqlx::query_as::<_, Semester>(&format!(
            r#"UPDATE semesters SET is_active = TRUE, updated_at = NOW()
               WHERE id = $1
               RETURNING {SEMESTER_COLUMNS}"#
        ))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Semester not found")))
    }

    #[instrument(skip(db, dto))]
    pub async fn create_semester(
        db: &PgPool,
        dto: CreateSemesterDto,
    ) -> Result<Semester, AppError> {
        let mut tx = db.begin().await?;

        let mut semester = sqlx::query_as::<_, Semester>(&format!(
            r#"INSERT INTO semesters (name, start_date, end_date)
               VALUES ($1, $2, $3)
               RETURNING {SEMESTER_COLUMNS}"#
        ))
        .bind(dto.name.trim())
        .bind(dto.start_date)
        .bind(dto.end_date)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::database(e, DUPLICATE_MESSAGE))?;

        if dto.is_active {
            semester = Self::activate_in(&mut *tx, semester.id).await?;
        }

        tx.commit().await?;

        if semester.is_active {
            track_semester_activated();
        }
        info!(semester_id = %semester.id, name = %semester.name, active = semester.is_active, "Semester created");
        Ok(semester)
    }

    #[instrument(skip(db, dto))]
    pub async fn update_semester(
        db: &PgPool,
        id: SemesterId,
        dto: UpdateSemesterDto,
    ) -> Result<Semester, AppError> {
        let current = sqlx::query_as::<_, Semester>(&format!(
            "SELECT {SEMESTER_COLUMNS} FROM semesters WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Semester not found")))?;

        let start = dto.start_date.unwrap_or(current.start_date);
        let end = dto.end_date.unwrap_or(current.end_date);
        validate_date_range(start, end).map_err(|_| {
            AppError::bad_request(anyhow::anyhow!("start_date must be before end_date"))
        })?;

        let semester = sqlx::query_as::<_, Semester>(&format!(
            r#"UPDATE semesters SET
                   name = COALESCE($2, name),
                   start_date = $3,
                   end_date = $4,
                   updated_at = NOW()
               WHERE id = $1
               RETURNING {SEMESTER_COLUMNS}"#
        ))
        .bind(id)
        .bind(dto.name.as_deref().map(str::trim))
        .bind(start)
        .bind(end)
        .fetch_one(db)
        .await
        .map_err(|e| AppError::database(e, DUPLICATE_MESSAGE))?;

        Ok(semester)
    }

    /// Make `id` the only active semester.
    #[instrument(skip(db))]
    pub async fn activate_semester(db: &PgPool, id: SemesterId) -> Result<Semester, AppError> {
        let mut tx = db.begin().await?;
        let semester = Self::activate_in(&mut *tx, id).await?;
        tx.commit().await?;

        info!(semester_id = %semester.id, "Semester activated");
        track_semester_activated();
        Ok(semester)
    }

    /// 409 for the active semester and for semesters with enrollments or
    /// grades.
    #[instrument(skip(db))]
    pub async fn delete_semester(db: &PgPool, id: SemesterId) -> Result<(), AppError> {
        let is_active = sqlx::query_scalar::<_, bool>("SELECT is_active FROM semesters WHERE id = $1")
            .bind(id)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Semester not found")))?;

        if is_active {
            return Err(AppError::conflict(anyhow::anyhow!(
                "Cannot delete the active semester"
            )));
        }

        sqlx::query("DELETE FROM semesters WHERE id = $1")
            .bind(id)
            .execute(db)
            .await
            .map_err(|e| AppError::database(e, DUPLICATE_MESSAGE))?;
        Ok(())
    }
}
