use sqlx::PgPool;
use tracing::{info, instrument};

use registrar_core::AppError;
use registrar_models::students::{STUDENT_COLUMNS, Student};
use registrar_models::{StudentId, UserId, UserRole};

use crate::modules::parents::model::ParentLink;
use crate::modules::students::service::STUDENT_FROM;

pub struct ParentService;

impl ParentService {
    /// Link a student to a parent account. The user must exist and hold the
    /// parent role.
    #[instrument(skip(db))]
    pub async fn link_child(
        db: &PgPool,
        parent_id: UserId,
        student_id: StudentId,
    ) -> Result<ParentLink, AppError> {
        let role = sqlx::query_scalar::<_, UserRole>("SELECT role FROM users WHERE id = $1")
            .bind(parent_id)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Parent not found")))?;

        if role != UserRole::Parent {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "User is not a parent"
            )));
        }

        let student_exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM students WHERE id = $1)")
                .bind(student_id)
                .fetch_one(db)
                .await?;
        if !student_exists {
            return Err(AppError::not_found(anyhow::anyhow!("Student not found")));
        }

        sqlx::query("INSERT INTO parent_students (parent_id, student_id) VALUES ($1, $2)")
            .bind(parent_id)
            .bind(student_id)
            .execute(db)
            .await
            .map_err(|e| AppError::database(e, "Student is already linked to this parent"))?;

        info!(parent_id = %parent_id, student_id = %student_id, "Child linked");
        Ok(ParentLink {
            parent_id,
            student_id,
        })
    }

    #[instrument(skip(db))]
    pub async fn unlink_child(
        db: &PgPool,
        parent_id: UserId,
        student_id: StudentId,
    ) -> Result<(), AppError> {
        let result =
            sqlx::query("DELETE FROM parent_students WHERE parent_id = $1 AND student_id = $2")
                .bind(parent_id)
                .bind(student_id)
                .execute(db)
                .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow::anyhow!("Link not found")));
        }
        Ok(())
    }

    #[instrument(skip(db))]
    pub async fn list_children(db: &PgPool, parent_id: UserId) -> Result<Vec<Student>, AppError> {
        let query = format!(
            r#"SELECT {STUDENT_COLUMNS} {STUDENT_FROM}
               JOIN parent_students ps ON ps.student_id = s.id
               WHERE ps.parent_id = $1
               ORDER BY ps.created_at"#
        );
        let children = sqlx::query_as::<_, Student>(&query)
            .bind(parent_id)
            .fetch_all(db)
            .await?;
        Ok(children)
    }
}
