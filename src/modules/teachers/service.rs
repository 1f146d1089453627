use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::instrument;

use registrar_core::AppError;
use registrar_models::TeacherId;

use crate::modules::teachers::model::{
    TEACHER_COLUMNS, Teacher, TeacherFilterParams, UpdateTeacherDto,
};

const TEACHER_FROM: &str = r#"
    FROM teachers t
    JOIN users u ON u.id = t.user_id
    LEFT JOIN departments d ON d.id = t.department_id"#;

pub struct TeacherService;

impl TeacherService {
    #[instrument(skip(db))]
    pub async fn list_teachers(
        db: &PgPool,
        filters: &TeacherFilterParams,
    ) -> Result<Vec<Teacher>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT");
        qb.push(TEACHER_COLUMNS).push(TEACHER_FROM).push(" WHERE TRUE");

        if let Some(department_id) = filters.department_id {
            qb.push(" AND t.department_id = ").push_bind(department_id);
        }
        if let Some(status) = filters.status {
            qb.push(" AND t.status = ").push_bind(status);
        }
        if let Some(search) = &filters.search {
            let pattern = format!("%{}%", search);
            qb.push(" AND (u.first_name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR u.last_name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR u.email ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
        qb.push(" ORDER BY u.last_name, u.first_name, t.id");

        let teachers = qb.build_query_as::<Teacher>().fetch_all(db).await?;
        Ok(teachers)
    }

    #[instrument(skip(db))]
    pub async fn get_teacher(db: &PgPool, id: TeacherId) -> Result<Teacher, AppError> {
        sqlx::query_as::<_, Teacher>(&format!(
            "SELECT {TEACHER_COLUMNS} {TEACHER_FROM} WHERE t.id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Teacher not found")))
    }

    #[instrument(skip(db, dto))]
    pub async fn update_teacher(
        db: &PgPool,
        id: TeacherId,
        dto: UpdateTeacherDto,
    ) -> Result<Teacher, AppError> {
        let result = sqlx::query(
            r#"UPDATE teachers SET
                   department_id = COALESCE($2, department_id),
                   title = COALESCE($3, title),
                   rating = COALESCE($4, rating),
                   hire_date = COALESCE($5, hire_date),
                   status = COALESCE($6, status),
                   updated_at = NOW()
               WHERE id = $1"#,
        )
        .bind(id)
        .bind(dto.department_id)
        .bind(dto.title.as_deref().map(str::trim))
        .bind(dto.rating)
        .bind(dto.hire_date)
        .bind(dto.status)
        .execute(db)
        .await
        .map_err(|e| AppError::database(e, "Teacher update conflicts with an existing record"))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow::anyhow!("Teacher not found")));
        }

        Self::get_teacher(db, id).await
    }
}
