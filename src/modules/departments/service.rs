use sqlx::PgPool;
use tracing::{info, instrument};

use registrar_core::AppError;
use registrar_models::DepartmentId;

use crate::modules::departments::model::{
    CreateDepartmentDto, Department, DepartmentWithStats, UpdateDepartmentDto,
};

const DEPARTMENT_COLUMNS: &str = "id, code, name, description, created_at, updated_at";
const DUPLICATE_MESSAGE: &str = "A department with this code or name already exists";

pub struct DepartmentService;

impl DepartmentService {
    #[instrument(skip(db))]
    pub async fn list_departments(db: &PgPool) -> Result<Vec<Department>, AppError> {
        let departments = sqlx::query_as::<_, Department>(&format!(
            "SELECT {DEPARTMENT_COLUMNS} FROM departments ORDER BY name"
        ))
        .fetch_all(db)
        .await?;
        Ok(departments)
    }

    #[instrument(skip(db))]
    pub async fn get_department(
        db: &PgPool,
        id: DepartmentId,
    ) -> Result<DepartmentWithStats, AppError> {
        sqlx::query_as::<_, DepartmentWithStats>(
            r#"SELECT d.id, d.code, d.name, d.description, d.created_at, d.updated_at,
                      (SELECT COUNT(*) FROM courses c WHERE c.department_id = d.id) AS course_count,
                      (SELECT COUNT(*) FROM teachers t WHERE t.department_id = d.id) AS teacher_count,
                      (SELECT COUNT(*) FROM students s WHERE s.department_id = d.id) AS student_count
               FROM departments d
               WHERE d.id = $1"#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Department not found")))
    }

    #[instrument(skip(db, dto))]
    pub async fn create_department(
        db: &PgPool,
        dto: CreateDepartmentDto,
    ) -> Result<Department, AppError> {
        let department = sqlx::query_as::<_, Department>(&format!(
            r#"INSERT INTO departments (code, name, description)
               VALUES ($1, $2, $3)
               RETURNING {DEPARTMENT_COLUMNS}"#
        ))
        .bind(dto.code.trim().to_uppercase())
        .bind(dto.name.trim())
        .bind(dto.description)
        .fetch_one(db)
        .await
        .map_err(|e| AppError::database(e, DUPLICATE_MESSAGE))?;

        info!(department_id = %department.id, code = %department.code, "Department created");
        Ok(department)
    }

    #[instrument(skip(db, dto))]
    pub async fn update_department(
        db: &PgPool,
        id: DepartmentId,
        dto: UpdateDepartmentDto,
    ) -> Result<Department, AppError> {
        sqlx::query_as::<_, Department>(&format!(
            r#"UPDATE departments SET
                   code = COALESCE($2, code),
                   name = COALESCE($3, name),
                   description = COALESCE($4, description),
                   updated_at = NOW()
               WHERE id = $1
               RETURNING {DEPARTMENT_COLUMNS}"#
        ))
        .bind(id)
        .bind(dto.code.map(|c| c.trim().to_uppercase()))
        .bind(dto.name.as_deref().map(str::trim))
        .bind(dto.description)
        .fetch_optional(db)
        .await
        .map_err(|e| AppError::database(e, DUPLICATE_MESSAGE))?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Department not found")))
    }

    /// Courses restrict deletion; students and teachers are detached.
    #[instrument(skip(db))]
    pub async fn delete_department(db: &PgPool, id: DepartmentId) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM departments WHERE id = $1")
            .bind(id)
            .execute(db)
            .await
            .map_err(|e| AppError::database(e, DUPLICATE_MESSAGE))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow::anyhow!("Department not found")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_dto(code: &str, name: &str) -> CreateDepartmentDto {
        CreateDepartmentDto {
            code: code.to_string(),
            name: name.to_string(),
            description: None,
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_create_normalizes_code(pool: PgPool) {
        let dept = DepartmentService::create_department(&pool, create_dto(" math ", "Mathematics"))
            .await
            .unwrap();
        assert_eq!(dept.code, "MATH");
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_duplicate_code_conflicts(pool: PgPool) {
        DepartmentService::create_department(&pool, create_dto("CS", "Computer Science"))
            .await
            .unwrap();
        let err = DepartmentService::create_department(&pool, create_dto("cs", "Computing"))
            .await
            .unwrap_err();
        assert_eq!(err.status.as_u16(), 409);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_delete_referenced_department_conflicts(pool: PgPool) {
        let dept = DepartmentService::create_department(&pool, create_dto("PHY", "Physics"))
            .await
            .unwrap();
        sqlx::query("INSERT INTO courses (code, name, credits, department_id) VALUES ('PHY101', 'Mechanics', 3, $1)")
            .bind(dept.id)
            .execute(&pool)
            .await
            .unwrap();

        let err = DepartmentService::delete_department(&pool, dept.id)
            .await
            .unwrap_err();
        assert_eq!(err.status.as_u16(), 409);

        let stats = DepartmentService::get_department(&pool, dept.id).await.unwrap();
        assert_eq!(stats.course_count, 1);
        assert_eq!(stats.student_count, 0);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_update_missing_department(pool: PgPool) {
        let err = DepartmentService::update_department(
            &pool,
            DepartmentId::new(),
            UpdateDepartmentDto::default(),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status.as_u16(), 404);
    }
}
