use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::{info, instrument};

use registrar_config::AcademicConfig;
use registrar_core::{AppError, Paginated};
use registrar_models::display::display_id;
use registrar_models::users::{CreateUserDto, UserDto, UserFilterParams};
use registrar_models::{Labeled, User, UserId, UserRole, UserStatus};
use registrar_observability::track_user_created;

const USER_COLUMNS: &str =
    "id, external_id, email, first_name, last_name, role, status, created_at, updated_at";

pub struct UserService;

impl UserService {
    /// Insert the user and, for students and teachers, its profile row in
    /// one transaction.
    #[instrument(skip(db, dto, academic), fields(role = ?dto.role))]
    pub async fn create_user(
        db: &PgPool,
        dto: CreateUserDto,
        academic: &AcademicConfig,
    ) -> Result<User, AppError> {
        let mut tx = db.begin().await?;

        let user = sqlx::query_as::<_, User>(&format!(
            r#"INSERT INTO users (external_id, email, first_name, last_name, role, status)
               VALUES ($1, $2, $3, $4, $5, $6)
               RETURNING {USER_COLUMNS}"#
        ))
        .bind(dto.external_id.trim())
        .bind(dto.email.trim().to_lowercase())
        .bind(dto.first_name.trim())
        .bind(dto.last_name.trim())
        .bind(dto.role)
        .bind(dto.status.unwrap_or(UserStatus::Active))
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::database(e, "A user with this identity or email already exists"))?;

        match user.role {
            UserRole::Student => {
                let student_number = dto
                    .student_number
                    .as_deref()
                    .map(|n| n.trim().to_string())
                    .unwrap_or_else(|| display_id("STU", user.id.as_uuid()));

                sqlx::query(
                    r#"INSERT INTO students
                           (user_id, student_number, department_id, credits_required, enrollment_date)
                       VALUES ($1, $2, $3, $4, COALESCE($5, CURRENT_DATE))"#,
                )
                .bind(user.id)
                .bind(student_number)
                .bind(dto.department_id)
                .bind(
                    dto.credits_required
                        .unwrap_or(academic.default_credits_required),
                )
                .bind(dto.enrollment_date)
                .execute(&mut *tx)
                .await
                .map_err(|e| AppError::database(e, "Student number already in use"))?;
            }
            UserRole::Teacher => {
                sqlx::query(
                    r#"INSERT INTO teachers (user_id, department_id, title, hire_date)
                       VALUES ($1, $2, $3, $4)"#,
                )
                .bind(user.id)
                .bind(dto.department_id)
                .bind(dto.title.as_deref().map(str::trim))
                .bind(dto.hire_date)
                .execute(&mut *tx)
                .await
                .map_err(|e| AppError::database(e, "Teacher profile already exists"))?;
            }
            UserRole::Admin | UserRole::Parent => {}
        }

        tx.commit().await?;

        info!(user_id = %user.id, role = user.role.as_str(), "User created");
        track_user_created(user.role.as_str());
        Ok(user)
    }

    fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filters: &UserFilterParams) {
        qb.push(" WHERE TRUE");
        if let Some(role) = filters.role {
            qb.push(" AND role = ").push_bind(role);
        }
        if let Some(status) = filters.status {
            qb.push(" AND status = ").push_bind(status);
        }
        if let Some(search) = &filters.search {
            let pattern = format!("%{}%", search);
            qb.push(" AND (first_name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR last_name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR email ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
    }

    #[instrument(skip(db))]
    pub async fn list_users(
        db: &PgPool,
        filters: &UserFilterParams,
    ) -> Result<Paginated<UserDto>, AppError> {
        let mut count_query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM users");
        Self::push_filters(&mut count_query, filters);
        let total = count_query
            .build_query_scalar::<i64>()
            .fetch_one(db)
            .await?;

        let mut data_query = QueryBuilder::<Postgres>::new(format!("SELECT {USER_COLUMNS} FROM users"));
        Self::push_filters(&mut data_query, filters);
        data_query
            .push(" ORDER BY created_at DESC, id LIMIT ")
            .push_bind(filters.pagination.limit())
            .push(" OFFSET ")
            .push_bind(filters.pagination.offset());

        let users = data_query.build_query_as::<User>().fetch_all(db).await?;

        Ok(Paginated::new(users, total, &filters.pagination).map(UserDto::from))
    }

    #[instrument(skip(db))]
    pub async fn get_user(db: &PgPool, id: UserId) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("User not found")))
    }

    #[instrument(skip(db))]
    pub async fn update_status(
        db: &PgPool,
        acting: UserId,
        id: UserId,
        status: UserStatus,
    ) -> Result<User, AppError> {
        if acting == id && status != UserStatus::Active {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "You cannot deactivate your own account"
            )));
        }

        sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(status)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("User not found")))
    }

    /// Delete a user. Profiles, parent links and the student's records go
    /// with it.
    #[instrument(skip(db))]
    pub async fn delete_user(db: &PgPool, acting: UserId, id: UserId) -> Result<(), AppError> {
        if acting == id {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "You cannot delete your own account"
            )));
        }

        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(db)
            .await
            .map_err(|e| AppError::database(e, "User is still referenced"))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow::anyhow!("User not found")));
        }

        info!(user_id = %id, "User deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dto(external_id: &str, email: &str, role: UserRole) -> CreateUserDto {
        CreateUserDto {
            external_id: external_id.to_string(),
            email: email.to_string(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            role,
            status: None,
            department_id: None,
            student_number: None,
            credits_required: None,
            enrollment_date: None,
            title: None,
            hire_date: None,
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_create_student_creates_profile(pool: PgPool) {
        let user = UserService::create_user(
            &pool,
            dto("idp_student", "Student@Example.com", UserRole::Student),
            &AcademicConfig::default(),
        )
        .await
        .unwrap();

        assert_eq!(user.email, "student@example.com");

        let (number, required): (String, i32) = sqlx::query_as(
            "SELECT student_number, credits_required FROM students WHERE user_id = $1",
        )
        .bind(user.id)
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(number, display_id("STU", user.id.as_uuid()));
        assert_eq!(required, AcademicConfig::default().default_credits_required);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_create_teacher_creates_profile(pool: PgPool) {
        let mut input = dto("idp_teacher", "teacher@example.com", UserRole::Teacher);
        input.title = Some("Professor".to_string());
        let user = UserService::create_user(&pool, input, &AcademicConfig::default())
            .await
            .unwrap();

        let title: Option<String> =
            sqlx::query_scalar("SELECT title FROM teachers WHERE user_id = $1")
                .bind(user.id)
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(title.as_deref(), Some("Professor"));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_duplicate_identity_conflicts(pool: PgPool) {
        let config = AcademicConfig::default();
        UserService::create_user(&pool, dto("idp_1", "one@example.com", UserRole::Admin), &config)
            .await
            .unwrap();

        let err = UserService::create_user(
            &pool,
            dto("idp_1", "two@example.com", UserRole::Admin),
            &config,
        )
        .await
        .unwrap_err();
        assert_eq!(err.status.as_u16(), 409);

        let err = UserService::create_user(
            &pool,
            dto("idp_2", "one@example.com", UserRole::Parent),
            &config,
        )
        .await
        .unwrap_err();
        assert_eq!(err.status.as_u16(), 409);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_failed_profile_rolls_back_user(pool: PgPool) {
        let config = AcademicConfig::default();
        let mut first = dto("idp_a", "a@example.com", UserRole::Student);
        first.student_number = Some("S-1".to_string());
        UserService::create_user(&pool, first, &config).await.unwrap();

        let mut second = dto("idp_b", "b@example.com", UserRole::Student);
        second.student_number = Some("S-1".to_string());
        let err = UserService::create_user(&pool, second, &config)
            .await
            .unwrap_err();
        assert_eq!(err.status.as_u16(), 409);

        let orphan: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE external_id = 'idp_b')")
                .fetch_one(&pool)
                .await
                .unwrap();
        assert!(!orphan);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_list_filters_by_role(pool: PgPool) {
        let config = AcademicConfig::default();
        UserService::create_user(&pool, dto("a", "a@example.com", UserRole::Admin), &config)
            .await
            .unwrap();
        UserService::create_user(&pool, dto("p", "p@example.com", UserRole::Parent), &config)
            .await
            .unwrap();

        let filters = UserFilterParams {
            role: Some(UserRole::Parent),
            ..Default::default()
        };
        let page = UserService::list_users(&pool, &filters).await.unwrap();
        assert_eq!(page.meta.total, 1);
        assert_eq!(page.data[0].role_label, "Parent");
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_cannot_delete_or_deactivate_self(pool: PgPool) {
        let admin = UserService::create_user(
            &pool,
            dto("a", "a@example.com", UserRole::Admin),
            &AcademicConfig::default(),
        )
        .await
        .unwrap();

        let err = UserService::delete_user(&pool, admin.id, admin.id)
            .await
            .unwrap_err();
        assert_eq!(err.status.as_u16(), 400);

        let err = UserService::update_status(&pool, admin.id, admin.id, UserStatus::Suspended)
            .await
            .unwrap_err();
        assert_eq!(err.status.as_u16(), 400);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_delete_missing_user(pool: PgPool) {
        let err = UserService::delete_user(&pool, UserId::new(), UserId::new())
            .await
            .unwrap_err();
        assert_eq!(err.status.as_u16(), 404);
    }
}
