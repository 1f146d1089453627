//! Record-level access checks layered on top of the role gate.
//!
//! The gate decides whether a role may call an operation at all; these
//! helpers decide whether the caller may see a particular student or
//! course: students see themselves, parents their linked children, teachers
//! the students enrolled in courses they teach.

use sqlx::PgPool;
use tracing::instrument;

use registrar_core::AppError;
use registrar_models::{CourseId, StudentId, TeacherId, UserId, UserRole};

use crate::middleware::auth::CurrentUser;

/// Which rows of a student-owned table a caller may list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordScope {
    All,
    /// Rows tied to courses taught by (or requests addressed to) this teacher
    Teacher(TeacherId),
    /// Rows of these students only; may be empty for a parent with no links
    Students(Vec<StudentId>),
}

pub async fn linked_children(db: &PgPool, parent_id: UserId) -> Result<Vec<StudentId>, AppError> {
    let ids = sqlx::query_scalar::<_, StudentId>(
        "SELECT student_id FROM parent_students WHERE parent_id = $1 ORDER BY created_at",
    )
    .bind(parent_id)
    .fetch_all(db)
    .await?;
    Ok(ids)
}

pub async fn record_scope(db: &PgPool, current: &CurrentUser) -> Result<RecordScope, AppError> {
    match current.role() {
        UserRole::Admin => Ok(RecordScope::All),
        UserRole::Teacher => Ok(RecordScope::Teacher(current.teacher_id()?)),
        UserRole::Student => Ok(RecordScope::Students(vec![current.student_id()?])),
        UserRole::Parent => Ok(RecordScope::Students(
            linked_children(db, current.id()).await?,
        )),
    }
}

async fn student_exists(db: &PgPool, student_id: StudentId) -> Result<bool, AppError> {
    let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM students WHERE id = $1)")
        .bind(student_id)
        .fetch_one(db)
        .await?;
    Ok(exists)
}

/// 404 when the student does not exist, 403 when the caller may not see it.
#[instrument(skip(db, current), fields(user_id = %current.id()))]
pub async fn ensure_student_visible(
    db: &PgPool,
    current: &CurrentUser,
    student_id: StudentId,
) -> Result<(), AppError> {
    if !student_exists(db, student_id).await? {
        return Err(AppError::not_found(anyhow::anyhow!("Student not found")));
    }

    let visible = match current.role() {
        UserRole::Admin => true,
        UserRole::Student => current.student_id == Some(student_id),
        UserRole::Parent => sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM parent_students WHERE parent_id = $1 AND student_id = $2)",
        )
        .bind(current.id())
        .bind(student_id)
        .fetch_one(db)
        .await?,
        UserRole::Teacher => {
            let teacher_id = current.teacher_id()?;
            sqlx::query_scalar::<_, bool>(
                r#"SELECT EXISTS (
                       SELECT 1 FROM enrollments e
                       JOIN courses c ON c.id = e.course_id
                       WHERE e.student_id = $1 AND c.teacher_id = $2
                   )"#,
            )
            .bind(student_id)
            .bind(teacher_id)
            .fetch_one(db)
            .await?
        }
    };

    if visible {
        Ok(())
    } else {
        Err(AppError::forbidden("You do not have access to this student"))
    }
}

/// Admins pass; teachers pass for courses assigned to them. 404 when the
/// course does not exist.
#[instrument(skip(db, current), fields(user_id = %current.id()))]
pub async fn ensure_teaches_course(
    db: &PgPool,
    current: &CurrentUser,
    course_id: CourseId,
) -> Result<(), AppError> {
    let owner = sqlx::query_scalar::<_, Option<TeacherId>>(
        "SELECT teacher_id FROM courses WHERE id = $1",
    )
    .bind(course_id)
    .fetch_optional(db)
    .await?
    .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Course not found")))?;

    if current.is_admin() {
        return Ok(());
    }

    match (current.role(), owner) {
        (UserRole::Teacher, Some(owner)) if current.teacher_id == Some(owner) => Ok(()),
        _ => Err(AppError::forbidden("You do not teach this course")),
    }
}
