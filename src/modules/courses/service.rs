use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};
use tracing::{info, instrument};

use registrar_core::{AppError, Paginated};
use registrar_models::display::Labeled;
use registrar_models::{CourseId, EnrollmentId, SemesterId, StudentId};

use crate::modules::courses::model::{
    COURSE_COLUMNS, COURSE_JOINS, Course, CourseDto, CourseFilterParams, CourseStatus, CourseStudent,
    CreateCourseDto, EnrollStudentDto, Enrollment, EnrollmentStatus, UpdateCourseDto, has_room,
};
use crate::modules::semesters::service::SemesterService;
use crate::modules::students::service::StudentService;

const DUPLICATE_CODE: &str = "A course with this code already exists";

pub struct CourseService;

impl CourseService {
    fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filters: &CourseFilterParams) {
        qb.push(" WHERE TRUE");
        if let Some(department_id) = filters.department_id {
            qb.push(" AND c.department_id = ").push_bind(department_id);
        }
        if let Some(teacher_id) = filters.teacher_id {
            qb.push(" AND c.teacher_id = ").push_bind(teacher_id);
        }
        if let Some(status) = filters.status {
            qb.push(" AND c.status = ").push_bind(status);
        }
        if let Some(search) = &filters.search {
            let pattern = format!("%{}%", search);
            qb.push(" AND (c.code ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR c.name ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
    }

    #[instrument(skip(db))]
    pub async fn list_courses(
        db: &PgPool,
        filters: &CourseFilterParams,
    ) -> Result<Paginated<CourseDto>, AppError> {
        let mut count_query = QueryBuilder::<Postgres>::new("SELECT COUNT(*)");
        count_query.push(COURSE_JOINS);
        Self::push_filters(&mut count_query, filters);
        let total = count_query
            .build_query_scalar::<i64>()
            .fetch_one(db)
            .await?;

        let mut data_query = QueryBuilder::<Postgres>::new("SELECT");
        data_query.push(COURSE_COLUMNS).push(COURSE_JOINS);
        Self::push_filters(&mut data_query, filters);
        data_query
            .push(" ORDER BY c.code LIMIT ")
            .push_bind(filters.pagination.limit())
            .push(" OFFSET ")
            .push_bind(filters.pagination.offset());

        let courses = data_query.build_query_as::<Course>().fetch_all(db).await?;

        Ok(Paginated::new(courses, total, &filters.pagination).map(CourseDto::from))
    }

    #[instrument(skip(db))]
    pub async fn get_course(db: &PgPool, id: CourseId) -> Result<Course, AppError> {
        sqlx::query_as::<_, Course>(&format!(
            "SELECT {COURSE_COLUMNS} {COURSE_JOINS} WHERE c.id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Course not found")))
    }

    #[instrument(skip(db, dto))]
    pub async fn create_course(db: &PgPool, dto: CreateCourseDto) -> Result<Course, AppError> {
        let id = sqlx::query_scalar::<_, CourseId>(
            r#"INSERT INTO courses
                   (code, name, description, credits, capacity, teacher_id, department_id, status)
               VALUES ($1, $2, $3, $4, $5, $6, $7, COALESCE($8, 'active'::course_status))
               RETURNING id"#,
        )
        .bind(dto.code.trim().to_uppercase())
        .bind(dto.name.trim())
        .bind(dto.description)
        .bind(dto.credits)
        .bind(dto.capacity)
        .bind(dto.teacher_id)
        .bind(dto.department_id)
        .bind(dto.status)
        .fetch_one(db)
        .await
        .map_err(|e| AppError::database(e, DUPLICATE_CODE))?;

        info!(course_id = %id, "Course created");
        Self::get_course(db, id).await
    }

    /// Students holding a grade in the course; their standing depends on
    /// its credits.
    async fn graded_students(
        conn: &mut PgConnection,
        course_id: CourseId,
    ) -> Result<Vec<StudentId>, AppError> {
        let ids = sqlx::query_scalar::<_, StudentId>(
            "SELECT DISTINCT student_id FROM grades WHERE course_id = $1",
        )
        .bind(course_id)
        .fetch_all(&mut *conn)
        .await?;
        Ok(ids)
    }

    /// A credit change reweights the GPA of every student graded in the
    /// course, so their standing is recomputed in the same transaction.
    #[instrument(skip(db, dto))]
    pub async fn update_course(
        db: &PgPool,
        id: CourseId,
        dto: UpdateCourseDto,
    ) -> Result<Course, AppError> {
        let credits_changed = dto.credits.is_some();
        let mut tx = db.begin().await?;

        let result = sqlx::query(
            r#"UPDATE courses SET
                   code = COALESCE($2, code),
                   name = COALESCE($3, name),
                   description = COALESCE($4, description),
                   credits = COALESCE($5, credits),
                   capacity = COALESCE($6, capacity),
                   teacher_id = COALESCE($7, teacher_id),
                   department_id = COALESCE($8, department_id),
                   status = COALESCE($9, status),
                   updated_at = NOW()
               WHERE id = $1"#,
        )
        .bind(id)
        .bind(dto.code.map(|c| c.trim().to_uppercase()))
        .bind(dto.name.as_deref().map(str::trim))
        .bind(dto.description)
        .bind(dto.credits)
        .bind(dto.capacity)
        .bind(dto.teacher_id)
        .bind(dto.department_id)
        .bind(dto.status)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::database(e, DUPLICATE_CODE))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow::anyhow!("Course not found")));
        }

        if credits_changed {
            let students = Self::graded_students(&mut *tx, id).await?;
            for student_id in &students {
                StudentService::recompute_standing(&mut *tx, *student_id).await?;
            }
            info!(course_id = %id, students = students.len(), "Standing recomputed after credit change");
        }

        tx.commit().await?;
        Self::get_course(db, id).await
    }

    /// Enrollments and grades of the course go with it; the standing of
    /// every student who had a grade in it is recomputed.
    #[instrument(skip(db))]
    pub async fn delete_course(db: &PgPool, id: CourseId) -> Result<(), AppError> {
        let mut tx = db.begin().await?;
        let students = Self::graded_students(&mut *tx, id).await?;

        let result = sqlx::query("DELETE FROM courses WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::database(e, DUPLICATE_CODE))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow::anyhow!("Course not found")));
        }

        for student_id in &students {
            StudentService::recompute_standing(&mut *tx, *student_id).await?;
        }

        tx.commit().await?;
        info!(course_id = %id, students = students.len(), "Course deleted");
        Ok(())
    }

    /// Locks the course row and returns `(status, capacity)`, serializing
    /// enrollments into the course.
    async fn lock_course(
        conn: &mut PgConnection,
        course_id: CourseId,
    ) -> Result<(CourseStatus, Option<i32>), AppError> {
        sqlx::query_as::<_, (CourseStatus, Option<i32>)>(
            "SELECT status, capacity FROM courses WHERE id = $1 FOR UPDATE",
        )
        .bind(course_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Course not found")))
    }

    async fn ensure_seat(
        conn: &mut PgConnection,
        course_id: CourseId,
        semester_id: SemesterId,
        capacity: Option<i32>,
    ) -> Result<(), AppError> {
        let enrolled = sqlx::query_scalar::<_, i64>(
            r#"SELECT COUNT(*) FROM enrollments
               WHERE course_id = $1 AND semester_id = $2 AND status = 'enrolled'"#,
        )
        .bind(course_id)
        .bind(semester_id)
        .fetch_one(&mut *conn)
        .await?;

        if has_room(capacity, enrolled) {
            Ok(())
        } else {
            Err(AppError::conflict(anyhow::anyhow!("Course is full")))
        }
    }

    /// Enroll a student. The semester defaults to the active one. Capacity
    /// applies per semester; full courses and inactive courses reject new
    /// enrollments with 409.
    #[instrument(skip(db))]
    pub async fn enroll_student(
        db: &PgPool,
        course_id: CourseId,
        dto: &EnrollStudentDto,
    ) -> Result<Enrollment, AppError> {
        let student_exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM students WHERE id = $1)",
        )
        .bind(dto.student_id)
        .fetch_one(db)
        .await?;
        if !student_exists {
            return Err(AppError::not_found(anyhow::anyhow!("Student not found")));
        }

        let mut tx = db.begin().await?;
        let (status, capacity) = Self::lock_course(&mut *tx, course_id).await?;
        if status != CourseStatus::Active {
            return Err(AppError::conflict(anyhow::anyhow!(
                "Course is not open for enrollment"
            )));
        }

        let semester_id = SemesterService::resolve(db, dto.semester_id).await?;
        Self::ensure_seat(&mut *tx, course_id, semester_id, capacity).await?;

        let enrollment = sqlx::query_as::<_, Enrollment>(
            r#"INSERT INTO enrollments (student_id, course_id, semester_id)
               VALUES ($1, $2, $3)
               RETURNING id, student_id, course_id, semester_id, status, enrolled_at"#,
        )
        .bind(dto.student_id)
        .bind(course_id)
        .bind(semester_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            AppError::database(e, "Student is already enrolled in this course for the semester")
        })?;

        tx.commit().await?;
        info!(course_id = %course_id, student_id = %dto.student_id, "Student enrolled");
        Ok(enrollment)
    }

    /// Drop, complete or reinstate an enrollment. Reinstating takes a seat,
    /// so it is checked against the semester's capacity.
    #[instrument(skip(db))]
    pub async fn update_enrollment_status(
        db: &PgPool,
        course_id: CourseId,
        enrollment_id: EnrollmentId,
        status: EnrollmentStatus,
    ) -> Result<Enrollment, AppError> {
        let mut tx = db.begin().await?;
        let (_, capacity) = Self::lock_course(&mut *tx, course_id).await?;

        let current = sqlx::query_as::<_, Enrollment>(
            r#"SELECT id, student_id, course_id, semester_id, status, enrolled_at
               FROM enrollments WHERE id = $1 AND course_id = $2"#,
        )
        .bind(enrollment_id)
        .bind(course_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Enrollment not found")))?;

        if current.status == status {
            return Ok(current);
        }
        if status == EnrollmentStatus::Enrolled {
            Self::ensure_seat(&mut *tx, course_id, current.semester_id, capacity).await?;
        }

        let enrollment = sqlx::query_as::<_, Enrollment>(
            r#"UPDATE enrollments SET status = $2 WHERE id = $1
               RETURNING id, student_id, course_id, semester_id, status, enrolled_at"#,
        )
        .bind(enrollment_id)
        .bind(status)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        info!(
            enrollment_id = %enrollment_id,
            from = current.status.as_str(),
            to = status.as_str(),
            "Enrollment status changed"
        );
        Ok(enrollment)
    }

    /// Students enrolled in the course across semesters, with their grade
    /// for that semester when one exists.
    #[instrument(skip(db))]
    pub async fn list_course_students(
        db: &PgPool,
        course_id: CourseId,
    ) -> Result<Vec<CourseStudent>, AppError> {
        let rows = sqlx::query_as::<_, CourseStudent>(
            r#"SELECT e.student_id, s.student_number, u.first_name, u.last_name, u.email,
                      e.semester_id, sem.name AS semester_name,
                      e.status AS enrollment_status, e.enrolled_at,
                      g.score, g.letter_grade
               FROM enrollments e
               JOIN students s ON s.id = e.student_id
               JOIN users u ON u.id = s.user_id
               JOIN semesters sem ON sem.id = e.semester_id
               LEFT JOIN grades g ON g.student_id = e.student_id
                   AND g.course_id = e.course_id
                   AND g.semester_id = e.semester_id
               WHERE e.course_id = $1
               ORDER BY sem.start_date DESC, u.last_name, u.first_name"#,
        )
        .bind(course_id)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }
}
