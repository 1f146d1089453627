//! Demo data seeding.
//!
//! Generates departments, semesters, teachers, students, courses,
//! enrollments and grades, then recomputes every seeded student's GPA the
//! same way the API does after a grade write. Row generation runs on rayon;
//! inserts go out in multi-row batches inside one transaction per table.

pub mod academics;
pub mod models;
pub mod people;
pub mod records;

use std::time::Instant;

use anyhow::Context;
use sqlx::PgPool;
use uuid::Uuid;

pub use models::SeedConfig;
use models::{SEED_CODE_PREFIX, SEED_EXTERNAL_PREFIX, SEED_SEMESTER_PREFIX};

#[derive(Debug, Default, Clone, Copy)]
pub struct SeedSummary {
    pub departments: usize,
    pub semesters: usize,
    pub teachers: usize,
    pub students: usize,
    pub courses: usize,
    pub enrollments: usize,
    pub grades: usize,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ClearSummary {
    pub users: u64,
    pub courses: u64,
    pub semesters: u64,
    pub departments: u64,
}

/// `($1, $2, $3), ($4, $5, $6), ...` for a multi-row `VALUES` clause.
pub(crate) fn placeholders(rows: usize, cols: usize) -> String {
    let mut out = String::with_capacity(rows * cols * 5);
    for row in 0..rows {
        if row > 0 {
            out.push_str(", ");
        }
        out.push('(');
        for col in 0..cols {
            if col > 0 {
                out.push_str(", ");
            }
            out.push('$');
            out.push_str(&(row * cols + col + 1).to_string());
        }
        out.push(')');
    }
    out
}

/// Short tag that keeps unique columns distinct across repeated seed runs.
fn run_tag() -> String {
    Uuid::new_v4().simple().to_string()[..6].to_string()
}

pub async fn seed_all(db: &PgPool, config: SeedConfig) -> anyhow::Result<SeedSummary> {
    let start_time = Instant::now();
    let tag = run_tag();
    println!("🌱 Seeding database (run {tag})...\n");

    let departments = academics::seed_departments(db, config.departments, &tag).await?;
    let semesters = academics::seed_semesters(db, &tag).await?;
    let teachers =
        people::seed_teachers(db, &departments, config.teachers_per_department, &tag).await?;
    let students =
        people::seed_students(db, &departments, config.students_per_department, &tag).await?;
    let courses = academics::seed_courses(
        db,
        &departments,
        &teachers,
        config.courses_per_department,
        &tag,
    )
    .await?;

    let plan = records::plan_enrollments(&students, &courses, &semesters, &config);
    let (enrollments, grades) = records::seed_records(db, &plan).await?;

    let student_ids: Vec<_> = students.iter().map(|(id, _)| *id).collect();
    records::recompute_standing(db, &student_ids).await?;

    let summary = SeedSummary {
        departments: departments.len(),
        semesters: 2,
        teachers: teachers.len(),
        students: students.len(),
        courses: courses.len(),
        enrollments,
        grades,
    };

    println!("\n✅ Seeding completed in {:?}", start_time.elapsed());
    println!("   Departments: {}", summary.departments);
    println!("   Teachers:    {}", summary.teachers);
    println!("   Students:    {}", summary.students);
    println!("   Courses:     {}", summary.courses);
    println!("   Enrollments: {}", summary.enrollments);
    println!("   Grades:      {}", summary.grades);

    Ok(summary)
}

/// Removes every row created by [`seed_all`], identified by its markers.
/// Users created through the API or `create-admin` are left alone.
pub async fn clear_seed(db: &PgPool) -> anyhow::Result<ClearSummary> {
    let start_time = Instant::now();
    println!("🗑️  Clearing seeded data...");

    let mut tx = db.begin().await?;
    let code_pattern = format!("{SEED_CODE_PREFIX}%");
    let semester_pattern = format!("{SEED_SEMESTER_PREFIX}%");

    // Students, teachers and everything hanging off them cascade from users.
    let users = sqlx::query("DELETE FROM users WHERE external_id LIKE $1")
        .bind(format!("{SEED_EXTERNAL_PREFIX}%"))
        .execute(&mut *tx)
        .await
        .context("Failed to delete seeded users")?
        .rows_affected();

    let courses = sqlx::query("DELETE FROM courses WHERE code LIKE $1")
        .bind(&code_pattern)
        .execute(&mut *tx)
        .await
        .context("Failed to delete seeded courses")?
        .rows_affected();

    // Enrollments and grades pin their semester.
    for table in ["grades", "enrollments"] {
        sqlx::query(&format!(
            "DELETE FROM {table} WHERE semester_id IN (SELECT id FROM semesters WHERE name LIKE $1)"
        ))
        .bind(&semester_pattern)
        .execute(&mut *tx)
        .await
        .with_context(|| format!("Failed to delete {table} in seeded semesters"))?;
    }

    let semesters = sqlx::query("DELETE FROM semesters WHERE name LIKE $1")
        .bind(&semester_pattern)
        .execute(&mut *tx)
        .await
        .context("Failed to delete seeded semesters")?
        .rows_affected();

    let departments = sqlx::query(
        r#"DELETE FROM departments d
           WHERE d.code LIKE $1
           AND NOT EXISTS (SELECT 1 FROM courses c WHERE c.department_id = d.id)"#,
    )
    .bind(&code_pattern)
    .execute(&mut *tx)
    .await
    .context("Failed to delete seeded departments")?
    .rows_affected();

    tx.commit().await?;

    let summary = ClearSummary {
        users,
        courses,
        semesters,
        departments,
    };
    println!(
        "   ✓ Deleted {} users, {} courses, {} semesters, {} departments in {:?}",
        summary.users,
        summary.courses,
        summary.semesters,
        summary.departments,
        start_time.elapsed()
    );

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholders_single_row() {
        assert_eq!(placeholders(1, 3), "($1, $2, $3)");
    }

    #[test]
    fn test_placeholders_numbering_continues_across_rows() {
        assert_eq!(placeholders(2, 2), "($1, $2), ($3, $4)");
    }

    #[test]
    fn test_placeholders_empty() {
        assert_eq!(placeholders(0, 4), "");
    }

    #[test]
    fn test_run_tag_length() {
        let tag = run_tag();
        assert_eq!(tag.len(), 6);
        assert!(tag.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
