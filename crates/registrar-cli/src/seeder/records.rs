//! Enrollments, grades and the GPA recompute that follows them.

use std::collections::HashMap;
use std::time::Instant;

use anyhow::Context;
use chrono::{Duration, Utc};
use fake::Fake;
use rayon::prelude::*;
use registrar_models::aggregate::{GradedCredit, academic_standing, letter_for_score, round2};
use registrar_models::enrollments::EnrollmentStatus;
use registrar_models::{DepartmentId, StudentId};
use sqlx::PgPool;

use super::models::{EnrollmentSeed, SeedConfig, SeededCourse, SeededSemesters};
use super::placeholders;

// 5 params per enrollment or grade row
const BATCH_SIZE: usize = 2000;

/// Picks `courses_per_student` distinct courses for each student and
/// decides which of those enrollments carry a grade. Graded ones sit in the
/// previous term; the rest are open enrollments in the current term.
pub fn plan_enrollments(
    students: &[(StudentId, DepartmentId)],
    courses: &[SeededCourse],
    semesters: &SeededSemesters,
    config: &SeedConfig,
) -> Vec<EnrollmentSeed> {
    if courses.is_empty() {
        return Vec::new();
    }
    let per_student = config.courses_per_student.min(courses.len());
    let now = Utc::now();

    students
        .par_iter()
        .flat_map(|&(student_id, _)| {
            let offset: usize = (0..courses.len()).fake();
            (0..per_student)
                .map(|i| {
                    let course = &courses[(offset + i) % courses.len()];
                    let graded = (0..100u8).fake::<u8>() < config.graded_percent;
                    let score = graded.then(|| round2((45.0..100.0).fake::<f64>()));
                    EnrollmentSeed {
                        student_id,
                        course_id: course.id,
                        semester_id: if graded {
                            semesters.previous
                        } else {
                            semesters.current
                        },
                        enrolled_at: now - Duration::days((0..180).fake::<i64>()),
                        score,
                        credits: course.credits,
                    }
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Inserts enrollments and, for the graded subset, grades. Returns
/// `(enrollments, grades)` counts.
pub async fn seed_records(db: &PgPool, plan: &[EnrollmentSeed]) -> anyhow::Result<(usize, usize)> {
    let start_time = Instant::now();
    println!("📝 Seeding {} enrollments...", plan.len());

    let mut tx = db.begin().await?;
    let mut enrolled = 0;
    for chunk in plan.chunks(BATCH_SIZE) {
        let query = format!(
            "INSERT INTO enrollments (student_id, course_id, semester_id, status, enrolled_at) VALUES {} ON CONFLICT DO NOTHING",
            placeholders(chunk.len(), 5)
        );
        let mut q = sqlx::query(&query);
        for e in chunk {
            let status = if e.score.is_some() {
                EnrollmentStatus::Completed
            } else {
                EnrollmentStatus::Enrolled
            };
            q = q
                .bind(e.student_id)
                .bind(e.course_id)
                .bind(e.semester_id)
                .bind(status)
                .bind(e.enrolled_at);
        }
        enrolled += q
            .execute(&mut *tx)
            .await
            .context("Failed to insert enrollments")?
            .rows_affected() as usize;
    }

    let graded: Vec<&EnrollmentSeed> = plan.iter().filter(|e| e.score.is_some()).collect();
    let mut grades = 0;
    for chunk in graded.chunks(BATCH_SIZE) {
        let query = format!(
            "INSERT INTO grades (student_id, course_id, semester_id, score, letter_grade) VALUES {} ON CONFLICT DO NOTHING",
            placeholders(chunk.len(), 5)
        );
        let mut q = sqlx::query(&query);
        for e in chunk {
            q = q
                .bind(e.student_id)
                .bind(e.course_id)
                .bind(e.semester_id)
                .bind(e.score)
                .bind(e.score.map(letter_for_score));
        }
        grades += q
            .execute(&mut *tx)
            .await
            .context("Failed to insert grades")?
            .rows_affected() as usize;
    }

    tx.commit().await?;
    println!(
        "   ✓ Inserted {enrolled} enrollments and {grades} grades in {:?}",
        start_time.elapsed()
    );
    Ok((enrolled, grades))
}

#[derive(sqlx::FromRow)]
struct StudentGrade {
    student_id: StudentId,
    #[sqlx(flatten)]
    credit: GradedCredit,
}

/// Recomputes GPA and earned credits for `students` from their stored grades.
pub async fn recompute_standing(db: &PgPool, students: &[StudentId]) -> anyhow::Result<()> {
    if students.is_empty() {
        return Ok(());
    }
    let start_time = Instant::now();
    println!("🧮 Recomputing GPA for {} students...", students.len());

    let rows = sqlx::query_as::<_, StudentGrade>(
        r#"SELECT g.student_id, g.letter_grade, c.credits
           FROM grades g
           JOIN courses c ON c.id = g.course_id
           WHERE g.student_id = ANY($1)"#,
    )
    .bind(students)
    .fetch_all(db)
    .await
    .context("Failed to load grades")?;

    let mut by_student: HashMap<StudentId, Vec<GradedCredit>> = HashMap::new();
    for row in rows {
        by_student.entry(row.student_id).or_default().push(row.credit);
    }

    let mut ids = Vec::with_capacity(students.len());
    let mut gpas = Vec::with_capacity(students.len());
    let mut credits = Vec::with_capacity(students.len());
    for id in students {
        let standing = academic_standing(by_student.get(id).map(Vec::as_slice).unwrap_or(&[]));
        ids.push(*id);
        gpas.push(standing.gpa);
        credits.push(standing.credits_earned);
    }

    sqlx::query(
        r#"UPDATE students s
           SET gpa = v.gpa, credits_earned = v.credits, updated_at = NOW()
           FROM UNNEST($1::uuid[], $2::float8[], $3::int4[]) AS v(id, gpa, credits)
           WHERE s.id = v.id"#,
    )
    .bind(&ids)
    .bind(&gpas)
    .bind(&credits)
    .execute(db)
    .await
    .context("Failed to update student standing")?;

    println!("   ✓ Updated standing in {:?}", start_time.elapsed());
    Ok(())
}
