//! Departments, semesters and courses.

use std::time::Instant;

use anyhow::Context;
use chrono::{Datelike, Months, NaiveDate, Utc};
use fake::Fake;
use fake::faker::lorem::en::Sentence;
use rayon::prelude::*;
use registrar_models::{DepartmentId, SemesterId, TeacherId};
use sqlx::PgPool;

use super::models::{
    CourseSeed, DepartmentSeed, SEED_CODE_PREFIX, SEED_SEMESTER_PREFIX, SeededCourse,
    SeededSemesters, SemesterSeed,
};
use super::placeholders;

const SUBJECTS: &[(&str, &str)] = &[
    ("MTH", "Mathematics"),
    ("CSC", "Computer Science"),
    ("PHY", "Physics"),
    ("BIO", "Biology"),
    ("CHM", "Chemistry"),
    ("HIS", "History"),
    ("ECO", "Economics"),
    ("LIT", "Literature"),
];

const COURSE_LEVELS: &[&str] = &[
    "Foundations of",
    "Introduction to",
    "Topics in",
    "Applied",
    "Advanced",
    "Research Methods in",
];

pub fn generate_departments(count: usize, tag: &str) -> Vec<DepartmentSeed> {
    (0..count)
        .into_par_iter()
        .map(|idx| {
            let (code, subject) = SUBJECTS[idx % SUBJECTS.len()];
            let round = idx / SUBJECTS.len();
            let name = if round == 0 {
                format!("{subject} ({tag})")
            } else {
                format!("{subject} {} ({tag})", round + 1)
            };
            DepartmentSeed {
                code: format!("{SEED_CODE_PREFIX}{code}{idx}-{tag}"),
                name,
                description: Sentence(6..12).fake(),
            }
        })
        .collect()
}

pub async fn seed_departments(
    db: &PgPool,
    count: usize,
    tag: &str,
) -> anyhow::Result<Vec<DepartmentId>> {
    let start_time = Instant::now();
    println!("🏛️  Seeding {count} departments...");

    let seeds = generate_departments(count, tag);
    if seeds.is_empty() {
        return Ok(Vec::new());
    }

    let query = format!(
        "INSERT INTO departments (code, name, description) VALUES {} RETURNING id",
        placeholders(seeds.len(), 3)
    );
    let mut q = sqlx::query_scalar::<_, DepartmentId>(&query);
    for seed in &seeds {
        q = q.bind(&seed.code).bind(&seed.name).bind(&seed.description);
    }
    let ids = q
        .fetch_all(db)
        .await
        .context("Failed to insert departments")?;

    println!(
        "   ✓ Inserted {} departments in {:?}",
        ids.len(),
        start_time.elapsed()
    );
    Ok(ids)
}

/// The term containing `today` and the one before it, six months apart.
pub fn generate_semesters(today: NaiveDate, tag: &str) -> (SemesterSeed, SemesterSeed) {
    let spring = today.month() < 7;
    let current_start = if spring {
        NaiveDate::from_ymd_opt(today.year(), 1, 1)
    } else {
        NaiveDate::from_ymd_opt(today.year(), 7, 1)
    }
    .unwrap_or(today);
    let previous_start = current_start
        .checked_sub_months(Months::new(6))
        .unwrap_or(current_start);
    let term_end = |start: NaiveDate| {
        start
            .checked_add_months(Months::new(6))
            .and_then(|d| d.pred_opt())
            .unwrap_or(start)
    };
    let term_name = |start: NaiveDate| {
        let season = if start.month() < 7 { "Spring" } else { "Fall" };
        format!("{SEED_SEMESTER_PREFIX}{season} {} ({tag})", start.year())
    };

    (
        SemesterSeed {
            name: term_name(previous_start),
            start_date: previous_start,
            end_date: term_end(previous_start),
        },
        SemesterSeed {
            name: term_name(current_start),
            start_date: current_start,
            end_date: term_end(current_start),
        },
    )
}

/// Inserts both terms. The current one becomes active only when no other
/// semester is active yet.
pub async fn seed_semesters(db: &PgPool, tag: &str) -> anyhow::Result<SeededSemesters> {
    println!("📅 Seeding semesters...");
    let (previous, current) = generate_semesters(Utc::now().date_naive(), tag);

    let mut tx = db.begin().await?;
    let has_active: bool =
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM semesters WHERE is_active)")
            .fetch_one(&mut *tx)
            .await?;

    let insert = |seed: &SemesterSeed, active: bool| {
        sqlx::query_scalar::<_, SemesterId>(
            r#"INSERT INTO semesters (name, start_date, end_date, is_active)
               VALUES ($1, $2, $3, $4) RETURNING id"#,
        )
        .bind(seed.name.clone())
        .bind(seed.start_date)
        .bind(seed.end_date)
        .bind(active)
    };

    let previous_id = insert(&previous, false)
        .fetch_one(&mut *tx)
        .await
        .context("Failed to insert previous semester")?;
    let current_id = insert(&current, !has_active)
        .fetch_one(&mut *tx)
        .await
        .context("Failed to insert current semester")?;
    tx.commit().await?;

    println!(
        "   ✓ {} and {}{}",
        previous.name,
        current.name,
        if has_active { "" } else { " (active)" }
    );
    Ok(SeededSemesters {
        previous: previous_id,
        current: current_id,
    })
}

pub fn generate_courses(
    departments: &[DepartmentId],
    teachers: &[(TeacherId, DepartmentId)],
    per_department: usize,
    tag: &str,
) -> Vec<CourseSeed> {
    departments
        .par_iter()
        .enumerate()
        .flat_map(|(dept_idx, &department_id)| {
            let staff: Vec<TeacherId> = teachers
                .iter()
                .filter(|(_, d)| *d == department_id)
                .map(|(t, _)| *t)
                .collect();
            let (_, subject) = SUBJECTS[dept_idx % SUBJECTS.len()];

            (0..per_department)
                .map(|idx| {
                    let level = COURSE_LEVELS[idx % COURSE_LEVELS.len()];
                    CourseSeed {
                        code: format!("{SEED_CODE_PREFIX}{tag}-{dept_idx}{:02}", idx + 1),
                        name: format!("{level} {subject}"),
                        credits: (2..5).fake(),
                        capacity: (25..60).fake(),
                        teacher_id: (!staff.is_empty()).then(|| staff[idx % staff.len()]),
                        department_id,
                    }
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

pub async fn seed_courses(
    db: &PgPool,
    departments: &[DepartmentId],
    teachers: &[(TeacherId, DepartmentId)],
    per_department: usize,
    tag: &str,
) -> anyhow::Result<Vec<SeededCourse>> {
    let start_time = Instant::now();
    println!(
        "📚 Seeding {} courses ({per_department} per department)...",
        departments.len() * per_department
    );

    let seeds = generate_courses(departments, teachers, per_department, tag);
    if seeds.is_empty() {
        return Ok(Vec::new());
    }

    let query = format!(
        "INSERT INTO courses (code, name, credits, capacity, teacher_id, department_id) VALUES {} RETURNING id",
        placeholders(seeds.len(), 6)
    );
    let mut q = sqlx::query_scalar::<_, registrar_models::CourseId>(&query);
    for seed in &seeds {
        q = q
            .bind(&seed.code)
            .bind(&seed.name)
            .bind(seed.credits)
            .bind(seed.capacity)
            .bind(seed.teacher_id)
            .bind(seed.department_id);
    }
    let ids = q.fetch_all(db).await.context("Failed to insert courses")?;

    println!(
        "   ✓ Inserted {} courses in {:?}",
        ids.len(),
        start_time.elapsed()
    );

    Ok(ids
        .into_iter()
        .zip(seeds)
        .map(|(id, seed)| SeededCourse {
            id,
            department_id: seed.department_id,
            credits: seed.credits,
        })
        .collect())
}
