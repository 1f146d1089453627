//! Teacher and student accounts.
//!
//! Each person is a `users` row plus the role profile row, inserted in the
//! same transaction.

use std::time::Instant;

use anyhow::Context;
use chrono::{Duration, NaiveDate, Utc};
use fake::Fake;
use fake::faker::name::en::{FirstName, LastName};
use rayon::prelude::*;
use registrar_models::{DepartmentId, StudentId, TeacherId, UserId, UserRole};
use sqlx::{PgPool, Postgres, Transaction};

use super::models::{PersonSeed, SEED_EXTERNAL_PREFIX, StudentSeed, TeacherSeed};
use super::placeholders;

// 6 params per user row
const USER_BATCH_SIZE: usize = 1000;
const PROFILE_BATCH_SIZE: usize = 1000;

const TITLES: &[&str] = &["Lecturer", "Senior Lecturer", "Assistant Professor", "Professor"];

fn generate_person(
    department_id: DepartmentId,
    role_prefix: &str,
    number: usize,
    tag: &str,
) -> PersonSeed {
    let first_name: String = FirstName().fake();
    let last_name: String = LastName().fake();
    let email = format!(
        "{}.{}+{role_prefix}{number}.{tag}@example.com",
        first_name.to_lowercase().replace(' ', ""),
        last_name.to_lowercase().replace(' ', ""),
    );

    PersonSeed {
        external_id: format!("{SEED_EXTERNAL_PREFIX}{tag}_{role_prefix}{number}"),
        email,
        first_name,
        last_name,
        department_id,
    }
}

fn days_ago(today: NaiveDate, min: i64, max: i64) -> NaiveDate {
    today - Duration::days((min..max).fake::<i64>())
}

pub fn generate_teachers(
    departments: &[DepartmentId],
    per_department: usize,
    tag: &str,
) -> Vec<TeacherSeed> {
    let today = Utc::now().date_naive();
    departments
        .par_iter()
        .enumerate()
        .flat_map(|(dept_idx, &department_id)| {
            (0..per_department)
                .map(|idx| TeacherSeed {
                    person: generate_person(
                        department_id,
                        "tch",
                        dept_idx * 1000 + idx,
                        tag,
                    ),
                    title: TITLES[idx % TITLES.len()].to_string(),
                    rating: ((30..50).fake::<i32>() as f64) / 10.0,
                    hire_date: days_ago(today, 365, 365 * 20),
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

pub fn generate_students(
    departments: &[DepartmentId],
    per_department: usize,
    tag: &str,
) -> Vec<StudentSeed> {
    let today = Utc::now().date_naive();
    departments
        .par_iter()
        .enumerate()
        .flat_map(|(dept_idx, &department_id)| {
            (0..per_department)
                .map(|idx| {
                    let number = dept_idx * 1000 + idx;
                    StudentSeed {
                        person: generate_person(department_id, "stu", number, tag),
                        student_number: format!("S{}-{number:05}", tag.to_uppercase()),
                        enrollment_date: days_ago(today, 30, 365 * 4),
                    }
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

async fn insert_users(
    tx: &mut Transaction<'_, Postgres>,
    people: &[&PersonSeed],
    role: UserRole,
) -> anyhow::Result<Vec<UserId>> {
    let mut ids = Vec::with_capacity(people.len());
    for chunk in people.chunks(USER_BATCH_SIZE) {
        let query = format!(
            "INSERT INTO users (external_id, email, first_name, last_name, role, status) VALUES {} RETURNING id",
            placeholders(chunk.len(), 6)
        );
        let mut q = sqlx::query_scalar::<_, UserId>(&query);
        for person in chunk {
            q = q
                .bind(&person.external_id)
                .bind(&person.email)
                .bind(&person.first_name)
                .bind(&person.last_name)
                .bind(role)
                .bind(registrar_models::UserStatus::Active);
        }
        ids.extend(
            q.fetch_all(&mut **tx)
                .await
                .context("Failed to insert users")?,
        );
    }
    Ok(ids)
}

/// Returns `(teacher_id, department_id)` pairs.
pub async fn seed_teachers(
    db: &PgPool,
    departments: &[DepartmentId],
    per_department: usize,
    tag: &str,
) -> anyhow::Result<Vec<(TeacherId, DepartmentId)>> {
    let start_time = Instant::now();
    println!(
        "🧑‍🏫 Seeding {} teachers ({per_department} per department)...",
        departments.len() * per_department
    );

    let seeds = generate_teachers(departments, per_department, tag);
    let mut tx = db.begin().await?;

    let people: Vec<&PersonSeed> = seeds.iter().map(|s| &s.person).collect();
    let user_ids = insert_users(&mut tx, &people, UserRole::Teacher).await?;

    let rows: Vec<_> = user_ids.iter().zip(seeds.iter()).collect();
    let mut result = Vec::with_capacity(rows.len());
    for chunk in rows.chunks(PROFILE_BATCH_SIZE) {
        let query = format!(
            "INSERT INTO teachers (user_id, department_id, title, rating, hire_date) VALUES {} RETURNING id",
            placeholders(chunk.len(), 5)
        );
        let mut q = sqlx::query_scalar::<_, TeacherId>(&query);
        for (user_id, seed) in chunk {
            q = q
                .bind(**user_id)
                .bind(seed.person.department_id)
                .bind(&seed.title)
                .bind(seed.rating)
                .bind(seed.hire_date);
        }
        let ids = q
            .fetch_all(&mut *tx)
            .await
            .context("Failed to insert teacher profiles")?;
        result.extend(
            ids.into_iter()
                .zip(chunk.iter().map(|(_, seed)| seed.person.department_id)),
        );
    }

    tx.commit().await?;
    println!(
        "   ✓ Inserted {} teachers in {:?}",
        result.len(),
        start_time.elapsed()
    );
    Ok(result)
}

/// Returns `(student_id, department_id)` pairs.
pub async fn seed_students(
    db: &PgPool,
    departments: &[DepartmentId],
    per_department: usize,
    tag: &str,
) -> anyhow::Result<Vec<(StudentId, DepartmentId)>> {
    let start_time = Instant::now();
    println!(
        "🎓 Seeding {} students ({per_department} per department)...",
        departments.len() * per_department
    );

    let seeds = generate_students(departments, per_department, tag);
    let mut tx = db.begin().await?;

    let people: Vec<&PersonSeed> = seeds.iter().map(|s| &s.person).collect();
    let user_ids = insert_users(&mut tx, &people, UserRole::Student).await?;

    let rows: Vec<_> = user_ids.iter().zip(seeds.iter()).collect();
    let mut result = Vec::with_capacity(rows.len());
    for chunk in rows.chunks(PROFILE_BATCH_SIZE) {
        let query = format!(
            "INSERT INTO students (user_id, student_number, department_id, enrollment_date) VALUES {} RETURNING id",
            placeholders(chunk.len(), 4)
        );
        let mut q = sqlx::query_scalar::<_, StudentId>(&query);
        for (user_id, seed) in chunk {
            q = q
                .bind(**user_id)
                .bind(&seed.student_number)
                .bind(seed.person.department_id)
                .bind(seed.enrollment_date);
        }
        let ids = q
            .fetch_all(&mut *tx)
            .await
            .context("Failed to insert student profiles")?;
        result.extend(
            ids.into_iter()
                .zip(chunk.iter().map(|(_, seed)| seed.person.department_id)),
        );
    }

    tx.commit().await?;
    println!(
        "   ✓ Inserted {} students in {:?}",
        result.len(),
        start_time.elapsed()
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_teachers_count_and_markers() {
        let departments = vec![DepartmentId::new(), DepartmentId::new()];
        let teachers = generate_teachers(&departments, 3, "abc123");

        assert_eq!(teachers.len(), 6);
        for teacher in &teachers {
            assert!(teacher.person.external_id.starts_with(SEED_EXTERNAL_PREFIX));
            assert!(teacher.person.email.ends_with("@example.com"));
            assert!((3.0..5.0).contains(&teacher.rating));
        }
    }

    #[test]
    fn test_generated_identities_are_unique() {
        let departments = vec![DepartmentId::new(), DepartmentId::new(), DepartmentId::new()];
        let students = generate_students(&departments, 20, "abc123");

        let mut external: Vec<_> = students.iter().map(|s| &s.person.external_id).collect();
        external.sort();
        external.dedup();
        assert_eq!(external.len(), 60);

        let mut numbers: Vec<_> = students.iter().map(|s| &s.student_number).collect();
        numbers.sort();
        numbers.dedup();
        assert_eq!(numbers.len(), 60);

        let mut emails: Vec<_> = students.iter().map(|s| &s.person.email).collect();
        emails.sort();
        emails.dedup();
        assert_eq!(emails.len(), 60);
    }

    #[test]
    fn test_students_enrolled_in_the_past() {
        let today = Utc::now().date_naive();
        let students = generate_students(&[DepartmentId::new()], 10, "t");
        assert!(students.iter().all(|s| s.enrollment_date < today));
    }
}
