//! Seed configuration and the rows generated before insertion.

use chrono::{DateTime, NaiveDate, Utc};
use registrar_models::{CourseId, DepartmentId, SemesterId, StudentId, TeacherId};

/// Seeded rows are recognisable by these markers; `clear-seed` relies on them.
pub const SEED_EXTERNAL_PREFIX: &str = "seed_";
pub const SEED_CODE_PREFIX: &str = "SD-";
pub const SEED_SEMESTER_PREFIX: &str = "Seed ";

#[derive(Debug, Clone)]
pub struct SeedConfig {
    pub departments: usize,
    pub teachers_per_department: usize,
    pub students_per_department: usize,
    pub courses_per_department: usize,
    pub courses_per_student: usize,
    /// Percentage of enrollments that receive a grade
    pub graded_percent: u8,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            departments: 4,
            teachers_per_department: 3,
            students_per_department: 40,
            courses_per_department: 5,
            courses_per_student: 4,
            graded_percent: 80,
        }
    }
}

impl SeedConfig {
    pub fn total_teachers(&self) -> usize {
        self.departments * self.teachers_per_department
    }

    pub fn total_students(&self) -> usize {
        self.departments * self.students_per_department
    }
}

pub struct DepartmentSeed {
    pub code: String,
    pub name: String,
    pub description: String,
}

pub struct SemesterSeed {
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

pub struct PersonSeed {
    pub external_id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub department_id: DepartmentId,
}

pub struct TeacherSeed {
    pub person: PersonSeed,
    pub title: String,
    pub rating: f64,
    pub hire_date: NaiveDate,
}

pub struct StudentSeed {
    pub person: PersonSeed,
    pub student_number: String,
    pub enrollment_date: NaiveDate,
}

pub struct CourseSeed {
    pub code: String,
    pub name: String,
    pub credits: i32,
    pub capacity: i32,
    pub teacher_id: Option<TeacherId>,
    pub department_id: DepartmentId,
}

pub struct EnrollmentSeed {
    pub student_id: StudentId,
    pub course_id: CourseId,
    pub semester_id: SemesterId,
    pub enrolled_at: DateTime<Utc>,
    /// `None` when this enrollment stays ungraded
    pub score: Option<f64>,
    pub credits: i32,
}

/// The two terms every seed run creates. Graded enrollments land in
/// `previous`, open ones in `current`.
#[derive(Debug, Clone, Copy)]
pub struct SeededSemesters {
    pub previous: SemesterId,
    pub current: SemesterId,
}

#[derive(Debug, Clone, Copy)]
pub struct SeededCourse {
    pub id: CourseId,
    pub department_id: DepartmentId,
    pub credits: i32,
}
