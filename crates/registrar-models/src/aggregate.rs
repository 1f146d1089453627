//! Derived academic summaries.
//!
//! Everything here is a pure function over rows already loaded from the
//! database. Services fetch the rows, these functions do the arithmetic.
//! Results are rounded to two decimals so responses are stable.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::students::StudentStatus;

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Arithmetic mean of the non-null scores. No scores yields 0.
pub fn average_score(scores: &[Option<f64>]) -> f64 {
    let (sum, count) = scores
        .iter()
        .flatten()
        .fold((0.0, 0usize), |(sum, count), score| (sum + score, count + 1));
    if count == 0 {
        0.0
    } else {
        round2(sum / count as f64)
    }
}

/// Percentage of non-null scores at or above `pass_mark`. No scores yields 0.
pub fn pass_rate(scores: &[Option<f64>], pass_mark: f64) -> f64 {
    let graded: Vec<f64> = scores.iter().flatten().copied().collect();
    if graded.is_empty() {
        return 0.0;
    }
    let passed = graded.iter().filter(|s| **s >= pass_mark).count();
    round2(passed as f64 * 100.0 / graded.len() as f64)
}

/// Letter for a 0..=100 score on the standard ten-point scale.
pub fn letter_for_score(score: f64) -> &'static str {
    match score {
        s if s >= 90.0 => "A",
        s if s >= 80.0 => "B",
        s if s >= 70.0 => "C",
        s if s >= 60.0 => "D",
        _ => "F",
    }
}

/// Grade points on the 4.0 scale, `None` for letters outside the scale.
pub fn grade_points(letter: &str) -> Option<f64> {
    let points = match letter.trim().to_ascii_uppercase().as_str() {
        "A+" | "A" => 4.0,
        "A-" => 3.7,
        "B+" => 3.3,
        "B" => 3.0,
        "B-" => 2.7,
        "C+" => 2.3,
        "C" => 2.0,
        "C-" => 1.7,
        "D+" => 1.3,
        "D" => 1.0,
        "D-" => 0.7,
        "F" => 0.0,
        _ => return None,
    };
    Some(points)
}

/// Counts of non-null scores per letter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct LetterDistribution {
    #[serde(rename = "A")]
    pub a: i64,
    #[serde(rename = "B")]
    pub b: i64,
    #[serde(rename = "C")]
    pub c: i64,
    #[serde(rename = "D")]
    pub d: i64,
    #[serde(rename = "F")]
    pub f: i64,
}

pub fn letter_distribution(scores: &[Option<f64>]) -> LetterDistribution {
    let mut dist = LetterDistribution::default();
    for score in scores.iter().flatten() {
        match letter_for_score(*score) {
            "A" => dist.a += 1,
            "B" => dist.b += 1,
            "C" => dist.c += 1,
            "D" => dist.d += 1,
            _ => dist.f += 1,
        }
    }
    dist
}

/// One graded course as seen by the GPA calculation.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct GradedCredit {
    pub letter_grade: Option<String>,
    pub credits: i32,
}

/// GPA and earned credits derived from a student's grades.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AcademicStanding {
    /// `None` until at least one grade carries a letter on the scale.
    pub gpa: Option<f64>,
    pub credits_earned: i32,
}

/// Credit-weighted GPA. Credits are earned for every letter above F.
pub fn academic_standing(grades: &[GradedCredit]) -> AcademicStanding {
    let mut weighted = 0.0;
    let mut attempted = 0i32;
    let mut earned = 0i32;

    for grade in grades {
        let Some(points) = grade.letter_grade.as_deref().and_then(grade_points) else {
            continue;
        };
        weighted += points * f64::from(grade.credits);
        attempted += grade.credits;
        if points > 0.0 {
            earned += grade.credits;
        }
    }

    AcademicStanding {
        gpa: (attempted > 0).then(|| round2(weighted / f64::from(attempted))),
        credits_earned: earned,
    }
}

/// Status and GPA of one student, the input of [`student_breakdown`].
#[derive(Debug, Clone, Copy, PartialEq, FromRow)]
pub struct StudentStanding {
    pub status: StudentStatus,
    pub gpa: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StudentStatusBreakdown {
    pub total: i64,
    pub active: i64,
    pub at_risk: i64,
    pub suspended: i64,
    pub inactive: i64,
    /// Mean GPA over students with a GPA above zero
    pub average_gpa: f64,
}

pub fn student_breakdown(students: &[StudentStanding]) -> StudentStatusBreakdown {
    let mut breakdown = StudentStatusBreakdown {
        total: students.len() as i64,
        ..Default::default()
    };
    let mut gpa_sum = 0.0;
    let mut gpa_count = 0usize;

    for student in students {
        match student.status {
            StudentStatus::Active => breakdown.active += 1,
            StudentStatus::AtRisk => breakdown.at_risk += 1,
            StudentStatus::Suspended => breakdown.suspended += 1,
            StudentStatus::Inactive => breakdown.inactive += 1,
        }
        if let Some(gpa) = student.gpa.filter(|g| *g > 0.0) {
            gpa_sum += gpa;
            gpa_count += 1;
        }
    }

    if gpa_count > 0 {
        breakdown.average_gpa = round2(gpa_sum / gpa_count as f64);
    }
    breakdown
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TrendPoint {
    /// `YYYY-MM`
    pub month: String,
    pub count: i64,
}

fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

fn previous_month(first: NaiveDate) -> NaiveDate {
    let (year, month) = if first.month() == 1 {
        (first.year() - 1, 12)
    } else {
        (first.year(), first.month() - 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(first)
}

/// Enrollment counts per calendar month for the `months` months ending with
/// the month of `today`, oldest first. Months without enrollments are
/// present with a zero count; dates outside the window are ignored.
pub fn monthly_trend(dates: &[NaiveDate], months: u32, today: NaiveDate) -> Vec<TrendPoint> {
    if months == 0 {
        return Vec::new();
    }

    let mut buckets = Vec::with_capacity(months as usize);
    let mut cursor = month_start(today);
    for _ in 0..months {
        buckets.push(cursor);
        cursor = previous_month(cursor);
    }
    buckets.reverse();

    buckets
        .into_iter()
        .map(|start| {
            let count = dates
                .iter()
                .filter(|d| d.year() == start.year() && d.month() == start.month())
                .count() as i64;
            TrendPoint {
                month: start.format("%Y-%m").to_string(),
                count,
            }
        })
        .collect()
}

pub fn is_at_risk(average: f64, threshold: f64) -> bool {
    average < threshold
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_average_ignores_nulls() {
        assert_eq!(average_score(&[Some(80.0), None, Some(90.0)]), 85.0);
    }

    #[test]
    fn test_average_empty_is_zero() {
        assert_eq!(average_score(&[]), 0.0);
        assert_eq!(average_score(&[None, None]), 0.0);
    }

    #[test]
    fn test_average_is_sum_over_count() {
        let sets: [&[Option<f64>]; 3] = [
            &[Some(100.0)],
            &[Some(70.0), Some(71.0), Some(72.0)],
            &[Some(0.0), None, Some(50.0), Some(25.0)],
        ];
        for set in sets {
            let graded: Vec<f64> = set.iter().flatten().copied().collect();
            let expected = graded.iter().sum::<f64>() / graded.len() as f64;
            assert_eq!(average_score(set), round2(expected));
        }
    }

    #[test]
    fn test_pass_rate() {
        let scores = [Some(59.9), Some(60.0), Some(95.0), None];
        assert_eq!(pass_rate(&scores, 60.0), 66.67);
        assert_eq!(pass_rate(&[], 60.0), 0.0);
    }

    #[test]
    fn test_letter_boundaries() {
        assert_eq!(letter_for_score(90.0), "A");
        assert_eq!(letter_for_score(89.99), "B");
        assert_eq!(letter_for_score(80.0), "B");
        assert_eq!(letter_for_score(70.0), "C");
        assert_eq!(letter_for_score(60.0), "D");
        assert_eq!(letter_for_score(59.0), "F");
    }

    #[test]
    fn test_distribution_skips_nulls() {
        let dist = letter_distribution(&[Some(95.0), Some(91.0), Some(40.0), None]);
        assert_eq!(dist.a, 2);
        assert_eq!(dist.f, 1);
        assert_eq!(dist.b + dist.c + dist.d, 0);
    }

    #[test]
    fn test_grade_points_scale() {
        assert_eq!(grade_points("a"), Some(4.0));
        assert_eq!(grade_points("B+"), Some(3.3));
        assert_eq!(grade_points("F"), Some(0.0));
        assert_eq!(grade_points("P"), None);
    }

    #[test]
    fn test_weighted_gpa_and_credits() {
        let grades = [
            GradedCredit {
                letter_grade: Some("A".into()),
                credits: 4,
            },
            GradedCredit {
                letter_grade: Some("C".into()),
                credits: 2,
            },
            GradedCredit {
                letter_grade: Some("F".into()),
                credits: 3,
            },
            GradedCredit {
                letter_grade: None,
                credits: 3,
            },
        ];
        let standing = academic_standing(&grades);
        // (16 + 4 + 0) / 9
        assert_eq!(standing.gpa, Some(2.22));
        assert_eq!(standing.credits_earned, 6);
    }

    #[test]
    fn test_no_letters_means_no_gpa() {
        let standing = academic_standing(&[GradedCredit {
            letter_grade: None,
            credits: 3,
        }]);
        assert_eq!(standing.gpa, None);
        assert_eq!(standing.credits_earned, 0);
    }

    #[test]
    fn test_breakdown_excludes_missing_gpa() {
        let students = [
            StudentStanding {
                status: StudentStatus::Active,
                gpa: Some(3.0),
            },
            StudentStanding {
                status: StudentStatus::AtRisk,
                gpa: Some(2.0),
            },
            StudentStanding {
                status: StudentStatus::Active,
                gpa: None,
            },
            StudentStanding {
                status: StudentStatus::Inactive,
                gpa: Some(0.0),
            },
        ];
        let breakdown = student_breakdown(&students);
        assert_eq!(breakdown.total, 4);
        assert_eq!(breakdown.active, 2);
        assert_eq!(breakdown.at_risk, 1);
        assert_eq!(breakdown.inactive, 1);
        assert_eq!(breakdown.average_gpa, 2.5);
    }

    #[test]
    fn test_breakdown_without_gpa_is_zero() {
        let breakdown = student_breakdown(&[StudentStanding {
            status: StudentStatus::Suspended,
            gpa: None,
        }]);
        assert_eq!(breakdown.suspended, 1);
        assert_eq!(breakdown.average_gpa, 0.0);
        assert_eq!(student_breakdown(&[]).average_gpa, 0.0);
    }

    #[test]
    fn test_monthly_trend_zero_fills_and_crosses_year() {
        let dates = [date(2024, 12, 3), date(2025, 2, 10), date(2025, 2, 28), date(2023, 1, 1)];
        let trend = monthly_trend(&dates, 3, date(2025, 2, 15));
        assert_eq!(
            trend,
            vec![
                TrendPoint {
                    month: "2024-12".into(),
                    count: 1
                },
                TrendPoint {
                    month: "2025-01".into(),
                    count: 0
                },
                TrendPoint {
                    month: "2025-02".into(),
                    count: 2
                },
            ]
        );
    }

    #[test]
    fn test_monthly_trend_zero_months() {
        assert!(monthly_trend(&[date(2025, 1, 1)], 0, date(2025, 1, 1)).is_empty());
    }

    #[test]
    fn test_at_risk_threshold_is_strict() {
        assert!(is_at_risk(69.99, 70.0));
        assert!(!is_at_risk(70.0, 70.0));
    }
}
