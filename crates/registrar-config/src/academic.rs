//! Grading thresholds used by dashboards and reports.
//!
//! - `GRADING_PASS_MARK`: minimum passing score (default 60)
//! - `AT_RISK_THRESHOLD`: average score below which a student is flagged (default 70)
//! - `DEFAULT_CREDITS_REQUIRED`: credits required for new students (default 120)

use crate::parse_or;

#[derive(Clone, Debug, PartialEq)]
pub struct AcademicConfig {
    pub pass_mark: f64,
    pub at_risk_threshold: f64,
    pub default_credits_required: i32,
}

impl Default for AcademicConfig {
    fn default() -> Self {
        Self {
            pass_mark: 60.0,
            at_risk_threshold: 70.0,
            default_credits_required: 120,
        }
    }
}

impl AcademicConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            pass_mark: parse_or(&lookup, "GRADING_PASS_MARK", defaults.pass_mark),
            at_risk_threshold: parse_or(&lookup, "AT_RISK_THRESHOLD", defaults.at_risk_threshold),
            default_credits_required: parse_or(
                &lookup,
                "DEFAULT_CREDITS_REQUIRED",
                defaults.default_credits_required,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::lookup_from;

    #[test]
    fn test_defaults() {
        assert_eq!(
            AcademicConfig::from_lookup(lookup_from(&[])),
            AcademicConfig::default()
        );
    }

    #[test]
    fn test_overrides() {
        let config = AcademicConfig::from_lookup(lookup_from(&[
            ("GRADING_PASS_MARK", "50"),
            ("AT_RISK_THRESHOLD", "65.5"),
        ]));
        assert_eq!(config.pass_mark, 50.0);
        assert_eq!(config.at_risk_threshold, 65.5);
        assert_eq!(config.default_credits_required, 120);
    }
}
