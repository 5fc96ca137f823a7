//! Severity-weighted scoring of rule evaluations.
//!
//! The model supplies pass/fail judgments per rule; the aggregate score and
//! letter grade are always computed here, locally and deterministically.
//!
//! ```text
//! weight:  error = 10   warning = 5   info = 2   anything else = 1
//! score =  Σ weight(passed) / Σ weight(all) × 100      (empty list → 100)
//! grade =  ≥90 A   ≥80 B   ≥70 C   ≥60 D   else F     (inclusive bounds)
//! ```

use crate::output::RuleViolation;
use crate::rules::Severity;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Letter grade for an overall score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    /// Map a 0–100 score onto a grade. Lower bounds are inclusive.
    pub fn from_score(score: f64) -> Self {
        if score >= 90.0 {
            Grade::A
        } else if score >= 80.0 {
            Grade::B
        } else if score >= 70.0 {
            Grade::C
        } else if score >= 60.0 {
            Grade::D
        } else {
            Grade::F
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        };
        f.write_str(letter)
    }
}

/// Overall score (0–100) and its grade.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Score {
    pub overall_score: f64,
    pub grade: Grade,
}

/// Scoring weight of a severity. Unknown severities fall back to 1.
pub fn weight(severity: &Severity) -> u32 {
    match severity {
        Severity::Error => 10,
        Severity::Warning => 5,
        Severity::Info => 2,
        Severity::Unknown(_) => 1,
    }
}

/// Score a list of rule evaluations.
///
/// An empty list is vacuously compliant and scores 100.
pub fn score(violations: &[RuleViolation]) -> Score {
    if violations.is_empty() {
        return Score {
            overall_score: 100.0,
            grade: Grade::A,
        };
    }

    let max_score: u32 = violations.iter().map(|v| weight(&v.severity)).sum();
    let actual_score: u32 = violations
        .iter()
        .filter(|v| v.passed)
        .map(|v| weight(&v.severity))
        .sum();

    let overall_score = if max_score > 0 {
        f64::from(actual_score) / f64::from(max_score) * 100.0
    } else {
        0.0
    };

    Score {
        overall_score,
        grade: Grade::from_score(overall_score),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(severity: &str, passed: bool) -> RuleViolation {
        RuleViolation {
            rule_id: "QR000".into(),
            rule_name: String::new(),
            severity: Severity::from(severity),
            description: String::new(),
            violation_details: String::new(),
            passed,
        }
    }

    #[test]
    fn empty_list_is_perfect() {
        let s = score(&[]);
        assert_eq!(s.overall_score, 100.0);
        assert_eq!(s.grade, Grade::A);
        assert_eq!(Grade::from_score(100.0), Grade::A);
    }

    #[test]
    fn all_passed_scores_100() {
        let list = vec![eval("error", true), eval("info", true), eval("bogus", true)];
        assert_eq!(score(&list).overall_score, 100.0);
    }

    #[test]
    fn all_errors_failed_scores_0() {
        let list = vec![eval("error", false), eval("error", false)];
        let s = score(&list);
        assert_eq!(s.overall_score, 0.0);
        assert_eq!(s.grade, Grade::F);
    }

    #[test]
    fn weighted_mix() {
        let list = vec![eval("error", false), eval("warning", true)];
        let s = score(&list);
        assert!((s.overall_score - 33.333_333).abs() < 1e-3, "{}", s.overall_score);
        assert_eq!(s.grade, Grade::F);
    }

    #[test]
    fn unknown_severity_weighs_one() {
        // 2 (info, passed) / (2 + 1) → 66.67 → D
        let list = vec![eval("info", true), eval("critical", false)];
        let s = score(&list);
        assert!((s.overall_score - 200.0 / 3.0).abs() < 1e-9);
        assert_eq!(s.grade, Grade::D);
    }

    #[test]
    fn grade_boundaries_are_inclusive() {
        assert_eq!(Grade::from_score(90.0), Grade::A);
        assert_eq!(Grade::from_score(89.999), Grade::B);
        assert_eq!(Grade::from_score(80.0), Grade::B);
        assert_eq!(Grade::from_score(70.0), Grade::C);
        assert_eq!(Grade::from_score(60.0), Grade::D);
        assert_eq!(Grade::from_score(59.999), Grade::F);
        assert_eq!(Grade::from_score(0.0), Grade::F);
    }

    #[test]
    fn grade_display() {
        assert_eq!(Grade::B.to_string(), "B");
        assert_eq!(serde_json::to_string(&Grade::F).unwrap(), "\"F\"");
    }
}
