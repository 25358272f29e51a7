use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use qlens_common::error::QlensError;

/// SonarCloud letter rating. `A` is best, `E` is worst, so the derived
/// ordering puts the worst rating last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Rating {
    A,
    B,
    C,
    D,
    E,
}

impl Rating {
    pub const ALL: [Rating; 5] = [Rating::A, Rating::B, Rating::C, Rating::D, Rating::E];

    pub fn as_str(&self) -> &'static str {
        match self {
            Rating::A => "A",
            Rating::B => "B",
            Rating::C => "C",
            Rating::D => "D",
            Rating::E => "E",
        }
    }

    /// Parse a letter (`"b"`, `"B"`) or SonarCloud's numeric form (`"2.0"`).
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        match raw.to_ascii_uppercase().as_str() {
            "A" => return Some(Rating::A),
            "B" => return Some(Rating::B),
            "C" => return Some(Rating::C),
            "D" => return Some(Rating::D),
            "E" => return Some(Rating::E),
            _ => {}
        }

        let value: f64 = raw.parse().ok()?;
        if value.fract() != 0.0 || !(1.0..=5.0).contains(&value) {
            return None;
        }
        Rating::ALL.get(value as usize - 1).copied()
    }

    /// The worst of the present ratings, or `A` when none are present.
    pub fn worst_of<I>(ratings: I) -> Rating
    where
        I: IntoIterator<Item = Option<Rating>>,
    {
        ratings.into_iter().flatten().max().unwrap_or(Rating::A)
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Rating {
    type Err = QlensError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Rating::parse(s).ok_or_else(|| QlensError::Validation(format!("invalid rating: {s:?}")))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reliability {
    pub bugs: Option<i64>,
    pub rating: Option<Rating>,
    pub remediation_effort: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Security {
    pub vulnerabilities: Option<i64>,
    pub rating: Option<Rating>,
    pub remediation_effort: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Maintainability {
    pub code_smells: Option<i64>,
    /// Technical debt in minutes (`sqale_index`).
    pub technical_debt: Option<i64>,
    pub debt_ratio: Option<f64>,
    pub rating: Option<Rating>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coverage {
    pub overall: Option<f64>,
    pub new: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Duplication {
    pub density: Option<f64>,
    pub new_density: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Size {
    pub lines_of_code: Option<i64>,
    pub complexity: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCode {
    pub bugs: Option<i64>,
    pub vulnerabilities: Option<i64>,
    pub code_smells: Option<i64>,
}

/// One normalized SonarCloud reading for one project. `None` marks a
/// measure the upstream did not report, which is distinct from zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityMetricSnapshot {
    pub timestamp: DateTime<Utc>,
    pub project_key: String,
    pub reliability: Reliability,
    pub security: Security,
    pub maintainability: Maintainability,
    pub coverage: Coverage,
    pub duplication: Duplication,
    pub size: Size,
    pub new_code: NewCode,
    pub overall_rating: Rating,
    pub technical_debt_minutes: Option<i64>,
}

impl QualityMetricSnapshot {
    /// A snapshot with every measure missing.
    pub fn empty(project_key: &str, timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            project_key: project_key.to_owned(),
            reliability: Reliability::default(),
            security: Security::default(),
            maintainability: Maintainability::default(),
            coverage: Coverage::default(),
            duplication: Duplication::default(),
            size: Size::default(),
            new_code: NewCode::default(),
            overall_rating: Rating::A,
            technical_debt_minutes: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rating_parses_letters_case_insensitive() {
        assert_eq!(Rating::parse("a"), Some(Rating::A));
        assert_eq!(Rating::parse(" E "), Some(Rating::E));
    }

    #[test]
    fn rating_parses_sonar_numeric_form() {
        assert_eq!(Rating::parse("1.0"), Some(Rating::A));
        assert_eq!(Rating::parse("3"), Some(Rating::C));
        assert_eq!(Rating::parse("5.0"), Some(Rating::E));
    }

    #[test]
    fn rating_rejects_out_of_range_and_garbage() {
        assert_eq!(Rating::parse("0"), None);
        assert_eq!(Rating::parse("6.0"), None);
        assert_eq!(Rating::parse("2.5"), None);
        assert_eq!(Rating::parse("*"), None);
        assert_eq!(Rating::parse(""), None);
        assert_eq!(Rating::parse("F"), None);
    }

    #[test]
    fn worst_of_picks_lowest_quality() {
        let worst = Rating::worst_of([Some(Rating::B), Some(Rating::D), Some(Rating::A)]);
        assert_eq!(worst, Rating::D);
    }

    #[test]
    fn worst_of_ignores_missing() {
        assert_eq!(Rating::worst_of([None, Some(Rating::C), None]), Rating::C);
    }

    #[test]
    fn worst_of_defaults_to_best() {
        assert_eq!(Rating::worst_of([None, None, None]), Rating::A);
    }

    #[test]
    fn snapshot_serializes_camel_case_with_nulls() {
        let snapshot = QualityMetricSnapshot::empty("org_proj", Utc::now());
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["projectKey"], "org_proj");
        assert_eq!(json["overallRating"], "A");
        assert!(json["reliability"]["bugs"].is_null());
        assert!(json["newCode"]["codeSmells"].is_null());
        assert!(json["maintainability"]["debtRatio"].is_null());
    }
}
