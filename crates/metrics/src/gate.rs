use serde::Serialize;

use qlens_db::quality::models::{QualityMetricSnapshot, Rating};

const MAX_DEBT_RATIO: f64 = 10.0;
const COVERAGE_PASS: f64 = 80.0;
const COVERAGE_WARN: f64 = 60.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GateStatus {
    Passed,
    Warning,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GateCondition {
    pub name: &'static str,
    pub status: GateStatus,
    pub value: Option<String>,
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityGate {
    pub project_key: String,
    pub status: GateStatus,
    pub overall_rating: Rating,
    pub conditions: Vec<GateCondition>,
    pub passed: usize,
    pub warnings: usize,
    pub failed: usize,
}

fn rating_at_most_b(rating: Option<Rating>) -> bool {
    rating.is_some_and(|r| r <= Rating::B)
}

fn pass_or_fail(ok: bool) -> GateStatus {
    if ok {
        GateStatus::Passed
    } else {
        GateStatus::Failed
    }
}

fn count_or_unknown(value: Option<i64>) -> String {
    value.map_or_else(|| "?".to_string(), |v| v.to_string())
}

pub fn evaluate(snapshot: &QualityMetricSnapshot) -> QualityGate {
    let status = match snapshot.overall_rating {
        Rating::A | Rating::B => GateStatus::Passed,
        Rating::C => GateStatus::Warning,
        Rating::D | Rating::E => GateStatus::Failed,
    };

    let m = &snapshot.maintainability;
    let coverage = snapshot.coverage.overall;

    let conditions = vec![
        GateCondition {
            name: "Reliability",
            status: pass_or_fail(rating_at_most_b(snapshot.reliability.rating)),
            value: snapshot.reliability.rating.map(|r| r.to_string()),
            detail: format!("{} bugs", count_or_unknown(snapshot.reliability.bugs)),
        },
        GateCondition {
            name: "Security",
            status: pass_or_fail(rating_at_most_b(snapshot.security.rating)),
            value: snapshot.security.rating.map(|r| r.to_string()),
            detail: format!(
                "{} vulnerabilities",
                count_or_unknown(snapshot.security.vulnerabilities)
            ),
        },
        GateCondition {
            name: "Maintainability",
            status: pass_or_fail(
                rating_at_most_b(m.rating) && m.debt_ratio.is_some_and(|d| d < MAX_DEBT_RATIO),
            ),
            value: m.rating.map(|r| r.to_string()),
            detail: match m.debt_ratio {
                Some(d) => format!("{d:.1}% debt ratio"),
                None => "debt ratio unknown".to_string(),
            },
        },
        GateCondition {
            name: "Coverage",
            status: match coverage {
                Some(c) if c >= COVERAGE_PASS => GateStatus::Passed,
                Some(c) if c >= COVERAGE_WARN => GateStatus::Warning,
                _ => GateStatus::Failed,
            },
            value: coverage.map(|c| format!("{c:.1}%")),
            detail: "test coverage".to_string(),
        },
    ];

    let count = |s: GateStatus| conditions.iter().filter(|c| c.status == s).count();

    QualityGate {
        project_key: snapshot.project_key.clone(),
        status,
        overall_rating: snapshot.overall_rating,
        passed: count(GateStatus::Passed),
        warnings: count(GateStatus::Warning),
        failed: count(GateStatus::Failed),
        conditions,
    }
}
