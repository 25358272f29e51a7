//! Turns a SonarCloud `measures/component` response into a snapshot.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use qlens_db::quality::models::{
    Coverage, Duplication, Maintainability, NewCode, QualityMetricSnapshot, Rating, Reliability,
    Security, Size,
};
use qlens_sonarcloud::models::{ComponentMeasuresResponse, Measure};

use crate::round2;

/// Lookup of metric key to its effective raw value.
struct Measures<'a>(HashMap<&'a str, &'a str>);

impl<'a> Measures<'a> {
    fn new(measures: &'a [Measure]) -> Self {
        Self(
            measures
                .iter()
                .filter_map(|m| m.effective_value().map(|v| (m.metric.as_str(), v)))
                .collect(),
        )
    }

    fn float(&self, key: &str) -> Option<f64> {
        self.0.get(key).and_then(|raw| parse_number(raw)).map(round2)
    }

    fn int(&self, key: &str) -> Option<i64> {
        self.0
            .get(key)
            .and_then(|raw| parse_number(raw))
            .map(|v| v.trunc() as i64)
    }

    fn rating(&self, key: &str) -> Option<Rating> {
        self.0.get(key).and_then(|raw| Rating::parse(raw))
    }
}

fn parse_number(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    raw.parse::<f64>().ok().filter(|v| v.is_finite())
}

pub fn normalize_response(
    project_key: &str,
    response: &ComponentMeasuresResponse,
    timestamp: DateTime<Utc>,
) -> QualityMetricSnapshot {
    normalize(project_key, &response.component.measures, timestamp)
}

/// Build a snapshot from raw measures. Never fails: anything absent or
/// unparseable becomes `None`.
pub fn normalize(
    project_key: &str,
    measures: &[Measure],
    timestamp: DateTime<Utc>,
) -> QualityMetricSnapshot {
    let m = Measures::new(measures);

    let reliability = Reliability {
        bugs: m.int("bugs"),
        rating: m.rating("reliability_rating"),
        remediation_effort: m.int("reliability_remediation_effort"),
    };
    let security = Security {
        vulnerabilities: m.int("vulnerabilities"),
        rating: m.rating("security_rating"),
        remediation_effort: m.int("security_remediation_effort"),
    };
    let maintainability = Maintainability {
        code_smells: m.int("code_smells"),
        technical_debt: m.int("sqale_index"),
        debt_ratio: m.float("sqale_debt_ratio"),
        rating: m.rating("sqale_rating"),
    };

    let overall_rating = Rating::worst_of([
        reliability.rating,
        security.rating,
        maintainability.rating,
    ]);

    QualityMetricSnapshot {
        timestamp,
        project_key: project_key.to_owned(),
        technical_debt_minutes: maintainability.technical_debt,
        reliability,
        security,
        maintainability,
        coverage: Coverage {
            overall: m.float("coverage"),
            new: m.float("new_coverage"),
        },
        duplication: Duplication {
            density: m.float("duplicated_lines_density"),
            new_density: m.float("new_duplicated_lines_density"),
        },
        size: Size {
            lines_of_code: m.int("ncloc"),
            complexity: m.int("complexity"),
        },
        new_code: NewCode {
            bugs: m.int("new_bugs"),
            vulnerabilities: m.int("new_vulnerabilities"),
            code_smells: m.int("new_code_smells"),
        },
        overall_rating,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use qlens_sonarcloud::models::MeasurePeriod;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn period(metric: &str, value: &str) -> Measure {
        Measure {
            metric: metric.to_string(),
            value: None,
            periods: vec![MeasurePeriod {
                index: Some(1),
                value: Some(value.to_string()),
            }],
            period: None,
        }
    }

    #[test]
    fn full_response_maps_every_field() {
        let measures = vec![
            Measure::new("bugs", "3"),
            Measure::new("reliability_rating", "3.0"),
            Measure::new("reliability_remediation_effort", "45"),
            Measure::new("vulnerabilities", "0"),
            Measure::new("security_rating", "1.0"),
            Measure::new("security_remediation_effort", "0"),
            Measure::new("code_smells", "120"),
            Measure::new("sqale_index", "960"),
            Measure::new("sqale_debt_ratio", "1.2345"),
            Measure::new("sqale_rating", "A"),
            Measure::new("ncloc", "15000"),
            Measure::new("coverage", "81.456"),
            Measure::new("duplicated_lines_density", "2.5"),
            Measure::new("complexity", "2100"),
            period("new_bugs", "1"),
            period("new_vulnerabilities", "0"),
            period("new_code_smells", "7"),
            period("new_coverage", "66.666"),
            period("new_duplicated_lines_density", "0.0"),
        ];

        let s = normalize("org_proj", &measures, ts());

        assert_eq!(s.project_key, "org_proj");
        assert_eq!(s.timestamp, ts());
        assert_eq!(s.reliability.bugs, Some(3));
        assert_eq!(s.reliability.rating, Some(Rating::C));
        assert_eq!(s.security.rating, Some(Rating::A));
        assert_eq!(s.maintainability.technical_debt, Some(960));
        assert_eq!(s.maintainability.debt_ratio, Some(1.23));
        assert_eq!(s.coverage.overall, Some(81.46));
        assert_eq!(s.coverage.new, Some(66.67));
        assert_eq!(s.duplication.new_density, Some(0.0));
        assert_eq!(s.new_code.code_smells, Some(7));
        assert_eq!(s.size.lines_of_code, Some(15000));
        assert_eq!(s.technical_debt_minutes, Some(960));
        assert_eq!(s.overall_rating, Rating::C);
    }

    #[test]
    fn missing_and_garbage_values_become_none() {
        let measures = vec![
            Measure::new("bugs", ""),
            Measure::new("vulnerabilities", "n/a"),
            Measure::new("coverage", "NaN"),
            Measure::new("ncloc", "inf"),
            Measure::new("security_rating", "*"),
        ];

        let s = normalize("p", &measures, ts());

        assert_eq!(s.reliability.bugs, None);
        assert_eq!(s.security.vulnerabilities, None);
        assert_eq!(s.coverage.overall, None);
        assert_eq!(s.size.lines_of_code, None);
        assert_eq!(s.security.rating, None);
        assert_eq!(s.maintainability.code_smells, None);
    }

    #[test]
    fn zero_is_kept_distinct_from_missing() {
        let s = normalize("p", &[Measure::new("bugs", "0")], ts());
        assert_eq!(s.reliability.bugs, Some(0));
        assert_eq!(s.security.vulnerabilities, None);
    }

    #[test]
    fn integers_truncate_toward_zero() {
        let s = normalize(
            "p",
            &[Measure::new("ncloc", "99.9"), Measure::new("complexity", "-2.7")],
            ts(),
        );
        assert_eq!(s.size.lines_of_code, Some(99));
        assert_eq!(s.size.complexity, Some(-2));
    }

    #[test]
    fn overall_rating_defaults_to_a() {
        let s = normalize("p", &[], ts());
        assert_eq!(s.overall_rating, Rating::A);
    }

    #[test]
    fn overall_rating_is_worst_present() {
        let s = normalize(
            "p",
            &[
                Measure::new("reliability_rating", "B"),
                Measure::new("security_rating", "5.0"),
            ],
            ts(),
        );
        assert_eq!(s.overall_rating, Rating::E);
    }

    #[test]
    fn period_value_wins_over_plain_value() {
        let mut m = period("new_bugs", "4");
        m.value = Some("9".to_string());
        let s = normalize("p", &[m], ts());
        assert_eq!(s.new_code.bugs, Some(4));
    }

    #[test]
    fn normalize_response_reads_component_measures() {
        let response: ComponentMeasuresResponse = serde_json::from_value(serde_json::json!({
            "component": {
                "key": "org_proj",
                "measures": [{ "metric": "code_smells", "value": "12" }]
            }
        }))
        .unwrap();
        let s = normalize_response("org_proj", &response, ts());
        assert_eq!(s.maintainability.code_smells, Some(12));
    }
}
