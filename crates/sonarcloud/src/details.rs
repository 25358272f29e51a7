//! Per-file drill-downs built from the SonarCloud search and tree endpoints.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::client::{SonarCloudClient, SonarCloudClientError};
use crate::models::{file_part, Hotspot, Issue, TreeComponent};

const TOP_N: usize = 10;
const DEFAULT_EFFORT: &str = "5min";

pub const COMPLEXITY_METRICS: &[&str] = &["complexity", "cognitive_complexity", "ncloc"];
pub const COVERAGE_METRICS: &[&str] = &["coverage", "line_coverage", "uncovered_lines", "lines_to_cover"];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueSummary {
    pub key: String,
    #[serde(rename = "type")]
    pub issue_type: String,
    pub severity: Option<String>,
    pub message: Option<String>,
    pub component: String,
    pub line: Option<u32>,
    pub status: Option<String>,
    pub effort: String,
    pub creation_date: Option<String>,
    pub tags: Vec<String>,
}

impl From<Issue> for IssueSummary {
    fn from(issue: Issue) -> Self {
        Self {
            component: file_part(&issue.component).to_owned(),
            key: issue.key,
            issue_type: issue.issue_type,
            severity: issue.severity,
            message: issue.message,
            line: issue.line,
            status: issue.status,
            effort: issue
                .effort
                .filter(|e| !e.is_empty())
                .unwrap_or_else(|| DEFAULT_EFFORT.to_string()),
            creation_date: issue.creation_date,
            tags: issue.tags,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupedIssues {
    pub bugs: Vec<IssueSummary>,
    pub vulnerabilities: Vec<IssueSummary>,
    pub code_smells: Vec<IssueSummary>,
    pub by_file: BTreeMap<String, Vec<IssueSummary>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCodeIssues {
    pub total: usize,
    pub total_bugs: usize,
    pub total_vulnerabilities: usize,
    pub total_code_smells: usize,
    pub issues: GroupedIssues,
}

pub fn group_issues(issues: Vec<Issue>) -> NewCodeIssues {
    let total = issues.len();
    let mut grouped = GroupedIssues::default();

    for issue in issues {
        let summary = IssueSummary::from(issue);
        grouped
            .by_file
            .entry(summary.component.clone())
            .or_default()
            .push(summary.clone());
        match summary.issue_type.as_str() {
            "BUG" => grouped.bugs.push(summary),
            "VULNERABILITY" => grouped.vulnerabilities.push(summary),
            "CODE_SMELL" => grouped.code_smells.push(summary),
            _ => {}
        }
    }

    NewCodeIssues {
        total,
        total_bugs: grouped.bugs.len(),
        total_vulnerabilities: grouped.vulnerabilities.len(),
        total_code_smells: grouped.code_smells.len(),
        issues: grouped,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileComplexity {
    pub name: String,
    pub path: String,
    pub complexity: i64,
    pub cognitive_complexity: i64,
    pub lines_of_code: i64,
    /// Complexity per line of code, 0 when the file has no code lines.
    pub complexity_density: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplexityStats {
    pub total_components: usize,
    pub total_complexity: i64,
    pub avg_complexity: i64,
    pub max_complexity: i64,
    pub hotspots: Vec<FileComplexity>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComplexityReport {
    pub components: Vec<FileComplexity>,
    pub stats: ComplexityStats,
}

pub fn complexity_report(components: &[TreeComponent]) -> ComplexityReport {
    let mut files: Vec<FileComplexity> = components
        .iter()
        .map(|c| {
            let complexity = c.measure_or_zero("complexity");
            let ncloc = c.measure_or_zero("ncloc");
            FileComplexity {
                name: c.name.clone(),
                path: c.display_path(),
                complexity: complexity as i64,
                cognitive_complexity: c.measure_or_zero("cognitive_complexity") as i64,
                lines_of_code: ncloc as i64,
                complexity_density: if ncloc > 0.0 {
                    round_to(complexity / ncloc, 2)
                } else {
                    0.0
                },
            }
        })
        .collect();

    files.sort_by(|a, b| b.complexity.cmp(&a.complexity));

    let total_complexity: i64 = files.iter().map(|f| f.complexity).sum();
    let avg_complexity = if files.is_empty() {
        0
    } else {
        (total_complexity as f64 / files.len() as f64).round() as i64
    };

    let stats = ComplexityStats {
        total_components: files.len(),
        total_complexity,
        avg_complexity,
        max_complexity: files.first().map_or(0, |f| f.complexity),
        hotspots: files.iter().take(TOP_N).cloned().collect(),
    };

    ComplexityReport {
        components: files,
        stats,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileCoverage {
    pub name: String,
    pub path: String,
    pub coverage: f64,
    pub line_coverage: f64,
    pub uncovered_lines: i64,
    pub lines_to_cover: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageReport {
    pub components: Vec<FileCoverage>,
    pub worst_coverage: Vec<FileCoverage>,
}

/// Coverage of files that contain testable lines, lowest coverage first.
pub fn coverage_report(components: &[TreeComponent]) -> CoverageReport {
    let mut files: Vec<FileCoverage> = components
        .iter()
        .map(|c| FileCoverage {
            name: c.name.clone(),
            path: c.display_path(),
            coverage: round_to(c.measure_or_zero("coverage"), 1),
            line_coverage: round_to(c.measure_or_zero("line_coverage"), 1),
            uncovered_lines: c.measure_or_zero("uncovered_lines").round() as i64,
            lines_to_cover: c.measure_or_zero("lines_to_cover").round() as i64,
        })
        .filter(|f| f.lines_to_cover > 0)
        .collect();

    files.sort_by(|a, b| a.coverage.total_cmp(&b.coverage));

    CoverageReport {
        worst_coverage: files.iter().take(TOP_N).cloned().collect(),
        components: files,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HotspotSummary {
    pub key: String,
    pub component: String,
    pub security_category: Option<String>,
    pub vulnerability_probability: Option<String>,
    pub message: Option<String>,
    pub line: Option<u32>,
    pub status: Option<String>,
    pub creation_date: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct HotspotReport {
    pub total: usize,
    pub hotspots: Vec<HotspotSummary>,
}

pub fn hotspot_report(hotspots: Vec<Hotspot>) -> HotspotReport {
    let hotspots: Vec<HotspotSummary> = hotspots
        .into_iter()
        .map(|h| HotspotSummary {
            component: file_part(&h.component).to_owned(),
            key: h.key,
            security_category: h.security_category,
            vulnerability_probability: h.vulnerability_probability,
            message: h.message,
            line: h.line,
            status: h.status,
            creation_date: h.creation_date,
        })
        .collect();

    HotspotReport {
        total: hotspots.len(),
        hotspots,
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

impl SonarCloudClient {
    pub async fn new_code_issues(
        &self,
        project_key: &str,
    ) -> Result<NewCodeIssues, SonarCloudClientError> {
        let response = self.search_issues(project_key).await?;
        Ok(group_issues(response.issues))
    }

    pub async fn complexity_by_file(
        &self,
        project_key: &str,
    ) -> Result<ComplexityReport, SonarCloudClientError> {
        let tree = self.component_tree(project_key, COMPLEXITY_METRICS).await?;
        Ok(complexity_report(&tree.components))
    }

    pub async fn coverage_by_file(
        &self,
        project_key: &str,
    ) -> Result<CoverageReport, SonarCloudClientError> {
        let tree = self.component_tree(project_key, COVERAGE_METRICS).await?;
        Ok(coverage_report(&tree.components))
    }

    /// Unreviewed hotspots. Projects without hotspot access get an empty
    /// report instead of an error.
    pub async fn security_hotspots(&self, project_key: &str) -> HotspotReport {
        match self.search_hotspots(project_key).await {
            Ok(response) => hotspot_report(response.hotspots),
            Err(e) => {
                tracing::warn!(project = project_key, error = %e, "hotspot search failed");
                HotspotReport::default()
            }
        }
    }
}
