use serde::{Deserialize, Serialize};

/// `GET measures/component` response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentMeasuresResponse {
    pub component: MeasuredComponent,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MeasuredComponent {
    pub key: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub measures: Vec<Measure>,
}

/// One metric value. New-code metrics carry their value in `periods`
/// (or the older single `period` object) instead of `value`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Measure {
    pub metric: String,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub periods: Vec<MeasurePeriod>,
    #[serde(default)]
    pub period: Option<MeasurePeriod>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MeasurePeriod {
    #[serde(default)]
    pub index: Option<u32>,
    #[serde(default)]
    pub value: Option<String>,
}

impl Measure {
    pub fn new(metric: &str, value: &str) -> Self {
        Self {
            metric: metric.to_owned(),
            value: Some(value.to_owned()),
            ..Self::default()
        }
    }

    /// The first period's value when periods are present, else `value`.
    pub fn effective_value(&self) -> Option<&str> {
        if let Some(first) = self.periods.first() {
            return first.value.as_deref();
        }
        if let Some(period) = &self.period {
            return period.value.as_deref();
        }
        self.value.as_deref()
    }
}

/// `GET issues/search` response body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IssuesResponse {
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub issues: Vec<Issue>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub key: String,
    #[serde(rename = "type")]
    pub issue_type: String,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    pub component: String,
    #[serde(default)]
    pub line: Option<u32>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub effort: Option<String>,
    #[serde(default)]
    pub creation_date: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// `GET measures/component_tree` response body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComponentTreeResponse {
    #[serde(default)]
    pub components: Vec<TreeComponent>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TreeComponent {
    pub key: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub measures: Vec<Measure>,
}

impl TreeComponent {
    /// Numeric measure value; absent or unparseable reads as 0.
    pub fn measure_or_zero(&self, metric: &str) -> f64 {
        self.measures
            .iter()
            .find(|m| m.metric == metric)
            .and_then(|m| m.effective_value())
            .and_then(|v| v.trim().parse::<f64>().ok())
            .filter(|v| v.is_finite())
            .unwrap_or(0.0)
    }

    pub fn display_path(&self) -> String {
        match &self.path {
            Some(p) if !p.is_empty() => p.clone(),
            _ => file_part(&self.key).to_owned(),
        }
    }
}

/// `GET hotspots/search` response body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HotspotsResponse {
    #[serde(default)]
    pub hotspots: Vec<Hotspot>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hotspot {
    pub key: String,
    pub component: String,
    #[serde(default)]
    pub security_category: Option<String>,
    #[serde(default)]
    pub vulnerability_probability: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub line: Option<u32>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub creation_date: Option<String>,
}

/// `org_project:src/lib/file.py` → `src/lib/file.py`.
pub fn file_part(component_key: &str) -> &str {
    component_key.rsplit(':').next().unwrap_or(component_key)
}
