use qlens_common::error::{QlensError, QlensResult};
use serde::{Deserialize, Serialize};

/// Projects collected when `SONARCLOUD_PROJECTS` is not set.
pub const DEFAULT_PROJECTS: &str =
    "fklearn=gabrielsoaressn_fklearn,commons-lang=gabrielsoaressn_commons-lang";

/// A dashboard project id mapped to its SonarCloud component key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    pub id: String,
    pub sonar_key: String,
}

impl ProjectConfig {
    pub fn new(id: &str, sonar_key: &str) -> Self {
        Self {
            id: id.to_owned(),
            sonar_key: sonar_key.to_owned(),
        }
    }

    /// Human label for the dashboard: `commons-lang` → `Commons lang`.
    pub fn display_name(&self) -> String {
        let mut chars = self.id.chars();
        match chars.next() {
            Some(first) => {
                let rest: String = chars.collect();
                format!("{}{}", first.to_uppercase(), rest.replacen('-', " ", 1))
            }
            None => String::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProjectRegistry {
    projects: Vec<ProjectConfig>,
    default_id: String,
}

impl ProjectRegistry {
    /// Build a registry. Fails on an empty list, duplicate ids, or a default
    /// that does not name a configured project.
    pub fn new(projects: Vec<ProjectConfig>, default_id: &str) -> QlensResult<Self> {
        if projects.is_empty() {
            return Err(QlensError::Config(
                "at least one project must be configured".to_string(),
            ));
        }

        for (i, p) in projects.iter().enumerate() {
            if projects[..i].iter().any(|other| other.id == p.id) {
                return Err(QlensError::Config(format!("duplicate project id: {}", p.id)));
            }
        }

        if !projects.iter().any(|p| p.id == default_id) {
            return Err(QlensError::Config(format!(
                "default project {default_id} is not among the configured projects"
            )));
        }

        Ok(Self {
            projects,
            default_id: default_id.to_owned(),
        })
    }

    /// Parse `id=sonarKey` pairs separated by commas.
    pub fn parse_csv(raw: &str) -> QlensResult<Vec<ProjectConfig>> {
        let mut projects = Vec::new();

        for entry in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let (id, key) = entry.split_once('=').ok_or_else(|| {
                QlensError::Config(format!("invalid project entry {entry:?}, expected id=sonarKey"))
            })?;
            let (id, key) = (id.trim(), key.trim());
            if id.is_empty() || key.is_empty() {
                return Err(QlensError::Config(format!(
                    "invalid project entry {entry:?}, id and sonarKey must be non-empty"
                )));
            }
            projects.push(ProjectConfig::new(id, key));
        }

        if projects.is_empty() {
            return Err(QlensError::Config(
                "project list is set but contains no entries".to_string(),
            ));
        }

        Ok(projects)
    }

    pub fn all(&self) -> &[ProjectConfig] {
        &self.projects
    }

    pub fn default_id(&self) -> &str {
        &self.default_id
    }

    /// Look up a project by id, falling back to the default when `id` is `None`.
    pub fn resolve(&self, id: Option<&str>) -> QlensResult<&ProjectConfig> {
        let id = id.filter(|s| !s.is_empty()).unwrap_or(&self.default_id);
        self.projects
            .iter()
            .find(|p| p.id == id)
            .ok_or_else(|| QlensError::NotFound(format!("unknown project: {id}")))
    }
}

impl Default for ProjectRegistry {
    fn default() -> Self {
        let projects = vec![
            ProjectConfig::new("fklearn", "gabrielsoaressn_fklearn"),
            ProjectConfig::new("commons-lang", "gabrielsoaressn_commons-lang"),
        ];
        Self {
            projects,
            default_id: "fklearn".to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_default_csv() {
        let parsed = ProjectRegistry::parse_csv(DEFAULT_PROJECTS).unwrap();
        let registry = ProjectRegistry::default();
        assert_eq!(registry.all(), parsed.as_slice());
        assert_eq!(registry.default_id(), "fklearn");
    }

    #[test]
    fn parse_csv_trims_and_skips_blanks() {
        let parsed = ProjectRegistry::parse_csv(" a = org_a , ,b=org_b").unwrap();
        assert_eq!(
            parsed,
            vec![ProjectConfig::new("a", "org_a"), ProjectConfig::new("b", "org_b")]
        );
    }

    #[test]
    fn parse_csv_rejects_missing_separator() {
        assert!(ProjectRegistry::parse_csv("fklearn").is_err());
    }

    #[test]
    fn parse_csv_rejects_empty_list() {
        assert!(ProjectRegistry::parse_csv(" , ").is_err());
    }

    #[test]
    fn new_rejects_unknown_default() {
        let err = ProjectRegistry::new(vec![ProjectConfig::new("a", "x")], "b").unwrap_err();
        assert!(matches!(err, QlensError::Config(_)));
    }

    #[test]
    fn new_rejects_duplicate_ids() {
        let projects = vec![ProjectConfig::new("a", "x"), ProjectConfig::new("a", "y")];
        assert!(ProjectRegistry::new(projects, "a").is_err());
    }

    #[test]
    fn resolve_falls_back_to_default() {
        let registry = ProjectRegistry::default();
        assert_eq!(registry.resolve(None).unwrap().id, "fklearn");
        assert_eq!(registry.resolve(Some("")).unwrap().id, "fklearn");
        assert_eq!(
            registry.resolve(Some("commons-lang")).unwrap().sonar_key,
            "gabrielsoaressn_commons-lang"
        );
    }

    #[test]
    fn resolve_unknown_is_not_found() {
        let err = ProjectRegistry::default().resolve(Some("nope")).unwrap_err();
        assert!(matches!(err, QlensError::NotFound(_)));
    }

    #[test]
    fn display_name_capitalizes_and_replaces_first_dash() {
        assert_eq!(ProjectConfig::new("fklearn", "k").display_name(), "Fklearn");
        assert_eq!(
            ProjectConfig::new("commons-lang", "k").display_name(),
            "Commons lang"
        );
        assert_eq!(ProjectConfig::new("a-b-c", "k").display_name(), "A b-c");
    }
}
