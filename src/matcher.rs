use crate::store::{FilterRule, ProjectId};
use anyhow::{Context, Result};
use fancy_regex::Regex;

/// Compiled filter rules used to classify candidate hostnames
pub struct RuleMatcher {
    rules: Vec<(ProjectId, Regex)>,
}

impl RuleMatcher {
    pub fn new(rules: &[FilterRule]) -> Result<Self> {
        let rules = rules
            .iter()
            .map(|rule| -> Result<(ProjectId, Regex)> {
                let regex = Regex::new(&rule.regexp).with_context(|| {
                    format!(
                        "Invalid rule for project {}: {}",
                        rule.project_id, rule.regexp
                    )
                })?;
                Ok((rule.project_id.clone(), regex))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { rules })
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Projects whose rule matches `hostname`, deduplicated, in rule order
    pub fn matching_projects(&self, hostname: &str) -> Result<Vec<ProjectId>> {
        let mut matched: Vec<ProjectId> = Vec::new();

        for (project_id, regex) in &self.rules {
            if matched.contains(project_id) {
                continue;
            }
            if regex
                .is_match(hostname)
                .with_context(|| format!("Failed to evaluate rule for project {project_id}"))?
            {
                matched.push(project_id.clone());
            }
        }

        Ok(matched)
    }
}
