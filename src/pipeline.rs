use crate::analyzer::DomainAnalyzer;
use crate::errors::AnalysisError;
use crate::store::{FilterRule, ProjectId, RuleStore};
use anyhow::{Context, Result};
use serde::Serialize;

/// A project whose rule could not be computed
#[derive(Debug, Clone, Serialize)]
pub struct ProjectFailure {
    pub project_id: ProjectId,
    pub error: String,
    #[serde(skip)]
    pub cause: AnalysisError,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub projects_seen: usize,
    pub rules: Vec<FilterRule>,
    pub failures: Vec<ProjectFailure>,
}

impl RunSummary {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Computes one filter rule per project and appends it to the store
pub struct RulePipeline<'a, S: RuleStore> {
    store: &'a mut S,
    analyzer: DomainAnalyzer,
    dry_run: bool,
}

impl<'a, S: RuleStore> RulePipeline<'a, S> {
    pub fn new(store: &'a mut S, analyzer: DomainAnalyzer) -> Self {
        Self {
            store,
            analyzer,
            dry_run: false,
        }
    }

    /// Compute rules without persisting them
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Process every project in store order.
    ///
    /// Analysis failures are recorded and the run moves on; any store error
    /// stops the run, leaving rules committed so far in place.
    pub fn run(&mut self) -> Result<RunSummary> {
        let project_ids = self
            .store
            .list_project_ids()
            .context("Failed to list project ids")?;

        let mut summary = RunSummary {
            projects_seen: project_ids.len(),
            ..RunSummary::default()
        };
        log::info!("Processing {} projects", project_ids.len());

        for project_id in project_ids {
            let domains = self
                .store
                .list_domains(&project_id)
                .with_context(|| format!("Failed to read domains for project {project_id}"))?;

            let regexp = match self.analyzer.create_regexp(&domains) {
                Ok(regexp) => regexp,
                Err(e) => {
                    log::warn!("Skipping project {project_id}: {e}");
                    summary.failures.push(ProjectFailure {
                        project_id,
                        error: e.to_string(),
                        cause: e,
                    });
                    continue;
                }
            };

            if self.dry_run {
                log::info!("Project {project_id}: {regexp} (dry run)");
            } else {
                self.store
                    .persist_rule(&project_id, &regexp)
                    .with_context(|| format!("Failed to persist rule for project {project_id}"))?;
                log::info!("Project {project_id}: {regexp}");
            }

            summary.rules.push(FilterRule { project_id, regexp });
        }

        Ok(summary)
    }
}
