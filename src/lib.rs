pub mod analyzer;
pub mod config;
pub mod domain_utils;
pub mod errors;
pub mod matcher;
pub mod pipeline;
pub mod store;

pub use analyzer::{build_pattern, DomainAnalyzer, DomainProfile, PrefixBoundPolicy};
pub use config::Config;
pub use errors::AnalysisError;
pub use matcher::RuleMatcher;
pub use pipeline::{RulePipeline, RunSummary};
pub use store::{FilterRule, ProjectId, RuleStore, SqliteRuleStore};
