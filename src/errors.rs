use thiserror::Error;

/// Failures of the per-project rule computation.
///
/// These abort only the project being analyzed; store failures are reported
/// through `anyhow` and abort the whole run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("project has no domains")]
    EmptyProjectDomainSet,

    #[error("base domain '{base_domain}' does not have exactly two labels")]
    DegenerateBaseDomain { base_domain: String },

    #[error("prefix length bound {bound} is not positive")]
    NonPositivePrefixBound { bound: i64 },
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
