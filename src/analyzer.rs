use crate::domain_utils::DomainUtils;
use crate::errors::{AnalysisError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Rejects hostnames with five or more dots
const MAX_DEPTH_LOOKAHEAD: &str = r"(?!.*\..*\..*\..*\..*\..*)";

/// Character class accepted in the subdomain prefix
const PREFIX_CLASS: &str = "[a-zA-Z0-9.-]";

/// What to do when the inferred prefix bound is zero or negative
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrefixBoundPolicy {
    /// Fail the project with `NonPositivePrefixBound`
    #[default]
    Reject,
    /// Raise the bound to 1
    Clamp,
}

/// Dominant base domain and prefix bound inferred from a project's domains
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainProfile {
    pub base_domain: String,
    pub prefix_length_bound: i64,
}

/// Frequency count that remembers first-seen order
#[derive(Debug, Default)]
struct FrequencyTable {
    index: HashMap<String, usize>,
    entries: Vec<(String, usize)>,
}

impl FrequencyTable {
    fn add(&mut self, key: String) {
        match self.index.get(&key) {
            Some(&slot) => self.entries[slot].1 += 1,
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, 1));
            }
        }
    }

    /// Most frequent key; the earliest-seen key wins ties.
    fn most_common(&self) -> Option<&str> {
        let mut best: Option<&(String, usize)> = None;
        for entry in &self.entries {
            if best.map_or(true, |b| entry.1 > b.1) {
                best = Some(entry);
            }
        }
        best.map(|(key, _)| key.as_str())
    }
}

pub struct DomainAnalyzer {
    policy: PrefixBoundPolicy,
}

impl Default for DomainAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl DomainAnalyzer {
    pub fn new() -> Self {
        Self::with_policy(PrefixBoundPolicy::default())
    }

    pub fn with_policy(policy: PrefixBoundPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> PrefixBoundPolicy {
        self.policy
    }

    /// Majority-vote base domain and `floor(mean(remaining lengths)) - 1`,
    /// with the mean taken by integer division.
    pub fn analyze<S: AsRef<str>>(&self, domains: &[S]) -> Result<DomainProfile> {
        if domains.is_empty() {
            return Err(AnalysisError::EmptyProjectDomainSet);
        }

        let mut base_domains = FrequencyTable::default();
        let mut total_remaining: usize = 0;

        for domain in domains {
            let domain = domain.as_ref();
            base_domains.add(DomainUtils::base_domain(domain));
            total_remaining += DomainUtils::remaining_length(domain);
        }

        let base_domain = base_domains
            .most_common()
            .ok_or(AnalysisError::EmptyProjectDomainSet)?
            .to_string();

        let mean_remaining = (total_remaining / domains.len()) as i64;

        Ok(DomainProfile {
            base_domain,
            prefix_length_bound: mean_remaining - 1,
        })
    }

    /// Analyze the domains and build the filter pattern, applying the
    /// configured policy to non-positive bounds.
    pub fn create_regexp<S: AsRef<str>>(&self, domains: &[S]) -> Result<String> {
        let profile = self.analyze(domains)?;
        log::debug!(
            "Inferred base domain {} with prefix bound {}",
            profile.base_domain,
            profile.prefix_length_bound
        );

        let bound = match self.policy {
            PrefixBoundPolicy::Clamp if profile.prefix_length_bound < 1 => {
                log::debug!(
                    "Clamping prefix bound {} to 1",
                    profile.prefix_length_bound
                );
                1
            }
            _ => profile.prefix_length_bound,
        };

        build_pattern(&profile.base_domain, bound)
    }
}

/// Compose the anchored filter pattern for `base_domain`.
///
/// The result uses a negative lookahead, so it needs a backtracking engine
/// such as `fancy_regex`; the `regex` crate will not compile it.
pub fn build_pattern(base_domain: &str, prefix_length_bound: i64) -> Result<String> {
    let (second_level, top_level) = DomainUtils::split_base_domain(base_domain).ok_or_else(|| {
        AnalysisError::DegenerateBaseDomain {
            base_domain: base_domain.to_string(),
        }
    })?;

    if prefix_length_bound < 1 {
        return Err(AnalysisError::NonPositivePrefixBound {
            bound: prefix_length_bound,
        });
    }

    Ok(format!(
        r"^{MAX_DEPTH_LOOKAHEAD}{PREFIX_CLASS}{{1,{prefix_length_bound}}}\.{}\.{}",
        regex::escape(second_level),
        regex::escape(top_level)
    ))
}
