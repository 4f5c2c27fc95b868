/// Minimal domain label utilities
pub struct DomainUtils;

impl DomainUtils {
    /// Split a domain into its dot-separated labels
    pub fn labels(domain: &str) -> Vec<&str> {
        domain.split('.').collect()
    }

    /// Base domain candidate: the last two labels joined by a dot.
    /// Domains with fewer than two labels yield whatever labels are present.
    pub fn base_domain(domain: &str) -> String {
        let labels = Self::labels(domain);
        let start = labels.len().saturating_sub(2);
        labels[start..].join(".")
    }

    /// Character length of everything left of the base domain, without the
    /// joining dot. Zero when the domain has two labels or fewer.
    pub fn remaining_length(domain: &str) -> usize {
        let labels = Self::labels(domain);
        let end = labels.len().saturating_sub(2);
        labels[..end].join(".").chars().count()
    }

    /// Split a base domain into (second-level, top-level) labels
    pub fn split_base_domain(base_domain: &str) -> Option<(&str, &str)> {
        let mut parts = base_domain.split('.');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(second), Some(top), None) => Some((second, top)),
            _ => None,
        }
    }
}
