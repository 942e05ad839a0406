//! Error types shared by the loader, the ranker and the catalog.

use std::fmt;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SearchError>;

/// Which namespace a name was looked up in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    Domain,
    Stack,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Domain => f.write_str("domain"),
            Scope::Stack => f.write_str("stack"),
        }
    }
}

#[derive(Debug, Error)]
pub enum SearchError {
    /// A declared data source is missing, unreadable or structurally invalid.
    #[error("failed to load source '{source_name}': {reason}")]
    Load { source_name: String, reason: String },

    /// Empty or whitespace-only query text.
    #[error("query must contain at least one non-whitespace character")]
    InvalidQuery,

    #[error("unknown {scope} '{name}'. Available: {}", .available.join(", "))]
    UnknownDomain {
        scope: Scope,
        name: String,
        available: Vec<String>,
    },

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl SearchError {
    pub(crate) fn load(source_name: &str, reason: impl fmt::Display) -> Self {
        SearchError::Load { source_name: source_name.to_string(), reason: reason.to_string() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_domain_lists_available_names() {
        let err = SearchError::UnknownDomain {
            scope: Scope::Stack,
            name: "vue".into(),
            available: vec!["nextjs".into(), "react".into()],
        };
        assert_eq!(err.to_string(), "unknown stack 'vue'. Available: nextjs, react");
    }
}
