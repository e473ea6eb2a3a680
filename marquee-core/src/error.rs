use std::fmt;

use marquee_model::MetadataType;
use thiserror::Error;

/// Which store round-trip a failure belongs to, so callers can decide whether
/// a partial response is acceptable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryPhase {
    Rows,
    Count,
    Artwork,
    Aggregate,
}

impl fmt::Display for QueryPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryPhase::Rows => f.write_str("row query"),
            QueryPhase::Count => f.write_str("count query"),
            QueryPhase::Artwork => f.write_str("artwork query"),
            QueryPhase::Aggregate => f.write_str("aggregate query"),
        }
    }
}

#[derive(Error, Debug)]
pub enum QueryError {
    #[error("Invalid facet combination: {0}")]
    InvalidFacetCombination(String),

    #[error("Unsupported entity type: {0}")]
    UnsupportedEntityType(MetadataType),

    #[error("Store execution failed during {phase}: {source}")]
    StoreExecution {
        phase: QueryPhase,
        #[source]
        source: sqlx::Error,
    },

    #[error("Row mapping failed: {0}")]
    RowMapping(String),

    #[error("Unbound query parameter: {0}")]
    UnboundParameter(String),
}

impl QueryError {
    pub fn store(phase: QueryPhase) -> impl FnOnce(sqlx::Error) -> Self {
        move |source| QueryError::StoreExecution { phase, source }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        QueryError::InvalidFacetCombination(message.into())
    }

    /// The phase a store failure happened in, if this is one.
    pub fn phase(&self) -> Option<QueryPhase> {
        match self {
            QueryError::StoreExecution { phase, .. } => Some(*phase),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, QueryError>;
