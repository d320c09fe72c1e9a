//! Typed search errors.
//!
//! Timeout expiry is never an error: a search that runs out of time still
//! returns a well-formed table. `SearchError` covers precondition violations,
//! failures propagated from the agent or evaluator, and internal graph
//! inconsistencies.

use looptune_kernel::agent::AgentError;
use looptune_kernel::eval::EvalError;

/// Typed failure for search operations.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchError {
    /// A depth or step budget below zero was requested.
    NegativeDepth { requested: i64 },
    /// A depth or step budget above the configured `max_depth` was requested.
    DepthBudgetExceeded { requested: i64, max_depth: u32 },
    /// A configuration value is out of range.
    InvalidConfig { detail: String },
    /// The agent rejected an action chosen by the search.
    Agent(AgentError),
    /// The evaluator failed; its score must not enter the graph.
    Eval(EvalError),
    /// Best-path extraction was requested before any node was recorded.
    EmptyGraph,
    /// The back-walk from the best node could not find its parent edge.
    BrokenBestPath {
        fingerprint: String,
        action: String,
        detail: String,
    },
}

impl std::fmt::Display for SearchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NegativeDepth { requested } => {
                write!(f, "search depth must be >= 0, got {requested}")
            }
            Self::DepthBudgetExceeded {
                requested,
                max_depth,
            } => write!(
                f,
                "search depth {requested} exceeds configured max_depth {max_depth}"
            ),
            Self::InvalidConfig { detail } => write!(f, "invalid search config: {detail}"),
            Self::Agent(err) => write!(f, "agent error during search: {err}"),
            Self::Eval(err) => write!(f, "evaluator error during search: {err}"),
            Self::EmptyGraph => write!(f, "search graph has no nodes"),
            Self::BrokenBestPath {
                fingerprint,
                action,
                detail,
            } => write!(
                f,
                "best path broken at {fingerprint} (action '{action}'): {detail}"
            ),
        }
    }
}

impl std::error::Error for SearchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Agent(err) => Some(err),
            Self::Eval(err) => Some(err),
            _ => None,
        }
    }
}

impl From<AgentError> for SearchError {
    fn from(err: AgentError) -> Self {
        Self::Agent(err)
    }
}

impl From<EvalError> for SearchError {
    fn from(err: EvalError) -> Self {
        Self::Eval(err)
    }
}
