//! Evaluator contract: the performance oracle the search is scored against.
//!
//! Concrete backends (measured execution, learned cost model, learned policy)
//! live outside the search layer. The search only needs two questions
//! answered: "how fast is this state?" and "which actions look best from here?"

use std::path::Path;

use crate::agent::{AgentError, LoopAgentV1};

/// Which oracle ranks candidate actions.
///
/// Node scores recorded in a search graph always use [`EvalMode::LoopNest`];
/// the mode only changes which candidates get explored when ranking is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EvalMode {
    /// Measured throughput of the generated loop nest (ground truth).
    #[default]
    LoopNest,
    /// Learned cost-model estimate.
    Cost,
    /// Learned policy ranking over actions.
    Policy,
}

impl EvalMode {
    /// Wire name used by session commands (`--eval=<name>`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LoopNest => "loop_nest",
            Self::Cost => "cost",
            Self::Policy => "policy",
        }
    }
}

impl std::fmt::Display for EvalMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EvalMode {
    type Err = EvalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "loop_nest" => Ok(Self::LoopNest),
            "cost" => Ok(Self::Cost),
            "policy" => Ok(Self::Policy),
            other => Err(EvalError::UnknownMode { raw: other.into() }),
        }
    }
}

/// Learned model slots an evaluator may load from disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelKind {
    Cost,
    Policy,
}

impl std::fmt::Display for ModelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cost => f.write_str("cost"),
            Self::Policy => f.write_str("policy"),
        }
    }
}

/// One candidate action with its score under some [`EvalMode`]. Higher is better.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedActionV1 {
    pub action: String,
    pub score: f64,
}

impl RankedActionV1 {
    #[must_use]
    pub fn new(action: impl Into<String>, score: f64) -> Self {
        Self {
            action: action.into(),
            score,
        }
    }
}

/// Typed failure from an evaluator backend.
///
/// The search propagates these unchanged: a failed measurement must never be
/// replaced by a made-up score.
#[derive(Debug, Clone, PartialEq)]
pub enum EvalError {
    /// The measurement or inference backend failed.
    Backend { detail: String },
    /// Ranking was requested under a mode whose model has not been loaded.
    ModelNotLoaded { kind: ModelKind },
    /// This evaluator has no slot for the requested model kind.
    ModelUnsupported { kind: ModelKind },
    /// A model file could not be read or parsed.
    ModelLoad { path: String, detail: String },
    /// An `--eval=` value that names no known mode.
    UnknownMode { raw: String },
    /// The backend produced a non-finite score.
    NonFiniteScore { value: f64 },
    /// Scoring required stepping the agent and the step was rejected.
    Agent(AgentError),
}

impl std::fmt::Display for EvalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Backend { detail } => write!(f, "evaluator backend failed: {detail}"),
            Self::ModelNotLoaded { kind } => write!(f, "{kind} model is not loaded"),
            Self::ModelUnsupported { kind } => {
                write!(f, "evaluator does not support {kind} models")
            }
            Self::ModelLoad { path, detail } => {
                write!(f, "failed to load model from {path}: {detail}")
            }
            Self::UnknownMode { raw } => write!(
                f,
                "unknown eval mode '{raw}' (expected loop_nest, cost or policy)"
            ),
            Self::NonFiniteScore { value } => {
                write!(f, "evaluator returned non-finite score {value}")
            }
            Self::Agent(err) => write!(f, "agent rejected evaluation step: {err}"),
        }
    }
}

impl std::error::Error for EvalError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Agent(err) => Some(err),
            _ => None,
        }
    }
}

impl From<AgentError> for EvalError {
    fn from(err: AgentError) -> Self {
        Self::Agent(err)
    }
}

/// Performance oracle and action ranker for agents of type `A`.
pub trait EvaluatorV1<A: LoopAgentV1> {
    /// Throughput of the agent's current loop nest under `mode`, in GFLOPS.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError`] if the backend fails; callers must not substitute a score.
    fn eval_gflops(&self, agent: &A, mode: EvalMode) -> Result<f64, EvalError>;

    /// Legal actions from the agent's current state, best first, scored under `mode`.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError`] if the backend fails or the mode's model is missing.
    fn actions_q_sorted(
        &self,
        agent: &A,
        mode: EvalMode,
    ) -> Result<Vec<RankedActionV1>, EvalError>;

    /// Load (or, with an empty path, unload) a learned model.
    ///
    /// # Errors
    ///
    /// Defaults to [`EvalError::ModelUnsupported`].
    fn load_model(&mut self, kind: ModelKind, path: &Path) -> Result<(), EvalError> {
        let _ = path;
        Err(EvalError::ModelUnsupported { kind })
    }
}

/// Sort ranked actions best first. Ties keep their incoming order.
///
/// NaN scores sort last so a broken score can never be explored first.
pub fn sort_best_first(ranked: &mut [RankedActionV1]) {
    ranked.sort_by(|a, b| match (a.score.is_nan(), b.score.is_nan()) {
        (true, true) => std::cmp::Ordering::Equal,
        (true, false) => std::cmp::Ordering::Greater,
        (false, true) => std::cmp::Ordering::Less,
        (false, false) => b.score.total_cmp(&a.score),
    });
}
