//! Search runner: turns a parsed request into a strategy call.
//!
//! The runner owns no search logic. It layers request options over the
//! session's base config, builds a [`StrategyContext`], and dispatches.
//!
//! # Pipeline
//!
//! ```text
//! SearchRequestV1 → effective SearchConfigV1 → StrategyContext
//!   → greedy / greedy walks / beam dfs / beam bfs / beam beam / random
//!   → SearchTableV1
//! ```

use std::time::Duration;

use looptune_kernel::agent::LoopAgentV1;
use looptune_kernel::eval::EvaluatorV1;
use looptune_search::error::SearchError;
use looptune_search::policy::SearchConfigV1;
use looptune_search::strategy::{
    beam_beam_search, beam_bfs_search, beam_dfs_search, greedy_search, greedy_walks,
    random_search, BeamParams, BeamPhaseV1, GreedyParams, RandomParams, StrategyContext,
};
use looptune_search::table::SearchTableV1;

/// Which strategy to run, with its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategySpecV1 {
    Greedy(GreedyParams),
    /// Best of `walks` independent greedy searches.
    GreedyWalks { walks: u32, params: GreedyParams },
    BeamDfs(BeamParams),
    BeamBfs(BeamParams),
    BeamBeam {
        first: BeamPhaseV1,
        second: BeamPhaseV1,
    },
    Random(RandomParams),
}

impl StrategySpecV1 {
    /// Stable name for logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Greedy(_) => "greedy",
            Self::GreedyWalks { .. } => "greedy_walks",
            Self::BeamDfs(_) => "beam_dfs",
            Self::BeamBfs(_) => "beam_bfs",
            Self::BeamBeam { .. } => "beam_beam",
            Self::Random(_) => "random",
        }
    }
}

/// Per-request overrides of the session defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptionsV1 {
    pub timeout: Option<Duration>,
    pub seed: Option<u64>,
    pub debug: bool,
}

/// A fully parsed search command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchRequestV1 {
    pub strategy: StrategySpecV1,
    pub options: RunOptionsV1,
}

impl SearchRequestV1 {
    /// `base` with this request's overrides applied.
    #[must_use]
    pub fn effective_config(&self, base: &SearchConfigV1) -> SearchConfigV1 {
        SearchConfigV1 {
            timeout: self.options.timeout.unwrap_or(base.timeout),
            seed: self.options.seed.unwrap_or(base.seed),
            max_depth: base.max_depth,
            debug: base.debug || self.options.debug,
        }
    }
}

/// Run `request` against `agent`. The agent is not modified.
///
/// # Errors
///
/// Returns [`SearchError`] from config validation or from the strategy.
pub fn run_search<A, E>(
    evaluator: &E,
    agent: &A,
    request: &SearchRequestV1,
    base: &SearchConfigV1,
) -> Result<SearchTableV1, SearchError>
where
    A: LoopAgentV1,
    E: EvaluatorV1<A> + ?Sized,
{
    let config = request.effective_config(base);
    tracing::info!(
        strategy = request.strategy.name(),
        timeout_s = config.timeout.as_secs_f64(),
        seed = config.seed,
        debug = config.debug,
        "running search"
    );
    let ctx = StrategyContext::new(evaluator, config)?;
    match request.strategy {
        StrategySpecV1::Greedy(params) => greedy_search(&ctx, agent, params),
        StrategySpecV1::GreedyWalks { walks, params } => greedy_walks(&ctx, agent, walks, params),
        StrategySpecV1::BeamDfs(params) => beam_dfs_search(&ctx, agent, params),
        StrategySpecV1::BeamBfs(params) => beam_bfs_search(&ctx, agent, params),
        StrategySpecV1::BeamBeam { first, second } => beam_beam_search(&ctx, agent, first, second),
        StrategySpecV1::Random(params) => random_search(&ctx, agent, params),
    }
}
