//! Search strategies: thin policies over [`SearchGraph::expand`].
//!
//! Every strategy starts from a copy of the caller's agent with its action
//! history cleared, builds a fresh graph seeded from the context's config,
//! and returns the best path as a [`SearchTableV1`].

pub mod beam;
pub mod greedy;
pub mod random;

use std::time::{Duration, Instant};

use looptune_kernel::agent::LoopAgentV1;
use looptune_kernel::eval::EvalMode;

use crate::error::SearchError;
use crate::graph::{ExpandParams, SearchGraph};
use crate::policy::{deadline_after, SearchConfigV1};
use crate::render::render_dot;
use crate::table::SearchTableV1;

pub use beam::{beam_beam_search, beam_bfs_search, beam_dfs_search, BeamParams, BeamPhaseV1};
pub use greedy::{greedy_search, greedy_walks, GreedyParams};
pub use random::{random_search, RandomParams};

/// Shared state for one searcher: the evaluator and the budget config.
pub struct StrategyContext<'e, E: ?Sized> {
    evaluator: &'e E,
    config: SearchConfigV1,
}

impl<'e, E: ?Sized> StrategyContext<'e, E> {
    /// # Errors
    ///
    /// Returns [`SearchError::InvalidConfig`] if `config` fails validation.
    pub fn new(evaluator: &'e E, config: SearchConfigV1) -> Result<Self, SearchError> {
        config.validate()?;
        Ok(Self { evaluator, config })
    }

    #[must_use]
    pub fn evaluator(&self) -> &'e E {
        self.evaluator
    }

    #[must_use]
    pub fn config(&self) -> &SearchConfigV1 {
        &self.config
    }

    /// Same evaluator, different config.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::InvalidConfig`] if `config` fails validation.
    pub fn with_config(&self, config: SearchConfigV1) -> Result<Self, SearchError> {
        Self::new(self.evaluator, config)
    }

    pub(crate) fn new_graph(&self) -> SearchGraph {
        SearchGraph::new(self.config.seed)
    }

    /// Extract the best path, rendering the graph first in debug mode.
    pub(crate) fn finish(
        &self,
        graph: &mut SearchGraph,
        strategy: &'static str,
        started: Instant,
    ) -> Result<SearchTableV1, SearchError> {
        let table = graph.best_path()?;
        if self.config.debug {
            tracing::debug!(strategy, dot = %render_dot(graph), "search graph");
        }
        tracing::info!(
            strategy,
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            steps = table.path().len(),
            best_gflops = table.final_reward().unwrap_or(0.0),
            elapsed_s = started.elapsed().as_secs_f64(),
            "search finished"
        );
        Ok(table)
    }
}

/// Expansion settings for one round whose deadline is `budget` from now.
pub(crate) fn expand_params(
    search_width: usize,
    eval_mode: EvalMode,
    ranking: bool,
    start: Instant,
    budget: Duration,
) -> ExpandParams {
    ExpandParams {
        search_width,
        eval_mode,
        ranking,
        start,
        deadline: deadline_after(Instant::now(), budget),
    }
}

/// Copy of `agent` with an empty action history.
pub(crate) fn search_root<A: LoopAgentV1>(agent: &A) -> A {
    let mut root = agent.clone();
    root.clear_actions();
    root
}
