//! Beam searches: depth-first, breadth-first, and the two-phase composition.

use std::time::Instant;

use looptune_kernel::agent::LoopAgentV1;
use looptune_kernel::eval::{EvalMode, EvaluatorV1};

use crate::error::SearchError;
use crate::policy::SearchConfigV1;
use crate::strategy::{expand_params, search_root, StrategyContext};
use crate::table::SearchTableV1;

/// Beam search parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BeamParams {
    pub num_steps: i64,
    pub search_width: usize,
    pub eval_mode: EvalMode,
    /// Rank candidates with the evaluator instead of sampling them.
    pub ranking: bool,
}

/// One phase of [`beam_beam_search`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BeamPhaseV1 {
    pub num_steps: i64,
    pub search_width: usize,
    pub eval_mode: EvalMode,
}

impl BeamPhaseV1 {
    fn params(self) -> BeamParams {
        BeamParams {
            num_steps: self.num_steps,
            search_width: self.search_width,
            eval_mode: self.eval_mode,
            ranking: true,
        }
    }
}

/// Single recursive expansion of depth `num_steps` from the root.
///
/// # Errors
///
/// Out-of-range step counts, plus any agent or evaluator failure.
pub fn beam_dfs_search<A, E>(
    ctx: &StrategyContext<'_, E>,
    agent: &A,
    params: BeamParams,
) -> Result<SearchTableV1, SearchError>
where
    A: LoopAgentV1,
    E: EvaluatorV1<A> + ?Sized,
{
    let steps = ctx.config().checked_depth(params.num_steps)?;
    let start = Instant::now();
    tracing::info!(
        steps,
        width = params.search_width,
        eval = %params.eval_mode,
        ranking = params.ranking,
        "beam dfs search started"
    );

    let mut graph = ctx.new_graph();
    let root = search_root(agent);
    let expand = expand_params(
        params.search_width,
        params.eval_mode,
        params.ranking,
        start,
        ctx.config().timeout,
    );
    graph.expand(ctx.evaluator(), &root, i64::from(steps), &expand)?;

    ctx.finish(&mut graph, "beam_dfs", start)
}

/// Level-by-level expansion.
///
/// Round `i` expands every frontier state by one step under a per-round
/// deadline of `timeout / num_steps`. The next frontier is every leaf of the
/// graph (out-degree 0), rebuilt by replaying its recorded actions onto a
/// fresh copy of the root. Leaves from earlier rounds that were never
/// expanded (no legal actions, or cut by the deadline) are retried.
///
/// # Errors
///
/// Out-of-range step counts, plus any agent or evaluator failure.
pub fn beam_bfs_search<A, E>(
    ctx: &StrategyContext<'_, E>,
    agent: &A,
    params: BeamParams,
) -> Result<SearchTableV1, SearchError>
where
    A: LoopAgentV1,
    E: EvaluatorV1<A> + ?Sized,
{
    let config = ctx.config();
    let steps = config.checked_depth(params.num_steps)?;
    let start = Instant::now();
    let round_budget = config.round_budget(steps);
    tracing::info!(
        steps,
        width = params.search_width,
        eval = %params.eval_mode,
        ranking = params.ranking,
        "beam bfs search started"
    );

    let mut graph = ctx.new_graph();
    let root = search_root(agent);
    let mut frontier = vec![root.clone()];

    for i in 0..steps {
        let round = expand_params(
            params.search_width,
            params.eval_mode,
            params.ranking,
            start,
            round_budget,
        );
        for state in &frontier {
            graph.expand(ctx.evaluator(), state, 1, &round)?;
        }

        let leaf_paths: Vec<Vec<String>> = graph.leaves().map(|n| n.actions.clone()).collect();
        frontier = leaf_paths
            .iter()
            .map(|actions| {
                let mut state = root.clone();
                state.replay(actions)?;
                Ok(state)
            })
            .collect::<Result<_, SearchError>>()?;
        tracing::debug!(round = i, frontier = frontier.len(), "beam bfs round");

        if start.elapsed() > config.timeout {
            tracing::warn!(round = i, "beam bfs search timed out");
            break;
        }
    }

    if graph.is_empty() {
        let round = expand_params(
            params.search_width,
            params.eval_mode,
            params.ranking,
            start,
            round_budget,
        );
        graph.expand(ctx.evaluator(), &root, 0, &round)?;
    }

    ctx.finish(&mut graph, "beam_bfs", start)
}

/// Beam-DFS, then Beam-DFS again from the best state of the first phase.
///
/// Each phase gets half the configured timeout. The second table (without
/// its root row) is appended to the first, with its times shifted by the
/// first phase's final time.
///
/// # Errors
///
/// Out-of-range step counts, plus any agent or evaluator failure.
pub fn beam_beam_search<A, E>(
    ctx: &StrategyContext<'_, E>,
    agent: &A,
    first: BeamPhaseV1,
    second: BeamPhaseV1,
) -> Result<SearchTableV1, SearchError>
where
    A: LoopAgentV1,
    E: EvaluatorV1<A> + ?Sized,
{
    let phase_ctx = ctx.with_config(SearchConfigV1 {
        timeout: ctx.config().timeout / 2,
        ..ctx.config().clone()
    })?;

    let phase1 = beam_dfs_search(&phase_ctx, agent, first.params())?;
    let mut midpoint = search_root(agent);
    midpoint.replay(phase1.path())?;
    tracing::debug!(
        steps = phase1.path().len(),
        gflops = phase1.final_reward().unwrap_or(0.0),
        "beam beam first phase done"
    );

    let phase2 = beam_dfs_search(&phase_ctx, &midpoint, second.params())?;
    let offset = phase1.times.last().copied().unwrap_or(0.0);
    Ok(phase1.concat(&phase2, offset))
}
