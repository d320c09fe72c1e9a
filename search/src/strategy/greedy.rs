//! Greedy search: look ahead, commit one step, repeat.

use std::time::Instant;

use looptune_kernel::agent::LoopAgentV1;
use looptune_kernel::eval::{EvalMode, EvaluatorV1};

use crate::error::SearchError;
use crate::policy::SearchConfigV1;
use crate::strategy::{expand_params, search_root, StrategyContext};
use crate::table::SearchTableV1;

/// Greedy search parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GreedyParams {
    /// Number of committed steps.
    pub num_steps: i64,
    /// Speculative depth per round, clipped to the steps that remain.
    pub lookahead: i64,
    pub search_width: usize,
    pub eval_mode: EvalMode,
}

/// Run `num_steps` rounds of lookahead-then-commit.
///
/// Each round expands the committed state to `min(lookahead, remaining)`
/// with random candidate sampling and a per-round deadline of
/// `timeout / num_steps`. The first action of the returned suffix is
/// committed; on the round where the suffix reaches `num_steps`, the suffix
/// is committed whole (clipped). An empty suffix or an elapsed timeout ends
/// the search early. The committed path never exceeds `num_steps`.
///
/// # Errors
///
/// [`SearchError::NegativeDepth`] / [`SearchError::DepthBudgetExceeded`] for
/// out-of-range step counts, plus any agent or evaluator failure.
pub fn greedy_search<A, E>(
    ctx: &StrategyContext<'_, E>,
    agent: &A,
    params: GreedyParams,
) -> Result<SearchTableV1, SearchError>
where
    A: LoopAgentV1,
    E: EvaluatorV1<A> + ?Sized,
{
    let config = ctx.config();
    let steps = config.checked_depth(params.num_steps)?;
    let lookahead = config.checked_depth(params.lookahead)?;
    let start = Instant::now();
    let round_budget = config.round_budget(steps);

    tracing::info!(
        steps,
        lookahead,
        width = params.search_width,
        eval = %params.eval_mode,
        "greedy search started"
    );

    let mut graph = ctx.new_graph();
    let mut current = search_root(agent);

    for i in 0..steps {
        let depth = lookahead.min(steps - i);
        let round = expand_params(
            params.search_width,
            params.eval_mode,
            false,
            start,
            round_budget,
        );
        let suffix = graph.expand(ctx.evaluator(), &current, i64::from(depth), &round)?;
        tracing::debug!(round = i, depth, suffix = ?suffix, "greedy round");

        if suffix.is_empty() {
            break;
        }
        let remaining = usize::try_from(steps - i).unwrap_or(usize::MAX);
        if suffix.len() >= remaining {
            current.replay(suffix.iter().take(remaining))?;
            break;
        }
        current.apply_action(&suffix[0])?;

        if start.elapsed() > config.timeout {
            tracing::warn!(round = i, "greedy search timed out");
            break;
        }
    }

    if graph.is_empty() {
        let round = expand_params(
            params.search_width,
            params.eval_mode,
            false,
            start,
            round_budget,
        );
        graph.expand(ctx.evaluator(), &current, 0, &round)?;
    }

    ctx.finish(&mut graph, "greedy", start)
}

/// Run `walks` independent greedy searches and keep the one whose final
/// reward is highest. Walk `i` samples candidates with seed `seed + i`.
///
/// # Errors
///
/// Same as [`greedy_search`]. A `walks` of zero runs one walk.
pub fn greedy_walks<A, E>(
    ctx: &StrategyContext<'_, E>,
    agent: &A,
    walks: u32,
    params: GreedyParams,
) -> Result<SearchTableV1, SearchError>
where
    A: LoopAgentV1,
    E: EvaluatorV1<A> + ?Sized,
{
    let mut best: Option<SearchTableV1> = None;
    for walk in 0..walks.max(1) {
        let walk_ctx = ctx.with_config(SearchConfigV1 {
            seed: ctx.config().seed.wrapping_add(u64::from(walk)),
            ..ctx.config().clone()
        })?;
        let table = greedy_search(&walk_ctx, agent, params)?;
        let reward = table.final_reward().unwrap_or(f64::NEG_INFINITY);
        tracing::debug!(walk, reward, "greedy walk finished");
        let better = best
            .as_ref()
            .is_none_or(|b| reward > b.final_reward().unwrap_or(f64::NEG_INFINITY));
        if better {
            best = Some(table);
        }
    }
    best.ok_or(SearchError::EmptyGraph)
}
