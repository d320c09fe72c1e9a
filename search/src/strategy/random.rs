//! Random search: repeated width-1 random walks from the root.

use std::time::Instant;

use looptune_kernel::agent::LoopAgentV1;
use looptune_kernel::eval::{EvalMode, EvaluatorV1};

use crate::error::SearchError;
use crate::strategy::{expand_params, search_root, StrategyContext};
use crate::table::SearchTableV1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RandomParams {
    /// Length of each walk.
    pub num_steps: i64,
    pub eval_mode: EvalMode,
}

/// Walk `num_steps` random actions from the root, again and again, until
/// the timeout elapses. At least one walk always runs, so the result is
/// never empty. Walks share one graph and one RNG stream.
///
/// # Errors
///
/// Out-of-range step counts, plus any agent or evaluator failure.
pub fn random_search<A, E>(
    ctx: &StrategyContext<'_, E>,
    agent: &A,
    params: RandomParams,
) -> Result<SearchTableV1, SearchError>
where
    A: LoopAgentV1,
    E: EvaluatorV1<A> + ?Sized,
{
    let config = ctx.config();
    let steps = config.checked_depth(params.num_steps)?;
    let start = Instant::now();
    tracing::info!(steps, timeout_s = config.timeout.as_secs_f64(), "random search started");

    let mut graph = ctx.new_graph();
    let root = search_root(agent);
    let mut walks = 0_u64;
    loop {
        let remaining = config.timeout.saturating_sub(start.elapsed());
        let walk = expand_params(1, params.eval_mode, false, start, remaining);
        graph.expand(ctx.evaluator(), &root, i64::from(steps), &walk)?;
        walks += 1;
        if start.elapsed() >= config.timeout {
            break;
        }
    }
    tracing::debug!(walks, nodes = graph.node_count(), "random search walks done");

    ctx.finish(&mut graph, "random", start)
}
