//! Shared fixtures for looptune benchmark suites.

use std::time::{Duration, Instant};

use looptune_harness::runner::{RunOptionsV1, SearchRequestV1, StrategySpecV1};
use looptune_harness::worlds::loop_nest::LoopNestAgent;
use looptune_kernel::eval::EvalMode;
use looptune_search::graph::ExpandParams;
use looptune_search::policy::SearchConfigV1;
use looptune_search::strategy::{BeamParams, BeamPhaseV1, GreedyParams, RandomParams};

/// Matmul shapes benchmarked, smallest first. Larger extents admit more
/// split factors and so a wider action space.
pub const NEST_SHAPES: [(&str, (u32, u32, u32)); 3] = [
    ("16x16x16", (16, 16, 16)),
    ("64x32x16", (64, 32, 16)),
    ("256x256x256", (256, 256, 256)),
];

/// Fresh nest for a benchmark shape.
#[must_use]
pub fn nest((m, n, k): (u32, u32, u32)) -> LoopNestAgent {
    LoopNestAgent::matmul(m, n, k)
}

/// Ranked expansion settings with no deadline, so timings measure work only.
#[must_use]
pub fn ranked(search_width: usize) -> ExpandParams {
    ExpandParams {
        search_width,
        eval_mode: EvalMode::LoopNest,
        ranking: true,
        start: Instant::now(),
        deadline: None,
    }
}

/// Base config with a timeout no benchmark reaches.
#[must_use]
pub fn bench_config() -> SearchConfigV1 {
    SearchConfigV1 {
        timeout: Duration::from_secs(600),
        ..SearchConfigV1::default()
    }
}

/// One request per strategy, sized to finish in milliseconds on the
/// reference worlds.
#[must_use]
pub fn strategy_requests() -> Vec<(&'static str, SearchRequestV1)> {
    let options = RunOptionsV1::default();
    let request = |strategy| SearchRequestV1 { strategy, options };
    let beam = BeamParams {
        num_steps: 3,
        search_width: 2,
        eval_mode: EvalMode::LoopNest,
        ranking: true,
    };
    let phase = BeamPhaseV1 {
        num_steps: 2,
        search_width: 2,
        eval_mode: EvalMode::LoopNest,
    };
    let greedy = GreedyParams {
        num_steps: 4,
        lookahead: 2,
        search_width: 3,
        eval_mode: EvalMode::LoopNest,
    };
    vec![
        ("greedy", request(StrategySpecV1::Greedy(greedy))),
        (
            "greedy_walks",
            request(StrategySpecV1::GreedyWalks {
                walks: 3,
                params: greedy,
            }),
        ),
        ("beam_dfs", request(StrategySpecV1::BeamDfs(beam))),
        ("beam_bfs", request(StrategySpecV1::BeamBfs(beam))),
        (
            "beam_beam",
            request(StrategySpecV1::BeamBeam {
                first: phase,
                second: phase,
            }),
        ),
        (
            "random",
            request(StrategySpecV1::Random(RandomParams {
                num_steps: 3,
                eval_mode: EvalMode::LoopNest,
            })),
        ),
    ]
}
