//! Strategy lock tests over the reference worlds.
//!
//! Proves:
//! 1. Greedy commits the better action each round on the up/down world
//! 2. No strategy returns a path longer than its step budget
//! 3. Every table row's reward is the score of the replayed prefix
//! 4. Strategies never mutate the caller's agent
//! 5. Unranked beam search is reproducible for a fixed seed
//! 6. Random search honours its depth bound even with a tiny timeout

use std::time::Duration;

use lock_tests::{config, init_tracing, matmul_nest};
use looptune_harness::worlds::analytic::{analytic_gflops, AnalyticEvaluator};
use looptune_harness::worlds::loop_nest::LoopNestAgent;
use looptune_harness::worlds::up_down::{UpDownAgent, UpDownEvaluator};
use looptune_kernel::agent::LoopAgentV1;
use looptune_kernel::eval::EvalMode;
use looptune_search::policy::SearchConfigV1;
use looptune_search::strategy::{
    beam_beam_search, beam_bfs_search, beam_dfs_search, greedy_search, greedy_walks,
    random_search, BeamParams, BeamPhaseV1, GreedyParams, RandomParams, StrategyContext,
};
use looptune_search::table::SearchTableV1;

fn greedy(num_steps: i64, lookahead: i64, search_width: usize) -> GreedyParams {
    GreedyParams {
        num_steps,
        lookahead,
        search_width,
        eval_mode: EvalMode::LoopNest,
    }
}

fn beam(num_steps: i64, search_width: usize, ranking: bool) -> BeamParams {
    BeamParams {
        num_steps,
        search_width,
        eval_mode: EvalMode::LoopNest,
        ranking,
    }
}

fn phase(num_steps: i64, search_width: usize) -> BeamPhaseV1 {
    BeamPhaseV1 {
        num_steps,
        search_width,
        eval_mode: EvalMode::LoopNest,
    }
}

/// Assert that each reward equals the analytic score of the state reached by
/// replaying the path up to that row.
fn assert_rewards_replay(root: &LoopNestAgent, table: &SearchTableV1) {
    assert_eq!(table.actions.first().map(String::as_str), Some(""));
    assert_eq!(table.actions.len(), table.rewards.len());
    let mut agent = root.clone();
    agent.clear_actions();
    assert_eq!(table.rewards[0], analytic_gflops(&agent));
    for (action, reward) in table.path().iter().zip(&table.rewards[1..]) {
        agent.apply_action(action).unwrap();
        assert_eq!(*reward, analytic_gflops(&agent), "after {action}");
    }
}

// ---------------------------------------------------------------------------
// 1. Greedy scenario
// ---------------------------------------------------------------------------

#[test]
fn greedy_climbs_up_down_world() {
    init_tracing();
    let evaluator = UpDownEvaluator;
    let ctx = StrategyContext::new(&evaluator, config(0)).unwrap();
    let table = greedy_search(&ctx, &UpDownAgent::default(), greedy(3, 1, 2)).unwrap();
    assert_eq!(table.actions, vec!["", "up", "up", "up"]);
    assert_eq!(table.rewards, vec![0.0, 1.0, 2.0, 3.0]);
}

// ---------------------------------------------------------------------------
// 2. Step budgets
// ---------------------------------------------------------------------------

#[test]
fn greedy_path_is_bounded_by_steps() {
    let evaluator = AnalyticEvaluator::new();
    for seed in 0..8 {
        let ctx = StrategyContext::new(&evaluator, config(seed)).unwrap();
        let table = greedy_search(&ctx, &matmul_nest(), greedy(4, 2, 3)).unwrap();
        assert!(table.path().len() <= 4, "seed {seed}: {:?}", table.actions);
        assert_rewards_replay(&matmul_nest(), &table);
    }
}

#[test]
fn beam_searches_are_bounded_by_steps() {
    let evaluator = AnalyticEvaluator::new();
    let ctx = StrategyContext::new(&evaluator, config(3)).unwrap();
    let root = matmul_nest();

    let dfs = beam_dfs_search(&ctx, &root, beam(3, 2, true)).unwrap();
    assert!(dfs.path().len() <= 3);
    assert_rewards_replay(&root, &dfs);

    let bfs = beam_bfs_search(&ctx, &root, beam(3, 2, true)).unwrap();
    assert!(bfs.path().len() <= 3);
    assert_rewards_replay(&root, &bfs);

    let two_phase = beam_beam_search(&ctx, &root, phase(2, 2), phase(2, 2)).unwrap();
    assert!(two_phase.path().len() <= 4);
    assert_rewards_replay(&root, &two_phase);
}

#[test]
fn greedy_walks_return_a_bounded_path() {
    let evaluator = AnalyticEvaluator::new();
    let ctx = StrategyContext::new(&evaluator, config(11)).unwrap();
    let table = greedy_walks(&ctx, &matmul_nest(), 4, greedy(3, 1, 2)).unwrap();
    assert!(table.path().len() <= 3);
    assert_rewards_replay(&matmul_nest(), &table);
}

// ---------------------------------------------------------------------------
// 3. Search quality floor
// ---------------------------------------------------------------------------

#[test]
fn ranked_beam_never_loses_to_the_root() {
    let evaluator = AnalyticEvaluator::new();
    let ctx = StrategyContext::new(&evaluator, config(0)).unwrap();
    let root = matmul_nest();
    let table = beam_dfs_search(&ctx, &root, beam(3, 3, true)).unwrap();
    assert!(table.final_reward().unwrap() >= analytic_gflops(&root));
}

// ---------------------------------------------------------------------------
// 4. Caller's agent is left alone
// ---------------------------------------------------------------------------

#[test]
fn strategies_leave_caller_agent_untouched() {
    let evaluator = AnalyticEvaluator::new();
    let ctx = StrategyContext::new(&evaluator, config(5)).unwrap();
    let mut agent = matmul_nest();
    agent.apply_action("down").unwrap();
    let before = agent.clone();

    greedy_search(&ctx, &agent, greedy(2, 1, 2)).unwrap();
    beam_dfs_search(&ctx, &agent, beam(2, 2, false)).unwrap();
    beam_bfs_search(&ctx, &agent, beam(2, 2, true)).unwrap();
    assert_eq!(agent, before);
}

#[test]
fn search_starts_from_current_state_not_history() {
    let evaluator = AnalyticEvaluator::new();
    let ctx = StrategyContext::new(&evaluator, config(5)).unwrap();
    let mut agent = matmul_nest();
    agent.apply_action("down").unwrap();
    let table = beam_dfs_search(&ctx, &agent, beam(1, 2, true)).unwrap();
    // the root row scores the state after "down", reached by no table action
    assert_rewards_replay(&agent, &table);
}

// ---------------------------------------------------------------------------
// 5. Reproducibility
// ---------------------------------------------------------------------------

#[test]
fn unranked_beam_is_reproducible_per_seed() {
    let evaluator = AnalyticEvaluator::new();
    let ctx = StrategyContext::new(&evaluator, config(42)).unwrap();
    let a = beam_dfs_search(&ctx, &matmul_nest(), beam(3, 2, false)).unwrap();
    let b = beam_dfs_search(&ctx, &matmul_nest(), beam(3, 2, false)).unwrap();
    assert_eq!(a.actions, b.actions);
    assert_eq!(a.rewards, b.rewards);
}

// ---------------------------------------------------------------------------
// 6. Random search
// ---------------------------------------------------------------------------

#[test]
fn random_search_respects_depth_bound() {
    let evaluator = AnalyticEvaluator::new();
    let ctx = StrategyContext::new(
        &evaluator,
        SearchConfigV1 {
            timeout: Duration::from_millis(30),
            seed: 9,
            ..SearchConfigV1::default()
        },
    )
    .unwrap();
    let table = random_search(
        &ctx,
        &matmul_nest(),
        RandomParams {
            num_steps: 3,
            eval_mode: EvalMode::LoopNest,
        },
    )
    .unwrap();
    assert!(table.path().len() <= 3);
    assert!(table.times.len() <= 4);
    assert_rewards_replay(&matmul_nest(), &table);
}

#[test]
fn random_search_with_zero_timeout_still_answers() {
    let evaluator = UpDownEvaluator;
    let ctx = StrategyContext::new(
        &evaluator,
        SearchConfigV1 {
            timeout: Duration::ZERO,
            ..SearchConfigV1::default()
        },
    )
    .unwrap();
    let table = random_search(
        &ctx,
        &UpDownAgent::default(),
        RandomParams {
            num_steps: 2,
            eval_mode: EvalMode::LoopNest,
        },
    )
    .unwrap();
    assert_eq!(table.actions[0], "");
    assert!(!table.rewards.is_empty());
}
