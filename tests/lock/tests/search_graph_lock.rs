//! Search graph lock tests.
//!
//! Proves:
//! 1. Every node records a shortest path from the root (checked against an
//!    independent breadth-first walk)
//! 2. Every node's recorded actions replay from the root to its fingerprint
//! 3. The best pointer never moves to a lower score across expansions
//! 4. The time-to-reach-depth curve is non-decreasing
//! 5. Width-1 unranked expansion visits exactly `depth + 1` nodes on a world
//!    where every history is distinct, for every seed
//! 6. A negative depth is rejected before the graph is touched
//! 7. The returned suffix leads from the expanded state to the best node

use std::collections::BTreeMap;

use lock_tests::{matmul_nest, unbounded};
use looptune_harness::worlds::analytic::AnalyticEvaluator;
use looptune_harness::worlds::loop_nest::LoopNestAgent;
use looptune_harness::worlds::up_down::{UpDownAgent, UpDownEvaluator};
use looptune_kernel::agent::LoopAgentV1;
use looptune_kernel::fingerprint::{fingerprint, StateFingerprint};
use looptune_search::error::SearchError;
use looptune_search::graph::SearchGraph;

/// Shortest action count from `root` to every state within `depth` steps.
fn bfs_distances(root: &LoopNestAgent, depth: usize) -> BTreeMap<StateFingerprint, usize> {
    let mut dist = BTreeMap::new();
    dist.insert(fingerprint(root), 0);
    let mut layer = vec![root.clone()];
    for d in 1..=depth {
        let mut next = Vec::new();
        for agent in &layer {
            for action in agent.available_actions() {
                let mut child = agent.clone();
                child.apply_action(&action).unwrap();
                let fp = fingerprint(&child);
                if !dist.contains_key(&fp) {
                    dist.insert(fp, d);
                    next.push(child);
                }
            }
        }
        layer = next;
    }
    dist
}

fn fully_expanded(depth: i64) -> SearchGraph {
    let mut graph = SearchGraph::new(0);
    graph
        .expand(
            &AnalyticEvaluator::new(),
            &matmul_nest(),
            depth,
            &unbounded(usize::MAX, true),
        )
        .unwrap();
    graph
}

// ---------------------------------------------------------------------------
// 1. Shortest path wins
// ---------------------------------------------------------------------------

#[test]
fn recorded_paths_are_shortest() {
    let graph = fully_expanded(3);
    let expected = bfs_distances(&matmul_nest(), 3);
    assert_eq!(graph.node_count(), expected.len());
    for node in graph.nodes() {
        assert_eq!(
            Some(&node.depth()),
            expected.get(&node.fingerprint),
            "node {} recorded via {:?}",
            node.fingerprint.short(),
            node.actions
        );
    }
}

#[test]
fn revisiting_the_root_keeps_the_empty_path() {
    let mut root = matmul_nest();
    let graph = fully_expanded(2);
    let root_node = graph.node(&fingerprint(&root)).unwrap();
    assert!(root_node.actions.is_empty());

    // down then up returns to the root state
    root.apply_action("down").unwrap();
    root.apply_action("up").unwrap();
    assert_eq!(fingerprint(&root), root_node.fingerprint);
}

// ---------------------------------------------------------------------------
// 2. Recorded actions replay to the node
// ---------------------------------------------------------------------------

#[test]
fn recorded_actions_replay_to_fingerprint() {
    let graph = fully_expanded(3);
    for node in graph.nodes() {
        let mut agent = matmul_nest();
        agent.replay(&node.actions).unwrap();
        assert_eq!(fingerprint(&agent), node.fingerprint);
    }
}

#[test]
fn best_path_table_replays_to_best_node() {
    let mut graph = fully_expanded(3);
    let best = graph.best().cloned().unwrap();
    let table = graph.best_path().unwrap();

    assert_eq!(table.actions[0], "");
    assert_eq!(table.actions.len(), table.rewards.len());
    assert_eq!(table.final_reward(), Some(best.gflops));

    let mut agent = matmul_nest();
    agent.replay(table.path()).unwrap();
    assert_eq!(fingerprint(&agent), best.fingerprint);
}

// ---------------------------------------------------------------------------
// 3. Best pointer monotonicity
// ---------------------------------------------------------------------------

#[test]
fn best_score_never_decreases() {
    let evaluator = AnalyticEvaluator::new();
    let mut graph = SearchGraph::new(7);
    let mut agent = matmul_nest();
    let mut last = f64::NEG_INFINITY;
    for _ in 0..6 {
        let suffix = graph
            .expand(&evaluator, &agent, 2, &unbounded(3, false))
            .unwrap();
        let best = graph.best().unwrap().gflops;
        assert!(best >= last, "best fell from {last} to {best}");
        last = best;
        let step = suffix
            .first()
            .cloned()
            .or_else(|| agent.available_actions().into_iter().next())
            .unwrap();
        agent.apply_action(&step).unwrap();
    }
}

// ---------------------------------------------------------------------------
// 4. Depth timing
// ---------------------------------------------------------------------------

#[test]
fn depth_time_curve_is_monotone() {
    let mut graph = fully_expanded(3);
    let table = graph.best_path().unwrap();
    assert_eq!(table.times.len(), 4);
    assert!(table.times.windows(2).all(|w| w[0] <= w[1]));
}

// ---------------------------------------------------------------------------
// 5. Width-1 expansion is a single walk
// ---------------------------------------------------------------------------

#[test]
fn width_one_unranked_visits_depth_plus_one_nodes() {
    for seed in 0..20 {
        let mut graph = SearchGraph::new(seed);
        graph
            .expand(
                &UpDownEvaluator,
                &UpDownAgent::default(),
                2,
                &unbounded(1, false),
            )
            .unwrap();
        assert_eq!(graph.node_count(), 3, "seed {seed}");
        assert_eq!(graph.edge_count(), 2, "seed {seed}");
    }
}

// ---------------------------------------------------------------------------
// 6. Negative depth
// ---------------------------------------------------------------------------

#[test]
fn negative_depth_leaves_graph_untouched() {
    let mut graph = SearchGraph::new(0);
    let err = graph
        .expand(
            &AnalyticEvaluator::new(),
            &matmul_nest(),
            -1,
            &unbounded(2, true),
        )
        .unwrap_err();
    assert_eq!(err, SearchError::NegativeDepth { requested: -1 });
    assert!(graph.is_empty());
    assert_eq!(graph.edge_count(), 0);
}

// ---------------------------------------------------------------------------
// 7. Returned suffix
// ---------------------------------------------------------------------------

#[test]
fn suffix_reaches_best_node() {
    let mut graph = SearchGraph::new(0);
    let root = matmul_nest();
    let suffix = graph
        .expand(
            &AnalyticEvaluator::new(),
            &root,
            2,
            &unbounded(usize::MAX, true),
        )
        .unwrap();
    let best = graph.best().unwrap().clone();
    if best.actions.is_empty() {
        assert!(suffix.is_empty());
    } else {
        let mut agent = root;
        agent.replay(&suffix).unwrap();
        assert_eq!(fingerprint(&agent), best.fingerprint);
    }
}

#[test]
fn expanding_the_best_node_returns_nothing() {
    let evaluator = UpDownEvaluator;
    let mut graph = SearchGraph::new(0);
    let suffix = graph
        .expand(&evaluator, &UpDownAgent::default(), 2, &unbounded(2, true))
        .unwrap();
    assert_eq!(suffix, vec!["up", "up"]);

    let mut best = UpDownAgent::default();
    best.replay(&suffix).unwrap();
    let again = graph
        .expand(&evaluator, &best, 0, &unbounded(2, true))
        .unwrap();
    assert!(again.is_empty());
}
