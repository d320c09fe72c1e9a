//! Shared helpers for the lock tests.
//!
//! Builders for the reference worlds and expansion settings, so each test
//! file states only the property it pins.

use std::cell::Cell;
use std::path::Path;
use std::time::{Duration, Instant};

use looptune_harness::worlds::loop_nest::LoopNestAgent;
use looptune_kernel::agent::LoopAgentV1;
use looptune_kernel::eval::{EvalError, EvalMode, EvaluatorV1, ModelKind, RankedActionV1};
use looptune_search::graph::ExpandParams;
use looptune_search::policy::SearchConfigV1;

/// The matmul nest most lock tests search over.
#[must_use]
pub fn matmul_nest() -> LoopNestAgent {
    LoopNestAgent::matmul(64, 32, 16)
}

/// Expansion settings with no deadline.
#[must_use]
pub fn unbounded(search_width: usize, ranking: bool) -> ExpandParams {
    ExpandParams {
        search_width,
        eval_mode: EvalMode::LoopNest,
        ranking,
        start: Instant::now(),
        deadline: None,
    }
}

/// Search config with a generous timeout and the given seed.
#[must_use]
pub fn config(seed: u64) -> SearchConfigV1 {
    SearchConfigV1 {
        timeout: Duration::from_secs(30),
        seed,
        ..SearchConfigV1::default()
    }
}

/// Wraps an evaluator and counts the states it scores. Search scores each
/// visited node once, so on worlds with history-distinct dumps the count is
/// the number of nodes a search visited.
#[derive(Debug, Default)]
pub struct CountingEvaluator<E> {
    inner: E,
    scored: Cell<usize>,
}

impl<E> CountingEvaluator<E> {
    #[must_use]
    pub fn new(inner: E) -> Self {
        Self {
            inner,
            scored: Cell::new(0),
        }
    }

    #[must_use]
    pub fn scored(&self) -> usize {
        self.scored.get()
    }

    pub fn reset(&self) {
        self.scored.set(0);
    }
}

impl<A: LoopAgentV1, E: EvaluatorV1<A>> EvaluatorV1<A> for CountingEvaluator<E> {
    fn eval_gflops(&self, agent: &A, mode: EvalMode) -> Result<f64, EvalError> {
        self.scored.set(self.scored.get() + 1);
        self.inner.eval_gflops(agent, mode)
    }

    fn actions_q_sorted(&self, agent: &A, mode: EvalMode) -> Result<Vec<RankedActionV1>, EvalError> {
        self.inner.actions_q_sorted(agent, mode)
    }

    fn load_model(&mut self, kind: ModelKind, path: &Path) -> Result<(), EvalError> {
        self.inner.load_model(kind, path)
    }
}

/// Route `tracing` output to the test harness. `RUST_LOG` selects the level.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
