//! Scripted agent and evaluator for unit tests.
//!
//! `up` raises the score by one, `down` leaves it. The dump carries the
//! action history, so every distinct history is a distinct graph node.
//!
//! `looptune-harness` ships the public up/down world, but it depends on this
//! crate, so this crate cannot take it as a dev-dependency. This copy adds an
//! action limit, scripted evaluator failures and visit counting.

use std::cell::Cell;

use looptune_kernel::agent::{AgentError, LoopAgentV1};
use looptune_kernel::eval::{sort_best_first, EvalError, EvalMode, EvaluatorV1, RankedActionV1};

#[derive(Debug, Clone)]
pub struct UpDown {
    score: u32,
    history: Vec<String>,
    limit: usize,
}

impl Default for UpDown {
    fn default() -> Self {
        Self::with_limit(64)
    }
}

impl UpDown {
    /// Agent that offers no actions once `limit` actions are applied.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            score: 0,
            history: Vec::new(),
            limit,
        }
    }
}

impl LoopAgentV1 for UpDown {
    fn actions(&self) -> &[String] {
        &self.history
    }

    fn clear_actions(&mut self) {
        self.history.clear();
    }

    fn dump(&self) -> String {
        format!("{}|{}", self.score, self.history.join(","))
    }

    fn available_actions(&self) -> Vec<String> {
        if self.history.len() >= self.limit {
            return Vec::new();
        }
        vec!["up".to_string(), "down".to_string()]
    }

    fn apply_action(&mut self, action: &str) -> Result<(), AgentError> {
        match action {
            "up" => self.score += 1,
            "down" => {}
            _ => {
                return Err(AgentError::UnknownAction {
                    action: action.into(),
                })
            }
        }
        self.history.push(action.to_string());
        Ok(())
    }

    fn undo_action(&mut self) -> Result<(), AgentError> {
        match self.history.pop().as_deref() {
            Some("up") => self.score -= 1,
            Some(_) => {}
            None => return Err(AgentError::NothingToUndo),
        }
        Ok(())
    }
}

/// Scores an `UpDown` by its up-count. Optionally fails once the history
/// reaches a given depth.
#[derive(Debug, Clone, Copy, Default)]
pub struct UpDownEvaluator {
    fail_at: Option<usize>,
}

impl UpDownEvaluator {
    pub fn failing_at(depth: usize) -> Self {
        Self {
            fail_at: Some(depth),
        }
    }
}

impl EvaluatorV1<UpDown> for UpDownEvaluator {
    fn eval_gflops(&self, agent: &UpDown, _mode: EvalMode) -> Result<f64, EvalError> {
        if self.fail_at.is_some_and(|d| agent.history.len() >= d) {
            return Err(EvalError::Backend {
                detail: format!("scripted failure at depth {}", agent.history.len()),
            });
        }
        Ok(f64::from(agent.score))
    }

    fn actions_q_sorted(
        &self,
        agent: &UpDown,
        _mode: EvalMode,
    ) -> Result<Vec<RankedActionV1>, EvalError> {
        let mut ranked: Vec<RankedActionV1> = agent
            .available_actions()
            .into_iter()
            .map(|a| {
                let score = if a == "up" { 1.0 } else { 0.0 };
                RankedActionV1::new(a, score)
            })
            .collect();
        sort_best_first(&mut ranked);
        Ok(ranked)
    }
}

/// `UpDownEvaluator` that counts scored states. Every graph visit scores
/// its state once, so on `UpDown` the count is the number of nodes visited.
#[derive(Debug, Default)]
pub struct CountingEvaluator {
    inner: UpDownEvaluator,
    visits: Cell<usize>,
}

impl CountingEvaluator {
    pub fn visits(&self) -> usize {
        self.visits.get()
    }
}

impl EvaluatorV1<UpDown> for CountingEvaluator {
    fn eval_gflops(&self, agent: &UpDown, mode: EvalMode) -> Result<f64, EvalError> {
        self.visits.set(self.visits.get() + 1);
        self.inner.eval_gflops(agent, mode)
    }

    fn actions_q_sorted(
        &self,
        agent: &UpDown,
        mode: EvalMode,
    ) -> Result<Vec<RankedActionV1>, EvalError> {
        self.inner.actions_q_sorted(agent, mode)
    }
}
