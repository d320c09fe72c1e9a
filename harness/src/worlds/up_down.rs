//! `UpDownAgent`: the deterministic two-action scenario world.
//!
//! `up` adds one to the score, `down` adds nothing. The dump carries the
//! action history, so every history is its own graph node and search
//! behaviour can be pinned exactly.

use looptune_kernel::agent::{AgentError, LoopAgentV1};
use looptune_kernel::eval::{sort_best_first, EvalError, EvalMode, EvaluatorV1, RankedActionV1};

/// Score-as-counter agent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpDownAgent {
    score: u32,
    actions: Vec<String>,
}

impl UpDownAgent {
    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }
}

impl LoopAgentV1 for UpDownAgent {
    fn actions(&self) -> &[String] {
        &self.actions
    }

    fn clear_actions(&mut self) {
        self.actions.clear();
    }

    fn dump(&self) -> String {
        format!("score={} history=[{}]", self.score, self.actions.join(","))
    }

    fn available_actions(&self) -> Vec<String> {
        vec!["up".to_string(), "down".to_string()]
    }

    fn apply_action(&mut self, action: &str) -> Result<(), AgentError> {
        match action {
            "up" => self.score += 1,
            "down" => {}
            _ => {
                return Err(AgentError::UnknownAction {
                    action: action.to_string(),
                })
            }
        }
        self.actions.push(action.to_string());
        Ok(())
    }

    fn undo_action(&mut self) -> Result<(), AgentError> {
        match self.actions.pop().as_deref() {
            Some("up") => self.score -= 1,
            Some(_) => {}
            None => return Err(AgentError::NothingToUndo),
        }
        Ok(())
    }
}

/// Scores an [`UpDownAgent`] by its score in every mode; ranks `up` first.
#[derive(Debug, Clone, Copy, Default)]
pub struct UpDownEvaluator;

impl EvaluatorV1<UpDownAgent> for UpDownEvaluator {
    fn eval_gflops(&self, agent: &UpDownAgent, _mode: EvalMode) -> Result<f64, EvalError> {
        Ok(f64::from(agent.score))
    }

    fn actions_q_sorted(
        &self,
        agent: &UpDownAgent,
        _mode: EvalMode,
    ) -> Result<Vec<RankedActionV1>, EvalError> {
        let base = f64::from(agent.score);
        let mut ranked = vec![
            RankedActionV1::new("down", base),
            RankedActionV1::new("up", base + 1.0),
        ];
        sort_best_first(&mut ranked);
        Ok(ranked)
    }
}
