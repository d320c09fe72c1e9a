//! `SearchSession`: the session-parameter command surface.
//!
//! A session owns the current agent, the agent it started from, an optional
//! saved agent, and the evaluator. [`SearchSession::handle_session_parameter`]
//! is the single entry point: it maps a `(key, value)` pair to a reply
//! string, or a typed [`SessionError`].

use std::path::Path;
use std::time::Duration;

use looptune_kernel::agent::{AgentError, LoopAgentV1};
use looptune_kernel::eval::{EvalError, EvalMode, EvaluatorV1, ModelKind};
use looptune_search::error::SearchError;
use looptune_search::policy::SearchConfigV1;

use crate::command::{
    parse_beam_beam, parse_beam_bfs, parse_beam_dfs, parse_greedy, parse_random, CommandError,
};
use crate::runner::{run_search, SearchRequestV1};

/// Reply for commands that only acknowledge.
pub const REPLY_SUCCEEDED: &str = "Succeeded";

/// Session-wide defaults. Command flags override them per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfigV1 {
    /// Search timeout when a command gives no `--timeout`.
    pub default_timeout: Duration,
    /// Search seed when a command gives no `--seed`.
    pub seed: u64,
    /// Cap on any requested step or depth count.
    pub max_depth: u32,
    /// When off, [`SearchSession::apply_action`] scores the step without
    /// committing it.
    pub save_state: bool,
}

impl Default for SessionConfigV1 {
    fn default() -> Self {
        Self {
            default_timeout: Duration::from_secs(60),
            seed: 0,
            max_depth: 256,
            save_state: true,
        }
    }
}

impl SessionConfigV1 {
    /// # Errors
    ///
    /// [`SessionError::InvalidConfig`] if `max_depth` is zero or above the
    /// search depth ceiling.
    pub fn validate(&self) -> Result<(), SessionError> {
        self.search_config()
            .validate()
            .map_err(|e| SessionError::InvalidConfig {
                detail: e.to_string(),
            })
    }

    fn search_config(&self) -> SearchConfigV1 {
        SearchConfigV1 {
            timeout: self.default_timeout,
            seed: self.seed,
            max_depth: self.max_depth,
            debug: false,
        }
    }
}

/// Session parameter keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionKey {
    GreedySearch,
    BeamSearch,
    BeamBfsSearch,
    BeamBeamSearch,
    RandomSearch,
    AvailableActions,
    UndoAction,
    ResetAgent,
    SaveState,
    SaveRestore,
    LoadCostModel,
    LoadPolicyModel,
    PrintLooptree,
}

impl SessionKey {
    /// Every key the session accepts.
    pub const ALL: [Self; 13] = [
        Self::GreedySearch,
        Self::BeamSearch,
        Self::BeamBfsSearch,
        Self::BeamBeamSearch,
        Self::RandomSearch,
        Self::AvailableActions,
        Self::UndoAction,
        Self::ResetAgent,
        Self::SaveState,
        Self::SaveRestore,
        Self::LoadCostModel,
        Self::LoadPolicyModel,
        Self::PrintLooptree,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::GreedySearch => "greedy_search",
            Self::BeamSearch => "beam_search",
            Self::BeamBfsSearch => "beam_bfs_search",
            Self::BeamBeamSearch => "beambeam_search",
            Self::RandomSearch => "random_search",
            Self::AvailableActions => "available_actions",
            Self::UndoAction => "undo_action",
            Self::ResetAgent => "reset_agent",
            Self::SaveState => "save_state",
            Self::SaveRestore => "save_restore",
            Self::LoadCostModel => "load_cost_model",
            Self::LoadPolicyModel => "load_policy_model",
            Self::PrintLooptree => "print_looptree",
        }
    }
}

impl std::str::FromStr for SessionKey {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| SessionError::UnknownKey { key: s.to_string() })
    }
}

/// Typed failure for a session command.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionError {
    UnknownKey { key: String },
    Command(CommandError),
    Search(SearchError),
    Agent(AgentError),
    Eval(EvalError),
    /// `save_restore` asked to restore before anything was saved.
    NothingSaved,
    /// A reply could not be serialized.
    Serialize { detail: String },
    InvalidConfig { detail: String },
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownKey { key } => write!(f, "unsupported session parameter '{key}'"),
            Self::Command(err) => write!(f, "bad command value: {err}"),
            Self::Search(err) => write!(f, "search failed: {err}"),
            Self::Agent(err) => write!(f, "agent error: {err}"),
            Self::Eval(err) => write!(f, "evaluator error: {err}"),
            Self::NothingSaved => write!(f, "no saved agent to restore"),
            Self::Serialize { detail } => write!(f, "failed to serialize reply: {detail}"),
            Self::InvalidConfig { detail } => write!(f, "invalid session config: {detail}"),
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Command(err) => Some(err),
            Self::Search(err) => Some(err),
            Self::Agent(err) => Some(err),
            Self::Eval(err) => Some(err),
            _ => None,
        }
    }
}

impl From<CommandError> for SessionError {
    fn from(err: CommandError) -> Self {
        Self::Command(err)
    }
}

impl From<SearchError> for SessionError {
    fn from(err: SearchError) -> Self {
        Self::Search(err)
    }
}

impl From<AgentError> for SessionError {
    fn from(err: AgentError) -> Self {
        Self::Agent(err)
    }
}

impl From<EvalError> for SessionError {
    fn from(err: EvalError) -> Self {
        Self::Eval(err)
    }
}

impl From<serde_json::Error> for SessionError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialize {
            detail: err.to_string(),
        }
    }
}

/// Result of [`SearchSession::apply_action`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepOutcomeV1 {
    /// `loop_nest` score of the state after the action.
    pub gflops: f64,
    /// Whether the session's agent now includes the action.
    pub committed: bool,
}

/// One compilation session over an agent and an evaluator.
pub struct SearchSession<A, E> {
    agent: A,
    initial: A,
    saved: Option<A>,
    evaluator: E,
    config: SessionConfigV1,
}

impl<A, E> SearchSession<A, E>
where
    A: LoopAgentV1,
    E: EvaluatorV1<A>,
{
    /// # Errors
    ///
    /// [`SessionError::InvalidConfig`] if `config` fails validation.
    pub fn new(agent: A, evaluator: E, config: SessionConfigV1) -> Result<Self, SessionError> {
        config.validate()?;
        Ok(Self {
            initial: agent.clone(),
            agent,
            saved: None,
            evaluator,
            config,
        })
    }

    #[must_use]
    pub fn agent(&self) -> &A {
        &self.agent
    }

    #[must_use]
    pub fn evaluator(&self) -> &E {
        &self.evaluator
    }

    #[must_use]
    pub fn config(&self) -> &SessionConfigV1 {
        &self.config
    }

    /// Apply one action to the session agent. With `save_state` off the
    /// step is scored on a copy and the session agent is left as it was.
    ///
    /// # Errors
    ///
    /// Agent rejection or evaluator failure; the session agent is unchanged.
    pub fn apply_action(&mut self, action: &str) -> Result<StepOutcomeV1, SessionError> {
        let mut next = self.agent.clone();
        next.apply_action(action)?;
        let gflops = self.evaluator.eval_gflops(&next, EvalMode::LoopNest)?;
        let committed = self.config.save_state;
        tracing::debug!(action, gflops, committed, "session step");
        if committed {
            self.agent = next;
        }
        Ok(StepOutcomeV1 { gflops, committed })
    }

    /// Run a search command without touching the session agent.
    ///
    /// # Errors
    ///
    /// Any search failure.
    pub fn search(&self, request: &SearchRequestV1) -> Result<String, SessionError> {
        let table = run_search(
            &self.evaluator,
            &self.agent,
            request,
            &self.config.search_config(),
        )?;
        Ok(table.to_json_string()?)
    }

    /// Dispatch one session parameter.
    ///
    /// # Errors
    ///
    /// [`SessionError::UnknownKey`] for keys outside [`SessionKey::ALL`];
    /// otherwise the typed failure of the command.
    pub fn handle_session_parameter(
        &mut self,
        key: &str,
        value: &str,
    ) -> Result<String, SessionError> {
        let key: SessionKey = key.parse()?;
        tracing::info!(key = key.as_str(), value, "session parameter");
        match key {
            SessionKey::GreedySearch => self.search(&parse_greedy(value)?),
            SessionKey::BeamSearch => self.search(&parse_beam_dfs(value)?),
            SessionKey::BeamBfsSearch => self.search(&parse_beam_bfs(value)?),
            SessionKey::BeamBeamSearch => self.search(&parse_beam_beam(value)?),
            SessionKey::RandomSearch => self.search(&parse_random(value)?),
            SessionKey::AvailableActions => {
                Ok(serde_json::to_string(&self.agent.available_actions())?)
            }
            SessionKey::UndoAction => {
                self.agent.undo_action()?;
                Ok(String::new())
            }
            SessionKey::ResetAgent => {
                self.agent = self.initial.clone();
                Ok(String::new())
            }
            SessionKey::SaveState => {
                self.config.save_state = value != "0";
                Ok(REPLY_SUCCEEDED.to_string())
            }
            SessionKey::SaveRestore => {
                if value == "0" {
                    self.saved = Some(self.agent.clone());
                } else {
                    self.agent = self.saved.clone().ok_or(SessionError::NothingSaved)?;
                }
                Ok(REPLY_SUCCEEDED.to_string())
            }
            SessionKey::LoadCostModel => {
                self.evaluator.load_model(ModelKind::Cost, Path::new(value))?;
                Ok(String::new())
            }
            SessionKey::LoadPolicyModel => {
                self.evaluator
                    .load_model(ModelKind::Policy, Path::new(value))?;
                Ok(String::new())
            }
            SessionKey::PrintLooptree => {
                tracing::info!(
                    actions = ?self.agent.actions(),
                    looptree = %self.agent.describe(),
                    "loop tree"
                );
                Ok(String::new())
            }
        }
    }
}
