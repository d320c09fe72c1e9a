//! The loop-nest state handle contract.
//!
//! An agent is "current loop nest + the action history that produced it".
//! The search layer never looks inside an agent: it copies it, fingerprints
//! its `dump()`, applies or undoes named actions, and asks which actions are
//! currently legal. Rewrite semantics belong entirely to the implementation.

/// Typed failure raised by an agent when an action cannot be applied or undone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentError {
    /// The action name is not part of this agent's action space.
    UnknownAction { action: String },
    /// The action exists but is not legal in the current state.
    IllegalAction { action: String, detail: String },
    /// `undo_action` was called with an empty action history.
    NothingToUndo,
}

impl std::fmt::Display for AgentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownAction { action } => write!(f, "unknown action '{action}'"),
            Self::IllegalAction { action, detail } => {
                write!(f, "illegal action '{action}': {detail}")
            }
            Self::NothingToUndo => write!(f, "no action to undo"),
        }
    }
}

impl std::error::Error for AgentError {}

/// Contract for a loop-nest state handle.
///
/// `Clone` must produce a fully independent copy: mutating the clone never
/// affects the original. The search layer relies on this to give every
/// recursive branch its own state.
///
/// # Contract
///
/// - `dump()` must be deterministic and must cover everything that makes two
///   states distinct, including the action history if the implementation
///   wants histories to be distinct graph nodes.
/// - `available_actions()` returns only actions that `apply_action` accepts
///   from the current state. An empty list is a normal leaf.
/// - `apply_action` appends the action to `actions()` on success and leaves
///   the agent untouched on failure.
pub trait LoopAgentV1: Clone {
    /// Action history from the root, oldest first.
    fn actions(&self) -> &[String];

    /// Forget the action history without changing the loop nest.
    fn clear_actions(&mut self);

    /// Deterministic serialization of the state (the fingerprint input).
    fn dump(&self) -> String;

    /// Actions that are legal from the current state.
    fn available_actions(&self) -> Vec<String>;

    /// Apply a named action.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::UnknownAction`] or [`AgentError::IllegalAction`]
    /// if the action is rejected.
    fn apply_action(&mut self, action: &str) -> Result<(), AgentError>;

    /// Revert the most recent action.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::NothingToUndo`] when the history is empty.
    fn undo_action(&mut self) -> Result<(), AgentError>;

    /// Human-readable rendering of the loop nest. Defaults to `dump()`.
    fn describe(&self) -> String {
        self.dump()
    }

    /// Replay a sequence of actions onto this agent, in order.
    ///
    /// # Errors
    ///
    /// Returns the first [`AgentError`] encountered; actions before it stay applied.
    fn replay<'a, I>(&mut self, actions: I) -> Result<(), AgentError>
    where
        I: IntoIterator<Item = &'a String>,
    {
        for action in actions {
            self.apply_action(action)?;
        }
        Ok(())
    }
}
