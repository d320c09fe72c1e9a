//! Search configuration and budget helpers.

use std::time::{Duration, Instant};

use crate::error::SearchError;

/// Largest depth any expansion accepts, whatever `max_depth` says.
/// Expansion recurses once per level.
pub const DEPTH_CEILING: u32 = 1024;

/// Budget and reproducibility settings shared by every strategy.
///
/// One config is handed to a searcher; each `search()` call builds a fresh
/// graph seeded from `seed`, so two calls with the same config and the same
/// deterministic evaluator explore the same candidates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchConfigV1 {
    /// Wall-clock budget for one `search()` call.
    pub timeout: Duration,
    /// Seed for candidate shuffling when ranking is disabled.
    pub seed: u64,
    /// Hard cap on any requested depth or step count (bounds recursion).
    pub max_depth: u32,
    /// Render the final graph to DOT and emit it at debug level.
    pub debug: bool,
}

impl SearchConfigV1 {
    /// Validate ranges.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::InvalidConfig`] if `max_depth` is zero or above
    /// [`DEPTH_CEILING`].
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.max_depth == 0 {
            return Err(SearchError::InvalidConfig {
                detail: "max_depth must be at least 1".into(),
            });
        }
        if self.max_depth > DEPTH_CEILING {
            return Err(SearchError::InvalidConfig {
                detail: format!("max_depth must be at most {DEPTH_CEILING}"),
            });
        }
        Ok(())
    }

    /// Convert a caller-supplied depth into a bounded `u32`.
    ///
    /// # Errors
    ///
    /// [`SearchError::NegativeDepth`] for `requested < 0`,
    /// [`SearchError::DepthBudgetExceeded`] for `requested > max_depth`.
    pub fn checked_depth(&self, requested: i64) -> Result<u32, SearchError> {
        if requested < 0 {
            return Err(SearchError::NegativeDepth { requested });
        }
        match u32::try_from(requested) {
            Ok(depth) if depth <= self.max_depth => Ok(depth),
            _ => Err(SearchError::DepthBudgetExceeded {
                requested,
                max_depth: self.max_depth,
            }),
        }
    }

    /// Budget for one of `rounds` equal rounds.
    #[must_use]
    pub fn round_budget(&self, rounds: u32) -> Duration {
        self.timeout / rounds.max(1)
    }
}

impl Default for SearchConfigV1 {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            seed: 0,
            max_depth: 256,
            debug: false,
        }
    }
}

/// Absolute deadline `budget` after `from`.
///
/// `None` means the deadline is beyond what `Instant` can represent and is
/// treated as "never".
#[must_use]
pub fn deadline_after(from: Instant, budget: Duration) -> Option<Instant> {
    from.checked_add(budget)
}

/// Whether `deadline` has been reached.
#[must_use]
pub fn deadline_passed(deadline: Option<Instant>) -> bool {
    deadline.is_some_and(|d| Instant::now() >= d)
}
