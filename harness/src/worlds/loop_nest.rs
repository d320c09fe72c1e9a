//! `LoopNestAgent`: a synthetic matmul loop nest with a cursor.
//!
//! Stands in for the external loop IR. The nest starts as `m`, `n`, `k`
//! (outermost first) over `C[m][n] += A[m][k] * B[k][n]`. The cursor selects
//! one loop; actions move it, swap the selected loop with a neighbour, split
//! it by a fixed factor, or merge it with the loop directly inside it.
//!
//! `dump()` covers the loop order, sizes and cursor but not the history, so
//! different action sequences can reach the same fingerprint.

use std::fmt::Write as _;

use looptune_kernel::agent::{AgentError, LoopAgentV1};

/// Split factors offered as `split_<n>` actions.
pub const SPLIT_FACTORS: [u32; 4] = [2, 4, 8, 16];

/// One loop of the nest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopV1 {
    /// Iteration variable: `'m'`, `'n'` or `'k'`.
    pub var: char,
    pub size: u32,
    /// Set on the inner half of a split.
    pub tiled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct NestSnapshot {
    loops: Vec<LoopV1>,
    cursor: usize,
}

/// Matmul loop nest with cursor and undo history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopNestAgent {
    loops: Vec<LoopV1>,
    cursor: usize,
    actions: Vec<String>,
    undo: Vec<NestSnapshot>,
}

impl LoopNestAgent {
    /// Fresh `m, n, k` nest with the cursor on the outermost loop.
    #[must_use]
    pub fn matmul(m: u32, n: u32, k: u32) -> Self {
        let plain = |var, size| LoopV1 {
            var,
            size,
            tiled: false,
        };
        Self {
            loops: vec![plain('m', m), plain('n', n), plain('k', k)],
            cursor: 0,
            actions: Vec::new(),
            undo: Vec::new(),
        }
    }

    /// Loops, outermost first.
    #[must_use]
    pub fn loops(&self) -> &[LoopV1] {
        &self.loops
    }

    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Loops whose inner half came from a split.
    #[must_use]
    pub fn tiled_loops(&self) -> usize {
        self.loops.iter().filter(|l| l.tiled).count()
    }

    /// `2 * M * N * K` floating-point operations.
    #[must_use]
    pub fn flops(&self) -> f64 {
        self.loops.iter().map(|l| f64::from(l.size)).product::<f64>() * 2.0
    }

    fn can_merge(&self) -> bool {
        match (self.loops.get(self.cursor), self.loops.get(self.cursor + 1)) {
            (Some(outer), Some(inner)) => outer.var == inner.var && inner.tiled,
            _ => false,
        }
    }

    fn can_split(&self, factor: u32) -> bool {
        self.loops
            .get(self.cursor)
            .is_some_and(|l| l.size > factor && l.size % factor == 0)
    }

    fn illegal(action: &str, detail: &str) -> AgentError {
        AgentError::IllegalAction {
            action: action.to_string(),
            detail: detail.to_string(),
        }
    }

    fn split(&mut self, action: &str, factor: u32) -> Result<(), AgentError> {
        if !self.can_split(factor) {
            return Err(Self::illegal(
                action,
                "loop size is not a larger multiple of the factor",
            ));
        }
        let selected = self.loops[self.cursor];
        self.loops[self.cursor].size = selected.size / factor;
        self.loops.insert(
            self.cursor + 1,
            LoopV1 {
                var: selected.var,
                size: factor,
                tiled: true,
            },
        );
        Ok(())
    }
}

impl LoopAgentV1 for LoopNestAgent {
    fn actions(&self) -> &[String] {
        &self.actions
    }

    fn clear_actions(&mut self) {
        self.actions.clear();
        self.undo.clear();
    }

    fn dump(&self) -> String {
        let loops: Vec<String> = self
            .loops
            .iter()
            .map(|l| format!("{}{}{}", l.var, if l.tiled { "'" } else { "" }, l.size))
            .collect();
        format!("[{}] cursor={}", loops.join(" "), self.cursor)
    }

    fn available_actions(&self) -> Vec<String> {
        let last = self.loops.len().saturating_sub(1);
        let mut out = Vec::new();
        if self.cursor > 0 {
            out.push("up".to_string());
            out.push("swap_up".to_string());
        }
        if self.cursor < last {
            out.push("down".to_string());
            out.push("swap_down".to_string());
        }
        for factor in SPLIT_FACTORS {
            if self.can_split(factor) {
                out.push(format!("split_{factor}"));
            }
        }
        if self.can_merge() {
            out.push("merge".to_string());
        }
        out
    }

    fn apply_action(&mut self, action: &str) -> Result<(), AgentError> {
        let snapshot = NestSnapshot {
            loops: self.loops.clone(),
            cursor: self.cursor,
        };
        let last = self.loops.len().saturating_sub(1);
        match action {
            "up" if self.cursor > 0 => self.cursor -= 1,
            "down" if self.cursor < last => self.cursor += 1,
            "swap_up" if self.cursor > 0 => {
                self.loops.swap(self.cursor, self.cursor - 1);
                self.cursor -= 1;
            }
            "swap_down" if self.cursor < last => {
                self.loops.swap(self.cursor, self.cursor + 1);
                self.cursor += 1;
            }
            "up" | "swap_up" => {
                return Err(Self::illegal(action, "cursor is on the outermost loop"))
            }
            "down" | "swap_down" => {
                return Err(Self::illegal(action, "cursor is on the innermost loop"))
            }
            "merge" => {
                if !self.can_merge() {
                    return Err(Self::illegal(action, "no split partner directly inside"));
                }
                let inner = self.loops.remove(self.cursor + 1);
                self.loops[self.cursor].size *= inner.size;
            }
            other => match other.strip_prefix("split_").map(str::parse::<u32>) {
                Some(Ok(factor)) if SPLIT_FACTORS.contains(&factor) => self.split(action, factor)?,
                _ => {
                    return Err(AgentError::UnknownAction {
                        action: action.to_string(),
                    })
                }
            },
        }
        self.undo.push(snapshot);
        self.actions.push(action.to_string());
        Ok(())
    }

    fn undo_action(&mut self) -> Result<(), AgentError> {
        let snapshot = self.undo.pop().ok_or(AgentError::NothingToUndo)?;
        self.loops = snapshot.loops;
        self.cursor = snapshot.cursor;
        self.actions.pop();
        Ok(())
    }

    fn describe(&self) -> String {
        let mut out = String::new();
        for (depth, l) in self.loops.iter().enumerate() {
            let marker = if depth == self.cursor { " <-" } else { "" };
            let tile = if l.tiled { " (tile)" } else { "" };
            let _ = writeln!(
                out,
                "{:indent$}for {} in 0..{}{tile}{marker}",
                "",
                l.var,
                l.size,
                indent = depth * 2
            );
        }
        let _ = writeln!(
            out,
            "{:indent$}C[m][n] += A[m][k] * B[k][n]",
            "",
            indent = self.loops.len() * 2
        );
        out
    }
}
