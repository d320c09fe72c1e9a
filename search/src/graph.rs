//! `SearchGraph`: memoized multigraph of visited agent states.
//!
//! Nodes are keyed by [`StateFingerprint`]. The graph owns the best-node
//! pointer, the per-depth discovery times, and the RNG used for unranked
//! candidate sampling. Every strategy in [`crate::strategy`] is a policy over
//! [`SearchGraph::expand`].
//!
//! # Node replacement
//!
//! A fingerprint reached again is only rewritten when the new path is
//! strictly shorter. Equal or longer paths leave the record untouched, even
//! when they score higher (scores of identical fingerprints are identical for
//! a deterministic oracle).

use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use looptune_kernel::agent::LoopAgentV1;
use looptune_kernel::eval::{EvalError, EvalMode, EvaluatorV1};
use looptune_kernel::fingerprint::{fingerprint, StateFingerprint};

use crate::error::SearchError;
use crate::node::{SearchEdgeV1, SearchNodeV1};
use crate::policy::{deadline_passed, DEPTH_CEILING};
use crate::table::SearchTableV1;

/// Per-call expansion settings.
#[derive(Debug, Clone, Copy)]
pub struct ExpandParams {
    /// Maximum candidate actions explored per node.
    pub search_width: usize,
    /// Oracle used to rank candidates when `ranking` is on.
    pub eval_mode: EvalMode,
    /// Rank candidates with the evaluator; otherwise sample legal actions at random.
    pub ranking: bool,
    /// Search start; node times are measured from here.
    pub start: Instant,
    /// Stop expanding (but still record) once this passes. `None` = never.
    pub deadline: Option<Instant>,
}

/// Outcome of offering a node record to the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeUpdate {
    /// First time this fingerprint was seen.
    Inserted,
    /// Existing record replaced by a strictly shorter path.
    Replaced,
    /// Existing record kept (new path was equal or longer).
    Kept,
}

/// Visited-state graph for one search invocation.
pub struct SearchGraph {
    nodes: BTreeMap<StateFingerprint, SearchNodeV1>,
    edges: Vec<SearchEdgeV1>,
    edge_keys: BTreeSet<(StateFingerprint, StateFingerprint, String)>,
    in_edges: BTreeMap<StateFingerprint, Vec<usize>>,
    out_degree: BTreeMap<StateFingerprint, usize>,
    best: Option<StateFingerprint>,
    depth_times: BTreeMap<usize, f64>,
    rng: StdRng,
}

impl SearchGraph {
    /// Create an empty graph whose candidate sampling is seeded by `seed`.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            nodes: BTreeMap::new(),
            edges: Vec::new(),
            edge_keys: BTreeSet::new(),
            in_edges: BTreeMap::new(),
            out_degree: BTreeMap::new(),
            best: None,
            depth_times: BTreeMap::new(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Expand from `agent` up to `num_steps` actions deep.
    ///
    /// Works on a copy; `agent` itself is never mutated. Returns the actions
    /// that lead from `agent` to the best node known to the graph, or an
    /// empty list if `agent` is itself the best node or the best node lies on
    /// a branch that does not pass through `agent`'s recorded path.
    ///
    /// # Errors
    ///
    /// [`SearchError::NegativeDepth`] before any mutation if `num_steps < 0`,
    /// [`SearchError::DepthBudgetExceeded`] if it is above [`DEPTH_CEILING`];
    /// otherwise any agent or evaluator failure hit during expansion.
    pub fn expand<A, E>(
        &mut self,
        evaluator: &E,
        agent: &A,
        num_steps: i64,
        params: &ExpandParams,
    ) -> Result<Vec<String>, SearchError>
    where
        A: LoopAgentV1,
        E: EvaluatorV1<A> + ?Sized,
    {
        if num_steps < 0 {
            return Err(SearchError::NegativeDepth {
                requested: num_steps,
            });
        }
        let depth = match u32::try_from(num_steps) {
            Ok(depth) if depth <= DEPTH_CEILING => depth,
            _ => {
                return Err(SearchError::DepthBudgetExceeded {
                    requested: num_steps,
                    max_depth: DEPTH_CEILING,
                })
            }
        };
        let agent_copy = agent.clone();
        let agent_fp = fingerprint(&agent_copy);

        self.expand_core(evaluator, &agent_copy, agent_fp.clone(), depth, params)?;

        Ok(self.remaining_best_actions(&agent_fp))
    }

    fn expand_core<A, E>(
        &mut self,
        evaluator: &E,
        agent: &A,
        agent_fp: StateFingerprint,
        depth: u32,
        params: &ExpandParams,
    ) -> Result<(), SearchError>
    where
        A: LoopAgentV1,
        E: EvaluatorV1<A> + ?Sized,
    {
        let node_time = params.start.elapsed().as_secs_f64();
        let gflops = evaluator.eval_gflops(agent, EvalMode::LoopNest)?;
        if !gflops.is_finite() {
            return Err(EvalError::NonFiniteScore { value: gflops }.into());
        }

        self.record_depth_time(agent.actions().len(), node_time);
        self.record(agent_fp.clone(), agent.actions(), gflops, node_time);

        if depth == 0 || deadline_passed(params.deadline) {
            return Ok(());
        }

        let chosen = self.choose_actions(evaluator, agent, params)?;
        for action in chosen {
            let mut child = agent.clone();
            child.apply_action(&action)?;
            let child_fp = fingerprint(&child);
            self.record_edge(agent_fp.clone(), child_fp.clone(), &action);
            self.expand_core(evaluator, &child, child_fp, depth - 1, params)?;
        }
        Ok(())
    }

    fn choose_actions<A, E>(
        &mut self,
        evaluator: &E,
        agent: &A,
        params: &ExpandParams,
    ) -> Result<Vec<String>, SearchError>
    where
        A: LoopAgentV1,
        E: EvaluatorV1<A> + ?Sized,
    {
        if params.ranking {
            let ranked = evaluator.actions_q_sorted(agent, params.eval_mode)?;
            Ok(ranked
                .into_iter()
                .take(params.search_width)
                .map(|r| r.action)
                .collect())
        } else {
            let mut actions = agent.available_actions();
            actions.shuffle(&mut self.rng);
            actions.truncate(params.search_width);
            Ok(actions)
        }
    }

    /// Offer a node record. Applies the shortest-path-wins rule and updates
    /// the best pointer on strict improvement.
    pub fn record(
        &mut self,
        fingerprint: StateFingerprint,
        actions: &[String],
        gflops: f64,
        time: f64,
    ) -> NodeUpdate {
        let update = match self.nodes.get(&fingerprint) {
            None => NodeUpdate::Inserted,
            Some(existing) if actions.len() < existing.actions.len() => NodeUpdate::Replaced,
            Some(_) => NodeUpdate::Kept,
        };
        if update == NodeUpdate::Kept {
            return update;
        }

        let improves = self.best().is_none_or(|best| gflops > best.gflops);
        self.nodes.insert(
            fingerprint.clone(),
            SearchNodeV1::new(fingerprint.clone(), actions.to_vec(), gflops, time),
        );
        if improves {
            self.best = Some(fingerprint);
        }
        update
    }

    /// Record a transition. Returns `false` if the same
    /// `(from, to, action)` edge already exists.
    pub fn record_edge(
        &mut self,
        from: StateFingerprint,
        to: StateFingerprint,
        action: &str,
    ) -> bool {
        let key = (from.clone(), to.clone(), action.to_string());
        if !self.edge_keys.insert(key) {
            return false;
        }
        let idx = self.edges.len();
        *self.out_degree.entry(from.clone()).or_insert(0) += 1;
        self.in_edges.entry(to.clone()).or_default().push(idx);
        self.edges.push(SearchEdgeV1 {
            from,
            to,
            action: action.to_string(),
            on_best_path: false,
        });
        true
    }

    /// Raise the discovery time for `depth` to `time` if it is later.
    pub fn record_depth_time(&mut self, depth: usize, time: f64) {
        let entry = self.depth_times.entry(depth).or_insert(time);
        if time > *entry {
            *entry = time;
        }
    }

    /// Actions leading from `from` to the best node, or empty.
    #[must_use]
    pub fn remaining_best_actions(&self, from: &StateFingerprint) -> Vec<String> {
        let (Some(best), Some(base)) = (self.best(), self.nodes.get(from)) else {
            return Vec::new();
        };
        if best.fingerprint == *from || !best.actions.starts_with(&base.actions) {
            return Vec::new();
        }
        best.actions[base.actions.len()..].to_vec()
    }

    /// Time-to-reach-depth curve: entry `d` is the latest discovery time of
    /// any node at depth `<= d`. Non-decreasing by construction.
    #[must_use]
    pub fn depth_time_curve(&self) -> Vec<f64> {
        let Some((&max_depth, _)) = self.depth_times.last_key_value() else {
            return Vec::new();
        };
        let mut curve = Vec::with_capacity(max_depth + 1);
        let mut running = 0.0_f64;
        for depth in 0..=max_depth {
            if let Some(&t) = self.depth_times.get(&depth) {
                running = running.max(t);
            }
            curve.push(running);
        }
        curve
    }

    /// Extract the best path and mark it for rendering.
    ///
    /// # Errors
    ///
    /// [`SearchError::EmptyGraph`] if nothing was recorded;
    /// [`SearchError::BrokenBestPath`] if the back-walk cannot find a parent
    /// edge matching a node's last action.
    pub fn best_path(&mut self) -> Result<SearchTableV1, SearchError> {
        let mut current = self.best.clone().ok_or(SearchError::EmptyGraph)?;
        let mut actions = Vec::new();
        let mut rewards = Vec::new();

        loop {
            let node = self
                .nodes
                .get_mut(&current)
                .ok_or_else(|| SearchError::BrokenBestPath {
                    fingerprint: current.to_string(),
                    action: String::new(),
                    detail: "node missing from graph".into(),
                })?;
            node.on_best_path = true;
            rewards.push(node.gflops);
            let Some(last) = node.actions.last().cloned() else {
                break;
            };
            let node_actions = node.actions.clone();

            let edge_idx = self.parent_edge(&current, &node_actions)?;
            let edge = &mut self.edges[edge_idx];
            edge.on_best_path = true;
            actions.push(last);
            current = edge.from.clone();
        }

        actions.push(String::new());
        actions.reverse();
        rewards.reverse();

        Ok(SearchTableV1 {
            actions,
            rewards,
            times: self.depth_time_curve(),
        })
    }

    /// Incoming edge labelled with the last of `node_actions` whose source
    /// lies strictly closer to the root. Prefers the source whose recorded
    /// path is exactly `node_actions` minus the last action.
    fn parent_edge(
        &self,
        node: &StateFingerprint,
        node_actions: &[String],
    ) -> Result<usize, SearchError> {
        let Some((last, prefix)) = node_actions.split_last() else {
            return Err(SearchError::BrokenBestPath {
                fingerprint: node.to_string(),
                action: String::new(),
                detail: "root has no parent edge".into(),
            });
        };
        let mut fallback: Option<(usize, usize)> = None;
        for &idx in self.in_edges.get(node).map_or(&[][..], Vec::as_slice) {
            let edge = &self.edges[idx];
            if edge.action != *last {
                continue;
            }
            let Some(source) = self.nodes.get(&edge.from) else {
                continue;
            };
            if source.actions == prefix {
                return Ok(idx);
            }
            let len = source.actions.len();
            if len < node_actions.len() && fallback.is_none_or(|(_, l)| len < l) {
                fallback = Some((idx, len));
            }
        }
        fallback
            .map(|(idx, _)| idx)
            .ok_or_else(|| SearchError::BrokenBestPath {
                fingerprint: node.to_string(),
                action: last.clone(),
                detail: "no incoming edge with this action from a shallower node".into(),
            })
    }

    /// The highest-scoring node recorded so far.
    #[must_use]
    pub fn best(&self) -> Option<&SearchNodeV1> {
        self.best.as_ref().and_then(|fp| self.nodes.get(fp))
    }

    #[must_use]
    pub fn node(&self, fingerprint: &StateFingerprint) -> Option<&SearchNodeV1> {
        self.nodes.get(fingerprint)
    }

    /// Nodes in fingerprint order.
    pub fn nodes(&self) -> impl Iterator<Item = &SearchNodeV1> {
        self.nodes.values()
    }

    /// Edges in insertion order.
    #[must_use]
    pub fn edges(&self) -> &[SearchEdgeV1] {
        &self.edges
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[must_use]
    pub fn out_degree(&self, fingerprint: &StateFingerprint) -> usize {
        self.out_degree.get(fingerprint).copied().unwrap_or(0)
    }

    /// Nodes with no outgoing edges, in fingerprint order.
    pub fn leaves(&self) -> impl Iterator<Item = &SearchNodeV1> {
        self.nodes
            .values()
            .filter(|n| self.out_degree(&n.fingerprint) == 0)
    }
}
