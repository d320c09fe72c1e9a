//! `AnalyticEvaluator`: deterministic scoring for [`LoopNestAgent`].
//!
//! Stands in for the measured backend and the learned models:
//!
//! - `loop_nest`: a roofline-style estimate from the loop order and tiling.
//! - `cost`: a linear model over nest features, weights loaded from JSON.
//! - `policy`: per-action logits loaded from JSON.
//!
//! Model files are plain JSON. Loading an empty path unloads the model.
//! Each loaded file is digested under [`DOMAIN_MODEL_FILE`] so logs and
//! callers can tell which weights a search ran with.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use looptune_kernel::agent::LoopAgentV1;
use looptune_kernel::eval::{
    sort_best_first, EvalError, EvalMode, EvaluatorV1, ModelKind, RankedActionV1,
};
use looptune_kernel::fingerprint::{canonical_hash, ContentHash, DOMAIN_MODEL_FILE};

use crate::worlds::loop_nest::LoopNestAgent;

/// Peak throughput of the modelled machine.
pub const PEAK_GFLOPS: f64 = 96.0;

/// Product of tile sizes above which the working set no longer fits in cache.
const CACHE_TILE_ELEMS: f64 = 4096.0;

/// Linear cost model: `bias + sum(weights[f] * feature[f])`.
///
/// Feature names: `depth`, `cursor`, `tiles`, `inner_m`, `inner_n`,
/// `inner_k`, `tile_elems`. Unknown names contribute nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostModelV1 {
    #[serde(default)]
    pub bias: f64,
    pub weights: BTreeMap<String, f64>,
}

/// Per-action policy logits. Actions without an entry score `default`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyModelV1 {
    pub logits: BTreeMap<String, f64>,
    #[serde(default)]
    pub default: f64,
}

impl PolicyModelV1 {
    fn logit(&self, action: &str) -> f64 {
        let family = action.split('_').next().unwrap_or(action);
        self.logits
            .get(action)
            .or_else(|| self.logits.get(family))
            .copied()
            .unwrap_or(self.default)
    }
}

/// Deterministic evaluator for the reference loop-nest world.
#[derive(Debug, Clone, Default)]
pub struct AnalyticEvaluator {
    cost: Option<CostModelV1>,
    policy: Option<PolicyModelV1>,
    cost_digest: Option<ContentHash>,
    policy_digest: Option<ContentHash>,
}

impl AnalyticEvaluator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_cost_model(mut self, model: CostModelV1) -> Self {
        self.cost = Some(model);
        self.cost_digest = None;
        self
    }

    #[must_use]
    pub fn with_policy_model(mut self, model: PolicyModelV1) -> Self {
        self.policy = Some(model);
        self.policy_digest = None;
        self
    }

    #[must_use]
    pub fn has_model(&self, kind: ModelKind) -> bool {
        match kind {
            ModelKind::Cost => self.cost.is_some(),
            ModelKind::Policy => self.policy.is_some(),
        }
    }

    /// Digest of the file the `kind` model was loaded from. `None` when the
    /// model is absent or was supplied in memory.
    #[must_use]
    pub fn model_digest(&self, kind: ModelKind) -> Option<&ContentHash> {
        match kind {
            ModelKind::Cost => self.cost_digest.as_ref(),
            ModelKind::Policy => self.policy_digest.as_ref(),
        }
    }

    fn cost_model(&self) -> Result<&CostModelV1, EvalError> {
        self.cost.as_ref().ok_or(EvalError::ModelNotLoaded {
            kind: ModelKind::Cost,
        })
    }

    fn policy_model(&self) -> Result<&PolicyModelV1, EvalError> {
        self.policy.as_ref().ok_or(EvalError::ModelNotLoaded {
            kind: ModelKind::Policy,
        })
    }

    /// Rank every legal action by the score of the state it leads to.
    fn rank_by_successor(
        &self,
        agent: &LoopNestAgent,
        mode: EvalMode,
    ) -> Result<Vec<RankedActionV1>, EvalError> {
        let mut ranked = Vec::new();
        for action in agent.available_actions() {
            let mut next = agent.clone();
            next.apply_action(&action)?;
            let score = self.eval_gflops(&next, mode)?;
            ranked.push(RankedActionV1::new(action, score));
        }
        sort_best_first(&mut ranked);
        Ok(ranked)
    }
}

/// Feature vector fed to the cost model.
#[must_use]
pub fn nest_features(agent: &LoopNestAgent) -> BTreeMap<&'static str, f64> {
    let loops = agent.loops();
    let innermost = loops.last().map_or(' ', |l| l.var);
    let indicator = |var| if innermost == var { 1.0 } else { 0.0 };
    let tile_elems: f64 = loops
        .iter()
        .filter(|l| l.tiled)
        .map(|l| f64::from(l.size))
        .product();
    let count = |n: usize| f64::from(u32::try_from(n).unwrap_or(u32::MAX));

    BTreeMap::from([
        ("depth", count(loops.len())),
        ("cursor", count(agent.cursor())),
        ("tiles", count(agent.tiled_loops())),
        ("inner_m", indicator('m')),
        ("inner_n", indicator('n')),
        ("inner_k", indicator('k')),
        ("tile_elems", tile_elems),
    ])
}

/// Analytic throughput estimate.
///
/// Unit-stride access on the innermost loop dominates: `n` streams `B` and
/// `C`, `k` streams `A`, `m` streams nothing. Tiling helps while the tile
/// working set fits in cache, and each extra loop level costs a little
/// overhead.
#[must_use]
pub fn analytic_gflops(agent: &LoopNestAgent) -> f64 {
    let loops = agent.loops();
    let locality = match loops.last().map(|l| l.var) {
        Some('n') => 1.0,
        Some('k') => 0.55,
        _ => 0.25,
    };
    let features = nest_features(agent);
    let tiles = features.get("tiles").copied().unwrap_or(0.0);
    let tile_elems = features.get("tile_elems").copied().unwrap_or(1.0);
    let tiling = if tile_elems <= CACHE_TILE_ELEMS {
        1.0 + 0.2 * tiles.min(3.0)
    } else {
        0.8
    };
    let depth = features.get("depth").copied().unwrap_or(3.0);
    let overhead = 1.0 + 0.05 * (depth - 3.0).max(0.0);
    (PEAK_GFLOPS * 0.5 * locality * tiling / overhead).min(PEAK_GFLOPS)
}

/// Read, digest and parse a JSON model file.
fn read_model<T: serde::de::DeserializeOwned>(path: &Path) -> Result<(T, ContentHash), EvalError> {
    let load_err = |detail: String| EvalError::ModelLoad {
        path: path.display().to_string(),
        detail,
    };
    let bytes = std::fs::read(path).map_err(|e| load_err(e.to_string()))?;
    let model = serde_json::from_slice(&bytes).map_err(|e| load_err(e.to_string()))?;
    Ok((model, canonical_hash(DOMAIN_MODEL_FILE, &bytes)))
}

/// Split an optional `(model, digest)` pair into its two slots.
fn unzip<T>(loaded: Option<(T, ContentHash)>) -> (Option<T>, Option<ContentHash>) {
    match loaded {
        Some((model, digest)) => (Some(model), Some(digest)),
        None => (None, None),
    }
}

impl EvaluatorV1<LoopNestAgent> for AnalyticEvaluator {
    fn eval_gflops(&self, agent: &LoopNestAgent, mode: EvalMode) -> Result<f64, EvalError> {
        match mode {
            EvalMode::LoopNest => Ok(analytic_gflops(agent)),
            EvalMode::Cost => {
                let model = self.cost_model()?;
                let features = nest_features(agent);
                Ok(model.bias
                    + model
                        .weights
                        .iter()
                        .map(|(name, w)| w * features.get(name.as_str()).copied().unwrap_or(0.0))
                        .sum::<f64>())
            }
            EvalMode::Policy => {
                let model = self.policy_model()?;
                Ok(agent
                    .available_actions()
                    .iter()
                    .map(|a| model.logit(a))
                    .fold(model.default, f64::max))
            }
        }
    }

    fn actions_q_sorted(
        &self,
        agent: &LoopNestAgent,
        mode: EvalMode,
    ) -> Result<Vec<RankedActionV1>, EvalError> {
        match mode {
            EvalMode::LoopNest | EvalMode::Cost => self.rank_by_successor(agent, mode),
            EvalMode::Policy => {
                let model = self.policy_model()?;
                let mut ranked: Vec<RankedActionV1> = agent
                    .available_actions()
                    .into_iter()
                    .map(|a| {
                        let logit = model.logit(&a);
                        RankedActionV1::new(a, logit)
                    })
                    .collect();
                sort_best_first(&mut ranked);
                Ok(ranked)
            }
        }
    }

    fn load_model(&mut self, kind: ModelKind, path: &Path) -> Result<(), EvalError> {
        let unload = path.as_os_str().is_empty();
        let digest = match kind {
            ModelKind::Cost => {
                let loaded = if unload { None } else { Some(read_model(path)?) };
                (self.cost, self.cost_digest) = unzip(loaded);
                self.cost_digest.clone()
            }
            ModelKind::Policy => {
                let loaded = if unload { None } else { Some(read_model(path)?) };
                (self.policy, self.policy_digest) = unzip(loaded);
                self.policy_digest.clone()
            }
        };
        tracing::info!(
            %kind,
            path = %path.display(),
            loaded = !unload,
            digest = digest.as_ref().map_or("", ContentHash::as_str),
            "model updated"
        );
        Ok(())
    }
}
