//! Looptune Kernel: the contracts every search component is written against.
//!
//! # API Surface
//!
//! - [`agent::LoopAgentV1`] -- opaque loop-nest state handle (copy, dump, apply, undo)
//! - [`eval::EvaluatorV1`] -- performance oracle and action ranking under an [`eval::EvalMode`]
//! - [`fingerprint::fingerprint`] -- content-addressed state key derived from `dump()`
//!
//! # Module Dependency Direction
//!
//! `fingerprint` ← `agent` ← `eval`
//!
//! One-way only. The kernel has no knowledge of graphs, strategies, or sessions.

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]

pub mod agent;
pub mod eval;
pub mod fingerprint;
