//! Looptune Search: schedule search over loop-nest transformation sequences.
//!
//! This crate provides the search layer. It depends only on
//! `looptune_kernel` and does NOT depend on `looptune_harness`.
//!
//! # Crate dependency graph
//!
//! ```text
//! looptune_kernel  ←  looptune_search  ←  looptune_harness
//! (agent, eval,       (graph, tables,     (sessions, commands,
//!  fingerprints)       strategies)         reference worlds)
//! ```
//!
//! # Key types
//!
//! - [`SearchGraph`] -- memoized multigraph of visited states with best-node tracking
//! - [`SearchNodeV1`] / [`SearchEdgeV1`] -- graph vertices and transitions
//! - [`SearchTableV1`] -- best path as (actions, rewards, times) and its JSON wire form
//! - [`SearchConfigV1`] -- timeout, seed, depth cap, debug rendering
//! - [`strategy`] -- greedy, beam (DFS/BFS/two-phase) and random searches

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod graph;
pub mod node;
pub mod policy;
pub mod render;
pub mod strategy;
pub mod table;

#[cfg(test)]
mod test_support;

pub use error::SearchError;
pub use graph::{ExpandParams, NodeUpdate, SearchGraph};
pub use node::{SearchEdgeV1, SearchNodeV1};
pub use policy::SearchConfigV1;
pub use table::{SearchStepV1, SearchTableV1};
