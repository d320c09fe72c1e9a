//! Looptune Harness: the session surface over the search layer.
//!
//! The harness parses session-parameter commands, runs the requested
//! strategy through `looptune_search`, and replies with JSON. It also ships
//! reference worlds so the whole stack runs without an external compiler.
//!
//! The harness does NOT implement search logic; it delegates to the search
//! crate. Worlds provide agents and evaluators only.

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]

pub mod command;
pub mod runner;
pub mod session;
pub mod worlds;
