//! Reference worlds: agents and evaluators the session can drive without an
//! external compiler backend.

pub mod analytic;
pub mod loop_nest;
pub mod up_down;
