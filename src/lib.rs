//! Simulated annealing over problems with incremental move costs.
//!
//! - **Simulated Annealing (SA)**: a generic engine that drives any
//!   [`sa::AnnealProblem`] through an inverse-temperature schedule using
//!   the Metropolis acceptance rule, tracking the best configuration.
//! - **K-SAT**: a random K-satisfiability model implementing the problem
//!   trait, with delta costs restricted to the clauses a flip touches.
//!
//! # Architecture
//!
//! The engine never looks inside a configuration. A problem object owns
//! its state and its random source, proposes symmetric moves, prices them
//! without mutation, and applies accepted ones. The engine owns a separate
//! random source for accept/reject draws, so a run is reproducible from
//! the two seeds alone.

pub mod error;
pub mod ksat;
pub mod sa;

pub use error::{AnnealError, Result};
