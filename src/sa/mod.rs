//! Simulated Annealing (SA).
//!
//! A single-solution trajectory metaheuristic inspired by the physical
//! annealing process. The problem object carries its own configuration
//! and prices local moves incrementally; the engine walks an
//! inverse-temperature schedule and applies the Metropolis rule, keeping
//! an independent snapshot of the best configuration seen.
//!
//! # References
//!
//! - Kirkpatrick, Gelatt & Vecchi (1983), "Optimization by Simulated Annealing"
//! - Metropolis et al. (1953), "Equation of State Calculations by Fast
//!   Computing Machines"

mod config;
mod runner;
mod types;

pub use config::{AnnealSchedule, SaConfig};
pub use runner::{LevelStats, SaResult, SaRunner};
pub use types::AnnealProblem;
