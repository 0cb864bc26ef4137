//! Random K-satisfiability.
//!
//! `M` clauses over `N` boolean variables (stored as ±1 spins), each
//! clause holding `K` distinct variables with a required polarity. A
//! clause is violated only when every one of its literals disagrees with
//! its polarity; the cost is the number of violated clauses, written as
//!
//! ```text
//! E(x) = Σ_m Π_k (1 - x[v(m,k)] · s(m,k)) / 2
//! ```
//!
//! Moves flip a single variable. Because a flip only changes the terms of
//! the clauses that variable appears in, [`KSat`] keeps a reverse index
//! from variables to clauses and prices a move in `O(deg · K)` instead of
//! `O(M · K)`.
//!
//! # Reference
//!
//! Mézard, Parisi & Zecchina (2002), "Analytic and Algorithmic Solution
//! of Random Satisfiability Problems", *Science* 297(5582), 812-815.

mod instance;

pub use instance::KSat;
