//! Core trait for Simulated Annealing.

use std::fmt::Debug;

/// Defines a problem the annealing engine can optimize in place.
///
/// Unlike a solution-returning neighbor function, the problem object *is*
/// the search state: it holds the current configuration, proposes moves
/// against it, and prices them incrementally. The engine never inspects
/// the configuration, it only sees costs.
///
/// # Minimization
///
/// The engine minimizes [`cost`](AnnealProblem::cost). For maximization,
/// negate the cost.
///
/// # Contract
///
/// - Moves are symmetric: applying the same move twice restores the
///   configuration, and the proposal distribution does not depend on the
///   search history. This keeps the Metropolis rule in detailed balance.
/// - `compute_delta_cost(mv)` equals `cost()` after `accept_move(mv)`
///   minus `cost()` before, and leaves the configuration untouched. It
///   should be substantially cheaper than two full evaluations.
/// - `copy()` is deep: mutating the copy never affects the original.
///
/// Violations of the delta-cost rule are caught by the engine when
/// `debug_delta_cost` is enabled.
///
/// # Examples
///
/// ```
/// use rand::rngs::StdRng;
/// use rand::{Rng, SeedableRng};
/// use u_simann::sa::AnnealProblem;
///
/// /// Minimize the number of ones in a bit vector.
/// #[derive(Clone)]
/// struct OneMin {
///     bits: Vec<bool>,
///     rng: StdRng,
/// }
///
/// impl AnnealProblem for OneMin {
///     type Move = usize;
///
///     fn init_config(&mut self) {
///         for b in self.bits.iter_mut() {
///             *b = self.rng.random_bool(0.5);
///         }
///     }
///
///     fn cost(&self) -> f64 {
///         self.bits.iter().filter(|&&b| b).count() as f64
///     }
///
///     fn propose_move(&mut self) -> usize {
///         self.rng.random_range(0..self.bits.len())
///     }
///
///     fn compute_delta_cost(&self, mv: usize) -> f64 {
///         if self.bits[mv] { -1.0 } else { 1.0 }
///     }
///
///     fn accept_move(&mut self, mv: usize) {
///         self.bits[mv] = !self.bits[mv];
///     }
/// }
/// ```
pub trait AnnealProblem: Clone {
    /// A single local perturbation of the configuration.
    type Move: Copy + Debug;

    /// Randomizes the current configuration in place.
    fn init_config(&mut self);

    /// Total objective value of the current configuration. Lower is better.
    fn cost(&self) -> f64;

    /// Draws a move from the (symmetric) proposal distribution.
    ///
    /// Takes `&mut self` only to advance the problem's own random source;
    /// the configuration must not change.
    fn propose_move(&mut self) -> Self::Move;

    /// Cost change caused by applying `mv` to the current configuration.
    fn compute_delta_cost(&self, mv: Self::Move) -> f64;

    /// Permanently applies `mv` to the current configuration.
    fn accept_move(&mut self, mv: Self::Move);

    /// Returns a fully independent duplicate of this problem.
    fn copy(&self) -> Self {
        self.clone()
    }
}
