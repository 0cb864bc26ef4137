//! SA execution loop.
//!
//! # Algorithm
//!
//! 1. Optionally randomize the problem (`init_config`) and take the
//!    initial configuration as the first best snapshot.
//! 2. For each temperature level `β` of the schedule, repeat `mcmc_steps`
//!    times:
//!    a. Propose a move and price it with `compute_delta_cost`
//!    b. (debug mode) check the delta against a full recomputation
//!    c. Metropolis test: accept if `Δ ≤ 0`, else with probability `exp(-βΔ)`
//!    d. On acceptance apply the move and update the running cost
//!    e. Snapshot the configuration if it beats the best seen so far,
//!       re-reading its cost with `cost()`
//! 3. Return the best snapshot, which need not be the final configuration.

use super::config::SaConfig;
use super::types::AnnealProblem;
use crate::error::{AnnealError, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, error, info, trace};

/// Absolute tolerance (scaled by the cost magnitude) for debug delta checks.
const DELTA_TOLERANCE: f64 = 1e-10;

/// Summary of one temperature level.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LevelStats {
    /// Zero-based level index.
    pub level: usize,
    /// Inverse temperature used at this level.
    pub beta: f64,
    /// Moves accepted at this level.
    pub accepted: usize,
    /// `accepted / mcmc_steps`.
    pub acceptance_rate: f64,
    /// Current cost at the end of the level.
    pub cost: f64,
    /// Best cost seen up to the end of the level.
    pub best_cost: f64,
}

/// Result of a Simulated Annealing run.
#[derive(Debug, Clone)]
pub struct SaResult<P> {
    /// Independent snapshot of the best configuration found.
    pub best: P,

    /// Cost of `best`.
    pub best_cost: f64,

    /// Cost of the configuration the run ended in.
    pub final_cost: f64,

    /// Total number of proposals evaluated.
    pub iterations: usize,

    /// Number of accepted moves (including improvements).
    pub accepted_moves: usize,

    /// Number of strictly improving moves.
    pub improving_moves: usize,

    /// Per-level statistics, in schedule order.
    pub levels: Vec<LevelStats>,

    /// Best cost before the first level and after each level.
    pub cost_history: Vec<f64>,
}

/// Executes the Simulated Annealing algorithm.
pub struct SaRunner;

impl SaRunner {
    /// Runs SA on `problem`, mutating it in place.
    ///
    /// On return `problem` holds the final configuration; the best one is
    /// in [`SaResult::best`].
    ///
    /// # Errors
    ///
    /// - [`AnnealError::InvalidParameter`] if `config` does not validate.
    /// - [`AnnealError::ContractViolation`] if `debug_delta_cost` is set
    ///   and the problem's delta cost disagrees with a full recomputation.
    ///
    /// # Examples
    ///
    /// ```
    /// use u_simann::ksat::KSat;
    /// use u_simann::sa::{SaConfig, SaRunner};
    ///
    /// let mut ksat = KSat::new(50, 150, 3, Some(8)).unwrap();
    /// let config = SaConfig::default()
    ///     .with_mcmc_steps(500)
    ///     .with_anneal_steps(10)
    ///     .with_betas(1.0, 10.0)
    ///     .with_seed(5);
    ///
    /// let result = SaRunner::run(&mut ksat, &config).unwrap();
    /// assert!(result.best_cost <= result.final_cost);
    /// ```
    pub fn run<P: AnnealProblem>(problem: &mut P, config: &SaConfig) -> Result<SaResult<P>> {
        config.validate()?;

        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::seed_from_u64(rand::random()),
        };

        if config.init_config {
            problem.init_config();
        }
        let mut cost = problem.cost();
        let mut best = problem.copy();
        let mut best_cost = cost;

        let betas = config.betas();
        info!(
            initial_cost = cost,
            levels = betas.len(),
            mcmc_steps = config.mcmc_steps,
            "starting annealing run"
        );

        let mut accepted_moves = 0usize;
        let mut improving_moves = 0usize;
        let mut levels = Vec::with_capacity(betas.len());
        let mut cost_history = Vec::with_capacity(betas.len() + 1);
        cost_history.push(best_cost);

        for (level, &beta) in betas.iter().enumerate() {
            let mut accepted = 0usize;

            for step in 0..config.mcmc_steps {
                let mv = problem.propose_move();
                let delta = problem.compute_delta_cost(mv);

                if config.debug_delta_cost {
                    check_delta(problem, mv, delta, level, step, beta)?;
                }

                if !metropolis(delta, beta, &mut rng) {
                    continue;
                }

                problem.accept_move(mv);
                cost += delta;
                accepted += 1;
                if delta < 0.0 {
                    improving_moves += 1;
                }

                if cost < best_cost {
                    // Resync so drift in `cost += delta` never reaches the result.
                    cost = problem.cost();
                    best = problem.copy();
                    best_cost = cost;
                    trace!(level, step, best_cost, "new best");
                }
            }

            accepted_moves += accepted;
            let acceptance_rate = accepted as f64 / config.mcmc_steps as f64;
            debug!(level, beta, acceptance_rate, cost, best_cost, "level complete");

            cost_history.push(best_cost);
            levels.push(LevelStats {
                level,
                beta,
                accepted,
                acceptance_rate,
                cost,
                best_cost,
            });
        }

        let final_cost = problem.cost();
        info!(best_cost, final_cost, accepted_moves, "annealing finished");

        Ok(SaResult {
            best,
            best_cost,
            final_cost,
            iterations: config.total_steps(),
            accepted_moves,
            improving_moves,
            levels,
            cost_history,
        })
    }
}

/// Metropolis acceptance at inverse temperature `beta`.
///
/// Draws from `rng` only for worsening moves at finite `beta`.
fn metropolis<R: Rng>(delta: f64, beta: f64, rng: &mut R) -> bool {
    if delta <= 0.0 {
        return true;
    }
    if beta.is_infinite() {
        return false;
    }
    rng.random::<f64>() < (-beta * delta).exp()
}

/// Compares `delta` with the cost difference of a trial copy.
fn check_delta<P: AnnealProblem>(
    problem: &P,
    mv: P::Move,
    delta: f64,
    level: usize,
    step: usize,
    beta: f64,
) -> Result<()> {
    let before = problem.cost();
    let mut trial = problem.copy();
    trial.accept_move(mv);
    let expected = trial.cost() - before;

    // A NaN on either side counts as a mismatch.
    let diff = (expected - delta).abs();
    if diff.is_nan() || diff > DELTA_TOLERANCE * (1.0 + expected.abs()) {
        error!(level, step, beta, ?mv, reported = delta, expected, "delta cost mismatch");
        return Err(AnnealError::ContractViolation {
            level,
            step,
            beta,
            mv: format!("{mv:?}"),
            reported: delta,
            expected,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ksat::KSat;
    use crate::sa::AnnealSchedule;

    // ---- Bit-vector toy problem: minimize the number of set bits ----

    #[derive(Debug, Clone)]
    struct OneMin {
        bits: Vec<bool>,
        rng: StdRng,
        proposals: usize,
        weight: f64,
        delta_override: Option<f64>,
    }

    impl OneMin {
        fn new(n: usize, seed: u64) -> Self {
            Self {
                bits: vec![true; n],
                rng: StdRng::seed_from_u64(seed),
                proposals: 0,
                weight: 1.0,
                delta_override: None,
            }
        }
    }

    impl AnnealProblem for OneMin {
        type Move = usize;

        fn init_config(&mut self) {
            for b in self.bits.iter_mut() {
                *b = self.rng.random_bool(0.5);
            }
        }

        fn cost(&self) -> f64 {
            self.bits.iter().filter(|&&b| b).count() as f64 * self.weight
        }

        fn propose_move(&mut self) -> usize {
            self.proposals += 1;
            self.rng.random_range(0..self.bits.len())
        }

        fn compute_delta_cost(&self, mv: usize) -> f64 {
            if let Some(delta) = self.delta_override {
                return delta;
            }
            if self.bits[mv] {
                -self.weight
            } else {
                self.weight
            }
        }

        fn accept_move(&mut self, mv: usize) {
            self.bits[mv] = !self.bits[mv];
        }
    }

    #[test]
    fn test_sa_onemin_reaches_optimum() {
        let mut problem = OneMin::new(40, 1);
        let config = SaConfig::default()
            .with_mcmc_steps(400)
            .with_anneal_steps(20)
            .with_betas(0.5, 8.0)
            .with_seed(42);

        let result = SaRunner::run(&mut problem, &config).unwrap();

        assert_eq!(result.best_cost, 0.0);
        assert_eq!(result.best.cost(), 0.0);
        assert!(result.improving_moves > 0);
    }

    #[test]
    fn test_sa_exact_step_budget() {
        let mut problem = OneMin::new(10, 3);
        let config = SaConfig::default()
            .with_mcmc_steps(37)
            .with_anneal_steps(4)
            .with_seed(1);

        let result = SaRunner::run(&mut problem, &config).unwrap();

        assert_eq!(problem.proposals, 37 * 4);
        assert_eq!(result.iterations, 37 * 4);
        assert_eq!(result.levels.len(), 4);
        assert_eq!(result.cost_history.len(), 5);
        let per_level: usize = result.levels.iter().map(|l| l.accepted).sum();
        assert_eq!(per_level, result.accepted_moves);
    }

    #[test]
    fn test_sa_single_level_stays_at_beta0() {
        let mut problem = OneMin::new(10, 3);
        let config = SaConfig::default()
            .with_mcmc_steps(25)
            .with_anneal_steps(1)
            .with_betas(0.7, 99.0)
            .with_seed(1);

        let result = SaRunner::run(&mut problem, &config).unwrap();

        assert_eq!(problem.proposals, 25);
        assert_eq!(result.levels.len(), 1);
        assert_eq!(result.levels[0].beta, 0.7);
    }

    #[test]
    fn test_sa_zero_beta_accepts_everything() {
        let mut problem = OneMin::new(16, 9);
        let config = SaConfig::default()
            .with_mcmc_steps(200)
            .with_anneal_steps(2)
            .with_betas(0.0, 0.0)
            .with_seed(4);

        let result = SaRunner::run(&mut problem, &config).unwrap();

        assert_eq!(result.accepted_moves, result.iterations);
    }

    #[test]
    fn test_sa_final_quench_never_worsens() {
        let mut problem = OneMin::new(30, 11);
        let config = SaConfig::default()
            .with_mcmc_steps(300)
            .with_anneal_steps(3)
            .with_betas(0.0, 0.0)
            .with_final_quench(true)
            .with_seed(6);

        let result = SaRunner::run(&mut problem, &config).unwrap();

        let last = &result.levels[2];
        assert!(last.beta.is_infinite());
        assert!(last.cost <= result.levels[1].cost);
        assert_eq!(result.final_cost, problem.cost());
    }

    #[test]
    fn test_sa_best_history_non_increasing() {
        let mut ksat = KSat::new(60, 250, 3, Some(21)).unwrap();
        let config = SaConfig::default()
            .with_mcmc_steps(300)
            .with_anneal_steps(15)
            .with_betas(0.2, 6.0)
            .with_seed(2);

        let result = SaRunner::run(&mut ksat, &config).unwrap();

        for window in result.cost_history.windows(2) {
            assert!(
                window[1] <= window[0],
                "best cost history should be non-increasing: {} > {}",
                window[1],
                window[0]
            );
        }
        assert!(result.best_cost <= result.final_cost);
        assert_eq!(result.best.cost(), result.best_cost);
        assert_eq!(ksat.cost(), result.final_cost);
    }

    #[test]
    fn test_sa_reproducible_with_seeds() {
        let config = SaConfig::default()
            .with_mcmc_steps(200)
            .with_anneal_steps(8)
            .with_betas(0.5, 5.0)
            .with_schedule(AnnealSchedule::Geometric)
            .with_seed(77);

        let mut a = KSat::new(40, 170, 3, Some(8)).unwrap();
        let mut b = KSat::new(40, 170, 3, Some(8)).unwrap();
        let ra = SaRunner::run(&mut a, &config).unwrap();
        let rb = SaRunner::run(&mut b, &config).unwrap();

        assert_eq!(ra.best_cost, rb.best_cost);
        assert_eq!(ra.levels, rb.levels);
        assert_eq!(ra.best.assignment(), rb.best.assignment());
        assert_eq!(a.assignment(), b.assignment());
    }

    #[test]
    fn test_sa_debug_mode_passes_on_ksat() {
        let mut ksat = KSat::new(30, 120, 4, Some(3)).unwrap();
        let config = SaConfig::default()
            .with_mcmc_steps(100)
            .with_anneal_steps(5)
            .with_debug_delta_cost(true)
            .with_seed(8);

        assert!(SaRunner::run(&mut ksat, &config).is_ok());
    }

    #[test]
    fn test_sa_debug_mode_catches_broken_delta() {
        let mut problem = OneMin::new(8, 5);
        problem.delta_override = Some(0.0);
        let config = SaConfig::default()
            .with_mcmc_steps(10)
            .with_anneal_steps(2)
            .with_debug_delta_cost(true)
            .with_seed(8);

        let err = SaRunner::run(&mut problem, &config).unwrap_err();
        match err {
            AnnealError::ContractViolation {
                level,
                step,
                reported,
                expected,
                ..
            } => {
                assert_eq!((level, step), (0, 0));
                assert_eq!(reported, 0.0);
                assert_eq!(expected.abs(), 1.0);
            }
            other => panic!("expected contract violation, got {other:?}"),
        }
    }

    #[test]
    fn test_sa_debug_mode_catches_nan_delta() {
        let mut problem = OneMin::new(8, 5);
        problem.delta_override = Some(f64::NAN);
        let config = SaConfig::default()
            .with_mcmc_steps(10)
            .with_anneal_steps(2)
            .with_debug_delta_cost(true)
            .with_seed(8);

        let err = SaRunner::run(&mut problem, &config).unwrap_err();
        match err {
            AnnealError::ContractViolation {
                level,
                step,
                reported,
                ..
            } => {
                assert_eq!((level, step), (0, 0));
                assert!(reported.is_nan());
            }
            other => panic!("expected contract violation, got {other:?}"),
        }
    }

    #[test]
    fn test_sa_fractional_costs_report_exact_values() {
        let mut problem = OneMin::new(30, 13);
        problem.weight = 0.1;
        let config = SaConfig::default()
            .with_mcmc_steps(2000)
            .with_anneal_steps(10)
            .with_betas(0.5, 40.0)
            .with_seed(3);

        let result = SaRunner::run(&mut problem, &config).unwrap();

        assert_eq!(result.best_cost, result.best.cost());
        assert_eq!(result.final_cost, problem.cost());
        assert!(result.best_cost <= result.final_cost);
    }

    #[test]
    fn test_sa_broken_delta_unnoticed_without_debug() {
        let mut problem = OneMin::new(8, 5);
        problem.delta_override = Some(0.0);
        let config = SaConfig::default()
            .with_mcmc_steps(10)
            .with_anneal_steps(2)
            .with_seed(8);

        assert!(SaRunner::run(&mut problem, &config).is_ok());
    }

    #[test]
    fn test_sa_rejects_invalid_config() {
        let mut problem = OneMin::new(8, 5);
        let config = SaConfig::default().with_mcmc_steps(0);

        let err = SaRunner::run(&mut problem, &config).unwrap_err();
        assert!(err.is_invalid_parameter());
        assert_eq!(problem.proposals, 0);
    }

    #[test]
    fn test_sa_skip_init_keeps_starting_point() {
        let mut problem = OneMin::new(12, 5);
        let config = SaConfig::default()
            .with_mcmc_steps(1)
            .with_anneal_steps(1)
            .with_betas(0.0, 0.0)
            .with_init_config(false)
            .with_seed(8);

        let result = SaRunner::run(&mut problem, &config).unwrap();

        // All-ones start, one accepted flip at beta 0.
        assert_eq!(result.cost_history[0], 12.0);
        assert_eq!(result.final_cost, 11.0);
    }

    #[test]
    fn test_metropolis_rule() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(metropolis(-3.0, 1.0, &mut rng));
        assert!(metropolis(0.0, f64::INFINITY, &mut rng));
        assert!(!metropolis(1e-9, f64::INFINITY, &mut rng));
        assert!(!metropolis(1000.0, 10.0, &mut rng));

        let accepted = (0..10_000)
            .filter(|_| metropolis(1.0, 1.0, &mut rng))
            .count();
        let rate = accepted as f64 / 10_000.0;
        assert!((rate - (-1.0f64).exp()).abs() < 0.03, "rate {rate}");
    }
}
