//! SA configuration and annealing schedules.

use crate::error::{AnnealError, Result};

/// How the inverse temperature moves from `beta0` to `beta1`.
///
/// Every schedule hits both endpoints exactly and yields `beta0` when
/// there is a single level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AnnealSchedule {
    /// Linear in inverse temperature: `β_i = β0 + i (β1 - β0) / (L - 1)`.
    #[default]
    LinearBeta,

    /// Linear in temperature: `1/β_i` interpolates between `1/β0` and `1/β1`.
    ///
    /// Spends more levels at high β than [`LinearBeta`](Self::LinearBeta).
    /// Requires strictly positive betas.
    LinearTemperature,

    /// Geometric in inverse temperature: `β_i = β0 (β1/β0)^(i/(L-1))`.
    ///
    /// Requires strictly positive betas.
    Geometric,
}

impl AnnealSchedule {
    /// Inverse temperature of `level` out of `levels` levels.
    pub fn beta_at(&self, beta0: f64, beta1: f64, level: usize, levels: usize) -> f64 {
        if levels <= 1 || level == 0 {
            return beta0;
        }
        if level + 1 >= levels {
            return beta1;
        }
        let frac = level as f64 / (levels - 1) as f64;
        match self {
            AnnealSchedule::LinearBeta => beta0 + frac * (beta1 - beta0),
            AnnealSchedule::LinearTemperature => {
                let (t0, t1) = (1.0 / beta0, 1.0 / beta1);
                1.0 / (t0 + frac * (t1 - t0))
            }
            AnnealSchedule::Geometric => beta0 * (beta1 / beta0).powf(frac),
        }
    }

    fn needs_positive_beta(&self) -> bool {
        !matches!(self, AnnealSchedule::LinearBeta)
    }
}

/// Configuration for the annealing engine.
///
/// # Examples
///
/// ```
/// use u_simann::sa::{AnnealSchedule, SaConfig};
///
/// let config = SaConfig::default()
///     .with_mcmc_steps(1000)
///     .with_anneal_steps(20)
///     .with_betas(1.0, 10.0)
///     .with_schedule(AnnealSchedule::LinearBeta)
///     .with_seed(5);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SaConfig {
    /// Proposals evaluated at each temperature level.
    pub mcmc_steps: usize,

    /// Number of temperature levels.
    pub anneal_steps: usize,

    /// Inverse temperature of the first level.
    pub beta0: f64,

    /// Inverse temperature of the last level.
    pub beta1: f64,

    /// Interpolation between `beta0` and `beta1`.
    pub schedule: AnnealSchedule,

    /// Run the last level at `β = ∞` (strict descent).
    ///
    /// The remaining `anneal_steps - 1` levels span `beta0..=beta1`.
    pub final_quench: bool,

    /// Call `init_config()` on the problem before searching.
    pub init_config: bool,

    /// Check every delta cost against a full recomputation.
    ///
    /// Costs two full evaluations and a deep copy per proposal; for
    /// validating new problem implementations only.
    pub debug_delta_cost: bool,

    /// Seed for the engine's accept/reject draws. `None` draws one from
    /// the OS.
    pub seed: Option<u64>,
}

impl Default for SaConfig {
    fn default() -> Self {
        Self {
            mcmc_steps: 100,
            anneal_steps: 10,
            beta0: 0.1,
            beta1: 10.0,
            schedule: AnnealSchedule::default(),
            final_quench: false,
            init_config: true,
            debug_delta_cost: false,
            seed: None,
        }
    }
}

impl SaConfig {
    pub fn with_mcmc_steps(mut self, n: usize) -> Self {
        self.mcmc_steps = n;
        self
    }

    pub fn with_anneal_steps(mut self, n: usize) -> Self {
        self.anneal_steps = n;
        self
    }

    pub fn with_betas(mut self, beta0: f64, beta1: f64) -> Self {
        self.beta0 = beta0;
        self.beta1 = beta1;
        self
    }

    pub fn with_schedule(mut self, schedule: AnnealSchedule) -> Self {
        self.schedule = schedule;
        self
    }

    pub fn with_final_quench(mut self, quench: bool) -> Self {
        self.final_quench = quench;
        self
    }

    pub fn with_init_config(mut self, init: bool) -> Self {
        self.init_config = init;
        self
    }

    pub fn with_debug_delta_cost(mut self, debug: bool) -> Self {
        self.debug_delta_cost = debug;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Total number of proposals a run evaluates.
    pub fn total_steps(&self) -> usize {
        self.mcmc_steps.saturating_mul(self.anneal_steps)
    }

    /// Inverse temperature of every level, in run order.
    pub fn betas(&self) -> Vec<f64> {
        if self.final_quench && self.anneal_steps >= 2 {
            let warm = self.anneal_steps - 1;
            let mut betas: Vec<f64> = (0..warm)
                .map(|i| self.schedule.beta_at(self.beta0, self.beta1, i, warm))
                .collect();
            betas.push(f64::INFINITY);
            betas
        } else {
            (0..self.anneal_steps)
                .map(|i| {
                    self.schedule
                        .beta_at(self.beta0, self.beta1, i, self.anneal_steps)
                })
                .collect()
        }
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.mcmc_steps == 0 {
            return Err(AnnealError::invalid("mcmc_steps", "must be positive"));
        }
        if self.anneal_steps == 0 {
            return Err(AnnealError::invalid("anneal_steps", "must be positive"));
        }
        for (name, beta) in [("beta0", self.beta0), ("beta1", self.beta1)] {
            if !beta.is_finite() || beta < 0.0 {
                return Err(AnnealError::invalid(
                    name,
                    format!("must be finite and non-negative, got {beta}"),
                ));
            }
            if beta == 0.0 && self.schedule.needs_positive_beta() {
                return Err(AnnealError::invalid(
                    name,
                    format!("{:?} schedule requires a positive beta", self.schedule),
                ));
            }
        }
        if self.final_quench && self.anneal_steps < 2 {
            return Err(AnnealError::invalid(
                "anneal_steps",
                "final_quench needs at least 2 levels",
            ));
        }
        Ok(())
    }
}
