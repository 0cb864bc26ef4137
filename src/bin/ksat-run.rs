//! Generate a random K-SAT instance and anneal it.
//!
//! ```text
//! ksat-run -n 1000 -m 4000 -k 4 --instance-seed 8 --seed 5
//! RUST_LOG=debug ksat-run --anneal-steps 30   # per-level statistics
//! ksat-run --random                            # fresh OS-drawn seeds
//! ```

use clap::{Parser, ValueEnum};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use u_simann::ksat::KSat;
use u_simann::sa::{AnnealSchedule, SaConfig, SaRunner};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Schedule {
    LinearBeta,
    LinearTemperature,
    Geometric,
}

impl From<Schedule> for AnnealSchedule {
    fn from(s: Schedule) -> Self {
        match s {
            Schedule::LinearBeta => AnnealSchedule::LinearBeta,
            Schedule::LinearTemperature => AnnealSchedule::LinearTemperature,
            Schedule::Geometric => AnnealSchedule::Geometric,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "ksat-run", about = "Simulated annealing on random K-SAT")]
struct Cli {
    /// Number of variables.
    #[arg(short = 'n', long, default_value_t = 1000)]
    vars: usize,

    /// Number of clauses.
    #[arg(short = 'm', long, default_value_t = 4000)]
    clauses: usize,

    /// Literals per clause.
    #[arg(short = 'k', long, default_value_t = 4)]
    arity: usize,

    /// Seed for instance generation and move proposals.
    #[arg(long, default_value_t = 8)]
    instance_seed: u64,

    /// Seed for the engine's accept/reject draws.
    #[arg(long, default_value_t = 5)]
    seed: u64,

    #[arg(long, default_value_t = 1000)]
    mcmc_steps: usize,

    #[arg(long, default_value_t = 20)]
    anneal_steps: usize,

    #[arg(long, default_value_t = 1.0)]
    beta0: f64,

    #[arg(long, default_value_t = 10.0)]
    beta1: f64,

    #[arg(long, value_enum, default_value_t = Schedule::LinearBeta)]
    schedule: Schedule,

    /// Run the last level at infinite beta.
    #[arg(long)]
    final_quench: bool,

    /// Verify every delta cost against a full recomputation (slow).
    #[arg(long)]
    debug_delta_cost: bool,

    /// Ignore both seeds and draw fresh ones, making the run non-deterministic.
    #[arg(long, conflicts_with_all = ["instance_seed", "seed"])]
    random: bool,
}

impl Cli {
    /// `(instance_seed, engine_seed)`; `None` draws from the OS.
    fn seeds(&self) -> (Option<u64>, Option<u64>) {
        if self.random {
            (None, None)
        } else {
            (Some(self.instance_seed), Some(self.seed))
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let (instance_seed, engine_seed) = cli.seeds();

    let instance = KSat::new(cli.vars, cli.clauses, cli.arity, instance_seed);
    let mut ksat = match instance {
        Ok(ksat) => ksat,
        Err(e) => {
            tracing::error!("{e}");
            return ExitCode::FAILURE;
        }
    };
    tracing::info!(
        "Generated {}-SAT instance with {} variables and {} clauses",
        ksat.arity(),
        ksat.num_vars(),
        ksat.num_clauses()
    );

    let mut config = SaConfig::default()
        .with_mcmc_steps(cli.mcmc_steps)
        .with_anneal_steps(cli.anneal_steps)
        .with_betas(cli.beta0, cli.beta1)
        .with_schedule(cli.schedule.into())
        .with_final_quench(cli.final_quench)
        .with_debug_delta_cost(cli.debug_delta_cost);
    config.seed = engine_seed;

    let result = match SaRunner::run(&mut ksat, &config) {
        Ok(result) => result,
        Err(e) => {
            tracing::error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    for level in &result.levels {
        println!(
            "level {:>3}  beta = {:>8.4}  acc.rate = {:.4}  cost = {}  [best = {}]",
            level.level, level.beta, level.acceptance_rate, level.cost, level.best_cost
        );
    }
    println!("best cost = {}", result.best_cost);
    println!("violated clauses = {}", result.best.violated_clauses().len());
    if result.best.is_satisfied() {
        println!("SATISFIABLE");
    }

    ExitCode::SUCCESS
}
