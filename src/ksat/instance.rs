//! K-SAT instance with incremental cost bookkeeping.

use crate::error::{AnnealError, Result};
use crate::sa::AnnealProblem;
use rand::rngs::StdRng;
use rand::seq::index;
use rand::{Rng, SeedableRng};

/// A K-SAT instance together with its current assignment.
///
/// Clause structure is fixed at construction; only the assignment changes,
/// through [`init_config`](AnnealProblem::init_config) and
/// [`accept_move`](AnnealProblem::accept_move). The instance owns the
/// random source used for instance generation, re-initialization and move
/// proposals, so equal seeds give equal instances and equal proposal
/// streams.
///
/// # Examples
///
/// ```
/// use u_simann::ksat::KSat;
/// use u_simann::sa::AnnealProblem;
///
/// let mut ksat = KSat::new(100, 350, 3, Some(8)).unwrap();
/// let mv = ksat.propose_move();
/// let before = ksat.cost();
/// let delta = ksat.compute_delta_cost(mv);
/// ksat.accept_move(mv);
/// assert_eq!(ksat.cost(), before + delta);
/// ```
#[derive(Debug, Clone)]
pub struct KSat {
    n: usize,
    m: usize,
    k: usize,
    /// Literal polarities, `m * k` row-major.
    signs: Vec<i8>,
    /// Literal variables, `m * k` row-major; distinct within a row.
    vars: Vec<usize>,
    /// Clauses containing each variable, ascending.
    clauses_of: Vec<Vec<usize>>,
    assignment: Vec<i8>,
    rng: StdRng,
}

impl KSat {
    /// Generates a random instance with `n` variables, `m` clauses of
    /// arity `k`, and a random initial assignment.
    ///
    /// Polarities are uniform over `{-1, +1}`; each clause's variables are
    /// a uniform `k`-subset of `0..n`. `seed = None` draws a seed from the
    /// OS.
    ///
    /// # Errors
    ///
    /// [`AnnealError::InvalidParameter`] unless `n > 0`, `m > 0` and
    /// `2 <= k <= n`.
    pub fn new(n: usize, m: usize, k: usize, seed: Option<u64>) -> Result<Self> {
        if k < 2 {
            return Err(AnnealError::invalid(
                "k",
                format!("clause arity must be at least 2, got {k}"),
            ));
        }
        if n == 0 {
            return Err(AnnealError::invalid("n", "need at least one variable"));
        }
        if m == 0 {
            return Err(AnnealError::invalid("m", "need at least one clause"));
        }
        if k > n {
            return Err(AnnealError::invalid(
                "k",
                format!("clause arity {k} exceeds the number of variables {n}"),
            ));
        }

        let mut rng = seeded_rng(seed);
        let signs: Vec<i8> = (0..m * k).map(|_| random_spin(&mut rng)).collect();
        let mut vars = Vec::with_capacity(m * k);
        for _ in 0..m {
            vars.extend(index::sample(&mut rng, n, k).iter());
        }

        Ok(Self::from_parts(n, m, k, signs, vars, rng))
    }

    /// Builds an instance from explicit clauses of `(variable, polarity)`
    /// literals, then draws a random initial assignment.
    ///
    /// # Errors
    ///
    /// [`AnnealError::InvalidParameter`] if `n == 0`, there are no clauses,
    /// clause arities differ or are below 2, a variable is out of range or
    /// repeated within a clause, or a polarity is not ±1.
    ///
    /// # Examples
    ///
    /// ```
    /// use u_simann::ksat::KSat;
    /// use u_simann::sa::AnnealProblem;
    ///
    /// // (x0 ∨ x1) ∧ (¬x2 ∨ ¬x3)
    /// let mut ksat = KSat::from_clauses(
    ///     4,
    ///     &[vec![(0, 1), (1, 1)], vec![(2, -1), (3, -1)]],
    ///     Some(0),
    /// )
    /// .unwrap();
    /// ksat.set_assignment(&[-1, -1, 1, 1]).unwrap();
    /// assert_eq!(ksat.cost(), 2.0);
    /// ```
    pub fn from_clauses(
        n: usize,
        clauses: &[Vec<(usize, i8)>],
        seed: Option<u64>,
    ) -> Result<Self> {
        if n == 0 {
            return Err(AnnealError::invalid("n", "need at least one variable"));
        }
        let Some(first) = clauses.first() else {
            return Err(AnnealError::invalid("clauses", "need at least one clause"));
        };
        let k = first.len();
        if k < 2 {
            return Err(AnnealError::invalid(
                "k",
                format!("clause arity must be at least 2, got {k}"),
            ));
        }

        let m = clauses.len();
        let mut signs = Vec::with_capacity(m * k);
        let mut vars = Vec::with_capacity(m * k);
        for (c, clause) in clauses.iter().enumerate() {
            if clause.len() != k {
                return Err(AnnealError::invalid(
                    "clauses",
                    format!("clause {c} has arity {}, expected {k}", clause.len()),
                ));
            }
            for (i, &(v, s)) in clause.iter().enumerate() {
                if v >= n {
                    return Err(AnnealError::invalid(
                        "clauses",
                        format!("clause {c} uses variable {v}, but n = {n}"),
                    ));
                }
                if s != 1 && s != -1 {
                    return Err(AnnealError::invalid(
                        "clauses",
                        format!("clause {c} has polarity {s}, expected +1 or -1"),
                    ));
                }
                if clause[..i].iter().any(|&(u, _)| u == v) {
                    return Err(AnnealError::invalid(
                        "clauses",
                        format!("clause {c} repeats variable {v}"),
                    ));
                }
                vars.push(v);
                signs.push(s);
            }
        }

        Ok(Self::from_parts(n, m, k, signs, vars, seeded_rng(seed)))
    }

    fn from_parts(
        n: usize,
        m: usize,
        k: usize,
        signs: Vec<i8>,
        vars: Vec<usize>,
        rng: StdRng,
    ) -> Self {
        let mut clauses_of = vec![Vec::new(); n];
        for (c, row) in vars.chunks_exact(k).enumerate() {
            for &v in row {
                clauses_of[v].push(c);
            }
        }

        let mut ksat = Self {
            n,
            m,
            k,
            signs,
            vars,
            clauses_of,
            assignment: vec![1; n],
            rng,
        };
        ksat.init_config();
        ksat
    }

    pub fn num_vars(&self) -> usize {
        self.n
    }

    pub fn num_clauses(&self) -> usize {
        self.m
    }

    pub fn arity(&self) -> usize {
        self.k
    }

    /// Current assignment, one ±1 spin per variable.
    pub fn assignment(&self) -> &[i8] {
        &self.assignment
    }

    /// Overwrites the current assignment.
    ///
    /// # Errors
    ///
    /// [`AnnealError::InvalidParameter`] if the length is not `n` or an
    /// entry is not ±1. The assignment is left untouched on error.
    pub fn set_assignment(&mut self, assignment: &[i8]) -> Result<()> {
        if assignment.len() != self.n {
            return Err(AnnealError::invalid(
                "assignment",
                format!("expected {} values, got {}", self.n, assignment.len()),
            ));
        }
        if let Some(bad) = assignment.iter().find(|&&x| x != 1 && x != -1) {
            return Err(AnnealError::invalid(
                "assignment",
                format!("values must be +1 or -1, got {bad}"),
            ));
        }
        self.assignment.copy_from_slice(assignment);
        Ok(())
    }

    /// Clauses in which `var` appears, ascending.
    pub fn clauses_of(&self, var: usize) -> &[usize] {
        &self.clauses_of[var]
    }

    /// The `(variable, polarity)` literals of `clause`.
    pub fn literals(&self, clause: usize) -> impl Iterator<Item = (usize, i8)> + '_ {
        let row = self.row(clause);
        self.vars[row.clone()]
            .iter()
            .copied()
            .zip(self.signs[row].iter().copied())
    }

    /// Clauses violated by the current assignment.
    pub fn violated_clauses(&self) -> Vec<usize> {
        (0..self.m)
            .filter(|&c| self.clause_energy(c, None) > 0.0)
            .collect()
    }

    pub fn is_satisfied(&self) -> bool {
        (0..self.m).all(|c| self.clause_energy(c, None) == 0.0)
    }

    fn row(&self, clause: usize) -> std::ops::Range<usize> {
        clause * self.k..(clause + 1) * self.k
    }

    /// `Π_k (1 - x·s) / 2` for one clause, optionally reading `flipped`
    /// with its sign reversed.
    fn clause_energy(&self, clause: usize, flipped: Option<usize>) -> f64 {
        let row = self.row(clause);
        self.vars[row.clone()]
            .iter()
            .zip(&self.signs[row])
            .map(|(&v, &s)| {
                let x = if flipped == Some(v) {
                    -self.assignment[v]
                } else {
                    self.assignment[v]
                };
                f64::from(1 - x * s) / 2.0
            })
            .product()
    }
}

impl AnnealProblem for KSat {
    type Move = usize;

    fn init_config(&mut self) {
        for x in self.assignment.iter_mut() {
            *x = random_spin(&mut self.rng);
        }
    }

    fn cost(&self) -> f64 {
        (0..self.m).map(|c| self.clause_energy(c, None)).sum()
    }

    fn propose_move(&mut self) -> usize {
        self.rng.random_range(0..self.n)
    }

    /// Re-evaluates only the clauses containing `mv`, with `mv` read as
    /// flipped. The assignment is never written.
    fn compute_delta_cost(&self, mv: usize) -> f64 {
        self.clauses_of[mv]
            .iter()
            .map(|&c| self.clause_energy(c, Some(mv)) - self.clause_energy(c, None))
            .sum()
    }

    fn accept_move(&mut self, mv: usize) {
        self.assignment[mv] = -self.assignment[mv];
    }
}

fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::seed_from_u64(rand::random()),
    }
}

fn random_spin<R: Rng>(rng: &mut R) -> i8 {
    if rng.random_bool(0.5) {
        1
    } else {
        -1
    }
}
