use std::fmt;

use clarabel::solver::{DefaultSettings, DefaultSolver, IPSolver, SolverStatus};
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use crate::problem::QuadProblem;

/// Solver configuration for the convex optimization step.
///
/// `Default` runs the engine with its stock settings. The three named
/// profiles trade accuracy against robustness and double as the fixed
/// fallback sequence tried in order whenever the preferred configuration
/// fails to converge.
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Solver {
    /// The engine's default settings
    Default,
    /// Tight optimality and feasibility tolerances, more iterations
    HighAccuracy,
    /// Stronger static regularization for ill-conditioned problems
    Stabilized,
    /// Loose tolerances, accepts a lower-accuracy solution
    Relaxed,
}

/// Fallback sequence walked when the preferred configuration fails.
const FALLBACK_SOLVERS: [Solver; 3] = [Solver::HighAccuracy, Solver::Stabilized, Solver::Relaxed];

impl Solver {
    fn settings(self) -> DefaultSettings<f64> {
        let base = DefaultSettings {
            verbose: false,
            ..DefaultSettings::default()
        };
        match self {
            Solver::Default => base,
            Solver::HighAccuracy => DefaultSettings {
                max_iter: 200,
                tol_gap_abs: 1e-10,
                tol_gap_rel: 1e-10,
                tol_feas: 1e-10,
                ..base
            },
            Solver::Stabilized => DefaultSettings {
                max_iter: 100,
                static_regularization_constant: 1e-7,
                dynamic_regularization_delta: 2e-6,
                ..base
            },
            Solver::Relaxed => DefaultSettings {
                max_iter: 500,
                tol_gap_abs: 1e-6,
                tol_gap_rel: 1e-6,
                tol_feas: 1e-6,
                ..base
            },
        }
    }
}

impl fmt::Display for Solver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Solver::Default => write!(f, "default"),
            Solver::HighAccuracy => write!(f, "high accuracy"),
            Solver::Stabilized => write!(f, "stabilized"),
            Solver::Relaxed => write!(f, "relaxed"),
        }
    }
}

/// Termination status of a solve attempt, mapped from the engine's status
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStatus {
    Optimal,
    AlmostOptimal,
    Infeasible,
    Unbounded,
    MaxIterations,
    MaxTime,
    NumericalError,
    InsufficientProgress,
    Unsolved,
}

impl SolveStatus {
    /// The solve reached (at least approximate) optimality
    pub fn is_optimal(self) -> bool {
        matches!(self, SolveStatus::Optimal | SolveStatus::AlmostOptimal)
    }

    /// The problem itself is degenerate; the returned values may be garbage
    /// but are still extracted rather than aborting the fit
    pub fn is_degenerate(self) -> bool {
        matches!(self, SolveStatus::Infeasible | SolveStatus::Unbounded)
    }

    /// A transient solver failure worth retrying with another configuration
    pub fn needs_retry(self) -> bool {
        !self.is_optimal() && !self.is_degenerate()
    }
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = match self {
            SolveStatus::Optimal => "optimal",
            SolveStatus::AlmostOptimal => "almost optimal",
            SolveStatus::Infeasible => "infeasible",
            SolveStatus::Unbounded => "unbounded",
            SolveStatus::MaxIterations => "max iterations",
            SolveStatus::MaxTime => "max time",
            SolveStatus::NumericalError => "numerical error",
            SolveStatus::InsufficientProgress => "insufficient progress",
            SolveStatus::Unsolved => "unsolved",
        };
        write!(f, "{}", status)
    }
}

impl From<SolverStatus> for SolveStatus {
    fn from(status: SolverStatus) -> Self {
        match status {
            SolverStatus::Solved => SolveStatus::Optimal,
            SolverStatus::AlmostSolved => SolveStatus::AlmostOptimal,
            SolverStatus::PrimalInfeasible | SolverStatus::AlmostPrimalInfeasible => {
                SolveStatus::Infeasible
            }
            SolverStatus::DualInfeasible | SolverStatus::AlmostDualInfeasible => {
                SolveStatus::Unbounded
            }
            SolverStatus::MaxIterations => SolveStatus::MaxIterations,
            SolverStatus::MaxTime => SolveStatus::MaxTime,
            SolverStatus::NumericalError => SolveStatus::NumericalError,
            SolverStatus::InsufficientProgress => SolveStatus::InsufficientProgress,
            _ => SolveStatus::Unsolved,
        }
    }
}

/// Diagnostics of the last solve attempt
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq)]
pub struct SolverStats {
    /// Termination status of the attempt
    pub status: SolveStatus,
    /// Interior point iterations spent
    pub iterations: u32,
    /// Wall time of the solve in seconds
    pub solve_time: f64,
    /// Final objective value
    pub objective: f64,
    /// The configuration that produced this attempt
    pub solver: Solver,
}

/// Variable values and diagnostics of the accepted solve attempt
pub(crate) struct SolvedProblem {
    /// Stacked solution `[intercept, coefficients...]`
    pub beta: Vec<f64>,
    pub stats: SolverStats,
}

/// Run the problem against the preferred configuration, falling back to the
/// fixed sequence of alternative configurations when it fails.
///
/// Degenerate statuses (infeasible/unbounded) are logged but returned with
/// whatever values the engine produced; a status that is neither optimal nor
/// degenerate after the whole fallback sequence is left for the caller to
/// surface as a hard error.
pub(crate) fn solve_problem(problem: &QuadProblem, preferred: Solver) -> SolvedProblem {
    solve_with(problem, preferred, run)
}

/// The retry policy behind [solve_problem], with the per-attempt engine call
/// injectable.
fn solve_with<A>(problem: &QuadProblem, preferred: Solver, mut attempt: A) -> SolvedProblem
where
    A: FnMut(&QuadProblem, Solver) -> SolvedProblem,
{
    let mut solved = attempt(problem, preferred);

    if solved.stats.status.needs_retry() {
        log::warn!(
            "{} solver configuration failed with status \"{}\", retrying with fallback configurations",
            preferred,
            solved.stats.status
        );
        for &fallback in FALLBACK_SOLVERS.iter() {
            let retry = attempt(problem, fallback);
            let accepted = retry.stats.status.is_optimal();
            solved = retry;
            if accepted {
                break;
            }
        }
    }

    if solved.stats.status.is_degenerate() {
        log::warn!(
            "optimization problem finished with status \"{}\"",
            solved.stats.status
        );
    }

    solved
}

fn run(problem: &QuadProblem, solver: Solver) -> SolvedProblem {
    let mut engine = DefaultSolver::new(
        &problem.quadratic,
        &problem.linear,
        &problem.constraints,
        &problem.bounds,
        &problem.cones,
        solver.settings(),
    );
    engine.solve();

    let n_model = 1 + problem.n_features;
    SolvedProblem {
        beta: engine.solution.x[..n_model].to_vec(),
        stats: SolverStats {
            status: engine.solution.status.into(),
            iterations: engine.info.iterations,
            solve_time: engine.info.solve_time,
            objective: engine.solution.obj_val,
            solver,
        },
    }
}
