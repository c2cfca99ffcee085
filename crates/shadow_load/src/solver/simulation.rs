use std::sync::Arc;

use jiff::{SignedDuration, Timestamp};
use rand::{SeedableRng, rngs::SmallRng};
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use serde::Serialize;
use thiserror::Error;
use tracing::{Level, debug, instrument};

use crate::{
    problem::{standstill::Standstill, vehicle_routing_problem::VehicleRoutingProblem},
    timer_debug,
};

use super::{
    moves::{Move, MoveError, MoveKind},
    notifier::{BracketChecker, BracketViolation, Field, NoopNotifier},
    propagator::PassStats,
    working_solution::{AuditError, SolutionSummary, WorkingSolution},
};

#[derive(Clone, Debug)]
pub struct SimulationParams {
    /// Random moves applied by each worker.
    pub iterations: usize,
    pub seed: u64,
    /// Moves between two full audits. Zero only audits the final state.
    pub audit_interval: usize,
    /// Stops a worker early once this much wall time has passed.
    pub termination: Option<SignedDuration>,
    pub workers: usize,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            iterations: 10_000,
            seed: 2427121,
            audit_interval: 1000,
            termination: None,
            workers: 1,
        }
    }
}

#[derive(Error, Debug)]
pub enum SimulationError {
    #[error("worker {worker}: move {iteration} ({applied}) failed")]
    Move {
        worker: usize,
        iteration: usize,
        applied: Move,
        #[source]
        source: MoveError,
    },
    #[error("worker {worker}: audit after {iteration} moves failed")]
    Audit {
        worker: usize,
        iteration: usize,
        #[source]
        source: AuditError,
    },
    #[error("worker {worker}: unbalanced notifications at move {iteration}: {violation:?}")]
    Notifications {
        worker: usize,
        iteration: usize,
        violation: BracketViolation,
    },
    #[error(transparent)]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

#[derive(Serialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MoveCounts {
    pub insert: usize,
    pub unassign: usize,
    pub relocate: usize,
    pub swap_tails: usize,
}

impl MoveCounts {
    pub fn record(&mut self, kind: MoveKind) {
        *self.count_mut(kind) += 1;
    }

    pub fn get(&self, kind: MoveKind) -> usize {
        match kind {
            MoveKind::Insert => self.insert,
            MoveKind::Unassign => self.unassign,
            MoveKind::Relocate => self.relocate,
            MoveKind::SwapTails => self.swap_tails,
        }
    }

    pub fn total(&self) -> usize {
        MoveKind::ALL.into_iter().map(|kind| self.get(kind)).sum()
    }

    fn count_mut(&mut self, kind: MoveKind) -> &mut usize {
        match kind {
            MoveKind::Insert => &mut self.insert,
            MoveKind::Unassign => &mut self.unassign,
            MoveKind::Relocate => &mut self.relocate,
            MoveKind::SwapTails => &mut self.swap_tails,
        }
    }
}

/// What one worker did, and the solution it ended with.
#[derive(Serialize, Debug, Clone)]
pub struct SimulationReport {
    pub worker: usize,
    pub seed: u64,
    pub moves: MoveCounts,
    pub stats: PassStats,
    pub vehicle_notifications: usize,
    pub demand_notifications: usize,
    pub audits: usize,
    pub elapsed: SignedDuration,
    pub summary: SolutionSummary,
}

/// Links every stop round-robin over the vehicles, each at the end of its
/// chain.
pub fn initial_solution(
    problem: Arc<VehicleRoutingProblem>,
) -> Result<WorkingSolution, SimulationError> {
    let mut solution = WorkingSolution::new(problem);
    let mut tails = solution
        .problem()
        .vehicle_ids()
        .map(Standstill::Vehicle)
        .collect::<Vec<_>>();

    if tails.is_empty() {
        return Ok(solution);
    }

    for (iteration, stop) in solution.problem().stop_ids().enumerate() {
        let index = iteration % tails.len();
        let tail = &mut tails[index];
        let applied = Move::Insert { stop, after: *tail };

        solution
            .apply(&applied, NoopNotifier)
            .map_err(|source| SimulationError::Move {
                worker: 0,
                iteration,
                applied,
                source,
            })?;
        *tail = Standstill::Stop(stop);
    }

    Ok(solution)
}

/// Runs `params.workers` independent random walks from the same initial
/// solution. Reports are ordered by worker.
#[instrument(skip_all, level = Level::DEBUG, fields(problem = problem.name()))]
pub fn simulate(
    problem: Arc<VehicleRoutingProblem>,
    params: &SimulationParams,
) -> Result<Vec<SimulationReport>, SimulationError> {
    let initial = timer_debug!("Built initial solution", initial_solution(problem))?;
    initial
        .audit()
        .map_err(|source| SimulationError::Audit {
            worker: 0,
            iteration: 0,
            source,
        })?;

    let workers = params.workers.max(1);
    let thread_pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|index| format!("worker-{index}"))
        .build()?;

    thread_pool.install(|| {
        (0..workers)
            .into_par_iter()
            .map(|worker| run_worker(initial.clone(), params, worker))
            .collect()
    })
}

/// Applies random moves to `solution`, auditing every
/// `params.audit_interval` moves and once at the end.
pub fn run_worker(
    mut solution: WorkingSolution,
    params: &SimulationParams,
    worker: usize,
) -> Result<SimulationReport, SimulationError> {
    let seed = params.seed.wrapping_add(worker as u64);
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut checker = BracketChecker::new(NoopNotifier);
    let mut moves = MoveCounts::default();
    let mut stats = PassStats::default();
    let mut audits = 0;
    let start = Timestamp::now();

    for iteration in 0..params.iterations {
        if let Some(termination) = params.termination
            && Timestamp::now().duration_since(start) > termination
        {
            debug!(worker, iteration, "Termination duration reached");
            break;
        }

        let Some(applied) = Move::random(solution.problem(), solution.chains(), &mut rng) else {
            debug!(worker, iteration, "No move available");
            break;
        };

        let pass = solution
            .apply(&applied, &mut checker)
            .map_err(|source| SimulationError::Move {
                worker,
                iteration,
                applied,
                source,
            })?;

        if let Some(&violation) = checker.violations().first() {
            return Err(SimulationError::Notifications {
                worker,
                iteration,
                violation,
            });
        }

        moves.record(applied.kind());
        stats.merge(pass);

        if params.audit_interval > 0 && (iteration + 1) % params.audit_interval == 0 {
            audit(&solution, worker, iteration + 1)?;
            audits += 1;
        }
    }

    audit(&solution, worker, moves.total())?;
    audits += 1;

    let elapsed = Timestamp::now().duration_since(start);

    debug!(
        worker,
        moves = moves.total(),
        steps = stats.steps,
        transfers = stats.transfers,
        audits,
        elapsed = ?elapsed,
        "Worker finished"
    );

    Ok(SimulationReport {
        worker,
        seed,
        moves,
        stats,
        vehicle_notifications: checker.pairs(Field::Vehicle),
        demand_notifications: checker.pairs(Field::CurrentDemand),
        audits,
        elapsed,
        summary: solution.summary(),
    })
}

fn audit(
    solution: &WorkingSolution,
    worker: usize,
    iteration: usize,
) -> Result<(), SimulationError> {
    solution.audit().map_err(|source| SimulationError::Audit {
        worker,
        iteration,
        source,
    })
}

#[cfg(test)]
mod tests {
    use crate::test_utils::{build_problem, v};

    use super::*;

    #[test]
    fn test_initial_solution_is_round_robin() {
        let problem = Arc::new(build_problem(&[10, 10], &[1, 2, 3, 4, 5]));

        let solution = initial_solution(problem).unwrap();

        assert_eq!(solution.chains().chain_len(v(0)), 3);
        assert_eq!(solution.chains().chain_len(v(1)), 2);
        assert_eq!(solution.current_demand(v(0)), 9);
        assert_eq!(solution.current_demand(v(1)), 6);
        assert_eq!(solution.audit(), Ok(()));
    }

    #[test]
    fn test_simulate() {
        let problem = Arc::new(build_problem(&[10, 10, 10], &[1, 2, 3, 4, 5, 6, 7, 8]));
        let params = SimulationParams {
            iterations: 2000,
            audit_interval: 100,
            ..SimulationParams::default()
        };

        let reports = simulate(problem, &params).unwrap();

        assert_eq!(reports.len(), 1);
        let report = &reports[0];
        assert_eq!(report.moves.total(), 2000);
        assert_eq!(report.audits, 21);
        assert!(report.stats.steps > 0);
        // One stop bracket per walk step
        assert_eq!(report.vehicle_notifications, report.stats.steps);
        assert_eq!(report.summary.total_demand + unassigned_demand(report), 36);
    }

    fn unassigned_demand(report: &SimulationReport) -> i64 {
        // External ids are 1-based and demands equal the external id here
        report.summary.unassigned.iter().map(|&id| id as i64).sum()
    }

    #[test]
    fn test_workers_are_independent_and_reproducible() {
        let problem = Arc::new(build_problem(&[6, 6], &[1, 2, 3, 4]));
        let params = SimulationParams {
            iterations: 300,
            audit_interval: 50,
            workers: 3,
            ..SimulationParams::default()
        };

        let first = simulate(problem.clone(), &params).unwrap();
        let second = simulate(problem, &params).unwrap();

        assert_eq!(first.len(), 3);
        for (a, b) in first.iter().zip(&second) {
            assert_eq!(a.worker, b.worker);
            assert_eq!(a.seed, params.seed + a.worker as u64);
            assert_eq!(a.moves, b.moves);
            assert_eq!(a.stats, b.stats);
            assert_eq!(a.summary, b.summary);
        }
    }

    #[test]
    fn test_termination_duration() {
        let problem = Arc::new(build_problem(&[10], &[1, 2, 3]));
        let params = SimulationParams {
            iterations: usize::MAX,
            termination: Some(SignedDuration::from_millis(50)),
            audit_interval: 0,
            ..SimulationParams::default()
        };

        let reports = simulate(problem, &params).unwrap();

        assert!(reports[0].moves.total() > 0);
        assert_eq!(reports[0].audits, 1);
    }
}
