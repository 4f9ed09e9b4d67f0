//! Exhaustive search over (source, destination, start epoch, duration) and aggregation of
//! the converged transfers.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use debris_config::RunConfig;
use debris_export::table::Row;
use debris_optim::{Minimizer, Sqp};
use debris_orbits::OrbitalState;
use log::{debug, info, warn};
use rayon::prelude::*;
use thiserror::Error;

use super::optimizer::{TransferOptimizer, TransferOutcome, TransferResult};

/// Index of one grid point. Object indices are zero-based positions in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridCoordinate {
    pub source: usize,
    pub destination: usize,
    /// Departure epoch `k`, in `1..=epochs`.
    pub start_epoch: u32,
    /// Transfer duration `m` (epochs).
    pub duration: u32,
}

impl fmt::Display for GridCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "i={} j={} k={} m={}",
            self.source, self.destination, self.start_epoch, self.duration
        )
    }
}

/// Shape of the time grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridSpec {
    pub epochs: u32,
    pub transfer_min: u32,
    pub transfer_max: u32,
}

impl GridSpec {
    pub fn new(epochs: u32, transfer_min: u32, transfer_max: u32) -> Self {
        Self {
            epochs,
            transfer_min,
            transfer_max,
        }
    }

    pub fn from_config(config: &RunConfig) -> Self {
        Self::new(config.epochs, config.transfer_min, config.transfer_max)
    }

    /// Durations tried when leaving at `start_epoch`: increasing from `transfer_min`, and
    /// stopping at the first one that would end past the horizon.
    pub fn durations(&self, start_epoch: u32) -> impl Iterator<Item = u32> + '_ {
        (self.transfer_min..=self.transfer_max)
            .take_while(move |m| start_epoch.saturating_add(*m) <= self.epochs)
    }

    /// Number of grid points for a catalog of `objects` entries, without enumerating them.
    pub fn count(&self, objects: usize) -> usize {
        let per_pair: usize = (1..=self.epochs).map(|k| self.durations(k).count()).sum();
        objects * objects.saturating_sub(1) * per_pair
    }

    /// Every grid point for a catalog of `objects` entries, in enumeration order
    /// (source, destination, start epoch, duration). Self-transfers are skipped.
    pub fn coordinates(&self, objects: usize) -> Vec<GridCoordinate> {
        let mut coordinates = Vec::with_capacity(self.count(objects));
        for source in 0..objects {
            for destination in (0..objects).filter(|&d| d != source) {
                for start_epoch in 1..=self.epochs {
                    coordinates.extend(self.durations(start_epoch).map(|duration| {
                        GridCoordinate {
                            source,
                            destination,
                            start_epoch,
                            duration,
                        }
                    }));
                }
            }
        }
        coordinates
    }
}

/// Anything that can turn one grid point into a [`TransferOutcome`].
pub trait GridPointSolver: Sync {
    fn solve(
        &self,
        source: &OrbitalState,
        destination: &OrbitalState,
        coordinate: &GridCoordinate,
    ) -> TransferOutcome;
}

impl<M: Minimizer + Sync> GridPointSolver for TransferOptimizer<M> {
    fn solve(
        &self,
        source: &OrbitalState,
        destination: &OrbitalState,
        coordinate: &GridCoordinate,
    ) -> TransferOutcome {
        self.optimize(
            source,
            destination,
            coordinate.start_epoch,
            coordinate.duration,
        )
    }
}

#[derive(Debug, Error)]
pub enum GridError {
    #[error("grid point {0} was recorded twice")]
    DuplicateCoordinate(GridCoordinate),
    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

#[derive(Debug, Default)]
struct TableInner {
    rows: Vec<(GridCoordinate, TransferResult)>,
    index: HashMap<GridCoordinate, usize>,
}

/// Converged transfers keyed by grid coordinate, kept in insertion order.
///
/// Safe to fill from many workers at once; each coordinate may be written only once.
#[derive(Debug, Default)]
pub struct ResultTable {
    inner: Mutex<TableInner>,
}

impl ResultTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &self,
        coordinate: GridCoordinate,
        result: TransferResult,
    ) -> Result<(), GridError> {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if inner.index.contains_key(&coordinate) {
            return Err(GridError::DuplicateCoordinate(coordinate));
        }
        let position = inner.rows.len();
        inner.rows.push((coordinate, result));
        inner.index.insert(coordinate, position);
        Ok(())
    }

    pub fn get(&self, coordinate: &GridCoordinate) -> Option<TransferResult> {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.index.get(coordinate).map(|&i| inner.rows[i].1)
    }

    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .rows
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the table in insertion order.
    pub fn entries(&self) -> Vec<(GridCoordinate, TransferResult)> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .rows
            .clone()
    }

    /// Output rows in insertion order, with one-based object indices.
    pub fn rows(&self) -> Vec<Row> {
        self.entries()
            .into_iter()
            .map(|(c, r)| Row {
                source: c.source + 1,
                destination: c.destination + 1,
                start_epoch: c.start_epoch,
                duration: c.duration,
                sma: r.sma,
                incl: r.incl,
                cost: r.cost,
            })
            .collect()
    }
}

/// How grid points are dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// One after another, in enumeration order.
    Serial,
    /// On a rayon pool; `threads` sizes a dedicated pool, `None` uses the global one.
    Parallel { threads: Option<usize> },
}

impl Dispatch {
    pub fn from_config(config: &RunConfig) -> Self {
        if config.parallel {
            Dispatch::Parallel {
                threads: config.threads,
            }
        } else {
            Dispatch::Serial
        }
    }
}

/// Results and counters of one grid run.
#[derive(Debug)]
pub struct GridReport {
    pub table: ResultTable,
    /// Grid points enumerated.
    pub total: usize,
    /// Grid points actually handed to the solver.
    pub evaluated: usize,
    pub converged: usize,
    pub failed: usize,
    /// The cancel flag stopped the run before every point was evaluated.
    pub interrupted: bool,
    pub elapsed: Duration,
}

/// Runs a [`GridPointSolver`] over every grid point of a catalog.
#[derive(Debug, Clone)]
pub struct GridSearch<S> {
    spec: GridSpec,
    dispatch: Dispatch,
    solver: S,
}

impl GridSearch<TransferOptimizer<Sqp>> {
    /// Grid search driving the SQP transfer optimizer as configured.
    pub fn from_config(config: &RunConfig) -> Self {
        Self::new(
            GridSpec::from_config(config),
            Dispatch::from_config(config),
            TransferOptimizer::from_config(config),
        )
    }
}

impl<S: GridPointSolver> GridSearch<S> {
    pub fn new(spec: GridSpec, dispatch: Dispatch, solver: S) -> Self {
        Self {
            spec,
            dispatch,
            solver,
        }
    }

    pub fn spec(&self) -> &GridSpec {
        &self.spec
    }

    pub fn solver(&self) -> &S {
        &self.solver
    }

    pub fn run(
        &self,
        objects: &[OrbitalState],
        cancel: &AtomicBool,
    ) -> Result<GridReport, GridError> {
        self.run_with_observer(objects, cancel, &|_: &GridCoordinate, _: &TransferOutcome| {})
    }

    /// Evaluate every grid point, calling `observer` once per evaluated point (from the
    /// worker that evaluated it). Points not yet started when `cancel` is raised are
    /// skipped.
    pub fn run_with_observer(
        &self,
        objects: &[OrbitalState],
        cancel: &AtomicBool,
        observer: &(dyn Fn(&GridCoordinate, &TransferOutcome) + Sync),
    ) -> Result<GridReport, GridError> {
        let coordinates = self.spec.coordinates(objects.len());
        let table = ResultTable::new();
        let evaluated = AtomicUsize::new(0);
        let failed = AtomicUsize::new(0);
        let started = Instant::now();

        info!(
            "grid search over {} objects: {} grid points ({:?})",
            objects.len(),
            coordinates.len(),
            self.dispatch
        );

        let visit = |coordinate: &GridCoordinate| -> Result<(), GridError> {
            if cancel.load(Ordering::Relaxed) {
                return Ok(());
            }
            let outcome = self.solver.solve(
                &objects[coordinate.source],
                &objects[coordinate.destination],
                coordinate,
            );
            evaluated.fetch_add(1, Ordering::Relaxed);
            observer(coordinate, &outcome);
            match outcome {
                TransferOutcome::Converged(result) => {
                    debug!(
                        "{} : sma={}, incl={}, cost={}",
                        coordinate, result.sma, result.incl, result.cost
                    );
                    table.insert(*coordinate, result)?;
                }
                TransferOutcome::Failed(failure) => {
                    failed.fetch_add(1, Ordering::Relaxed);
                    warn!("{} : {}", coordinate, failure);
                }
            }
            Ok(())
        };

        match self.dispatch {
            Dispatch::Serial => coordinates.iter().try_for_each(&visit)?,
            Dispatch::Parallel { threads: None } => coordinates.par_iter().try_for_each(&visit)?,
            Dispatch::Parallel {
                threads: Some(threads),
            } => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()?;
                pool.install(|| coordinates.par_iter().try_for_each(&visit))?
            }
        }

        let evaluated = evaluated.into_inner();
        let failed = failed.into_inner();
        let report = GridReport {
            converged: table.len(),
            table,
            total: coordinates.len(),
            evaluated,
            failed,
            interrupted: evaluated < coordinates.len(),
            elapsed: started.elapsed(),
        };
        info!(
            "grid search finished in {:.1}s: {} evaluated, {} converged, {} failed{}",
            report.elapsed.as_secs_f64(),
            report.evaluated,
            report.converged,
            report.failed,
            if report.interrupted { " (interrupted)" } else { "" }
        );
        Ok(report)
    }
}
