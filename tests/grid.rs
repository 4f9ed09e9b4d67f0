use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use rstest::rstest;

use debris_transfer_calculator::optim::{SolverError, Status};
use debris_transfer_calculator::orbits::OrbitalState;
use debris_transfer_calculator::transfer::{
    Dispatch, GridCoordinate, GridError, GridPointSolver, GridSearch, GridSpec, ResultTable,
    TransferFailure, TransferOutcome, TransferResult,
};

/// Sleeps, then converges on a fixed subset of grid points. The others fail either by
/// running out of iterations or on a singular subproblem.
struct DelayedSolver {
    delay: Duration,
}

fn designed_failure(c: &GridCoordinate) -> Option<TransferFailure> {
    if (c.source + c.destination + c.start_epoch as usize + c.duration as usize) % 3 != 0 {
        None
    } else if c.duration % 2 == 0 {
        Some(TransferFailure::Numerical(SolverError::SingularSubproblem(1)))
    } else {
        Some(TransferFailure::NotConverged {
            status: Status::IterationLimit,
            iterations: 100,
        })
    }
}

fn designed_to_converge(c: &GridCoordinate) -> bool {
    designed_failure(c).is_none()
}

impl GridPointSolver for DelayedSolver {
    fn solve(
        &self,
        _source: &OrbitalState,
        _destination: &OrbitalState,
        coordinate: &GridCoordinate,
    ) -> TransferOutcome {
        thread::sleep(self.delay);
        match designed_failure(coordinate) {
            None => TransferOutcome::Converged(TransferResult {
                sma: 7.0e6 + f64::from(coordinate.duration),
                incl: 0.5,
                cost: f64::from(coordinate.start_epoch),
            }),
            Some(failure) => TransferOutcome::Failed(failure),
        }
    }
}

fn objects(n: usize) -> Vec<OrbitalState> {
    (0..n)
        .map(|i| OrbitalState::new(7.0e6 + 1.0e4 * i as f64, 0.5, 0.1 * i as f64))
        .collect()
}

#[test]
fn durations_stop_at_the_horizon() {
    let spec = GridSpec::new(60, 1, 20);
    let durations: Vec<u32> = spec.durations(45).collect();
    assert_eq!(durations, (1..=15).collect::<Vec<_>>());
    assert_eq!(spec.durations(40).count(), 20);
    assert_eq!(spec.durations(59).collect::<Vec<_>>(), [1]);
    assert_eq!(spec.durations(60).count(), 0);
}

#[test]
fn enumeration_order_and_size() {
    let spec = GridSpec::new(4, 1, 2);
    let coordinates = spec.coordinates(3);
    // Per ordered pair: k=1 -> m=1,2; k=2 -> m=1,2; k=3 -> m=1; k=4 -> none
    assert_eq!(coordinates.len(), 6 * 5);
    assert!(coordinates.iter().all(|c| c.source != c.destination));
    assert!(coordinates.iter().all(|c| c.start_epoch + c.duration <= 4));

    let first: Vec<_> = coordinates[..5]
        .iter()
        .map(|c| (c.source, c.destination, c.start_epoch, c.duration))
        .collect();
    assert_eq!(
        first,
        [(0, 1, 1, 1), (0, 1, 1, 2), (0, 1, 2, 1), (0, 1, 2, 2), (0, 1, 3, 1)]
    );
    assert_eq!(
        (coordinates[5].source, coordinates[5].destination),
        (0, 2)
    );
}

#[test]
fn full_default_grid_size() {
    // Sum over k of min(20, 60 - k) durations, for every ordered pair
    let per_pair: usize = (1..=60u32).map(|k| 20.min(60 - k) as usize).sum();
    assert_eq!(per_pair, 990);
    assert_eq!(GridSpec::new(60, 1, 20).coordinates(4).len(), 12 * per_pair);
}

#[rstest]
#[case(GridSpec::new(60, 1, 20), 4)]
#[case(GridSpec::new(4, 1, 2), 3)]
#[case(GridSpec::new(6, 2, 3), 5)]
#[case(GridSpec::new(10, 1, 3), 1)]
#[case(GridSpec::new(0, 1, 3), 3)]
fn count_matches_enumeration(#[case] spec: GridSpec, #[case] objects: usize) {
    assert_eq!(spec.count(objects), spec.coordinates(objects).len());
}

#[test]
fn single_object_has_no_grid_points() {
    assert!(GridSpec::new(60, 1, 20).coordinates(1).is_empty());
}

#[rstest]
#[case(Dispatch::Serial)]
#[case(Dispatch::Parallel { threads: None })]
#[case(Dispatch::Parallel { threads: Some(1) })]
#[case(Dispatch::Parallel { threads: Some(3) })]
#[case(Dispatch::Parallel { threads: Some(8) })]
fn concurrent_dispatch_stores_every_converged_point(#[case] dispatch: Dispatch) {
    let spec = GridSpec::new(6, 1, 3);
    let objects = objects(4);
    let expected = spec
        .coordinates(objects.len())
        .iter()
        .filter(|c| designed_to_converge(c))
        .count();

    let search = GridSearch::new(
        spec,
        dispatch,
        DelayedSolver {
            delay: Duration::from_millis(1),
        },
    );
    let observed = AtomicUsize::new(0);
    let report = search
        .run_with_observer(
            &objects,
            &AtomicBool::new(false),
            &|_: &GridCoordinate, _: &TransferOutcome| {
                observed.fetch_add(1, Ordering::Relaxed);
            },
        )
        .unwrap();

    assert_eq!(report.total, 12 * 12);
    assert_eq!(report.evaluated, report.total);
    assert_eq!(observed.load(Ordering::Relaxed), report.total);
    assert_eq!(report.converged, expected);
    assert_eq!(report.table.len(), expected);
    assert_eq!(report.failed, report.total - expected);
    assert!(!report.interrupted);

    for (coordinate, result) in report.table.entries() {
        assert!(designed_to_converge(&coordinate));
        assert_eq!(result.cost, f64::from(coordinate.start_epoch));
    }
}

#[rstest]
#[case(Dispatch::Serial)]
#[case(Dispatch::Parallel { threads: Some(4) })]
fn numerical_failures_do_not_stop_the_batch(#[case] dispatch: Dispatch) {
    let spec = GridSpec::new(6, 1, 3);
    let objects = objects(4);
    let coordinates = spec.coordinates(objects.len());
    let singular = coordinates
        .iter()
        .filter(|c| matches!(designed_failure(c), Some(TransferFailure::Numerical(_))))
        .count();
    let failing = coordinates.iter().filter(|c| !designed_to_converge(c)).count();
    assert!(singular > 0 && singular < failing);

    let search = GridSearch::new(
        spec,
        dispatch,
        DelayedSolver {
            delay: Duration::from_millis(1),
        },
    );
    let numerical = AtomicUsize::new(0);
    let converged = AtomicUsize::new(0);
    let report = search
        .run_with_observer(
            &objects,
            &AtomicBool::new(false),
            &|_: &GridCoordinate, outcome: &TransferOutcome| {
                if outcome.is_converged() {
                    converged.fetch_add(1, Ordering::Relaxed);
                }
                if let TransferOutcome::Failed(TransferFailure::Numerical(
                    SolverError::SingularSubproblem(1),
                )) = outcome
                {
                    numerical.fetch_add(1, Ordering::Relaxed);
                }
            },
        )
        .unwrap();

    assert!(!report.interrupted);
    assert_eq!(report.evaluated, coordinates.len());
    assert_eq!(numerical.load(Ordering::Relaxed), singular);
    assert_eq!(report.failed, failing);
    assert_eq!(report.converged, coordinates.len() - failing);
    assert_eq!(converged.load(Ordering::Relaxed), report.converged);
    assert_eq!(report.table.len(), report.converged);
    for coordinate in coordinates.iter().filter(|c| designed_to_converge(c)) {
        assert!(report.table.get(coordinate).is_some(), "{coordinate} missing");
    }
}

#[test]
fn serial_dispatch_keeps_enumeration_order() {
    let spec = GridSpec::new(6, 1, 3);
    let objects = objects(3);
    let search = GridSearch::new(
        spec,
        Dispatch::Serial,
        DelayedSolver {
            delay: Duration::ZERO,
        },
    );
    let report = search.run(&objects, &AtomicBool::new(false)).unwrap();
    let expected: Vec<_> = spec
        .coordinates(objects.len())
        .into_iter()
        .filter(designed_to_converge)
        .collect();
    let stored: Vec<_> = report.table.entries().into_iter().map(|(c, _)| c).collect();
    assert_eq!(stored, expected);

    let rows = report.table.rows();
    assert_eq!(rows.len(), expected.len());
    assert_eq!(rows[0].source, expected[0].source + 1);
    assert_eq!(rows[0].destination, expected[0].destination + 1);
    assert_eq!(rows[0].start_epoch, expected[0].start_epoch);
}

#[test]
fn cancel_stops_serial_run_and_keeps_partial_results() {
    let spec = GridSpec::new(6, 1, 3);
    let objects = objects(3);
    let search = GridSearch::new(
        spec,
        Dispatch::Serial,
        DelayedSolver {
            delay: Duration::ZERO,
        },
    );
    let cancel = AtomicBool::new(false);
    let seen = AtomicUsize::new(0);
    let report = search
        .run_with_observer(
            &objects,
            &cancel,
            &|_: &GridCoordinate, _: &TransferOutcome| {
                if seen.fetch_add(1, Ordering::SeqCst) + 1 == 5 {
                    cancel.store(true, Ordering::SeqCst);
                }
            },
        )
        .unwrap();

    assert!(report.interrupted);
    assert_eq!(report.evaluated, 5);
    assert_eq!(report.converged + report.failed, 5);
    assert_eq!(report.table.len(), report.converged);
}

#[rstest]
#[case(Dispatch::Serial)]
#[case(Dispatch::Parallel { threads: Some(4) })]
fn raised_cancel_flag_skips_everything(#[case] dispatch: Dispatch) {
    let search = GridSearch::new(
        GridSpec::new(6, 1, 3),
        dispatch,
        DelayedSolver {
            delay: Duration::from_millis(1),
        },
    );
    let report = search.run(&objects(3), &AtomicBool::new(true)).unwrap();
    assert!(report.interrupted);
    assert_eq!(report.evaluated, 0);
    assert!(report.table.is_empty());
}

#[test]
fn parallel_cancel_mid_run_evaluates_a_subset() {
    let search = GridSearch::new(
        GridSpec::new(6, 1, 3),
        Dispatch::Parallel { threads: Some(2) },
        DelayedSolver {
            delay: Duration::from_millis(2),
        },
    );
    let cancel = AtomicBool::new(false);
    let report = search
        .run_with_observer(
            &objects(4),
            &cancel,
            &|_: &GridCoordinate, _: &TransferOutcome| cancel.store(true, Ordering::SeqCst),
        )
        .unwrap();
    assert!(report.interrupted);
    assert!(report.evaluated >= 1 && report.evaluated < report.total);
    assert_eq!(report.table.len(), report.converged);
}

#[test]
fn result_table_rejects_duplicates() {
    let table = ResultTable::new();
    let coordinate = GridCoordinate {
        source: 0,
        destination: 1,
        start_epoch: 1,
        duration: 2,
    };
    let result = TransferResult {
        sma: 7.0e6,
        incl: 0.5,
        cost: 10.0,
    };
    table.insert(coordinate, result).unwrap();
    let err = table
        .insert(coordinate, TransferResult { cost: 20.0, ..result })
        .unwrap_err();
    assert!(matches!(err, GridError::DuplicateCoordinate(c) if c == coordinate));
    assert_eq!(table.len(), 1);
    assert_eq!(table.get(&coordinate), Some(result));
}
