use std::f64::consts::{FRAC_PI_2, PI};

use approx::{assert_abs_diff_eq, assert_relative_eq};
use rstest::rstest;

mod common;

use debris_transfer_calculator::core::PhysicalConstants;
use debris_transfer_calculator::impulsive::biplane::leg_cost;
use debris_transfer_calculator::impulsive::{inclination_split, transfer_cost};
use debris_transfer_calculator::orbits::{OrbitalState, nodal_precession};

fn constants() -> PhysicalConstants {
    PhysicalConstants::default()
}

#[test]
fn precession_matches_reference_value() {
    let c = constants();
    let rate = nodal_precession(&c, 7.0e6, 0.5);
    assert_relative_eq!(rate, -1.275_455_546_227_593_5e-6, max_relative = 1e-9);

    // Equatorial orbit at 7000 km drifts about 7.2 deg/day westward
    let deg_per_day = nodal_precession(&c, 7.0e6, 0.0) * 86_400.0 * 180.0 / PI;
    assert!((deg_per_day + 7.19).abs() < 0.01, "drift = {deg_per_day}");
}

#[rstest]
#[case(6.8e6)]
#[case(7.0e6)]
#[case(4.2e7)]
fn precession_sign_flips_at_polar_inclination(#[case] sma: f64) {
    let c = constants();
    assert!(nodal_precession(&c, sma, FRAC_PI_2 - 1e-6) < 0.0);
    assert!(nodal_precession(&c, sma, FRAC_PI_2 + 1e-6) > 0.0);
    assert_abs_diff_eq!(nodal_precession(&c, sma, FRAC_PI_2), 0.0, epsilon = 1e-20);
    // Retrograde mirror of a prograde orbit drifts the other way at the same rate
    assert_relative_eq!(
        nodal_precession(&c, sma, PI - 0.3),
        -nodal_precession(&c, sma, 0.3),
        max_relative = 1e-12
    );
}

#[test]
fn precession_weakens_with_altitude() {
    let c = constants();
    let low = nodal_precession(&c, 6.8e6, 0.9).abs();
    let high = nodal_precession(&c, 7.5e6, 0.9).abs();
    assert!(low > high);
}

#[test]
fn inclination_split_is_exactly_zero_without_plane_change() {
    assert_eq!(inclination_split(0.0, 7.2e6, 7.0e6), 0.0);
    assert_eq!(inclination_split(0.0, 7.0e6, 7.0e6), 0.0);
    // Tiny but nonzero changes use the formula
    assert_relative_eq!(
        inclination_split(1e-300, 7.2e6, 7.0e6),
        0.489_437_492_788_441_56,
        max_relative = 1e-9
    );
}

#[test]
fn inclination_split_reference_value() {
    assert_relative_eq!(
        inclination_split(0.1, 7.2e6, 7.0e6),
        0.489_428_685_826_004_1,
        max_relative = 1e-9
    );
}

#[test]
fn identical_orbits_cost_nothing() {
    let c = constants();
    let orbit = OrbitalState::new(7.0e6, 0.5, 1.2);
    let cost = transfer_cost((orbit.sma, orbit.incl), &orbit, &orbit, c.mu());
    assert_abs_diff_eq!(cost, 0.0, epsilon = 1e-6);
}

#[test]
fn cost_reference_value() {
    let c = constants();
    let source = OrbitalState::new(7.0e6, 0.5, 0.0);
    let destination = OrbitalState::new(7.1e6, 0.4, 2.0);
    let cost = transfer_cost((7.2e6, 0.6), &source, &destination, c.mu());
    assert_relative_eq!(cost, 2_249.989_317_896_626, max_relative = 1e-9);
}

#[rstest]
#[case((7.2e6, 0.6))]
#[case((6.9e6, 0.45))]
#[case((7.05e6, 0.5))]
fn cost_is_symmetric_in_source_and_destination(#[case] intermediate: (f64, f64)) {
    let mu = constants().mu();
    let a = OrbitalState::new(7.0e6, 0.5, 0.0);
    let b = OrbitalState::new(7.1e6, 0.4, 2.0);
    assert_eq!(
        transfer_cost(intermediate, &a, &b, mu),
        transfer_cost(intermediate, &b, &a, mu)
    );
}

#[test]
fn coplanar_leg_reduces_to_hohmann() {
    let mu = constants().mu();
    let edge = OrbitalState::new(7.0e6, 0.5, 0.3);
    let leg = leg_cost(&edge, 7.2e6, 0.5, mu);
    let (departure, arrival) = common::hohmann_burns(7.0e6, 7.2e6, mu);
    assert_relative_eq!(leg.edge, departure, max_relative = 1e-12);
    assert_relative_eq!(leg.intermediate, arrival, max_relative = 1e-12);
    assert_relative_eq!(leg.total(), 105.537_693_233_695_79, max_relative = 1e-9);
}

#[test]
fn plane_change_adds_cost() {
    let mu = constants().mu();
    let edge = OrbitalState::new(7.0e6, 0.5, 0.0);
    let coplanar = leg_cost(&edge, 7.2e6, 0.5, mu).total();
    let tilted = leg_cost(&edge, 7.2e6, 0.55, mu).total();
    assert!(tilted > coplanar);
}

