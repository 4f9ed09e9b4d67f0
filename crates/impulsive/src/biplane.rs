//! Biplane two-impulse transfer cost.
//!
//! A transfer from a source orbit to a destination orbit passes through an intermediate
//! circular orbit. Each leg (edge orbit ↔ intermediate orbit) is a Hohmann ellipse whose
//! two burns also rotate the orbital plane; the plane change of a leg is split between
//! its two burns instead of being done at a single node.

use debris_orbits::{OrbitalState, circular_speed, cosine_rule, vis_viva};

/// Fraction of a leg's plane change performed at the edge-orbit burn.
///
/// `atan(sin Δi / (√((a_int/a_edge)³) + cos Δi)) / Δi`, and exactly `0` when `Δi == 0`.
pub fn inclination_split(delta_incl: f64, intermediate_sma: f64, edge_sma: f64) -> f64 {
    if delta_incl == 0.0 {
        return 0.0;
    }
    let ratio = (intermediate_sma / edge_sma).powi(3).sqrt();
    (delta_incl.sin() / (ratio + delta_incl.cos())).atan() / delta_incl
}

/// Delta-v breakdown of one leg between an edge orbit and the intermediate orbit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LegCost {
    /// Burn on the edge (source or destination) orbit.
    pub edge: f64,
    /// Burn on the intermediate orbit.
    pub intermediate: f64,
}

impl LegCost {
    pub fn total(&self) -> f64 {
        self.edge + self.intermediate
    }
}

/// Cost of one Hohmann leg with a split plane change.
pub fn leg_cost(
    edge: &OrbitalState,
    intermediate_sma: f64,
    intermediate_incl: f64,
    mu: f64,
) -> LegCost {
    let delta_incl = (edge.incl - intermediate_incl).abs();
    let split = inclination_split(delta_incl, intermediate_sma, edge.sma);

    let v_edge = circular_speed(mu, edge.sma);
    let v_intermediate = circular_speed(mu, intermediate_sma);

    let transfer_sma = 0.5 * (edge.sma + intermediate_sma);
    let v_transfer_edge = vis_viva(mu, edge.sma, transfer_sma);
    let v_transfer_intermediate = vis_viva(mu, intermediate_sma, transfer_sma);

    LegCost {
        edge: cosine_rule(v_edge, v_transfer_edge, delta_incl * split),
        intermediate: cosine_rule(
            v_intermediate,
            v_transfer_intermediate,
            delta_incl * (1.0 - split),
        ),
    }
}

/// Total delta-v of source → intermediate → destination (m/s when `mu` is in m³/s²).
///
/// `intermediate` holds the candidate `(sma, incl)`; its RAAN is irrelevant to the cost.
/// The sum of both legs, so the cost is unchanged when source and destination swap.
pub fn transfer_cost(
    intermediate: (f64, f64),
    source: &OrbitalState,
    destination: &OrbitalState,
    mu: f64,
) -> f64 {
    let (sma, incl) = intermediate;
    leg_cost(source, sma, incl, mu).total() + leg_cost(destination, sma, incl, mu).total()
}
