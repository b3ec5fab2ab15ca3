//! Head's entrainment method for the turbulent boundary layer.
//!
//! State is (θ, E) with E = Ve·θ·H1. Each step is a fixed point: the RK4
//! step uses the current guess of H and Cf, and the guess is refreshed from
//! the result until H, H1, θ and Cf all stop moving.

use crate::config::BoundaryLayerConfig;

use super::edge::EdgeDistribution;
use super::ode::{rk4_step, OdeSystem};
use super::{BoundaryLayerStation, Profile, RecoveryEvent, RecoveryKind, Regime};

/// H1 below which the layer is treated as separated.
pub const SEPARATION_H1: f64 = 3.3;
/// H1 where the two attached correlations meet.
pub const THIN_LAYER_H1: f64 = 5.39142;
/// Shape factor assigned to separated flow.
pub const SEPARATED_SHAPE_FACTOR: f64 = 3.0;

/// Branch of the H1 → H correlation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeBranch {
    Separated,
    Attached,
    ThinLayer,
}

impl ShapeBranch {
    pub fn classify(h1: f64) -> Self {
        if h1 < SEPARATION_H1 {
            Self::Separated
        } else if h1 < THIN_LAYER_H1 {
            Self::Attached
        } else {
            Self::ThinLayer
        }
    }

    pub fn shape_factor(self, h1: f64) -> f64 {
        match self {
            Self::Separated => SEPARATED_SHAPE_FACTOR,
            Self::Attached => {
                (0.6778 + 1.1536 * (h1 - SEPARATION_H1).powf(-0.326)).min(SEPARATED_SHAPE_FACTOR)
            }
            Self::ThinLayer => 1.1 + 0.86 * (h1 - SEPARATION_H1).powf(-0.777),
        }
    }
}

pub fn shape_factor_from_h1(h1: f64) -> f64 {
    ShapeBranch::classify(h1).shape_factor(h1)
}

pub fn h1_from_shape_factor(h: f64) -> f64 {
    if h <= 1.6 {
        SEPARATION_H1 + 0.8234 * (h - 1.1).powf(-1.287)
    } else {
        SEPARATION_H1 + 1.5501 * (h - 0.6778).powf(-3.064)
    }
}

/// Entrainment coefficient F(H1) = (1/Ve)·d(Ve·θ·H1)/ds.
pub fn entrainment(h1: f64) -> f64 {
    0.0306 * (h1 - 3.0).max(1e-9).powf(-0.6169)
}

/// Ludwieg–Tillmann skin friction.
pub fn skin_friction(shape_factor: f64, reynolds_theta: f64) -> f64 {
    0.246 * 10f64.powf(-0.678 * shape_factor) * reynolds_theta.powf(-0.268)
}

struct EntrainmentSystem<'a> {
    edge: &'a EdgeDistribution,
    /// Edge velocity held fixed with zero gradient, in place of the
    /// distribution.
    held_velocity: Option<f64>,
    shape_factor: f64,
    skin_friction: f64,
}

impl OdeSystem for EntrainmentSystem<'_> {
    type State = [f64; 2];

    fn rhs(&self, s: f64, state: &[f64; 2]) -> [f64; 2] {
        let [theta, e] = *state;
        let (ve, dve) = match self.held_velocity {
            Some(ve) => (ve, 0.0),
            None => (self.edge.velocity_at(s), self.edge.gradient_at(s)),
        };
        let h1 = e / (ve * theta);
        [
            0.5 * self.skin_friction - theta / ve * (2.0 + self.shape_factor) * dve,
            ve * entrainment(h1),
        ]
    }
}

#[derive(Debug, Clone, Copy)]
struct Iterate {
    theta: f64,
    e: f64,
    h1: f64,
    shape_factor: f64,
    skin_friction: f64,
}

impl Iterate {
    fn is_finite(&self) -> bool {
        self.theta > 0.0
            && [self.theta, self.e, self.h1, self.shape_factor, self.skin_friction]
                .iter()
                .all(|v| v.is_finite())
    }

    fn converged_from(&self, previous: &Self, tolerance: f64) -> bool {
        [
            (self.shape_factor, previous.shape_factor),
            (self.h1, previous.h1),
            (self.theta, previous.theta),
            (self.skin_friction, previous.skin_friction),
        ]
        .iter()
        .all(|&(new, old)| (new - old).abs() <= tolerance * old.abs())
    }

    fn station(&self, arc_length: f64, edge_velocity: f64, nu: f64) -> BoundaryLayerStation {
        let displacement_thickness = self.shape_factor * self.theta;
        BoundaryLayerStation {
            arc_length,
            edge_velocity,
            momentum_thickness: self.theta,
            shape_factor: self.shape_factor,
            skin_friction: self.skin_friction,
            displacement_thickness,
            thickness: self.theta * self.h1 + displacement_thickness,
            reynolds_theta: edge_velocity * self.theta / nu,
            reynolds_x: edge_velocity * arc_length / nu,
        }
    }
}

/// One station's fixed point, from `from` to `to`.
#[derive(Clone, Copy)]
struct Step<'a> {
    edge: &'a EdgeDistribution,
    held_velocity: Option<f64>,
    from: f64,
    to: f64,
    end_velocity: f64,
}

struct Solved {
    iterate: Iterate,
    iterations: usize,
    converged: bool,
}

impl Step<'_> {
    /// Err carries the iteration that produced a non-finite iterate.
    fn solve(&self, state: &Iterate, nu: f64, config: &BoundaryLayerConfig) -> Result<Solved, usize> {
        let ve = self.end_velocity;
        let mut guess = *state;
        let mut iterations = 0;
        let mut converged = false;
        for iteration in 1..=config.max_iterations {
            iterations = iteration;
            let system = EntrainmentSystem {
                edge: self.edge,
                held_velocity: self.held_velocity,
                shape_factor: guess.shape_factor,
                skin_friction: guess.skin_friction,
            };
            let [theta, e] = rk4_step(&system, self.from, self.to - self.from, [state.theta, state.e]);
            let h1 = e / (ve * theta);
            let shape_factor = shape_factor_from_h1(h1);
            let next = Iterate {
                theta,
                e,
                h1,
                shape_factor,
                skin_friction: skin_friction(shape_factor, ve * theta / nu),
            };
            if !next.is_finite() {
                return Err(iteration);
            }
            converged = next.converged_from(&guess, config.turbulent_tolerance);
            guess = next;
            if converged {
                break;
            }
        }
        Ok(Solved {
            iterate: guess,
            iterations,
            converged,
        })
    }
}

/// Result of a turbulent march.
#[derive(Debug, Clone)]
pub struct TurbulentMarch {
    pub profile: Profile,
    /// H1 at each profile station.
    pub h1: Vec<f64>,
    /// Fixed-point iterations used per station (0 for the first).
    pub iterations: Vec<usize>,
    /// Station indices are relative to the distribution passed in.
    pub recoveries: Vec<RecoveryEvent>,
}

/// March from `start` (the last laminar station) over `edge`, whose first
/// station coincides with `start`.
pub fn march(
    edge: &EdgeDistribution,
    nu: f64,
    start: &BoundaryLayerStation,
    config: &BoundaryLayerConfig,
) -> TurbulentMarch {
    let s = edge.arc_length();
    let ve = edge.velocity();
    let n = edge.len();

    let mut h1 = h1_from_shape_factor(start.shape_factor);
    if !(h1 >= config.h1_floor) {
        h1 = config.h1_floor;
    }
    let mut state = Iterate {
        theta: start.momentum_thickness,
        e: start.edge_velocity * start.momentum_thickness * h1,
        h1,
        shape_factor: start.shape_factor,
        skin_friction: start.skin_friction,
    };

    let first = BoundaryLayerStation {
        thickness: state.theta * state.h1 + start.displacement_thickness,
        ..*start
    };
    let mut stations = Vec::with_capacity(n);
    stations.push(first);
    let mut h1s = vec![state.h1];
    let mut iterations = vec![0];
    let mut recoveries = Vec::new();

    for i in 1..n {
        let step = Step {
            edge,
            held_velocity: None,
            from: s[i - 1],
            to: s[i],
            end_velocity: ve[i],
        };
        let prev = stations[i - 1];
        let (station, used) = match step.solve(&state, nu, config) {
            Ok(solved) => {
                if !solved.converged {
                    recoveries.push(recover(
                        i,
                        s[i],
                        RecoveryKind::IterationLimit {
                            iterations: solved.iterations,
                        },
                    ));
                }
                log::trace!(
                    "turbulent station {} accepted after {} iterations",
                    i,
                    solved.iterations
                );
                state = solved.iterate;
                h1s.push(state.h1);
                (state.station(s[i], ve[i], nu), solved.iterations)
            }
            Err(used) => {
                recoveries.push(recover(i, s[i], RecoveryKind::NonFinite));
                // Keep θ and E growing over the skipped interval with the edge
                // held at the last accepted velocity
                let held = Step {
                    held_velocity: Some(prev.edge_velocity),
                    end_velocity: prev.edge_velocity,
                    ..step
                };
                if let Ok(solved) = held.solve(&state, nu, config) {
                    state = solved.iterate;
                }
                h1s.push(h1s[i - 1]);
                (prev.carried_to(s[i], nu, Regime::Turbulent), used)
            }
        };

        stations.push(station);
        iterations.push(used);
    }

    TurbulentMarch {
        profile: Profile {
            regime: Regime::Turbulent,
            stations,
        },
        h1: h1s,
        iterations,
        recoveries,
    }
}

fn recover(station: usize, arc_length: f64, kind: RecoveryKind) -> RecoveryEvent {
    match kind {
        RecoveryKind::IterationLimit { iterations } => log::warn!(
            "turbulent station {} (s = {:.5}) unconverged after {} iterations, keeping last iterate",
            station,
            arc_length,
            iterations
        ),
        _ => log::warn!(
            "turbulent station {} (s = {:.5}): {:?}, carrying previous state",
            station,
            arc_length,
            kind
        ),
    }
    RecoveryEvent {
        regime: Regime::Turbulent,
        station,
        arc_length,
        kind,
    }
}
