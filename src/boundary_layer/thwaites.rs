//! Thwaites' laminar integral method.
//!
//! The momentum integral is carried as y = θ²·Ve⁶, for which
//! dy/ds = 0.45·ν·Ve⁵. θ then follows from y and the local edge velocity,
//! and the pressure-gradient parameter λ = θ²·(dVe/ds)/ν selects the shape
//! factor and wall shear from Thwaites' correlations.

use crate::config::{BoundaryLayerConfig, TransitionRule};

use super::edge::EdgeDistribution;
use super::ode::{rk4_step, OdeSystem};
use super::{
    BoundaryLayerStation, Profile, RecoveryEvent, RecoveryKind, Regime, TransitionCause,
    TransitionPoint, TransitionState,
};

/// Shape factor where the two λ branches meet.
pub const SHAPE_FACTOR_AT_ZERO_LAMBDA: f64 = 2.088 + 0.0731 / 0.14;

/// Most negative λ above which both correlations stay finite: ℓ(λ) has its
/// pole at -0.107 and H(λ) at -0.14.
pub const MIN_SEPARATION_LAMBDA: f64 = -0.107;

/// Shape factor H(λ), never negative.
pub fn shape_factor(lambda: f64) -> f64 {
    let h = if lambda <= 0.0 {
        2.088 + 0.0731 / (lambda + 0.14)
    } else {
        SHAPE_FACTOR_AT_ZERO_LAMBDA - 3.75 * lambda + 5.24 * lambda * lambda
    };
    h.max(0.0)
}

/// Shear correlation ℓ(λ).
pub fn shear_parameter(lambda: f64) -> f64 {
    if lambda <= 0.0 {
        0.22 + 1.402 * lambda + 0.018 * lambda / (lambda + 0.107)
    } else {
        0.22 + 1.57 * lambda - 1.8 * lambda * lambda
    }
}

pub fn skin_friction(lambda: f64, reynolds_theta: f64) -> f64 {
    (2.0 * shear_parameter(lambda) / reynolds_theta).abs()
}

/// Blasius-like thickness δ = 5.2·s/√Re_s.
pub fn laminar_thickness(arc_length: f64, reynolds_x: f64) -> f64 {
    5.2 * arc_length / reynolds_x.sqrt()
}

/// Michel's transition threshold on Re_θ at a given Re_x.
pub fn michel_threshold(reynolds_x: f64) -> f64 {
    1.174 * (1.0 + 22400.0 / reynolds_x) * reynolds_x.powf(0.46)
}

struct MomentumIntegral<'a> {
    edge: &'a EdgeDistribution,
    nu: f64,
}

impl OdeSystem for MomentumIntegral<'_> {
    type State = f64;

    fn rhs(&self, s: f64, _y: &f64) -> f64 {
        0.45 * self.nu * self.edge.velocity_at(s).powi(5)
    }
}

impl MomentumIntegral<'_> {
    /// Growth of y over `h` at a constant edge velocity.
    fn held_growth(&self, edge_velocity: f64, h: f64) -> f64 {
        0.45 * self.nu * edge_velocity.powi(5) * h
    }
}

fn station(arc_length: f64, edge_velocity: f64, theta: f64, lambda: f64, nu: f64) -> BoundaryLayerStation {
    let shape_factor = shape_factor(lambda);
    let reynolds_theta = edge_velocity * theta / nu;
    let reynolds_x = edge_velocity * arc_length / nu;
    BoundaryLayerStation {
        arc_length,
        edge_velocity,
        momentum_thickness: theta,
        shape_factor,
        skin_friction: skin_friction(lambda, reynolds_theta),
        displacement_thickness: shape_factor * theta,
        thickness: laminar_thickness(arc_length, reynolds_x),
        reynolds_theta,
        reynolds_x,
    }
}

/// Result of a laminar march.
#[derive(Debug, Clone)]
pub struct LaminarMarch {
    /// Stations up to and including the transition station.
    pub profile: Profile,
    /// λ at each profile station.
    pub lambda: Vec<f64>,
    pub transition: TransitionState,
    pub recoveries: Vec<RecoveryEvent>,
}

/// March from the first station until laminar separation, Michel
/// transition (when enabled) or the end of the distribution.
pub fn march(edge: &EdgeDistribution, nu: f64, config: &BoundaryLayerConfig) -> LaminarMarch {
    let s = edge.arc_length();
    let ve = edge.velocity();
    let dve = edge.gradient();
    let n = edge.len();
    let integral = MomentumIntegral { edge, nu };

    let theta0 = config.initial_momentum_thickness;
    let mut y = theta0 * theta0 * ve[0].powi(6);

    let mut stations: Vec<BoundaryLayerStation> = Vec::with_capacity(n);
    let mut lambdas: Vec<f64> = Vec::with_capacity(n);
    let mut recoveries = Vec::new();
    let mut transition = TransitionState::FullyLaminar;

    for i in 0..n {
        let (current, lambda) = if i == 0 {
            let mut lambda = theta0 * theta0 * dve[0] / nu;
            if !lambda.is_finite() {
                recoveries.push(recover(0, s[0], RecoveryKind::NonFinite));
                lambda = 0.0;
            }
            (station(s[0], ve[0], theta0, lambda, nu), lambda)
        } else {
            let prev = &stations[i - 1];
            let prev_lambda = lambdas[i - 1];
            let candidate_y = rk4_step(&integral, s[i - 1], s[i] - s[i - 1], y);
            let theta = (candidate_y / ve[i].powi(6)).sqrt();
            let lambda = theta * theta * dve[i] / nu;
            let candidate = station(s[i], ve[i], theta, lambda, nu);

            let failure = if !(candidate.is_finite() && theta > 0.0 && lambda.is_finite()) {
                Some(RecoveryKind::NonFinite)
            } else {
                let relative_change =
                    ((candidate.shape_factor - prev.shape_factor) / prev.shape_factor).abs();
                (relative_change > config.laminar_jump_tolerance)
                    .then_some(RecoveryKind::ExcessiveJump { relative_change })
            };

            match failure {
                Some(kind) => {
                    recoveries.push(recover(i, s[i], kind));
                    // y still has to reach s[i]; without a usable step, hold the
                    // edge at the last accepted velocity over the interval
                    y = if candidate_y.is_finite() && candidate_y > 0.0 {
                        candidate_y
                    } else {
                        y + integral.held_growth(prev.edge_velocity, s[i] - s[i - 1])
                    };
                    (prev.carried_to(s[i], nu, Regime::Laminar), prev_lambda)
                }
                None => {
                    y = candidate_y;
                    (candidate, lambda)
                }
            }
        };

        stations.push(current);
        lambdas.push(lambda);

        if lambda < config.separation_lambda {
            log::debug!("laminar separation at s = {:.5} (λ = {:.4})", s[i], lambda);
            // The separated station is outside the correlation's range
            let last_valid = if i > 0 {
                stations.pop();
                lambdas.pop();
                i - 1
            } else {
                i
            };
            transition = TransitionState::Transitioned(TransitionPoint {
                arc_length: s[last_valid],
                station: last_valid,
                cause: TransitionCause::LaminarSeparation { lambda },
            });
            break;
        }
        if config.transition_rule == TransitionRule::Michel && i > 0 {
            let threshold = michel_threshold(current.reynolds_x);
            if current.reynolds_theta > threshold {
                log::debug!(
                    "Michel transition at s = {:.5} (Re_θ = {:.1}, threshold {:.1})",
                    s[i],
                    current.reynolds_theta,
                    threshold
                );
                transition = TransitionState::Transitioned(TransitionPoint {
                    arc_length: s[i],
                    station: i,
                    cause: TransitionCause::Michel {
                        reynolds_theta: current.reynolds_theta,
                        threshold,
                    },
                });
                break;
            }
        }
    }

    LaminarMarch {
        profile: Profile {
            regime: Regime::Laminar,
            stations,
        },
        lambda: lambdas,
        transition,
        recoveries,
    }
}

fn recover(station: usize, arc_length: f64, kind: RecoveryKind) -> RecoveryEvent {
    log::warn!(
        "laminar station {} (s = {:.5}): {:?}, carrying previous state",
        station,
        arc_length,
        kind
    );
    RecoveryEvent {
        regime: Regime::Laminar,
        station,
        arc_length,
        kind,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    fn laminar_only() -> BoundaryLayerConfig {
        BoundaryLayerConfig {
            transition_rule: TransitionRule::LaminarSeparation,
            ..BoundaryLayerConfig::default()
        }
    }

    #[test]
    fn correlation_branches_meet_at_zero_lambda() {
        let eps = 1e-12;
        assert_abs_diff_eq!(shape_factor(-eps), shape_factor(eps), epsilon = 1e-10);
        assert_abs_diff_eq!(shape_factor(0.0), SHAPE_FACTOR_AT_ZERO_LAMBDA);
        assert_abs_diff_eq!(shear_parameter(-eps), shear_parameter(eps), epsilon = 1e-10);
        assert_abs_diff_eq!(shear_parameter(0.0), 0.22);
    }

    #[test]
    fn shape_factor_is_clamped() {
        // 2.088 + 0.0731/(λ + 0.14) dips below zero just past λ = -0.14
        assert_eq!(shape_factor(-0.15), 0.0);
        assert!(shape_factor(-0.09) > 3.5);
    }

    #[test]
    fn flat_plate_momentum_thickness_is_exact() {
        let s: Vec<f64> = (1..=100).map(|i| 0.01 * i as f64).collect();
        let edge = EdgeDistribution::new(s.clone(), vec![1.0; 100]).unwrap();
        let config = BoundaryLayerConfig {
            initial_momentum_thickness: 1e-6,
            ..laminar_only()
        };
        let nu = 1e-6;
        let result = march(&edge, nu, &config);

        assert_eq!(result.transition, TransitionState::FullyLaminar);
        assert_eq!(result.profile.len(), 100);
        assert!(result.recoveries.is_empty());
        for station in &result.profile.stations {
            let expected = (1e-12 + 0.45 * nu * (station.arc_length - s[0])).sqrt();
            assert_relative_eq!(station.momentum_thickness, expected, max_relative = 1e-10);
            assert_abs_diff_eq!(station.shape_factor, SHAPE_FACTOR_AT_ZERO_LAMBDA);
        }
    }

    #[test]
    fn howarth_flow_separates() {
        // Linearly retarded edge velocity Ve = 1 - s
        let n = 601;
        let s: Vec<f64> = (0..n)
            .map(|i| 1e-4 + i as f64 * (0.3 - 1e-4) / (n - 1) as f64)
            .collect();
        let ve: Vec<f64> = s.iter().map(|x| 1.0 - x).collect();
        let edge = EdgeDistribution::new(s, ve).unwrap();
        let config = BoundaryLayerConfig {
            initial_momentum_thickness: 1e-8,
            ..laminar_only()
        };
        let result = march(&edge, 1e-5, &config);

        let point = result.transition.point().unwrap();
        assert!(point.arc_length > 0.115 && point.arc_length < 0.13);
        match point.cause {
            TransitionCause::LaminarSeparation { lambda } => assert!(lambda < -0.09),
            other => panic!("unexpected cause {:?}", other),
        }
        assert_eq!(result.profile.len(), point.station + 1);
        assert_eq!(result.profile.last().unwrap().arc_length, point.arc_length);
        // The separating station itself is not kept
        assert!(result.lambda.iter().all(|&l| l >= config.separation_lambda));
        assert!(point.arc_length < edge.arc_length()[point.station + 1]);
    }

    #[test]
    fn michel_criterion_on_flat_plate() {
        let s: Vec<f64> = (1..=300).map(|i| 0.01 * i as f64).collect();
        let edge = EdgeDistribution::new(s, vec![1.0; 300]).unwrap();
        let nu = 1e-6;
        let result = march(&edge, nu, &BoundaryLayerConfig::default());

        let point = result.transition.point().unwrap();
        assert!(matches!(point.cause, TransitionCause::Michel { .. }));
        let reynolds_x = point.arc_length / nu;
        assert!(reynolds_x > 1e6 && reynolds_x < 3e6);
    }

    #[test]
    fn non_finite_edge_velocity_is_recovered() {
        let mut ve = vec![1.0; 40];
        ve[20] = f64::NAN;
        let s: Vec<f64> = (1..=40).map(|i| 0.01 * i as f64).collect();
        let edge = EdgeDistribution::new(s.clone(), ve).unwrap();
        let result = march(&edge, 1e-5, &laminar_only());

        assert_eq!(result.profile.len(), 40);
        assert!(result.profile.stations.iter().all(|st| st.is_finite()));
        assert!(!result.recoveries.is_empty());
        assert!(result
            .recoveries
            .iter()
            .all(|e| e.regime == Regime::Laminar && e.kind == RecoveryKind::NonFinite));
        assert!(result.recoveries.iter().any(|e| e.station == 20));

        let recovered = &result.profile.stations[20];
        assert_eq!(recovered.arc_length, s[20]);
        assert_eq!(
            recovered.momentum_thickness,
            result.profile.stations[19].momentum_thickness
        );
        // Arc lengths stay monotonic through the recovery
        let arcs = result.profile.arc_lengths();
        assert!(arcs.windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn recovered_station_keeps_downstream_growth() {
        let s: Vec<f64> = (1..=40).map(|i| 0.01 * i as f64).collect();
        let ve: Vec<f64> = s.iter().map(|x| 1.0 + 0.5 * x).collect();
        let nu = 1e-5;
        let clean = march(&EdgeDistribution::new(s.clone(), ve.clone()).unwrap(), nu, &laminar_only());

        let mut perturbed_ve = ve;
        perturbed_ve[20] = f64::NAN;
        let perturbed = march(&EdgeDistribution::new(s, perturbed_ve).unwrap(), nu, &laminar_only());

        assert!(clean.recoveries.is_empty());
        assert!(perturbed.recoveries.iter().any(|e| e.station == 20));
        assert_eq!(perturbed.profile.len(), clean.profile.len());
        let clean_te = clean.profile.last().unwrap();
        let perturbed_te = perturbed.profile.last().unwrap();
        assert_relative_eq!(
            perturbed_te.momentum_thickness,
            clean_te.momentum_thickness,
            max_relative = 1e-2
        );
    }

    #[test]
    fn excessive_shape_factor_jump_is_recovered() {
        // A velocity cliff drives λ far negative in one step
        let s: Vec<f64> = (1..=20).map(|i| 0.01 * i as f64).collect();
        let mut ve = vec![1.0; 20];
        for v in ve.iter_mut().skip(10) {
            *v = 0.2;
        }
        let edge = EdgeDistribution::new(s, ve).unwrap();
        let config = BoundaryLayerConfig {
            initial_momentum_thickness: 1e-3,
            laminar_jump_tolerance: 0.1,
            separation_lambda: f64::NEG_INFINITY,
            ..laminar_only()
        };
        let result = march(&edge, 1e-5, &config);

        assert_eq!(result.profile.len(), 20);
        assert!(result
            .recoveries
            .iter()
            .any(|e| matches!(e.kind, RecoveryKind::ExcessiveJump { .. })));
        assert!(result.profile.stations.iter().all(|st| st.is_finite()));
    }
}
