//! Integral boundary-layer marching from the stagnation point to the
//! trailing edge: Thwaites' method while laminar, Head's method after
//! transition.
//!
//! Numerical trouble at a station never aborts a march. The station takes
//! its predecessor's values and a [`RecoveryEvent`] is recorded, so callers
//! can audit every substitution.

pub mod edge;
pub mod head;
pub(crate) mod ode;
pub mod thwaites;

use serde::{Deserialize, Serialize};

use crate::config::BoundaryLayerConfig;
use edge::EdgeDistribution;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Regime {
    Laminar,
    Turbulent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SurfaceSide {
    Upper,
    Lower,
}

/// Boundary-layer state at one arc-length station.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundaryLayerStation {
    /// Distance along the surface from the stagnation point.
    pub arc_length: f64,
    pub edge_velocity: f64,
    /// θ
    pub momentum_thickness: f64,
    /// H = δ*/θ
    pub shape_factor: f64,
    pub skin_friction: f64,
    /// δ*
    pub displacement_thickness: f64,
    /// δ
    pub thickness: f64,
    pub reynolds_theta: f64,
    pub reynolds_x: f64,
}

impl BoundaryLayerStation {
    pub fn is_finite(&self) -> bool {
        [
            self.arc_length,
            self.edge_velocity,
            self.momentum_thickness,
            self.shape_factor,
            self.skin_friction,
            self.displacement_thickness,
            self.thickness,
            self.reynolds_theta,
            self.reynolds_x,
        ]
        .iter()
        .all(|v| v.is_finite())
    }

    /// Copy of this station moved to `arc_length`, used when a station has
    /// to be replaced by its predecessor.
    pub(crate) fn carried_to(&self, arc_length: f64, nu: f64, regime: Regime) -> Self {
        let reynolds_x = self.edge_velocity * arc_length / nu;
        let thickness = match regime {
            Regime::Laminar => thwaites::laminar_thickness(arc_length, reynolds_x),
            Regime::Turbulent => self.thickness,
        };
        Self {
            arc_length,
            reynolds_x,
            thickness,
            ..*self
        }
    }
}

/// Stations of one regime, in marching order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub regime: Regime,
    pub stations: Vec<BoundaryLayerStation>,
}

impl Profile {
    pub fn new(regime: Regime) -> Self {
        Self {
            regime,
            stations: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    pub fn first(&self) -> Option<&BoundaryLayerStation> {
        self.stations.first()
    }

    pub fn last(&self) -> Option<&BoundaryLayerStation> {
        self.stations.last()
    }

    pub fn arc_lengths(&self) -> Vec<f64> {
        self.stations.iter().map(|s| s.arc_length).collect()
    }

    pub fn momentum_thickness(&self) -> Vec<f64> {
        self.stations.iter().map(|s| s.momentum_thickness).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RecoveryKind {
    /// The step produced NaN, an infinity or a non-positive θ.
    NonFinite,
    /// Laminar H moved more than the configured fraction in one step.
    ExcessiveJump { relative_change: f64 },
    /// The turbulent fixed point hit its iteration cap; the last iterate was kept.
    IterationLimit { iterations: usize },
}

/// One non-fatal numerical recovery.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RecoveryEvent {
    pub regime: Regime,
    /// Index into the surface's edge distribution.
    pub station: usize,
    pub arc_length: f64,
    pub kind: RecoveryKind,
}

impl RecoveryEvent {
    /// True when the station's values were replaced by its predecessor's.
    pub fn substituted(&self) -> bool {
        !matches!(self.kind, RecoveryKind::IterationLimit { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TransitionCause {
    LaminarSeparation { lambda: f64 },
    Michel { reynolds_theta: f64, threshold: f64 },
}

/// Where the laminar profile hands over to the turbulent one.
///
/// Always the last valid laminar station. On laminar separation that is the
/// station before the one whose λ fell below the threshold; the cause still
/// carries that λ.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransitionPoint {
    pub arc_length: f64,
    /// Index of the last laminar station.
    pub station: usize,
    pub cause: TransitionCause,
}

/// How the laminar march ended. Reaching the trailing edge laminar is a
/// valid outcome, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TransitionState {
    Transitioned(TransitionPoint),
    FullyLaminar,
}

impl TransitionState {
    pub fn point(&self) -> Option<&TransitionPoint> {
        match self {
            Self::Transitioned(point) => Some(point),
            Self::FullyLaminar => None,
        }
    }

    pub fn arc_length(&self) -> Option<f64> {
        self.point().map(|p| p.arc_length)
    }
}

/// Laminar and turbulent profiles of one surface, joined at the transition point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceBoundaryLayer {
    pub side: SurfaceSide,
    pub laminar: Profile,
    pub turbulent: Profile,
    pub transition: TransitionState,
    pub recoveries: Vec<RecoveryEvent>,
}

impl SurfaceBoundaryLayer {
    pub fn march(
        side: SurfaceSide,
        edge: &EdgeDistribution,
        nu: f64,
        config: &BoundaryLayerConfig,
    ) -> Self {
        let laminar = thwaites::march(edge, nu, config);
        let mut recoveries = laminar.recoveries;

        let turbulent = match (laminar.transition.point(), laminar.profile.last()) {
            (Some(point), Some(start)) => {
                let tail = edge.tail(point.station);
                let march = head::march(&tail, nu, start, config);
                recoveries.extend(march.recoveries.into_iter().map(|mut event| {
                    event.station += point.station;
                    event
                }));
                march.profile
            }
            _ => Profile::new(Regime::Turbulent),
        };

        log::debug!(
            "{:?} surface: {} laminar + {} turbulent stations, transition {:?}, {} recoveries",
            side,
            laminar.profile.len(),
            turbulent.len(),
            laminar.transition.arc_length(),
            recoveries.len()
        );

        Self {
            side,
            laminar: laminar.profile,
            turbulent,
            transition: laminar.transition,
            recoveries,
        }
    }

    /// Last station before the trailing edge, whichever regime it is in.
    pub fn trailing_edge_station(&self) -> Option<&BoundaryLayerStation> {
        self.turbulent.last().or_else(|| self.laminar.last())
    }

    /// All stations tagged with their regime, laminar first.
    pub fn stations(&self) -> impl Iterator<Item = (Regime, &BoundaryLayerStation)> {
        self.laminar
            .stations
            .iter()
            .map(|s| (Regime::Laminar, s))
            .chain(self.turbulent.stations.iter().map(|s| (Regime::Turbulent, s)))
    }

    /// Number of valid (laminar, turbulent) stations.
    pub fn valid_lengths(&self) -> (usize, usize) {
        (self.laminar.len(), self.turbulent.len())
    }

    pub fn is_fully_laminar(&self) -> bool {
        matches!(self.transition, TransitionState::FullyLaminar)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BoundaryLayerConfig, TransitionRule};

    fn flat_plate(n: usize, length: f64) -> EdgeDistribution {
        let s: Vec<f64> = (1..=n).map(|i| length * i as f64 / n as f64).collect();
        EdgeDistribution::new(s, vec![1.0; n]).unwrap()
    }

    #[test]
    fn flat_plate_transitions_and_joins_profiles() {
        let edge = flat_plate(300, 3.0);
        let surface = SurfaceBoundaryLayer::march(
            SurfaceSide::Upper,
            &edge,
            1e-6,
            &BoundaryLayerConfig::default(),
        );

        let point = surface.transition.point().unwrap();
        assert!(matches!(point.cause, TransitionCause::Michel { .. }));
        // Michel on a flat plate: Re_x between 1e6 and 3e6
        assert!(point.arc_length > 1.0 && point.arc_length < 3.0);

        let lam_last = surface.laminar.last().unwrap();
        let turb_first = surface.turbulent.first().unwrap();
        assert_eq!(lam_last.arc_length, turb_first.arc_length);
        assert_eq!(lam_last.momentum_thickness, turb_first.momentum_thickness);

        let (laminar, turbulent) = surface.valid_lengths();
        assert_eq!(laminar + turbulent, edge.len() + 1);
        assert!(surface.stations().all(|(_, s)| s.is_finite()));
    }

    #[test]
    fn fully_laminar_surface_has_empty_turbulent_profile() {
        let edge = flat_plate(50, 0.5);
        let config = BoundaryLayerConfig {
            transition_rule: TransitionRule::LaminarSeparation,
            ..BoundaryLayerConfig::default()
        };
        let surface = SurfaceBoundaryLayer::march(SurfaceSide::Lower, &edge, 1e-6, &config);

        assert!(surface.is_fully_laminar());
        assert!(surface.turbulent.is_empty());
        assert_eq!(surface.laminar.len(), 50);
        assert_eq!(
            surface.trailing_edge_station().unwrap().arc_length,
            edge.arc_length()[49]
        );
    }

    #[test]
    fn carried_station_keeps_state_but_moves() {
        let station = BoundaryLayerStation {
            arc_length: 0.1,
            edge_velocity: 1.0,
            momentum_thickness: 1e-4,
            shape_factor: 2.6,
            skin_friction: 4e-3,
            displacement_thickness: 2.6e-4,
            thickness: 1e-3,
            reynolds_theta: 100.0,
            reynolds_x: 1e5,
        };
        let moved = station.carried_to(0.2, 1e-6, Regime::Laminar);
        assert_eq!(moved.arc_length, 0.2);
        assert_eq!(moved.momentum_thickness, station.momentum_thickness);
        approx::assert_relative_eq!(moved.reynolds_x, 2e5, max_relative = 1e-12);
    }
}
