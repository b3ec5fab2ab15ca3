use crate::geometry::PanelGeometry;
use crate::influence::InfluenceMatrix;
use crate::solver::SingularityStrengths;

/// Tangential velocity and pressure coefficient at each panel midpoint,
/// index-aligned with [`PanelGeometry`].
///
/// Velocities are relative to a unit freestream and signed along the panel
/// direction, so the lower surface (traversed forward) carries negative values.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceField {
    pub tangential_velocity: Vec<f64>,
    pub pressure_coefficient: Vec<f64>,
}

impl SurfaceField {
    pub fn evaluate(
        geometry: &PanelGeometry,
        influence: &InfluenceMatrix,
        strengths: &SingularityStrengths,
        alpha: f64,
    ) -> Self {
        let (sin_alpha, cos_alpha) = alpha.sin_cos();
        let n = geometry.len();

        let tangential_velocity: Vec<f64> = geometry
            .panels()
            .iter()
            .enumerate()
            .map(|(i, panel)| {
                let freestream = cos_alpha * panel.cos_theta + sin_alpha * panel.sin_theta;
                let sources: f64 = (0..n)
                    .map(|j| influence.source_tangential[(i, j)] * strengths.sources[j])
                    .sum();
                freestream + sources + strengths.vortex * influence.vortex_tangential[i]
            })
            .collect();

        let pressure_coefficient = tangential_velocity
            .iter()
            .map(|vt| 1.0 - vt * vt)
            .collect();

        Self {
            tangential_velocity,
            pressure_coefficient,
        }
    }

    pub fn len(&self) -> usize {
        self.tangential_velocity.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tangential_velocity.is_empty()
    }

    /// Speed mismatch between the two trailing-edge panels.
    pub fn kutta_residual(&self) -> f64 {
        let n = self.tangential_velocity.len();
        self.tangential_velocity[0].abs() - self.tangential_velocity[n - 1].abs()
    }
}
