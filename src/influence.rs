//! Hess–Smith influence coefficients.
//!
//! Each panel carries a constant-strength source q_j and every panel shares
//! one vortex strength γ. The first N rows of the system enforce zero normal
//! velocity at each control point; the last row is the Kutta condition.

use nalgebra as na;
use std::f64::consts::PI;

use crate::geometry::PanelGeometry;

const PI2_INV: f64 = 0.5 / PI;

/// Log-distance ratio and subtended angle of panel `j` seen from the control
/// point of panel `i`. The self term is (0, π).
pub(crate) fn panel_kernel(geometry: &PanelGeometry, i: usize, j: usize) -> (f64, f64) {
    if i == j {
        return (0.0, PI);
    }
    let panels = geometry.panels();
    let cp = panels[i].control_point;
    let start = panels[j].start;
    let end = panels[j].end;

    let dxj = cp.x - start.x;
    let dxjp = cp.x - end.x;
    let dyj = cp.y - start.y;
    let dyjp = cp.y - end.y;

    let flog = 0.5 * ((dxjp * dxjp + dyjp * dyjp) / (dxj * dxj + dyj * dyj)).ln();
    let ftan = (dyjp * dxj - dxjp * dyj).atan2(dxjp * dxj + dyjp * dyj);
    (flog, ftan)
}

/// Dense influence system plus the tangential coefficients the velocity
/// evaluator needs.
#[derive(Debug, Clone)]
pub struct InfluenceMatrix {
    /// (N+1)×(N+1) system matrix.
    pub system: na::DMatrix<f64>,
    /// Tangential velocity at control point i per unit source on panel j.
    pub source_tangential: na::DMatrix<f64>,
    /// Tangential velocity at control point i per unit shared vortex strength.
    pub vortex_tangential: na::DVector<f64>,
}

impl InfluenceMatrix {
    pub fn assemble(geometry: &PanelGeometry) -> Self {
        let n = geometry.len();
        let panels = geometry.panels();

        let mut system = na::DMatrix::zeros(n + 1, n + 1);
        let mut source_tangential = na::DMatrix::zeros(n, n);
        let mut vortex_tangential = na::DVector::zeros(n);

        for i in 0..n {
            for j in 0..n {
                let (flog, ftan) = panel_kernel(geometry, i, j);

                let ctimtj = panels[i].cos_theta * panels[j].cos_theta
                    + panels[i].sin_theta * panels[j].sin_theta;
                let stimtj = panels[i].sin_theta * panels[j].cos_theta
                    - panels[j].sin_theta * panels[i].cos_theta;

                let normal = PI2_INV * (ftan * ctimtj + flog * stimtj);
                let tangential = PI2_INV * (flog * ctimtj - ftan * stimtj);

                system[(i, j)] = normal;
                system[(i, n)] += tangential;

                source_tangential[(i, j)] = -tangential;
                vortex_tangential[i] += normal;
            }
        }

        // Kutta: tangential velocities on the two trailing-edge panels cancel
        for j in 0..n {
            system[(n, j)] = source_tangential[(0, j)] + source_tangential[(n - 1, j)];
        }
        system[(n, n)] = vortex_tangential[0] + vortex_tangential[n - 1];

        Self {
            system,
            source_tangential,
            vortex_tangential,
        }
    }

    pub fn panel_count(&self) -> usize {
        self.vortex_tangential.len()
    }
}
