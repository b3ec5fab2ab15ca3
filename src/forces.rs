use nalgebra as na;
use serde::{Deserialize, Serialize};

use crate::geometry::{AirfoilSurface, PanelGeometry};
use crate::surface::SurfaceField;

/// Section force and moment coefficients.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SectionCoefficients {
    /// Normal force, body axes.
    pub cn: f64,
    /// Axial force, body axes.
    pub ca: f64,
    pub cl: f64,
    /// Pressure drag from Cp integration (≈0 for inviscid flow).
    pub cd_pressure: f64,
    /// Squire–Young profile drag, when the boundary layer was marched.
    pub cd_viscous: Option<f64>,
    /// Pitching moment about the reference point, nose-up positive.
    pub cm: f64,
}

impl SectionCoefficients {
    /// Viscous drag when available, otherwise pressure drag.
    pub fn cd(&self) -> f64 {
        self.cd_viscous.unwrap_or(self.cd_pressure)
    }

    pub fn lift_to_drag(&self) -> f64 {
        self.cl / self.cd()
    }
}

/// Moment reference point `fraction` of the way from leading to trailing edge.
pub fn moment_reference(surface: &AirfoilSurface, fraction: f64) -> na::Point2<f64> {
    let le = surface.leading_edge();
    let te = surface.trailing_edge();
    le + (te - le) * fraction
}

/// Integrate Cp over the panels into Cl, Cd (pressure) and Cm.
pub fn integrate_pressure(
    geometry: &PanelGeometry,
    field: &SurfaceField,
    alpha: f64,
    reference: na::Point2<f64>,
    chord: f64,
) -> SectionCoefficients {
    let mut cn = 0.0;
    let mut ca = 0.0;
    let mut cm = 0.0;

    for (panel, cp) in geometry.panels().iter().zip(field.pressure_coefficient.iter()) {
        let dx = panel.end.x - panel.start.x;
        let dy = panel.end.y - panel.start.y;

        let dcn = -cp * dx;
        let dca = cp * dy;

        let arm = panel.control_point - reference;
        cn += dcn;
        ca += dca;
        cm += -dcn * arm.x + dca * arm.y;
    }

    cn /= chord;
    ca /= chord;
    cm /= chord * chord;

    let (sin_alpha, cos_alpha) = alpha.sin_cos();
    SectionCoefficients {
        cn,
        ca,
        cl: cn * cos_alpha - ca * sin_alpha,
        cd_pressure: cn * sin_alpha + ca * cos_alpha,
        cd_viscous: None,
        cm,
    }
}

/// Squire–Young wake drag of one surface from its trailing-edge state.
pub fn squire_young(momentum_thickness: f64, shape_factor: f64, edge_velocity: f64, chord: f64) -> f64 {
    2.0 * momentum_thickness / chord * edge_velocity.powf(0.5 * (shape_factor + 5.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalysisConfig;
    use crate::naca::naca4;
    use crate::solver::SectionSolver;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    fn coefficients(code: &str, alpha_deg: f64) -> SectionCoefficients {
        let surface = naca4(code, 80).unwrap();
        let solver = SectionSolver::for_surface(&surface, &AnalysisConfig::default()).unwrap();
        let alpha = alpha_deg.to_radians();
        let strengths = solver.solve(alpha).unwrap();
        let field = SurfaceField::evaluate(solver.geometry(), solver.influence(), &strengths, alpha);
        integrate_pressure(
            solver.geometry(),
            &field,
            alpha,
            moment_reference(&surface, 0.25),
            surface.chord(),
        )
    }

    #[test]
    fn symmetric_section_at_zero_incidence_is_unloaded() {
        let c = coefficients("0012", 0.0);
        assert_abs_diff_eq!(c.cl, 0.0, epsilon = 1e-10);
        assert_abs_diff_eq!(c.cm, 0.0, epsilon = 1e-10);
    }

    #[test]
    fn cambered_section_lifts_at_zero_incidence() {
        // Thin-airfoil theory: Cl0 ≈ 0.23, Cm_c/4 ≈ -0.053 for the 2412
        let c = coefficients("2412", 0.0);
        assert_relative_eq!(c.cl, 0.25, max_relative = 0.05);
        assert_relative_eq!(c.cm, -0.053, max_relative = 0.05);
    }

    #[test]
    fn inviscid_pressure_drag_is_small() {
        let c = coefficients("0012", 4.0);
        assert!(c.cd_pressure.abs() < 2e-3);
        assert!(c.cl > 0.4);
        assert_eq!(c.cd(), c.cd_pressure);
    }

    #[test]
    fn quarter_chord_reference_point() {
        let surface = naca4("0012", 20).unwrap();
        let reference = moment_reference(&surface, 0.25);
        assert_abs_diff_eq!(reference.x, 0.25, epsilon = 1e-12);
        assert_abs_diff_eq!(reference.y, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn squire_young_on_flat_plate_edge() {
        // Unit edge velocity leaves twice the momentum thickness
        assert_relative_eq!(squire_young(1e-3, 1.4, 1.0, 1.0), 2e-3);
        assert!(squire_young(1e-3, 1.4, 0.9, 1.0) < 2e-3);
    }
}
