//! One airfoil section at one flow condition: panel solve, surface field,
//! force integration and the boundary-layer march on both surfaces.

use nalgebra as na;
use serde::{Deserialize, Serialize};

use crate::boundary_layer::edge::{split_at_stagnation, StagnationSplit};
use crate::boundary_layer::{RecoveryEvent, SurfaceBoundaryLayer, SurfaceSide};
use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, Result};
use crate::forces::{integrate_pressure, moment_reference, squire_young, SectionCoefficients};
use crate::geometry::AirfoilSurface;
use crate::solver::{SectionSolver, SingularityStrengths};
use crate::surface::SurfaceField;

/// Freestream condition: angle of attack in radians and chord Reynolds number.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlowCondition {
    pub alpha: f64,
    pub reynolds: f64,
}

impl FlowCondition {
    pub fn new(alpha: f64, reynolds: f64) -> Self {
        Self { alpha, reynolds }
    }

    pub fn from_degrees(alpha_deg: f64, reynolds: f64) -> Self {
        Self::new(alpha_deg.to_radians(), reynolds)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.alpha.is_finite() {
            return Err(AnalysisError::invalid_condition(format!(
                "angle of attack {} is not finite",
                self.alpha
            )));
        }
        if !(self.reynolds.is_finite() && self.reynolds > 0.0) {
            return Err(AnalysisError::invalid_condition(format!(
                "Reynolds number must be positive, got {}",
                self.reynolds
            )));
        }
        Ok(())
    }
}

/// Boundary layers on both surfaces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundaryLayerSolution {
    /// Contour arc length of the stagnation point.
    pub stagnation_arc_length: f64,
    pub upper: SurfaceBoundaryLayer,
    pub lower: SurfaceBoundaryLayer,
}

impl BoundaryLayerSolution {
    pub fn side(&self, side: SurfaceSide) -> &SurfaceBoundaryLayer {
        match side {
            SurfaceSide::Upper => &self.upper,
            SurfaceSide::Lower => &self.lower,
        }
    }

    pub fn recoveries(&self) -> impl Iterator<Item = &RecoveryEvent> {
        self.upper.recoveries.iter().chain(self.lower.recoveries.iter())
    }

    /// Summed Squire–Young drag of both surfaces.
    pub fn profile_drag(&self, chord: f64) -> f64 {
        [&self.upper, &self.lower]
            .iter()
            .filter_map(|surface| surface.trailing_edge_station())
            .map(|te| {
                squire_young(
                    te.momentum_thickness,
                    te.shape_factor,
                    te.edge_velocity,
                    chord,
                )
            })
            .sum()
    }
}

/// Everything computed for one section at one condition.
#[derive(Debug, Clone)]
pub struct SectionAnalysis {
    pub condition: FlowCondition,
    pub strengths: SingularityStrengths,
    pub field: SurfaceField,
    pub coefficients: SectionCoefficients,
    /// None when the boundary layer is disabled.
    pub boundary_layer: Option<BoundaryLayerSolution>,
}

impl SectionAnalysis {
    pub fn recovery_count(&self) -> usize {
        self.boundary_layer
            .as_ref()
            .map_or(0, |bl| bl.recoveries().count())
    }
}

/// A surface with its influence matrix factorised, ready to be analysed at
/// any number of conditions.
pub struct PreparedSection {
    solver: SectionSolver,
    chord: f64,
    reference: na::Point2<f64>,
}

impl PreparedSection {
    pub fn new(surface: &AirfoilSurface, config: &AnalysisConfig) -> Result<Self> {
        let solver = SectionSolver::for_surface(surface, config)?;
        Ok(Self {
            solver,
            chord: surface.chord(),
            reference: moment_reference(surface, config.moment_reference),
        })
    }

    pub fn solver(&self) -> &SectionSolver {
        &self.solver
    }

    pub fn chord(&self) -> f64 {
        self.chord
    }

    pub fn analyze(&self, condition: FlowCondition, config: &AnalysisConfig) -> Result<SectionAnalysis> {
        condition.validate()?;
        let geometry = self.solver.geometry();

        let strengths = self.solver.solve(condition.alpha)?;
        let field = SurfaceField::evaluate(geometry, self.solver.influence(), &strengths, condition.alpha);
        let mut coefficients =
            integrate_pressure(geometry, &field, condition.alpha, self.reference, self.chord);

        let boundary_layer = if config.boundary_layer.enabled {
            let split = split_at_stagnation(geometry, &field)?;
            let solution = self.march_boundary_layers(&split, condition, config);
            coefficients.cd_viscous = Some(solution.profile_drag(self.chord));
            Some(solution)
        } else {
            None
        };

        log::debug!(
            "alpha {:.3}°, Re {:.3e}: cl {:.4}, cd_p {:.2e}, cm {:.4}, cd_v {:?}",
            condition.alpha.to_degrees(),
            condition.reynolds,
            coefficients.cl,
            coefficients.cd_pressure,
            coefficients.cm,
            coefficients.cd_viscous
        );

        Ok(SectionAnalysis {
            condition,
            strengths,
            field,
            coefficients,
            boundary_layer,
        })
    }

    fn march_boundary_layers(
        &self,
        split: &StagnationSplit,
        condition: FlowCondition,
        config: &AnalysisConfig,
    ) -> BoundaryLayerSolution {
        let nu = self.chord / condition.reynolds;
        let bl = &config.boundary_layer;
        BoundaryLayerSolution {
            stagnation_arc_length: split.stagnation_arc_length,
            upper: SurfaceBoundaryLayer::march(SurfaceSide::Upper, &split.upper, nu, bl),
            lower: SurfaceBoundaryLayer::march(SurfaceSide::Lower, &split.lower, nu, bl),
        }
    }
}

/// Prepare and analyse a section at a single condition.
pub fn analyze_section(
    surface: &AirfoilSurface,
    condition: FlowCondition,
    config: &AnalysisConfig,
) -> Result<SectionAnalysis> {
    PreparedSection::new(surface, config)?.analyze(condition, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::naca::naca4;

    #[test]
    fn rejects_non_positive_reynolds() {
        let surface = naca4("0012", 40).unwrap();
        for reynolds in [0.0, -1e6, f64::NAN] {
            let err = analyze_section(
                &surface,
                FlowCondition::from_degrees(2.0, reynolds),
                &AnalysisConfig::default(),
            )
            .unwrap_err();
            assert!(matches!(err, AnalysisError::InvalidCondition { .. }));
        }
    }

    #[test]
    fn disabled_boundary_layer_reports_pressure_drag_only() {
        let surface = naca4("0012", 40).unwrap();
        let mut config = AnalysisConfig::default();
        config.boundary_layer.enabled = false;
        let result = analyze_section(&surface, FlowCondition::from_degrees(2.0, 1e6), &config).unwrap();

        assert!(result.boundary_layer.is_none());
        assert_eq!(result.coefficients.cd_viscous, None);
        assert_eq!(result.recovery_count(), 0);
    }

    #[test]
    fn viscous_drag_is_positive_and_plausible() {
        let surface = naca4("0012", 80).unwrap();
        let result = analyze_section(
            &surface,
            FlowCondition::from_degrees(0.0, 1e6),
            &AnalysisConfig::default(),
        )
        .unwrap();

        let cd = result.coefficients.cd_viscous.unwrap();
        assert!(cd > 1e-3 && cd < 3e-2, "cd = {}", cd);
        assert_eq!(result.coefficients.cd(), cd);
    }

    #[test]
    fn ill_conditioned_system_is_rejected_when_preparing() {
        let surface = naca4("0012", 40).unwrap();
        let mut config = AnalysisConfig::default();
        config.solver.pivot_tolerance = 0.99;

        match PreparedSection::new(&surface, &config) {
            Err(AnalysisError::SingularMatrix { pivot_ratio }) => assert!(pivot_ratio < 0.99),
            Err(other) => panic!("unexpected error {:?}", other),
            Ok(_) => panic!("factorisation accepted"),
        }
        let err = analyze_section(&surface, FlowCondition::new(0.0, 1e6), &config).unwrap_err();
        assert!(err.is_geometric());
    }

    #[test]
    fn prepared_section_reuses_factorisation() {
        let surface = naca4("2412", 60).unwrap();
        let config = AnalysisConfig::default();
        let prepared = PreparedSection::new(&surface, &config).unwrap();

        let low = prepared.analyze(FlowCondition::from_degrees(0.0, 1e6), &config).unwrap();
        let high = prepared.analyze(FlowCondition::from_degrees(4.0, 1e6), &config).unwrap();
        assert!(high.coefficients.cl > low.coefficients.cl);

        let direct = analyze_section(&surface, FlowCondition::from_degrees(4.0, 1e6), &config).unwrap();
        assert_eq!(direct.coefficients, high.coefficients);
    }
}
