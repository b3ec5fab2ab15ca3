//! Singularity solve: source strengths and the shared vortex strength.

use nalgebra as na;

use crate::config::{AnalysisConfig, SolverConfig};
use crate::error::{AnalysisError, Result};
use crate::geometry::{AirfoilSurface, PanelGeometry};
use crate::influence::InfluenceMatrix;

/// Solved source strengths (one per panel) and the shared vortex strength.
#[derive(Debug, Clone, PartialEq)]
pub struct SingularityStrengths {
    pub sources: Vec<f64>,
    pub vortex: f64,
}

/// Right-hand side for a unit freestream at `alpha` radians.
pub fn freestream_rhs(geometry: &PanelGeometry, alpha: f64) -> na::DVector<f64> {
    let panels = geometry.panels();
    let n = panels.len();
    let (sin_alpha, cos_alpha) = alpha.sin_cos();

    let mut rhs = na::DVector::zeros(n + 1);
    for (i, panel) in panels.iter().enumerate() {
        rhs[i] = panel.sin_theta * cos_alpha - panel.cos_theta * sin_alpha;
    }
    let first = &panels[0];
    let last = &panels[n - 1];
    rhs[n] = -(first.cos_theta + last.cos_theta) * cos_alpha
        - (first.sin_theta + last.sin_theta) * sin_alpha;
    rhs
}

/// Influence matrix factorised once per surface; solves for any angle of attack.
pub struct SectionSolver {
    geometry: PanelGeometry,
    influence: InfluenceMatrix,
    lu: na::LU<f64, na::Dyn, na::Dyn>,
}

impl SectionSolver {
    pub fn new(geometry: PanelGeometry, config: &SolverConfig) -> Result<Self> {
        let influence = InfluenceMatrix::assemble(&geometry);
        let lu = influence.system.clone().lu();
        check_pivots(&lu, config.pivot_tolerance)?;
        Ok(Self {
            geometry,
            influence,
            lu,
        })
    }

    /// Build panels, assemble and factorise in one go.
    pub fn for_surface(surface: &AirfoilSurface, config: &AnalysisConfig) -> Result<Self> {
        let geometry = PanelGeometry::build(surface, &config.geometry)?;
        Self::new(geometry, &config.solver)
    }

    pub fn geometry(&self) -> &PanelGeometry {
        &self.geometry
    }

    pub fn influence(&self) -> &InfluenceMatrix {
        &self.influence
    }

    pub fn solve(&self, alpha: f64) -> Result<SingularityStrengths> {
        let rhs = freestream_rhs(&self.geometry, alpha);
        let x = self
            .lu
            .solve(&rhs)
            .ok_or(AnalysisError::SingularMatrix { pivot_ratio: 0.0 })?;
        split_solution(x)
    }
}

/// One-off dense solve of `matrix · x = rhs`.
pub fn solve_system(
    matrix: &na::DMatrix<f64>,
    rhs: &na::DVector<f64>,
    config: &SolverConfig,
) -> Result<SingularityStrengths> {
    let lu = matrix.clone().lu();
    check_pivots(&lu, config.pivot_tolerance)?;
    let x = lu
        .solve(rhs)
        .ok_or(AnalysisError::SingularMatrix { pivot_ratio: 0.0 })?;
    split_solution(x)
}

fn split_solution(x: na::DVector<f64>) -> Result<SingularityStrengths> {
    if x.iter().any(|v| !v.is_finite()) {
        return Err(AnalysisError::SingularMatrix {
            pivot_ratio: f64::NAN,
        });
    }
    let n = x.len() - 1;
    Ok(SingularityStrengths {
        sources: x.rows(0, n).iter().copied().collect(),
        vortex: x[n],
    })
}

fn check_pivots(lu: &na::LU<f64, na::Dyn, na::Dyn>, tolerance: f64) -> Result<()> {
    let u = lu.u();
    let (min, max) = u
        .diagonal()
        .iter()
        .map(|d| d.abs())
        .fold((f64::INFINITY, 0.0f64), |(lo, hi), d| (lo.min(d), hi.max(d)));

    let pivot_ratio = if max > 0.0 { min / max } else { 0.0 };
    if !(pivot_ratio > tolerance) {
        log::debug!("influence matrix rejected, pivot ratio {:.3e}", pivot_ratio);
        return Err(AnalysisError::SingularMatrix { pivot_ratio });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalysisConfig;
    use crate::naca::naca4;
    use approx::assert_relative_eq;

    #[test]
    fn recovers_known_solution() {
        let matrix = na::DMatrix::from_row_slice(3, 3, &[4.0, 1.0, 0.0, 1.0, 3.0, 1.0, 0.0, 1.0, 2.0]);
        let expected = na::DVector::from_vec(vec![1.0, -2.0, 0.5]);
        let rhs = &matrix * &expected;

        let solution = solve_system(&matrix, &rhs, &SolverConfig::default()).unwrap();
        assert_relative_eq!(solution.sources[0], 1.0, epsilon = 1e-12);
        assert_relative_eq!(solution.sources[1], -2.0, epsilon = 1e-12);
        assert_relative_eq!(solution.vortex, 0.5, epsilon = 1e-12);
    }

    #[test]
    fn singular_matrix_is_reported() {
        let matrix = na::DMatrix::from_row_slice(3, 3, &[1.0, 2.0, 3.0, 2.0, 4.0, 6.0, 0.0, 1.0, 1.0]);
        let rhs = na::DVector::from_vec(vec![1.0, 2.0, 3.0]);
        let err = solve_system(&matrix, &rhs, &SolverConfig::default()).unwrap_err();
        assert!(matches!(err, AnalysisError::SingularMatrix { .. }));
    }

    #[test]
    fn symmetric_section_at_zero_incidence_has_no_circulation() {
        let surface = naca4("0012", 60).unwrap();
        let solver = SectionSolver::for_surface(&surface, &AnalysisConfig::default()).unwrap();
        let strengths = solver.solve(0.0).unwrap();

        assert_eq!(strengths.sources.len(), 60);
        assert!(strengths.vortex.abs() < 1e-10);
        // Mirrored panels carry equal sources
        for i in 0..30 {
            assert_relative_eq!(
                strengths.sources[i],
                strengths.sources[59 - i],
                epsilon = 1e-10,
                max_relative = 1e-8
            );
        }
    }

    #[test]
    fn circulation_grows_with_incidence() {
        let surface = naca4("0012", 60).unwrap();
        let solver = SectionSolver::for_surface(&surface, &AnalysisConfig::default()).unwrap();
        let low = solver.solve(2f64.to_radians()).unwrap().vortex;
        let high = solver.solve(4f64.to_radians()).unwrap().vortex;
        assert!(low > 0.0);
        assert_relative_eq!(high / low, 2.0, max_relative = 0.01);
    }
}
