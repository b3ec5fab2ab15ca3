//! Batch driver over a (case, control point) grid of flow conditions.
//!
//! Every cell is independent. A failing cell is reported in its own
//! [`CaseOutcome`] and never stops the others.

use rayon::prelude::*;

use crate::analysis::{FlowCondition, PreparedSection, SectionAnalysis};
use crate::boundary_layer::SurfaceSide;
use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, Result};
use crate::geometry::AirfoilSurface;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BatchIndex {
    pub case: usize,
    pub control_point: usize,
}

/// Rectangular grid of conditions, stored row-major by case.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionGrid {
    cases: usize,
    control_points: usize,
    conditions: Vec<FlowCondition>,
}

impl ConditionGrid {
    /// One row per case; every row must have the same number of control points.
    pub fn new(rows: Vec<Vec<FlowCondition>>) -> Result<Self> {
        let cases = rows.len();
        let control_points = rows.first().map_or(0, Vec::len);
        if let Some((row, r)) = rows
            .iter()
            .enumerate()
            .find(|(_, r)| r.len() != control_points)
        {
            return Err(AnalysisError::GridShape {
                row,
                expected: control_points,
                provided: r.len(),
            });
        }
        Ok(Self {
            cases,
            control_points,
            conditions: rows.into_iter().flatten().collect(),
        })
    }

    /// Angle-of-attack sweep (one case per alpha, radians) with the Reynolds
    /// numbers as control points.
    pub fn sweep(alphas: &[f64], reynolds: &[f64]) -> Self {
        let conditions = alphas
            .iter()
            .flat_map(|&alpha| reynolds.iter().map(move |&re| FlowCondition::new(alpha, re)))
            .collect();
        Self {
            cases: alphas.len(),
            control_points: reynolds.len(),
            conditions,
        }
    }

    pub fn cases(&self) -> usize {
        self.cases
    }

    pub fn control_points(&self) -> usize {
        self.control_points
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn get(&self, index: BatchIndex) -> Option<&FlowCondition> {
        if index.case >= self.cases || index.control_point >= self.control_points {
            return None;
        }
        self.conditions
            .get(index.case * self.control_points + index.control_point)
    }

    pub fn iter(&self) -> impl Iterator<Item = (BatchIndex, FlowCondition)> + '_ {
        self.conditions.iter().enumerate().map(move |(k, c)| {
            (
                BatchIndex {
                    case: k / self.control_points,
                    control_point: k % self.control_points,
                },
                *c,
            )
        })
    }
}

/// Surfaces to analyse: one for the whole grid, or one per case row.
#[derive(Debug, Clone, Copy)]
pub enum BatchSurfaces<'a> {
    Shared(&'a AirfoilSurface),
    PerCase(&'a [AirfoilSurface]),
}

#[derive(Debug, Clone, PartialEq)]
pub enum CaseStatus {
    Converged,
    /// Finished, but the boundary layer needed this many recoveries.
    Recovered { events: usize },
    Failed(AnalysisError),
}

#[derive(Debug, Clone)]
pub struct CaseOutcome {
    pub index: BatchIndex,
    pub condition: FlowCondition,
    pub result: Result<SectionAnalysis>,
}

impl CaseOutcome {
    pub fn status(&self) -> CaseStatus {
        match &self.result {
            Ok(analysis) => match analysis.recovery_count() {
                0 => CaseStatus::Converged,
                events => CaseStatus::Recovered { events },
            },
            Err(err) => CaseStatus::Failed(err.clone()),
        }
    }

    pub fn analysis(&self) -> Option<&SectionAnalysis> {
        self.result.as_ref().ok()
    }

    /// Valid (laminar, turbulent) station counts on one surface.
    pub fn profile_lengths(&self, side: SurfaceSide) -> Option<(usize, usize)> {
        self.analysis()
            .and_then(|a| a.boundary_layer.as_ref())
            .map(|bl| bl.side(side).valid_lengths())
    }
}

/// Outcomes in grid order.
#[derive(Debug, Clone)]
pub struct BatchResult {
    cases: usize,
    control_points: usize,
    outcomes: Vec<CaseOutcome>,
}

impl BatchResult {
    pub fn cases(&self) -> usize {
        self.cases
    }

    pub fn control_points(&self) -> usize {
        self.control_points
    }

    pub fn outcomes(&self) -> &[CaseOutcome] {
        &self.outcomes
    }

    pub fn get(&self, index: BatchIndex) -> Option<&CaseOutcome> {
        if index.case >= self.cases || index.control_point >= self.control_points {
            return None;
        }
        self.outcomes
            .get(index.case * self.control_points + index.control_point)
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &CaseOutcome> {
        self.outcomes.iter().filter(|o| o.result.is_err())
    }
}

/// Analyse every cell of `grid`. Fails as a whole only when `surfaces`
/// does not match the grid; per-cell failures land in the outcomes.
pub fn run_batch(
    surfaces: BatchSurfaces<'_>,
    grid: &ConditionGrid,
    config: &AnalysisConfig,
) -> Result<BatchResult> {
    let surface_list: Vec<&AirfoilSurface> = match surfaces {
        BatchSurfaces::Shared(surface) => vec![surface],
        BatchSurfaces::PerCase(list) => {
            if list.len() != grid.cases() {
                return Err(AnalysisError::SurfaceCount {
                    surfaces: list.len(),
                    cases: grid.cases(),
                });
            }
            list.iter().collect()
        }
    };

    let prepare = |surface: &&AirfoilSurface| PreparedSection::new(surface, config);
    let prepared: Vec<Result<PreparedSection>> = if config.parallel {
        surface_list.par_iter().map(prepare).collect()
    } else {
        surface_list.iter().map(prepare).collect()
    };
    for (i, p) in prepared.iter().enumerate() {
        if let Err(err) = p {
            log::warn!("surface {} could not be prepared: {}", i, err);
        }
    }

    let evaluate = |(index, condition): (BatchIndex, FlowCondition)| {
        let section = match surfaces {
            BatchSurfaces::Shared(_) => &prepared[0],
            BatchSurfaces::PerCase(_) => &prepared[index.case],
        };
        let result = match section {
            Ok(section) => section.analyze(condition, config),
            Err(err) => Err(err.clone()),
        };
        if let Err(err) = &result {
            log::debug!(
                "case {} control point {} failed: {}",
                index.case,
                index.control_point,
                err
            );
        }
        CaseOutcome {
            index,
            condition,
            result,
        }
    };

    let cells: Vec<(BatchIndex, FlowCondition)> = grid.iter().collect();
    let outcomes: Vec<CaseOutcome> = if config.parallel {
        cells.into_par_iter().map(evaluate).collect()
    } else {
        cells.into_iter().map(evaluate).collect()
    };

    let result = BatchResult {
        cases: grid.cases(),
        control_points: grid.control_points(),
        outcomes,
    };
    let recovered = result
        .outcomes
        .iter()
        .filter(|o| matches!(o.status(), CaseStatus::Recovered { .. }))
        .count();
    log::info!(
        "batch of {} cells: {} succeeded ({} with recoveries), {} failed",
        grid.len(),
        result.succeeded(),
        recovered,
        grid.len() - result.succeeded()
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ragged_rows_are_rejected() {
        let c = FlowCondition::new(0.0, 1e6);
        let err = ConditionGrid::new(vec![vec![c, c], vec![c]]).unwrap_err();
        assert_eq!(
            err,
            AnalysisError::GridShape {
                row: 1,
                expected: 2,
                provided: 1
            }
        );
    }

    #[test]
    fn sweep_is_row_major_by_alpha() {
        let grid = ConditionGrid::sweep(&[0.0, 0.1, 0.2], &[1e5, 1e6]);
        assert_eq!(grid.cases(), 3);
        assert_eq!(grid.control_points(), 2);
        assert_eq!(grid.len(), 6);

        let c = grid.get(BatchIndex { case: 2, control_point: 1 }).unwrap();
        assert_eq!(*c, FlowCondition::new(0.2, 1e6));
        assert!(grid.get(BatchIndex { case: 3, control_point: 0 }).is_none());
        assert!(grid.get(BatchIndex { case: 0, control_point: 2 }).is_none());

        let indices: Vec<BatchIndex> = grid.iter().map(|(i, _)| i).collect();
        assert_eq!(indices[3], BatchIndex { case: 1, control_point: 1 });
    }

    #[test]
    fn empty_grid_is_allowed() {
        let grid = ConditionGrid::new(Vec::new()).unwrap();
        assert!(grid.is_empty());
        assert_eq!(grid.iter().count(), 0);
    }
}
