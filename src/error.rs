//! Error types for section analysis.
//!
//! Geometry and matrix failures are fatal for the case that hit them and are
//! reported per case by the batch driver. Numerical trouble inside the
//! boundary-layer marches is not an error: it is recovered in place and
//! recorded as a [`RecoveryEvent`](crate::boundary_layer::RecoveryEvent).

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Malformed surface input.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    #[error("surface needs at least {required} points, got {provided}")]
    TooFewPoints { required: usize, provided: usize },

    #[error("coordinate {index} is not finite")]
    NonFiniteCoordinate { index: usize },

    #[error("contour is not closed: first and last points are {gap:.3e} apart")]
    OpenContour { gap: f64 },

    #[error("panel {index} has non-positive length {length:.3e}")]
    DegeneratePanel { index: usize, length: f64 },

    #[error("contour self-intersects: total turning angle {total_turning:.4} rad")]
    SelfIntersecting { total_turning: f64 },

    #[error("contour runs counter-clockwise; expected clockwise from the trailing edge, lower surface first")]
    CounterClockwise,

    #[error("invalid NACA 4-digit code '{code}'")]
    InvalidNacaCode { code: String },

    #[error("panel count {panels} must be even and at least 4")]
    InvalidPanelCount { panels: usize },
}

/// Failure of one (case, control point) analysis.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("geometry error: {0}")]
    Geometry(#[from] GeometryError),

    #[error("influence matrix is singular (pivot ratio {pivot_ratio:.3e})")]
    SingularMatrix { pivot_ratio: f64 },

    #[error("invalid flow condition: {reason}")]
    InvalidCondition { reason: String },

    #[error("no stagnation point found on the surface")]
    StagnationPointNotFound,

    #[error("invalid edge-velocity distribution: {reason}")]
    EdgeDistribution { reason: String },

    #[error("condition grid row {row} has {provided} control points, expected {expected}")]
    GridShape {
        row: usize,
        expected: usize,
        provided: usize,
    },

    #[error("{surfaces} surfaces supplied for {cases} cases")]
    SurfaceCount { surfaces: usize, cases: usize },
}

impl AnalysisError {
    pub fn invalid_condition(reason: impl Into<String>) -> Self {
        Self::InvalidCondition {
            reason: reason.into(),
        }
    }

    pub fn edge_distribution(reason: impl Into<String>) -> Self {
        Self::EdgeDistribution {
            reason: reason.into(),
        }
    }

    /// True for failures that only concern the surface, not the flow condition.
    pub fn is_geometric(&self) -> bool {
        matches!(self, Self::Geometry(_) | Self::SingularMatrix { .. })
    }
}

/// Configuration loading and validation errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config field '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn geometry_errors_convert_into_analysis_errors() {
        let err: AnalysisError = GeometryError::DegeneratePanel {
            index: 3,
            length: 0.0,
        }
        .into();
        assert!(err.is_geometric());
        assert!(err.to_string().contains("panel 3"));
    }

    #[test]
    fn condition_errors_are_not_geometric() {
        let err = AnalysisError::invalid_condition("reynolds number must be positive");
        assert!(!err.is_geometric());
        assert_eq!(
            err.to_string(),
            "invalid flow condition: reynolds number must be positive"
        );
    }
}
