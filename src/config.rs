//! Analysis configuration.
//!
//! Every field has a serde default, so a partial JSON file only needs to name
//! the values it overrides.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::boundary_layer::thwaites::MIN_SEPARATION_LAMBDA;
use crate::error::ConfigError;

/// Top-level configuration for a section analysis or batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub geometry: GeometryConfig,

    #[serde(default)]
    pub solver: SolverConfig,

    #[serde(default)]
    pub boundary_layer: BoundaryLayerConfig,

    /// Moment reference point as a fraction of chord from the leading edge.
    #[serde(default = "default_moment_reference")]
    pub moment_reference: f64,

    /// Spread batch cases over the rayon thread pool.
    #[serde(default = "default_parallel")]
    pub parallel: bool,
}

fn default_moment_reference() -> f64 { 0.25 }
fn default_parallel() -> bool { true }

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            geometry: GeometryConfig::default(),
            solver: SolverConfig::default(),
            boundary_layer: BoundaryLayerConfig::default(),
            moment_reference: default_moment_reference(),
            parallel: default_parallel(),
        }
    }
}

/// Surface validation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometryConfig {
    /// Allowed gap between first and last point, relative to chord.
    #[serde(default = "default_closure_tolerance")]
    pub closure_tolerance: f64,

    /// Reject contours whose total turning angle is not one full turn.
    #[serde(default = "default_check_winding")]
    pub check_winding: bool,
}

fn default_closure_tolerance() -> f64 { 1e-9 }
fn default_check_winding() -> bool { true }

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            closure_tolerance: default_closure_tolerance(),
            check_winding: default_check_winding(),
        }
    }
}

/// Linear solve settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Smallest acceptable ratio of min to max |U_ii| in the LU factors.
    #[serde(default = "default_pivot_tolerance")]
    pub pivot_tolerance: f64,
}

fn default_pivot_tolerance() -> f64 { 1e-12 }

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            pivot_tolerance: default_pivot_tolerance(),
        }
    }
}

/// Empirical rule that ends the laminar march.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionRule {
    /// Only Thwaites' laminar separation criterion.
    LaminarSeparation,
    /// Michel's Re_theta/Re_x criterion, plus laminar separation.
    Michel,
}

/// Boundary-layer marching settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundaryLayerConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Momentum thickness at the first station, in chord units.
    #[serde(default = "default_initial_momentum_thickness")]
    pub initial_momentum_thickness: f64,

    /// Thwaites lambda below which the laminar layer separates.
    #[serde(default = "default_separation_lambda")]
    pub separation_lambda: f64,

    #[serde(default = "default_transition_rule")]
    pub transition_rule: TransitionRule,

    /// Largest relative change in H between laminar stations before the
    /// station is replaced by its predecessor.
    #[serde(default = "default_laminar_jump_tolerance")]
    pub laminar_jump_tolerance: f64,

    /// Relative convergence tolerance of the turbulent fixed point.
    #[serde(default = "default_turbulent_tolerance")]
    pub turbulent_tolerance: f64,

    /// Fixed-point iteration cap per turbulent station.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    /// Lower bound on the starting H1 of the turbulent march.
    #[serde(default = "default_h1_floor")]
    pub h1_floor: f64,
}

fn default_enabled() -> bool { true }
fn default_initial_momentum_thickness() -> f64 { 1e-5 }
fn default_separation_lambda() -> f64 { -0.09 }
fn default_transition_rule() -> TransitionRule { TransitionRule::Michel }
fn default_laminar_jump_tolerance() -> f64 { 1.0 }
fn default_turbulent_tolerance() -> f64 { 1e-6 }
fn default_max_iterations() -> usize { 100 }
fn default_h1_floor() -> f64 { 3.3 }

impl Default for BoundaryLayerConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            initial_momentum_thickness: default_initial_momentum_thickness(),
            separation_lambda: default_separation_lambda(),
            transition_rule: default_transition_rule(),
            laminar_jump_tolerance: default_laminar_jump_tolerance(),
            turbulent_tolerance: default_turbulent_tolerance(),
            max_iterations: default_max_iterations(),
            h1_floor: default_h1_floor(),
        }
    }
}

impl AnalysisConfig {
    /// Load a JSON config file and validate it.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&content)
    }

    /// Parse and validate a JSON config.
    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        let config: AnalysisConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn with_boundary_layer(mut self, boundary_layer: BoundaryLayerConfig) -> Self {
        self.boundary_layer = boundary_layer;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.geometry.closure_tolerance >= 0.0) {
            return Err(ConfigError::invalid(
                "geometry.closure_tolerance",
                "must be non-negative",
            ));
        }
        if !(self.solver.pivot_tolerance > 0.0 && self.solver.pivot_tolerance < 1.0) {
            return Err(ConfigError::invalid(
                "solver.pivot_tolerance",
                "must lie in (0, 1)",
            ));
        }
        if !(0.0..=1.0).contains(&self.moment_reference) {
            return Err(ConfigError::invalid(
                "moment_reference",
                "must be a chord fraction in [0, 1]",
            ));
        }

        let bl = &self.boundary_layer;
        if !(bl.initial_momentum_thickness > 0.0) {
            return Err(ConfigError::invalid(
                "boundary_layer.initial_momentum_thickness",
                "must be positive",
            ));
        }
        if !(bl.separation_lambda > MIN_SEPARATION_LAMBDA && bl.separation_lambda < 0.0) {
            return Err(ConfigError::invalid(
                "boundary_layer.separation_lambda",
                format!("must lie in ({}, 0)", MIN_SEPARATION_LAMBDA),
            ));
        }
        if !(bl.laminar_jump_tolerance > 0.0) {
            return Err(ConfigError::invalid(
                "boundary_layer.laminar_jump_tolerance",
                "must be positive",
            ));
        }
        if !(bl.turbulent_tolerance > 0.0) {
            return Err(ConfigError::invalid(
                "boundary_layer.turbulent_tolerance",
                "must be positive",
            ));
        }
        if bl.max_iterations == 0 {
            return Err(ConfigError::invalid(
                "boundary_layer.max_iterations",
                "must be at least 1",
            ));
        }
        if !(bl.h1_floor > 3.0) {
            return Err(ConfigError::invalid(
                "boundary_layer.h1_floor",
                "must exceed 3.0 for the entrainment correlation",
            ));
        }
        Ok(())
    }
}
