//! Two-dimensional airfoil section analysis.
//!
//! A Hess–Smith panel method (constant-strength sources plus one shared
//! vortex, closed by the Kutta condition) gives the inviscid surface
//! velocity, pressure and section coefficients. Thwaites' method and Head's
//! entrainment method then march the boundary layer from the stagnation
//! point to the trailing edge on both surfaces.
//!
//! ```no_run
//! use panelflow::{analyze_section, naca4, AnalysisConfig, FlowCondition};
//!
//! let surface = naca4("2412", 120)?;
//! let result = analyze_section(
//!     &surface,
//!     FlowCondition::from_degrees(4.0, 3e6),
//!     &AnalysisConfig::default(),
//! )?;
//! println!("cl = {:.3}, cd = {:.4}", result.coefficients.cl, result.coefficients.cd());
//! # Ok::<(), panelflow::AnalysisError>(())
//! ```

pub mod analysis;
pub mod batch;
pub mod boundary_layer;
pub mod config;
pub mod error;
pub mod forces;
pub mod geometry;
pub mod influence;
pub mod naca;
pub mod solver;
pub mod surface;

pub use analysis::{analyze_section, BoundaryLayerSolution, FlowCondition, PreparedSection, SectionAnalysis};
pub use batch::{run_batch, BatchIndex, BatchResult, BatchSurfaces, CaseOutcome, CaseStatus, ConditionGrid};
pub use boundary_layer::{
    BoundaryLayerStation, Profile, RecoveryEvent, RecoveryKind, Regime, SurfaceBoundaryLayer, SurfaceSide,
    TransitionCause, TransitionPoint, TransitionState,
};
pub use config::{AnalysisConfig, BoundaryLayerConfig, GeometryConfig, SolverConfig, TransitionRule};
pub use error::{AnalysisError, ConfigError, GeometryError, Result};
pub use forces::SectionCoefficients;
pub use geometry::{AirfoilSurface, Panel, PanelGeometry};
pub use naca::{naca4, Naca4};
pub use solver::{SectionSolver, SingularityStrengths};
pub use surface::SurfaceField;
