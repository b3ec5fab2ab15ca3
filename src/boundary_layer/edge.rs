//! Edge-velocity distributions along one surface, measured from the
//! stagnation point.

use crate::error::{AnalysisError, Result};
use crate::geometry::PanelGeometry;
use crate::surface::SurfaceField;

/// Edge velocity Ve(s) and its gradient dVe/ds at each station.
///
/// Arc lengths are strictly increasing and finite. Velocities after the
/// first station may be non-finite; the marchers recover from those.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeDistribution {
    arc_length: Vec<f64>,
    velocity: Vec<f64>,
    gradient: Vec<f64>,
}

impl EdgeDistribution {
    /// Build a distribution and its gradient by central differences
    /// (one-sided at the ends).
    pub fn new(arc_length: Vec<f64>, velocity: Vec<f64>) -> Result<Self> {
        if arc_length.len() != velocity.len() {
            return Err(AnalysisError::edge_distribution(format!(
                "{} arc lengths but {} velocities",
                arc_length.len(),
                velocity.len()
            )));
        }
        if arc_length.len() < 2 {
            return Err(AnalysisError::edge_distribution(format!(
                "need at least 2 stations, got {}",
                arc_length.len()
            )));
        }
        if arc_length.iter().any(|s| !s.is_finite()) {
            return Err(AnalysisError::edge_distribution("arc length is not finite"));
        }
        if let Some(i) = arc_length.windows(2).position(|w| !(w[1] > w[0])) {
            return Err(AnalysisError::edge_distribution(format!(
                "arc length not increasing at station {}",
                i + 1
            )));
        }
        if !(velocity[0].is_finite() && velocity[0] > 0.0) {
            return Err(AnalysisError::edge_distribution(format!(
                "first edge velocity must be positive, got {}",
                velocity[0]
            )));
        }

        let gradient = differentiate(&arc_length, &velocity);
        Ok(Self {
            arc_length,
            velocity,
            gradient,
        })
    }

    pub fn len(&self) -> usize {
        self.arc_length.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arc_length.is_empty()
    }

    pub fn arc_length(&self) -> &[f64] {
        &self.arc_length
    }

    pub fn velocity(&self) -> &[f64] {
        &self.velocity
    }

    pub fn gradient(&self) -> &[f64] {
        &self.gradient
    }

    /// Linearly interpolated Ve, clamped to the end values outside the range.
    pub fn velocity_at(&self, s: f64) -> f64 {
        interpolate(&self.arc_length, &self.velocity, s)
    }

    pub fn gradient_at(&self, s: f64) -> f64 {
        interpolate(&self.arc_length, &self.gradient, s)
    }

    /// Stations from `from` onward. The gradient is sliced, not recomputed,
    /// so the end station keeps its central difference.
    pub fn tail(&self, from: usize) -> Self {
        let from = from.min(self.len().saturating_sub(1));
        Self {
            arc_length: self.arc_length[from..].to_vec(),
            velocity: self.velocity[from..].to_vec(),
            gradient: self.gradient[from..].to_vec(),
        }
    }
}

fn differentiate(s: &[f64], v: &[f64]) -> Vec<f64> {
    let n = s.len();
    (0..n)
        .map(|i| {
            let (lo, hi) = match i {
                0 => (0, 1),
                i if i == n - 1 => (n - 2, n - 1),
                i => (i - 1, i + 1),
            };
            (v[hi] - v[lo]) / (s[hi] - s[lo])
        })
        .collect()
}

fn interpolate(xs: &[f64], values: &[f64], x: f64) -> f64 {
    let hi = xs.partition_point(|&xi| xi <= x);
    if hi == 0 {
        return values[0];
    }
    if hi == xs.len() {
        return values[xs.len() - 1];
    }
    let lo = hi - 1;
    let t = (x - xs[lo]) / (xs[hi] - xs[lo]);
    values[lo] + t * (values[hi] - values[lo])
}

/// Upper and lower edge distributions on either side of the stagnation point.
#[derive(Debug, Clone, PartialEq)]
pub struct StagnationSplit {
    /// Arc length of the stagnation point, measured like
    /// [`PanelGeometry::midpoint_arc_lengths`].
    pub stagnation_arc_length: f64,
    pub upper: EdgeDistribution,
    pub lower: EdgeDistribution,
    /// Panel index of each upper station.
    pub upper_panels: Vec<usize>,
    /// Panel index of each lower station.
    pub lower_panels: Vec<usize>,
}

/// Locate the stagnation point as the first sign change of the tangential
/// velocity (negative to positive) walking from the lower trailing edge,
/// then march outward from it along both surfaces.
pub fn split_at_stagnation(geometry: &PanelGeometry, field: &SurfaceField) -> Result<StagnationSplit> {
    let vt = &field.tangential_velocity;
    let mid = geometry.midpoint_arc_lengths();
    let n = vt.len();

    let k = (1..n)
        .find(|&k| vt[k - 1] <= 0.0 && vt[k] > 0.0)
        .ok_or(AnalysisError::StagnationPointNotFound)?;

    let fraction = vt[k - 1] / (vt[k - 1] - vt[k]);
    let stagnation_arc_length = mid[k - 1] + fraction * (mid[k] - mid[k - 1]);
    log::trace!(
        "stagnation between panels {} and {} at s = {:.6}",
        k - 1,
        k,
        stagnation_arc_length
    );

    let upper_panels: Vec<usize> = (k..n).collect();
    let lower_panels: Vec<usize> = (0..k)
        .rev()
        .filter(|&j| stagnation_arc_length - mid[j] > 0.0)
        .collect();

    let upper = EdgeDistribution::new(
        upper_panels.iter().map(|&j| mid[j] - stagnation_arc_length).collect(),
        upper_panels.iter().map(|&j| vt[j].abs()).collect(),
    )?;
    let lower = EdgeDistribution::new(
        lower_panels.iter().map(|&j| stagnation_arc_length - mid[j]).collect(),
        lower_panels.iter().map(|&j| vt[j].abs()).collect(),
    )?;

    Ok(StagnationSplit {
        stagnation_arc_length,
        upper,
        lower,
        upper_panels,
        lower_panels,
    })
}
