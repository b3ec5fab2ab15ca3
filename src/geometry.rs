use nalgebra as na;
use std::f64::consts::PI;

use crate::config::GeometryConfig;
use crate::error::GeometryError;

/// Closed airfoil contour, clockwise from the trailing edge (lower surface first).
///
/// Holds N+1 points for N panels; the first and last points coincide.
#[derive(Debug, Clone, PartialEq)]
pub struct AirfoilSurface {
    points: Vec<na::Point2<f64>>,
}

impl AirfoilSurface {
    /// Validate and wrap a point sequence. The last point is snapped onto the
    /// first when the gap is within `closure_tolerance` of the chord.
    pub fn new(
        mut points: Vec<na::Point2<f64>>,
        config: &GeometryConfig,
    ) -> Result<Self, GeometryError> {
        if points.len() < 4 {
            return Err(GeometryError::TooFewPoints {
                required: 4,
                provided: points.len(),
            });
        }
        if let Some(index) = points
            .iter()
            .position(|p| !(p.x.is_finite() && p.y.is_finite()))
        {
            return Err(GeometryError::NonFiniteCoordinate { index });
        }

        let first = points[0];
        let last = points[points.len() - 1];
        let gap = na::distance(&first, &last);
        let chord = chord_of(&points);
        if gap > config.closure_tolerance * chord {
            return Err(GeometryError::OpenContour { gap });
        }
        let n = points.len();
        points[n - 1] = first;

        if signed_area(&points) > 0.0 {
            return Err(GeometryError::CounterClockwise);
        }

        Ok(Self { points })
    }

    pub fn from_coordinates(
        x: &[f64],
        y: &[f64],
        config: &GeometryConfig,
    ) -> Result<Self, GeometryError> {
        let points = x
            .iter()
            .zip(y.iter())
            .map(|(&x, &y)| na::Point2::new(x, y))
            .collect();
        Self::new(points, config)
    }

    pub fn points(&self) -> &[na::Point2<f64>] {
        &self.points
    }

    pub fn panel_count(&self) -> usize {
        self.points.len() - 1
    }

    pub fn trailing_edge(&self) -> na::Point2<f64> {
        self.points[0]
    }

    /// Surface point farthest from the trailing edge.
    pub fn leading_edge(&self) -> na::Point2<f64> {
        let te = self.trailing_edge();
        self.points
            .iter()
            .copied()
            .fold(te, |best, p| {
                if na::distance(&p, &te) > na::distance(&best, &te) {
                    p
                } else {
                    best
                }
            })
    }

    pub fn chord(&self) -> f64 {
        na::distance(&self.leading_edge(), &self.trailing_edge())
    }
}

fn chord_of(points: &[na::Point2<f64>]) -> f64 {
    let te = points[0];
    points
        .iter()
        .map(|p| na::distance(p, &te))
        .fold(0.0, f64::max)
}

/// Shoelace area; negative for a clockwise contour.
fn signed_area(points: &[na::Point2<f64>]) -> f64 {
    0.5 * points
        .windows(2)
        .map(|w| w[0].x * w[1].y - w[1].x * w[0].y)
        .sum::<f64>()
}

#[derive(Debug, Clone)]
pub struct Panel {
    pub start: na::Point2<f64>,
    pub end: na::Point2<f64>,
    pub control_point: na::Point2<f64>,
    pub normal: na::Vector2<f64>,
    pub length: f64,
    pub sin_theta: f64,
    pub cos_theta: f64,
}

impl Panel {
    fn new(index: usize, start: na::Point2<f64>, end: na::Point2<f64>) -> Result<Self, GeometryError> {
        let midpoint = na::Point2::new(
            (start.x + end.x) * 0.5,
            (start.y + end.y) * 0.5,
        );

        let dx = end.x - start.x;
        let dy = end.y - start.y;
        let length = (dx * dx + dy * dy).sqrt();
        if !(length > 0.0) {
            return Err(GeometryError::DegeneratePanel { index, length });
        }

        let sin_theta = dy / length;
        let cos_theta = dx / length;

        // Outward for a clockwise contour
        let normal = na::Vector2::new(-sin_theta, cos_theta);

        Ok(Panel {
            start,
            end,
            control_point: midpoint,
            normal,
            length,
            sin_theta,
            cos_theta,
        })
    }

    /// Unit vector from `start` to `end`.
    pub fn tangent(&self) -> na::Vector2<f64> {
        na::Vector2::new(self.cos_theta, self.sin_theta)
    }
}

/// Per-panel geometry derived from an [`AirfoilSurface`], index-aligned with it.
#[derive(Debug, Clone)]
pub struct PanelGeometry {
    panels: Vec<Panel>,
}

impl PanelGeometry {
    pub fn build(surface: &AirfoilSurface, config: &GeometryConfig) -> Result<Self, GeometryError> {
        let panels = surface
            .points()
            .windows(2)
            .enumerate()
            .map(|(i, pts)| Panel::new(i, pts[0], pts[1]))
            .collect::<Result<Vec<_>, _>>()?;

        let geometry = Self { panels };
        if config.check_winding {
            geometry.check_winding()?;
        }
        Ok(geometry)
    }

    pub fn panels(&self) -> &[Panel] {
        &self.panels
    }

    pub fn len(&self) -> usize {
        self.panels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.panels.is_empty()
    }

    /// Sum of panel vectors; zero for a closed contour.
    pub fn closure_residual(&self) -> na::Vector2<f64> {
        self.panels
            .iter()
            .map(|p| p.tangent() * p.length)
            .sum()
    }

    /// Arc length from the first surface point to each panel midpoint.
    pub fn midpoint_arc_lengths(&self) -> Vec<f64> {
        let mut travelled = 0.0;
        self.panels
            .iter()
            .map(|p| {
                let s = travelled + 0.5 * p.length;
                travelled += p.length;
                s
            })
            .collect()
    }

    /// Signed sum of the turning angles at every vertex, wrapping at the
    /// trailing edge.
    pub fn total_turning(&self) -> f64 {
        let n = self.panels.len();
        (0..n)
            .map(|i| {
                let a = self.panels[i].tangent();
                let b = self.panels[(i + 1) % n].tangent();
                let cross = a.x * b.y - a.y * b.x;
                cross.atan2(a.dot(&b))
            })
            .sum()
    }

    /// A simple clockwise contour turns by exactly -2π; a self-crossing one
    /// does not.
    fn check_winding(&self) -> Result<(), GeometryError> {
        let total_turning = self.total_turning();
        if (total_turning + 2.0 * PI).abs() > 1e-6 {
            return Err(GeometryError::SelfIntersecting { total_turning });
        }
        Ok(())
    }
}
