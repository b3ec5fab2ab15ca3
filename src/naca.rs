//! NACA 4-digit section generator.

use nalgebra as na;
use std::f64::consts::PI;

use crate::config::GeometryConfig;
use crate::error::GeometryError;
use crate::geometry::AirfoilSurface;

/// Parsed NACA 4-digit designation, as chord fractions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Naca4 {
    pub max_camber: f64,
    pub camber_position: f64,
    pub thickness: f64,
}

impl Naca4 {
    pub fn parse(code: &str) -> Result<Self, GeometryError> {
        let invalid = || GeometryError::InvalidNacaCode {
            code: code.to_string(),
        };
        if code.len() != 4 || !code.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }

        let m = code[0..1].parse::<f64>().map_err(|_| invalid())? / 100.0;
        let p = code[1..2].parse::<f64>().map_err(|_| invalid())? / 10.0;
        let t = code[2..4].parse::<f64>().map_err(|_| invalid())? / 100.0;

        if t <= 0.0 || (m > 0.0) != (p > 0.0) {
            return Err(invalid());
        }

        Ok(Self {
            max_camber: m,
            camber_position: p,
            thickness: t,
        })
    }

    /// Half-thickness, with the closed trailing-edge coefficient.
    fn thickness_at(&self, x: f64) -> f64 {
        5.0 * self.thickness
            * (0.2969 * x.sqrt() - 0.1260 * x - 0.3516 * x.powi(2) + 0.2843 * x.powi(3)
                - 0.1036 * x.powi(4))
    }

    /// Mean camber line height and slope.
    fn camber_at(&self, x: f64) -> (f64, f64) {
        let m = self.max_camber;
        let p = self.camber_position;
        if m == 0.0 {
            return (0.0, 0.0);
        }
        if x < p {
            (
                m * (x / p.powi(2)) * (2.0 * p - x),
                2.0 * m / p.powi(2) * (p - x),
            )
        } else {
            (
                m * ((1.0 - x) / (1.0 - p).powi(2)) * (1.0 + x - 2.0 * p),
                2.0 * m / (1.0 - p).powi(2) * (p - x),
            )
        }
    }

    fn surface_point(&self, x: f64, upper: bool) -> na::Point2<f64> {
        let (yc, dyc_dx) = self.camber_at(x);
        let yt = self.thickness_at(x);
        let theta = f64::atan(dyc_dx);
        if upper {
            na::Point2::new(x - yt * theta.sin(), yc + yt * theta.cos())
        } else {
            na::Point2::new(x + yt * theta.sin(), yc - yt * theta.cos())
        }
    }

    /// Closed clockwise surface with `num_panels` cosine-spaced panels,
    /// starting at the trailing edge on the lower surface.
    pub fn surface(&self, num_panels: usize) -> Result<AirfoilSurface, GeometryError> {
        if num_panels < 4 || num_panels % 2 != 0 {
            return Err(GeometryError::InvalidPanelCount { panels: num_panels });
        }
        let half = num_panels / 2;
        let theta_spacing = PI / half as f64;

        let x_points: Vec<f64> = (0..=half)
            .map(|i| 0.5 * (1.0 - f64::cos(i as f64 * theta_spacing)))
            .collect();

        let lower = x_points.iter().rev().map(|&x| self.surface_point(x, false));
        // Leading edge is shared, so the upper surface skips it
        let upper = x_points.iter().skip(1).map(|&x| self.surface_point(x, true));
        let mut points: Vec<na::Point2<f64>> = lower.chain(upper).collect();

        let n = points.len();
        points[n - 1] = points[0];

        AirfoilSurface::new(points, &GeometryConfig::default())
    }
}

/// Convenience wrapper: parse `code` and build its surface.
pub fn naca4(code: &str, num_panels: usize) -> Result<AirfoilSurface, GeometryError> {
    Naca4::parse(code)?.surface(num_panels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn parses_designation() {
        let section = Naca4::parse("2412").unwrap();
        assert_abs_diff_eq!(section.max_camber, 0.02);
        assert_abs_diff_eq!(section.camber_position, 0.4);
        assert_abs_diff_eq!(section.thickness, 0.12);
    }

    #[test]
    fn rejects_malformed_codes() {
        for code in ["241", "24a2", "0000", "2012", "0412"] {
            assert!(Naca4::parse(code).is_err(), "{code} should be rejected");
        }
    }

    #[test]
    fn surface_has_one_point_per_panel_plus_closure() {
        let surface = naca4("0012", 80).unwrap();
        assert_eq!(surface.points().len(), 81);
        assert_eq!(surface.panel_count(), 80);
        assert_eq!(surface.points()[0], surface.points()[80]);
        assert_abs_diff_eq!(surface.trailing_edge().x, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(surface.trailing_edge().y, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn symmetric_section_mirrors_about_chord_line() {
        let surface = naca4("0012", 40).unwrap();
        let pts = surface.points();
        for i in 0..=40 {
            let mirror = pts[40 - i];
            assert_abs_diff_eq!(pts[i].x, mirror.x, epsilon = 1e-14);
            assert_abs_diff_eq!(pts[i].y, -mirror.y, epsilon = 1e-14);
        }
        // Lower surface first
        assert!(pts[10].y < 0.0);
        assert!(pts[30].y > 0.0);
    }

    #[test]
    fn rejects_odd_panel_count() {
        assert_eq!(
            naca4("0012", 41).unwrap_err(),
            GeometryError::InvalidPanelCount { panels: 41 }
        );
    }
}
