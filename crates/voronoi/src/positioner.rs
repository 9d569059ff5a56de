//! Bisector-intersection solver: given three sites, the Voronoi vertex
//! position and its clearance radius.
//!
//! Grounded on the teacher's `geom2::solvers::fixed_point_in_poly` — a
//! rank/case-based solve that falls back through increasingly degenerate
//! branches, each returning `Option`/`Result` rather than panicking.

use crate::config::VoronoiConfig;
use crate::error::InsertError;
use crate::geometry::{distance, Point2};
use crate::rootfind::bracketed_root;
use crate::site::Site;

/// Solves for the point equidistant from three sites (and the split-point
/// search used when a new segment site's bisector degenerates).
pub trait VertexPositioner {
    /// Position of the Voronoi vertex defined by three sites, and the common
    /// clearance radius. `hint` is an existing nearby point (e.g. the vertex
    /// being replaced) used to seed iterative solves and disambiguate
    /// multiple roots.
    fn position(
        &self,
        sites: [&Site; 3],
        hint: Point2,
        cfg: VoronoiConfig,
    ) -> Result<(Point2, f64), InsertError>;

    /// Parameter `t` along the chord `from -> to` (the edge's two known
    /// endpoints) at which the edge — already equidistant between
    /// `sites[0]` and `sites[1]` by construction — also becomes equidistant
    /// from `sites[2]`.
    fn position_on_edge(
        &self,
        from: Point2,
        to: Point2,
        sites: [&Site; 3],
        cfg: VoronoiConfig,
    ) -> Option<f64>;
}

/// Default positioner: exact circumcenter for three point sites, a
/// relaxation bootstrap followed by Newton polishing for any combination
/// involving a line site.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultPositioner;

impl VertexPositioner for DefaultPositioner {
    fn position(
        &self,
        sites: [&Site; 3],
        hint: Point2,
        cfg: VoronoiConfig,
    ) -> Result<(Point2, f64), InsertError> {
        if let (Site::Point(a), Site::Point(b), Site::Point(c)) = (sites[0], sites[1], sites[2]) {
            if let Some(p) = circumcenter(a.position, b.position, c.position) {
                return Ok((p, distance(p, a.position)));
            }
        }
        solve_general(sites, hint, cfg).ok_or(InsertError::PositionerFailed)
    }

    fn position_on_edge(
        &self,
        from: Point2,
        to: Point2,
        sites: [&Site; 3],
        cfg: VoronoiConfig,
    ) -> Option<f64> {
        bracketed_root(
            |t| {
                let p = from + (to - from) * t;
                sites[0].distance_to(p) - sites[2].distance_to(p)
            },
            cfg.eps_root,
        )
    }
}

/// Exact circumcenter of a triangle via the classical determinant formula.
/// `None` if the three points are (nearly) collinear.
pub fn circumcenter(a: Point2, b: Point2, c: Point2) -> Option<Point2> {
    let d = 2.0 * (a.x * (b.y - c.y) + b.x * (c.y - a.y) + c.x * (a.y - b.y));
    if d.abs() < 1e-12 {
        return None;
    }
    let a2 = a.x * a.x + a.y * a.y;
    let b2 = b.x * b.x + b.y * b.y;
    let c2 = c.x * c.x + c.y * c.y;
    let ux = (a2 * (b.y - c.y) + b2 * (c.y - a.y) + c2 * (a.y - b.y)) / d;
    let uy = (a2 * (c.x - b.x) + b2 * (a.x - c.x) + c2 * (b.x - a.x)) / d;
    Some(Point2::new(ux, uy))
}

/// Signed equidistance residuals: `[D0-D1, D0-D2]`.
fn residual(sites: [&Site; 3], p: Point2) -> [f64; 2] {
    let d0 = sites[0].distance_to(p);
    let d1 = sites[1].distance_to(p);
    let d2 = sites[2].distance_to(p);
    [d0 - d1, d0 - d2]
}

fn anchor(site: &Site, near: Point2) -> Point2 {
    site.nearest_point(near)
}

/// Relaxation bootstrap (repeated circumcenter-of-anchors) followed by a
/// damped Gauss-Newton polish with a finite-difference Jacobian.
fn solve_general(sites: [&Site; 3], hint: Point2, cfg: VoronoiConfig) -> Option<(Point2, f64)> {
    let mut guess = hint;
    for _ in 0..8 {
        let anchors = [
            anchor(sites[0], guess),
            anchor(sites[1], guess),
            anchor(sites[2], guess),
        ];
        match circumcenter(anchors[0], anchors[1], anchors[2]) {
            Some(next) if next.x.is_finite() && next.y.is_finite() => guess = next,
            _ => break,
        }
    }

    let h = 1e-6;
    for _ in 0..50 {
        let f0 = residual(sites, guess);
        let scale = 1.0 + sites.iter().map(|s| s.distance_to(guess)).fold(0.0, f64::max);
        if f0[0].abs() <= cfg.eps_predicate * scale && f0[1].abs() <= cfg.eps_predicate * scale {
            let r = (sites[0].distance_to(guess)
                + sites[1].distance_to(guess)
                + sites[2].distance_to(guess))
                / 3.0;
            return Some((guess, r));
        }
        let fx = residual(sites, guess + Point2::new(h, 0.0));
        let fy = residual(sites, guess + Point2::new(0.0, h));
        let j11 = (fx[0] - f0[0]) / h;
        let j12 = (fy[0] - f0[0]) / h;
        let j21 = (fx[1] - f0[1]) / h;
        let j22 = (fy[1] - f0[1]) / h;
        let det = j11 * j22 - j12 * j21;
        if det.abs() < 1e-14 {
            break;
        }
        let dx = (j22 * f0[0] - j12 * f0[1]) / det;
        let dy = (j11 * f0[1] - j21 * f0[0]) / det;
        guess -= Point2::new(dx, dy);
        if !guess.x.is_finite() || !guess.y.is_finite() {
            return None;
        }
    }
    let f = residual(sites, guess);
    let scale = 1.0 + sites.iter().map(|s| s.distance_to(guess)).fold(0.0, f64::max);
    if f[0].abs() <= 1e-6 * scale && f[1].abs() <= 1e-6 * scale {
        let r = (sites[0].distance_to(guess) + sites[1].distance_to(guess) + sites[2].distance_to(guess)) / 3.0;
        Some((guess, r))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn circumcenter_of_right_triangle() {
        let a = Point2::new(0.0, 0.0);
        let b = Point2::new(2.0, 0.0);
        let c = Point2::new(0.0, 2.0);
        let center = circumcenter(a, b, c).unwrap();
        assert!((center - Point2::new(1.0, 1.0)).norm() < 1e-9);
    }

    #[test]
    fn circumcenter_collinear_is_none() {
        let a = Point2::new(0.0, 0.0);
        let b = Point2::new(1.0, 0.0);
        let c = Point2::new(2.0, 0.0);
        assert!(circumcenter(a, b, c).is_none());
    }

    #[test]
    fn positioner_matches_spec_scenario_one() {
        let s0 = Site::point(Point2::new(1.0, 0.0));
        let s1 = Site::point(Point2::new(-1.0, 0.0));
        let s2 = Site::point(Point2::new(0.0, 1.0));
        let pos = DefaultPositioner;
        let cfg = VoronoiConfig::default();
        let (p, _r) = pos.position([&s0, &s1, &s2], Point2::new(0.0, 0.0), cfg).unwrap();
        assert!((p - Point2::new(0.0, -1.0 / 3.0)).norm() < 1e-6);
    }

    #[test]
    fn positioner_handles_point_and_line_mix() {
        let s0 = Site::point(Point2::new(-2.0, 1.0));
        let s1 = Site::point(Point2::new(2.0, 1.0));
        let s2 = Site::line(Point2::new(-5.0, -1.0), Point2::new(5.0, -1.0));
        let pos = DefaultPositioner;
        let cfg = VoronoiConfig::default();
        let (p, r) = pos.position([&s0, &s1, &s2], Point2::new(0.0, 0.0), cfg).unwrap();
        let d0 = s0.distance_to(p);
        let d1 = s1.distance_to(p);
        let d2 = s2.distance_to(p);
        assert!((d0 - r).abs() < 1e-4);
        assert!((d1 - r).abs() < 1e-4);
        assert!((d2 - r).abs() < 1e-4);
    }
}
