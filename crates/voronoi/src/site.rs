//! Polymorphic site model: a tagged variant, not a pointer-to-base hierarchy.

use crate::geometry::{closest_point_on_segment, distance, dot, Point2};

/// A point site.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointSite {
    pub position: Point2,
}

/// A line-segment site, carrying an oriented normal (left-hand side of the
/// directed segment `p1 -> p2`) used to disambiguate the two half-planes the
/// segment's two generated faces sit in.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LineSite {
    pub p1: Point2,
    pub p2: Point2,
    pub normal: Point2,
}

impl LineSite {
    pub fn new(p1: Point2, p2: Point2) -> Self {
        let dir = p2 - p1;
        let normal = crate::geometry::perp_ccw(dir).normalize();
        Self { p1, p2, normal }
    }

    #[inline]
    pub fn direction(&self) -> Point2 {
        (self.p2 - self.p1).normalize()
    }

    pub fn length(&self) -> f64 {
        distance(self.p1, self.p2)
    }

    /// Coefficients of the line through p1,p2 in `n.x*x + n.y*y = c` form,
    /// with unit `n`.
    pub fn line_coeffs(&self) -> (Point2, f64) {
        let dir = self.direction();
        let n = crate::geometry::perp_ccw(dir);
        let c = dot(n, self.p1);
        (n, c)
    }
}

/// A site: a point or a line segment.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Site {
    Point(PointSite),
    Line(LineSite),
}

impl Site {
    pub fn point(position: Point2) -> Self {
        Site::Point(PointSite { position })
    }

    pub fn line(p1: Point2, p2: Point2) -> Self {
        Site::Line(LineSite::new(p1, p2))
    }

    pub fn is_point(&self) -> bool {
        matches!(self, Site::Point(_))
    }

    pub fn is_line(&self) -> bool {
        matches!(self, Site::Line(_))
    }

    /// The point on this site nearest to `p` (for a segment: clamped to the
    /// segment itself, i.e. ignoring `in_region`).
    pub fn nearest_point(&self, p: Point2) -> Point2 {
        match self {
            Site::Point(s) => s.position,
            Site::Line(s) => closest_point_on_segment(s.p1, s.p2, p),
        }
    }

    /// Euclidean distance from `p` to this site.
    pub fn distance_to(&self, p: Point2) -> f64 {
        distance(p, self.nearest_point(p))
    }

    /// Whether `p` lies in this site's region of definition: always true for
    /// a point site; for a segment, whether `p` lies in the infinite slab
    /// bounded by the two lines perpendicular to the segment through its
    /// endpoints.
    pub fn in_region(&self, p: Point2) -> bool {
        match self {
            Site::Point(_) => true,
            Site::Line(s) => {
                let dir = s.direction();
                let t1 = dot(p - s.p1, dir);
                let t2 = dot(p - s.p2, dir);
                t1 >= 0.0 && t2 <= 0.0
            }
        }
    }

    /// Perpendicular distance from `p` to this site's supporting line
    /// (meaningful for line sites only; for point sites, equal to `distance_to`).
    pub fn line_distance(&self, p: Point2) -> f64 {
        match self {
            Site::Point(s) => distance(p, s.position),
            Site::Line(s) => {
                let (n, c) = s.line_coeffs();
                (dot(n, p) - c).abs()
            }
        }
    }

    /// Parameter in `[0,1]` along the chord `from -> to` closest to this
    /// site, used to place an edge's parabola apex marker. An approximation
    /// (projects the site's representative point onto the chord) rather than
    /// an exact extremum of the true bisector curve, which is not needed for
    /// topological correctness.
    pub fn apex_parameter(&self, from: Point2, to: Point2) -> f64 {
        let chord = to - from;
        let len2 = dot(chord, chord);
        if len2 <= 0.0 {
            return 0.5;
        }
        let rep = match self {
            Site::Point(s) => s.position,
            Site::Line(s) => closest_point_on_segment(s.p1, s.p2, (from + to) * 0.5),
        };
        (dot(rep - from, chord) / len2).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_site_always_in_region() {
        let s = Site::point(Point2::new(0.0, 0.0));
        assert!(s.in_region(Point2::new(100.0, 100.0)));
    }

    #[test]
    fn line_site_in_region_is_the_perpendicular_slab() {
        let s = Site::line(Point2::new(0.0, 0.0), Point2::new(2.0, 0.0));
        assert!(s.in_region(Point2::new(1.0, 5.0)));
        assert!(!s.in_region(Point2::new(-0.5, 0.0)));
        assert!(!s.in_region(Point2::new(2.5, 0.0)));
    }

    #[test]
    fn line_distance_is_perpendicular_even_outside_region() {
        let s = Site::line(Point2::new(0.0, 0.0), Point2::new(2.0, 0.0));
        let d = s.line_distance(Point2::new(-5.0, 3.0));
        assert!((d - 3.0).abs() < 1e-12);
    }
}
