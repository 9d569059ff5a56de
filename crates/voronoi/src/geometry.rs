//! Planar geometric primitives: points, vectors, and the right-of-line test.
//!
//! Kept deliberately small — the spec treats these as an external collaborator
//! with interfaces assumed available; this module is the concrete instance of
//! that collaborator the rest of the crate is built against.

use nalgebra::Vector2;

/// A point (or free vector) in the plane.
pub type Point2 = Vector2<f64>;

#[inline]
pub fn dot(a: Point2, b: Point2) -> f64 {
    a.x * b.x + a.y * b.y
}

/// Scalar (z-component) of the 3D cross product of two planar vectors.
#[inline]
pub fn cross(a: Point2, b: Point2) -> f64 {
    a.x * b.y - a.y * b.x
}

#[inline]
pub fn norm(a: Point2) -> f64 {
    (a.x * a.x + a.y * a.y).sqrt()
}

#[inline]
pub fn distance(a: Point2, b: Point2) -> f64 {
    norm(a - b)
}

/// Signed area of the parallelogram spanned by (b-a, p-a); positive when `p`
/// is to the left of the directed line `a -> b`.
#[inline]
pub fn right_of_line(a: Point2, b: Point2, p: Point2) -> f64 {
    cross(b - a, p - a)
}

/// Closest point on the closed segment `[a, b]` to `p`.
pub fn closest_point_on_segment(a: Point2, b: Point2, p: Point2) -> Point2 {
    let ab = b - a;
    let len2 = dot(ab, ab);
    if len2 <= 0.0 {
        return a;
    }
    let t = (dot(p - a, ab) / len2).clamp(0.0, 1.0);
    a + ab * t
}

/// Vector perpendicular to `v` (same length), rotated 90 degrees counter-clockwise.
/// Callers that need a unit normal must normalize the result themselves.
#[inline]
pub fn perp_ccw(v: Point2) -> Point2 {
    Point2::new(-v.y, v.x)
}

/// Whether the open segments `[a,b]` and `[c,d]` cross (sharing an endpoint
/// does not count as crossing). Standard orientation test, grounded on the
/// same `cross`/`right_of_line` primitives used elsewhere in this module.
pub fn segments_intersect(a: Point2, b: Point2, c: Point2, d: Point2) -> bool {
    let d1 = right_of_line(a, b, c);
    let d2 = right_of_line(a, b, d);
    let d3 = right_of_line(c, d, a);
    let d4 = right_of_line(c, d, b);
    (d1 > 0.0) != (d2 > 0.0) && (d3 > 0.0) != (d4 > 0.0) && d1 != 0.0 && d2 != 0.0 && d3 != 0.0 && d4 != 0.0
}
