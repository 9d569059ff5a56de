//! Error types surfaced by insertion.
//!
//! Hand-rolled `Display` + `std::error::Error`, matching the teacher's core
//! library convention (`geom4::volume::VolumeError`) rather than pulling in a
//! derive-macro error crate. The CLI binary, which orchestrates rather than
//! computes, is the layer that reaches for `anyhow`.

use std::fmt;

/// Why a proposed site was rejected before any topology was touched.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InvalidSiteReason {
    /// The point does not satisfy `|p| < far_radius`.
    OutsideDomain,
    /// The point coincides with an existing point site.
    Coincident,
    /// The point lies on an existing edge or vertex.
    OnEdge,
    /// The endpoints refer to the same point, or the segment has zero length.
    DegenerateSegment,
    /// The segment crosses an existing segment site.
    SelfIntersecting,
    /// A point handle passed to `insert_line_site` does not name a live point site.
    InvalidHandle,
}

impl fmt::Display for InvalidSiteReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidSiteReason::OutsideDomain => write!(f, "site lies outside the far circle"),
            InvalidSiteReason::Coincident => write!(f, "site coincides with an existing point site"),
            InvalidSiteReason::OnEdge => write!(f, "site lies exactly on an existing edge or vertex"),
            InvalidSiteReason::DegenerateSegment => write!(f, "segment site is degenerate (zero length)"),
            InvalidSiteReason::SelfIntersecting => {
                write!(f, "segment site crosses an existing segment site")
            }
            InvalidSiteReason::InvalidHandle => write!(f, "point handle does not name a live point site"),
        }
    }
}

/// Errors surfaced by `insert_point_site` / `insert_line_site`.
#[derive(Debug)]
pub enum InsertError {
    /// Rejected before any mutation; diagram is unchanged.
    InvalidSite(InvalidSiteReason),
    /// The flood fill could not resolve the IN/OUT boundary; diagram rolled back.
    PredicateUndecidable,
    /// The bisector solver failed to converge or left the expected region; diagram rolled back.
    PositionerFailed,
    /// The post-insertion checker rejected the result; diagram state is not
    /// guaranteed restorable. Carries the first violated invariant's description.
    InvariantViolated(String),
}

impl fmt::Display for InsertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InsertError::InvalidSite(reason) => write!(f, "invalid site: {reason}"),
            InsertError::PredicateUndecidable => {
                write!(f, "flood fill could not decide the IN/OUT boundary")
            }
            InsertError::PositionerFailed => {
                write!(f, "vertex positioner failed to converge or left its region")
            }
            InsertError::InvariantViolated(msg) => write!(f, "invariant violated: {msg}"),
        }
    }
}

impl std::error::Error for InsertError {}

/// Recoverable errors (1-3 from the error-handling design) restore the
/// diagram to its pre-insertion state; this predicate tells callers whether a
/// given failure left the diagram untouched.
impl InsertError {
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, InsertError::InvariantViolated(_))
    }
}
