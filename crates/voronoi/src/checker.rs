//! Post-insertion invariant audit.
//!
//! `DiagramView` exposes exactly the adjacency and attribute queries the
//! insertion pipeline itself uses — no privileged access path into
//! `VoronoiDiagram`'s private fields. Grounded on the teacher's habit of
//! putting a small trait at every algorithm seam (e.g. `rand4::PolytopeGenerator`
//! with its own `validate()` method).

use crate::geometry::Point2;
use crate::graph::{EdgeId, FaceId, Incidence, SiteId, VertexId, VertexStatus, VertexType};
use crate::site::Site;

pub trait DiagramView {
    fn vertex_ids(&self) -> Vec<VertexId>;
    fn vertex_position(&self, v: VertexId) -> Point2;
    fn vertex_clearance(&self, v: VertexId) -> f64;
    fn vertex_status(&self, v: VertexId) -> VertexStatus;
    fn vertex_type(&self, v: VertexId) -> VertexType;

    fn face_ids(&self) -> Vec<FaceId>;
    fn face_incidence(&self, f: FaceId) -> Incidence;
    fn face_site(&self, f: FaceId) -> Option<SiteId>;
    fn face_cycle(&self, f: FaceId) -> Vec<EdgeId>;

    fn edge_source(&self, e: EdgeId) -> VertexId;
    fn edge_twin(&self, e: EdgeId) -> EdgeId;
    fn edge_next(&self, e: EdgeId) -> EdgeId;
    fn edge_face(&self, e: EdgeId) -> FaceId;
    fn out_edges(&self, v: VertexId) -> Vec<EdgeId>;

    fn site_ids(&self) -> Vec<SiteId>;
    fn site(&self, id: SiteId) -> Site;

    fn eps_predicate(&self) -> f64;

    fn edge_target(&self, e: EdgeId) -> VertexId {
        self.edge_source(self.edge_twin(e))
    }
}

/// Result of a full invariant audit: either clean, or the description of the
/// first violation encountered.
#[derive(Clone, Debug, PartialEq)]
pub enum CheckReport {
    Ok,
    Violation(String),
}

impl CheckReport {
    pub fn is_ok(&self) -> bool {
        matches!(self, CheckReport::Ok)
    }
}

pub trait Checker {
    fn check_report(&self, view: &dyn DiagramView) -> CheckReport;

    fn is_valid(&self, view: &dyn DiagramView) -> bool {
        self.check_report(view).is_ok()
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultChecker;

impl Checker for DefaultChecker {
    fn check_report(&self, view: &dyn DiagramView) -> CheckReport {
        if let Some(msg) = check_twin_and_cycles(view) {
            return CheckReport::Violation(msg);
        }
        if let Some(msg) = check_degrees(view) {
            return CheckReport::Violation(msg);
        }
        if let Some(msg) = check_background_face_present(view) {
            return CheckReport::Violation(msg);
        }
        if let Some(msg) = check_clearance_consistency(view) {
            return CheckReport::Violation(msg);
        }
        if let Some(msg) = check_settled_statuses(view) {
            return CheckReport::Violation(msg);
        }
        if let Some(msg) = check_edge_midpoints_nearest_site(view) {
            return CheckReport::Violation(msg);
        }
        CheckReport::Ok
    }
}

fn check_twin_and_cycles(view: &dyn DiagramView) -> Option<String> {
    for f in view.face_ids() {
        let cycle = view.face_cycle(f);
        if cycle.is_empty() {
            continue;
        }
        for &e in &cycle {
            if view.edge_twin(view.edge_twin(e)) != e {
                return Some(format!("edge {e:?} is not its own twin's twin"));
            }
            if view.edge_face(e) != f {
                return Some(format!("edge {e:?} claims face {:?} but sits in face {f:?}'s cycle", view.edge_face(e)));
            }
        }
        let last = *cycle.last().unwrap();
        if view.edge_next(last) != cycle[0] {
            return Some(format!("face {f:?} cycle does not close"));
        }
    }
    None
}

fn check_degrees(view: &dyn DiagramView) -> Option<String> {
    for v in view.vertex_ids() {
        let degree = view.out_edges(v).len();
        if degree < 2 {
            return Some(format!("vertex {v:?} has degree {degree} (< 2)"));
        }
    }
    None
}

fn check_background_face_present(view: &dyn DiagramView) -> Option<String> {
    let siteless = view.face_ids().iter().filter(|&&f| view.face_site(f).is_none()).count();
    match siteless {
        1 => None,
        0 => Some("no background/outer face remains".to_string()),
        n => Some(format!("{n} faces are siteless, expected exactly one outer face")),
    }
}

fn check_clearance_consistency(view: &dyn DiagramView) -> Option<String> {
    let eps = view.eps_predicate().max(1e-6);
    for v in view.vertex_ids() {
        if view.vertex_type(v) == VertexType::Outer {
            // The three bootstrap corners are fixed props, not true
            // equidistant Voronoi vertices; they may border faces whose
            // sites are nowhere near equidistant from them.
            continue;
        }
        let pos = view.vertex_position(v);
        let r = view.vertex_clearance(v);
        let faces: Vec<FaceId> = view
            .out_edges(v)
            .iter()
            .map(|&e| view.edge_face(e))
            .collect();
        for f in faces {
            let Some(site_id) = view.face_site(f) else {
                continue;
            };
            let site = view.site(site_id);
            let d = site.distance_to(pos);
            if (d - r).abs() > eps * (1.0 + r) {
                return Some(format!(
                    "vertex {v:?} clearance {r} disagrees with distance {d} to face {f:?}'s site"
                ));
            }
        }
    }
    None
}

fn check_settled_statuses(view: &dyn DiagramView) -> Option<String> {
    for v in view.vertex_ids() {
        if view.vertex_status(v) != VertexStatus::Undecided {
            return Some(format!("vertex {v:?} left with status {:?}", view.vertex_status(v)));
        }
    }
    for f in view.face_ids() {
        if view.face_incidence(f) != Incidence::NonIncident {
            return Some(format!("face {f:?} left marked incident"));
        }
    }
    None
}

fn check_edge_midpoints_nearest_site(view: &dyn DiagramView) -> Option<String> {
    let eps = view.eps_predicate().max(1e-6);
    let sites: Vec<(SiteId, Site)> = view.site_ids().into_iter().map(|id| (id, view.site(id))).collect();
    for f in view.face_ids() {
        let Some(own_id) = view.face_site(f) else {
            continue;
        };
        let own = view.site(own_id);
        for e in view.face_cycle(f) {
            let a = view.vertex_position(view.edge_source(e));
            let b = view.vertex_position(view.edge_target(e));
            let mid = (a + b) * 0.5;
            let own_d = own.distance_to(mid);
            for &(other_id, other) in &sites {
                if other_id == own_id {
                    continue;
                }
                let other_d = other.distance_to(mid);
                if other_d + eps < own_d {
                    return Some(format!(
                        "edge {e:?} midpoint is closer to site {other_id:?} than to its own face's site {own_id:?}"
                    ));
                }
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// A minimal hand-built view used to exercise the checker in isolation,
    /// independent of `VoronoiDiagram`.
    struct FakeView {
        positions: HashMap<usize, Point2>,
        clearance: HashMap<usize, f64>,
        status: HashMap<usize, VertexStatus>,
        out: HashMap<usize, Vec<usize>>,
        edge_source: HashMap<usize, usize>,
        edge_twin: HashMap<usize, usize>,
        edge_next: HashMap<usize, usize>,
        edge_face: HashMap<usize, usize>,
        face_cycle: HashMap<usize, Vec<usize>>,
        face_site: HashMap<usize, Option<usize>>,
        face_incidence: HashMap<usize, Incidence>,
        sites: HashMap<usize, Site>,
    }

    impl DiagramView for FakeView {
        fn vertex_ids(&self) -> Vec<VertexId> {
            self.positions.keys().map(|&i| VertexId(i)).collect()
        }
        fn vertex_position(&self, v: VertexId) -> Point2 {
            self.positions[&v.0]
        }
        fn vertex_clearance(&self, v: VertexId) -> f64 {
            self.clearance[&v.0]
        }
        fn vertex_status(&self, v: VertexId) -> VertexStatus {
            self.status[&v.0]
        }
        fn vertex_type(&self, _v: VertexId) -> VertexType {
            VertexType::Normal
        }
        fn face_ids(&self) -> Vec<FaceId> {
            self.face_cycle.keys().map(|&i| FaceId(i)).collect()
        }
        fn face_incidence(&self, f: FaceId) -> Incidence {
            self.face_incidence[&f.0]
        }
        fn face_site(&self, f: FaceId) -> Option<SiteId> {
            self.face_site[&f.0].map(SiteId)
        }
        fn face_cycle(&self, f: FaceId) -> Vec<EdgeId> {
            self.face_cycle[&f.0].iter().map(|&i| EdgeId(i)).collect()
        }
        fn edge_source(&self, e: EdgeId) -> VertexId {
            VertexId(self.edge_source[&e.0])
        }
        fn edge_twin(&self, e: EdgeId) -> EdgeId {
            EdgeId(self.edge_twin[&e.0])
        }
        fn edge_next(&self, e: EdgeId) -> EdgeId {
            EdgeId(self.edge_next[&e.0])
        }
        fn edge_face(&self, e: EdgeId) -> FaceId {
            FaceId(self.edge_face[&e.0])
        }
        fn out_edges(&self, v: VertexId) -> Vec<EdgeId> {
            self.out[&v.0].iter().map(|&i| EdgeId(i)).collect()
        }
        fn site_ids(&self) -> Vec<SiteId> {
            self.sites.keys().map(|&i| SiteId(i)).collect()
        }
        fn site(&self, id: SiteId) -> Site {
            self.sites[&id.0]
        }
        fn eps_predicate(&self) -> f64 {
            1e-9
        }
    }

    fn valid_triangle_view() -> FakeView {
        // Three outer vertices of a triangle, one background face, matching
        // degree/cycle/settled-status invariants.
        let a = Point2::new(0.0, 0.0);
        let b = Point2::new(1.0, 0.0);
        let c = Point2::new(0.0, 1.0);
        let mut positions = HashMap::new();
        positions.insert(0, a);
        positions.insert(1, b);
        positions.insert(2, c);
        // face 0 carries a real site so exactly one face (face 1, the outer
        // face) is left siteless; each vertex's clearance is its true
        // distance to that site so invariant 4 still holds.
        let site_pos = Point2::new(5.0, 5.0);
        let mut clearance = HashMap::new();
        clearance.insert(0, (a - site_pos).norm());
        clearance.insert(1, (b - site_pos).norm());
        clearance.insert(2, (c - site_pos).norm());
        let mut status = HashMap::new();
        status.insert(0, VertexStatus::Undecided);
        status.insert(1, VertexStatus::Undecided);
        status.insert(2, VertexStatus::Undecided);
        // edges: 0:a->b (face0), 1:b->a (face1), 2:b->c (face0), 3:c->b (face1),
        // 4:c->a (face0), 5:a->c (face1)
        let mut edge_source = HashMap::new();
        edge_source.insert(0, 0);
        edge_source.insert(1, 1);
        edge_source.insert(2, 1);
        edge_source.insert(3, 2);
        edge_source.insert(4, 2);
        edge_source.insert(5, 0);
        let mut edge_twin = HashMap::new();
        edge_twin.insert(0, 1);
        edge_twin.insert(1, 0);
        edge_twin.insert(2, 3);
        edge_twin.insert(3, 2);
        edge_twin.insert(4, 5);
        edge_twin.insert(5, 4);
        let mut edge_next = HashMap::new();
        edge_next.insert(0, 2);
        edge_next.insert(2, 4);
        edge_next.insert(4, 0);
        edge_next.insert(1, 5);
        edge_next.insert(5, 3);
        edge_next.insert(3, 1);
        let mut edge_face = HashMap::new();
        edge_face.insert(0, 0);
        edge_face.insert(2, 0);
        edge_face.insert(4, 0);
        edge_face.insert(1, 1);
        edge_face.insert(5, 1);
        edge_face.insert(3, 1);
        let mut face_cycle = HashMap::new();
        face_cycle.insert(0, vec![0, 2, 4]);
        face_cycle.insert(1, vec![1, 5, 3]);
        let mut face_site = HashMap::new();
        face_site.insert(0, Some(0));
        face_site.insert(1, None);
        let mut face_incidence = HashMap::new();
        face_incidence.insert(0, Incidence::NonIncident);
        face_incidence.insert(1, Incidence::NonIncident);
        let mut out = HashMap::new();
        out.insert(0, vec![0, 5]);
        out.insert(1, vec![2, 1]);
        out.insert(2, vec![4, 3]);
        let mut sites = HashMap::new();
        sites.insert(0, Site::point(site_pos));
        FakeView {
            positions,
            clearance,
            status,
            out,
            edge_source,
            edge_twin,
            edge_next,
            edge_face,
            face_cycle,
            face_site,
            face_incidence,
            sites,
        }
    }

    #[test]
    fn clean_triangle_view_passes() {
        let view = valid_triangle_view();
        let checker = DefaultChecker;
        assert_eq!(checker.check_report(&view), CheckReport::Ok);
    }

    #[test]
    fn lingering_status_is_rejected() {
        let mut view = valid_triangle_view();
        view.status.insert(0, VertexStatus::In);
        let checker = DefaultChecker;
        assert!(!checker.is_valid(&view));
    }

    #[test]
    fn broken_twin_is_rejected() {
        let mut view = valid_triangle_view();
        view.edge_twin.insert(0, 0);
        let checker = DefaultChecker;
        assert!(!checker.is_valid(&view));
    }
}
