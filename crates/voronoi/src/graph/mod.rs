//! Half-edge planar graph: an arena of vertices, half-edges (always created
//! in twin pairs), and faces, addressed by `usize`-newtype handles.
//!
//! Grounded on the teacher's `oriented_edge::types::Graph` (`Vec`-of-structs
//! arena, plain-index cross references, no ownership cycles).

mod edge;
mod face;
mod ids;
mod vertex;

pub use edge::{EdgeType, HalfEdge};
pub use face::{Face, Incidence};
pub use ids::{EdgeId, FaceId, SiteId, VertexId};
pub use vertex::{Vertex, VertexStatus, VertexType};

use crate::geometry::Point2;

/// The topology store. Deletion tombstones a slot (`alive = false`) rather
/// than reusing it within the arena's lifetime — simpler than a freelist and
/// cheap enough at the scale this engine targets.
#[derive(Clone, Debug, Default)]
pub struct HalfEdgeGraph {
    pub vertices: Vec<Vertex>,
    pub edges: Vec<HalfEdge>,
    pub faces: Vec<Face>,
    next_vertex_index: usize,
}

impl HalfEdgeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_vertex(&mut self, position: Point2, vtype: VertexType) -> VertexId {
        let index = self.next_vertex_index;
        self.next_vertex_index += 1;
        let id = VertexId(self.vertices.len());
        self.vertices.push(Vertex::new(position, vtype, index));
        id
    }

    pub fn add_face(&mut self, site: Option<SiteId>) -> FaceId {
        let id = FaceId(self.faces.len());
        self.faces.push(Face::new(site));
        id
    }

    /// Allocate a twin pair of half-edges, `a` bordering `face_a` with
    /// source `src_a`, `b` bordering `face_b` with source `src_b`. Records
    /// each source vertex's `incident_edge` if not already set. `next`
    /// pointers are left dangling (`EdgeId(usize::MAX)`) and must be wired
    /// by the caller before the edges are reachable by face-cycle traversal.
    pub fn add_edge_pair(
        &mut self,
        src_a: VertexId,
        face_a: FaceId,
        etype_a: EdgeType,
        src_b: VertexId,
        face_b: FaceId,
        etype_b: EdgeType,
    ) -> (EdgeId, EdgeId) {
        let ia = EdgeId(self.edges.len());
        let ib = EdgeId(self.edges.len() + 1);
        let mut ea = HalfEdge::new(src_a, face_a, etype_a);
        let mut eb = HalfEdge::new(src_b, face_b, etype_b);
        ea.twin = ib;
        eb.twin = ia;
        self.edges.push(ea);
        self.edges.push(eb);
        if self.vertices[src_a.0].incident_edge.is_none() {
            self.vertices[src_a.0].incident_edge = Some(ia);
        }
        if self.vertices[src_b.0].incident_edge.is_none() {
            self.vertices[src_b.0].incident_edge = Some(ib);
        }
        (ia, ib)
    }

    pub fn vertex(&self, id: VertexId) -> &Vertex {
        &self.vertices[id.0]
    }
    pub fn vertex_mut(&mut self, id: VertexId) -> &mut Vertex {
        &mut self.vertices[id.0]
    }
    pub fn edge(&self, id: EdgeId) -> &HalfEdge {
        &self.edges[id.0]
    }
    pub fn edge_mut(&mut self, id: EdgeId) -> &mut HalfEdge {
        &mut self.edges[id.0]
    }
    pub fn face(&self, id: FaceId) -> &Face {
        &self.faces[id.0]
    }
    pub fn face_mut(&mut self, id: FaceId) -> &mut Face {
        &mut self.faces[id.0]
    }

    pub fn set_next(&mut self, e: EdgeId, next: EdgeId) {
        self.edges[e.0].next = next;
    }

    pub fn target(&self, e: EdgeId) -> VertexId {
        self.edges[self.edges[e.0].twin.0].source
    }

    /// Position at parameter `t` along `e`'s curve. Every edge kind is
    /// rendered as the straight chord between its two endpoints: the
    /// checker and the split-point search only need a continuous,
    /// monotonic parameterization of the edge, not the true parabolic
    /// bisector shape, so the cheaper straight-chord approximation is used
    /// uniformly (matching the checker's existing straight-midpoint sampling
    /// for `Parabola` edges).
    pub fn edge_point(&self, e: EdgeId, t: f64) -> Point2 {
        let a = self.vertex(self.edge(e).source).position;
        let b = self.vertex(self.target(e)).position;
        a + (b - a) * t
    }

    /// Half-edges bordering `face`, in cycle order, starting at
    /// `face.outer_edge`. Bounded by `edges.len()` iterations as a guard
    /// against a malformed (non-closing) `next` chain.
    pub fn face_cycle(&self, face: FaceId) -> Vec<EdgeId> {
        let Some(start) = self.faces[face.0].outer_edge else {
            return Vec::new();
        };
        let mut out = Vec::new();
        let mut cur = start;
        loop {
            out.push(cur);
            cur = self.edges[cur.0].next;
            if cur == start || out.len() > self.edges.len() {
                break;
            }
        }
        out
    }

    /// Half-edges whose source is `v` and which are still alive. Brute-force
    /// scan rather than twin/next rotation: robust to any transient
    /// inconsistency mid-repair, at `O(E)` cost acceptable for this engine's
    /// scale (the checker, the only other `O(V*E)`-ish consumer, is itself
    /// debug/test-only).
    pub fn out_edges(&self, v: VertexId) -> Vec<EdgeId> {
        self.edges
            .iter()
            .enumerate()
            .filter(|(_, e)| e.alive && e.source == v)
            .map(|(i, _)| EdgeId(i))
            .collect()
    }

    /// Distinct faces incident to `v` (the face of each outgoing half-edge).
    pub fn faces_of_vertex(&self, v: VertexId) -> Vec<FaceId> {
        let mut out: Vec<FaceId> = Vec::new();
        for e in self.out_edges(v) {
            let f = self.edges[e.0].face;
            if !out.contains(&f) {
                out.push(f);
            }
        }
        out
    }

    /// Neighboring vertices reachable by one alive half-edge from `v`.
    pub fn neighbors(&self, v: VertexId) -> Vec<VertexId> {
        self.out_edges(v).into_iter().map(|e| self.target(e)).collect()
    }

    pub fn remove_edge(&mut self, e: EdgeId) {
        let twin = self.edges[e.0].twin;
        self.edges[e.0].alive = false;
        self.edges[twin.0].alive = false;
    }

    pub fn remove_vertex(&mut self, v: VertexId) {
        self.vertices[v.0].alive = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> (HalfEdgeGraph, FaceId) {
        let mut g = HalfEdgeGraph::new();
        let a = g.add_vertex(Point2::new(0.0, 0.0), VertexType::Outer);
        let b = g.add_vertex(Point2::new(1.0, 0.0), VertexType::Outer);
        let c = g.add_vertex(Point2::new(0.0, 1.0), VertexType::Outer);
        let inner = g.add_face(None);
        let outer = g.add_face(None);
        let (ab, ba) = g.add_edge_pair(a, inner, EdgeType::Line, b, outer, EdgeType::Line);
        let (bc, cb) = g.add_edge_pair(b, inner, EdgeType::Line, c, outer, EdgeType::Line);
        let (ca, ac) = g.add_edge_pair(c, inner, EdgeType::Line, a, outer, EdgeType::Line);
        g.set_next(ab, bc);
        g.set_next(bc, ca);
        g.set_next(ca, ab);
        g.set_next(ba, ac);
        g.set_next(ac, cb);
        g.set_next(cb, ba);
        g.faces[inner.0].outer_edge = Some(ab);
        g.faces[outer.0].outer_edge = Some(ba);
        (g, inner)
    }

    #[test]
    fn face_cycle_returns_to_start() {
        let (g, inner) = triangle();
        let cycle = g.face_cycle(inner);
        assert_eq!(cycle.len(), 3);
        assert_eq!(g.edges[cycle[2].0].next, cycle[0]);
    }

    #[test]
    fn twin_of_twin_is_self() {
        let (g, _) = triangle();
        for (i, e) in g.edges.iter().enumerate() {
            let back = g.edges[e.twin.0].twin;
            assert_eq!(back, EdgeId(i));
        }
    }

    #[test]
    fn edge_point_interpolates_the_chord() {
        let (g, inner) = triangle();
        let ab = g.face_cycle(inner)[0];
        let mid = g.edge_point(ab, 0.5);
        let a = g.vertex(g.edge(ab).source).position;
        let b = g.vertex(g.target(ab)).position;
        assert!((mid - (a + b) * 0.5).norm() < 1e-12);
    }

    #[test]
    fn out_edges_and_neighbors_agree_on_degree() {
        let (g, _) = triangle();
        for v in [VertexId(0), VertexId(1), VertexId(2)] {
            assert_eq!(g.out_edges(v).len(), 2);
            assert_eq!(g.neighbors(v).len(), 2);
        }
    }
}
