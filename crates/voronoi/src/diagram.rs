//! The incremental Voronoi diagram: topology store plus the insertion
//! pipeline that drives it (§4.2-§4.5).
//!
//! `VoronoiDiagram` owns a `HalfEdgeGraph`, the site list, and the four
//! external collaborators (grid, positioner, checker — the predicate and
//! queue are free functions/types used directly). Each insertion mutates the
//! graph through a single `InsertionScratch` that is discarded (on success)
//! or used to roll the graph back (on a recoverable failure), mirroring the
//! teacher's habit of scoping a mutation's working state to a local struct
//! rather than threading loose `Vec`s through a long parameter list.

use std::collections::{HashMap, HashSet};

use crate::checker::{CheckReport, Checker, DefaultChecker, DiagramView};
use crate::config::VoronoiConfig;
use crate::error::{InsertError, InvalidSiteReason};
use crate::geometry::{distance, segments_intersect, Point2};
use crate::graph::{
    EdgeId, EdgeType, FaceId, HalfEdgeGraph, Incidence, SiteId, VertexId, VertexStatus, VertexType,
};
use crate::grid::{BucketFaceGrid, FaceGrid};
use crate::positioner::{DefaultPositioner, VertexPositioner};
use crate::predicate::{find_seed_vertex, in_circle_predicate, PredicateQueue};
use crate::rootfind::bracketed_root;
use crate::site::{LineSite, Site};

/// Summary of one insertion, returned via `last_report` for the CLI/log
/// layer to report without widening the public `insert_*` signatures.
#[derive(Clone, Debug)]
pub struct InsertReport {
    pub site_id: usize,
    pub seed_vertex: Option<usize>,
    pub vertices_removed: usize,
    pub vertices_added: usize,
    pub faces_touched: usize,
    pub separators_added: usize,
    pub split_vertices_added: usize,
}

/// Per-insertion working state, built fresh at the start of
/// `insert_site_generic` and dropped at the end.
#[derive(Default)]
struct InsertionScratch {
    queue: PredicateQueue,
    queued: HashSet<VertexId>,
    v0: Vec<VertexId>,
    modified_vertices: Vec<VertexId>,
    incident_faces: Vec<FaceId>,
    /// Edges with both endpoints IN, to be fully removed (not repointed).
    interior_edges: Vec<EdgeId>,
    /// New (or reused `Outer`) vertex for each IN/OUT crossing half-edge,
    /// keyed by the edge's `.0` index so both directions resolve to the
    /// same entry.
    vertex_map: HashMap<usize, VertexId>,
}

struct EdgeData {
    entry_edge: EdgeId,
    exit_edge: EdgeId,
}

struct FaceRepairRecord {
    v1: VertexId,
    v2: VertexId,
    y: EdgeId,
}

fn representative_point(site: &Site) -> Point2 {
    match site {
        Site::Point(p) => p.position,
        Site::Line(l) => (l.p1 + l.p2) * 0.5,
    }
}

fn bisector_edge_type(old: Option<&Site>, new: &Site) -> EdgeType {
    match (old, new) {
        (Some(Site::Line(_)), _) | (_, Site::Line(_)) => EdgeType::Parabola,
        _ => EdgeType::Line,
    }
}

/// The topology store plus everything needed to grow it one site at a time.
pub struct VoronoiDiagram {
    graph: HalfEdgeGraph,
    sites: Vec<Site>,
    site_alive: Vec<bool>,
    grid: BucketFaceGrid,
    cfg: VoronoiConfig,
    positioner: DefaultPositioner,
    checker_enabled: bool,
    background_face: FaceId,
    exterior_face: FaceId,
    num_point_sites: usize,
    num_line_sites: usize,
    num_split_vertices: usize,
    last_report: Option<InsertReport>,
}

impl VoronoiDiagram {
    pub fn new(cfg: VoronoiConfig) -> Self {
        let (graph, background_face, exterior_face) = build_bootstrap(&cfg);
        let mut grid = BucketFaceGrid::new(cfg.far_radius * 2.2, cfg.grid_bins);
        grid.add(background_face, Point2::new(0.0, 0.0));
        Self {
            graph,
            sites: Vec::new(),
            site_alive: Vec::new(),
            grid,
            cfg,
            positioner: DefaultPositioner,
            checker_enabled: cfg!(debug_assertions),
            background_face,
            exterior_face,
            num_point_sites: 0,
            num_line_sites: 0,
            num_split_vertices: 0,
            last_report: None,
        }
    }

    pub fn with_default_config(far_radius: f64) -> Self {
        Self::new(VoronoiConfig::new(far_radius, 50))
    }

    pub fn set_checker_enabled(&mut self, enabled: bool) {
        self.checker_enabled = enabled;
    }

    pub fn num_point_sites(&self) -> usize {
        self.num_point_sites
    }
    pub fn num_line_sites(&self) -> usize {
        self.num_line_sites
    }
    pub fn num_split_vertices(&self) -> usize {
        self.num_split_vertices
    }
    pub fn get_far_radius(&self) -> f64 {
        self.cfg.far_radius
    }
    pub fn num_vertices(&self) -> usize {
        self.graph
            .vertices
            .iter()
            .filter(|v| v.alive && v.vtype != VertexType::Outer)
            .count()
    }
    pub fn version(&self) -> &'static str {
        env!("CARGO_PKG_VERSION")
    }
    pub fn last_report(&self) -> Option<&InsertReport> {
        self.last_report.as_ref()
    }

    pub fn print(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "voronoi diagram: {} point sites, {} line sites, {} vertices\n",
            self.num_point_sites,
            self.num_line_sites,
            self.num_vertices()
        ));
        for (i, f) in self.graph.faces.iter().enumerate() {
            if !f.alive || FaceId(i) == self.exterior_face {
                continue;
            }
            out.push_str(&format!(
                "  face {i}: site={:?} degree={}\n",
                f.site,
                self.graph.face_cycle(FaceId(i)).len()
            ));
        }
        out
    }

    // ---- validation ----------------------------------------------------

    fn validate_point(&self, p: Point2) -> Result<(), InsertError> {
        if p.norm() >= self.cfg.far_radius {
            return Err(InsertError::InvalidSite(InvalidSiteReason::OutsideDomain));
        }
        for (i, s) in self.sites.iter().enumerate() {
            if !self.site_alive[i] {
                continue;
            }
            if let Site::Point(ps) = s {
                if distance(ps.position, p) < self.cfg.eps_coincident {
                    return Err(InsertError::InvalidSite(InvalidSiteReason::Coincident));
                }
            }
        }
        for i in 0..self.graph.edges.len() {
            if !self.graph.edges[i].alive {
                continue;
            }
            let id = EdgeId(i);
            let a = self.graph.vertex(self.graph.edges[i].source).position;
            let b = self.graph.vertex(self.graph.target(id)).position;
            if crate::geometry::distance(crate::geometry::closest_point_on_segment(a, b, p), p) < self.cfg.eps_coincident {
                return Err(InsertError::InvalidSite(InvalidSiteReason::OnEdge));
            }
        }
        Ok(())
    }

    fn point_handle_position(&self, idx: usize) -> Result<Point2, InsertError> {
        match self.sites.get(idx) {
            Some(Site::Point(p)) if self.site_alive.get(idx).copied().unwrap_or(false) => Ok(p.position),
            _ => Err(InsertError::InvalidSite(InvalidSiteReason::InvalidHandle)),
        }
    }

    // ---- public insertion API ------------------------------------------

    pub fn insert_point_site(&mut self, p: Point2) -> Result<usize, InsertError> {
        self.validate_point(p)?;
        let site = Site::point(p);
        let site_id = self.insert_site_generic(site)?;
        self.num_point_sites += 1;
        self.run_checker()?;
        Ok(site_id.0)
    }

    pub fn insert_line_site(&mut self, idx1: usize, idx2: usize) -> Result<(), InsertError> {
        let p1 = self.point_handle_position(idx1)?;
        let p2 = self.point_handle_position(idx2)?;
        if distance(p1, p2) < self.cfg.eps_coincident {
            return Err(InsertError::InvalidSite(InvalidSiteReason::DegenerateSegment));
        }
        for s in &self.sites {
            if let Site::Line(other) = s {
                if segments_intersect(p1, p2, other.p1, other.p2) {
                    return Err(InsertError::InvalidSite(InvalidSiteReason::SelfIntersecting));
                }
            }
        }
        let line = LineSite::new(p1, p2);
        let site = Site::Line(line);
        let site_id = self.insert_site_generic(site)?;
        let separators_added = self.split_combined_face_for_line(site_id, line)?;
        let split_vertices_added = self.resolve_degenerate_bisectors(site_id, line);
        if let Some(report) = self.last_report.as_mut() {
            report.separators_added = separators_added;
            report.split_vertices_added = split_vertices_added;
        }
        self.num_line_sites += 1;
        self.run_checker()?;
        Ok(())
    }

    fn run_checker(&mut self) -> Result<(), InsertError> {
        if !self.checker_enabled {
            return Ok(());
        }
        match DefaultChecker.check_report(&*self) {
            CheckReport::Ok => Ok(()),
            CheckReport::Violation(msg) => Err(InsertError::InvariantViolated(msg)),
        }
    }

    // ---- the core pipeline ----------------------------------------------

    fn insert_site_generic(&mut self, site: Site) -> Result<SiteId, InsertError> {
        let site_id = SiteId(self.sites.len());
        self.sites.push(site);
        self.site_alive.push(true);

        if self.graph.face(self.background_face).is_background() {
            self.graph.face_mut(self.background_face).site = Some(site_id);
            for e in self.graph.face_cycle(self.background_face) {
                self.graph.edge_mut(e).site_left = Some(site_id);
            }
            self.grid.add(self.background_face, representative_point(&self.sites[site_id.0]));
            self.last_report = Some(InsertReport {
                site_id: site_id.0,
                seed_vertex: None,
                vertices_removed: 0,
                vertices_added: 0,
                faces_touched: 1,
                separators_added: 0,
                split_vertices_added: 0,
            });
            return Ok(site_id);
        }

        // The flood fill needs a non-`Outer` seed vertex already sitting on
        // the target face's boundary, but right after the first insertion
        // above, `background_face`'s ring is still the bare bootstrap
        // triangle (three `Outer` corners, never eligible seeds). Bisect it
        // directly against the lone existing site instead of flooding: this
        // is the only transition where no real vertex exists yet, and it
        // always produces exactly the two-site straight-line diagram (no
        // interior vertex, per invariant: a Voronoi diagram of two sites has
        // none).
        if self.num_point_sites == 1 && matches!(self.sites[site_id.0], Site::Point(_)) {
            match self.bisect_background_for_second_site(site_id) {
                Ok(()) => return Ok(site_id),
                Err(e) => {
                    self.sites.pop();
                    self.site_alive.pop();
                    return Err(e);
                }
            }
        }

        let query = representative_point(&self.sites[site_id.0]);
        let Some(seed_face) = self.grid.find_closest_face(query) else {
            self.sites.pop();
            self.site_alive.pop();
            return Err(InsertError::InvariantViolated("face grid holds no faces".to_string()));
        };

        let candidates: Vec<(VertexId, f64)> = self
            .graph
            .face_cycle(seed_face)
            .iter()
            .map(|&e| self.graph.edge(e).source)
            .filter(|&v| self.graph.vertex(v).vtype != VertexType::Outer)
            .map(|v| {
                let vert = self.graph.vertex(v);
                (v, in_circle_predicate(vert.position, vert.clearance_radius, &self.sites[site_id.0]))
            })
            .collect();

        let Some((seed, _)) = find_seed_vertex(&candidates) else {
            self.sites.pop();
            self.site_alive.pop();
            return Err(InsertError::PredicateUndecidable);
        };

        let mut scratch = InsertionScratch::default();
        self.mark_in(seed, site_id, &mut scratch);

        if let Err(e) = self.augment_vertex_set(site_id, &mut scratch) {
            self.rollback(&scratch);
            self.sites.pop();
            self.site_alive.pop();
            return Err(e);
        }

        if let Err(e) = self.add_vertices(site_id, &mut scratch) {
            self.rollback(&scratch);
            self.sites.pop();
            self.site_alive.pop();
            return Err(e);
        }

        let new_face = self.graph.add_face(Some(site_id));
        let mut records = Vec::new();
        for &f in &scratch.incident_faces {
            match self.repair_face(f, site_id, new_face, &scratch) {
                Ok(Some(r)) => records.push(r),
                Ok(None) => {}
                Err(e) => {
                    self.rollback(&scratch);
                    self.sites.pop();
                    self.site_alive.pop();
                    return Err(e);
                }
            }
        }
        self.close_new_face_ring(new_face, &records);

        let vertices_removed = scratch.v0.len();
        let vertices_added = scratch.vertex_map.values().collect::<HashSet<_>>().len();
        let faces_touched = scratch.incident_faces.len();

        self.remove_vertex_set(&scratch);
        self.reset_status(&scratch);
        self.grid.add(new_face, query);

        self.last_report = Some(InsertReport {
            site_id: site_id.0,
            seed_vertex: Some(seed.0),
            vertices_removed,
            vertices_added,
            faces_touched,
            separators_added: 0,
            split_vertices_added: 0,
        });

        Ok(site_id)
    }

    // ---- flood fill -------------------------------------------------------

    fn mark_in(&mut self, v: VertexId, site_id: SiteId, scratch: &mut InsertionScratch) {
        self.graph.vertex_mut(v).status = VertexStatus::In;
        scratch.v0.push(v);
        scratch.modified_vertices.push(v);
        for f in self.graph.faces_of_vertex(v) {
            if self.graph.face(f).alive && self.graph.face(f).incidence == Incidence::NonIncident {
                self.graph.face_mut(f).incidence = Incidence::Incident;
                scratch.incident_faces.push(f);
            }
        }
        for u in self.graph.neighbors(v) {
            if !self.graph.vertex(u).alive || scratch.queued.contains(&u) {
                continue;
            }
            if self.graph.vertex(u).status != VertexStatus::Undecided {
                continue;
            }
            let vert = self.graph.vertex(u);
            let p = in_circle_predicate(vert.position, vert.clearance_radius, &self.sites[site_id.0]);
            scratch.queue.push(u, p);
            scratch.queued.insert(u);
        }
    }

    fn augment_vertex_set(&mut self, site_id: SiteId, scratch: &mut InsertionScratch) -> Result<(), InsertError> {
        let mut consecutive_rejections = 0usize;
        while let Some((v, _)) = scratch.queue.pop() {
            if self.graph.vertex(v).status != VertexStatus::Undecided {
                continue;
            }
            if self.graph.vertex(v).vtype == VertexType::Outer {
                self.graph.vertex_mut(v).status = VertexStatus::Out;
                scratch.modified_vertices.push(v);
                continue;
            }
            if self.can_accept_in(v) {
                self.mark_in(v, site_id, scratch);
                consecutive_rejections = 0;
            } else {
                self.graph.vertex_mut(v).status = VertexStatus::Out;
                scratch.modified_vertices.push(v);
                consecutive_rejections += 1;
                if consecutive_rejections >= 2 && !scratch.queue.is_empty() {
                    return Err(InsertError::PredicateUndecidable);
                }
            }
        }
        Ok(())
    }

    fn face_in_run_count(&self, f: FaceId, tentative: VertexId) -> usize {
        let cycle = self.graph.face_cycle(f);
        let n = cycle.len();
        if n == 0 {
            return 0;
        }
        let flag = |i: usize| -> bool {
            let v = self.graph.edge(cycle[i]).source;
            v == tentative || self.graph.vertex(v).status == VertexStatus::In
        };
        if (0..n).all(flag) {
            return 1;
        }
        (0..n).filter(|&i| flag(i) && !flag((i + n - 1) % n)).count()
    }

    fn face_has_remaining_out(&self, f: FaceId, tentative: VertexId) -> bool {
        if self.graph.face(f).is_background() {
            return true;
        }
        let cycle = self.graph.face_cycle(f);
        cycle.iter().any(|&e| {
            let v = self.graph.edge(e).source;
            v != tentative && self.graph.vertex(v).status != VertexStatus::In
        })
    }

    fn can_accept_in(&self, v: VertexId) -> bool {
        for f in self.graph.faces_of_vertex(v) {
            if !self.graph.face(f).alive {
                continue;
            }
            if self.face_in_run_count(f, v) > 1 {
                return false;
            }
            if !self.face_has_remaining_out(f, v) {
                return false;
            }
        }
        true
    }

    // ---- new vertex creation ----------------------------------------------

    fn add_vertices(&mut self, site_id: SiteId, scratch: &mut InsertionScratch) -> Result<(), InsertError> {
        let in_set = scratch.v0.clone();
        for v in in_set {
            for e in self.graph.out_edges(v) {
                if scratch.vertex_map.contains_key(&e.0) {
                    continue;
                }
                let u = self.graph.target(e);
                if self.graph.vertex(u).status == VertexStatus::In {
                    scratch.interior_edges.push(e);
                    continue;
                }
                let (site_left, site_right) = (self.graph.edge(e).site_left, self.graph.edge(e).site_right);
                let nv = match (site_left, site_right) {
                    (Some(sl), Some(sr)) => {
                        let a = self.sites[sl.0];
                        let b = self.sites[sr.0];
                        let new_site = self.sites[site_id.0];
                        let hint = self.graph.vertex(v).position;
                        let (pos, r) = self
                            .positioner
                            .position([&a, &b, &new_site], hint, self.cfg)
                            .map_err(|_| InsertError::PositionerFailed)?;
                        let nv = self.graph.add_vertex(pos, VertexType::Normal);
                        self.graph.vertex_mut(nv).clearance_radius = r;
                        self.graph.vertex_mut(nv).status = VertexStatus::New;
                        scratch.modified_vertices.push(nv);
                        nv
                    }
                    _ => u,
                };
                let twin = self.graph.edge(e).twin;
                scratch.vertex_map.insert(e.0, nv);
                scratch.vertex_map.insert(twin.0, nv);
            }
        }
        Ok(())
    }

    // ---- face repair --------------------------------------------------------

    fn find_edge_data(&self, f: FaceId) -> Option<EdgeData> {
        let cycle = self.graph.face_cycle(f);
        let n = cycle.len();
        if n == 0 {
            return None;
        }
        let is_in_at = |i: usize| -> bool { self.graph.vertex(self.graph.edge(cycle[i]).source).status == VertexStatus::In };
        let a = (0..n).find(|&i| is_in_at(i) && !is_in_at((i + n - 1) % n))?;
        let mut b = a;
        while is_in_at((b + 1) % n) {
            b = (b + 1) % n;
        }
        Some(EdgeData {
            entry_edge: cycle[(a + n - 1) % n],
            exit_edge: cycle[b],
        })
    }

    fn repair_face(
        &mut self,
        f: FaceId,
        new_site_id: SiteId,
        new_face: FaceId,
        scratch: &InsertionScratch,
    ) -> Result<Option<FaceRepairRecord>, InsertError> {
        let Some(data) = self.find_edge_data(f) else {
            return Ok(None);
        };
        let v1 = *scratch
            .vertex_map
            .get(&data.entry_edge.0)
            .ok_or_else(|| InsertError::InvariantViolated("missing new vertex for entry edge".to_string()))?;
        let v2 = *scratch
            .vertex_map
            .get(&data.exit_edge.0)
            .ok_or_else(|| InsertError::InvariantViolated("missing new vertex for exit edge".to_string()))?;

        let twin_entry = self.graph.edge(data.entry_edge).twin;
        self.graph.edge_mut(twin_entry).source = v1;
        self.graph.edge_mut(data.exit_edge).source = v2;

        let old_site_id = self.graph.face(f).site;
        let old_site = old_site_id.map(|id| self.sites[id.0]);
        let new_site = self.sites[new_site_id.0];
        let etype = bisector_edge_type(old_site.as_ref(), &new_site);

        let (x, y) = self.graph.add_edge_pair(v1, f, etype, v2, new_face, etype);
        self.graph.edge_mut(x).site_left = old_site_id;
        self.graph.edge_mut(x).site_right = Some(new_site_id);
        self.graph.edge_mut(y).site_left = Some(new_site_id);
        self.graph.edge_mut(y).site_right = old_site_id;

        self.graph.set_next(data.entry_edge, x);
        self.graph.set_next(x, data.exit_edge);

        Ok(Some(FaceRepairRecord { v1, v2, y }))
    }

    /// Chains each affected face's `y` half-edge (bordering `new_face`) into a
    /// single closed cycle. Each new vertex is the exit-vertex of exactly one
    /// record and the entry-vertex of exactly one other; following that
    /// bijection around the ring needs no geometric ordering, only the
    /// topology the repair step already established.
    fn close_new_face_ring(&mut self, new_face: FaceId, records: &[FaceRepairRecord]) {
        if records.is_empty() {
            return;
        }
        let mut by_v2: HashMap<VertexId, usize> = HashMap::new();
        for (i, r) in records.iter().enumerate() {
            by_v2.insert(r.v2, i);
        }
        for r in records {
            if let Some(&j) = by_v2.get(&r.v1) {
                self.graph.set_next(r.y, records[j].y);
            }
        }
        self.graph.face_mut(new_face).outer_edge = Some(records[0].y);
    }

    fn remove_vertex_set(&mut self, scratch: &InsertionScratch) {
        for &e in &scratch.interior_edges {
            self.graph.remove_edge(e);
        }
        for &v in &scratch.v0 {
            self.graph.remove_vertex(v);
        }
    }

    fn reset_status(&mut self, scratch: &InsertionScratch) {
        for &v in &scratch.modified_vertices {
            if self.graph.vertex(v).alive {
                self.graph.vertex_mut(v).status = VertexStatus::Undecided;
            }
        }
        for &f in &scratch.incident_faces {
            if self.graph.face(f).alive {
                self.graph.face_mut(f).incidence = Incidence::NonIncident;
            }
        }
    }

    fn rollback(&mut self, scratch: &InsertionScratch) {
        for &v in &scratch.modified_vertices {
            if self.graph.vertex(v).status == VertexStatus::New {
                self.graph.remove_vertex(v);
            } else if self.graph.vertex(v).alive {
                self.graph.vertex_mut(v).status = VertexStatus::Undecided;
            }
        }
        for &f in &scratch.incident_faces {
            if self.graph.face(f).alive {
                self.graph.face_mut(f).incidence = Incidence::NonIncident;
            }
        }
    }

    // ---- line-site endpoint split (§4.4) -----------------------------------

    /// Splits a single edge of `face`'s cycle into two by inserting `nv` at
    /// `position`, splicing it and a new twin pair into both the face's
    /// cycle and the neighbor's. Shared by `add_separator` (nearest boundary
    /// edge) and `add_split_vertex` (root-found parameter along one edge).
    fn split_edge_at(&mut self, edge: EdgeId, position: Point2, vtype: VertexType) -> Result<VertexId, InsertError> {
        let twin = self.graph.edge(edge).twin;
        let face_a = self.graph.edge(edge).face;
        let face_b = self.graph.edge(twin).face;
        let b_vertex = self.graph.target(edge);
        let old_next = self.graph.edge(edge).next;
        let h_cycle = self.graph.face_cycle(face_b);
        let pred_of_twin = h_cycle.into_iter().find(|&e| self.graph.edge(e).next == twin);

        let etype_a = self.graph.edge(edge).etype;
        let etype_b = self.graph.edge(twin).etype;
        let site_left = self.graph.edge(edge).site_left;
        let site_right = self.graph.edge(edge).site_right;

        let nv = self.graph.add_vertex(position, vtype);
        self.graph.edge_mut(twin).source = nv;

        let (new1, new2) = self.graph.add_edge_pair(nv, face_a, etype_a, b_vertex, face_b, etype_b);
        self.graph.edge_mut(new1).site_left = site_left;
        self.graph.edge_mut(new1).site_right = site_right;
        self.graph.edge_mut(new2).site_left = site_right;
        self.graph.edge_mut(new2).site_right = site_left;

        self.graph.set_next(edge, new1);
        self.graph.set_next(new1, old_next);
        self.graph.set_next(new2, twin);
        if let Some(pred) = pred_of_twin {
            self.graph.set_next(pred, new2);
        }

        Ok(nv)
    }

    fn add_separator(&mut self, face: FaceId, endpoint: Point2, vtype: VertexType) -> Result<VertexId, InsertError> {
        let cycle = self.graph.face_cycle(face);
        let mut best: Option<(EdgeId, f64)> = None;
        for &e in &cycle {
            let a = self.graph.vertex(self.graph.edge(e).source).position;
            let b = self.graph.vertex(self.graph.target(e)).position;
            let closest = crate::geometry::closest_point_on_segment(a, b, endpoint);
            let d = distance(closest, endpoint);
            if best.is_none_or(|(_, bd)| d < bd) {
                best = Some((e, d));
            }
        }
        let (edge, _) = best.ok_or_else(|| InsertError::InvariantViolated("empty face cycle in add_separator".to_string()))?;
        self.split_edge_at(edge, endpoint, vtype)
    }

    /// Edges of `face` whose endpoints both sit within `eps` of the line
    /// through `p1`-`p2`: candidates for a degenerate (collinear) bisector
    /// that needs a split vertex (§4.4 step 5).
    fn find_split_edges(&self, face: FaceId, p1: Point2, p2: Point2, eps: f64) -> Vec<EdgeId> {
        self.graph
            .face_cycle(face)
            .into_iter()
            .filter(|&e| {
                let a = self.graph.vertex(self.graph.edge(e).source).position;
                let b = self.graph.vertex(self.graph.target(e)).position;
                crate::geometry::right_of_line(p1, p2, a).abs() < eps && crate::geometry::right_of_line(p1, p2, b).abs() < eps
            })
            .collect()
    }

    /// Places a split vertex on `edge` at the parameter where it crosses the
    /// line through `p1`-`p2`, found by the bracketed root finder on the
    /// signed right-of-line distance (§4.4 step 5, §4.9).
    fn add_split_vertex(&mut self, edge: EdgeId, p1: Point2, p2: Point2) -> Result<VertexId, InsertError> {
        let t = bracketed_root(|t| crate::geometry::right_of_line(p1, p2, self.graph.edge_point(edge, t)), self.cfg.eps_root)
            .ok_or(InsertError::PositionerFailed)?;
        let pos = self.graph.edge_point(edge, t);
        let nv = self.split_edge_at(edge, pos, VertexType::Split)?;
        self.num_split_vertices += 1;
        Ok(nv)
    }

    /// After a line site's own faces are in place, any *other* line-site
    /// face whose supporting line is collinear with the new segment has a
    /// degenerate (zero-width) bisector with it. One split vertex per such
    /// face breaks the degeneracy; failures are non-fatal (the edge is left
    /// as-is and the checker, if enabled, surfaces any resulting
    /// inconsistency) since this only affects the rare exactly-collinear
    /// configuration and should never abort an otherwise-successful
    /// insertion.
    fn resolve_degenerate_bisectors(&mut self, site_id: SiteId, line: LineSite) -> usize {
        let eps = self.cfg.eps_coincident;
        let faces: Vec<FaceId> = (0..self.graph.faces.len())
            .map(FaceId)
            .filter(|&f| {
                self.graph.face(f).alive
                    && match self.graph.face(f).site {
                        Some(fs) if fs != site_id => match self.sites[fs.0] {
                            Site::Line(other) => {
                                crate::geometry::right_of_line(line.p1, line.p2, other.p1).abs() < eps
                                    && crate::geometry::right_of_line(line.p1, line.p2, other.p2).abs() < eps
                            }
                            Site::Point(_) => false,
                        },
                        _ => false,
                    }
            })
            .collect();
        let mut added = 0usize;
        for f in faces {
            for e in self.find_split_edges(f, line.p1, line.p2, eps) {
                if !self.graph.edge(e).alive {
                    continue;
                }
                if self.add_split_vertex(e, line.p1, line.p2).is_ok() {
                    added += 1;
                    break;
                }
            }
        }
        added
    }

    /// After the generic pipeline has built a single merged face for a
    /// line-segment site, split it in two along the segment itself: the two
    /// endpoints become genuine vertices on the ring (`add_separator`), and
    /// the arcs on either side of the segment's supporting line peel off
    /// into their own face.
    fn split_combined_face_for_line(&mut self, site_id: SiteId, line: LineSite) -> Result<usize, InsertError> {
        let combined_face = match self.graph.face(self.background_face).site {
            Some(id) if id == site_id => Some(self.background_face),
            _ => self.face_of_site(site_id),
        };
        let Some(combined_face) = combined_face else {
            return Ok(0);
        };

        let p1v = self.add_separator(combined_face, line.p1, VertexType::Endpoint)?;
        let p2v = self.add_separator(combined_face, line.p2, VertexType::Endpoint)?;

        let new_f2 = self.graph.add_face(Some(site_id));
        let cycle = self.graph.face_cycle(combined_face);
        let n = cycle.len();
        let p1_idx = cycle
            .iter()
            .position(|&e| self.graph.edge(e).source == p1v)
            .ok_or_else(|| InsertError::InvariantViolated("separator vertex p1 missing from ring".to_string()))?;
        let p2_idx = cycle
            .iter()
            .position(|&e| self.graph.edge(e).source == p2v)
            .ok_or_else(|| InsertError::InvariantViolated("separator vertex p2 missing from ring".to_string()))?;

        let mut side_b = Vec::new();
        let mut i = p2_idx;
        while i != p1_idx {
            side_b.push(cycle[i]);
            i = (i + 1) % n;
        }
        for &e in &side_b {
            self.graph.edge_mut(e).face = new_f2;
        }

        let (close_a, close_b) = self.graph.add_edge_pair(p2v, combined_face, EdgeType::LineSite, p1v, new_f2, EdgeType::LineSite);
        self.graph.edge_mut(close_a).site_left = Some(site_id);
        self.graph.edge_mut(close_b).site_left = Some(site_id);

        let side_a_last = cycle[(p2_idx + n - 1) % n];
        self.graph.set_next(side_a_last, close_a);
        self.graph.set_next(close_a, cycle[p1_idx]);

        let side_b_last = cycle[(p1_idx + n - 1) % n];
        self.graph.set_next(side_b_last, close_b);
        self.graph.set_next(close_b, cycle[p2_idx]);

        self.graph.face_mut(new_f2).outer_edge = Some(cycle[p2_idx]);
        self.graph.face_mut(combined_face).outer_edge = Some(cycle[p1_idx]);

        Ok(2)
    }

    /// Splits the edge at `cycle[crossing.0]` at parameter `crossing.1` and
    /// records the new vertex's clearance against `anchor`. Shared by the two
    /// crossing points `bisect_background_for_second_site` drops onto the
    /// bootstrap triangle's boundary.
    fn split_bisector_crossing(&mut self, cycle: &[EdgeId], positions: &[Point2], crossing: (usize, f64), anchor: Point2) -> Result<VertexId, InsertError> {
        let n = positions.len();
        let (i, t) = crossing;
        let a = positions[i];
        let b = positions[(i + 1) % n];
        let pos = a + (b - a) * t;
        let nv = self.split_edge_at(cycle[i], pos, VertexType::Normal)?;
        self.graph.vertex_mut(nv).clearance_radius = distance(pos, anchor);
        Ok(nv)
    }

    /// Splits `background_face` along the perpendicular bisector of the
    /// lone existing point site and the one being inserted, entirely outside
    /// the generic flood-fill/repair machinery. With exactly two sites there
    /// is no circumcenter to solve for — the diagram is a single straight
    /// line — so this walks the bootstrap triangle's boundary directly,
    /// drops a genuine vertex at each of the two points where that line
    /// crosses it (`split_edge_at`, the same primitive `add_separator`
    /// already uses), and reassigns the arc between them to a new face.
    fn bisect_background_for_second_site(&mut self, site_id: SiteId) -> Result<(), InsertError> {
        let f = self.background_face;
        let old_site_id = self.graph.face(f).site.ok_or_else(|| InsertError::InvariantViolated("background face has no site".to_string()))?;
        let p0 = representative_point(&self.sites[old_site_id.0]);
        let p1 = representative_point(&self.sites[site_id.0]);

        let normal = p1 - p0;
        let mid = (p0 + p1) * 0.5;
        let side = |p: Point2| crate::geometry::dot(p - mid, normal);

        let cycle = self.graph.face_cycle(f);
        let n = cycle.len();
        let positions: Vec<Point2> = cycle.iter().map(|&e| self.graph.vertex(self.graph.edge(e).source).position).collect();
        let sides: Vec<f64> = positions.iter().map(|&p| side(p)).collect();

        // A crossing from the old site's side (`<= 0`) to the new site's
        // side (`> 0`) is where the new face's arc begins; the reverse
        // crossing is where it ends. Tag by the sign of the transition, not
        // by which index the scan reaches first — that depends on where the
        // lone bootstrap vertex happens to sit relative to the bisector, not
        // on which side is which.
        let mut enter: Option<(usize, f64)> = None;
        let mut exit: Option<(usize, f64)> = None;
        for i in 0..n {
            let j = (i + 1) % n;
            if (sides[i] > 0.0) != (sides[j] > 0.0) {
                let t = sides[i] / (sides[i] - sides[j]);
                if sides[i] <= 0.0 {
                    enter = Some((i, t));
                } else {
                    exit = Some((i, t));
                }
            }
        }
        let (Some(enter), Some(exit)) = (enter, exit) else {
            return Err(InsertError::PositionerFailed);
        };

        let v_enter = self.split_bisector_crossing(&cycle, &positions, enter, p0)?;
        let v_exit = self.split_bisector_crossing(&cycle, &positions, exit, p0)?;

        let cycle2 = self.graph.face_cycle(f);
        let n2 = cycle2.len();
        let enter_idx = cycle2
            .iter()
            .position(|&e| self.graph.edge(e).source == v_enter)
            .ok_or_else(|| InsertError::InvariantViolated("split vertex missing from ring".to_string()))?;
        let exit_idx = cycle2
            .iter()
            .position(|&e| self.graph.edge(e).source == v_exit)
            .ok_or_else(|| InsertError::InvariantViolated("split vertex missing from ring".to_string()))?;

        let mut arc = Vec::new();
        let mut i = enter_idx;
        while i != exit_idx {
            arc.push(cycle2[i]);
            i = (i + 1) % n2;
        }

        let new_face = self.graph.add_face(Some(site_id));
        for &e in &arc {
            self.graph.edge_mut(e).site_left = Some(site_id);
            self.graph.edge_mut(e).face = new_face;
        }

        let (close_new, close_old) = self.graph.add_edge_pair(v_exit, new_face, EdgeType::Line, v_enter, f, EdgeType::Line);
        self.graph.edge_mut(close_new).site_left = Some(site_id);
        self.graph.edge_mut(close_new).site_right = Some(old_site_id);
        self.graph.edge_mut(close_old).site_left = Some(old_site_id);
        self.graph.edge_mut(close_old).site_right = Some(site_id);

        let before_enter = cycle2[(enter_idx + n2 - 1) % n2];
        let after_exit = cycle2[exit_idx];

        self.graph.set_next(*arc.last().unwrap(), close_new);
        self.graph.set_next(close_new, arc[0]);
        self.graph.face_mut(new_face).outer_edge = Some(arc[0]);

        self.graph.set_next(before_enter, close_old);
        self.graph.set_next(close_old, after_exit);
        self.graph.face_mut(f).outer_edge = Some(before_enter);

        self.grid.add(new_face, p1);
        self.last_report = Some(InsertReport {
            site_id: site_id.0,
            seed_vertex: None,
            vertices_removed: 0,
            vertices_added: 2,
            faces_touched: 2,
            separators_added: 0,
            split_vertices_added: 0,
        });
        Ok(())
    }

    fn face_of_site(&self, site_id: SiteId) -> Option<FaceId> {
        (0..self.graph.faces.len())
            .map(FaceId)
            .find(|&f| self.graph.face(f).alive && self.graph.face(f).site == Some(site_id))
    }
}

fn build_bootstrap(cfg: &VoronoiConfig) -> (HalfEdgeGraph, FaceId, FaceId) {
    let mut g = HalfEdgeGraph::new();
    let r = cfg.far_radius * 2.2;
    let base = std::f64::consts::FRAC_PI_2;
    let third = 2.0 * std::f64::consts::PI / 3.0;
    let pts: Vec<Point2> = (0..3)
        .map(|i| {
            let a = base + i as f64 * third;
            Point2::new(r * a.cos(), r * a.sin())
        })
        .collect();
    let a = g.add_vertex(pts[0], VertexType::Outer);
    let b = g.add_vertex(pts[1], VertexType::Outer);
    let c = g.add_vertex(pts[2], VertexType::Outer);
    let background = g.add_face(None);
    let exterior = g.add_face(None);
    let (ab, ba) = g.add_edge_pair(a, background, EdgeType::Null, b, exterior, EdgeType::Null);
    let (bc, cb) = g.add_edge_pair(b, background, EdgeType::Null, c, exterior, EdgeType::Null);
    let (ca, ac) = g.add_edge_pair(c, background, EdgeType::Null, a, exterior, EdgeType::Null);
    g.set_next(ab, bc);
    g.set_next(bc, ca);
    g.set_next(ca, ab);
    g.set_next(ba, ac);
    g.set_next(ac, cb);
    g.set_next(cb, ba);
    g.face_mut(background).outer_edge = Some(ab);
    g.face_mut(exterior).outer_edge = Some(ba);
    (g, background, exterior)
}

impl DiagramView for VoronoiDiagram {
    fn vertex_ids(&self) -> Vec<VertexId> {
        (0..self.graph.vertices.len()).map(VertexId).filter(|&v| self.graph.vertex(v).alive).collect()
    }
    fn vertex_position(&self, v: VertexId) -> Point2 {
        self.graph.vertex(v).position
    }
    fn vertex_clearance(&self, v: VertexId) -> f64 {
        self.graph.vertex(v).clearance_radius
    }
    fn vertex_status(&self, v: VertexId) -> VertexStatus {
        self.graph.vertex(v).status
    }
    fn vertex_type(&self, v: VertexId) -> VertexType {
        self.graph.vertex(v).vtype
    }
    fn face_ids(&self) -> Vec<FaceId> {
        (0..self.graph.faces.len()).map(FaceId).filter(|&f| self.graph.face(f).alive).collect()
    }
    fn face_incidence(&self, f: FaceId) -> Incidence {
        self.graph.face(f).incidence
    }
    fn face_site(&self, f: FaceId) -> Option<SiteId> {
        self.graph.face(f).site
    }
    fn face_cycle(&self, f: FaceId) -> Vec<EdgeId> {
        self.graph.face_cycle(f)
    }
    fn edge_source(&self, e: EdgeId) -> VertexId {
        self.graph.edge(e).source
    }
    fn edge_twin(&self, e: EdgeId) -> EdgeId {
        self.graph.edge(e).twin
    }
    fn edge_next(&self, e: EdgeId) -> EdgeId {
        self.graph.edge(e).next
    }
    fn edge_face(&self, e: EdgeId) -> FaceId {
        self.graph.edge(e).face
    }
    fn out_edges(&self, v: VertexId) -> Vec<EdgeId> {
        self.graph.out_edges(v)
    }
    fn site_ids(&self) -> Vec<SiteId> {
        (0..self.sites.len()).map(SiteId).filter(|&s| self.site_alive[s.0]).collect()
    }
    fn site(&self, id: SiteId) -> Site {
        self.sites[id.0]
    }
    fn eps_predicate(&self) -> f64 {
        self.cfg.eps_predicate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_point_site_takes_the_whole_background_face() {
        let mut d = VoronoiDiagram::with_default_config(10.0);
        d.insert_point_site(Point2::new(0.0, 0.0)).unwrap();
        assert_eq!(d.num_point_sites(), 1);
        assert_eq!(d.num_vertices(), 0);
    }

    #[test]
    fn rejects_point_outside_domain() {
        let mut d = VoronoiDiagram::with_default_config(10.0);
        let err = d.insert_point_site(Point2::new(20.0, 0.0)).unwrap_err();
        assert!(matches!(err, InsertError::InvalidSite(InvalidSiteReason::OutsideDomain)));
    }

    #[test]
    fn rejects_coincident_point_site() {
        let mut d = VoronoiDiagram::with_default_config(10.0);
        d.insert_point_site(Point2::new(1.0, 1.0)).unwrap();
        let err = d.insert_point_site(Point2::new(1.0, 1.0)).unwrap_err();
        assert!(matches!(err, InsertError::InvalidSite(InvalidSiteReason::Coincident)));
    }

    #[test]
    fn second_point_site_handles_minority_bootstrap_vertex_at_index_zero() {
        // `build_bootstrap` always places its first corner at angle 90
        // degrees. A site pair whose bisector is the x-axis (e.g. (0,-1)
        // then (0,1)) leaves that corner alone on the positive side, so
        // tagging the two boundary crossings by scan order rather than by
        // which side they enter would hand the new site's face the wrong
        // (old-site) wedge.
        let mut d = VoronoiDiagram::with_default_config(10.0);
        let s0 = d.insert_point_site(Point2::new(0.0, -1.0)).unwrap();
        let s1 = d.insert_point_site(Point2::new(0.0, 1.0)).unwrap();
        assert_eq!(d.num_point_sites(), 2);

        let f0 = d.face_of_site(SiteId(s0)).unwrap();
        let f1 = d.face_of_site(SiteId(s1)).unwrap();
        for e in d.graph.face_cycle(f1) {
            let v = d.graph.edge(e).source;
            if d.graph.vertex(v).vtype != VertexType::Outer {
                assert!(d.graph.vertex(v).position.y >= -1e-9, "site1's face should lie on the y >= 0 side");
            }
        }
        for e in d.graph.face_cycle(f0) {
            let v = d.graph.edge(e).source;
            if d.graph.vertex(v).vtype != VertexType::Outer {
                assert!(d.graph.vertex(v).position.y <= 1e-9, "site0's face should lie on the y <= 0 side");
            }
        }
    }

    #[test]
    fn second_point_site_creates_real_vertices() {
        let mut d = VoronoiDiagram::with_default_config(10.0);
        d.insert_point_site(Point2::new(-1.0, 0.0)).unwrap();
        d.insert_point_site(Point2::new(1.0, 0.0)).unwrap();
        assert_eq!(d.num_point_sites(), 2);
        let report = d.last_report().unwrap();
        assert!(report.vertices_added >= 1);
    }

    #[test]
    fn line_site_requires_two_distinct_point_handles() {
        let mut d = VoronoiDiagram::with_default_config(10.0);
        let a = d.insert_point_site(Point2::new(-2.0, 0.0)).unwrap();
        let err = d.insert_line_site(a, a).unwrap_err();
        assert!(matches!(err, InsertError::InvalidSite(InvalidSiteReason::DegenerateSegment)));
    }

    #[test]
    fn line_site_rejects_unknown_handle() {
        let mut d = VoronoiDiagram::with_default_config(10.0);
        let a = d.insert_point_site(Point2::new(-2.0, 0.0)).unwrap();
        let err = d.insert_line_site(a, 99).unwrap_err();
        assert!(matches!(err, InsertError::InvalidSite(InvalidSiteReason::InvalidHandle)));
    }
}
