//! Tolerances and sizing knobs for the engine.
//!
//! Mirrors the teacher's `GeomCfg` convention: one small `Copy` struct holding
//! every numerical tolerance, threaded explicitly through the call graph
//! rather than read from a global.

/// Engine configuration: domain size and numerical tolerances.
#[derive(Clone, Copy, Debug)]
pub struct VoronoiConfig {
    /// Sites must lie strictly inside the circle of this radius around the origin.
    pub far_radius: f64,
    /// Number of bins per axis in the default face grid.
    pub grid_bins: usize,
    /// Tolerance for the in-circle predicate (values within this of zero are
    /// evaluated last by the priority queue but are not otherwise special-cased).
    pub eps_predicate: f64,
    /// Two points closer than this are considered coincident.
    pub eps_coincident: f64,
    /// Convergence tolerance for the split-point root finder.
    pub eps_root: f64,
}

impl VoronoiConfig {
    /// Construct a config with the given domain size and grid resolution,
    /// defaulting every tolerance.
    pub fn new(far_radius: f64, grid_bins: usize) -> Self {
        Self {
            far_radius,
            grid_bins,
            ..Self::default_tolerances()
        }
    }

    fn default_tolerances() -> Self {
        Self {
            far_radius: 1.0,
            grid_bins: 1,
            eps_predicate: 1e-9,
            eps_coincident: 1e-7,
            eps_root: 1e-10,
        }
    }
}

impl Default for VoronoiConfig {
    fn default() -> Self {
        Self::new(10.0, 50)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_overrides_only_sizing() {
        let cfg = VoronoiConfig::new(25.0, 12);
        assert_eq!(cfg.far_radius, 25.0);
        assert_eq!(cfg.grid_bins, 12);
        assert_eq!(cfg.eps_predicate, 1e-9);
    }
}
