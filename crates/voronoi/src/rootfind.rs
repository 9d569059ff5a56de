//! Bracketed 1-D root finder used by the split-point search (§4.9).
//!
//! Regula falsi with the Illinois anti-stalling correction: plain regula
//! falsi can stall with one endpoint frozen for many iterations when the
//! function is strongly convex/concave on the bracket; halving the stuck
//! side's weight after two same-sign updates recovers superlinear
//! convergence without the bookkeeping of full Brent.

/// Find `t` in `[0,1]` with `f(t) == 0`, given `f(0)` and `f(1)` of opposite
/// sign. Returns `None` if the bracket is not valid or the iteration cap is
/// exhausted without reaching `eps`.
pub fn bracketed_root(mut f: impl FnMut(f64) -> f64, eps: f64) -> Option<f64> {
    let mut a = 0.0_f64;
    let mut b = 1.0_f64;
    let mut fa = f(a);
    let mut fb = f(b);
    if fa == 0.0 {
        return Some(a);
    }
    if fb == 0.0 {
        return Some(b);
    }
    if fa.signum() == fb.signum() || !fa.is_finite() || !fb.is_finite() {
        return None;
    }

    const MAX_ITERS: usize = 200;
    let mut side = 0i8; // -1: a stuck, +1: b stuck, 0: neither yet
    for _ in 0..MAX_ITERS {
        let c = (a * fb - b * fa) / (fb - fa);
        let fc = f(c);
        if !fc.is_finite() {
            return None;
        }
        if fc.abs() <= eps || (b - a).abs() <= eps {
            return Some(c);
        }
        if fc.signum() == fa.signum() {
            a = c;
            fa = fc;
            if side == -1 {
                fb *= 0.5;
            }
            side = -1;
        } else {
            b = c;
            fb = fc;
            if side == 1 {
                fa *= 0.5;
            }
            side = 1;
        }
    }
    Some((a * fb - b * fa) / (fb - fa))
}
