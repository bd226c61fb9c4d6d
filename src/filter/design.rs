//! Butterworth band filters as second-order sections.
//!
//! Design path (same as `scipy.signal.butter(..., output='sos')`):
//!   • analog prototype: N poles `-exp(jπm / 2N)`, m = −N+1, −N+3, …, N−1
//!   • lowpass → bandpass / bandstop transform at the pre-warped band edges
//!   • bilinear transform (fs = 2 in normalised units)
//!   • pole/zero pairing into biquads, poles nearest the unit circle last,
//!     overall gain folded into the first section
//!
//! A band filter of prototype order N has 2N poles, i.e. N sections.
use num_complex::Complex64;
use std::f64::consts::PI;

use crate::error::{Error, Result};

/// One biquad: `H(z) = (b0 + b1 z⁻¹ + b2 z⁻²) / (1 + a1 z⁻¹ + a2 z⁻²)`.
///
/// `a[0]` is always 1.  First-order sections have `b[2] = a[2] = 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Section {
    pub b: [f64; 3],
    pub a: [f64; 3],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BandType {
    Bandpass,
    Bandstop,
}

/// Zeros, poles and gain.
#[derive(Debug, Clone)]
struct Zpk {
    z: Vec<Complex64>,
    p: Vec<Complex64>,
    k: f64,
}

const IM_TOL: f64 = 1e-12;

/// Design an `order`-th order Butterworth band filter for `band = (low, high)` Hz.
///
/// Fails with a configuration error unless `0 < low < high < fs / 2`, and
/// with a numeric error if the resulting sections are not stable.
pub fn butter_band(order: usize, band: (f64, f64), sfreq: f64, btype: BandType) -> Result<Vec<Section>> {
    let (lo, hi) = band;
    let nyq = sfreq / 2.0;
    if order == 0 {
        return Err(Error::config("filter order must be at least 1"));
    }
    if !(lo > 0.0 && lo < hi && hi < nyq) {
        return Err(Error::config(format!(
            "{btype:?} band ({lo}, {hi}) Hz must satisfy 0 < low < high < Nyquist ({nyq} Hz)"
        )));
    }

    // Pre-warp: normalised cutoffs (Nyquist = 1) mapped with fs = 2.
    let warp = |f: f64| 4.0 * (PI * (f / nyq) / 2.0).tan();
    let (w_lo, w_hi) = (warp(lo), warp(hi));
    let bw = w_hi - w_lo;
    let wo = (w_lo * w_hi).sqrt();

    let proto = butter_prototype(order);
    let analog = match btype {
        BandType::Bandpass => lp_to_bp(&proto, wo, bw),
        BandType::Bandstop => lp_to_bs(&proto, wo, bw),
    };
    let digital = bilinear(&analog, 2.0);

    if let Some(p) = digital.p.iter().find(|p| p.norm() >= 1.0) {
        return Err(Error::numeric(format!(
            "{btype:?} ({lo}, {hi}) Hz at {sfreq} Hz is unstable: pole {p} outside unit circle"
        )));
    }
    zpk_to_sos(&digital)
}

/// Magnitude of the cascade's response at `freq` Hz.
pub fn sos_frequency_response(sections: &[Section], freq: f64, sfreq: f64) -> f64 {
    let w = 2.0 * PI * freq / sfreq;
    let z1 = Complex64::from_polar(1.0, -w);
    let z2 = z1 * z1;
    sections
        .iter()
        .map(|s| {
            let num = s.b[0] + s.b[1] * z1 + s.b[2] * z2;
            let den = s.a[0] + s.a[1] * z1 + s.a[2] * z2;
            (num / den).norm()
        })
        .product()
}

// ── Prototype and transforms ────────────────────────────────────────────────

fn butter_prototype(order: usize) -> Zpk {
    let n = order as f64;
    let p = (0..order)
        .map(|i| {
            let m = -(n - 1.0) + 2.0 * i as f64;
            -Complex64::from_polar(1.0, PI * m / (2.0 * n))
        })
        .collect();
    Zpk { z: vec![], p, k: 1.0 }
}

/// `s → (s² + wo²) / (s·bw)`.
fn lp_to_bp(lp: &Zpk, wo: f64, bw: f64) -> Zpk {
    let degree = lp.p.len() - lp.z.len();
    let split = |roots: &[Complex64]| -> Vec<Complex64> {
        let scaled: Vec<Complex64> = roots.iter().map(|r| *r * (bw / 2.0)).collect();
        let root = |r: &Complex64| (*r * *r - wo * wo).sqrt();
        scaled
            .iter()
            .map(|r| *r + root(r))
            .chain(scaled.iter().map(|r| *r - root(r)))
            .collect()
    };
    let mut z = split(&lp.z);
    z.extend(std::iter::repeat(Complex64::new(0.0, 0.0)).take(degree));
    Zpk {
        z,
        p: split(&lp.p),
        k: lp.k * bw.powi(degree as i32),
    }
}

/// `s → (s·bw) / (s² + wo²)`.
fn lp_to_bs(lp: &Zpk, wo: f64, bw: f64) -> Zpk {
    let degree = lp.p.len() - lp.z.len();
    let split = |roots: &[Complex64]| -> Vec<Complex64> {
        let inverted: Vec<Complex64> = roots.iter().map(|r| (bw / 2.0) / *r).collect();
        let root = |r: &Complex64| (*r * *r - wo * wo).sqrt();
        inverted
            .iter()
            .map(|r| *r + root(r))
            .chain(inverted.iter().map(|r| *r - root(r)))
            .collect()
    };
    let mut z = split(&lp.z);
    z.extend(std::iter::repeat(Complex64::new(0.0, wo)).take(degree));
    z.extend(std::iter::repeat(Complex64::new(0.0, -wo)).take(degree));

    let prod_neg = |roots: &[Complex64]| roots.iter().fold(Complex64::new(1.0, 0.0), |acc, r| acc * -*r);
    let k = lp.k * (prod_neg(&lp.z) / prod_neg(&lp.p)).re;
    Zpk { z, p: split(&lp.p), k }
}

fn bilinear(analog: &Zpk, fs: f64) -> Zpk {
    let fs2 = 2.0 * fs;
    let degree = analog.p.len() - analog.z.len();
    let map = |r: &Complex64| (fs2 + *r) / (fs2 - *r);

    let mut z: Vec<Complex64> = analog.z.iter().map(map).collect();
    z.extend(std::iter::repeat(Complex64::new(-1.0, 0.0)).take(degree));
    let p = analog.p.iter().map(map).collect();

    let prod = |roots: &[Complex64]| roots.iter().fold(Complex64::new(1.0, 0.0), |acc, r| acc * (fs2 - *r));
    let k = analog.k * (prod(&analog.z) / prod(&analog.p)).re;
    Zpk { z, p, k }
}

// ── Pairing ─────────────────────────────────────────────────────────────────

/// A root of a real polynomial, keeping one representative per conjugate pair.
#[derive(Debug, Clone, Copy)]
enum Root {
    Pair(Complex64),
    Real(f64),
}

fn split_roots(roots: &[Complex64]) -> (Vec<Complex64>, Vec<f64>) {
    let mut pairs = Vec::new();
    let mut reals = Vec::new();
    for r in roots {
        if r.im.abs() <= IM_TOL * r.norm().max(1.0) {
            reals.push(r.re);
        } else if r.im > 0.0 {
            pairs.push(*r);
        }
    }
    (pairs, reals)
}

/// Quadratic (or linear) coefficients `[1, c1, c2]` with the given roots.
fn poly(roots: &[Root]) -> [f64; 3] {
    match roots {
        [] => [1.0, 0.0, 0.0],
        [Root::Pair(c)] => [1.0, -2.0 * c.re, c.norm_sqr()],
        [Root::Real(r)] => [1.0, -r, 0.0],
        [Root::Real(r1), Root::Real(r2)] => [1.0, -(r1 + r2), r1 * r2],
        // Unreachable by construction: a section holds at most two roots.
        _ => [1.0, 0.0, 0.0],
    }
}

/// Take the zero group nearest to `target` (a pair, or up to `want` reals).
fn take_zeros(target: Complex64, want: usize, pairs: &mut Vec<Complex64>, reals: &mut Vec<f64>) -> Vec<Root> {
    let prefer_pair = want == 2 && (!pairs.is_empty()) && (target.im.abs() > IM_TOL || reals.len() < 2);
    if prefer_pair {
        let i = nearest(pairs.iter().map(|z| (*z - target).norm()));
        return vec![Root::Pair(pairs.swap_remove(i))];
    }
    let mut out = Vec::new();
    while out.len() < want && !reals.is_empty() {
        let i = nearest(reals.iter().map(|&z| (Complex64::new(z, 0.0) - target).norm()));
        out.push(Root::Real(reals.swap_remove(i)));
    }
    if out.is_empty() && !pairs.is_empty() && want == 2 {
        let i = nearest(pairs.iter().map(|z| (*z - target).norm()));
        out.push(Root::Pair(pairs.swap_remove(i)));
    }
    out
}

fn nearest(dist: impl Iterator<Item = f64>) -> usize {
    dist.enumerate()
        .fold((0, f64::INFINITY), |best, (i, d)| if d < best.1 { (i, d) } else { best })
        .0
}

fn zpk_to_sos(zpk: &Zpk) -> Result<Vec<Section>> {
    let (pole_pairs, mut pole_reals) = split_roots(&zpk.p);
    let (mut zero_pairs, mut zero_reals) = split_roots(&zpk.z);

    // Pole groups, nearest the unit circle first.
    let mut groups: Vec<(f64, Vec<Root>, Complex64)> = pole_pairs
        .iter()
        .map(|&c| (1.0 - c.norm(), vec![Root::Pair(c)], c))
        .collect();
    pole_reals.sort_by(|a, b| (1.0 - a.abs()).total_cmp(&(1.0 - b.abs())));
    for chunk in pole_reals.chunks(2) {
        let roots: Vec<Root> = chunk.iter().map(|&r| Root::Real(r)).collect();
        let dist = chunk.iter().map(|r| 1.0 - r.abs()).fold(f64::INFINITY, f64::min);
        groups.push((dist, roots, Complex64::new(chunk[0], 0.0)));
    }
    groups.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut sections = Vec::with_capacity(groups.len());
    for (_, poles, target) in &groups {
        let order = poles.iter().map(|r| if matches!(r, Root::Pair(_)) { 2 } else { 1 }).sum();
        let zeros = take_zeros(*target, order, &mut zero_pairs, &mut zero_reals);
        sections.push(Section {
            b: poly(&zeros),
            a: poly(poles),
        });
    }
    if !zero_pairs.is_empty() || !zero_reals.is_empty() {
        return Err(Error::numeric("more zeros than poles, cannot form sections"));
    }

    // Highest-Q section last; gain in the first.
    sections.reverse();
    if let Some(first) = sections.first_mut() {
        first.b.iter_mut().for_each(|v| *v *= zpk.k);
    }
    Ok(sections)
}
