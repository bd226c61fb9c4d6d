//! Zero-phase (forward-backward) second-order-section filtering.
//!
//! Matches `scipy.signal.sosfiltfilt` with its defaults:
//!   • odd-reflection padding of `3 · (2·n_sections + 1 − n_trailing_zero)`
//!     samples on each side
//!   • per-section steady-state initial conditions (`sosfilt_zi`), scaled by
//!     the first sample of each pass
//!   • forward pass, reversed backward pass, padding stripped
//!
//! The output has no net phase shift and the same length as the input.
use ndarray::{Array2, ArrayView1};

use super::design::Section;
use crate::error::{Error, Result};

/// Biquad delay-line state (Direct Form II transposed).
type State = [f64; 2];

/// Steady-state initial conditions for a unit step, one state per section.
pub fn sosfilt_zi(sections: &[Section]) -> Vec<State> {
    let mut scale = 1.0;
    sections
        .iter()
        .map(|s| {
            let [b0, b1, b2] = s.b;
            let [_, a1, a2] = s.a;
            let r0 = b1 - a1 * b0;
            let r1 = b2 - a2 * b0;
            let z0 = (r0 + r1) / (1.0 + a1 + a2);
            let z1 = r1 - a2 * z0;
            let zi = [scale * z0, scale * z1];
            scale *= (b0 + b1 + b2) / (1.0 + a1 + a2);
            zi
        })
        .collect()
}

/// Causal filtering of `x` starting from state `zi`.
pub fn sosfilt(sections: &[Section], x: &[f64], zi: &[State]) -> Vec<f64> {
    let mut state = zi.to_vec();
    x.iter()
        .map(|&sample| {
            let mut v = sample;
            for (s, z) in sections.iter().zip(state.iter_mut()) {
                let y = s.b[0] * v + z[0];
                z[0] = s.b[1] * v - s.a[1] * y + z[1];
                z[1] = s.b[2] * v - s.a[2] * y;
                v = y;
            }
            v
        })
        .collect()
}

/// Edge padding used by [`sosfiltfilt`].
pub fn pad_len(sections: &[Section]) -> usize {
    let b_zeros = sections.iter().filter(|s| s.b[2] == 0.0).count();
    let a_zeros = sections.iter().filter(|s| s.a[2] == 0.0).count();
    3 * (2 * sections.len() + 1 - b_zeros.min(a_zeros))
}

/// Forward-backward filter a single 1-D signal.
///
/// The signal must be longer than [`pad_len`] samples.
pub fn sosfiltfilt(sections: &[Section], x: &[f64]) -> Result<Vec<f64>> {
    let n = x.len();
    let edge = pad_len(sections);
    if n <= edge {
        return Err(Error::numeric(format!(
            "signal of {n} samples is too short for zero-phase filtering (needs > {edge})"
        )));
    }

    let zi = sosfilt_zi(sections);
    let scaled = |x0: f64| zi.iter().map(|z| [z[0] * x0, z[1] * x0]).collect::<Vec<_>>();

    let ext = odd_ext(x, edge);
    let mut y = sosfilt(sections, &ext, &scaled(ext[0]));
    y.reverse();
    let mut y = sosfilt(sections, &y, &scaled(y[0]));
    y.reverse();

    Ok(y[edge..edge + n].to_vec())
}

/// Zero-phase filter every channel of `data` ([C, T]) into a new array.
pub fn apply_sos_zero_phase(data: &Array2<f64>, sections: &[Section]) -> Result<Array2<f64>> {
    let mut out = Array2::zeros(data.raw_dim());
    for (row, mut dst) in data.rows().into_iter().zip(out.rows_mut()) {
        let filtered = sosfiltfilt(sections, &row.to_vec())?;
        dst.assign(&ArrayView1::from(&filtered));
    }
    Ok(out)
}

/// Odd reflection about both end points.
///
/// Left:  `2·x[0] − x[i]`   for i = edge, …, 1
/// Right: `2·x[n−1] − x[n−1−i]` for i = 1, …, edge
fn odd_ext(x: &[f64], edge: usize) -> Vec<f64> {
    let n = x.len();
    let (first, last) = (x[0], x[n - 1]);
    let mut out = Vec::with_capacity(n + 2 * edge);
    out.extend((1..=edge).rev().map(|i| 2.0 * first - x[i]));
    out.extend_from_slice(x);
    out.extend((1..=edge).map(|i| 2.0 * last - x[n - 1 - i]));
    out
}
