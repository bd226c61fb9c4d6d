//! Rest-anchored z-score standardization.
//!
//! `zscore_rest` — per channel (every lane along the last axis):
//!   μ, σ = mean, std (ddof = 0) of x[.., a·fs .. b·fs]
//!   out  = (x − μ) / σ          over the whole recording
//!
//! Inside the rest window each channel ends up with mean 0, std 1; outside it
//! the signal reads in units of rest-period standard deviations.
//!
//! `zscore_trace` — whole-trace z-score of a single channel, used when
//! stacking traces for display.
use std::ops::Range;

use ndarray::{s, Array, Array1, ArrayBase, ArrayView1, Axis, Data, Dimension};

use crate::error::{Error, Result};

/// Half-open sample range of the rest window `[a, b]` s, clipped to `n_t`.
pub fn rest_window_samples(window: (f64, f64), sfreq: u32, n_t: usize) -> Result<Range<usize>> {
    let (a, b) = window;
    if !(a >= 0.0 && a < b) {
        return Err(Error::config(format!("rest window [{a}, {b}] s must satisfy 0 <= a < b")));
    }
    let fs = sfreq as f64;
    let start = (a * fs) as usize;
    let end = ((b * fs) as usize).min(n_t);
    if start >= end {
        return Err(Error::config(format!(
            "rest window [{a}, {b}] s lies outside a recording of {n_t} samples at {sfreq} Hz"
        )));
    }
    Ok(start..end)
}

/// Mean and population standard deviation.
pub fn mean_std(x: ArrayView1<'_, f64>) -> (f64, f64) {
    let n = x.len() as f64;
    let mean = x.sum() / n;
    let var = x.iter().map(|&v| (v - mean) * (v - mean)).sum::<f64>() / n;
    (mean, var.sqrt())
}

fn check_spread(mean: f64, std: f64, what: impl FnOnce() -> String) -> Result<()> {
    if !std.is_finite() || std <= 16.0 * f64::EPSILON * mean.abs() || std == 0.0 {
        return Err(Error::numeric(format!("{} has zero variance (std = {std:e})", what())));
    }
    Ok(())
}

/// Z-score every lane of `x` (time on the last axis) against its own
/// statistics inside the rest window.  Returns a new array.
///
/// Fails with a numeric error if any lane is constant inside the window.
pub fn zscore_rest<S, D>(x: &ArrayBase<S, D>, sfreq: u32, window: (f64, f64)) -> Result<Array<f64, D>>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    if x.ndim() == 0 {
        return Err(Error::config("cannot standardize a scalar"));
    }
    let axis = Axis(x.ndim() - 1);
    let rest = rest_window_samples(window, sfreq, x.len_of(axis))?;

    let mut out = x.to_owned();
    for (lane_idx, mut lane) in out.lanes_mut(axis).into_iter().enumerate() {
        let (mean, std) = mean_std(lane.slice(s![rest.clone()]));
        check_spread(mean, std, || format!("channel {lane_idx} in rest window {rest:?}"))?;
        lane.mapv_inplace(|v| (v - mean) / std);
    }
    Ok(out)
}

/// Whole-trace z-score of one channel.
pub fn zscore_trace(x: ArrayView1<'_, f64>) -> Result<Array1<f64>> {
    if x.is_empty() {
        return Err(Error::numeric("cannot z-score an empty trace"));
    }
    let (mean, std) = mean_std(x);
    check_spread(mean, std, || "trace".to_string())?;
    Ok(x.mapv(|v| (v - mean) / std))
}

/// Root mean square of a trace, `None` when it has no samples.
pub fn rms(x: ArrayView1<'_, f64>) -> Option<f64> {
    if x.is_empty() {
        return None;
    }
    Some((x.iter().map(|&v| v * v).sum::<f64>() / x.len() as f64).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2, Array3};

    #[test]
    fn rms_of_empty_trace_is_none() {
        let empty: Array1<f64> = Array1::zeros(0);
        assert_eq!(rms(empty.view()), None);
        let x = array![3.0, -4.0, 3.0, -4.0];
        approx::assert_abs_diff_eq!(rms(x.view()).unwrap(), 12.5_f64.sqrt(), epsilon = 1e-12);
    }

    fn synthetic(n_ch: usize, n_t: usize) -> Array2<f64> {
        Array2::from_shape_fn((n_ch, n_t), |(c, t)| {
            (c as f64 * 3.7 + t as f64 * 0.1).sin() * 50.0 + c as f64 * 12.0
        })
    }

    #[test]
    fn rest_window_is_standard_normal() {
        let x = synthetic(4, 3000);
        let z = zscore_rest(&x, 10, (5.0, 120.0)).unwrap();
        for c in 0..4 {
            let (m, s) = mean_std(z.slice(s![c, 50..1200]));
            approx::assert_abs_diff_eq!(m, 0.0, epsilon = 1e-9);
            approx::assert_abs_diff_eq!(s, 1.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn samples_outside_window_use_rest_statistics() {
        let x = synthetic(1, 300);
        let z = zscore_rest(&x, 10, (1.0, 10.0)).unwrap();
        let (m, s) = mean_std(x.slice(s![0, 10..100]));
        approx::assert_abs_diff_eq!(z[[0, 250]], (x[[0, 250]] - m) / s, epsilon = 1e-12);
        approx::assert_abs_diff_eq!(z[[0, 0]], (x[[0, 0]] - m) / s, epsilon = 1e-12);
    }

    #[test]
    fn input_is_left_untouched() {
        let x = synthetic(2, 200);
        let before = x.clone();
        let _ = zscore_rest(&x, 10, (0.0, 5.0)).unwrap();
        assert_eq!(x, before);
    }

    #[test]
    fn leading_batch_dimensions_are_independent() {
        let x = Array3::from_shape_fn((2, 3, 400), |(b, c, t)| {
            ((b * 7 + c) as f64 + t as f64 * 0.3).cos() * (1.0 + b as f64)
        });
        let z = zscore_rest(&x, 100, (0.5, 3.0)).unwrap();
        for b in 0..2 {
            for c in 0..3 {
                let (m, s) = mean_std(z.slice(s![b, c, 50..300]));
                approx::assert_abs_diff_eq!(m, 0.0, epsilon = 1e-9);
                approx::assert_abs_diff_eq!(s, 1.0, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn constant_rest_channel_is_numeric_error() {
        let mut x = synthetic(3, 500);
        x.slice_mut(s![1, 10..100]).fill(4.2);
        let err = zscore_rest(&x, 10, (1.0, 10.0)).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Numeric);
        assert!(err.to_string().contains("channel 1"));
    }

    #[test]
    fn window_clipped_to_recording() {
        assert_eq!(rest_window_samples((5.0, 120.0), 2000, 60_000).unwrap(), 10_000..60_000);
        let err = rest_window_samples((5.0, 120.0), 2000, 5_000).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Config);
    }

    #[test]
    fn trace_zscore() {
        let x = Array1::from(vec![1.0, 2.0, 3.0, 4.0]);
        let z = zscore_trace(x.view()).unwrap();
        let (m, s) = mean_std(z.view());
        approx::assert_abs_diff_eq!(m, 0.0, epsilon = 1e-12);
        approx::assert_abs_diff_eq!(s, 1.0, epsilon = 1e-12);
        assert!(zscore_trace(Array1::from_elem(8, 3.0).view()).is_err());
    }
}
