mod common;
use common::noise_like;
use emgprep::normalize::{mean_std, rest_window_samples, zscore_rest};
use emgprep::{emg_filter, ErrorKind, FilterConfig};
use ndarray::{s, Array2};

const FS: u32 = 2000;

#[test]
fn filtered_recording_is_standard_in_rest_window() {
    let x = noise_like(4, 40_000, FS as f64);
    let y = emg_filter(&x, FS as f64, &FilterConfig::default()).unwrap();
    let z = zscore_rest(&y, FS, (5.0, 15.0)).unwrap();

    let rest = rest_window_samples((5.0, 15.0), FS, z.ncols()).unwrap();
    assert_eq!(rest, 10_000..30_000);
    for c in 0..4 {
        let (m, s) = mean_std(z.slice(s![c, rest.clone()]));
        approx::assert_abs_diff_eq!(m, 0.0, epsilon = 1e-9);
        approx::assert_abs_diff_eq!(s, 1.0, epsilon = 1e-9);
    }
}

#[test]
fn activity_reads_in_rest_standard_deviations() {
    // Quiet rest, then a burst ten times louder.
    let mut x = noise_like(1, 20_000, FS as f64) - 1.5;
    x.slice_mut(s![.., 12_000..]).mapv_inplace(|v| v * 10.0);

    let z = zscore_rest(&x, FS, (0.0, 5.0)).unwrap();
    let (_, burst_std) = mean_std(z.slice(s![0, 12_000..]));
    assert!(burst_std > 8.0 && burst_std < 12.0, "burst std {burst_std}");
}

#[test]
fn dead_channel_in_rest_window_is_reported() {
    let mut x: Array2<f64> = noise_like(3, 20_000, FS as f64);
    x.slice_mut(s![2, ..]).fill(0.25);

    let err = zscore_rest(&x, FS, (1.0, 5.0)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Numeric);
}

#[test]
fn window_past_recording_end_is_clipped() {
    let x = noise_like(2, 20_000, FS as f64);
    // Default window [5, 120] s on a 10 s recording uses samples 10 000..20 000.
    let z = zscore_rest(&x, FS, (5.0, 120.0)).unwrap();
    for c in 0..2 {
        let (m, s) = mean_std(z.slice(s![c, 10_000..]));
        approx::assert_abs_diff_eq!(m, 0.0, epsilon = 1e-9);
        approx::assert_abs_diff_eq!(s, 1.0, epsilon = 1e-9);
    }
}
