//! Event tables and repetition intervals.
//!
//! The companion table of `S7E1.mat` is `S7E1_events.csv`: one row per
//! clicker press, event time in seconds in the `Seconds` column.  Presses come
//! in start/end pairs, one pair per repetition.
//!
//! [`event_intervals`] turns the pairs into `[start, end)` sample ranges:
//!
//! ```
//! use emgprep::events::event_intervals;
//! use ndarray::array;
//!
//! let iv = event_intervals(&array![5.0, 7.0, 20.0, 22.0], 2000).unwrap();
//! assert_eq!(iv, array![[10000, 14000], [40000, 44000]]);
//! ```
use std::ops::Range;
use std::path::Path;

use ndarray::{Array1, Array2, ArrayView2};

use crate::error::{Error, Result};

/// Read the event-time column `column` of the CSV table at `path`.
pub fn read_event_times(path: &Path, column: &str) -> Result<Array1<f64>> {
    let source = path.display().to_string();
    let file = std::fs::File::open(path).map_err(|e| Error::io(path, "event table", e))?;
    let mut reader = csv::Reader::from_reader(file);

    let headers = reader
        .headers()
        .map_err(|e| Error::format(&source, e.to_string()))?;
    let idx = headers
        .iter()
        .position(|h| h.trim() == column)
        .ok_or_else(|| Error::format(&source, format!("no '{column}' column in {headers:?}")))?;

    let mut times = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record.map_err(|e| Error::format(&source, e.to_string()))?;
        let cell = record.get(idx).unwrap_or("").trim();
        let t: f64 = cell.parse().map_err(|_| {
            Error::format(&source, format!("row {row}: '{cell}' is not a time in seconds"))
        })?;
        times.push(t);
    }
    Ok(Array1::from(times))
}

/// Convert paired event times (s) into `[repetition, 2]` sample indices.
///
/// Each time is multiplied by `sampling_rate` and truncated.  Pairs must be
/// ordered and non-overlapping: `start <= end <= next start`.
pub fn event_intervals(timestamps: &Array1<f64>, sampling_rate: u32) -> Result<Array2<usize>> {
    if timestamps.len() % 2 != 0 {
        return Err(Error::format(
            "event table",
            format!("{} event times do not form start/end pairs", timestamps.len()),
        ));
    }

    let fs = sampling_rate as f64;
    let mut samples = Vec::with_capacity(timestamps.len());
    for &t in timestamps.iter() {
        let s = t * fs;
        if !s.is_finite() || s < 0.0 {
            return Err(Error::format("event table", format!("invalid event time {t} s")));
        }
        samples.push(s as usize);
    }

    let n_rep = samples.len() / 2;
    let intervals = Array2::from_shape_vec((n_rep, 2), samples)
        .map_err(|e| Error::format("event table", e.to_string()))?;

    let mut prev_end = 0;
    for (rep, pair) in intervals.rows().into_iter().enumerate() {
        let (start, end) = (pair[0], pair[1]);
        if start > end || start < prev_end {
            return Err(Error::format(
                "event table",
                format!("repetition {rep}: interval [{start}, {end}) overlaps or is reversed"),
            ));
        }
        prev_end = end;
    }
    Ok(intervals)
}

/// Half-open sample range of repetition `rep`.
pub fn interval(intervals: ArrayView2<'_, usize>, rep: usize) -> Option<Range<usize>> {
    (rep < intervals.nrows()).then(|| intervals[[rep, 0]]..intervals[[rep, 1]])
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn seconds_to_samples_truncates() {
        let iv = event_intervals(&array![1.00049, 2.9999], 1000).unwrap();
        assert_eq!(iv, array![[1000, 2999]]);
    }

    #[test]
    fn odd_count_is_format_error() {
        let err = event_intervals(&array![1.0, 2.0, 3.0], 2000).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Format);
    }

    #[test]
    fn overlapping_pairs_rejected() {
        assert!(event_intervals(&array![1.0, 5.0, 4.0, 6.0], 100).is_err());
        assert!(event_intervals(&array![3.0, 2.0], 100).is_err());
        assert!(event_intervals(&array![-1.0, 2.0], 100).is_err());
    }

    #[test]
    fn empty_table_gives_no_repetitions() {
        let iv = event_intervals(&Array1::zeros(0), 2000).unwrap();
        assert_eq!(iv.dim(), (0, 2));
    }

    #[test]
    fn interval_lookup() {
        let iv = array![[10, 20], [30, 40]];
        assert_eq!(interval(iv.view(), 1), Some(30..40));
        assert_eq!(interval(iv.view(), 2), None);
    }
}
