//! # emgprep — EMG recording ingestion and preprocessing
//!
//! `emgprep` turns a directory of raw per-subject EMG recordings into a
//! filtered, rest-standardized `[channel, time]` signal plus the sample
//! intervals of every task repetition.
//!
//! ## Pipeline overview
//!
//! ```text
//! data/
//!   ├─ subject_information.txt   {"7": 2000, ...}       registry::SamplingRateRegistry
//!   ├─ S7E1.mat                  [C, T_raw]              scan + mat::read_recording
//!   └─ S7E1_events.csv           Seconds                 events::read_event_times
//!        │
//!        ├─ loader            drop all-zero samples, splice-correct event times
//!        ├─ filter            57.5–62.5 Hz notch → 40–500 Hz bandpass (zero-phase SOS)
//!        ├─ normalize         z-score against the 5–120 s rest window
//!        └─ events            event pairs (s) → [start, end) samples
//!             │
//!             └─→ ProcessedSignal { sampling_rate, signal [C, T], event_intervals [R, 2] }
//! ```
//!
//! ## Quick start
//!
//! ```no_run
//! use emgprep::{import_subject, PipelineConfig};
//!
//! let cfg = PipelineConfig::default();
//! let out = import_subject("data".as_ref(), 7, &cfg).unwrap();
//!
//! let swallow = out.repetition(9, &[9, 10]).unwrap(); // channels 10 and 11
//! println!("{} Hz, {:?}", out.sampling_rate, swallow.dim());
//! ```
//!
//! ## Running individual steps
//!
//! ```no_run
//! use emgprep::{filter::emg_filter, normalize::zscore_rest, events::event_intervals};
//! use emgprep::config::FilterConfig;
//! use ndarray::{array, Array2};
//!
//! let raw: Array2<f64> = Array2::zeros((20, 600_000));
//! let filtered = emg_filter(&raw, 2000.0, &FilterConfig::default()).unwrap();
//! let z = zscore_rest(&filtered, 2000, (5.0, 120.0)).unwrap();
//! let iv = event_intervals(&array![5.0, 7.0], 2000).unwrap();
//! ```

pub mod config;
pub mod error;
pub mod events;
pub mod filter;
pub mod loader;
pub mod mat;
pub mod normalize;
pub mod registry;
pub mod scan;

use std::collections::BTreeMap;
use std::path::Path;

use ndarray::{s, Array1, Array2, Axis};
use tracing::debug;

// ── Crate-root re-exports ─────────────────────────────────────────────────

pub use config::{FilterConfig, PipelineConfig, SplicePolicy, VariableSelection};
pub use error::{Error, ErrorKind, Result};
pub use events::{event_intervals, read_event_times};
pub use filter::{apply_sos_zero_phase, butter_band, emg_filter, sosfiltfilt, BandType, Section};
pub use loader::{
    apply_mask, load_file, load_subject, load_subjects, mask_transitions, splice_offset,
    validity_mask, RawSubjectRecord,
};
pub use mat::read_recording;
pub use normalize::{rest_window_samples, rms, zscore_rest, zscore_trace};
pub use registry::SamplingRateRegistry;
pub use scan::{parse_filename, scan, ParsedName, RawFile};

/// Pipeline output handed to the visualization layer.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedSignal {
    pub sampling_rate: u32,
    /// `[channel, time]`, filtered and standardized as configured.
    pub signal: Array2<f64>,
    /// `[repetition, 2]` half-open `[start, end)` sample indices.
    pub event_intervals: Array2<usize>,
}

impl ProcessedSignal {
    pub fn n_repetitions(&self) -> usize {
        self.event_intervals.nrows()
    }

    /// Time of every sample in seconds.
    pub fn time_axis(&self) -> Array1<f64> {
        let fs = self.sampling_rate as f64;
        Array1::from_shape_fn(self.signal.ncols(), |t| t as f64 / fs)
    }

    /// `[channels.len(), end − start]` slice of repetition `rep` (0-based).
    pub fn repetition(&self, rep: usize, channels: &[usize]) -> Result<Array2<f64>> {
        let range = events::interval(self.event_intervals.view(), rep).ok_or_else(|| {
            Error::config(format!(
                "repetition {rep} out of range ({} repetitions)",
                self.n_repetitions()
            ))
        })?;
        if range.end > self.signal.ncols() {
            return Err(Error::format(
                "event table",
                format!(
                    "repetition {rep} ends at sample {} past the recording ({} samples)",
                    range.end,
                    self.signal.ncols()
                ),
            ));
        }
        if let Some(&bad) = channels.iter().find(|&&c| c >= self.signal.nrows()) {
            return Err(Error::config(format!(
                "channel {bad} out of range ({} channels)",
                self.signal.nrows()
            )));
        }
        Ok(self
            .signal
            .select(Axis(0), channels)
            .slice(s![.., range])
            .to_owned())
    }
}

/// Filter (optional), standardize (optional) and index one loaded record.
///
/// Pure function of its inputs; the record is not modified.
pub fn process_record(record: &RawSubjectRecord, cfg: &PipelineConfig) -> Result<ProcessedSignal> {
    let fs = record.sampling_rate;
    cfg.validate_for(fs)?;

    let filtered = if cfg.filter.enabled {
        filter::emg_filter(&record.recording, fs as f64, &cfg.filter)?
    } else {
        record.recording.clone()
    };

    let signal = if cfg.standardize {
        normalize::zscore_rest(&filtered, fs, cfg.rest_window)?
    } else {
        filtered
    };

    let event_intervals = events::event_intervals(&record.event_timestamps, fs)?;
    debug!(
        subject = record.subject_id,
        channels = signal.nrows(),
        samples = signal.ncols(),
        repetitions = event_intervals.nrows(),
        "processed subject"
    );

    Ok(ProcessedSignal {
        sampling_rate: fs,
        signal,
        event_intervals,
    })
}

/// Load and process several subjects from `dir`, one result per subject.
pub fn import_subjects(
    dir: &Path,
    subject_ids: &[u32],
    cfg: &PipelineConfig,
) -> Result<BTreeMap<u32, Result<ProcessedSignal>>> {
    let registry = SamplingRateRegistry::load(dir.join(&cfg.registry_file))?;
    let records = loader::load_subjects(dir, subject_ids, &registry, cfg)?;
    Ok(records
        .into_iter()
        .map(|(id, record)| (id, record.and_then(|r| process_record(&r, cfg))))
        .collect())
}

/// Load and process a single subject from `dir`.
///
/// Calling this twice on unchanged files yields identical results.
pub fn import_subject(dir: &Path, subject_id: u32, cfg: &PipelineConfig) -> Result<ProcessedSignal> {
    let registry = SamplingRateRegistry::load(dir.join(&cfg.registry_file))?;
    let record = loader::load_subject(dir, subject_id, &registry, cfg)?;
    process_record(&record, cfg)
}
