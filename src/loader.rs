//! Per-subject loading: raw matrix, validity mask, event times, splice fix.
//!
//! ```text
//! S<id>E<label>.mat ──read_recording──▶ [C, T_raw]
//!                                        │ validity mask (any channel ≠ 0)
//!                                        ▼
//!                                       [C, T]          + S<id>E<label>_events.csv
//!                                                         │ splice correction
//!                                                         ▼
//!                                                       event times (s)
//! ```
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use ndarray::{Array1, Array2, Axis};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::config::{PipelineConfig, SplicePolicy};
use crate::error::{Error, Result};
use crate::events::read_event_times;
use crate::mat::read_recording;
use crate::registry::SamplingRateRegistry;
use crate::scan::{scan, RawFile};

/// One subject's recording as loaded from disk.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSubjectRecord {
    pub subject_id: u32,
    pub experiment_label: String,
    /// `[channel, time]`, shorted samples removed.
    pub recording: Array2<f64>,
    pub sampling_rate: u32,
    /// Start/end event times in seconds, splice-corrected.
    pub event_timestamps: Array1<f64>,
}

/// `true` at every sample where at least one channel is nonzero.
pub fn validity_mask(recording: &Array2<f64>) -> Vec<bool> {
    recording
        .axis_iter(Axis(1))
        .map(|col| col.iter().any(|&v| v != 0.0))
        .collect()
}

/// Keep only the time samples where `mask` is set, in their original order.
///
/// The result is in standard (row-major) layout.
pub fn apply_mask(recording: &Array2<f64>, mask: &[bool]) -> Array2<f64> {
    let keep: Vec<usize> = mask
        .iter()
        .enumerate()
        .filter_map(|(t, &valid)| valid.then_some(t))
        .collect();
    // `select` along the last axis yields a column-major copy.
    recording
        .select(Axis(1), &keep)
        .as_standard_layout()
        .into_owned()
}

/// Indices `t` where `mask[t] != mask[t + 1]`.
pub fn mask_transitions(mask: &[bool]) -> Vec<usize> {
    mask.windows(2)
        .enumerate()
        .filter_map(|(t, w)| (w[0] != w[1]).then_some(t))
        .collect()
}

/// Seconds by which the event times of a spliced recording are shifted.
///
/// For [`SplicePolicy::SecondMaskTransition`] the second acquisition starts
/// at the second mask transition.  Recordings with more than two transitions
/// still use the second one.
pub fn splice_offset(policy: &SplicePolicy, mask: &[bool], sampling_rate: u32) -> Result<f64> {
    match policy {
        SplicePolicy::FixedOffset { seconds } => Ok(*seconds),
        SplicePolicy::SecondMaskTransition => {
            let transitions = mask_transitions(mask);
            let boundary = transitions.get(1).copied().ok_or_else(|| {
                Error::format(
                    "validity mask",
                    format!(
                        "splice correction needs two mask transitions, found {}",
                        transitions.len()
                    ),
                )
            })?;
            if transitions.len() > 2 {
                warn!(
                    n_transitions = transitions.len(),
                    boundary, "more than two mask transitions, using the second as splice point"
                );
            }
            Ok(boundary as f64 / sampling_rate as f64)
        }
    }
}

/// Load one matched raw file into a [`RawSubjectRecord`].
pub fn load_file(
    file: &RawFile,
    registry: &SamplingRateRegistry,
    cfg: &PipelineConfig,
) -> Result<RawSubjectRecord> {
    let sampling_rate = registry.rate(file.subject_id)?;

    let raw = read_recording(&file.path, cfg.variables.for_file(&file.filename))?;
    let mask = validity_mask(&raw);
    let recording = apply_mask(&raw, &mask);
    debug!(
        subject = file.subject_id,
        channels = raw.nrows(),
        raw_samples = raw.ncols(),
        kept_samples = recording.ncols(),
        "applied validity mask"
    );

    let stem = file
        .filename
        .strip_suffix(crate::scan::RECORDING_EXT)
        .unwrap_or(&file.filename);
    let events_path = file
        .path
        .with_file_name(format!("{stem}{}", cfg.events_suffix));
    let mut event_timestamps = read_event_times(&events_path, &cfg.events_column)?;

    if let Some(policy) = cfg.splice.get(&file.subject_id) {
        let offset = splice_offset(policy, &mask, sampling_rate)?;
        debug!(subject = file.subject_id, offset_s = offset, "splice correction");
        event_timestamps += offset;
    }

    Ok(RawSubjectRecord {
        subject_id: file.subject_id,
        experiment_label: file.experiment_label.clone(),
        recording,
        sampling_rate,
        event_timestamps,
    })
}

/// Load every requested subject from `dir`.
///
/// The map has one entry per requested id.  A subject's failure is recorded
/// in its own entry and never affects the others; an id with no matching file
/// maps to a missing-resource error.  Scan failures (unreadable directory,
/// unparsable recording filename) abort the whole call.
pub fn load_subjects(
    dir: &Path,
    subject_ids: &[u32],
    registry: &SamplingRateRegistry,
    cfg: &PipelineConfig,
) -> Result<BTreeMap<u32, Result<RawSubjectRecord>>> {
    let requested: BTreeSet<u32> = subject_ids.iter().copied().collect();
    let files = scan(dir, &requested)?;

    let mut by_subject: BTreeMap<u32, &RawFile> = BTreeMap::new();
    for file in &files {
        if let Some(first) = by_subject.get(&file.subject_id) {
            warn!(
                subject = file.subject_id,
                using = %first.filename,
                ignored = %file.filename,
                "several recordings for one subject"
            );
            continue;
        }
        by_subject.insert(file.subject_id, file);
    }

    let loaded: Vec<(u32, Result<RawSubjectRecord>)> = requested
        .par_iter()
        .map(|&id| {
            let result = match by_subject.get(&id) {
                Some(file) => load_file(file, registry, cfg),
                None => Err(Error::missing(
                    dir.join(format!("S{id}E*.mat")),
                    "raw recording",
                )),
            };
            (id, result)
        })
        .collect();

    for (id, result) in &loaded {
        if let Err(err) = result {
            warn!(subject = id, error = %err, "subject failed to load");
        }
    }
    let imported: Vec<u32> = loaded
        .iter()
        .filter(|(_, r)| r.is_ok())
        .map(|(id, _)| *id)
        .collect();
    info!(?imported, "subjects imported");

    Ok(loaded.into_iter().collect())
}

/// Load a single subject, flattening the map of [`load_subjects`].
pub fn load_subject(
    dir: &Path,
    subject_id: u32,
    registry: &SamplingRateRegistry,
    cfg: &PipelineConfig,
) -> Result<RawSubjectRecord> {
    load_subjects(dir, &[subject_id], registry, cfg)?
        .remove(&subject_id)
        .unwrap_or_else(|| Err(Error::missing(dir, "raw recording")))
}
