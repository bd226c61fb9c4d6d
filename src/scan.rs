//! Raw data directory scanning.
//!
//! Recording files are MAT containers named `S<subject>E<label>.mat`, e.g.
//! `S7E1.mat` or `S03Eswallow.mat`.  The subject id is the integer between the
//! first `S` and the first `E`; the experiment label is everything between
//! that `E` and the extension.
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

pub const RECORDING_EXT: &str = ".mat";

/// Identifiers parsed from a recording filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedName {
    pub subject_id: u32,
    pub experiment_label: String,
}

/// A recording file selected for loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFile {
    pub path: PathBuf,
    pub filename: String,
    pub subject_id: u32,
    pub experiment_label: String,
}

/// `true` for names ending in the recording extension.
pub fn is_recording(filename: &str) -> bool {
    filename.ends_with(RECORDING_EXT)
}

/// Parse `S<id>E<label>.mat`.
pub fn parse_filename(filename: &str) -> Result<ParsedName> {
    let marker = |m: &str| {
        filename
            .find(m)
            .ok_or_else(|| Error::format(filename, format!("missing '{m}' marker")))
    };
    let a = marker("S")?;
    let b = marker("E")?;
    let c = marker(RECORDING_EXT)?;
    if !(a < b && b < c) {
        return Err(Error::format(
            filename,
            "markers out of order, expected S<id>E<label>.mat",
        ));
    }

    let id_text = &filename[a + 1..b];
    let subject_id = id_text.parse::<u32>().map_err(|e| {
        Error::format(filename, format!("subject id {id_text:?} is not an integer: {e}"))
    })?;
    Ok(ParsedName {
        subject_id,
        experiment_label: filename[b + 1..c].to_string(),
    })
}

/// List the recording files in `dir` whose subject id is in `requested`.
///
/// Entries are returned sorted by filename.  Any recording file whose name
/// does not parse aborts the scan with a format error.
pub fn scan(dir: &Path, requested: &BTreeSet<u32>) -> Result<Vec<RawFile>> {
    let entries = std::fs::read_dir(dir).map_err(|e| Error::io(dir, "raw data directory", e))?;

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| Error::io(dir, "raw data directory", e))?;
        if let Some(name) = entry.file_name().to_str() {
            if is_recording(name) {
                names.push(name.to_string());
            }
        }
    }
    names.sort();

    let mut out = Vec::new();
    for filename in names {
        let parsed = parse_filename(&filename)?;
        if !requested.contains(&parsed.subject_id) {
            continue;
        }
        out.push(RawFile {
            path: dir.join(&filename),
            filename,
            subject_id: parsed.subject_id,
            experiment_label: parsed.experiment_label,
        });
    }
    Ok(out)
}
