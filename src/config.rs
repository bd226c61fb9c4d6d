//! Pipeline configuration.
//!
//! [`PipelineConfig`] holds every tunable parameter of the ingestion and
//! preprocessing pipeline.  The defaults reproduce the swallow study settings:
//! 8th-order 57.5–62.5 Hz notch, 8th-order 40–500 Hz bandpass, rest window
//! 5–120 s, splice correction for subjects 3 and 5.
use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, Result};

/// How the event timestamps of a spliced recording are shifted.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum SplicePolicy {
    /// The second acquisition starts at the second transition of the
    /// validity mask; timestamps move forward by that sample index / fs.
    SecondMaskTransition,
    /// Timestamps move forward by a known constant.
    FixedOffset { seconds: f64 },
}

/// Which MAT variable holds the `[channel, time]` matrix.
///
/// Resolution order: `by_file[filename]`, then `default`, then the only
/// 2-D numeric variable in the file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct VariableSelection {
    pub by_file: BTreeMap<String, String>,
    pub default: Option<String>,
}

impl VariableSelection {
    /// Configured variable name for `filename`, if any.
    pub fn for_file(&self, filename: &str) -> Option<&str> {
        self.by_file
            .get(filename)
            .or(self.default.as_ref())
            .map(String::as_str)
    }
}

/// Notch + bandpass cascade parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Skip filtering entirely when `false`.
    ///
    /// Default: `true`.
    pub enabled: bool,

    /// Butterworth prototype order of both filters.  Band filters double it,
    /// so the default yields 8 second-order sections per filter.
    ///
    /// Default: `8`.
    pub order: usize,

    /// Stopband of the power-line notch in Hz.
    ///
    /// Default: `(57.5, 62.5)`.
    pub notch_band: (f64, f64),

    /// Passband of the EMG bandpass in Hz.
    ///
    /// Default: `(40.0, 500.0)`.
    pub emg_band: (f64, f64),
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            order: 8,
            notch_band: (57.5, 62.5),
            emg_band: (40.0, 500.0),
        }
    }
}

/// Configuration for the full ingestion pipeline.
///
/// All fields are `pub`, so struct-update syntax works:
///
/// ```
/// use emgprep::PipelineConfig;
///
/// let cfg = PipelineConfig {
///     rest_window: (10.0, 60.0),
///     ..PipelineConfig::default()
/// };
/// assert!(cfg.standardize);
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub filter: FilterConfig,

    /// Z-score against the rest window after filtering.
    ///
    /// Default: `true`.
    pub standardize: bool,

    /// Rest period `[a, b]` in seconds used as the standardization
    /// reference.  Converted to the half-open sample range
    /// `floor(a·fs) .. floor(b·fs)`.
    ///
    /// Default: `(5.0, 120.0)`: skip 5 s of settle time, use two minutes of rest.
    pub rest_window: (f64, f64),

    /// Subjects whose raw take holds two back-to-back acquisitions.
    ///
    /// Default: `{3, 5} → SecondMaskTransition`.
    pub splice: BTreeMap<u32, SplicePolicy>,

    pub variables: VariableSelection,

    /// Registry filename inside the data directory.
    ///
    /// Default: `"subject_information.txt"`.
    pub registry_file: String,

    /// Appended to the raw file stem to name its event table.
    ///
    /// Default: `"_events.csv"`.
    pub events_suffix: String,

    /// Event-table column holding event times in seconds.
    ///
    /// Default: `"Seconds"`.
    pub events_column: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let splice = [3, 5]
            .into_iter()
            .map(|id| (id, SplicePolicy::SecondMaskTransition))
            .collect();
        Self {
            filter: FilterConfig::default(),
            standardize: true,
            rest_window: (5.0, 120.0),
            splice,
            variables: VariableSelection::default(),
            registry_file: "subject_information.txt".into(),
            events_suffix: "_events.csv".into(),
            events_column: "Seconds".into(),
        }
    }
}

impl PipelineConfig {
    /// Load a JSON configuration; absent fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::io(path, "pipeline config", e))?;
        serde_json::from_str(&text)
            .map_err(|e| Error::config(format!("{}: {e}", path.display())))
    }

    /// Raw data only: no filtering, no standardization.
    pub fn raw() -> Self {
        Self {
            filter: FilterConfig {
                enabled: false,
                ..FilterConfig::default()
            },
            standardize: false,
            ..Self::default()
        }
    }

    /// Check the filter bands and rest window against a sampling rate.
    pub fn validate_for(&self, sampling_rate: u32) -> Result<()> {
        let nyquist = sampling_rate as f64 / 2.0;
        if self.filter.enabled {
            if self.filter.order == 0 {
                return Err(Error::config("filter order must be at least 1"));
            }
            for (name, (lo, hi)) in [
                ("notch", self.filter.notch_band),
                ("emg", self.filter.emg_band),
            ] {
                if !(lo > 0.0 && lo < hi && hi < nyquist) {
                    return Err(Error::config(format!(
                        "{name} band ({lo}, {hi}) Hz must satisfy 0 < low < high < \
                         Nyquist ({nyquist} Hz at {sampling_rate} Hz)"
                    )));
                }
            }
        }
        if self.standardize {
            let (a, b) = self.rest_window;
            if !(a >= 0.0 && a < b) {
                return Err(Error::config(format!(
                    "rest window [{a}, {b}] s must satisfy 0 <= a < b"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_swallow_study() {
        let cfg = PipelineConfig::default();
        assert_eq!(cfg.filter.order, 8);
        assert_eq!(cfg.filter.notch_band, (57.5, 62.5));
        assert_eq!(cfg.filter.emg_band, (40.0, 500.0));
        assert_eq!(cfg.rest_window, (5.0, 120.0));
        assert_eq!(cfg.splice.keys().copied().collect::<Vec<_>>(), vec![3, 5]);
    }

    #[test]
    fn json_overrides_merge_with_defaults() {
        let cfg: PipelineConfig = serde_json::from_str(
            r#"{
                "rest_window": [2.0, 30.0],
                "splice": { "9": { "policy": "fixed_offset", "seconds": 1.5 } },
                "variables": { "default": "data" }
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.rest_window, (2.0, 30.0));
        assert_eq!(cfg.splice.len(), 1);
        assert_eq!(cfg.splice[&9], SplicePolicy::FixedOffset { seconds: 1.5 });
        assert_eq!(cfg.variables.for_file("S1E1.mat"), Some("data"));
        assert!(cfg.filter.enabled);
        assert_eq!(cfg.events_column, "Seconds");
    }

    #[test]
    fn per_file_variable_wins_over_default() {
        let sel = VariableSelection {
            by_file: [("S2Ea.mat".to_string(), "emg".to_string())].into(),
            default: Some("data".into()),
        };
        assert_eq!(sel.for_file("S2Ea.mat"), Some("emg"));
        assert_eq!(sel.for_file("S3Eb.mat"), Some("data"));
        assert_eq!(VariableSelection::default().for_file("S3Eb.mat"), None);
    }

    #[test]
    fn emg_band_above_nyquist_is_config_error() {
        let cfg = PipelineConfig::default();
        assert!(cfg.validate_for(2000).is_ok());
        let err = cfg.validate_for(800).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Config);
    }

    #[test]
    fn raw_config_skips_band_checks() {
        assert!(PipelineConfig::raw().validate_for(100).is_ok());
    }

    #[test]
    fn inverted_rest_window_rejected() {
        let cfg = PipelineConfig {
            rest_window: (120.0, 5.0),
            ..PipelineConfig::default()
        };
        assert!(cfg.validate_for(2000).is_err());
    }
}
