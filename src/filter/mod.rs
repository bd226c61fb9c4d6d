//! IIR filter design and zero-phase application.
//!
//! - [`design`]: Butterworth bandpass / bandstop as second-order sections,
//!   matching `scipy.signal.butter(N, Wn, btype, output='sos', fs=fs)`.
//! - [`apply`]: forward-backward SOS filtering, matching
//!   `scipy.signal.sosfiltfilt`.
//!
//! [`emg_filter`] chains the two filters of the EMG pipeline: power-line
//! notch first, then the EMG bandpass.

pub mod apply;
pub mod design;

pub use apply::{apply_sos_zero_phase, pad_len, sosfilt, sosfilt_zi, sosfiltfilt};
pub use design::{butter_band, sos_frequency_response, BandType, Section};

use ndarray::Array2;
use tracing::debug;

use crate::config::FilterConfig;
use crate::error::Result;

/// Notch then bandpass, both zero-phase.  Returns a new `[C, T]` array.
pub fn emg_filter(data: &Array2<f64>, sfreq: f64, cfg: &FilterConfig) -> Result<Array2<f64>> {
    let notch = butter_band(cfg.order, cfg.notch_band, sfreq, BandType::Bandstop)?;
    let emg = butter_band(cfg.order, cfg.emg_band, sfreq, BandType::Bandpass)?;
    debug!(
        sfreq,
        notch_sections = notch.len(),
        emg_sections = emg.len(),
        "designed EMG filters"
    );

    let notched = apply_sos_zero_phase(data, &notch)?;
    apply_sos_zero_phase(&notched, &emg)
}
