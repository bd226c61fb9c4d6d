//! Subject → sampling-rate registry.
//!
//! The registry is a JSON object whose keys are subject ids serialised as
//! strings (`{"1": 2000, "7": 4000}`).  It is read once per run and never
//! mutated.
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SamplingRateRegistry {
    rates: BTreeMap<String, u32>,
}

impl SamplingRateRegistry {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::io(path, "sampling-rate registry", e))?;
        Self::from_json(&text)
            .map_err(|e| Error::config(format!("{}: {e}", path.display())))
    }

    pub fn from_json(text: &str) -> std::result::Result<Self, serde_json::Error> {
        let rates = serde_json::from_str(text)?;
        Ok(Self { rates })
    }

    /// Sampling rate of `subject_id`, looked up by its string key.
    pub fn rate(&self, subject_id: u32) -> Result<u32> {
        let rate = self.rates.get(&subject_id.to_string()).copied().ok_or_else(|| {
            Error::config(format!("subject {subject_id} not in sampling-rate registry"))
        })?;
        if rate == 0 {
            return Err(Error::config(format!("subject {subject_id} has a zero sampling rate")));
        }
        Ok(rate)
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

impl FromIterator<(u32, u32)> for SamplingRateRegistry {
    fn from_iter<I: IntoIterator<Item = (u32, u32)>>(iter: I) -> Self {
        Self {
            rates: iter.into_iter().map(|(id, fs)| (id.to_string(), fs)).collect(),
        }
    }
}
