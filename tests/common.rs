/// Shared fixture builders: MAT level-5 files, event tables, registries.
use ndarray::Array2;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const MI_INT8: u32 = 1;
const MI_INT32: u32 = 5;
const MI_UINT32: u32 = 6;
const MI_DOUBLE: u32 = 9;
const MI_MATRIX: u32 = 14;
const MX_DOUBLE_CLASS: u32 = 6;

fn pad8(buf: &mut Vec<u8>) {
    while buf.len() % 8 != 0 {
        buf.push(0);
    }
}

fn element(ty: u32, payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&ty.to_le_bytes());
    out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    out.extend_from_slice(payload);
    pad8(&mut out);
    out
}

/// One uncompressed double matrix: `dims` + column-major `data`.
fn matrix(name: &str, dims: &[usize], data: &[f64]) -> Vec<u8> {
    let mut flags = Vec::new();
    flags.extend_from_slice(&MX_DOUBLE_CLASS.to_le_bytes());
    flags.extend_from_slice(&0u32.to_le_bytes());

    let dim_bytes: Vec<u8> = dims.iter().flat_map(|&d| (d as i32).to_le_bytes()).collect();
    let real: Vec<u8> = data.iter().flat_map(|v| v.to_le_bytes()).collect();

    let mut body = element(MI_UINT32, &flags);
    body.extend(element(MI_INT32, &dim_bytes));
    body.extend(element(MI_INT8, name.as_bytes()));
    body.extend(element(MI_DOUBLE, &real));
    element(MI_MATRIX, &body)
}

#[allow(unused)]
/// Write a MAT level-5 file holding the given `(name, dims, column-major data)` variables.
pub fn write_mat(path: &Path, vars: &[(&str, Vec<usize>, Vec<f64>)]) {
    let mut header = b"MATLAB 5.0 MAT-file, Platform: test, Created by: emgprep tests".to_vec();
    header.resize(116, b' ');
    header.extend_from_slice(&[0u8; 8]);
    header.extend_from_slice(&0x0100u16.to_le_bytes());
    header.extend_from_slice(b"IM");

    let mut bytes = header;
    for (name, dims, data) in vars {
        bytes.extend(matrix(name, dims, data));
    }
    std::fs::write(path, bytes).unwrap();
}

#[allow(unused)]
/// Column-major payload of a `[C, T]` array, ready for [`write_mat`].
pub fn mat_var<'a>(name: &'a str, x: &Array2<f64>) -> (&'a str, Vec<usize>, Vec<f64>) {
    (name, vec![x.nrows(), x.ncols()], x.t().iter().copied().collect())
}

/// A temporary data directory.
pub struct Fixture {
    pub dir: TempDir,
}

#[allow(unused)]
impl Fixture {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn registry(&self, rates: &[(u32, u32)]) -> &Self {
        let body: Vec<String> = rates.iter().map(|(id, fs)| format!("\"{id}\": {fs}")).collect();
        std::fs::write(
            self.path().join("subject_information.txt"),
            format!("{{{}}}", body.join(", ")),
        )
        .unwrap();
        self
    }

    /// `S<id>E<label>.mat` with a single `emg_data` variable.
    pub fn recording(&self, filename: &str, x: &Array2<f64>) -> PathBuf {
        let path = self.path().join(filename);
        write_mat(&path, &[mat_var("emg_data", x)]);
        path
    }

    /// `<stem>_events.csv` with an index column and a `Seconds` column.
    pub fn events(&self, stem: &str, seconds: &[f64]) -> PathBuf {
        let path = self.path().join(format!("{stem}_events.csv"));
        let mut text = String::from("Click,Seconds\n");
        for (i, t) in seconds.iter().enumerate() {
            text.push_str(&format!("{},{t}\n", i + 1));
        }
        std::fs::write(&path, text).unwrap();
        path
    }
}

#[allow(unused)]
/// `[n_ch, n_t]` broadband test signal with no all-zero samples.
pub fn noise_like(n_ch: usize, n_t: usize, fs: f64) -> Array2<f64> {
    Array2::from_shape_fn((n_ch, n_t), |(c, t)| {
        let t = t as f64 / fs;
        let c = c as f64;
        (2.0 * std::f64::consts::PI * (80.0 + 13.0 * c) * t).sin()
            + 0.5 * (2.0 * std::f64::consts::PI * (211.0 + 7.0 * c) * t + c).sin()
            + 0.25 * (2.0 * std::f64::consts::PI * 60.0 * t).sin()
            + 0.1 * ((t * 977.0 + c).sin() * 43_758.545_3).fract()
            + 1.5
    })
}
