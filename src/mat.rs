//! MAT level-5 recording reader.
//!
//! A raw recording file holds one `[channel, time]` numeric matrix, but the
//! variable name differs between acquisitions.  The variable is chosen
//! explicitly (see [`crate::config::VariableSelection`]); with no
//! configuration the file must contain exactly one 2-D numeric variable.
//!
//! MATLAB stores matrices column-major; the returned array is row-major
//! `[channel, time]` `f64`, whatever the stored numeric class.
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use matfile::{MatFile, NumericData};
use ndarray::{Array2, ShapeBuilder};

use crate::error::{Error, Result};

/// Read the recording matrix of `path`.
///
/// `variable` names the MAT variable to use; `None` selects the single 2-D
/// variable in the file.
pub fn read_recording(path: &Path, variable: Option<&str>) -> Result<Array2<f64>> {
    let source = path.display().to_string();
    let file = File::open(path).map_err(|e| Error::io(path, "raw recording", e))?;
    let mat = MatFile::parse(BufReader::new(file))
        .map_err(|e| Error::format(&source, format!("not a MAT level-5 file: {e:?}")))?;

    let array = select_variable(&mat, variable, &source)?;
    let size = array.size();
    if size.len() != 2 {
        return Err(Error::format(
            &source,
            format!("variable '{}' has shape {size:?}, expected [channel, time]", array.name()),
        ));
    }
    to_row_major(array.data(), size[0], size[1], &source)
}

fn select_variable<'a>(
    mat: &'a MatFile,
    variable: Option<&str>,
    source: &str,
) -> Result<&'a matfile::Array> {
    let names = || {
        mat.arrays()
            .iter()
            .map(|a| a.name().to_string())
            .collect::<Vec<_>>()
    };

    if let Some(name) = variable {
        return mat.find_by_name(name).ok_or_else(|| {
            Error::format(source, format!("variable '{name}' not found; file has {:?}", names()))
        });
    }

    let mut candidates = mat.arrays().iter().filter(|a| a.size().len() == 2);
    match (candidates.next(), candidates.next()) {
        (Some(only), None) => Ok(only),
        (None, _) => Err(Error::format(source, "no 2-D numeric variable in file")),
        (Some(_), Some(_)) => Err(Error::format(
            source,
            format!(
                "several candidate variables {:?}; configure which one holds the recording",
                names()
            ),
        )),
    }
}

fn to_row_major(data: &NumericData, rows: usize, cols: usize, source: &str) -> Result<Array2<f64>> {
    let flat = widen(data);
    if flat.len() != rows * cols {
        return Err(Error::format(
            source,
            format!("expected {} elements for {rows}×{cols}, found {}", rows * cols, flat.len()),
        ));
    }
    let column_major = Array2::from_shape_vec((rows, cols).f(), flat)
        .map_err(|e| Error::format(source, e.to_string()))?;
    Ok(column_major.as_standard_layout().into_owned())
}

/// Real part of any numeric class as `f64`.
fn widen(data: &NumericData) -> Vec<f64> {
    fn cast<T: Copy + Into<f64>>(v: &[T]) -> Vec<f64> {
        v.iter().map(|&x| x.into()).collect()
    }
    match data {
        NumericData::Double { real, .. } => real.clone(),
        NumericData::Single { real, .. } => cast(real),
        NumericData::Int8 { real, .. } => cast(real),
        NumericData::Int16 { real, .. } => cast(real),
        NumericData::Int32 { real, .. } => cast(real),
        NumericData::UInt8 { real, .. } => cast(real),
        NumericData::UInt16 { real, .. } => cast(real),
        NumericData::UInt32 { real, .. } => cast(real),
        NumericData::Int64 { real, .. } => real.iter().map(|&x| x as f64).collect(),
        NumericData::UInt64 { real, .. } => real.iter().map(|&x| x as f64).collect(),
    }
}
