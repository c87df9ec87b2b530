//! Plain text storage of density grids.
//!
//! One line per temperature, one column per pressure. Values are written in
//! scientific notation with 18 decimals, a signed exponent and at least two
//! exponent digits (e.g. `1.234500000000000000e+02`), separated by single
//! spaces. The format is compatible with `numpy.loadtxt`.
use crate::errors::{MapError, MapResult};
use ndarray::Array2;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Format a single value.
pub fn format_value(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_owned();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_owned();
    }
    let formatted = format!("{value:.18e}");
    match formatted.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            format!("{mantissa}e{sign}{digits:0>2}")
        }
        None => formatted,
    }
}

/// Write a grid to any writer.
pub fn write_grid_to<W: Write>(writer: &mut W, grid: &Array2<f64>) -> MapResult<()> {
    for row in grid.rows() {
        let line = row
            .iter()
            .map(|&v| format_value(v))
            .collect::<Vec<_>>()
            .join(" ");
        writeln!(writer, "{line}")?;
    }
    Ok(())
}

/// Write a grid to a text file.
pub fn write_grid<P: AsRef<Path>>(path: P, grid: &Array2<f64>) -> MapResult<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_grid_to(&mut writer, grid)?;
    writer.flush()?;
    Ok(())
}

/// Read a grid from any buffered reader.
pub fn read_grid_from<R: BufRead>(reader: R) -> MapResult<Array2<f64>> {
    let mut values = Vec::new();
    let mut columns = None;
    let mut rows = 0;
    for (number, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let row = line
            .split_whitespace()
            .map(|v| {
                v.parse::<f64>().map_err(|_| {
                    MapError::MalformedGrid(format!("invalid value '{v}' in line {}", number + 1))
                })
            })
            .collect::<MapResult<Vec<_>>>()?;
        match columns {
            None => columns = Some(row.len()),
            Some(n) if n != row.len() => {
                return Err(MapError::MalformedGrid(format!(
                    "line {} has {} values instead of {n}",
                    number + 1,
                    row.len()
                )))
            }
            _ => (),
        }
        values.extend(row);
        rows += 1;
    }
    Array2::from_shape_vec((rows, columns.unwrap_or(0)), values)
        .map_err(|e| MapError::MalformedGrid(e.to_string()))
}

/// Read a grid from a text file.
pub fn read_grid<P: AsRef<Path>>(path: P) -> MapResult<Array2<f64>> {
    read_grid_from(BufReader::new(File::open(path)?))
}
