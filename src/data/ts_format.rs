// ============================================================
// Layer 4 - .ts File Parser
// ============================================================
// Parses the sktime / UEA ".ts" text format used by the Monash
// regression archive.
//
// A file looks like:
//
//   # comment
//   @problemName AppliancesEnergy
//   @timeStamps false
//   @missing false
//   @univariate false
//   @dimensions 24
//   @equalLength true
//   @seriesLength 144
//   @targetLabel true
//   @data
//   19.89,19.89,...:47.6,46.7,...:...:12.97
//
// Each data row holds one sample: channels separated by ':',
// values separated by ',', and the regression target last.
// '?' marks a missing value and is read as NaN.
//
// Unsupported: timestamped values and unequal-length series.

use std::{fs, path::Path};

use crate::domain::ts_array::TsArray;
use crate::error::{Result, TsError};

/// One parsed .ts file.
#[derive(Debug, Clone)]
pub struct TsFile {
    pub problem_name: Option<String>,
    pub x:            TsArray,
    pub y:            Vec<f32>,
}

#[derive(Debug, Default)]
struct Header {
    problem_name: Option<String>,
    dimensions:   Option<usize>,
    series_len:   Option<usize>,
    target_label: bool,
}

pub fn read_ts_file(path: &Path) -> Result<TsFile> {
    let text = fs::read_to_string(path)?;
    parse_ts(&text).map_err(|e| match e {
        TsError::DatasetFormat(msg) => {
            TsError::DatasetFormat(format!("{}: {msg}", path.display()))
        }
        other => other,
    })
}

pub fn parse_ts(text: &str) -> Result<TsFile> {
    let mut header  = Header::default();
    let mut in_data = false;

    let mut values: Vec<f32>      = Vec::new();
    let mut y: Vec<f32>           = Vec::new();
    let mut shape: Option<(usize, usize)> = None;

    for (line_no, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if !in_data {
            if !line.starts_with('@') {
                return Err(fmt_err(line_no, "expected a header tag or @data"));
            }
            in_data = parse_header_line(line, line_no, &mut header)?;
            continue;
        }

        let (row, target) = parse_data_row(line, line_no)?;
        let n_vars  = row.len();
        let seq_len = row[0].len();

        if row.iter().any(|c| c.len() != seq_len) {
            return Err(fmt_err(line_no, "channels of unequal length are not supported"));
        }
        match shape {
            None => shape = Some((n_vars, seq_len)),
            Some((v, _)) if v != n_vars => {
                return Err(fmt_err(line_no, &format!("expected {v} channels, found {n_vars}")));
            }
            Some((_, l)) if l != seq_len => {
                return Err(fmt_err(line_no, &format!("expected series length {l}, found {seq_len}")));
            }
            Some(_) => {}
        }

        for channel in row {
            values.extend(channel);
        }
        y.push(target);
    }

    if !in_data {
        return Err(TsError::DatasetFormat("missing @data section".into()));
    }
    if !header.target_label {
        return Err(TsError::DatasetFormat(
            "file has no regression target (@targetLabel true)".into(),
        ));
    }
    let (n_vars, seq_len) = shape
        .ok_or_else(|| TsError::DatasetFormat("no data rows after @data".into()))?;

    if let Some(d) = header.dimensions {
        if d != n_vars {
            return Err(TsError::DatasetFormat(format!(
                "@dimensions says {d} but rows have {n_vars} channels"
            )));
        }
    }
    if let Some(l) = header.series_len {
        if l != seq_len {
            tracing::warn!("@seriesLength says {} but rows have {} steps", l, seq_len);
        }
    }

    let x = TsArray::new(values, y.len(), n_vars, seq_len)?;
    Ok(TsFile { problem_name: header.problem_name, x, y })
}

/// Returns true when the line is `@data`.
fn parse_header_line(line: &str, line_no: usize, header: &mut Header) -> Result<bool> {
    let mut parts = line.splitn(2, char::is_whitespace);
    let tag   = parts.next().unwrap_or_default().to_ascii_lowercase();
    let value = parts.next().map(str::trim).unwrap_or_default();

    match tag.as_str() {
        "@data" => return Ok(true),
        "@problemname" => header.problem_name = Some(value.to_string()),
        "@timestamps" => {
            if parse_bool(value, line_no)? {
                return Err(fmt_err(line_no, "timestamped series are not supported"));
            }
        }
        "@equallength" => {
            if !parse_bool(value, line_no)? {
                return Err(fmt_err(line_no, "unequal-length series are not supported"));
            }
        }
        "@dimensions"   => header.dimensions = Some(parse_usize(value, line_no)?),
        "@serieslength" => header.series_len = Some(parse_usize(value, line_no)?),
        "@targetlabel"  => header.target_label = parse_bool(value, line_no)?,
        "@classlabel" => {
            if value.to_ascii_lowercase().starts_with("true") {
                return Err(fmt_err(line_no, "classification files are not regression data"));
            }
        }
        // @missing, @univariate and unknown tags carry nothing we need
        _ => {}
    }
    Ok(false)
}

fn parse_data_row(line: &str, line_no: usize) -> Result<(Vec<Vec<f32>>, f32)> {
    let mut fields: Vec<&str> = line.split(':').collect();
    if fields.len() < 2 {
        return Err(fmt_err(line_no, "row needs at least one channel and a target"));
    }
    let target_field = fields.pop().unwrap_or_default().trim();
    let target = target_field
        .parse::<f32>()
        .map_err(|_| fmt_err(line_no, &format!("bad target value '{target_field}'")))?;

    let mut channels = Vec::with_capacity(fields.len());
    for field in fields {
        let mut channel = Vec::new();
        for tok in field.split(',') {
            let tok = tok.trim();
            let v = if tok == "?" {
                f32::NAN
            } else {
                tok.parse::<f32>()
                    .map_err(|_| fmt_err(line_no, &format!("bad value '{tok}'")))?
            };
            channel.push(v);
        }
        channels.push(channel);
    }
    Ok((channels, target))
}

fn parse_bool(value: &str, line_no: usize) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true"  => Ok(true),
        "false" => Ok(false),
        other   => Err(fmt_err(line_no, &format!("expected true/false, got '{other}'"))),
    }
}

fn parse_usize(value: &str, line_no: usize) -> Result<usize> {
    value
        .parse()
        .map_err(|_| fmt_err(line_no, &format!("expected an integer, got '{value}'")))
}

fn fmt_err(line_no: usize, msg: &str) -> TsError {
    TsError::DatasetFormat(format!("line {}: {msg}", line_no + 1))
}
