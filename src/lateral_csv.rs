use crate::errors::{MalformedInputError, OutputError};
use crate::lateral::{Lateral, NodeTimeSeries};
use crate::NodeId;
use csv::{ReaderBuilder, WriterBuilder};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;
use tracing::debug;

/// One row of the lateral table: sequence number, connection node, encoded series.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct LateralRow {
    pub row_id: usize,
    pub node_id: NodeId,
    pub series: String,
}

/// Shortest plain decimal that parses back to the same value, always with a
/// fractional part (`0.0`, `1.5`, `0.00005`).
fn format_flow(flow: f64) -> String {
    let text = flow.to_string();
    if flow.is_finite() && !text.contains('.') {
        format!("{}.0", text)
    } else {
        text
    }
}

/// Encodes `(offset, flow)` pairs as `offset,flow` lines without a trailing newline.
pub fn encode_series(series: &NodeTimeSeries) -> String {
    series
        .series
        .iter()
        .map(|(offset, flow)| format!("{},{}", offset, format_flow(*flow)))
        .collect::<Vec<String>>()
        .join("\n")
}

pub fn decode_series(encoded: &str) -> Result<Vec<(u64, f64)>, MalformedInputError> {
    let mut series = Vec::new();
    for (i, line) in encoded.split('\n').enumerate() {
        let line_number = i as u64 + 1;
        let (offset, flow) = line.split_once(',').ok_or_else(|| {
            MalformedInputError::row(line_number, format!("'{}' is not an offset,flow pair", line))
        })?;
        let offset = offset.trim().parse::<u64>().map_err(|_| {
            MalformedInputError::row(line_number, format!("offset '{}' is not an integer", offset))
        })?;
        let flow = flow.trim().parse::<f64>().map_err(|_| {
            MalformedInputError::row(line_number, format!("flow '{}' is not a number", flow))
        })?;
        series.push((offset, flow));
    }
    Ok(series)
}

pub fn to_rows(series: &[NodeTimeSeries]) -> Vec<LateralRow> {
    series
        .iter()
        .enumerate()
        .map(|(row_id, node_series)| LateralRow {
            row_id,
            node_id: node_series.node_id,
            series: encode_series(node_series),
        })
        .collect()
}

fn lateral_writer<W: Write>(
    writer: W,
    series: &[NodeTimeSeries],
) -> Result<csv::Writer<W>, csv::Error> {
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(writer);
    for row in to_rows(series) {
        writer.serialize(row)?;
    }
    Ok(writer)
}

/// Writes the lateral table as headerless CSV.
pub fn write_laterals<W: Write>(writer: W, series: &[NodeTimeSeries]) -> Result<(), OutputError> {
    let mut writer = lateral_writer(writer, series)?;
    writer.flush().map_err(csv::Error::from)?;
    Ok(())
}

pub fn write_laterals_to_file(path: &Path, series: &[NodeTimeSeries]) -> Result<(), OutputError> {
    debug!("writing {} laterals to {}", series.len(), path.display());
    let file = File::create(path).map_err(|source| OutputError::io(path, source))?;
    let writer = lateral_writer(BufWriter::new(file), series)?;
    let mut file_writer = writer
        .into_inner()
        .map_err(|error| OutputError::io(path, error.into_error()))?;
    file_writer
        .flush()
        .map_err(|source| OutputError::io(path, source))
}

/// Writes the laterals as a JSON array of lateral documents.
pub fn write_laterals_json<W: Write>(
    writer: W,
    series: &[NodeTimeSeries],
) -> Result<(), OutputError> {
    let laterals: Vec<Lateral> = series.iter().map(Lateral::from).collect();
    serde_json::to_writer_pretty(writer, &laterals)?;
    Ok(())
}

pub fn write_laterals_json_to_file(
    path: &Path,
    series: &[NodeTimeSeries],
) -> Result<(), OutputError> {
    debug!("writing {} lateral documents to {}", series.len(), path.display());
    let file = File::create(path).map_err(|source| OutputError::io(path, source))?;
    let mut writer = BufWriter::new(file);
    write_laterals_json(&mut writer, series)?;
    writer.flush().map_err(|source| OutputError::io(path, source))
}

pub fn read_laterals<R: Read>(reader: R) -> Result<Vec<LateralRow>, MalformedInputError> {
    let mut reader = ReaderBuilder::new().has_headers(false).from_reader(reader);
    let mut rows = Vec::new();
    for row in reader.deserialize() {
        rows.push(row?);
    }
    Ok(rows)
}
