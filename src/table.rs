//! Raw transaction tables and CSV I/O.
//!
//! A [`Table`] holds cells exactly as read. The engine only parses the
//! required columns; every other column is written back untouched.

use crate::engine::ScoredBatch;
use crate::error::PreconditionError;
use anyhow::{Context, Result};
use csv::{ReaderBuilder, Writer};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

/// Columns the engine appends to the output table, in output order.
pub const DERIVED_COLUMNS: [&str; 3] = ["fraud_score", "expected_loss", "triage"];

/// Rectangular table of raw string cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Build a table, rejecting rows whose width differs from the header.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self, PreconditionError> {
        if let Some(row) = rows.iter().find(|r| r.len() != columns.len()) {
            return Err(PreconditionError::ShapeMismatch {
                context: "table row width",
                expected: columns.len(),
                actual: row.len(),
            });
        }
        Ok(Self { columns, rows })
    }

    /// Read a CSV document with a header row.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = ReaderBuilder::new().has_headers(true).from_reader(reader);

        let columns: Vec<String> = reader
            .headers()
            .context("Failed to read CSV header")?
            .iter()
            .map(str::to_string)
            .collect();

        let mut rows = Vec::new();
        for (i, record) in reader.records().enumerate() {
            let record = record.with_context(|| format!("Failed to parse CSV record {}", i))?;
            rows.push(record.iter().map(str::to_string).collect());
        }

        Ok(Self::new(columns, rows)?)
    }

    /// Read a CSV file with a header row.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(&path)
            .with_context(|| format!("Failed to open file: {:?}", path.as_ref()))?;
        Self::from_csv_reader(file)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of the first column with this name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.rows.get(row)?.get(column).map(String::as_str)
    }

    /// Input table plus `fraud_score`, `expected_loss` and `triage`.
    ///
    /// Input columns that already carry one of those names are replaced.
    pub fn decorate(&self, batch: &ScoredBatch) -> Result<Table, PreconditionError> {
        if batch.records.len() != self.rows.len() {
            return Err(PreconditionError::ShapeMismatch {
                context: "decorated table rows",
                expected: self.rows.len(),
                actual: batch.records.len(),
            });
        }

        let kept: Vec<usize> = (0..self.columns.len())
            .filter(|&i| !DERIVED_COLUMNS.contains(&self.columns[i].as_str()))
            .collect();

        let mut columns: Vec<String> = kept.iter().map(|&i| self.columns[i].clone()).collect();
        columns.extend(DERIVED_COLUMNS.iter().map(|c| c.to_string()));

        let rows = self
            .rows
            .iter()
            .zip(&batch.records)
            .map(|(row, record)| {
                let mut out: Vec<String> = kept.iter().map(|&i| row[i].clone()).collect();
                out.push(record.fraud_score.to_string());
                out.push(record.expected_loss.to_string());
                out.push(record.triage.as_str().to_string());
                out
            })
            .collect();

        Table::new(columns, rows)
    }

    /// Write the table as CSV with a header row.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut writer = Writer::from_writer(writer);
        writer.write_record(&self.columns)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Write the table to a CSV file.
    pub fn write_path<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(&path)
            .with_context(|| format!("Failed to create file: {:?}", path.as_ref()))?;
        self.write_csv(file)
    }
}
