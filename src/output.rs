//! Field normalization and result serialization
//!
//! Normalization is position-specific by design: rules are attached to the
//! column indices of the concrete schema the engine was configured with
//! (a digits-only rating column, dual-purpose "Director:"/"Stars:" columns),
//! and run once over the accumulated result before serialization.

use std::fs;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::error::ScrapeError;

/// Header plus all collected records, in traversal order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScrapeResult {
    header: Vec<String>,
    records: Vec<Vec<String>>,
}

impl ScrapeResult {
    pub fn new(header: Vec<String>, records: Vec<Vec<String>>) -> Self {
        Self { header, records }
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn records(&self) -> &[Vec<String>] {
        &self.records
    }

    /// Header and records as one row sequence, header first.
    fn rows(&self) -> impl Iterator<Item = &Vec<String>> {
        std::iter::once(&self.header).chain(self.records.iter())
    }

    /// JSON array-of-arrays, header row first. Deterministic for a given
    /// result: serializing twice yields byte-identical output.
    pub fn to_json(&self) -> Result<String, ScrapeError> {
        let rows: Vec<&Vec<String>> = self.rows().collect();
        Ok(serde_json::to_string(&rows)?)
    }

    /// CSV with RFC-4180-style quoting, header row first.
    pub fn to_csv(&self) -> String {
        let mut out = String::new();
        for row in self.rows() {
            write_csv_row(&mut out, row);
        }
        out
    }

    /// Write the table to `path`, with the format selected by extension:
    /// `.csv` or `.json`. Any other extension is a configuration error.
    ///
    /// Returns the JSON serialization regardless of the format written, so
    /// the in-memory representation is always available to the caller.
    pub fn write_to(&self, path: &Path) -> Result<String, ScrapeError> {
        let json = self.to_json()?;
        match OutputFormat::from_path(path)? {
            OutputFormat::Csv => fs::write(path, self.to_csv())?,
            OutputFormat::Json => fs::write(path, &json)?,
        }
        info!(path = %path.display(), records = self.records.len(), "data saved");
        Ok(json)
    }
}

/// Output file format, selected by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Csv,
    Json,
}

impl OutputFormat {
    pub fn from_path(path: &Path) -> Result<Self, ScrapeError> {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => Ok(Self::Csv),
            Some(ext) if ext.eq_ignore_ascii_case("json") => Ok(Self::Json),
            _ => Err(ScrapeError::UnsupportedOutputFormat(
                path.display().to_string(),
            )),
        }
    }
}

fn needs_quotes(field: &str) -> bool {
    field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r')
}

fn write_csv_row(out: &mut String, row: &[String]) {
    let mut first = true;
    for cell in row {
        if !first {
            out.push(',');
        } else {
            first = false;
        }
        if needs_quotes(cell) {
            out.push('"');
            out.push_str(&cell.replace('"', "\"\""));
            out.push('"');
        } else {
            out.push_str(cell);
        }
    }
    out.push('\n');
}

/// Post-processing rule for one column position.
#[derive(Debug, Clone)]
pub enum FieldRule {
    /// Keep only the digits before any '/' separator, so a rating out of a
    /// maximum loses its denominator ("7.4 / 10" becomes "74") while plain
    /// values keep all their digits ("(2014)" becomes "2014").
    DigitsOnly,
    /// Dual-purpose column carrying either "{keep}: value | tail" or the
    /// other label's text. Keeps the first delimited value after the `keep`
    /// label; blanks the field when the `reject` label appears instead;
    /// passes unlabeled text through.
    LabeledValue { keep: String, reject: String },
}

impl FieldRule {
    fn apply(&self, raw: &str) -> String {
        match self {
            FieldRule::DigitsOnly => raw
                .split('/')
                .next()
                .unwrap_or(raw)
                .chars()
                .filter(|c| c.is_ascii_digit())
                .collect(),
            FieldRule::LabeledValue { keep, reject } => {
                let keep_tag = format!("{keep}: ");
                if let Some(rest) = raw.split(keep_tag.as_str()).nth(1) {
                    rest.split(" | ").next().unwrap_or("").to_string()
                } else if raw.contains(&format!("{reject}:")) {
                    String::new()
                } else {
                    raw.to_string()
                }
            }
        }
    }
}

/// Column-position-specific normalizer applied once over a finished result.
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    rules: Vec<(usize, FieldRule)>,
}

impl Normalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a rule to a 0-based column index. Rules run in attach order.
    pub fn rule(mut self, column: usize, rule: FieldRule) -> Self {
        self.rules.push((column, rule));
        self
    }

    /// Drop placeholder records (entirely empty fields) and rewrite the
    /// configured columns in place. The header row is never touched.
    pub fn apply(&self, result: &mut ScrapeResult) {
        result
            .records
            .retain(|record| record.iter().any(|field| !field.is_empty()));

        for record in &mut result.records {
            for (column, rule) in &self.rules {
                if let Some(field) = record.get_mut(*column) {
                    *field = rule.apply(field);
                }
            }
        }
    }
}
