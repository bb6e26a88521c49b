//! CSV export of harvested records.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::error::{HarvestError, Result};
use crate::models::Record;

/// Prefix of every exported file name.
pub const FILENAME_PREFIX: &str = "linkedin_sales_nav_leads_";

/// A finished export, ready to be emitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub filename: String,
    pub mime_type: &'static str,
    pub content: String,
}

/// Destination for finished artifacts.
pub trait ArtifactSink: Send + Sync {
    /// Emit the artifact and return a human-readable location.
    fn emit(&self, artifact: &Artifact) -> anyhow::Result<String>;
}

impl<T: ArtifactSink + ?Sized> ArtifactSink for Arc<T> {
    fn emit(&self, artifact: &Artifact) -> anyhow::Result<String> {
        (**self).emit(artifact)
    }
}

/// Writes artifacts into a directory.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl ArtifactSink for DirectorySink {
    fn emit(&self, artifact: &Artifact) -> anyhow::Result<String> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create {}", self.dir.display()))?;
        let path = self.dir.join(&artifact.filename);
        fs::write(&path, &artifact.content)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!("CSV exported: {}", path.display());
        Ok(path.display().to_string())
    }
}

/// Union of all record keys, in first-seen order.
pub fn collect_headers(records: &[Record]) -> Vec<String> {
    let mut headers: Vec<String> = Vec::new();
    for record in records {
        for key in record.keys() {
            if !headers.iter().any(|h| h == key) {
                headers.push(key.to_string());
            }
        }
    }
    headers
}

/// Render records as CSV: header row, then one row per record.
///
/// Cells are quoted only when they contain a comma, quote or line break.
pub fn to_csv(records: &[Record]) -> Result<String> {
    let headers = collect_headers(records);
    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Necessary)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    let csv_err = |e: csv::Error| HarvestError::Export(e.to_string());

    writer.write_record(&headers).map_err(csv_err)?;
    for record in records {
        writer
            .write_record(headers.iter().map(|h| record.value(h)))
            .map_err(csv_err)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| HarvestError::Export(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| HarvestError::Export(e.to_string()))
}

/// `linkedin_sales_nav_leads_<YYYY-MM-DDTHH-MM-SS>.csv`
pub fn export_filename(at: DateTime<Utc>) -> String {
    format!("{}{}.csv", FILENAME_PREFIX, at.format("%Y-%m-%dT%H-%M-%S"))
}

/// Build the export artifact. `None` when there is nothing to export.
pub fn export(records: &[Record]) -> Result<Option<Artifact>> {
    export_at(records, Utc::now())
}

pub fn export_at(records: &[Record], at: DateTime<Utc>) -> Result<Option<Artifact>> {
    if records.is_empty() {
        warn!("No leads to export");
        return Ok(None);
    }
    Ok(Some(Artifact {
        filename: export_filename(at),
        mime_type: "text/csv;charset=utf-8",
        content: to_csv(records)?,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn parse(content: &str) -> (Vec<String>, Vec<Vec<String>>) {
        let mut reader = csv::Reader::from_reader(content.as_bytes());
        let headers = reader
            .headers()
            .unwrap()
            .iter()
            .map(str::to_string)
            .collect();
        let rows = reader
            .records()
            .map(|r| r.unwrap().iter().map(str::to_string).collect())
            .collect();
        (headers, rows)
    }

    #[test]
    fn test_special_characters_roundtrip() {
        let tricky = "Smith, \"Doc\"\nJr.";
        let records = vec![Record::new().with("Full Name", tricky).with("Title", "CEO")];

        let content = to_csv(&records).unwrap();
        assert!(content.contains("\"Smith, \"\"Doc\"\"\nJr.\""));

        let (headers, rows) = parse(&content);
        assert_eq!(headers, vec!["Full Name", "Title"]);
        assert_eq!(rows, vec![vec![tricky.to_string(), "CEO".to_string()]]);
    }

    #[test]
    fn test_plain_cells_are_not_quoted() {
        let records = vec![Record::new().with("A", "plain").with("B", "")];
        assert_eq!(to_csv(&records).unwrap(), "A,B\nplain,\n");
    }

    #[test]
    fn test_heterogeneous_headers_in_first_seen_order() {
        let records = vec![
            Record::new().with("Name", "a").with("Title", "t"),
            Record::new().with("Location", "l").with("Name", "b"),
            Record::new().with("Title", "t3").with("Email", "e"),
        ];
        let (headers, rows) = parse(&to_csv(&records).unwrap());
        assert_eq!(headers, vec!["Name", "Title", "Location", "Email"]);
        assert_eq!(rows[1], vec!["b", "", "l", ""]);
        assert_eq!(rows[2], vec!["", "t3", "", "e"]);
    }

    #[test]
    fn test_empty_export_is_none() {
        assert!(export(&[]).unwrap().is_none());
    }

    #[test]
    fn test_filename_is_sortable_timestamp() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        assert_eq!(
            export_filename(at),
            "linkedin_sales_nav_leads_2024-03-09T07-05-01.csv"
        );
    }

    #[test]
    fn test_directory_sink_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = export(&[Record::new().with("Name", "x")]).unwrap().unwrap();

        let location = DirectorySink::new(dir.path()).emit(&artifact).unwrap();
        let written = std::fs::read_to_string(&location).unwrap();
        assert_eq!(written, "Name\nx\n");
        assert!(location.ends_with(&artifact.filename));
    }
}
