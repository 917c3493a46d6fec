//! Report serialization: JSON, CSV, and a human-readable summary.
//!
//! All token counts are integers; a JSON document parsed back into
//! [`DirectoryCountResult`] reproduces the totals and per-file counts.

use std::fmt;
use std::io::{self, Write};
use std::path::Path;
use std::str::FromStr;

use num_format::{Locale, ToFormattedString};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tempfile::NamedTempFile;

use crate::error::{CountError, Result};
use crate::report::{DirectoryCountResult, FileCountResult, FileOutcome};

/// Column names of the CSV export, in order.
pub const CSV_HEADER: [&str; 3] = ["path", "tokens", "error"];

/// Directory reports with more files than this get no per-file table in
/// the summary.
pub const SUMMARY_DETAIL_LIMIT: usize = 20;

/// Anything the formatter can serialize.
#[derive(Debug, Clone, Copy)]
pub enum Report<'a> {
    /// A single file.
    File(&'a FileCountResult),
    /// A directory scan.
    Directory(&'a DirectoryCountResult),
}

impl<'a> From<&'a FileCountResult> for Report<'a> {
    fn from(result: &'a FileCountResult) -> Self {
        Report::File(result)
    }
}

impl<'a> From<&'a DirectoryCountResult> for Report<'a> {
    fn from(result: &'a DirectoryCountResult) -> Self {
        Report::Directory(result)
    }
}

/// Persisted report format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Pretty-printed JSON document
    #[default]
    Json,
    /// CSV with a `path,tokens,error` header
    Csv,
}

impl OutputFormat {
    /// Pick a format from the output path: `.csv` is CSV, everything else
    /// (including no extension) is JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => OutputFormat::Csv,
            _ => OutputFormat::Json,
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Json => f.write_str("json"),
            OutputFormat::Csv => f.write_str("csv"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = CountError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            other => Err(CountError::Config(format!(
                "Unknown output format: {other}. Use: json, csv"
            ))),
        }
    }
}

/// One CSV row: `path`, `tokens`, `error`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvRecord {
    /// File path
    pub path: String,
    /// Token count, empty when the file failed
    pub tokens: String,
    /// Failure reason, empty when the file was counted
    pub error: String,
}

impl CsvRecord {
    fn header() -> Self {
        Self {
            path: CSV_HEADER[0].to_string(),
            tokens: CSV_HEADER[1].to_string(),
            error: CSV_HEADER[2].to_string(),
        }
    }

    fn from_result(result: &FileCountResult) -> Self {
        let (tokens, error) = match &result.outcome {
            FileOutcome::Counted(stats) => (stats.tokens.to_string(), String::new()),
            FileOutcome::Failed { error } => (String::new(), error.clone()),
        };
        Self {
            path: result.path.display().to_string(),
            tokens,
            error,
        }
    }

    /// Fields in column order
    pub fn fields(&self) -> [&str; 3] {
        [&self.path, &self.tokens, &self.error]
    }
}

/// Structured JSON document for a report.
pub fn to_json<'a>(report: impl Into<Report<'a>>) -> Result<Value> {
    let value = match report.into() {
        Report::File(result) => serde_json::to_value(result)?,
        Report::Directory(result) => serde_json::to_value(result)?,
    };
    Ok(value)
}

/// CSV records for a directory report, header first.
///
/// The header is present even when there are no files.
pub fn to_csv(result: &DirectoryCountResult) -> Vec<CsvRecord> {
    std::iter::once(CsvRecord::header())
        .chain(result.files.iter().map(CsvRecord::from_result))
        .collect()
}

/// Render CSV records as text with RFC 4180 quoting.
pub fn to_csv_string(result: &DirectoryCountResult) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for record in to_csv(result) {
        writer.write_record(record.fields())?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| CountError::Io(e.into_error()))?;
    utf8_text(bytes)
}

fn utf8_text(bytes: Vec<u8>) -> Result<String> {
    String::from_utf8(bytes)
        .map_err(|e| CountError::Io(io::Error::new(io::ErrorKind::InvalidData, e)))
}

/// Human-readable summary. Always includes the total token count.
pub fn to_summary<'a>(report: impl Into<Report<'a>>) -> String {
    match report.into() {
        Report::File(result) => file_summary(result),
        Report::Directory(result) => directory_summary(result),
    }
}

fn file_summary(result: &FileCountResult) -> String {
    let mut out = String::new();
    out.push_str(&format!("Token Count ({})\n", result.model));
    match &result.outcome {
        FileOutcome::Counted(stats) => {
            out.push_str(&format!(
                "{:<48} {:>12} {:>12}\n",
                "File", "Tokens", "Characters"
            ));
            out.push_str(&format!("{}\n", "-".repeat(74)));
            out.push_str(&format!(
                "{:<48} {:>12} {:>12}\n",
                result.path.display(),
                stats.tokens.to_formatted_string(&Locale::en),
                stats.characters.to_formatted_string(&Locale::en)
            ));
            if let (Some(rows), Some(columns)) = (stats.rows, stats.columns) {
                out.push_str(&format!("Rows: {rows}\nColumns: {columns}\n"));
            } else if let Some(entries) = stats.entries {
                out.push_str(&format!("Entries: {entries}\n"));
            }
            out.push_str(&format!(
                "Total tokens: {}\n",
                stats.tokens.to_formatted_string(&Locale::en)
            ));
        },
        FileOutcome::Failed { error } => {
            out.push_str(&format!("{}: ERROR {}\n", result.path.display(), error));
            out.push_str("Total tokens: 0\n");
        },
    }
    out
}

fn directory_summary(result: &DirectoryCountResult) -> String {
    let model = result
        .files
        .first()
        .map(|f| f.model.as_str())
        .unwrap_or("-");

    let mut out = String::new();
    out.push_str(&format!("Token Count Summary ({model})\n"));
    out.push_str(&format!(
        "{:>12} {:>12} {:>12} {:>16}\n",
        "Total Files", "Succeeded", "Failed", "Total Tokens"
    ));
    out.push_str(&format!("{}\n", "-".repeat(55)));
    out.push_str(&format!(
        "{:>12} {:>12} {:>12} {:>16}\n",
        result.len(),
        result.succeeded,
        result.failed,
        result.total_tokens.to_formatted_string(&Locale::en)
    ));

    if !result.is_empty() && result.len() <= SUMMARY_DETAIL_LIMIT {
        out.push('\n');
        out.push_str(&format!("{:<48} {:>12} {:>12}\n", "File", "Tokens", "Characters"));
        out.push_str(&format!("{}\n", "-".repeat(74)));
        for file in &result.files {
            match &file.outcome {
                FileOutcome::Counted(stats) => out.push_str(&format!(
                    "{:<48} {:>12} {:>12}\n",
                    file.path.display(),
                    stats.tokens.to_formatted_string(&Locale::en),
                    stats.characters.to_formatted_string(&Locale::en)
                )),
                FileOutcome::Failed { error } => out.push_str(&format!(
                    "{:<48} {:>12} {}\n",
                    file.path.display(),
                    "ERROR",
                    error
                )),
            }
        }
    }

    if result.failed > 0 {
        out.push_str(&format!(
            "\nWarning: {} of {} files could not be counted\n",
            result.failed,
            result.len()
        ));
    }
    out
}

/// Render a report in `format`.
///
/// A single-file report exported as CSV becomes a one-row table.
pub fn render<'a>(report: impl Into<Report<'a>>, format: OutputFormat) -> Result<String> {
    let report = report.into();
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&to_json(report)?)?),
        OutputFormat::Csv => match report {
            Report::Directory(result) => to_csv_string(result),
            Report::File(result) => to_csv_string(&crate::report::aggregate(vec![result.clone()])),
        },
    }
}

/// Persist a report to `path`, replacing any existing file atomically.
///
/// The format is `format` if given, otherwise inferred from the extension.
pub fn write_report<'a>(
    report: impl Into<Report<'a>>,
    path: &Path,
    format: Option<OutputFormat>,
) -> Result<OutputFormat> {
    let format = format.unwrap_or_else(|| OutputFormat::from_path(path));
    let mut content = render(report, format)?;
    if !content.ends_with('\n') {
        content.push('\n');
    }

    let write_err = |source: std::io::Error| CountError::OutputWrite {
        path: path.to_path_buf(),
        source,
    };
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir).map_err(write_err)?;
    tmp.write_all(content.as_bytes()).map_err(write_err)?;
    tmp.flush().map_err(write_err)?;
    tmp.as_file_mut().sync_all().map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;

    tracing::info!(path = %path.display(), format = %format, "Report written");
    Ok(format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{aggregate, FileStats};

    fn sample() -> DirectoryCountResult {
        aggregate(vec![
            FileCountResult::counted("docs/a.md", "gpt-4", FileStats::new(7, 31)),
            FileCountResult::failed("docs/b.txt", "gpt-4", "Invalid UTF-8, bad byte"),
        ])
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(OutputFormat::from_path(Path::new("out.csv")), OutputFormat::Csv);
        assert_eq!(OutputFormat::from_path(Path::new("out.CSV")), OutputFormat::Csv);
        assert_eq!(OutputFormat::from_path(Path::new("out.json")), OutputFormat::Json);
        assert_eq!(OutputFormat::from_path(Path::new("out")), OutputFormat::Json);
        assert_eq!(OutputFormat::from_path(Path::new("out.txt")), OutputFormat::Json);
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!("CSV".parse::<OutputFormat>().unwrap(), OutputFormat::Csv);
        assert!("xml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_json_directory_shape() {
        let value = to_json(&sample()).unwrap();
        assert_eq!(value["total_tokens"], 7);
        assert_eq!(value["succeeded"], 1);
        assert_eq!(value["failed"], 1);
        assert_eq!(value["files"][0]["path"], "docs/a.md");
        assert_eq!(value["files"][0]["tokens"], 7);
        assert_eq!(value["files"][0]["model"], "gpt-4");
        assert!(value["files"][0].get("error").is_none());
        assert!(value["files"][1].get("tokens").is_none());
        assert_eq!(value["files"][1]["error"], "Invalid UTF-8, bad byte");
    }

    #[test]
    fn test_json_file_shape() {
        let result = FileCountResult::counted("a.txt", "gpt-4o", FileStats::new(3, 12));
        let value = to_json(&result).unwrap();
        assert_eq!(value["path"], "a.txt");
        assert_eq!(value["tokens"], 3);
        assert_eq!(value["model"], "gpt-4o");
    }

    #[test]
    fn test_csv_records() {
        let records = to_csv(&sample());
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].fields(), CSV_HEADER);
        assert_eq!(records[1].fields(), ["docs/a.md", "7", ""]);
        assert_eq!(records[2].fields(), ["docs/b.txt", "", "Invalid UTF-8, bad byte"]);
    }

    #[test]
    fn test_csv_header_for_empty_result() {
        let records = to_csv(&DirectoryCountResult::default());
        assert_eq!(records.len(), 1);
        assert_eq!(to_csv_string(&DirectoryCountResult::default()).unwrap(), "path,tokens,error\n");
    }

    #[test]
    fn test_invalid_utf8_buffer_is_io_error() {
        let err = utf8_text(vec![b'a', 0xff]).unwrap_err();
        match err {
            CountError::Io(e) => assert_eq!(e.kind(), io::ErrorKind::InvalidData),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(utf8_text(b"path".to_vec()).unwrap(), "path");
    }

    #[test]
    fn test_csv_string_quotes_fields() {
        let text = to_csv_string(&sample()).unwrap();
        assert_eq!(
            text,
            "path,tokens,error\ndocs/a.md,7,\ndocs/b.txt,,\"Invalid UTF-8, bad byte\"\n"
        );
    }

    #[test]
    fn test_summary_has_total() {
        let mut files = Vec::new();
        for i in 0..25 {
            files.push(FileCountResult::counted(
                format!("f{i}.txt"),
                "gpt-4",
                FileStats::new(100, 400),
            ));
        }
        let summary = to_summary(&aggregate(files));
        assert!(summary.contains("2,500"));
        assert!(!summary.contains("f0.txt"), "detail table is skipped for large scans");

        let summary = to_summary(&sample());
        assert!(summary.contains("docs/a.md"));
        assert!(summary.contains("ERROR"));
        assert!(summary.contains("1 of 2 files could not be counted"));
    }

    #[test]
    fn test_file_summary() {
        let mut stats = FileStats::new(1234, 5000);
        stats.entries = Some(3);
        let result = FileCountResult::counted("data.json", "gpt-4", stats);
        let summary = to_summary(&result);
        assert!(summary.contains("Total tokens: 1,234"));
        assert!(summary.contains("Entries: 3"));
    }

    #[test]
    fn test_render_single_file_csv() {
        let result = FileCountResult::counted("a.txt", "gpt-4", FileStats::new(3, 12));
        assert_eq!(render(&result, OutputFormat::Csv).unwrap(), "path,tokens,error\na.txt,3,\n");
    }

    #[test]
    fn test_write_report_replaces_existing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.csv");
        std::fs::write(&path, "stale").unwrap();

        let format = write_report(&sample(), &path, None).unwrap();
        assert_eq!(format, OutputFormat::Csv);
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("path,tokens,error\n"));
    }

    #[test]
    fn test_write_report_explicit_format_wins() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.csv");
        write_report(&sample(), &path, Some(OutputFormat::Json)).unwrap();
        let parsed: DirectoryCountResult =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed, sample());
    }

    #[test]
    fn test_write_report_to_missing_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing/report.json");
        let err = write_report(&sample(), &path, None).unwrap_err();
        assert!(matches!(err, CountError::OutputWrite { .. }));
    }
}
