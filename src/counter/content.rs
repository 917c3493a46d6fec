//! Reading a file and turning its content into token statistics.

use std::fs;
use std::io;
use std::path::Path;

use serde::Serialize;
use serde_json::ser::Formatter;

use crate::error::{CountError, FileReadError};
use crate::report::FileStats;
use crate::tokenizer::Tokenizer;

/// How a file's content is interpreted before counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    /// Whole text is counted as-is.
    Plain,
    /// Parsed and re-serialized on one line; source layout does not count.
    Json,
    /// Header skipped, every data cell counted separately.
    Csv,
}

impl ContentKind {
    /// Pick the content kind from the file extension.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("json") => ContentKind::Json,
            Some("csv") => ContentKind::Csv,
            _ => ContentKind::Plain,
        }
    }
}

/// Read `path` as UTF-8 and count it with `tokenizer`.
pub(crate) fn count_path(
    tokenizer: &dyn Tokenizer,
    path: &Path,
) -> Result<FileStats, FileReadError> {
    let bytes = fs::read(path).map_err(|e| FileReadError::from_io(path, e))?;
    let text = String::from_utf8(bytes).map_err(|e| FileReadError::InvalidUtf8 {
        path: path.to_path_buf(),
        reason: e.utf8_error().to_string(),
    })?;

    match ContentKind::from_path(path) {
        ContentKind::Plain => count_plain(tokenizer, &text),
        ContentKind::Json => count_json(tokenizer, &text),
        ContentKind::Csv => count_csv(tokenizer, &text),
    }
}

fn tokens(tokenizer: &dyn Tokenizer, text: &str) -> Result<usize, FileReadError> {
    tokenizer.count(text).map_err(|e| match e {
        CountError::Tokenizer(msg) => FileReadError::Tokenize(msg),
        other => FileReadError::Tokenize(other.to_string()),
    })
}

fn count_plain(tokenizer: &dyn Tokenizer, text: &str) -> Result<FileStats, FileReadError> {
    Ok(FileStats::new(tokens(tokenizer, text)?, text.chars().count()))
}

fn count_json(tokenizer: &dyn Tokenizer, text: &str) -> Result<FileStats, FileReadError> {
    let value: serde_json::Value = serde_json::from_str(text)?;
    let dumped = dump_json(&value)?;
    let entries = match &value {
        serde_json::Value::Array(items) => items.len(),
        _ => 1,
    };

    let mut stats = FileStats::new(tokens(tokenizer, &dumped)?, dumped.chars().count());
    stats.entries = Some(entries);
    Ok(stats)
}

/// Single-line JSON with `", "` and `": "` separators and every non-ASCII
/// or non-printable character written as a `\uXXXX` escape.
fn dump_json(value: &serde_json::Value) -> Result<String, FileReadError> {
    let mut out = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, SpacedAsciiFormatter);
    value.serialize(&mut serializer)?;
    // Only ASCII is ever written.
    Ok(String::from_utf8_lossy(&out).into_owned())
}

struct SpacedAsciiFormatter;

impl Formatter for SpacedAsciiFormatter {
    fn begin_array_value<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W, first: bool,
    ) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W, first: bool,
    ) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        writer.write_all(b": ")
    }

    fn write_string_fragment<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        fragment: &str,
    ) -> io::Result<()> {
        let mut units = [0u16; 2];
        for c in fragment.chars() {
            if (' '..='~').contains(&c) {
                writer.write_all(&[c as u8])?;
            } else {
                for unit in c.encode_utf16(&mut units).iter() {
                    write!(writer, "\\u{unit:04x}")?;
                }
            }
        }
        Ok(())
    }
}

fn count_csv(tokenizer: &dyn Tokenizer, text: &str) -> Result<FileStats, FileReadError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(text.as_bytes());
    let columns = reader.headers()?.len();

    let mut total = 0;
    let mut rows = 0;
    for record in reader.records() {
        let record = record?;
        for cell in record.iter().filter(|c| !c.is_empty()) {
            total += tokens(tokenizer, cell)?;
        }
        rows += 1;
    }

    let mut stats = FileStats::new(total, text.chars().count());
    stats.rows = Some(rows);
    stats.columns = Some(columns);
    Ok(stats)
}
