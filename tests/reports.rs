//! Report export tests: counted directories written to disk and read back.

use std::fs;

use counttokens::counter::{DirectoryScan, TokenCounter};
use counttokens::output::{self, OutputFormat, CSV_HEADER};
use counttokens::report::{aggregate, DirectoryCountResult, FileCountResult, FileStats};
use counttokens::tokenizer::{DefaultTokenizerProvider, TokenizerCache};
use counttokens::CountError;

fn sample() -> DirectoryCountResult {
    aggregate(vec![
        FileCountResult::counted("notes/a.txt", "gpt-4", FileStats::new(7, 30)),
        FileCountResult::failed("notes/b.txt", "gpt-4", "Permission denied"),
    ])
}

#[test]
fn test_json_file_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.json");
    let report = sample();

    let format = output::write_report(&report, &path, None).unwrap();
    assert_eq!(format, OutputFormat::Json);

    let text = fs::read_to_string(&path).unwrap();
    let parsed: DirectoryCountResult = serde_json::from_str(&text).unwrap();
    assert_eq!(parsed, report);
    assert_eq!(parsed.total_tokens, 7);
    assert_eq!(parsed.files[1].error(), Some("Permission denied"));
}

#[test]
fn test_csv_file_layout() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.csv");

    let format = output::write_report(&sample(), &path, None).unwrap();
    assert_eq!(format, OutputFormat::Csv);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_path(&path)
        .unwrap();
    let rows: Vec<Vec<String>> = reader
        .records()
        .map(|r| r.unwrap().iter().map(str::to_string).collect())
        .collect();

    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0], CSV_HEADER);
    assert_eq!(rows[1], ["notes/a.txt", "7", ""]);
    assert_eq!(rows[2], ["notes/b.txt", "", "Permission denied"]);
}

#[test]
fn test_explicit_format_overrides_extension() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.json");

    output::write_report(&sample(), &path, Some(OutputFormat::Csv)).unwrap();
    let text = fs::read_to_string(&path).unwrap();
    assert!(text.starts_with("path,tokens,error"));
}

#[test]
fn test_overwrite_replaces_content() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.json");
    fs::write(&path, "stale content that is much longer than the new report ".repeat(50)).unwrap();

    output::write_report(&DirectoryCountResult::default(), &path, None).unwrap();
    let parsed: DirectoryCountResult =
        serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert!(parsed.is_empty());
}

#[test]
fn test_unwritable_destination() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("report.json");

    let err = output::write_report(&sample(), &path, None).unwrap_err();
    assert!(matches!(err, CountError::OutputWrite { .. }));
    assert!(!path.exists());
}

/// Count a real directory, export it, and check the export agrees with the summary
#[test]
fn test_counted_directory_export() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("corpus");
    fs::create_dir_all(&root).unwrap();
    fs::write(root.join("a.txt"), "This is a test.").unwrap();
    fs::write(root.join("b.md"), "This is a test. This is a test.").unwrap();
    fs::write(root.join("c.txt"), [0xc3u8, 0x28]).unwrap();

    let cache = TokenizerCache::new(DefaultTokenizerProvider::default());
    let counter = TokenCounter::new(&cache);
    let report = counter
        .count_directory(&root, &DirectoryScan::default(), "gpt-3.5-turbo")
        .unwrap();

    let summary = output::to_summary(&report);
    assert!(summary.contains("15"));
    assert!(summary.contains("Warning: 1 of 3 files could not be counted"));

    let json = output::to_json(&report).unwrap();
    assert_eq!(json["total_tokens"], 15);
    assert_eq!(json["succeeded"], 2);
    assert_eq!(json["failed"], 1);
    assert_eq!(json["files"][0]["tokens"], 5);
    assert!(json["files"][2]["error"].is_string());

    let out = dir.path().join("tokens.csv");
    output::write_report(&report, &out, None).unwrap();
    let text = fs::read_to_string(&out).unwrap();
    assert_eq!(text.lines().count(), 4);
}

/// A single file exported as CSV is a one-row table
#[test]
fn test_single_file_csv() {
    let result = FileCountResult::counted("one.txt", "gpt-4o", FileStats::new(3, 12));
    let text = output::render(&result, OutputFormat::Csv).unwrap();
    assert_eq!(text, "path,tokens,error\none.txt,3,\n");
}

/// A file name that is not UTF-8 still exports, with the bad bytes replaced
#[cfg(unix)]
#[test]
fn test_non_utf8_file_name_exports_to_json() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("corpus");
    fs::create_dir_all(&root).unwrap();
    fs::write(root.join("ok.txt"), "This is a test.").unwrap();
    fs::write(root.join(OsStr::from_bytes(b"bad\xff.txt")), "This is a test.").unwrap();

    let cache = TokenizerCache::new(DefaultTokenizerProvider::default());
    let counter = TokenCounter::new(&cache);
    let report = counter
        .count_directory(&root, &DirectoryScan::default(), "gpt-3.5-turbo")
        .unwrap();
    assert_eq!(report.succeeded, 2);
    assert_eq!(report.total_tokens, 10);

    let json = output::to_json(&report).unwrap();
    assert_eq!(json["total_tokens"], 10);
    let bad_path = json["files"][0]["path"].as_str().unwrap();
    assert!(bad_path.ends_with("bad\u{fffd}.txt"), "{bad_path}");

    let out = dir.path().join("tokens.json");
    output::write_report(&report, &out, None).unwrap();
    let parsed: DirectoryCountResult =
        serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(parsed.total_tokens, 10);
    assert_eq!(parsed.len(), 2);
}
