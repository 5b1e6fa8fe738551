//! Tests for the TSV and in-memory run logs

use shared::StepRecord;
use std::time::Duration;
use tempfile::TempDir;

use crate::services::run_log::{format_elapsed, tsv_row, MemoryRunLog, TsvRunLog, TSV_HEADER};
use crate::traits::RunLogSink;

#[test]
fn test_elapsed_format_matches_log_tooling() {
    assert_eq!(format_elapsed(Duration::from_millis(12_345)), "0:00:12.345000");
    assert_eq!(format_elapsed(Duration::from_secs(3_725)), "1:02:05.000000");
}

#[test]
fn test_rows_for_executed_and_skipped_steps() {
    let done = StepRecord::completed(2, "Add 100 ul Wash Buffer 1", 0, Duration::from_secs(61));
    assert_eq!(tsv_row(&done), "2\tTrue\tAdd 100 ul Wash Buffer 1\t0\t0:01:01.000000");

    let skipped = StepRecord::skipped(3, "Incubate", 300);
    assert_eq!(tsv_row(&skipped), "3\tFalse\tIncubate\t300\t");
}

#[test]
fn test_tsv_file_written_with_header() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("logs").join("time_log.txt");

    let mut log = TsvRunLog::create(&path).unwrap();
    log.record(&StepRecord::completed(1, "Add lysis", 0, Duration::from_secs(1)))
        .unwrap();
    log.record(&StepRecord::skipped(2, "Add beads", 0)).unwrap();
    log.finish().unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], TSV_HEADER);
    assert!(lines[1].starts_with("1\tTrue\tAdd lysis"));
    assert!(lines[2].starts_with("2\tFalse\tAdd beads"));
}

#[test]
fn test_memory_log_collects_records() {
    let mut log = MemoryRunLog::new();
    log.record(&StepRecord::skipped(1, "Add beads", 0)).unwrap();
    assert!(!log.is_finished());
    log.finish().unwrap();
    assert!(log.is_finished());
    assert_eq!(log.records().len(), 1);

    let json: serde_json::Value = serde_json::from_str(&log.to_json().unwrap()).unwrap();
    assert_eq!(json[0]["description"], "Add beads");
}
