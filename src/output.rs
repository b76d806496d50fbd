//! Output formatting and persistence for aggregation results.
//!
//! Supports pretty-printing, JSON serialization, and CSV append.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::stats::FinalResult;
use csv::WriterBuilder;
use std::fs::{self, OpenOptions};

/// One CSV row: a single category's statistics at the time of the run.
#[derive(Debug, Serialize)]
pub struct CategoryRow<'a> {
    pub timestamp: DateTime<Utc>,
    pub category: &'a str,
    pub count: u64,
    pub sum: u64,
    pub avg: f64,
}

/// Flattens a [`FinalResult`] into one row per category, sorted by category.
pub fn category_rows(result: &FinalResult, timestamp: DateTime<Utc>) -> Vec<CategoryRow<'_>> {
    result
        .categories()
        .filter_map(|category| {
            let summary = result.get(category)?;
            Some(CategoryRow {
                timestamp,
                category,
                count: summary.count,
                sum: summary.sum,
                avg: summary.avg,
            })
        })
        .collect()
}

/// Logs the result using Rust's debug pretty-print format.
pub fn print_pretty(result: &FinalResult) {
    info!("{:#?}", result);
}

/// Logs the result as pretty-printed JSON.
pub fn print_json(result: &FinalResult) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(result)?);
    Ok(())
}

/// Appends one row per category to a CSV file.
///
/// Writes the header first whenever the file is missing or still empty, so an
/// earlier run with no categories does not leave a headerless file behind.
pub fn append_record(path: &str, result: &FinalResult) -> Result<()> {
    let has_content = fs::metadata(path).map(|m| m.len() > 0).unwrap_or(false);
    debug!(path, has_content, "Appending CSV records");

    let file = OpenOptions::new().append(true).create(true).open(path)?;

    let mut writer = WriterBuilder::new()
        .has_headers(!has_content) // IMPORTANT when appending
        .from_writer(file);

    for row in category_rows(result, Utc::now()) {
        writer.serialize(row)?;
    }
    writer.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_result() -> FinalResult {
        let mut result = FinalResult::default();
        result.count.insert("x".to_string(), 2);
        result.sum.insert("x".to_string(), 30);
        result.avg.insert("x".to_string(), 15.0);
        result.count.insert("y".to_string(), 1);
        result.sum.insert("y".to_string(), 5);
        result.avg.insert("y".to_string(), 5.0);
        result
    }

    fn temp_csv(dir: &tempfile::TempDir) -> String {
        dir.path().join("stats.csv").to_string_lossy().to_string()
    }

    #[test]
    fn test_print_pretty_does_not_panic() {
        print_pretty(&sample_result());
    }

    #[test]
    fn test_print_json_does_not_panic() {
        print_json(&FinalResult::default()).unwrap();
    }

    #[test]
    fn test_json_shape() {
        let value = serde_json::to_value(sample_result()).unwrap();
        assert_eq!(value["count"]["x"], 2);
        assert_eq!(value["sum"]["y"], 5);
        assert_eq!(value["avg"]["x"], 15.0);
    }

    #[test]
    fn test_category_rows_sorted() {
        let result = sample_result();
        let rows = category_rows(&result, Utc::now());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].category, "x");
        assert_eq!(rows[0].count, 2);
        assert_eq!(rows[1].category, "y");
        assert_eq!(rows[1].avg, 5.0);
    }

    #[test]
    fn test_append_record_creates_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = temp_csv(&dir);

        append_record(&path, &sample_result()).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("timestamp,category,count,sum,avg"));
    }

    #[test]
    fn test_append_record_writes_header_once() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = temp_csv(&dir);

        append_record(&path, &sample_result()).unwrap();
        append_record(&path, &sample_result()).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let header_count = content.lines().filter(|l| l.contains("timestamp")).count();
        assert_eq!(header_count, 1);
        // 1 header + 2 runs of 2 categories
        assert_eq!(content.lines().count(), 5);
    }

    #[test]
    fn test_append_empty_result_writes_nothing() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = temp_csv(&dir);

        append_record(&path, &FinalResult::default()).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.is_empty());
    }

    #[test]
    fn test_header_written_after_empty_run() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = temp_csv(&dir);

        append_record(&path, &FinalResult::default()).unwrap();
        append_record(&path, &sample_result()).unwrap();
        append_record(&path, &sample_result()).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines[0], "timestamp,category,count,sum,avg");
        assert_eq!(lines.iter().filter(|l| l.starts_with("timestamp")).count(), 1);
        assert_eq!(lines.len(), 5);
    }
}
