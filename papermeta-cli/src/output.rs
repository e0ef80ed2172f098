use anyhow::Result;
use chrono::{DateTime, Utc};
use papermeta_core::{DocumentReport, ProcessedDocument};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const RECORD_SUFFIX: &str = "gen.json";
pub const ROW_SUFFIX: &str = "row.json";
pub const SUMMARY_FILE: &str = "summary.json";

/// Where the record and row of `input` land inside `output_dir`
pub fn output_paths(input: &Path, output_dir: &Path) -> (PathBuf, PathBuf) {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");

    (
        output_dir.join(format!("{stem}.{RECORD_SUFFIX}")),
        output_dir.join(format!("{stem}.{ROW_SUFFIX}")),
    )
}

/// Write `<stem>.gen.json` (record) and `<stem>.row.json` (row)
pub fn save_processed(
    processed: &ProcessedDocument,
    input: &Path,
    output_dir: &Path,
) -> Result<(PathBuf, PathBuf)> {
    fs::create_dir_all(output_dir)?;
    let (record_path, row_path) = output_paths(input, output_dir);

    fs::write(&record_path, serde_json::to_string_pretty(&processed.record)?)?;
    println!("  💾 {}", record_path.display());

    fs::write(&row_path, serde_json::to_string_pretty(&processed.row)?)?;
    println!("  💾 {} ({} columns)", row_path.display(), processed.row.len());

    Ok((record_path, row_path))
}

/// Outcome of one input in a batch
#[derive(Debug, Serialize)]
pub struct InputOutcome {
    pub input: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<DocumentReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl InputOutcome {
    /// Outcome of a document that processed. When `output_dir` is set its
    /// files are written there; a write failure is recorded on this outcome
    /// only, the report is kept.
    pub fn processed(input: &str, processed: ProcessedDocument, output_dir: Option<&Path>) -> Self {
        let error = output_dir.and_then(|output_dir| {
            save_processed(&processed, Path::new(input), output_dir)
                .err()
                .map(|e| {
                    eprintln!("❌ Saving outputs failed for {input}: {e:#}");
                    format!("failed to save outputs: {e:#}")
                })
        });

        Self {
            input: input.to_string(),
            report: Some(processed.report),
            error,
        }
    }

    pub fn failed(input: &str, error: impl std::fmt::Display) -> Self {
        Self {
            input: input.to_string(),
            report: None,
            error: Some(error.to_string()),
        }
    }
}

/// Quick reference for a whole run, written next to the outputs
#[derive(Debug, Serialize)]
pub struct BatchSummary {
    pub captured_at: DateTime<Utc>,
    pub processed: usize,
    pub failed: usize,
    pub inputs: Vec<InputOutcome>,
}

impl BatchSummary {
    pub fn new(inputs: Vec<InputOutcome>) -> Self {
        let failed = inputs.iter().filter(|outcome| outcome.error.is_some()).count();
        Self {
            captured_at: Utc::now(),
            processed: inputs.len() - failed,
            failed,
            inputs,
        }
    }

    pub fn save(&self, output_dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(output_dir)?;
        let path = output_dir.join(SUMMARY_FILE);
        fs::write(&path, serde_json::to_string_pretty(self)?)?;
        println!("  💾 {}", path.display());
        Ok(path)
    }
}

/// Human-readable view of one processed document
pub fn print_document(processed: &ProcessedDocument, print_row: bool) {
    println!("📊 Extracted fields:");
    for (field, value) in &processed.record {
        let rendered = serde_json::to_string(value).unwrap_or_else(|_| format!("{value:?}"));
        println!("   - {field}: {rendered}");
    }

    for stage in processed.report.failures() {
        println!("   ⚠️  stage '{}' failed: {:?}", stage.stage, stage.status);
    }

    if print_row {
        println!("📋 Row:");
        for (column, cell) in &processed.row {
            println!("   {column:.<30} {cell}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use papermeta_core::{DocumentProcessor, ExtractionConfig};

    #[test]
    fn test_output_paths_use_input_stem() {
        let (record, row) = output_paths(Path::new("/in/paper.html"), Path::new("/out"));
        assert_eq!(record, PathBuf::from("/out/paper.gen.json"));
        assert_eq!(row, PathBuf::from("/out/paper.row.json"));
    }

    #[test]
    fn test_save_processed_writes_both_files() {
        let processor = DocumentProcessor::new(ExtractionConfig::default()).unwrap();
        let processed = processor
            .process_markup("memo.pdf", "<html><body><span>memo</span></body></html>")
            .unwrap();

        let output_dir = std::env::temp_dir().join("papermeta_cli_output_test");
        let (record_path, row_path) =
            save_processed(&processed, Path::new("memo.html"), &output_dir).unwrap();

        let record: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&record_path).unwrap()).unwrap();
        assert_eq!(record, serde_json::json!({ "document": "memo.pdf" }));
        assert!(row_path.exists());

        // Clean up
        fs::remove_dir_all(output_dir).ok();
    }

    #[test]
    fn test_save_failure_is_recorded_on_its_outcome() {
        let processor = DocumentProcessor::new(ExtractionConfig::default()).unwrap();
        let markup = "<html><body><span>memo</span></body></html>";

        // A regular file where the output directory should be
        let blocked = std::env::temp_dir().join("papermeta_cli_blocked_output");
        fs::write(&blocked, "not a directory").unwrap();

        let outcomes: Vec<InputOutcome> = ["a.html", "b.html"]
            .iter()
            .map(|input| {
                let processed = processor.process_markup(input, markup).unwrap();
                InputOutcome::processed(input, processed, Some(&blocked))
            })
            .collect();

        assert_eq!(outcomes.len(), 2);
        for outcome in &outcomes {
            assert!(outcome.report.is_some());
            assert!(outcome
                .error
                .as_deref()
                .unwrap()
                .starts_with("failed to save outputs"));
        }

        let summary = BatchSummary::new(outcomes);
        assert_eq!(summary.failed, 2);

        // Clean up
        fs::remove_file(blocked).ok();
    }

    #[test]
    fn test_processed_without_output_dir_has_no_error() {
        let processor = DocumentProcessor::new(ExtractionConfig::default()).unwrap();
        let processed = processor
            .process_markup("memo.pdf", "<html><body><span>memo</span></body></html>")
            .unwrap();

        let outcome = InputOutcome::processed("memo.html", processed, None);
        assert!(outcome.error.is_none());
        assert_eq!(outcome.report.unwrap().document, "memo.pdf");
    }

    #[test]
    fn test_summary_counts_failures() {
        let summary = BatchSummary::new(vec![
            InputOutcome {
                input: "a.html".to_string(),
                report: Some(DocumentReport::new("a.pdf")),
                error: None,
            },
            InputOutcome {
                input: "b.html".to_string(),
                report: None,
                error: Some("unknown font-size unit: 1em".to_string()),
            },
        ]);
        assert_eq!(summary.processed, 1);
        assert_eq!(summary.failed, 1);
    }
}
