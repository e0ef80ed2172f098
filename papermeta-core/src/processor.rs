use crate::config::ExtractionConfig;
use crate::error::{DocumentError, DocumentResult};
use crate::flatten::RecordBuilder;
use crate::preprocessors::{HtmlPreprocessor, Preprocessor};
use crate::rules::{DebugConfig, RuleEngine};
use crate::tree::StyledTree;
use crate::types::*;
use anyhow::Result;
use std::path::Path;
use std::time::{Duration, Instant};

/// Simple profiler that collects timings for pipeline steps
pub struct StepProfiler {
    enabled: bool,
    timings: Vec<(String, Duration)>,
}

impl StepProfiler {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            timings: Vec::new(),
        }
    }

    pub fn time_step<F, R>(&mut self, step_name: &str, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        if !self.enabled {
            return f();
        }

        let start = Instant::now();
        let result = f();
        let elapsed = start.elapsed();

        self.timings.push((step_name.to_string(), elapsed));
        println!("⏱️  {}: {:.3}ms", step_name, elapsed.as_secs_f64() * 1000.0);

        result
    }

    pub fn timings(&self) -> &[(String, Duration)] {
        &self.timings
    }

    pub fn print_summary(&self) {
        if !self.enabled || self.timings.is_empty() {
            return;
        }

        println!("\n📊 Performance Summary:");
        let total: Duration = self.timings.iter().map(|(_, d)| *d).sum();

        for (step, duration) in &self.timings {
            let percentage = if total.is_zero() {
                0.0
            } else {
                (duration.as_secs_f64() / total.as_secs_f64()) * 100.0
            };
            println!(
                "   {:.<35} {:.3}ms ({:.1}%)",
                step,
                duration.as_secs_f64() * 1000.0,
                percentage
            );
        }
        println!("   {:.<35} {:.3}ms", "Total", total.as_secs_f64() * 1000.0);
    }
}

/// Identifier stored in a record's `document` field: the converter input was
/// the PDF of the same stem.
pub fn document_id(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();

    if stem.to_ascii_lowercase().ends_with(".pdf") {
        stem
    } else {
        format!("{stem}.pdf")
    }
}

pub struct DocumentProcessor {
    preprocessor: Box<dyn Preprocessor>,
    rule_engine: RuleEngine,
    config: ExtractionConfig,
}

impl DocumentProcessor {
    /// Create DocumentProcessor with full dependency injection
    pub fn new_with_dependencies(
        preprocessor: Box<dyn Preprocessor>,
        config: ExtractionConfig,
    ) -> Result<Self> {
        Ok(Self {
            preprocessor,
            rule_engine: RuleEngine::new(&config)?,
            config,
        })
    }

    /// Processor over converter HTML
    pub fn new(config: ExtractionConfig) -> Result<Self> {
        Self::new_with_dependencies(Box::new(HtmlPreprocessor::new()), config)
    }

    pub fn set_debug_config(&mut self, debug_config: DebugConfig) {
        self.rule_engine.set_debug_config(debug_config);
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    pub fn rule_engine(&self) -> &RuleEngine {
        &self.rule_engine
    }

    /// Process one converter output file
    pub fn process_file(&self, input_path: &Path) -> DocumentResult<ProcessedDocument> {
        self.process_file_with_profiler(input_path, &mut StepProfiler::new(false))
    }

    /// Process one converter output file, timing each step
    pub fn process_file_with_profiling(
        &self,
        input_path: &Path,
        enable_profiling: bool,
    ) -> DocumentResult<ProcessedDocument> {
        let start_time = Instant::now();
        let mut profiler = StepProfiler::new(enable_profiling);

        let processed = self.process_file_with_profiler(input_path, &mut profiler)?;

        profiler.print_summary();
        if enable_profiling {
            println!(
                "⏱️  Total processing time: {:.3}s",
                start_time.elapsed().as_secs_f64()
            );
        }
        Ok(processed)
    }

    fn process_file_with_profiler(
        &self,
        input_path: &Path,
        profiler: &mut StepProfiler,
    ) -> DocumentResult<ProcessedDocument> {
        if !self.preprocessor.supports_file_type(input_path) {
            return Err(DocumentError::Pipeline(format!(
                "{} preprocessor does not support {}",
                self.preprocessor.name(),
                input_path.display()
            )));
        }

        let document = document_id(input_path);
        log::info!("📄 Processing document: {}", document);

        let tree = profiler.time_step("1. Markup → StyledTree", || {
            self.preprocessor.process_file(input_path)
        })?;

        Ok(self.process_tree_with_profiler(&document, &tree, profiler))
    }

    /// Process converter markup held in memory
    pub fn process_markup(&self, document: &str, markup: &str) -> DocumentResult<ProcessedDocument> {
        let tree = self.preprocessor.parse_markup(markup)?;
        Ok(self.process_tree(document, &tree))
    }

    /// Run the extraction pipeline over an already built tree
    pub fn process_tree(&self, document: &str, tree: &StyledTree) -> ProcessedDocument {
        self.process_tree_with_profiler(document, tree, &mut StepProfiler::new(false))
    }

    fn process_tree_with_profiler(
        &self,
        document: &str,
        tree: &StyledTree,
        profiler: &mut StepProfiler,
    ) -> ProcessedDocument {
        let mut report = DocumentReport::new(document);
        let mut builder = RecordBuilder::new(document, &self.config.column_separator);

        if self.config.minimal_parse {
            log::info!("🔄 Minimal parse mode - skipping rule processing");
        } else {
            let output = profiler.time_step("2. Rules Processing", || {
                self.rule_engine.run(document, tree)
            });

            profiler.time_step("3. Flattening", || {
                for (field, value) in &output.fields {
                    builder.store(field, Some(value));
                }
            });

            report.stages = output.stages;
        }

        let (record, row) = builder.finish();
        log::info!(
            "✅ {}: {}/{} fields extracted, {} columns",
            document,
            report.extracted(),
            report.stages.len(),
            row.len()
        );

        ProcessedDocument {
            record,
            row,
            report,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html><body>
<div style="top:40px;"><a name="1">Page 1</a></div>
<div style="position:absolute; top:90px;"><span style="font-size:20px">Sparse Layouts</span></div>
<div style="position:absolute; top:140px;"><span style="font-size:12px">Ada Lovelace</span></div>
<div style="position:absolute; top:300px;"><span style="font-size:8px">Received: 1 May 2020 / Accepted: 2 June 2020</span></div>
</body></html>"#;

    #[test]
    fn test_document_id_uses_pdf_stem() {
        assert_eq!(document_id(Path::new("/data/paper.html")), "paper.pdf");
        assert_eq!(document_id(Path::new("paper.pdf.html")), "paper.pdf");
    }

    #[test]
    fn test_process_markup_builds_record_and_row() {
        let processor = DocumentProcessor::new(ExtractionConfig::default()).unwrap();
        let processed = processor.process_markup("sparse.pdf", PAGE).unwrap();

        let keys: Vec<&str> = processed.record.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["document", "title", "received", "accepted", "authors"]);
        assert_eq!(processed.row["authors.0"], Scalar::from("Ada Lovelace"));
        assert_eq!(processed.row["authors.length"], Scalar::Int(1));
        assert_eq!(processed.report.extracted(), 3);
    }

    #[test]
    fn test_minimal_parse_keeps_only_document() {
        let config = ExtractionConfig {
            minimal_parse: true,
            ..ExtractionConfig::default()
        };
        let processor = DocumentProcessor::new(config).unwrap();
        let processed = processor.process_markup("sparse.pdf", PAGE).unwrap();

        assert_eq!(processed.record.len(), 1);
        assert_eq!(processed.record[DOCUMENT_FIELD], FieldValue::from("sparse.pdf"));
        assert!(processed.report.stages.is_empty());
    }

    #[test]
    fn test_unsupported_unit_fails_document() {
        let processor = DocumentProcessor::new(ExtractionConfig::default()).unwrap();
        let err = processor
            .process_markup("bad.pdf", r#"<span style="font-size:1em">x</span>"#)
            .unwrap_err();
        assert!(matches!(err, DocumentError::Markup(_)));
    }

    #[test]
    fn test_unsupported_file_type_is_rejected() {
        let processor = DocumentProcessor::new(ExtractionConfig::default()).unwrap();
        let err = processor.process_file(Path::new("paper.pdf")).unwrap_err();
        assert!(matches!(err, DocumentError::Pipeline(_)));
    }

    #[test]
    fn test_profiler_records_steps_only_when_enabled() {
        let mut profiler = StepProfiler::new(true);
        let value = profiler.time_step("step", || 7);
        assert_eq!(value, 7);
        assert_eq!(profiler.timings().len(), 1);

        let mut silent = StepProfiler::new(false);
        silent.time_step("step", || ());
        assert!(silent.timings().is_empty());
    }
}
