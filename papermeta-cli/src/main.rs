use anyhow::Result;
use clap::Parser;
use std::path::Path;

// Import from papermeta-core
use papermeta_core::{DebugConfig, DocumentProcessor, ExtractionConfig};

// Import CLI utilities
use papermeta::output::{print_document, BatchSummary, InputOutcome};

#[derive(Parser)]
#[command(name = "papermeta")]
#[command(about = "Extract title, authors and publication dates from converted paper layouts")]
struct Args {
    /// Converter HTML file(s) to process, one document each
    #[arg(short, long, num_args = 1.., required_unless_present = "show_configs")]
    input: Vec<String>,

    /// Path to custom config file (YAML format)
    #[arg(short, long)]
    config: Option<String>,

    /// Directory for <stem>.gen.json records and <stem>.row.json rows
    #[arg(short, long)]
    output_dir: Option<String>,

    /// Print the flat row of each document
    #[arg(long)]
    print_row: bool,

    /// Enable minimal parse mode (bypass all rule processing)
    #[arg(long)]
    minimal_parse: bool,

    /// Enable detailed profiling of all pipeline steps
    #[arg(long)]
    profile: bool,

    /// Trace extracted values matching these patterns (regex or substring)
    #[arg(long, num_args = 1..)]
    debug_pattern: Vec<String>,

    /// Show available config options and exit
    #[arg(long)]
    show_configs: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_filter = if args.debug_pattern.is_empty() {
        "warn"
    } else {
        "debug"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    println!("📚 papermeta");

    if args.show_configs {
        show_help();
        return Ok(());
    }

    // Load config using the functional pattern
    let mut config = ExtractionConfig::load_with_fallback(args.config.as_deref());

    if let Some(config_path) = &args.config {
        println!("📋 Loaded config from: {}", config_path);
    } else {
        println!("📋 Using default config");
    }

    // Apply CLI overrides to config
    if args.minimal_parse {
        config.minimal_parse = true;
    }

    let mut processor = DocumentProcessor::new(config)?;
    println!("🔧 Pipeline: {}", processor.rule_engine().rule_names().join(" → "));

    if !args.debug_pattern.is_empty() {
        processor.set_debug_config(DebugConfig::new(true, args.debug_pattern.clone()));
    }

    let mut outcomes = Vec::new();

    for input in &args.input {
        let input_path = Path::new(input);
        println!("\n📄 Processing: {}", input);

        // A failing document is reported and the batch moves on
        match processor.process_file_with_profiling(input_path, args.profile) {
            Ok(processed) => {
                println!("✅ Successfully processed document");
                print_document(&processed, args.print_row);

                let output_dir = args.output_dir.as_deref().map(Path::new);
                outcomes.push(InputOutcome::processed(input, processed, output_dir));
            }
            Err(e) => {
                eprintln!("❌ Processing failed for {input}: {e}");
                outcomes.push(InputOutcome::failed(input, &e));
            }
        }
    }

    let summary = BatchSummary::new(outcomes);
    println!(
        "\n🏁 {} processed, {} failed",
        summary.processed, summary.failed
    );

    if let Some(output_dir) = &args.output_dir {
        summary.save(Path::new(output_dir))?;
    }

    if summary.failed > 0 {
        std::process::exit(1);
    }

    Ok(())
}

fn show_help() {
    println!("\n📋 Available Configuration Options:");
    println!("  --config <path>            Load custom config file");
    println!("  --input <path>...          Converter HTML file(s) to process");
    println!("  --output-dir <dir>         Write <stem>.gen.json and <stem>.row.json");
    println!("  --print-row                Print the flat row of each document");
    println!("  --minimal-parse            Enable minimal parse mode (bypass all rule processing)");
    println!("  --profile                  Time every pipeline step");
    println!("  --debug-pattern <re>...    Trace extracted values matching a pattern");

    println!("\n⚙️  Config keys (YAML):");
    println!("  pipeline.rules             Ordered rules: title, dates, authors");
    println!("  title.min_font_size        Smallest title font size (default 15)");
    println!("  title.span_tag             Node name of text spans (default span)");
    println!("  dates.keywords             Prefixes opening the date line");
    println!("  authors.false_positives    Texts never taken as author names");
    println!("  first_page                 Page attribute of the first page (default 1)");
    println!("  column_separator           Row column delimiter (default .)");
    println!("  minimal_parse              Skip all rules");

    println!("\n📝 Usage Examples:");
    println!("  cargo run -- -i paper.html");
    println!("  cargo run -- -i a.html b.html -o out/ --print-row");
    println!("  cargo run -- -i paper.html -c config.yaml --profile");
}
