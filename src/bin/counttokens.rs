//! CountTokens CLI binary.
//!
//! # Commands
//!
//! - `text` - Count tokens in a string (or stdin)
//! - `file` - Count tokens in one file
//! - `directory` - Count tokens in every matching file under a directory
//! - `models` - List catalogued models and their encodings

use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use counttokens::{
    config::Config,
    counter::{ExtensionFilter, TokenCounter},
    output::{self, OutputFormat},
    tokenizer::{TokenizerCache, TokenizerProvider},
    VERSION,
};

/// Characters of input shown in the `text` table.
const PREVIEW_CHARS: usize = 50;

#[derive(Parser)]
#[command(name = "counttokens")]
#[command(version = VERSION)]
#[command(
    about = "Count tokens in text, files, or directories using model-specific tokenizers",
    long_about = None
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct GlobalArgs {
    /// Model to count for (e.g. gpt-3.5-turbo, gpt-4o, cl100k_base)
    #[arg(short, long, global = true)]
    model: Option<String>,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Count tokens in a text string
    Text {
        /// Text to count (or - for stdin)
        input: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Count tokens in a file
    File {
        /// File to count
        path: PathBuf,

        /// Save the result as JSON or CSV (by extension)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Report format (json, csv); overrides the output extension
        #[arg(short, long)]
        format: Option<OutputFormat>,
    },

    /// Count tokens in all matching files within a directory
    Directory {
        /// Directory to scan
        path: PathBuf,

        /// File extensions to process (e.g. -e txt -e json)
        #[arg(short, long = "extensions")]
        extensions: Vec<String>,

        /// Only count direct children of the directory
        #[arg(long)]
        no_recursive: bool,

        /// Count files in parallel
        #[arg(long)]
        parallel: bool,

        /// Save results as JSON or CSV (by extension)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Report format (json, csv); overrides the output extension
        #[arg(short, long)]
        format: Option<OutputFormat>,
    },

    /// List catalogued models
    Models {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.global.verbose, cli.global.log_json);

    let config = Config::load(cli.global.config.as_deref()).context("Failed to load config")?;
    let model = cli
        .global
        .model
        .clone()
        .unwrap_or_else(|| config.counting.model.clone());

    match cli.command {
        Commands::Text { input, json } => cmd_text(&config, &model, input, json),

        Commands::File {
            path,
            output,
            format,
        } => cmd_file(&config, &model, &path, output, format),

        Commands::Directory {
            path,
            extensions,
            no_recursive,
            parallel,
            output,
            format,
        } => cmd_directory(
            &config,
            &model,
            &path,
            &extensions,
            no_recursive,
            parallel,
            output,
            format,
        ),

        Commands::Models { json } => cmd_models(&config, json),
    }
}

fn init_logging(verbose: bool, json: bool) {
    let log_level = if verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn cmd_text(config: &Config, model: &str, input: Option<String>, json: bool) -> anyhow::Result<()> {
    let text = read_input(input)?;
    let cache = TokenizerCache::new(config.provider());
    let counter = TokenCounter::new(&cache);

    let tokens = counter.count_text(&text, model)?;
    let characters = text.chars().count();

    if json {
        let output = serde_json::json!({
            "model": model,
            "characters": characters,
            "tokens": tokens,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let preview: String = if characters > PREVIEW_CHARS {
        let head: String = text.chars().take(PREVIEW_CHARS).collect();
        format!("{head}...")
    } else {
        text.clone()
    };
    let preview = preview.replace('\n', " ");

    println!("Token Count ({model})");
    println!("{:<56} {:>12} {:>10}", "Text Preview", "Characters", "Tokens");
    println!("{}", "-".repeat(80));
    println!("{:<56} {:>12} {:>10}", preview, characters, tokens);

    Ok(())
}

fn cmd_file(
    config: &Config,
    model: &str,
    path: &Path,
    output: Option<PathBuf>,
    format: Option<OutputFormat>,
) -> anyhow::Result<()> {
    if !path.is_file() {
        anyhow::bail!("File not found: {}", path.display());
    }

    let cache = TokenizerCache::new(config.provider());
    let counter = TokenCounter::new(&cache);
    let result = counter.count_file(path, model)?;

    emit(config, &result, output, format)?;

    if let Some(error) = result.error() {
        anyhow::bail!("Failed to count {}: {error}", path.display());
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn cmd_directory(
    config: &Config,
    model: &str,
    path: &Path,
    extensions: &[String],
    no_recursive: bool,
    parallel: bool,
    output: Option<PathBuf>,
    format: Option<OutputFormat>,
) -> anyhow::Result<()> {
    let mut scan = config.scan();
    if !extensions.is_empty() {
        scan = scan.with_extensions(ExtensionFilter::new(extensions));
    }
    if no_recursive {
        scan = scan.recursive(false);
    }
    if parallel {
        scan = scan.parallel(true);
    }

    eprintln!("Counting tokens in directory: {}", path.display());
    eprintln!("Model: {model}");
    eprintln!(
        "Extensions: {}",
        scan.extensions.iter().collect::<Vec<_>>().join(", ")
    );
    eprintln!("Recursive: {}", scan.recursive);

    let cache = TokenizerCache::new(config.provider());
    let counter = TokenCounter::new(&cache);
    let report = counter.count_directory(path, &scan, model)?;

    emit(config, &report, output, format)
}

fn cmd_models(config: &Config, json: bool) -> anyhow::Result<()> {
    let provider = config.provider();
    let models = provider.policy().known_models();
    let files = provider.tokenizer_files();

    if json {
        let output = serde_json::json!({
            "fallback_encoding": provider.policy().fallback_encoding().map(|e| e.name()),
            "models": models.iter().map(|(id, encoding)| serde_json::json!({
                "model": id,
                "encoding": encoding.name(),
            })).collect::<Vec<_>>(),
            "tokenizer_files": files.iter().map(|(id, path)| serde_json::json!({
                "model": id,
                "path": path.display().to_string(),
            })).collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("Available Models ({}):", models.len() + files.len());
    println!();
    println!("{:<32} {:<12}", "Model", "Encoding");
    println!("{}", "-".repeat(45));
    for (id, encoding) in &models {
        println!("{:<32} {:<12}", id, encoding.name());
    }
    for (id, path) in &files {
        println!("{:<32} {}", id, path.display());
    }

    println!();
    match provider.policy().fallback_encoding() {
        Some(encoding) => println!(
            "Unlisted models in families {} fall back to {encoding}",
            config.models.fallback_families.join(", ")
        ),
        None => println!("Fallback disabled: unlisted models are rejected"),
    }

    // Surface a misconfigured default model.
    if let Err(e) = provider.resolve_tokenizer(&config.counting.model) {
        eprintln!("Warning: default model {}: {e}", config.counting.model);
    }

    Ok(())
}

// Helper functions

/// Print the summary, or persist/print the report in a machine format.
fn emit<'a>(
    config: &Config,
    report: impl Into<output::Report<'a>>,
    output_path: Option<PathBuf>,
    format: Option<OutputFormat>,
) -> anyhow::Result<()> {
    let report = report.into();
    match output_path {
        Some(path) => {
            println!("{}", output::to_summary(report));
            let format = format.or_else(|| configured_format(config, &path));
            output::write_report(report, &path, format)?;
            println!("Results saved to: {}", path.display());
        },
        None => match format {
            Some(format) => print!("{}", ensure_newline(output::render(report, format)?)),
            None => print!("{}", output::to_summary(report)),
        },
    }
    Ok(())
}

/// The configured format applies only when the path extension is not
/// `.json` or `.csv`.
fn configured_format(config: &Config, path: &Path) -> Option<OutputFormat> {
    let recognized = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json") || e.eq_ignore_ascii_case("csv"));
    if recognized {
        None
    } else {
        config.output.format
    }
}

fn ensure_newline(mut s: String) -> String {
    if !s.ends_with('\n') {
        s.push('\n');
    }
    s
}

fn read_input(input: Option<String>) -> anyhow::Result<String> {
    match input {
        Some(s) if s != "-" => Ok(s),
        _ => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Ok(buffer)
        },
    }
}
