//! Pedigree Layout CLI
//!
//! Usage:
//!   pedigree-layout [OPTIONS] [FILE]
//!
//! Options:
//!   -c, --config <FILE>  Layout configuration (TOML format)
//!   --lint               Report layout defects on stderr
//!   -v, --verbose        Debug logging on stderr
//!   -h, --help           Print help

use std::io::{self, Read};
use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use pedigree_layout::layout::{lint, TracingMetrics};
use pedigree_layout::{layout_document, render_text, LayoutConfig, PedigreeDocument};

#[derive(Parser)]
#[command(name = "pedigree-layout")]
#[command(about = "Compute generation-leveled layouts for pedigree graphs")]
struct Cli {
    /// Input document (reads from stdin if not provided)
    input: Option<PathBuf>,

    /// Layout configuration file (TOML format)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Report layout defects on stderr
    #[arg(long)]
    lint: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // Load configuration
    let config = match &cli.config {
        Some(path) => match LayoutConfig::from_file(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config '{}': {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => LayoutConfig::default(),
    };

    // Read input
    let source = match &cli.input {
        Some(path) => match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                eprintln!("Error reading file '{}': {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => {
            let mut buffer = String::new();
            match io::stdin().read_to_string(&mut buffer) {
                Ok(_) => buffer,
                Err(e) => {
                    eprintln!("Error reading from stdin: {}", e);
                    std::process::exit(1);
                }
            }
        }
    };

    let doc = match PedigreeDocument::from_toml_str(&source) {
        Ok(doc) => doc,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let layout = match layout_document(&doc, &config, &TracingMetrics) {
        Ok(layout) => layout,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    print!("{}", render_text(&layout));

    if cli.lint {
        match doc.pedigree() {
            Ok(pedigree) => {
                for warning in lint::check(&layout, &pedigree) {
                    eprintln!("warning: {}", warning);
                }
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
    }
}
