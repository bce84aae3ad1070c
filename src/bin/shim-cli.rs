//! Offline tool for inspecting what the shim would send upstream.

use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde_json::Value;

use compat_shim::config::{load_config, NormalizerConfig};
use compat_shim::normalize::{
    classify, clean_id, IdGenerator, NoopObserver, NormalizeObserver, Normalizer, TracingObserver,
};

#[derive(Parser)]
#[command(name = "shim-cli")]
#[command(about = "Inspect request normalization without a running shim", long_about = None)]
struct Cli {
    /// Config file supplying normalizer settings.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log each change to stderr.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalize a request body (file or stdin) and print the result
    Normalize {
        /// JSON file; reads stdin when omitted.
        file: Option<PathBuf>,
        /// Print a summary of changes instead of the body.
        #[arg(long)]
        report: bool,
    },
    /// Show how each message of a request body is classified
    Classify {
        file: Option<PathBuf>,
    },
    /// Clean a single tool identifier
    CleanId {
        id: String,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.verbose {
        compat_shim::observability::logging::init_logging("debug");
    }

    let normalizer_config = match &cli.config {
        Some(path) => load_config(path)?.normalizer,
        None => NormalizerConfig::default(),
    };

    match cli.command {
        Commands::Normalize { file, report } => {
            let mut payload = read_payload(file)?;
            let observer: Arc<dyn NormalizeObserver> = if cli.verbose {
                Arc::new(TracingObserver)
            } else {
                Arc::new(NoopObserver)
            };
            let normalizer = Normalizer::new(&normalizer_config, Arc::new(IdGenerator::new()), observer);
            let summary = normalizer.normalize(&mut payload);

            if report {
                println!("{summary:#?}");
            } else {
                println!("{}", serde_json::to_string_pretty(&payload)?);
            }
        }
        Commands::Classify { file } => {
            let payload = read_payload(file)?;
            let messages = payload
                .get("messages")
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or_default();
            for (index, message) in messages.iter().enumerate() {
                let role = message.get("role").and_then(Value::as_str).unwrap_or("-");
                println!("{index:>3}  {role:<10} {:?}", classify(message));
            }
        }
        Commands::CleanId { id } => match clean_id(&id) {
            cleaned if cleaned.is_empty() => println!("(empty; the shim would generate a tooluse_<N> id)"),
            cleaned => println!("{cleaned}"),
        },
    }

    Ok(())
}

fn read_payload(file: Option<PathBuf>) -> Result<Value, Box<dyn std::error::Error>> {
    let text = match file {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    Ok(serde_json::from_str(&text)?)
}
