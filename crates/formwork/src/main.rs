//! Formwork CLI - development driver for the generation engine.
//!
//! Not a service surface: this exists to exercise template resolution and
//! field mapping from the command line and inspect the payloads a
//! rendering backend would receive.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::{json, Value};

use formwork_engine::Engine;
use formwork_resolve::{FileSystemSource, TemplateResolver};

#[derive(Parser)]
#[command(name = "formwork")]
#[command(about = "Formwork template-resolution and field-mapping engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a template and map request data into section payloads
    Generate {
        /// Directory containing template definitions
        #[arg(short = 'T', long)]
        templates: PathBuf,

        /// Template id (may contain ${path} placeholders)
        #[arg(short, long)]
        template: String,

        /// JSON file with the request data
        #[arg(short, long)]
        data: PathBuf,

        /// Placeholder variable (KEY=VALUE, repeatable)
        #[arg(long = "var")]
        vars: Vec<String>,

        /// Pretty-print the output JSON
        #[arg(long)]
        pretty: bool,
    },

    /// Resolve a template id and print the merged template
    Resolve {
        /// Directory containing template definitions
        #[arg(short = 'T', long)]
        templates: PathBuf,

        /// Template id (may contain ${path} placeholders)
        #[arg(short, long)]
        template: String,

        /// Placeholder variable (KEY=VALUE, repeatable)
        #[arg(long = "var")]
        vars: Vec<String>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    match Cli::parse().command {
        Commands::Generate {
            templates,
            template,
            data,
            vars,
            pretty,
        } => {
            let engine = Engine::new(Arc::new(FileSystemSource::new(templates)));
            let data = read_json(&data)?;
            let variables = parse_vars(&vars)?;
            let output = engine.generate(&template, &data, &variables)?;
            if pretty {
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                println!("{}", serde_json::to_string(&output)?);
            }
        }
        Commands::Resolve {
            templates,
            template,
            vars,
        } => {
            let resolver = TemplateResolver::new(Arc::new(FileSystemSource::new(templates)));
            let variables = parse_vars(&vars)?;
            let resolved = resolver.resolve(&template, &variables)?;
            println!("{}", serde_json::to_string_pretty(&*resolved)?);
        }
    }
    Ok(())
}

fn read_json(path: &Path) -> Result<Value> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading data file {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

/// Parse `KEY=VALUE` pairs into a variable object. Dotted keys nest, so
/// `--var plan.state=ca` satisfies a `${plan.state}` placeholder.
fn parse_vars(vars: &[String]) -> Result<Value> {
    let mut out = Value::Object(serde_json::Map::new());
    for var in vars {
        let (key, value) = var
            .split_once('=')
            .with_context(|| format!("expected KEY=VALUE, got {var:?}"))?;
        let mut current = &mut out;
        let mut segments = key.split('.').peekable();
        while let Some(segment) = segments.next() {
            let map = current
                .as_object_mut()
                .with_context(|| format!("conflicting variable paths at {key:?}"))?;
            if segments.peek().is_none() {
                map.insert(segment.to_string(), json!(value));
                break;
            }
            current = map
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(serde_json::Map::new()));
        }
    }
    Ok(out)
}
