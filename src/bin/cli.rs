//! page-probe CLI
//!
//! Loads a fixture document, injects the helper and answers requests, one JSON outcome per
//! line. Requests come from `--request` or, when none are given, from stdin lines.

use anyhow::{Context, Result};
use clap::Parser;
use page_probe::{Document, ElementNode, Request, Window, WindowOptions};
use serde::Deserialize;
use std::io::{BufRead, Write};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "page-probe")]
#[command(version)]
#[command(about = "Run page helper requests against a fixture document", long_about = None)]
struct Cli {
    /// JSON fixture: one element tree or an array of them, placed in the body
    #[arg(long, short = 'd', value_name = "FILE", required_unless_present = "schema")]
    document: Option<PathBuf>,

    /// Global slot the helper is installed under
    #[arg(long, value_name = "NAME")]
    slot: Option<String>,

    /// Maximum number of recorded events
    #[arg(long, value_name = "N")]
    event_log_limit: Option<usize>,

    /// JSON request to run; may be repeated
    #[arg(long, short = 'r', value_name = "JSON")]
    request: Vec<String>,

    /// Print the request JSON schema and exit
    #[arg(long)]
    schema: bool,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Fixture {
    One(ElementNode),
    Many(Vec<ElementNode>),
}

impl Fixture {
    fn into_elements(self) -> Vec<ElementNode> {
        match self {
            Fixture::One(element) => vec![element],
            Fixture::Many(elements) => elements,
        }
    }
}

fn load_document(path: &PathBuf) -> Result<Document> {
    let text = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let fixture: Fixture =
        serde_json::from_str(&text).with_context(|| format!("Failed to parse fixture {}", path.display()))?;
    Ok(Document::from_elements(fixture.into_elements()))
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut stdout = std::io::stdout().lock();

    if cli.schema {
        let schema = schemars::schema_for!(Request);
        serde_json::to_writer_pretty(&mut stdout, &schema)?;
        writeln!(stdout)?;
        return Ok(());
    }

    let path = cli.document.context("--document is required")?;
    let document = load_document(&path)?;

    let mut options = WindowOptions::new();
    if let Some(slot) = cli.slot {
        options = options.slot(slot);
    }
    if let Some(limit) = cli.event_log_limit {
        options = options.event_log_limit(limit);
    }

    let mut window = Window::with_options(document, options);
    window.inject();
    log::info!("loaded {} and installed helper", path.display());

    if cli.request.is_empty() {
        for line in std::io::stdin().lock().lines() {
            let line = line.context("Failed to read request from stdin")?;
            if line.trim().is_empty() {
                continue;
            }
            writeln!(stdout, "{}", window.call_json(&line))?;
        }
    } else {
        for request in &cli.request {
            writeln!(stdout, "{}", window.call_json(request))?;
        }
    }

    Ok(())
}
