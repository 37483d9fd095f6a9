mod app;
mod cli;
mod collapse;
mod debounce;
mod error;
#[cfg(test)]
mod fixtures;
mod loader;
mod logging;
mod navigation;
mod product;
mod renderer;
mod session;
mod sort;
mod source;
mod tint;
mod tree;
mod watcher;

use std::io::Write;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};

use crate::cli::Config;
use crate::product::ROW_LIMIT;

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    let config = cli.config()?;

    // Handle --print mode
    if config.print {
        if let Err(e) = logging::init_stderr() {
            eprintln!("modeltree: logging disabled: {:#}", e);
        }
        return handle_print(&config);
    }

    // Interactive mode: the TUI owns the terminal, so log to a file.
    let log_path = config
        .log_file
        .clone()
        .unwrap_or_else(logging::default_log_path);
    if let Err(e) = logging::init_file(&log_path) {
        eprintln!("modeltree: logging disabled: {:#}", e);
    }
    info!(log = %log_path.display(), "starting");

    let mut app = app::App::new(config)?;
    app.run()?;

    Ok(())
}

/// Load the starting dataset, apply the CLI view options and print the
/// final rows, one per line.
fn handle_print(config: &Config) -> anyhow::Result<()> {
    let (datasets, start) = app::resolve_datasets(&config.input)?;
    let dataset = &datasets[start];

    let rows = dataset
        .source
        .fetch()
        .with_context(|| format!("loading {}", dataset.source))?;
    let root = tree::get_root_label(&rows);
    tree::get_root_identifier(&rows)?;

    if rows.len() >= ROW_LIMIT {
        warn!(
            rows = rows.len(),
            "reached {} rows; the data source may have capped the tree", ROW_LIMIT
        );
    }

    let view = tree::compute_rows(&rows, &config.initial_view);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    writeln!(out, "{} ({}, {} of {} rows)", root, dataset.label, view.len(), rows.len())?;
    for row in &view {
        writeln!(out, "{}", renderer::plain_row(row))?;
    }
    Ok(())
}
