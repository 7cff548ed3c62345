// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! skyhook CLI - entry launcher for the loader hook pipeline

use clap::Parser;
use owo_colors::OwoColorize;
use skyhook::{GraphLoader, Loader, LoaderConfig, VERSION};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(
    name = "skyhook",
    about = "Load a program under the skyhook module-loader hooks",
    version = VERSION,
    author = "Pegasus Heavy Industries"
)]
struct Cli {
    /// Entry file to load
    entry: PathBuf,

    /// Enable verbose logging
    #[arg(long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("skyhook=debug")
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter("skyhook=warn")
            .init();
    }

    let cwd = std::env::current_dir()?;
    let config = LoaderConfig::discover(&cwd);
    let graph = GraphLoader::new(Arc::new(Loader::new(config)));

    match graph.load_entry(&cli.entry).await {
        Ok(modules) => {
            println!(
                "loaded {} module{} from {}",
                modules.len(),
                if modules.len() == 1 { "" } else { "s" },
                cli.entry.display()
            );
            Ok(())
        }
        Err(e) => {
            eprintln!("{}: {}", "Error".red().bold(), e);
            std::process::exit(1);
        }
    }
}
