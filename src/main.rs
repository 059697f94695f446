//! Photosift - ML sidecar for photo similarity grouping
//!
//! Spawned by a parent application; speaks newline-delimited JSON over
//! stdin/stdout. stderr carries human diagnostics only.

use std::io;
use std::process;

use anyhow::Result;
use clap::Parser;

use photosift::cli::Cli;
use photosift::config;
use photosift::models::VisionEmbedder;
use photosift::processing::SimilarityEngine;
use photosift::protocol::{Dispatcher, ErrorCode, MessageWriter};
use photosift::runtime::set_provider;
use photosift::ui::{self, Log};

fn main() -> Result<()> {
	let cli = Cli::parse();

	Log::set_verbose(cli.verbose);
	set_provider(cli.provider);

	if let Some(dir) = cli.models_dir {
		config::set_models_dir(dir);
	}
	if let Some(model) = cli.model {
		config::set_vision_model(model);
	}

	let stdout = io::stdout();

	// Embedder construction is the only fatal failure path: report it on
	// the wire, then exit non-zero so the parent can surface it.
	let embedder = match VisionEmbedder::new() {
		Ok(embedder) => embedder,
		Err(e) => {
			let mut writer = MessageWriter::new(stdout.lock());
			let _ = writer.error(
				ErrorCode::InitError,
				&format!("Failed to initialize embedder: {:#}", e),
			);
			ui::error(&format!("Initialization failed: {:#}", e));
			process::exit(1);
		}
	};

	let mut dispatcher = Dispatcher::new(embedder, SimilarityEngine::new());
	dispatcher.run(io::stdin().lock(), stdout.lock())
}
