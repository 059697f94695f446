use clap::builder::styling::{AnsiColor, Color, Style, Styles};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Execution provider for ONNX Runtime
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum Provider {
	/// Auto-detect best available (TensorRT → CUDA → CoreML → XNNPACK → CPU)
	#[default]
	Auto,
	/// CPU only
	Cpu,
	/// NVIDIA CUDA GPU
	Cuda,
	/// NVIDIA TensorRT (optimized inference)
	Tensorrt,
	/// Apple CoreML (macOS only)
	Coreml,
	/// XNNPACK CPU acceleration
	Xnnpack,
}

fn styles() -> Styles {
	Styles::styled()
		.header(Style::new().bold().fg_color(Some(Color::Ansi(AnsiColor::Blue))))
		.usage(Style::new().bold().fg_color(Some(Color::Ansi(AnsiColor::Blue))))
		.literal(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Blue))))
		.placeholder(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Yellow))))
}

/// Sidecar flags
///
/// The parent process spawns the sidecar with no arguments and speaks
/// JSON lines over stdin/stdout; every flag here has a working default
/// and only tunes model resolution and diagnostics.
#[derive(Parser, Debug)]
#[command(
	name = "photosift",
	author,
	version,
	about = "ML sidecar for photo embedding and similarity grouping",
	styles = styles(),
)]
pub struct Cli {
	/// Enable verbose debug output on stderr
	#[arg(short = 'v', long = "verbose")]
	pub verbose: bool,

	/// Execution provider: auto, cpu, cuda, tensorrt, coreml, xnnpack
	#[arg(short = 'p', long = "provider", default_value = "auto")]
	pub provider: Provider,

	/// Directory containing model files
	#[arg(long = "models-dir", value_name = "DIR")]
	pub models_dir: Option<PathBuf>,

	/// Vision model file (overrides models dir resolution)
	#[arg(long = "model", value_name = "PATH")]
	pub model: Option<PathBuf>,
}
