use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use vectorizer::{ColorMode, VectorizeOptions};

/// Command line interface definition.
#[derive(Parser, Debug)]
#[command(author, version, about, propagate_version = true)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOptions,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug)]
pub struct GlobalOptions {
    /// Inputs larger than this in either dimension are scaled down
    #[arg(
        long = "max-dimension",
        env = "VECTORIZER_MAX_DIMENSION",
        default_value_t = 2048
    )]
    pub max_dimension: u32,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Trace a raster image into an SVG file
    Trace(TraceCommand),
    /// Trace a raster image and report metadata without writing output
    Analyze(AnalyzeCommand),
    /// Check an existing SVG for compatibility problems
    Check(CheckCommand),
}

/// Color handling modes for tracing.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ColorModeArg {
    Bw,
    Grayscale,
    Color,
}

impl From<ColorModeArg> for ColorMode {
    /// Convert ColorModeArg to vectorizer::ColorMode.
    fn from(value: ColorModeArg) -> Self {
        match value {
            ColorModeArg::Bw => ColorMode::Bw,
            ColorModeArg::Grayscale => ColorMode::Grayscale,
            ColorModeArg::Color => ColorMode::Color,
        }
    }
}

#[derive(Args, Debug)]
pub struct TraceCommand {
    /// Input image path
    pub input: PathBuf,
    /// Output SVG path (defaults to input name with `.svg`)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    #[command(flatten)]
    pub trace_options: TraceOptionsArgs,
}

#[derive(Args, Debug)]
pub struct AnalyzeCommand {
    /// Input image path
    pub input: PathBuf,
    /// Print the report as JSON instead of a human-readable summary
    #[arg(long)]
    pub json: bool,
    #[command(flatten)]
    pub trace_options: TraceOptionsArgs,
}

#[derive(Args, Debug)]
pub struct CheckCommand {
    /// SVG file to check
    pub input: PathBuf,
    /// Print the report as JSON instead of a human-readable summary
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct TraceOptionsArgs {
    /// Tracing color mode
    #[arg(long = "color-mode", value_enum, default_value_t = ColorModeArg::Bw)]
    pub color_mode: ColorModeArg,
    /// Detail level (0-100); higher keeps smaller features
    #[arg(long, default_value_t = 70)]
    pub detail: u8,
    /// Smoothness (0-100); higher fits smoother curves
    #[arg(long, default_value_t = 50)]
    pub smoothness: u8,
    /// Fixed binarization threshold (0-255); omit for automatic selection
    #[arg(long)]
    pub threshold: Option<u8>,
    /// Palette size bound for color mode (2-32)
    #[arg(long = "max-colors", default_value_t = 16)]
    pub max_colors: u8,
    /// Output optimization aggressiveness (0-100)
    #[arg(long, default_value_t = 50)]
    pub optimize: u8,
}

impl From<&TraceOptionsArgs> for VectorizeOptions {
    fn from(args: &TraceOptionsArgs) -> Self {
        Self {
            color_mode: args.color_mode.into(),
            detail_level: args.detail,
            smoothness: args.smoothness,
            threshold: args.threshold,
            max_colors: args.max_colors,
        }
    }
}
