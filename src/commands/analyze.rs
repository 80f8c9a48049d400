use std::fs;
use std::process::ExitCode;

use serde::Serialize;
use vectorizer::preprocess::preprocess;
use vectorizer::threshold::otsu_threshold;
use vectorizer::{ColorMode, CompatReport, VectorizationMetadata, VectorizeOptions, VectorizerResult};

use crate::cli::{AnalyzeCommand, GlobalOptions};

use super::utils::{build_vectorizer, print_warnings};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AnalysisReport<'a> {
    suggested_threshold: u8,
    metadata: &'a VectorizationMetadata,
    compatibility: &'a CompatReport,
}

/// The main function to run the analyze command.
pub fn run(global: &GlobalOptions, cmd: AnalyzeCommand) -> VectorizerResult<ExitCode> {
    let vectorizer = build_vectorizer(global, &cmd.trace_options);
    let options = VectorizeOptions::from(&cmd.trace_options);

    let image_bytes = fs::read(&cmd.input)?;
    // Suggest a threshold from the unbinarized luminance, whatever mode
    // the actual trace will run in.
    let gray_options = VectorizeOptions {
        color_mode: ColorMode::Grayscale,
        ..options.clone()
    };
    let grid = preprocess(&image_bytes, &gray_options, global.max_dimension)?;
    let suggested_threshold = otsu_threshold(&grid.luminance());
    let result = vectorizer.vectorize(&image_bytes, &options)?;

    if cmd.json {
        let report = AnalysisReport {
            suggested_threshold,
            metadata: &result.metadata,
            compatibility: &result.compatibility,
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&report).unwrap_or_else(|_| "{}".to_string())
        );
    } else {
        println!("Input:     {} bytes", result.metadata.original_size);
        println!("Output:    {} bytes of SVG", result.metadata.output_size);
        println!("Paths:     {}", result.metadata.path_count);
        println!("Threshold: {suggested_threshold} (suggested)");
        println!("Time:      {} ms", result.metadata.processing_time_ms);
        print_warnings(&result.compatibility);
    }

    Ok(ExitCode::SUCCESS)
}
