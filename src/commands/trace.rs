use std::fs;
use std::process::ExitCode;

use vectorizer::{VectorizeOptions, VectorizerResult};

use crate::cli::{GlobalOptions, TraceCommand};

use super::utils::{build_vectorizer, derive_svg_path, print_warnings};

/// The main function to run the trace command.
pub fn run(global: &GlobalOptions, cmd: TraceCommand) -> VectorizerResult<ExitCode> {
    let vectorizer = build_vectorizer(global, &cmd.trace_options);
    let options = VectorizeOptions::from(&cmd.trace_options);
    let output_path = cmd
        .output
        .clone()
        .unwrap_or_else(|| derive_svg_path(&cmd.input));

    let image_bytes = fs::read(&cmd.input)?;
    let result = vectorizer.vectorize(&image_bytes, &options)?;

    print_warnings(&result.compatibility);
    fs::write(&output_path, &result.svg)?;
    println!(
        "SVG with {} paths saved to {} ({} bytes)",
        result.metadata.path_count,
        output_path.display(),
        result.metadata.output_size
    );

    Ok(ExitCode::SUCCESS)
}
