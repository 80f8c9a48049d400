use std::fs;
use std::process::ExitCode;

use vectorizer::{VectorizerResult, validate::validate_svg_str};

use crate::cli::CheckCommand;

use super::utils::print_warnings;

/// The main function to run the check command.
pub fn run(cmd: CheckCommand) -> VectorizerResult<ExitCode> {
    let svg = fs::read_to_string(&cmd.input)?;
    let report = validate_svg_str(&svg);

    if cmd.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).unwrap_or_else(|_| "{}".to_string())
        );
    } else if report.ok && report.warnings.is_empty() {
        println!("{}: no compatibility problems found", cmd.input.display());
    } else {
        print_warnings(&report);
    }

    Ok(if report.ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
