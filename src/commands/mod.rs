mod analyze;
mod check;
mod trace;
mod utils;

use std::process::ExitCode;

use vectorizer::VectorizerResult;

use crate::cli::{Cli, Commands, GlobalOptions};

/// The main function to run the command based on CLI input.
pub fn run(cli: Cli) -> VectorizerResult<ExitCode> {
    let Cli { global, command } = cli;
    dispatch(&global, command)
}

/// Dispatch the command to the appropriate handler.
fn dispatch(global: &GlobalOptions, command: Commands) -> VectorizerResult<ExitCode> {
    match command {
        Commands::Trace(cmd) => trace::run(global, cmd),
        Commands::Analyze(cmd) => analyze::run(global, cmd),
        Commands::Check(cmd) => check::run(cmd),
    }
}
