// framescope-cli/src/main.rs
//
// Entry point of the `framescope` binary: parse the arguments, dispatch to
// the subcommand and turn any error into a message and exit status 1.

use clap::Parser;
use framescope_cli::output::print_error;
use framescope_cli::{Cli, Commands, run_analyze, run_probe};
use std::process;

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Analyze(args) => run_analyze(args, cli.verbose),
        Commands::Probe { video } => run_probe(&video, cli.verbose),
    };

    if let Err(e) = result {
        print_error(&e.to_string());
        process::exit(1);
    }
}
