//! itemdedup command-line entry point.

use clap::Parser;
use itemdedup::{cli::Cli, error::ExitCode};

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // help/version go to stdout, usage errors to stderr
            let _ = err.print();
            std::process::exit(ExitCode::for_clap_error(&err).as_i32());
        }
    };

    match itemdedup::run_app(cli) {
        Ok(code) => std::process::exit(code.as_i32()),
        Err(err) => {
            let exit_code = ExitCode::for_error(&err);
            eprintln!("{}", exit_code.heading());
            eprintln!("{:#}", err);
            std::process::exit(exit_code.as_i32());
        }
    }
}
