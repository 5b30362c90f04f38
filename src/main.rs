//! html2exe - package HTML projects into single-file executables

use clap::Parser;
use html2exe::cli::{self, Args};
use std::process;

fn main() {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let code = cli::usage_exit_code(&e);
            let _ = e.print();
            process::exit(code);
        }
    };
    cli::init_logging(args.verbose);
    process::exit(cli::run(&args));
}
