//! jubamodel: low-level manipulation tool for Jubatus model files.
//!
//! Exit codes:
//! - 0: success, or help was shown
//! - 1: usage or validation error
//! - 2: argument parsing error
//! - 3: the model could not be loaded, transformed or written

mod commands;
mod parse;
mod run;

use std::io;
use std::process;

use clap::error::ErrorKind;
use tracing::Level;

use commands::build_cli;
use parse::matches_to_command;

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_max_level(level)
        .with_target(false)
        .without_time()
        .init();
}

fn main() {
    let mut cli = build_cli();
    let matches = match cli.try_get_matches_from_mut(std::env::args_os()) {
        Ok(m) => m,
        Err(e) => {
            let code = match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => 2,
            };
            let _ = e.print();
            process::exit(code);
        }
    };

    init_logging(matches.get_flag("verbose"));

    let cmd = match matches_to_command(&matches) {
        Ok(cmd) => cmd,
        Err(msg) => {
            eprintln!("Error: {}", msg);
            eprintln!();
            let _ = cli.print_help();
            process::exit(1);
        }
    };

    let stdout = io::stdout();
    if let Err(e) = run::run(&cmd, &mut stdout.lock()) {
        eprintln!("Error: {:#}", e);
        process::exit(3);
    }
}
