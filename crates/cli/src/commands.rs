//! Clap command definition for `jubamodel`.

use clap::{Arg, ArgAction, Command};

const AFTER_HELP: &str = "\
Supported Formats:
  IN_FORMAT:  auto | binary | json
  OUT_FORMAT: text | binary | json";

/// Build the `jubamodel` command.
pub fn build_cli() -> Command {
    Command::new("jubamodel")
        .about("JubaModel - Jubatus Low-Level Model Manipulation Tool")
        .after_help(AFTER_HELP)
        .arg(
            Arg::new("in-format")
                .short('i')
                .long("in-format")
                .value_name("IN_FORMAT")
                .value_parser(["auto", "binary", "json"])
                .default_value("auto")
                .help("Model input format"),
        )
        .arg(
            Arg::new("out-format")
                .short('o')
                .long("out-format")
                .value_name("OUT_FORMAT")
                .value_parser(["text", "binary", "json"])
                .default_value("text")
                .help("Model output format"),
        )
        .arg(
            Arg::new("output")
                .short('O')
                .long("output")
                .value_name("OUTPUT")
                .help("Write to this file instead of stdout"),
        )
        .arg(
            Arg::new("output-config")
                .short('C')
                .long("output-config")
                .value_name("OUTPUT_CONFIG")
                .help("Write the config extracted from the model to this file"),
        )
        .arg(
            Arg::new("transform")
                .short('T')
                .long("transform")
                .value_name("SERVICE")
                .help("Transform the model into another service"),
        )
        .arg(
            Arg::new("replace-config")
                .short('R')
                .long("replace-config")
                .value_name("CONFIG_FILE")
                .help("Replace the config in the model with this file"),
        )
        .arg(
            Arg::new("replace-version")
                .short('Z')
                .long("replace-version")
                .value_name("MAJOR.MINOR.MAINT")
                .help("Replace the Jubatus version in the model header"),
        )
        .arg(
            Arg::new("no-validate")
                .short('f')
                .long("no-validate")
                .action(ArgAction::SetTrue)
                .help("Disable validation of binary model files"),
        )
        .arg(
            Arg::new("fix-header")
                .short('F')
                .long("fix-header")
                .action(ArgAction::SetTrue)
                .help("Recompute CRC32 checksum and section sizes in the header"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::SetTrue)
                .help("Log debug messages to stderr"),
        )
        // Any count is accepted here; parse.rs requires exactly one.
        .arg(
            Arg::new("model_file")
                .value_name("MODEL_FILE")
                .num_args(0..)
                .action(ArgAction::Append)
                .help("Input model file in the format given by --in-format"),
        )
}
