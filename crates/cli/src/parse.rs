//! ArgMatches → ModelCommand conversion.
//!
//! Everything that can be checked without touching the file system is
//! checked here; a failure is a usage error (exit code 1).

use std::path::PathBuf;

use clap::ArgMatches;
use jubakit_model::{EngineVersion, FileFormat};

/// Input format selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InFormat {
    /// Guess from the first byte of the file
    Auto,
    /// A known format
    Fixed(FileFormat),
}

/// Output format selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutFormat {
    Text,
    Binary,
    Json,
}

/// A fully validated `jubamodel` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelCommand {
    pub target: PathBuf,
    pub in_format: InFormat,
    pub out_format: OutFormat,
    pub output: Option<PathBuf>,
    pub output_config: Option<PathBuf>,
    pub transform: Option<String>,
    pub replace_config: Option<PathBuf>,
    pub replace_version: Option<EngineVersion>,
    pub no_validate: bool,
    pub fix_header: bool,
}

fn path_arg(matches: &ArgMatches, name: &str) -> Option<PathBuf> {
    matches.get_one::<String>(name).map(PathBuf::from)
}

/// Convert clap ArgMatches into a ModelCommand.
pub fn matches_to_command(matches: &ArgMatches) -> Result<ModelCommand, String> {
    let files: Vec<&String> = matches
        .get_many::<String>("model_file")
        .map(|v| v.collect())
        .unwrap_or_default();
    let target = match files.as_slice() {
        [] => return Err("no model file specified".to_string()),
        [one] => PathBuf::from(one.as_str()),
        _ => return Err("cannot specify multiple model files at once".to_string()),
    };

    let in_format = match matches.get_one::<String>("in-format").map(String::as_str) {
        Some("binary") => InFormat::Fixed(FileFormat::Binary),
        Some("json") => InFormat::Fixed(FileFormat::Json),
        _ => InFormat::Auto,
    };
    let out_format = match matches.get_one::<String>("out-format").map(String::as_str) {
        Some("binary") => OutFormat::Binary,
        Some("json") => OutFormat::Json,
        _ => OutFormat::Text,
    };

    let output = path_arg(matches, "output");
    if out_format == OutFormat::Binary && output.is_none() {
        return Err("--output must be specified to output in binary format".to_string());
    }

    let replace_version = matches
        .get_one::<String>("replace-version")
        .map(|s| {
            s.parse::<EngineVersion>()
                .map_err(|_| format!("invalid version {:?}: expected MAJOR.MINOR.MAINT", s))
        })
        .transpose()?;

    Ok(ModelCommand {
        target,
        in_format,
        out_format,
        output,
        output_config: path_arg(matches, "output-config"),
        transform: matches.get_one::<String>("transform").cloned(),
        replace_config: path_arg(matches, "replace-config"),
        replace_version,
        no_validate: matches.get_flag("no-validate"),
        fix_header: matches.get_flag("fix-header"),
    })
}
