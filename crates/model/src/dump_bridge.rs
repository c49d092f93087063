//! High-level model dump through the external `jubadump` program.
//!
//! `jubadump` understands the engine-private payload of each service and
//! prints it as JSON. This crate never interprets that payload itself, so the
//! bridge simply runs the program and parses its standard output.

use crate::error::{ModelError, ModelResult};
use crate::model::Model;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Program name looked up on `PATH` by default.
pub const DEFAULT_PROGRAM: &str = "jubadump";

/// Runs `jubadump` on model files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpBridge {
    program: PathBuf,
}

impl Default for DumpBridge {
    fn default() -> Self {
        DumpBridge {
            program: PathBuf::from(DEFAULT_PROGRAM),
        }
    }
}

impl DumpBridge {
    /// Bridge that runs `program` instead of `jubadump`.
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        DumpBridge {
            program: program.into(),
        }
    }

    /// Program this bridge runs.
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Dump the binary model file at `path`.
    ///
    /// A program that cannot be started is [`ModelError::Io`]; a non-zero
    /// exit is [`ModelError::InvalidFormat`] carrying its standard error.
    pub fn dump_file(&self, path: &Path) -> ModelResult<serde_json::Value> {
        tracing::debug!(program = %self.program.display(), path = %path.display(), "running dump program");
        let output = Command::new(&self.program).arg("-i").arg(path).output()?;

        if !output.status.success() {
            let status = output
                .status
                .code()
                .map_or_else(|| "signal".to_string(), |c| c.to_string());
            return Err(ModelError::InvalidFormat(format!(
                "{} (exit with status {})",
                String::from_utf8_lossy(&output.stderr).trim_end(),
                status
            )));
        }
        Ok(serde_json::from_slice(&output.stdout)?)
    }

    /// Dump binary model bytes by way of a temporary file.
    pub fn dump(&self, data: &[u8]) -> ModelResult<serde_json::Value> {
        let mut file = tempfile::Builder::new()
            .prefix("jubakit-jubadump-")
            .tempfile()?;
        file.write_all(data)?;
        file.flush()?;
        self.dump_file(file.path())
    }

    /// Dump an in-memory model in its current binary form.
    pub fn dump_model(&self, model: &Model) -> ModelResult<serde_json::Value> {
        let mut data = Vec::new();
        model.dump_binary(&mut data)?;
        self.dump(&data)
    }
}
