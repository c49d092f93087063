//! Human-readable text dump. Write-only; there is no text loader.

use crate::error::ModelResult;
use crate::model::Model;
use std::io::Write;

const RULE: &str = "------------------------------------------";

/// Width of the key column.
pub const KEY_WIDTH: usize = 24;

impl Model {
    /// Write the model as three headed `key: value` tables.
    pub fn dump_text<W: Write>(&self, w: &mut W) -> ModelResult<()> {
        let sections = [
            ("Meta Data", self.header.fields()),
            ("System Data", self.system.fields()),
            ("User Data", self.user.fields()),
        ];
        for (heading, rows) in sections {
            writeln!(w, "{}", RULE)?;
            writeln!(w, "{}", heading)?;
            writeln!(w, "{}", RULE)?;
            for (key, value) in rows {
                writeln!(w, "{:<width$}{}", format!("{}:", key), value, width = KEY_WIDTH)?;
            }
            writeln!(w)?;
        }
        Ok(())
    }
}
