use std::io::Write;

use reglet_types::ExecutionResult;

use crate::{FormatError, FormatOptions, Formatter};

/// Canonical JSON encoding; indented output uses a 2-space indent (the
/// `serde_json` pretty-printer's default), compact output is one line.
pub struct JsonFormatter {
    indent: bool,
}

impl JsonFormatter {
    pub fn new(options: FormatOptions) -> Self {
        Self { indent: options.indent }
    }
}

impl Formatter for JsonFormatter {
    fn format(&self, result: &ExecutionResult, writer: &mut dyn Write) -> Result<(), FormatError> {
        if self.indent {
            serde_json::to_writer_pretty(&mut *writer, result)?;
        } else {
            serde_json::to_writer(&mut *writer, result)?;
        }
        writeln!(writer)?;
        Ok(())
    }
}
