//! Output formatting abstraction for text vs JSON rendering
//!
//! Every subcommand writes its result through [`OutputWriter`], which owns
//! the format switch. Command handlers stay free of format-specific logic.

use std::io::Write;

use serde::Serialize;

use crate::cli::OutputFormat;
use crate::error::CliError;

/// Writes CLI output payloads in the user-selected format.
///
/// Payloads implement both `Serialize` (for JSON) and [`Render`] (for text).
pub struct OutputWriter {
    format: OutputFormat,
}

impl OutputWriter {
    /// Create a new output writer with the specified format.
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Render a payload to stdout.
    pub fn render<T: Render + Serialize>(&self, payload: &T) -> Result<(), CliError> {
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        match self.format {
            OutputFormat::Text => {
                payload.render_text(&mut handle)?;
            }
            OutputFormat::Json => {
                serde_json::to_writer_pretty(&mut handle, payload)?;
                writeln!(handle)?;
            }
        }
        Ok(())
    }
}

/// Trait for human-readable text rendering.
///
/// Implemented by every CLI output payload alongside `serde::Serialize`.
pub trait Render {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()>;
}
