//! Output handler traits and types
//!
//! This module defines the trait interface for document renderers and the
//! associated error type.

use crate::output::assembler::CombinedDocument;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output: {0}")]
    Write(String),

    #[error("Failed to format output: {0}")]
    Format(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Trait for document renderers
///
/// A renderer turns an assembled document into the bytes of one output
/// format. Rendering is pure; writing goes through `write_to`.
pub trait OutputHandler {
    /// Short format name used in log messages
    fn name(&self) -> &'static str;

    /// Serializes the document
    fn render(&self, document: &CombinedDocument) -> OutputResult<String>;

    /// Renders the document and writes it to `path`
    ///
    /// Missing parent directories are created. An existing file is replaced.
    fn write_to(&self, document: &CombinedDocument, path: &Path) -> OutputResult<()> {
        let rendered = self.render(document)?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut file = File::create(path)
            .map_err(|e| OutputError::Write(format!("{}: {}", path.display(), e)))?;
        file.write_all(rendered.as_bytes())?;

        tracing::info!(
            "Wrote {} document with {} sections to {}",
            self.name(),
            document.sections.len(),
            path.display()
        );

        Ok(())
    }
}
