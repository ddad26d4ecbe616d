// crates/instance-ami-config/src/docs.rs
// ============================================================================
// Module: Options Docs Generator
// Description: Markdown generator for build options documentation.
// Purpose: Keep options docs in sync with schema and validation.
// Dependencies: serde_json, thiserror, std
// ============================================================================

//! ## Overview
//! Generates the options reference from [`options_schema`]. Output is
//! deterministic so the committed copy can be checked for drift.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt::Write;
use std::fs;
use std::path::Path;

use serde_json::Value;
use thiserror::Error;

use crate::options::OptionKey;
use crate::schema::options_schema;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised when generating or verifying options docs.
#[derive(Debug, Error)]
pub enum DocsError {
    /// IO failure while writing docs.
    #[error("docs io error: {0}")]
    Io(String),
    /// Schema traversal or rendering error.
    #[error("docs schema error: {0}")]
    Schema(String),
    /// Generated docs do not match the committed file.
    #[error("docs drift: {0}")]
    Drift(String),
}

// ============================================================================
// SECTION: Public API
// ============================================================================

/// Generates the options markdown documentation.
///
/// # Errors
///
/// Returns [`DocsError`] when schema traversal fails.
pub fn options_docs_markdown() -> Result<String, DocsError> {
    let schema = options_schema();
    let props = schema
        .get("properties")
        .and_then(Value::as_object)
        .ok_or_else(|| DocsError::Schema("schema properties missing".to_string()))?;
    if props.len() != OptionKey::ALL.len() {
        return Err(DocsError::Schema("schema and option keys disagree".to_string()));
    }

    let mut out = String::new();
    out.push_str("# Instance AMI Build Options\n\n");
    out.push_str("Options are supplied as a flat table of string values. Unknown keys and\n");
    out.push_str("non-string values are rejected before any other check runs; all other\n");
    out.push_str("problems are reported together.\n\n");
    out.push_str("| Option | Required | Default | Notes |\n");
    out.push_str("| --- | --- | --- | --- |\n");

    for key in OptionKey::ALL {
        let prop = props
            .get(key.as_str())
            .ok_or_else(|| DocsError::Schema(format!("missing field schema: {key}")))?;
        let required = if key.is_required() { "yes" } else { "no" };
        let default = prop
            .get("default")
            .and_then(Value::as_str)
            .map_or_else(|| "n/a".to_string(), |value| format!("`{value}`"));
        let mut notes = prop.get("description").and_then(Value::as_str).unwrap_or("").to_string();
        if key.requires_local_file() {
            notes.push_str(" Must name a readable local file.");
        }
        let _ = writeln!(out, "| `{key}` | {required} | {default} | {notes} |");
    }
    Ok(out)
}

/// Writes the generated docs to `path`.
///
/// # Errors
///
/// Returns [`DocsError`] when file output fails.
pub fn write_options_docs(path: &Path) -> Result<(), DocsError> {
    let content = options_docs_markdown()?;
    fs::write(path, content.as_bytes()).map_err(|err| DocsError::Io(err.to_string()))
}

/// Verifies the on-disk docs match the generated output.
///
/// # Errors
///
/// Returns [`DocsError::Io`] when `path` cannot be read and
/// [`DocsError::Drift`] when its content differs from the generated docs.
pub fn verify_options_docs(path: &Path) -> Result<(), DocsError> {
    let content = options_docs_markdown()?;
    let existing = fs::read_to_string(path).map_err(|err| DocsError::Io(err.to_string()))?;
    if existing != content {
        return Err(DocsError::Drift(format!("docs mismatch: {}", path.display())));
    }
    Ok(())
}
