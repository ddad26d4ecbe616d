// crates/instance-ami-config/src/audit.rs
// ============================================================================
// Module: Validation Audit Logging
// Description: Structured audit events for option validation outcomes.
// Purpose: Emit JSON-line records without a logging framework dependency.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Every pass through [`crate::OptionsValidator`] emits one
//! [`ValidationAuditEvent`]. Events carry field names and counts only;
//! option values (account ids, credential paths) are never logged.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;

use crate::config::CanonicalConfig;
use crate::config::ConfigError;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Validation audit event payload.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Label of the options source (usually a file path) when known.
    pub source: Option<String>,
    /// `accepted`, `rejected`, or `decode_failed`.
    pub outcome: &'static str,
    /// Number of collected field errors.
    pub error_count: usize,
    /// Offending field names in detection order.
    pub fields: Vec<&'static str>,
}

impl ValidationAuditEvent {
    /// Builds an event describing a validation result.
    #[must_use]
    pub fn from_result(
        source: Option<&str>,
        result: &Result<CanonicalConfig, ConfigError>,
    ) -> Self {
        let timestamp_ms =
            SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
        let (outcome, error_count, fields) = match result {
            Ok(_) => ("accepted", 0, Vec::new()),
            Err(ConfigError::Invalid(errors)) => (
                "rejected",
                errors.len(),
                errors.iter().map(|error| error.key.as_str()).collect(),
            ),
            Err(_) => ("decode_failed", 1, Vec::new()),
        };
        Self {
            event: "options_validation",
            timestamp_ms,
            source: source.map(str::to_string),
            outcome,
            error_count,
            fields,
        }
    }
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Audit sink for validation events.
pub trait ValidationAuditSink: Send + Sync {
    /// Record an audit event.
    fn record(&self, event: &ValidationAuditEvent);
}

/// Audit sink that logs JSON lines to stderr.
pub struct StderrAuditSink;

impl ValidationAuditSink for StderrAuditSink {
    fn record(&self, event: &ValidationAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

/// Audit sink that logs JSON lines to a file.
pub struct FileAuditSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FileAuditSink {
    /// Opens the audit log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl ValidationAuditSink for FileAuditSink {
    fn record(&self, event: &ValidationAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

/// No-op audit sink.
pub struct NoopAuditSink;

impl ValidationAuditSink for NoopAuditSink {
    fn record(&self, _event: &ValidationAuditEvent) {}
}

// ============================================================================
// SECTION: Tests
// ============================================================================
