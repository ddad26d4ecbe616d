// crates/instance-ami-config/src/probe.rs
// ============================================================================
// Module: Credential File Probe
// Description: Local filesystem reachability checks for credential paths.
// Purpose: Keep filesystem I/O behind a seam so validation stays testable.
// Dependencies: std
// ============================================================================

//! ## Overview
//! The gate needs exactly one piece of I/O: confirming that the X.509
//! certificate and key paths name regular, readable files. [`FileProbe`] is
//! the capability; [`OsFileProbe`] is the real implementation. Errors are
//! never retried.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::fs::File;
use std::io::ErrorKind;
use std::path::Path;

use crate::config::FieldIssue;

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Capability to test whether a readable regular file exists at a path.
pub trait FileProbe: Send + Sync {
    /// Returns `Ok(())` when `path` names a readable regular file.
    ///
    /// # Errors
    ///
    /// Returns the [`FieldIssue`] describing why the file is unusable.
    fn check_file(&self, path: &Path) -> Result<(), FieldIssue>;
}

// ============================================================================
// SECTION: Implementations
// ============================================================================

/// Probe backed by the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFileProbe;

impl FileProbe for OsFileProbe {
    fn check_file(&self, path: &Path) -> Result<(), FieldIssue> {
        let label = path.display().to_string();
        let metadata = match fs::metadata(path) {
            Ok(metadata) => metadata,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(FieldIssue::NotFound {
                    path: label,
                });
            }
            Err(err) => {
                return Err(FieldIssue::Unreadable {
                    path: label,
                    reason: err.to_string(),
                });
            }
        };
        if !metadata.is_file() {
            return Err(FieldIssue::NotAFile {
                path: label,
            });
        }
        File::open(path).map(|_| ()).map_err(|err| FieldIssue::Unreadable {
            path: label,
            reason: err.to_string(),
        })
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
