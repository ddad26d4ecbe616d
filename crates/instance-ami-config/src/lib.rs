// crates/instance-ami-config/src/lib.rs
// ============================================================================
// Module: Instance AMI Config Library
// Description: Option decoding, canonical config validation, and artifacts.
// Purpose: Single gate between user options and the instance-store AMI build.
// Dependencies: serde, serde_json, thiserror, toml
// ============================================================================

//! ## Overview
//! `instance-ami-config` turns a loose table of build options into a
//! [`CanonicalConfig`], or reports every problem with the options in one
//! [`ValidationErrors`] value. It performs no network calls; the only I/O is
//! probing the two local X.509 credential files.
//!
//! Security posture: options are untrusted input and validation is a hard
//! gate in front of billable cloud work.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod audit;
pub mod builder;
pub mod config;
pub mod docs;
pub mod examples;
pub mod options;
pub mod probe;
pub mod schema;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit::FileAuditSink;
pub use audit::NoopAuditSink;
pub use audit::StderrAuditSink;
pub use audit::ValidationAuditEvent;
pub use audit::ValidationAuditSink;
pub use builder::InstanceBuilder;
pub use config::*;
pub use docs::DocsError;
pub use docs::options_docs_markdown;
pub use docs::verify_options_docs;
pub use docs::write_options_docs;
pub use examples::options_toml_example;
pub use options::OptionKey;
pub use options::RawOptions;
pub use probe::FileProbe;
pub use probe::OsFileProbe;
pub use schema::options_schema;
