// crates/instance-ami-config/src/config.rs
// ============================================================================
// Module: Instance AMI Configuration
// Description: Canonical build configuration and the validation gate.
// Purpose: Reject unusable options before any billable cloud work starts.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! Validation runs in a single pass over strictly decoded options:
//! defaults are substituted, the account id is normalized, every required
//! field is checked, and both credential files are probed. Field problems
//! are accumulated into one [`ValidationErrors`] value so a caller sees every
//! issue at once. Only a decode failure (unknown key, non-string value)
//! short-circuits.
//!
//! Security posture: options are untrusted; a failed validation must stop
//! the build before an instance is launched.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use crate::audit::NoopAuditSink;
use crate::audit::ValidationAuditEvent;
use crate::audit::ValidationAuditSink;
use crate::options::OptionKey;
use crate::options::RawOptions;
use crate::probe::FileProbe;
use crate::probe::OsFileProbe;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Bundle destination used when none is supplied.
pub const DEFAULT_BUNDLE_DESTINATION: &str = "/tmp";
/// Bundle prefix used when none is supplied.
pub const DEFAULT_BUNDLE_PREFIX: &str = "image";

// ============================================================================
// SECTION: Canonical Configuration
// ============================================================================

/// Validated, defaulted build configuration.
///
/// Only produced by a successful validation; fields are read-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CanonicalConfig {
    /// Account id with hyphens removed.
    account_id: String,
    /// Source AMI identifier.
    source_ami: String,
    /// Instance type.
    instance_type: String,
    /// Region.
    region: String,
    /// SSH username.
    ssh_username: String,
    /// Destination bucket.
    s3_bucket: String,
    /// Bundle directory on the instance.
    bundle_destination: String,
    /// Bundle file prefix.
    bundle_prefix: String,
    /// Local certificate path.
    x509_cert_path: String,
    /// Local private key path.
    x509_key_path: String,
    /// Upload path on the instance.
    x509_upload_path: String,
}

impl CanonicalConfig {
    /// Account id with hyphens removed.
    #[must_use]
    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    /// Source AMI identifier.
    #[must_use]
    pub fn source_ami(&self) -> &str {
        &self.source_ami
    }

    /// Instance type.
    #[must_use]
    pub fn instance_type(&self) -> &str {
        &self.instance_type
    }

    /// Region.
    #[must_use]
    pub fn region(&self) -> &str {
        &self.region
    }

    /// SSH username.
    #[must_use]
    pub fn ssh_username(&self) -> &str {
        &self.ssh_username
    }

    /// Destination bucket.
    #[must_use]
    pub fn s3_bucket(&self) -> &str {
        &self.s3_bucket
    }

    /// Bundle directory on the instance.
    #[must_use]
    pub fn bundle_destination(&self) -> &str {
        &self.bundle_destination
    }

    /// Bundle file prefix.
    #[must_use]
    pub fn bundle_prefix(&self) -> &str {
        &self.bundle_prefix
    }

    /// Local certificate path.
    #[must_use]
    pub fn x509_cert_path(&self) -> &Path {
        Path::new(&self.x509_cert_path)
    }

    /// Local private key path.
    #[must_use]
    pub fn x509_key_path(&self) -> &Path {
        Path::new(&self.x509_key_path)
    }

    /// Upload path on the instance.
    #[must_use]
    pub fn x509_upload_path(&self) -> &str {
        &self.x509_upload_path
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Problem found with a single option.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldIssue {
    /// Required value is absent or empty.
    #[error("must be set")]
    Missing,
    /// Credential path does not exist.
    #[error("file not found: {path}")]
    NotFound {
        /// Path that was probed.
        path: String,
    },
    /// Credential path exists but is not a regular file.
    #[error("not a regular file: {path}")]
    NotAFile {
        /// Path that was probed.
        path: String,
    },
    /// Credential path could not be inspected or opened.
    #[error("cannot read {path}: {reason}")]
    Unreadable {
        /// Path that was probed.
        path: String,
        /// Underlying I/O failure.
        reason: String,
    },
}

/// Issue attached to the option it concerns.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{key}: {issue}")]
pub struct FieldError {
    /// Offending option.
    pub key: OptionKey,
    /// What is wrong with it.
    pub issue: FieldIssue,
}

impl FieldError {
    /// Creates a field error.
    #[must_use]
    pub const fn new(key: OptionKey, issue: FieldIssue) -> Self {
        Self {
            key,
            issue,
        }
    }
}

/// Ordered collection of every field problem found in one validation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    /// Collected errors in detection order.
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    /// Appends an error.
    fn push(&mut self, error: FieldError) {
        self.errors.push(error);
    }

    /// Returns the number of errors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Returns true when nothing was collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Iterates over errors in detection order.
    pub fn iter(&self) -> std::slice::Iter<'_, FieldError> {
        self.errors.iter()
    }

    /// Returns true when any error concerns `key`.
    #[must_use]
    pub fn contains_key(&self, key: OptionKey) -> bool {
        self.errors.iter().any(|error| error.key == key)
    }

    /// Returns the offending keys in detection order (repeats possible).
    #[must_use]
    pub fn keys(&self) -> Vec<OptionKey> {
        self.errors.iter().map(|error| error.key).collect()
    }

    /// Consumes the collection into its errors.
    #[must_use]
    pub fn into_vec(self) -> Vec<FieldError> {
        self.errors
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let noun = if self.errors.len() == 1 { "error" } else { "errors" };
        write!(f, "{} option {noun}:", self.errors.len())?;
        for error in &self.errors {
            write!(f, "\n* {error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

impl<'a> IntoIterator for &'a ValidationErrors {
    type Item = &'a FieldError;
    type IntoIter = std::slice::Iter<'a, FieldError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

/// Options loading and validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// I/O failure while reading an options file.
    #[error("options io error: {0}")]
    Io(String),
    /// Options file could not be parsed.
    #[error("options parse error: {0}")]
    Parse(String),
    /// Options have an unknown key or a value of the wrong type.
    #[error("invalid options: {0}")]
    Decode(String),
    /// One or more fields failed validation.
    #[error("{0}")]
    Invalid(ValidationErrors),
}

impl ConfigError {
    /// Returns the collected field errors for [`ConfigError::Invalid`].
    #[must_use]
    pub const fn validation_errors(&self) -> Option<&ValidationErrors> {
        match self {
            Self::Invalid(errors) => Some(errors),
            _ => None,
        }
    }
}

// ============================================================================
// SECTION: Validation
// ============================================================================

/// Validates raw options against the local filesystem.
///
/// # Errors
///
/// Returns [`ConfigError::Decode`] for unknown keys or non-string values, and
/// [`ConfigError::Invalid`] with every field problem otherwise.
pub fn validate(raw: &RawOptions) -> Result<CanonicalConfig, ConfigError> {
    validate_with_probe(raw, &OsFileProbe)
}

/// Validates raw options using `probe` for credential file checks.
///
/// # Errors
///
/// Returns [`ConfigError::Decode`] for unknown keys or non-string values, and
/// [`ConfigError::Invalid`] with every field problem otherwise.
pub fn validate_with_probe(
    raw: &RawOptions,
    probe: &dyn FileProbe,
) -> Result<CanonicalConfig, ConfigError> {
    let decoded = raw.decode()?;

    let bundle_destination = or_default(decoded.bundle_destination.clone(), DEFAULT_BUNDLE_DESTINATION);
    let bundle_prefix = or_default(decoded.bundle_prefix.clone(), DEFAULT_BUNDLE_PREFIX);
    let account_id = strip_hyphens(&decoded.account_id);

    let mut errors = ValidationErrors::default();
    let required = [
        (OptionKey::AccountId, account_id.as_str()),
        (OptionKey::SourceAmi, decoded.source_ami.as_str()),
        (OptionKey::InstanceType, decoded.instance_type.as_str()),
        (OptionKey::Region, decoded.region.as_str()),
        (OptionKey::SshUsername, decoded.ssh_username.as_str()),
        (OptionKey::S3Bucket, decoded.s3_bucket.as_str()),
        (OptionKey::X509CertPath, decoded.x509_cert_path.as_str()),
        (OptionKey::X509KeyPath, decoded.x509_key_path.as_str()),
        (OptionKey::X509UploadPath, decoded.x509_upload_path.as_str()),
    ];
    for (key, value) in required {
        if value.is_empty() {
            errors.push(FieldError::new(key, FieldIssue::Missing));
        }
    }

    for key in OptionKey::ALL.into_iter().filter(|key| key.requires_local_file()) {
        let path = decoded.value(key);
        if path.is_empty() {
            continue;
        }
        if let Err(issue) = probe.check_file(Path::new(path)) {
            errors.push(FieldError::new(key, issue));
        }
    }

    if !errors.is_empty() {
        return Err(ConfigError::Invalid(errors));
    }

    Ok(CanonicalConfig {
        account_id,
        source_ami: decoded.source_ami,
        instance_type: decoded.instance_type,
        region: decoded.region,
        ssh_username: decoded.ssh_username,
        s3_bucket: decoded.s3_bucket,
        bundle_destination,
        bundle_prefix,
        x509_cert_path: decoded.x509_cert_path,
        x509_key_path: decoded.x509_key_path,
        x509_upload_path: decoded.x509_upload_path,
    })
}

/// Removes every hyphen from an account id.
#[must_use]
pub fn strip_hyphens(account_id: &str) -> String {
    account_id.chars().filter(|ch| *ch != '-').collect()
}

/// Substitutes `default` for an empty value.
fn or_default(value: String, default: &str) -> String {
    if value.is_empty() { default.to_string() } else { value }
}

// ============================================================================
// SECTION: Validator
// ============================================================================

/// Validation gate with an injectable file probe and audit sink.
pub struct OptionsValidator {
    /// Credential file probe.
    probe: Box<dyn FileProbe>,
    /// Sink receiving one event per validation.
    audit: Arc<dyn ValidationAuditSink>,
}

impl OptionsValidator {
    /// Creates a validator using the local filesystem and no audit output.
    #[must_use]
    pub fn new() -> Self {
        Self {
            probe: Box::new(OsFileProbe),
            audit: Arc::new(NoopAuditSink),
        }
    }

    /// Replaces the credential file probe.
    #[must_use]
    pub fn with_probe(mut self, probe: impl FileProbe + 'static) -> Self {
        self.probe = Box::new(probe);
        self
    }

    /// Replaces the audit sink.
    #[must_use]
    pub fn with_audit_sink(mut self, audit: Arc<dyn ValidationAuditSink>) -> Self {
        self.audit = audit;
        self
    }

    /// Validates options and records the outcome.
    ///
    /// # Errors
    ///
    /// See [`validate_with_probe`].
    pub fn validate(&self, raw: &RawOptions) -> Result<CanonicalConfig, ConfigError> {
        self.validate_from(raw, None)
    }

    /// Validates options loaded from `source` and records the outcome.
    ///
    /// # Errors
    ///
    /// See [`validate_with_probe`].
    pub fn validate_from(
        &self,
        raw: &RawOptions,
        source: Option<&str>,
    ) -> Result<CanonicalConfig, ConfigError> {
        let result = validate_with_probe(raw, self.probe.as_ref());
        self.audit.record(&ValidationAuditEvent::from_result(source, &result));
        result
    }
}

impl Default for OptionsValidator {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test fixtures use explicit asserts and unwraps for clarity."
    )]

    use std::collections::BTreeSet;
    use std::sync::Mutex;

    use super::*;

    /// Probe that treats a fixed set of paths as readable files.
    struct FakeProbe {
        /// Paths reported as readable.
        existing: BTreeSet<String>,
    }

    impl FakeProbe {
        fn with(paths: &[&str]) -> Self {
            Self {
                existing: paths.iter().map(|path| (*path).to_string()).collect(),
            }
        }
    }

    impl FileProbe for FakeProbe {
        fn check_file(&self, path: &Path) -> Result<(), FieldIssue> {
            let label = path.display().to_string();
            if self.existing.contains(&label) {
                Ok(())
            } else {
                Err(FieldIssue::NotFound {
                    path: label,
                })
            }
        }
    }

    /// Sink capturing events in memory.
    #[derive(Default)]
    struct CaptureSink {
        /// Recorded events.
        events: Mutex<Vec<ValidationAuditEvent>>,
    }

    impl ValidationAuditSink for CaptureSink {
        fn record(&self, event: &ValidationAuditEvent) {
            self.events.lock().unwrap().push(event.clone());
        }
    }

    fn valid_options() -> RawOptions {
        let mut raw = RawOptions::new();
        raw.insert("account_id", "foo");
        raw.insert("instance_type", "m1.small");
        raw.insert("region", "us-east-1");
        raw.insert("s3_bucket", "foo");
        raw.insert("source_ami", "foo");
        raw.insert("ssh_username", "bob");
        raw.insert("x509_cert_path", "/creds/cert.pem");
        raw.insert("x509_key_path", "/creds/key.pem");
        raw.insert("x509_upload_path", "/foo");
        raw
    }

    fn probe() -> FakeProbe {
        FakeProbe::with(&["/creds/cert.pem", "/creds/key.pem"])
    }

    #[test]
    fn valid_options_produce_defaults() {
        let config = validate_with_probe(&valid_options(), &probe()).unwrap();
        assert_eq!(config.bundle_destination(), "/tmp");
        assert_eq!(config.bundle_prefix(), "image");
        assert_eq!(config.x509_upload_path(), "/foo");
    }

    #[test]
    fn explicit_bundle_values_are_kept() {
        let mut raw = valid_options();
        raw.insert("bundle_destination", "/mnt");
        raw.insert("bundle_prefix", "web");
        let config = validate_with_probe(&raw, &probe()).unwrap();
        assert_eq!(config.bundle_destination(), "/mnt");
        assert_eq!(config.bundle_prefix(), "web");
    }

    #[test]
    fn hyphen_only_account_id_is_missing() {
        let mut raw = valid_options();
        raw.insert("account_id", "---");
        let err = validate_with_probe(&raw, &probe()).unwrap_err();
        let errors = err.validation_errors().unwrap();
        assert_eq!(errors.keys(), vec![OptionKey::AccountId]);
        assert_eq!(errors.iter().next().unwrap().issue, FieldIssue::Missing);
    }

    #[test]
    fn empty_options_report_every_required_field() {
        let err = validate_with_probe(&RawOptions::new(), &probe()).unwrap_err();
        let errors = err.validation_errors().unwrap();
        let expected: Vec<_> =
            OptionKey::ALL.into_iter().filter(|key| key.is_required()).collect();
        assert_eq!(errors.keys(), expected);
    }

    #[test]
    fn missing_credential_path_is_not_probed() {
        let mut raw = valid_options();
        raw.insert("x509_cert_path", "");
        let err = validate_with_probe(&raw, &probe()).unwrap_err();
        let errors = err.validation_errors().unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.iter().next().unwrap().issue, FieldIssue::Missing);
    }

    #[test]
    fn cert_and_key_failures_are_reported_independently() {
        let err = validate_with_probe(&valid_options(), &FakeProbe::with(&[])).unwrap_err();
        let errors = err.validation_errors().unwrap();
        assert_eq!(errors.keys(), vec![OptionKey::X509CertPath, OptionKey::X509KeyPath]);
    }

    #[test]
    fn presence_errors_precede_file_errors() {
        let mut raw = valid_options();
        raw.insert("s3_bucket", "");
        let err = validate_with_probe(&raw, &FakeProbe::with(&["/creds/cert.pem"])).unwrap_err();
        let errors = err.validation_errors().unwrap();
        assert_eq!(errors.keys(), vec![OptionKey::S3Bucket, OptionKey::X509KeyPath]);
    }

    #[test]
    fn upload_path_is_never_probed() {
        let mut raw = valid_options();
        raw.insert("x509_upload_path", "/definitely/not/on/this/host");
        assert!(validate_with_probe(&raw, &probe()).is_ok());
    }

    #[test]
    fn unknown_key_short_circuits_field_checks() {
        let mut raw = RawOptions::new();
        raw.insert("i_should_not_be_valid", true);
        let err = validate_with_probe(&raw, &probe()).unwrap_err();
        assert!(matches!(err, ConfigError::Decode(_)));
    }

    #[test]
    fn validation_does_not_mutate_input() {
        let mut raw = valid_options();
        raw.insert("account_id", "0123-0456-7890");
        let before = raw.clone();
        let _ = validate_with_probe(&raw, &probe());
        assert_eq!(raw, before);
    }

    #[test]
    fn credential_issues_keep_the_probed_path() {
        let mut raw = valid_options();
        raw.insert("x509_cert_path", "/nowhere/cert.pem");
        raw.insert("x509_key_path", "/nowhere/key.pem");
        let Err(ConfigError::Invalid(errors)) = validate_with_probe(&raw, &probe()) else {
            panic!("expected field errors");
        };
        let issues: Vec<_> =
            errors.into_vec().into_iter().map(|error| (error.key, error.issue)).collect();
        assert_eq!(
            issues,
            vec![
                (OptionKey::X509CertPath, FieldIssue::NotFound {
                    path: "/nowhere/cert.pem".to_string(),
                }),
                (OptionKey::X509KeyPath, FieldIssue::NotFound {
                    path: "/nowhere/key.pem".to_string(),
                }),
            ]
        );
    }

    #[test]
    fn display_lists_every_error() {
        let err = validate_with_probe(&RawOptions::new(), &probe()).unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with("9 option errors:"));
        assert!(message.contains("* account_id: must be set"));
        assert!(message.contains("* x509_upload_path: must be set"));
    }

    #[test]
    fn validator_records_one_event_per_call() {
        let sink = Arc::new(CaptureSink::default());
        let validator = OptionsValidator::new().with_probe(probe()).with_audit_sink(sink.clone());
        validator.validate(&valid_options()).unwrap();
        let _ = validator.validate_from(&RawOptions::new(), Some("build.toml"));
        let events = sink.events.lock().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].outcome, "accepted");
        assert_eq!(events[1].outcome, "rejected");
        assert_eq!(events[1].source.as_deref(), Some("build.toml"));
        assert_eq!(events[1].error_count, 9);
    }
}
