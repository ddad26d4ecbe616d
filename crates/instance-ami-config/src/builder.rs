// crates/instance-ami-config/src/builder.rs
// ============================================================================
// Module: Instance Builder Prepare Step
// Description: Plugin-host facing prepare step for instance-store AMI builds.
// Purpose: Gate the build pipeline on a successful options validation.
// Dependencies: crate::config
// ============================================================================

//! ## Overview
//! [`InstanceBuilder::prepare`] is the first thing a plugin host calls. It
//! validates the raw options and keeps the canonical config for the later
//! launch/bundle/upload/register steps. A failed prepare clears any config
//! held from an earlier call, so the pipeline never runs on stale input.

use crate::config::CanonicalConfig;
use crate::config::ConfigError;
use crate::config::OptionsValidator;
use crate::options::RawOptions;
use crate::probe::FileProbe;

/// Prepare step for an instance-store AMI build.
#[derive(Default)]
pub struct InstanceBuilder {
    /// Validation gate.
    validator: OptionsValidator,
    /// Config from the last successful prepare.
    config: Option<CanonicalConfig>,
}

impl InstanceBuilder {
    /// Creates a builder backed by the local filesystem.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder using a customized validator.
    #[must_use]
    pub const fn with_validator(validator: OptionsValidator) -> Self {
        Self {
            validator,
            config: None,
        }
    }

    /// Replaces the credential file probe used by the validator.
    #[must_use]
    pub fn with_probe(mut self, probe: impl FileProbe + 'static) -> Self {
        self.validator = self.validator.with_probe(probe);
        self
    }

    /// Validates `raw` and stores the canonical config.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when validation fails; no config is retained.
    pub fn prepare(&mut self, raw: &RawOptions) -> Result<(), ConfigError> {
        self.config = None;
        self.config = Some(self.validator.validate(raw)?);
        Ok(())
    }

    /// Returns the prepared config, if the last prepare succeeded.
    #[must_use]
    pub const fn config(&self) -> Option<&CanonicalConfig> {
        self.config.as_ref()
    }

    /// Consumes the builder, yielding the prepared config.
    #[must_use]
    pub fn into_config(self) -> Option<CanonicalConfig> {
        self.config
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

    use std::path::Path;
    use std::sync::Arc;
    use std::sync::Mutex;

    use super::*;
    use crate::audit::ValidationAuditEvent;
    use crate::audit::ValidationAuditSink;
    use crate::config::FieldIssue;
    use crate::options::OptionKey;

    /// Probe that accepts every path under `/creds/`.
    struct CredsProbe;

    impl FileProbe for CredsProbe {
        fn check_file(&self, path: &Path) -> Result<(), FieldIssue> {
            if path.starts_with("/creds") {
                Ok(())
            } else {
                Err(FieldIssue::NotFound {
                    path: path.display().to_string(),
                })
            }
        }
    }

    /// Sink counting recorded events.
    #[derive(Default)]
    struct CountingSink {
        /// Outcomes in recording order.
        outcomes: Mutex<Vec<&'static str>>,
    }

    impl ValidationAuditSink for CountingSink {
        fn record(&self, event: &ValidationAuditEvent) {
            self.outcomes.lock().unwrap().push(event.outcome);
        }
    }

    fn options() -> RawOptions {
        [
            ("account_id", "1111-2222-3333"),
            ("instance_type", "m1.small"),
            ("region", "us-east-1"),
            ("s3_bucket", "bucket"),
            ("source_ami", "ami-1234"),
            ("ssh_username", "bob"),
            ("x509_cert_path", "/creds/cert.pem"),
            ("x509_key_path", "/creds/key.pem"),
            ("x509_upload_path", "/upload"),
        ]
        .into_iter()
        .map(|(key, value)| (key.to_string(), serde_json::Value::from(value)))
        .collect()
    }

    #[test]
    fn prepare_with_injected_probe_needs_no_real_files() {
        let mut builder = InstanceBuilder::new().with_probe(CredsProbe);
        builder.prepare(&options()).unwrap();
        let config = builder.config().unwrap();
        assert_eq!(config.account_id(), "111122223333");
        assert_eq!(config.x509_key_path(), Path::new("/creds/key.pem"));
        assert_eq!(builder.into_config().unwrap().bundle_prefix(), "image");
    }

    #[test]
    fn injected_probe_failures_are_reported() {
        let mut raw = options();
        raw.insert("x509_key_path", "/elsewhere/key.pem");
        raw.remove("s3_bucket");
        let mut builder = InstanceBuilder::new().with_probe(CredsProbe);
        let err = builder.prepare(&raw).unwrap_err();
        let errors = err.validation_errors().unwrap();
        assert_eq!(errors.keys(), vec![OptionKey::S3Bucket, OptionKey::X509KeyPath]);
        assert!(builder.into_config().is_none());
    }

    #[test]
    fn failed_prepare_discards_earlier_config() {
        let mut builder = InstanceBuilder::new().with_probe(CredsProbe);
        builder.prepare(&options()).unwrap();
        let mut raw = options();
        raw.remove("region");
        assert!(builder.prepare(&raw).is_err());
        assert!(builder.config().is_none());
    }

    #[test]
    fn custom_validator_receives_every_prepare() {
        let sink = Arc::new(CountingSink::default());
        let validator =
            OptionsValidator::new().with_probe(CredsProbe).with_audit_sink(sink.clone());
        let mut builder = InstanceBuilder::with_validator(validator);
        builder.prepare(&options()).unwrap();
        let _ = builder.prepare(&RawOptions::new());
        assert_eq!(*sink.outcomes.lock().unwrap(), vec!["accepted", "rejected"]);
    }
}
