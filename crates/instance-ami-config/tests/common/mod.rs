// crates/instance-ami-config/tests/common/mod.rs
// =============================================================================
// Module: Options Test Helpers
// Description: Shared fixtures for options validation tests.
// Purpose: Provide a valid option set backed by real credential files.
// =============================================================================

#![allow(dead_code, reason = "Test helpers are selectively used across suites.")]

use instance_ami_config::RawOptions;
use tempfile::NamedTempFile;

/// Valid options plus the temp file backing both credential paths.
pub struct Fixture {
    /// Options that pass validation as long as `credential` lives.
    pub options: RawOptions,
    /// Temp file used for both `x509_cert_path` and `x509_key_path`.
    pub credential: NamedTempFile,
}

/// Returns a fixture with every required option set.
pub fn fixture() -> Result<Fixture, String> {
    let credential = NamedTempFile::new().map_err(|err| err.to_string())?;
    let path = credential.path().display().to_string();
    let mut options = RawOptions::new();
    options.insert("account_id", "foo");
    options.insert("instance_type", "m1.small");
    options.insert("region", "us-east-1");
    options.insert("s3_bucket", "foo");
    options.insert("source_ami", "foo");
    options.insert("ssh_username", "bob");
    options.insert("x509_cert_path", path.clone());
    options.insert("x509_key_path", path);
    options.insert("x509_upload_path", "/foo");
    Ok(Fixture {
        options,
        credential,
    })
}
