// crates/instance-ami-config/src/examples.rs
// ============================================================================
// Module: Options Examples
// Description: Canonical example options payloads.
// Purpose: Deterministic examples for docs and tooling.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Canonical example for instance AMI build options. Output is deterministic
//! and kept in sync with the schema and docs.

/// Returns a canonical example options file in TOML.
#[must_use]
pub fn options_toml_example() -> String {
    String::from(
        r#"account_id = "0123-4567-8901"
source_ami = "ami-0123456789abcdef0"
instance_type = "m1.small"
region = "us-east-1"
ssh_username = "ec2-user"
s3_bucket = "my-ami-bundles"
# bundle_destination = "/tmp"
# bundle_prefix = "image"
x509_cert_path = "/etc/instance-ami/cert.pem"
x509_key_path = "/etc/instance-ami/pk.pem"
x509_upload_path = "/tmp/x509"
"#,
    )
}
