// crates/instance-ami-config/src/options.rs
// ============================================================================
// Module: Raw Build Options
// Description: Untyped option mapping, file loading, and strict decoding.
// Purpose: Turn user-supplied key/value input into a typed intermediate record.
// Dependencies: serde, serde_json, toml
// ============================================================================

//! ## Overview
//! [`RawOptions`] is the untyped mapping a plugin host hands to the gate. It
//! can be built in memory or loaded from a TOML/JSON options file. Decoding
//! into the typed intermediate record is strict: any key outside
//! [`OptionKey::ALL`] and any non-string value fails the whole decode.
//!
//! Security posture: option files are untrusted input and are read with hard
//! size and path limits.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::Map;
use serde_json::Value;

use crate::config::ConfigError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum options file size in bytes.
pub(crate) const MAX_OPTIONS_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;

// ============================================================================
// SECTION: Option Keys
// ============================================================================

/// Recognized option keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OptionKey {
    /// AWS account identifier (hyphens are stripped).
    AccountId,
    /// Source AMI the build instance is launched from.
    SourceAmi,
    /// EC2 instance type for the build instance.
    InstanceType,
    /// AWS region for the build.
    Region,
    /// SSH user used to reach the build instance.
    SshUsername,
    /// S3 bucket receiving the bundle.
    S3Bucket,
    /// Directory on the instance where the bundle is written.
    BundleDestination,
    /// File name prefix for bundle parts.
    BundlePrefix,
    /// Local path of the X.509 certificate.
    X509CertPath,
    /// Local path of the X.509 private key.
    X509KeyPath,
    /// Path on the instance where the X.509 material is uploaded.
    X509UploadPath,
}

impl OptionKey {
    /// Every recognized key, in canonical order.
    pub const ALL: [Self; 11] = [
        Self::AccountId,
        Self::SourceAmi,
        Self::InstanceType,
        Self::Region,
        Self::SshUsername,
        Self::S3Bucket,
        Self::BundleDestination,
        Self::BundlePrefix,
        Self::X509CertPath,
        Self::X509KeyPath,
        Self::X509UploadPath,
    ];

    /// Returns the key as it appears in raw options.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AccountId => "account_id",
            Self::SourceAmi => "source_ami",
            Self::InstanceType => "instance_type",
            Self::Region => "region",
            Self::SshUsername => "ssh_username",
            Self::S3Bucket => "s3_bucket",
            Self::BundleDestination => "bundle_destination",
            Self::BundlePrefix => "bundle_prefix",
            Self::X509CertPath => "x509_cert_path",
            Self::X509KeyPath => "x509_key_path",
            Self::X509UploadPath => "x509_upload_path",
        }
    }

    /// Parses a raw key name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.as_str() == name)
    }

    /// Returns the default applied when the option is absent or empty.
    #[must_use]
    pub const fn default_value(self) -> Option<&'static str> {
        match self {
            Self::BundleDestination => Some(crate::config::DEFAULT_BUNDLE_DESTINATION),
            Self::BundlePrefix => Some(crate::config::DEFAULT_BUNDLE_PREFIX),
            _ => None,
        }
    }

    /// Returns true when an empty value is rejected.
    #[must_use]
    pub const fn is_required(self) -> bool {
        self.default_value().is_none()
    }

    /// Returns true when the value must name a readable local file.
    #[must_use]
    pub const fn requires_local_file(self) -> bool {
        matches!(self, Self::X509CertPath | Self::X509KeyPath)
    }

    /// Returns a one-line description for docs and schema output.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::AccountId => "AWS account id; hyphens are removed before use.",
            Self::SourceAmi => "AMI the build instance is launched from.",
            Self::InstanceType => "EC2 instance type for the build instance.",
            Self::Region => "AWS region the build runs in.",
            Self::SshUsername => "SSH username used to connect to the build instance.",
            Self::S3Bucket => "S3 bucket the bundle is uploaded to.",
            Self::BundleDestination => "Directory on the instance where the bundle is written.",
            Self::BundlePrefix => "Prefix for the bundle file names.",
            Self::X509CertPath => "Local path to the X.509 certificate used for bundling.",
            Self::X509KeyPath => "Local path to the X.509 private key used for bundling.",
            Self::X509UploadPath => "Path on the instance where the X.509 files are uploaded.",
        }
    }
}

impl fmt::Display for OptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Raw Options
// ============================================================================

/// Untyped option mapping supplied by the caller.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawOptions {
    /// Key/value entries as received.
    entries: Map<String, Value>,
}

impl RawOptions {
    /// Creates an empty option mapping.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds options from a JSON value, which must be an object.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the value is not an object.
    pub fn from_json_value(value: Value) -> Result<Self, ConfigError> {
        match value {
            Value::Object(entries) => Ok(Self {
                entries,
            }),
            _ => Err(ConfigError::Parse("options must be a table of key/value pairs".to_string())),
        }
    }

    /// Parses options from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the text is not a JSON object.
    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        let value: Value =
            serde_json::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        Self::from_json_value(value)
    }

    /// Parses options from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the text is not valid TOML.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let table: toml::Table =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        let value = serde_json::to_value(table).map_err(|err| ConfigError::Parse(err.to_string()))?;
        Self::from_json_value(value)
    }

    /// Loads options from a file. `.json` files are parsed as JSON, anything
    /// else as TOML.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the path, size, encoding, or syntax is
    /// rejected.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        validate_path(path)?;
        let bytes = fs::read(path).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_OPTIONS_FILE_SIZE {
            return Err(ConfigError::Parse("options file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Parse("options file must be utf-8".to_string()))?;
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json { Self::from_json_str(content) } else { Self::from_toml_str(content) }
    }

    /// Inserts or replaces an entry, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.entries.insert(key.into(), value.into())
    }

    /// Removes an entry, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.entries.remove(key)
    }

    /// Returns the value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when no entries are present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over entry keys.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Decodes the mapping into the strict intermediate record.
    pub(crate) fn decode(&self) -> Result<DecodedOptions, ConfigError> {
        serde_json::from_value(Value::Object(self.entries.clone()))
            .map_err(|err| ConfigError::Decode(err.to_string()))
    }
}

impl FromIterator<(String, Value)> for RawOptions {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

// ============================================================================
// SECTION: Decoded Options
// ============================================================================

/// Strictly decoded options. Absent keys decode to empty strings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct DecodedOptions {
    /// Raw `account_id`.
    #[serde(default)]
    pub account_id: String,
    /// Raw `source_ami`.
    #[serde(default)]
    pub source_ami: String,
    /// Raw `instance_type`.
    #[serde(default)]
    pub instance_type: String,
    /// Raw `region`.
    #[serde(default)]
    pub region: String,
    /// Raw `ssh_username`.
    #[serde(default)]
    pub ssh_username: String,
    /// Raw `s3_bucket`.
    #[serde(default)]
    pub s3_bucket: String,
    /// Raw `bundle_destination`.
    #[serde(default)]
    pub bundle_destination: String,
    /// Raw `bundle_prefix`.
    #[serde(default)]
    pub bundle_prefix: String,
    /// Raw `x509_cert_path`.
    #[serde(default)]
    pub x509_cert_path: String,
    /// Raw `x509_key_path`.
    #[serde(default)]
    pub x509_key_path: String,
    /// Raw `x509_upload_path`.
    #[serde(default)]
    pub x509_upload_path: String,
}

impl DecodedOptions {
    /// Returns the raw value decoded for `key`.
    pub(crate) fn value(&self, key: OptionKey) -> &str {
        match key {
            OptionKey::AccountId => &self.account_id,
            OptionKey::SourceAmi => &self.source_ami,
            OptionKey::InstanceType => &self.instance_type,
            OptionKey::Region => &self.region,
            OptionKey::SshUsername => &self.ssh_username,
            OptionKey::S3Bucket => &self.s3_bucket,
            OptionKey::BundleDestination => &self.bundle_destination,
            OptionKey::BundlePrefix => &self.bundle_prefix,
            OptionKey::X509CertPath => &self.x509_cert_path,
            OptionKey::X509KeyPath => &self.x509_key_path,
            OptionKey::X509UploadPath => &self.x509_upload_path,
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Validates an options file path against security limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Parse("options path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Parse("options path component too long".to_string()));
        }
    }
    Ok(())
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

    use serde_json::json;

    use super::*;

    #[test]
    fn option_key_names_round_trip() {
        for key in OptionKey::ALL {
            assert_eq!(OptionKey::from_name(key.as_str()), Some(key));
        }
        assert_eq!(OptionKey::from_name("i_should_not_be_valid"), None);
    }

    #[test]
    fn only_bundle_keys_have_defaults() {
        let defaulted: Vec<_> =
            OptionKey::ALL.into_iter().filter(|key| !key.is_required()).collect();
        assert_eq!(defaulted, vec![OptionKey::BundleDestination, OptionKey::BundlePrefix]);
    }

    #[test]
    fn from_json_value_rejects_non_object() {
        let err = RawOptions::from_json_value(json!(["account_id"])).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn from_toml_str_reads_string_entries() {
        let raw = RawOptions::from_toml_str("region = \"us-east-1\"\ns3_bucket = \"b\"\n").unwrap();
        assert_eq!(raw.len(), 2);
        assert_eq!(raw.get("region"), Some(&json!("us-east-1")));
    }

    #[test]
    fn collected_entries_can_be_removed_until_empty() {
        let mut raw: RawOptions =
            [("region".to_string(), json!("us-east-1")), ("s3_bucket".to_string(), json!("b"))]
                .into_iter()
                .collect();
        assert!(!raw.is_empty());
        assert_eq!(raw.remove("region"), Some(json!("us-east-1")));
        assert_eq!(raw.remove("region"), None);
        raw.remove("s3_bucket");
        assert!(raw.is_empty());
        assert!(RawOptions::new().is_empty());
    }

    #[test]
    fn decode_rejects_unknown_key() {
        let mut raw = RawOptions::new();
        raw.insert("region", "us-east-1");
        raw.insert("i_should_not_be_valid", true);
        let err = raw.decode().unwrap_err();
        match err {
            ConfigError::Decode(message) => assert!(message.contains("i_should_not_be_valid")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn decode_rejects_non_string_value() {
        let mut raw = RawOptions::new();
        raw.insert("region", 42);
        assert!(matches!(raw.decode(), Err(ConfigError::Decode(_))));
    }

    #[test]
    fn decode_rejects_null_value() {
        let mut raw = RawOptions::new();
        raw.insert("bundle_prefix", Value::Null);
        assert!(matches!(raw.decode(), Err(ConfigError::Decode(_))));
    }

    #[test]
    fn decode_fills_absent_keys_with_empty_strings() {
        let decoded = RawOptions::new().decode().unwrap();
        assert!(decoded.account_id.is_empty());
        assert!(decoded.bundle_destination.is_empty());
    }

    #[test]
    fn validate_path_rejects_long_component() {
        let component = "a".repeat(MAX_PATH_COMPONENT_LENGTH + 1);
        let err = validate_path(Path::new(&component)).unwrap_err();
        assert!(err.to_string().contains("component too long"));
    }
}
