// crates/instance-ami-config/src/schema.rs
// ============================================================================
// Module: Options Schema
// Description: JSON schema builder for instance AMI build options.
// Purpose: Provide a canonical schema for editors and pre-flight tooling.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! The schema mirrors the strict decode: every property is a string, unknown
//! properties are rejected, and the two bundle options carry their defaults.
//! Filesystem reachability and hyphen stripping cannot be expressed here and
//! remain the validator's job.

use serde_json::Map;
use serde_json::Value;
use serde_json::json;

use crate::options::OptionKey;

/// Returns the JSON schema for build options.
#[must_use]
pub fn options_schema() -> Value {
    let mut properties = Map::new();
    for key in OptionKey::ALL {
        properties.insert(key.as_str().to_string(), option_schema(key));
    }
    let required: Vec<&str> =
        OptionKey::ALL.into_iter().filter(|key| key.is_required()).map(OptionKey::as_str).collect();
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "$id": "instance-ami://schemas/options.schema.json",
        "title": "Instance AMI Build Options",
        "description": "Options for building an instance-store backed AMI.",
        "type": "object",
        "properties": properties,
        "required": required,
        "additionalProperties": false
    })
}

/// Returns the schema for a single option.
fn option_schema(key: OptionKey) -> Value {
    let mut schema = json!({
        "type": "string",
        "description": key.description()
    });
    if let Some(default) = key.default_value() {
        schema["default"] = json!(default);
    } else {
        schema["minLength"] = json!(1);
    }
    schema
}
