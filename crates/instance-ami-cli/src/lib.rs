// crates/instance-ami-cli/src/lib.rs
// ============================================================================
// Module: Instance AMI CLI Library
// Description: Shared helpers for the instance-ami command-line interface.
// Purpose: Provide reusable components (message catalog) for the binary.
// Dependencies: Standard library.
// ============================================================================

//! ## Overview
//! Houses the message catalog used by the `instance-ami` binary so every
//! user-facing line is defined in one place.

// ============================================================================
// SECTION: Modules
// ============================================================================

/// Message catalog helpers.
pub mod i18n;
