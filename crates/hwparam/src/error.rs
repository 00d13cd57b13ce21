// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error types for hwparam.
//!
//! Every fallible operation returns a [`Result`]; the `Display` text of the
//! error is the human-readable message surfaced to the administrator.
//! Hardware errors live in [`crate::subsystem`], settings file errors in
//! [`crate::settings`] and configuration file errors in [`crate::config`].

use crate::settings::SettingsError;
use crate::subsystem::SyncFailure;
use thiserror::Error;

/// Result type for hwparam operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Crate-level error.
#[derive(Debug, Error)]
pub enum Error {
    // ========================================================================
    // Not-found errors
    // ========================================================================
    #[error("Configurable domain {0} not found")]
    DomainNotFound(String),

    #[error("Configuration {configuration} not found in domain {domain}")]
    ConfigurationNotFound {
        domain: String,
        configuration: String,
    },

    #[error("Configurable element {0} not found")]
    ElementNotFound(String),

    // ========================================================================
    // Naming errors
    // ========================================================================
    #[error("Already existing configurable domain {0}")]
    DomainAlreadyExists(String),

    #[error("Already existing configuration {configuration} in domain {domain}")]
    ConfigurationAlreadyExists {
        domain: String,
        configuration: String,
    },

    // ========================================================================
    // Element association errors
    // ========================================================================
    #[error("Configurable element {element} already associated to domain {domain}")]
    ElementAlreadyOwned { domain: String, element: String },

    #[error(
        "Configurable element {element} already associated to domain {domain} through ancestor {ancestor}"
    )]
    ElementOwnedThroughAncestor {
        domain: String,
        element: String,
        ancestor: String,
    },

    #[error("Configurable element {element} not associated to domain {domain}")]
    ElementNotOwned { domain: String, element: String },

    #[error("Configurable element {0} has no children to split into")]
    NothingToSplit(String),

    // ========================================================================
    // Guard errors
    // ========================================================================
    #[error(
        "Deletion of domain {0} containing configurations with application rules is not supported to prevent any accidental loss of data. Please consider a direct modification of the XML file."
    )]
    DomainHasRules(String),

    #[error("Configurable element {0} is not a parameter")]
    NotAParameter(String),

    // ========================================================================
    // Wrapped errors
    // ========================================================================
    #[error(transparent)]
    Value(#[from] ValueError),

    #[error(transparent)]
    Structure(#[from] StructureError),

    #[error(transparent)]
    Blackboard(#[from] crate::blackboard::OutOfBounds),

    #[error(transparent)]
    Sync(#[from] SyncFailure),

    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),
}

/// Per-value format and range errors raised by the parameter codecs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    /// The textual value could not be parsed in the active value space.
    #[error("{0}")]
    InvalidFormat(String),

    /// The value parsed but does not fit the admissible range.
    #[error("{0}")]
    OutOfRange(String),

    /// The parameter kind has no conversion for that native value kind.
    #[error("{value_kind} values are not supported by {kind}")]
    Unsupported {
        kind: &'static str,
        value_kind: &'static str,
    },
}

impl ValueError {
    pub fn is_out_of_range(&self) -> bool {
        matches!(self, ValueError::OutOfRange(_))
    }

    pub fn is_invalid_format(&self) -> bool {
        matches!(self, ValueError::InvalidFormat(_))
    }
}

/// Structural errors detected while describing the element tree or the
/// parameter types. Fatal to the load that produced them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructureError {
    #[error(
        "Inconsistent Size vs. Q notation for {kind} {path}: Summing (Integral + Fractional + 1) should not exceed given Size ({size_bits})"
    )]
    InconsistentQNotation {
        kind: &'static str,
        path: String,
        size_bits: u32,
    },

    #[error("Unsupported size of {size_bits} bits for {kind} {path}")]
    UnsupportedSize {
        kind: &'static str,
        path: String,
        size_bits: u32,
    },

    #[error("Missing attribute {attribute} on {path}")]
    MissingAttribute {
        path: String,
        attribute: &'static str,
    },

    #[error("Invalid value \"{value}\" for attribute {attribute} on {path}")]
    InvalidAttribute {
        path: String,
        attribute: &'static str,
        value: String,
    },

    #[error("Invalid range [{min}, {max}] for {kind} {path}")]
    InvalidRange {
        kind: &'static str,
        path: String,
        min: i64,
        max: i64,
    },

    #[error("Duplicate child {name} under {parent}")]
    DuplicateChild { parent: String, name: String },

    #[error("Parameter {0} cannot hold children")]
    ParameterParent(String),

    #[error("Unknown parameter kind {0}")]
    UnknownKind(String),

    #[error("Empty value pair list for EnumParameter {0}")]
    EmptyEnum(String),
}
