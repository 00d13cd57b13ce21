// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Access contexts carrying value-space and output-format options.

use serde::{Deserialize, Serialize};

/// Interpretation of stored bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueSpace {
    /// Scaled fraction (fixed point) or literal (enum).
    #[default]
    Real,
    /// Literal integer.
    Raw,
}

/// Display format of raw values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RawFormat {
    /// Signed decimal.
    #[default]
    Decimal,
    /// Hexadecimal, `0x` prefixed and zero padded.
    Hex,
}

/// Options for parameter value conversions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParameterAccessContext {
    pub value_space: ValueSpace,
    pub output_raw_format: RawFormat,
}

impl ParameterAccessContext {
    pub fn new(value_space: ValueSpace, output_raw_format: RawFormat) -> Self {
        Self {
            value_space,
            output_raw_format,
        }
    }

    /// Raw value space with hexadecimal output.
    pub fn raw_hex() -> Self {
        Self::new(ValueSpace::Raw, RawFormat::Hex)
    }

    /// Raw value space with decimal output.
    pub fn raw_decimal() -> Self {
        Self::new(ValueSpace::Raw, RawFormat::Decimal)
    }

    pub fn value_space_is_raw(&self) -> bool {
        self.value_space == ValueSpace::Raw
    }

    /// True when raw values must be printed in hexadecimal.
    pub fn output_raw_format_is_hex(&self) -> bool {
        self.output_raw_format == RawFormat::Hex
    }
}

/// Direction of a configuration import/export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerializeDirection {
    /// Reading settings in.
    In,
    /// Writing settings out.
    Out,
}

/// Context used while importing or exporting configuration settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigurationAccessContext {
    pub direction: SerializeDirection,
    pub parameter: ParameterAccessContext,
}

impl ConfigurationAccessContext {
    pub fn new(direction: SerializeDirection) -> Self {
        Self {
            direction,
            parameter: ParameterAccessContext::default(),
        }
    }

    pub fn serialize_out(&self) -> bool {
        self.direction == SerializeDirection::Out
    }

    pub fn set_value_space_raw(&mut self, raw: bool) {
        self.parameter.value_space = if raw {
            ValueSpace::Raw
        } else {
            ValueSpace::Real
        };
    }

    pub fn value_space_is_raw(&self) -> bool {
        self.parameter.value_space_is_raw()
    }
}
