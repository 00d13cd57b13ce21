// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Parameter value types.
//!
//! A [`ParameterType`] converts between user-facing values (text, or native
//! bool/integer/real) and the fixed-width raw bits stored in the blackboard.
//! The variant set is closed:
//!
//! | Kind | Size | Value spaces |
//! |------|------|--------------|
//! | [`BooleanType`] | 1 byte | `0`/`1`, raw hex `0x0`/`0x1` |
//! | [`FixedPointType`] | 1, 2 or 4 bytes | real (Qn.m) or raw integer |
//! | [`IntegerType`] | 1, 2 or 4 bytes | signed/unsigned integer within `[min, max]` |
//! | [`EnumType`] | 1, 2 or 4 bytes | literals (real) or numericals (raw) |
//!
//! Raw bits are carried as `u32` and always masked to the type's size.
//! Conversions never panic: failures come back as [`ValueError`].

mod boolean;
mod enumeration;
mod fixed_point;
mod integer;

pub use boolean::BooleanType;
pub use enumeration::EnumType;
pub use fixed_point::FixedPointType;
pub use integer::IntegerType;

use crate::access::{ConfigurationAccessContext, ParameterAccessContext};
use crate::error::{StructureError, ValueError};
use crate::xml::XmlElement;

/// Polymorphic value codec attached to leaf parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterType {
    Boolean(BooleanType),
    FixedPoint(FixedPointType),
    Integer(IntegerType),
    Enum(EnumType),
}

impl ParameterType {
    pub fn boolean() -> Self {
        ParameterType::Boolean(BooleanType)
    }

    /// Storage size in bytes.
    pub fn size(&self) -> usize {
        match self {
            ParameterType::Boolean(_) => BooleanType::SIZE,
            ParameterType::FixedPoint(t) => t.size(),
            ParameterType::Integer(t) => t.size(),
            ParameterType::Enum(t) => t.size(),
        }
    }

    /// Element kind name, as used in XML and error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            ParameterType::Boolean(_) => BooleanType::KIND,
            ParameterType::FixedPoint(_) => FixedPointType::KIND,
            ParameterType::Integer(_) => IntegerType::KIND,
            ParameterType::Enum(_) => EnumType::KIND,
        }
    }

    /// Parse a textual value into raw bits.
    pub fn to_blackboard(
        &self,
        value: &str,
        ctx: &ParameterAccessContext,
    ) -> Result<u32, ValueError> {
        match self {
            ParameterType::Boolean(t) => t.to_blackboard(value),
            ParameterType::FixedPoint(t) => t.to_blackboard(value, ctx),
            ParameterType::Integer(t) => t.to_blackboard(value),
            ParameterType::Enum(t) => t.to_blackboard(value, ctx),
        }
    }

    /// Format raw bits for display.
    pub fn from_blackboard(&self, raw: u32, ctx: &ParameterAccessContext) -> String {
        match self {
            ParameterType::Boolean(t) => t.from_blackboard(raw, ctx),
            ParameterType::FixedPoint(t) => t.from_blackboard(raw, ctx),
            ParameterType::Integer(t) => t.from_blackboard(raw, ctx),
            ParameterType::Enum(t) => t.from_blackboard(raw, ctx),
        }
    }

    pub fn bool_to_blackboard(&self, value: bool) -> Result<u32, ValueError> {
        match self {
            ParameterType::Boolean(t) => Ok(t.bool_to_blackboard(value)),
            _ => Err(self.unsupported("Boolean")),
        }
    }

    pub fn bool_from_blackboard(&self, raw: u32) -> Result<bool, ValueError> {
        match self {
            ParameterType::Boolean(t) => Ok(t.bool_from_blackboard(raw)),
            _ => Err(self.unsupported("Boolean")),
        }
    }

    pub fn integer_to_blackboard(&self, value: i64) -> Result<u32, ValueError> {
        match self {
            ParameterType::Boolean(t) => t.integer_to_blackboard(value),
            ParameterType::Integer(t) => t.integer_to_blackboard(value),
            ParameterType::Enum(t) => t.integer_to_blackboard(value),
            ParameterType::FixedPoint(_) => Err(self.unsupported("Integer")),
        }
    }

    pub fn integer_from_blackboard(&self, raw: u32) -> Result<i64, ValueError> {
        match self {
            ParameterType::Boolean(t) => Ok(t.integer_from_blackboard(raw)),
            ParameterType::Integer(t) => Ok(t.integer_from_blackboard(raw)),
            ParameterType::Enum(t) => Ok(t.integer_from_blackboard(raw)),
            ParameterType::FixedPoint(_) => Err(self.unsupported("Integer")),
        }
    }

    pub fn real_to_blackboard(&self, value: f64) -> Result<u32, ValueError> {
        match self {
            ParameterType::FixedPoint(t) => t.real_to_blackboard(value),
            _ => Err(self.unsupported("Real")),
        }
    }

    pub fn real_from_blackboard(&self, raw: u32) -> Result<f64, ValueError> {
        match self {
            ParameterType::FixedPoint(t) => Ok(t.real_from_blackboard(raw)),
            _ => Err(self.unsupported("Real")),
        }
    }

    /// Read or write the `ValueSpace` attribute of a configuration settings
    /// element. Kinds without a real/raw distinction leave both untouched.
    pub fn handle_value_space_attribute(
        &self,
        settings: &mut XmlElement,
        ctx: &mut ConfigurationAccessContext,
    ) {
        match self {
            ParameterType::FixedPoint(_) | ParameterType::Enum(_) => {
                handle_value_space_attribute(settings, ctx)
            }
            ParameterType::Boolean(_) | ParameterType::Integer(_) => {}
        }
    }

    /// Build a type from its structure XML element.
    ///
    /// `parent_path` locates the element in error messages.
    pub fn from_xml(element: &XmlElement, parent_path: &str) -> Result<Self, StructureError> {
        let path = element_path(element, parent_path);
        match element.name() {
            BooleanType::KIND => Ok(ParameterType::Boolean(BooleanType)),
            FixedPointType::KIND => FixedPointType::from_xml(element, &path).map(Self::FixedPoint),
            IntegerType::KIND => IntegerType::from_xml(element, &path).map(Self::Integer),
            EnumType::KIND => EnumType::from_xml(element, &path).map(Self::Enum),
            other => Err(StructureError::UnknownKind(other.to_string())),
        }
    }

    /// Describe the type as a structure XML element named `name`.
    pub fn to_xml(&self, name: &str) -> XmlElement {
        let element = XmlElement::new(self.kind()).with_attribute("Name", name);
        match self {
            ParameterType::Boolean(_) => element,
            ParameterType::FixedPoint(t) => t.to_xml(element),
            ParameterType::Integer(t) => t.to_xml(element),
            ParameterType::Enum(t) => t.to_xml(element),
        }
    }

    fn unsupported(&self, value_kind: &'static str) -> ValueError {
        ValueError::Unsupported {
            kind: self.kind(),
            value_kind,
        }
    }
}

impl From<BooleanType> for ParameterType {
    fn from(t: BooleanType) -> Self {
        ParameterType::Boolean(t)
    }
}

impl From<FixedPointType> for ParameterType {
    fn from(t: FixedPointType) -> Self {
        ParameterType::FixedPoint(t)
    }
}

impl From<IntegerType> for ParameterType {
    fn from(t: IntegerType) -> Self {
        ParameterType::Integer(t)
    }
}

impl From<EnumType> for ParameterType {
    fn from(t: EnumType) -> Self {
        ParameterType::Enum(t)
    }
}

// ============================================================================
// Shared helpers
// ============================================================================

fn handle_value_space_attribute(settings: &mut XmlElement, ctx: &mut ConfigurationAccessContext) {
    if !ctx.serialize_out() {
        let raw = settings.attribute("ValueSpace") == Some("Raw");
        ctx.set_value_space_raw(raw);
    } else if ctx.value_space_is_raw() {
        // Real is the default, only raw is spelled out
        settings.set_attribute("ValueSpace", "Raw");
    }
}

fn element_path(element: &XmlElement, parent_path: &str) -> String {
    match element.attribute("Name") {
        Some(name) => format!("{}/{}", parent_path, name),
        None => parent_path.to_string(),
    }
}

/// `0x`/`0X` prefix check.
pub(crate) fn is_hex(value: &str) -> bool {
    value
        .get(..2)
        .map(|p| p.eq_ignore_ascii_case("0x"))
        .unwrap_or(false)
}

/// Parse a decimal or `0x`-prefixed integer with optional sign.
pub(crate) fn parse_integer(value: &str) -> Option<i64> {
    let (negative, digits) = match value.as_bytes().first() {
        Some(b'-') => (true, &value[1..]),
        Some(b'+') => (false, &value[1..]),
        _ => (false, value),
    };
    let magnitude = if is_hex(digits) {
        let hex = &digits[2..];
        if hex.is_empty() || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        i64::from_str_radix(hex, 16).ok()?
    } else {
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse::<i64>().ok()?
    };
    Some(if negative { -magnitude } else { magnitude })
}

/// All-ones mask over `size` bytes.
pub(crate) fn size_mask(size: usize) -> u32 {
    if size >= 4 {
        u32::MAX
    } else {
        (1u32 << (size * 8)) - 1
    }
}

/// True when `value` is a bit pattern that fits in `size` bytes.
pub(crate) fn is_encodable(value: i64, size: usize) -> bool {
    value >= 0 && value <= size_mask(size) as i64
}

/// Two's complement bit pattern of `value` truncated to `size` bytes.
pub(crate) fn make_encodable(value: i64, size: usize) -> u32 {
    (value as u32) & size_mask(size)
}

/// Sign-extend the low `bits` bits of `raw`.
pub(crate) fn sign_extend(raw: u32, bits: u32) -> i32 {
    if bits == 0 || bits >= 32 {
        return raw as i32;
    }
    let shift = 32 - bits;
    ((raw << shift) as i32) >> shift
}

/// `0x` prefixed uppercase hex, zero padded to `2 * size` digits.
pub(crate) fn format_hex(raw: u32, size: usize) -> String {
    format!("0x{:0width$X}", raw, width = size * 2)
}

/// Storage sizes accepted for multi-byte kinds.
pub(crate) fn check_size_bits(
    kind: &'static str,
    path: &str,
    size_bits: u32,
) -> Result<usize, StructureError> {
    match size_bits {
        8 | 16 | 32 => Ok((size_bits / 8) as usize),
        _ => Err(StructureError::UnsupportedSize {
            kind,
            path: path.to_string(),
            size_bits,
        }),
    }
}

pub(crate) fn required_integer_attribute(
    element: &XmlElement,
    path: &str,
    attribute: &'static str,
) -> Result<i64, StructureError> {
    let value = element
        .attribute(attribute)
        .ok_or_else(|| StructureError::MissingAttribute {
            path: path.to_string(),
            attribute,
        })?;
    parse_integer(value).ok_or_else(|| StructureError::InvalidAttribute {
        path: path.to_string(),
        attribute,
        value: value.to_string(),
    })
}

pub(crate) fn optional_integer_attribute(
    element: &XmlElement,
    path: &str,
    attribute: &'static str,
) -> Result<Option<i64>, StructureError> {
    if element.attribute(attribute).is_none() {
        return Ok(None);
    }
    required_integer_attribute(element, path, attribute).map(Some)
}
