// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Enumeration parameter kind.
//!
//! Literals are the real value space, numericals the raw one.

use super::{
    check_size_bits, format_hex, is_encodable, is_hex, make_encodable, parse_integer,
    required_integer_attribute, sign_extend,
};
use crate::access::ParameterAccessContext;
use crate::error::{StructureError, ValueError};
use crate::xml::XmlElement;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumType {
    size: usize,
    pairs: Vec<(String, i64)>,
}

impl EnumType {
    pub const KIND: &'static str = "EnumParameter";

    /// Create an enumeration of `size` bytes from `(literal, numerical)`
    /// pairs. Numericals must be signed values encodable in `size` bytes.
    pub fn new<S: Into<String>>(
        size: usize,
        pairs: impl IntoIterator<Item = (S, i64)>,
    ) -> Result<Self, StructureError> {
        Self::checked(
            "enum",
            (size * 8) as u32,
            pairs.into_iter().map(|(l, n)| (l.into(), n)).collect(),
        )
    }

    fn checked(
        path: &str,
        size_bits: u32,
        pairs: Vec<(String, i64)>,
    ) -> Result<Self, StructureError> {
        let size = check_size_bits(Self::KIND, path, size_bits)?;
        if pairs.is_empty() {
            return Err(StructureError::EmptyEnum(path.to_string()));
        }
        let half = 1i64 << (size_bits - 1);
        for (literal, numerical) in &pairs {
            if *numerical < -half || *numerical >= half {
                return Err(StructureError::InvalidAttribute {
                    path: format!("{}/{}", path, literal),
                    attribute: "Numerical",
                    value: numerical.to_string(),
                });
            }
        }
        Ok(Self { size, pairs })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn pairs(&self) -> &[(String, i64)] {
        &self.pairs
    }

    fn literal(&self, numerical: i64) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(_, n)| *n == numerical)
            .map(|(l, _)| l.as_str())
    }

    fn numerical(&self, literal: &str) -> Option<i64> {
        self.pairs
            .iter()
            .find(|(l, _)| l == literal)
            .map(|(_, n)| *n)
    }

    fn is_valid(&self, numerical: i64) -> bool {
        self.literal(numerical).is_some()
    }

    pub fn to_blackboard(
        &self,
        value: &str,
        ctx: &ParameterAccessContext,
    ) -> Result<u32, ValueError> {
        let numerical = if ctx.value_space_is_raw() {
            let parsed = parse_integer(value).ok_or_else(|| {
                ValueError::InvalidFormat(format!(
                    "Value {} is not a valid numerical value for {}",
                    value,
                    Self::KIND
                ))
            })?;
            let numerical = if is_hex(value) && is_encodable(parsed, self.size) {
                sign_extend(parsed as u32, (self.size * 8) as u32) as i64
            } else {
                parsed
            };
            if !self.is_valid(numerical) {
                return Err(ValueError::OutOfRange(format!(
                    "Provided value {} is not part of {} numerical space {{{}}}",
                    value,
                    Self::KIND,
                    self.numericals_list()
                )));
            }
            numerical
        } else {
            self.numerical(value).ok_or_else(|| {
                ValueError::OutOfRange(format!(
                    "Provided value {} is not part of {} possible values {{{}}}",
                    value,
                    Self::KIND,
                    self.literals_list()
                ))
            })?
        };
        Ok(make_encodable(numerical, self.size))
    }

    pub fn from_blackboard(&self, raw: u32, ctx: &ParameterAccessContext) -> String {
        let numerical = self.integer_from_blackboard(raw);
        if ctx.value_space_is_raw() {
            if ctx.output_raw_format_is_hex() {
                format_hex(raw, self.size)
            } else {
                numerical.to_string()
            }
        } else {
            match self.literal(numerical) {
                Some(literal) => literal.to_string(),
                None => numerical.to_string(),
            }
        }
    }

    pub fn integer_to_blackboard(&self, value: i64) -> Result<u32, ValueError> {
        if !self.is_valid(value) {
            return Err(ValueError::OutOfRange(format!(
                "Provided value {} is not part of {} numerical space {{{}}}",
                value,
                Self::KIND,
                self.numericals_list()
            )));
        }
        Ok(make_encodable(value, self.size))
    }

    pub fn integer_from_blackboard(&self, raw: u32) -> i64 {
        sign_extend(raw, (self.size * 8) as u32) as i64
    }

    fn literals_list(&self) -> String {
        self.pairs
            .iter()
            .map(|(l, _)| l.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn numericals_list(&self) -> String {
        self.pairs
            .iter()
            .map(|(_, n)| n.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Read `Size` (bits) and the `<ValuePair Literal Numerical/>` children.
    pub fn from_xml(element: &XmlElement, path: &str) -> Result<Self, StructureError> {
        let size_bits = required_integer_attribute(element, path, "Size")?;
        let size_bits = u32::try_from(size_bits).map_err(|_| StructureError::InvalidAttribute {
            path: path.to_string(),
            attribute: "Size",
            value: size_bits.to_string(),
        })?;

        let mut pairs = Vec::new();
        for pair in element.children().iter().filter(|c| c.name() == "ValuePair") {
            let literal = pair
                .attribute("Literal")
                .ok_or_else(|| StructureError::MissingAttribute {
                    path: path.to_string(),
                    attribute: "Literal",
                })?;
            let numerical = required_integer_attribute(pair, path, "Numerical")?;
            pairs.push((literal.to_string(), numerical));
        }

        Self::checked(path, size_bits, pairs)
    }

    pub fn to_xml(&self, element: XmlElement) -> XmlElement {
        self.pairs.iter().fold(
            element.with_attribute("Size", (self.size * 8).to_string()),
            |element, (literal, numerical)| {
                element.with_child(
                    XmlElement::new("ValuePair")
                        .with_attribute("Literal", literal.as_str())
                        .with_attribute("Numerical", numerical.to_string()),
                )
            },
        )
    }
}
