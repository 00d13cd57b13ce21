// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Integer parameter kind.

use super::{
    check_size_bits, format_hex, is_encodable, is_hex, make_encodable, optional_integer_attribute,
    parse_integer, required_integer_attribute, sign_extend, size_mask,
};
use crate::access::ParameterAccessContext;
use crate::error::{StructureError, ValueError};
use crate::xml::XmlElement;

/// Signed or unsigned integer stored in 1, 2 or 4 bytes, bounded by
/// `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntegerType {
    size: usize,
    signed: bool,
    min: i64,
    max: i64,
}

impl IntegerType {
    pub const KIND: &'static str = "IntegerParameter";

    /// Full-range integer of `size` bytes.
    pub fn new(size: usize, signed: bool) -> Result<Self, StructureError> {
        let path = format!("{}{}", if signed { "int" } else { "uint" }, size * 8);
        check_size_bits(Self::KIND, &path, (size * 8) as u32)?;
        let (min, max) = Self::full_range(size, signed);
        Ok(Self {
            size,
            signed,
            min,
            max,
        })
    }

    /// Restrict the admissible range.
    pub fn with_range(self, min: i64, max: i64) -> Result<Self, StructureError> {
        let path = format!("{}{}", if self.signed { "int" } else { "uint" }, self.size * 8);
        self.checked_range(&path, min, max)
    }

    fn checked_range(mut self, path: &str, min: i64, max: i64) -> Result<Self, StructureError> {
        let (full_min, full_max) = Self::full_range(self.size, self.signed);
        if min > max || min < full_min || max > full_max {
            return Err(StructureError::InvalidRange {
                kind: Self::KIND,
                path: path.to_string(),
                min,
                max,
            });
        }
        self.min = min;
        self.max = max;
        Ok(self)
    }

    fn full_range(size: usize, signed: bool) -> (i64, i64) {
        let mask = size_mask(size) as i64;
        if signed {
            let min = -(mask / 2) - 1;
            (min, mask / 2)
        } else {
            (0, mask)
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_signed(&self) -> bool {
        self.signed
    }

    pub fn range(&self) -> (i64, i64) {
        (self.min, self.max)
    }

    fn interpret(&self, raw: u32) -> i64 {
        if self.signed {
            sign_extend(raw, (self.size * 8) as u32) as i64
        } else {
            raw as i64
        }
    }

    pub fn to_blackboard(&self, value: &str) -> Result<u32, ValueError> {
        let hex = is_hex(value);
        let parsed = parse_integer(value).ok_or_else(|| {
            ValueError::InvalidFormat(format!(
                "Value {} is not a valid integer for {}",
                value,
                Self::KIND
            ))
        })?;

        let data = if hex {
            if !is_encodable(parsed, self.size) {
                return Err(ValueError::OutOfRange(self.out_of_range_error(value, true)));
            }
            self.interpret(parsed as u32)
        } else {
            parsed
        };

        if data < self.min || data > self.max {
            return Err(ValueError::OutOfRange(self.out_of_range_error(value, hex)));
        }
        Ok(make_encodable(data, self.size))
    }

    pub fn from_blackboard(&self, raw: u32, ctx: &ParameterAccessContext) -> String {
        if ctx.value_space_is_raw() && ctx.output_raw_format_is_hex() {
            format_hex(raw, self.size)
        } else {
            self.interpret(raw).to_string()
        }
    }

    pub fn integer_to_blackboard(&self, value: i64) -> Result<u32, ValueError> {
        if value < self.min || value > self.max {
            return Err(ValueError::OutOfRange(
                self.out_of_range_error(&value.to_string(), false),
            ));
        }
        Ok(make_encodable(value, self.size))
    }

    pub fn integer_from_blackboard(&self, raw: u32) -> i64 {
        self.interpret(raw)
    }

    fn out_of_range_error(&self, value: &str, hex: bool) -> String {
        let range = if hex {
            format!(
                "[{}, {}]",
                format_hex(make_encodable(self.min, self.size), self.size),
                format_hex(make_encodable(self.max, self.size), self.size)
            )
        } else {
            format!("[{}, {}]", self.min, self.max)
        };
        format!(
            "Value {} standing out of admitted range {} for {}",
            value,
            range,
            Self::KIND
        )
    }

    /// Read `Size` (bits), `Signed`, and the optional `Min`/`Max`.
    pub fn from_xml(element: &XmlElement, path: &str) -> Result<Self, StructureError> {
        let size_bits = required_integer_attribute(element, path, "Size")?;
        let size_bits = u32::try_from(size_bits).map_err(|_| StructureError::InvalidAttribute {
            path: path.to_string(),
            attribute: "Size",
            value: size_bits.to_string(),
        })?;
        let size = check_size_bits(Self::KIND, path, size_bits)?;
        let signed = match element.attribute("Signed") {
            None | Some("false") => false,
            Some("true") => true,
            Some(other) => {
                return Err(StructureError::InvalidAttribute {
                    path: path.to_string(),
                    attribute: "Signed",
                    value: other.to_string(),
                })
            }
        };

        let (full_min, full_max) = Self::full_range(size, signed);
        let min = optional_integer_attribute(element, path, "Min")?.unwrap_or(full_min);
        let max = optional_integer_attribute(element, path, "Max")?.unwrap_or(full_max);

        Self {
            size,
            signed,
            min: full_min,
            max: full_max,
        }
        .checked_range(path, min, max)
    }

    pub fn to_xml(&self, element: XmlElement) -> XmlElement {
        element
            .with_attribute("Size", (self.size * 8).to_string())
            .with_attribute("Signed", self.signed.to_string())
            .with_attribute("Min", self.min.to_string())
            .with_attribute("Max", self.max.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_ranges() {
        assert_eq!(IntegerType::new(1, true).expect("int8").range(), (-128, 127));
        assert_eq!(IntegerType::new(1, false).expect("uint8").range(), (0, 255));
        assert_eq!(
            IntegerType::new(4, false).expect("uint32").range(),
            (0, u32::MAX as i64)
        );
        assert_eq!(
            IntegerType::new(4, true).expect("int32").range(),
            (i32::MIN as i64, i32::MAX as i64)
        );
    }

    #[test]
    fn test_signed_parse_and_format() {
        let t = IntegerType::new(2, true).expect("int16");
        let ctx = ParameterAccessContext::default();
        let raw = t.to_blackboard("-2").expect("valid");
        assert_eq!(raw, 0xFFFE);
        assert_eq!(t.from_blackboard(raw, &ctx), "-2");
        assert_eq!(t.from_blackboard(raw, &ParameterAccessContext::raw_hex()), "0xFFFE");

        // Hex input is sign extended
        assert_eq!(t.to_blackboard("0xFFFE"), Ok(0xFFFE));
        assert_eq!(t.integer_from_blackboard(0xFFFE), -2);
    }

    #[test]
    fn test_bounded_range() {
        let t = IntegerType::new(1, false)
            .expect("uint8")
            .with_range(10, 20)
            .expect("valid range");
        assert_eq!(t.to_blackboard("10"), Ok(10));
        let err = t.to_blackboard("21").expect_err("above max");
        assert_eq!(
            err.to_string(),
            "Value 21 standing out of admitted range [10, 20] for IntegerParameter"
        );
        let err = t.to_blackboard("0x30").expect_err("hex above max");
        assert_eq!(
            err.to_string(),
            "Value 0x30 standing out of admitted range [0x0A, 0x14] for IntegerParameter"
        );
        assert!(t.integer_to_blackboard(9).is_err());
        assert!(IntegerType::new(1, false)
            .expect("uint8")
            .with_range(0, 256)
            .is_err());
    }

    #[test]
    fn test_invalid_text() {
        let t = IntegerType::new(4, true).expect("int32");
        assert!(t.to_blackboard("1.5").expect_err("format").is_invalid_format());
        assert!(t.to_blackboard("0x1FFFFFFFF").expect_err("width").is_out_of_range());
    }

    #[test]
    fn test_from_xml() {
        let element = XmlElement::new(IntegerType::KIND)
            .with_attribute("Name", "Volume")
            .with_attribute("Size", "8")
            .with_attribute("Signed", "false")
            .with_attribute("Max", "100");
        let t = IntegerType::from_xml(&element, "/Audio/Volume").expect("valid");
        assert_eq!(t.range(), (0, 100));
        assert!(!t.is_signed());

        let bad = XmlElement::new(IntegerType::KIND).with_attribute("Size", "12");
        assert!(matches!(
            IntegerType::from_xml(&bad, "/x"),
            Err(StructureError::UnsupportedSize { size_bits: 12, .. })
        ));
    }
}
