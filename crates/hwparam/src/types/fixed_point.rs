// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Fixed point parameter kind (Q notation).
//!
//! A `Qi.f` value uses `i` integral bits, `f` fractional bits and an implicit
//! sign bit: `i + f + 1` useful bits, stored in 1, 2 or 4 bytes.
//!
//! ```text
//! real value = signed(raw) / 2^f
//! raw range  = [-2^(i+f), 2^(i+f) - 1]
//! ```
//!
//! Real values are converted with round-half-away-from-zero.

use super::{
    check_size_bits, format_hex, is_encodable, is_hex, make_encodable, parse_integer,
    required_integer_attribute, sign_extend,
};
use crate::access::ParameterAccessContext;
use crate::error::{StructureError, ValueError};
use crate::xml::XmlElement;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedPointType {
    size: usize,
    integral: u32,
    fractional: u32,
}

impl FixedPointType {
    pub const KIND: &'static str = "FixedPointParameter";

    /// Create a `Q<integral>.<fractional>` type stored in `size` bytes.
    pub fn new(size: usize, integral: u32, fractional: u32) -> Result<Self, StructureError> {
        let path = format!("Q{}.{}", integral, fractional);
        Self::checked(&path, (size * 8) as u32, integral, fractional)
    }

    fn checked(
        path: &str,
        size_bits: u32,
        integral: u32,
        fractional: u32,
    ) -> Result<Self, StructureError> {
        let size = check_size_bits(Self::KIND, path, size_bits)?;
        let util_size_bits = integral as u64 + fractional as u64 + 1;
        if (size_bits as u64) < util_size_bits {
            return Err(StructureError::InconsistentQNotation {
                kind: Self::KIND,
                path: path.to_string(),
                size_bits,
            });
        }
        Ok(Self {
            size,
            integral,
            fractional,
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn integral(&self) -> u32 {
        self.integral
    }

    pub fn fractional(&self) -> u32 {
        self.fractional
    }

    /// Integral + fractional + sign bits.
    pub fn util_size_bits(&self) -> u32 {
        self.integral + self.fractional + 1
    }

    /// Admissible raw range (two's complement over the useful bits).
    pub fn raw_range(&self) -> (i64, i64) {
        let min = -(1i64 << (self.util_size_bits() - 1));
        (min, -min - 1)
    }

    /// Admissible real range.
    pub fn real_range(&self) -> (f64, f64) {
        let (min, max) = self.raw_range();
        (self.as_real(min), self.as_real(max))
    }

    fn scale(&self) -> f64 {
        (1u64 << self.fractional) as f64
    }

    fn as_real(&self, data: i64) -> f64 {
        data as f64 / self.scale()
    }

    fn as_integer(&self, value: f64) -> i64 {
        let scaled = value * self.scale();
        // Truncation toward zero after the half offset rounds away from zero
        if value < 0.0 {
            (scaled - 0.5) as i64
        } else {
            (scaled + 0.5) as i64
        }
    }

    fn is_consistent(&self, data: i64) -> bool {
        let (min, max) = self.raw_range();
        (min..=max).contains(&data)
    }

    pub fn to_blackboard(
        &self,
        value: &str,
        ctx: &ParameterAccessContext,
    ) -> Result<u32, ValueError> {
        let hex = is_hex(value);
        let raw_space = ctx.value_space_is_raw();

        if hex && !raw_space {
            return Err(ValueError::InvalidFormat(format!(
                "Hexadecimal values are not supported for {} when selected value space is real: {}",
                Self::KIND,
                value
            )));
        }

        let data = if raw_space {
            let parsed = parse_integer(value).ok_or_else(|| {
                ValueError::InvalidFormat(format!(
                    "Value {} is not a valid raw value for {}",
                    value,
                    Self::KIND
                ))
            })?;
            if hex {
                if !is_encodable(parsed, self.size) {
                    return Err(ValueError::OutOfRange(
                        self.out_of_range_error(value, true, true),
                    ));
                }
                sign_extend(parsed as u32, (self.size * 8) as u32) as i64
            } else {
                parsed
            }
        } else {
            let real = value
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| {
                    ValueError::InvalidFormat(format!(
                        "Value {} is not a valid real value for {}",
                        value,
                        Self::KIND
                    ))
                })?;
            self.as_integer(real)
        };

        if !self.is_consistent(data) {
            return Err(ValueError::OutOfRange(
                self.out_of_range_error(value, raw_space, hex),
            ));
        }

        Ok(make_encodable(data, self.size))
    }

    pub fn from_blackboard(&self, raw: u32, ctx: &ParameterAccessContext) -> String {
        let data = self.storage_value(raw);

        if ctx.value_space_is_raw() {
            if ctx.output_raw_format_is_hex() {
                format_hex(raw, self.size)
            } else {
                data.to_string()
            }
        } else {
            self.as_real(data).to_string()
        }
    }

    /// Same rounding and range check as the textual real value space.
    pub fn real_to_blackboard(&self, value: f64) -> Result<u32, ValueError> {
        if !value.is_finite() {
            return Err(ValueError::InvalidFormat(format!(
                "Value {} is not a valid real value for {}",
                value,
                Self::KIND
            )));
        }
        let data = self.as_integer(value);
        if !self.is_consistent(data) {
            return Err(ValueError::OutOfRange(
                self.out_of_range_error(&value.to_string(), false, false),
            ));
        }
        Ok(make_encodable(data, self.size))
    }

    pub fn real_from_blackboard(&self, raw: u32) -> f64 {
        self.as_real(self.storage_value(raw))
    }

    /// Stored bits sign-extended from the storage width.
    fn storage_value(&self, raw: u32) -> i64 {
        sign_extend(raw, (self.size * 8) as u32) as i64
    }

    fn out_of_range_error(&self, value: &str, raw_space: bool, hex: bool) -> String {
        let (min, max) = self.raw_range();
        let range = if !raw_space {
            format!("real range [{}, {}]", self.as_real(min), self.as_real(max))
        } else if hex {
            format!(
                "raw range [{}, {}]",
                format_hex(make_encodable(min, self.size), self.size),
                format_hex(make_encodable(max, self.size), self.size)
            )
        } else {
            format!("raw range [{}, {}]", min, max)
        };
        format!(
            "Value {} standing out of admitted {} for {}",
            value,
            range,
            Self::KIND
        )
    }

    /// Read `Size` (bits), `Integral` and `Fractional`.
    pub fn from_xml(element: &XmlElement, path: &str) -> Result<Self, StructureError> {
        let size_bits = required_integer_attribute(element, path, "Size")?;
        let integral = required_integer_attribute(element, path, "Integral")?;
        let fractional = required_integer_attribute(element, path, "Fractional")?;

        let to_u32 = |attribute: &'static str, value: i64| {
            u32::try_from(value).map_err(|_| StructureError::InvalidAttribute {
                path: path.to_string(),
                attribute,
                value: value.to_string(),
            })
        };

        Self::checked(
            path,
            to_u32("Size", size_bits)?,
            to_u32("Integral", integral)?,
            to_u32("Fractional", fractional)?,
        )
    }

    pub fn to_xml(&self, element: XmlElement) -> XmlElement {
        element
            .with_attribute("Size", (self.size * 8).to_string())
            .with_attribute("Integral", self.integral.to_string())
            .with_attribute("Fractional", self.fractional.to_string())
    }
}
