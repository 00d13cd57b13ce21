// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Boolean parameter kind (1 byte).

use super::is_hex;
use crate::access::ParameterAccessContext;
use crate::error::ValueError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BooleanType;

impl BooleanType {
    pub const KIND: &'static str = "BooleanParameter";
    pub const SIZE: usize = 1;

    pub fn to_blackboard(&self, value: &str) -> Result<u32, ValueError> {
        let hex = is_hex(value);
        let digits = if hex { &value[2..] } else { value };
        match digits {
            "1" => Ok(1),
            "0" => Ok(0),
            _ => {
                let space = if hex { "0x0, 0x1" } else { "0, 1" };
                Err(ValueError::InvalidFormat(format!(
                    "{} value not part of numerical space {{{}}} for {}",
                    value,
                    space,
                    Self::KIND
                )))
            }
        }
    }

    pub fn from_blackboard(&self, raw: u32, ctx: &ParameterAccessContext) -> String {
        let digit = if raw != 0 { "1" } else { "0" };
        if ctx.value_space_is_raw() && ctx.output_raw_format_is_hex() {
            format!("0x{}", digit)
        } else {
            digit.to_string()
        }
    }

    pub fn bool_to_blackboard(&self, value: bool) -> u32 {
        u32::from(value)
    }

    pub fn bool_from_blackboard(&self, raw: u32) -> bool {
        raw != 0
    }

    pub fn integer_to_blackboard(&self, value: i64) -> Result<u32, ValueError> {
        match value {
            0 | 1 => Ok(value as u32),
            _ => Err(ValueError::OutOfRange(format!(
                "Value {} standing out of admitted range [0, 1] for {}",
                value,
                Self::KIND
            ))),
        }
    }

    pub fn integer_from_blackboard(&self, raw: u32) -> i64 {
        i64::from(raw != 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepted_literals() {
        let t = BooleanType;
        assert_eq!(t.to_blackboard("0"), Ok(0));
        assert_eq!(t.to_blackboard("1"), Ok(1));
        assert_eq!(t.to_blackboard("0x0"), Ok(0));
        assert_eq!(t.to_blackboard("0x1"), Ok(1));
        assert_eq!(t.to_blackboard("0X1"), Ok(1));
    }

    #[test]
    fn test_round_trip_drops_hex() {
        let t = BooleanType;
        let ctx = ParameterAccessContext::default();
        for (input, expected) in [("0", "0"), ("1", "1"), ("0x0", "0"), ("0x1", "1")] {
            let raw = t.to_blackboard(input).expect("valid");
            assert_eq!(t.from_blackboard(raw, &ctx), expected);
        }
    }

    #[test]
    fn test_error_lists_space() {
        let t = BooleanType;
        let err = t.to_blackboard("2").expect_err("invalid");
        assert_eq!(
            err.to_string(),
            "2 value not part of numerical space {0, 1} for BooleanParameter"
        );
        let err = t.to_blackboard("0x2").expect_err("invalid");
        assert_eq!(
            err.to_string(),
            "0x2 value not part of numerical space {0x0, 0x1} for BooleanParameter"
        );
        assert!(t.to_blackboard("true").expect_err("invalid").is_invalid_format());
    }

    #[test]
    fn test_hex_output() {
        let t = BooleanType;
        assert_eq!(t.from_blackboard(1, &ParameterAccessContext::raw_hex()), "0x1");
        assert_eq!(t.from_blackboard(0, &ParameterAccessContext::raw_decimal()), "0");
    }

    #[test]
    fn test_typed() {
        let t = BooleanType;
        assert_eq!(t.bool_to_blackboard(true), 1);
        assert!(!t.bool_from_blackboard(0));
        assert_eq!(t.integer_to_blackboard(1), Ok(1));
        assert!(t.integer_to_blackboard(2).expect_err("range").is_out_of_range());
        assert_eq!(t.integer_from_blackboard(5), 1);
    }
}
