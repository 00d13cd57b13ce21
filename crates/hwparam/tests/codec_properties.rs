// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Value codec properties over whole ranges.

use hwparam::{
    BooleanType, FixedPointType, IntegerType, ParameterAccessContext, RawFormat, ValueError,
    ValueSpace,
};

fn real() -> ParameterAccessContext {
    ParameterAccessContext::new(ValueSpace::Real, RawFormat::Decimal)
}

#[test]
fn test_boolean_text_round_trip() {
    let boolean = BooleanType;
    for ctx in [
        real(),
        ParameterAccessContext::raw_decimal(),
        ParameterAccessContext::raw_hex(),
    ] {
        for text in ["0", "1"] {
            let raw = boolean.to_blackboard(text).expect("encode");
            let shown = boolean.from_blackboard(raw, &ctx);
            assert_eq!(boolean.to_blackboard(&shown).expect("re-encode"), raw);
        }
    }
    assert!(matches!(
        boolean.to_blackboard("2"),
        Err(ValueError::InvalidFormat(_))
    ));
    assert!(boolean.integer_to_blackboard(2).is_err());
}

#[test]
fn test_fixed_point_error_bound() {
    let ctx = real();
    for (size, integral, fractional) in [(1, 3, 4), (2, 7, 8), (4, 15, 16)] {
        let q = FixedPointType::new(size, integral, fractional).expect("type");
        let (min, max) = q.real_range();
        let half_step = 0.5 / (1u64 << fractional) as f64;
        let steps = 97;
        for i in 0..=steps {
            let value = min + (max - min) * i as f64 / steps as f64;
            let raw = q
                .to_blackboard(&value.to_string(), &ctx)
                .expect("in range");
            let back = q.real_from_blackboard(raw);
            assert!(
                (back - value).abs() <= half_step + f64::EPSILON,
                "Q{}.{}: {} came back as {}",
                integral,
                fractional,
                value,
                back
            );
        }
    }
}

#[test]
fn test_fixed_point_rejects_out_of_range() {
    let q = FixedPointType::new(2, 7, 8).expect("q7.8");
    let (_, max) = q.real_range();
    let err = q
        .to_blackboard(&(max + 1.0).to_string(), &real())
        .expect_err("too large");
    assert!(matches!(err, ValueError::OutOfRange(_)));
    assert!(q.to_blackboard("0x10", &real()).is_err());
}

#[test]
fn test_hex_extremes_accepted() {
    let raw_hex = ParameterAccessContext::raw_hex();

    let q = FixedPointType::new(2, 7, 8).expect("q7.8");
    assert_eq!(q.to_blackboard("0x7FFF", &raw_hex).expect("max"), 0x7FFF);
    assert_eq!(q.to_blackboard("0x8000", &raw_hex).expect("min"), 0x8000);
    assert_eq!(q.from_blackboard(0x8000, &raw_hex), "0x8000");
    assert!(q.to_blackboard("0x10000", &raw_hex).is_err());

    let signed = IntegerType::new(2, true).expect("int16");
    assert_eq!(signed.to_blackboard("0x7FFF").expect("max"), 0x7FFF);
    assert_eq!(signed.to_blackboard("0x8000").expect("min"), 0x8000);
    assert_eq!(signed.integer_from_blackboard(0x8000), -32768);
    assert!(signed.to_blackboard("0x10000").is_err());

    let unsigned = IntegerType::new(1, false).expect("uint8");
    assert_eq!(unsigned.to_blackboard("0xFF").expect("max"), 0xFF);
    assert_eq!(unsigned.to_blackboard("0x00").expect("min"), 0);
    assert_eq!(unsigned.from_blackboard(0xFF, &raw_hex), "0xFF");
}

#[test]
fn test_integer_decimal_round_trip() {
    let signed = IntegerType::new(1, true).expect("int8");
    let ctx = ParameterAccessContext::raw_decimal();
    for value in -128i64..=127 {
        let raw = signed.to_blackboard(&value.to_string()).expect("encode");
        assert_eq!(signed.from_blackboard(raw, &ctx), value.to_string());
    }
    assert!(signed.to_blackboard("128").is_err());
    assert!(signed.to_blackboard("-129").is_err());
}
