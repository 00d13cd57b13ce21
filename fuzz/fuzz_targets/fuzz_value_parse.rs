// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![no_main]

use hwparam::{
    BooleanType, EnumType, FixedPointType, IntegerType, ParameterAccessContext, ParameterType,
    RawFormat, ValueSpace,
};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    let mut types: Vec<ParameterType> = vec![ParameterType::from(BooleanType)];
    if let Ok(q) = FixedPointType::new(2, 7, 8) {
        types.push(q.into());
    }
    if let Ok(q) = FixedPointType::new(4, 15, 16) {
        types.push(q.into());
    }
    if let Ok(i) = IntegerType::new(2, true) {
        types.push(i.into());
    }
    if let Ok(e) = EnumType::new(1, vec![("Off", 0), ("On", 1), ("Low", -1)]) {
        types.push(e.into());
    }

    let contexts = [
        ParameterAccessContext::new(ValueSpace::Real, RawFormat::Decimal),
        ParameterAccessContext::raw_decimal(),
        ParameterAccessContext::raw_hex(),
    ];

    for parameter_type in &types {
        for ctx in &contexts {
            // Anything accepted must print back to an accepted value
            if let Ok(raw) = parameter_type.to_blackboard(text, ctx) {
                let shown = parameter_type.from_blackboard(raw, ctx);
                assert!(parameter_type.to_blackboard(&shown, ctx).is_ok());
            }
        }
    }
});
