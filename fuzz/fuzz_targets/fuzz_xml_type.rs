// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![no_main]

use hwparam::{TreeBuilder, XmlElement};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(xml) = std::str::from_utf8(data) {
        if let Ok(root) = XmlElement::parse(xml) {
            // Structure errors are expected; panics are not
            if let Ok(builder) = TreeBuilder::from_xml(&root) {
                let tree = builder.build();
                let _ = tree.structure_checksum();
            }
        }
    }
});
