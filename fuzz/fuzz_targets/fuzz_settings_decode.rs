// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![no_main]

use hwparam::settings::{decode, SettingsHeader};
use hwparam::{IntegerType, ParameterType, TreeBuilder};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut b = TreeBuilder::new("Sys");
    let root = b.root();
    let Ok(group) = b.component(root, "Group") else {
        return;
    };
    let _ = b.parameter(group, "Enable", ParameterType::boolean());
    if let Ok(level) = IntegerType::new(4, false) {
        let _ = b.parameter(group, "Level", ParameterType::from(level));
    }
    let tree = b.build();
    let checksum = tree.structure_checksum();

    // Raw input, mostly rejected by the header checks
    let _ = decode(data, &tree, checksum);

    // Same bytes behind a valid header to reach the payload parser
    let mut image = Vec::new();
    if SettingsHeader::new(checksum, data).write(&mut image).is_ok() {
        image.extend_from_slice(data);
        let _ = decode(&image, &tree, checksum);
    }
});
