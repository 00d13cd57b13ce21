// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Binary settings persistence through the facade.

use hwparam::{
    EngineConfig, Error, FixedPointType, ParameterSystem, ParameterType, SettingsError,
    TreeBuilder,
};

fn system(with_extra: bool) -> ParameterSystem {
    let mut b = TreeBuilder::new("Audio");
    let root = b.root();
    let codec = b.component(root, "Codec").expect("codec");
    b.parameter(
        codec,
        "Gain",
        ParameterType::from(FixedPointType::new(2, 7, 8).expect("q7.8")),
    )
    .expect("gain");
    b.parameter(codec, "Mute", ParameterType::boolean())
        .expect("mute");
    if with_extra {
        b.parameter(root, "Extra", ParameterType::boolean())
            .expect("extra");
    }
    ParameterSystem::new(b.build(), EngineConfig::default())
}

fn populate(system: &mut ParameterSystem) {
    system.create_domain("Volume").expect("domain");
    system.add_element("Volume", "/Audio/Codec").expect("codec");
    system.set_parameter("/Audio/Codec/Gain", "-12.25").expect("gain");
    system.create_configuration("Volume", "Night").expect("night");
    system.set_parameter("/Audio/Codec/Gain", "3").expect("gain");
    system.set_bool("/Audio/Codec/Mute", true).expect("mute");
    system.create_configuration("Volume", "Day").expect("day");
    system.save_configuration("Volume", "Day").expect("save day");
    system
        .set_application_rule("Volume", "Night", "Mode Is Night")
        .expect("rule");
}

#[test]
fn test_settings_round_trip() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("settings.bin");

    let mut saved = system(false);
    populate(&mut saved);
    saved.save_settings(&path).expect("save");

    let mut loaded = system(false);
    loaded.load_settings(&path).expect("load");
    assert_eq!(loaded.domains(), saved.domains());

    loaded.restore_configuration("Volume", "Night").expect("restore");
    assert_eq!(
        loaded.get_parameter("/Audio/Codec/Gain").expect("gain"),
        "-12.25"
    );
    assert!(!loaded.get_bool("/Audio/Codec/Mute").expect("mute"));
}

#[test]
fn test_structure_mismatch_keeps_domains() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("settings.bin");

    let mut saved = system(false);
    populate(&mut saved);
    saved.save_settings(&path).expect("save");

    let mut other = system(true);
    other.create_domain("Local").expect("domain");
    let before = other.domains().clone();

    let err = other.load_settings(&path).expect_err("checksum");
    assert!(matches!(
        err,
        Error::Settings(SettingsError::ChecksumMismatch { .. })
    ));
    assert_eq!(other.domains(), &before);
}

#[test]
fn test_configured_settings_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = EngineConfig {
        settings_file: Some(dir.path().join("configured.bin")),
        ..EngineConfig::default()
    };

    let mut b = TreeBuilder::new("Audio");
    let root = b.root();
    b.parameter(root, "Mute", ParameterType::boolean())
        .expect("mute");
    let mut system = ParameterSystem::new(b.build(), config);
    system.create_domain("Mute").expect("domain");
    system.add_element("Mute", "/Audio/Mute").expect("element");
    system.create_configuration("Mute", "Off").expect("configuration");
    system.save_settings_file().expect("save");

    system.delete_domain("Mute").expect("delete");
    system.load_settings_file().expect("load");
    assert_eq!(system.list_domains(), vec!["Mute"]);
    assert_eq!(system.list_configurations("Mute").expect("list"), vec!["Off"]);
}

#[test]
fn test_missing_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("absent.bin");
    let mut system = system(false);

    let err = system.load_settings(&path).expect_err("missing");
    assert!(err
        .to_string()
        .starts_with("Unable to open binary settings file"));
}
