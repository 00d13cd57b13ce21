// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! hwparam - Hardware Parameter Configuration Engine
//!
//! Typed hardware parameters stored in a shared blackboard, grouped into
//! configurable domains with named configurations, synchronized to hardware
//! through pluggable bindings and persisted in a checksummed binary
//! settings file.
//!
//! # Features
//!
//! - **Value codecs**: Boolean, FixedPoint (Qn.m), Integer and Enum
//!   parameters with real/raw value spaces and hex output
//! - **Domains**: save/restore configurations, element association with
//!   ancestor merging and splitting, rule-driven apply
//! - **Syncers**: per-element hardware bindings, deduplicated per pass
//! - **Persistence**: binary settings guarded by a structure checksum
//!
//! # Quick Start
//!
//! ```
//! use hwparam::{EngineConfig, FixedPointType, ParameterSystem, ParameterType, TreeBuilder};
//!
//! let mut builder = TreeBuilder::new("Audio");
//! let root = builder.root();
//! let codec = builder.component(root, "Codec")?;
//! builder.parameter(codec, "Gain", ParameterType::from(FixedPointType::new(2, 7, 8)?))?;
//! builder.parameter(codec, "Mute", ParameterType::boolean())?;
//!
//! let mut system = ParameterSystem::new(builder.build(), EngineConfig::default());
//! system.create_domain("Volume")?;
//! system.add_element("Volume", "/Audio/Codec")?;
//! system.create_configuration("Volume", "Night")?;
//!
//! system.set_parameter("/Audio/Codec/Gain", "-6.5")?;
//! system.save_configuration("Volume", "Night")?;
//! system.set_parameter("/Audio/Codec/Gain", "0")?;
//!
//! system.restore_configuration("Volume", "Night")?;
//! assert_eq!(system.get_parameter("/Audio/Codec/Gain")?, "-6.5");
//! # Ok::<(), hwparam::Error>(())
//! ```
//!
//! # Configuration File
//!
//! ```toml
//! simulation = false
//! auto_sync = true
//! force_policy = "all_owned"
//! value_space = "real"
//! output_raw_format = "decimal"
//! ```

pub mod access;
pub mod blackboard;
pub mod config;
pub mod configuration;
pub mod description;
pub mod domain;
pub mod domains;
pub mod element;
pub mod error;
pub mod rule;
pub mod settings;
pub mod subsystem;
pub mod syncer_set;
pub mod system;
pub mod types;
pub mod xml;

pub use access::{
    ConfigurationAccessContext, ParameterAccessContext, RawFormat, SerializeDirection, ValueSpace,
};
pub use blackboard::{Blackboard, BlackboardIo, OutOfBounds};
pub use config::{ConfigError, EngineConfig, ForcePolicy};
pub use configuration::{AreaBlock, Configuration};
pub use description::{ConfigurationDescription, DomainDescription, DomainsDescription};
pub use domain::ConfigurableDomain;
pub use domains::ConfigurableDomains;
pub use element::{Element, ElementId, ElementKind, ElementTree, TreeBuilder};
pub use error::{Error, Result, StructureError, ValueError};
pub use rule::{ApplicationRule, NoRules, RuleOracle};
pub use settings::SettingsError;
pub use subsystem::{HardwareAccess, HwError, SubsystemObject, SyncDirection, SyncError, SyncFailure};
pub use syncer_set::SyncerSet;
pub use system::ParameterSystem;
pub use types::{BooleanType, EnumType, FixedPointType, IntegerType, ParameterType};
pub use xml::{XmlElement, XmlError};
