// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Parameter system facade.
//!
//! [`ParameterSystem`] owns the element tree, the blackboard and the
//! domains, and exposes the administrative surface by element path and
//! domain/configuration name.
//!
//! # Example
//!
//! ```
//! use hwparam::{EngineConfig, ParameterSystem, ParameterType, TreeBuilder};
//!
//! let mut builder = TreeBuilder::new("Audio");
//! let root = builder.root();
//! builder.parameter(root, "Mute", ParameterType::boolean())?;
//! let mut system = ParameterSystem::new(builder.build(), EngineConfig::default());
//!
//! system.create_domain("Output")?;
//! system.add_element("Output", "/Audio/Mute")?;
//! system.create_configuration("Output", "Muted")?;
//! system.set_parameter("/Audio/Mute", "1")?;
//! system.save_configuration("Output", "Muted")?;
//! assert_eq!(system.get_parameter("/Audio/Mute")?, "1");
//! # Ok::<(), hwparam::Error>(())
//! ```

use crate::access::{ParameterAccessContext, SerializeDirection};
use crate::blackboard::Blackboard;
use crate::config::{ConfigError, EngineConfig};
use crate::description::DomainsDescription;
use crate::domains::ConfigurableDomains;
use crate::element::{ElementId, ElementTree};
use crate::error::Result;
use crate::rule::{ApplicationRule, NoRules, RuleOracle};
use crate::subsystem::SyncDirection;
use crate::syncer_set::SyncerSet;
use crate::types::ParameterType;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub struct ParameterSystem {
    tree: ElementTree,
    blackboard: Blackboard,
    domains: ConfigurableDomains,
    config: EngineConfig,
    oracle: Box<dyn RuleOracle>,
}

impl ParameterSystem {
    /// New system with a zeroed blackboard, no domains and no rules.
    pub fn new(tree: ElementTree, config: EngineConfig) -> Self {
        let blackboard = tree.new_blackboard();
        Self {
            tree,
            blackboard,
            domains: ConfigurableDomains::new(),
            config,
            oracle: Box::new(NoRules),
        }
    }

    /// Replace the rule oracle used by [`apply`](Self::apply).
    pub fn with_oracle(mut self, oracle: impl RuleOracle + 'static) -> Self {
        self.oracle = Box::new(oracle);
        self
    }

    pub fn set_oracle(&mut self, oracle: impl RuleOracle + 'static) {
        self.oracle = Box::new(oracle);
    }

    pub fn tree(&self) -> &ElementTree {
        &self.tree
    }

    pub fn blackboard(&self) -> &Blackboard {
        &self.blackboard
    }

    pub fn domains(&self) -> &ConfigurableDomains {
        &self.domains
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn structure_checksum(&self) -> u32 {
        self.tree.structure_checksum()
    }

    // ========================================================================
    // Parameters
    // ========================================================================

    fn parameter(&self, path: &str) -> Result<(ElementId, Arc<ParameterType>)> {
        let id = self.tree.resolve(path)?;
        let parameter_type = self.tree.parameter_type(id)?.clone();
        Ok((id, parameter_type))
    }

    fn read_raw(&self, id: ElementId, size: usize) -> Result<u32> {
        Ok(self
            .blackboard
            .read_raw(self.tree.element(id).offset(), size)?)
    }

    fn write_raw(&mut self, id: ElementId, size: usize, raw: u32) -> Result<()> {
        self.blackboard
            .write_raw(self.tree.element(id).offset(), size, raw)?;
        if self.config.auto_sync {
            let mut syncer_set = SyncerSet::new();
            self.tree.fill_syncer_set(id, &mut syncer_set);
            syncer_set.sync(
                &mut self.tree,
                &mut self.blackboard,
                SyncDirection::Send,
                self.config.simulation,
            )?;
        }
        Ok(())
    }

    /// Read a parameter as text with the configured access context.
    pub fn get_parameter(&self, path: &str) -> Result<String> {
        self.get_parameter_with(path, &self.config.access_context())
    }

    pub fn get_parameter_with(&self, path: &str, ctx: &ParameterAccessContext) -> Result<String> {
        let (id, parameter_type) = self.parameter(path)?;
        let raw = self.read_raw(id, parameter_type.size())?;
        Ok(parameter_type.from_blackboard(raw, ctx))
    }

    /// Write a parameter from text with the configured access context.
    pub fn set_parameter(&mut self, path: &str, value: &str) -> Result<()> {
        let ctx = self.config.access_context();
        self.set_parameter_with(path, value, &ctx)
    }

    pub fn set_parameter_with(
        &mut self,
        path: &str,
        value: &str,
        ctx: &ParameterAccessContext,
    ) -> Result<()> {
        let (id, parameter_type) = self.parameter(path)?;
        let raw = parameter_type.to_blackboard(value, ctx)?;
        self.write_raw(id, parameter_type.size(), raw)
    }

    pub fn get_bool(&self, path: &str) -> Result<bool> {
        let (id, parameter_type) = self.parameter(path)?;
        let raw = self.read_raw(id, parameter_type.size())?;
        Ok(parameter_type.bool_from_blackboard(raw)?)
    }

    pub fn set_bool(&mut self, path: &str, value: bool) -> Result<()> {
        let (id, parameter_type) = self.parameter(path)?;
        let raw = parameter_type.bool_to_blackboard(value)?;
        self.write_raw(id, parameter_type.size(), raw)
    }

    pub fn get_integer(&self, path: &str) -> Result<i64> {
        let (id, parameter_type) = self.parameter(path)?;
        let raw = self.read_raw(id, parameter_type.size())?;
        Ok(parameter_type.integer_from_blackboard(raw)?)
    }

    pub fn set_integer(&mut self, path: &str, value: i64) -> Result<()> {
        let (id, parameter_type) = self.parameter(path)?;
        let raw = parameter_type.integer_to_blackboard(value)?;
        self.write_raw(id, parameter_type.size(), raw)
    }

    pub fn get_real(&self, path: &str) -> Result<f64> {
        let (id, parameter_type) = self.parameter(path)?;
        let raw = self.read_raw(id, parameter_type.size())?;
        Ok(parameter_type.real_from_blackboard(raw)?)
    }

    pub fn set_real(&mut self, path: &str, value: f64) -> Result<()> {
        let (id, parameter_type) = self.parameter(path)?;
        let raw = parameter_type.real_to_blackboard(value)?;
        self.write_raw(id, parameter_type.size(), raw)
    }

    /// Read every bound element back from hardware into the blackboard.
    pub fn back_synchronize(&mut self) -> Result<()> {
        let mut syncer_set = SyncerSet::new();
        self.tree.fill_syncer_set(self.tree.root(), &mut syncer_set);
        syncer_set.sync(
            &mut self.tree,
            &mut self.blackboard,
            SyncDirection::Receive,
            self.config.simulation,
        )?;
        Ok(())
    }

    /// Apply the configurations selected by the rule oracle.
    pub fn apply(&mut self, force: bool) -> Result<()> {
        self.domains.apply(
            &mut self.tree,
            &mut self.blackboard,
            force,
            self.config.force_policy,
            self.oracle.as_ref(),
            self.config.simulation,
        )
    }

    // ========================================================================
    // Domains and configurations
    // ========================================================================

    pub fn list_domains(&self) -> Vec<&str> {
        self.domains.list_domains()
    }

    pub fn create_domain(&mut self, name: &str) -> Result<()> {
        self.domains.create_domain(name)
    }

    pub fn delete_domain(&mut self, name: &str) -> Result<()> {
        self.domains.delete_domain(name)
    }

    pub fn rename_domain(&mut self, name: &str, new_name: &str) -> Result<()> {
        self.domains.rename_domain(name, new_name)
    }

    pub fn list_configurations(&self, domain: &str) -> Result<Vec<&str>> {
        self.domains.list_configurations(domain)
    }

    pub fn create_configuration(&mut self, domain: &str, name: &str) -> Result<()> {
        self.domains
            .create_configuration(domain, name, &self.tree, &self.blackboard)
    }

    pub fn delete_configuration(&mut self, domain: &str, name: &str) -> Result<()> {
        self.domains.delete_configuration(domain, name)
    }

    pub fn rename_configuration(&mut self, domain: &str, name: &str, new_name: &str) -> Result<()> {
        self.domains.rename_configuration(domain, name, new_name)
    }

    pub fn save_configuration(&mut self, domain: &str, name: &str) -> Result<()> {
        self.domains
            .save_configuration(domain, name, &self.tree, &self.blackboard)
    }

    /// Restore a configuration, synchronizing when `auto_sync` is enabled.
    pub fn restore_configuration(&mut self, domain: &str, name: &str) -> Result<()> {
        self.domains.restore_configuration(
            domain,
            name,
            &mut self.tree,
            &mut self.blackboard,
            self.config.auto_sync,
            self.config.simulation,
        )
    }

    pub fn set_application_rule(
        &mut self,
        domain: &str,
        configuration: &str,
        rule: &str,
    ) -> Result<()> {
        self.domains
            .set_application_rule(domain, configuration, ApplicationRule::new(rule))
    }

    pub fn clear_application_rule(&mut self, domain: &str, configuration: &str) -> Result<()> {
        self.domains.clear_application_rule(domain, configuration)
    }

    pub fn list_last_applied_configurations(&self) -> Vec<(&str, Option<&str>)> {
        self.domains.list_last_applied_configurations()
    }

    // ========================================================================
    // Elements
    // ========================================================================

    pub fn add_element(&mut self, domain: &str, path: &str) -> Result<()> {
        let id = self.tree.resolve(path)?;
        self.domains
            .add_element(domain, id, &self.tree, &self.blackboard)
    }

    pub fn remove_element(&mut self, domain: &str, path: &str) -> Result<()> {
        let id = self.tree.resolve(path)?;
        self.domains.remove_element(domain, id, &self.tree)
    }

    pub fn split(&mut self, domain: &str, path: &str) -> Result<()> {
        let id = self.tree.resolve(path)?;
        self.domains.split(domain, id, &self.tree)
    }

    pub fn list_domain_elements(&self, domain: &str) -> Result<Vec<&str>> {
        Ok(self.paths(self.domains.list_domain_elements(domain)?))
    }

    pub fn list_associated_elements(&self) -> Vec<&str> {
        self.paths(&self.domains.list_associated_elements())
    }

    pub fn list_conflicting_elements(&self) -> Vec<&str> {
        self.paths(&self.domains.list_conflicting_elements(&self.tree))
    }

    pub fn list_belonging_domains(&self, path: &str) -> Result<Vec<&str>> {
        let id = self.tree.resolve(path)?;
        Ok(self.domains.belonging_domains(id, &self.tree))
    }

    fn paths(&self, elements: &[ElementId]) -> Vec<&str> {
        elements.iter().map(|e| self.tree.path(*e)).collect()
    }

    pub fn validate_domains(&mut self) -> Result<()> {
        self.domains.validate(&self.tree, &self.blackboard)
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    /// Write every domain to a binary settings file.
    pub fn save_settings<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let checksum = self.tree.structure_checksum();
        self.domains
            .serialize_settings(path, SerializeDirection::Out, checksum, &self.tree)
    }

    /// Replace the domains with a binary settings file. On failure the
    /// current domains are kept.
    pub fn load_settings<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let checksum = self.tree.structure_checksum();
        self.domains
            .serialize_settings(path, SerializeDirection::In, checksum, &self.tree)
    }

    fn configured_settings_file(&self) -> Result<PathBuf> {
        self.config.settings_file.clone().ok_or_else(|| {
            ConfigError::Invalid("No settings_file configured".into()).into()
        })
    }

    /// [`save_settings`](Self::save_settings) to the configured file.
    pub fn save_settings_file(&mut self) -> Result<()> {
        let path = self.configured_settings_file()?;
        self.save_settings(path)
    }

    /// [`load_settings`](Self::load_settings) from the configured file.
    pub fn load_settings_file(&mut self) -> Result<()> {
        let path = self.configured_settings_file()?;
        self.load_settings(path)
    }

    /// Replace the domains with a description; configurations are
    /// validated against the live blackboard when `auto_validate` is set.
    pub fn import_description(&mut self, description: &DomainsDescription) -> Result<()> {
        let mut domains = description.build(&self.tree)?;
        if self.config.auto_validate {
            domains.validate(&self.tree, &self.blackboard)?;
        }
        self.domains = domains;
        tracing::info!(
            "Imported {} configurable domains",
            self.domains.domains().len()
        );
        Ok(())
    }

    pub fn export_description(&self) -> DomainsDescription {
        DomainsDescription::describe(&self.domains, &self.tree)
    }
}

impl std::fmt::Debug for ParameterSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParameterSystem")
            .field("tree", &self.tree)
            .field("blackboard", &self.blackboard)
            .field("domains", &self.domains)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blackboard::BlackboardIo;
    use crate::element::TreeBuilder;
    use crate::error::Error;
    use crate::subsystem::{HardwareAccess, HwError};
    use crate::types::{EnumType, FixedPointType};
    use std::sync::atomic::{AtomicU32, Ordering};

    /// One-byte register shared with the test.
    struct Register(Arc<AtomicU32>);

    impl HardwareAccess for Register {
        fn send_to_hw(&mut self, io: &mut BlackboardIo<'_>) -> std::result::Result<(), HwError> {
            let size = io.data_size();
            self.0.store(io.read_raw(size), Ordering::SeqCst);
            Ok(())
        }

        fn receive_from_hw(
            &mut self,
            io: &mut BlackboardIo<'_>,
        ) -> std::result::Result<(), HwError> {
            let size = io.data_size();
            io.write_raw(size, self.0.load(Ordering::SeqCst));
            Ok(())
        }
    }

    fn audio(config: EngineConfig) -> (ParameterSystem, Arc<AtomicU32>) {
        let register = Arc::new(AtomicU32::new(0));
        let mut b = TreeBuilder::new("Audio");
        let root = b.root();
        b.parameter(
            root,
            "Gain",
            ParameterType::from(FixedPointType::new(2, 7, 8).expect("q7.8")),
        )
        .expect("gain");
        let route = b
            .parameter(
                root,
                "Route",
                ParameterType::from(
                    EnumType::new(1, [("Speaker", 0), ("Headset", 1)]).expect("enum"),
                ),
            )
            .expect("route");
        b.bind(route, Register(register.clone()));
        (ParameterSystem::new(b.build(), config), register)
    }

    #[test]
    fn test_text_access() {
        let (mut system, register) = audio(EngineConfig::default());
        system.set_parameter("/Audio/Gain", "-1.5").expect("gain");
        assert_eq!(system.get_parameter("/Audio/Gain").expect("gain"), "-1.5");
        assert_eq!(
            system
                .get_parameter_with("/Audio/Gain", &ParameterAccessContext::raw_hex())
                .expect("raw"),
            "0xFE80"
        );

        system.set_parameter("/Audio/Route", "Headset").expect("route");
        assert_eq!(register.load(Ordering::SeqCst), 1);

        assert!(matches!(
            system.set_parameter("/Audio/Route", "Hdmi"),
            Err(Error::Value(_))
        ));
        assert!(matches!(
            system.get_parameter("/Audio"),
            Err(Error::NotAParameter(_))
        ));
    }

    #[test]
    fn test_typed_access() {
        let (mut system, _) = audio(EngineConfig::default());
        system.set_real("/Audio/Gain", 2.25).expect("real");
        assert_eq!(system.get_real("/Audio/Gain").expect("real"), 2.25);
        system.set_integer("/Audio/Route", 1).expect("integer");
        assert_eq!(system.get_integer("/Audio/Route").expect("integer"), 1);
        assert!(matches!(
            system.set_bool("/Audio/Gain", true),
            Err(Error::Value(_))
        ));
    }

    #[test]
    fn test_simulation_and_back_sync() {
        let config = EngineConfig {
            simulation: true,
            ..EngineConfig::default()
        };
        let (mut system, register) = audio(config);
        system.set_parameter("/Audio/Route", "Headset").expect("route");
        assert_eq!(register.load(Ordering::SeqCst), 0);

        let (mut system, register) = audio(EngineConfig::default());
        register.store(1, Ordering::SeqCst);
        system.back_synchronize().expect("back sync");
        assert_eq!(system.get_parameter("/Audio/Route").expect("route"), "Headset");
    }

    #[test]
    fn test_oracle_apply() {
        let (system, register) = audio(EngineConfig::default());
        let mut system =
            system.with_oracle(|_: &str, c: &crate::Configuration| c.name() == "Headset");
        system.create_domain("Routing").expect("domain");
        system.add_element("Routing", "/Audio/Route").expect("element");
        system.create_configuration("Routing", "Speaker").expect("speaker");
        system.set_parameter("/Audio/Route", "Headset").expect("route");
        system.create_configuration("Routing", "Headset").expect("headset");
        system.save_configuration("Routing", "Headset").expect("save");
        system.set_parameter("/Audio/Route", "Speaker").expect("route");
        assert_eq!(register.load(Ordering::SeqCst), 0);

        system.apply(false).expect("apply");
        assert_eq!(register.load(Ordering::SeqCst), 1);
        assert_eq!(
            system.list_last_applied_configurations(),
            vec![("Routing", Some("Headset"))]
        );
    }

    #[test]
    fn test_description_import() {
        let (mut system, _) = audio(EngineConfig::default());
        system.set_parameter("/Audio/Gain", "1").expect("gain");
        let description = DomainsDescription::from_toml(
            r#"
            [[domains]]
            name = "Gain"
            elements = ["/Audio/Gain"]
            [[domains.configurations]]
            name = "Unity"
            "#,
        )
        .expect("parse");
        system.import_description(&description).expect("import");

        let configuration = system
            .domains()
            .domain("Gain")
            .expect("domain")
            .configuration("Unity")
            .expect("configuration");
        assert!(configuration.is_valid());
        assert_eq!(configuration.blocks()[0].bytes(), &[0x00, 0x01]);
        assert_eq!(system.export_description().domains, description.domains);
    }

    #[test]
    fn test_settings_file_requires_path() {
        let (mut system, _) = audio(EngineConfig::default());
        assert!(matches!(
            system.save_settings_file(),
            Err(Error::Config(ConfigError::Invalid(_)))
        ));
    }
}
