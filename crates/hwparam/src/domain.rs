// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Configurable domain.
//!
//! A domain owns a set of configurable elements (disjoint subtrees: an
//! element is never owned together with one of its ancestors) and a list
//! of [`Configuration`]s storing those elements' bytes.

use crate::blackboard::Blackboard;
use crate::config::ForcePolicy;
use crate::configuration::{AreaBlock, Configuration};
use crate::element::{ElementId, ElementTree};
use crate::error::{Error, Result};
use crate::rule::{ApplicationRule, RuleOracle};
use crate::subsystem::SyncDirection;
use crate::syncer_set::SyncerSet;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigurableDomain {
    name: String,
    elements: Vec<ElementId>,
    configurations: Vec<Configuration>,
    last_applied: Option<String>,
}

impl ConfigurableDomain {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            elements: Vec::new(),
            configurations: Vec::new(),
            last_applied: None,
        }
    }

    pub(crate) fn from_parts(
        name: String,
        elements: Vec<ElementId>,
        configurations: Vec<Configuration>,
    ) -> Self {
        Self {
            name,
            elements,
            configurations,
            last_applied: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    /// Owned elements, in association order.
    pub fn elements(&self) -> &[ElementId] {
        &self.elements
    }

    pub fn owns(&self, element: ElementId) -> bool {
        self.elements.contains(&element)
    }

    /// True if `element` or one of its ancestors is owned.
    pub fn belongs(&self, element: ElementId, tree: &ElementTree) -> bool {
        self.owns(element) || tree.ancestors(element).any(|a| self.owns(a))
    }

    pub fn configurations(&self) -> &[Configuration] {
        &self.configurations
    }

    pub fn configuration_names(&self) -> Vec<&str> {
        self.configurations.iter().map(Configuration::name).collect()
    }

    pub fn configuration(&self, name: &str) -> Result<&Configuration> {
        self.configurations
            .iter()
            .find(|c| c.name() == name)
            .ok_or_else(|| self.configuration_not_found(name))
    }

    fn configuration_mut(&mut self, name: &str) -> Result<&mut Configuration> {
        let index = self.configuration_index(name)?;
        Ok(&mut self.configurations[index])
    }

    fn configuration_index(&self, name: &str) -> Result<usize> {
        self.configurations
            .iter()
            .position(|c| c.name() == name)
            .ok_or_else(|| self.configuration_not_found(name))
    }

    fn configuration_not_found(&self, name: &str) -> Error {
        Error::ConfigurationNotFound {
            domain: self.name.clone(),
            configuration: name.to_string(),
        }
    }

    fn ensure_configuration_free(&self, name: &str) -> Result<()> {
        if self.configurations.iter().any(|c| c.name() == name) {
            return Err(Error::ConfigurationAlreadyExists {
                domain: self.name.clone(),
                configuration: name.to_string(),
            });
        }
        Ok(())
    }

    /// Name of the configuration applied or restored last.
    pub fn last_applied(&self) -> Option<&str> {
        self.last_applied.as_deref()
    }

    /// True if any configuration carries a non-trivial application rule.
    pub fn has_rules(&self) -> bool {
        self.configurations.iter().any(Configuration::has_rule)
    }

    // ========================================================================
    // Configurations
    // ========================================================================

    /// Create a configuration; its blocks are filled by validation.
    pub fn create_configuration(
        &mut self,
        name: &str,
        tree: &ElementTree,
        blackboard: &Blackboard,
    ) -> Result<()> {
        self.import_configuration(name, None)?;
        let index = self.configurations.len() - 1;
        self.validate_configuration(index, tree, blackboard)?;
        info!("Configuration {} created in domain {}", name, self.name);
        Ok(())
    }

    /// Add a configuration whose blocks are all invalid.
    pub(crate) fn import_configuration(
        &mut self,
        name: &str,
        rule: Option<ApplicationRule>,
    ) -> Result<()> {
        self.ensure_configuration_free(name)?;
        let mut configuration = Configuration::new(name);
        configuration.set_rule(rule);
        for element in &self.elements {
            configuration.add_block(AreaBlock::new(*element, Vec::new(), false));
        }
        self.configurations.push(configuration);
        Ok(())
    }

    pub fn delete_configuration(&mut self, name: &str) -> Result<()> {
        let index = self.configuration_index(name)?;
        self.configurations.remove(index);
        if self.last_applied.as_deref() == Some(name) {
            self.last_applied = None;
        }
        info!("Configuration {} deleted from domain {}", name, self.name);
        Ok(())
    }

    pub fn rename_configuration(&mut self, name: &str, new_name: &str) -> Result<()> {
        let index = self.configuration_index(name)?;
        if name != new_name {
            self.ensure_configuration_free(new_name)?;
        }
        self.configurations[index].set_name(new_name);
        if self.last_applied.as_deref() == Some(name) {
            self.last_applied = Some(new_name.to_string());
        }
        info!(
            "Configuration {} renamed to {} in domain {}",
            name, new_name, self.name
        );
        Ok(())
    }

    /// Capture the live bytes of every owned element into `name`.
    pub fn save_configuration(
        &mut self,
        name: &str,
        tree: &ElementTree,
        blackboard: &Blackboard,
    ) -> Result<()> {
        self.configuration_mut(name)?.save(tree, blackboard)?;
        info!("Configuration {} of domain {} saved", name, self.name);
        Ok(())
    }

    /// Write `name` into the blackboard, then synchronize the owned
    /// elements when `auto_sync` is set.
    pub fn restore_configuration(
        &mut self,
        name: &str,
        tree: &mut ElementTree,
        blackboard: &mut Blackboard,
        auto_sync: bool,
        simulation: bool,
    ) -> Result<()> {
        self.configuration(name)?.restore(tree, blackboard)?;
        self.last_applied = Some(name.to_string());
        info!("Configuration {} of domain {} restored", name, self.name);

        if auto_sync {
            let mut syncer_set = SyncerSet::new();
            self.fill_syncer_set(tree, &mut syncer_set);
            syncer_set.sync(tree, blackboard, SyncDirection::Send, simulation)?;
        }
        Ok(())
    }

    pub fn set_application_rule(
        &mut self,
        configuration: &str,
        rule: Option<ApplicationRule>,
    ) -> Result<()> {
        self.configuration_mut(configuration)?.set_rule(rule);
        Ok(())
    }

    // ========================================================================
    // Elements
    // ========================================================================

    /// Associate `element`, extending every configuration with its live
    /// bytes. Owned descendants of `element` are merged into it: their
    /// stored bytes are kept inside the new block.
    pub fn add_element(
        &mut self,
        element: ElementId,
        tree: &ElementTree,
        blackboard: &Blackboard,
    ) -> Result<()> {
        let e = tree.element(element);
        let live = blackboard.region(e.offset(), e.footprint())?.to_vec();
        let merged = self.associate(element, tree)?;

        for configuration in &mut self.configurations {
            configuration.merge_blocks(element, &merged, tree, live.clone());
        }
        info!(
            "Configurable element {} added to domain {}",
            e.path(),
            self.name
        );
        Ok(())
    }

    /// Ownership checks and merge, without touching configuration data.
    /// Returns the owned descendants replaced by `element`.
    pub(crate) fn associate(
        &mut self,
        element: ElementId,
        tree: &ElementTree,
    ) -> Result<Vec<ElementId>> {
        if self.owns(element) {
            return Err(Error::ElementAlreadyOwned {
                domain: self.name.clone(),
                element: tree.path(element).to_string(),
            });
        }
        if let Some(ancestor) = tree.ancestors(element).find(|a| self.owns(*a)) {
            return Err(Error::ElementOwnedThroughAncestor {
                domain: self.name.clone(),
                element: tree.path(element).to_string(),
                ancestor: tree.path(ancestor).to_string(),
            });
        }

        let merged: Vec<ElementId> = self
            .elements
            .iter()
            .copied()
            .filter(|e| tree.is_ancestor(element, *e))
            .collect();
        for descendant in &merged {
            debug!(
                "Configurable element {} merged into {} in domain {}",
                tree.path(*descendant),
                tree.path(element),
                self.name
            );
            self.elements.retain(|e| e != descendant);
        }

        self.elements.push(element);
        Ok(merged)
    }

    pub fn remove_element(&mut self, element: ElementId, tree: &ElementTree) -> Result<()> {
        if !self.owns(element) {
            return Err(Error::ElementNotOwned {
                domain: self.name.clone(),
                element: tree.path(element).to_string(),
            });
        }
        self.detach(element);
        info!(
            "Configurable element {} removed from domain {}",
            tree.path(element),
            self.name
        );
        Ok(())
    }

    fn detach(&mut self, element: ElementId) {
        self.elements.retain(|e| *e != element);
        for configuration in &mut self.configurations {
            configuration.remove_block(element);
        }
    }

    /// Replace an owned component by its children.
    pub fn split(&mut self, element: ElementId, tree: &ElementTree) -> Result<()> {
        let Some(index) = self.elements.iter().position(|e| *e == element) else {
            return Err(Error::ElementNotOwned {
                domain: self.name.clone(),
                element: tree.path(element).to_string(),
            });
        };
        let children = tree.children(element);
        if children.is_empty() {
            return Err(Error::NothingToSplit(tree.path(element).to_string()));
        }

        self.elements.remove(index);
        for (position, child) in children.iter().enumerate() {
            self.elements.insert(index + position, *child);
        }
        for configuration in &mut self.configurations {
            configuration.split_block(element, tree);
        }
        info!(
            "Configurable element {} split into {} children in domain {}",
            tree.path(element),
            children.len(),
            self.name
        );
        Ok(())
    }

    // ========================================================================
    // Validation and application
    // ========================================================================

    /// Fill every invalid block: from the first configuration holding a
    /// valid block for the same element, else from the live blackboard.
    pub fn validate(&mut self, tree: &ElementTree, blackboard: &Blackboard) -> Result<()> {
        for index in 0..self.configurations.len() {
            self.validate_configuration(index, tree, blackboard)?;
        }
        Ok(())
    }

    fn validate_configuration(
        &mut self,
        index: usize,
        tree: &ElementTree,
        blackboard: &Blackboard,
    ) -> Result<()> {
        for element in self.elements.clone() {
            let valid = self.configurations[index]
                .block(element)
                .is_some_and(AreaBlock::is_valid);
            if valid {
                continue;
            }

            let from_configuration = self.configurations.iter().find_map(|c| {
                c.block(element)
                    .filter(|b| b.is_valid())
                    .map(|b| b.bytes().to_vec())
            });
            let bytes = match from_configuration {
                Some(bytes) => bytes,
                None => {
                    let e = tree.element(element);
                    blackboard.region(e.offset(), e.footprint())?.to_vec()
                }
            };
            self.configurations[index].fill_block(element, bytes);
        }
        Ok(())
    }

    /// Add the syncers of every owned element to `syncer_set`.
    pub fn fill_syncer_set(&self, tree: &ElementTree, syncer_set: &mut SyncerSet) {
        for element in &self.elements {
            tree.fill_syncer_set(*element, syncer_set);
        }
    }

    /// Restore the configuration selected by `oracle` and collect the
    /// syncers to run.
    ///
    /// Nothing happens when no configuration is selected, or when the
    /// selection is unchanged since the last application and `force` is
    /// not set. Returns true if a configuration was applied.
    pub fn apply(
        &mut self,
        tree: &ElementTree,
        blackboard: &mut Blackboard,
        syncer_set: &mut SyncerSet,
        force: bool,
        policy: ForcePolicy,
        oracle: &dyn RuleOracle,
    ) -> Result<bool> {
        let Some(configuration) = self
            .configurations
            .iter()
            .find(|c| oracle.is_active(&self.name, c))
        else {
            return Ok(false);
        };

        let changed = self.last_applied.as_deref() != Some(configuration.name());
        if !changed && !force {
            return Ok(false);
        }

        let targets: Vec<ElementId> = if changed || policy == ForcePolicy::AllOwned {
            self.elements.clone()
        } else {
            self.elements
                .iter()
                .copied()
                .filter(|element| {
                    let e = tree.element(*element);
                    match (
                        configuration.block(*element),
                        blackboard.region(e.offset(), e.footprint()),
                    ) {
                        (Some(block), Ok(live)) => block.is_valid() && block.bytes() != live,
                        _ => false,
                    }
                })
                .collect()
        };

        configuration.restore(tree, blackboard)?;
        for element in &targets {
            tree.fill_syncer_set(*element, syncer_set);
        }
        debug!(
            "Domain {}: applying configuration {} ({} of {} elements to synchronize)",
            self.name,
            configuration.name(),
            targets.len(),
            self.elements.len()
        );

        self.last_applied = Some(configuration.name().to_string());
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blackboard::BlackboardIo;
    use crate::element::TreeBuilder;
    use crate::subsystem::{HardwareAccess, HwError};
    use crate::types::{IntegerType, ParameterType};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Counting(Arc<AtomicUsize>);

    impl HardwareAccess for Counting {
        fn send_to_hw(&mut self, _io: &mut BlackboardIo<'_>) -> std::result::Result<(), HwError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct Fixture {
        tree: ElementTree,
        bb: Blackboard,
        group: ElementId,
        a: ElementId,
        c: ElementId,
        calls: Arc<AtomicUsize>,
    }

    fn fixture() -> Fixture {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut b = TreeBuilder::new("Sys");
        let root = b.root();
        let group = b.component(root, "Group").expect("group");
        let a = b.parameter(group, "A", ParameterType::boolean()).expect("a");
        let c = b
            .parameter(
                group,
                "C",
                ParameterType::from(IntegerType::new(1, false).expect("uint8")),
            )
            .expect("c");
        b.bind(a, Counting(calls.clone()));
        b.bind(c, Counting(calls.clone()));
        let tree = b.build();
        let bb = tree.new_blackboard();
        Fixture {
            tree,
            bb,
            group,
            a,
            c,
            calls,
        }
    }

    #[test]
    fn test_configuration_lifecycle() {
        let f = fixture();
        let mut domain = ConfigurableDomain::new("Audio");
        domain.create_configuration("Low", &f.tree, &f.bb).expect("create");
        assert!(matches!(
            domain.create_configuration("Low", &f.tree, &f.bb),
            Err(Error::ConfigurationAlreadyExists { .. })
        ));
        domain.rename_configuration("Low", "Quiet").expect("rename");
        assert_eq!(domain.configuration_names(), vec!["Quiet"]);
        assert!(matches!(
            domain.delete_configuration("Low"),
            Err(Error::ConfigurationNotFound { .. })
        ));
        domain.delete_configuration("Quiet").expect("delete");
        assert!(domain.configurations().is_empty());
    }

    #[test]
    fn test_add_element_extends_configurations() {
        let mut f = fixture();
        let mut domain = ConfigurableDomain::new("Audio");
        domain.create_configuration("Low", &f.tree, &f.bb).expect("create");
        f.bb.write_bytes(1, &[42]).expect("write");
        domain.add_element(f.c, &f.tree, &f.bb).expect("add");

        let low = domain.configuration("Low").expect("low");
        assert_eq!(low.stored_bytes(f.c), Some(&[42][..]));
        assert!(matches!(
            domain.add_element(f.c, &f.tree, &f.bb),
            Err(Error::ElementAlreadyOwned { .. })
        ));

        domain.remove_element(f.c, &f.tree).expect("remove");
        assert!(domain.configuration("Low").expect("low").blocks().is_empty());
        assert!(matches!(
            domain.remove_element(f.c, &f.tree),
            Err(Error::ElementNotOwned { .. })
        ));
    }

    #[test]
    fn test_ancestor_ownership() {
        let f = fixture();
        let mut domain = ConfigurableDomain::new("Audio");
        domain.add_element(f.a, &f.tree, &f.bb).expect("add a");
        domain.add_element(f.group, &f.tree, &f.bb).expect("merge into group");
        assert_eq!(domain.elements(), &[f.group]);
        assert!(domain.belongs(f.c, &f.tree));

        let err = domain
            .add_element(f.c, &f.tree, &f.bb)
            .expect_err("covered by group");
        assert_eq!(
            err.to_string(),
            "Configurable element /Sys/Group/C already associated to domain Audio through ancestor /Sys/Group"
        );
    }

    #[test]
    fn test_merge_keeps_saved_bytes() {
        let mut f = fixture();
        let mut domain = ConfigurableDomain::new("Audio");
        domain.add_element(f.a, &f.tree, &f.bb).expect("add a");
        domain.create_configuration("Low", &f.tree, &f.bb).expect("create");
        f.bb.write_bytes(0, &[1]).expect("a on");
        domain.save_configuration("Low", &f.tree, &f.bb).expect("save");

        f.bb.write_bytes(0, &[0, 9]).expect("a off, c live");
        domain.add_element(f.group, &f.tree, &f.bb).expect("merge");
        let low = domain.configuration("Low").expect("low");
        assert_eq!(low.blocks().len(), 1);
        assert_eq!(low.stored_bytes(f.group), Some(&[1, 9][..]));

        domain
            .restore_configuration("Low", &mut f.tree, &mut f.bb, false, false)
            .expect("restore");
        assert_eq!(f.bb.as_bytes(), &[1, 9]);
    }

    #[test]
    fn test_split() {
        let mut f = fixture();
        let mut domain = ConfigurableDomain::new("Audio");
        domain.add_element(f.group, &f.tree, &f.bb).expect("add");
        f.bb.write_bytes(0, &[1, 7]).expect("write");
        domain.create_configuration("Low", &f.tree, &f.bb).expect("create");
        domain.save_configuration("Low", &f.tree, &f.bb).expect("save");

        domain.split(f.group, &f.tree).expect("split");
        assert_eq!(domain.elements(), &[f.a, f.c]);
        let low = domain.configuration("Low").expect("low");
        assert_eq!(low.stored_bytes(f.a), Some(&[1][..]));
        assert_eq!(low.stored_bytes(f.c), Some(&[7][..]));
        assert!(matches!(
            domain.split(f.a, &f.tree),
            Err(Error::NothingToSplit(_))
        ));
    }

    #[test]
    fn test_validate_fills_from_valid_configuration() {
        let mut f = fixture();
        let mut domain = ConfigurableDomain::new("Audio");
        domain.associate(f.c, &f.tree).expect("associate");
        domain.import_configuration("A", None).expect("a");
        domain.import_configuration("B", None).expect("b");
        f.bb.write_bytes(1, &[5]).expect("write");

        domain.validate(&f.tree, &f.bb).expect("validate");
        for name in ["A", "B"] {
            let configuration = domain.configuration(name).expect("configuration");
            assert!(configuration.is_valid());
            assert_eq!(configuration.stored_bytes(f.c), Some(&[5][..]));
        }
    }

    #[test]
    fn test_restore_auto_sync() {
        let mut f = fixture();
        let mut domain = ConfigurableDomain::new("Audio");
        domain.add_element(f.group, &f.tree, &f.bb).expect("add");
        f.bb.write_bytes(0, &[1, 9]).expect("write");
        domain.create_configuration("Low", &f.tree, &f.bb).expect("create");
        f.bb.clear();

        domain
            .restore_configuration("Low", &mut f.tree, &mut f.bb, true, false)
            .expect("restore");
        assert_eq!(f.bb.as_bytes(), &[1, 9]);
        assert_eq!(f.calls.load(Ordering::SeqCst), 2);
        assert_eq!(domain.last_applied(), Some("Low"));
    }

    #[test]
    fn test_apply_selection_and_force() {
        let mut f = fixture();
        let mut domain = ConfigurableDomain::new("Audio");
        domain.add_element(f.a, &f.tree, &f.bb).expect("add a");
        domain.add_element(f.c, &f.tree, &f.bb).expect("add c");
        domain.create_configuration("Low", &f.tree, &f.bb).expect("create");
        let oracle = |_: &str, c: &Configuration| c.name() == "Low";

        let mut set = SyncerSet::new();
        let applied = domain
            .apply(&f.tree, &mut f.bb, &mut set, false, ForcePolicy::AllOwned, &oracle)
            .expect("apply");
        assert!(applied);
        assert_eq!(set.len(), 2);

        // Same selection, not forced
        let mut set = SyncerSet::new();
        let applied = domain
            .apply(&f.tree, &mut f.bb, &mut set, false, ForcePolicy::AllOwned, &oracle)
            .expect("apply");
        assert!(!applied);
        assert!(set.is_empty());

        // Forced, only the element that drifted from its stored value
        f.bb.write_bytes(1, &[3]).expect("drift");
        let mut set = SyncerSet::new();
        domain
            .apply(&f.tree, &mut f.bb, &mut set, true, ForcePolicy::ChangedOnly, &oracle)
            .expect("apply");
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![f.c]);
        assert_eq!(f.bb.as_bytes(), &[0, 0]);
    }

    #[test]
    fn test_rules_gate() {
        let f = fixture();
        let mut domain = ConfigurableDomain::new("Audio");
        domain.create_configuration("Night", &f.tree, &f.bb).expect("create");
        assert!(!domain.has_rules());
        domain
            .set_application_rule("Night", Some(ApplicationRule::new("Mode Is Night")))
            .expect("rule");
        assert!(domain.has_rules());
        domain.set_application_rule("Night", None).expect("clear");
        assert!(!domain.has_rules());
    }
}
