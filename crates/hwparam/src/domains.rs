// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Root collection of configurable domains.
//!
//! Domain-level commands delegate to the named [`ConfigurableDomain`] and
//! fail with [`Error::DomainNotFound`] when it does not exist. Applying
//! gathers the syncers of every domain into one [`SyncerSet`] so an element
//! shared between domains is synchronized once per pass.

use crate::access::SerializeDirection;
use crate::blackboard::Blackboard;
use crate::config::ForcePolicy;
use crate::domain::ConfigurableDomain;
use crate::element::{ElementId, ElementTree};
use crate::error::{Error, Result};
use crate::rule::{ApplicationRule, RuleOracle};
use crate::settings;
use crate::subsystem::SyncDirection;
use crate::syncer_set::SyncerSet;
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigurableDomains {
    domains: Vec<ConfigurableDomain>,
}

impl ConfigurableDomains {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_domains(domains: Vec<ConfigurableDomain>) -> Self {
        Self { domains }
    }

    /// Domains in declaration order.
    pub fn domains(&self) -> &[ConfigurableDomain] {
        &self.domains
    }

    pub fn domain(&self, name: &str) -> Result<&ConfigurableDomain> {
        self.domains
            .iter()
            .find(|d| d.name() == name)
            .ok_or_else(|| Error::DomainNotFound(name.to_string()))
    }

    fn domain_mut(&mut self, name: &str) -> Result<&mut ConfigurableDomain> {
        self.domains
            .iter_mut()
            .find(|d| d.name() == name)
            .ok_or_else(|| Error::DomainNotFound(name.to_string()))
    }

    fn ensure_domain_free(&self, name: &str) -> Result<()> {
        if self.domains.iter().any(|d| d.name() == name) {
            return Err(Error::DomainAlreadyExists(name.to_string()));
        }
        Ok(())
    }

    // ========================================================================
    // Domains
    // ========================================================================

    pub fn list_domains(&self) -> Vec<&str> {
        self.domains.iter().map(ConfigurableDomain::name).collect()
    }

    pub fn create_domain(&mut self, name: &str) -> Result<()> {
        self.push_domain(ConfigurableDomain::new(name))?;
        info!("Configurable domain {} created", name);
        Ok(())
    }

    pub(crate) fn push_domain(&mut self, domain: ConfigurableDomain) -> Result<()> {
        self.ensure_domain_free(domain.name())?;
        self.domains.push(domain);
        Ok(())
    }

    /// Delete a domain. Domains holding application rules are protected.
    pub fn delete_domain(&mut self, name: &str) -> Result<()> {
        let index = self
            .domains
            .iter()
            .position(|d| d.name() == name)
            .ok_or_else(|| Error::DomainNotFound(name.to_string()))?;
        if self.domains[index].has_rules() {
            return Err(Error::DomainHasRules(name.to_string()));
        }
        self.domains.remove(index);
        info!("Configurable domain {} deleted", name);
        Ok(())
    }

    pub fn rename_domain(&mut self, name: &str, new_name: &str) -> Result<()> {
        if name != new_name {
            self.domain(name)?;
            self.ensure_domain_free(new_name)?;
        }
        self.domain_mut(name)?.set_name(new_name);
        info!("Configurable domain {} renamed to {}", name, new_name);
        Ok(())
    }

    // ========================================================================
    // Configurations
    // ========================================================================

    pub fn list_configurations(&self, domain: &str) -> Result<Vec<&str>> {
        Ok(self.domain(domain)?.configuration_names())
    }

    pub fn create_configuration(
        &mut self,
        domain: &str,
        name: &str,
        tree: &ElementTree,
        blackboard: &Blackboard,
    ) -> Result<()> {
        self.domain_mut(domain)?
            .create_configuration(name, tree, blackboard)
    }

    pub fn delete_configuration(&mut self, domain: &str, name: &str) -> Result<()> {
        self.domain_mut(domain)?.delete_configuration(name)
    }

    pub fn rename_configuration(
        &mut self,
        domain: &str,
        name: &str,
        new_name: &str,
    ) -> Result<()> {
        self.domain_mut(domain)?.rename_configuration(name, new_name)
    }

    pub fn save_configuration(
        &mut self,
        domain: &str,
        name: &str,
        tree: &ElementTree,
        blackboard: &Blackboard,
    ) -> Result<()> {
        self.domain_mut(domain)?
            .save_configuration(name, tree, blackboard)
    }

    pub fn restore_configuration(
        &mut self,
        domain: &str,
        name: &str,
        tree: &mut ElementTree,
        blackboard: &mut Blackboard,
        auto_sync: bool,
        simulation: bool,
    ) -> Result<()> {
        self.domain_mut(domain)?
            .restore_configuration(name, tree, blackboard, auto_sync, simulation)
    }

    pub fn set_application_rule(
        &mut self,
        domain: &str,
        configuration: &str,
        rule: ApplicationRule,
    ) -> Result<()> {
        self.domain_mut(domain)?
            .set_application_rule(configuration, Some(rule))
    }

    pub fn clear_application_rule(&mut self, domain: &str, configuration: &str) -> Result<()> {
        self.domain_mut(domain)?
            .set_application_rule(configuration, None)
    }

    /// `(domain, last applied configuration)` for every domain.
    pub fn list_last_applied_configurations(&self) -> Vec<(&str, Option<&str>)> {
        self.domains
            .iter()
            .map(|d| (d.name(), d.last_applied()))
            .collect()
    }

    // ========================================================================
    // Elements
    // ========================================================================

    pub fn add_element(
        &mut self,
        domain: &str,
        element: ElementId,
        tree: &ElementTree,
        blackboard: &Blackboard,
    ) -> Result<()> {
        self.domain_mut(domain)?
            .add_element(element, tree, blackboard)
    }

    pub fn remove_element(
        &mut self,
        domain: &str,
        element: ElementId,
        tree: &ElementTree,
    ) -> Result<()> {
        self.domain_mut(domain)?.remove_element(element, tree)
    }

    pub fn split(&mut self, domain: &str, element: ElementId, tree: &ElementTree) -> Result<()> {
        self.domain_mut(domain)?.split(element, tree)
    }

    pub fn list_domain_elements(&self, domain: &str) -> Result<&[ElementId]> {
        Ok(self.domain(domain)?.elements())
    }

    /// Distinct elements owned by any domain, in first-association order.
    pub fn list_associated_elements(&self) -> Vec<ElementId> {
        let mut elements: Vec<ElementId> = Vec::new();
        for domain in &self.domains {
            for element in domain.elements() {
                if !elements.contains(element) {
                    elements.push(*element);
                }
            }
        }
        elements
    }

    /// Domains owning `element` or one of its ancestors.
    pub fn belonging_domains(&self, element: ElementId, tree: &ElementTree) -> Vec<&str> {
        self.domains
            .iter()
            .filter(|d| d.belongs(element, tree))
            .map(ConfigurableDomain::name)
            .collect()
    }

    /// Associated elements belonging to more than one domain.
    pub fn list_conflicting_elements(&self, tree: &ElementTree) -> Vec<ElementId> {
        self.list_associated_elements()
            .into_iter()
            .filter(|e| self.belonging_domains(*e, tree).len() > 1)
            .collect()
    }

    // ========================================================================
    // Validation, application and persistence
    // ========================================================================

    pub fn validate(&mut self, tree: &ElementTree, blackboard: &Blackboard) -> Result<()> {
        for domain in &mut self.domains {
            domain.validate(tree, blackboard)?;
        }
        Ok(())
    }

    /// Apply the selected configuration of every domain, then synchronize
    /// the collected syncers in one pass.
    ///
    /// Best effort: failing syncers do not prevent the others and are
    /// reported together; blackboard changes are not rolled back.
    pub fn apply(
        &mut self,
        tree: &mut ElementTree,
        blackboard: &mut Blackboard,
        force: bool,
        policy: ForcePolicy,
        oracle: &dyn RuleOracle,
        simulation: bool,
    ) -> Result<()> {
        let mut syncer_set = SyncerSet::new();
        let mut applied = 0;
        for domain in &mut self.domains {
            if domain.apply(tree, blackboard, &mut syncer_set, force, policy, oracle)? {
                applied += 1;
            }
        }
        debug!(
            "Apply pass: {} domains applied, {} syncers to run",
            applied,
            syncer_set.len()
        );
        syncer_set.sync(tree, blackboard, SyncDirection::Send, simulation)?;
        Ok(())
    }

    /// Export (`Out`) or import (`In`) every domain to/from a binary
    /// settings file guarded by `checksum`. An import replaces the current
    /// domains only if the whole file is accepted.
    pub fn serialize_settings<P: AsRef<Path>>(
        &mut self,
        path: P,
        direction: SerializeDirection,
        checksum: u32,
        tree: &ElementTree,
    ) -> Result<()> {
        match direction {
            SerializeDirection::Out => settings::save(path, self, tree, checksum)?,
            SerializeDirection::In => {
                *self = settings::load(path, tree, checksum)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::TreeBuilder;
    use crate::types::ParameterType;

    fn tree() -> (ElementTree, ElementId, ElementId, ElementId) {
        let mut b = TreeBuilder::new("Sys");
        let root = b.root();
        let group = b.component(root, "Group").expect("group");
        let a = b.parameter(group, "A", ParameterType::boolean()).expect("a");
        let c = b.parameter(group, "C", ParameterType::boolean()).expect("c");
        (b.build(), group, a, c)
    }

    #[test]
    fn test_domain_lifecycle() {
        let mut domains = ConfigurableDomains::new();
        domains.create_domain("Audio").expect("create");
        assert!(matches!(
            domains.create_domain("Audio"),
            Err(Error::DomainAlreadyExists(_))
        ));
        domains.create_domain("Video").expect("create");
        assert!(matches!(
            domains.rename_domain("Audio", "Video"),
            Err(Error::DomainAlreadyExists(_))
        ));
        domains.rename_domain("Audio", "Sound").expect("rename");
        assert_eq!(domains.list_domains(), vec!["Sound", "Video"]);
        domains.delete_domain("Video").expect("delete");
        assert!(matches!(
            domains.delete_domain("Video"),
            Err(Error::DomainNotFound(_))
        ));
    }

    #[test]
    fn test_configuration_commands_need_domain() {
        let (tree, _, _, _) = tree();
        let bb = tree.new_blackboard();
        let mut domains = ConfigurableDomains::new();
        let err = domains
            .create_configuration("Missing", "Low", &tree, &bb)
            .expect_err("no domain");
        assert_eq!(err.to_string(), "Configurable domain Missing not found");
        assert!(domains.list_configurations("Missing").is_err());
    }

    #[test]
    fn test_delete_guarded_by_rules() {
        let (tree, _, _, _) = tree();
        let bb = tree.new_blackboard();
        let mut domains = ConfigurableDomains::new();
        domains.create_domain("Audio").expect("create");
        domains
            .create_configuration("Audio", "Night", &tree, &bb)
            .expect("configuration");
        domains
            .set_application_rule("Audio", "Night", ApplicationRule::new("Mode Is Night"))
            .expect("rule");

        let before = domains.clone();
        assert!(matches!(
            domains.delete_domain("Audio"),
            Err(Error::DomainHasRules(_))
        ));
        assert_eq!(domains, before);

        domains.clear_application_rule("Audio", "Night").expect("clear");
        domains.delete_domain("Audio").expect("delete");
    }

    #[test]
    fn test_associated_and_conflicting() {
        let (tree, group, a, c) = tree();
        let bb = tree.new_blackboard();
        let mut domains = ConfigurableDomains::new();
        domains.create_domain("One").expect("one");
        domains.create_domain("Two").expect("two");
        domains.add_element("One", group, &tree, &bb).expect("group");
        domains.add_element("Two", a, &tree, &bb).expect("a");
        domains.add_element("Two", c, &tree, &bb).expect("c");

        assert_eq!(domains.list_associated_elements(), vec![group, a, c]);
        assert_eq!(domains.list_conflicting_elements(&tree), vec![a, c]);
        assert_eq!(domains.belonging_domains(a, &tree), vec!["One", "Two"]);
        assert_eq!(domains.list_domain_elements("Two").expect("two"), &[a, c]);
    }

    #[test]
    fn test_last_applied_listing() {
        let (mut tree, _, a, _) = tree();
        let mut bb = tree.new_blackboard();
        let mut domains = ConfigurableDomains::new();
        domains.create_domain("One").expect("one");
        domains.create_domain("Two").expect("two");
        domains.add_element("One", a, &tree, &bb).expect("a");
        domains
            .create_configuration("One", "Low", &tree, &bb)
            .expect("configuration");
        domains
            .restore_configuration("One", "Low", &mut tree, &mut bb, false, false)
            .expect("restore");
        assert_eq!(
            domains.list_last_applied_configurations(),
            vec![("One", Some("Low")), ("Two", None)]
        );
    }
}
