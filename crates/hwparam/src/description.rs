// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Domains description (TOML).
//!
//! Describes the domains, their elements and configurations without any
//! stored data:
//!
//! ```toml
//! system_class_name = "Audio"
//!
//! [[domains]]
//! name = "Volume"
//! elements = ["/Audio/Codec/Gain", "/Audio/Codec/Mute"]
//!
//! [[domains.configurations]]
//! name = "Night"
//! rule = "Mode Is Night"
//!
//! [[domains.configurations]]
//! name = "Default"
//! ```
//!
//! Imported configurations hold invalid blocks until the domains are
//! validated.

use crate::config::ConfigError;
use crate::domain::ConfigurableDomain;
use crate::domains::ConfigurableDomains;
use crate::element::ElementTree;
use crate::error::Result;
use crate::rule::ApplicationRule;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level description.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DomainsDescription {
    /// Name of the structure root the element paths refer to.
    #[serde(default)]
    pub system_class_name: Option<String>,

    #[serde(default)]
    pub domains: Vec<DomainDescription>,
}

/// One domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DomainDescription {
    pub name: String,

    /// Absolute element paths.
    #[serde(default)]
    pub elements: Vec<String>,

    #[serde(default)]
    pub configurations: Vec<ConfigurationDescription>,
}

/// One configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigurationDescription {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule: Option<ApplicationRule>,
}

impl DomainsDescription {
    /// Load a description from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> std::result::Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> std::result::Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml(&self) -> std::result::Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Describe existing domains.
    pub fn describe(domains: &ConfigurableDomains, tree: &ElementTree) -> Self {
        Self {
            system_class_name: Some(tree.element(tree.root()).name().to_string()),
            domains: domains
                .domains()
                .iter()
                .map(|domain| DomainDescription {
                    name: domain.name().to_string(),
                    elements: domain
                        .elements()
                        .iter()
                        .map(|e| tree.path(*e).to_string())
                        .collect(),
                    configurations: domain
                        .configurations()
                        .iter()
                        .map(|c| ConfigurationDescription {
                            name: c.name().to_string(),
                            rule: c.rule().cloned(),
                        })
                        .collect(),
                })
                .collect(),
        }
    }

    /// Build the domains against `tree`. Nothing is returned unless the
    /// whole description is consistent.
    pub fn build(&self, tree: &ElementTree) -> Result<ConfigurableDomains> {
        let mut domains = ConfigurableDomains::new();

        for description in &self.domains {
            let mut domain = ConfigurableDomain::new(description.name.as_str());
            for path in &description.elements {
                domain.associate(tree.resolve(path)?, tree)?;
            }
            for configuration in &description.configurations {
                domain.import_configuration(&configuration.name, configuration.rule.clone())?;
            }
            domains.push_domain(domain)?;
        }

        Ok(domains)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::TreeBuilder;
    use crate::error::Error;
    use crate::types::ParameterType;

    const DESCRIPTION: &str = r#"
        system_class_name = "Audio"

        [[domains]]
        name = "Volume"
        elements = ["/Audio/Mute", "/Audio/Boost"]

        [[domains.configurations]]
        name = "Night"
        rule = "Mode Is Night"

        [[domains.configurations]]
        name = "Default"
    "#;

    fn tree() -> ElementTree {
        let mut b = TreeBuilder::new("Audio");
        let root = b.root();
        b.parameter(root, "Mute", ParameterType::boolean()).expect("mute");
        b.parameter(root, "Boost", ParameterType::boolean()).expect("boost");
        b.build()
    }

    #[test]
    fn test_build() {
        let tree = tree();
        let description = DomainsDescription::from_toml(DESCRIPTION).expect("parse");
        let domains = description.build(&tree).expect("build");

        let volume = domains.domain("Volume").expect("volume");
        assert_eq!(volume.elements().len(), 2);
        assert_eq!(volume.configuration_names(), vec!["Night", "Default"]);
        assert!(volume.has_rules());
        assert!(!volume.configuration("Default").expect("default").is_valid());
    }

    #[test]
    fn test_unknown_element() {
        let tree = tree();
        let description = DomainsDescription::from_toml(
            r#"
            [[domains]]
            name = "Volume"
            elements = ["/Audio/Gain"]
            "#,
        )
        .expect("parse");
        assert!(matches!(
            description.build(&tree),
            Err(Error::ElementNotFound(path)) if path == "/Audio/Gain"
        ));
    }

    #[test]
    fn test_duplicate_domain() {
        let tree = tree();
        let description = DomainsDescription::from_toml(
            r#"
            [[domains]]
            name = "Volume"
            [[domains]]
            name = "Volume"
            "#,
        )
        .expect("parse");
        assert!(matches!(
            description.build(&tree),
            Err(Error::DomainAlreadyExists(_))
        ));
    }

    #[test]
    fn test_describe_round_trip() {
        let tree = tree();
        let description = DomainsDescription::from_toml(DESCRIPTION).expect("parse");
        let domains = description.build(&tree).expect("build");
        let described = DomainsDescription::describe(&domains, &tree);
        assert_eq!(described, description);

        let text = described.to_toml().expect("serialize");
        assert_eq!(
            DomainsDescription::from_toml(&text).expect("reparse"),
            description
        );
    }
}
