// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Application rules and the oracle that evaluates them.
//!
//! Rule text is opaque here. Whether a configuration is applicable is asked
//! of a [`RuleOracle`] supplied by the embedding system.

use crate::configuration::Configuration;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque application rule attached to a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApplicationRule(String);

impl ApplicationRule {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Blank rules carry no selection criterion.
    pub fn is_trivial(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for ApplicationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Decides which configuration of a domain is currently applicable.
pub trait RuleOracle: Send {
    /// True if `configuration` of `domain` should be applied.
    fn is_active(&self, domain: &str, configuration: &Configuration) -> bool;
}

impl<F> RuleOracle for F
where
    F: Fn(&str, &Configuration) -> bool + Send,
{
    fn is_active(&self, domain: &str, configuration: &Configuration) -> bool {
        self(domain, configuration)
    }
}

/// Oracle that never selects a configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRules;

impl RuleOracle for NoRules {
    fn is_active(&self, _domain: &str, _configuration: &Configuration) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trivial_rule() {
        assert!(ApplicationRule::new("  ").is_trivial());
        assert!(!ApplicationRule::new("Mode Is Night").is_trivial());
        assert_eq!(ApplicationRule::new("Mode Is Night").to_string(), "Mode Is Night");
    }

    #[test]
    fn test_closure_oracle() {
        let night = Configuration::new("Night");
        let day = Configuration::new("Day");
        let oracle = |_: &str, c: &Configuration| c.name() == "Night";
        assert!(oracle.is_active("Lights", &night));
        assert!(!oracle.is_active("Lights", &day));
        assert!(!NoRules.is_active("Lights", &night));
    }
}
