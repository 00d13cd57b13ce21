// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Domain configurations.
//!
//! A [`Configuration`] stores one [`AreaBlock`] per element owned by its
//! domain: a copy of the element's blackboard bytes plus a validity flag.
//! Blocks created without data (description import) stay invalid until the
//! domain validates them.

use crate::blackboard::{Blackboard, OutOfBounds};
use crate::element::{ElementId, ElementTree};
use crate::rule::ApplicationRule;

/// Stored bytes of one element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AreaBlock {
    element: ElementId,
    bytes: Vec<u8>,
    valid: bool,
}

impl AreaBlock {
    pub(crate) fn new(element: ElementId, bytes: Vec<u8>, valid: bool) -> Self {
        Self {
            element,
            bytes,
            valid,
        }
    }

    pub fn element(&self) -> ElementId {
        self.element
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }
}

/// Named snapshot of a domain's owned elements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    name: String,
    rule: Option<ApplicationRule>,
    blocks: Vec<AreaBlock>,
}

impl Configuration {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rule: None,
            blocks: Vec::new(),
        }
    }

    pub(crate) fn from_parts(
        name: String,
        rule: Option<ApplicationRule>,
        blocks: Vec<AreaBlock>,
    ) -> Self {
        Self { name, rule, blocks }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    pub fn rule(&self) -> Option<&ApplicationRule> {
        self.rule.as_ref()
    }

    pub(crate) fn set_rule(&mut self, rule: Option<ApplicationRule>) {
        self.rule = rule;
    }

    /// True if a non-trivial application rule is attached.
    pub fn has_rule(&self) -> bool {
        self.rule.as_ref().is_some_and(|r| !r.is_trivial())
    }

    pub fn blocks(&self) -> &[AreaBlock] {
        &self.blocks
    }

    pub fn block(&self, element: ElementId) -> Option<&AreaBlock> {
        self.blocks.iter().find(|b| b.element == element)
    }

    /// Stored bytes of `element`, if owned.
    pub fn stored_bytes(&self, element: ElementId) -> Option<&[u8]> {
        self.block(element).map(AreaBlock::bytes)
    }

    /// True if every block holds valid data.
    pub fn is_valid(&self) -> bool {
        self.blocks.iter().all(|b| b.valid)
    }

    pub(crate) fn add_block(&mut self, block: AreaBlock) {
        self.blocks.push(block);
    }

    pub(crate) fn remove_block(&mut self, element: ElementId) -> Option<AreaBlock> {
        let index = self.blocks.iter().position(|b| b.element == element)?;
        Some(self.blocks.remove(index))
    }

    /// Add a valid block for `element` built from its `live` bytes, with the
    /// valid blocks of the `merged` descendants laid over it. The
    /// descendants' own blocks are dropped.
    pub(crate) fn merge_blocks(
        &mut self,
        element: ElementId,
        merged: &[ElementId],
        tree: &ElementTree,
        mut live: Vec<u8>,
    ) {
        let base = tree.element(element).offset();
        for descendant in merged {
            let Some(block) = self.remove_block(*descendant) else {
                continue;
            };
            if !block.valid {
                continue;
            }
            let start = tree.element(*descendant).offset() - base;
            if let Some(target) = live.get_mut(start..start + block.bytes.len()) {
                target.copy_from_slice(&block.bytes);
            }
        }
        self.add_block(AreaBlock::new(element, live, true));
    }

    /// Replace the block of `element` with per-child blocks carved out of it.
    pub(crate) fn split_block(&mut self, element: ElementId, tree: &ElementTree) {
        let Some(index) = self.blocks.iter().position(|b| b.element == element) else {
            return;
        };
        let block = self.blocks.remove(index);
        let base = tree.element(element).offset();

        for (position, child) in tree.children(element).iter().enumerate() {
            let child_element = tree.element(*child);
            let start = child_element.offset() - base;
            let end = start + child_element.footprint();
            let bytes = block
                .bytes
                .get(start..end)
                .map(<[u8]>::to_vec)
                .unwrap_or_else(|| vec![0; child_element.footprint()]);
            self.blocks
                .insert(index + position, AreaBlock::new(*child, bytes, block.valid));
        }
    }

    /// Copy the live bytes of every owned element into this configuration.
    pub(crate) fn save(
        &mut self,
        tree: &ElementTree,
        blackboard: &Blackboard,
    ) -> Result<(), OutOfBounds> {
        for block in &mut self.blocks {
            let element = tree.element(block.element);
            block.bytes = blackboard
                .region(element.offset(), element.footprint())?
                .to_vec();
            block.valid = true;
        }
        Ok(())
    }

    /// Write every valid block into `blackboard`.
    pub(crate) fn restore(
        &self,
        tree: &ElementTree,
        blackboard: &mut Blackboard,
    ) -> Result<(), OutOfBounds> {
        for block in self.blocks.iter().filter(|b| b.valid) {
            blackboard.write_bytes(tree.element(block.element).offset(), &block.bytes)?;
        }
        Ok(())
    }

    /// Mark `element`'s block valid with `bytes`.
    pub(crate) fn fill_block(&mut self, element: ElementId, bytes: Vec<u8>) {
        if let Some(block) = self.blocks.iter_mut().find(|b| b.element == element) {
            block.bytes = bytes;
            block.valid = true;
        }
    }
}
