// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Deduplicated syncer collection for one synchronization pass.

use crate::blackboard::Blackboard;
use crate::element::{ElementId, ElementTree};
use crate::subsystem::{SyncDirection, SyncFailure};
use std::collections::BTreeSet;

/// Set of syncers (identified by their owning element) gathered while
/// applying configurations. Each member is synchronized once per pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncerSet {
    members: BTreeSet<ElementId>,
}

impl SyncerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if the syncer was already present.
    pub fn insert(&mut self, id: ElementId) -> bool {
        self.members.insert(id)
    }

    /// Union with another set.
    pub fn extend(&mut self, other: &SyncerSet) {
        self.members.extend(other.members.iter().copied());
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.members.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn clear(&mut self) {
        self.members.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = ElementId> + '_ {
        self.members.iter().copied()
    }

    /// Synchronize every member.
    ///
    /// Best effort: a failing syncer does not stop the others, and all
    /// failures are returned together.
    pub fn sync(
        &self,
        tree: &mut ElementTree,
        blackboard: &mut Blackboard,
        direction: SyncDirection,
        simulation: bool,
    ) -> Result<(), SyncFailure> {
        let mut failure = SyncFailure::default();

        for id in &self.members {
            let Some(syncer) = tree.syncer_mut(*id) else {
                continue;
            };
            if let Err(e) = syncer.sync(blackboard, direction, simulation) {
                tracing::warn!("{}", e);
                failure.errors.push(e);
            }
        }

        if failure.is_empty() {
            Ok(())
        } else {
            Err(failure)
        }
    }
}
