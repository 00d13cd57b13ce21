// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Configurable element tree.
//!
//! Elements live in an arena indexed by [`ElementId`]. A node is either a
//! component (ordered children) or a parameter (a shared
//! [`ParameterType`]). Offsets are assigned depth-first at build time so a
//! component's footprint is the contiguous run of its descendants:
//!
//! ```text
//! /Board            offset 0, footprint 6
//! ├── /Board/Amp    offset 0, footprint 4
//! │   ├── Gain      offset 0, footprint 2  (FixedPoint Q7.8)
//! │   ├── Mute      offset 2, footprint 1  (Boolean)
//! │   └── Route     offset 3, footprint 1  (Enum)
//! └── /Board/Volume offset 4, footprint 2  (Integer)
//! ```
//!
//! Elements may own a [`SubsystemObject`]; it is created and dropped with the
//! tree.

use crate::blackboard::Blackboard;
use crate::error::{Error, Result, StructureError};
use crate::subsystem::{HardwareAccess, SubsystemObject};
use crate::syncer_set::SyncerSet;
use crate::types::ParameterType;
use crate::xml::XmlElement;
use std::collections::HashMap;
use std::sync::Arc;

/// Handle to an element of an [`ElementTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(usize);

impl ElementId {
    /// Arena index of the element.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Node variant.
#[derive(Debug, Clone)]
pub enum ElementKind {
    Component { children: Vec<ElementId> },
    Parameter { parameter_type: Arc<ParameterType> },
}

/// One configurable element.
#[derive(Debug)]
pub struct Element {
    name: String,
    path: String,
    parent: Option<ElementId>,
    offset: usize,
    footprint: usize,
    kind: ElementKind,
    syncer: Option<SubsystemObject>,
}

impl Element {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn parent(&self) -> Option<ElementId> {
        self.parent
    }

    /// Absolute blackboard offset.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Size in bytes of the element and all its descendants.
    pub fn footprint(&self) -> usize {
        self.footprint
    }

    pub fn kind(&self) -> &ElementKind {
        &self.kind
    }

    pub fn children(&self) -> &[ElementId] {
        match &self.kind {
            ElementKind::Component { children } => children,
            ElementKind::Parameter { .. } => &[],
        }
    }

    pub fn parameter_type(&self) -> Option<&Arc<ParameterType>> {
        match &self.kind {
            ElementKind::Parameter { parameter_type } => Some(parameter_type),
            ElementKind::Component { .. } => None,
        }
    }

    pub fn is_parameter(&self) -> bool {
        matches!(self.kind, ElementKind::Parameter { .. })
    }

    pub fn has_syncer(&self) -> bool {
        self.syncer.is_some()
    }

    fn kind_name(&self) -> &'static str {
        match &self.kind {
            ElementKind::Component { .. } => "Component",
            ElementKind::Parameter { parameter_type } => parameter_type.kind(),
        }
    }
}

/// Immutable layout of configurable elements.
#[derive(Debug)]
pub struct ElementTree {
    elements: Vec<Element>,
    by_path: HashMap<String, ElementId>,
    checksum: u32,
}

impl ElementTree {
    pub fn root(&self) -> ElementId {
        ElementId(0)
    }

    /// Element by handle.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not produced by this tree.
    pub fn element(&self, id: ElementId) -> &Element {
        &self.elements[id.0]
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Iterate elements in depth-first order.
    pub fn iter(&self) -> impl Iterator<Item = (ElementId, &Element)> + '_ {
        self.preorder(self.root())
            .into_iter()
            .map(move |id| (id, self.element(id)))
    }

    pub fn find(&self, path: &str) -> Option<ElementId> {
        self.by_path.get(path).copied()
    }

    /// Like [`find`](Self::find), failing with [`Error::ElementNotFound`].
    pub fn resolve(&self, path: &str) -> Result<ElementId> {
        self.find(path)
            .ok_or_else(|| Error::ElementNotFound(path.to_string()))
    }

    pub fn path(&self, id: ElementId) -> &str {
        self.element(id).path()
    }

    pub fn children(&self, id: ElementId) -> &[ElementId] {
        self.element(id).children()
    }

    /// Strict ancestors, nearest first.
    pub fn ancestors(&self, id: ElementId) -> impl Iterator<Item = ElementId> + '_ {
        std::iter::successors(self.element(id).parent, move |p| self.element(*p).parent)
    }

    /// True if `ancestor` is a strict ancestor of `id`.
    pub fn is_ancestor(&self, ancestor: ElementId, id: ElementId) -> bool {
        self.ancestors(id).any(|a| a == ancestor)
    }

    /// Descendants of `id` (excluding `id`), depth-first.
    pub fn descendants(&self, id: ElementId) -> Vec<ElementId> {
        let mut out = self.preorder(id);
        out.remove(0);
        out
    }

    fn preorder(&self, id: ElementId) -> Vec<ElementId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev());
        }
        out
    }

    /// Parameter type of a leaf element.
    pub fn parameter_type(&self, id: ElementId) -> Result<&Arc<ParameterType>> {
        let element = self.element(id);
        element
            .parameter_type()
            .ok_or_else(|| Error::NotAParameter(element.path.clone()))
    }

    /// Total size of the blackboard backing this tree.
    pub fn footprint(&self) -> usize {
        self.element(self.root()).footprint
    }

    /// A zeroed blackboard sized for this tree.
    pub fn new_blackboard(&self) -> Blackboard {
        Blackboard::new(self.footprint())
    }

    /// Fingerprint of the layout (paths, kinds, offsets, footprints).
    pub fn structure_checksum(&self) -> u32 {
        self.checksum
    }

    /// Add the syncers responsible for `id` to `set`.
    ///
    /// The nearest bound ancestor-or-self is used; without one, every
    /// bound descendant (the topmost under each branch) is added.
    pub fn fill_syncer_set(&self, id: ElementId, set: &mut SyncerSet) {
        let owner = std::iter::once(id)
            .chain(self.ancestors(id))
            .find(|a| self.element(*a).has_syncer());
        match owner {
            Some(owner) => {
                set.insert(owner);
            }
            None => self.fill_from_descendants(id, set),
        }
    }

    fn fill_from_descendants(&self, id: ElementId, set: &mut SyncerSet) {
        for child in self.children(id) {
            if self.element(*child).has_syncer() {
                set.insert(*child);
            } else {
                self.fill_from_descendants(*child, set);
            }
        }
    }

    pub(crate) fn syncer_mut(&mut self, id: ElementId) -> Option<&mut SubsystemObject> {
        self.elements.get_mut(id.0).and_then(|e| e.syncer.as_mut())
    }
}

struct PendingNode {
    name: String,
    path: String,
    parent: Option<ElementId>,
    kind: ElementKind,
}

/// Incremental builder for an [`ElementTree`].
pub struct TreeBuilder {
    nodes: Vec<PendingNode>,
    bindings: HashMap<ElementId, Box<dyn HardwareAccess>>,
}

impl TreeBuilder {
    /// Start a tree whose root component is `/<root_name>`.
    pub fn new(root_name: impl Into<String>) -> Self {
        let name = root_name.into();
        Self {
            nodes: vec![PendingNode {
                path: format!("/{}", name),
                name,
                parent: None,
                kind: ElementKind::Component {
                    children: Vec::new(),
                },
            }],
            bindings: HashMap::new(),
        }
    }

    pub fn root(&self) -> ElementId {
        ElementId(0)
    }

    /// Build a tree from a structure document.
    ///
    /// The root element names the tree; `Component` elements nest, any
    /// other element is a parameter type (`BooleanParameter`, ...).
    pub fn from_xml(root: &XmlElement) -> std::result::Result<Self, StructureError> {
        let name = root
            .attribute("Name")
            .ok_or_else(|| StructureError::MissingAttribute {
                path: "/".to_string(),
                attribute: "Name",
            })?;
        let mut builder = Self::new(name);
        let root_id = builder.root();
        builder.import_children(root_id, root)?;
        Ok(builder)
    }

    fn import_children(
        &mut self,
        parent: ElementId,
        element: &XmlElement,
    ) -> std::result::Result<(), StructureError> {
        for child in element.children() {
            let parent_path = self.nodes[parent.0].path.clone();
            let name = child
                .attribute("Name")
                .ok_or_else(|| StructureError::MissingAttribute {
                    path: parent_path.clone(),
                    attribute: "Name",
                })?;
            if child.name() == "Component" {
                let id = self.component(parent, name)?;
                self.import_children(id, child)?;
            } else {
                let parameter_type = ParameterType::from_xml(child, &parent_path)?;
                self.parameter(parent, name, parameter_type)?;
            }
        }
        Ok(())
    }

    /// Add a component under `parent`.
    pub fn component(
        &mut self,
        parent: ElementId,
        name: &str,
    ) -> std::result::Result<ElementId, StructureError> {
        self.push(
            parent,
            name,
            ElementKind::Component {
                children: Vec::new(),
            },
        )
    }

    /// Add a parameter under `parent`. Pass an `Arc` to share one type
    /// between several parameters.
    pub fn parameter(
        &mut self,
        parent: ElementId,
        name: &str,
        parameter_type: impl Into<Arc<ParameterType>>,
    ) -> std::result::Result<ElementId, StructureError> {
        self.push(
            parent,
            name,
            ElementKind::Parameter {
                parameter_type: parameter_type.into(),
            },
        )
    }

    /// Attach a hardware binding; a later binding replaces an earlier one.
    pub fn bind(&mut self, id: ElementId, binding: impl HardwareAccess + 'static) {
        self.bindings.insert(id, Box::new(binding));
    }

    fn push(
        &mut self,
        parent: ElementId,
        name: &str,
        kind: ElementKind,
    ) -> std::result::Result<ElementId, StructureError> {
        let id = ElementId(self.nodes.len());
        let parent_node = &self.nodes[parent.0];
        let path = format!("{}/{}", parent_node.path, name);

        let ElementKind::Component { children } = &parent_node.kind else {
            return Err(StructureError::ParameterParent(parent_node.path.clone()));
        };
        if children.iter().any(|c| self.nodes[c.0].name == name) {
            return Err(StructureError::DuplicateChild {
                parent: parent_node.path.clone(),
                name: name.to_string(),
            });
        }

        if let ElementKind::Component { children } = &mut self.nodes[parent.0].kind {
            children.push(id);
        }
        self.nodes.push(PendingNode {
            name: name.to_string(),
            path,
            parent: Some(parent),
            kind,
        });
        Ok(id)
    }

    /// Assign offsets, attach syncers and compute the structure checksum.
    pub fn build(self) -> ElementTree {
        let TreeBuilder {
            nodes,
            mut bindings,
        } = self;

        let mut elements: Vec<Element> = nodes
            .into_iter()
            .map(|node| Element {
                name: node.name,
                path: node.path,
                parent: node.parent,
                offset: 0,
                footprint: 0,
                kind: node.kind,
                syncer: None,
            })
            .collect();

        layout(&mut elements, ElementId(0), 0);

        for (index, element) in elements.iter_mut().enumerate() {
            if let Some(binding) = bindings.remove(&ElementId(index)) {
                element.syncer = Some(SubsystemObject::new(
                    element.path.clone(),
                    element.offset,
                    element.footprint,
                    binding,
                ));
            }
        }

        let by_path = elements
            .iter()
            .enumerate()
            .map(|(index, e)| (e.path.clone(), ElementId(index)))
            .collect();

        let mut tree = ElementTree {
            elements,
            by_path,
            checksum: 0,
        };
        tree.checksum = compute_checksum(&tree);
        tracing::debug!(
            "Element tree built: {} elements, {} bytes, checksum {:#010x}",
            tree.len(),
            tree.footprint(),
            tree.checksum
        );
        tree
    }
}

/// Depth-first offset assignment; returns the footprint of `id`.
fn layout(elements: &mut [Element], id: ElementId, offset: usize) -> usize {
    let footprint = match &elements[id.0].kind {
        ElementKind::Parameter { parameter_type } => parameter_type.size(),
        ElementKind::Component { children } => {
            let children = children.clone();
            let mut next = offset;
            for child in children {
                next += layout(elements, child, next);
            }
            next - offset
        }
    };
    let element = &mut elements[id.0];
    element.offset = offset;
    element.footprint = footprint;
    footprint
}

fn compute_checksum(tree: &ElementTree) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    for (_, element) in tree.iter() {
        hasher.update(element.path.as_bytes());
        hasher.update(&[0]);
        hasher.update(element.kind_name().as_bytes());
        hasher.update(&(element.offset as u64).to_le_bytes());
        hasher.update(&(element.footprint as u64).to_le_bytes());
    }
    hasher.finalize()
}
