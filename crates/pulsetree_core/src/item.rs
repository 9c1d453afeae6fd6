// SPDX-License-Identifier: MIT OR Apache-2.0
//! Item nodes stored in an [`ItemArena`](crate::ItemArena).

use crate::pulse::Pulse;
use crate::root::RootSequence;
use crate::sequence::Sequence;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemId(pub Uuid);

impl ItemId {
    /// Create a new random item ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ItemId {
    fn default() -> Self {
        Self::new()
    }
}

/// Concrete payload of an item
#[derive(Debug)]
pub enum ItemKind {
    /// Leaf pulse
    Pulse(Pulse),
    /// Ordered container of items
    Sequence(Sequence),
    /// Top-level container owning the variable registry
    Root(RootSequence),
}

impl ItemKind {
    /// Type identifier used when no explicit one is given
    pub fn default_type_id(&self) -> &'static str {
        match self {
            Self::Pulse(_) => Pulse::TYPE_ID,
            Self::Sequence(sequence) if sequence.condition.is_some() => Sequence::CONDITIONAL_TYPE_ID,
            Self::Sequence(_) => Sequence::TYPE_ID,
            Self::Root(_) => RootSequence::TYPE_ID,
        }
    }

    /// Whether items of this kind take part in timing unless told otherwise
    pub fn default_time_constrained(&self) -> bool {
        matches!(self, Self::Pulse(_))
    }

    /// Whether this kind can hold children
    pub fn is_container(&self) -> bool {
        !matches!(self, Self::Pulse(_))
    }

    pub(crate) fn children(&self) -> &[ItemId] {
        match self {
            Self::Pulse(_) => &[],
            Self::Sequence(sequence) => &sequence.items,
            Self::Root(root) => &root.sequence.items,
        }
    }

    pub(crate) fn children_mut(&mut self) -> Option<&mut Vec<ItemId>> {
        match self {
            Self::Pulse(_) => None,
            Self::Sequence(sequence) => Some(&mut sequence.items),
            Self::Root(root) => Some(&mut root.sequence.items),
        }
    }
}

/// An item node.
///
/// Structural state (`index`, `parent`, `root`, children) is only changed
/// through [`ItemArena`](crate::ItemArena) so that indices and the linkable
/// variable registry stay consistent. Items stored in an arena are never
/// handed out mutably; payload edits go through
/// [`ItemArena::pulse_mut`](crate::ItemArena::pulse_mut),
/// [`ItemArena::sequence_mut`](crate::ItemArena::sequence_mut) and
/// [`ItemArena::root_mut`](crate::ItemArena::root_mut).
#[derive(Debug)]
pub struct Item {
    type_id: String,
    pub(crate) index: usize,
    pub(crate) parent: Option<ItemId>,
    pub(crate) root: Option<ItemId>,
    pub(crate) time_constrained: bool,
    pub(crate) kind: ItemKind,
}

impl Item {
    /// Create a standalone item
    pub fn new(kind: impl Into<ItemKind>) -> Self {
        let kind = kind.into();
        Self {
            type_id: kind.default_type_id().to_string(),
            index: 0,
            parent: None,
            root: None,
            time_constrained: kind.default_time_constrained(),
            kind,
        }
    }

    /// Override the type identifier this item is serialized under
    pub fn with_type_id(mut self, type_id: impl Into<String>) -> Self {
        self.type_id = type_id.into();
        self
    }

    /// Set the initial time constraint flag
    pub fn with_time_constrained(mut self, time_constrained: bool) -> Self {
        self.time_constrained = time_constrained;
        self
    }

    /// Registry identifier of this item's type
    pub fn type_id(&self) -> &str {
        &self.type_id
    }

    /// Position in the flattened tree, `0` when not placed under a root
    pub fn index(&self) -> usize {
        self.index
    }

    /// Structural parent
    pub fn parent(&self) -> Option<ItemId> {
        self.parent
    }

    /// Root sequence this item belongs to
    pub fn root(&self) -> Option<ItemId> {
        self.root
    }

    /// Whether the item contributes linkable variables
    pub fn is_time_constrained(&self) -> bool {
        self.time_constrained
    }

    /// Whether this item is a root sequence
    pub fn is_root(&self) -> bool {
        matches!(self.kind, ItemKind::Root(_))
    }

    /// Item payload
    pub fn kind(&self) -> &ItemKind {
        &self.kind
    }

    /// Child item IDs in order (empty for pulses)
    pub fn children(&self) -> &[ItemId] {
        self.kind.children()
    }

    /// Get the pulse payload
    pub fn as_pulse(&self) -> Option<&Pulse> {
        match &self.kind {
            ItemKind::Pulse(pulse) => Some(pulse),
            _ => None,
        }
    }

    /// Get the mutable pulse payload
    pub fn as_pulse_mut(&mut self) -> Option<&mut Pulse> {
        match &mut self.kind {
            ItemKind::Pulse(pulse) => Some(pulse),
            _ => None,
        }
    }

    /// Get the sequence payload (roots expose their inner sequence)
    pub fn as_sequence(&self) -> Option<&Sequence> {
        match &self.kind {
            ItemKind::Pulse(_) => None,
            ItemKind::Sequence(sequence) => Some(sequence),
            ItemKind::Root(root) => Some(&root.sequence),
        }
    }

    /// Get the root payload
    pub fn as_root(&self) -> Option<&RootSequence> {
        match &self.kind {
            ItemKind::Root(root) => Some(root),
            _ => None,
        }
    }

    pub(crate) fn as_root_mut(&mut self) -> Option<&mut RootSequence> {
        match &mut self.kind {
            ItemKind::Root(root) => Some(root),
            _ => None,
        }
    }
}

impl From<ItemKind> for Item {
    fn from(kind: ItemKind) -> Self {
        Self::new(kind)
    }
}

impl From<Pulse> for ItemKind {
    fn from(pulse: Pulse) -> Self {
        Self::Pulse(pulse)
    }
}

impl From<Sequence> for ItemKind {
    fn from(sequence: Sequence) -> Self {
        Self::Sequence(sequence)
    }
}

impl From<RootSequence> for ItemKind {
    fn from(root: RootSequence) -> Self {
        Self::Root(root)
    }
}

impl From<Pulse> for Item {
    fn from(pulse: Pulse) -> Self {
        Self::new(pulse)
    }
}

impl From<Sequence> for Item {
    fn from(sequence: Sequence) -> Self {
        Self::new(sequence)
    }
}

impl From<RootSequence> for Item {
    fn from(root: RootSequence) -> Self {
        Self::new(root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_per_kind() {
        let pulse = Item::new(Pulse::new());
        assert!(pulse.is_time_constrained());
        assert_eq!(pulse.type_id(), Pulse::TYPE_ID);
        assert!(pulse.children().is_empty());

        let sequence = Item::new(Sequence::new("block"));
        assert!(!sequence.is_time_constrained());
        assert_eq!(sequence.type_id(), Sequence::TYPE_ID);

        let conditional = Item::new(Sequence::conditional("branch", "{a} > 1"));
        assert_eq!(conditional.type_id(), Sequence::CONDITIONAL_TYPE_ID);

        let root = Item::new(RootSequence::new());
        assert!(root.is_root());
        assert_eq!(root.index(), 0);
        assert!(root.as_sequence().is_some());
    }

    #[test]
    fn test_builder_overrides() {
        let item = Item::new(Pulse::new())
            .with_type_id("custom.Pulse")
            .with_time_constrained(false);
        assert_eq!(item.type_id(), "custom.Pulse");
        assert!(!item.is_time_constrained());
    }
}
