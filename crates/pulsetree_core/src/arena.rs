// SPDX-License-Identifier: MIT OR Apache-2.0
//! Arena owning every item and the mutations that keep indices consistent.
//!
//! Items are numbered in depth-first pre-order below their root, starting at
//! 1 (the root keeps index 0). Mutations only touch the items whose flattened
//! position follows the edit point, and the root's linkable-variable registry
//! is updated through explicit calls at the same time.

use crate::item::{Item, ItemId, ItemKind};
use crate::pulse::{Pulse, PulseKind};
use crate::root::RootMut;
use crate::sequence::SequenceMut;
use indexmap::IndexMap;

/// Result type for structural operations
pub type Result<T> = std::result::Result<T, SequenceError>;

/// Owning store of items.
///
/// Sequences own the membership of their children through their child
/// lists; `parent` and `root` links are plain [`ItemId`] handles.
#[derive(Debug, Default)]
pub struct ItemArena {
    items: IndexMap<ItemId, Item>,
}

impl ItemArena {
    /// Create an empty arena
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a standalone item.
    ///
    /// The item starts detached with index 0. A root sequence references
    /// itself as root.
    pub fn insert(&mut self, item: impl Into<Item>) -> ItemId {
        let id = ItemId::new();
        let mut item = item.into();
        item.index = 0;
        item.parent = None;
        item.root = None;
        let time_constrained = item.time_constrained;
        if let ItemKind::Root(root) = &mut item.kind {
            root.linkable_vars.clear();
            root.set_sequence_end(time_constrained);
            item.root = Some(id);
        }
        self.items.insert(id, item);
        id
    }

    /// Get an item
    pub fn get(&self, id: ItemId) -> Option<&Item> {
        self.items.get(&id)
    }

    /// Mutable pulse payload
    pub fn pulse_mut(&mut self, id: ItemId) -> Option<&mut Pulse> {
        self.items.get_mut(&id).and_then(Item::as_pulse_mut)
    }

    /// Attribute editor of a sequence (roots expose their inner sequence)
    pub fn sequence_mut(&mut self, id: ItemId) -> Option<SequenceMut<'_>> {
        match &mut self.items.get_mut(&id)?.kind {
            ItemKind::Pulse(_) => None,
            ItemKind::Sequence(sequence) => Some(SequenceMut::new(sequence)),
            ItemKind::Root(root) => Some(SequenceMut::new(&mut root.sequence)),
        }
    }

    /// Attribute editor of a root sequence
    pub fn root_mut(&mut self, id: ItemId) -> Option<RootMut<'_>> {
        self.items.get_mut(&id)?.as_root_mut().map(RootMut::new)
    }

    /// Check if an item is stored
    pub fn contains(&self, id: ItemId) -> bool {
        self.items.contains_key(&id)
    }

    /// Number of stored items
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if the arena is empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Child item IDs of a container
    pub fn children(&self, id: ItemId) -> Result<&[ItemId]> {
        Ok(self.item(id)?.children())
    }

    /// Number of items in the subtree rooted at `id`, itself included
    pub fn subtree_size(&self, id: ItemId) -> usize {
        self.traverse(id, None).items().count()
    }

    /// Iterate over `id` and its ancestors, nearest first
    pub fn ancestors(&self, id: ItemId) -> impl Iterator<Item = ItemId> + '_ {
        std::iter::successors(self.contains(id).then_some(id), move |current| {
            self.items.get(current).and_then(Item::parent)
        })
    }

    /// Lazy pre-order traversal of `id` and its descendants.
    ///
    /// An expanded analogical pulse is followed by its modulation and its
    /// shape. `depth` of `None` is unbounded, `Some(0)` yields the item and
    /// its direct children, `Some(k)` descends `k` more levels.
    pub fn traverse(&self, id: ItemId, depth: Option<usize>) -> Traverse<'_> {
        let stack = if self.contains(id) { vec![(id, 0)] } else { Vec::new() };
        Traverse {
            arena: self,
            stack,
            components: Vec::new(),
            depth,
        }
    }

    /// Insert `item` into `sequence` at `position`.
    ///
    /// When the sequence is placed under a root, the inserted subtree is
    /// numbered, every following item is shifted by the subtree size and the
    /// linkable variables are registered. Otherwise the subtree stays
    /// dormant until an ancestor gets attached.
    pub fn add_child_item(&mut self, sequence: ItemId, position: usize, item: ItemId) -> Result<()> {
        let target = self.item(sequence)?;
        if !target.kind.is_container() {
            return Err(SequenceError::NotASequence(sequence));
        }
        let len = target.children().len();
        if position > len {
            return Err(SequenceError::PositionOutOfRange { position, len });
        }
        let sequence_root = target.root;

        let child = self.item(item)?;
        if child.is_root() {
            return Err(SequenceError::RootNotInsertable(item));
        }
        if child.parent.is_some() {
            return Err(SequenceError::AlreadyAttached(item));
        }
        if self.ancestors(sequence).any(|ancestor| ancestor == item) {
            return Err(SequenceError::WouldCreateCycle { item, sequence });
        }

        let Some(root) = self.placed_root(sequence) else {
            self.insert_child(sequence, position, item);
            let subtree: Vec<ItemId> = self.subtree(item);
            self.rebind(&subtree, sequence_root);
            return Ok(());
        };

        let start = self.item(sequence)?.index
            + 1
            + self.item(sequence)?.children()[..position]
                .iter()
                .map(|sibling| self.subtree_size(*sibling))
                .sum::<usize>();
        let inserted: Vec<ItemId> = self.subtree(item);
        let size = inserted.len();

        let following = self.following_items(sequence, position);
        self.shift_indices(root, &following, |index| index + size);
        self.insert_child(sequence, position, item);

        for (offset, id) in inserted.iter().enumerate() {
            if let Some(node) = self.items.get_mut(id) {
                node.index = start + offset;
                node.root = Some(root);
            }
        }
        for index in self.constrained_indices(&inserted) {
            self.register(root, index);
        }

        tracing::debug!(
            "Inserted {} item(s) at index {} ({} following item(s) shifted)",
            size,
            start,
            following.len()
        );
        Ok(())
    }

    /// Remove the item at `position` from `sequence` and return it.
    ///
    /// The removed subtree is detached: its variables are unregistered and
    /// every item in it gets index 0, no root, and the removed item loses
    /// its parent. Following items are shifted back.
    pub fn remove_child_item(&mut self, sequence: ItemId, position: usize) -> Result<ItemId> {
        let target = self.item(sequence)?;
        if !target.kind.is_container() {
            return Err(SequenceError::NotASequence(sequence));
        }
        let len = target.children().len();
        if position >= len {
            return Err(SequenceError::PositionOutOfRange { position, len });
        }
        let item = target.children()[position];
        let placed = self.placed_root(sequence);
        let following = match placed {
            Some(_) => self.following_items(sequence, position + 1),
            None => Vec::new(),
        };

        let removed: Vec<ItemId> = self.subtree(item);
        self.rebind(&removed, None);

        if let Some(root) = placed {
            let size = removed.len();
            self.shift_indices(root, &following, |index| index.saturating_sub(size));
            tracing::debug!(
                "Removed {} item(s) ({} following item(s) shifted)",
                size,
                following.len()
            );
        }

        if let Some(children) = self.item_mut(sequence)?.kind.children_mut() {
            children.remove(position);
        }
        self.item_mut(item)?.parent = None;
        Ok(item)
    }

    /// Toggle whether an item contributes linkable variables.
    ///
    /// For a placed item this adds or removes its three variables; for a
    /// root it adds or removes `sequence_end`.
    pub fn set_time_constrained(&mut self, id: ItemId, time_constrained: bool) -> Result<()> {
        let item = self.item_mut(id)?;
        if item.time_constrained == time_constrained {
            return Ok(());
        }
        item.time_constrained = time_constrained;
        if let ItemKind::Root(root) = &mut item.kind {
            root.set_sequence_end(time_constrained);
            return Ok(());
        }

        let index = item.index;
        if let (Some(root), true) = (item.root, index > 0) {
            if time_constrained {
                self.register(root, index);
            } else {
                self.unregister(root, index);
            }
        }
        Ok(())
    }

    /// Rebind a detached subtree to another root, or to none.
    ///
    /// Variables are released from the previous root before the handles are
    /// rewritten, so later edits never reach a root the subtree left.
    /// The subtree stays unnumbered until it is inserted below that root.
    pub fn set_root(&mut self, id: ItemId, root: Option<ItemId>) -> Result<()> {
        let item = self.item(id)?;
        if item.is_root() {
            return Err(SequenceError::RootNotInsertable(id));
        }
        if item.parent.is_some() {
            return Err(SequenceError::AttachedItem(id));
        }
        if let Some(root) = root {
            if !self.item(root)?.is_root() {
                return Err(SequenceError::NotARoot(root));
            }
        }
        let subtree: Vec<ItemId> = self.subtree(id);
        self.rebind(&subtree, root);
        Ok(())
    }

    /// Drop a detached subtree (or a whole tree, given its root) from the arena.
    ///
    /// Items left behind that still referenced a discarded root lose that
    /// handle.
    pub fn discard(&mut self, id: ItemId) -> Result<usize> {
        let item = self.item(id)?;
        if item.parent.is_some() {
            return Err(SequenceError::AttachedItem(id));
        }
        let item_is_root = item.is_root();
        let subtree: Vec<ItemId> = self.subtree(id);
        for node in &subtree {
            self.items.shift_remove(node);
        }
        if item_is_root {
            // Detached subtrees rebound to this root with `set_root`
            for node in self.items.values_mut() {
                if node.root == Some(id) {
                    node.root = None;
                }
            }
        }
        Ok(subtree.len())
    }

    fn subtree(&self, id: ItemId) -> Vec<ItemId> {
        self.traverse(id, None).items().collect()
    }

    fn item(&self, id: ItemId) -> Result<&Item> {
        self.items.get(&id).ok_or(SequenceError::ItemNotFound(id))
    }

    fn item_mut(&mut self, id: ItemId) -> Result<&mut Item> {
        self.items.get_mut(&id).ok_or(SequenceError::ItemNotFound(id))
    }

    /// Root of `id` when it is numbered below that root (or is the root)
    fn placed_root(&self, id: ItemId) -> Option<ItemId> {
        let item = self.items.get(&id)?;
        let root = item.root?;
        (root == id || item.index > 0).then_some(root)
    }

    fn insert_child(&mut self, sequence: ItemId, position: usize, item: ItemId) {
        if let Some(children) = self
            .items
            .get_mut(&sequence)
            .and_then(|node| node.kind.children_mut())
        {
            children.insert(position, item);
        }
        if let Some(node) = self.items.get_mut(&item) {
            node.parent = Some(sequence);
        }
    }

    /// Every item whose flattened position follows child `from - 1` of
    /// `sequence`: later siblings, then later siblings of each ancestor.
    fn following_items(&self, sequence: ItemId, from: usize) -> Vec<ItemId> {
        let mut following = Vec::new();
        let mut current = sequence;
        let mut from = from;
        loop {
            let Some(node) = self.items.get(&current) else {
                break;
            };
            for sibling in node.children().iter().skip(from) {
                following.extend(self.traverse(*sibling, None).items());
            }
            let Some(parent) = node.parent else {
                break;
            };
            let Some(position) = self
                .items
                .get(&parent)
                .and_then(|p| p.children().iter().position(|c| *c == current))
            else {
                break;
            };
            from = position + 1;
            current = parent;
        }
        following
    }

    /// Renumber `items` and move their variables to the new names
    fn shift_indices(&mut self, root: ItemId, items: &[ItemId], shift: impl Fn(usize) -> usize) {
        for index in self.constrained_indices(items) {
            self.unregister(root, index);
        }
        for id in items {
            if let Some(node) = self.items.get_mut(id) {
                node.index = shift(node.index);
            }
        }
        for index in self.constrained_indices(items) {
            self.register(root, index);
        }
    }

    /// Release the subtree's variables, reset indices and point it at `root`
    fn rebind(&mut self, subtree: &[ItemId], root: Option<ItemId>) {
        for id in subtree {
            let Some(node) = self.items.get(id) else {
                continue;
            };
            if let (Some(old_root), true) = (node.root, node.time_constrained && node.index > 0) {
                let index = node.index;
                self.unregister(old_root, index);
            }
            if let Some(node) = self.items.get_mut(id) {
                node.index = 0;
                node.root = root;
            }
        }
    }

    fn constrained_indices(&self, items: &[ItemId]) -> Vec<usize> {
        items
            .iter()
            .filter_map(|id| self.items.get(id))
            .filter(|node| node.time_constrained && node.index > 0 && !node.is_root())
            .map(Item::index)
            .collect()
    }

    fn register(&mut self, root: ItemId, index: usize) {
        if let Some(root) = self.items.get_mut(&root).and_then(Item::as_root_mut) {
            root.register(index);
        }
    }

    fn unregister(&mut self, root: ItemId, index: usize) {
        if let Some(root) = self.items.get_mut(&root).and_then(Item::as_root_mut) {
            root.unregister(index);
        }
    }
}

/// Node visited by [`ItemArena::traverse`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Node {
    /// An item of the tree
    Item(ItemId),
    /// Modulation of the analogical pulse with this ID
    Modulation(ItemId),
    /// Shape of the analogical pulse with this ID
    Shape(ItemId),
}

impl Node {
    /// Item this node is, or belongs to
    pub fn owner(self) -> ItemId {
        match self {
            Self::Item(id) | Self::Modulation(id) | Self::Shape(id) => id,
        }
    }

    /// Item ID when the node is an item
    pub fn item(self) -> Option<ItemId> {
        match self {
            Self::Item(id) => Some(id),
            Self::Modulation(_) | Self::Shape(_) => None,
        }
    }
}

/// Pre-order iterator returned by [`ItemArena::traverse`]
#[derive(Debug, Clone)]
pub struct Traverse<'a> {
    arena: &'a ItemArena,
    stack: Vec<(ItemId, usize)>,
    // Components of the last expanded pulse, in reverse order
    components: Vec<Node>,
    depth: Option<usize>,
}

impl<'a> Traverse<'a> {
    /// Skip pulse components and yield item IDs only
    pub fn items(self) -> impl Iterator<Item = ItemId> + 'a {
        self.filter_map(Node::item)
    }
}

impl Iterator for Traverse<'_> {
    type Item = Node;

    fn next(&mut self) -> Option<Node> {
        if let Some(component) = self.components.pop() {
            return Some(component);
        }
        let (id, level) = self.stack.pop()?;
        let expand = self.depth.map_or(true, |depth| level <= depth);
        if expand {
            if let Some(item) = self.arena.items.get(&id) {
                self.stack
                    .extend(item.children().iter().rev().map(|child| (*child, level + 1)));
                if let Some(pulse) = item.as_pulse().filter(|p| p.kind == PulseKind::Analogical) {
                    if pulse.shape.is_some() {
                        self.components.push(Node::Shape(id));
                    }
                    self.components.push(Node::Modulation(id));
                }
            }
        }
        Some(Node::Item(id))
    }
}

/// Error for structural operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SequenceError {
    /// Item not found in the arena
    #[error("Item not found: {0:?}")]
    ItemNotFound(ItemId),

    /// Item cannot hold children
    #[error("Item is not a sequence: {0:?}")]
    NotASequence(ItemId),

    /// Position outside the child list
    #[error("Position {position} out of range for a sequence of {len} item(s)")]
    PositionOutOfRange {
        /// Requested position
        position: usize,
        /// Current number of children
        len: usize,
    },

    /// Item already has a parent
    #[error("Item already attached: {0:?}")]
    AlreadyAttached(ItemId),

    /// Root sequences are always top-level
    #[error("Root sequence cannot be nested or rebound: {0:?}")]
    RootNotInsertable(ItemId),

    /// Item would become its own ancestor
    #[error("Inserting {item:?} into {sequence:?} would create a cycle")]
    WouldCreateCycle {
        /// Item being inserted
        item: ItemId,
        /// Target sequence
        sequence: ItemId,
    },

    /// The root of an attached item follows its parent
    #[error("Item is attached to a parent: {0:?}")]
    AttachedItem(ItemId),

    /// Item is not a root sequence
    #[error("Item is not a root sequence: {0:?}")]
    NotARoot(ItemId),
}
