// SPDX-License-Identifier: MIT OR Apache-2.0
//! Reconstruction of sequence trees from [`Preferences`] documents.
//!
//! Children are built completely, below a detached node, before they are
//! inserted into their parent in document order. The indexing done by
//! [`ItemArena::add_child_item`] therefore runs once per node, exactly as
//! when a tree is assembled by hand.

use crate::arena::{ItemArena, SequenceError};
use crate::item::{Item, ItemId, ItemKind};
use crate::preferences::Preferences;
use crate::registry::{Category, DependencyRegistry};

/// Types that can be rebuilt from, and written to, a [`Preferences`] document
pub trait Buildable: Sized {
    /// Build a value from its document
    fn build_from_config(
        config: &Preferences,
        dependencies: &DependencyRegistry,
    ) -> Result<Self, BuildError>;

    /// Write this value's members into a document
    fn update_preferences(&self, preferences: &mut Preferences);

    /// Serialize into a new document for the given type identifier
    fn preferences_with_id(&self, item_id: &str) -> Preferences {
        let mut preferences = Preferences::new(item_id);
        self.update_preferences(&mut preferences);
        preferences
    }
}

impl ItemArena {
    /// Build a root sequence and its whole tree from a document.
    ///
    /// The document's `item_id` is resolved in the `items` category and
    /// must produce a root sequence.
    ///
    /// On error every node created for the document is dropped again, so
    /// the arena is left as it was.
    pub fn build_from_config(
        &mut self,
        preferences: &Preferences,
        dependencies: &DependencyRegistry,
    ) -> Result<ItemId, BuildError> {
        let factory = dependencies.item_factory(&preferences.item_id)?;
        let root = factory(preferences, dependencies)?;
        if !matches!(root, ItemKind::Root(_)) {
            return Err(BuildError::UnexpectedType {
                type_id: preferences.item_id.clone(),
                expected: "root sequence",
            });
        }
        let time_constrained = preferences.bool_attr("time_constrained")?.unwrap_or(false);
        let root_id = self.insert(
            Item::new(root)
                .with_type_id(preferences.item_id.clone())
                .with_time_constrained(time_constrained),
        );

        if let Err(err) = self.attach_children(root_id, &preferences.items, dependencies) {
            let _ = self.discard(root_id);
            return Err(err);
        }

        tracing::info!(
            "Built sequence tree with {} item(s)",
            self.subtree_size(root_id) - 1
        );
        Ok(root_id)
    }

    /// Serialize an item and its children into a document
    pub fn preferences_from_members(&self, id: ItemId) -> Result<Preferences, SequenceError> {
        let item = self.get(id).ok_or(SequenceError::ItemNotFound(id))?;
        let mut preferences = Preferences::new(item.type_id());
        preferences.set("time_constrained", item.is_time_constrained());
        match item.kind() {
            ItemKind::Pulse(pulse) => pulse.update_preferences(&mut preferences),
            ItemKind::Sequence(sequence) => sequence.update_preferences(&mut preferences),
            ItemKind::Root(root) => root.update_preferences(&mut preferences),
        }
        for child in item.children() {
            preferences.items.push(self.preferences_from_members(*child)?);
        }
        Ok(preferences)
    }

    /// Build one detached item and its subtree
    fn build_item(
        &mut self,
        preferences: &Preferences,
        dependencies: &DependencyRegistry,
    ) -> Result<ItemId, BuildError> {
        let factory = dependencies.item_factory(&preferences.item_id)?;
        let kind = factory(preferences, dependencies)?;
        if matches!(kind, ItemKind::Root(_)) {
            return Err(BuildError::UnexpectedType {
                type_id: preferences.item_id.clone(),
                expected: "child item",
            });
        }
        let time_constrained = preferences
            .bool_attr("time_constrained")?
            .unwrap_or_else(|| kind.default_time_constrained());
        let id = self.insert(
            Item::new(kind)
                .with_type_id(preferences.item_id.clone())
                .with_time_constrained(time_constrained),
        );

        if let Err(err) = self.attach_children(id, &preferences.items, dependencies) {
            let _ = self.discard(id);
            return Err(err);
        }
        Ok(id)
    }

    fn attach_children(
        &mut self,
        parent: ItemId,
        documents: &[Preferences],
        dependencies: &DependencyRegistry,
    ) -> Result<(), BuildError> {
        for (position, document) in documents.iter().enumerate() {
            let child = self.build_item(document, dependencies)?;
            if let Err(err) = self.add_child_item(parent, position, child) {
                let _ = self.discard(child);
                return Err(err.into());
            }
        }
        Ok(())
    }
}

/// Error while building from a document
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// Type identifier missing from its registry category
    #[error("Unknown {category} type: {type_id}")]
    UnknownType {
        /// Category that was searched
        category: Category,
        /// Identifier that was not found
        type_id: String,
    },

    /// Required attribute absent
    #[error("Missing attribute '{attribute}' for {type_id}")]
    MissingAttribute {
        /// Type of the document
        type_id: String,
        /// Attribute name
        attribute: String,
    },

    /// Attribute of the wrong shape
    #[error("Invalid attribute '{attribute}' for {type_id}: expected {expected}")]
    InvalidAttribute {
        /// Type of the document
        type_id: String,
        /// Attribute name
        attribute: String,
        /// Description of the accepted values
        expected: &'static str,
    },

    /// Document describes the wrong kind of item
    #[error("Document of type {type_id} cannot be used as a {expected}")]
    UnexpectedType {
        /// Type of the document
        type_id: String,
        /// What the document was used as
        expected: &'static str,
    },

    /// Structural error while assembling the tree
    #[error("Sequence error: {0}")]
    Sequence(#[from] SequenceError),
}
