// SPDX-License-Identifier: MIT OR Apache-2.0
//! Registry mapping serialized type identifiers to factories.
//!
//! The embedding application supplies the registry wholesale; the builder
//! only consumes it. Factories are plain function pointers, so a registry is
//! cheap to clone and carries no state of its own.

use crate::builder::{BuildError, Buildable};
use crate::context::{Context, TestContext};
use crate::item::ItemKind;
use crate::preferences::Preferences;
use crate::pulse::Pulse;
use crate::root::RootSequence;
use crate::sequence::{self, Sequence};
use crate::shape::{Shape, SquareShape};
use indexmap::IndexMap;
use std::fmt;

/// Factory producing an item payload from its document
pub type ItemFactory = fn(&Preferences, &DependencyRegistry) -> Result<ItemKind, BuildError>;

/// Factory producing a pulse shape from its document
pub type ShapeFactory = fn(&Preferences, &DependencyRegistry) -> Result<Box<dyn Shape>, BuildError>;

/// Factory producing a context from its document
pub type ContextFactory =
    fn(&Preferences, &DependencyRegistry) -> Result<Box<dyn Context>, BuildError>;

/// Registry category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Pulses, sequences and root sequences
    Items,
    /// Pulse shapes
    Shapes,
    /// Instrument contexts
    Contexts,
}

impl Category {
    /// Get the category name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Items => "items",
            Self::Shapes => "shapes",
            Self::Contexts => "contexts",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Build any [`Buildable`] item payload
pub fn build_item_kind<T>(
    config: &Preferences,
    dependencies: &DependencyRegistry,
) -> Result<ItemKind, BuildError>
where
    T: Buildable + Into<ItemKind>,
{
    Ok(T::build_from_config(config, dependencies)?.into())
}

/// Build any [`Buildable`] shape
pub fn build_boxed_shape<T>(
    config: &Preferences,
    dependencies: &DependencyRegistry,
) -> Result<Box<dyn Shape>, BuildError>
where
    T: Buildable + Shape + 'static,
{
    Ok(Box::new(T::build_from_config(config, dependencies)?))
}

/// Build any [`Buildable`] context
pub fn build_boxed_context<T>(
    config: &Preferences,
    dependencies: &DependencyRegistry,
) -> Result<Box<dyn Context>, BuildError>
where
    T: Buildable + Context + 'static,
{
    Ok(Box::new(T::build_from_config(config, dependencies)?))
}

/// Category -> (type identifier -> factory)
#[derive(Debug, Clone, Default)]
pub struct DependencyRegistry {
    items: IndexMap<String, ItemFactory>,
    shapes: IndexMap<String, ShapeFactory>,
    contexts: IndexMap<String, ContextFactory>,
}

impl DependencyRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the types shipped with this crate
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry
            .register_item(RootSequence::TYPE_ID, build_item_kind::<RootSequence>)
            .register_item(Pulse::TYPE_ID, build_item_kind::<Pulse>)
            .register_item(Sequence::TYPE_ID, build_item_kind::<Sequence>)
            .register_item(Sequence::CONDITIONAL_TYPE_ID, sequence::build_conditional)
            .register_shape(SquareShape::SHAPE_ID, build_boxed_shape::<SquareShape>)
            .register_context(TestContext::CONTEXT_ID, build_boxed_context::<TestContext>);
        registry
    }

    /// Register an item factory
    pub fn register_item(&mut self, type_id: impl Into<String>, factory: ItemFactory) -> &mut Self {
        self.items.insert(type_id.into(), factory);
        self
    }

    /// Register a shape factory
    pub fn register_shape(
        &mut self,
        type_id: impl Into<String>,
        factory: ShapeFactory,
    ) -> &mut Self {
        self.shapes.insert(type_id.into(), factory);
        self
    }

    /// Register a context factory
    pub fn register_context(
        &mut self,
        type_id: impl Into<String>,
        factory: ContextFactory,
    ) -> &mut Self {
        self.contexts.insert(type_id.into(), factory);
        self
    }

    /// Check whether a type identifier is known in a category
    pub fn contains(&self, category: Category, type_id: &str) -> bool {
        match category {
            Category::Items => self.items.contains_key(type_id),
            Category::Shapes => self.shapes.contains_key(type_id),
            Category::Contexts => self.contexts.contains_key(type_id),
        }
    }

    /// Type identifiers registered in a category
    pub fn type_ids(&self, category: Category) -> Vec<&str> {
        match category {
            Category::Items => self.items.keys().map(String::as_str).collect(),
            Category::Shapes => self.shapes.keys().map(String::as_str).collect(),
            Category::Contexts => self.contexts.keys().map(String::as_str).collect(),
        }
    }

    /// Look up the factory of an item type
    pub fn item_factory(&self, type_id: &str) -> Result<ItemFactory, BuildError> {
        self.items
            .get(type_id)
            .copied()
            .ok_or_else(|| unknown(Category::Items, type_id))
    }

    /// Build a shape from its document
    pub fn build_shape(&self, config: &Preferences) -> Result<Box<dyn Shape>, BuildError> {
        let factory = self
            .shapes
            .get(&config.item_id)
            .ok_or_else(|| unknown(Category::Shapes, &config.item_id))?;
        factory(config, self)
    }

    /// Build a context from its document
    pub fn build_context(&self, config: &Preferences) -> Result<Box<dyn Context>, BuildError> {
        let factory = self
            .contexts
            .get(&config.item_id)
            .ok_or_else(|| unknown(Category::Contexts, &config.item_id))?;
        factory(config, self)
    }
}

fn unknown(category: Category, type_id: &str) -> BuildError {
    BuildError::UnknownType {
        category,
        type_id: type_id.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins() {
        let registry = DependencyRegistry::with_builtins();
        assert!(registry.contains(Category::Items, RootSequence::TYPE_ID));
        assert!(registry.contains(Category::Items, Pulse::TYPE_ID));
        assert!(registry.contains(Category::Items, Sequence::CONDITIONAL_TYPE_ID));
        assert!(registry.contains(Category::Shapes, SquareShape::SHAPE_ID));
        assert!(registry.contains(Category::Contexts, TestContext::CONTEXT_ID));
        assert!(!registry.contains(Category::Items, SquareShape::SHAPE_ID));
        assert_eq!(registry.type_ids(Category::Shapes), vec![SquareShape::SHAPE_ID]);
    }

    #[test]
    fn test_unknown_item_names_category() {
        let registry = DependencyRegistry::new();
        let err = registry.item_factory("pulses.Pulse").unwrap_err();
        assert!(matches!(
            err,
            BuildError::UnknownType { category: Category::Items, ref type_id } if type_id == "pulses.Pulse"
        ));
    }

    #[test]
    fn test_aliases_share_factories() {
        let mut registry = DependencyRegistry::new();
        registry.register_item("legacy.Pulse", build_item_kind::<Pulse>);

        let prefs = Preferences::new("legacy.Pulse").with("def_1", "2.0");
        let factory = registry.item_factory("legacy.Pulse").unwrap();
        let kind = factory(&prefs, &registry).unwrap();
        assert!(matches!(kind, ItemKind::Pulse(ref pulse) if pulse.def_1 == "2.0"));
    }
}
