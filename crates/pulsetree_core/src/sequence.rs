// SPDX-License-Identifier: MIT OR Apache-2.0
//! Sequence payload: an ordered container of items.

use crate::builder::{BuildError, Buildable};
use crate::item::{ItemId, ItemKind};
use crate::preferences::Preferences;
use crate::registry::DependencyRegistry;
use indexmap::IndexMap;
use std::ops::Deref;

/// An ordered container of items.
///
/// Insertion order is semantic: it defines evaluation and execution order.
/// Membership is edited through [`ItemArena`](crate::ItemArena).
#[derive(Debug, Default, PartialEq)]
pub struct Sequence {
    /// Display name
    pub name: String,
    /// Variables local to this sequence (name -> expression)
    pub local_vars: IndexMap<String, String>,
    /// Condition expression, present for conditional sequences
    pub condition: Option<String>,
    pub(crate) items: Vec<ItemId>,
}

impl Sequence {
    /// Type identifier of a plain sequence
    pub const TYPE_ID: &'static str = "pulses.BaseSequence";
    /// Type identifier of a conditional sequence
    pub const CONDITIONAL_TYPE_ID: &'static str = "pulses.ConditionalSequence";

    /// Create a new empty sequence
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Create a sequence that only runs when `condition` holds
    pub fn conditional(name: impl Into<String>, condition: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            condition: Some(condition.into()),
            ..Default::default()
        }
    }

    /// Child item IDs in order
    pub fn items(&self) -> &[ItemId] {
        &self.items
    }
}

/// Attribute editor for a sequence stored in an arena.
///
/// Gives access to the name, local variables and condition only; child
/// membership stays with [`ItemArena`](crate::ItemArena).
#[derive(Debug)]
pub struct SequenceMut<'a> {
    sequence: &'a mut Sequence,
}

impl<'a> SequenceMut<'a> {
    pub(crate) fn new(sequence: &'a mut Sequence) -> Self {
        Self { sequence }
    }

    /// Mutable display name
    pub fn name_mut(&mut self) -> &mut String {
        &mut self.sequence.name
    }

    /// Mutable local variables
    pub fn local_vars_mut(&mut self) -> &mut IndexMap<String, String> {
        &mut self.sequence.local_vars
    }

    /// Replace the condition expression
    pub fn set_condition(&mut self, condition: impl Into<String>) {
        self.sequence.condition = Some(condition.into());
    }
}

impl Deref for SequenceMut<'_> {
    type Target = Sequence;

    fn deref(&self) -> &Sequence {
        self.sequence
    }
}

impl Buildable for Sequence {
    fn build_from_config(
        config: &Preferences,
        _dependencies: &DependencyRegistry,
    ) -> Result<Self, BuildError> {
        Ok(Self {
            name: config.str_attr("name")?.unwrap_or_default().to_string(),
            local_vars: config.string_map_attr("local_vars")?.unwrap_or_default(),
            condition: config.str_attr("condition")?.map(str::to_string),
            items: Vec::new(),
        })
    }

    fn update_preferences(&self, preferences: &mut Preferences) {
        preferences.set("name", self.name.clone());
        if !self.local_vars.is_empty() {
            preferences.set_string_map("local_vars", &self.local_vars);
        }
        if let Some(condition) = &self.condition {
            preferences.set("condition", condition.clone());
        }
    }
}

/// Factory for conditional sequences; the `condition` attribute is required.
pub fn build_conditional(
    config: &Preferences,
    dependencies: &DependencyRegistry,
) -> Result<ItemKind, BuildError> {
    let sequence = Sequence::build_from_config(config, dependencies)?;
    if sequence.condition.is_none() {
        return Err(BuildError::MissingAttribute {
            type_id: config.item_id.clone(),
            attribute: "condition".to_string(),
        });
    }
    Ok(ItemKind::Sequence(sequence))
}
