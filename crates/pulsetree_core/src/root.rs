// SPDX-License-Identifier: MIT OR Apache-2.0
//! Root sequence: entry point of a tree and owner of the linkable-variable registry.

use crate::builder::{BuildError, Buildable};
use crate::context::Context;
use crate::preferences::Preferences;
use crate::registry::DependencyRegistry;
use crate::sequence::{Sequence, SequenceMut};
use indexmap::{IndexMap, IndexSet};
use std::ops::Deref;

/// Linkable variable present while the root itself is time-constrained
pub const SEQUENCE_END: &str = "sequence_end";

/// Suffixes of the variables every indexed, time-constrained item exposes
const LINKABLE_SUFFIXES: [&str; 3] = ["start", "stop", "duration"];

/// Names of the linkable variables of the item at `index`
pub fn linkable_var_names(index: usize) -> [String; 3] {
    LINKABLE_SUFFIXES.map(|suffix| format!("{index}_{suffix}"))
}

/// Top-level sequence.
///
/// The registry in [`linkable_vars`](Self::linkable_vars) is derived state:
/// it is updated by [`ItemArena`](crate::ItemArena) on every mutation and is
/// read-only for consumers such as expression evaluators.
#[derive(Debug, Default)]
pub struct RootSequence {
    pub(crate) sequence: Sequence,
    /// Free variables usable in expressions
    pub external_vars: IndexMap<String, f64>,
    /// Instrument binding
    pub context: Option<Box<dyn Context>>,
    /// Total duration expression when the root is time-constrained
    pub sequence_duration: Option<String>,
    pub(crate) linkable_vars: IndexSet<String>,
}

impl RootSequence {
    /// Type identifier of a root sequence
    pub const TYPE_ID: &'static str = "pulses.RootSequence";

    /// Create a new empty root
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a root bound to a context
    pub fn with_context(context: Box<dyn Context>) -> Self {
        Self {
            context: Some(context),
            ..Self::default()
        }
    }

    /// Inner sequence (name, local variables, children)
    pub fn sequence(&self) -> &Sequence {
        &self.sequence
    }

    /// Registry of linkable variables for the whole tree
    pub fn linkable_vars(&self) -> &IndexSet<String> {
        &self.linkable_vars
    }

    /// Linkable variables in sorted order
    pub fn sorted_linkable_vars(&self) -> Vec<&str> {
        let mut vars: Vec<&str> = self.linkable_vars.iter().map(String::as_str).collect();
        vars.sort_unstable();
        vars
    }

    pub(crate) fn register(&mut self, index: usize) {
        for name in linkable_var_names(index) {
            self.linkable_vars.insert(name);
        }
    }

    pub(crate) fn unregister(&mut self, index: usize) {
        for name in linkable_var_names(index) {
            self.linkable_vars.shift_remove(&name);
        }
    }

    pub(crate) fn set_sequence_end(&mut self, present: bool) {
        if present {
            self.linkable_vars.insert(SEQUENCE_END.to_string());
        } else {
            self.linkable_vars.shift_remove(SEQUENCE_END);
        }
    }
}

/// Attribute editor for a root stored in an arena.
///
/// The linkable-variable registry and the children are not reachable
/// from here.
#[derive(Debug)]
pub struct RootMut<'a> {
    root: &'a mut RootSequence,
}

impl<'a> RootMut<'a> {
    pub(crate) fn new(root: &'a mut RootSequence) -> Self {
        Self { root }
    }

    /// Mutable external variables
    pub fn external_vars_mut(&mut self) -> &mut IndexMap<String, f64> {
        &mut self.root.external_vars
    }

    /// Mutable context binding
    pub fn context_mut(&mut self) -> &mut Option<Box<dyn Context>> {
        &mut self.root.context
    }

    /// Mutable total duration expression
    pub fn sequence_duration_mut(&mut self) -> &mut Option<String> {
        &mut self.root.sequence_duration
    }

    /// Editor for the inner sequence attributes
    pub fn sequence(&mut self) -> SequenceMut<'_> {
        SequenceMut::new(&mut self.root.sequence)
    }
}

impl Deref for RootMut<'_> {
    type Target = RootSequence;

    fn deref(&self) -> &RootSequence {
        self.root
    }
}

impl Buildable for RootSequence {
    fn build_from_config(
        config: &Preferences,
        dependencies: &DependencyRegistry,
    ) -> Result<Self, BuildError> {
        let context = config
            .components
            .get("context")
            .map(|context| dependencies.build_context(context))
            .transpose()?;

        Ok(Self {
            sequence: Sequence::build_from_config(config, dependencies)?,
            external_vars: config.f64_map_attr("external_vars")?.unwrap_or_default(),
            context,
            sequence_duration: config.str_attr("sequence_duration")?.map(str::to_string),
            linkable_vars: IndexSet::new(),
        })
    }

    fn update_preferences(&self, preferences: &mut Preferences) {
        self.sequence.update_preferences(preferences);
        preferences.set_f64_map("external_vars", &self.external_vars);
        if let Some(duration) = &self.sequence_duration {
            preferences.set("sequence_duration", duration.clone());
        }
        if let Some(context) = &self.context {
            preferences
                .components
                .insert("context".to_string(), context.preferences_from_members());
        }
    }
}
