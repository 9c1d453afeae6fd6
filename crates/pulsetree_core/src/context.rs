// SPDX-License-Identifier: MIT OR Apache-2.0
//! Instrument contexts bound to a root sequence.

use crate::builder::{BuildError, Buildable};
use crate::preferences::Preferences;
use crate::registry::DependencyRegistry;
use std::fmt;

/// Instrument binding of a root sequence.
///
/// The core only carries the context through build and serialization;
/// compiling a sequence for an instrument is the context's business.
pub trait Context: fmt::Debug {
    /// Registry identifier of this context
    fn context_id(&self) -> &str;

    /// Channels pulses can be routed to
    fn channels(&self) -> Vec<String>;

    /// Serialize the context's members
    fn preferences_from_members(&self) -> Preferences;
}

/// Context with fixed channel lists, for tests and dry runs
#[derive(Debug, Clone, PartialEq)]
pub struct TestContext {
    /// Logical channel names
    pub logical_channels: Vec<String>,
    /// Analogical channel names
    pub analogical_channels: Vec<String>,
    /// Time unit used by the expressions
    pub time_unit: String,
}

impl TestContext {
    /// Registry identifier of the test context
    pub const CONTEXT_ID: &'static str = "pulses.TestContext";
}

impl Default for TestContext {
    fn default() -> Self {
        Self {
            logical_channels: vec!["Ch1_L".to_string(), "Ch2_L".to_string()],
            analogical_channels: vec!["Ch1_A".to_string(), "Ch2_A".to_string()],
            time_unit: "mus".to_string(),
        }
    }
}

impl Context for TestContext {
    fn context_id(&self) -> &str {
        Self::CONTEXT_ID
    }

    fn channels(&self) -> Vec<String> {
        self.logical_channels
            .iter()
            .chain(&self.analogical_channels)
            .cloned()
            .collect()
    }

    fn preferences_from_members(&self) -> Preferences {
        self.preferences_with_id(Self::CONTEXT_ID)
    }
}

impl Buildable for TestContext {
    fn build_from_config(
        config: &Preferences,
        _dependencies: &DependencyRegistry,
    ) -> Result<Self, BuildError> {
        let mut context = Self::default();
        if let Some(channels) = config.string_list_attr("logical_channels")? {
            context.logical_channels = channels;
        }
        if let Some(channels) = config.string_list_attr("analogical_channels")? {
            context.analogical_channels = channels;
        }
        if let Some(unit) = config.str_attr("time_unit")? {
            context.time_unit = unit.to_string();
        }
        Ok(context)
    }

    fn update_preferences(&self, preferences: &mut Preferences) {
        preferences.set("logical_channels", self.logical_channels.clone());
        preferences.set("analogical_channels", self.analogical_channels.clone());
        preferences.set("time_unit", self.time_unit.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channels() {
        let context = TestContext::default();
        assert_eq!(context.channels(), vec!["Ch1_L", "Ch2_L", "Ch1_A", "Ch2_A"]);
    }

    #[test]
    fn test_context_preferences() {
        let context = TestContext {
            logical_channels: vec!["Trig".to_string()],
            analogical_channels: Vec::new(),
            time_unit: "ns".to_string(),
        };
        let prefs = context.preferences_from_members();
        assert_eq!(prefs.item_id, TestContext::CONTEXT_ID);

        let rebuilt = TestContext::build_from_config(&prefs, &DependencyRegistry::new()).unwrap();
        assert_eq!(rebuilt, context);
    }

    #[test]
    fn test_channel_list_must_hold_strings() {
        let prefs = Preferences::new(TestContext::CONTEXT_ID)
            .with("logical_channels", serde_json::json!(["Ch1", 2]));
        let err = TestContext::build_from_config(&prefs, &DependencyRegistry::new()).unwrap_err();
        assert!(matches!(err, BuildError::InvalidAttribute { .. }));
    }
}
