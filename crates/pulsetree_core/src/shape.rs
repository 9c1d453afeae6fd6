// SPDX-License-Identifier: MIT OR Apache-2.0
//! Pulse envelopes.

use crate::builder::{BuildError, Buildable};
use crate::preferences::Preferences;
use crate::registry::DependencyRegistry;
use std::fmt;

/// Envelope of an analogical pulse.
///
/// Shapes are supplied by the embedding application through the `shapes`
/// category of a [`DependencyRegistry`].
pub trait Shape: fmt::Debug {
    /// Registry identifier of this shape
    fn shape_id(&self) -> &str;

    /// Serialize the shape's members
    fn preferences_from_members(&self) -> Preferences;
}

/// Constant-amplitude envelope
#[derive(Debug, Clone, PartialEq)]
pub struct SquareShape {
    /// Amplitude expression
    pub amplitude: String,
}

impl SquareShape {
    /// Registry identifier of the square shape
    pub const SHAPE_ID: &'static str = "pulses.SquareShape";

    /// Create a square shape with the given amplitude
    pub fn new(amplitude: impl Into<String>) -> Self {
        Self {
            amplitude: amplitude.into(),
        }
    }
}

impl Default for SquareShape {
    fn default() -> Self {
        Self::new("1.0")
    }
}

impl Shape for SquareShape {
    fn shape_id(&self) -> &str {
        Self::SHAPE_ID
    }

    fn preferences_from_members(&self) -> Preferences {
        self.preferences_with_id(Self::SHAPE_ID)
    }
}

impl Buildable for SquareShape {
    fn build_from_config(
        config: &Preferences,
        _dependencies: &DependencyRegistry,
    ) -> Result<Self, BuildError> {
        Ok(match config.str_attr("amplitude")? {
            Some(amplitude) => Self::new(amplitude),
            None => Self::default(),
        })
    }

    fn update_preferences(&self, preferences: &mut Preferences) {
        preferences.set("amplitude", self.amplitude.clone());
    }
}
