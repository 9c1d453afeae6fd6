// SPDX-License-Identifier: MIT OR Apache-2.0
//! Pulse payload: the leaf instruction of a sequence.

use crate::builder::{BuildError, Buildable};
use crate::preferences::Preferences;
use crate::registry::DependencyRegistry;
use crate::shape::Shape;

/// How `def_1` and `def_2` are interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DefMode {
    /// `def_1` is the start, `def_2` the stop
    #[default]
    StartStop,
    /// `def_1` is the start, `def_2` the duration
    StartDuration,
    /// `def_1` is the duration, `def_2` the stop
    DurationStop,
}

impl DefMode {
    /// Get the serialized label
    pub fn label(&self) -> &'static str {
        match self {
            Self::StartStop => "Start/Stop",
            Self::StartDuration => "Start/Duration",
            Self::DurationStop => "Duration/Stop",
        }
    }

    /// Parse a serialized label
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "Start/Stop" => Some(Self::StartStop),
            "Start/Duration" => Some(Self::StartDuration),
            "Duration/Stop" => Some(Self::DurationStop),
            _ => None,
        }
    }
}

/// Whether a pulse drives a logical or an analogical channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PulseKind {
    /// On/off output
    #[default]
    Logical,
    /// Shaped, optionally modulated output
    Analogical,
}

impl PulseKind {
    /// Get the serialized label
    pub fn label(&self) -> &'static str {
        match self {
            Self::Logical => "Logical",
            Self::Analogical => "Analogical",
        }
    }

    /// Parse a serialized label
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "Logical" => Some(Self::Logical),
            "Analogical" => Some(Self::Analogical),
            _ => None,
        }
    }
}

/// Carrier function of a modulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModulationKind {
    /// Sine carrier
    #[default]
    Sin,
    /// Cosine carrier
    Cos,
}

impl ModulationKind {
    /// Get the serialized label
    pub fn label(&self) -> &'static str {
        match self {
            Self::Sin => "sin",
            Self::Cos => "cos",
        }
    }

    /// Parse a serialized label
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "sin" => Some(Self::Sin),
            "cos" => Some(Self::Cos),
            _ => None,
        }
    }
}

/// Modulation applied to an analogical pulse
#[derive(Debug, Clone, PartialEq)]
pub struct Modulation {
    /// Whether the modulation is applied
    pub activated: bool,
    /// Carrier function
    pub kind: ModulationKind,
    /// Frequency expression
    pub frequency: String,
    /// Unit of the frequency
    pub frequency_unit: String,
    /// Phase expression
    pub phase: String,
    /// Unit of the phase
    pub phase_unit: String,
}

impl Modulation {
    /// Type identifier used for the modulation component
    pub const TYPE_ID: &'static str = "pulses.Modulation";
}

impl Default for Modulation {
    fn default() -> Self {
        Self {
            activated: false,
            kind: ModulationKind::Sin,
            frequency: String::new(),
            frequency_unit: "MHz".to_string(),
            phase: "0.0".to_string(),
            phase_unit: "rad".to_string(),
        }
    }
}

impl Buildable for Modulation {
    fn build_from_config(
        config: &Preferences,
        _dependencies: &DependencyRegistry,
    ) -> Result<Self, BuildError> {
        let mut modulation = Self::default();
        if let Some(activated) = config.bool_attr("activated")? {
            modulation.activated = activated;
        }
        if let Some(kind) = config.str_attr("kind")? {
            modulation.kind = ModulationKind::from_label(kind)
                .ok_or_else(|| config.invalid("kind", "one of sin, cos"))?;
        }
        if let Some(frequency) = config.str_attr("frequency")? {
            modulation.frequency = frequency.to_string();
        }
        if let Some(unit) = config.str_attr("frequency_unit")? {
            modulation.frequency_unit = unit.to_string();
        }
        if let Some(phase) = config.str_attr("phase")? {
            modulation.phase = phase.to_string();
        }
        if let Some(unit) = config.str_attr("phase_unit")? {
            modulation.phase_unit = unit.to_string();
        }
        Ok(modulation)
    }

    fn update_preferences(&self, preferences: &mut Preferences) {
        preferences.set("activated", self.activated);
        preferences.set("kind", self.kind.label());
        preferences.set("frequency", self.frequency.clone());
        preferences.set("frequency_unit", self.frequency_unit.clone());
        preferences.set("phase", self.phase.clone());
        preferences.set("phase_unit", self.phase_unit.clone());
    }
}

/// A pulse on one instrument channel
#[derive(Debug, Default)]
pub struct Pulse {
    /// First definition expression
    pub def_1: String,
    /// Second definition expression
    pub def_2: String,
    /// Meaning of the two definitions
    pub def_mode: DefMode,
    /// Logical or analogical output
    pub kind: PulseKind,
    /// Instrument channel name
    pub channel: String,
    /// Envelope of an analogical pulse
    pub shape: Option<Box<dyn Shape>>,
    /// Carrier modulation of an analogical pulse
    pub modulation: Modulation,
}

impl Pulse {
    /// Type identifier of a pulse
    pub const TYPE_ID: &'static str = "pulses.Pulse";

    /// Create a logical pulse with empty definitions
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a logical pulse from its two definitions
    pub fn with_definitions(def_1: impl Into<String>, def_2: impl Into<String>) -> Self {
        Self {
            def_1: def_1.into(),
            def_2: def_2.into(),
            ..Self::default()
        }
    }

    /// Turn this pulse into an analogical one with the given envelope
    pub fn analogical(mut self, shape: Box<dyn Shape>) -> Self {
        self.kind = PulseKind::Analogical;
        self.shape = Some(shape);
        self
    }
}

impl Buildable for Pulse {
    fn build_from_config(
        config: &Preferences,
        dependencies: &DependencyRegistry,
    ) -> Result<Self, BuildError> {
        let mut pulse = Self::default();
        if let Some(def_1) = config.str_attr("def_1")? {
            pulse.def_1 = def_1.to_string();
        }
        if let Some(def_2) = config.str_attr("def_2")? {
            pulse.def_2 = def_2.to_string();
        }
        if let Some(mode) = config.str_attr("def_mode")? {
            pulse.def_mode = DefMode::from_label(mode).ok_or_else(|| {
                config.invalid("def_mode", "one of Start/Stop, Start/Duration, Duration/Stop")
            })?;
        }
        if let Some(kind) = config.str_attr("kind")? {
            pulse.kind = PulseKind::from_label(kind)
                .ok_or_else(|| config.invalid("kind", "one of Logical, Analogical"))?;
        }
        if let Some(channel) = config.str_attr("channel")? {
            pulse.channel = channel.to_string();
        }
        if let Some(shape) = config.components.get("shape") {
            pulse.shape = Some(dependencies.build_shape(shape)?);
        }
        if let Some(modulation) = config.components.get("modulation") {
            pulse.modulation = Modulation::build_from_config(modulation, dependencies)?;
        }
        Ok(pulse)
    }

    fn update_preferences(&self, preferences: &mut Preferences) {
        preferences.set("def_1", self.def_1.clone());
        preferences.set("def_2", self.def_2.clone());
        preferences.set("def_mode", self.def_mode.label());
        preferences.set("kind", self.kind.label());
        preferences.set("channel", self.channel.clone());
        if let Some(shape) = &self.shape {
            preferences
                .components
                .insert("shape".to_string(), shape.preferences_from_members());
        }
        preferences.components.insert(
            "modulation".to_string(),
            self.modulation.preferences_with_id(Modulation::TYPE_ID),
        );
    }
}
