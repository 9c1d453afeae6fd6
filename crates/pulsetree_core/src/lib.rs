// SPDX-License-Identifier: MIT OR Apache-2.0
//! Hierarchical pulse sequences.
//!
//! This crate models an ordered program of timed items sent to an instrument:
//! - Pulses (leaf items with start/stop definitions)
//! - Sequences (ordered containers, possibly conditional)
//! - Root sequences (registry of linkable variables, external variables, context)
//!
//! ## Architecture
//!
//! Every item lives in an [`ItemArena`]. Containers own the membership of
//! their children; children only hold [`ItemId`] handles back to their
//! parent and root. Each mutation renumbers the flattened depth-first order
//! incrementally and keeps the root's linkable-variable registry in sync.
//!
//! Trees are persisted as [`Preferences`] documents and rebuilt through a
//! [`DependencyRegistry`] that maps type identifiers to factories.

pub mod arena;
pub mod builder;
pub mod context;
pub mod item;
pub mod preferences;
pub mod pulse;
pub mod registry;
pub mod root;
pub mod sequence;
pub mod shape;

pub use arena::{ItemArena, Node, SequenceError, Traverse};
pub use builder::{BuildError, Buildable};
pub use context::{Context, TestContext};
pub use item::{Item, ItemId, ItemKind};
pub use preferences::{DocumentError, DocumentFormat, Preferences};
pub use pulse::{DefMode, Modulation, ModulationKind, Pulse, PulseKind};
pub use registry::{Category, ContextFactory, DependencyRegistry, ItemFactory, ShapeFactory};
pub use root::{linkable_var_names, RootMut, RootSequence, SEQUENCE_END};
pub use sequence::{Sequence, SequenceMut};
pub use shape::{Shape, SquareShape};
