// SPDX-License-Identifier: MIT OR Apache-2.0
//! `pulsetree-inspect`: load a sequence document, rebuild it and report
//! the flattened item numbering together with the linkable variables.

use std::path::PathBuf;

use clap::Parser;
use pulsetree_core::{
    BuildError, DependencyRegistry, DocumentError, ItemArena, ItemId, Node, SequenceError,
};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser, Debug)]
#[command(name = "pulsetree-inspect", version, about)]
struct Args {
    /// Sequence document (`.ron` or `.json`)
    document: PathBuf,

    /// Limit how deep the item listing descends
    #[arg(short, long)]
    depth: Option<usize>,

    /// Print the document regenerated from the rebuilt tree
    #[arg(long)]
    dump: bool,
}

#[derive(Debug, thiserror::Error)]
enum InspectError {
    #[error("Failed to read document: {0}")]
    Document(#[from] DocumentError),
    #[error("Failed to build sequence: {0}")]
    Build(#[from] BuildError),
    #[error("Inconsistent sequence: {0}")]
    Sequence(#[from] SequenceError),
    #[error("Failed to write RON: {0}")]
    Ron(#[from] ron::Error),
}

fn main() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("pulsetree_inspect=info,pulsetree_core=info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    if let Err(e) = run(&args) {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), InspectError> {
    let preferences = pulsetree_core::Preferences::load(&args.document)?;
    let dependencies = DependencyRegistry::with_builtins();

    let mut arena = ItemArena::new();
    let root = arena.build_from_config(&preferences, &dependencies)?;
    tracing::info!(
        "Loaded {} with {} items",
        args.document.display(),
        arena.len()
    );

    for node in arena.traverse(root, args.depth) {
        println!("{}", describe(&arena, root, node)?);
    }

    if let Some(root_sequence) = arena.get(root).and_then(|item| item.as_root()) {
        if let Some(context) = &root_sequence.context {
            println!();
            println!("context {} channels: {}", context.context_id(), context.channels().join(", "));
        }
        println!();
        println!("linkable variables:");
        for name in root_sequence.sorted_linkable_vars() {
            println!("  {name}");
        }
    }

    if args.dump {
        println!();
        println!("{}", arena.preferences_from_members(root)?.to_ron()?);
    }
    Ok(())
}

/// One listing line, indented by nesting level
fn describe(arena: &ItemArena, root: ItemId, node: Node) -> Result<String, SequenceError> {
    let id = node.owner();
    let item = arena.get(id).ok_or(SequenceError::ItemNotFound(id))?;
    let level = arena.ancestors(id).take_while(|ancestor| *ancestor != root).count();
    let indent = "  ".repeat(level);

    // Components are listed below their pulse, without an index
    match (node, item.as_pulse()) {
        (Node::Modulation(_), Some(pulse)) => {
            let modulation = &pulse.modulation;
            return Ok(format!(
                "{indent}      modulation {} {} {} phase {} {}{}",
                modulation.kind.label(),
                modulation.frequency,
                modulation.frequency_unit,
                modulation.phase,
                modulation.phase_unit,
                if modulation.activated { "" } else { " (off)" }
            ));
        }
        (Node::Shape(_), Some(pulse)) => {
            let shape_id = pulse.shape.as_ref().map_or("none", |shape| shape.shape_id());
            return Ok(format!("{indent}      shape {shape_id}"));
        }
        _ => {}
    }
    let marker = if item.is_time_constrained() { "*" } else { " " };

    let label = match (item.as_pulse(), item.as_sequence()) {
        (Some(pulse), _) => format!(
            "{} {} [{}] {} / {}",
            pulse.kind.label(),
            pulse.channel,
            pulse.def_mode.label(),
            pulse.def_1,
            pulse.def_2
        ),
        (None, Some(sequence)) => match &sequence.condition {
            Some(condition) => format!("{} if {condition}", sequence.name),
            None => sequence.name.clone(),
        },
        (None, None) => String::new(),
    };
    Ok(format!("{indent}{marker}{:>3} {} {label}", item.index(), item.type_id()))
}
