// SPDX-License-Identifier: MIT OR Apache-2.0
//! Tree-wide properties of indexing, variable registration and rebuilding.

use pulsetree_core::{
    linkable_var_names, DependencyRegistry, Item, ItemArena, ItemId, Preferences, Pulse,
    RootSequence, Sequence, SquareShape, TestContext, SEQUENCE_END,
};
use std::collections::BTreeSet;

/// Small deterministic generator so failures are reproducible
struct XorShift(u64);

impl XorShift {
    fn next(&mut self) -> u64 {
        self.0 ^= self.0 << 13;
        self.0 ^= self.0 >> 7;
        self.0 ^= self.0 << 17;
        self.0
    }

    fn below(&mut self, bound: usize) -> usize {
        (self.next() % bound as u64) as usize
    }
}

/// Indices are 1..=n in pre-order and the registry holds exactly the
/// variables of the time-constrained items.
fn assert_consistent(arena: &ItemArena, root: ItemId) {
    let order: Vec<ItemId> = arena.traverse(root, None).items().collect();
    let indices: Vec<usize> = order
        .iter()
        .skip(1)
        .map(|id| arena.get(*id).unwrap().index())
        .collect();
    let expected: Vec<usize> = (1..order.len()).collect();
    assert_eq!(indices, expected);

    let mut expected_vars = BTreeSet::new();
    for id in order.iter().skip(1) {
        let item = arena.get(*id).unwrap();
        assert_eq!(item.root(), Some(root));
        if item.is_time_constrained() {
            expected_vars.extend(linkable_var_names(item.index()));
        }
    }
    let root_item = arena.get(root).unwrap();
    if root_item.is_time_constrained() {
        expected_vars.insert(SEQUENCE_END.to_string());
    }
    let actual: BTreeSet<String> = root_item
        .as_root()
        .unwrap()
        .linkable_vars()
        .iter()
        .cloned()
        .collect();
    assert_eq!(actual, expected_vars);
}

fn assert_detached(arena: &ItemArena, id: ItemId) {
    assert_eq!(arena.get(id).unwrap().parent(), None);
    for node in arena.traverse(id, None).items() {
        let item = arena.get(node).unwrap();
        assert_eq!(item.index(), 0);
        assert_eq!(item.root(), None);
    }
}

#[test]
fn random_edits_keep_indices_contiguous() {
    let mut rng = XorShift(0x5eed_1234_abcd_9876);
    let mut arena = ItemArena::new();
    let root = arena.insert(Item::new(RootSequence::new()).with_time_constrained(true));
    let mut detached: Vec<ItemId> = Vec::new();

    for step in 0..400 {
        let containers: Vec<ItemId> = arena
            .traverse(root, None)
            .items()
            .filter(|id| arena.get(*id).unwrap().kind().is_container())
            .collect();
        let target = containers[rng.below(containers.len())];
        let len = arena.children(target).unwrap().len();

        match rng.below(5) {
            0 | 1 => {
                let item = if rng.below(3) == 0 {
                    arena.insert(Sequence::new(format!("seq{step}")))
                } else {
                    arena.insert(Pulse::new())
                };
                arena.add_child_item(target, rng.below(len + 1), item).unwrap();
            }
            2 if len > 0 => {
                let removed = arena.remove_child_item(target, rng.below(len)).unwrap();
                assert_detached(&arena, removed);
                detached.push(removed);
            }
            3 if !detached.is_empty() => {
                let item = detached.swap_remove(rng.below(detached.len()));
                arena.add_child_item(target, rng.below(len + 1), item).unwrap();
            }
            _ => {
                let all: Vec<ItemId> = arena.traverse(root, None).items().collect();
                let item = all[rng.below(all.len())];
                let flag = !arena.get(item).unwrap().is_time_constrained();
                arena.set_time_constrained(item, flag).unwrap();
            }
        }
        assert_consistent(&arena, root);
    }
}

#[test]
fn nested_scenario_counts() {
    let mut arena = ItemArena::new();
    let root = arena.insert(RootSequence::with_context(Box::new(TestContext::default())));
    let leaves: Vec<ItemId> = (0..3).map(|_| arena.insert(Pulse::new())).collect();
    let sub = arena.insert(Sequence::new("sub"));
    let nested = arena.insert(Pulse::new());

    for (i, leaf) in leaves.iter().enumerate() {
        arena.add_child_item(root, i, *leaf).unwrap();
    }
    arena.add_child_item(root, 3, sub).unwrap();
    arena.add_child_item(sub, 0, nested).unwrap();

    let registry = |arena: &ItemArena| arena.get(root).unwrap().as_root().unwrap().linkable_vars().len();
    assert_eq!(arena.traverse(root, None).items().count(), 6);
    assert_eq!(registry(&arena), 12);

    arena.remove_child_item(root, 3).unwrap();
    assert_eq!(registry(&arena), 9);
    assert_detached(&arena, sub);
    assert_eq!(arena.get(nested).unwrap().parent(), Some(sub));
    assert_consistent(&arena, root);
}

#[test]
fn stale_root_never_receives_updates() {
    let mut arena = ItemArena::new();
    let root1 = arena.insert(RootSequence::new());
    let root2 = arena.insert(RootSequence::new());
    let subtree = arena.insert(Sequence::new("moving"));
    let inner = arena.insert(Pulse::new());
    let anchor = arena.insert(Pulse::new());
    arena.add_child_item(subtree, 0, inner).unwrap();
    arena.add_child_item(root1, 0, anchor).unwrap();
    arena.add_child_item(root1, 1, subtree).unwrap();

    arena.remove_child_item(root1, 1).unwrap();
    arena.set_root(subtree, Some(root2)).unwrap();
    arena.set_time_constrained(inner, false).unwrap();
    arena.set_time_constrained(inner, true).unwrap();
    arena.add_child_item(root2, 0, subtree).unwrap();

    let extra = arena.insert(Pulse::new());
    arena.add_child_item(root1, 0, extra).unwrap();
    arena.set_time_constrained(subtree, true).unwrap();

    assert_consistent(&arena, root1);
    assert_consistent(&arena, root2);
    let vars1 = arena.get(root1).unwrap().as_root().unwrap().sorted_linkable_vars();
    assert_eq!(vars1, vec!["1_duration", "1_start", "1_stop", "2_duration", "2_start", "2_stop"]);
    assert_eq!(arena.get(inner).unwrap().index(), 2);
}

#[test]
fn ron_document_round_trip() {
    let mut arena = ItemArena::new();
    let mut root = RootSequence::with_context(Box::new(TestContext::default()));
    root.external_vars.insert("a".to_string(), 1.5);
    root.sequence_duration = Some("{3_stop} + 1".to_string());
    let root = arena.insert(Item::new(root).with_time_constrained(true));
    let gate = arena.insert(Sequence::conditional("gate", "{a} > 1"));
    let shaped = arena.insert(
        Pulse::with_definitions("{1_stop}", "2.0").analogical(Box::new(SquareShape::new("0.25"))),
    );
    let trigger = arena.insert(Pulse::with_definitions("0", "1"));
    arena.add_child_item(root, 0, trigger).unwrap();
    arena.add_child_item(root, 1, gate).unwrap();
    arena.add_child_item(gate, 0, shaped).unwrap();

    let document = arena.preferences_from_members(root).unwrap().to_ron().unwrap();
    let loaded = Preferences::from_ron(&document).unwrap();

    let mut rebuilt = ItemArena::new();
    let copy = rebuilt
        .build_from_config(&loaded, &DependencyRegistry::with_builtins())
        .unwrap();
    assert_consistent(&rebuilt, copy);
    assert_eq!(
        rebuilt.preferences_from_members(copy).unwrap(),
        arena.preferences_from_members(root).unwrap()
    );
    assert_eq!(
        rebuilt.get(copy).unwrap().as_root().unwrap().sorted_linkable_vars(),
        arena.get(root).unwrap().as_root().unwrap().sorted_linkable_vars()
    );
}
