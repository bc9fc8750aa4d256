use std::collections::HashSet;

use proptest::prelude::*;

use family_graph::prelude::*;

#[derive(Debug, Clone)]
enum Step {
    Add { anchor: usize, kind: RelativeKind },
    Remove { target: usize },
    Reroot { target: usize },
}

fn arb_kind() -> impl Strategy<Value = RelativeKind> {
    prop_oneof![
        Just(RelativeKind::Child),
        Just(RelativeKind::Sibling),
        Just(RelativeKind::Partner),
        Just(RelativeKind::ParentUp),
        Just(RelativeKind::AuntOrUncle),
        Just(RelativeKind::Cousin),
        Just(RelativeKind::Other),
    ]
}

fn arb_step() -> impl Strategy<Value = Step> {
    prop_oneof![
        6 => (any::<usize>(), arb_kind()).prop_map(|(anchor, kind)| Step::Add { anchor, kind }),
        2 => any::<usize>().prop_map(|target| Step::Remove { target }),
        1 => any::<usize>().prop_map(|target| Step::Reroot { target }),
    ]
}

fn pick(tree: &FamilyTree, index: usize) -> MemberId {
    let ids: Vec<MemberId> = tree.store().ids().collect();
    ids[index % ids.len()]
}

fn run(steps: &[Step]) -> FamilyTree {
    let mut tree = FamilyTree::new(MemberAttributes::named("You"));
    for step in steps {
        match step {
            Step::Add { anchor, kind } => {
                let anchor = pick(&tree, *anchor);
                let _ = tree.add_relative(anchor, *kind, MemberAttributes::default());
            }
            Step::Remove { target } => {
                let target = pick(&tree, *target);
                let _ = tree.remove_member_cascade(target);
            }
            Step::Reroot { target } => {
                let target = pick(&tree, *target);
                let _ = tree.set_root(target);
            }
        }
    }
    tree
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn mutations_preserve_tree_invariants(steps in prop::collection::vec(arb_step(), 0..40)) {
        let tree = run(&steps);
        let violations = tree_invariant_violations(tree.store().members(), tree.root_id());
        prop_assert!(violations.is_empty(), "violations: {:?}", violations);
        prop_assert!(tree.member(tree.root_id()).is_some());
    }

    #[test]
    fn partner_references_are_symmetric(steps in prop::collection::vec(arb_step(), 0..40)) {
        let tree = run(&steps);
        for member in tree.store().iter() {
            if let Some(partner_id) = member.partner_id {
                prop_assert_ne!(partner_id, member.id);
                let partner = tree.member(partner_id);
                prop_assert!(partner.is_some());
                prop_assert_eq!(partner.and_then(|p| p.partner_id), Some(member.id));
            }
        }
    }

    #[test]
    fn cascade_removes_exactly_member_descendants_and_partner(
        steps in prop::collection::vec(arb_step(), 0..40),
        target in any::<usize>(),
    ) {
        let mut tree = run(&steps);
        let target = pick(&tree, target);
        let descendants = descendants_of(tree.store(), target);
        let partner = tree
            .member(target)
            .and_then(|m| m.partner_id)
            .filter(|id| *id != tree.root_id());
        let before = tree.store().clone();

        let mut expected: HashSet<MemberId> = descendants.iter().copied().collect();
        expected.insert(target);
        expected.extend(partner);

        match tree.remove_member_cascade(target) {
            Ok(report) => {
                prop_assert!(tree.member(target).is_none());
                for id in &descendants {
                    prop_assert!(tree.member(*id).is_none());
                }
                if let Some(partner) = partner {
                    prop_assert!(tree.member(partner).is_none());
                }
                let removed: HashSet<MemberId> = report.removed_ids.iter().copied().collect();
                prop_assert_eq!(removed.len(), report.removed_ids.len());
                prop_assert_eq!(&removed, &expected);
                for id in &report.removed_ids {
                    prop_assert!(tree.store().iter().all(|m| !m.references(*id)));
                }
                prop_assert_eq!(before.len() - report.removed_ids.len(), tree.store().len());
            }
            Err(err) => {
                prop_assert!(
                    err.code == "cannot_delete_root" || err.code == "cannot_delete_root_ancestor",
                    "unexpected rejection {}", err.code
                );
                if err.code == "cannot_delete_root_ancestor" {
                    prop_assert!(descendants.contains(&tree.root_id()));
                }
                prop_assert_eq!(tree.store(), &before);
            }
        }
    }

    #[test]
    fn root_is_never_removed(steps in prop::collection::vec(arb_step(), 0..40)) {
        let mut tree = run(&steps);
        let root = tree.root_id();
        let err = tree.remove_member_cascade(root).expect_err("root is protected");
        prop_assert_eq!(err.code, "cannot_delete_root");
        prop_assert!(tree.member(root).is_some());
    }

    #[test]
    fn resolution_is_repeatable(
        steps in prop::collection::vec(arb_step(), 0..40),
        target in any::<usize>(),
    ) {
        let tree = run(&steps);
        let target = pick(&tree, target);
        let first = tree.relatives_of(target);
        let second = tree.relatives_of(target);
        prop_assert_eq!(&first, &second);

        let summary = first.expect("picked member exists");
        prop_assert!(!summary.child_ids.contains(&target));
        prop_assert!(!summary.parent_ids.contains(&target));
        prop_assert!(!summary.sibling_ids.contains(&target));
    }

    #[test]
    fn saved_trees_load_back_unchanged(steps in prop::collection::vec(arb_step(), 0..30)) {
        let tree = run(&steps);
        let raw = tree.save().to_json().expect("encode");
        let loaded = FamilyTree::load(
            TreeSnapshot::from_json(&raw).expect("decode"),
            TreeConfig::default(),
        )
        .expect("valid snapshot");
        prop_assert_eq!(loaded.root_id(), tree.root_id());
        prop_assert_eq!(loaded.store().members(), tree.store().members());
    }
}
