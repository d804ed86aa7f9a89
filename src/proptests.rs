//! Model-free property tests over random operation sequences.

use proptest::prelude::*;

use crate::bag::Bag;
use crate::snowball::{Consensus, Parameters, SnowballFactory, Tree};
use crate::zfx_id::{Id, NUM_BITS};

/// Competing choices drawn from a small fixed pool, so that random polls
/// often land on tracked branches and prefixes overlap heavily.
fn pool() -> Vec<Id> {
    (0u8..8).map(|b| Id::from_hash(&[b])).collect()
}

#[derive(Debug, Clone)]
enum Action {
    Add(usize),
    Poll(Vec<(usize, usize)>),
    Fail,
}

fn action() -> impl Strategy<Value = Action> {
    prop_oneof![
        (0..8usize).prop_map(Action::Add),
        proptest::collection::vec(((0..8usize), (1..4usize)), 0..3).prop_map(Action::Poll),
        Just(Action::Fail),
    ]
}

proptest! {
    #[test]
    fn consensus_invariants(actions in proptest::collection::vec(action(), 1..64)) {
        let params =
            Parameters { k: 5, alpha_preference: 3, alpha_confidence: 4, beta1: 2, beta2: 3 };
        let ids = pool();
        let mut tree = Tree::new(SnowballFactory, params, ids[0]);
        let mut tracked = vec![ids[0]];
        let mut decided_prefix = tree.decided_prefix();
        let mut finalized_preference: Option<Id> = None;

        for action in actions {
            match action {
                Action::Add(i) => {
                    tree.add(ids[i]);
                    tracked.push(ids[i]);

                    // Adding the same choice twice changes nothing.
                    let rendered = tree.render();
                    tree.add(ids[i]);
                    prop_assert_eq!(tree.render(), rendered);
                }
                Action::Poll(votes) => {
                    let mut bag = Bag::new();
                    for (i, count) in votes {
                        bag.add_count(ids[i], count);
                    }
                    tree.record_poll(&bag);
                }
                Action::Fail => tree.record_unsuccessful_poll(),
            }

            // The preference is always a tracked choice.
            prop_assert!(tracked.contains(&tree.preference()));

            // The decided prefix never shrinks.
            prop_assert!(tree.decided_prefix() >= decided_prefix);
            decided_prefix = tree.decided_prefix();

            // The tree never grows deeper than the bit width.
            for line in tree.render().lines() {
                let indent = line.len() - line.trim_start().len();
                prop_assert!(indent / 4 <= NUM_BITS);
            }

            // Reads are pure.
            let rendered = tree.render();
            let _ = tree.preference();
            let _ = tree.finalized();
            prop_assert_eq!(tree.render(), rendered);

            // Finalization is absorbing.
            if let Some(p) = finalized_preference {
                prop_assert!(tree.finalized());
                prop_assert_eq!(tree.preference(), p);
            }
            if tree.finalized() {
                finalized_preference = Some(tree.preference());
            }
        }
    }
}
