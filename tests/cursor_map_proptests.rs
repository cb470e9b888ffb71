// Public-API property tests. The heavier, internals-aware state machine
// lives inside the crate; this file keeps a black-box variant that any
// downstream user could have written.

use cursor_hashmap::CursorHashMap;
use proptest::prelude::*;

#[derive(Clone, Debug)]
enum Op {
    Insert(usize, i32),
    Remove(usize),
    Clear,
}

fn arb_ops() -> impl Strategy<Value = (Vec<String>, Vec<Op>)> {
    proptest::collection::vec("[a-z]{0,4}", 1..=6).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let op = prop_oneof![
            5 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| Op::Insert(i, v)),
            4 => idx.clone().prop_map(Op::Remove),
            1 => Just(Op::Clear),
        ];
        proptest::collection::vec(op, 1..40).prop_map(move |ops| (pool.clone(), ops))
    })
}

// Property: Whatever sequence of inserts/removes/clears runs, the map
// agrees with an insertion-ordered Vec model on length after every op
// and on full contents and order at the end.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_matches_ordered_model((pool, ops) in arb_ops()) {
        let mut sut: CursorHashMap<String, i32> = CursorHashMap::new();
        let mut model: Vec<(String, i32)> = Vec::new();

        for op in ops {
            match op {
                Op::Insert(i, v) => {
                    let k = pool[i].clone();
                    sut.insert(k.clone(), v);
                    match model.iter_mut().find(|(mk, _)| *mk == k) {
                        Some((_, mv)) => *mv = v,
                        None => model.push((k, v)),
                    }
                }
                Op::Remove(i) => {
                    let k = &pool[i];
                    let removed = sut.remove(k.as_str());
                    let pos = model.iter().position(|(mk, _)| mk == k);
                    prop_assert_eq!(removed.is_some(), pos.is_some());
                    if let Some(p) = pos {
                        model.remove(p);
                    }
                }
                Op::Clear => {
                    sut.clear();
                    model.clear();
                }
            }
            prop_assert_eq!(sut.len(), model.len());
        }

        let got: Vec<(String, i32)> = sut.iter().map(|(k, v)| (k.clone(), *v)).collect();
        prop_assert_eq!(got, model);
    }
}

// Property: A cursor paused once mid-walk, with removals applied during
// the pause, resumes on exactly the surviving continuation: every
// element it yielded before the pause stays yielded, removed unvisited
// elements are skipped, and relative order is preserved.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_pause_remove_resume(
        keys in proptest::collection::btree_set("[a-z]{1,4}", 1..12),
        pause_at in 0usize..12,
        remove_mask in proptest::collection::vec(any::<bool>(), 12),
    ) {
        let keys: Vec<String> = keys.into_iter().collect();
        let mut sut: CursorHashMap<String, usize> = CursorHashMap::new();
        for (i, k) in keys.iter().enumerate() {
            sut.insert(k.clone(), i);
        }

        let pause_at = pause_at.min(keys.len());
        let mut cursor = sut.cursor();
        let mut yielded = Vec::new();
        for _ in 0..pause_at {
            if let Some((k, _)) = cursor.next(&sut) {
                yielded.push(k.clone());
            }
        }
        prop_assert_eq!(yielded.as_slice(), &keys[..pause_at]);

        // Remove a masked subset (anywhere: behind, under, or ahead of
        // the cursor) during the pause.
        let removed: Vec<String> = keys
            .iter()
            .zip(remove_mask.iter())
            .filter(|(_, &m)| m)
            .map(|(k, _)| k.clone())
            .collect();
        for k in &removed {
            sut.remove(k.as_str());
        }

        // Expected continuation: unvisited survivors, in original order.
        let expected: Vec<String> = keys[pause_at..]
            .iter()
            .filter(|k| !removed.contains(*k))
            .cloned()
            .collect();

        let mut resumed = Vec::new();
        while let Some((k, _)) = cursor.next(&sut) {
            resumed.push(k.clone());
        }
        prop_assert_eq!(resumed, expected);
        prop_assert!(cursor.next(&sut).is_none());
    }
}
