#![cfg(test)]

// Property tests for CursorHashMap kept inside the crate so they can see
// crate-internal accounting (tombstone counts) without feature gates.

use crate::CursorHashMap;
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use std::collections::VecDeque;

// Pool-indexed operations to improve shrinking: indices shrink to earlier
// keys, pool length shrinks, and op lists shrink in length.
#[derive(Clone, Debug)]
enum OpI {
    Insert(usize, i32),
    Remove(usize),
    Get(usize),
    Contains(usize),
    Iterate,
    Endpoints,
    Clear,
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<OpI>)> {
    proptest::collection::vec("[a-z]{0,5}", 1..=8).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let op = prop_oneof![
            4 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Insert(i, v)),
            3 => idx.clone().prop_map(OpI::Remove),
            2 => idx.clone().prop_map(OpI::Get),
            2 => idx.clone().prop_map(OpI::Contains),
            2 => Just(OpI::Iterate),
            1 => Just(OpI::Endpoints),
            1 => Just(OpI::Clear),
        ];
        proptest::collection::vec(op, 1..60).prop_map(move |ops| (pool.clone(), ops))
    })
}

// Property: State-machine equivalence against an insertion-ordered Vec
// model. Invariants exercised across random operation sequences:
// - Overwrites return the prior value and keep the entry's position.
// - Removal returns the model's value; absent removal is a None no-op.
// - `get`/`contains_key` parity; full-order equality on every Iterate.
// - `front`/`back` parity with the model's endpoints.
// - `len`/`is_empty` parity after each op, and no tombstones are ever
//   retained while no cursor exists.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        let mut sut: CursorHashMap<String, i32> = CursorHashMap::new();
        let mut model: Vec<(String, i32)> = Vec::new();

        for op in ops {
            match op {
                OpI::Insert(i, v) => {
                    let k = pool[i].clone();
                    let pos = model.iter().position(|(mk, _)| *mk == k);
                    let prev = sut.insert(k.clone(), v);
                    match pos {
                        Some(p) => {
                            prop_assert_eq!(prev, Some(model[p].1));
                            model[p].1 = v;
                        }
                        None => {
                            prop_assert_eq!(prev, None);
                            model.push((k, v));
                        }
                    }
                }
                OpI::Remove(i) => {
                    let k = &pool[i];
                    let pos = model.iter().position(|(mk, _)| mk == k);
                    let removed = sut.remove(k.as_str());
                    match pos {
                        Some(p) => {
                            let (_, mv) = model.remove(p);
                            prop_assert_eq!(removed, Some(mv));
                        }
                        None => prop_assert_eq!(removed, None),
                    }
                }
                OpI::Get(i) => {
                    let k = &pool[i];
                    let got = sut.get(k.as_str()).copied();
                    let want = model.iter().find(|(mk, _)| mk == k).map(|(_, v)| *v);
                    prop_assert_eq!(got, want);
                }
                OpI::Contains(i) => {
                    let k = &pool[i];
                    let want = model.iter().any(|(mk, _)| mk == k);
                    prop_assert_eq!(sut.contains_key(k.as_str()), want);
                }
                OpI::Iterate => {
                    let got: Vec<(String, i32)> =
                        sut.iter().map(|(k, v)| (k.clone(), *v)).collect();
                    prop_assert_eq!(&got, &model);
                }
                OpI::Endpoints => {
                    let front = sut.front().map(|(k, v)| (k.clone(), *v));
                    let back = sut.back().map(|(k, v)| (k.clone(), *v));
                    prop_assert_eq!(front, model.first().cloned());
                    prop_assert_eq!(back, model.last().cloned());
                }
                OpI::Clear => {
                    sut.clear();
                    model.clear();
                }
            }

            // Post-conditions after each op
            prop_assert_eq!(sut.len(), model.len());
            prop_assert_eq!(sut.is_empty(), model.is_empty());
            // No cursor exists in this scenario, so nothing may linger.
            prop_assert_eq!(sut.tombstone_count(), 0);
        }
    }
}

// A model entry with an instance id, so that delete-then-reinsert of the
// same key is distinguishable from an in-place overwrite: the former is a
// fresh entry the cursor must reach again, the latter is not.
#[derive(Clone, Debug)]
struct ModelEntry {
    key: String,
    inst: u64,
    val: i32,
}

#[derive(Clone, Debug)]
enum Mutation {
    Insert(usize, i32),
    Remove(usize),
    Clear,
}

fn arb_cursor_scenario() -> impl Strategy<Value = (Vec<String>, Vec<(usize, i32)>, Vec<(usize, Vec<Mutation>)>)>
{
    proptest::collection::vec("[a-z]{0,3}", 1..=6).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let seed = proptest::collection::vec((idx.clone(), any::<i32>()), 0..8);
        let mutation = prop_oneof![
            4 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| Mutation::Insert(i, v)),
            4 => idx.clone().prop_map(Mutation::Remove),
            1 => Just(Mutation::Clear),
        ];
        let round = (0usize..6, proptest::collection::vec(mutation, 0..6));
        let rounds = proptest::collection::vec(round, 1..5);
        (seed, rounds).prop_map(move |(seed, rounds)| (pool.clone(), seed, rounds))
    })
}

// Property: A cursor suspended between rounds of arbitrary mutation
// yields exactly the model's continuation. The oracle tracks, per live
// instance, whether the cursor has already passed it:
// - removal of an unvisited instance prunes it from the expectation;
// - overwrite never re-yields an already visited key;
// - re-insertion after removal appends a fresh instance the cursor must
//   reach, even if the old instance was already visited;
// - insertion of brand-new keys mid-walk is reached before exhaustion;
// - clear retires the cursor terminally, later insertions notwithstanding;
// - an exhausted cursor stays exhausted.
proptest! {
    #![proptest_config(ProptestConfig { cases: 96, .. ProptestConfig::default() })]
    #[test]
    fn prop_cursor_tracks_mutated_order((pool, seed, rounds) in arb_cursor_scenario()) {
        let mut sut: CursorHashMap<String, i32> = CursorHashMap::new();
        let mut model: Vec<ModelEntry> = Vec::new();
        let mut next_inst: u64 = 0;

        let mut insert = |sut: &mut CursorHashMap<String, i32>,
                          model: &mut Vec<ModelEntry>,
                          expected: Option<&mut VecDeque<u64>>,
                          k: String,
                          v: i32|
         -> Result<(), TestCaseError> {
            let prev = sut.insert(k.clone(), v);
            match model.iter_mut().find(|e| e.key == k) {
                Some(e) => {
                    prop_assert_eq!(prev, Some(e.val));
                    e.val = v;
                }
                None => {
                    prop_assert_eq!(prev, None);
                    let inst = next_inst;
                    next_inst += 1;
                    model.push(ModelEntry { key: k, inst, val: v });
                    if let Some(expected) = expected {
                        expected.push_back(inst);
                    }
                }
            }
            Ok(())
        };

        for (i, v) in seed {
            insert(&mut sut, &mut model, None, pool[i].clone(), v)?;
        }

        let mut cursor = sut.cursor();
        // Instances the cursor has not visited yet, in order.
        let mut expected: VecDeque<u64> = model.iter().map(|e| e.inst).collect();
        let mut cursor_dead = false;

        for (advances, mutations) in rounds {
            for _ in 0..advances {
                match cursor.next(&sut) {
                    Some((k, v)) => {
                        prop_assert!(!cursor_dead, "a finished cursor must stay finished");
                        let inst = expected
                            .pop_front()
                            .ok_or_else(|| TestCaseError::fail("cursor yielded past the model"))?;
                        let me = model
                            .iter()
                            .find(|e| e.inst == inst)
                            .ok_or_else(|| TestCaseError::fail("yielded instance not live"))?;
                        prop_assert_eq!(k, &me.key);
                        prop_assert_eq!(*v, me.val);
                    }
                    None => {
                        prop_assert!(expected.is_empty(), "cursor finished with entries pending");
                        cursor_dead = true;
                    }
                }
            }

            for m in mutations {
                match m {
                    Mutation::Insert(i, v) => {
                        let gate = if cursor_dead { None } else { Some(&mut expected) };
                        insert(&mut sut, &mut model, gate, pool[i].clone(), v)?;
                    }
                    Mutation::Remove(i) => {
                        let k = &pool[i];
                        let pos = model.iter().position(|e| &e.key == k);
                        let removed = sut.remove(k.as_str());
                        match pos {
                            Some(p) => {
                                let e = model.remove(p);
                                prop_assert_eq!(removed, Some(e.val));
                                expected.retain(|&inst| inst != e.inst);
                            }
                            None => prop_assert_eq!(removed, None),
                        }
                    }
                    Mutation::Clear => {
                        sut.clear();
                        model.clear();
                        expected.clear();
                        cursor_dead = true;
                    }
                }
                prop_assert_eq!(sut.len(), model.len());
            }
        }

        // Drain: the cursor must yield exactly the pending continuation.
        while let Some((k, v)) = cursor.next(&sut) {
            prop_assert!(!cursor_dead, "a finished cursor must stay finished");
            let inst = expected
                .pop_front()
                .ok_or_else(|| TestCaseError::fail("cursor yielded past the model"))?;
            let me = model
                .iter()
                .find(|e| e.inst == inst)
                .ok_or_else(|| TestCaseError::fail("yielded instance not live"))?;
            prop_assert_eq!(k, &me.key);
            prop_assert_eq!(*v, me.val);
        }
        prop_assert!(expected.is_empty());
        prop_assert!(cursor.next(&sut).is_none(), "exhaustion must be terminal");
    }
}
