//! Property-based model testing
//!
//! Random operation sequences are replayed against reference models built
//! on std collections; after every step the container must agree with the
//! model on contents and order.

use proptest::prelude::*;
use std::collections::VecDeque;
use vastkit::{ChunkedList, Dict, LinkedList, TreeSet};

#[derive(Debug, Clone)]
enum DictOp {
    Put(u8, i32),
    PutFront(u8, i32),
    Remove(u8),
    Insert(usize, u8, i32),
    DelIndex(usize),
    Clear,
}

fn dict_ops() -> impl Strategy<Value = Vec<DictOp>> {
    prop::collection::vec(
        prop_oneof![
            (any::<u8>(), any::<i32>()).prop_map(|(k, v)| DictOp::Put(k, v)),
            (any::<u8>(), any::<i32>()).prop_map(|(k, v)| DictOp::PutFront(k, v)),
            any::<u8>().prop_map(DictOp::Remove),
            (0usize..64, any::<u8>(), any::<i32>()).prop_map(|(i, k, v)| DictOp::Insert(i, k, v)),
            (0usize..64).prop_map(DictOp::DelIndex),
            Just(DictOp::Clear),
        ],
        0..400,
    )
}

/// Ordered association-list model of the dict.
fn model_pairs(model: &[(u8, i32)]) -> Vec<(u8, i32)> {
    model.to_vec()
}

proptest! {
    #[test]
    fn prop_dict_matches_ordered_model(ops in dict_ops()) {
        let mut dict: Dict<u8, i32> = Dict::new();
        let mut model: Vec<(u8, i32)> = Vec::new();

        for op in ops {
            match op {
                DictOp::Put(k, v) => {
                    dict.put(k, v);
                    match model.iter_mut().find(|(mk, _)| *mk == k) {
                        Some(slot) => slot.1 = v,
                        None => model.push((k, v)),
                    }
                }
                DictOp::PutFront(k, v) => {
                    dict.put_front(k, v);
                    model.retain(|(mk, _)| *mk != k);
                    model.insert(0, (k, v));
                }
                DictOp::Remove(k) => {
                    let expected = model
                        .iter()
                        .position(|(mk, _)| *mk == k)
                        .map(|i| model.remove(i).1);
                    prop_assert_eq!(dict.remove(&k), expected);
                }
                DictOp::Insert(i, k, v) => {
                    let result = dict.insert(i, k, v);
                    if i > model.len() {
                        prop_assert!(result.is_err());
                    } else {
                        prop_assert!(result.is_ok());
                        model.retain(|(mk, _)| *mk != k);
                        let i = i.min(model.len());
                        model.insert(i, (k, v));
                    }
                }
                DictOp::DelIndex(i) => {
                    let result = dict.del_index(i);
                    if i >= model.len() {
                        prop_assert!(result.is_err());
                    } else {
                        let (k, v) = model.remove(i);
                        let pair = result.unwrap();
                        prop_assert_eq!((pair.first, pair.second), (k, v));
                    }
                }
                DictOp::Clear => {
                    dict.clear();
                    model.clear();
                }
            }

            prop_assert_eq!(dict.len(), model.len());
        }

        let pairs: Vec<_> = dict.iter().map(|(k, v)| (*k, *v)).collect();
        prop_assert_eq!(pairs, model_pairs(&model));
        for (k, v) in &model {
            prop_assert_eq!(dict.get(k), Some(v));
        }
    }
}

#[derive(Debug, Clone)]
enum SeqOp {
    Append(i32),
    Prepend(i32),
    Insert(usize, i32),
    Del(usize),
    Pop,
    Shift,
}

fn seq_ops() -> impl Strategy<Value = Vec<SeqOp>> {
    prop::collection::vec(
        prop_oneof![
            any::<i32>().prop_map(SeqOp::Append),
            any::<i32>().prop_map(SeqOp::Prepend),
            (0usize..64, any::<i32>()).prop_map(|(i, v)| SeqOp::Insert(i, v)),
            (0usize..64).prop_map(SeqOp::Del),
            Just(SeqOp::Pop),
            Just(SeqOp::Shift),
        ],
        0..400,
    )
}

proptest! {
    #[test]
    fn prop_linked_list_matches_deque(ops in seq_ops()) {
        let mut list: LinkedList<i32> = LinkedList::new();
        let mut model: VecDeque<i32> = VecDeque::new();

        for op in ops {
            match op {
                SeqOp::Append(v) => {
                    list.append(v);
                    model.push_back(v);
                }
                SeqOp::Prepend(v) => {
                    list.prepend(v);
                    model.push_front(v);
                }
                SeqOp::Insert(i, v) => {
                    if i <= model.len() {
                        list.insert(i, v).unwrap();
                        model.insert(i, v);
                    } else {
                        prop_assert!(list.insert(i, v).is_err());
                    }
                }
                SeqOp::Del(i) => {
                    if i < model.len() {
                        prop_assert_eq!(list.del(i).unwrap(), model.remove(i).unwrap());
                    } else {
                        prop_assert!(list.del(i).is_err());
                    }
                }
                SeqOp::Pop => match model.pop_back() {
                    Some(v) => prop_assert_eq!(list.pop().unwrap(), v),
                    None => prop_assert!(list.pop().is_err()),
                },
                SeqOp::Shift => match model.pop_front() {
                    Some(v) => prop_assert_eq!(list.shift().unwrap(), v),
                    None => prop_assert!(list.shift().is_err()),
                },
            }
            prop_assert_eq!(list.len(), model.len());
        }

        let contents: Vec<_> = list.iter().copied().collect();
        let expected: Vec<_> = model.iter().copied().collect();
        prop_assert_eq!(contents, expected);
    }

    #[test]
    fn prop_chunked_list_matches_deque(ops in seq_ops()) {
        // Tiny chunks force frequent splits and unlinks.
        let mut list: ChunkedList<i32, 4> = ChunkedList::new();
        let mut model: VecDeque<i32> = VecDeque::new();

        for op in ops {
            match op {
                SeqOp::Append(v) => {
                    list.append(v);
                    model.push_back(v);
                }
                SeqOp::Prepend(v) => {
                    list.prepend(v);
                    model.push_front(v);
                }
                SeqOp::Insert(i, v) => {
                    if i <= model.len() {
                        list.insert(i, v).unwrap();
                        model.insert(i, v);
                    } else {
                        prop_assert!(list.insert(i, v).is_err());
                    }
                }
                SeqOp::Del(i) => {
                    if i < model.len() {
                        prop_assert_eq!(list.del(i).unwrap(), model.remove(i).unwrap());
                    } else {
                        prop_assert!(list.del(i).is_err());
                    }
                }
                SeqOp::Pop => match model.pop_back() {
                    Some(v) => prop_assert_eq!(list.pop().unwrap(), v),
                    None => prop_assert!(list.pop().is_err()),
                },
                SeqOp::Shift => match model.pop_front() {
                    Some(v) => prop_assert_eq!(list.shift().unwrap(), v),
                    None => prop_assert!(list.shift().is_err()),
                },
            }
            prop_assert_eq!(list.len(), model.len());
        }

        let contents: Vec<_> = list.iter().copied().collect();
        let expected: Vec<_> = model.iter().copied().collect();
        prop_assert_eq!(contents, expected);
    }

    #[test]
    fn prop_chunked_splice_preserves_concatenation(
        a in prop::collection::vec(any::<i32>(), 0..100),
        b in prop::collection::vec(any::<i32>(), 0..100),
        index_seed in any::<usize>(),
    ) {
        let mut left: ChunkedList<i32, 4> = a.iter().copied().collect();
        let mut right: ChunkedList<i32, 4> = b.iter().copied().collect();
        let index = if a.is_empty() { 0 } else { index_seed % (a.len() + 1) };

        left.insert_list(index, &mut right).unwrap();

        let mut expected = a.clone();
        expected.splice(index..index, b.iter().copied());
        let contents: Vec<_> = left.iter().copied().collect();
        prop_assert_eq!(contents, expected);
        prop_assert!(right.is_empty());
        prop_assert_eq!(right.chunk_count(), 0);
    }

    #[test]
    fn prop_tree_set_matches_btreeset(
        ops in prop::collection::vec((any::<bool>(), any::<u16>()), 0..500)
    ) {
        use std::collections::BTreeSet;
        let mut set = TreeSet::new();
        let mut model = BTreeSet::new();

        for (insert, key) in ops {
            if insert {
                prop_assert_eq!(set.insert(key), model.insert(key));
            } else {
                prop_assert_eq!(set.remove(&key), model.take(&key));
            }
            prop_assert_eq!(set.len(), model.len());
        }

        let ours: Vec<_> = set.iter().copied().collect();
        let theirs: Vec<_> = model.iter().copied().collect();
        prop_assert_eq!(ours, theirs);
    }

    #[test]
    fn prop_tree_set_merge_is_union(
        a in prop::collection::btree_set(any::<u16>(), 0..100),
        b in prop::collection::btree_set(any::<u16>(), 0..100),
    ) {
        let mut left: TreeSet<u16> = a.iter().copied().collect();
        let mut right: TreeSet<u16> = b.iter().copied().collect();

        left.merge(&mut right);

        let union: Vec<_> = a.union(&b).copied().collect();
        let merged: Vec<_> = left.iter().copied().collect();
        prop_assert_eq!(merged, union);

        // Collisions stay behind in the source.
        let collisions: Vec<_> = a.intersection(&b).copied().collect();
        let leftover: Vec<_> = right.iter().copied().collect();
        prop_assert_eq!(leftover, collisions);
    }
}
