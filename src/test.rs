use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeSet;
use std::hash::{Hash, Hasher};

use itertools::assert_equal;
use rand::Rng;

use super::*;

fn with_indices<I: IntoIterator<Item = u32>>(config: SelectorConfig, indices: I) -> NatSet {
    let mut set = NatSet::with_config(config);
    set.insert_all(indices).unwrap();
    set
}

fn random_indices(rng: &mut impl Rng, range: u32, count: usize) -> BTreeSet<u32> {
    (0..count).map(|_| rng.gen_range(0..range)).collect()
}

#[test]
fn smoke_test() {
    let mut set = NatSet::new();
    assert!(!set.contains(0));
    assert!(set.insert(0).unwrap());
    assert!(set.contains(0));
    assert_eq!(set.len(), 1);
}

#[test]
fn insert_is_idempotent() {
    let mut set = NatSet::new();
    assert!(set.insert(42).unwrap());
    assert!(!set.insert(42).unwrap());
    assert_eq!(set.len(), 1);

    assert!(set.remove(42).unwrap());
    assert!(!set.remove(42).unwrap());
    assert!(set.is_empty());
}

#[test]
fn domain_boundaries() {
    let mut set = NatSet::new();
    assert!(set.insert(0).unwrap());
    assert!(matches!(
        set.insert(MAX_INDEX + 1),
        Err(Error::Domain { .. }),
    ));
    assert!(matches!(set.insert(u32::MAX), Err(Error::Domain { .. })));
    assert!(matches!(set.remove(u32::MAX), Err(Error::Domain { .. })));
    assert_eq!(set.len(), 1);

    set.insert(10).unwrap();
    // bound must exceed the maximum element
    assert!(matches!(set.complement_within(10), Err(Error::Bound { .. })));
    assert!(set.complement_within(11).is_ok());
}

#[test]
fn representation_transparency_fuzzy() {
    const MAX_RANGE: u32 = 100_000;

    let mut rng = rand::thread_rng();
    for _ in 0..10 {
        let mut model = BTreeSet::new();
        let mut sets = vec![
            NatSet::with_config(SelectorConfig::pinned(Repr::Dense)),
            NatSet::with_config(SelectorConfig::pinned(Repr::Sparse)),
            NatSet::with_config(SelectorConfig::pinned(Repr::Compressed)),
            NatSet::new(),
        ];

        for _ in 0..2_000 {
            let index = rng.gen_range(0..MAX_RANGE);
            if rng.gen_bool(0.7) {
                let expected = model.insert(index);
                for set in &mut sets {
                    assert_eq!(set.insert(index).unwrap(), expected);
                }
            } else {
                let expected = model.remove(&index);
                for set in &mut sets {
                    assert_eq!(set.remove(index).unwrap(), expected);
                }
            }
        }

        for set in &sets {
            assert_eq!(set.len(), model.len() as u64);
            assert_equal(set.iter(), model.iter().copied());
            for _ in 0..500 {
                let probe = rng.gen_range(0..MAX_RANGE);
                assert_eq!(set.contains(probe), model.contains(&probe));
            }
        }
    }
}

#[test]
fn conversion_round_trip() {
    let indices = [0u32, 1, 2, 63, 64, 65, 1_000, 4_096, 9_999];
    let mut set: NatSet = indices.iter().copied().collect();

    for target in [Repr::Dense, Repr::Sparse, Repr::Compressed, Repr::Dense] {
        if let Some(record) = set.convert_to(target).unwrap() {
            assert_eq!(record.to, target);
            assert_eq!(record.migrated, indices.len() as u64);
        }
        assert_eq!(set.repr(), target);
        assert_equal(set.iter(), indices.iter().copied());
        assert_eq!(set.len(), indices.len() as u64);
    }
}

#[test]
fn algebra_matches_model_across_representations() {
    const RANGE: u32 = 50_000;

    let mut rng = rand::thread_rng();
    let reprs = [Repr::Dense, Repr::Sparse, Repr::Compressed];
    for left in reprs {
        for right in reprs {
            let model_a = random_indices(&mut rng, RANGE, 2_000);
            let model_b = random_indices(&mut rng, RANGE, 2_000);
            let a = with_indices(SelectorConfig::pinned(left), model_a.iter().copied());
            let b = with_indices(SelectorConfig::pinned(right), model_b.iter().copied());

            assert_equal((&a | &b).iter(), model_a.union(&model_b).copied());
            assert_equal((&a & &b).iter(), model_a.intersection(&model_b).copied());
            assert_equal((&a - &b).iter(), model_a.difference(&model_b).copied());
            assert_equal(
                (&a ^ &b).iter(),
                model_a.symmetric_difference(&model_b).copied(),
            );
        }
    }
}

#[test]
fn algebra_laws_fuzzy() {
    const RANGE: u32 = 10_000;

    let mut rng = rand::thread_rng();
    for _ in 0..20 {
        let a: NatSet = random_indices(&mut rng, RANGE, 500).into_iter().collect();
        let b: NatSet = random_indices(&mut rng, RANGE, 500).into_iter().collect();
        let universe: NatSet = (0..RANGE).collect();

        assert_eq!(a.union(&b), b.union(&a));
        assert_eq!(a.intersection(&universe), a);
        assert!(a.difference(&a).is_empty());
        assert_eq!(a.intersection(&b).union(&a.difference(&b)), a);
    }
}

#[test]
fn scattered_inserts_avoid_dense() {
    let mut set = NatSet::with_hint(UsageHint::default());
    set.insert_all([2u32, 1_000_000, 5]).unwrap();

    assert_eq!(set.len(), 3);
    assert_equal(set.iter(), [2, 5, 1_000_000]);
    assert_ne!(set.repr(), Repr::Dense);
}

#[test]
fn union_of_dense_range_and_compressed_run() {
    let mut dense = NatSet::with_hint(UsageHint::bounded(200, 0.5));
    for index in 0..100 {
        dense.insert(index).unwrap();
    }
    assert_eq!(dense.repr(), Repr::Dense);

    let mut run = NatSet::with_config(SelectorConfig::pinned(Repr::Compressed));
    run.insert_all(50..150).unwrap();
    assert_eq!(run.repr(), Repr::Compressed);

    let union = &dense | &run;
    assert_eq!(union.len(), 150);
    assert_equal(union.iter(), 0..150);
}

#[test]
fn densification_triggers_dense_conversion() {
    let mut set = NatSet::new();
    assert_eq!(set.repr(), Repr::Sparse);
    for index in 0..10_000 {
        set.insert(index).unwrap();
    }
    assert_eq!(set.repr(), Repr::Dense);
    assert_eq!(set.len(), 10_000);
}

#[test]
fn long_runs_trigger_compressed_conversion() {
    let mut set = NatSet::new();
    for index in 200_000..260_000 {
        set.insert(index).unwrap();
    }
    assert_eq!(set.repr(), Repr::Compressed);
    assert_eq!(set.len(), 60_000);
    assert_equal(set.iter(), 200_000..260_000);
}

#[test]
fn capacity_fallback_switches_representation() {
    let mut set = NatSet::new();
    assert_eq!(set.repr(), Repr::Sparse);

    // far beyond the sparse engine's index range
    assert!(set.insert(MAX_INDEX).unwrap());
    assert_eq!(set.repr(), Repr::Compressed);
    assert!(set.contains(MAX_INDEX));
    assert_eq!(set.len(), 1);
}

#[test]
fn pinned_capacity_error_leaves_set_untouched() {
    let config = SelectorConfig {
        memory_ceiling: 1024,
        ..SelectorConfig::pinned(Repr::Dense)
    };
    let mut set = NatSet::with_config(config);
    set.insert(5).unwrap();

    let err = set.insert(1_000_000).unwrap_err();
    assert!(matches!(err, Error::Capacity { .. }));
    assert_eq!(set.repr(), Repr::Dense);
    assert_eq!(set.len(), 1);
    assert_equal(set.iter(), [5]);

    // bulk path reports capacity up front, before mutating
    let err = set.insert_all([1u32, 2, 1_000_000]).unwrap_err();
    assert!(matches!(err, Error::Capacity { .. }));
    assert_equal(set.iter(), [5]);
}

#[test]
fn compact_reselects_representation() {
    let config = SelectorConfig {
        batch_floor: u64::MAX,
        ..SelectorConfig::default()
    };
    let mut set = NatSet::with_hint_and_config(UsageHint::bounded(1024, 1.0), config);
    set.insert_all(0..1024).unwrap();
    assert_eq!(set.repr(), Repr::Dense);

    for index in 0..1024 {
        if index % 341 != 0 {
            set.remove(index).unwrap();
        }
    }
    // rechecks disabled; still dense despite the density collapse
    assert_eq!(set.repr(), Repr::Dense);

    let record = set.compact().unwrap().unwrap();
    assert_eq!(record.from, Repr::Dense);
    assert_eq!(record.migrated, 4);
    assert_ne!(set.repr(), Repr::Dense);
    assert_equal(set.iter(), [0, 341, 682, 1023]);
}

#[test]
fn equality_and_hash_ignore_representation() {
    let indices = [3u32, 17, 1_000, 65_000];
    let dense = with_indices(SelectorConfig::pinned(Repr::Dense), indices);
    let compressed = with_indices(SelectorConfig::pinned(Repr::Compressed), indices);
    let other = with_indices(SelectorConfig::pinned(Repr::Sparse), [3u32, 17]);

    assert_eq!(dense, compressed);
    assert_ne!(dense, other);

    let hash = |set: &NatSet| {
        let mut hasher = DefaultHasher::new();
        set.hash(&mut hasher);
        hasher.finish()
    };
    assert_eq!(hash(&dense), hash(&compressed));
}

#[test]
fn complement_within_bound() {
    let set: NatSet = [1u32, 3, 5].iter().copied().collect();

    let complement = set.complement_within(8).unwrap();
    assert_equal(complement.iter(), [0, 2, 4, 6, 7]);

    let back = complement.complement_within(8).unwrap();
    assert_equal(back.iter(), [1, 3, 5]);

    assert!(NatSet::new().complement_within(0).unwrap().is_empty());
    assert_equal(NatSet::new().complement_within(4).unwrap().iter(), 0..4);
}

#[test]
fn serialization_is_capability_gated() {
    let mut set = NatSet::with_config(SelectorConfig::pinned(Repr::Compressed));
    set.insert_all([1u32, 5, 7, 1_000_000]).unwrap();
    assert!(set.supports_serialization());
    assert!(set.capabilities().fast_cardinality);

    let bytes = set.export_bytes().unwrap();
    let restored = NatSet::import_bytes(&bytes).unwrap();
    assert_eq!(restored, set);

    let dense = with_indices(SelectorConfig::pinned(Repr::Dense), [1u32, 2, 3]);
    assert!(!dense.supports_serialization());
    assert!(matches!(
        dense.export_bytes(),
        Err(Error::CapabilityUnsupported { .. }),
    ));

    assert!(matches!(
        NatSet::import_bytes(b"not a bitmap"),
        Err(Error::Deserialize(_)),
    ));
}

#[test]
fn first_last_clear() {
    let mut set: NatSet = [10u32, 20, 30].iter().copied().collect();
    assert_eq!(set.first(), Some(10));
    assert_eq!(set.last(), Some(30));

    set.clear();
    assert!(set.is_empty());
    assert_eq!(set.len(), 0);
    assert_eq!(set.first(), None);
    assert_eq!(set.last(), None);
    assert_equal(set.iter(), [0u32; 0]);
}

#[test]
fn insert_all_counts_new_indices() {
    let mut set = NatSet::new();
    assert_eq!(set.insert_all([5u32, 1, 5, 3]).unwrap(), 3);
    assert_eq!(set.insert_all([1u32, 2, 3]).unwrap(), 1);
    assert_eq!(set.insert_all(std::iter::empty()).unwrap(), 0);
    assert_equal(set.iter(), [1, 2, 3, 5]);
}

#[test]
fn debug_prints_contents() {
    let set: NatSet = [1u32, 2].iter().copied().collect();
    assert_eq!(format!("{set:?}"), "{1, 2}");
}
