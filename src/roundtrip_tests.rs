//! End-to-end round-trip properties over randomized key sets, exercised
//! through both public variants. These cover the laws the concrete scenario
//! tests in `bytes_trie` / `units_trie` cannot: behavior across arbitrary
//! key shapes, the Fast/Small size relation, and reader agreement after
//! reset cycles.

use hashbrown::HashMap;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::{BuildMode, BytesTrieBuilder, TrieResult, UnitsTrieBuilder};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A deterministic set of unique keys over a small alphabet, so shared
/// prefixes and suffixes occur often.
fn random_byte_keys(seed: u64, count: usize) -> HashMap<Vec<u8>, i32> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut keys = HashMap::new();
    while keys.len() < count {
        let len = rng.random_range(1..=12);
        let key: Vec<u8> = (0..len).map(|_| rng.random_range(b'a'..=b'f')).collect();
        let value = rng.random_range(i32::MIN..i32::MAX);
        keys.entry(key).or_insert(value);
    }
    keys
}

#[test]
fn test_randomized_byte_roundtrip_and_no_false_positives() {
    init_logging();
    let keys = random_byte_keys(0xC0FFEE, 400);

    for mode in [BuildMode::Fast, BuildMode::Small] {
        let mut builder = BytesTrieBuilder::new();
        for (key, &value) in &keys {
            builder.add(key, value).unwrap();
        }
        let trie = builder.build(mode).unwrap();

        for (key, &value) in &keys {
            assert_eq!(trie.get(key), Some(value), "mode {mode:?}, key {key:?}");
        }

        // Probes drawn from the same distribution; anything not added must
        // miss.
        let mut rng = StdRng::seed_from_u64(0xBEEF);
        for _ in 0..300 {
            let len = rng.random_range(1..=12);
            let probe: Vec<u8> = (0..len).map(|_| rng.random_range(b'a'..=b'f')).collect();
            if !keys.contains_key(&probe) {
                assert_eq!(trie.get(&probe), None, "mode {mode:?}, probe {probe:?}");
            }
        }
    }
}

#[test]
fn test_small_mode_is_never_larger_than_fast() {
    for seed in [1u64, 7, 42, 1234] {
        let keys = random_byte_keys(seed, 200);

        let mut fast = BytesTrieBuilder::new();
        let mut small = BytesTrieBuilder::new();
        for (key, &value) in &keys {
            fast.add(key, value).unwrap();
            small.add(key, value).unwrap();
        }
        let fast_len = fast.build_serialized(BuildMode::Fast).unwrap().len();
        let small_len = small.build_serialized(BuildMode::Small).unwrap().len();
        assert!(
            small_len <= fast_len,
            "seed {seed}: small {small_len} > fast {fast_len}"
        );
    }
}

#[test]
fn test_clear_and_rebuild_preserves_lookup_behavior() {
    let keys = random_byte_keys(99, 150);

    let mut builder = BytesTrieBuilder::new();
    for (key, &value) in &keys {
        builder.add(key, value).unwrap();
    }
    let first = builder.build(BuildMode::Small).unwrap();

    builder.clear();
    for (key, &value) in &keys {
        builder.add(key, value).unwrap();
    }
    let second = builder.build(BuildMode::Small).unwrap();

    let mut rng = StdRng::seed_from_u64(3);
    for _ in 0..500 {
        let len = rng.random_range(0..=12);
        let probe: Vec<u8> = (0..len).map(|_| rng.random_range(b'a'..=b'f')).collect();
        assert_eq!(first.lookup(&probe), second.lookup(&probe), "probe {probe:?}");
    }
}

#[test]
fn test_randomized_unit_roundtrip() {
    init_logging();
    let mut rng = StdRng::seed_from_u64(0xACE);
    let mut keys: HashMap<Vec<u16>, i32> = HashMap::new();
    while keys.len() < 200 {
        let len = rng.random_range(1..=8);
        // A tight alphabet plus occasional high units keeps prefixes shared
        // while still exercising wide element values.
        let key: Vec<u16> = (0..len)
            .map(|_| {
                if rng.random_bool(0.1) {
                    rng.random_range(0xf000..=0xffff)
                } else {
                    rng.random_range(0x30..=0x39)
                }
            })
            .collect();
        let value = rng.random_range(-100_000..100_000);
        keys.entry(key).or_insert(value);
    }

    for mode in [BuildMode::Fast, BuildMode::Small] {
        let mut builder = UnitsTrieBuilder::new();
        for (key, &value) in &keys {
            builder.add(key, value).unwrap();
        }
        let trie = builder.build(mode).unwrap();
        for (key, &value) in &keys {
            assert_eq!(trie.get(key), Some(value), "mode {mode:?}, key {key:?}");
        }
    }
}

#[test]
fn test_nested_prefix_chain_distinguishes_intermediate_from_final() {
    // Every key is a prefix of the next; the walk must distinguish
    // Intermediate from Final at each depth.
    let mut builder = BytesTrieBuilder::new();
    let full = b"abcdefghij";
    for end in 1..=full.len() {
        builder.add(&full[..end], end as i32).unwrap();
    }
    let trie = builder.build(BuildMode::Small).unwrap();
    for end in 1..full.len() {
        assert_eq!(trie.lookup(&full[..end]), TrieResult::Intermediate(end as i32));
    }
    assert_eq!(trie.lookup(full), TrieResult::Final(full.len() as i32));
}
