//! Deterministic iteration over unordered maps.
//!
//! Every side-effecting walk over a distribution map (fee consumption,
//! settlement transfers) goes through [`sorted_entries`] so that all nodes
//! visit recipients in the same order regardless of insertion history.

use std::collections::HashMap;
use std::hash::Hash;

/// Returns `(key, value)` pairs of `map` in ascending key order.
pub fn sorted_entries<K, V>(map: &HashMap<K, V>) -> Vec<(&K, &V)>
where
    K: Ord + Hash,
{
    let mut entries: Vec<(&K, &V)> = map.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    entries
}
