// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use indexmap::IndexMap;
use std::collections::HashMap;
use std::hash::Hash;
use std::mem;

/// Results of the map phase and the reduce phase, owned by the coordinator
#[derive(Debug)]
pub struct PhaseAccumulator<K, V> {
    map_output: IndexMap<K, Vec<V>>,
    final_output: HashMap<K, Vec<V>>,
}

impl<K, V> Default for PhaseAccumulator<K, V> {
    fn default() -> Self {
        Self {
            map_output: IndexMap::new(),
            final_output: HashMap::new(),
        }
    }
}

impl<K, V> PhaseAccumulator<K, V>
where
    K: Eq + Hash,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Values are appended in arrival order; keys keep their first arrival position
    pub fn fold_map_result(&mut self, pairs: Vec<(K, V)>) {
        for (key, value) in pairs {
            self.map_output.entry(key).or_default().push(value);
        }
    }

    pub fn map_output(&self) -> &IndexMap<K, Vec<V>> {
        &self.map_output
    }

    /// The map -> reduce barrier: one group per distinct key, in first arrival order
    pub fn take_reduce_input(&mut self) -> Vec<(K, Vec<V>)> {
        mem::take(&mut self.map_output).into_iter().collect()
    }

    pub fn fold_reduce_result(&mut self, key: K, values: Vec<V>) {
        self.final_output.insert(key, values);
    }

    pub fn final_output(&self) -> &HashMap<K, Vec<V>> {
        &self.final_output
    }

    pub fn into_final_output(self) -> HashMap<K, Vec<V>> {
        self.final_output
    }
}
