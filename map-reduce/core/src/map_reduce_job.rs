// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::message::Message;
use crate::task::Task;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::marker::PhantomData;

/// Trait that defines a specific MapReduce job
/// The coordinator only moves the associated types around; workers call map and reduce
pub trait MapReduceJob: Send + Sync + 'static {
    /// Key of an input pair
    type InputKey: Clone + Send + 'static;

    /// Value of an input pair
    type InputValue: Clone + Send + 'static;

    /// Intermediate and output key
    type Key: Clone + Eq + Hash + Debug + Send + 'static;

    /// Intermediate and output value
    type Value: Clone + Send + 'static;

    /// Map one chunk of input pairs to intermediate pairs
    fn map(
        &self,
        input: Vec<(Self::InputKey, Self::InputValue)>,
    ) -> anyhow::Result<Vec<(Self::Key, Self::Value)>>;

    /// Reduce every value emitted for one key
    fn reduce(&self, key: &Self::Key, values: Vec<Self::Value>) -> anyhow::Result<Vec<Self::Value>>;
}

pub type JobMessage<J> = Message<
    <J as MapReduceJob>::InputKey,
    <J as MapReduceJob>::InputValue,
    <J as MapReduceJob>::Key,
    <J as MapReduceJob>::Value,
>;

pub type JobTask<J> = Task<
    <J as MapReduceJob>::InputKey,
    <J as MapReduceJob>::InputValue,
    <J as MapReduceJob>::Key,
    <J as MapReduceJob>::Value,
>;

pub type FinalOutput<J> = HashMap<<J as MapReduceJob>::Key, Vec<<J as MapReduceJob>::Value>>;

/// A job built from a pair of plain functions
pub struct FnJob<K1, V1, K2, V2, M, R> {
    map_fn: M,
    reduce_fn: R,
    _types: PhantomData<fn() -> (K1, V1, K2, V2)>,
}

impl<K1, V1, K2, V2, M, R> FnJob<K1, V1, K2, V2, M, R>
where
    M: Fn(Vec<(K1, V1)>) -> anyhow::Result<Vec<(K2, V2)>> + Send + Sync + 'static,
    R: Fn(&K2, Vec<V2>) -> anyhow::Result<Vec<V2>> + Send + Sync + 'static,
{
    pub fn new(map_fn: M, reduce_fn: R) -> Self {
        Self {
            map_fn,
            reduce_fn,
            _types: PhantomData,
        }
    }
}

impl<K1, V1, K2, V2, M, R> MapReduceJob for FnJob<K1, V1, K2, V2, M, R>
where
    K1: Clone + Send + 'static,
    V1: Clone + Send + 'static,
    K2: Clone + Eq + Hash + Debug + Send + 'static,
    V2: Clone + Send + 'static,
    M: Fn(Vec<(K1, V1)>) -> anyhow::Result<Vec<(K2, V2)>> + Send + Sync + 'static,
    R: Fn(&K2, Vec<V2>) -> anyhow::Result<Vec<V2>> + Send + Sync + 'static,
{
    type InputKey = K1;
    type InputValue = V1;
    type Key = K2;
    type Value = V2;

    fn map(&self, input: Vec<(K1, V1)>) -> anyhow::Result<Vec<(K2, V2)>> {
        (self.map_fn)(input)
    }

    fn reduce(&self, key: &K2, values: Vec<V2>) -> anyhow::Result<Vec<V2>> {
        (self.reduce_fn)(key, values)
    }
}
