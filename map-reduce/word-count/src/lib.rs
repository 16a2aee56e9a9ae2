// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use anyhow::Context;
use map_reduce_core::map_reduce_job::MapReduceJob;
use rand::Rng;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

/// Word count job definition - counts every word over (document, line) pairs
pub struct WordCount;

impl MapReduceJob for WordCount {
    type InputKey = String;
    type InputValue = String;
    type Key = String;
    type Value = u64;

    fn map(&self, input: Vec<(String, String)>) -> anyhow::Result<Vec<(String, u64)>> {
        Ok(input
            .iter()
            .flat_map(|(_, line)| tokenize(line))
            .map(|word| (word, 1))
            .collect())
    }

    fn reduce(&self, _key: &String, values: Vec<u64>) -> anyhow::Result<Vec<u64>> {
        Ok(vec![values.iter().sum()])
    }
}

/// Lowercased words made of alphanumerics and '_'; everything else is dropped
pub fn tokenize(line: &str) -> impl Iterator<Item = String> + '_ {
    line.split_whitespace().filter_map(|raw| {
        let cleaned: String = raw
            .chars()
            .filter(|c| c.is_alphanumeric() || *c == '_')
            .collect::<String>()
            .to_lowercase();
        (!cleaned.is_empty()).then_some(cleaned)
    })
}

/// One input pair per non-blank line, keyed by the file name
pub fn read_documents(paths: &[PathBuf]) -> anyhow::Result<Vec<(String, String)>> {
    let mut documents = Vec::new();
    for path in paths {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let name = path.display().to_string();
        documents.extend(
            contents
                .lines()
                .filter(|line| !line.trim().is_empty())
                .map(|line| (name.clone(), line.to_string())),
        );
    }
    Ok(documents)
}

const VOCABULARY: &[&str] = &[
    "map", "reduce", "worker", "coordinator", "task", "phase", "key", "value", "shuffle",
    "barrier", "retry", "timeout",
];

/// Random lines drawn from a small vocabulary
pub fn generate_documents(
    rng: &mut impl Rng,
    lines: usize,
    words_per_line: usize,
) -> Vec<(String, String)> {
    (0..lines)
        .map(|line| {
            let text: Vec<&str> = (0..words_per_line)
                .map(|_| VOCABULARY[rng.random_range(0..VOCABULARY.len())])
                .collect();
            (format!("generated-{}", line), text.join(" "))
        })
        .collect()
}

/// Highest counts first, ties broken alphabetically
pub fn top_words(output: &HashMap<String, Vec<u64>>, limit: usize) -> Vec<(String, u64)> {
    let mut counts: Vec<(String, u64)> = output
        .iter()
        .map(|(word, values)| (word.clone(), values.iter().sum()))
        .collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    counts.truncate(limit);
    counts
}
