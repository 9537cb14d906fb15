//! Word list with frequencies, bucketed by (first letter, last letter).

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

const ALPHABET: usize = 26;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DictWord {
    pub word: String,
    /// Occurrence count, larger is more common
    pub frequency: u64,
    /// 1-based position by descending frequency
    pub rank: usize,
    pub first: char,
    pub last: char,
    pub len: usize,
    /// Position in load order
    pub index: usize,
}

#[derive(Debug, Clone)]
pub struct Dictionary {
    words: Vec<DictWord>,
    buckets: Vec<Vec<usize>>,
    max_frequency: u64,
}

impl Default for Dictionary {
    fn default() -> Self {
        Self::new()
    }
}

impl Dictionary {
    pub fn new() -> Self {
        Self {
            words: Vec::new(),
            buckets: vec![Vec::new(); ALPHABET * ALPHABET],
            max_frequency: 0,
        }
    }

    /// Builds from a word list and an optional `word<TAB>count` table.
    ///
    /// The word list may carry inline counts in the same format; the separate
    /// table takes precedence when both mention a word.
    pub fn from_sources(words_text: &str, freq_text: Option<&str>) -> Self {
        let table = freq_text.map(parse_frequencies).unwrap_or_default();
        let entries = words_text.lines().filter_map(parse_word_line).map(|(word, inline)| {
            let frequency = table
                .get(&word.to_ascii_lowercase())
                .copied()
                .or(inline)
                .unwrap_or(0);
            (word, frequency)
        });
        Self::from_entries(entries)
    }

    /// Builds from `(word, frequency)` pairs, skipping non-alphabetic words and
    /// case-insensitive duplicates.
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, u64)>,
        S: Into<String>,
    {
        let mut dict = Self::new();
        let mut seen = HashSet::new();

        for (word, frequency) in entries {
            let word: String = word.into();
            let word = word.trim();
            if !is_valid_word(word) || !seen.insert(word.to_ascii_lowercase()) {
                continue;
            }
            let lower = word.to_ascii_lowercase();
            let bytes = lower.as_bytes();
            let index = dict.words.len();
            dict.words.push(DictWord {
                word: word.to_string(),
                frequency,
                rank: 0,
                first: bytes[0] as char,
                last: bytes[bytes.len() - 1] as char,
                len: bytes.len(),
                index,
            });
        }

        dict.finalize();
        dict
    }

    /// Replaces the contents with a combined `word<TAB>count` list.
    pub fn load_from_text(&mut self, text: &str) {
        *self = Self::from_sources(text, None);
    }

    fn finalize(&mut self) {
        let mut order: Vec<usize> = (0..self.words.len()).collect();
        order.sort_by(|&a, &b| self.words[b].frequency.cmp(&self.words[a].frequency));
        for (pos, &i) in order.iter().enumerate() {
            self.words[i].rank = pos + 1;
        }

        for bucket in &mut self.buckets {
            bucket.clear();
        }
        for w in &self.words {
            self.buckets[bucket_index(w.first, w.last)].push(w.index);
        }
        self.max_frequency = self.words.iter().map(|w| w.frequency).max().unwrap_or(0);
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&DictWord> {
        self.words.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DictWord> {
        self.words.iter()
    }

    pub fn max_frequency(&self) -> u64 {
        self.max_frequency
    }

    pub fn frequency_of(&self, word: &str) -> Option<u64> {
        let lower = word.to_ascii_lowercase();
        let first = lower.chars().next()?;
        let last = lower.chars().last()?;
        self.bucket(first, last)
            .iter()
            .map(|&i| &self.words[i])
            .find(|w| w.word.eq_ignore_ascii_case(&lower))
            .map(|w| w.frequency)
    }

    /// Word indices whose first and last letters match, in load order.
    pub fn bucket(&self, first: char, last: char) -> &[usize] {
        if !first.is_ascii_alphabetic() || !last.is_ascii_alphabetic() {
            return &[];
        }
        &self.buckets[bucket_index(first.to_ascii_lowercase(), last.to_ascii_lowercase())]
    }

    /// Words sharing the sequence's first and last letters whose length is
    /// within `tolerance` of the sequence length.
    pub fn shortlist(&self, sequence: &str, tolerance: usize) -> Vec<&DictWord> {
        let (Some(first), Some(last)) = (sequence.chars().next(), sequence.chars().last()) else {
            return vec![];
        };
        let len = sequence.chars().count();
        self.bucket(first, last)
            .iter()
            .map(|&i| &self.words[i])
            .filter(|w| w.len.abs_diff(len) <= tolerance)
            .collect()
    }
}

fn bucket_index(first: char, last: char) -> usize {
    (first as u8 - b'a') as usize * ALPHABET + (last as u8 - b'a') as usize
}

fn is_valid_word(word: &str) -> bool {
    !word.is_empty() && word.bytes().all(|b| b.is_ascii_alphabetic())
}

/// Splits one word-list line into the word and an optional inline count.
/// Blank lines, `#` comments and lines with a non-numeric count are skipped.
fn parse_word_line(line: &str) -> Option<(String, Option<u64>)> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    let mut parts = line.split_whitespace();
    let word = parts.next()?;
    let count = match parts.next() {
        Some(token) => Some(parse_count(token)?),
        None => None,
    };
    Some((word.to_string(), count))
}

fn parse_count(token: &str) -> Option<u64> {
    token
        .parse::<u64>()
        .ok()
        .or_else(|| token.parse::<f64>().ok().filter(|f| f.is_finite() && *f >= 0.0).map(|f| f.round() as u64))
}

/// Parses `word<TAB>count` lines into a lowercase-keyed table. Malformed lines
/// are skipped; the first entry for a word wins.
pub fn parse_frequencies(text: &str) -> HashMap<String, u64> {
    let mut table = HashMap::new();
    for line in text.lines() {
        let Some((word, Some(count))) = parse_word_line(line) else {
            continue;
        };
        table.entry(word.to_ascii_lowercase()).or_insert(count);
    }
    table
}
