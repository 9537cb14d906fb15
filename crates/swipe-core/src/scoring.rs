//! Key-sequence candidate scoring
//!
//! `score = -w_edit * edit_distance + w_bigram * bigram_overlap
//!          + w_freq * ln(1 + frequency) + w_spatial * spatial`

use std::collections::HashSet;
use std::time::Instant;
use tracing::debug;

use crate::config::ScoringConfig;
use crate::dictionary::{DictWord, Dictionary};
use crate::keyboard::Layout;
use crate::types::{Candidate, ScoreBreakdown};

/// Case-insensitive Levenshtein distance, capped at `limit + 1`.
pub fn levenshtein(a: &str, b: &str, limit: usize) -> usize {
    let a: Vec<char> = a.chars().map(|c| c.to_ascii_lowercase()).collect();
    let b: Vec<char> = b.chars().map(|c| c.to_ascii_lowercase()).collect();
    let over = limit + 1;

    if a.len().abs_diff(b.len()) > limit {
        return over;
    }
    if a.is_empty() || b.is_empty() {
        return a.len().max(b.len()).min(over);
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut cur = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        cur[0] = i + 1;
        let mut row_min = cur[0];
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            cur[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(cur[j] + 1);
            row_min = row_min.min(cur[j + 1]);
        }
        if row_min > limit {
            return over;
        }
        std::mem::swap(&mut prev, &mut cur);
    }

    prev[b.len()].min(over)
}

fn bigrams(s: &str) -> HashSet<(char, char)> {
    let chars: Vec<char> = s.chars().map(|c| c.to_ascii_lowercase()).collect();
    chars
        .windows(2)
        .filter(|w| w[0].is_ascii_alphabetic() && w[1].is_ascii_alphabetic())
        .map(|w| (w[0], w[1]))
        .collect()
}

/// Number of distinct adjacent letter pairs the two strings share.
pub fn bigram_overlap(a: &str, b: &str) -> usize {
    let left = bigrams(a);
    if left.is_empty() {
        return 0;
    }
    bigrams(b).intersection(&left).count()
}

pub fn frequency_term(frequency: u64) -> f64 {
    (frequency as f64).ln_1p()
}

/// Mean centroid distance between proportionally aligned letters, mapped to
/// `max(-1, 1 - avg / scale)`. Letters without a key are skipped; no pairs
/// scores 0.
pub fn spatial_score(layout: &Layout, sequence: &str, word: &str, scale: f64) -> f64 {
    let seq: Vec<char> = sequence.chars().collect();
    let cand: Vec<char> = word.chars().collect();
    let (n, m) = (seq.len(), cand.len());
    if n == 0 || m == 0 || scale <= 0.0 {
        return 0.0;
    }

    let (mut i, mut j) = (0, 0);
    let mut total = 0.0;
    let mut pairs = 0usize;

    while i < n && j < m {
        if let (Some(p), Some(q)) = (layout.center_of(seq[i]), layout.center_of(cand[j])) {
            total += p.distance_to(&q);
            pairs += 1;
        }
        // advance the side with more letters left, both when even
        let (left_i, left_j) = (n - i, m - j);
        if left_i > left_j {
            i += 1;
        } else if left_j > left_i {
            j += 1;
        } else {
            i += 1;
            j += 1;
        }
    }

    if pairs == 0 {
        return 0.0;
    }
    let avg = total / pairs as f64;
    (1.0 - avg / scale).max(-1.0)
}

pub fn score_word(layout: &Layout, sequence: &str, word: &DictWord, config: &ScoringConfig) -> Candidate {
    let edit_distance = levenshtein(sequence, &word.word, config.edit_distance_limit);
    let bigram_overlap = bigram_overlap(sequence, &word.word);
    let frequency = config.frequency_weight * frequency_term(word.frequency);
    let lower = word.word.to_ascii_lowercase();
    let spatial = config.spatial_weight * spatial_score(layout, sequence, &lower, config.spatial_scale_px);

    let score = -config.edit_weight * edit_distance as f64
        + config.bigram_weight * bigram_overlap as f64
        + frequency
        + spatial;

    Candidate {
        word: word.word.clone(),
        score,
        frequency: word.frequency,
        breakdown: ScoreBreakdown {
            edit_distance,
            bigram_overlap,
            frequency,
            spatial,
            ..ScoreBreakdown::default()
        },
    }
}

/// Drops entries under `min_score`, orders by score, then frequency, then
/// dictionary order, and keeps the first `max`.
pub fn rank(mut scored: Vec<(usize, Candidate)>, min_score: f64, max: usize) -> Vec<Candidate> {
    scored.retain(|(_, c)| c.score >= min_score);
    scored.sort_by(|(ia, a), (ib, b)| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| b.frequency.cmp(&a.frequency))
            .then_with(|| ia.cmp(ib))
    });
    scored.truncate(max);
    scored.into_iter().map(|(_, c)| c).collect()
}

/// Ranked candidates for a joined key sequence such as `"hi"`.
pub fn generate_candidates(
    layout: &Layout,
    dictionary: &Dictionary,
    sequence: &str,
    config: &ScoringConfig,
) -> Vec<Candidate> {
    let sequence: String = sequence
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .map(|c| c.to_ascii_lowercase())
        .collect();
    if sequence.len() < config.min_sequence_len || dictionary.is_empty() {
        return vec![];
    }

    let start = Instant::now();
    let shortlist = dictionary.shortlist(&sequence, config.length_tolerance);
    let shortlist_len = shortlist.len();
    let scored: Vec<(usize, Candidate)> = shortlist
        .into_iter()
        .map(|w| (w.index, score_word(layout, &sequence, w, config)))
        .collect();
    let candidates = rank(scored, config.min_score, config.max_candidates);

    debug!(
        sequence = %sequence,
        shortlist = shortlist_len,
        candidates = candidates.len(),
        top = candidates.first().map(|c| c.word.as_str()).unwrap_or(""),
        elapsed_us = start.elapsed().as_micros() as u64,
        "scored key sequence"
    );
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ScoringConfig {
        ScoringConfig::default()
    }

    #[test]
    fn test_levenshtein_basics() {
        assert_eq!(levenshtein("kitten", "sitting", 7), 3);
        assert_eq!(levenshtein("HELLO", "hello", 7), 0);
        assert_eq!(levenshtein("", "abc", 7), 3);
        assert_eq!(levenshtein("abc", "", 1), 2);
    }

    #[test]
    fn test_levenshtein_early_exit() {
        assert_eq!(levenshtein("a", "abcdefghijk", 7), 8);
        assert_eq!(levenshtein("abcdefgh", "zyxwvuts", 3), 4);
        assert_eq!(levenshtein("abcd", "wxyz", 7), 4);
    }

    #[test]
    fn test_bigram_overlap() {
        assert_eq!(bigram_overlap("hello", "help"), 2);
        assert_eq!(bigram_overlap("ab", "ba"), 0);
        assert_eq!(bigram_overlap("aaaa", "aa"), 1);
        assert_eq!(bigram_overlap("a", "a"), 0);
    }

    #[test]
    fn test_spatial_score() {
        let layout = Layout::qwerty();
        assert_eq!(spatial_score(&layout, "hi", "hi", 60.0), 1.0);
        // neighbouring keys sit 66px apart
        let s = spatial_score(&layout, "sd", "ds", 60.0);
        assert!((s - (1.0 - 66.0 / 60.0)).abs() < 1e-9);
        assert_eq!(spatial_score(&layout, "qp", "pq", 60.0), -1.0);
        assert_eq!(spatial_score(&layout, "12", "34", 60.0), 0.0);
    }

    #[test]
    fn test_spatial_alignment_handles_length_mismatch() {
        let layout = Layout::qwerty();
        // the extra "e" is paired once with "h", the rest line up
        let s = spatial_score(&layout, "hllo", "hello", 60.0);
        assert!(s > 0.2 && s < 0.25, "{s}");
        assert!(s > spatial_score(&layout, "hllo", "hxxxo", 60.0));
    }

    #[test]
    fn test_exact_word_beats_neighbours() {
        let layout = Layout::qwerty();
        let dict = Dictionary::from_entries([("hello", 10), ("hollo", 10), ("hullo", 10)]);
        let out = generate_candidates(&layout, &dict, "hello", &config());
        assert_eq!(out[0].word, "hello");
        assert_eq!(out[0].breakdown.edit_distance, 0);
    }

    #[test]
    fn test_short_sequence_and_empty_dictionary() {
        let layout = Layout::qwerty();
        let dict = Dictionary::from_entries([("a", 100), ("an", 50)]);
        assert!(generate_candidates(&layout, &dict, "a", &config()).is_empty());
        assert!(generate_candidates(&layout, &Dictionary::new(), "an", &config()).is_empty());
    }

    #[test]
    fn test_rank_tie_breaks() {
        let c = |w: &str, score: f64, frequency: u64| Candidate {
            word: w.to_string(),
            score,
            frequency,
            breakdown: ScoreBreakdown::default(),
        };
        let ranked = rank(
            vec![
                (0, c("a", 1.0, 5)),
                (1, c("b", 2.0, 1)),
                (2, c("c", 1.0, 9)),
                (3, c("d", 1.0, 5)),
                (4, c("e", -6.0, 99)),
            ],
            -5.0,
            8,
        );
        let words: Vec<&str> = ranked.iter().map(|c| c.word.as_str()).collect();
        assert_eq!(words, vec!["b", "c", "a", "d"]);
    }

    #[test]
    fn test_truncates_to_max_candidates() {
        let layout = Layout::qwerty();
        let words: Vec<(String, u64)> = (0..20)
            .map(|i| (format!("t{}e", "h".repeat(i % 3 + 1)), i as u64))
            .collect();
        let dict = Dictionary::from_entries(words);
        let mut cfg = config();
        cfg.max_candidates = 2;
        assert!(generate_candidates(&layout, &dict, "the", &cfg).len() <= 2);
    }
}
