//! Whole-gesture template matching.
//!
//! Every dictionary word of two or more letters is rendered as the polyline
//! through its letters' key centroids and resampled to a fixed point count.
//! The raw samples form the location channel, the centred and unit-scaled
//! copy the shape channel. Input gestures are pruned by where they start and
//! end before either channel is compared.

use std::collections::HashSet;
use std::ops::RangeInclusive;
use tracing::debug;

use crate::config::TemplateConfig;
use crate::dictionary::Dictionary;
use crate::geometry::{count_turns, mean_pointwise_distance, normalize_shape, path_length, resample_path};
use crate::keyboard::Layout;
use crate::types::{Candidate, Point, ScoreBreakdown};

const ALPHABET: usize = 26;
const TURN_WINDOW: usize = 3;
const TURN_ANGLE_DEG: f64 = 45.0;

#[derive(Debug, Clone)]
pub struct GestureTemplate {
    pub word: String,
    pub word_index: usize,
    pub frequency: u64,
    pub location: Vec<Point>,
    pub shape: Vec<Point>,
    pub first: char,
    pub last: char,
    pub len: usize,
}

/// Templates for one (layout, dictionary) pair, read-only once built.
#[derive(Debug, Clone)]
pub struct TemplateIndex {
    templates: Vec<GestureTemplate>,
    buckets: Vec<Vec<usize>>,
    config: TemplateConfig,
    max_frequency: u64,
    neighbor_radius: f64,
}

impl TemplateIndex {
    pub fn build(layout: &Layout, dictionary: &Dictionary, config: &TemplateConfig) -> Self {
        let mut templates = Vec::new();
        let mut buckets = vec![Vec::new(); ALPHABET * ALPHABET];

        for entry in dictionary.iter() {
            if entry.len < 2 {
                continue;
            }
            let word = entry.word.to_ascii_lowercase();
            let centroids: Option<Vec<Point>> = word.chars().map(|c| layout.center_of(c)).collect();
            let Some(centroids) = centroids else {
                continue;
            };

            let location = resample_path(&centroids, config.sample_points);
            let shape = normalize_shape(&location);
            let idx = templates.len();
            buckets[bucket_index(entry.first, entry.last)].push(idx);
            templates.push(GestureTemplate {
                word: entry.word.clone(),
                word_index: entry.index,
                frequency: entry.frequency,
                location,
                shape,
                first: entry.first,
                last: entry.last,
                len: entry.len,
            });
        }

        let max_frequency = templates.iter().map(|t| t.frequency).max().unwrap_or(0);
        debug!(templates = templates.len(), "built gesture templates");

        Self {
            templates,
            buckets,
            config: config.clone(),
            max_frequency,
            neighbor_radius: config.neighbor_pitch * layout.key_pitch(),
        }
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&GestureTemplate> {
        self.templates.get(index)
    }

    /// Template indices whose first letter lies near `start`, last letter near
    /// `end`, and length falls in `lengths`. Falls back to neighbouring keys
    /// when the strict set is small.
    pub fn prune(&self, layout: &Layout, start: &Point, end: &Point, lengths: RangeInclusive<usize>) -> Vec<usize> {
        let radius = self.config.prune_radius_px;
        let start_keys = letters_or_nearest(layout, start, radius);
        let end_keys = letters_or_nearest(layout, end, radius);
        let strict = self.collect(&start_keys, &end_keys, &lengths);
        if strict.len() >= self.config.min_pruned || self.neighbor_radius <= radius {
            return strict;
        }

        let start_keys = expand(&start_keys, layout.letters_near(start, self.neighbor_radius));
        let end_keys = expand(&end_keys, layout.letters_near(end, self.neighbor_radius));
        self.collect(&start_keys, &end_keys, &lengths)
    }

    fn collect(&self, start_keys: &[char], end_keys: &[char], lengths: &RangeInclusive<usize>) -> Vec<usize> {
        let mut out = Vec::new();
        for &s in start_keys {
            for &e in end_keys {
                out.extend(
                    self.buckets[bucket_index(s, e)]
                        .iter()
                        .copied()
                        .filter(|&i| lengths.contains(&self.templates[i].len)),
                );
            }
        }
        out
    }

    /// Plausible word lengths for a gesture, widened by the length tolerance.
    ///
    /// Corners give a floor: every corner needs a letter, plus the two ends.
    /// Travel gives a ceiling: each further letter moves at least about one
    /// key pitch, except for doubled letters, which the tolerance absorbs.
    pub fn length_range(&self, sampled: &[Point], pitch: f64) -> RangeInclusive<usize> {
        let tolerance = self.config.length_tolerance;
        let floor = count_turns(sampled, TURN_WINDOW, TURN_ANGLE_DEG) + 2;
        let ceiling = if pitch > 0.0 {
            (path_length(sampled) / pitch).ceil() as usize + 1
        } else {
            usize::MAX
        };
        floor.saturating_sub(tolerance)..=ceiling.max(floor).saturating_add(tolerance)
    }

    /// Ranks templates against a layout-space gesture.
    pub fn recognize(&self, layout: &Layout, path: &[Point]) -> Vec<Candidate> {
        if path.len() < 2 || self.templates.is_empty() {
            return vec![];
        }
        let (start, end) = (path[0], path[path.len() - 1]);

        let sampled = resample_path(path, self.config.sample_points);
        let shape = normalize_shape(&sampled);
        let lengths = self.length_range(&sampled, layout.key_pitch());
        let pruned = self.prune(layout, &start, &end, lengths.clone());

        let mut scored: Vec<(usize, Candidate)> = pruned
            .iter()
            .filter_map(|&i| {
                let t = &self.templates[i];
                let shape_distance = mean_pointwise_distance(&shape, &t.shape)?;
                let location_distance = mean_pointwise_distance(&sampled, &t.location)?;
                Some((t.word_index, self.score(layout, t, &start, &end, shape_distance, location_distance)))
            })
            .collect();

        scored.sort_by(|(ia, a), (ib, b)| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| b.frequency.cmp(&a.frequency))
                .then_with(|| ia.cmp(ib))
        });
        scored.truncate(self.config.max_candidates);

        debug!(
            points = path.len(),
            min_len = *lengths.start(),
            max_len = *lengths.end(),
            pruned = pruned.len(),
            candidates = scored.len(),
            top = scored.first().map(|(_, c)| c.word.as_str()).unwrap_or(""),
            "matched gesture templates"
        );
        scored.into_iter().map(|(_, c)| c).collect()
    }

    fn score(
        &self,
        layout: &Layout,
        t: &GestureTemplate,
        start: &Point,
        end: &Point,
        shape_distance: f64,
        location_distance: f64,
    ) -> Candidate {
        let cfg = &self.config;
        let shape_sim = 1.0 / (1.0 + shape_distance * 10.0);
        let location_sim = 1.0 / (1.0 + location_distance / 50.0);
        let frequency_score = if self.max_frequency > 0 {
            (t.frequency as f64).ln_1p() / (self.max_frequency as f64).ln_1p()
        } else {
            0.0
        };

        let mut bonus = 0.0;
        let landed = |c: char, p: &Point| layout.center_of(c).is_some_and(|k| k.distance_to(p) < cfg.prune_radius_px);
        if landed(t.first, start) {
            bonus += cfg.endpoint_bonus;
        }
        if landed(t.last, end) {
            bonus += cfg.endpoint_bonus;
        }
        bonus += (0.03 * t.len as f64).min(0.2);

        let frequency = cfg.frequency_weight * frequency_score;
        Candidate {
            word: t.word.clone(),
            score: cfg.shape_weight * shape_sim + cfg.location_weight * location_sim + frequency + bonus,
            frequency: t.frequency,
            breakdown: ScoreBreakdown {
                shape_distance,
                location_distance,
                frequency,
                bonus,
                ..ScoreBreakdown::default()
            },
        }
    }
}

fn bucket_index(first: char, last: char) -> usize {
    (first as u8 - b'a') as usize * ALPHABET + (last as u8 - b'a') as usize
}

fn letters_or_nearest(layout: &Layout, p: &Point, radius: f64) -> Vec<char> {
    let mut letters = layout.letters_near(p, radius);
    if letters.is_empty() {
        letters.extend(layout.nearest_letter(p));
    }
    dedup(letters)
}

fn expand(base: &[char], extra: Vec<char>) -> Vec<char> {
    dedup(base.iter().copied().chain(extra).collect())
}

fn dedup(letters: Vec<char>) -> Vec<char> {
    let mut seen = HashSet::new();
    letters.into_iter().filter(|c| seen.insert(*c)).collect()
}
