//! Path to key-sequence mapping
//!
//! Samples are assigned to keys through a hysteresis gate, consecutive
//! samples on one key form a visit, and short A-B-A excursions are removed.

use crate::config::MapperConfig;
use crate::keyboard::Layout;
use crate::types::Point;

/// Key-switch gate for one gesture.
#[derive(Debug, Clone)]
pub struct Hysteresis {
    config: MapperConfig,
    current: Option<usize>,
    candidate: Option<usize>,
    streak: u32,
}

impl Hysteresis {
    pub fn new(config: MapperConfig) -> Self {
        Self {
            config,
            current: None,
            candidate: None,
            streak: 0,
        }
    }

    pub fn current(&self) -> Option<usize> {
        self.current
    }

    pub fn candidate(&self) -> Option<(usize, u32)> {
        self.candidate.map(|c| (c, self.streak))
    }

    pub fn reset(&mut self) {
        self.current = None;
        self.candidate = None;
        self.streak = 0;
    }

    /// Key index the sample is assigned to, or `None` when it is noise.
    pub fn update(&mut self, layout: &Layout, p: &Point) -> Option<usize> {
        let hit = layout.locate(p)?;

        let cutoff = self.config.noise_cutoff_px;
        if !hit.inside && cutoff > 0.0 && hit.distance_sq > cutoff * cutoff {
            return None;
        }

        let Some(current) = self.current else {
            self.current = Some(hit.index);
            return self.current;
        };

        if hit.index == current {
            self.candidate = None;
            self.streak = 0;
            return self.current;
        }

        let d_new = hit.distance_sq.sqrt();
        let d_cur = layout
            .key_at(current)
            .map(|k| k.center.distance_to(p))
            .unwrap_or(f64::INFINITY);
        let clear_win =
            d_new <= self.config.switch_ratio * d_cur && d_cur - d_new >= self.config.switch_gap_px;

        if hit.inside || clear_win {
            self.switch_to(hit.index);
            return self.current;
        }

        if self.candidate == Some(hit.index) {
            self.streak += 1;
        } else {
            self.candidate = Some(hit.index);
            self.streak = 1;
        }
        if self.streak >= self.config.consecutive_samples {
            self.switch_to(hit.index);
        }
        self.current
    }

    fn switch_to(&mut self, index: usize) {
        self.current = Some(index);
        self.candidate = None;
        self.streak = 0;
    }
}

/// A run of consecutive samples assigned to one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Visit {
    pub key: usize,
    pub dwell: u32,
}

/// Incremental mapper fed one sample at a time by the gesture session.
#[derive(Debug, Clone)]
pub struct SequenceBuilder {
    hysteresis: Hysteresis,
    visits: Vec<Visit>,
    min_dwell: u32,
}

impl SequenceBuilder {
    pub fn new(config: MapperConfig) -> Self {
        let min_dwell = config.min_dwell;
        Self {
            hysteresis: Hysteresis::new(config),
            visits: Vec::new(),
            min_dwell,
        }
    }

    pub fn push(&mut self, layout: &Layout, p: &Point) {
        let Some(key) = self.hysteresis.update(layout, p) else {
            return;
        };
        match self.visits.last_mut() {
            Some(last) if last.key == key => last.dwell += 1,
            _ => self.visits.push(Visit { key, dwell: 1 }),
        }
    }

    pub fn visits(&self) -> &[Visit] {
        &self.visits
    }

    pub fn clear(&mut self) {
        self.hysteresis.reset();
        self.visits.clear();
    }

    /// Key ids after bounce removal.
    pub fn finish(&self, layout: &Layout) -> Vec<String> {
        remove_bounces(&self.visits, self.min_dwell)
            .iter()
            .filter_map(|v| layout.key_at(v.key).map(|k| k.id.clone()))
            .collect()
    }
}

/// Drops B from A-B-A when B's dwell is below `min_dwell` and merges the two A
/// visits, repeating as merges expose new patterns.
pub fn remove_bounces(visits: &[Visit], min_dwell: u32) -> Vec<Visit> {
    let mut stack: Vec<Visit> = Vec::with_capacity(visits.len());
    for &visit in visits {
        if let Some(top) = stack.last_mut() {
            if top.key == visit.key {
                top.dwell += visit.dwell;
                continue;
            }
        }
        stack.push(visit);

        while stack.len() >= 3 {
            let n = stack.len();
            let (a, b, c) = (stack[n - 3], stack[n - 2], stack[n - 1]);
            if a.key != c.key || b.dwell >= min_dwell {
                break;
            }
            stack.truncate(n - 2);
            if let Some(top) = stack.last_mut() {
                top.dwell += c.dwell;
            }
        }
    }
    stack
}

pub fn map_path_to_sequence(layout: &Layout, path: &[Point], config: &MapperConfig) -> Vec<String> {
    let mut builder = SequenceBuilder::new(config.clone());
    for p in path {
        builder.push(layout, p);
    }
    builder.finish(layout)
}

/// Lowercase letters of the single-letter ids, in order.
pub fn sequence_to_string(sequence: &[String]) -> String {
    sequence
        .iter()
        .filter_map(|id| {
            let mut chars = id.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if c.is_ascii_alphabetic() => Some(c.to_ascii_lowercase()),
                _ => None,
            }
        })
        .collect()
}
