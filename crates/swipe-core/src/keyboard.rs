//! Keyboard layout model: absolute key rectangles and centroids.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::types::{Point, Rect};

pub const DEFAULT_KEY_UNIT: f64 = 60.0;
pub const DEFAULT_KEY_HEIGHT: f64 = 50.0;
pub const DEFAULT_KEY_SPACING: f64 = 6.0;

const QWERTY_ROWS: [(&str, f64); 3] = [("qwertyuiop", 0.0), ("asdfghjkl", 0.5), ("zxcvbnm", 1.5)];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Key {
    pub id: String,
    pub label: String,
    pub rect: Rect,
    pub center: Point,
    pub special: bool,
}

impl Key {
    pub fn is_alpha(&self) -> bool {
        self.letter().is_some()
    }

    /// Lowercase letter for single-letter keys.
    pub fn letter(&self) -> Option<char> {
        let mut chars = self.id.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_ascii_alphabetic() => Some(c.to_ascii_lowercase()),
            _ => None,
        }
    }
}

/// On-disk layout description, in grid units.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutFile {
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_unit")]
    pub key_unit: f64,
    #[serde(default = "default_height")]
    pub key_height: f64,
    #[serde(default = "default_spacing")]
    pub key_spacing: f64,
    pub rows: Vec<RowSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RowSpec {
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub offset: f64,
    pub keys: Vec<KeySpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeySpec {
    pub code: String,
    #[serde(default)]
    pub label: Option<String>,
    /// Column in grid units; defaults to right after the previous key
    #[serde(default)]
    pub x: Option<f64>,
    #[serde(default = "default_width")]
    pub w: f64,
    #[serde(default)]
    pub special: bool,
    #[serde(default)]
    pub action: bool,
}

fn default_unit() -> f64 {
    DEFAULT_KEY_UNIT
}

fn default_height() -> f64 {
    DEFAULT_KEY_HEIGHT
}

fn default_spacing() -> f64 {
    DEFAULT_KEY_SPACING
}

fn default_width() -> f64 {
    1.0
}

impl LayoutFile {
    pub fn qwerty() -> Self {
        let rows = QWERTY_ROWS
            .iter()
            .enumerate()
            .map(|(row, (letters, offset))| RowSpec {
                y: row as f64,
                offset: *offset,
                keys: letters
                    .chars()
                    .enumerate()
                    .map(|(i, c)| KeySpec {
                        code: c.to_string(),
                        label: Some(c.to_ascii_uppercase().to_string()),
                        x: Some(i as f64),
                        w: 1.0,
                        special: false,
                        action: false,
                    })
                    .collect(),
            })
            .collect();

        Self {
            name: "qwerty".to_string(),
            key_unit: DEFAULT_KEY_UNIT,
            key_height: DEFAULT_KEY_HEIGHT,
            key_spacing: DEFAULT_KEY_SPACING,
            rows,
        }
    }

    /// Converts grid units to absolute key rectangles.
    pub fn to_keys(&self) -> Vec<Key> {
        let unit = if self.key_unit > 0.0 { self.key_unit } else { DEFAULT_KEY_UNIT };
        let height = if self.key_height > 0.0 { self.key_height } else { DEFAULT_KEY_HEIGHT };
        let spacing = if self.key_spacing >= 0.0 { self.key_spacing } else { DEFAULT_KEY_SPACING };

        let mut keys = Vec::new();
        for row in &self.rows {
            let y = row.y * (height + spacing);
            let mut cursor = 0.0;
            for spec in &row.keys {
                let w = if spec.w > 0.0 { spec.w } else { 1.0 };
                let col = spec.x.unwrap_or(cursor);
                cursor = col + w;

                let kx = col + row.offset;
                let x = if kx > 0.0 { kx * unit + kx.floor() * spacing } else { 0.0 };
                let width = if w > 1.0 { w * unit + (w - 1.0) * spacing } else { w * unit };
                let rect = Rect::new(x, y, width, height);

                keys.push(Key {
                    id: spec.code.clone(),
                    label: spec.label.clone().unwrap_or_else(|| spec.code.clone()),
                    rect,
                    center: rect.center(),
                    special: spec.special || spec.action,
                });
            }
        }
        keys
    }
}

/// Result of locating the key responsible for a point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyHit {
    pub index: usize,
    /// The point lies inside the key's rectangle
    pub inside: bool,
    /// Squared distance to the key's centroid
    pub distance_sq: f64,
}

/// Immutable key set, shared read-only between sessions.
#[derive(Debug, Clone, Default)]
pub struct Layout {
    name: String,
    keys: Vec<Key>,
    bounds: Rect,
    by_id: HashMap<String, usize>,
    by_letter: [Option<usize>; 26],
    pitch: f64,
}

impl Layout {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn qwerty() -> Self {
        let file = LayoutFile::qwerty();
        Self::from_keys(file.name.clone(), file.to_keys())
    }

    /// Parses a layout description. A description without keys is an error.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let file: LayoutFile = serde_json::from_str(json)?;
        let keys = file.to_keys();
        if keys.is_empty() {
            return Err(Error::EmptyLayout);
        }
        let name = if file.name.is_empty() { "custom".to_string() } else { file.name };
        Ok(Self::from_keys(name, keys))
    }

    pub fn from_keys(name: impl Into<String>, keys: Vec<Key>) -> Self {
        let mut by_id = HashMap::with_capacity(keys.len());
        let mut by_letter = [None; 26];
        for (i, key) in keys.iter().enumerate() {
            by_id.entry(key.id.clone()).or_insert(i);
            if let Some(c) = key.letter() {
                let slot = &mut by_letter[(c as u8 - b'a') as usize];
                if slot.is_none() {
                    *slot = Some(i);
                }
            }
        }

        let bounds = keys
            .iter()
            .map(|k| k.rect)
            .reduce(|a, b| a.union(&b))
            .unwrap_or_default();
        let pitch = compute_pitch(&keys);

        Self {
            name: name.into(),
            keys,
            bounds,
            by_id,
            by_letter,
            pitch,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Union of all key rectangles.
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn key(&self, id: &str) -> Option<&Key> {
        self.by_id.get(id).map(|&i| &self.keys[i])
    }

    pub fn key_for_char(&self, c: char) -> Option<&Key> {
        if !c.is_ascii_alphabetic() {
            return None;
        }
        let idx = (c.to_ascii_lowercase() as u8 - b'a') as usize;
        self.by_letter[idx].map(|i| &self.keys[i])
    }

    pub fn center_of(&self, c: char) -> Option<Point> {
        self.key_for_char(c).map(|k| k.center)
    }

    /// Inside-rectangle match in layout order, otherwise the nearest centroid.
    /// Equal distances resolve to the key listed first.
    pub fn locate(&self, p: &Point) -> Option<KeyHit> {
        if let Some((index, key)) = self.keys.iter().enumerate().find(|(_, k)| k.rect.contains(p)) {
            return Some(KeyHit {
                index,
                inside: true,
                distance_sq: key.center.distance_squared_to(p),
            });
        }

        let mut best: Option<KeyHit> = None;
        for (index, key) in self.keys.iter().enumerate() {
            let d = key.center.distance_squared_to(p);
            if best.map_or(true, |b| d < b.distance_sq) {
                best = Some(KeyHit {
                    index,
                    inside: false,
                    distance_sq: d,
                });
            }
        }
        best
    }

    pub fn hit_test(&self, p: &Point) -> Option<&Key> {
        self.locate(p).map(|hit| &self.keys[hit.index])
    }

    pub fn key_at(&self, index: usize) -> Option<&Key> {
        self.keys.get(index)
    }

    pub fn clamp(&self, p: Point) -> Point {
        if self.keys.is_empty() {
            return p;
        }
        self.bounds.clamp(p)
    }

    /// Typical distance between neighbouring key centroids.
    pub fn key_pitch(&self) -> f64 {
        self.pitch
    }

    /// Letters whose centroid lies within `radius` of `p`, in layout order.
    pub fn letters_near(&self, p: &Point, radius: f64) -> Vec<char> {
        let r2 = radius * radius;
        self.keys
            .iter()
            .filter(|k| k.center.distance_squared_to(p) <= r2)
            .filter_map(Key::letter)
            .collect()
    }

    /// Polyline through the centroids of the word's letters. Letters without a
    /// key are skipped.
    pub fn word_path(&self, word: &str) -> Vec<Point> {
        word.chars().filter_map(|c| self.center_of(c)).collect()
    }

    /// Letter of the alphabetic key with the nearest centroid.
    pub fn nearest_letter(&self, p: &Point) -> Option<char> {
        let mut best: Option<(f64, char)> = None;
        for key in &self.keys {
            let Some(c) = key.letter() else { continue };
            let d = key.center.distance_squared_to(p);
            if best.map_or(true, |(bd, _)| d < bd) {
                best = Some((d, c));
            }
        }
        best.map(|(_, c)| c)
    }
}

/// Median nearest-neighbour centroid distance.
fn compute_pitch(keys: &[Key]) -> f64 {
    match keys.len() {
        0 => 0.0,
        1 => keys[0].rect.w.max(keys[0].rect.h),
        _ => {
            let mut nearest: Vec<f64> = keys
                .iter()
                .enumerate()
                .map(|(i, a)| {
                    keys.iter()
                        .enumerate()
                        .filter(|(j, _)| *j != i)
                        .map(|(_, b)| a.center.distance_to(&b.center))
                        .filter(|d| *d > 1e-9)
                        .fold(f64::INFINITY, f64::min)
                })
                .filter(|d| d.is_finite())
                .collect();
            if nearest.is_empty() {
                return keys[0].rect.w.max(keys[0].rect.h);
            }
            nearest.sort_by(|a, b| a.total_cmp(b));
            nearest[nearest.len() / 2]
        }
    }
}
