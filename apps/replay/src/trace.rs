//! Pointer traces: one JSON object per line, e.g.
//!
//! ```text
//! {"kind":"down","x":390,"y":81,"t":0}
//! {"kind":"move","x":402,"y":70,"t":12,"lx":402,"ly":70}
//! {"kind":"up","x":558,"y":25,"t":180}
//! ```
//!
//! A single JSON array of the same objects is accepted too. `lx`/`ly`
//! default to `x`/`y`. Blank lines and `#` comments are ignored.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use swipe_core::geometry::interpolate_path;
use swipe_core::{Layout, Point, PointerEvent, PointerSample};

/// Gap between synthesized samples
pub const SYNTH_INTERVAL_MS: u64 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceKind {
    Down,
    Move,
    Up,
    Reset,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TraceEvent {
    pub kind: TraceKind,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub t: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lx: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ly: Option<f64>,
}

impl TraceEvent {
    pub fn to_pointer_event(&self) -> PointerEvent {
        let window = Point::new(self.x, self.y);
        let layout = Point::new(self.lx.unwrap_or(self.x), self.ly.unwrap_or(self.y));
        let sample = PointerSample::new(window, layout, self.t);
        match self.kind {
            TraceKind::Down => PointerEvent::Down(sample),
            TraceKind::Move => PointerEvent::Move(sample),
            TraceKind::Up => PointerEvent::Up(sample),
            TraceKind::Reset => PointerEvent::Reset,
        }
    }
}

pub fn parse_trace(text: &str) -> Result<Vec<PointerEvent>> {
    if text.trim_start().starts_with('[') {
        let events: Vec<TraceEvent> = serde_json::from_str(text).context("invalid trace array")?;
        return Ok(events.iter().map(TraceEvent::to_pointer_event).collect());
    }

    let mut events = Vec::new();
    for (n, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let event: TraceEvent =
            serde_json::from_str(line).with_context(|| format!("line {}: invalid trace event", n + 1))?;
        events.push(event.to_pointer_event());
    }
    Ok(events)
}

pub fn load_trace(path: &Path) -> Result<Vec<PointerEvent>> {
    let text = std::fs::read_to_string(path).with_context(|| format!("Failed to read trace {}", path.display()))?;
    parse_trace(&text)
}

/// Down, moves along the word's key centroids every `step` px, then up.
/// Words with no mappable letters produce no events.
pub fn synthesize_word_trace(layout: &Layout, word: &str, step: f64, start_ms: u64) -> Vec<PointerEvent> {
    let path = interpolate_path(&layout.word_path(&word.to_ascii_lowercase()), step.max(1.0));
    let Some((&first, rest)) = path.split_first() else {
        return vec![];
    };

    let mut t = start_ms;
    let mut events = vec![PointerEvent::Down(PointerSample::new(first, first, t))];
    for &p in rest {
        t += SYNTH_INTERVAL_MS;
        events.push(PointerEvent::Move(PointerSample::new(p, p, t)));
    }
    let last = rest.last().copied().unwrap_or(first);
    events.push(PointerEvent::Up(PointerSample::new(last, last, t + SYNTH_INTERVAL_MS)));
    events
}
