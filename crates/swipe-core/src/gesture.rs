//! Tap/swipe classification.
//!
//! A [`GestureClassifier`] owns at most one `GestureSession` at a time. Moves
//! during a swipe are smoothed, clamped to the layout, resampled by distance
//! and fed straight into the session's [`SequenceBuilder`], so the key
//! sequence is ready the moment the pointer lifts.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::trace;

use crate::config::{GestureConfig, MapperConfig};
use crate::keyboard::Layout;
use crate::mapper::SequenceBuilder;
use crate::types::{PathPoint, Point, SwipeResult, TapResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GestureState {
    Idle,
    TapPending,
    Swiping,
    Completed,
    Tapped,
}

/// Pointer position in both coordinate spaces plus a monotonic timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PointerSample {
    pub window: Point,
    pub layout: Point,
    pub timestamp_ms: u64,
}

impl PointerSample {
    pub fn new(window: Point, layout: Point, timestamp_ms: u64) -> Self {
        Self {
            window,
            layout,
            timestamp_ms,
        }
    }

    /// Sample whose window and layout positions coincide.
    pub fn at(x: f64, y: f64, timestamp_ms: u64) -> Self {
        let p = Point::new(x, y);
        Self::new(p, p, timestamp_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PointerEvent {
    Down(PointerSample),
    Move(PointerSample),
    Up(PointerSample),
    Reset,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GestureOutcome {
    Tap(TapResult),
    Swipe(SwipeResult),
}

/// State of one pointer-down to pointer-up interaction.
#[derive(Debug, Clone)]
struct GestureSession {
    state: GestureState,
    start: PointerSample,
    path: Vec<PathPoint>,
    smoothed_window: Point,
    smoothed_layout: Point,
    builder: SequenceBuilder,
}

impl GestureSession {
    fn new(start: PointerSample, mapper: MapperConfig) -> Self {
        Self {
            state: GestureState::TapPending,
            start,
            path: Vec::new(),
            smoothed_window: start.window,
            smoothed_layout: start.layout,
            builder: SequenceBuilder::new(mapper),
        }
    }

    fn append(&mut self, layout: &Layout, point: PathPoint) {
        self.builder.push(layout, &point.layout);
        self.path.push(point);
    }
}

pub struct GestureClassifier {
    layout: Arc<Layout>,
    config: GestureConfig,
    mapper: MapperConfig,
    session: Option<GestureSession>,
    pending_down: Option<PointerSample>,
}

impl GestureClassifier {
    pub fn new(layout: Arc<Layout>, config: GestureConfig, mapper: MapperConfig) -> Self {
        Self {
            layout,
            config,
            mapper,
            session: None,
            pending_down: None,
        }
    }

    /// Replaces the layout and drops any gesture in progress.
    pub fn set_layout(&mut self, layout: Arc<Layout>) {
        self.reset();
        self.layout = layout;
    }

    pub fn state(&self) -> GestureState {
        self.session.as_ref().map_or(GestureState::Idle, |s| s.state)
    }

    pub fn is_swiping(&self) -> bool {
        self.state() == GestureState::Swiping
    }

    pub fn current_path(&self) -> &[PathPoint] {
        match &self.session {
            Some(session) => &session.path,
            None => &[],
        }
    }

    pub fn has_pending_down(&self) -> bool {
        self.pending_down.is_some()
    }

    pub fn handle(&mut self, event: PointerEvent) -> Option<GestureOutcome> {
        match event {
            PointerEvent::Down(sample) => {
                self.pointer_down(sample);
                None
            }
            PointerEvent::Move(sample) => self.pointer_move(sample),
            PointerEvent::Up(sample) => self.pointer_up(sample),
            PointerEvent::Reset => {
                self.reset();
                None
            }
        }
    }

    /// Starts a gesture, or buffers the down until the active one ends.
    pub fn pointer_down(&mut self, sample: PointerSample) {
        if self.session.is_some() {
            trace!(t = sample.timestamp_ms, "pointer down buffered");
            self.pending_down = Some(sample);
            return;
        }
        let start = PointerSample {
            layout: self.layout.clamp(sample.layout),
            ..sample
        };
        trace!(x = start.layout.x, y = start.layout.y, t = start.timestamp_ms, "idle -> tap_pending");
        self.session = Some(GestureSession::new(start, self.mapper.clone()));
    }

    pub fn pointer_move(&mut self, sample: PointerSample) -> Option<GestureOutcome> {
        let session = self.session.as_mut()?;

        if session.state == GestureState::TapPending {
            let moved = session.start.window.distance_to(&sample.window);
            let elapsed = sample.timestamp_ms.saturating_sub(session.start.timestamp_ms);
            if moved < self.config.deadzone_px || elapsed <= self.config.time_threshold_ms {
                return None;
            }
            trace!(moved, elapsed, "tap_pending -> swiping");
            session.state = GestureState::Swiping;
            let first = PathPoint {
                window: session.start.window,
                layout: session.start.layout,
                timestamp_ms: session.start.timestamp_ms,
            };
            session.append(&self.layout, first);
        }

        let alpha = self.config.smoothing_alpha;
        let raw_layout = self.layout.clamp(sample.layout);
        session.smoothed_window = ema(alpha, sample.window, session.smoothed_window);
        session.smoothed_layout = ema(alpha, raw_layout, session.smoothed_layout);

        let last = session.path.last().copied()?;
        if session.smoothed_window.distance_to(&last.window) >= self.config.resample_distance_px {
            let point = PathPoint {
                window: session.smoothed_window,
                layout: session.smoothed_layout,
                timestamp_ms: sample.timestamp_ms,
            };
            session.append(&self.layout, point);
            return None;
        }

        let timeout = self.config.stationary_timeout_ms;
        if timeout > 0 && sample.timestamp_ms.saturating_sub(last.timestamp_ms) > timeout {
            trace!(t = sample.timestamp_ms, "stationary timeout");
            return self.pointer_up(sample);
        }
        None
    }

    pub fn pointer_up(&mut self, sample: PointerSample) -> Option<GestureOutcome> {
        let mut session = self.session.take()?;

        let outcome = match session.state {
            GestureState::Swiping => {
                let alpha = self.config.smoothing_alpha;
                let end = PathPoint {
                    window: ema(alpha, sample.window, session.smoothed_window),
                    layout: ema(alpha, self.layout.clamp(sample.layout), session.smoothed_layout),
                    timestamp_ms: sample.timestamp_ms,
                };
                session.append(&self.layout, end);
                session.state = GestureState::Completed;
                let key_sequence = session.builder.finish(&self.layout);
                trace!(points = session.path.len(), keys = key_sequence.len(), "swiping -> completed");
                GestureOutcome::Swipe(SwipeResult {
                    duration_ms: sample.timestamp_ms.saturating_sub(session.start.timestamp_ms),
                    path: session.path,
                    key_sequence,
                })
            }
            _ => {
                session.state = GestureState::Tapped;
                let position = session.start.layout;
                let key_id = self
                    .layout
                    .hit_test(&position)
                    .map(|k| k.id.clone())
                    .unwrap_or_default();
                trace!(key = %key_id, "tap_pending -> tapped");
                GestureOutcome::Tap(TapResult { key_id, position })
            }
        };

        if let Some(down) = self.pending_down.take() {
            self.pointer_down(down);
        }
        Some(outcome)
    }

    /// Cancels the active gesture without emitting a result.
    pub fn reset(&mut self) {
        if self.session.is_some() {
            trace!("reset -> idle");
        }
        self.session = None;
        self.pending_down = None;
    }
}

fn ema(alpha: f64, raw: Point, previous: Point) -> Point {
    Point::new(
        alpha * raw.x + (1.0 - alpha) * previous.x,
        alpha * raw.y + (1.0 - alpha) * previous.y,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> GestureClassifier {
        classifier_with(GestureConfig::default())
    }

    fn classifier_with(config: GestureConfig) -> GestureClassifier {
        GestureClassifier::new(Arc::new(Layout::qwerty()), config, MapperConfig::default())
    }

    fn drag(c: &mut GestureClassifier, from: (f64, f64), to: (f64, f64), steps: u64, t0: u64) -> u64 {
        let mut t = t0;
        for i in 1..=steps {
            let f = i as f64 / steps as f64;
            t += 10;
            c.pointer_move(PointerSample::at(
                from.0 + f * (to.0 - from.0),
                from.1 + f * (to.1 - from.1),
                t,
            ));
        }
        t
    }

    #[test]
    fn test_quick_press_is_tap() {
        let mut c = classifier();
        c.pointer_down(PointerSample::at(60.0, 81.0, 0));
        assert_eq!(c.state(), GestureState::TapPending);
        c.pointer_move(PointerSample::at(62.0, 81.0, 8));
        let out = c.pointer_up(PointerSample::at(62.0, 81.0, 15)).unwrap();
        match out {
            GestureOutcome::Tap(tap) => assert_eq!(tap.key_id, "a"),
            other => panic!("expected tap, got {other:?}"),
        }
        assert_eq!(c.state(), GestureState::Idle);
    }

    #[test]
    fn test_large_move_before_threshold_stays_pending() {
        let mut c = classifier();
        c.pointer_down(PointerSample::at(60.0, 81.0, 0));
        c.pointer_move(PointerSample::at(120.0, 81.0, 20));
        assert_eq!(c.state(), GestureState::TapPending);
        assert!(matches!(
            c.pointer_up(PointerSample::at(120.0, 81.0, 30)),
            Some(GestureOutcome::Tap(_))
        ));
    }

    #[test]
    fn test_slow_small_move_stays_pending() {
        let mut c = classifier();
        c.pointer_down(PointerSample::at(60.0, 81.0, 0));
        c.pointer_move(PointerSample::at(65.0, 81.0, 200));
        assert_eq!(c.state(), GestureState::TapPending);
    }

    #[test]
    fn test_swipe_starts_when_both_thresholds_exceeded() {
        let mut c = classifier();
        c.pointer_down(PointerSample::at(60.0, 81.0, 0));
        c.pointer_move(PointerSample::at(75.0, 81.0, 40));
        assert!(c.is_swiping());
        assert_eq!(c.current_path()[0].window, Point::new(60.0, 81.0));
    }

    #[test]
    fn test_swipe_emits_path_and_sequence() {
        let mut c = classifier();
        c.pointer_down(PointerSample::at(390.0, 81.0, 0));
        let t = drag(&mut c, (390.0, 81.0), (492.0, 25.0), 12, 30);
        let out = c.pointer_up(PointerSample::at(492.0, 25.0, t + 10)).unwrap();
        let GestureOutcome::Swipe(swipe) = out else {
            panic!("expected swipe");
        };
        assert_eq!(swipe.key_sequence.first().map(String::as_str), Some("h"));
        assert_eq!(swipe.key_sequence.last().map(String::as_str), Some("i"));
        assert_eq!(swipe.duration_ms, t + 10);
        assert!(swipe.path.len() >= 3);
        let end = swipe.path.last().unwrap().layout;
        assert!(c.layout.key("i").unwrap().rect.contains(&end));
    }

    #[test]
    fn test_release_point_is_smoothed() {
        let mut c = classifier();
        c.pointer_down(PointerSample::at(60.0, 81.0, 0));
        c.pointer_move(PointerSample::at(75.0, 81.0, 40));
        assert_eq!(c.current_path().len(), 1);

        let out = c.pointer_up(PointerSample::at(120.0, 81.0, 60)).unwrap();
        let GestureOutcome::Swipe(swipe) = out else {
            panic!("expected swipe");
        };
        // 0.4 * 120 + 0.6 * (0.4 * 75 + 0.6 * 60)
        let end = swipe.path.last().unwrap();
        assert!((end.layout.x - 87.6).abs() < 1e-9);
        assert!((end.window.x - 87.6).abs() < 1e-9);
        assert_eq!(end.timestamp_ms, 60);
    }

    #[test]
    fn test_session_is_dropped_after_release() {
        let mut c = classifier();
        c.pointer_down(PointerSample::at(60.0, 81.0, 0));
        c.pointer_move(PointerSample::at(90.0, 81.0, 40));
        assert_eq!(c.state(), GestureState::Swiping);
        assert!(!c.current_path().is_empty());

        assert!(c.pointer_up(PointerSample::at(126.0, 81.0, 80)).is_some());
        assert_eq!(c.state(), GestureState::Idle);
        assert!(c.current_path().is_empty());
        assert!(c.pointer_move(PointerSample::at(200.0, 81.0, 90)).is_none());
    }

    #[test]
    fn test_resampling_gates_close_points() {
        let mut c = classifier();
        c.pointer_down(PointerSample::at(100.0, 81.0, 0));
        c.pointer_move(PointerSample::at(115.0, 81.0, 40));
        let after_start = c.current_path().len();
        // tiny jitter never clears the resample distance
        for i in 0..10 {
            c.pointer_move(PointerSample::at(115.0 + (i % 2) as f64, 81.0, 50 + i));
        }
        assert!(c.current_path().len() <= after_start + 1);
        for w in c.current_path().windows(2) {
            assert!(w[0].window.distance_to(&w[1].window) >= 7.0 - 1e-9);
        }
    }

    #[test]
    fn test_layout_coordinates_are_clamped() {
        let mut c = classifier();
        c.pointer_down(PointerSample::at(30.0, 25.0, 0));
        c.pointer_move(PointerSample::at(-80.0, -60.0, 50));
        c.pointer_move(PointerSample::at(-200.0, -200.0, 60));
        assert!(c.is_swiping());
        for p in c.current_path() {
            assert!(p.layout.x >= 0.0 && p.layout.y >= 0.0);
        }
        assert!(c.current_path().iter().any(|p| p.window.x < 0.0));
    }

    #[test]
    fn test_reset_cancels_without_result() {
        let mut c = classifier();
        c.pointer_down(PointerSample::at(60.0, 81.0, 0));
        c.pointer_move(PointerSample::at(90.0, 81.0, 50));
        c.reset();
        assert_eq!(c.state(), GestureState::Idle);
        assert!(c.current_path().is_empty());
        assert!(c.pointer_up(PointerSample::at(90.0, 81.0, 60)).is_none());
    }

    #[test]
    fn test_idle_events_are_ignored() {
        let mut c = classifier();
        assert!(c.pointer_move(PointerSample::at(10.0, 10.0, 1)).is_none());
        assert!(c.pointer_up(PointerSample::at(10.0, 10.0, 2)).is_none());
        assert_eq!(c.state(), GestureState::Idle);
    }

    #[test]
    fn test_down_during_gesture_is_buffered() {
        let mut c = classifier();
        c.pointer_down(PointerSample::at(60.0, 81.0, 0));
        c.pointer_down(PointerSample::at(492.0, 25.0, 5));
        assert!(c.has_pending_down());
        let out = c.pointer_up(PointerSample::at(60.0, 81.0, 10)).unwrap();
        assert!(matches!(out, GestureOutcome::Tap(ref t) if t.key_id == "a"));

        assert_eq!(c.state(), GestureState::TapPending);
        let out = c.pointer_up(PointerSample::at(492.0, 25.0, 20)).unwrap();
        assert!(matches!(out, GestureOutcome::Tap(ref t) if t.key_id == "i"));
    }

    #[test]
    fn test_reset_discards_buffered_down() {
        let mut c = classifier();
        c.pointer_down(PointerSample::at(60.0, 81.0, 0));
        c.pointer_down(PointerSample::at(492.0, 25.0, 5));
        c.reset();
        assert!(!c.has_pending_down());
        assert_eq!(c.state(), GestureState::Idle);
    }

    #[test]
    fn test_stationary_timeout_completes_swipe() {
        let mut c = classifier_with(GestureConfig {
            stationary_timeout_ms: 100,
            ..GestureConfig::default()
        });
        c.pointer_down(PointerSample::at(60.0, 81.0, 0));
        c.pointer_move(PointerSample::at(90.0, 81.0, 40));
        assert!(c.pointer_move(PointerSample::at(90.0, 81.0, 100)).is_none());
        let out = c.pointer_move(PointerSample::at(90.0, 81.0, 250));
        assert!(matches!(out, Some(GestureOutcome::Swipe(_))));
        assert_eq!(c.state(), GestureState::Idle);
    }

    #[test]
    fn test_tap_on_empty_layout_has_empty_key() {
        let mut c = GestureClassifier::new(
            Arc::new(Layout::empty()),
            GestureConfig::default(),
            MapperConfig::default(),
        );
        c.pointer_down(PointerSample::at(5.0, 5.0, 0));
        let out = c.pointer_up(PointerSample::at(5.0, 5.0, 10)).unwrap();
        assert!(matches!(out, GestureOutcome::Tap(ref t) if t.key_id.is_empty()));
    }

    #[test]
    fn test_pointer_event_serde() {
        let json = r#"{"kind":"down","window":{"x":1.0,"y":2.0},"layout":{"x":1.0,"y":2.0},"timestamp_ms":7}"#;
        let event: PointerEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event, PointerEvent::Down(PointerSample::at(1.0, 2.0, 7)));
        let reset: PointerEvent = serde_json::from_str(r#"{"kind":"reset"}"#).unwrap();
        assert_eq!(reset, PointerEvent::Reset);
    }
}
