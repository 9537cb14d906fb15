//! Deterministic swipe-keyboard recognition.
//!
//! Pointer events go through the [`gesture::GestureClassifier`], which decides
//! between a tap and a swipe and maps swipe samples to keys as they arrive.
//! Completed swipes are ranked against the dictionary by the configured
//! [`recognizer::Recognizer`]. [`SwipeEngine`] wires these together.

pub mod config;
pub mod dictionary;
pub mod error;
pub mod geometry;
pub mod gesture;
pub mod keyboard;
pub mod loader;
pub mod mapper;
pub mod recognizer;
pub mod scoring;
pub mod sequence;
pub mod template;
pub mod types;

pub use config::{EngineConfig, Strategy};
pub use dictionary::{DictWord, Dictionary};
pub use error::{Error, Result};
pub use gesture::{GestureOutcome, GestureState, PointerEvent, PointerSample};
pub use keyboard::{Key, Layout};
pub use loader::{DataSource, FsLoader};
pub use types::{
    Candidate, Confidence, ConfidenceScale, PathPoint, Point, ScoreBreakdown, SwipeResult, TapResult,
};

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

use gesture::GestureClassifier;
use recognizer::{build_recognizer, RecognitionInput, Recognizer};
use sequence::RequestSequencer;

/// Ranked words for one swipe, stamped with its request number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recognition {
    pub sequence: u64,
    pub swipe: SwipeResult,
    pub candidates: Vec<Candidate>,
    pub confidence: Confidence,
}

impl Recognition {
    pub fn top(&self) -> Option<&Candidate> {
        self.candidates.first()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineOutput {
    Tap(TapResult),
    Swipe(Recognition),
}

pub struct SwipeEngine {
    config: EngineConfig,
    layout: Arc<Layout>,
    dictionary: Arc<Dictionary>,
    classifier: GestureClassifier,
    recognizer: Box<dyn Recognizer>,
    sequencer: RequestSequencer,
}

impl SwipeEngine {
    /// Built-in QWERTY, no words, default configuration.
    pub fn new() -> Self {
        Self::build(EngineConfig::default(), Arc::new(Layout::qwerty()), Arc::new(Dictionary::new()))
    }

    pub fn with_config(config: EngineConfig) -> Result<Self> {
        Self::from_parts(config, Arc::new(Layout::qwerty()), Arc::new(Dictionary::new()))
    }

    pub fn from_parts(config: EngineConfig, layout: Arc<Layout>, dictionary: Arc<Dictionary>) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config, layout, dictionary))
    }

    /// Loads layout and dictionary through `source`, degrading to empty data.
    pub fn from_source(config: EngineConfig, source: &dyn DataSource, layout_name: &str) -> Result<Self> {
        let layout = source.load_layout_or_empty(layout_name);
        let dictionary = source.load_dictionary_or_empty();
        Self::from_parts(config, Arc::new(layout), Arc::new(dictionary))
    }

    fn build(config: EngineConfig, layout: Arc<Layout>, dictionary: Arc<Dictionary>) -> Self {
        let classifier = GestureClassifier::new(layout.clone(), config.gesture.clone(), config.mapper.clone());
        let recognizer = build_recognizer(&config, layout.clone(), dictionary.clone());
        Self {
            config,
            layout,
            dictionary,
            classifier,
            recognizer,
            sequencer: RequestSequencer::new(),
        }
    }

    fn rebuild_recognizer(&mut self) {
        self.recognizer = build_recognizer(&self.config, self.layout.clone(), self.dictionary.clone());
    }

    /// Replaces the dictionary with a combined `word<TAB>count` list.
    pub fn load_dictionary(&mut self, freq_text: &str) {
        self.set_dictionary(Arc::new(Dictionary::from_sources(freq_text, None)));
    }

    pub fn set_dictionary(&mut self, dictionary: Arc<Dictionary>) {
        self.dictionary = dictionary;
        self.rebuild_recognizer();
    }

    /// Replaces the layout, cancelling any gesture in progress.
    pub fn set_layout(&mut self, layout: Arc<Layout>) {
        self.layout = layout.clone();
        self.classifier.set_layout(layout);
        self.sequencer.invalidate();
        self.rebuild_recognizer();
    }

    pub fn set_strategy(&mut self, strategy: Strategy) {
        if self.config.strategy != strategy {
            self.config.strategy = strategy;
            self.rebuild_recognizer();
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn strategy(&self) -> Strategy {
        self.recognizer.strategy()
    }

    pub fn layout(&self) -> &Arc<Layout> {
        &self.layout
    }

    pub fn dictionary(&self) -> &Arc<Dictionary> {
        &self.dictionary
    }

    pub fn word_count(&self) -> usize {
        self.dictionary.len()
    }

    pub fn key_count(&self) -> usize {
        self.layout.len()
    }

    pub fn gesture_state(&self) -> GestureState {
        self.classifier.state()
    }

    pub fn handle(&mut self, event: PointerEvent) -> Option<EngineOutput> {
        let outcome = match event {
            PointerEvent::Reset => {
                self.reset();
                return None;
            }
            other => self.classifier.handle(other)?,
        };
        Some(self.finish(outcome))
    }

    pub fn pointer_down(&mut self, sample: PointerSample) {
        self.classifier.pointer_down(sample);
    }

    pub fn pointer_move(&mut self, sample: PointerSample) -> Option<EngineOutput> {
        let outcome = self.classifier.pointer_move(sample)?;
        Some(self.finish(outcome))
    }

    pub fn pointer_up(&mut self, sample: PointerSample) -> Option<EngineOutput> {
        let outcome = self.classifier.pointer_up(sample)?;
        Some(self.finish(outcome))
    }

    /// Cancels the gesture in progress and makes outstanding results stale.
    pub fn reset(&mut self) {
        self.classifier.reset();
        self.sequencer.invalidate();
    }

    fn finish(&mut self, outcome: GestureOutcome) -> EngineOutput {
        match outcome {
            GestureOutcome::Tap(tap) => EngineOutput::Tap(tap),
            GestureOutcome::Swipe(swipe) => EngineOutput::Swipe(self.recognize_swipe(swipe)),
        }
    }

    pub fn map_path_to_sequence(&self, path: &[Point]) -> Vec<String> {
        mapper::map_path_to_sequence(&self.layout, path, &self.config.mapper)
    }

    /// Key-sequence scoring of a joined sequence such as `"hlo"`, regardless of
    /// the configured strategy.
    pub fn generate_candidates(&self, keys: &str) -> Vec<Candidate> {
        scoring::generate_candidates(&self.layout, &self.dictionary, keys, &self.config.scoring)
    }

    /// Recognizes a layout-space path that did not come through the classifier.
    pub fn recognize_path(&mut self, path: &[Point]) -> Recognition {
        let swipe = SwipeResult {
            path: path
                .iter()
                .map(|&p| PathPoint {
                    window: p,
                    layout: p,
                    timestamp_ms: 0,
                })
                .collect(),
            key_sequence: self.map_path_to_sequence(path),
            duration_ms: 0,
        };
        self.recognize_swipe(swipe)
    }

    /// Recognizes the ideal trace of `word`: its key centroids joined by
    /// straight segments sampled at the resample distance.
    pub fn recognize_word(&mut self, word: &str) -> Recognition {
        let step = self.config.gesture.resample_distance_px.max(1.0);
        let path = geometry::interpolate_path(&self.layout.word_path(word), step);
        self.recognize_path(&path)
    }

    pub fn recognize_swipe(&mut self, swipe: SwipeResult) -> Recognition {
        let start = Instant::now();
        let sequence = self.sequencer.issue();
        let path = swipe.layout_points();
        let candidates = self.recognizer.recognize(&RecognitionInput {
            path: &path,
            key_sequence: &swipe.key_sequence,
        });
        let confidence = self.recognizer.confidence(&candidates);

        debug!(
            sequence,
            points = path.len(),
            keys = swipe.key_sequence.len(),
            candidates = candidates.len(),
            top = candidates.first().map(|c| c.word.as_str()).unwrap_or(""),
            elapsed_us = start.elapsed().as_micros() as u64,
            "recognized swipe"
        );

        Recognition {
            sequence,
            swipe,
            candidates,
            confidence,
        }
    }

    /// Whether `sequence` belongs to the most recent recognition.
    pub fn is_current(&self, sequence: u64) -> bool {
        self.sequencer.is_current(sequence)
    }
}

impl Default for SwipeEngine {
    fn default() -> Self {
        Self::new()
    }
}
