use std::sync::Arc;

use crate::config::{EngineConfig, ScoringConfig, Strategy};
use crate::dictionary::Dictionary;
use crate::keyboard::Layout;
use crate::mapper::sequence_to_string;
use crate::scoring;
use crate::template::TemplateIndex;
use crate::types::{Candidate, Confidence, ConfidenceScale, Point};

/// What a recognizer sees of one completed swipe.
#[derive(Debug, Clone, Copy)]
pub struct RecognitionInput<'a> {
    /// Layout-space samples
    pub path: &'a [Point],
    /// Key ids from the mapper
    pub key_sequence: &'a [String],
}

pub trait Recognizer: Send + Sync {
    fn strategy(&self) -> Strategy;

    fn recognize(&self, input: &RecognitionInput<'_>) -> Vec<Candidate>;

    /// Grades a ranking produced by this recognizer.
    fn confidence(&self, candidates: &[Candidate]) -> Confidence {
        Confidence::of(candidates)
    }
}

/// Shortlist by first/last letter, then edit/bigram/frequency/spatial scoring.
pub struct KeySequenceRecognizer {
    layout: Arc<Layout>,
    dictionary: Arc<Dictionary>,
    config: ScoringConfig,
}

impl KeySequenceRecognizer {
    pub fn new(layout: Arc<Layout>, dictionary: Arc<Dictionary>, config: ScoringConfig) -> Self {
        Self {
            layout,
            dictionary,
            config,
        }
    }

    pub fn candidates_for(&self, sequence: &str) -> Vec<Candidate> {
        scoring::generate_candidates(&self.layout, &self.dictionary, sequence, &self.config)
    }
}

impl Recognizer for KeySequenceRecognizer {
    fn strategy(&self) -> Strategy {
        Strategy::KeySequence
    }

    fn recognize(&self, input: &RecognitionInput<'_>) -> Vec<Candidate> {
        self.candidates_for(&sequence_to_string(input.key_sequence))
    }
}

pub struct TemplateRecognizer {
    layout: Arc<Layout>,
    index: TemplateIndex,
}

impl TemplateRecognizer {
    pub fn new(layout: Arc<Layout>, dictionary: &Dictionary, config: &EngineConfig) -> Self {
        let index = TemplateIndex::build(&layout, dictionary, &config.template);
        Self { layout, index }
    }

    pub fn index(&self) -> &TemplateIndex {
        &self.index
    }
}

impl Recognizer for TemplateRecognizer {
    fn strategy(&self) -> Strategy {
        Strategy::Template
    }

    fn recognize(&self, input: &RecognitionInput<'_>) -> Vec<Candidate> {
        self.index.recognize(&self.layout, input.path)
    }

    fn confidence(&self, candidates: &[Candidate]) -> Confidence {
        Confidence::graded(candidates, &ConfidenceScale::TEMPLATE)
    }
}

pub fn build_recognizer(
    config: &EngineConfig,
    layout: Arc<Layout>,
    dictionary: Arc<Dictionary>,
) -> Box<dyn Recognizer> {
    match config.strategy {
        Strategy::KeySequence => Box::new(KeySequenceRecognizer::new(layout, dictionary, config.scoring.clone())),
        Strategy::Template => Box::new(TemplateRecognizer::new(layout, &dictionary, config)),
    }
}
