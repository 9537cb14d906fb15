//! Human-readable and JSON rendering of engine output.

use std::fmt::Write;

use swipe_core::{Candidate, EngineOutput, Recognition};

pub fn format_candidates(candidates: &[Candidate], limit: usize) -> String {
    if candidates.is_empty() {
        return "  (no candidates)\n".to_string();
    }
    let mut out = String::new();
    for (i, c) in candidates.iter().take(limit).enumerate() {
        let _ = writeln!(out, "  {:>2}. {:<16} {:>8.3}  freq={}", i + 1, c.word, c.score, c.frequency);
    }
    out
}

pub fn format_recognition(rec: &Recognition, limit: usize) -> String {
    let keys = rec.swipe.key_sequence.join(" ");
    let mut out = format!(
        "swipe #{} [{}] {} pts, {} ms, confidence {:?}\n",
        rec.sequence,
        keys,
        rec.swipe.path.len(),
        rec.swipe.duration_ms,
        rec.confidence
    );
    out.push_str(&format_candidates(&rec.candidates, limit));
    out
}

pub fn format_output(output: &EngineOutput, limit: usize) -> String {
    match output {
        EngineOutput::Tap(tap) if tap.key_id.is_empty() => {
            format!("tap at ({:.1}, {:.1}) outside any key\n", tap.position.x, tap.position.y)
        }
        EngineOutput::Tap(tap) => format!("tap '{}'\n", tap.key_id),
        EngineOutput::Swipe(rec) => format_recognition(rec, limit),
    }
}

/// One JSON line per output, with candidates truncated to `limit`.
pub fn json_line(output: &EngineOutput, limit: usize) -> serde_json::Result<String> {
    match output {
        EngineOutput::Swipe(rec) if rec.candidates.len() > limit => {
            let mut rec = rec.clone();
            rec.candidates.truncate(limit);
            serde_json::to_string(&EngineOutput::Swipe(rec))
        }
        other => serde_json::to_string(other),
    }
}

/// Tally of a replay run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub events: usize,
    pub taps: usize,
    pub swipes: usize,
    pub empty_swipes: usize,
}

impl Summary {
    pub fn record(&mut self, output: &EngineOutput) {
        match output {
            EngineOutput::Tap(_) => self.taps += 1,
            EngineOutput::Swipe(rec) => {
                self.swipes += 1;
                if rec.candidates.is_empty() {
                    self.empty_swipes += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swipe_core::{Point, TapResult};

    fn candidate(word: &str, score: f64) -> Candidate {
        Candidate {
            word: word.to_string(),
            score,
            frequency: 3,
            breakdown: Default::default(),
        }
    }

    #[test]
    fn test_candidates_are_limited() {
        let text = format_candidates(&[candidate("hello", 4.0), candidate("hell", 2.5), candidate("help", 1.0)], 2);
        assert_eq!(text.lines().count(), 2);
        assert!(text.contains("hello"));
        assert!(!text.contains("help"));
        assert!(format_candidates(&[], 5).contains("no candidates"));
    }

    #[test]
    fn test_tap_rendering_and_summary() {
        let on_key = EngineOutput::Tap(TapResult {
            key_id: "a".to_string(),
            position: Point::new(60.0, 81.0),
        });
        let off_key = EngineOutput::Tap(TapResult {
            key_id: String::new(),
            position: Point::new(1.0, 2.0),
        });
        assert_eq!(format_output(&on_key, 5), "tap 'a'\n");
        assert!(format_output(&off_key, 5).contains("outside any key"));

        let mut summary = Summary::default();
        summary.record(&on_key);
        summary.record(&off_key);
        assert_eq!(summary.taps, 2);
        assert_eq!(summary.swipes, 0);

        let json = json_line(&on_key, 5).unwrap();
        assert!(json.contains("\"tap\""));
    }
}
