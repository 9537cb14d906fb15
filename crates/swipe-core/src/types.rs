use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_squared_to(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    pub fn distance_to(&self, other: &Point) -> f64 {
        self.distance_squared_to(other).sqrt()
    }
}

/// Axis-aligned rectangle in layout space. Edges are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    pub fn contains(&self, p: &Point) -> bool {
        p.x >= self.x && p.x <= self.x + self.w && p.y >= self.y && p.y <= self.y + self.h
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.w / 2.0, self.y + self.h / 2.0)
    }

    pub fn union(&self, other: &Rect) -> Rect {
        let x0 = self.x.min(other.x);
        let y0 = self.y.min(other.y);
        let x1 = (self.x + self.w).max(other.x + other.w);
        let y1 = (self.y + self.h).max(other.y + other.h);
        Rect::new(x0, y0, x1 - x0, y1 - y0)
    }

    /// Moves `p` onto the nearest edge when it lies outside.
    pub fn clamp(&self, p: Point) -> Point {
        Point::new(
            p.x.clamp(self.x, self.x + self.w),
            p.y.clamp(self.y, self.y + self.h),
        )
    }
}

/// One gesture sample, recorded in both coordinate spaces.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PathPoint {
    pub window: Point,
    pub layout: Point,
    pub timestamp_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TapResult {
    /// Empty when the layout has no keys.
    pub key_id: String,
    pub position: Point,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwipeResult {
    pub path: Vec<PathPoint>,
    pub key_sequence: Vec<String>,
    pub duration_ms: u64,
}

impl SwipeResult {
    pub fn layout_points(&self) -> Vec<Point> {
        self.path.iter().map(|p| p.layout).collect()
    }
}

/// Per-component contributions behind a candidate's score.
///
/// The key-sequence scorer fills the edit/bigram/frequency/spatial fields, the
/// template recognizer fills the shape/location/frequency/bonus fields.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub edit_distance: usize,
    pub bigram_overlap: usize,
    pub frequency: f64,
    pub spatial: f64,
    pub shape_distance: f64,
    pub location_distance: f64,
    pub bonus: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub word: String,
    pub score: f64,
    pub frequency: u64,
    pub breakdown: ScoreBreakdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

/// Score gaps and floors for grading a ranked list. Each recognizer scores on
/// its own scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceScale {
    pub high_gap: f64,
    pub high_floor: f64,
    pub medium_gap: f64,
    pub medium_floor: f64,
}

impl ConfidenceScale {
    /// Key-sequence scores: tens of points between unrelated words.
    pub const KEY_SEQUENCE: Self = Self {
        high_gap: 5.0,
        high_floor: 0.0,
        medium_gap: 2.0,
        medium_floor: -3.0,
    };

    /// Template scores sit in roughly 0..1.7; a perfect trace scores above 1.
    pub const TEMPLATE: Self = Self {
        high_gap: 0.25,
        high_floor: 0.8,
        medium_gap: 0.08,
        medium_floor: 0.5,
    };
}

impl Confidence {
    /// Grades a key-sequence ranking.
    pub fn of(candidates: &[Candidate]) -> Self {
        Self::graded(candidates, &ConfidenceScale::KEY_SEQUENCE)
    }

    /// Grades a ranked list by the lead of the top candidate over the runner-up.
    pub fn graded(candidates: &[Candidate], scale: &ConfidenceScale) -> Self {
        let Some(top) = candidates.first() else {
            return Confidence::Low;
        };
        let gap = match candidates.get(1) {
            Some(second) => top.score - second.score,
            None => top.score.abs(),
        };

        if gap > scale.high_gap && top.score > scale.high_floor {
            Confidence::High
        } else if gap > scale.medium_gap && top.score > scale.medium_floor {
            Confidence::Medium
        } else {
            Confidence::Low
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cand(word: &str, score: f64) -> Candidate {
        Candidate {
            word: word.to_string(),
            score,
            frequency: 0,
            breakdown: ScoreBreakdown::default(),
        }
    }

    #[test]
    fn rect_contains_is_inclusive() {
        let r = Rect::new(0.0, 0.0, 10.0, 5.0);
        assert!(r.contains(&Point::new(0.0, 0.0)));
        assert!(r.contains(&Point::new(10.0, 5.0)));
        assert!(!r.contains(&Point::new(10.1, 2.0)));
    }

    #[test]
    fn clamp_moves_outside_points_to_edge() {
        let r = Rect::new(0.0, 0.0, 100.0, 50.0);
        assert_eq!(r.clamp(Point::new(-20.0, 25.0)), Point::new(0.0, 25.0));
        assert_eq!(r.clamp(Point::new(130.0, 80.0)), Point::new(100.0, 50.0));
        assert_eq!(r.clamp(Point::new(40.0, 10.0)), Point::new(40.0, 10.0));
    }

    #[test]
    fn union_covers_both() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(20.0, 5.0, 10.0, 10.0);
        assert_eq!(a.union(&b), Rect::new(0.0, 0.0, 30.0, 15.0));
    }

    #[test]
    fn confidence_grades() {
        assert_eq!(Confidence::of(&[]), Confidence::Low);
        assert_eq!(Confidence::of(&[cand("the", 10.0)]), Confidence::High);
        assert_eq!(
            Confidence::of(&[cand("the", 1.0), cand("tie", -2.0)]),
            Confidence::Medium
        );
        assert_eq!(
            Confidence::of(&[cand("the", 1.0), cand("tie", 0.5)]),
            Confidence::Low
        );
    }

    #[test]
    fn template_scale_grades_small_scores() {
        let scale = ConfidenceScale::TEMPLATE;
        let ranked = [cand("world", 1.6), cand("would", 1.1)];
        assert_eq!(Confidence::of(&ranked), Confidence::Low);
        assert_eq!(Confidence::graded(&ranked, &scale), Confidence::High);
        assert_eq!(
            Confidence::graded(&[cand("world", 0.9), cand("would", 0.8)], &scale),
            Confidence::Medium
        );
        assert_eq!(
            Confidence::graded(&[cand("world", 0.9), cand("would", 0.88)], &scale),
            Confidence::Low
        );
    }
}
