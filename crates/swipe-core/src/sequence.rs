//! Request sequencing for recognition results that cross an async boundary.
//!
//! The producer stamps each request with the next number; the consumer keeps
//! only the response whose number matches the latest request it issued.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sequenced<T> {
    pub sequence: u64,
    pub value: T,
}

/// Issues monotonically increasing request numbers starting at 1.
#[derive(Debug, Clone, Default)]
pub struct RequestSequencer {
    last: u64,
}

impl RequestSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&mut self) -> u64 {
        self.last += 1;
        self.last
    }

    pub fn latest(&self) -> u64 {
        self.last
    }

    /// Makes every number issued so far stale.
    pub fn invalidate(&mut self) {
        self.last += 1;
    }

    pub fn is_current(&self, sequence: u64) -> bool {
        sequence != 0 && sequence == self.last
    }

    pub fn stamp<T>(&mut self, value: T) -> Sequenced<T> {
        Sequenced {
            sequence: self.issue(),
            value,
        }
    }
}

/// Consumer-side filter that drops responses to superseded requests.
#[derive(Debug, Clone, Default)]
pub struct ResponseGate {
    expected: u64,
}

impl ResponseGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a newly issued request number.
    pub fn expect(&mut self, sequence: u64) {
        self.expected = self.expected.max(sequence);
    }

    pub fn expected(&self) -> u64 {
        self.expected
    }

    pub fn accept<T>(&self, response: Sequenced<T>) -> Option<T> {
        (response.sequence == self.expected).then_some(response.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numbers_increase_from_one() {
        let mut seq = RequestSequencer::new();
        assert_eq!(seq.latest(), 0);
        assert!(!seq.is_current(0));
        assert_eq!(seq.issue(), 1);
        assert_eq!(seq.issue(), 2);
        assert!(seq.is_current(2));
        assert!(!seq.is_current(1));
    }

    #[test]
    fn test_invalidate_makes_latest_stale() {
        let mut seq = RequestSequencer::new();
        let n = seq.issue();
        seq.invalidate();
        assert!(!seq.is_current(n));
        assert_eq!(seq.issue(), n + 2);
    }

    #[test]
    fn test_gate_discards_stale_responses() {
        let mut producer = RequestSequencer::new();
        let mut gate = ResponseGate::new();

        let first = producer.stamp("first");
        gate.expect(first.sequence);
        let second = producer.stamp("second");
        gate.expect(second.sequence);

        assert_eq!(gate.accept(first), None);
        assert_eq!(gate.accept(second), Some("second"));
    }

    #[test]
    fn test_gate_ignores_older_expectations() {
        let mut gate = ResponseGate::new();
        gate.expect(5);
        gate.expect(3);
        assert_eq!(gate.expected(), 5);
        assert_eq!(
            gate.accept(Sequenced {
                sequence: 5,
                value: 1
            }),
            Some(1)
        );
    }
}
