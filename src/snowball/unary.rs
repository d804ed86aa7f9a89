use std::fmt;

use super::{BinarySnowball, Parameters};

/// A unary snowball counter: a single choice accruing confidence over
/// consecutive successful polls.
///
/// The caller only ever reports polls that reached the preference threshold;
/// anything below it arrives as [record_unsuccessful_poll](Self::record_unsuccessful_poll).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnarySnowball {
    params: Parameters,
    confidence: usize,
    finalized: bool,
}

impl UnarySnowball {
    pub fn new(params: Parameters) -> Self {
        UnarySnowball { params, confidence: 0, finalized: false }
    }

    /// Records a poll of `num_votes` votes for this choice, where `num_votes`
    /// is at least `alpha_preference`. Confidence only accrues from
    /// `alpha_confidence` votes up and finalizes the counter at `beta1`.
    pub fn record_poll(&mut self, num_votes: usize) {
        if self.finalized {
            return;
        }
        if num_votes >= self.params.alpha_confidence {
            self.confidence += 1;
            self.finalized = self.confidence >= self.params.beta1;
        } else {
            self.confidence = 0;
        }
    }

    /// Resets the running confidence after a failed poll.
    pub fn record_unsuccessful_poll(&mut self) {
        if !self.finalized {
            self.confidence = 0;
        }
    }

    pub fn finalized(&self) -> bool {
        self.finalized
    }

    /// Converts this instance into a binary one deciding `bit`, inheriting
    /// the accrued confidence on that side.
    pub fn extend(&self, bit: usize) -> BinarySnowball {
        let mut confidence = [0, 0];
        confidence[bit] = self.confidence;
        BinarySnowball::with_state(self.params, bit, confidence, self.finalized)
    }
}

impl fmt::Display for UnarySnowball {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "SB(Confidence = {}, Finalized = {})", self.confidence, self.finalized)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn params() -> Parameters {
        Parameters { k: 10, alpha_preference: 6, alpha_confidence: 8, beta1: 2, beta2: 3 }
    }

    #[test]
    fn test_finalizes_after_beta_polls() {
        let mut sb = UnarySnowball::new(params());
        assert!(!sb.finalized());

        sb.record_poll(8);
        assert!(!sb.finalized());
        assert_eq!(sb.confidence, 1);

        sb.record_poll(10);
        assert!(sb.finalized());
    }

    #[test]
    fn test_sub_confidence_poll_resets() {
        let mut sb = UnarySnowball::new(params());
        sb.record_poll(8);
        assert_eq!(sb.confidence, 1);

        // Enough votes to stay preferred, not enough to extend the run
        sb.record_poll(6);
        assert_eq!(sb.confidence, 0);
        assert!(!sb.finalized());

        sb.record_poll(8);
        sb.record_poll(8);
        assert!(sb.finalized());
    }

    #[test]
    fn test_unsuccessful_poll_resets() {
        let mut sb = UnarySnowball::new(params());
        sb.record_poll(8);
        sb.record_unsuccessful_poll();
        assert_eq!(sb.confidence, 0);

        sb.record_poll(8);
        assert!(!sb.finalized());
        sb.record_poll(8);
        assert!(sb.finalized());

        // Finalization is absorbing
        sb.record_unsuccessful_poll();
        assert!(sb.finalized());
    }

    #[test]
    fn test_extend_inherits_confidence() {
        let mut sb = UnarySnowball::new(params());
        sb.record_poll(8);

        let bin = sb.extend(1);
        assert_eq!(bin.preference(), 1);
        assert!(!bin.finalized());
        assert_eq!(
            format!("{}", bin),
            "SB(Preference = 1, Confidence = [0, 1], Finalized = false)"
        );

        let bin = sb.extend(0);
        assert_eq!(bin.preference(), 0);
        assert_eq!(
            format!("{}", bin),
            "SB(Preference = 0, Confidence = [1, 0], Finalized = false)"
        );
    }

    #[test]
    fn test_clone_is_independent() {
        let mut sb = UnarySnowball::new(params());
        sb.record_poll(8);

        let mut copy = sb.clone();
        copy.record_poll(8);
        assert!(copy.finalized());
        assert!(!sb.finalized());
        assert_eq!(sb.confidence, 1);
    }
}
