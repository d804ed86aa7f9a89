use std::fmt;

use super::Parameters;

/// A binary snowball counter deciding a single bit: two choices with
/// per-side confidence and a sticky preference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinarySnowball {
    params: Parameters,
    preference: usize,
    confidence: [usize; 2],
    finalized: bool,
}

impl BinarySnowball {
    pub fn new(params: Parameters, preference: usize) -> Self {
        BinarySnowball { params, preference, confidence: [0, 0], finalized: false }
    }

    pub(crate) fn with_state(
        params: Parameters,
        preference: usize,
        confidence: [usize; 2],
        finalized: bool,
    ) -> Self {
        BinarySnowball { params, preference, confidence, finalized }
    }

    /// Records a poll of `num_votes` votes for side `choice`, where
    /// `num_votes` is at least `alpha_preference`.
    ///
    /// From `alpha_confidence` votes up the winning side accrues confidence
    /// (clearing the other side's on a switch) and finalizes the counter at
    /// `beta2`. Below `alpha_confidence` the preference still moves to the
    /// winning side and the losing side's run is broken, but the winning
    /// side keeps its accrued confidence without extending it.
    pub fn record_poll(&mut self, num_votes: usize, choice: usize) {
        if self.finalized {
            return;
        }
        if num_votes >= self.params.alpha_confidence {
            if choice != self.preference {
                self.confidence[self.preference] = 0;
                self.preference = choice;
            }
            self.confidence[choice] += 1;
            self.finalized = self.confidence[choice] >= self.params.beta2;
        } else {
            self.confidence[1 - choice] = 0;
            self.preference = choice;
        }
    }

    /// Resets both confidence runs after a failed poll. The preference is
    /// preserved.
    pub fn record_unsuccessful_poll(&mut self) {
        if !self.finalized {
            self.confidence = [0, 0];
        }
    }

    /// The currently preferred side.
    pub fn preference(&self) -> usize {
        self.preference
    }

    pub fn finalized(&self) -> bool {
        self.finalized
    }
}

impl fmt::Display for BinarySnowball {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "SB(Preference = {}, Confidence = [{}, {}], Finalized = {})",
            self.preference, self.confidence[0], self.confidence[1], self.finalized
        )
    }
}
