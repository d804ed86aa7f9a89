use serde::{Deserialize, Serialize};

use crate::{Error, Result};

use super::constants::*;

/// Threshold configuration shared by every counter in a snowball instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameters {
    /// Number of peers sampled per poll.
    pub k: usize,
    /// Minimum votes for a choice to be considered at all.
    pub alpha_preference: usize,
    /// Minimum votes for a choice to accrue confidence.
    pub alpha_confidence: usize,
    /// Consecutive successful polls required to finalize a unary counter.
    pub beta1: usize,
    /// Consecutive successful polls required to finalize a binary counter.
    pub beta2: usize,
}

impl Default for Parameters {
    fn default() -> Self {
        Parameters {
            k: K,
            alpha_preference: ALPHA_PREFERENCE,
            alpha_confidence: ALPHA_CONFIDENCE,
            beta1: BETA1,
            beta2: BETA2,
        }
    }
}

impl Parameters {
    /// Checks the mutual consistency of the thresholds.
    ///
    /// The alphas must be majorities of `k` with `alpha_preference <=
    /// alpha_confidence`, and the unary finalization threshold must not
    /// exceed the binary one: the tree relies on a parent counter never
    /// finalizing before the counters beneath it.
    pub fn verify(&self) -> Result<()> {
        if self.k < 1 {
            return Err(Error::InvalidK);
        }
        if self.alpha_preference <= self.k / 2 || self.alpha_preference > self.k {
            return Err(Error::InvalidAlphaPreference);
        }
        if self.alpha_confidence < self.alpha_preference || self.alpha_confidence > self.k {
            return Err(Error::InvalidAlphaConfidence);
        }
        if self.beta1 < 1 || self.beta1 > self.beta2 {
            return Err(Error::InvalidBeta);
        }
        Ok(())
    }
}
