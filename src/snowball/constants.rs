// Safety parameters

/// Default number of peers sampled per poll
pub const K: usize = 20;
/// Default minimum votes for a choice to be considered at all
pub const ALPHA_PREFERENCE: usize = 15;
/// Default minimum votes for a choice to accrue confidence
pub const ALPHA_CONFIDENCE: usize = 15;
/// Default consecutive successful polls required to finalize a unary counter
pub const BETA1: usize = 20;
/// Default consecutive successful polls required to finalize a binary counter
pub const BETA2: usize = 20;
