//! # Snowball
//!
//! A decision tree for repeated-sampling consensus over a growing set of
//! competing choices, from the `Snow*` family of consensus algorithms.
//!
//! ## Bag
//!
//! Poll results arrive as a [Bag](bag::Bag): a multiset with one entry per
//! sampled peer.
//!
//! ## Snowball
//!
//! The [snowball] module holds the consensus core: unary and binary snowball
//! counters arranged as a modified patricia tree over 256-bit choice
//! identifiers. The tree ingests polls, shifts its preference towards the
//! sampled majority and eventually finalizes on a single choice.

pub mod bag;
pub mod snowball;
pub mod zfx_id;

#[cfg(test)]
mod proptests;

#[derive(Debug)]
pub enum Error {
    /// Error caused by converting from a `String` to an `Id`
    TryFromStringError,

    // parameter errors
    InvalidK,
    InvalidAlphaPreference,
    InvalidAlphaConfidence,
    InvalidBeta,
}

impl std::error::Error for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
