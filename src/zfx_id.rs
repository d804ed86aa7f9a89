//! Generic hash-based IDs with bit-level access
//!
//! See the documentation of [Id] for details.

use std::fmt;
use std::str::FromStr;

use base58check::{FromBase58Check, ToBase58Check};
use blake2::digest::{Update, VariableOutput};
use blake2::Blake2bVar;
use rand::{self, Rng};
use serde::{Deserialize, Serialize};

/// The number of addressable bits in an [Id].
pub const NUM_BITS: usize = 256;

const BITS_PER_BYTE: usize = 8;

/// Generic hash-based ID identifying a consensus choice
///
/// The `Id` wraps a 32-byte hash, used as identifier for the competing choices a
/// [Tree](crate::snowball::Tree) decides between. Consensus proceeds bit by bit,
/// so the wrapped bytes are also addressable as 256 individual bits: bit 0 is
/// the low bit of the first byte.
///
/// They are displayed using the Base58check format.
#[derive(Hash, Eq, PartialEq, Ord, PartialOrd, Copy, Clone, Serialize, Deserialize, Default)]
pub struct Id([u8; 32]);

impl std::fmt::Debug for Id {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0.to_base58check(0))
    }
}

impl std::fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0.to_base58check(0))
    }
}

impl FromStr for Id {
    type Err = crate::Error;

    /// Converts a base58check encoded string to bytes of an Id
    fn from_str(id_str: &str) -> Result<Self, crate::Error> {
        let (vsn, bytes) =
            id_str.from_base58check().map_err(|_| crate::Error::TryFromStringError)?;
        if vsn != 0 {
            return Err(crate::Error::TryFromStringError);
        }
        let bytes: [u8; 32] =
            bytes.as_slice().try_into().map_err(|_| crate::Error::TryFromStringError)?;
        Ok(Id(bytes))
    }
}

impl Id {
    /// By default a new id is created by hashing an input byte slice
    pub fn new(bytes: &[u8]) -> Id {
        Id(hash(bytes))
    }

    /// Sets the bytes of an Id explicitly (expects a hash; short input is
    /// zero-padded)
    pub fn from_hash(bytes: &[u8]) -> Id {
        let mut id = [0u8; 32];
        let n = bytes.len().min(32);
        id[..n].copy_from_slice(&bytes[..n]);
        Id(id)
    }

    /// Generate a random `Id`
    pub fn generate() -> Id {
        let mut rng = rand::thread_rng();
        let v: [u8; 32] = rng.gen();
        Id(v)
    }

    /// All-zeroes `Id` (for testing)
    pub fn zero() -> Id {
        Id([0u8; 32])
    }

    /// The maximal (all `0xFF`) value (for testing)
    pub fn max() -> Id {
        Id([255u8; 32])
    }

    /// All-ones `Id` (for testing)
    pub fn one() -> Id {
        Id([1u8; 32])
    }

    /// All-twos `Id` (for testing)
    pub fn two() -> Id {
        Id([2u8; 32])
    }

    /// Returns the wrapped byte array containing the hash
    pub fn bytes(&self) -> [u8; 32] {
        self.0
    }

    /// Returns a slice to the contained byte array
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Returns bit `i` of the id, for `i` in `[0, NUM_BITS)`.
    pub fn bit(&self, i: usize) -> u8 {
        (self.0[i / BITS_PER_BYTE] >> (i % BITS_PER_BYTE)) & 1
    }

    /// Returns a copy of the id with bit `i` set (for testing)
    pub fn with_bit(&self, i: usize) -> Id {
        let mut bytes = self.0;
        bytes[i / BITS_PER_BYTE] |= 1 << (i % BITS_PER_BYTE);
        Id(bytes)
    }
}

/// Returns whether bits `[start, stop)` of `a` and `b` are equal.
///
/// An empty or inverted range is vacuously equal; a range reaching past
/// [NUM_BITS] is never equal.
pub fn equal_subset(start: usize, stop: usize, a: &Id, b: &Id) -> bool {
    if start >= stop {
        return true;
    }
    if stop > NUM_BITS {
        return false;
    }
    let first = start / BITS_PER_BYTE;
    let last = (stop - 1) / BITS_PER_BYTE;
    if first == last {
        let mask = byte_mask(start % BITS_PER_BYTE, (stop - 1) % BITS_PER_BYTE + 1);
        return (a.0[first] ^ b.0[first]) & mask == 0;
    }
    let lo = byte_mask(start % BITS_PER_BYTE, BITS_PER_BYTE);
    if (a.0[first] ^ b.0[first]) & lo != 0 {
        return false;
    }
    if a.0[first + 1..last] != b.0[first + 1..last] {
        return false;
    }
    let hi = byte_mask(0, (stop - 1) % BITS_PER_BYTE + 1);
    (a.0[last] ^ b.0[last]) & hi == 0
}

/// Returns the smallest index in `[start, stop)` at which `a` and `b` differ,
/// or `None` when the range is degenerate or the bits all agree.
pub fn first_difference_subset(start: usize, stop: usize, a: &Id, b: &Id) -> Option<usize> {
    if start >= stop || stop > NUM_BITS {
        return None;
    }
    let first = start / BITS_PER_BYTE;
    let last = (stop - 1) / BITS_PER_BYTE;
    for byte_index in first..=last {
        let lo = if byte_index == first { start % BITS_PER_BYTE } else { 0 };
        let hi = if byte_index == last { (stop - 1) % BITS_PER_BYTE + 1 } else { BITS_PER_BYTE };
        let diff = (a.0[byte_index] ^ b.0[byte_index]) & byte_mask(lo, hi);
        if diff != 0 {
            return Some(byte_index * BITS_PER_BYTE + diff.trailing_zeros() as usize);
        }
    }
    None
}

// Mask selecting bits [lo, hi) of a byte, in the bit order of `Id::bit`.
fn byte_mask(lo: usize, hi: usize) -> u8 {
    (((1u16 << hi) - 1) as u8) & !(((1u16 << lo) - 1) as u8)
}

// This function is the replacement for `zfx_crypto`s `hash!` macro
fn hash(input: &[u8]) -> [u8; 32] {
    let mut hasher = Blake2bVar::new(32).unwrap();
    hasher.update(input);
    let mut buf = [0u8; 32];
    hasher.finalize_variable(&mut buf).unwrap();
    buf
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_bit_access() {
        let id = Id::from_hash(&[0b1000_0001]);
        assert_eq!(id.bit(0), 1);
        for i in 1..7 {
            assert_eq!(id.bit(i), 0);
        }
        assert_eq!(id.bit(7), 1);
        assert_eq!(id.bit(8), 0);

        let id = Id::zero().with_bit(9);
        assert_eq!(id.bit(8), 0);
        assert_eq!(id.bit(9), 1);
        assert_eq!(id.bit(10), 0);

        assert_eq!(Id::max().bit(255), 1);
        assert_eq!(Id::zero().bit(255), 0);
    }

    #[test]
    fn test_equal_subset() {
        let a = Id::zero();
        let b = Id::zero().with_bit(13);

        assert!(equal_subset(0, 256, &a, &a));
        assert!(equal_subset(0, 13, &a, &b));
        assert!(!equal_subset(0, 14, &a, &b));
        assert!(!equal_subset(13, 14, &a, &b));
        assert!(equal_subset(14, 256, &a, &b));

        // Degenerate and out of range
        assert!(equal_subset(5, 5, &a, &b));
        assert!(equal_subset(13, 5, &a, &b));
        assert!(!equal_subset(0, 257, &a, &a));
    }

    #[test]
    fn test_equal_subset_across_bytes() {
        let a = Id::zero();
        let b = Id::zero().with_bit(8);
        assert!(equal_subset(0, 8, &a, &b));
        assert!(!equal_subset(0, 9, &a, &b));
        assert!(!equal_subset(8, 256, &a, &b));
        assert!(equal_subset(9, 256, &a, &b));

        let c = Id::zero().with_bit(255);
        assert!(equal_subset(0, 255, &a, &c));
        assert!(!equal_subset(0, 256, &a, &c));
        assert!(!equal_subset(255, 256, &a, &c));
    }

    #[test]
    fn test_first_difference_subset() {
        let a = Id::zero();
        let b = Id::zero().with_bit(13).with_bit(200);

        assert_eq!(first_difference_subset(0, 256, &a, &b), Some(13));
        assert_eq!(first_difference_subset(0, 13, &a, &b), None);
        assert_eq!(first_difference_subset(13, 256, &a, &b), Some(13));
        assert_eq!(first_difference_subset(14, 256, &a, &b), Some(200));
        assert_eq!(first_difference_subset(14, 200, &a, &b), None);

        // Degenerate and out of range
        assert_eq!(first_difference_subset(5, 5, &a, &b), None);
        assert_eq!(first_difference_subset(0, 300, &a, &b), None);
        assert_eq!(first_difference_subset(0, 256, &a, &a), None);
    }

    #[test]
    fn test_display_round_trip() {
        let id = Id::new(b"to_be_hashed");
        let s = format!("{}", id);
        let id2: Id = s.parse().unwrap();
        assert_eq!(id, id2);
        assert_eq!(id.bytes(), id2.bytes());

        let id = Id::generate();
        let id2: Id = format!("{}", id).parse().unwrap();
        assert_eq!(id.as_bytes(), id2.as_bytes());

        match "not-an-id".parse::<Id>() {
            Err(crate::Error::TryFromStringError) => (),
            other => panic!("unexpected: {:?}", other),
        }
    }
}
