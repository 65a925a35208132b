//! Digest routing.
//!
//! Every operation hashes its key exactly once. The resulting [`Digest`] picks
//! a segment with [`Router::segment`] and a home bucket inside that segment
//! with [`Digest::bucket`].

use core::hash::BuildHasher;
use core::hash::Hash;

use crate::params::Shape;

// -----------------------------------------------------------------------------
// Digest
// -----------------------------------------------------------------------------

/// The 64-bit hash of a key.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
#[repr(transparent)]
pub(crate) struct Digest {
  bits: u64,
}

impl Digest {
  #[inline]
  pub(crate) fn of<Q, S>(hasher: &S, key: &Q) -> Self
  where
    Q: Hash + ?Sized,
    S: BuildHasher,
  {
    Self::from_bits(hasher.hash_one(key))
  }

  #[inline]
  pub(crate) const fn from_bits(bits: u64) -> Self {
    Self { bits }
  }

  #[inline]
  pub(crate) const fn into_bits(self) -> u64 {
    self.bits
  }

  /// Returns the home bucket of this digest in a segment of `capacity` slots.
  ///
  /// Uses the full digest, independent of the bits consumed by routing.
  #[inline]
  pub(crate) const fn bucket(self, capacity: usize) -> usize {
    debug_assert!(capacity != 0, "Digest::bucket requires a non-zero capacity");
    (self.bits % capacity as u64) as usize
  }
}

// -----------------------------------------------------------------------------
// Router
// -----------------------------------------------------------------------------

/// Maps digests to segment indices.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Router {
  segments: usize,
  policy: Policy,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Policy {
  /// Take the top `64 - shift` bits. A shift of 64 means a single segment.
  HighBits { shift: u32 },
  /// Reduce the full digest modulo the segment count.
  Modulo,
}

impl Router {
  #[inline]
  pub(crate) const fn new(shape: Shape) -> Self {
    let policy: Policy = match shape.routing_bits() {
      Some(bits) => Policy::HighBits {
        shift: u64::BITS - bits,
      },
      None => Policy::Modulo,
    };

    Self {
      segments: shape.segments(),
      policy,
    }
  }

  #[inline]
  pub(crate) const fn is_high_bits(&self) -> bool {
    matches!(self.policy, Policy::HighBits { .. })
  }

  #[inline]
  pub(crate) const fn segment(&self, digest: Digest) -> usize {
    let index: usize = match self.policy {
      Policy::HighBits { shift } => match digest.into_bits().checked_shr(shift) {
        Some(bits) => bits as usize,
        None => 0,
      },
      Policy::Modulo => (digest.into_bits() % self.segments as u64) as usize,
    };

    debug_assert!(index < self.segments, "Router::segment escaped the segment range");
    index
  }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------
