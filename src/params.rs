use core::fmt::Debug;
use core::fmt::Formatter;
use core::fmt::Result as FmtResult;
use core::num::NonZeroUsize;

use crate::error::Error;
use crate::error::Result;

// -----------------------------------------------------------------------------
// Table Shape
// -----------------------------------------------------------------------------

/// The validated geometry of a [`SegTab`].
///
/// A shape fixes the number of independently locked segments and the number
/// of slots in each of them. Neither value changes for the lifetime of a
/// table; there is no resizing.
///
/// # Routing
///
/// When the segment count is a power of two, a key's segment is taken from
/// the most-significant bits of its digest while the bucket inside the segment
/// is derived from the full digest. Any other segment count falls back to
/// `digest % segments`, which is correct but only as uniform as the low bits
/// of the hash.
///
/// # Examples
///
/// ```
/// use segtab::config::Shape;
///
/// let shape = Shape::new(4, 16).unwrap();
///
/// assert_eq!(shape.segments(), 4);
/// assert_eq!(shape.capacity(), 16);
/// assert_eq!(shape.total(), 64);
/// assert_eq!(shape.routing_bits(), Some(2));
///
/// // Non-power-of-two segment counts route by modulo.
/// assert_eq!(Shape::new(3, 16).unwrap().routing_bits(), None);
///
/// // Empty geometries are rejected.
/// assert!(Shape::new(0, 16).is_err());
/// assert!(Shape::new(4, 0).is_err());
/// ```
///
/// [`SegTab`]: crate::public::SegTab
#[derive(Clone, Copy, Hash, PartialEq, Eq)]
pub struct Shape {
  segments: NonZeroUsize,
  capacity: NonZeroUsize,
}

impl Shape {
  /// The default shape: 8 segments of 128 slots each.
  pub const DEF: Self = Self {
    segments: NonZeroUsize::new(8).unwrap(),
    capacity: NonZeroUsize::new(128).unwrap(),
  };

  /// Creates a new [`Shape`] from a segment count and per-segment capacity.
  ///
  /// # Errors
  ///
  /// Returns [`Error::ZeroSegments`] or [`Error::ZeroCapacity`] if either
  /// dimension is zero, and [`Error::Overflow`] if the total slot count does
  /// not fit in a `usize`.
  pub const fn new(segments: usize, capacity: usize) -> Result<Self> {
    let Some(nz_segments) = NonZeroUsize::new(segments) else {
      return Err(Error::ZeroSegments);
    };

    let Some(nz_capacity) = NonZeroUsize::new(capacity) else {
      return Err(Error::ZeroCapacity);
    };

    if segments.checked_mul(capacity).is_none() {
      return Err(Error::Overflow { segments, capacity });
    }

    Ok(Self {
      segments: nz_segments,
      capacity: nz_capacity,
    })
  }

  /// Returns the number of segments.
  #[inline]
  pub const fn segments(&self) -> usize {
    self.segments.get()
  }

  /// Returns the number of slots in each segment.
  #[inline]
  pub const fn capacity(&self) -> usize {
    self.capacity.get()
  }

  /// Returns the total number of slots across all segments.
  #[inline]
  pub const fn total(&self) -> usize {
    // Checked in `Shape::new`.
    self.segments.get() * self.capacity.get()
  }

  /// Returns `true` if the segment count is a power of two.
  #[inline]
  pub const fn is_power_of_two(&self) -> bool {
    self.segments.is_power_of_two()
  }

  /// Returns the number of high digest bits used to select a segment.
  ///
  /// This is `Some(log2(segments))` for power-of-two segment counts and
  /// [`None`] when routing falls back to a modulo.
  ///
  /// # Examples
  ///
  /// ```
  /// use segtab::config::Shape;
  ///
  /// assert_eq!(Shape::new(1, 8).unwrap().routing_bits(), Some(0));
  /// assert_eq!(Shape::new(64, 8).unwrap().routing_bits(), Some(6));
  /// assert_eq!(Shape::new(12, 8).unwrap().routing_bits(), None);
  /// ```
  #[inline]
  pub const fn routing_bits(&self) -> Option<u32> {
    if self.is_power_of_two() {
      Some(self.segments.trailing_zeros())
    } else {
      None
    }
  }
}

impl Debug for Shape {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.debug_struct("Shape")
      .field("segments", &self.segments)
      .field("capacity", &self.capacity)
      .field("total", &self.total())
      .field("routing_bits", &self.routing_bits())
      .finish()
  }
}

impl Default for Shape {
  #[inline]
  fn default() -> Self {
    Self::DEF
  }
}

impl TryFrom<(usize, usize)> for Shape {
  type Error = Error;

  #[inline]
  fn try_from((segments, capacity): (usize, usize)) -> Result<Self> {
    Self::new(segments, capacity)
  }
}
