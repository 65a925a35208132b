//! Error types for table construction and mutation.

use thiserror::Error;

/// Errors returned by [`SegTab`] operations.
///
/// Absence of a key is never an error: lookups return [`None`], removals
/// return `false`, and [`SegTab::update`] reports [`Update::Absent`].
///
/// [`SegTab`]: crate::public::SegTab
/// [`SegTab::update`]: crate::public::SegTab::update
/// [`Update::Absent`]: crate::public::Update::Absent
#[derive(Clone, Copy, Debug, Error, Hash, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
  /// Every slot of the routed segment holds some other key.
  ///
  /// The write was rejected and the table is unchanged. Capacity is fixed, so
  /// retrying only helps once entries routed to the same segment are removed.
  #[error("segment {segment} is full (capacity: {capacity})")]
  SegmentFull {
    /// Index of the saturated segment.
    segment: usize,
    /// Number of slots in the segment.
    capacity: usize,
  },

  /// A table was configured with zero segments.
  #[error("invalid shape: segment count must be non-zero")]
  ZeroSegments,

  /// A table was configured with zero slots per segment.
  #[error("invalid shape: segment capacity must be non-zero")]
  ZeroCapacity,

  /// The total number of slots is not representable.
  #[error("invalid shape: {segments} segments of {capacity} slots overflows `usize`")]
  Overflow {
    /// Requested segment count.
    segments: usize,
    /// Requested slots per segment.
    capacity: usize,
  },
}

/// A specialized [`Result`] type for table operations.
///
/// [`Result`]: core::result::Result
pub type Result<T, E = Error> = core::result::Result<T, E>;
