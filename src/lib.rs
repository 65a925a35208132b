//! A fixed-capacity, lock-striped concurrent hash table.
//!
//! `segtab` provides [`SegTab`], an associative container split into a fixed
//! number of independently locked segments. It is meant as a building block
//! for in-memory caches and indices where capacity is known up front and
//! parallel read/write throughput matters more than growth.
//!
//! # Overview
//!
//! Every key is hashed once. The high bits of the 64-bit digest select a
//! segment; the full digest selects a home bucket inside that segment. Each
//! segment is an open-addressing table with linear probing, guarded by its
//! own reader-writer lock.
//!
//! # Usage
//!
//! ```
//! use segtab::SegTab;
//!
//! // 4 segments of 16 slots each
//! let table: SegTab<u32, String> = SegTab::new(4, 16).unwrap();
//!
//! // Insert and read back
//! table.insert(1, "One".to_string()).unwrap();
//! assert_eq!(table.get(&1).as_deref(), Some("One"));
//!
//! // Inserting an existing key overwrites it
//! table.insert(1, "Uno".to_string()).unwrap();
//! assert_eq!(table.get(&1).as_deref(), Some("Uno"));
//!
//! // Remove the entry
//! assert!(table.remove(&1));
//! assert_eq!(table.get(&1), None);
//! ```
//!
//! # Configuration
//!
//! Table geometry is described by a [`Shape`]: a segment count and a
//! per-segment slot count, both fixed for the lifetime of the table.
//!
//! ```
//! use segtab::{SegTab, Shape};
//!
//! // These are equivalent:
//! let table1: SegTab<u64, u64> = SegTab::default();
//! let table2: SegTab<u64, u64> = SegTab::with_shape(Shape::DEF);
//!
//! assert_eq!(table1.shape(), table2.shape());
//! assert_eq!(table1.segment_count(), 8);
//! assert_eq!(table1.segment_capacity(), 128);
//! ```
//!
//! Segment selection uses the top `log2(segments)` bits of the digest when the
//! segment count is a power of two, and `digest % segments` otherwise. Prefer
//! power-of-two segment counts: they keep segment selection independent of the
//! low bits used for probing.
//!
//! Keys are hashed with XXH64 by default. Any [`BuildHasher`] can be supplied
//! with [`SegTab::with_hasher`]; it should be fast and have good avalanche in
//! both its high and low bits.
//!
//! # Concurrency
//!
//! Locking is per segment. Operations on keys in different segments never
//! contend. Within a segment, any number of lookups proceed together while
//! inserts and removals are exclusive.
//!
//! ```no_run
//! use segtab::SegTab;
//! use std::sync::Arc;
//! use std::thread;
//!
//! let table: Arc<SegTab<u64, u64>> = Arc::new(SegTab::new(16, 1024).unwrap());
//!
//! let handles: Vec<_> = (0..4)
//!   .map(|thread_id| {
//!     let table = Arc::clone(&table);
//!     thread::spawn(move || {
//!       for i in 0..100 {
//!         table.insert(thread_id * 1000 + i, i).unwrap();
//!       }
//!     })
//!   })
//!   .collect();
//!
//! for handle in handles {
//!   handle.join().unwrap();
//! }
//!
//! assert_eq!(table.len(), 400);
//! ```
//!
//! ## Upserts
//!
//! [`SegTab::update`] transforms an existing value under the segment's shared
//! lock and only escalates to the exclusive lock when it has to insert,
//! re-probing after escalation so that racing upserts of one key still create
//! a single entry.
//!
//! # Capacity Limits
//!
//! Tables never resize. When the segment a key routes to has no free slot,
//! [`SegTab::insert`] returns [`Error::SegmentFull`] and leaves the table
//! unchanged; how to react (evict, rebuild larger, drop the write) is up to the
//! caller.
//!
//! [`BuildHasher`]: core::hash::BuildHasher
//! [`Error::SegmentFull`]: crate::error::Error::SegmentFull
//! [`SegTab::insert`]: crate::public::SegTab::insert
//! [`SegTab::update`]: crate::public::SegTab::update
//! [`SegTab::with_hasher`]: crate::public::SegTab::with_hasher
//! [`Shape`]: crate::config::Shape
//!

#![cfg_attr(docsrs, feature(doc_cfg))]
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

mod error;
mod index;
mod params;
mod public;
mod segment;
mod table;
mod utils;

#[cfg(all(test, not(any(loom, shuttle))))]
mod tests;

pub(crate) use crate::utils::sync;

pub mod implementation {
  #![doc = include_str!("../IMPLEMENTATION.md")]
}

pub mod config {
  //! Configuration parameters which can be used to override the default table
  //! settings.

  pub use crate::params::Shape;
  pub use crate::public::DefaultHashBuilder;
}

#[doc(inline)]
pub use self::config::DefaultHashBuilder;

#[doc(inline)]
pub use self::config::Shape;

pub use self::error::Error;
pub use self::error::Result;

pub use self::public::SegTab;
pub use self::public::Update;
