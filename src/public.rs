use core::borrow::Borrow;
use core::fmt::Debug;
use core::fmt::Formatter;
use core::fmt::Result as FmtResult;
use core::hash::BuildHasher;
use core::hash::Hash;

use xxhash_rust::xxh64::Xxh64Builder;

use crate::error::Result;
use crate::params::Shape;
use crate::table::Table;

/// The default hash builder: XXH64 with a zero seed.
pub type DefaultHashBuilder = Xxh64Builder;

#[inline]
fn default_hasher() -> DefaultHashBuilder {
  Xxh64Builder::new(0)
}

// -----------------------------------------------------------------------------
// Update Outcome
// -----------------------------------------------------------------------------

/// The outcome of [`SegTab::update`].
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
#[must_use]
pub enum Update {
  /// The key was present and the transform was applied to its value.
  Applied,
  /// The key was absent and the supplied value was inserted.
  Inserted,
  /// The key was absent and no value was supplied; nothing changed.
  Absent,
}

// -----------------------------------------------------------------------------
// Public Table
// -----------------------------------------------------------------------------

/// A fixed-capacity concurrent hash table with lock striping.
///
/// Keys are spread over a fixed number of segments, each an open-addressing
/// table with its own reader-writer lock. Lookups take a shared lock on one
/// segment; inserts and removals take an exclusive lock on one segment.
///
/// See the [crate-level documentation][crate] for an overview and examples.
///
/// # Type Parameters
///
/// - `K`: The key type.
/// - `V`: The value type.
/// - `S`: The hash builder. Defaults to [`DefaultHashBuilder`] (XXH64).
///
/// # Examples
///
/// ```
/// use segtab::SegTab;
///
/// let table: SegTab<i32, &str> = SegTab::new(4, 16).unwrap();
///
/// table.insert(1, "One").unwrap();
/// table.insert(2, "Two").unwrap();
///
/// assert_eq!(table.get(&1), Some("One"));
/// assert_eq!(table.get(&2), Some("Two"));
/// assert_eq!(table.get(&3), None);
/// ```
#[repr(transparent)]
pub struct SegTab<K, V, S = DefaultHashBuilder> {
  inner: Table<K, V, S>,
}

impl<K, V> SegTab<K, V, DefaultHashBuilder> {
  /// Creates a new, empty table with `segments` segments of `capacity` slots.
  ///
  /// # Errors
  ///
  /// Returns an error if either dimension is zero or the total slot count
  /// overflows; see [`Shape::new`].
  ///
  /// # Examples
  ///
  /// ```
  /// use segtab::{Error, SegTab};
  ///
  /// let table: SegTab<u64, u64> = SegTab::new(8, 128).unwrap();
  /// assert_eq!(table.capacity(), 1024);
  ///
  /// assert_eq!(SegTab::<u64, u64>::new(0, 128).unwrap_err(), Error::ZeroSegments);
  /// ```
  #[inline]
  pub fn new(segments: usize, capacity: usize) -> Result<Self> {
    Self::with_hasher(segments, capacity, default_hasher())
  }

  /// Creates a new, empty table with the given [`Shape`].
  #[inline]
  pub fn with_shape(shape: Shape) -> Self {
    Self::with_shape_and_hasher(shape, default_hasher())
  }
}

impl<K, V, S> SegTab<K, V, S> {
  /// Creates a new, empty table that hashes keys with `hasher`.
  ///
  /// # Errors
  ///
  /// Returns an error if either dimension is zero or the total slot count
  /// overflows; see [`Shape::new`].
  #[inline]
  pub fn with_hasher(segments: usize, capacity: usize, hasher: S) -> Result<Self> {
    Ok(Self::with_shape_and_hasher(Shape::new(segments, capacity)?, hasher))
  }

  /// Creates a new, empty table with the given [`Shape`] and `hasher`.
  #[inline]
  pub fn with_shape_and_hasher(shape: Shape, hasher: S) -> Self {
    Self {
      inner: Table::new(shape, hasher),
    }
  }

  /// Returns the geometry of the table.
  #[inline]
  pub const fn shape(&self) -> Shape {
    self.inner.shape()
  }

  /// Returns a reference to the table's hash builder.
  #[inline]
  pub const fn hasher(&self) -> &S {
    self.inner.hasher()
  }

  /// Returns the number of segments.
  #[inline]
  pub const fn segment_count(&self) -> usize {
    self.inner.shape().segments()
  }

  /// Returns the number of slots in each segment.
  #[inline]
  pub const fn segment_capacity(&self) -> usize {
    self.inner.shape().capacity()
  }

  /// Returns the total number of slots across all segments.
  ///
  /// A table may reject inserts well before it holds this many entries: each
  /// segment fills independently.
  #[inline]
  pub const fn capacity(&self) -> usize {
    self.inner.cap()
  }

  /// Returns the number of entries currently in the table.
  ///
  /// Segments are counted one at a time, so the result may be stale or mix
  /// states from different instants while other threads are writing.
  ///
  /// # Examples
  ///
  /// ```
  /// use segtab::SegTab;
  ///
  /// let table: SegTab<i32, i32> = SegTab::default();
  /// assert_eq!(table.len(), 0);
  ///
  /// table.insert(1, 10).unwrap();
  /// table.insert(2, 20).unwrap();
  /// assert_eq!(table.len(), 2);
  /// ```
  #[inline]
  pub fn len(&self) -> usize {
    self.inner.len()
  }

  /// Returns `true` if the table contains no entries.
  #[inline]
  pub fn is_empty(&self) -> bool {
    self.inner.is_empty()
  }

  /// Returns the number of entries in the segment at `index`, or [`None`] if
  /// there is no such segment.
  #[inline]
  pub fn segment_len(&self, index: usize) -> Option<usize> {
    self.inner.segment_len(index)
  }
}

impl<K, V, S> SegTab<K, V, S>
where
  K: Hash + Eq,
  S: BuildHasher,
{
  /// Returns the index of the segment that `key` routes to.
  ///
  /// This is a pure function of the key's hash and the table's shape; the key
  /// does not need to be present.
  ///
  /// # Examples
  ///
  /// ```
  /// use segtab::SegTab;
  ///
  /// let table: SegTab<i32, i32> = SegTab::new(8, 128).unwrap();
  /// let index = table.segment_of(&42);
  ///
  /// assert!(index < table.segment_count());
  /// assert_eq!(table.segment_of(&42), index);
  /// ```
  #[inline]
  pub fn segment_of<Q>(&self, key: &Q) -> usize
  where
    K: Borrow<Q>,
    Q: Hash + ?Sized,
  {
    self.inner.segment_of(key)
  }

  /// Inserts a key-value pair, overwriting the value of an existing key.
  ///
  /// Returns the previous value if the key was present.
  ///
  /// # Errors
  ///
  /// Returns [`Error::SegmentFull`] if the key is absent and every slot of its
  /// segment is occupied. The table is unchanged in that case.
  ///
  /// # Examples
  ///
  /// ```
  /// use segtab::{Error, SegTab};
  ///
  /// let table: SegTab<i32, &str> = SegTab::new(1, 2).unwrap();
  ///
  /// assert_eq!(table.insert(1, "One"), Ok(None));
  /// assert_eq!(table.insert(1, "Uno"), Ok(Some("One")));
  /// assert_eq!(table.insert(2, "Two"), Ok(None));
  ///
  /// assert_eq!(
  ///   table.insert(3, "Three"),
  ///   Err(Error::SegmentFull { segment: 0, capacity: 2 }),
  /// );
  /// ```
  ///
  /// [`Error::SegmentFull`]: crate::Error::SegmentFull
  #[inline]
  pub fn insert(&self, key: K, value: V) -> Result<Option<V>> {
    self.inner.insert(key, value)
  }

  /// Returns a clone of the value stored for `key`.
  ///
  /// # Examples
  ///
  /// ```
  /// use segtab::SegTab;
  ///
  /// let table: SegTab<i32, String> = SegTab::default();
  /// table.insert(7, "seven".to_string()).unwrap();
  ///
  /// assert_eq!(table.get(&7).as_deref(), Some("seven"));
  /// assert_eq!(table.get(&8), None);
  /// ```
  #[inline]
  pub fn get<Q>(&self, key: &Q) -> Option<V>
  where
    K: Borrow<Q>,
    Q: Hash + Eq + ?Sized,
    V: Clone,
  {
    self.inner.get(key)
  }

  /// Accesses the value stored for `key`, applying a function to it.
  ///
  /// Returns [`None`] if the key is absent. The segment's shared lock is held
  /// while `f` runs; `f` must not access the same table.
  ///
  /// # Examples
  ///
  /// ```
  /// use segtab::SegTab;
  ///
  /// let table: SegTab<&str, String> = SegTab::default();
  /// table.insert("greeting", "hello".to_string()).unwrap();
  ///
  /// assert_eq!(table.with("greeting", |s| s.len()), Some(5));
  /// ```
  #[inline]
  pub fn with<Q, F, R>(&self, key: &Q, f: F) -> Option<R>
  where
    K: Borrow<Q>,
    Q: Hash + Eq + ?Sized,
    F: FnOnce(&V) -> R,
  {
    self.inner.with(key, f)
  }

  /// Returns `true` if the table contains `key`.
  #[inline]
  pub fn contains_key<Q>(&self, key: &Q) -> bool
  where
    K: Borrow<Q>,
    Q: Hash + Eq + ?Sized,
  {
    self.inner.contains(key)
  }

  /// Removes `key` from the table.
  ///
  /// Returns `true` if the key was present. Removing an absent key is a
  /// no-op.
  ///
  /// # Examples
  ///
  /// ```
  /// use segtab::SegTab;
  ///
  /// let table: SegTab<i32, &str> = SegTab::default();
  /// table.insert(1, "One").unwrap();
  ///
  /// assert!(table.remove(&1));
  /// assert!(!table.remove(&1));
  /// assert_eq!(table.get(&1), None);
  /// ```
  #[inline]
  pub fn remove<Q>(&self, key: &Q) -> bool
  where
    K: Borrow<Q>,
    Q: Hash + Eq + ?Sized,
  {
    self.inner.remove(key)
  }

  /// Transforms the value stored for `key`, optionally inserting if absent.
  ///
  /// If the key is present, `transform` receives the current value and its
  /// result replaces it ([`Update::Applied`]). If the key is absent and
  /// `insert` is `Some`, that value is stored verbatim ([`Update::Inserted`]);
  /// `transform` never observes a missing value. Otherwise nothing changes
  /// ([`Update::Absent`]).
  ///
  /// # Locking
  ///
  /// The key is first looked up under the segment's shared lock and, when
  /// present, transformed in place without taking the exclusive lock. Only
  /// an insert escalates to the exclusive lock, and the segment is probed
  /// again after escalating, so concurrent upserts of the same key produce
  /// exactly one entry. `transform` runs while segment locks are held and
  /// must not access the same table.
  ///
  /// # Errors
  ///
  /// Returns [`Error::SegmentFull`] if an insert was required and the
  /// segment has no free slot.
  ///
  /// # Examples
  ///
  /// ```
  /// use segtab::{SegTab, Update};
  ///
  /// let table: SegTab<&str, u64> = SegTab::default();
  ///
  /// assert_eq!(table.update("hits", |n| n + 1, None), Ok(Update::Absent));
  /// assert_eq!(table.update("hits", |n| n + 1, Some(1)), Ok(Update::Inserted));
  /// assert_eq!(table.update("hits", |n| n + 1, Some(1)), Ok(Update::Applied));
  /// assert_eq!(table.get("hits"), Some(2));
  /// ```
  ///
  /// [`Error::SegmentFull`]: crate::Error::SegmentFull
  #[inline]
  pub fn update<F>(&self, key: K, transform: F, insert: Option<V>) -> Result<Update>
  where
    F: FnOnce(&V) -> V,
  {
    self.inner.update(key, transform, insert)
  }
}

impl<K, V, S> Debug for SegTab<K, V, S>
where
  K: Debug,
  V: Debug,
{
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.debug_struct("SegTab")
      .field("shape", &self.inner.shape())
      .field("entries", &self.inner)
      .finish()
  }
}

impl<K, V> Default for SegTab<K, V, DefaultHashBuilder> {
  /// Creates an empty table with [`Shape::DEF`] hashed by XXH64.
  #[inline]
  fn default() -> Self {
    Self::with_shape(Shape::DEF)
  }
}
