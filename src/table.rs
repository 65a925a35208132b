//! Core table implementation.
//!
//! Hashes each key once, routes the digest to a single [`Segment`], and
//! forwards the operation. Segments share nothing, so operations on keys in
//! different segments never contend.

use core::borrow::Borrow;
use core::fmt::Debug;
use core::fmt::DebugMap;
use core::fmt::Formatter;
use core::fmt::Result as FmtResult;
use core::hash::BuildHasher;
use core::hash::Hash;

use crossbeam_utils::CachePadded;
use tracing::debug;

use crate::error::Result;
use crate::index::Digest;
use crate::index::Router;
use crate::params::Shape;
use crate::public::Update;
use crate::segment::Segment;

// -----------------------------------------------------------------------------
// Table State
// -----------------------------------------------------------------------------

pub(crate) struct Table<K, V, S> {
  shape: Shape,
  router: Router,
  hasher: S,
  segments: Box<[CachePadded<Segment<K, V>>]>,
}

impl<K, V, S> Table<K, V, S> {
  #[track_caller]
  pub(crate) fn new(shape: Shape, hasher: S) -> Self {
    let router: Router = Router::new(shape);

    debug!(
      segments = shape.segments(),
      capacity = shape.capacity(),
      high_bits = router.is_high_bits(),
      "allocating segmented table"
    );

    let segments: Box<[CachePadded<Segment<K, V>>]> = (0..shape.segments())
      .map(|index| CachePadded::new(Segment::new(index, shape.capacity())))
      .collect();

    Self {
      shape,
      router,
      hasher,
      segments,
    }
  }

  #[inline]
  pub(crate) const fn shape(&self) -> Shape {
    self.shape
  }

  #[inline]
  pub(crate) const fn hasher(&self) -> &S {
    &self.hasher
  }

  #[inline]
  pub(crate) const fn cap(&self) -> usize {
    self.shape.total()
  }

  #[inline]
  pub(crate) fn len(&self) -> usize {
    self.segments.iter().map(|segment| segment.len()).sum()
  }

  #[inline]
  pub(crate) fn is_empty(&self) -> bool {
    self.segments.iter().all(|segment| segment.len() == 0)
  }

  #[inline]
  pub(crate) fn segment_len(&self, index: usize) -> Option<usize> {
    self.segments.get(index).map(|segment| segment.len())
  }

  #[cfg(test)]
  pub(crate) fn segment(&self, index: usize) -> &Segment<K, V> {
    &self.segments[index]
  }
}

impl<K, V, S> Table<K, V, S>
where
  K: Hash + Eq,
  S: BuildHasher,
{
  /// Hashes `key` once and returns its digest with the segment it routes to.
  #[inline]
  pub(crate) fn locate<Q>(&self, key: &Q) -> (Digest, &Segment<K, V>)
  where
    Q: Hash + ?Sized,
  {
    let digest: Digest = Digest::of(&self.hasher, key);
    let segment: &Segment<K, V> = &self.segments[self.router.segment(digest)];

    (digest, segment)
  }

  #[inline]
  pub(crate) fn segment_of<Q>(&self, key: &Q) -> usize
  where
    Q: Hash + ?Sized,
  {
    self.locate(key).1.index()
  }

  #[inline]
  pub(crate) fn insert(&self, key: K, value: V) -> Result<Option<V>> {
    let (digest, segment): (Digest, &Segment<K, V>) = self.locate(&key);

    segment.insert(digest, key, value)
  }

  #[inline]
  pub(crate) fn remove<Q>(&self, key: &Q) -> bool
  where
    K: Borrow<Q>,
    Q: Hash + Eq + ?Sized,
  {
    let (digest, segment): (Digest, &Segment<K, V>) = self.locate(key);

    segment.remove(digest, key)
  }

  #[inline]
  pub(crate) fn contains<Q>(&self, key: &Q) -> bool
  where
    K: Borrow<Q>,
    Q: Hash + Eq + ?Sized,
  {
    let (digest, segment): (Digest, &Segment<K, V>) = self.locate(key);

    segment.contains(digest, key)
  }

  #[inline]
  pub(crate) fn with<Q, F, R>(&self, key: &Q, f: F) -> Option<R>
  where
    K: Borrow<Q>,
    Q: Hash + Eq + ?Sized,
    F: FnOnce(&V) -> R,
  {
    let (digest, segment): (Digest, &Segment<K, V>) = self.locate(key);

    segment.with(digest, key, f)
  }

  #[inline]
  pub(crate) fn get<Q>(&self, key: &Q) -> Option<V>
  where
    K: Borrow<Q>,
    Q: Hash + Eq + ?Sized,
    V: Clone,
  {
    self.with(key, V::clone)
  }

  #[inline]
  pub(crate) fn update<F>(&self, key: K, transform: F, insert: Option<V>) -> Result<Update>
  where
    F: FnOnce(&V) -> V,
  {
    let (digest, segment): (Digest, &Segment<K, V>) = self.locate(&key);

    segment.update(digest, key, transform, insert)
  }
}

impl<K, V, S> Debug for Table<K, V, S>
where
  K: Debug,
  V: Debug,
{
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    let mut debug: DebugMap<'_, '_> = f.debug_map();

    for segment in &self.segments {
      segment.for_each(|key, value| {
        debug.entry(key, value);
      });
    }

    debug.finish()
  }
}
