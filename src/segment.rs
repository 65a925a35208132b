//! A single lock stripe.
//!
//! A [`Segment`] is a fixed-size open-addressing table guarded by its own
//! reader-writer lock. Collisions are resolved by linear probing and deletions
//! use backward-shift compaction, so an empty slot always terminates a probe
//! chain and no tombstones are ever left behind.

use core::borrow::Borrow;
use core::mem;

use tracing::debug;
use tracing::trace;

use crate::error::Error;
use crate::error::Result;
use crate::index::Digest;
use crate::public::Update;
use crate::sync::Mutex;
use crate::sync::MutexGuard;
use crate::sync::RwLock;
use crate::sync::RwLockReadGuard;
use crate::sync::RwLockWriteGuard;

// -----------------------------------------------------------------------------
// Slot
// -----------------------------------------------------------------------------

/// An occupied slot.
///
/// The digest and key are immutable once written; only the segment's
/// exclusive lock holder may create, move, or clear a slot. The value sits
/// behind its own mutex so it can be rewritten in place by a thread holding
/// only the shared segment lock.
pub(crate) struct Slot<K, V> {
  digest: Digest,
  key: K,
  value: Mutex<V>,
}

impl<K, V> Slot<K, V> {
  #[inline]
  fn new(digest: Digest, key: K, value: V) -> Self {
    Self {
      digest,
      key,
      value: Mutex::new(value),
    }
  }

  #[inline]
  fn replace(&self, value: V) -> V {
    mem::replace(&mut *self.value.lock(), value)
  }

  #[inline]
  fn apply<F>(&self, transform: F)
  where
    F: FnOnce(&V) -> V,
  {
    let mut value: MutexGuard<'_, V> = self.value.lock();
    *value = transform(&value);
  }
}

// -----------------------------------------------------------------------------
// Probe Result
// -----------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Probe {
  /// The key occupies this slot.
  Found(usize),
  /// The chain ended at this empty slot without a match.
  Vacant(usize),
  /// Every slot was visited; the key is absent and there is no room for it.
  Full,
}

// -----------------------------------------------------------------------------
// Slot Array
// -----------------------------------------------------------------------------

/// The lock-protected contents of a segment.
pub(crate) struct Slots<K, V> {
  entries: Box<[Option<Slot<K, V>>]>,
  len: usize,
}

impl<K, V> Slots<K, V> {
  fn new(capacity: usize) -> Self {
    Self {
      entries: (0..capacity).map(|_| None).collect(),
      len: 0,
    }
  }

  #[inline]
  fn capacity(&self) -> usize {
    self.entries.len()
  }

  #[inline]
  fn next(&self, index: usize) -> usize {
    if index + 1 == self.capacity() { 0 } else { index + 1 }
  }

  /// Linear probe from the digest's home bucket.
  fn probe<Q>(&self, digest: Digest, key: &Q) -> Probe
  where
    K: Borrow<Q>,
    Q: Eq + ?Sized,
  {
    let mut index: usize = digest.bucket(self.capacity());

    for _ in 0..self.capacity() {
      match &self.entries[index] {
        None => return Probe::Vacant(index),
        Some(slot) if slot.digest == digest && <K as Borrow<Q>>::borrow(&slot.key) == key => {
          return Probe::Found(index);
        }
        Some(_) => index = self.next(index),
      }
    }

    Probe::Full
  }

  #[inline]
  fn lookup<Q>(&self, digest: Digest, key: &Q) -> Option<&Slot<K, V>>
  where
    K: Borrow<Q>,
    Q: Eq + ?Sized,
  {
    match self.probe(digest, key) {
      Probe::Found(index) => self.entries[index].as_ref(),
      Probe::Vacant(_) | Probe::Full => None,
    }
  }

  #[inline]
  fn occupy(&mut self, index: usize, slot: Slot<K, V>) {
    debug_assert!(self.entries[index].is_none(), "Slots::occupy on an occupied slot");

    self.entries[index] = Some(slot);
    self.len += 1;
  }

  /// Clears the slot at `index` and closes the gap it leaves behind.
  ///
  /// Walks the run of occupied slots following the hole. An entry is pulled
  /// back into the hole when the hole lies cyclically within `[home, current)`,
  /// i.e. when moving it keeps the entry reachable from its home bucket. The
  /// walk stops at the first empty slot, so the cost is bounded by the length
  /// of the cluster after `index`.
  fn vacate(&mut self, index: usize) -> Option<Slot<K, V>> {
    let removed: Slot<K, V> = self.entries[index].take()?;
    let capacity: usize = self.capacity();

    self.len -= 1;

    let mut hole: usize = index;
    let mut scan: usize = self.next(index);

    while let Some(slot) = &self.entries[scan] {
      let home: usize = slot.digest.bucket(capacity);

      if distance(home, hole, capacity) < distance(home, scan, capacity) {
        self.entries[hole] = self.entries[scan].take();
        hole = scan;
      }

      scan = self.next(scan);
    }

    Some(removed)
  }
}

/// Number of forward steps from `from` to `to` in a ring of `capacity` slots.
#[inline]
const fn distance(from: usize, to: usize, capacity: usize) -> usize {
  if to >= from { to - from } else { capacity - from + to }
}

// -----------------------------------------------------------------------------
// Segment
// -----------------------------------------------------------------------------

pub(crate) struct Segment<K, V> {
  index: usize,
  capacity: usize,
  slots: RwLock<Slots<K, V>>,
}

impl<K, V> Segment<K, V> {
  pub(crate) fn new(index: usize, capacity: usize) -> Self {
    Self {
      index,
      capacity,
      slots: RwLock::new(Slots::new(capacity)),
    }
  }

  #[inline]
  pub(crate) const fn index(&self) -> usize {
    self.index
  }

  #[inline]
  pub(crate) fn len(&self) -> usize {
    self.slots.read().len
  }

  /// Runs `f` on the value stored for `key` under the shared lock.
  pub(crate) fn with<Q, F, R>(&self, digest: Digest, key: &Q, f: F) -> Option<R>
  where
    K: Borrow<Q>,
    Q: Eq + ?Sized,
    F: FnOnce(&V) -> R,
  {
    let guard: RwLockReadGuard<'_, Slots<K, V>> = self.slots.read();
    let slot: &Slot<K, V> = guard.lookup(digest, key)?;
    let value: MutexGuard<'_, V> = slot.value.lock();

    Some(f(&value))
  }

  pub(crate) fn contains<Q>(&self, digest: Digest, key: &Q) -> bool
  where
    K: Borrow<Q>,
    Q: Eq + ?Sized,
  {
    matches!(self.slots.read().probe(digest, key), Probe::Found(_))
  }

  /// Inserts or overwrites `key` under the exclusive lock.
  ///
  /// Returns the previous value, which is dropped by the caller after the
  /// lock has been released.
  pub(crate) fn insert(&self, digest: Digest, key: K, value: V) -> Result<Option<V>>
  where
    K: Eq,
  {
    let mut guard: RwLockWriteGuard<'_, Slots<K, V>> = self.slots.write();

    match guard.probe(digest, &key) {
      Probe::Found(index) => Ok(guard.entries[index].as_ref().map(|slot| slot.replace(value))),
      Probe::Vacant(index) => {
        guard.occupy(index, Slot::new(digest, key, value));
        Ok(None)
      }
      Probe::Full => Err(self.full()),
    }
  }

  /// Removes `key` under the exclusive lock.
  pub(crate) fn remove<Q>(&self, digest: Digest, key: &Q) -> bool
  where
    K: Borrow<Q>,
    Q: Eq + ?Sized,
  {
    // Bound outside the guard's scope so the entry drops after unlocking.
    let removed: Option<Slot<K, V>> = {
      let mut guard: RwLockWriteGuard<'_, Slots<K, V>> = self.slots.write();

      match guard.probe(digest, key) {
        Probe::Found(index) => guard.vacate(index),
        Probe::Vacant(_) | Probe::Full => None,
      }
    };

    removed.is_some()
  }

  /// Applies `transform` to an existing value, or inserts `insert` if absent.
  ///
  /// The first probe runs under the shared lock. Only if the key is missing
  /// and there is something to insert is the exclusive lock taken, after which
  /// the segment is probed again: another thread may have inserted the key
  /// while no lock was held.
  pub(crate) fn update<F>(&self, digest: Digest, key: K, transform: F, insert: Option<V>) -> Result<Update>
  where
    K: Eq,
    F: FnOnce(&V) -> V,
  {
    {
      let guard: RwLockReadGuard<'_, Slots<K, V>> = self.slots.read();

      if let Some(slot) = guard.lookup(digest, &key) {
        slot.apply(transform);
        return Ok(Update::Applied);
      }
    }

    let Some(value) = insert else {
      return Ok(Update::Absent);
    };

    trace!(segment = self.index, "update escalating to exclusive lock");

    let mut guard: RwLockWriteGuard<'_, Slots<K, V>> = self.slots.write();

    match guard.probe(digest, &key) {
      Probe::Found(index) => {
        trace!(segment = self.index, index, "key inserted concurrently; applying transform");

        if let Some(slot) = guard.entries[index].as_ref() {
          slot.apply(transform);
        }

        Ok(Update::Applied)
      }
      Probe::Vacant(index) => {
        guard.occupy(index, Slot::new(digest, key, value));
        Ok(Update::Inserted)
      }
      Probe::Full => Err(self.full()),
    }
  }

  /// Visits every occupied slot under the shared lock.
  pub(crate) fn for_each<F>(&self, mut f: F)
  where
    F: FnMut(&K, &V),
  {
    let guard: RwLockReadGuard<'_, Slots<K, V>> = self.slots.read();

    for slot in guard.entries.iter().flatten() {
      f(&slot.key, &slot.value.lock());
    }
  }

  #[cfg(test)]
  pub(crate) fn probe<Q>(&self, digest: Digest, key: &Q) -> Probe
  where
    K: Borrow<Q>,
    Q: Eq + ?Sized,
  {
    self.slots.read().probe(digest, key)
  }

  #[cfg(test)]
  pub(crate) fn lock_exclusive(&self) -> RwLockWriteGuard<'_, Slots<K, V>> {
    self.slots.write()
  }

  #[cold]
  #[inline(never)]
  fn full(&self) -> Error {
    debug!(
      segment = self.index,
      capacity = self.capacity,
      "segment full; write rejected"
    );

    Error::SegmentFull {
      segment: self.index,
      capacity: self.capacity,
    }
  }
}
