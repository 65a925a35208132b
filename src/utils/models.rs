#[cfg(all(loom, shuttle))]
compile_error!("cannot use loom and shuttle at once");

#[cfg(not(any(loom, shuttle)))]
pub(crate) mod sync {
  pub(crate) use ::parking_lot::Mutex;
  pub(crate) use ::parking_lot::MutexGuard;
  pub(crate) use ::parking_lot::RwLock;
  pub(crate) use ::parking_lot::RwLockReadGuard;
  pub(crate) use ::parking_lot::RwLockWriteGuard;
}

/// Wraps a `std`-style lock model so it matches the poison-free
/// `parking_lot` API used by the table.
#[cfg(any(loom, shuttle))]
macro_rules! poison_free {
  ($($root:ident)::+) => {
    pub(crate) use $($root)::+::MutexGuard;
    pub(crate) use $($root)::+::RwLockReadGuard;
    pub(crate) use $($root)::+::RwLockWriteGuard;

    #[repr(transparent)]
    pub(crate) struct Mutex<T> {
      inner: $($root)::+::Mutex<T>,
    }

    impl<T> Mutex<T> {
      #[inline]
      pub(crate) fn new(value: T) -> Self {
        Self {
          inner: $($root)::+::Mutex::new(value),
        }
      }

      #[inline]
      pub(crate) fn lock(&self) -> MutexGuard<'_, T> {
        self.inner.lock().unwrap_or_else(::std::sync::PoisonError::into_inner)
      }
    }

    #[repr(transparent)]
    pub(crate) struct RwLock<T> {
      inner: $($root)::+::RwLock<T>,
    }

    impl<T> RwLock<T> {
      #[inline]
      pub(crate) fn new(value: T) -> Self {
        Self {
          inner: $($root)::+::RwLock::new(value),
        }
      }

      #[inline]
      pub(crate) fn read(&self) -> RwLockReadGuard<'_, T> {
        self.inner.read().unwrap_or_else(::std::sync::PoisonError::into_inner)
      }

      #[inline]
      pub(crate) fn write(&self) -> RwLockWriteGuard<'_, T> {
        self.inner.write().unwrap_or_else(::std::sync::PoisonError::into_inner)
      }
    }
  };
}

#[cfg(loom)]
pub(crate) mod sync {
  poison_free!(loom::sync);
}

#[cfg(shuttle)]
pub(crate) mod sync {
  poison_free!(shuttle::sync);
}
