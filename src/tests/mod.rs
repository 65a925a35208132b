use core::hash::BuildHasherDefault;
use core::hash::Hasher;

mod table;

/// Hashes a `u64` key to itself so tests can place keys in chosen buckets.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct IdentityHasher {
  state: u64,
}

impl Hasher for IdentityHasher {
  fn finish(&self) -> u64 {
    self.state
  }

  fn write(&mut self, bytes: &[u8]) {
    for byte in bytes {
      self.state = (self.state << 8) | u64::from(*byte);
    }
  }

  fn write_u64(&mut self, value: u64) {
    self.state = value;
  }
}

pub(crate) type Identity = BuildHasherDefault<IdentityHasher>;
