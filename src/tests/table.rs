use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::mpsc;
use std::sync::mpsc::Receiver;
use std::sync::mpsc::RecvTimeoutError;
use std::thread;
use std::time::Duration;

use crate::error::Error;
use crate::params::Shape;
use crate::public::DefaultHashBuilder;
use crate::public::SegTab;
use crate::public::Update;
use crate::table::Table;
use crate::tests::Identity;
use crate::utils::each_shape;

type TestTable<V = u64> = Table<u64, V, DefaultHashBuilder>;
type IdentityTable<V = u64> = Table<u64, V, Identity>;

/// Top two bits select one of four segments under high-bit routing.
const SEGMENT_1: u64 = 0x4000_0000_0000_0000;
const SEGMENT_2: u64 = 0x8000_0000_0000_0000;

fn shape(segments: usize, capacity: usize) -> Shape {
  Shape::new(segments, capacity).unwrap()
}

fn new_table<V>(segments: usize, capacity: usize) -> TestTable<V> {
  Table::new(shape(segments, capacity), DefaultHashBuilder::new(0))
}

fn new_identity<V>(segments: usize, capacity: usize) -> IdentityTable<V> {
  Table::new(shape(segments, capacity), Identity::default())
}

#[test]
fn test_new() {
  let table: TestTable = new_table(4, 16);

  assert_eq!(table.cap(), 64);
  assert_eq!(table.len(), 0);
  assert!(table.is_empty());
  assert_eq!(table.shape(), shape(4, 16));

  for index in 0..4 {
    assert_eq!(table.segment_len(index), Some(0));
  }

  assert_eq!(table.segment_len(4), None);
}

#[test]
fn test_insert_and_get() {
  let table: Table<i32, &str, DefaultHashBuilder> = Table::new(shape(4, 16), DefaultHashBuilder::new(0));

  table.insert(1, "One").unwrap();
  table.insert(2, "Two").unwrap();

  assert_eq!(table.get(&1), Some("One"));
  assert_eq!(table.get(&2), Some("Two"));
  assert_eq!(table.get(&3), None);
}

#[test]
fn test_insert_overwrite() {
  let table: TestTable = new_table(4, 16);

  assert_eq!(table.insert(1, 10), Ok(None));
  assert_eq!(table.insert(1, 20), Ok(Some(10)));

  assert_eq!(table.get(&1), Some(20));
  assert_eq!(table.len(), 1);
}

#[test]
fn test_insert_many() {
  let table: TestTable = new_table(8, 128);

  for key in 0..256 {
    table.insert(key, key * 100).unwrap();
  }

  assert_eq!(table.len(), 256);

  for key in 0..256 {
    assert_eq!(table.get(&key), Some(key * 100));
  }
}

#[test]
fn test_remove_existing() {
  let table: TestTable = new_table(4, 16);

  table.insert(1, 123).unwrap();

  assert!(table.contains(&1));
  assert!(table.remove(&1));
  assert!(!table.contains(&1));
  assert_eq!(table.get(&1), None);
  assert!(table.is_empty());
}

#[test]
fn test_remove_nonexistent() {
  let table: TestTable = new_table(4, 16);

  assert!(!table.remove(&1));

  table.insert(1, 123).unwrap();

  assert!(table.remove(&1));
  assert!(!table.remove(&1));
}

#[test]
fn test_remove_isolation() {
  let table: TestTable = new_table(4, 16);

  for key in 0..16 {
    table.insert(key, key).unwrap();
  }

  for key in (0..16).step_by(2) {
    assert!(table.remove(&key));
  }

  assert_eq!(table.len(), 8);

  for key in (1..16).step_by(2) {
    assert_eq!(table.get(&key), Some(key));
  }

  for key in (0..16).step_by(2) {
    assert!(!table.contains(&key));
  }
}

#[test]
fn test_remove_middle_of_collision_chain() {
  let table: IdentityTable<&str> = new_identity(4, 16);

  // All three share segment 0 and home bucket 3.
  table.insert(3, "a").unwrap();
  table.insert(19, "b").unwrap();
  table.insert(35, "c").unwrap();

  assert_eq!(table.segment_of(&3), 0);
  assert_eq!(table.segment_of(&19), 0);
  assert_eq!(table.segment_of(&35), 0);

  assert!(table.remove(&19));

  assert_eq!(table.get(&3), Some("a"));
  assert_eq!(table.get(&19), None);
  assert_eq!(table.get(&35), Some("c"));
}

#[test]
fn test_routing_high_bits() {
  let table: IdentityTable = new_identity(4, 16);

  assert_eq!(table.segment_of(&0), 0);
  assert_eq!(table.segment_of(&SEGMENT_1), 1);
  assert_eq!(table.segment_of(&SEGMENT_2), 2);
  assert_eq!(table.segment_of(&u64::MAX), 3);

  table.insert(SEGMENT_1 | 5, 1).unwrap();

  assert_eq!(table.segment_len(0), Some(0));
  assert_eq!(table.segment_len(1), Some(1));
}

#[test]
fn test_routing_modulo() {
  let table: IdentityTable = new_identity(3, 16);

  assert_eq!(table.segment_of(&0), 0);
  assert_eq!(table.segment_of(&7), 1);
  assert_eq!(table.segment_of(&11), 2);

  table.insert(7, 1).unwrap();

  assert_eq!(table.segment_len(1), Some(1));
}

#[test]
fn test_segment_full() {
  let table: IdentityTable = new_identity(4, 4);

  for key in 0..4 {
    table.insert(SEGMENT_2 | key, key).unwrap();
  }

  assert_eq!(
    table.insert(SEGMENT_2 | 4, 4),
    Err(Error::SegmentFull {
      segment: 2,
      capacity: 4,
    }),
  );

  // Lookups in a saturated segment terminate.
  assert_eq!(table.get(&(SEGMENT_2 | 99)), None);
  assert!(!table.remove(&(SEGMENT_2 | 99)));

  // Other segments are unaffected.
  table.insert(SEGMENT_1, 1).unwrap();
  assert_eq!(table.len(), 5);

  assert_eq!(
    table.update(SEGMENT_2 | 4, |value| *value, Some(4)),
    Err(Error::SegmentFull {
      segment: 2,
      capacity: 4,
    }),
  );
  assert_eq!(table.update(SEGMENT_2 | 4, |value| *value, None), Ok(Update::Absent));

  assert!(table.remove(&(SEGMENT_2 | 1)));
  assert_eq!(table.insert(SEGMENT_2 | 4, 4), Ok(None));
}

#[test]
fn test_update() {
  let table: TestTable = new_table(4, 16);

  assert_eq!(table.update(1, |value| value + 1, None), Ok(Update::Absent));
  assert_eq!(table.get(&1), None);

  assert_eq!(table.update(1, |value| value + 1, Some(10)), Ok(Update::Inserted));
  assert_eq!(table.get(&1), Some(10));

  assert_eq!(table.update(1, |value| value + 1, Some(10)), Ok(Update::Applied));
  assert_eq!(table.update(1, |value| value * 2, None), Ok(Update::Applied));
  assert_eq!(table.get(&1), Some(22));
  assert_eq!(table.len(), 1);
}

#[test]
fn test_with() {
  let table: Table<u64, String, DefaultHashBuilder> = new_table(4, 16);

  table.insert(1, "hello".to_string()).unwrap();

  assert_eq!(table.with(&1, String::len), Some(5));
  assert_eq!(table.with(&2, String::len), None);
}

#[test]
fn test_borrowed_keys() {
  let table: Table<String, u32, DefaultHashBuilder> = Table::new(shape(4, 16), DefaultHashBuilder::new(0));

  table.insert("alpha".to_string(), 1).unwrap();

  assert_eq!(table.get("alpha"), Some(1));
  assert!(table.contains("alpha"));
  assert_eq!(table.segment_of("alpha"), table.segment_of(&"alpha".to_string()));
  assert!(table.remove("alpha"));
  assert!(!table.contains("alpha"));
}

#[test]
fn test_len_tracks_insertions_and_removals() {
  let table: TestTable = new_table(4, 64);

  for key in 0..32 {
    table.insert(key, 0).unwrap();
    assert_eq!(table.len() as u64, key + 1);
  }

  // Overwrites do not change the count.
  table.insert(0, 1).unwrap();
  assert_eq!(table.len(), 32);

  for key in 0..32 {
    assert!(table.remove(&key));
    assert_eq!(table.len() as u64, 31 - key);
  }

  assert!(table.is_empty());
}

#[test]
fn test_segment_lens_sum_to_len() {
  let table: TestTable = new_table(8, 128);

  for key in 0..500 {
    table.insert(key, key).unwrap();
  }

  let total: usize = (0..8).filter_map(|index| table.segment_len(index)).sum();

  assert_eq!(total, table.len());
}

#[test]
fn test_each_shape_fill_and_drain() {
  each_shape!(shape => {
    let table: TestTable = Table::new(shape, DefaultHashBuilder::new(0));
    let mut stored: Vec<u64> = Vec::new();

    for key in 0..shape.total() as u64 {
      match table.insert(key, key) {
        Ok(None) => stored.push(key),
        Ok(Some(_)) => panic!("fresh key {key} reported an existing value - {shape:?}"),
        Err(Error::SegmentFull { segment, capacity }) => {
          assert_eq!(capacity, shape.capacity());
          assert_eq!(table.segment_len(segment), Some(capacity), "{shape:?}");
        }
        Err(error) => panic!("unexpected error {error} - {shape:?}"),
      }
    }

    assert_eq!(table.len(), stored.len(), "{shape:?}");

    for key in &stored {
      assert_eq!(table.get(key), Some(*key), "{shape:?}");
    }

    for key in &stored {
      assert!(table.remove(key), "{shape:?}");
    }

    assert!(table.is_empty(), "{shape:?}");
  });
}

#[test]
fn test_segments_lock_independently() {
  let table: IdentityTable = new_identity(4, 16);

  thread::scope(|scope| {
    let guard = table.segment(0).lock_exclusive();

    // A write to another segment completes while segment 0 is held.
    let (tx, rx): (mpsc::Sender<()>, Receiver<()>) = mpsc::channel();
    let table_ref: &IdentityTable = &table;

    scope.spawn(move || {
      table_ref.insert(SEGMENT_1, 1).unwrap();
      tx.send(()).unwrap();
    });

    assert_eq!(rx.recv_timeout(Duration::from_secs(10)), Ok(()));

    // A read of segment 0 waits for the exclusive holder.
    let (tx, rx): (mpsc::Sender<Option<u64>>, Receiver<Option<u64>>) = mpsc::channel();

    scope.spawn(move || {
      tx.send(table_ref.get(&0)).unwrap();
    });

    assert_eq!(rx.recv_timeout(Duration::from_millis(50)), Err(RecvTimeoutError::Timeout));

    drop(guard);

    assert_eq!(rx.recv_timeout(Duration::from_secs(10)), Ok(None));
  });
}

#[test]
fn test_public_wrapper() {
  let table: SegTab<u64, u64> = SegTab::default();

  assert_eq!(table.segment_count(), 8);
  assert_eq!(table.segment_capacity(), 128);
  assert_eq!(table.capacity(), 1024);

  table.insert(1, 1).unwrap();

  assert!(table.contains_key(&1));
  assert_eq!(table.segment_len(table.segment_of(&1)), Some(1));
}

#[test]
fn test_debug() {
  let table: IdentityTable<&str> = new_identity(1, 4);

  table.insert(1, "one").unwrap();

  assert_eq!(format!("{table:?}"), r#"{1: "one"}"#);

  let public: SegTab<u64, &str, Identity> = SegTab::with_hasher(1, 4, Identity::default()).unwrap();

  public.insert(2, "two").unwrap();

  let debug: String = format!("{public:?}");

  assert!(debug.starts_with("SegTab { shape: Shape {"));
  assert!(debug.ends_with(r#"entries: {2: "two"} }"#));
}

#[test]
fn test_drop() {
  static COUNT: AtomicUsize = AtomicUsize::new(0);

  struct DropMe;

  impl DropMe {
    fn new() -> Self {
      COUNT.fetch_add(1, Ordering::Relaxed);
      Self
    }
  }

  impl Drop for DropMe {
    fn drop(&mut self) {
      COUNT.fetch_sub(1, Ordering::Relaxed);
    }
  }

  let table: TestTable<DropMe> = new_table(4, 16);

  for key in 0..8 {
    assert!(table.insert(key, DropMe::new()).is_ok());
  }

  assert_eq!(COUNT.load(Ordering::Relaxed), 8);

  // Overwrite drops the previous value once the caller lets go of it.
  drop(table.insert(0, DropMe::new()));
  assert_eq!(COUNT.load(Ordering::Relaxed), 8);

  assert!(table.remove(&1));
  assert_eq!(COUNT.load(Ordering::Relaxed), 7);

  assert_eq!(table.update(2, |_| DropMe::new(), None), Ok(Update::Applied));
  assert_eq!(COUNT.load(Ordering::Relaxed), 7);

  // An unused insert value is dropped when the key already exists.
  assert_eq!(table.update(2, |_| DropMe::new(), Some(DropMe::new())), Ok(Update::Applied));
  assert_eq!(COUNT.load(Ordering::Relaxed), 7);

  drop(table);
  assert_eq!(COUNT.load(Ordering::Relaxed), 0);
}
