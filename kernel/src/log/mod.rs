// Append Log
//
// The single shared, ordered, append-only sequence of records.
// Every reader and writer goes through this type; nothing else
// holds mutable access to the underlying storage.

mod store;

pub use store::{MemoryStore, RecordStore};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// Log length returned to a writer right after its append (1-based).
pub type Uid = u64;

/// One immutable scalar payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(pub i64);

impl From<i64> for Record {
    fn from(value: i64) -> Self {
        Record(value)
    }
}

/// Ordered, append-only record log.
///
/// Appends are serialized under a write lock, so the total order of
/// records is the completion order of `append` calls. The new length
/// is published on a watch channel inside the same critical section;
/// readers use it to wake up instead of waiting out a full poll interval.
#[derive(Debug)]
pub struct AppendLog<S: RecordStore = MemoryStore> {
    store: RwLock<S>,
    length: watch::Sender<u64>,
}

impl AppendLog<MemoryStore> {
    /// Create an empty in-memory log.
    pub fn new() -> Self {
        Self::with_store(MemoryStore::default())
    }

    /// Create an in-memory log seeded with `records`, in order.
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = Record>,
    {
        let log = Self::new();
        for record in records {
            log.append(record);
        }
        log
    }
}

impl Default for AppendLog<MemoryStore> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: RecordStore> AppendLog<S> {
    /// Wrap an existing store. Records already in it count toward the length.
    pub fn with_store(store: S) -> Self {
        let (length, _) = watch::channel(store.len());
        Self {
            store: RwLock::new(store),
            length,
        }
    }

    /// Append `record` at index `len()` and return the new length.
    pub fn append(&self, record: Record) -> Uid {
        let mut store = self.store.write();
        let uid = store.push(record);
        self.length.send_replace(uid);
        tracing::debug!(uid, record = record.0, "record appended");
        uid
    }

    /// Number of committed records.
    pub fn len(&self) -> u64 {
        self.store.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Record at `index`, or `None` when it has not been appended yet.
    ///
    /// `None` means "retry later", not a fault.
    pub fn get(&self, index: u64) -> Option<Record> {
        self.store.read().get(index)
    }

    /// Snapshot of every record from `cursor` to the current end.
    pub fn read_from(&self, cursor: u64) -> Vec<Record> {
        self.store.read().read_from(cursor)
    }

    /// Watch the log length. Changes after every append.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.length.subscribe()
    }
}
