// Record Storage Abstraction
//
// Defines the storage contract underneath the append log.
// The log owns locking and change publication; a store only
// has to keep records in order.

use super::Record;

/// Storage backend for the append log.
///
/// Properties required from implementations:
/// - Append-only
/// - Ordered
/// - Dense (no index gaps)
///
/// Implementations MUST NOT:
/// - Reorder records
/// - Mutate or drop existing records
pub trait RecordStore: Send + Sync {
    /// Push a record at the end and return the new length.
    fn push(&mut self, record: Record) -> u64;

    /// Read the record at `index`, or `None` if it does not exist yet.
    fn get(&self, index: u64) -> Option<Record>;

    /// Number of records stored.
    fn len(&self) -> u64;

    /// Copy out every record from `start` to the end.
    fn read_from(&self, start: u64) -> Vec<Record> {
        (start..self.len()).filter_map(|index| self.get(index)).collect()
    }
}

/// Unbounded in-memory store. Retains every record for the life of the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Vec<Record>,
}

impl RecordStore for MemoryStore {
    fn push(&mut self, record: Record) -> u64 {
        self.records.push(record);
        self.records.len() as u64
    }

    fn get(&self, index: u64) -> Option<Record> {
        let index = usize::try_from(index).ok()?;
        self.records.get(index).copied()
    }

    fn len(&self) -> u64 {
        self.records.len() as u64
    }

    fn read_from(&self, start: u64) -> Vec<Record> {
        usize::try_from(start)
            .ok()
            .and_then(|start| self.records.get(start..))
            .map(<[Record]>::to_vec)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_returns_new_length() {
        let mut store = MemoryStore::default();
        assert_eq!(store.push(Record(7)), 1);
        assert_eq!(store.push(Record(8)), 2);
        assert_eq!(store.get(1), Some(Record(8)));
        assert_eq!(store.get(2), None);
    }

    #[test]
    fn read_from_past_end_is_empty() {
        let mut store = MemoryStore::default();
        store.push(Record(1));
        assert_eq!(store.read_from(0), vec![Record(1)]);
        assert!(store.read_from(1).is_empty());
        assert!(store.read_from(u64::MAX).is_empty());
    }
}
