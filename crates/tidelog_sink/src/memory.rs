//! In-memory sink for testing.

use crate::error::SinkResult;
use crate::sink::LogSink;
use parking_lot::Mutex;
use std::sync::Arc;

/// An in-memory sink.
///
/// Every write is kept as a separate record, so tests can assert on record
/// boundaries and order. Clones share the same buffer: hand one clone to the
/// writer under test and keep another to inspect what arrived.
///
/// # Example
///
/// ```rust
/// use tidelog_sink::{LogSink, MemorySink};
///
/// let probe = MemorySink::new();
/// let mut sink = probe.clone();
/// sink.write(b"first").unwrap();
/// sink.write(b"second").unwrap();
/// assert_eq!(probe.records(), vec![b"first".to_vec(), b"second".to_vec()]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    records: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl MemorySink {
    /// Creates a new empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of every record written so far, in order.
    #[must_use]
    pub fn records(&self) -> Vec<Vec<u8>> {
        self.records.lock().clone()
    }

    /// Returns all records concatenated.
    #[must_use]
    pub fn data(&self) -> Vec<u8> {
        self.records.lock().concat()
    }

    /// Returns the number of records written.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    /// Returns true if nothing has been written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    /// Clears all records.
    pub fn clear(&self) {
        self.records.lock().clear();
    }
}

impl LogSink for MemorySink {
    fn write(&mut self, data: &[u8]) -> SinkResult<usize> {
        self.records.lock().push(data.to_vec());
        Ok(data.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_new_is_empty() {
        let sink = MemorySink::new();
        assert!(sink.is_empty());
        assert_eq!(sink.len(), 0);
        assert!(sink.data().is_empty());
    }

    #[test]
    fn memory_keeps_record_boundaries() {
        let mut sink = MemorySink::new();
        sink.write(b"hello").unwrap();
        sink.write(b" world").unwrap();

        assert_eq!(sink.len(), 2);
        assert_eq!(sink.records()[1], b" world");
        assert_eq!(sink.data(), b"hello world");
    }

    #[test]
    fn memory_clones_share_buffer() {
        let probe = MemorySink::new();
        let mut writer = probe.clone();
        writer.write(b"shared").unwrap();
        assert_eq!(probe.data(), b"shared");

        probe.clear();
        assert!(writer.is_empty());
    }

    #[test]
    fn memory_empty_write_is_recorded() {
        let mut sink = MemorySink::new();
        assert_eq!(sink.write(b"").unwrap(), 0);
        assert_eq!(sink.len(), 1);
    }
}
