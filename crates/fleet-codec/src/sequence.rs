//! Per-robot monotonic header ids and process-wide unique action ids
//! (spec §4.2, §5). The allocator never fails; callers treat it as
//! infallible.

use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::RwLock;
use rand::RngCore;

/// `serial -> next header id` map guarded by a read/write mutex: readers
/// (peek) take a shared lock, the increment path takes an exclusive lock
/// only for the map entry it touches (spec §5's `headerIDMap`).
#[derive(Debug, Default)]
pub struct SequenceAllocator {
    header_ids: RwLock<HashMap<String, i64>>,
}

impl SequenceAllocator {
    pub fn new() -> Self {
        SequenceAllocator {
            header_ids: RwLock::new(HashMap::new()),
        }
    }

    /// Allocates the next header id for `serial`, starting at 1. Strictly
    /// increasing across concurrent callers for the same serial; never
    /// reused within the process lifetime; resets to 1 on restart (spec
    /// §4.2 — intentional, downstream robots tolerate it).
    pub fn next_header_id(&self, serial: &str) -> i64 {
        let mut map = self.header_ids.write();
        let next = map.get(serial).copied().unwrap_or(0) + 1;
        map.insert(serial.to_string(), next);
        next
    }

    /// Current header id for `serial` without allocating, or `None` if
    /// nothing has been allocated yet. Exposed for tests and diagnostics.
    pub fn peek_header_id(&self, serial: &str) -> Option<i64> {
        self.header_ids.read().get(serial).copied()
    }

    /// Generates a globally-unique action id: 128 random bits hex-encoded,
    /// suffixed with the current unix-millisecond timestamp.
    pub fn next_action_id(&self) -> String {
        Self::generate_action_id()
    }

    fn generate_action_id() -> String {
        let mut bytes = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut bytes);
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system clock before unix epoch")
            .as_millis();
        format!("{}_{millis}", hex::encode(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn header_ids_start_at_one_and_increment_per_serial() {
        let alloc = SequenceAllocator::new();
        assert_eq!(alloc.next_header_id("r1"), 1);
        assert_eq!(alloc.next_header_id("r1"), 2);
        assert_eq!(alloc.next_header_id("r2"), 1);
        assert_eq!(alloc.next_header_id("r1"), 3);
    }

    #[test]
    fn header_ids_are_strictly_increasing_under_concurrency() {
        let alloc = Arc::new(SequenceAllocator::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let alloc = Arc::clone(&alloc);
            handles.push(thread::spawn(move || {
                (0..50).map(|_| alloc.next_header_id("r1")).collect::<Vec<_>>()
            }));
        }
        let mut all: Vec<i64> = handles.into_iter().flat_map(|h| h.join().unwrap()).collect();
        all.sort_unstable();
        let expected: Vec<i64> = (1..=400).collect();
        assert_eq!(all, expected, "every allocated id must be unique and the full run a contiguous 1..=400");
    }

    #[test]
    fn action_ids_are_unique_and_well_formed() {
        let alloc = SequenceAllocator::new();
        let a = alloc.next_action_id();
        let b = alloc.next_action_id();
        assert_ne!(a, b);
        let (hex_part, millis_part) = a.split_once('_').expect("action id must contain a separator");
        assert_eq!(hex_part.len(), 32);
        assert!(millis_part.chars().all(|c| c.is_ascii_digit()));
    }
}
