//! Bounded message history for local introspection.

use std::collections::VecDeque;
use std::sync::Mutex;

use chrono::{DateTime, Utc};

use tradelink_protocol::Envelope;
use tradelink_protocol::constants::HISTORY_CAP;

/// One observed envelope with local receive metadata.
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub envelope: Envelope,
    pub source: String,
    pub received_at: DateTime<Utc>,
}

/// Append-only ring of every envelope the hub has observed.
///
/// Not authoritative state: entries are evicted oldest-first once the cap
/// is reached, and nothing reads them back except debugging callers.
pub struct History {
    entries: Mutex<VecDeque<HistoryEntry>>,
    cap: usize,
}

impl History {
    pub fn new() -> Self {
        Self::with_cap(HISTORY_CAP)
    }

    pub fn with_cap(cap: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::with_capacity(cap.min(64))),
            cap,
        }
    }

    /// Records one observed envelope, evicting the oldest entry at cap.
    pub fn record(&self, envelope: &Envelope) {
        let mut entries = self.entries.lock().expect("history lock poisoned");
        if entries.len() == self.cap {
            entries.pop_front();
        }
        entries.push_back(HistoryEntry {
            envelope: envelope.clone(),
            source: envelope.source.clone(),
            received_at: Utc::now(),
        });
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("history lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of the current entries, oldest first.
    pub fn snapshot(&self) -> Vec<HistoryEntry> {
        self.entries
            .lock()
            .expect("history lock poisoned")
            .iter()
            .cloned()
            .collect()
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tradelink_protocol::Body;

    #[test]
    fn records_in_order() {
        let history = History::new();
        for source in ["a", "b", "c"] {
            let mut env = Envelope::new(Body::Handshake);
            env.stamp(source);
            history.record(&env);
        }
        let snap = history.snapshot();
        assert_eq!(snap.len(), 3);
        assert_eq!(snap[0].source, "a");
        assert_eq!(snap[2].source, "c");
    }

    #[test]
    fn evicts_oldest_at_cap() {
        let history = History::with_cap(2);
        for source in ["a", "b", "c"] {
            let mut env = Envelope::new(Body::Handshake);
            env.stamp(source);
            history.record(&env);
        }
        let snap = history.snapshot();
        assert_eq!(snap.len(), 2);
        assert_eq!(snap[0].source, "b");
        assert_eq!(snap[1].source, "c");
    }
}
