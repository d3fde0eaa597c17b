//! Frame history tracking for debugging and diagnostics.

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::codec::{Frame, MessageKind};

/// What happened to a recorded datagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Sent,
    Received,
    /// Received but not decodable; discarded.
    Dropped,
}

/// A recorded datagram in the history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub direction: Direction,
    /// `None` for dropped datagrams.
    pub kind: Option<MessageKind>,
    pub sequence: Option<u8>,
    pub peer: SocketAddr,
    /// Seconds since history creation
    pub timestamp: f64,
}

/// Tracks recent frames for debugging.
#[derive(Debug, Clone)]
pub struct MessageHistory {
    entries: VecDeque<HistoryEntry>,
    sent: usize,
    received: usize,
    dropped: usize,
    last_error: Option<String>,
    start_time: Instant,
    max_entries: usize,
}

impl Default for MessageHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageHistory {
    pub const DEFAULT_MAX_ENTRIES: usize = 100;

    pub fn new() -> Self {
        Self::with_max_entries(Self::DEFAULT_MAX_ENTRIES)
    }

    pub fn with_max_entries(max_entries: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            sent: 0,
            received: 0,
            dropped: 0,
            last_error: None,
            start_time: Instant::now(),
            max_entries,
        }
    }

    pub fn record_sent(&mut self, frame: &Frame, peer: SocketAddr) {
        self.sent += 1;
        self.push(Direction::Sent, Some(frame), peer);
    }

    pub fn record_received(&mut self, frame: &Frame, peer: SocketAddr) {
        self.received += 1;
        self.push(Direction::Received, Some(frame), peer);
    }

    pub fn record_dropped(&mut self, peer: SocketAddr) {
        self.dropped += 1;
        self.push(Direction::Dropped, None, peer);
    }

    pub fn record_error(&mut self, error: &str) {
        self.last_error = Some(error.to_string());
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.sent = 0;
        self.received = 0;
        self.dropped = 0;
        self.last_error = None;
    }

    pub fn summary(&self) -> HistorySummary {
        HistorySummary {
            sent_count: self.sent,
            received_count: self.received,
            dropped_count: self.dropped,
            total_entries: self.entries.len(),
            last_error: self.last_error.clone(),
        }
    }

    fn push(&mut self, direction: Direction, frame: Option<&Frame>, peer: SocketAddr) {
        if self.max_entries == 0 {
            return;
        }

        self.entries.push_back(HistoryEntry {
            direction,
            kind: frame.map(|f| f.message.kind()),
            sequence: frame.map(|f| f.header.sequence),
            peer,
            timestamp: self.start_time.elapsed().as_secs_f64(),
        });

        while self.entries.len() > self.max_entries {
            self.entries.pop_front();
        }
    }
}

/// Summary of message history for diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistorySummary {
    pub sent_count: usize,
    pub received_count: usize,
    pub dropped_count: usize,
    pub total_entries: usize,
    pub last_error: Option<String>,
}
