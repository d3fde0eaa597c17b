//! Per-client sequence numbers for outbound frames.

use std::sync::atomic::{AtomicU8, Ordering};

/// A monotonically increasing, wrapping counter for the header sequence byte.
///
/// Each [`crate::Client`] owns one, so several clients in one process never
/// share or contend on the counter. Replies echo the sequence number, but
/// correlation is done by device identifier; the sequence is informational.
///
/// # Examples
///
/// ```
/// use lifx_lights_rs::SequenceGenerator;
///
/// let sequence = SequenceGenerator::new();
/// assert_eq!(sequence.next(), 0);
/// assert_eq!(sequence.next(), 1);
/// assert_eq!(sequence.current(), 2);
/// ```
#[derive(Debug, Default)]
pub struct SequenceGenerator {
    inner: AtomicU8,
}

impl SequenceGenerator {
    pub fn new() -> Self {
        Self {
            inner: AtomicU8::new(0),
        }
    }

    /// Returns the next sequence number, wrapping from 255 back to 0.
    pub fn next(&self) -> u8 {
        // Only uniqueness matters here, no memory is published through it.
        self.inner.fetch_add(1, Ordering::Relaxed)
    }

    /// Returns the value the next call to [`next`](Self::next) will hand out.
    pub fn current(&self) -> u8 {
        self.inner.load(Ordering::Relaxed)
    }
}
