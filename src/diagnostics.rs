//! Diagnostics: tracing setup plus a ring buffer of recent failures.
//!
//! Per-node failures never reach the host as errors. They are logged through
//! `tracing` and also kept here so a host can show what went wrong during the
//! last bulk operation.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

// ---------------------------------------------------------------------------
// Tracing
// ---------------------------------------------------------------------------

/// Installs the global subscriber. `RUST_LOG` wins over `fallback`; without
/// either the level is `info`. Calling twice is harmless.
pub fn init_tracing(fallback: Option<&str>) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback.unwrap_or("info")))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Info,
    Warn,
    Error,
}

/// A single recorded diagnostic.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticEntry {
    pub id: u64,
    pub timestamp_ms: i64,
    pub level: Level,
    /// Command or component that produced the entry.
    pub source: String,
    pub message: String,
}

// ---------------------------------------------------------------------------
// Ring buffer
// ---------------------------------------------------------------------------

pub const DIAGNOSTIC_CAPACITY: usize = 256;

/// Fixed-capacity circular buffer of diagnostics.
pub(crate) struct RingBuffer {
    entries: Vec<Option<DiagnosticEntry>>,
    capacity: usize,
    /// Write position (wraps around)
    write_pos: usize,
    /// Number of entries currently stored (≤ capacity)
    count: usize,
    next_id: u64,
}

impl RingBuffer {
    pub(crate) fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let mut entries = Vec::with_capacity(capacity);
        entries.resize_with(capacity, || None);
        Self {
            entries,
            capacity,
            write_pos: 0,
            count: 0,
            next_id: 1,
        }
    }

    pub(crate) fn push(&mut self, level: Level, source: &str, message: String) -> u64 {
        let id = self.next_id;
        self.next_id += 1;

        self.entries[self.write_pos] = Some(DiagnosticEntry {
            id,
            timestamp_ms: chrono::Utc::now().timestamp_millis(),
            level,
            source: source.to_string(),
            message,
        });
        self.write_pos = (self.write_pos + 1) % self.capacity;
        if self.count < self.capacity {
            self.count += 1;
        }

        id
    }

    /// Most recent `limit` entries, oldest first. `limit == 0` means all.
    pub(crate) fn get_entries(&self, limit: usize) -> Vec<DiagnosticEntry> {
        if self.count == 0 {
            return Vec::new();
        }

        let effective_limit = if limit == 0 { self.count } else { limit.min(self.count) };
        let start = if self.count < self.capacity {
            0
        } else {
            self.write_pos
        };

        let skip = self.count - effective_limit;
        (skip..self.count)
            .filter_map(|i| self.entries[(start + i) % self.capacity].clone())
            .collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.count
    }
}

/// Thread-safe diagnostic store owned by an [`Extension`](crate::Extension).
pub struct DiagnosticLog {
    buffer: Mutex<RingBuffer>,
}

impl Default for DiagnosticLog {
    fn default() -> Self {
        Self::with_capacity(DIAGNOSTIC_CAPACITY)
    }
}

impl DiagnosticLog {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Mutex::new(RingBuffer::new(capacity)),
        }
    }

    pub fn record(&self, level: Level, source: &str, message: impl Into<String>) -> u64 {
        self.buffer.lock().push(level, source, message.into())
    }

    pub fn recent(&self, limit: usize) -> Vec<DiagnosticEntry> {
        self.buffer.lock().get_entries(limit)
    }

    pub fn len(&self) -> usize {
        self.buffer.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
