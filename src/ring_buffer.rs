//! Bounded in-memory store for fatal log records.
//!
//! [`RingBufferLogger`] keeps the most recent fatal records with FIFO
//! eviction and a per-entry byte cap. It is a [`FatalLogger`], so it can be
//! plugged into a renderer directly, and it is cheap to clone: clones share
//! the same buffer.
//!
//! # Example
//!
//! ```rust
//! use palisade_response::ring_buffer::RingBufferLogger;
//! use palisade_response::logging::{CallerInfo, FatalLogRecord, FatalLogger};
//! use std::panic::Location;
//!
//! let logger = RingBufferLogger::new(100, 1024);
//! let record = FatalLogRecord::new(CallerInfo::at(Location::caller()), "boot failed", "disk gone");
//! logger.log_fatal(&record);
//!
//! let recent = logger.get_recent(1);
//! assert_eq!(recent[0].primary.as_ref(), "disk gone");
//! ```

use crate::logging::{FatalLogRecord, FatalLogger};
use smallvec::SmallVec;
use std::borrow::Cow;
use std::collections::VecDeque;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A stored copy of one fatal record, bounded in size.
#[derive(Clone, Debug)]
pub struct FatalEntry {
    /// Unix timestamp, seconds.
    pub timestamp: i64,
    /// `file:line`
    pub location: Arc<str>,
    pub function: Arc<str>,
    pub message: Arc<str>,
    pub primary: Arc<str>,
    pub auxiliary: Arc<[(Arc<str>, Arc<str>)]>,
    pub request_id: Option<Arc<str>>,
    pub filtered: usize,
    pub fatal_bucket: usize,
    /// Approximate stored bytes.
    pub size_bytes: usize,
}

/// Newest records at the back; the front is evicted once `limit` is reached.
struct Window {
    entries: VecDeque<FatalEntry>,
    limit: usize,
    evicted: u64,
}

impl Window {
    fn with_limit(limit: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(limit),
            limit,
            evicted: 0,
        }
    }

    fn admit(&mut self, entry: FatalEntry) {
        if self.entries.len() == self.limit {
            self.entries.pop_front();
            self.evicted += 1;
        }
        self.entries.push_back(entry);
    }

    fn newest_first(&self) -> impl Iterator<Item = &FatalEntry> {
        self.entries.iter().rev()
    }
}

/// Fatal logger with bounded memory usage.
#[derive(Clone)]
pub struct RingBufferLogger {
    window: Arc<RwLock<Window>>,
    max_entry_bytes: usize,
}

impl RingBufferLogger {
    /// Keep at most `max_entries` records of roughly `max_entry_bytes` each.
    pub fn new(max_entries: usize, max_entry_bytes: usize) -> Self {
        Self {
            window: Arc::new(RwLock::new(Window::with_limit(max_entries.max(1)))),
            max_entry_bytes,
        }
    }

    // A panic while holding the lock leaves the window consistent.
    fn view(&self) -> RwLockReadGuard<'_, Window> {
        self.window.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn edit(&self) -> RwLockWriteGuard<'_, Window> {
        self.window.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn create_entry(&self, record: &FatalLogRecord) -> FatalEntry {
        let mut budget = Budget {
            remaining: self.max_entry_bytes,
            used: 0,
        };

        let primary = budget.take(&record.primary, 512);
        let message = budget.take(&record.message, 256);
        let function = budget.take(&record.caller.function, 128);

        let mut auxiliary: SmallVec<[(Arc<str>, Arc<str>); 4]> = SmallVec::new();
        for (key, value) in &record.auxiliary {
            if !budget.reserve(key.len()) {
                break;
            }
            let value = budget.take(value, 128);
            auxiliary.push((Arc::from(key.as_ref()), value));
        }
        let request_id = record.request_id.as_deref().map(|id| budget.take(id, 64));

        FatalEntry {
            timestamp: chrono::Utc::now().timestamp(),
            location: Arc::from(format!("{}:{}", record.caller.file, record.caller.line)),
            function,
            message,
            primary,
            auxiliary: auxiliary.into_vec().into(),
            request_id,
            filtered: record.filtered,
            fatal_bucket: record.fatal_bucket,
            size_bytes: budget.used,
        }
    }

    /// Store a record, evicting the oldest when full.
    pub fn record(&self, record: &FatalLogRecord) {
        let entry = self.create_entry(record);
        self.edit().admit(entry);
    }

    /// The `count` most recent entries, newest first.
    pub fn get_recent(&self, count: usize) -> Vec<FatalEntry> {
        self.view().newest_first().take(count).cloned().collect()
    }

    /// Every entry, newest first.
    pub fn get_all(&self) -> Vec<FatalEntry> {
        self.view().newest_first().cloned().collect()
    }

    /// Entries matching `predicate`, oldest first.
    pub fn get_filtered<F>(&self, predicate: F) -> Vec<FatalEntry>
    where
        F: Fn(&FatalEntry) -> bool,
    {
        let window = self.view();
        window.entries.iter().filter(|e| predicate(e)).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.view().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Records dropped to make room since creation.
    pub fn eviction_count(&self) -> u64 {
        self.view().evicted
    }

    /// Drop every stored entry. The eviction count is kept.
    pub fn clear(&self) {
        self.edit().entries.clear();
    }

    pub fn capacity(&self) -> usize {
        self.view().limit
    }
}

impl FatalLogger for RingBufferLogger {
    fn log_fatal(&self, record: &FatalLogRecord) {
        self.record(record);
    }
}

/// Byte budget shared by the fields of one entry.
struct Budget {
    remaining: usize,
    used: usize,
}

impl Budget {
    fn take(&mut self, text: &str, cap: usize) -> Arc<str> {
        let bounded = truncate_to_bytes(text, self.remaining.min(cap));
        self.used += bounded.len();
        self.remaining = self.remaining.saturating_sub(bounded.len());
        Arc::from(bounded.as_ref())
    }

    fn reserve(&mut self, bytes: usize) -> bool {
        if self.remaining <= bytes {
            return false;
        }
        self.remaining -= bytes;
        self.used += bytes;
        true
    }
}

/// Truncate to at most `max_bytes`, respecting UTF-8 boundaries.
fn truncate_to_bytes(s: &str, max_bytes: usize) -> Cow<'_, str> {
    if s.len() <= max_bytes {
        return Cow::Borrowed(s);
    }
    let indicator = "...[TRUNC]";
    if max_bytes <= indicator.len() {
        return Cow::Borrowed(&indicator[..max_bytes]);
    }
    let mut idx = max_bytes - indicator.len();
    while idx > 0 && !s.is_char_boundary(idx) {
        idx -= 1;
    }
    if idx == 0 {
        return Cow::Borrowed(indicator);
    }
    let mut out = String::with_capacity(idx + indicator.len());
    out.push_str(&s[..idx]);
    out.push_str(indicator);
    Cow::Owned(out)
}
