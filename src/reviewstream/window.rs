//! Sliding window store
//!
//! Append-only, time-ordered buffer of events shared between the ingest
//! adapter (writer) and the snapshot scheduler (evictor/reader). A single
//! mutation lock covers append, eviction, and snapshot, so readers never
//! observe a partially evicted buffer.
//!
//! Events are inserted at the tail in arrival order. Arrival order is
//! monotonic per partition but may interleave slightly out of time order
//! across partitions when they move faster than the poll granularity.
//! Eviction therefore keys off each event's own timestamp while still
//! scanning only from the head; this tolerated local disorder is an
//! accepted approximation, not a full resort.

use crate::reviewstream::error::WindowOverflow;
use crate::reviewstream::model::Event;
use chrono::{DateTime, Utc};
use log::warn;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

/// Counters describing the current state of the window buffer.
#[derive(Debug, Clone, Default)]
pub struct WindowStats {
    /// Events currently buffered.
    pub len: usize,
    /// Events appended over the store's lifetime.
    pub appended_total: u64,
    /// Events removed because their timestamp aged past the horizon.
    pub evicted_total: u64,
    /// Events forcibly dropped by the capacity safety valve.
    pub overflow_dropped_total: u64,
}

struct WindowState {
    events: VecDeque<Event>,
    appended_total: u64,
    evicted_total: u64,
    overflow_dropped_total: u64,
    /// Set while the buffer sits at the cap, so the overflow warning fires
    /// once per streak instead of once per append.
    overflow_warned: bool,
}

/// Time-bounded buffer of ingested events.
pub struct SlidingWindowStore {
    retention_horizon: Duration,
    cap: Option<usize>,
    state: Mutex<WindowState>,
}

impl SlidingWindowStore {
    pub fn new(retention_horizon: Duration) -> Self {
        Self::with_cap(retention_horizon, None)
    }

    /// Create a store with a capacity safety valve. When eviction falls
    /// behind appends and the buffer reaches `cap`, the oldest entries are
    /// forcibly dropped with a one-time warning per overflow streak.
    pub fn with_cap(retention_horizon: Duration, cap: Option<usize>) -> Self {
        Self {
            retention_horizon,
            cap,
            state: Mutex::new(WindowState {
                events: VecDeque::new(),
                appended_total: 0,
                evicted_total: 0,
                overflow_dropped_total: 0,
                overflow_warned: false,
            }),
        }
    }

    /// O(1) insert at the tail. Never blocks on window pressure; growth is
    /// bounded only by eviction and the optional capacity cap.
    pub fn append(&self, event: Event) {
        let mut state = self.lock_state();
        state.events.push_back(event);
        state.appended_total += 1;

        if let Some(cap) = self.cap {
            let mut dropped = 0usize;
            while state.events.len() > cap {
                state.events.pop_front();
                dropped += 1;
            }
            if dropped > 0 {
                state.overflow_dropped_total += dropped as u64;
                if !state.overflow_warned {
                    state.overflow_warned = true;
                    warn!("{}", WindowOverflow { dropped, cap });
                }
            } else if state.events.len() < cap {
                state.overflow_warned = false;
            }
        }
    }

    /// Remove expired events from the head while the head's own timestamp
    /// is older than the retention horizon. Returns the number evicted.
    pub fn evict_expired(&self, now: DateTime<Utc>) -> usize {
        let mut state = self.lock_state();
        let evicted = Self::evict_locked(&mut state, now, self.retention_horizon);
        if evicted > 0 {
            state.overflow_warned = false;
        }
        evicted
    }

    /// Evict, then return a stable copy of the surviving events for the
    /// aggregator to fold over without observing concurrent mutation.
    pub fn snapshot_view(&self, now: DateTime<Utc>) -> Vec<Event> {
        let mut state = self.lock_state();
        Self::evict_locked(&mut state, now, self.retention_horizon);
        state.events.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock_state().events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock_state().events.is_empty()
    }

    pub fn stats(&self) -> WindowStats {
        let state = self.lock_state();
        WindowStats {
            len: state.events.len(),
            appended_total: state.appended_total,
            evicted_total: state.evicted_total,
            overflow_dropped_total: state.overflow_dropped_total,
        }
    }

    fn evict_locked(state: &mut WindowState, now: DateTime<Utc>, horizon: Duration) -> usize {
        let mut evicted = 0usize;
        while let Some(head) = state.events.front() {
            if Self::is_expired(head.timestamp, now, horizon) {
                state.events.pop_front();
                evicted += 1;
            } else {
                break;
            }
        }
        state.evicted_total += evicted as u64;
        evicted
    }

    fn is_expired(timestamp: DateTime<Utc>, now: DateTime<Utc>, horizon: Duration) -> bool {
        // Events timestamped in the future (clock skew) are never expired.
        now.signed_duration_since(timestamp)
            .to_std()
            .map(|age| age > horizon)
            .unwrap_or(false)
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, WindowState> {
        // A poisoned lock only means a panicking writer; the buffer itself
        // is still structurally valid, so recover the guard.
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
