//! Frequency aggregation
//!
//! The aggregator is a pure fold: one pass over a collection of events
//! increments a word counter for every token and a sentiment counter for
//! every event label. Counter addition is commutative and associative,
//! which is what makes partitioned batch runs safe to merge in any order.
//!
//! [`FrequencyCounter`] additionally remembers the order in which keys were
//! first seen, so the top-N reducer can break count ties deterministically.

use crate::reviewstream::model::{Event, Sentiment};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy)]
struct CounterEntry {
    count: u64,
    first_seen: u64,
}

/// Mapping from token to occurrence count, with stable first-seen ordering.
#[derive(Debug, Clone, Default)]
pub struct FrequencyCounter {
    entries: HashMap<String, CounterEntry>,
    next_seq: u64,
}

impl FrequencyCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment `key` by one.
    pub fn increment(&mut self, key: &str) {
        self.add(key, 1);
    }

    /// Increment `key` by `n`.
    pub fn add(&mut self, key: &str, n: u64) {
        if let Some(entry) = self.entries.get_mut(key) {
            entry.count += n;
        } else {
            let seq = self.next_seq;
            self.next_seq += 1;
            self.entries.insert(
                key.to_string(),
                CounterEntry {
                    count: n,
                    first_seen: seq,
                },
            );
        }
    }

    /// Key-wise sum of another counter into this one.
    ///
    /// Keys new to `self` are appended in the other counter's first-seen
    /// order, so merging the same counters produces the same tie-break
    /// ordering regardless of how the counts themselves interleave.
    pub fn merge(&mut self, other: &FrequencyCounter) {
        for (key, count) in other.entries_ordered() {
            self.add(key, count);
        }
    }

    pub fn get(&self, key: &str) -> u64 {
        self.entries.get(key).map(|e| e.count).unwrap_or(0)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all counts.
    pub fn total(&self) -> u64 {
        self.entries.values().map(|e| e.count).sum()
    }

    /// All `(key, count)` pairs in first-seen order.
    pub fn entries_ordered(&self) -> Vec<(&str, u64)> {
        let mut items: Vec<(&str, &CounterEntry)> =
            self.entries.iter().map(|(k, v)| (k.as_str(), v)).collect();
        items.sort_by_key(|(_, e)| e.first_seen);
        items.into_iter().map(|(k, e)| (k, e.count)).collect()
    }
}

impl<S: AsRef<str>> FromIterator<S> for FrequencyCounter {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut counter = FrequencyCounter::new();
        for key in iter {
            counter.increment(key.as_ref());
        }
        counter
    }
}

/// Event count per sentiment label.
#[derive(Debug, Clone, Default)]
pub struct SentimentCounts {
    counts: HashMap<Sentiment, u64>,
}

impl SentimentCounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&mut self, sentiment: Sentiment) {
        *self.counts.entry(sentiment).or_insert(0) += 1;
    }

    pub fn merge(&mut self, other: &SentimentCounts) {
        for (sentiment, count) in &other.counts {
            *self.counts.entry(*sentiment).or_insert(0) += count;
        }
    }

    pub fn get(&self, sentiment: Sentiment) -> u64 {
        self.counts.get(&sentiment).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Consume into the map form used by `WindowSnapshot`.
    pub fn into_map(self) -> HashMap<Sentiment, u64> {
        self.counts
    }
}

/// Fold a collection of events into word and sentiment counters.
///
/// Deterministic and order-independent in the counts; only the first-seen
/// tie-break ordering reflects iteration order.
pub fn aggregate(events: &[Event]) -> (FrequencyCounter, SentimentCounts) {
    let mut words = FrequencyCounter::new();
    let mut sentiments = SentimentCounts::new();
    for event in events {
        for token in &event.tokens {
            words.increment(token);
        }
        sentiments.increment(event.sentiment);
    }
    (words, sentiments)
}
