//! Cross-channel duplicate suppression.
//!
//! The 2× oversampled channelizer makes adjacent channels overlap, so a
//! transmission near a channel boundary is decoded twice, once per neighbor.
//! This module suppresses the second copy: decodes are fingerprinted, and a
//! small time-windowed cache drops a repeat of a recent fingerprint when it
//! arrives from a *different* channel frequency. A repeat from the *same*
//! channel is a legitimate retransmission and passes.
//!
//! # Fingerprint
//!
//! FNV-1a over the event's ordered key/value pairs. Keys and string values
//! hash as their UTF-8 bytes; integer and double values hash as their
//! little-endian byte images regardless of host endianness, so fingerprints
//! are portable across builds and architectures; arrays hash as their
//! element count and element-kind tag.
//!
//! The cache is single-writer: exactly one logical actor (the event
//! forwarding stage of the driver) calls [`DedupCache::check`]. Pipelines
//! that fan channels out to worker threads must serialize this call site.

use crate::event::{DecodeEvent, Value};

/// Time window within which a cross-channel repeat is a duplicate.
pub const DEDUP_WINDOW_US: i64 = 500_000;

/// Number of cache slots.
pub const DEDUP_CACHE_CAPACITY: usize = 32;

/// Frequencies closer than this are the same channel.
pub const SAME_CHANNEL_EPSILON_HZ: f32 = 1_000.0;

const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// FNV-1a fingerprint of a decode event (see module docs for the byte
/// representation of each value type).
pub fn fingerprint(event: &DecodeEvent) -> u32 {
    let mut hash = FNV_OFFSET_BASIS;
    for (key, value) in event.fields() {
        hash = fnv_bytes(hash, key.as_bytes());
        match value {
            Value::Int(v) => hash = fnv_bytes(hash, &v.to_le_bytes()),
            Value::Double(v) => hash = fnv_bytes(hash, &v.to_bits().to_le_bytes()),
            Value::Str(v) => hash = fnv_bytes(hash, v.as_bytes()),
            Value::Array { kind, count } => {
                hash = fnv_bytes(hash, &count.to_le_bytes());
                hash = fnv_bytes(hash, &[kind.tag()]);
            }
        }
    }
    hash
}

fn fnv_bytes(mut hash: u32, bytes: &[u8]) -> u32 {
    for &b in bytes {
        hash ^= u32::from(b);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Outcome of a dedup check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// First sighting (or same-channel repeat): deliver the event.
    Forward,
    /// Cross-channel duplicate of a recent event: drop it.
    Suppress,
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    fingerprint: u32,
    freq_hz: f32,
    timestamp_us: i64,
}

/// Fixed-capacity FIFO fingerprint cache with a time window.
#[derive(Debug, Default)]
pub struct DedupCache {
    entries: Vec<Entry>,
    /// Next write slot modulo [`DEDUP_CACHE_CAPACITY`], once full.
    head: usize,
}

impl DedupCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self {
            entries: Vec::with_capacity(DEDUP_CACHE_CAPACITY),
            head: 0,
        }
    }

    /// Check an incoming `(fingerprint, channel frequency)` pair at time
    /// `now_us` (microseconds, any monotonic epoch).
    ///
    /// Scans the cache for a matching fingerprint within
    /// [`DEDUP_WINDOW_US`]: a match from a different channel (frequency gap
    /// above [`SAME_CHANNEL_EPSILON_HZ`]) suppresses the event without
    /// recording it; a same-channel match is ignored and scanning continues.
    /// If nothing suppresses, the event is recorded (overwriting the oldest
    /// slot once the cache is full) and forwarded.
    pub fn check(&mut self, fingerprint: u32, freq_hz: f32, now_us: i64) -> Decision {
        for entry in &self.entries {
            if entry.fingerprint == fingerprint
                && now_us - entry.timestamp_us <= DEDUP_WINDOW_US
                && (freq_hz - entry.freq_hz).abs() > SAME_CHANNEL_EPSILON_HZ
            {
                tracing::debug!(
                    fingerprint,
                    freq_hz = f64::from(freq_hz),
                    entry_freq_hz = f64::from(entry.freq_hz),
                    age_us = now_us - entry.timestamp_us,
                    "suppressed cross-channel duplicate"
                );
                return Decision::Suppress;
            }
        }

        let entry = Entry {
            fingerprint,
            freq_hz,
            timestamp_us: now_us,
        };
        if self.entries.len() < DEDUP_CACHE_CAPACITY {
            self.entries.push(entry);
        } else {
            self.entries[self.head] = entry;
        }
        self.head = (self.head + 1) % DEDUP_CACHE_CAPACITY;
        Decision::Forward
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no event has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
