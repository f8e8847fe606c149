// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fixed-capacity circular byte buffer for raw PTY output, with
//! snapshot-and-subscribe semantics for live readers (spec.md §4.1).
//!
//! Two locks, as required by spec.md §5: `inner` guards the circular
//! buffer itself (held across `write` and the snapshot half of
//! `snapshot_and_subscribe`), `readers` guards the reader registry so
//! subscribe/unsubscribe never blocks on a write. `snapshot_and_subscribe`
//! takes `inner` first and holds it while registering the new reader,
//! which is what makes "no byte is lost between the snapshot and the
//! channel's first delivery" true: no `write` can run between the
//! snapshot being taken and the reader being registered.

use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Default ring capacity: 1 MiB per instance (spec.md §4.1).
pub const DEFAULT_CAPACITY: usize = 1024 * 1024;

/// Bounded channel depth for a live subscriber.
const READER_CHANNEL_DEPTH: usize = 100;

struct Inner {
    buf: Vec<u8>,
    capacity: usize,
    write_pos: usize,
    wrapped: bool,
}

impl Inner {
    fn len(&self) -> usize {
        if self.wrapped {
            self.capacity
        } else {
            self.write_pos
        }
    }

    /// Chronological snapshot: `[0..w)` if never wrapped, else
    /// `[w..cap) ++ [0..w)`.
    fn snapshot(&self) -> Vec<u8> {
        if !self.wrapped {
            self.buf[..self.write_pos].to_vec()
        } else {
            let mut out = Vec::with_capacity(self.capacity);
            out.extend_from_slice(&self.buf[self.write_pos..]);
            out.extend_from_slice(&self.buf[..self.write_pos]);
            out
        }
    }
}

/// Opaque handle for a registered live reader.
pub type ReaderId = u64;

/// Fixed-capacity circular byte buffer that is both a sink (always
/// succeeds, never blocks the producer) and a fan-out source for zero,
/// one, or many live readers.
pub struct RingBuffer {
    inner: Mutex<Inner>,
    readers: Mutex<HashMap<ReaderId, mpsc::Sender<Bytes>>>,
    next_reader_id: AtomicU64,
}

impl RingBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                buf: vec![0u8; capacity.max(1)],
                capacity: capacity.max(1),
                write_pos: 0,
                wrapped: false,
            }),
            readers: Mutex::new(HashMap::new()),
            next_reader_id: AtomicU64::new(0),
        }
    }

    pub fn with_default_capacity() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }

    /// Append bytes; when full, wrap, overwriting oldest. Always writes
    /// the full length. Notifies every subscribed reader with a copy of
    /// the just-written slice; a reader whose channel is full has its
    /// notification dropped (the writer never blocks on a slow reader).
    pub fn write(&self, data: &[u8]) {
        if data.is_empty() {
            return;
        }
        let mut inner = self.inner.lock();
        let capacity = inner.capacity;
        for chunk in data.chunks(capacity) {
            let start = inner.write_pos;
            let end = start + chunk.len();
            if end <= capacity {
                inner.buf[start..end].copy_from_slice(chunk);
            } else {
                let first = capacity - start;
                inner.buf[start..capacity].copy_from_slice(&chunk[..first]);
                inner.buf[..chunk.len() - first].copy_from_slice(&chunk[first..]);
            }
            if end >= capacity {
                inner.wrapped = true;
            }
            inner.write_pos = end % capacity;
        }

        // Notify while still holding `inner`, so a concurrent
        // `snapshot_and_subscribe` can never land between this write and
        // its delivery (that would duplicate the bytes into both the
        // snapshot and the new reader's channel).
        let bytes = Bytes::copy_from_slice(data);
        let readers = self.readers.lock();
        for tx in readers.values() {
            let _ = tx.try_send(bytes.clone());
        }
        drop(readers);
        drop(inner);
    }

    /// A fresh copy of the contents in chronological order.
    pub fn bytes(&self) -> Vec<u8> {
        self.inner.lock().snapshot()
    }

    /// Under a single exclusive lock: snapshot, then register a new
    /// reader, then release. Atomic with respect to `write` — every byte
    /// appears in exactly one of the snapshot or the live channel.
    pub fn snapshot_and_subscribe(&self) -> (Vec<u8>, ReaderId, mpsc::Receiver<Bytes>) {
        let inner = self.inner.lock();
        let snapshot = inner.snapshot();
        let (tx, rx) = mpsc::channel(READER_CHANNEL_DEPTH);
        let id = self.next_reader_id.fetch_add(1, Ordering::Relaxed);
        self.readers.lock().insert(id, tx);
        drop(inner);
        (snapshot, id, rx)
    }

    /// Close and remove a reader's channel. Idempotent.
    pub fn remove_reader(&self, id: ReaderId) {
        self.readers.lock().remove(&id);
    }

    /// Reset the write pointer and wrapped flag. Does not affect
    /// subscribers.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.write_pos = 0;
        inner.wrapped = false;
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn cap(&self) -> usize {
        self.inner.lock().capacity
    }
}

/// Shared handle, cheap to clone and pass around an instance's tasks.
pub type SharedRingBuffer = Arc<RingBuffer>;

#[cfg(test)]
#[path = "ring_tests.rs"]
mod tests;
