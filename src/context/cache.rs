// Copyright 2024 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Anti-replay cache for broadcast credentials.
//!
//! Verifying a broadcast credential is a one-shot operation, yet a transfer
//! issues many RPCs bearing the same credential. The first block pays the
//! full cryptographic cost and seeds a `(expiration, signature-hash)` record;
//! later blocks are admitted on an exact match. Records are purged lazily
//! while scanning, so the cache stays bounded as long as lookups occur.

use std::sync::{Mutex, MutexGuard, PoisonError};

use log::debug;

#[derive(Debug)]
pub(crate) struct ReplayEntry {
    expire: u64,
    hash: u32,
}

#[derive(Debug, Default)]
pub(crate) struct ReplayCache {
    entries: Mutex<Vec<ReplayEntry>>,
}

impl ReplayCache {
    /// Records an accepted first block.
    pub(crate) fn seed(&self, expire: u64, hash: u32) {
        self.lock().push(ReplayEntry { expire, hash });
    }

    /// Returns whether a matching record exists, purging every record that
    /// expired at or before `now` along the way.
    pub(crate) fn admit(&self, expire: u64, hash: u32, now: u64) -> bool {
        let mut entries = self.lock();

        let before = entries.len();
        entries.retain(|entry| entry.expire > now);
        if entries.len() < before {
            debug!(
                "purged {} expired broadcast cache records",
                before - entries.len()
            );
        }

        entries.iter().any(|entry| entry.expire == expire && entry.hash == hash)
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<ReplayEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Weak digest keying the replay cache: the big-endian 16-bit pairs of the
/// signature, summed with wraparound. Collisions only widen replay tolerance
/// within one expiration instant; they grant no authority.
pub(crate) fn signature_hash(bytes: &[u8]) -> u32 {
    let mut sum = 0u32;
    for pair in bytes.chunks(2) {
        let hi = u32::from(pair[0]) << 8;
        let lo = pair.get(1).copied().map_or(0, u32::from);
        sum = sum.wrapping_add(hi | lo);
    }

    sum
}
