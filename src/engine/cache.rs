// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Memoized chord search.
//!
//! Entries are partitioned by copedent id and keyed by the copedent's
//! fingerprint plus the query, so editing a copedent can never serve a
//! stale result. Clearing a copedent's partition frees the memory.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, trace};

use super::enumerator::find_chord_voicings;
use super::{CancelToken, ChordQuery, EngineError, IntervalSet, Voicing};
use crate::copedent::Copedent;
use crate::music::Note;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    fingerprint: u64,
    root: Note,
    intervals: IntervalSet,
    results_per_fret: usize,
    max_fret: u8,
}

/// Hit and miss counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

#[derive(Debug, Default)]
struct Inner {
    partitions: HashMap<String, HashMap<CacheKey, Arc<[Voicing]>>>,
    hits: u64,
    misses: u64,
}

/// Thread-safe cache in front of [`find_chord_voicings`]
#[derive(Debug, Default)]
pub struct VoicingCache {
    inner: Mutex<Inner>,
}

impl VoicingCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // entries are never mutated after insert
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Same results as [`find_chord_voicings`], computed at most once per key.
    ///
    /// The search runs without holding the lock. Errors are not cached.
    pub fn find_chord_voicings(
        &self,
        copedent: &Copedent,
        query: &ChordQuery,
        max_fret: u8,
        cancel: Option<&CancelToken>,
    ) -> Result<Arc<[Voicing]>, EngineError> {
        let key = CacheKey {
            fingerprint: copedent.fingerprint(),
            root: query.root,
            intervals: query.intervals,
            results_per_fret: query.results_per_fret,
            max_fret,
        };

        {
            let mut inner = self.lock();
            let hit = inner
                .partitions
                .get(&copedent.id)
                .and_then(|p| p.get(&key))
                .cloned();
            if let Some(voicings) = hit {
                inner.hits += 1;
                trace!(copedent = %copedent.id, root = %query.root, "voicing cache hit");
                return Ok(voicings);
            }
            inner.misses += 1;
        }

        let voicings: Arc<[Voicing]> =
            find_chord_voicings(copedent, query, max_fret, cancel)?.into();
        let mut inner = self.lock();
        let entry = inner
            .partitions
            .entry(copedent.id.clone())
            .or_default()
            .entry(key)
            .or_insert(voicings);
        Ok(Arc::clone(entry))
    }

    /// Drop every entry for one copedent
    pub fn clear_for_copedent(&self, copedent_id: &str) {
        if let Some(partition) = self.lock().partitions.remove(copedent_id) {
            debug!(copedent = copedent_id, entries = partition.len(), "cleared voicing cache");
        }
    }

    /// Drop everything and reset the counters
    pub fn clear(&self) {
        let mut inner = self.lock();
        *inner = Inner::default();
    }

    pub fn len(&self) -> usize {
        self.lock().partitions.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.lock();
        CacheStats {
            hits: inner.hits,
            misses: inner.misses,
            entries: inner.partitions.values().map(HashMap::len).sum(),
        }
    }
}
