//! Shared transposition table.
//!
//! A fixed-size power-of-two array of two-way buckets, lock-sharded: one
//! `parking_lot::Mutex` guards each contiguous range of buckets, so
//! worker threads contend only when they touch the same shard. A probe
//! never returns data whose key does not match the probed key.

use std::sync::atomic::{AtomicU8, Ordering};

use parking_lot::Mutex;

use crate::board::Move;

/// Relation of a stored score to the true score of the position.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Bound {
    /// Score is exact (searched with a full window).
    Exact,
    /// True score is at least the stored score (a fail-high / β-cutoff).
    Lower,
    /// True score is at most the stored score (no move raised α).
    Upper,
}

/// One stored position.
#[derive(Clone, Copy, Debug)]
struct Entry {
    key: u64,
    mv: Move,
    score: i16,
    depth: u8,
    bound: Bound,
    age: u8,
}

/// Associativity of each bucket.
const BUCKET_WAYS: usize = 2;

type Bucket = [Option<Entry>; BUCKET_WAYS];

/// Data returned by a successful probe.
#[derive(Clone, Copy, Debug)]
pub struct TtData {
    pub score: i32,
    pub depth: i32,
    pub bound: Bound,
    pub mv: Move,
}

/// Probe outcome per the table contract: a hit requires a key match at
/// sufficient depth; a key match at insufficient depth still surfaces the
/// stored move for ordering.
#[derive(Clone, Copy, Debug)]
pub enum TtProbe {
    Hit(TtData),
    Miss { mv: Move },
}

struct Shard {
    buckets: Vec<Bucket>,
    occupied: usize,
}

pub struct TranspositionTable {
    shards: Vec<Mutex<Shard>>,
    /// Total buckets - 1; bucket index = key & mask.
    bucket_mask: usize,
    /// log2 of buckets per shard, for splitting the bucket index.
    shard_shift: u32,
    age: AtomicU8,
}

impl TranspositionTable {
    /// Create a table of roughly `size_mb` megabytes.
    #[must_use]
    pub fn new(size_mb: usize) -> Self {
        let entry_size = std::mem::size_of::<Bucket>();
        let buckets = ((size_mb.max(1) * 1024 * 1024) / entry_size)
            .next_power_of_two()
            / 2;
        let buckets = buckets.max(1024);

        // Enough shards that contention is noise, but never more shards
        // than buckets.
        let num_shards = 1024.min(buckets);
        let per_shard = buckets / num_shards;
        let shard_shift = per_shard.trailing_zeros();

        let shards = (0..num_shards)
            .map(|_| {
                Mutex::new(Shard {
                    buckets: vec![[None; BUCKET_WAYS]; per_shard],
                    occupied: 0,
                })
            })
            .collect();

        TranspositionTable {
            shards,
            bucket_mask: buckets - 1,
            shard_shift,
            age: AtomicU8::new(0),
        }
    }

    /// Advance the age counter; called once per search so stale entries
    /// lose replacement priority.
    pub fn new_generation(&self) {
        self.age.fetch_add(1, Ordering::Relaxed);
    }

    /// Drop every entry and reset the age counter (ucinewgame).
    pub fn clear(&self) {
        for shard in &self.shards {
            let mut guard = shard.lock();
            for bucket in &mut guard.buckets {
                *bucket = [None; BUCKET_WAYS];
            }
            guard.occupied = 0;
        }
        self.age.store(0, Ordering::Relaxed);
    }

    #[inline]
    fn locate(&self, key: u64) -> (usize, usize) {
        let bucket = (key as usize) & self.bucket_mask;
        (bucket >> self.shard_shift, bucket & ((1 << self.shard_shift) - 1))
    }

    /// Look up `key`, requiring at least `depth` to count as a hit.
    #[must_use]
    pub fn probe(&self, key: u64, depth: i32) -> TtProbe {
        let (shard_idx, local) = self.locate(key);
        let shard = self.shards[shard_idx].lock();
        let bucket = &shard.buckets[local];

        for entry in bucket.iter().flatten() {
            if entry.key == key {
                if i32::from(entry.depth) >= depth {
                    return TtProbe::Hit(TtData {
                        score: i32::from(entry.score),
                        depth: i32::from(entry.depth),
                        bound: entry.bound,
                        mv: entry.mv,
                    });
                }
                return TtProbe::Miss { mv: entry.mv };
            }
        }
        TtProbe::Miss { mv: Move::NULL }
    }

    /// Store a search result. Same-key stores always refresh; otherwise an
    /// entry is displaced when it is empty, shallower than the new data,
    /// upgraded from a non-exact to an exact bound at equal depth, or left
    /// over from an older generation.
    pub fn store(&self, key: u64, depth: i32, score: i32, bound: Bound, mv: Move) {
        let age = self.age.load(Ordering::Relaxed);
        let new_entry = Entry {
            key,
            mv,
            score: score.clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16,
            depth: depth.clamp(0, 255) as u8,
            bound,
            age,
        };

        let (shard_idx, local) = self.locate(key);
        let mut guard = self.shards[shard_idx].lock();
        let Shard { buckets, occupied } = &mut *guard;
        let bucket = &mut buckets[local];

        // Same key: refresh, but never throw away a known best move.
        for slot in bucket.iter_mut() {
            if let Some(existing) = slot {
                if existing.key == key {
                    let mv = if new_entry.mv.is_null() {
                        existing.mv
                    } else {
                        new_entry.mv
                    };
                    *slot = Some(Entry { mv, ..new_entry });
                    return;
                }
            }
        }

        // Empty way.
        for slot in bucket.iter_mut() {
            if slot.is_none() {
                *slot = Some(new_entry);
                *occupied += 1;
                return;
            }
        }

        // Full bucket: pick the less valuable way as the victim, then let
        // the replacement policy decide whether the new entry displaces it.
        let victim_idx = bucket
            .iter()
            .enumerate()
            .min_by_key(|(_, slot)| {
                let e = slot.as_ref().expect("full bucket");
                let staleness = age.wrapping_sub(e.age);
                // Stale entries first, then shallow ones.
                (u32::from(staleness == 0), u32::from(e.depth))
            })
            .map(|(i, _)| i)
            .expect("bucket is non-empty");
        let victim = bucket[victim_idx].as_ref().expect("victim exists");

        let replace = victim.age != age
            || new_entry.depth > victim.depth
            || (new_entry.depth == victim.depth
                && victim.bound != Bound::Exact
                && new_entry.bound == Bound::Exact);
        if replace {
            bucket[victim_idx] = Some(new_entry);
        }
    }

    /// Permille of slots in use, for `info hashfull`.
    #[must_use]
    pub fn hashfull_per_mille(&self) -> u32 {
        let mut occupied = 0usize;
        let mut total = 0usize;
        for shard in &self.shards {
            let guard = shard.lock();
            occupied += guard.occupied;
            total += guard.buckets.len() * BUCKET_WAYS;
        }
        if total == 0 {
            0
        } else {
            ((occupied as u64 * 1000) / total as u64) as u32
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{MoveKind, Square};

    fn test_move() -> Move {
        Move::new(Square::E1, Square::G1, MoveKind::KingCastle)
    }

    #[test]
    fn store_then_probe_hits() {
        let tt = TranspositionTable::new(1);
        tt.store(0xdead_beef, 8, 42, Bound::Exact, test_move());

        match tt.probe(0xdead_beef, 8) {
            TtProbe::Hit(data) => {
                assert_eq!(data.score, 42);
                assert_eq!(data.depth, 8);
                assert_eq!(data.bound, Bound::Exact);
                assert_eq!(data.mv, test_move());
            }
            TtProbe::Miss { .. } => panic!("expected hit"),
        }
    }

    #[test]
    fn insufficient_depth_still_yields_move() {
        let tt = TranspositionTable::new(1);
        tt.store(1234, 4, 10, Bound::Lower, test_move());

        match tt.probe(1234, 6) {
            TtProbe::Miss { mv } => assert_eq!(mv, test_move()),
            TtProbe::Hit(_) => panic!("depth 4 must not satisfy depth 6"),
        }
    }

    #[test]
    fn unknown_key_misses_without_move() {
        let tt = TranspositionTable::new(1);
        match tt.probe(999, 0) {
            TtProbe::Miss { mv } => assert!(mv.is_null()),
            TtProbe::Hit(_) => panic!("nothing was stored"),
        }
    }

    #[test]
    fn same_key_refresh_keeps_move_when_new_is_null() {
        let tt = TranspositionTable::new(1);
        tt.store(77, 5, 10, Bound::Exact, test_move());
        tt.store(77, 6, 20, Bound::Lower, Move::NULL);

        match tt.probe(77, 6) {
            TtProbe::Hit(data) => {
                assert_eq!(data.score, 20);
                assert_eq!(data.mv, test_move());
            }
            TtProbe::Miss { .. } => panic!("expected refreshed hit"),
        }
    }

    #[test]
    fn deeper_entries_survive_shallow_stores() {
        let tt = TranspositionTable::new(1);
        // Fill one bucket: craft keys with identical low bits. Mask is a
        // power of two, so adding (mask+1) keeps the bucket index.
        let stride = 1u64 << 40; // far above any realistic mask
        let base = 0x5a5a;
        tt.store(base, 12, 1, Bound::Exact, test_move());
        tt.store(base + stride, 10, 2, Bound::Exact, test_move());
        // A shallower same-age entry must not evict the depth-12 one.
        tt.store(base + 2 * stride, 3, 3, Bound::Upper, test_move());

        match tt.probe(base, 12) {
            TtProbe::Hit(data) => assert_eq!(data.score, 1),
            TtProbe::Miss { .. } => panic!("deep entry was evicted"),
        }
    }

    #[test]
    fn old_generation_entries_are_replaced() {
        let tt = TranspositionTable::new(1);
        let stride = 1u64 << 40;
        let base = 0x77;
        tt.store(base, 12, 1, Bound::Exact, test_move());
        tt.store(base + stride, 11, 2, Bound::Exact, test_move());

        tt.new_generation();
        tt.store(base + 2 * stride, 1, 3, Bound::Upper, test_move());

        match tt.probe(base + 2 * stride, 1) {
            TtProbe::Hit(data) => assert_eq!(data.score, 3),
            TtProbe::Miss { .. } => panic!("stale entry should have been displaced"),
        }
    }

    #[test]
    fn hashfull_grows_with_stores() {
        let tt = TranspositionTable::new(1);
        assert_eq!(tt.hashfull_per_mille(), 0);
        for i in 0..50_000u64 {
            tt.store(i.wrapping_mul(0x9e37_79b9_7f4a_7c15), 1, 0, Bound::Exact, Move::NULL);
        }
        assert!(tt.hashfull_per_mille() > 0);
        tt.clear();
        assert_eq!(tt.hashfull_per_mille(), 0);
    }
}
