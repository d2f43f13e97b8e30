use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::SystemTime,
};

use clippy_utilities::Cast;

/// Width of the replica-tag field, in bits.
const REPLICA_BITS: u32 = 7;
/// Width of the coarse-timestamp field, in bits.
const TS_BITS: u32 = 40;
/// Width of the per-instance monotonic counter field, in bits.
const COUNTER_BITS: u32 = 16;
/// Mask over the `TS_BITS + COUNTER_BITS` suffix (everything but the
/// replica tag and the always-zero sign bit).
const SUFFIX_MASK: u64 = (1 << (TS_BITS + COUNTER_BITS)) - 1;
/// Mask over the timestamp field alone, once shifted into the suffix.
const TS_MASK: u64 = (1 << TS_BITS) - 1;
/// Mask over a 7-bit replica tag.
const REPLICA_MASK: u64 = (1 << REPLICA_BITS) - 1;

/// Allocates unique, non-zero, strictly increasing 64-bit lease IDs.
///
/// Bit layout, most significant bit first: a zero sign bit, 7 bits of
/// replica tag, then a 56-bit suffix combining a coarse (1-second
/// resolution) timestamp with a per-instance counter. The suffix only ever
/// increases: if wall-clock time hasn't advanced since the last call (or
/// has gone backwards), the counter portion is bumped instead, so
/// `next()` is monotonic regardless of clock behavior.
#[derive(Debug)]
pub struct IdGenerator {
    /// Replica tag, pre-shifted into its final bit position.
    prefix: u64,
    /// Last suffix handed out; every subsequent suffix is strictly greater.
    last_suffix: AtomicU64,
}

impl IdGenerator {
    /// Build a generator for the given replica tag.
    ///
    /// A negative tag is folded to non-negative via arithmetic negation
    /// before being masked to 7 bits.
    #[must_use]
    pub fn new(replica_tag: i8) -> Self {
        let folded: u64 = if replica_tag < 0 {
            replica_tag.wrapping_neg().cast()
        } else {
            replica_tag.cast()
        };
        Self {
            prefix: (folded & REPLICA_MASK) << (TS_BITS + COUNTER_BITS),
            last_suffix: AtomicU64::new(0),
        }
    }

    /// Allocate the next ID. Never returns zero; strictly greater than any
    /// value previously returned by this instance.
    pub fn next(&self) -> i64 {
        let ts = coarse_timestamp_secs();
        let candidate = ts << COUNTER_BITS;

        let mut prev = self.last_suffix.load(Ordering::Relaxed);
        loop {
            let suffix = if candidate > prev {
                candidate
            } else {
                prev.wrapping_add(1)
            } & SUFFIX_MASK;
            match self.last_suffix.compare_exchange_weak(
                prev,
                suffix,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => {
                    let id = self.prefix | suffix;
                    debug_assert!(id != 0, "id generator produced the reserved sentinel 0");
                    debug_assert!(id <= i64::MAX.cast(), "id generator set the sign bit");
                    return id.cast();
                }
                Err(actual) => prev = actual,
            }
        }
    }
}

fn coarse_timestamp_secs() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs() & TS_MASK)
        .unwrap_or(0)
}

#[cfg(test)]
mod test {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn ids_are_nonzero_and_monotonic() {
        let gen = IdGenerator::new(1);
        let mut last = 0;
        for _ in 0..1000 {
            let id = gen.next();
            assert_ne!(id, 0);
            assert!(id > last);
            last = id;
        }
    }

    #[test]
    fn ids_are_unique_across_many_calls() {
        let gen = IdGenerator::new(5);
        let mut seen = HashSet::new();
        for _ in 0..5000 {
            assert!(seen.insert(gen.next()));
        }
    }

    #[test]
    fn negative_replica_tag_is_folded_to_nonnegative() {
        let gen = IdGenerator::new(-3);
        let id = gen.next();
        assert!(id > 0);
    }

    #[test]
    fn concurrent_callers_never_collide() {
        use std::sync::Arc;
        let gen = Arc::new(IdGenerator::new(2));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let gen = Arc::clone(&gen);
                std::thread::spawn(move || (0..500).map(|_| gen.next()).collect::<Vec<_>>())
            })
            .collect();
        let mut all = Vec::new();
        for h in handles {
            all.extend(h.join().expect("thread panicked"));
        }
        let unique: HashSet<_> = all.iter().copied().collect();
        assert_eq!(unique.len(), all.len());
    }
}
