use std::{
    hash::{BuildHasher, Hasher},
    sync::atomic::{AtomicU64, Ordering},
};

use twox_hash::XxHash64;

const LABEL_SEED: u64 = 0xdeadbeef;
const LABEL_SEPARATOR: u8 = 0xff;

/// Hash a tuple of label values into the key used by [`crate::metrics::MetricVec`].
/// Values are separated by a byte that can't appear in utf-8 so `["ab", "c"]`
/// and `["a", "bc"]` hash differently.
pub(crate) fn hash_label_values(values: &[&str]) -> u64 {
    let mut hasher = XxHash64::with_seed(LABEL_SEED);
    for value in values {
        hasher.write(value.as_bytes());
        hasher.write_u8(LABEL_SEPARATOR);
    }
    hasher.finish()
}

/// Pass a u64 value straight through as the hash. This is only useful if you
/// are pre-hashing a `HashMap` key and don't want to do duplicate the work.
pub struct NoopHasher {
    inner: u64,
}

impl Hasher for NoopHasher {
    fn finish(&self) -> u64 {
        self.inner
    }

    fn write(&mut self, _bytes: &[u8]) {
        debug_assert!(
            false,
            "NoopHasher only supports u64s that were already hashed"
        )
    }

    fn write_u64(&mut self, i: u64) {
        self.inner = i;
    }
}

/// An implementation of [`BuildHasher`] that just passes a u64 key straight
/// through.
#[derive(Default, Debug, Clone, Copy)]
pub struct BuildNoopHasher;

impl BuildHasher for BuildNoopHasher {
    type Hasher = NoopHasher;

    fn build_hasher(&self) -> Self::Hasher {
        NoopHasher { inner: 0 }
    }
}

/// An f64 stored as its bit pattern in an [`AtomicU64`]. Arithmetic is a CAS
/// loop since there is no native float fetch_add.
#[derive(Debug, Default)]
pub(crate) struct AtomicF64 {
    bits: AtomicU64,
}

impl AtomicF64 {
    pub(crate) fn get(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Relaxed))
    }

    pub(crate) fn set(&self, value: f64) {
        self.bits.store(value.to_bits(), Ordering::Relaxed);
    }

    pub(crate) fn add(&self, delta: f64) {
        let mut current = self.bits.load(Ordering::Relaxed);
        loop {
            let next = (f64::from_bits(current) + delta).to_bits();
            match self.bits.compare_exchange_weak(
                current,
                next,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => return,
                Err(actual) => current = actual,
            }
        }
    }
}
