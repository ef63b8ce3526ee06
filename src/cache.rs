//! Direct-mapped computed table for memoizing BDD operations.

use std::cell::Cell;

use crate::reference::Ref;

/// [Szudzik pairing function][szudzik-pairing].
///
/// ```text
/// (a, b) -> if (a<b) then (b^2 + a) else (a^2 + a + b)
/// ```
///
/// [szudzik-pairing]: http://szudzik.com/ElegantPairing.pdf
pub fn pairing2(a: u64, b: u64) -> u64 {
    if a < b {
        b.wrapping_mul(b).wrapping_add(a)
    } else {
        a.wrapping_mul(a).wrapping_add(a).wrapping_add(b)
    }
}

/// Pairing function for three `u64` values.
pub fn pairing3(a: u64, b: u64, c: u64) -> u64 {
    pairing2(pairing2(a, b), c)
}

/// Hash used to select a cache slot.
pub trait SlotHash {
    fn slot_hash(&self) -> u64;
}

impl SlotHash for Ref {
    fn slot_hash(&self) -> u64 {
        self.get() as u32 as u64
    }
}

impl SlotHash for (Ref, Ref, Ref) {
    fn slot_hash(&self) -> u64 {
        pairing3(self.0.slot_hash(), self.1.slot_hash(), self.2.slot_hash())
    }
}

impl SlotHash for (u64, u64) {
    fn slot_hash(&self) -> u64 {
        pairing2(self.0, self.1)
    }
}

struct Entry<K, V> {
    key: K,
    value: V,
}

/// Lossy cache: a colliding insert overwrites the previous entry.
pub struct Cache<K, V> {
    data: Vec<Option<Entry<K, V>>>,
    bitmask: u64,
    hits: Cell<usize>,
    misses: Cell<usize>,
}

impl<K, V> Cache<K, V> {
    /// Create a new cache with `2^bits` slots.
    pub fn new(bits: usize) -> Self {
        assert!(bits <= 31, "Bits should be in the range 0..=31");

        let size = 1usize << bits;
        Self {
            data: std::iter::repeat_with(|| None).take(size).collect(),
            bitmask: (size - 1) as u64,
            hits: Cell::new(0),
            misses: Cell::new(0),
        }
    }

    /// Number of slots.
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Get the number of cache hits.
    pub fn hits(&self) -> usize {
        self.hits.get()
    }

    /// Get the number of cache misses.
    pub fn misses(&self) -> usize {
        self.misses.get()
    }

    /// Drop all entries. Statistics are kept.
    pub fn clear(&mut self) {
        self.data.fill_with(|| None);
    }

    fn index(&self, hash: u64) -> usize {
        (hash & self.bitmask) as usize
    }
}

impl<K, V> Cache<K, V>
where
    K: SlotHash + Eq,
{
    /// Get the cached result.
    pub fn get(&self, key: &K) -> Option<&V> {
        let index = self.index(key.slot_hash());
        match &self.data[index] {
            Some(entry) if entry.key == *key => {
                self.hits.set(self.hits.get() + 1);
                Some(&entry.value)
            }
            _ => {
                self.misses.set(self.misses.get() + 1);
                None
            }
        }
    }

    /// Insert a result into the cache.
    pub fn insert(&mut self, key: K, value: V) {
        let index = self.index(key.slot_hash());
        self.data[index] = Some(Entry { key, value });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_szudzik() {
        assert_eq!(pairing2(0, 0), 0);
        assert_eq!(pairing2(0, 1), 1);
        assert_eq!(pairing2(1, 0), 2);
        assert_eq!(pairing2(1, 1), 3);
        assert_eq!(pairing2(2, 1), 7);
        assert_eq!(pairing2(4, 0), 20);
    }

    #[test]
    fn test_cache() {
        let mut cache = Cache::<(u64, u64), i32>::new(3);
        assert_eq!(cache.capacity(), 8);

        cache.insert((1, 2), 3);
        cache.insert((2, 3), 1);
        cache.insert((1, 3), 2);

        assert_eq!(cache.get(&(1, 2)), Some(&3));
        assert_eq!(cache.get(&(2, 3)), Some(&1));
        assert_eq!(cache.get(&(1, 3)), Some(&2));
        assert_eq!(cache.get(&(2, 1)), None);
        assert_eq!(cache.get(&(3, 3)), None);
        assert_eq!(cache.hits(), 3);
        assert_eq!(cache.misses(), 2);
    }

    #[test]
    fn test_collision_overwrites() {
        let mut cache = Cache::<(u64, u64), i32>::new(0);
        cache.insert((1, 2), 10);
        cache.insert((5, 7), 20);
        assert_eq!(cache.get(&(1, 2)), None);
        assert_eq!(cache.get(&(5, 7)), Some(&20));

        cache.clear();
        assert_eq!(cache.get(&(5, 7)), None);
    }
}
