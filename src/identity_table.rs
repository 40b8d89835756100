//! Fixed-size chained hash table keyed by object identity.
//!
//! Keys are shared handles (`Arc<K>`) and two keys match only when they point
//! at the same allocation. Value-equal keys from distinct allocations are
//! independent entries. The bucket is chosen from the key's address.

use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct IdentityTable<K, V> {
    buckets: Vec<Vec<(Arc<K>, V)>>,
    len: usize,
}

impl<K, V> IdentityTable<K, V> {
    /// Create a table with `bucket_count` chains (at least one).
    pub fn new(bucket_count: usize) -> Self {
        Self {
            buckets: (0..bucket_count.max(1)).map(|_| Vec::new()).collect(),
            len: 0,
        }
    }

    #[inline]
    fn bucket_of(&self, key: &Arc<K>) -> usize {
        // Low bits of an allocation address are alignment padding.
        (Arc::as_ptr(key) as *const () as usize >> 3) % self.buckets.len()
    }

    /// Value bound to this exact key allocation, most recent binding first.
    pub fn get(&self, key: &Arc<K>) -> Option<&V> {
        self.buckets[self.bucket_of(key)]
            .iter()
            .rev()
            .find(|(candidate, _)| Arc::ptr_eq(candidate, key))
            .map(|(_, value)| value)
    }

    /// Bind `value` to `key`. An existing binding for the same key is
    /// shadowed, not replaced; [`remove`](Self::remove) uncovers it again.
    pub fn put(&mut self, key: Arc<K>, value: V) {
        let bucket = self.bucket_of(&key);
        self.buckets[bucket].push((key, value));
        self.len += 1;
    }

    /// Remove the most recent binding of `key`.
    pub fn remove(&mut self, key: &Arc<K>) -> Option<V> {
        let bucket = self.bucket_of(key);
        let chain = &mut self.buckets[bucket];
        let position = chain
            .iter()
            .rposition(|(candidate, _)| Arc::ptr_eq(candidate, key))?;
        self.len -= 1;
        Some(chain.remove(position).1)
    }

    /// Number of bindings, counting shadowed ones.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_equal_keys_are_distinct() {
        let mut table = IdentityTable::new(16);
        let first = Arc::new(String::from("vertex"));
        let second = Arc::new(String::from("vertex"));

        table.put(first.clone(), 1);
        table.put(second.clone(), 2);

        assert_eq!(table.get(&first), Some(&1));
        assert_eq!(table.get(&second), Some(&2));
        assert_eq!(table.get(&Arc::new(String::from("vertex"))), None);
    }

    #[test]
    fn test_cloned_handle_is_same_key() {
        let mut table = IdentityTable::new(4);
        let key = Arc::new(7u32);

        table.put(key.clone(), "seven");

        assert_eq!(table.get(&Arc::clone(&key)), Some(&"seven"));
    }

    #[test]
    fn test_put_shadows_and_remove_uncovers() {
        let mut table = IdentityTable::new(8);
        let key = Arc::new(());

        table.put(key.clone(), 'a');
        table.put(key.clone(), 'b');
        assert_eq!(table.get(&key), Some(&'b'));
        assert_eq!(table.len(), 2);

        assert_eq!(table.remove(&key), Some('b'));
        assert_eq!(table.get(&key), Some(&'a'));
        assert_eq!(table.remove(&key), Some('a'));
        assert_eq!(table.remove(&key), None);
        assert!(table.is_empty());
    }

    #[test]
    fn test_single_bucket_chains_everything() {
        let mut table = IdentityTable::new(0);
        let keys: Vec<_> = (0..32).map(Arc::new).collect();
        for key in &keys {
            table.put(key.clone(), **key * 10);
        }

        for key in &keys {
            assert_eq!(table.get(key), Some(&(**key * 10)));
        }
        assert_eq!(table.remove(&keys[5]), Some(50));
        assert_eq!(table.get(&keys[5]), None);
        assert_eq!(table.len(), 31);
    }
}
