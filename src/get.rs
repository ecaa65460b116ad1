use crate::layout::{self, LeafParts};
use crate::{IndexError, IndexResult, OrderedIndex};

impl<K: Ord, V> OrderedIndex<K, V> {
    /// Exact-match lookup. Descends by the insertion routing rule, then
    /// scans the leaf. Absence is a normal result, not an error.
    pub fn get(&self, key: &K) -> Option<&V> {
        let (parts, idx) = self.leaf_search(key)?;
        unsafe { Some(&*(parts.vals_ptr.add(idx) as *const V)) }
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let (parts, idx) = self.leaf_search(key)?;
        unsafe { Some(&mut *(parts.vals_ptr.add(idx) as *mut V)) }
    }

    /// `Result` flavor of [`get`](OrderedIndex::get) for callers using `?`.
    pub fn get_item(&self, key: &K) -> IndexResult<&V> {
        self.get(key).ok_or(IndexError::KeyNotFound)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    #[inline]
    fn leaf_search(&self, key: &K) -> Option<(LeafParts<K, V>, usize)> {
        let leaf = self.leaf_for_key(key)?;
        unsafe {
            let parts = layout::carve_leaf::<K, V>(leaf, &self.leaf_layout);
            let len = (*parts.hdr).len as usize;
            let keys = core::slice::from_raw_parts(parts.keys_ptr as *const K, len);
            let idx = keys.binary_search(key).ok()?;
            Some((parts, idx))
        }
    }
}
