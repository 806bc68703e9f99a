//! Dict: hash map that remembers insertion order
//!
//! Lookup goes through chained hash buckets; enumeration follows a doubly
//! linked order list threaded through the same entries. New keys land at
//! the back of the order list (or the front, via `put_front`) and
//! overwriting an existing key never moves it. Resizing rebuilds the
//! buckets by walking the order list, so it cannot perturb the order.

use crate::error::{Result, VastError};
use crate::pair::Pair;
use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{BuildHasher, Hash};
use std::marker::PhantomData;
use std::ptr;

/// Buckets allocated when the first entry arrives
const DEFAULT_CAPACITY: usize = 32;

struct Entry<K, V> {
    key: K,
    value: V,
    hash: u64,
    /// Bucket chain
    next: *mut Entry<K, V>,
    /// Insertion-order links
    prev_order: *mut Entry<K, V>,
    next_order: *mut Entry<K, V>,
}

/// Insertion-ordered hash map.
///
/// Iteration order is the order keys were first inserted. The hasher is
/// injectable through `S` and defaults to [`ahash::RandomState`].
///
/// # Examples
///
/// ```
/// use vastkit::Dict;
///
/// let mut d = Dict::new();
/// d.put("b", 2);
/// d.put("a", 1);
/// d.put("b", 20); // overwrite keeps position
/// let keys: Vec<_> = d.keys().copied().collect();
/// assert_eq!(keys, vec!["b", "a"]);
/// assert_eq!(d.get("b"), Some(&20));
/// ```
pub struct Dict<K, V, S = ahash::RandomState> {
    buckets: Box<[*mut Entry<K, V>]>,
    head: *mut Entry<K, V>,
    tail: *mut Entry<K, V>,
    len: usize,
    hasher: S,
}

impl<K: Hash + Eq, V> Dict<K, V, ahash::RandomState> {
    /// Create an empty dict with the default hasher
    pub fn new() -> Self {
        Self::with_hasher(ahash::RandomState::new())
    }

    /// Create an empty dict with room for roughly `capacity` entries
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, ahash::RandomState::new())
    }
}

impl<K: Hash + Eq, V, S: BuildHasher> Dict<K, V, S> {
    /// Create an empty dict with a caller-supplied hasher
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            buckets: Box::new([]),
            head: ptr::null_mut(),
            tail: ptr::null_mut(),
            len: 0,
            hasher,
        }
    }

    /// Create an empty dict with a caller-supplied hasher and capacity
    pub fn with_capacity_and_hasher(capacity: usize, hasher: S) -> Self {
        let mut dict = Self::with_hasher(hasher);
        if capacity > 0 {
            dict.buckets = Self::empty_buckets(capacity.next_power_of_two());
        }
        dict
    }

    /// Number of entries
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the dict holds no entries
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Current bucket count
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    fn empty_buckets(cap: usize) -> Box<[*mut Entry<K, V>]> {
        vec![ptr::null_mut(); cap].into_boxed_slice()
    }

    fn hash_of<Q: ?Sized + Hash>(&self, key: &Q) -> u64 {
        self.hasher.hash_one(key)
    }

    #[inline]
    fn bucket_of(&self, hash: u64) -> usize {
        // Bucket counts are powers of two.
        (hash as usize) & (self.buckets.len() - 1)
    }

    fn find_entry<Q>(&self, key: &Q) -> *mut Entry<K, V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        if self.buckets.is_empty() {
            return ptr::null_mut();
        }
        let hash = self.hash_of(key);
        let mut entry = self.buckets[self.bucket_of(hash)];
        while !entry.is_null() {
            unsafe {
                if (*entry).hash == hash && (*entry).key.borrow() == key {
                    return entry;
                }
                entry = (*entry).next;
            }
        }
        ptr::null_mut()
    }

    /// Grow when the next insertion would push past a 3/4 load factor.
    fn grow_if_needed(&mut self) {
        if self.buckets.is_empty() {
            self.rebuild_buckets(DEFAULT_CAPACITY);
        } else if (self.len + 1) * 4 > self.buckets.len() * 3 {
            self.rebuild_buckets(self.buckets.len() * 2);
        }
    }

    /// Rebuild the bucket array at `new_cap`, walking the order list so the
    /// enumeration order is untouched.
    fn rebuild_buckets(&mut self, new_cap: usize) {
        self.buckets = Self::empty_buckets(new_cap);
        let mut entry = self.head;
        while !entry.is_null() {
            unsafe {
                let idx = self.bucket_of((*entry).hash);
                (*entry).next = self.buckets[idx];
                self.buckets[idx] = entry;
                entry = (*entry).next_order;
            }
        }
    }

    unsafe fn bucket_link(&mut self, entry: *mut Entry<K, V>) {
        let idx = self.bucket_of(unsafe { (*entry).hash });
        unsafe {
            (*entry).next = self.buckets[idx];
        }
        self.buckets[idx] = entry;
    }

    unsafe fn bucket_unlink(&mut self, entry: *mut Entry<K, V>) {
        let idx = self.bucket_of(unsafe { (*entry).hash });
        let mut cursor = self.buckets[idx];
        if cursor == entry {
            self.buckets[idx] = unsafe { (*entry).next };
            return;
        }
        unsafe {
            while (*cursor).next != entry {
                cursor = (*cursor).next;
            }
            (*cursor).next = (*entry).next;
        }
    }

    unsafe fn order_push_back(&mut self, entry: *mut Entry<K, V>) {
        unsafe {
            (*entry).prev_order = self.tail;
            (*entry).next_order = ptr::null_mut();
            if self.tail.is_null() {
                self.head = entry;
            } else {
                (*self.tail).next_order = entry;
            }
        }
        self.tail = entry;
    }

    unsafe fn order_push_front(&mut self, entry: *mut Entry<K, V>) {
        unsafe {
            (*entry).next_order = self.head;
            (*entry).prev_order = ptr::null_mut();
            if self.head.is_null() {
                self.tail = entry;
            } else {
                (*self.head).prev_order = entry;
            }
        }
        self.head = entry;
    }

    unsafe fn order_unlink(&mut self, entry: *mut Entry<K, V>) {
        unsafe {
            let prev = (*entry).prev_order;
            let next = (*entry).next_order;
            if prev.is_null() {
                self.head = next;
            } else {
                (*prev).next_order = next;
            }
            if next.is_null() {
                self.tail = prev;
            } else {
                (*next).prev_order = prev;
            }
        }
    }

    /// Order-list entry at `index`; walks from the nearer end. Caller
    /// checks bounds.
    fn order_entry_at(&self, index: usize) -> *mut Entry<K, V> {
        debug_assert!(index < self.len);
        if index <= self.len / 2 {
            let mut entry = self.head;
            for _ in 0..index {
                entry = unsafe { (*entry).next_order };
            }
            entry
        } else {
            let mut entry = self.tail;
            for _ in 0..(self.len - 1 - index) {
                entry = unsafe { (*entry).prev_order };
            }
            entry
        }
    }

    fn alloc_entry(&self, key: K, value: V, hash: u64) -> *mut Entry<K, V> {
        Box::into_raw(Box::new(Entry {
            key,
            value,
            hash,
            next: ptr::null_mut(),
            prev_order: ptr::null_mut(),
            next_order: ptr::null_mut(),
        }))
    }

    /// Insert or overwrite.
    ///
    /// A new key goes to the back of the enumeration order; an existing key
    /// keeps its position and has its value replaced. Returns the replaced
    /// value, if any.
    pub fn put(&mut self, key: K, value: V) -> Option<V> {
        let existing = self.find_entry(&key);
        if !existing.is_null() {
            return Some(unsafe { std::mem::replace(&mut (*existing).value, value) });
        }
        self.grow_if_needed();
        let hash = self.hash_of(&key);
        let entry = self.alloc_entry(key, value, hash);
        unsafe {
            self.bucket_link(entry);
            self.order_push_back(entry);
        }
        self.len += 1;
        None
    }

    /// Insert or overwrite, placing the key at the front of the
    /// enumeration order (moving it there if it already exists).
    pub fn put_front(&mut self, key: K, value: V) -> Option<V> {
        let existing = self.find_entry(&key);
        if !existing.is_null() {
            unsafe {
                self.order_unlink(existing);
                self.order_push_front(existing);
                return Some(std::mem::replace(&mut (*existing).value, value));
            }
        }
        self.grow_if_needed();
        let hash = self.hash_of(&key);
        let entry = self.alloc_entry(key, value, hash);
        unsafe {
            self.bucket_link(entry);
            self.order_push_front(entry);
        }
        self.len += 1;
        None
    }

    /// Insert a key at position `index` of the enumeration order.
    ///
    /// If the key already exists it is removed first and `index` is then
    /// clamped to the shrunken size. `index` greater than the current size
    /// is an error.
    pub fn insert(&mut self, index: usize, key: K, value: V) -> Result<()> {
        if index > self.len {
            return Err(VastError::out_of_bounds(index, self.len));
        }
        self.remove(&key);
        let index = index.min(self.len);
        self.grow_if_needed();
        let hash = self.hash_of(&key);
        let entry = self.alloc_entry(key, value, hash);
        unsafe {
            self.bucket_link(entry);
            if index == 0 {
                self.order_push_front(entry);
            } else if index == self.len {
                self.order_push_back(entry);
            } else {
                let pos = self.order_entry_at(index);
                let before = (*pos).prev_order;
                (*entry).prev_order = before;
                (*entry).next_order = pos;
                (*before).next_order = entry;
                (*pos).prev_order = entry;
            }
        }
        self.len += 1;
        Ok(())
    }

    /// Overwrite the value of an existing key without touching its
    /// position. Missing keys are an error.
    pub fn set<Q>(&mut self, key: &Q, value: V) -> Result<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let entry = self.find_entry(key);
        if entry.is_null() {
            return Err(VastError::key_not_found("set() on missing key"));
        }
        Ok(unsafe { std::mem::replace(&mut (*entry).value, value) })
    }

    /// Value for `key`, if present
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let entry = self.find_entry(key);
        if entry.is_null() {
            None
        } else {
            Some(unsafe { &(*entry).value })
        }
    }

    /// Mutable value for `key`, if present
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let entry = self.find_entry(key);
        if entry.is_null() {
            None
        } else {
            Some(unsafe { &mut (*entry).value })
        }
    }

    /// Value for `key`, or a `KeyNotFound` error
    pub fn at<Q>(&self, key: &Q) -> Result<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.get(key)
            .ok_or_else(|| VastError::key_not_found("key not present in dict"))
    }

    /// Mutable value for `key`, inserting `V::default()` at the back of
    /// the order first if the key is missing
    pub fn entry_or_default(&mut self, key: K) -> &mut V
    where
        V: Default,
    {
        let entry = self.find_entry(&key);
        if !entry.is_null() {
            return unsafe { &mut (*entry).value };
        }
        self.grow_if_needed();
        let hash = self.hash_of(&key);
        let entry = self.alloc_entry(key, V::default(), hash);
        unsafe {
            self.bucket_link(entry);
            self.order_push_back(entry);
        }
        self.len += 1;
        unsafe { &mut (*entry).value }
    }

    /// Remove `key`, returning its value. Missing keys are a no-op.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let entry = self.find_entry(key);
        if entry.is_null() {
            return None;
        }
        unsafe {
            self.bucket_unlink(entry);
            self.order_unlink(entry);
        }
        self.len -= 1;
        let boxed = unsafe { Box::from_raw(entry) };
        Some(boxed.value)
    }

    /// Whether `key` is present
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        !self.find_entry(key).is_null()
    }

    /// Remove all entries, keeping the bucket allocation
    pub fn clear(&mut self) {
        let mut entry = self.head;
        while !entry.is_null() {
            unsafe {
                let next = (*entry).next_order;
                drop(Box::from_raw(entry));
                entry = next;
            }
        }
        for bucket in self.buckets.iter_mut() {
            *bucket = ptr::null_mut();
        }
        self.head = ptr::null_mut();
        self.tail = ptr::null_mut();
        self.len = 0;
    }

    /// Grow the bucket array so `additional` more entries fit under the
    /// load factor without rebuilding.
    ///
    /// The argument is headroom beyond the current length, as in std's
    /// collections, not an absolute capacity; the resulting capacity
    /// always covers at least `len + additional` entries.
    pub fn reserve(&mut self, additional: usize) {
        let target = self.len + additional;
        let mut cap = self.buckets.len().max(DEFAULT_CAPACITY);
        while target * 4 > cap * 3 {
            cap *= 2;
        }
        if cap > self.buckets.len() {
            self.rebuild_buckets(cap);
        }
    }

    /// Key at position `index` of the enumeration order
    pub fn key_at(&self, index: usize) -> Result<&K> {
        if index >= self.len {
            return Err(VastError::out_of_bounds(index, self.len));
        }
        Ok(unsafe { &(*self.order_entry_at(index)).key })
    }

    /// Value at position `index` of the enumeration order
    pub fn value_at(&self, index: usize) -> Result<&V> {
        if index >= self.len {
            return Err(VastError::out_of_bounds(index, self.len));
        }
        Ok(unsafe { &(*self.order_entry_at(index)).value })
    }

    /// Key/value pair at position `index` of the enumeration order
    pub fn pair_at(&self, index: usize) -> Result<Pair<&K, &V>> {
        if index >= self.len {
            return Err(VastError::out_of_bounds(index, self.len));
        }
        let entry = self.order_entry_at(index);
        Ok(unsafe { Pair::new(&(*entry).key, &(*entry).value) })
    }

    /// Remove the entry at position `index` of the enumeration order
    pub fn del_index(&mut self, index: usize) -> Result<Pair<K, V>> {
        if index >= self.len {
            return Err(VastError::out_of_bounds(index, self.len));
        }
        let entry = self.order_entry_at(index);
        unsafe {
            self.bucket_unlink(entry);
            self.order_unlink(entry);
        }
        self.len -= 1;
        let boxed = unsafe { Box::from_raw(entry) };
        Ok(Pair::new(boxed.key, boxed.value))
    }

    /// First pair in enumeration order
    pub fn front(&self) -> Option<Pair<&K, &V>> {
        if self.head.is_null() {
            None
        } else {
            Some(unsafe { Pair::new(&(*self.head).key, &(*self.head).value) })
        }
    }

    /// Last pair in enumeration order
    pub fn back(&self) -> Option<Pair<&K, &V>> {
        if self.tail.is_null() {
            None
        } else {
            Some(unsafe { Pair::new(&(*self.tail).key, &(*self.tail).value) })
        }
    }

    /// Iterate pairs in enumeration order
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            front: self.head,
            back: self.tail,
            remaining: self.len,
            _marker: PhantomData,
        }
    }

    /// Iterate pairs with mutable values, in enumeration order
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut {
            front: self.head,
            back: self.tail,
            remaining: self.len,
            _marker: PhantomData,
        }
    }

    /// Iterate keys in enumeration order
    pub fn keys(&self) -> impl DoubleEndedIterator<Item = &K> + '_ {
        self.iter().map(|(k, _)| k)
    }

    /// Iterate values in enumeration order
    pub fn values(&self) -> impl DoubleEndedIterator<Item = &V> + '_ {
        self.iter().map(|(_, v)| v)
    }

    /// Like unordered equality, but the enumeration orders must match too
    pub fn equals_ordered<S2: BuildHasher>(&self, other: &Dict<K, V, S2>) -> bool
    where
        V: PartialEq,
    {
        self.len == other.len
            && self
                .iter()
                .zip(other.iter())
                .all(|((ka, va), (kb, vb))| ka == kb && va == vb)
    }

    fn pop_front_pair(&mut self) -> Option<(K, V)> {
        if self.head.is_null() {
            return None;
        }
        let entry = self.head;
        unsafe {
            self.bucket_unlink(entry);
            self.order_unlink(entry);
        }
        self.len -= 1;
        let boxed = unsafe { Box::from_raw(entry) };
        Some((boxed.key, boxed.value))
    }
}

impl<K: Hash + Eq, V> Default for Dict<K, V, ahash::RandomState> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> Drop for Dict<K, V, S> {
    fn drop(&mut self) {
        let mut entry = self.head;
        while !entry.is_null() {
            unsafe {
                let next = (*entry).next_order;
                drop(Box::from_raw(entry));
                entry = next;
            }
        }
    }
}

impl<K: Hash + Eq + Clone, V: Clone, S: BuildHasher + Clone> Clone for Dict<K, V, S> {
    fn clone(&self) -> Self {
        let mut out = Self::with_capacity_and_hasher(self.len, self.hasher.clone());
        for (k, v) in self.iter() {
            out.put(k.clone(), v.clone());
        }
        out
    }
}

impl<K: Hash + Eq + fmt::Debug, V: fmt::Debug, S: BuildHasher> fmt::Debug for Dict<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, S, S2> PartialEq<Dict<K, V, S2>> for Dict<K, V, S>
where
    K: Hash + Eq,
    V: PartialEq,
    S: BuildHasher,
    S2: BuildHasher,
{
    /// Order-insensitive: equal when both hold the same key/value pairs
    fn eq(&self, other: &Dict<K, V, S2>) -> bool {
        self.len == other.len && self.iter().all(|(k, v)| other.get(k) == Some(v))
    }
}

impl<K, V, S> PartialOrd for Dict<K, V, S>
where
    K: Hash + Ord,
    V: Ord,
    S: BuildHasher,
{
    /// Lexicographic over the enumeration-order pair sequences
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.iter().cmp(other.iter()))
    }
}

impl<K: Hash + Eq, V, S: BuildHasher + Default> FromIterator<(K, V)> for Dict<K, V, S> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut dict = Self::with_hasher(S::default());
        dict.extend(iter);
        dict
    }
}

impl<K: Hash + Eq, V, S: BuildHasher> Extend<(K, V)> for Dict<K, V, S> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.put(k, v);
        }
    }
}

unsafe impl<K: Send, V: Send, S: Send> Send for Dict<K, V, S> {}
unsafe impl<K: Sync, V: Sync, S: Sync> Sync for Dict<K, V, S> {}

/// Borrowing iterator over a [`Dict`] in enumeration order
pub struct Iter<'a, K, V> {
    front: *mut Entry<K, V>,
    back: *mut Entry<K, V>,
    remaining: usize,
    _marker: PhantomData<(&'a K, &'a V)>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let entry = self.front;
        self.front = unsafe { (*entry).next_order };
        self.remaining -= 1;
        Some(unsafe { (&(*entry).key, &(*entry).value) })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, K, V> DoubleEndedIterator for Iter<'a, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let entry = self.back;
        self.back = unsafe { (*entry).prev_order };
        self.remaining -= 1;
        Some(unsafe { (&(*entry).key, &(*entry).value) })
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

/// Mutably borrowing iterator over a [`Dict`] in enumeration order
pub struct IterMut<'a, K, V> {
    front: *mut Entry<K, V>,
    back: *mut Entry<K, V>,
    remaining: usize,
    _marker: PhantomData<(&'a K, &'a mut V)>,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let entry = self.front;
        self.front = unsafe { (*entry).next_order };
        self.remaining -= 1;
        Some(unsafe { (&(*entry).key, &mut (*entry).value) })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, K, V> DoubleEndedIterator for IterMut<'a, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let entry = self.back;
        self.back = unsafe { (*entry).prev_order };
        self.remaining -= 1;
        Some(unsafe { (&(*entry).key, &mut (*entry).value) })
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}

impl<'a, K: Hash + Eq, V, S: BuildHasher> IntoIterator for &'a Dict<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K: Hash + Eq, V, S: BuildHasher> IntoIterator for &'a mut Dict<K, V, S> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

/// Owning iterator over a [`Dict`] in enumeration order
pub struct IntoIter<K: Hash + Eq, V, S: BuildHasher> {
    dict: Dict<K, V, S>,
}

impl<K: Hash + Eq, V, S: BuildHasher> Iterator for IntoIter<K, V, S> {
    type Item = (K, V);

    fn next(&mut self) -> Option<(K, V)> {
        self.dict.pop_front_pair()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.dict.len(), Some(self.dict.len()))
    }
}

impl<K: Hash + Eq, V, S: BuildHasher> ExactSizeIterator for IntoIter<K, V, S> {}

impl<K: Hash + Eq, V, S: BuildHasher> IntoIterator for Dict<K, V, S> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V, S>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter { dict: self }
    }
}
