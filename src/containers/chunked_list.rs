//! ChunkedList: doubly-linked chain of fixed-capacity chunks
//!
//! Elements live in fixed-size arrays threaded on a doubly-linked chain, so
//! sequential traversal stays cache-friendly while end insertion never
//! shifts more than one chunk's worth of data. Splicing an entire list in
//! (`append_list`, `prepend_list`, `insert_list`) relinks chunk pointers in
//! O(1) chunks and leaves the source empty.

use crate::error::{Result, VastError};
use std::cmp::Ordering;
use std::fmt;
use std::marker::PhantomData;
use std::mem::MaybeUninit;
use std::ptr;

struct Chunk<T, const N: usize> {
    data: [MaybeUninit<T>; N],
    count: usize,
    prev: *mut Chunk<T, N>,
    next: *mut Chunk<T, N>,
}

impl<T, const N: usize> Chunk<T, N> {
    fn alloc() -> *mut Self {
        Box::into_raw(Box::new(Chunk {
            // An array of MaybeUninit needs no initialization.
            data: unsafe { MaybeUninit::<[MaybeUninit<T>; N]>::uninit().assume_init() },
            count: 0,
            prev: ptr::null_mut(),
            next: ptr::null_mut(),
        }))
    }
}

/// Sequence stored as a doubly-linked chain of `N`-slot chunks.
///
/// Inserting into a full chunk splits it: the chunk's last element moves to
/// a freshly linked chunk, then the insert proceeds in place. Deleting the
/// last element of a chunk unlinks the chunk.
///
/// # Examples
///
/// ```
/// use vastkit::ChunkedList;
///
/// let mut list: ChunkedList<i32> = (0..40).collect();
/// assert_eq!(list.chunk_count(), 3);
/// assert_eq!(*list.at(25)?, 25);
/// assert_eq!(list.shift()?, 0);
/// # Ok::<(), vastkit::VastError>(())
/// ```
pub struct ChunkedList<T, const N: usize = 16> {
    head: *mut Chunk<T, N>,
    tail: *mut Chunk<T, N>,
    len: usize,
    chunks: usize,
    _marker: PhantomData<T>,
}

impl<T, const N: usize> ChunkedList<T, N> {
    /// Create an empty list
    pub fn new() -> Self {
        // A zero-slot chunk could never hold an element.
        assert!(N > 0, "chunk capacity must be non-zero");
        Self {
            head: ptr::null_mut(),
            tail: ptr::null_mut(),
            len: 0,
            chunks: 0,
            _marker: PhantomData,
        }
    }

    /// Number of elements
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the list holds no elements
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of chunks currently linked
    #[inline]
    pub fn chunk_count(&self) -> usize {
        self.chunks
    }

    fn link_tail_chunk(&mut self) -> *mut Chunk<T, N> {
        let chunk = Chunk::alloc();
        unsafe {
            (*chunk).prev = self.tail;
            if self.tail.is_null() {
                self.head = chunk;
            } else {
                (*self.tail).next = chunk;
            }
        }
        self.tail = chunk;
        self.chunks += 1;
        chunk
    }

    fn link_head_chunk(&mut self) -> *mut Chunk<T, N> {
        let chunk = Chunk::alloc();
        unsafe {
            (*chunk).next = self.head;
            if self.head.is_null() {
                self.tail = chunk;
            } else {
                (*self.head).prev = chunk;
            }
        }
        self.head = chunk;
        self.chunks += 1;
        chunk
    }

    unsafe fn unlink_chunk(&mut self, chunk: *mut Chunk<T, N>) {
        unsafe {
            let prev = (*chunk).prev;
            let next = (*chunk).next;
            if prev.is_null() {
                self.head = next;
            } else {
                (*prev).next = next;
            }
            if next.is_null() {
                self.tail = prev;
            } else {
                (*next).prev = prev;
            }
            drop(Box::from_raw(chunk));
        }
        self.chunks -= 1;
    }

    /// Chunk holding `index` and the offset within it; walks from the
    /// nearer end. Caller checks `index < len`.
    fn chunk_for_index(&self, index: usize) -> (*mut Chunk<T, N>, usize) {
        debug_assert!(index < self.len);
        if index <= self.len / 2 {
            let mut chunk = self.head;
            let mut start = 0usize;
            loop {
                let count = unsafe { (*chunk).count };
                if index < start + count {
                    return (chunk, index - start);
                }
                start += count;
                chunk = unsafe { (*chunk).next };
            }
        } else {
            let mut chunk = self.tail;
            let mut end = self.len;
            loop {
                let count = unsafe { (*chunk).count };
                if index >= end - count {
                    return (chunk, index - (end - count));
                }
                end -= count;
                chunk = unsafe { (*chunk).prev };
            }
        }
    }

    /// Append a value at the end
    pub fn append(&mut self, value: T) {
        let chunk = if self.tail.is_null() || unsafe { (*self.tail).count } == N {
            self.link_tail_chunk()
        } else {
            self.tail
        };
        unsafe {
            let count = (*chunk).count;
            (*chunk).data[count].write(value);
            (*chunk).count = count + 1;
        }
        self.len += 1;
    }

    /// Prepend a value at the front
    pub fn prepend(&mut self, value: T) {
        let chunk = if self.head.is_null() || unsafe { (*self.head).count } == N {
            self.link_head_chunk()
        } else {
            self.head
        };
        unsafe {
            let count = (*chunk).count;
            let base = (*chunk).data.as_mut_ptr();
            ptr::copy(base, base.add(1), count);
            (*chunk).data[0].write(value);
            (*chunk).count = count + 1;
        }
        self.len += 1;
    }

    /// Move the last element of a full `chunk` into a fresh chunk linked
    /// right after it.
    unsafe fn split_full_chunk(&mut self, chunk: *mut Chunk<T, N>) {
        debug_assert_eq!(unsafe { (*chunk).count }, N);
        let fresh = Chunk::alloc();
        unsafe {
            let moved = (*chunk).data[N - 1].assume_init_read();
            (*fresh).data[0].write(moved);
            (*fresh).count = 1;
            (*chunk).count = N - 1;

            (*fresh).prev = chunk;
            (*fresh).next = (*chunk).next;
            if (*chunk).next.is_null() {
                self.tail = fresh;
            } else {
                (*(*chunk).next).prev = fresh;
            }
            (*chunk).next = fresh;
        }
        self.chunks += 1;
    }

    /// Insert a value before position `index`; `index == len` appends
    pub fn insert(&mut self, index: usize, value: T) -> Result<()> {
        if index > self.len {
            return Err(VastError::out_of_bounds(index, self.len));
        }
        if index == self.len {
            self.append(value);
            return Ok(());
        }
        if index == 0 {
            self.prepend(value);
            return Ok(());
        }
        let (chunk, offset) = self.chunk_for_index(index);
        unsafe {
            if (*chunk).count == N {
                self.split_full_chunk(chunk);
            }
            let count = (*chunk).count;
            let base = (*chunk).data.as_mut_ptr();
            ptr::copy(base.add(offset), base.add(offset + 1), count - offset);
            (*chunk).data[offset].write(value);
            (*chunk).count = count + 1;
        }
        self.len += 1;
        Ok(())
    }

    /// Remove and return the element at `index`
    pub fn del(&mut self, index: usize) -> Result<T> {
        if index >= self.len {
            return Err(VastError::out_of_bounds(index, self.len));
        }
        let (chunk, offset) = self.chunk_for_index(index);
        let value = unsafe {
            let count = (*chunk).count;
            let base = (*chunk).data.as_mut_ptr();
            let value = (*chunk).data[offset].assume_init_read();
            ptr::copy(base.add(offset + 1), base.add(offset), count - offset - 1);
            (*chunk).count = count - 1;
            if (*chunk).count == 0 {
                self.unlink_chunk(chunk);
            }
            value
        };
        self.len -= 1;
        Ok(value)
    }

    /// Remove and return the last element
    pub fn pop(&mut self) -> Result<T> {
        if self.len == 0 {
            return Err(VastError::invalid_value("pop() on empty list"));
        }
        let chunk = self.tail;
        let value = unsafe {
            let count = (*chunk).count;
            let value = (*chunk).data[count - 1].assume_init_read();
            (*chunk).count = count - 1;
            if (*chunk).count == 0 {
                self.unlink_chunk(chunk);
            }
            value
        };
        self.len -= 1;
        Ok(value)
    }

    /// Remove and return the first element
    pub fn shift(&mut self) -> Result<T> {
        if self.len == 0 {
            return Err(VastError::invalid_value("shift() on empty list"));
        }
        let chunk = self.head;
        let value = unsafe {
            let count = (*chunk).count;
            let base = (*chunk).data.as_mut_ptr();
            let value = (*chunk).data[0].assume_init_read();
            ptr::copy(base.add(1), base, count - 1);
            (*chunk).count = count - 1;
            if (*chunk).count == 0 {
                self.unlink_chunk(chunk);
            }
            value
        };
        self.len -= 1;
        Ok(value)
    }

    /// First element, if any
    pub fn front(&self) -> Option<&T> {
        if self.len == 0 {
            return None;
        }
        Some(unsafe { (*self.head).data[0].assume_init_ref() })
    }

    /// Last element, if any
    pub fn back(&self) -> Option<&T> {
        if self.len == 0 {
            return None;
        }
        Some(unsafe { (*self.tail).data[(*self.tail).count - 1].assume_init_ref() })
    }

    /// Reference to the element at `index`
    pub fn at(&self, index: usize) -> Result<&T> {
        if index >= self.len {
            return Err(VastError::out_of_bounds(index, self.len));
        }
        let (chunk, offset) = self.chunk_for_index(index);
        Ok(unsafe { (*chunk).data[offset].assume_init_ref() })
    }

    /// Mutable reference to the element at `index`
    pub fn at_mut(&mut self, index: usize) -> Result<&mut T> {
        if index >= self.len {
            return Err(VastError::out_of_bounds(index, self.len));
        }
        let (chunk, offset) = self.chunk_for_index(index);
        Ok(unsafe { (*chunk).data[offset].assume_init_mut() })
    }

    /// Replace the element at `index`, returning the previous value
    pub fn set(&mut self, index: usize, value: T) -> Result<T> {
        let slot = self.at_mut(index)?;
        Ok(std::mem::replace(slot, value))
    }

    /// Drop all elements and release every chunk
    pub fn clear(&mut self) {
        let mut chunk = self.head;
        while !chunk.is_null() {
            unsafe {
                let next = (*chunk).next;
                for i in 0..(*chunk).count {
                    (*chunk).data[i].assume_init_drop();
                }
                drop(Box::from_raw(chunk));
                chunk = next;
            }
        }
        self.head = ptr::null_mut();
        self.tail = ptr::null_mut();
        self.len = 0;
        self.chunks = 0;
    }

    /// Detach `other`'s whole chunk chain, leaving it empty.
    fn take_chain(other: &mut Self) -> (*mut Chunk<T, N>, *mut Chunk<T, N>, usize, usize) {
        let chain = (other.head, other.tail, other.len, other.chunks);
        other.head = ptr::null_mut();
        other.tail = ptr::null_mut();
        other.len = 0;
        other.chunks = 0;
        chain
    }

    /// Move every element of `other` onto the end of `self` by relinking
    /// its chunks; `other` is left empty
    pub fn append_list(&mut self, other: &mut Self) {
        let (head, tail, len, chunks) = Self::take_chain(other);
        if head.is_null() {
            return;
        }
        unsafe {
            (*head).prev = self.tail;
            if self.tail.is_null() {
                self.head = head;
            } else {
                (*self.tail).next = head;
            }
        }
        self.tail = tail;
        self.len += len;
        self.chunks += chunks;
    }

    /// Move every element of `other` onto the front of `self` by relinking
    /// its chunks; `other` is left empty
    pub fn prepend_list(&mut self, other: &mut Self) {
        let (head, tail, len, chunks) = Self::take_chain(other);
        if head.is_null() {
            return;
        }
        unsafe {
            (*tail).next = self.head;
            if self.head.is_null() {
                self.tail = tail;
            } else {
                (*self.head).prev = head;
            }
        }
        self.head = head;
        self.len += len;
        self.chunks += chunks;
    }

    /// Move every element of `other` to before position `index`; `other`
    /// is left empty
    pub fn insert_list(&mut self, index: usize, other: &mut Self) -> Result<()> {
        if index > self.len {
            return Err(VastError::out_of_bounds(index, self.len));
        }
        if index == 0 {
            self.prepend_list(other);
            return Ok(());
        }
        if index == self.len {
            self.append_list(other);
            return Ok(());
        }
        if other.is_empty() {
            return Ok(());
        }

        // Split at the boundary so the spliced chain lands between chunks.
        let (chunk, offset) = self.chunk_for_index(index);
        let left = if offset == 0 {
            unsafe { (*chunk).prev }
        } else {
            unsafe {
                let fresh = Chunk::alloc();
                let count = (*chunk).count;
                let src = (*chunk).data.as_ptr().add(offset);
                let dst = (*fresh).data.as_mut_ptr();
                ptr::copy_nonoverlapping(src, dst, count - offset);
                (*fresh).count = count - offset;
                (*chunk).count = offset;

                (*fresh).prev = chunk;
                (*fresh).next = (*chunk).next;
                if (*chunk).next.is_null() {
                    self.tail = fresh;
                } else {
                    (*(*chunk).next).prev = fresh;
                }
                (*chunk).next = fresh;
                self.chunks += 1;
                chunk
            }
        };

        let (head, tail, len, chunks) = Self::take_chain(other);
        unsafe {
            let right = if left.is_null() { self.head } else { (*left).next };
            (*head).prev = left;
            (*tail).next = right;
            if left.is_null() {
                self.head = head;
            } else {
                (*left).next = head;
            }
            // right is non-null here: index < len guarantees a successor.
            (*right).prev = tail;
        }
        self.len += len;
        self.chunks += chunks;
        Ok(())
    }

    /// Forward iterator over the elements
    pub fn iter(&self) -> Iter<'_, T, N> {
        Iter {
            front: self.head,
            front_idx: 0,
            back: self.tail,
            back_idx: if self.len == 0 {
                0
            } else {
                unsafe { (*self.tail).count - 1 }
            },
            remaining: self.len,
            _marker: PhantomData,
        }
    }
}

impl<T: Clone, const N: usize> ChunkedList<T, N> {
    /// Append a clone of every element of `other`
    pub fn append_each<const M: usize>(&mut self, other: &ChunkedList<T, M>) {
        for item in other.iter() {
            self.append(item.clone());
        }
    }

    /// Prepend clones of `other`'s elements, preserving their order
    pub fn prepend_each<const M: usize>(&mut self, other: &ChunkedList<T, M>) {
        for item in other.iter().rev() {
            self.prepend(item.clone());
        }
    }

    /// Insert clones of `other`'s elements before position `index`
    pub fn insert_each<const M: usize>(
        &mut self,
        index: usize,
        other: &ChunkedList<T, M>,
    ) -> Result<()> {
        if index > self.len {
            return Err(VastError::out_of_bounds(index, self.len));
        }
        let mut at = index;
        for item in other.iter() {
            self.insert(at, item.clone())?;
            at += 1;
        }
        Ok(())
    }
}

impl<T, const N: usize> Default for ChunkedList<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const N: usize> Drop for ChunkedList<T, N> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<T: Clone, const N: usize> Clone for ChunkedList<T, N> {
    fn clone(&self) -> Self {
        let mut out = Self::new();
        for item in self.iter() {
            out.append(item.clone());
        }
        out
    }
}

impl<T: fmt::Debug, const N: usize> fmt::Debug for ChunkedList<T, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T: PartialEq, const N: usize, const M: usize> PartialEq<ChunkedList<T, M>>
    for ChunkedList<T, N>
{
    fn eq(&self, other: &ChunkedList<T, M>) -> bool {
        self.len == other.len && self.iter().zip(other.iter()).all(|(a, b)| a == b)
    }
}

impl<T: Eq, const N: usize> Eq for ChunkedList<T, N> {}

impl<T: PartialOrd, const N: usize, const M: usize> PartialOrd<ChunkedList<T, M>>
    for ChunkedList<T, N>
{
    fn partial_cmp(&self, other: &ChunkedList<T, M>) -> Option<Ordering> {
        self.iter().partial_cmp(other.iter())
    }
}

impl<T, const N: usize> Extend<T> for ChunkedList<T, N> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for item in iter {
            self.append(item);
        }
    }
}

impl<T, const N: usize> FromIterator<T> for ChunkedList<T, N> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut list = Self::new();
        list.extend(iter);
        list
    }
}

unsafe impl<T: Send, const N: usize> Send for ChunkedList<T, N> {}
unsafe impl<T: Sync, const N: usize> Sync for ChunkedList<T, N> {}

/// Borrowing iterator over a [`ChunkedList`]
pub struct Iter<'a, T, const N: usize> {
    front: *mut Chunk<T, N>,
    front_idx: usize,
    back: *mut Chunk<T, N>,
    back_idx: usize,
    remaining: usize,
    _marker: PhantomData<&'a T>,
}

impl<'a, T, const N: usize> Iterator for Iter<'a, T, N> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        if self.remaining == 0 {
            return None;
        }
        let item = unsafe { (*self.front).data[self.front_idx].assume_init_ref() };
        self.front_idx += 1;
        if self.front_idx == unsafe { (*self.front).count } {
            self.front = unsafe { (*self.front).next };
            self.front_idx = 0;
        }
        self.remaining -= 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, T, const N: usize> DoubleEndedIterator for Iter<'a, T, N> {
    fn next_back(&mut self) -> Option<&'a T> {
        if self.remaining == 0 {
            return None;
        }
        let item = unsafe { (*self.back).data[self.back_idx].assume_init_ref() };
        if self.back_idx == 0 {
            self.back = unsafe { (*self.back).prev };
            if !self.back.is_null() {
                self.back_idx = unsafe { (*self.back).count - 1 };
            }
        } else {
            self.back_idx -= 1;
        }
        self.remaining -= 1;
        Some(item)
    }
}

impl<T, const N: usize> ExactSizeIterator for Iter<'_, T, N> {}

impl<'a, T, const N: usize> IntoIterator for &'a ChunkedList<T, N> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T, N>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Owning iterator over a [`ChunkedList`]
pub struct IntoIter<T, const N: usize> {
    list: ChunkedList<T, N>,
}

impl<T, const N: usize> Iterator for IntoIter<T, N> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.list.shift().ok()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.list.len(), Some(self.list.len()))
    }
}

impl<T, const N: usize> DoubleEndedIterator for IntoIter<T, N> {
    fn next_back(&mut self) -> Option<T> {
        self.list.pop().ok()
    }
}

impl<T, const N: usize> ExactSizeIterator for IntoIter<T, N> {}

impl<T, const N: usize> IntoIterator for ChunkedList<T, N> {
    type Item = T;
    type IntoIter = IntoIter<T, N>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter { list: self }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect<T: Copy, const N: usize>(list: &ChunkedList<T, N>) -> Vec<T> {
        list.iter().copied().collect()
    }

    #[test]
    fn test_append_fills_chunks() {
        let mut list: ChunkedList<i32, 4> = ChunkedList::new();
        for i in 0..9 {
            list.append(i);
        }
        assert_eq!(list.len(), 9);
        assert_eq!(list.chunk_count(), 3);
        assert_eq!(collect(&list), (0..9).collect::<Vec<_>>());
    }

    #[test]
    fn test_prepend() {
        let mut list: ChunkedList<i32, 4> = ChunkedList::new();
        for i in 0..6 {
            list.prepend(i);
        }
        assert_eq!(collect(&list), vec![5, 4, 3, 2, 1, 0]);
        assert_eq!(list.front(), Some(&5));
        assert_eq!(list.back(), Some(&0));
    }

    #[test]
    fn test_split_on_full_insert() {
        let mut list: ChunkedList<i32, 4> = (0..4).collect();
        assert_eq!(list.chunk_count(), 1);
        list.insert(2, 99).unwrap();
        assert_eq!(collect(&list), vec![0, 1, 99, 2, 3]);
        assert_eq!(list.chunk_count(), 2);
    }

    #[test]
    fn test_del_unlinks_empty_chunk() {
        let mut list: ChunkedList<i32, 2> = (0..4).collect();
        assert_eq!(list.chunk_count(), 2);
        assert_eq!(list.del(2).unwrap(), 2);
        assert_eq!(list.del(2).unwrap(), 3);
        assert_eq!(list.chunk_count(), 1);
        assert_eq!(collect(&list), vec![0, 1]);
        assert!(list.del(5).is_err());
    }

    #[test]
    fn test_pop_shift() {
        let mut list: ChunkedList<i32, 4> = (0..6).collect();
        assert_eq!(list.pop().unwrap(), 5);
        assert_eq!(list.shift().unwrap(), 0);
        assert_eq!(collect(&list), vec![1, 2, 3, 4]);

        let mut empty: ChunkedList<i32, 4> = ChunkedList::new();
        assert!(matches!(empty.pop(), Err(VastError::InvalidValue { .. })));
        assert!(matches!(empty.shift(), Err(VastError::InvalidValue { .. })));
    }

    #[test]
    fn test_at_walks_from_nearer_end() {
        let list: ChunkedList<i32, 8> = (0..100).collect();
        assert_eq!(*list.at(3).unwrap(), 3);
        assert_eq!(*list.at(96).unwrap(), 96);
        assert_eq!(*list.at(50).unwrap(), 50);
        assert!(list.at(100).is_err());
    }

    #[test]
    fn test_append_list_splices_and_empties() {
        let mut a: ChunkedList<i32, 4> = (0..3).collect();
        let mut b: ChunkedList<i32, 4> = (10..15).collect();
        let b_chunks = b.chunk_count();
        let a_chunks = a.chunk_count();
        a.append_list(&mut b);
        assert_eq!(collect(&a), vec![0, 1, 2, 10, 11, 12, 13, 14]);
        assert_eq!(a.chunk_count(), a_chunks + b_chunks);
        assert!(b.is_empty());
        assert_eq!(b.chunk_count(), 0);

        // Splicing the emptied source again is a no-op.
        a.append_list(&mut b);
        assert_eq!(a.len(), 8);
    }

    #[test]
    fn test_prepend_list() {
        let mut a: ChunkedList<i32, 4> = (0..3).collect();
        let mut b: ChunkedList<i32, 4> = (10..13).collect();
        a.prepend_list(&mut b);
        assert_eq!(collect(&a), vec![10, 11, 12, 0, 1, 2]);
        assert!(b.is_empty());

        let mut empty: ChunkedList<i32, 4> = ChunkedList::new();
        empty.prepend_list(&mut a);
        assert_eq!(collect(&empty), vec![10, 11, 12, 0, 1, 2]);
        assert!(a.is_empty());
    }

    #[test]
    fn test_insert_list_mid_chunk() {
        let mut a: ChunkedList<i32, 4> = (0..8).collect();
        let mut b: ChunkedList<i32, 4> = (100..103).collect();
        a.insert_list(2, &mut b).unwrap();
        assert_eq!(collect(&a), vec![0, 1, 100, 101, 102, 2, 3, 4, 5, 6, 7]);
        assert!(b.is_empty());
        assert!(a.insert_list(100, &mut b).is_err());
    }

    #[test]
    fn test_insert_list_at_chunk_boundary() {
        let mut a: ChunkedList<i32, 2> = (0..4).collect();
        let mut b: ChunkedList<i32, 2> = (10..12).collect();
        a.insert_list(2, &mut b).unwrap();
        assert_eq!(collect(&a), vec![0, 1, 10, 11, 2, 3]);
    }

    #[test]
    fn test_copying_bulk_ops() {
        let mut a: ChunkedList<i32, 4> = (0..2).collect();
        let b: ChunkedList<i32, 8> = (10..13).collect();
        a.append_each(&b);
        assert_eq!(collect(&a), vec![0, 1, 10, 11, 12]);
        assert_eq!(b.len(), 3);

        a.prepend_each(&b);
        assert_eq!(collect(&a), vec![10, 11, 12, 0, 1, 10, 11, 12]);

        let mut c: ChunkedList<i32, 4> = (0..2).collect();
        c.insert_each(1, &b).unwrap();
        assert_eq!(collect(&c), vec![0, 10, 11, 12, 1]);
    }

    #[test]
    fn test_eq_across_chunk_sizes() {
        let a: ChunkedList<i32, 2> = (0..10).collect();
        let b: ChunkedList<i32, 16> = (0..10).collect();
        assert_eq!(a, b);
        let c: ChunkedList<i32, 16> = (0..9).collect();
        assert_ne!(a, c);
        assert!(c < a);
    }

    #[test]
    fn test_double_ended_iteration() {
        let list: ChunkedList<i32, 4> = (0..10).collect();
        let rev: Vec<_> = list.iter().rev().copied().collect();
        assert_eq!(rev, (0..10).rev().collect::<Vec<_>>());

        let mut it = list.iter();
        assert_eq!(it.next(), Some(&0));
        assert_eq!(it.next_back(), Some(&9));
        assert_eq!(it.next_back(), Some(&8));
        assert_eq!(it.count(), 7);
    }

    #[test]
    fn test_clear_and_reuse() {
        let mut list: ChunkedList<String, 4> =
            (0..6).map(|i| i.to_string()).collect();
        list.clear();
        assert!(list.is_empty());
        assert_eq!(list.chunk_count(), 0);
        list.append("x".to_string());
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_drop_releases_values() {
        use std::rc::Rc;
        let probe = Rc::new(());
        {
            let mut list: ChunkedList<Rc<()>, 4> = ChunkedList::new();
            for _ in 0..10 {
                list.append(probe.clone());
            }
            assert_eq!(Rc::strong_count(&probe), 11);
        }
        assert_eq!(Rc::strong_count(&probe), 1);
    }

    #[test]
    fn test_set() {
        let mut list: ChunkedList<i32, 4> = (0..5).collect();
        assert_eq!(list.set(3, 99).unwrap(), 3);
        assert_eq!(*list.at(3).unwrap(), 99);
        assert!(list.set(9, 0).is_err());
    }
}
