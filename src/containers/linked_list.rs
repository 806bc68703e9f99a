//! LinkedList: doubly-linked deque with free-list node recycling
//!
//! Detached nodes are not returned to the allocator; they go onto an
//! internal free list and are reused by later insertions. Workloads that
//! churn elements at the ends pay for node allocation once. `reserve`
//! pre-populates the free list and `shrink` releases it.

use crate::error::{Result, VastError};
use std::cmp::Ordering;
use std::fmt;
use std::marker::PhantomData;
use std::mem::MaybeUninit;
use std::ptr;

struct Node<T> {
    value: MaybeUninit<T>,
    prev: *mut Node<T>,
    next: *mut Node<T>,
}

/// Doubly-linked list that recycles detached nodes.
///
/// Positional operations walk from whichever end is closer, so `node_at`
/// touches at most `len / 2` links.
///
/// # Examples
///
/// ```
/// use vastkit::LinkedList;
///
/// let mut list = LinkedList::new();
/// list.append(2);
/// list.prepend(1);
/// list.append(3);
/// assert_eq!(list.shift()?, 1);
/// assert_eq!(list.pop()?, 3);
/// assert_eq!(list.free_count(), 2);
/// # Ok::<(), vastkit::VastError>(())
/// ```
pub struct LinkedList<T> {
    head: *mut Node<T>,
    tail: *mut Node<T>,
    len: usize,
    free_head: *mut Node<T>,
    free_len: usize,
    _marker: PhantomData<T>,
}

impl<T> LinkedList<T> {
    /// Create an empty list
    pub fn new() -> Self {
        Self {
            head: ptr::null_mut(),
            tail: ptr::null_mut(),
            len: 0,
            free_head: ptr::null_mut(),
            free_len: 0,
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

    /// Number of recycled nodes waiting on the free list
    #[inline]
    pub fn free_count(&self) -> usize {
        self.free_len
    }

    fn alloc_node() -> *mut Node<T> {
        Box::into_raw(Box::new(Node {
            value: MaybeUninit::uninit(),
            prev: ptr::null_mut(),
            next: ptr::null_mut(),
        }))
    }

    /// Take a node from the free list, or allocate a fresh one.
    fn get_node(&mut self) -> *mut Node<T> {
        if self.free_head.is_null() {
            return Self::alloc_node();
        }
        let node = self.free_head;
        unsafe {
            self.free_head = (*node).next;
            (*node).next = ptr::null_mut();
            (*node).prev = ptr::null_mut();
        }
        self.free_len -= 1;
        node
    }

    /// Push a detached node (value already moved out) onto the free list.
    fn return_node(&mut self, node: *mut Node<T>) {
        unsafe {
            (*node).prev = ptr::null_mut();
            (*node).next = self.free_head;
        }
        self.free_head = node;
        self.free_len += 1;
    }

    /// Node at `index`; walks from the nearer end. Caller checks bounds.
    fn node_at(&self, index: usize) -> *mut Node<T> {
        debug_assert!(index < self.len);
        if index <= self.len / 2 {
            let mut node = self.head;
            for _ in 0..index {
                node = unsafe { (*node).next };
            }
            node
        } else {
            let mut node = self.tail;
            for _ in 0..(self.len - 1 - index) {
                node = unsafe { (*node).prev };
            }
            node
        }
    }

    /// Append a value at the tail
    pub fn append(&mut self, value: T) {
        let node = self.get_node();
        unsafe {
            (*node).value.write(value);
            (*node).prev = self.tail;
            if self.tail.is_null() {
                self.head = node;
            } else {
                (*self.tail).next = node;
            }
        }
        self.tail = node;
        self.len += 1;
    }

    /// Prepend a value at the head
    pub fn prepend(&mut self, value: T) {
        let node = self.get_node();
        unsafe {
            (*node).value.write(value);
            (*node).next = self.head;
            if self.head.is_null() {
                self.tail = node;
            } else {
                (*self.head).prev = node;
            }
        }
        self.head = node;
        self.len += 1;
    }

    /// Insert a value before position `index`; `index == len` appends
    pub fn insert(&mut self, index: usize, value: T) -> Result<()> {
        if index > self.len {
            return Err(VastError::out_of_bounds(index, self.len));
        }
        if index == 0 {
            self.prepend(value);
            return Ok(());
        }
        if index == self.len {
            self.append(value);
            return Ok(());
        }
        let after = self.node_at(index);
        let node = self.get_node();
        unsafe {
            (*node).value.write(value);
            let before = (*after).prev;
            (*node).prev = before;
            (*node).next = after;
            (*before).next = node;
            (*after).prev = node;
        }
        self.len += 1;
        Ok(())
    }

    /// Unlink `node` from the active chain. Does not touch its value.
    unsafe fn unlink(&mut self, node: *mut Node<T>) {
        unsafe {
            let prev = (*node).prev;
            let next = (*node).next;
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
        }
        self.len -= 1;
    }

    /// Remove and return the element at `index`
    pub fn del(&mut self, index: usize) -> Result<T> {
        if index >= self.len {
            return Err(VastError::out_of_bounds(index, self.len));
        }
        let node = self.node_at(index);
        let value = unsafe {
            self.unlink(node);
            (*node).value.assume_init_read()
        };
        self.return_node(node);
        Ok(value)
    }

    /// Remove and return the last element
    pub fn pop(&mut self) -> Result<T> {
        if self.len == 0 {
            return Err(VastError::invalid_value("pop() on empty list"));
        }
        let node = self.tail;
        let value = unsafe {
            self.unlink(node);
            (*node).value.assume_init_read()
        };
        self.return_node(node);
        Ok(value)
    }

    /// Remove and return the first element
    pub fn shift(&mut self) -> Result<T> {
        if self.len == 0 {
            return Err(VastError::invalid_value("shift() on empty list"));
        }
        let node = self.head;
        let value = unsafe {
            self.unlink(node);
            (*node).value.assume_init_read()
        };
        self.return_node(node);
        Ok(value)
    }

    /// First element, if any
    pub fn front(&self) -> Option<&T> {
        if self.head.is_null() {
            None
        } else {
            Some(unsafe { (*self.head).value.assume_init_ref() })
        }
    }

    /// Last element, if any
    pub fn back(&self) -> Option<&T> {
        if self.tail.is_null() {
            None
        } else {
            Some(unsafe { (*self.tail).value.assume_init_ref() })
        }
    }

    /// Reference to the element at `index`
    pub fn at(&self, index: usize) -> Result<&T> {
        if index >= self.len {
            return Err(VastError::out_of_bounds(index, self.len));
        }
        Ok(unsafe { (*self.node_at(index)).value.assume_init_ref() })
    }

    /// Mutable reference to the element at `index`
    pub fn at_mut(&mut self, index: usize) -> Result<&mut T> {
        if index >= self.len {
            return Err(VastError::out_of_bounds(index, self.len));
        }
        Ok(unsafe { (*self.node_at(index)).value.assume_init_mut() })
    }

    /// Replace the element at `index`, returning the previous value
    pub fn set(&mut self, index: usize, value: T) -> Result<T> {
        let slot = self.at_mut(index)?;
        Ok(std::mem::replace(slot, value))
    }

    /// Remove all elements.
    ///
    /// With `destroy_nodes == false` the detached nodes go to the free list
    /// for reuse; with `true` they are released to the allocator.
    pub fn clear(&mut self, destroy_nodes: bool) {
        let mut node = self.head;
        while !node.is_null() {
            let next = unsafe { (*node).next };
            unsafe {
                (*node).value.assume_init_drop();
            }
            if destroy_nodes {
                drop(unsafe { Box::from_raw(node) });
            } else {
                self.return_node(node);
            }
            node = next;
        }
        self.head = ptr::null_mut();
        self.tail = ptr::null_mut();
        self.len = 0;
    }

    /// Preallocate `additional` nodes into the free list
    pub fn reserve(&mut self, additional: usize) {
        for _ in 0..additional {
            let node = Self::alloc_node();
            self.return_node(node);
        }
    }

    /// Release every node on the free list back to the allocator
    pub fn shrink(&mut self) {
        let mut node = self.free_head;
        while !node.is_null() {
            let next = unsafe { (*node).next };
            // Free-list nodes hold no value.
            drop(unsafe { Box::from_raw(node) });
            node = next;
        }
        self.free_head = ptr::null_mut();
        self.free_len = 0;
    }

    /// Forward iterator over the elements
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            front: self.head,
            back: self.tail,
            remaining: self.len,
            _marker: PhantomData,
        }
    }

    /// Forward iterator with mutable access
    pub fn iter_mut(&mut self) -> IterMut<'_, T> {
        IterMut {
            front: self.head,
            back: self.tail,
            remaining: self.len,
            _marker: PhantomData,
        }
    }
}

impl<T> Default for LinkedList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for LinkedList<T> {
    fn drop(&mut self) {
        self.clear(true);
        self.shrink();
    }
}

impl<T: Clone> Clone for LinkedList<T> {
    fn clone(&self) -> Self {
        let mut out = Self::new();
        for item in self {
            out.append(item.clone());
        }
        out
    }
}

impl<T: fmt::Debug> fmt::Debug for LinkedList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T: PartialEq> PartialEq for LinkedList<T> {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.iter().zip(other.iter()).all(|(a, b)| a == b)
    }
}

impl<T: Eq> Eq for LinkedList<T> {}

impl<T: PartialOrd> PartialOrd for LinkedList<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.iter().partial_cmp(other.iter())
    }
}

impl<T: Ord> Ord for LinkedList<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.iter().cmp(other.iter())
    }
}

impl<T> Extend<T> for LinkedList<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for item in iter {
            self.append(item);
        }
    }
}

impl<T> FromIterator<T> for LinkedList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut list = Self::new();
        list.extend(iter);
        list
    }
}

unsafe impl<T: Send> Send for LinkedList<T> {}
unsafe impl<T: Sync> Sync for LinkedList<T> {}

/// Borrowing iterator over a [`LinkedList`]
pub struct Iter<'a, T> {
    front: *mut Node<T>,
    back: *mut Node<T>,
    remaining: usize,
    _marker: PhantomData<&'a T>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        if self.remaining == 0 {
            return None;
        }
        let node = self.front;
        self.front = unsafe { (*node).next };
        self.remaining -= 1;
        Some(unsafe { (*node).value.assume_init_ref() })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, T> DoubleEndedIterator for Iter<'a, T> {
    fn next_back(&mut self) -> Option<&'a T> {
        if self.remaining == 0 {
            return None;
        }
        let node = self.back;
        self.back = unsafe { (*node).prev };
        self.remaining -= 1;
        Some(unsafe { (*node).value.assume_init_ref() })
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

/// Mutably borrowing iterator over a [`LinkedList`]
pub struct IterMut<'a, T> {
    front: *mut Node<T>,
    back: *mut Node<T>,
    remaining: usize,
    _marker: PhantomData<&'a mut T>,
}

impl<'a, T> Iterator for IterMut<'a, T> {
    type Item = &'a mut T;

    fn next(&mut self) -> Option<&'a mut T> {
        if self.remaining == 0 {
            return None;
        }
        let node = self.front;
        self.front = unsafe { (*node).next };
        self.remaining -= 1;
        Some(unsafe { (*node).value.assume_init_mut() })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, T> DoubleEndedIterator for IterMut<'a, T> {
    fn next_back(&mut self) -> Option<&'a mut T> {
        if self.remaining == 0 {
            return None;
        }
        let node = self.back;
        self.back = unsafe { (*node).prev };
        self.remaining -= 1;
        Some(unsafe { (*node).value.assume_init_mut() })
    }
}

impl<T> ExactSizeIterator for IterMut<'_, T> {}

impl<'a, T> IntoIterator for &'a LinkedList<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, T> IntoIterator for &'a mut LinkedList<T> {
    type Item = &'a mut T;
    type IntoIter = IterMut<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

/// Owning iterator over a [`LinkedList`]
pub struct IntoIter<T> {
    list: LinkedList<T>,
}

impl<T> Iterator for IntoIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.list.shift().ok()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.list.len(), Some(self.list.len()))
    }
}

impl<T> DoubleEndedIterator for IntoIter<T> {
    fn next_back(&mut self) -> Option<T> {
        self.list.pop().ok()
    }
}

impl<T> ExactSizeIterator for IntoIter<T> {}

impl<T> IntoIterator for LinkedList<T> {
    type Item = T;
    type IntoIter = IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter { list: self }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_prepend_order() {
        let mut list = LinkedList::new();
        list.append(2);
        list.append(3);
        list.prepend(1);
        assert_eq!(list.iter().copied().collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(list.front(), Some(&1));
        assert_eq!(list.back(), Some(&3));
    }

    #[test]
    fn test_pop_shift_errors_on_empty() {
        let mut list: LinkedList<i32> = LinkedList::new();
        assert!(matches!(list.pop(), Err(VastError::InvalidValue { .. })));
        assert!(matches!(list.shift(), Err(VastError::InvalidValue { .. })));
    }

    #[test]
    fn test_free_list_recycling() {
        let mut list = LinkedList::new();
        for i in 0..4 {
            list.append(i);
        }
        assert_eq!(list.free_count(), 0);
        list.pop().unwrap();
        list.shift().unwrap();
        assert_eq!(list.free_count(), 2);

        // Insertions should consume recycled nodes before allocating.
        list.append(9);
        assert_eq!(list.free_count(), 1);
        list.prepend(8);
        assert_eq!(list.free_count(), 0);
        assert_eq!(list.iter().copied().collect::<Vec<_>>(), vec![8, 1, 2, 9]);
    }

    #[test]
    fn test_reserve_and_shrink() {
        let mut list: LinkedList<i32> = LinkedList::new();
        list.reserve(10);
        assert_eq!(list.free_count(), 10);
        list.append(1);
        assert_eq!(list.free_count(), 9);
        list.shrink();
        assert_eq!(list.free_count(), 0);
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_insert_and_del() {
        let mut list: LinkedList<i32> = (0..5).collect();
        list.insert(2, 99).unwrap();
        assert_eq!(list.iter().copied().collect::<Vec<_>>(), vec![0, 1, 99, 2, 3, 4]);
        assert_eq!(list.del(2).unwrap(), 99);
        assert_eq!(list.del(0).unwrap(), 0);
        assert_eq!(list.del(list.len() - 1).unwrap(), 4);
        assert!(list.del(10).is_err());
        assert!(list.insert(10, 0).is_err());
        list.insert(list.len(), 7).unwrap();
        assert_eq!(list.back(), Some(&7));
    }

    #[test]
    fn test_at_and_set_walk_both_ends() {
        let mut list: LinkedList<i32> = (0..100).collect();
        assert_eq!(*list.at(3).unwrap(), 3);
        assert_eq!(*list.at(97).unwrap(), 97);
        assert_eq!(list.set(50, -1).unwrap(), 50);
        assert_eq!(*list.at(50).unwrap(), -1);
        assert!(list.at(100).is_err());
    }

    #[test]
    fn test_clear_recycle_vs_destroy() {
        let mut list: LinkedList<i32> = (0..5).collect();
        list.clear(false);
        assert!(list.is_empty());
        assert_eq!(list.free_count(), 5);

        // Refilling consumes recycled nodes first.
        list.extend(0..3);
        assert_eq!(list.free_count(), 2);

        // clear(true) destroys the active chain only; the free list keeps
        // its remaining nodes.
        list.clear(true);
        assert!(list.is_empty());
        assert_eq!(list.free_count(), 2);
    }

    #[test]
    fn test_double_ended_iteration() {
        let list: LinkedList<i32> = (0..5).collect();
        let rev: Vec<_> = list.iter().rev().copied().collect();
        assert_eq!(rev, vec![4, 3, 2, 1, 0]);

        let mut it = list.iter();
        assert_eq!(it.next(), Some(&0));
        assert_eq!(it.next_back(), Some(&4));
        assert_eq!(it.count(), 3);
    }

    #[test]
    fn test_iter_mut() {
        let mut list: LinkedList<i32> = (0..4).collect();
        for v in &mut list {
            *v *= 10;
        }
        assert_eq!(list.iter().copied().collect::<Vec<_>>(), vec![0, 10, 20, 30]);
    }

    #[test]
    fn test_into_iter() {
        let list: LinkedList<i32> = (0..4).collect();
        let v: Vec<_> = list.into_iter().collect();
        assert_eq!(v, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_eq_and_ord() {
        let a: LinkedList<i32> = (0..3).collect();
        let b = a.clone();
        assert_eq!(a, b);
        let c: LinkedList<i32> = vec![0, 1, 3].into_iter().collect();
        assert!(a < c);
        let d: LinkedList<i32> = (0..2).collect();
        assert!(d < a);
    }

    #[test]
    fn test_drop_releases_values() {
        use std::rc::Rc;
        let probe = Rc::new(());
        {
            let mut list = LinkedList::new();
            for _ in 0..5 {
                list.append(probe.clone());
            }
            assert_eq!(Rc::strong_count(&probe), 6);
            list.pop().unwrap();
            assert_eq!(Rc::strong_count(&probe), 5);
        }
        assert_eq!(Rc::strong_count(&probe), 1);
    }
}
