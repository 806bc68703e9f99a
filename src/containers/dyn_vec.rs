//! DynVec: contiguous dynamic sequence with realloc-based growth
//!
//! Growth goes through `realloc`, which lets the allocator extend the block
//! in place when it can instead of always allocating and copying. All
//! mutators that may allocate return `Result` so callers see allocation
//! failure instead of aborting.

use crate::error::{Result, VastError};
use std::alloc::{self, Layout};
use std::cmp::Ordering;
use std::fmt;
use std::mem;
use std::ops::{Deref, DerefMut, Index, IndexMut};
use std::ptr::{self, NonNull};
use std::slice;

/// Contiguous owned sequence of `T` with explicit capacity control.
///
/// Indices `[0, len)` are initialized; `[len, cap)` are raw storage.
///
/// # Examples
///
/// ```
/// use vastkit::DynVec;
///
/// let mut v = DynVec::new();
/// v.push(1)?;
/// v.push(2)?;
/// assert_eq!(v.as_slice(), &[1, 2]);
/// # Ok::<(), vastkit::VastError>(())
/// ```
pub struct DynVec<T> {
    ptr: NonNull<T>,
    len: usize,
    cap: usize,
}

impl<T> DynVec<T> {
    /// Create a new empty sequence without allocating
    #[inline]
    pub const fn new() -> Self {
        Self { ptr: NonNull::dangling(), len: 0, cap: 0 }
    }

    /// Create a sequence with room for `cap` elements
    pub fn with_capacity(cap: usize) -> Result<Self> {
        let mut v = Self::new();
        if cap > 0 {
            v.grow_exact(cap)?;
        }
        Ok(v)
    }

    /// Create a sequence of `len` copies of `value`
    pub fn filled(len: usize, value: T) -> Result<Self>
    where
        T: Clone,
    {
        let mut v = Self::with_capacity(len)?;
        v.resize(len, value)?;
        Ok(v)
    }

    /// Number of initialized elements
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the sequence holds no elements
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Currently allocated capacity in elements
    #[inline]
    pub fn capacity(&self) -> usize {
        self.cap
    }

    /// View the initialized prefix as a slice
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        // NonNull::dangling is a valid (aligned, non-null) base for len 0.
        unsafe { slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    /// View the initialized prefix as a mutable slice
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        unsafe { slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }

    fn layout_for(cap: usize) -> Result<Layout> {
        Layout::array::<T>(cap)
            .map_err(|_| VastError::out_of_memory(cap.saturating_mul(mem::size_of::<T>())))
    }

    /// Reallocate to exactly `new_cap` elements. `new_cap >= self.len`.
    fn grow_exact(&mut self, new_cap: usize) -> Result<()> {
        debug_assert!(new_cap >= self.len);
        if mem::size_of::<T>() == 0 {
            // ZSTs never need storage; treat capacity as unbounded.
            self.cap = usize::MAX;
            return Ok(());
        }

        let new_layout = Self::layout_for(new_cap)?;
        let new_ptr = if self.cap == 0 {
            unsafe { alloc::alloc(new_layout) as *mut T }
        } else {
            let old_layout = Self::layout_for(self.cap)?;
            unsafe {
                alloc::realloc(self.ptr.as_ptr() as *mut u8, old_layout, new_layout.size())
                    as *mut T
            }
        };

        match NonNull::new(new_ptr) {
            Some(p) => {
                self.ptr = p;
                self.cap = new_cap;
                Ok(())
            }
            None => Err(VastError::out_of_memory(new_layout.size())),
        }
    }

    /// Ensure capacity for at least `additional` more elements
    pub fn reserve(&mut self, additional: usize) -> Result<()> {
        let required = self
            .len
            .checked_add(additional)
            .ok_or(VastError::OutOfMemory { size: usize::MAX })?;
        if required <= self.cap {
            return Ok(());
        }
        // Exponential growth keeps amortized push O(1).
        let target = required.max(self.cap.saturating_mul(2)).max(4);
        self.grow_exact(target)
    }

    /// Ensure the total capacity is at least `min_cap`
    pub fn ensure_capacity(&mut self, min_cap: usize) -> Result<()> {
        if min_cap <= self.cap {
            return Ok(());
        }
        let target = min_cap.max(self.cap.saturating_mul(2));
        self.grow_exact(target)
    }

    /// Append an element
    pub fn push(&mut self, value: T) -> Result<()> {
        if self.len == self.cap {
            self.reserve(1)?;
        }
        unsafe {
            ptr::write(self.ptr.as_ptr().add(self.len), value);
        }
        self.len += 1;
        Ok(())
    }

    /// Remove and return the last element
    pub fn pop(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        Some(unsafe { ptr::read(self.ptr.as_ptr().add(self.len)) })
    }

    /// Insert `value` at `index`, shifting the tail right
    pub fn insert(&mut self, index: usize, value: T) -> Result<()> {
        if index > self.len {
            return Err(VastError::out_of_bounds(index, self.len));
        }
        if self.len == self.cap {
            self.reserve(1)?;
        }
        unsafe {
            let base = self.ptr.as_ptr().add(index);
            ptr::copy(base, base.add(1), self.len - index);
            ptr::write(base, value);
        }
        self.len += 1;
        Ok(())
    }

    /// Remove and return the element at `index`, shifting the tail left
    pub fn remove(&mut self, index: usize) -> Result<T> {
        if index >= self.len {
            return Err(VastError::out_of_bounds(index, self.len));
        }
        unsafe {
            let base = self.ptr.as_ptr().add(index);
            let value = ptr::read(base);
            ptr::copy(base.add(1), base, self.len - index - 1);
            self.len -= 1;
            Ok(value)
        }
    }

    /// Grow or shrink to `new_len`, filling new slots with clones of `value`
    pub fn resize(&mut self, new_len: usize, value: T) -> Result<()>
    where
        T: Clone,
    {
        if new_len > self.len {
            self.ensure_capacity(new_len)?;
            for i in self.len..new_len {
                unsafe {
                    ptr::write(self.ptr.as_ptr().add(i), value.clone());
                }
            }
            self.len = new_len;
        } else {
            self.truncate(new_len);
        }
        Ok(())
    }

    /// Drop every element past `new_len`
    pub fn truncate(&mut self, new_len: usize) {
        while self.len > new_len {
            self.len -= 1;
            unsafe {
                ptr::drop_in_place(self.ptr.as_ptr().add(self.len));
            }
        }
    }

    /// Drop all elements, keeping the allocation
    pub fn clear(&mut self) {
        self.truncate(0);
    }

    /// Release capacity beyond the current length
    pub fn shrink_to_fit(&mut self) -> Result<()> {
        if self.cap == self.len || mem::size_of::<T>() == 0 {
            return Ok(());
        }
        if self.len == 0 {
            unsafe {
                alloc::dealloc(self.ptr.as_ptr() as *mut u8, Self::layout_for(self.cap)?);
            }
            self.ptr = NonNull::dangling();
            self.cap = 0;
            return Ok(());
        }
        self.grow_exact(self.len)
    }

    /// Append clones of every element in `other`
    pub fn extend_from_slice(&mut self, other: &[T]) -> Result<()>
    where
        T: Clone,
    {
        self.reserve(other.len())?;
        for item in other {
            unsafe {
                ptr::write(self.ptr.as_ptr().add(self.len), item.clone());
            }
            self.len += 1;
        }
        Ok(())
    }

    /// Move every element of `other` onto the end of `self`, emptying `other`
    pub fn append(&mut self, other: &mut DynVec<T>) -> Result<()> {
        self.reserve(other.len)?;
        unsafe {
            ptr::copy_nonoverlapping(
                other.ptr.as_ptr(),
                self.ptr.as_ptr().add(self.len),
                other.len,
            );
        }
        self.len += other.len;
        other.len = 0;
        Ok(())
    }
}

impl<T> Default for DynVec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for DynVec<T> {
    fn drop(&mut self) {
        self.clear();
        if self.cap > 0 && mem::size_of::<T>() > 0 {
            // Layout succeeded when this capacity was allocated.
            if let Ok(layout) = Self::layout_for(self.cap) {
                unsafe {
                    alloc::dealloc(self.ptr.as_ptr() as *mut u8, layout);
                }
            }
        }
    }
}

impl<T> Deref for DynVec<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T> DerefMut for DynVec<T> {
    fn deref_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<T> Index<usize> for DynVec<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        &self.as_slice()[index]
    }
}

impl<T> IndexMut<usize> for DynVec<T> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        &mut self.as_mut_slice()[index]
    }
}

impl<T: fmt::Debug> fmt::Debug for DynVec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.as_slice()).finish()
    }
}

impl<T: PartialEq> PartialEq for DynVec<T> {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: Eq> Eq for DynVec<T> {}

impl<T: PartialOrd> PartialOrd for DynVec<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.as_slice().partial_cmp(other.as_slice())
    }
}

impl<T: Ord> Ord for DynVec<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_slice().cmp(other.as_slice())
    }
}

impl<T: Clone> Clone for DynVec<T> {
    fn clone(&self) -> Self {
        let mut v = Self::new();
        if v.extend_from_slice(self.as_slice()).is_err() {
            // Clone cannot surface Result; an allocation failure here has no
            // recovery path short of aborting anyway.
            std::process::abort();
        }
        v
    }
}

impl<'a, T> IntoIterator for &'a DynVec<T> {
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.as_slice().iter()
    }
}

impl<'a, T> IntoIterator for &'a mut DynVec<T> {
    type Item = &'a mut T;
    type IntoIter = slice::IterMut<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.as_mut_slice().iter_mut()
    }
}

unsafe impl<T: Send> Send for DynVec<T> {}
unsafe impl<T: Sync> Sync for DynVec<T> {}
