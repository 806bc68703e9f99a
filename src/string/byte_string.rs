//! ByteString: owned, growable byte-string buffer
//!
//! A mutable (len, cap, ptr) byte buffer with the same realloc growth
//! discipline as `DynVec`, specialized to bytes. The buffer holds arbitrary
//! bytes and is not NUL-terminated; UTF-8 validity is checked only when the
//! caller asks for `&str`.

use crate::error::{Result, VastError};
use crate::string::ByteStr;
use std::alloc::{self, Layout};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::ptr::{self, NonNull};
use std::slice;
use std::str;

/// Owned mutable byte string.
///
/// # Examples
///
/// ```
/// use vastkit::ByteString;
///
/// let mut s = ByteString::new();
/// s.push_str("hello")?;
/// s.push(b' ')?;
/// s.push_str("world")?;
/// assert_eq!(s.as_str(), Some("hello world"));
/// # Ok::<(), vastkit::VastError>(())
/// ```
pub struct ByteString {
    ptr: NonNull<u8>,
    len: usize,
    cap: usize,
}

impl ByteString {
    /// Create an empty byte string without allocating
    #[inline]
    pub const fn new() -> Self {
        Self { ptr: NonNull::dangling(), len: 0, cap: 0 }
    }

    /// Create an empty byte string with room for `cap` bytes
    pub fn with_capacity(cap: usize) -> Result<Self> {
        let mut s = Self::new();
        if cap > 0 {
            s.grow_exact(cap)?;
        }
        Ok(s)
    }

    /// Create a byte string holding a copy of `bytes`
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut s = Self::with_capacity(bytes.len())?;
        s.push_bytes(bytes)?;
        Ok(s)
    }

    /// Create a byte string holding a copy of `text`'s bytes
    pub fn from_str(text: &str) -> Result<Self> {
        Self::from_bytes(text.as_bytes())
    }

    /// Length in bytes
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the string is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Currently allocated capacity in bytes
    #[inline]
    pub fn capacity(&self) -> usize {
        self.cap
    }

    /// View the contents as a byte slice
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        unsafe { slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    /// Borrow the contents as a [`ByteStr`] view
    #[inline]
    pub fn as_byte_str(&self) -> ByteStr<'_> {
        ByteStr::new(self.as_bytes())
    }

    /// Reinterpret as `&str` if the contents are valid UTF-8
    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        str::from_utf8(self.as_bytes()).ok()
    }

    fn grow_exact(&mut self, new_cap: usize) -> Result<()> {
        debug_assert!(new_cap >= self.len);
        let new_layout = Layout::array::<u8>(new_cap)
            .map_err(|_| VastError::out_of_memory(new_cap))?;
        let new_ptr = if self.cap == 0 {
            unsafe { alloc::alloc(new_layout) }
        } else {
            // Layout for the old capacity was validated when it was allocated.
            let old_layout = unsafe { Layout::array::<u8>(self.cap).unwrap_unchecked() };
            unsafe { alloc::realloc(self.ptr.as_ptr(), old_layout, new_cap) }
        };
        match NonNull::new(new_ptr) {
            Some(p) => {
                self.ptr = p;
                self.cap = new_cap;
                Ok(())
            }
            None => Err(VastError::out_of_memory(new_cap)),
        }
    }

    /// Ensure capacity for at least `additional` more bytes
    pub fn reserve(&mut self, additional: usize) -> Result<()> {
        let required = self
            .len
            .checked_add(additional)
            .ok_or(VastError::OutOfMemory { size: usize::MAX })?;
        if required <= self.cap {
            return Ok(());
        }
        let target = required.max(self.cap.saturating_mul(2)).max(16);
        self.grow_exact(target)
    }

    /// Append a single byte
    pub fn push(&mut self, byte: u8) -> Result<()> {
        if self.len == self.cap {
            self.reserve(1)?;
        }
        unsafe {
            ptr::write(self.ptr.as_ptr().add(self.len), byte);
        }
        self.len += 1;
        Ok(())
    }

    /// Append a byte slice
    pub fn push_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.reserve(bytes.len())?;
        unsafe {
            ptr::copy_nonoverlapping(
                bytes.as_ptr(),
                self.ptr.as_ptr().add(self.len),
                bytes.len(),
            );
        }
        self.len += bytes.len();
        Ok(())
    }

    /// Append the bytes of a string slice
    pub fn push_str(&mut self, text: &str) -> Result<()> {
        self.push_bytes(text.as_bytes())
    }

    /// Remove and return the last byte
    pub fn pop(&mut self) -> Option<u8> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        Some(unsafe { ptr::read(self.ptr.as_ptr().add(self.len)) })
    }

    /// Cut the string down to `new_len` bytes
    pub fn truncate(&mut self, new_len: usize) {
        if new_len < self.len {
            self.len = new_len;
        }
    }

    /// Empty the string, keeping the allocation
    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Release capacity beyond the current length
    pub fn shrink_to_fit(&mut self) -> Result<()> {
        if self.cap == self.len {
            return Ok(());
        }
        if self.len == 0 {
            let layout = unsafe { Layout::array::<u8>(self.cap).unwrap_unchecked() };
            unsafe {
                alloc::dealloc(self.ptr.as_ptr(), layout);
            }
            self.ptr = NonNull::dangling();
            self.cap = 0;
            return Ok(());
        }
        self.grow_exact(self.len)
    }
}

impl Default for ByteString {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ByteString {
    fn drop(&mut self) {
        if self.cap > 0 {
            let layout = unsafe { Layout::array::<u8>(self.cap).unwrap_unchecked() };
            unsafe {
                alloc::dealloc(self.ptr.as_ptr(), layout);
            }
        }
    }
}

impl Deref for ByteString {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl Clone for ByteString {
    fn clone(&self) -> Self {
        match Self::from_bytes(self.as_bytes()) {
            Ok(s) => s,
            Err(_) => std::process::abort(),
        }
    }
}

impl PartialEq for ByteString {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl Eq for ByteString {}

impl PartialEq<[u8]> for ByteString {
    fn eq(&self, other: &[u8]) -> bool {
        self.as_bytes() == other
    }
}

impl PartialEq<&str> for ByteString {
    fn eq(&self, other: &&str) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl PartialOrd for ByteString {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ByteString {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_bytes().cmp(other.as_bytes())
    }
}

impl Hash for ByteString {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_bytes().hash(state);
    }
}

impl fmt::Debug for ByteString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ByteString({:?})", String::from_utf8_lossy(self.as_bytes()))
    }
}

impl fmt::Display for ByteString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(self.as_bytes()))
    }
}

unsafe impl Send for ByteString {}
unsafe impl Sync for ByteString {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_up() {
        let mut s = ByteString::new();
        assert!(s.is_empty());
        s.push_str("abc").unwrap();
        s.push(b'd').unwrap();
        s.push_bytes(b"ef").unwrap();
        assert_eq!(s.as_str(), Some("abcdef"));
        assert_eq!(s.len(), 6);
    }

    #[test]
    fn test_pop_truncate_clear() {
        let mut s = ByteString::from_str("abc").unwrap();
        assert_eq!(s.pop(), Some(b'c'));
        s.truncate(1);
        assert_eq!(s.as_str(), Some("a"));
        s.truncate(10);
        assert_eq!(s.len(), 1);
        s.clear();
        assert!(s.is_empty());
        assert_eq!(s.pop(), None);
    }

    #[test]
    fn test_growth_preserves_content() {
        let mut s = ByteString::new();
        for i in 0..1000u32 {
            s.push((i % 251) as u8).unwrap();
        }
        assert_eq!(s.len(), 1000);
        assert_eq!(s[0], 0);
        assert_eq!(s[999], (999 % 251) as u8);
    }

    #[test]
    fn test_eq_ord_hash() {
        let a = ByteString::from_str("abc").unwrap();
        let b = a.clone();
        assert_eq!(a, b);
        assert_eq!(a, "abc");
        assert!(a < ByteString::from_str("abd").unwrap());
        assert!(ByteString::from_str("ab").unwrap() < a);

        use std::collections::hash_map::DefaultHasher;
        let mut h1 = DefaultHasher::new();
        let mut h2 = DefaultHasher::new();
        a.hash(&mut h1);
        b.hash(&mut h2);
        assert_eq!(h1.finish(), h2.finish());
    }

    #[test]
    fn test_non_utf8_contents() {
        let mut s = ByteString::new();
        s.push_bytes(&[0xff, 0xfe]).unwrap();
        assert_eq!(s.as_str(), None);
        assert_eq!(s.as_bytes(), &[0xff, 0xfe]);
        assert_eq!(format!("{}", s).chars().count(), 2);
    }

    #[test]
    fn test_shrink_to_fit() {
        let mut s = ByteString::with_capacity(128).unwrap();
        s.push_str("hi").unwrap();
        s.shrink_to_fit().unwrap();
        assert_eq!(s.capacity(), 2);
        assert_eq!(s.as_str(), Some("hi"));

        let mut e = ByteString::with_capacity(8).unwrap();
        e.shrink_to_fit().unwrap();
        assert_eq!(e.capacity(), 0);
    }

    #[test]
    fn test_byte_str_view() {
        let s = ByteString::from_str("hello world").unwrap();
        let v = s.as_byte_str();
        assert_eq!(v.find_byte(b' '), Some(5));
        assert_eq!(v.slice(6, 5).as_str(), Some("world"));
    }
}
