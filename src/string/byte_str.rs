//! ByteStr: zero-copy view over byte-string data

use std::cmp::Ordering;
use std::fmt;
use std::str;

/// Borrowed, non-owning view into byte-string data.
///
/// `ByteStr` never copies; every derived view (`slice`, `prefix`, `suffix`)
/// borrows from the same backing storage. Out-of-range requests clamp to
/// the available data instead of failing.
///
/// # Examples
///
/// ```
/// use vastkit::ByteStr;
///
/// let s = ByteStr::from_str("hello world");
/// assert_eq!(s.len(), 11);
/// assert!(s.starts_with(ByteStr::from_str("hello")));
/// assert_eq!(s.find_byte(b' '), Some(5));
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ByteStr<'a> {
    data: &'a [u8],
}

impl<'a> ByteStr<'a> {
    /// Create a view over a byte slice
    #[inline]
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    /// Create a view over the bytes of a string slice
    #[inline]
    pub const fn from_str(s: &'a str) -> Self {
        Self { data: s.as_bytes() }
    }

    /// Length in bytes
    #[inline]
    pub const fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the view is empty
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The underlying byte slice
    #[inline]
    pub const fn as_bytes(&self) -> &'a [u8] {
        self.data
    }

    /// Reinterpret as `&str` if the bytes are valid UTF-8
    #[inline]
    pub fn as_str(&self) -> Option<&'a str> {
        str::from_utf8(self.data).ok()
    }

    /// Byte at `index`, if in range
    #[inline]
    pub fn byte_at(&self, index: usize) -> Option<u8> {
        self.data.get(index).copied()
    }

    /// Sub-view `[start, start + len)`, clamped to the data
    pub fn slice(&self, start: usize, len: usize) -> ByteStr<'a> {
        let start = start.min(self.data.len());
        let end = start.saturating_add(len).min(self.data.len());
        ByteStr::new(&self.data[start..end])
    }

    /// First `len` bytes (or the whole view, if shorter)
    pub fn prefix(&self, len: usize) -> ByteStr<'a> {
        ByteStr::new(&self.data[..len.min(self.data.len())])
    }

    /// Last `len` bytes (or the whole view, if shorter)
    pub fn suffix(&self, len: usize) -> ByteStr<'a> {
        let len = len.min(self.data.len());
        ByteStr::new(&self.data[self.data.len() - len..])
    }

    /// Whether the view begins with `prefix`
    pub fn starts_with(&self, prefix: ByteStr) -> bool {
        self.data.starts_with(prefix.data)
    }

    /// Whether the view ends with `suffix`
    pub fn ends_with(&self, suffix: ByteStr) -> bool {
        self.data.ends_with(suffix.data)
    }

    /// Position of the first occurrence of `byte`
    pub fn find_byte(&self, byte: u8) -> Option<usize> {
        self.data.iter().position(|&b| b == byte)
    }

    /// Position of the first occurrence of `needle`
    pub fn find(&self, needle: ByteStr) -> Option<usize> {
        if needle.is_empty() {
            return Some(0);
        }
        if needle.len() > self.len() {
            return None;
        }
        self.data
            .windows(needle.len())
            .position(|w| w == needle.data)
    }

    /// Length of the longest common prefix with `other`
    pub fn common_prefix_len(&self, other: ByteStr) -> usize {
        self.data
            .iter()
            .zip(other.data.iter())
            .take_while(|(a, b)| a == b)
            .count()
    }
}

impl<'a> From<&'a [u8]> for ByteStr<'a> {
    fn from(data: &'a [u8]) -> Self {
        Self::new(data)
    }
}

impl<'a> From<&'a str> for ByteStr<'a> {
    fn from(s: &'a str) -> Self {
        Self::from_str(s)
    }
}

impl PartialOrd for ByteStr<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ByteStr<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.data.cmp(other.data)
    }
}

impl fmt::Debug for ByteStr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ByteStr({:?})", String::from_utf8_lossy(self.data))
    }
}

impl fmt::Display for ByteStr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(self.data))
    }
}
