//! A two-element composite used as key/value material by the containers.

use std::fmt;

/// Plain two-field composite.
///
/// `Pair` is the value form of a dictionary entry and a convenience for APIs
/// that want named fields rather than a bare tuple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Pair<A, B> {
    /// First element
    pub first: A,
    /// Second element
    pub second: B,
}

impl<A, B> Pair<A, B> {
    /// Create a pair from its two elements
    #[inline]
    pub fn new(first: A, second: B) -> Self {
        Self { first, second }
    }

    /// Split the pair into a native tuple
    #[inline]
    pub fn into_tuple(self) -> (A, B) {
        (self.first, self.second)
    }

    /// Swap the two elements, producing a `Pair<B, A>`
    #[inline]
    pub fn swapped(self) -> Pair<B, A> {
        Pair { first: self.second, second: self.first }
    }
}

impl<A, B> From<(A, B)> for Pair<A, B> {
    fn from((first, second): (A, B)) -> Self {
        Self { first, second }
    }
}

impl<A, B> From<Pair<A, B>> for (A, B) {
    fn from(pair: Pair<A, B>) -> Self {
        pair.into_tuple()
    }
}

impl<A: fmt::Display, B: fmt::Display> fmt::Display for Pair<A, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.first, self.second)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construction_and_conversion() {
        let p = Pair::new("a", 1);
        assert_eq!(p.first, "a");
        assert_eq!(p.second, 1);
        assert_eq!(p.into_tuple(), ("a", 1));

        let p: Pair<_, _> = ("b", 2).into();
        assert_eq!(p, Pair::new("b", 2));
    }

    #[test]
    fn test_swapped() {
        let p = Pair::new(1, "x").swapped();
        assert_eq!(p, Pair::new("x", 1));
    }

    #[test]
    fn test_ordering() {
        assert!(Pair::new(1, 2) < Pair::new(1, 3));
        assert!(Pair::new(1, 9) < Pair::new(2, 0));
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Pair::new("k", 7)), "(k, 7)");
    }
}
