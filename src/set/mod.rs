//! TreeSet: ordered set on a red-black tree with node transfer
//!
//! Nodes carry parent pointers, so elements can be detached as owning
//! [`SetNode`] handles and reinserted into another set without moving the
//! stored value between allocations. `merge` drains a source set this way,
//! leaving only colliding elements behind.

use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt;
use std::marker::PhantomData;
use std::ptr;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Color {
    Red,
    Black,
}

struct TreeNode<T> {
    value: T,
    color: Color,
    parent: *mut TreeNode<T>,
    left: *mut TreeNode<T>,
    right: *mut TreeNode<T>,
}

/// Detached tree node owning its value.
///
/// Produced by [`TreeSet::extract`] and consumed by [`TreeSet::insert_node`];
/// the value never leaves its original allocation.
pub struct SetNode<T> {
    node: *mut TreeNode<T>,
}

impl<T> SetNode<T> {
    /// Borrow the contained value
    pub fn value(&self) -> &T {
        unsafe { &(*self.node).value }
    }

    /// Consume the handle, taking the value out
    pub fn into_value(self) -> T {
        let boxed = unsafe { Box::from_raw(self.node) };
        std::mem::forget(self);
        boxed.value
    }

    fn into_raw(self) -> *mut TreeNode<T> {
        let node = self.node;
        std::mem::forget(self);
        node
    }
}

impl<T> Drop for SetNode<T> {
    fn drop(&mut self) {
        drop(unsafe { Box::from_raw(self.node) });
    }
}

impl<T: fmt::Debug> fmt::Debug for SetNode<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SetNode").field(self.value()).finish()
    }
}

unsafe impl<T: Send> Send for SetNode<T> {}
unsafe impl<T: Sync> Sync for SetNode<T> {}

/// Ordered set keyed by `T: Ord`.
///
/// # Examples
///
/// ```
/// use vastkit::TreeSet;
///
/// let mut s = TreeSet::new();
/// s.insert(3);
/// s.insert(1);
/// s.insert(2);
/// let sorted: Vec<_> = s.iter().copied().collect();
/// assert_eq!(sorted, vec![1, 2, 3]);
/// ```
pub struct TreeSet<T> {
    root: *mut TreeNode<T>,
    len: usize,
    _marker: PhantomData<T>,
}

impl<T: Ord> TreeSet<T> {
    /// Create an empty set
    pub fn new() -> Self {
        Self { root: ptr::null_mut(), len: 0, _marker: PhantomData }
    }

    /// Number of elements
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the set holds no elements
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn find<Q>(&self, value: &Q) -> *mut TreeNode<T>
    where
        T: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let mut node = self.root;
        while !node.is_null() {
            match value.cmp(unsafe { (*node).value.borrow() }) {
                Ordering::Less => node = unsafe { (*node).left },
                Ordering::Greater => node = unsafe { (*node).right },
                Ordering::Equal => return node,
            }
        }
        ptr::null_mut()
    }

    /// Whether `value` is present
    pub fn contains<Q>(&self, value: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        !self.find(value).is_null()
    }

    /// Borrow the stored element equal to `value`
    pub fn get<Q>(&self, value: &Q) -> Option<&T>
    where
        T: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let node = self.find(value);
        if node.is_null() {
            None
        } else {
            Some(unsafe { &(*node).value })
        }
    }

    fn minimum(mut node: *mut TreeNode<T>) -> *mut TreeNode<T> {
        while !unsafe { (*node).left }.is_null() {
            node = unsafe { (*node).left };
        }
        node
    }

    fn maximum(mut node: *mut TreeNode<T>) -> *mut TreeNode<T> {
        while !unsafe { (*node).right }.is_null() {
            node = unsafe { (*node).right };
        }
        node
    }

    fn successor(node: *mut TreeNode<T>) -> *mut TreeNode<T> {
        unsafe {
            if !(*node).right.is_null() {
                return Self::minimum((*node).right);
            }
            let mut n = node;
            let mut p = (*n).parent;
            while !p.is_null() && n == (*p).right {
                n = p;
                p = (*p).parent;
            }
            p
        }
    }

    fn predecessor(node: *mut TreeNode<T>) -> *mut TreeNode<T> {
        unsafe {
            if !(*node).left.is_null() {
                return Self::maximum((*node).left);
            }
            let mut n = node;
            let mut p = (*n).parent;
            while !p.is_null() && n == (*p).left {
                n = p;
                p = (*p).parent;
            }
            p
        }
    }

    unsafe fn rotate_left(&mut self, x: *mut TreeNode<T>) {
        unsafe {
            let y = (*x).right;
            (*x).right = (*y).left;
            if !(*y).left.is_null() {
                (*(*y).left).parent = x;
            }
            (*y).parent = (*x).parent;
            if (*x).parent.is_null() {
                self.root = y;
            } else if x == (*(*x).parent).left {
                (*(*x).parent).left = y;
            } else {
                (*(*x).parent).right = y;
            }
            (*y).left = x;
            (*x).parent = y;
        }
    }

    unsafe fn rotate_right(&mut self, x: *mut TreeNode<T>) {
        unsafe {
            let y = (*x).left;
            (*x).left = (*y).right;
            if !(*y).right.is_null() {
                (*(*y).right).parent = x;
            }
            (*y).parent = (*x).parent;
            if (*x).parent.is_null() {
                self.root = y;
            } else if x == (*(*x).parent).right {
                (*(*x).parent).right = y;
            } else {
                (*(*x).parent).left = y;
            }
            (*y).right = x;
            (*x).parent = y;
        }
    }

    /// Link `node` into the tree. Returns false (without linking) when an
    /// equal element is already present.
    unsafe fn attach(&mut self, node: *mut TreeNode<T>) -> bool {
        let mut parent = ptr::null_mut();
        let mut cursor = self.root;
        let mut went_left = false;
        while !cursor.is_null() {
            parent = cursor;
            match unsafe { (*node).value.cmp(&(*cursor).value) } {
                Ordering::Less => {
                    cursor = unsafe { (*cursor).left };
                    went_left = true;
                }
                Ordering::Greater => {
                    cursor = unsafe { (*cursor).right };
                    went_left = false;
                }
                Ordering::Equal => return false,
            }
        }
        unsafe {
            (*node).parent = parent;
            (*node).left = ptr::null_mut();
            (*node).right = ptr::null_mut();
            (*node).color = Color::Red;
            if parent.is_null() {
                self.root = node;
            } else if went_left {
                (*parent).left = node;
            } else {
                (*parent).right = node;
            }
            self.insert_fixup(node);
        }
        self.len += 1;
        true
    }

    unsafe fn insert_fixup(&mut self, mut z: *mut TreeNode<T>) {
        unsafe {
            while !(*z).parent.is_null() && (*(*z).parent).color == Color::Red {
                let p = (*z).parent;
                // Grandparent exists: a red parent is never the root.
                let g = (*p).parent;
                if p == (*g).left {
                    let u = (*g).right;
                    if !u.is_null() && (*u).color == Color::Red {
                        (*p).color = Color::Black;
                        (*u).color = Color::Black;
                        (*g).color = Color::Red;
                        z = g;
                    } else {
                        if z == (*p).right {
                            z = p;
                            self.rotate_left(z);
                        }
                        let p = (*z).parent;
                        let g = (*p).parent;
                        (*p).color = Color::Black;
                        (*g).color = Color::Red;
                        self.rotate_right(g);
                    }
                } else {
                    let u = (*g).left;
                    if !u.is_null() && (*u).color == Color::Red {
                        (*p).color = Color::Black;
                        (*u).color = Color::Black;
                        (*g).color = Color::Red;
                        z = g;
                    } else {
                        if z == (*p).left {
                            z = p;
                            self.rotate_right(z);
                        }
                        let p = (*z).parent;
                        let g = (*p).parent;
                        (*p).color = Color::Black;
                        (*g).color = Color::Red;
                        self.rotate_left(g);
                    }
                }
            }
            (*self.root).color = Color::Black;
        }
    }

    /// Insert `value`. Returns false if an equal element was already
    /// present (the set is unchanged).
    pub fn insert(&mut self, value: T) -> bool {
        let node = Box::into_raw(Box::new(TreeNode {
            value,
            color: Color::Red,
            parent: ptr::null_mut(),
            left: ptr::null_mut(),
            right: ptr::null_mut(),
        }));
        if unsafe { self.attach(node) } {
            true
        } else {
            drop(unsafe { Box::from_raw(node) });
            false
        }
    }

    /// Insert a detached node. On collision the node is handed back
    /// untouched.
    pub fn insert_node(&mut self, node: SetNode<T>) -> std::result::Result<(), SetNode<T>> {
        let raw = node.into_raw();
        if unsafe { self.attach(raw) } {
            Ok(())
        } else {
            Err(SetNode { node: raw })
        }
    }

    /// Replace the subtree rooted at `u` with the one rooted at `v`.
    unsafe fn transplant(&mut self, u: *mut TreeNode<T>, v: *mut TreeNode<T>) {
        unsafe {
            if (*u).parent.is_null() {
                self.root = v;
            } else if u == (*(*u).parent).left {
                (*(*u).parent).left = v;
            } else {
                (*(*u).parent).right = v;
            }
            if !v.is_null() {
                (*v).parent = (*u).parent;
            }
        }
    }

    /// Unlink `z` from the tree via pointer surgery only; `z`'s value is
    /// not moved or dropped.
    unsafe fn detach(&mut self, z: *mut TreeNode<T>) {
        unsafe {
            let mut removed_color = (*z).color;
            let x: *mut TreeNode<T>;
            let x_parent: *mut TreeNode<T>;

            if (*z).left.is_null() {
                x = (*z).right;
                x_parent = (*z).parent;
                self.transplant(z, (*z).right);
            } else if (*z).right.is_null() {
                x = (*z).left;
                x_parent = (*z).parent;
                self.transplant(z, (*z).left);
            } else {
                // Two children: the in-order successor takes z's place.
                let y = Self::minimum((*z).right);
                removed_color = (*y).color;
                x = (*y).right;
                if (*y).parent == z {
                    x_parent = y;
                } else {
                    x_parent = (*y).parent;
                    self.transplant(y, (*y).right);
                    (*y).right = (*z).right;
                    (*(*y).right).parent = y;
                }
                self.transplant(z, y);
                (*y).left = (*z).left;
                (*(*y).left).parent = y;
                (*y).color = (*z).color;
            }

            if removed_color == Color::Black {
                self.delete_fixup(x, x_parent);
            }
            (*z).parent = ptr::null_mut();
            (*z).left = ptr::null_mut();
            (*z).right = ptr::null_mut();
        }
        self.len -= 1;
    }

    /// Restore red-black invariants after removing a black node. `x` may
    /// be null, so its parent is tracked separately.
    unsafe fn delete_fixup(&mut self, mut x: *mut TreeNode<T>, mut x_parent: *mut TreeNode<T>) {
        unsafe {
            while x != self.root && (x.is_null() || (*x).color == Color::Black) {
                if x == (*x_parent).left {
                    let mut w = (*x_parent).right;
                    if (*w).color == Color::Red {
                        (*w).color = Color::Black;
                        (*x_parent).color = Color::Red;
                        self.rotate_left(x_parent);
                        w = (*x_parent).right;
                    }
                    let left_black =
                        (*w).left.is_null() || (*(*w).left).color == Color::Black;
                    let right_black =
                        (*w).right.is_null() || (*(*w).right).color == Color::Black;
                    if left_black && right_black {
                        (*w).color = Color::Red;
                        x = x_parent;
                        x_parent = (*x).parent;
                    } else {
                        if right_black {
                            if !(*w).left.is_null() {
                                (*(*w).left).color = Color::Black;
                            }
                            (*w).color = Color::Red;
                            self.rotate_right(w);
                            w = (*x_parent).right;
                        }
                        (*w).color = (*x_parent).color;
                        (*x_parent).color = Color::Black;
                        if !(*w).right.is_null() {
                            (*(*w).right).color = Color::Black;
                        }
                        self.rotate_left(x_parent);
                        x = self.root;
                        break;
                    }
                } else {
                    let mut w = (*x_parent).left;
                    if (*w).color == Color::Red {
                        (*w).color = Color::Black;
                        (*x_parent).color = Color::Red;
                        self.rotate_right(x_parent);
                        w = (*x_parent).left;
                    }
                    let left_black =
                        (*w).left.is_null() || (*(*w).left).color == Color::Black;
                    let right_black =
                        (*w).right.is_null() || (*(*w).right).color == Color::Black;
                    if left_black && right_black {
                        (*w).color = Color::Red;
                        x = x_parent;
                        x_parent = (*x).parent;
                    } else {
                        if left_black {
                            if !(*w).right.is_null() {
                                (*(*w).right).color = Color::Black;
                            }
                            (*w).color = Color::Red;
                            self.rotate_left(w);
                            w = (*x_parent).left;
                        }
                        (*w).color = (*x_parent).color;
                        (*x_parent).color = Color::Black;
                        if !(*w).left.is_null() {
                            (*(*w).left).color = Color::Black;
                        }
                        self.rotate_right(x_parent);
                        x = self.root;
                        break;
                    }
                }
            }
            if !x.is_null() {
                (*x).color = Color::Black;
            }
        }
    }

    /// Detach the element equal to `value` as an owning node handle
    pub fn extract<Q>(&mut self, value: &Q) -> Option<SetNode<T>>
    where
        T: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let node = self.find(value);
        if node.is_null() {
            return None;
        }
        unsafe {
            self.detach(node);
        }
        Some(SetNode { node })
    }

    /// Remove the element equal to `value`, returning it
    pub fn remove<Q>(&mut self, value: &Q) -> Option<T>
    where
        T: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.extract(value).map(SetNode::into_value)
    }

    /// Detach the smallest element
    pub fn pop_first_node(&mut self) -> Option<SetNode<T>> {
        if self.root.is_null() {
            return None;
        }
        let node = Self::minimum(self.root);
        unsafe {
            self.detach(node);
        }
        Some(SetNode { node })
    }

    /// Smallest element, if any
    pub fn first(&self) -> Option<&T> {
        if self.root.is_null() {
            None
        } else {
            Some(unsafe { &(*Self::minimum(self.root)).value })
        }
    }

    /// Largest element, if any
    pub fn last(&self) -> Option<&T> {
        if self.root.is_null() {
            None
        } else {
            Some(unsafe { &(*Self::maximum(self.root)).value })
        }
    }

    /// Drop all elements
    pub fn clear(&mut self) {
        unsafe fn free<T>(node: *mut TreeNode<T>) {
            if node.is_null() {
                return;
            }
            unsafe {
                free((*node).left);
                free((*node).right);
                drop(Box::from_raw(node));
            }
        }
        unsafe {
            free(self.root);
        }
        self.root = ptr::null_mut();
        self.len = 0;
    }

    /// Move every element of `other` into `self` by relinking nodes;
    /// elements colliding with existing ones stay in `other`
    pub fn merge(&mut self, other: &mut TreeSet<T>) {
        let mut collisions = Vec::new();
        while let Some(node) = other.pop_first_node() {
            if let Err(node) = self.insert_node(node) {
                collisions.push(node);
            }
        }
        for node in collisions {
            // These came out of `other`, so reinsertion cannot collide.
            let _ = other.insert_node(node);
        }
    }

    /// In-order iterator over the elements
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            front: if self.root.is_null() {
                ptr::null_mut()
            } else {
                Self::minimum(self.root)
            },
            back: if self.root.is_null() {
                ptr::null_mut()
            } else {
                Self::maximum(self.root)
            },
            remaining: self.len,
            _marker: PhantomData,
        }
    }
}

impl<T: Ord> Default for TreeSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for TreeSet<T> {
    fn drop(&mut self) {
        unsafe fn free<T>(node: *mut TreeNode<T>) {
            if node.is_null() {
                return;
            }
            unsafe {
                free((*node).left);
                free((*node).right);
                drop(Box::from_raw(node));
            }
        }
        unsafe {
            free(self.root);
        }
    }
}

impl<T: Ord + Clone> Clone for TreeSet<T> {
    fn clone(&self) -> Self {
        let mut out = Self::new();
        for item in self.iter() {
            out.insert(item.clone());
        }
        out
    }
}

impl<T: Ord + fmt::Debug> fmt::Debug for TreeSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<T: Ord> PartialEq for TreeSet<T> {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.iter().zip(other.iter()).all(|(a, b)| a == b)
    }
}

impl<T: Ord> Eq for TreeSet<T> {}

impl<T: Ord> Extend<T> for TreeSet<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for item in iter {
            self.insert(item);
        }
    }
}

impl<T: Ord> FromIterator<T> for TreeSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

unsafe impl<T: Send> Send for TreeSet<T> {}
unsafe impl<T: Sync> Sync for TreeSet<T> {}

/// In-order borrowing iterator over a [`TreeSet`]
pub struct Iter<'a, T> {
    front: *mut TreeNode<T>,
    back: *mut TreeNode<T>,
    remaining: usize,
    _marker: PhantomData<&'a T>,
}

impl<'a, T: Ord> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        if self.remaining == 0 {
            return None;
        }
        let node = self.front;
        self.front = TreeSet::successor(node);
        self.remaining -= 1;
        Some(unsafe { &(*node).value })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, T: Ord> DoubleEndedIterator for Iter<'a, T> {
    fn next_back(&mut self) -> Option<&'a T> {
        if self.remaining == 0 {
            return None;
        }
        let node = self.back;
        self.back = TreeSet::predecessor(node);
        self.remaining -= 1;
        Some(unsafe { &(*node).value })
    }
}

impl<T: Ord> ExactSizeIterator for Iter<'_, T> {}

impl<'a, T: Ord> IntoIterator for &'a TreeSet<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Owning iterator over a [`TreeSet`], smallest element first
pub struct IntoIter<T: Ord> {
    set: TreeSet<T>,
}

impl<T: Ord> Iterator for IntoIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.set.pop_first_node().map(SetNode::into_value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.set.len(), Some(self.set.len()))
    }
}

impl<T: Ord> ExactSizeIterator for IntoIter<T> {}

impl<T: Ord> IntoIterator for TreeSet<T> {
    type Item = T;
    type IntoIter = IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter { set: self }
    }
}
