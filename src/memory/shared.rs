//! Shared / WeakRef: atomically reference-counted ownership
//!
//! A `Shared<T>` hands out co-ownership of one heap value through an
//! out-of-line control block holding two atomic counters. The payload is
//! dropped the moment the last strong handle goes away; the control block
//! survives until the last weak handle is gone too. The strong handles
//! collectively hold one weak reference, which is released when the payload
//! drops.
//!
//! `T: ?Sized` is supported, so `Shared<[T]>` covers shared arrays.

use std::fmt;
use std::marker::PhantomData;
use std::ops::Deref;
use std::ptr::NonNull;
use std::sync::atomic::{fence, AtomicUsize, Ordering};

struct ControlBlock<T: ?Sized> {
    strong: AtomicUsize,
    weak: AtomicUsize,
    payload: *mut T,
}

/// Strong reference-counted handle to a heap value.
///
/// # Examples
///
/// ```
/// use vastkit::Shared;
///
/// let a = Shared::new(41);
/// let b = a.clone();
/// assert_eq!(*b, 41);
/// assert_eq!(a.use_count(), 2);
/// drop(b);
/// assert_eq!(a.use_count(), 1);
/// ```
pub struct Shared<T: ?Sized> {
    ctrl: NonNull<ControlBlock<T>>,
    _marker: PhantomData<ControlBlock<T>>,
}

/// Non-owning observer of a [`Shared`] value.
pub struct WeakRef<T: ?Sized> {
    ctrl: NonNull<ControlBlock<T>>,
    _marker: PhantomData<ControlBlock<T>>,
}

impl<T> Shared<T> {
    /// Move `value` to the heap under shared ownership
    pub fn new(value: T) -> Self {
        Self::from_box(Box::new(value))
    }
}

impl<T> Shared<[T]> {
    /// Take shared ownership of a vector's elements
    pub fn from_vec(values: Vec<T>) -> Self {
        Self::from_box(values.into_boxed_slice())
    }
}

impl<T: ?Sized> Shared<T> {
    /// Take ownership of an already-boxed value
    pub fn from_box(boxed: Box<T>) -> Self {
        let payload = Box::into_raw(boxed);
        let ctrl = Box::new(ControlBlock {
            strong: AtomicUsize::new(1),
            // The one implicit weak reference held by all strong handles.
            weak: AtomicUsize::new(1),
            payload,
        });
        Self {
            // Box never returns null.
            ctrl: unsafe { NonNull::new_unchecked(Box::into_raw(ctrl)) },
            _marker: PhantomData,
        }
    }

    fn ctrl(&self) -> &ControlBlock<T> {
        unsafe { self.ctrl.as_ref() }
    }

    /// Private: an inherent accessor would shadow same-named payload
    /// methods behind `Deref`.
    fn value(&self) -> &T {
        unsafe { &*self.ctrl().payload }
    }

    /// Number of strong handles alive
    pub fn use_count(&self) -> usize {
        self.ctrl().strong.load(Ordering::Acquire)
    }

    /// Number of weak handles alive (not counting the implicit one)
    pub fn weak_count(&self) -> usize {
        self.ctrl().weak.load(Ordering::Acquire) - 1
    }

    /// Whether this is the only strong handle
    pub fn is_unique(&self) -> bool {
        self.use_count() == 1
    }

    /// Create a weak observer of the same value
    pub fn downgrade(&self) -> WeakRef<T> {
        self.ctrl().weak.fetch_add(1, Ordering::Relaxed);
        WeakRef { ctrl: self.ctrl, _marker: PhantomData }
    }

    /// Whether two handles share one control block
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        a.ctrl == b.ctrl
    }
}

impl<T: ?Sized> Clone for Shared<T> {
    fn clone(&self) -> Self {
        self.ctrl().strong.fetch_add(1, Ordering::Relaxed);
        Self { ctrl: self.ctrl, _marker: PhantomData }
    }
}

impl<T: ?Sized> Drop for Shared<T> {
    fn drop(&mut self) {
        let ctrl = self.ctrl.as_ptr();
        unsafe {
            if (*ctrl).strong.fetch_sub(1, Ordering::Release) == 1 {
                // Synchronize with other strong releases before dropping.
                fence(Ordering::Acquire);
                drop(Box::from_raw((*ctrl).payload));
                release_weak(ctrl);
            }
        }
    }
}

impl<T: ?Sized> Deref for Shared<T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.value()
    }
}

impl<T: ?Sized> AsRef<T> for Shared<T> {
    fn as_ref(&self) -> &T {
        self.value()
    }
}

impl<T: ?Sized + fmt::Debug> fmt::Debug for Shared<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Shared").field(&self.value()).finish()
    }
}

impl<T: ?Sized + fmt::Display> fmt::Display for Shared<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.value().fmt(f)
    }
}

impl<T: ?Sized + PartialEq> PartialEq for Shared<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value() == other.value()
    }
}

impl<T: ?Sized + Eq> Eq for Shared<T> {}

unsafe impl<T: ?Sized + Send + Sync> Send for Shared<T> {}
unsafe impl<T: ?Sized + Send + Sync> Sync for Shared<T> {}

/// Drop one weak reference; frees the control block at zero.
unsafe fn release_weak<T: ?Sized>(ctrl: *mut ControlBlock<T>) {
    unsafe {
        if (*ctrl).weak.fetch_sub(1, Ordering::Release) == 1 {
            fence(Ordering::Acquire);
            drop(Box::from_raw(ctrl));
        }
    }
}

impl<T: ?Sized> WeakRef<T> {
    fn ctrl(&self) -> &ControlBlock<T> {
        unsafe { self.ctrl.as_ref() }
    }

    /// Whether the observed value has already been dropped
    pub fn is_expired(&self) -> bool {
        self.ctrl().strong.load(Ordering::Acquire) == 0
    }

    /// Number of strong handles still alive
    pub fn use_count(&self) -> usize {
        self.ctrl().strong.load(Ordering::Acquire)
    }

    /// Try to obtain a strong handle.
    ///
    /// Returns `None` once the value is gone. The increment is a
    /// compare-exchange loop, so a concurrent final release can never be
    /// observed as a resurrected value.
    pub fn upgrade(&self) -> Option<Shared<T>> {
        let strong = &self.ctrl().strong;
        let mut n = strong.load(Ordering::Relaxed);
        loop {
            if n == 0 {
                return None;
            }
            match strong.compare_exchange_weak(n, n + 1, Ordering::Acquire, Ordering::Relaxed) {
                Ok(_) => return Some(Shared { ctrl: self.ctrl, _marker: PhantomData }),
                Err(actual) => n = actual,
            }
        }
    }
}

impl<T: ?Sized> Clone for WeakRef<T> {
    fn clone(&self) -> Self {
        self.ctrl().weak.fetch_add(1, Ordering::Relaxed);
        Self { ctrl: self.ctrl, _marker: PhantomData }
    }
}

impl<T: ?Sized> Drop for WeakRef<T> {
    fn drop(&mut self) {
        unsafe {
            release_weak(self.ctrl.as_ptr());
        }
    }
}

impl<T: ?Sized> fmt::Debug for WeakRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WeakRef(expired: {})", self.is_expired())
    }
}

unsafe impl<T: ?Sized + Send + Sync> Send for WeakRef<T> {}
unsafe impl<T: ?Sized + Send + Sync> Sync for WeakRef<T> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clone_and_counts() {
        let a = Shared::new(5);
        assert_eq!(a.use_count(), 1);
        assert!(a.is_unique());
        let b = a.clone();
        assert_eq!(a.use_count(), 2);
        assert!(!a.is_unique());
        assert_eq!(*b, 5);
        drop(b);
        assert_eq!(a.use_count(), 1);
    }

    #[test]
    fn test_payload_dropped_with_last_strong() {
        use std::rc::Rc;
        let probe = Rc::new(());
        let a = Shared::new(probe.clone());
        let b = a.clone();
        assert_eq!(Rc::strong_count(&probe), 2);
        drop(a);
        assert_eq!(Rc::strong_count(&probe), 2);
        drop(b);
        assert_eq!(Rc::strong_count(&probe), 1);
    }

    #[test]
    fn test_weak_upgrade_while_alive() {
        let a = Shared::new("v".to_string());
        let w = a.downgrade();
        assert_eq!(a.weak_count(), 1);
        assert!(!w.is_expired());
        let b = w.upgrade().unwrap();
        assert_eq!(*b, "v");
        assert_eq!(a.use_count(), 2);
    }

    #[test]
    fn test_weak_outlives_payload() {
        use std::rc::Rc;
        let probe = Rc::new(());
        let w = {
            let a = Shared::new(probe.clone());
            a.downgrade()
        };
        // Payload died with the strong handle; only the weak remains.
        assert_eq!(Rc::strong_count(&probe), 1);
        assert!(w.is_expired());
        assert_eq!(w.use_count(), 0);
        assert!(w.upgrade().is_none());
    }

    #[test]
    fn test_weak_clone_counts() {
        let a = Shared::new(1);
        let w1 = a.downgrade();
        let w2 = w1.clone();
        assert_eq!(a.weak_count(), 2);
        drop(w1);
        assert_eq!(a.weak_count(), 1);
        drop(w2);
        assert_eq!(a.weak_count(), 0);
    }

    #[test]
    fn test_from_box_and_ptr_eq() {
        let a = Shared::from_box(Box::new(9));
        let b = a.clone();
        let c = Shared::new(9);
        assert!(Shared::ptr_eq(&a, &b));
        assert!(!Shared::ptr_eq(&a, &c));
        assert_eq!(a, c); // value equality still holds
    }

    #[test]
    fn test_shared_slice() {
        let s: Shared<[i32]> = Shared::from_vec(vec![1, 2, 3]);
        assert_eq!(s.len(), 3);
        assert_eq!(s[1], 2);
        let t = s.clone();
        assert_eq!(&*t, &[1, 2, 3]);
        assert_eq!(s.use_count(), 2);

        let w = s.downgrade();
        drop(s);
        drop(t);
        assert!(w.upgrade().is_none());
    }

    #[test]
    fn test_payload_methods_reach_through_deref() {
        use std::collections::HashMap;

        let mut map = HashMap::new();
        map.insert("k", 1);
        let shared = Shared::new(map);

        // The handle must not shadow the payload's own `get`.
        assert_eq!(shared.get("k"), Some(&1));
        assert_eq!(shared.as_ref().get("k"), Some(&1));
        assert_eq!(shared.len(), 1);
    }

    #[test]
    fn test_threaded_clone_and_drop() {
        use std::thread;

        let shared = Shared::new(0u64);
        let mut handles = Vec::new();
        for _ in 0..8 {
            let local = shared.clone();
            handles.push(thread::spawn(move || {
                let w = local.downgrade();
                for _ in 0..100 {
                    let c = local.clone();
                    assert_eq!(*c, 0);
                    assert!(w.upgrade().is_some());
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(shared.use_count(), 1);
        assert_eq!(shared.weak_count(), 0);
    }

    #[test]
    fn test_upgrade_race_with_expiry() {
        use std::thread;

        for _ in 0..50 {
            let shared = Shared::new(7);
            let weak = shared.downgrade();
            let t = thread::spawn(move || {
                // Either we got a live value or nothing; never a dangling ref.
                if let Some(s) = weak.upgrade() {
                    assert_eq!(*s, 7);
                }
            });
            drop(shared);
            t.join().unwrap();
        }
    }
}
