//! Any: type-erased value with small-buffer optimization
//!
//! Values up to 24 bytes with alignment up to 16 live inline in the `Any`
//! itself; larger or over-aligned values go to the heap. Each stored type
//! gets a static v-table of drop and (for clonable types) clone functions,
//! and a `TypeId` discriminator guards every typed access.

use crate::error::{Result, VastError};
use std::any::TypeId;
use std::fmt;
use std::mem::{self, MaybeUninit};
use std::ptr;

/// Inline buffer size in bytes
pub const SBO_SIZE: usize = 24;

/// Maximum alignment served by the inline buffer
const SBO_ALIGN: usize = 16;

#[derive(Clone, Copy)]
#[repr(C, align(16))]
struct InlineBuf {
    bytes: [MaybeUninit<u8>; SBO_SIZE],
}

union Storage {
    inline: InlineBuf,
    heap: *mut u8,
}

struct VTable {
    /// Drop the value in place (inline storage)
    drop_inline: unsafe fn(*mut u8),
    /// Drop the value and free its box (heap storage)
    drop_heap: unsafe fn(*mut u8),
    /// Clone the value into an uninitialized inline slot
    clone_inline: Option<unsafe fn(*const u8, *mut u8)>,
    /// Clone the value into a fresh box
    clone_heap: Option<unsafe fn(*const u8) -> *mut u8>,
}

unsafe fn drop_inline<T>(p: *mut u8) {
    unsafe { ptr::drop_in_place(p as *mut T) }
}

unsafe fn drop_heap<T>(p: *mut u8) {
    drop(unsafe { Box::from_raw(p as *mut T) })
}

unsafe fn clone_inline<T: Clone>(src: *const u8, dst: *mut u8) {
    let value = unsafe { (*(src as *const T)).clone() };
    unsafe { ptr::write(dst as *mut T, value) }
}

unsafe fn clone_heap<T: Clone>(src: *const u8) -> *mut u8 {
    let value = unsafe { (*(src as *const T)).clone() };
    Box::into_raw(Box::new(value)) as *mut u8
}

struct VTables<T>(std::marker::PhantomData<T>);

impl<T: 'static> VTables<T> {
    const MOVE_ONLY: VTable = VTable {
        drop_inline: drop_inline::<T>,
        drop_heap: drop_heap::<T>,
        clone_inline: None,
        clone_heap: None,
    };
}

impl<T: Clone + 'static> VTables<T> {
    const CLONABLE: VTable = VTable {
        drop_inline: drop_inline::<T>,
        drop_heap: drop_heap::<T>,
        clone_inline: Some(clone_inline::<T>),
        clone_heap: Some(clone_heap::<T>),
    };
}

/// Container for a single value of any `'static` type.
///
/// # Examples
///
/// ```
/// use vastkit::Any;
///
/// let mut a = Any::new(42i32);
/// assert!(a.is::<i32>());
/// assert_eq!(*a.downcast_ref::<i32>()?, 42);
/// assert!(a.downcast_ref::<String>().is_err());
/// assert_eq!(a.take::<i32>()?, 42);
/// assert!(!a.has_value());
/// # Ok::<(), vastkit::VastError>(())
/// ```
pub struct Any {
    storage: Storage,
    vtable: Option<&'static VTable>,
    type_id: TypeId,
    type_name: &'static str,
    on_heap: bool,
}

impl Any {
    const fn fits_inline<T>() -> bool {
        mem::size_of::<T>() <= SBO_SIZE && mem::align_of::<T>() <= SBO_ALIGN
    }

    /// Create an empty container
    pub fn empty() -> Self {
        Self {
            storage: Storage { heap: ptr::null_mut() },
            vtable: None,
            type_id: TypeId::of::<()>(),
            type_name: "",
            on_heap: false,
        }
    }

    fn construct<T: 'static>(value: T, vtable: &'static VTable) -> Self {
        let mut any = Self {
            storage: Storage { heap: ptr::null_mut() },
            vtable: Some(vtable),
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            on_heap: !Self::fits_inline::<T>(),
        };
        if any.on_heap {
            any.storage.heap = Box::into_raw(Box::new(value)) as *mut u8;
        } else {
            unsafe {
                ptr::write(any.storage.inline.bytes.as_mut_ptr() as *mut T, value);
            }
        }
        any
    }

    /// Store a clonable value
    pub fn new<T: Clone + 'static>(value: T) -> Self {
        Self::construct(value, &VTables::<T>::CLONABLE)
    }

    /// Store a value that cannot be cloned; [`Any::try_clone`] will fail
    /// at call time
    pub fn move_only<T: 'static>(value: T) -> Self {
        Self::construct(value, &VTables::<T>::MOVE_ONLY)
    }

    /// Whether a value is stored
    #[inline]
    pub fn has_value(&self) -> bool {
        self.vtable.is_some()
    }

    /// Whether the stored value is of type `T`
    #[inline]
    pub fn is<T: 'static>(&self) -> bool {
        self.has_value() && self.type_id == TypeId::of::<T>()
    }

    /// Name of the stored type, if any
    pub fn type_name(&self) -> Option<&'static str> {
        if self.has_value() {
            Some(self.type_name)
        } else {
            None
        }
    }

    /// Whether the stored value lives on the heap rather than inline
    #[inline]
    pub fn is_on_heap(&self) -> bool {
        self.on_heap
    }

    fn data_ptr(&self) -> *const u8 {
        if self.on_heap {
            unsafe { self.storage.heap }
        } else {
            unsafe { self.storage.inline.bytes.as_ptr() as *const u8 }
        }
    }

    fn data_ptr_mut(&mut self) -> *mut u8 {
        if self.on_heap {
            unsafe { self.storage.heap }
        } else {
            unsafe { self.storage.inline.bytes.as_mut_ptr() as *mut u8 }
        }
    }

    fn check_type<T: 'static>(&self) -> Result<()> {
        if !self.has_value() {
            return Err(VastError::type_mismatch(std::any::type_name::<T>(), "(empty)"));
        }
        if self.type_id != TypeId::of::<T>() {
            return Err(VastError::type_mismatch(
                std::any::type_name::<T>(),
                self.type_name,
            ));
        }
        Ok(())
    }

    /// Borrow the stored value as `T`
    pub fn downcast_ref<T: 'static>(&self) -> Result<&T> {
        self.check_type::<T>()?;
        Ok(unsafe { &*(self.data_ptr() as *const T) })
    }

    /// Mutably borrow the stored value as `T`
    pub fn downcast_mut<T: 'static>(&mut self) -> Result<&mut T> {
        self.check_type::<T>()?;
        Ok(unsafe { &mut *(self.data_ptr_mut() as *mut T) })
    }

    /// Move the stored value out as `T`, leaving the container empty
    pub fn take<T: 'static>(&mut self) -> Result<T> {
        self.check_type::<T>()?;
        let value = if self.on_heap {
            let boxed = unsafe { Box::from_raw(self.storage.heap as *mut T) };
            *boxed
        } else {
            unsafe { ptr::read(self.storage.inline.bytes.as_ptr() as *const T) }
        };
        // The value is out; forget it without running drop glue.
        self.vtable = None;
        self.on_heap = false;
        self.type_id = TypeId::of::<()>();
        self.type_name = "";
        Ok(value)
    }

    /// Clone the container and its value.
    ///
    /// Fails when the value was stored with [`Any::move_only`]. Cloning an
    /// empty container yields an empty container.
    pub fn try_clone(&self) -> Result<Any> {
        let vtable = match self.vtable {
            None => return Ok(Any::empty()),
            Some(v) => v,
        };
        let mut out = Self {
            storage: Storage { heap: ptr::null_mut() },
            vtable: self.vtable,
            type_id: self.type_id,
            type_name: self.type_name,
            on_heap: self.on_heap,
        };
        if self.on_heap {
            let clone_fn = vtable
                .clone_heap
                .ok_or_else(|| VastError::type_mismatch("clonable value", self.type_name))?;
            out.storage.heap = unsafe { clone_fn(self.data_ptr()) };
        } else {
            let clone_fn = vtable
                .clone_inline
                .ok_or_else(|| VastError::type_mismatch("clonable value", self.type_name))?;
            unsafe {
                clone_fn(self.data_ptr(), out.storage.inline.bytes.as_mut_ptr() as *mut u8);
            }
        }
        Ok(out)
    }

    /// Drop the stored value, leaving the container empty
    pub fn reset(&mut self) {
        if let Some(vtable) = self.vtable {
            unsafe {
                if self.on_heap {
                    (vtable.drop_heap)(self.storage.heap);
                } else {
                    (vtable.drop_inline)(self.storage.inline.bytes.as_mut_ptr() as *mut u8);
                }
            }
        }
        self.vtable = None;
        self.on_heap = false;
        self.type_id = TypeId::of::<()>();
        self.type_name = "";
    }
}

impl Default for Any {
    fn default() -> Self {
        Self::empty()
    }
}

impl Drop for Any {
    fn drop(&mut self) {
        self.reset();
    }
}

impl fmt::Debug for Any {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.type_name() {
            Some(name) => f
                .debug_struct("Any")
                .field("type", &name)
                .field("on_heap", &self.on_heap)
                .finish(),
            None => write!(f, "Any(empty)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_roundtrip() {
        let a = Any::new(42i64);
        assert!(a.is::<i64>());
        assert!(!a.is_on_heap());
        assert_eq!(*a.downcast_ref::<i64>().unwrap(), 42);
    }

    #[test]
    fn test_heap_for_large_values() {
        let big = [7u8; 64];
        let a = Any::new(big);
        assert!(a.is_on_heap());
        assert_eq!(a.downcast_ref::<[u8; 64]>().unwrap()[63], 7);

        // Exactly SBO_SIZE bytes still fits inline.
        let edge = [1u8; SBO_SIZE];
        let b = Any::new(edge);
        assert!(!b.is_on_heap());
    }

    #[test]
    fn test_downcast_wrong_type() {
        let a = Any::new("text".to_string());
        let err = a.downcast_ref::<i32>().unwrap_err();
        match err {
            VastError::TypeMismatch { expected, found } => {
                assert!(expected.contains("i32"));
                assert!(found.contains("String"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_downcast_mut() {
        let mut a = Any::new(vec![1, 2, 3]);
        a.downcast_mut::<Vec<i32>>().unwrap().push(4);
        assert_eq!(a.downcast_ref::<Vec<i32>>().unwrap().len(), 4);
        assert!(a.downcast_mut::<String>().is_err());
    }

    #[test]
    fn test_take() {
        let mut a = Any::new("owned".to_string());
        assert!(a.take::<i32>().is_err());
        assert!(a.has_value());
        let s = a.take::<String>().unwrap();
        assert_eq!(s, "owned");
        assert!(!a.has_value());
        assert!(a.take::<String>().is_err());
    }

    #[test]
    fn test_empty_behavior() {
        let a = Any::empty();
        assert!(!a.has_value());
        assert!(!a.is::<i32>());
        assert_eq!(a.type_name(), None);
        assert!(a.downcast_ref::<i32>().is_err());
        assert!(a.try_clone().is_ok());
    }

    #[test]
    fn test_try_clone() {
        let a = Any::new(vec![1, 2, 3]);
        let b = a.try_clone().unwrap();
        assert_eq!(b.downcast_ref::<Vec<i32>>().unwrap(), &[1, 2, 3]);
        // Independent copies.
        assert_eq!(a.downcast_ref::<Vec<i32>>().unwrap(), &[1, 2, 3]);
    }

    #[test]
    fn test_move_only_rejects_clone() {
        struct NoClone(#[allow(dead_code)] i32);
        let a = Any::move_only(NoClone(5));
        assert!(a.is::<NoClone>());
        assert!(matches!(a.try_clone(), Err(VastError::TypeMismatch { .. })));
    }

    #[test]
    fn test_reset() {
        let mut a = Any::new(1u8);
        a.reset();
        assert!(!a.has_value());
        a.reset(); // idempotent
        assert!(!a.has_value());
    }

    #[test]
    fn test_type_name() {
        let a = Any::new(3.5f64);
        assert_eq!(a.type_name(), Some("f64"));
    }

    #[test]
    fn test_drop_runs_for_inline_and_heap() {
        use std::rc::Rc;
        let probe = Rc::new(());

        {
            let _a = Any::new(probe.clone()); // Rc is pointer-sized: inline
            assert_eq!(Rc::strong_count(&probe), 2);
        }
        assert_eq!(Rc::strong_count(&probe), 1);

        {
            let _a = Any::new([probe.clone(), probe.clone(), probe.clone(), probe.clone()]);
            assert_eq!(Rc::strong_count(&probe), 5);
        }
        assert_eq!(Rc::strong_count(&probe), 1);
    }

    #[test]
    fn test_clone_of_heap_value() {
        use std::rc::Rc;
        let probe = Rc::new(());
        let a = Any::new([probe.clone(), probe.clone(), probe.clone(), probe.clone()]);
        assert!(a.is_on_heap());
        let b = a.try_clone().unwrap();
        assert_eq!(Rc::strong_count(&probe), 9);
        drop(a);
        drop(b);
        assert_eq!(Rc::strong_count(&probe), 1);
    }
}
