//! # VastKit: Foundational Containers and Memory Primitives
//!
//! This crate provides a set of low-level building blocks centered on explicit
//! memory layout and predictable performance: an insertion-ordered hash map,
//! linked lists with node recycling and chunked storage, an ordered set with
//! node transfer, small-buffer type erasure, and atomic shared ownership.
//!
//! ## Key Features
//!
//! - **Ordered Dictionary**: Hash-bucket lookup with a threaded insertion-order
//!   list, so enumeration is deterministic and resize never reorders
//! - **Recycling Linked List**: Detached nodes feed a free list instead of the
//!   allocator; `reserve` preallocates nodes, `shrink` releases them
//! - **Chunked List**: Cache-friendly fixed-capacity chunks with O(1) whole-list
//!   splicing that empties the source
//! - **Ordered Set**: Red-black tree whose nodes can be extracted and merged
//!   into another set without moving the values between allocations
//! - **Type Erasure**: `Any` keeps values up to 24 bytes inline, with per-type
//!   v-tables and checked downcasts
//! - **Shared Ownership**: `Shared`/`WeakRef` atomic refcount handles with a
//!   race-free weak upgrade, including `Shared<[T]>` for arrays
//! - **Byte Strings**: Owned growable buffers and zero-copy views over raw bytes
//!
//! ## Quick Start
//!
//! ```rust
//! use vastkit::{Any, ChunkedList, Dict, LinkedList, Shared, TreeSet};
//!
//! // Insertion-ordered dictionary
//! let mut dict = Dict::new();
//! dict.put("first", 1);
//! dict.put("second", 2);
//! assert_eq!(dict.keys().copied().collect::<Vec<_>>(), vec!["first", "second"]);
//!
//! // Linked list that recycles nodes
//! let mut list = LinkedList::new();
//! list.append(1);
//! list.pop()?;
//! assert_eq!(list.free_count(), 1);
//!
//! // Chunked list with O(1) splicing
//! let mut a: ChunkedList<i32> = (0..3).collect();
//! let mut b: ChunkedList<i32> = (3..6).collect();
//! a.append_list(&mut b);
//! assert_eq!(a.len(), 6);
//! assert!(b.is_empty());
//!
//! // Ordered set with node transfer
//! let mut set = TreeSet::new();
//! set.insert(2);
//! set.insert(1);
//! assert_eq!(set.first(), Some(&1));
//!
//! // Type-erased storage with checked access
//! let any = Any::new(42i32);
//! assert_eq!(*any.downcast_ref::<i32>()?, 42);
//!
//! // Atomic shared ownership
//! let shared = Shared::new("hello");
//! let weak = shared.downgrade();
//! assert!(weak.upgrade().is_some());
//! # Ok::<(), vastkit::VastError>(())
//! ```

#![warn(missing_docs)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod any;
pub mod containers;
pub mod dict;
pub mod error;
pub mod memory;
pub mod pair;
pub mod set;
pub mod string;

// Re-export core types
pub use any::Any;
pub use containers::{ChunkedList, DynVec, LinkedList};
pub use dict::Dict;
pub use error::{Result, VastError};
pub use memory::{Shared, WeakRef};
pub use pair::Pair;
pub use set::{SetNode, TreeSet};
pub use string::{ByteStr, ByteString};
