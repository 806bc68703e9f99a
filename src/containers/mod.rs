//! Sequence containers: contiguous, node-linked, and chunk-segmented.

mod chunked_list;
mod dyn_vec;
mod linked_list;

pub use chunked_list::ChunkedList;
pub use dyn_vec::DynVec;
pub use linked_list::LinkedList;
