//! Shared-ownership memory primitives.

mod shared;

pub use shared::{Shared, WeakRef};
