//! Byte-string types: an owned growable buffer and a zero-copy view.

mod byte_str;
mod byte_string;

pub use byte_str::ByteStr;
pub use byte_string::ByteString;
