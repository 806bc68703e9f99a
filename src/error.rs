//! Error handling for the vastkit library
//!
//! Every fallible operation in the crate reports failure through [`VastError`],
//! with structured payloads where the failure carries data (out-of-bounds
//! indices keep both the index and the valid size).

use thiserror::Error;

/// Main error type for the vastkit library
#[derive(Error, Debug)]
pub enum VastError {
    /// Invalid operation on a container in a valid state (pop on empty, etc.)
    #[error("Invalid value: {message}")]
    InvalidValue {
        /// Description of the invalid operation
        message: String,
    },

    /// Index out of bounds access
    #[error("Out of bounds: index {index}, size {size}")]
    OutOfBounds {
        /// The invalid index
        index: usize,
        /// The valid size/length
        size: usize,
    },

    /// Missing key in a keyed lookup
    #[error("Key not found: {message}")]
    KeyNotFound {
        /// Description of the missing key
        message: String,
    },

    /// Stored type does not match the requested type
    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        /// The type the caller asked for
        expected: &'static str,
        /// The type actually stored
        found: &'static str,
    },

    /// Memory allocation failures
    #[error("Memory allocation failed: requested {size} bytes")]
    OutOfMemory {
        /// Number of bytes requested
        size: usize,
    },

    /// Null pointer dereference or construction from null
    #[error("Null pointer: {message}")]
    NullPointer {
        /// Description of the null access
        message: String,
    },

    /// Division by zero
    #[error("Division by zero")]
    DivisionByZero,

    /// I/O related errors (file not found, permission denied)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl VastError {
    /// Create an invalid value error
    pub fn invalid_value<S: Into<String>>(message: S) -> Self {
        Self::InvalidValue { message: message.into() }
    }

    /// Create an out of bounds error
    pub fn out_of_bounds(index: usize, size: usize) -> Self {
        Self::OutOfBounds { index, size }
    }

    /// Create a key not found error
    pub fn key_not_found<S: Into<String>>(message: S) -> Self {
        Self::KeyNotFound { message: message.into() }
    }

    /// Create a type mismatch error
    pub fn type_mismatch(expected: &'static str, found: &'static str) -> Self {
        Self::TypeMismatch { expected, found }
    }

    /// Create an out of memory error
    pub fn out_of_memory(size: usize) -> Self {
        Self::OutOfMemory { size }
    }

    /// Create a null pointer error
    pub fn null_pointer<S: Into<String>>(message: S) -> Self {
        Self::NullPointer { message: message.into() }
    }

    /// Create a file not found error (convenience wrapper for I/O errors)
    pub fn not_found<S: Into<String>>(message: S) -> Self {
        Self::Io(std::io::Error::new(std::io::ErrorKind::NotFound, message.into()))
    }

    /// Create a permission denied error (convenience wrapper for I/O errors)
    pub fn permission_denied<S: Into<String>>(message: S) -> Self {
        Self::Io(std::io::Error::new(std::io::ErrorKind::PermissionDenied, message.into()))
    }

    /// Check if this is a recoverable error
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Io(_) => true,
            Self::OutOfMemory { .. } => true,
            Self::InvalidValue { .. } => false,
            Self::OutOfBounds { .. } => false,
            Self::KeyNotFound { .. } => false,
            Self::TypeMismatch { .. } => false,
            Self::NullPointer { .. } => false,
            Self::DivisionByZero => false,
        }
    }

    /// Get the error category for logging/metrics
    pub fn category(&self) -> &'static str {
        match self {
            Self::InvalidValue { .. } => "value",
            Self::OutOfBounds { .. } => "bounds",
            Self::KeyNotFound { .. } => "key",
            Self::TypeMismatch { .. } => "type",
            Self::OutOfMemory { .. } => "memory",
            Self::NullPointer { .. } => "null",
            Self::DivisionByZero => "arithmetic",
            Self::Io(_) => "io",
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, VastError>;

/// Assert that an index is within bounds
#[inline]
pub fn check_bounds(index: usize, size: usize) -> Result<()> {
    if index >= size {
        Err(VastError::out_of_bounds(index, size))
    } else {
        Ok(())
    }
}

/// Assert that a range is within bounds
#[inline]
pub fn check_range(start: usize, end: usize, size: usize) -> Result<()> {
    if start > end {
        return Err(VastError::invalid_value(format!(
            "Invalid range: start {} > end {}",
            start, end
        )));
    }
    if end > size {
        return Err(VastError::out_of_bounds(end, size));
    }
    Ok(())
}
