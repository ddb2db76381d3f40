//! Error types for the Atlas3D engine
//!
//! Every fallible operation of the scene core returns [`Result`]. Errors are
//! usually built through `engine_err!` / `engine_bail!`, which log the failure
//! with file:line before handing it back to the caller.

use std::fmt;

/// Result type for Atlas3D engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Atlas3D engine errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A required collaborator was absent (expired renderer, parent, buffer...)
    NullReference(String),

    /// A configured maximum (children, renderables, memory budget) would be exceeded
    CapacityExceeded(String),

    /// A lookup had no match (renderable aspect, child, factory constructor)
    NotFound(String),

    /// An index was out of bounds
    OutOfRange(String),

    /// The render tree is not made of render nodes only
    InvalidNodeType(String),

    /// A buffer, cache or command belongs to another renderer
    InvalidConsumer(String),

    /// GPU storage backend failure
    BackendError(String),
}

impl Error {
    /// Short, stable name of the error kind (used in logs)
    pub fn kind(&self) -> &'static str {
        match self {
            Error::NullReference(_) => "NullReference",
            Error::CapacityExceeded(_) => "CapacityExceeded",
            Error::NotFound(_) => "NotFound",
            Error::OutOfRange(_) => "OutOfRange",
            Error::InvalidNodeType(_) => "InvalidNodeType",
            Error::InvalidConsumer(_) => "InvalidConsumer",
            Error::BackendError(_) => "BackendError",
        }
    }

    /// Message attached to the error
    pub fn message(&self) -> &str {
        match self {
            Error::NullReference(msg)
            | Error::CapacityExceeded(msg)
            | Error::NotFound(msg)
            | Error::OutOfRange(msg)
            | Error::InvalidNodeType(msg)
            | Error::InvalidConsumer(msg)
            | Error::BackendError(msg) => msg,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NullReference(msg) => write!(f, "Null reference: {}", msg),
            Error::CapacityExceeded(msg) => write!(f, "Capacity exceeded: {}", msg),
            Error::NotFound(msg) => write!(f, "Not found: {}", msg),
            Error::OutOfRange(msg) => write!(f, "Out of range: {}", msg),
            Error::InvalidNodeType(msg) => write!(f, "Invalid node type: {}", msg),
            Error::InvalidConsumer(msg) => write!(f, "Invalid consumer: {}", msg),
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

// ===== ERROR MACROS =====

/// Build an [`Error`] of the given kind and log it at ERROR severity
///
/// # Example
///
/// ```ignore
/// let err = engine_err!("atlas3d::Node", OutOfRange, "Index {} out of bounds", idx);
/// ```
#[macro_export]
macro_rules! engine_err {
    ($source:expr, $kind:ident, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::engine_error!($source, "{}", message);
        $crate::atlas3d::Error::$kind(message)
    }};
}

/// Log and return early with an [`Error`] of the given kind
///
/// # Example
///
/// ```ignore
/// engine_bail!("atlas3d::Node", CapacityExceeded, "Node is full ({} children)", max);
/// ```
#[macro_export]
macro_rules! engine_bail {
    ($source:expr, $kind:ident, $($arg:tt)*) => {
        return Err($crate::engine_err!($source, $kind, $($arg)*))
    };
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
