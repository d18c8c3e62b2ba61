//! # Error Types
//!
//! Error handling for visualizer dispatch and memory decoding.
//!
//! We use `thiserror` to derive the `Error` trait implementations and display
//! messages.

use thiserror::Error;

/// Main error type for visualizer operations
///
/// A type name that matches no registered pattern is *not* an error: lookups
/// return `Ok(None)` so the host can fall back to its default rendering. Every
/// variant here describes a failure local to one summary or one child step.
///
/// ## Error Categories
///
/// 1. **Read errors**: ReadFailed, UnknownType
/// 2. **Shape errors**: FieldNotFound, TypeMismatch
/// 3. **Layout errors**: LayoutViolation
/// 4. **Setup errors**: InvalidPattern, InvalidArgument
#[derive(Error, Debug)]
pub enum VisualizerError
{
    /// Memory behind a value handle could not be read
    ///
    /// This happens when:
    /// - The address is not mapped in the target image
    /// - The range runs past the end of a mapped region
    /// - A null pointer was dereferenced
    #[error("Failed to read {length} bytes at 0x{address:016x}")]
    ReadFailed
    {
        /// First address of the requested range
        address: u64,
        /// Number of bytes requested
        length: usize,
    },

    /// A named member is absent from the value's layout
    #[error("Type `{type_name}` has no field `{field}`")]
    FieldNotFound
    {
        /// Type that was searched
        type_name: String,
        /// Field that was requested
        field: String,
    },

    /// An accessor operation was applied to a value of the wrong category
    ///
    /// Examples: dereferencing an integer, reading a struct as a count.
    #[error("Type `{type_name}` is not {expected}")]
    TypeMismatch
    {
        /// Type of the value the operation was applied to
        type_name: String,
        /// Category the operation requires ("a pointer", "an integer", ...)
        expected: &'static str,
    },

    /// The accessor has no layout for a type name
    #[error("Unknown type: {0}")]
    UnknownType(String),

    /// A stored count, offset or size implies traversal beyond the structure
    ///
    /// This covers a deque with a zero block size, index arithmetic that
    /// overflows, a vector whose end precedes its begin, and a short string
    /// whose packed length exceeds the inline buffer. These are treated like
    /// read failures: the current request fails and nothing wraps around.
    #[error("Layout violation: {0}")]
    LayoutViolation(String),

    /// A registry pattern failed to compile
    #[error("Invalid type pattern `{pattern}`: {source}")]
    InvalidPattern
    {
        /// The pattern as supplied
        pattern: String,
        /// Underlying regex error
        #[source]
        source: regex::Error,
    },

    /// Invalid argument passed to an image or registry function
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl VisualizerError
{
    /// Whether this error came from reading target memory (including layout
    /// violations, which are reported the same way to the host).
    #[must_use]
    pub fn is_read_failure(&self) -> bool
    {
        matches!(self, Self::ReadFailed { .. } | Self::LayoutViolation(_))
    }
}

/// Convenience type alias for `Result<T, VisualizerError>`
///
/// ```rust
/// use cxxviz_core::error::Result;
/// fn foo() -> Result<()>
/// {
///     Ok(())
/// }
/// ```
pub type Result<T> = std::result::Result<T, VisualizerError>;
