//! # Value Accessor
//!
//! The interface visualizers read target memory through.
//!
//! A host debugger owns the real implementation: it knows the target's type
//! information and how to fetch bytes from a live process or a core file.
//! Visualizers only need a handful of typed operations, so they are written
//! against this trait and never touch raw memory themselves.
//!
//! The crate ships one implementation, [`ImageValue`](crate::memory::ImageValue),
//! backed by an in-memory process image. It is what the CLI and the tests use.
//!
//! ## Contract
//!
//! - Handles are cheap to clone and never owned by a visualizer in any sense
//!   that matters to the target: dropping one releases nothing in the process.
//! - Every operation is a read. Nothing here can modify target memory.
//! - Every operation can fail. Failures are returned to the caller of the
//!   operation in progress and never poison other handles.

use std::fmt;

use crate::error::Result;

/// Typed handle to a value in target memory
///
/// ## Pointer semantics
///
/// Pointer arithmetic is scaled by the pointee size, exactly as in the target
/// language: `offset(1)` on an `int *` moves four bytes, and
/// `pointer_distance` returns an element count, not a byte count.
pub trait ValueHandle: Clone + fmt::Debug
{
    /// Fully qualified type name of this value (e.g. a template instantiation).
    fn type_name(&self) -> &str;

    /// Access a member by name.
    ///
    /// Static members of the type (such as a per-instantiation block size)
    /// are reachable the same way as data members.
    ///
    /// ## Errors
    ///
    /// - `FieldNotFound`: the type has no member with that name
    /// - `TypeMismatch`: the value is not an aggregate
    fn field(&self, name: &str) -> Result<Self>;

    /// Follow a pointer.
    ///
    /// ## Errors
    ///
    /// - `TypeMismatch`: the value is not a pointer
    /// - `ReadFailed`: the pointer itself cannot be read, is null, or points
    ///   at memory that cannot be read
    fn dereference(&self) -> Result<Self>;

    /// Pointer plus an element count, yielding a new pointer value.
    ///
    /// ## Errors
    ///
    /// - `TypeMismatch`: the value is not a pointer
    /// - `LayoutViolation`: the result leaves the address space
    fn offset(&self, count: i64) -> Result<Self>;

    /// Number of elements between `self` and `end` (`end - self`).
    ///
    /// ## Errors
    ///
    /// - `TypeMismatch`: either value is not a pointer, or the pointee types differ
    /// - `LayoutViolation`: the byte distance is not a whole number of elements
    fn pointer_distance(&self, end: &Self) -> Result<i64>;

    /// Read this value as an unsigned integer (counts, sizes, offsets, flag words).
    ///
    /// ## Errors
    ///
    /// - `TypeMismatch`: the value is not an integer or pointer
    /// - `LayoutViolation`: the value is a negative signed integer
    fn as_u64(&self) -> Result<u64>;

    /// Interpret this value as a character buffer and extract `length`
    /// characters.
    ///
    /// For a pointer the characters are read at the pointee; for a character
    /// array they are read in place. Bytes are returned as extracted: embedded
    /// NULs and control characters are not escaped here.
    fn read_string(&self, length: usize) -> Result<String>;

    /// Generic rendering used when no visualizer applies.
    fn render(&self) -> Result<String>;

    /// Walk a chain of member names, e.g. `["__r_", "__first_", "__s"]`.
    fn field_path(&self, path: &[&str]) -> Result<Self>
    {
        path.iter().try_fold(self.clone(), |value, name| value.field(name))
    }
}
