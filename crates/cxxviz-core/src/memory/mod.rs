//! In-process memory image and its [`ValueHandle`](crate::value::ValueHandle).
//!
//! Hosts attached to a live debugger implement `ValueHandle` over their own
//! value objects. This module provides a self-contained implementation over a
//! byte image plus a type table, used by the CLI and the test suites, and
//! builders that lay out libc++ containers in such an image.

pub mod handle;
pub mod image;
pub mod layout;
pub mod sample;

pub use handle::{ImageValue, Location, Snapshot};
pub use image::{MemoryImage, HEAP_BASE};
pub use layout::{pointer_name, ConstantLayout, FieldLayout, ScalarKind, StructLayout, TypeLayout, TypeTable, POINTER_SIZE};
pub use sample::SampleObject;
