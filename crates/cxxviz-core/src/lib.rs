//! # cxxviz-core
//!
//! Debugger-side visualizers for libc++ containers.
//!
//! A host debugger hands this crate a typed handle to a value in the stopped
//! target. If the value's type name matches a registered pattern, the bound
//! visualizer produces:
//! - A one-line summary (`"hello"`, `std::__1::vector<int> of length 3`)
//! - A lazily evaluated, bounded sequence of labelled children (`[0]`, `[1]`, ...)
//! - A display hint (`string` or `array`) for the host's renderer
//!
//! ## Supported containers
//!
//! - `std::string` with both the short (inline) and long (heap) representations
//! - `std::vector`
//! - `std::list`
//! - `std::deque`
//! - `std::stack` and `std::queue`, forwarded to their underlying container
//!
//! ## Memory access
//!
//! Visualizers never read memory directly. Everything goes through the
//! [`ValueHandle`] trait, which the host implements over its own value objects.
//! The [`memory`] module provides an implementation over an in-process byte
//! image, along with builders that lay out real libc++ containers in it.
//!
//! No `unsafe` code is needed anywhere in the crate.

pub mod error;
pub mod memory;
pub mod prelude;
pub mod registry;
pub mod types;
pub mod value;
pub mod visualizers;

pub use error::{Result, VisualizerError};
pub use registry::{PatternRegistry, VisualizerKind};
pub use types::Address;
pub use value::ValueHandle;
pub use visualizers::{Child, Children, DisplayHint, Visualizer};
