//! # Types
//!
//! Small value types shared by the accessor and the visualizers.

pub mod address;

pub use address::Address;
