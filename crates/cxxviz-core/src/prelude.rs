//! Common module for library exports

pub use crate::error::{Result, VisualizerError};
pub use crate::memory::{ImageValue, MemoryImage, SampleObject, Snapshot, StructLayout, TypeLayout, TypeTable};
pub use crate::registry::{PatternRegistry, VisualizerKind};
pub use crate::types::address::Address;
pub use crate::value::ValueHandle;
pub use crate::visualizers::{Child, Children, DisplayHint, StringLayout, Visualizer};
