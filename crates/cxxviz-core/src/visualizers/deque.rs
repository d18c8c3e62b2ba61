//! `std::__1::deque<T>` visualizer.
//!
//! A deque is a map of pointers to fixed-size blocks. Logical element `i`
//! lives at absolute position `i + __start_`, which splits into a block index
//! and an offset inside that block:
//!
//! ```text
//! idx    = i + start
//! block  = idx / block_size
//! offset = idx % block_size
//! value  = *(*(map + block) + offset)
//! ```
//!
//! `map` is `__map_.__begin_`, the first live block slot. `__start_` counts
//! from there, not from `__map_.__first_` (older printers index from `__first_`).
//!
//! The block size is a static member of the instantiation (`__block_size`),
//! read from the value rather than assumed.

use tracing::warn;

use super::sequence::{ElementSequence, SequenceStep};
use super::DisplayHint;
use crate::error::{Result, VisualizerError};
use crate::value::ValueHandle;

/// Renders a deque as an array of its elements.
#[derive(Debug, Clone)]
pub struct DequeVisualizer<V>
{
    type_name: String,
    value: V,
}

impl<V: ValueHandle> DequeVisualizer<V>
{
    /// Bind to a deque value.
    pub fn new(type_name: impl Into<String>, value: V) -> Self
    {
        Self {
            type_name: type_name.into(),
            value,
        }
    }

    /// Type name this visualizer was bound with.
    pub fn type_name(&self) -> &str
    {
        &self.type_name
    }

    /// Stored element count (`__size_.__first_`).
    ///
    /// ## Errors
    ///
    /// Read failure on the size field.
    pub fn length(&self) -> Result<u64>
    {
        self.value.field_path(&["__size_", "__first_"])?.as_u64()
    }

    /// `"{type} of length {size}"`.
    ///
    /// ## Errors
    ///
    /// Same as [`DequeVisualizer::length`].
    pub fn summary(&self) -> Result<String>
    {
        Ok(format!("{} of length {}", self.type_name, self.length()?))
    }

    /// Index through the block map for each logical position.
    ///
    /// ## Errors
    ///
    /// Read failures on the header fields, or a zero block size.
    pub fn children(&self) -> Result<ElementSequence<DequeStep<V>>>
    {
        let block_size = self.value.field("__block_size")?.as_u64()?;
        if block_size == 0 {
            warn!(type_name = %self.type_name, "deque reports a zero block size");
            return Err(VisualizerError::LayoutViolation(format!(
                "`{}` has a block size of zero",
                self.type_name
            )));
        }

        let map = self.value.field_path(&["__map_", "__begin_"])?;
        let start = self.value.field("__start_")?.as_u64()?;
        let len = self.length()?;

        Ok(ElementSequence::new(
            len,
            DequeStep {
                map,
                start,
                block_size,
            },
        ))
    }

    /// Deques render as arrays.
    pub fn display_hint(&self) -> Option<DisplayHint>
    {
        Some(DisplayHint::Array)
    }
}

/// Two-level index into the block map.
#[derive(Debug, Clone)]
pub struct DequeStep<V>
{
    map: V,
    start: u64,
    block_size: u64,
}

impl<V> DequeStep<V>
{
    /// Split a logical index into `(block, offset)`.
    fn locate(&self, index: u64) -> Result<(i64, i64)>
    {
        let absolute = index.checked_add(self.start).ok_or_else(|| {
            VisualizerError::LayoutViolation(format!("deque index {index} + start {} overflows", self.start))
        })?;
        let block = i64::try_from(absolute / self.block_size)
            .map_err(|_| VisualizerError::LayoutViolation(format!("deque block index for {absolute} out of range")))?;
        let offset = i64::try_from(absolute % self.block_size)
            .map_err(|_| VisualizerError::LayoutViolation(format!("deque block offset for {absolute} out of range")))?;
        Ok((block, offset))
    }
}

impl<V: ValueHandle> SequenceStep for DequeStep<V>
{
    type Value = V;

    fn step(&mut self, index: u64) -> Result<V>
    {
        let (block, offset) = self.locate(index)?;
        self.map.offset(block)?.dereference()?.offset(offset)?.dereference()
    }
}
