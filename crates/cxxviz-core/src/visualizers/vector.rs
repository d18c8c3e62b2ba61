//! `std::__1::vector<T>` visualizer.
//!
//! Contiguous storage bounded by `__begin_` and `__end_` (exclusive).

use super::sequence::{ElementSequence, SequenceStep};
use super::DisplayHint;
use crate::error::{Result, VisualizerError};
use crate::value::ValueHandle;

/// Renders a vector as an array of its elements.
#[derive(Debug, Clone)]
pub struct VectorVisualizer<V>
{
    type_name: String,
    value: V,
}

impl<V: ValueHandle> VectorVisualizer<V>
{
    /// Bind to a vector value.
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

    fn bounds(&self) -> Result<(V, u64)>
    {
        let begin = self.value.field("__begin_")?;
        let end = self.value.field("__end_")?;
        let distance = begin.pointer_distance(&end)?;
        let len = u64::try_from(distance).map_err(|_| {
            VisualizerError::LayoutViolation(format!("vector end precedes begin by {} elements", distance.unsigned_abs()))
        })?;
        Ok((begin, len))
    }

    /// Element count, `end - begin`.
    ///
    /// ## Errors
    ///
    /// Read failures on either bound, or an end pointer before the begin pointer.
    pub fn length(&self) -> Result<u64>
    {
        self.bounds().map(|(_, len)| len)
    }

    /// `"{type} of length {n}"`.
    ///
    /// ## Errors
    ///
    /// Same as [`VectorVisualizer::length`].
    pub fn summary(&self) -> Result<String>
    {
        Ok(format!("{} of length {}", self.type_name, self.length()?))
    }

    /// Walk from `__begin_` one element at a time until `__end_`.
    ///
    /// ## Errors
    ///
    /// Same as [`VectorVisualizer::length`].
    pub fn children(&self) -> Result<ElementSequence<VectorStep<V>>>
    {
        let (begin, len) = self.bounds()?;
        Ok(ElementSequence::new(len, VectorStep { cursor: begin }))
    }

    /// Vectors render as arrays.
    pub fn display_hint(&self) -> Option<DisplayHint>
    {
        Some(DisplayHint::Array)
    }
}

/// Cursor over contiguous storage.
#[derive(Debug, Clone)]
pub struct VectorStep<V>
{
    cursor: V,
}

impl<V: ValueHandle> SequenceStep for VectorStep<V>
{
    type Value = V;

    fn step(&mut self, index: u64) -> Result<V>
    {
        // Advance lazily so the cursor never moves past the last element.
        if index > 0 {
            self.cursor = self.cursor.offset(1)?;
        }
        self.cursor.dereference()
    }
}
