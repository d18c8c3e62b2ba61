//! `std::__1::list<T>` visualizer.
//!
//! A circular doubly-linked list anchored at a sentinel node (`__end_`). The
//! sentinel's `__next_` is the first real node and the last node links back to
//! the sentinel, so following `__next_` never terminates on its own. The stored
//! element count is the only bound on traversal.

use super::sequence::{ElementSequence, SequenceStep};
use super::DisplayHint;
use crate::error::Result;
use crate::value::ValueHandle;

/// Renders a list as an array of its elements.
#[derive(Debug, Clone)]
pub struct ListVisualizer<V>
{
    type_name: String,
    value: V,
}

impl<V: ValueHandle> ListVisualizer<V>
{
    /// Bind to a list value.
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

    /// Stored element count (`__size_alloc_.__first_`), not a traversal count.
    ///
    /// ## Errors
    ///
    /// Read failure on the size field.
    pub fn length(&self) -> Result<u64>
    {
        self.value.field_path(&["__size_alloc_", "__first_"])?.as_u64()
    }

    /// `"{type} of length {size}"`.
    ///
    /// ## Errors
    ///
    /// Same as [`ListVisualizer::length`].
    pub fn summary(&self) -> Result<String>
    {
        Ok(format!("{} of length {}", self.type_name, self.length()?))
    }

    /// Follow `__next_` from the sentinel for exactly `size` nodes.
    ///
    /// ## Errors
    ///
    /// Read failure on the size field or the sentinel.
    pub fn children(&self) -> Result<ElementSequence<ListStep<V>>>
    {
        let len = self.length()?;
        let first = self.value.field_path(&["__end_", "__next_"])?;
        Ok(ElementSequence::new(len, ListStep { node: first }))
    }

    /// Lists render as arrays.
    pub fn display_hint(&self) -> Option<DisplayHint>
    {
        Some(DisplayHint::Array)
    }
}

/// Cursor over list nodes.
#[derive(Debug, Clone)]
pub struct ListStep<V>
{
    node: V,
}

impl<V: ValueHandle> SequenceStep for ListStep<V>
{
    type Value = V;

    fn step(&mut self, index: u64) -> Result<V>
    {
        // The link is followed only when another element is due, so a list of
        // size n reads n - 1 links.
        if index > 0 {
            self.node = self.node.dereference()?.field("__next_")?;
        }
        self.node.dereference()?.field("__value_")
    }
}
