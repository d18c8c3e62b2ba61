//! # Container Visualizers
//!
//! One visualizer per container family, gathered under the closed
//! [`Visualizer`] enum that the registry hands back to hosts.
//!
//! Each visualizer is bound to a `(type name, value)` pair and keeps nothing
//! else. Summaries and child sequences re-read the container header every time
//! they are requested, so they always reflect the target's memory as it is now.
//!
//! | Family        | Summary                          | Children | Hint   |
//! |---------------|----------------------------------|----------|--------|
//! | string        | `"text"`                         | none     | string |
//! | vector        | `{type} of length {n}`           | `[i]`    | array  |
//! | list          | `{type} of length {n}`           | `[i]`    | array  |
//! | deque         | `{type} of length {n}`           | `[i]`    | array  |
//! | stack / queue | `{type} wrapping: {inner}`       | inner    | inner  |

pub mod adapter;
pub mod deque;
pub mod list;
pub mod sequence;
pub mod string;
pub mod vector;

use std::fmt;

pub use adapter::AdapterVisualizer;
pub use deque::{DequeStep, DequeVisualizer};
pub use list::{ListStep, ListVisualizer};
pub use sequence::{Child, ElementSequence, SequenceStep};
pub use string::{StringLayout, StringVisualizer};
pub use vector::{VectorStep, VectorVisualizer};

use crate::error::Result;
use crate::registry::{PatternRegistry, VisualizerKind};
use crate::value::ValueHandle;

/// How a host should lay out a visualized value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DisplayHint
{
    /// String-like: render the summary as text, no separate children view.
    String,
    /// Sequential, array-like children.
    Array,
}

impl DisplayHint
{
    /// Conventional hint string understood by pretty-printer hosts.
    #[must_use]
    pub const fn as_str(self) -> &'static str
    {
        match self {
            DisplayHint::String => "string",
            DisplayHint::Array => "array",
        }
    }
}

impl fmt::Display for DisplayHint
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.write_str(self.as_str())
    }
}

/// Child sequence of any sequential container.
#[derive(Debug, Clone)]
pub enum Children<V>
{
    /// Contiguous storage walk
    Vector(ElementSequence<VectorStep<V>>),
    /// Linked ring walk bounded by the stored size
    List(ElementSequence<ListStep<V>>),
    /// Block map walk
    Deque(ElementSequence<DequeStep<V>>),
}

impl<V: ValueHandle> Children<V>
{
    /// Number of elements the container claims to hold.
    pub fn expected_len(&self) -> u64
    {
        match self {
            Children::Vector(seq) => seq.expected_len(),
            Children::List(seq) => seq.expected_len(),
            Children::Deque(seq) => seq.expected_len(),
        }
    }
}

impl<V: ValueHandle> Iterator for Children<V>
{
    type Item = Result<Child<V>>;

    fn next(&mut self) -> Option<Self::Item>
    {
        match self {
            Children::Vector(seq) => seq.next(),
            Children::List(seq) => seq.next(),
            Children::Deque(seq) => seq.next(),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>)
    {
        match self {
            Children::Vector(seq) => seq.size_hint(),
            Children::List(seq) => seq.size_hint(),
            Children::Deque(seq) => seq.size_hint(),
        }
    }
}

/// A visualizer bound to one value.
#[derive(Debug, Clone)]
pub enum Visualizer<V>
{
    /// `std::__1::basic_string<char>`
    String(StringVisualizer<V>),
    /// `std::__1::vector<T>`
    Vector(VectorVisualizer<V>),
    /// `std::__1::list<T>`
    List(ListVisualizer<V>),
    /// `std::__1::deque<T>`
    Deque(DequeVisualizer<V>),
    /// `std::__1::stack<T, C>` / `std::__1::queue<T, C>`
    Adapter(AdapterVisualizer<V>),
}

impl<V: ValueHandle> Visualizer<V>
{
    /// Construct the visualizer for `kind` bound to `value`.
    ///
    /// Only adapters read memory here (to resolve the wrapped container); the
    /// other families defer every read to `summary` and `children`.
    ///
    /// ## Errors
    ///
    /// Read failures while binding an adapter's inner container.
    pub fn bind(kind: VisualizerKind, type_name: &str, value: &V, registry: &PatternRegistry) -> Result<Self>
    {
        let visualizer = match kind {
            VisualizerKind::String => Visualizer::String(StringVisualizer::with_layout(
                type_name,
                value.clone(),
                registry.string_layout(),
            )),
            VisualizerKind::Vector => Visualizer::Vector(VectorVisualizer::new(type_name, value.clone())),
            VisualizerKind::List => Visualizer::List(ListVisualizer::new(type_name, value.clone())),
            VisualizerKind::Deque => Visualizer::Deque(DequeVisualizer::new(type_name, value.clone())),
            VisualizerKind::Adapter => Visualizer::Adapter(AdapterVisualizer::bind(type_name, value, registry)?),
        };
        Ok(visualizer)
    }

    /// Container family of this visualizer.
    pub fn kind(&self) -> VisualizerKind
    {
        match self {
            Visualizer::String(_) => VisualizerKind::String,
            Visualizer::Vector(_) => VisualizerKind::Vector,
            Visualizer::List(_) => VisualizerKind::List,
            Visualizer::Deque(_) => VisualizerKind::Deque,
            Visualizer::Adapter(_) => VisualizerKind::Adapter,
        }
    }

    /// Type name the visualizer was bound with.
    pub fn type_name(&self) -> &str
    {
        match self {
            Visualizer::String(v) => v.type_name(),
            Visualizer::Vector(v) => v.type_name(),
            Visualizer::List(v) => v.type_name(),
            Visualizer::Deque(v) => v.type_name(),
            Visualizer::Adapter(v) => v.type_name(),
        }
    }

    /// One-line summary of the value.
    ///
    /// ## Errors
    ///
    /// Read failures or layout violations while decoding the header.
    pub fn summary(&self) -> Result<String>
    {
        match self {
            Visualizer::String(v) => v.summary(),
            Visualizer::Vector(v) => v.summary(),
            Visualizer::List(v) => v.summary(),
            Visualizer::Deque(v) => v.summary(),
            Visualizer::Adapter(v) => v.summary(),
        }
    }

    /// A fresh child sequence, or `None` for values without children.
    ///
    /// ## Errors
    ///
    /// Read failures while reading the container header. Failures on
    /// individual elements are reported by the sequence itself.
    pub fn children(&self) -> Result<Option<Children<V>>>
    {
        match self {
            Visualizer::String(_) => Ok(None),
            Visualizer::Vector(v) => v.children().map(|seq| Some(Children::Vector(seq))),
            Visualizer::List(v) => v.children().map(|seq| Some(Children::List(seq))),
            Visualizer::Deque(v) => v.children().map(|seq| Some(Children::Deque(seq))),
            Visualizer::Adapter(v) => v.children(),
        }
    }

    /// Layout hint for the host.
    pub fn display_hint(&self) -> Option<DisplayHint>
    {
        match self {
            Visualizer::String(v) => v.display_hint(),
            Visualizer::Vector(v) => v.display_hint(),
            Visualizer::List(v) => v.display_hint(),
            Visualizer::Deque(v) => v.display_hint(),
            Visualizer::Adapter(v) => v.display_hint(),
        }
    }
}
