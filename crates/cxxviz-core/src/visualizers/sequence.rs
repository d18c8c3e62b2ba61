//! Lazy, bounded element sequences for the children view.
//!
//! Every container hands out an [`ElementSequence`]: a counter over
//! `[0, len)` paired with a container-specific [`SequenceStep`] that knows how
//! to reach element `i`. The counter, not the container's pointer structure,
//! decides when iteration ends. A corrupted list ring or a deque map that
//! points back at itself therefore still produces at most `len` items.
//!
//! Sequences are not restartable. Asking a visualizer for its children again
//! re-reads the container header and builds a fresh sequence.

use tracing::{trace, warn};

use crate::error::Result;

/// A `(label, value)` pair yielded by a child sequence.
#[derive(Debug, Clone)]
pub struct Child<V>
{
    /// Positional label such as `[0]`
    pub label: String,
    /// Handle to the element itself
    pub value: V,
}

/// Container-specific navigation from one element to the next.
///
/// `step` is called with consecutive indices starting at zero and is never
/// called more than `len` times for a sequence of length `len`.
pub trait SequenceStep
{
    /// Handle type of the produced elements
    type Value;

    /// Produce the element at logical position `index`.
    ///
    /// ## Errors
    ///
    /// Any read failure while locating the element. The sequence ends after
    /// the first error.
    fn step(&mut self, index: u64) -> Result<Self::Value>;
}

/// Bounded iterator over `Result<Child<V>>`.
#[derive(Debug, Clone)]
pub struct ElementSequence<S>
{
    index: u64,
    len: u64,
    stepper: S,
}

impl<S: SequenceStep> ElementSequence<S>
{
    pub(crate) fn new(len: u64, stepper: S) -> Self
    {
        Self { index: 0, len, stepper }
    }

    /// Number of elements the container claims to hold.
    #[must_use]
    pub fn expected_len(&self) -> u64
    {
        self.len
    }
}

impl<S: SequenceStep> Iterator for ElementSequence<S>
{
    type Item = Result<Child<S::Value>>;

    fn next(&mut self) -> Option<Self::Item>
    {
        if self.index >= self.len {
            return None;
        }

        let index = self.index;
        match self.stepper.step(index) {
            Ok(value) => {
                trace!(index, "yielding child");
                self.index += 1;
                Some(Ok(Child {
                    label: index_label(index),
                    value,
                }))
            }
            Err(err) => {
                warn!(index, len = self.len, "child sequence truncated: {err}");
                self.index = self.len;
                Some(Err(err))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>)
    {
        let remaining = usize::try_from(self.len - self.index).ok();
        (0, remaining)
    }
}

/// Positional label used by every sequential container.
pub(crate) fn index_label(index: u64) -> String
{
    format!("[{index}]")
}
