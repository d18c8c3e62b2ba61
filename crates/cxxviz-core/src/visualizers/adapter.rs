//! `std::__1::stack<T, C>` and `std::__1::queue<T, C>` visualizer.
//!
//! Both adapters wrap a single container member, `c`. The inner visualizer is
//! resolved once, at bind time, through the same registry that matched the
//! adapter, and everything except the summary prefix is forwarded to it.

use tracing::{debug, warn};

use super::{Children, DisplayHint, Visualizer};
use crate::error::Result;
use crate::registry::PatternRegistry;
use crate::value::ValueHandle;

/// Name of the adapted-container member.
const CONTAINER_FIELD: &str = "c";

/// Delegates to the visualizer of the wrapped container.
#[derive(Debug, Clone)]
pub struct AdapterVisualizer<V>
{
    type_name: String,
    container: V,
    inner: Option<Box<Visualizer<V>>>,
}

impl<V: ValueHandle> AdapterVisualizer<V>
{
    /// Bind to an adapter value, resolving the wrapped container's visualizer.
    ///
    /// If the wrapped container's type has no visualizer the adapter still
    /// binds and renders the container generically.
    ///
    /// ## Errors
    ///
    /// Read failures on the `c` member or while binding the inner visualizer.
    pub fn bind(type_name: impl Into<String>, value: &V, registry: &PatternRegistry) -> Result<Self>
    {
        let type_name = type_name.into();
        let container = value.field(CONTAINER_FIELD)?;
        let inner = registry.lookup(&container)?.map(Box::new);

        match &inner {
            Some(visualizer) => debug!(outer = %type_name, inner = %visualizer.kind(), "adapter bound"),
            None => warn!(outer = %type_name, inner = container.type_name(), "adapter falls back to generic rendering"),
        }

        Ok(Self {
            type_name,
            container,
            inner,
        })
    }

    /// Type name this visualizer was bound with.
    pub fn type_name(&self) -> &str
    {
        &self.type_name
    }

    /// Visualizer of the wrapped container, if one matched.
    pub fn inner(&self) -> Option<&Visualizer<V>>
    {
        self.inner.as_deref()
    }

    /// `"{outer} wrapping: {inner summary}"`.
    ///
    /// ## Errors
    ///
    /// Errors from the inner summary or from generic rendering.
    pub fn summary(&self) -> Result<String>
    {
        let inner = match &self.inner {
            Some(visualizer) => visualizer.summary()?,
            None => self.container.render()?,
        };
        Ok(format!("{} wrapping: {inner}", self.type_name))
    }

    /// The inner visualizer's children, untouched.
    ///
    /// ## Errors
    ///
    /// Errors from the inner visualizer.
    pub fn children(&self) -> Result<Option<Children<V>>>
    {
        match &self.inner {
            Some(visualizer) => visualizer.children(),
            None => Ok(None),
        }
    }

    /// The inner visualizer's hint, if any.
    pub fn display_hint(&self) -> Option<DisplayHint>
    {
        self.inner.as_ref().and_then(|visualizer| visualizer.display_hint())
    }
}
