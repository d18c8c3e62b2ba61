//! # Pattern Registry
//!
//! Ordered table of `(type-name pattern, visualizer kind)` entries.
//!
//! Dispatch is first-match-wins: [`PatternRegistry::lookup`] walks the entries
//! in registration order and binds the visualizer of the first pattern that
//! accepts the value's type name. A type name that matches nothing is not an
//! error; the lookup returns `Ok(None)` and the host renders the value its own
//! way.
//!
//! The registry is plain caller-owned state. Hosts build one, call
//! [`PatternRegistry::ensure_initialized`] (idempotent) and share it read-only
//! across display requests.
//!
//! ## Usage
//!
//! ```rust
//! use cxxviz_core::registry::{PatternRegistry, VisualizerKind};
//!
//! let mut registry = PatternRegistry::new();
//! registry.ensure_initialized()?;
//! registry.ensure_initialized()?; // no-op
//! assert_eq!(registry.len(), 5);
//!
//! assert_eq!(
//!     registry.resolve("std::__1::vector<int, std::__1::allocator<int> >"),
//!     Some(VisualizerKind::Vector)
//! );
//! assert_eq!(registry.resolve("std::__1::map<int, int>"), None);
//! # Ok::<(), cxxviz_core::error::VisualizerError>(())
//! ```

use std::fmt;

use regex::Regex;
use tracing::{debug, trace};

use crate::error::{Result, VisualizerError};
use crate::value::ValueHandle;
use crate::visualizers::{StringLayout, Visualizer};

/// Container family a pattern dispatches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VisualizerKind
{
    /// Character strings
    String,
    /// Contiguous vectors
    Vector,
    /// Circular linked lists
    List,
    /// Block-indexed deques
    Deque,
    /// Stack and queue adapters
    Adapter,
}

impl VisualizerKind
{
    /// Short lowercase name, used in logs and CLI output.
    #[must_use]
    pub const fn name(self) -> &'static str
    {
        match self {
            VisualizerKind::String => "string",
            VisualizerKind::Vector => "vector",
            VisualizerKind::List => "list",
            VisualizerKind::Deque => "deque",
            VisualizerKind::Adapter => "adapter",
        }
    }
}

impl fmt::Display for VisualizerKind
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.write_str(self.name())
    }
}

/// Built-in libc++ patterns, in dispatch order.
///
/// Element and allocator parameters are wildcards; only the container name
/// and the `__1` inline namespace are fixed.
pub const BUILTIN_PATTERNS: [(&str, VisualizerKind); 5] = [
    (r"^std::__1::(basic_string<char.*>|string)$", VisualizerKind::String),
    (r"^std::__1::vector<.*>$", VisualizerKind::Vector),
    (r"^std::__1::list<.*>$", VisualizerKind::List),
    (r"^std::__1::deque<.*>$", VisualizerKind::Deque),
    (r"^std::__1::(stack|queue)<.*>$", VisualizerKind::Adapter),
];

/// Compiled type-name pattern.
///
/// Patterns are regular expressions searched within the type name; anchor
/// them with `^` and `$` to match whole names.
#[derive(Debug, Clone)]
pub struct TypeMatcher
{
    regex: Regex,
}

impl TypeMatcher
{
    /// Compile a pattern.
    ///
    /// ## Errors
    ///
    /// `InvalidPattern` if the regular expression does not compile.
    pub fn new(pattern: &str) -> Result<Self>
    {
        let regex = Regex::new(pattern).map_err(|source| VisualizerError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self { regex })
    }

    /// The pattern source.
    #[must_use]
    pub fn pattern(&self) -> &str
    {
        self.regex.as_str()
    }

    /// Whether `type_name` matches this pattern.
    #[must_use]
    pub fn matches(&self, type_name: &str) -> bool
    {
        self.regex.is_match(type_name)
    }
}

/// One registry entry.
#[derive(Debug, Clone)]
pub struct PatternEntry
{
    matcher: TypeMatcher,
    kind: VisualizerKind,
}

impl PatternEntry
{
    /// Pattern of this entry.
    #[must_use]
    pub fn matcher(&self) -> &TypeMatcher
    {
        &self.matcher
    }

    /// Visualizer kind this entry dispatches to.
    #[must_use]
    pub fn kind(&self) -> VisualizerKind
    {
        self.kind
    }
}

/// Ordered dispatch table from type names to visualizers.
#[derive(Debug, Clone, Default)]
pub struct PatternRegistry
{
    entries: Vec<PatternEntry>,
    string_layout: StringLayout,
}

impl PatternRegistry
{
    /// Create an empty registry using the default libc++ string layout.
    #[must_use]
    pub fn new() -> Self
    {
        Self::default()
    }

    /// Create a registry with the built-in patterns installed.
    ///
    /// ## Errors
    ///
    /// `InvalidPattern` if a built-in pattern fails to compile.
    pub fn with_builtins() -> Result<Self>
    {
        let mut registry = Self::new();
        registry.ensure_initialized()?;
        Ok(registry)
    }

    /// Replace the string layout contract handed to string visualizers.
    #[must_use]
    pub fn with_string_layout(mut self, layout: StringLayout) -> Self
    {
        self.string_layout = layout;
        self
    }

    /// String layout contract handed to string visualizers.
    #[must_use]
    pub fn string_layout(&self) -> StringLayout
    {
        self.string_layout
    }

    /// Append a pattern. Earlier entries take priority over later ones.
    ///
    /// ## Errors
    ///
    /// `InvalidPattern` if the pattern does not compile; the registry is left
    /// unchanged.
    pub fn register(&mut self, pattern: &str, kind: VisualizerKind) -> Result<()>
    {
        let matcher = TypeMatcher::new(pattern)?;
        trace!(pattern, %kind, position = self.entries.len(), "registering pattern");
        self.entries.push(PatternEntry { matcher, kind });
        Ok(())
    }

    /// Install the built-in patterns unless the registry already has entries.
    ///
    /// Calling this any number of times leaves exactly one copy of each
    /// built-in pattern.
    ///
    /// ## Errors
    ///
    /// `InvalidPattern` if a built-in pattern fails to compile.
    pub fn ensure_initialized(&mut self) -> Result<()>
    {
        if !self.entries.is_empty() {
            return Ok(());
        }

        // Compile everything before touching the table so a failure leaves it empty.
        let entries = BUILTIN_PATTERNS
            .iter()
            .map(|&(pattern, kind)| Ok(PatternEntry { matcher: TypeMatcher::new(pattern)?, kind }))
            .collect::<Result<Vec<_>>>()?;
        self.entries = entries;
        debug!(patterns = self.entries.len(), "installed built-in visualizer patterns");
        Ok(())
    }

    /// Kind of the first entry whose pattern accepts `type_name`.
    #[must_use]
    pub fn resolve(&self, type_name: &str) -> Option<VisualizerKind>
    {
        self.entries
            .iter()
            .find(|entry| entry.matcher.matches(type_name))
            .map(PatternEntry::kind)
    }

    /// Bind a visualizer for `value`, or `Ok(None)` when no pattern matches.
    ///
    /// ## Errors
    ///
    /// Read failures while binding (only adapters read memory at bind time).
    pub fn lookup<V: ValueHandle>(&self, value: &V) -> Result<Option<Visualizer<V>>>
    {
        let type_name = value.type_name();
        let Some(kind) = self.resolve(type_name) else {
            trace!(type_name, "no visualizer pattern matched");
            return Ok(None);
        };

        debug!(type_name, %kind, "binding visualizer");
        Visualizer::bind(kind, type_name, value, self).map(Some)
    }

    /// Entries in dispatch order.
    #[must_use]
    pub fn entries(&self) -> &[PatternEntry]
    {
        &self.entries
    }

    /// Number of registered entries.
    #[must_use]
    pub fn len(&self) -> usize
    {
        self.entries.len()
    }

    /// Whether no entries are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool
    {
        self.entries.is_empty()
    }
}
