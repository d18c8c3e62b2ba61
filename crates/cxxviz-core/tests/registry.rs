//! Tests for pattern dispatch

use cxxviz_core::memory::sample::{self, DEQUE_TYPE, LIST_TYPE, QUEUE_TYPE, STACK_TYPE, STRING_TYPE, VECTOR_TYPE};
use cxxviz_core::prelude::*;
use cxxviz_core::registry::BUILTIN_PATTERNS;

#[test]
fn test_repeated_initialization_keeps_five_entries()
{
    let mut registry = PatternRegistry::new();
    assert!(registry.is_empty());
    for _ in 0..3 {
        registry.ensure_initialized().unwrap();
    }
    assert_eq!(registry.len(), 5);

    let kinds: Vec<_> = registry.entries().iter().map(|entry| entry.kind()).collect();
    assert_eq!(
        kinds,
        vec![
            VisualizerKind::String,
            VisualizerKind::Vector,
            VisualizerKind::List,
            VisualizerKind::Deque,
            VisualizerKind::Adapter,
        ]
    );
}

#[test]
fn test_entries_keep_builtin_sources()
{
    let registry = PatternRegistry::with_builtins().unwrap();
    for (entry, (pattern, kind)) in registry.entries().iter().zip(BUILTIN_PATTERNS) {
        assert_eq!(entry.matcher().pattern(), pattern);
        assert_eq!(entry.kind(), kind);
    }
}

#[test]
fn test_sample_type_names_resolve()
{
    let registry = PatternRegistry::with_builtins().unwrap();
    assert_eq!(registry.resolve(STRING_TYPE), Some(VisualizerKind::String));
    assert_eq!(registry.resolve(VECTOR_TYPE), Some(VisualizerKind::Vector));
    assert_eq!(registry.resolve(LIST_TYPE), Some(VisualizerKind::List));
    assert_eq!(registry.resolve(DEQUE_TYPE), Some(VisualizerKind::Deque));
    assert_eq!(registry.resolve(STACK_TYPE), Some(VisualizerKind::Adapter));
    assert_eq!(registry.resolve(QUEUE_TYPE), Some(VisualizerKind::Adapter));
}

#[test]
fn test_element_type_is_a_wildcard()
{
    let registry = PatternRegistry::with_builtins().unwrap();
    for name in [
        "std::__1::vector<std::__1::vector<int, std::__1::allocator<int> >, std::__1::allocator<std::__1::vector<int> > >",
        "std::__1::vector<my::Widget, my::PoolAllocator<my::Widget> >",
        "std::__1::vector<char>",
    ] {
        assert_eq!(registry.resolve(name), Some(VisualizerKind::Vector), "{name}");
    }
}

#[test]
fn test_unrecognized_type_yields_no_visualizer()
{
    let registry = PatternRegistry::with_builtins().unwrap();
    let mut snapshot = Snapshot::new();
    let name = "std::__1::map<int, int, std::__1::less<int>, std::__1::allocator<int> >";
    snapshot.types.insert_struct(name, StructLayout::new(8).field("__size_", 0, "unsigned long"));
    let address = snapshot.memory.alloc_zeroed(8).unwrap();

    assert!(registry.lookup(&snapshot.value(name, address)).unwrap().is_none());
    assert!(registry.lookup(&snapshot.value("int", address)).unwrap().is_none());
}

#[test]
fn test_lookup_on_empty_registry_matches_nothing()
{
    let registry = PatternRegistry::new();
    let mut snapshot = Snapshot::new();
    let object = sample::vector(&mut snapshot, &[1]).unwrap();
    assert!(registry.lookup(&object.value(&snapshot)).unwrap().is_none());
}

#[test]
fn test_initialization_skipped_when_entries_exist()
{
    let mut registry = PatternRegistry::new();
    registry.register(r"^std::__1::vector<.*>$", VisualizerKind::Vector).unwrap();
    registry.ensure_initialized().unwrap();
    assert_eq!(registry.len(), 1);
    assert_eq!(registry.resolve(STRING_TYPE), None);
}

#[test]
fn test_registered_pattern_extends_dispatch()
{
    let mut registry = PatternRegistry::with_builtins().unwrap();
    registry
        .register(r"^my::small_vector<.*>$", VisualizerKind::Vector)
        .unwrap();
    assert_eq!(registry.len(), 6);

    // Same layout as a libc++ vector under a different name.
    let mut snapshot = Snapshot::new();
    let object = sample::vector(&mut snapshot, &[4, 2]).unwrap();
    let name = "my::small_vector<int>";
    let layout = snapshot.types.get(VECTOR_TYPE).unwrap().clone();
    snapshot.types.insert(name, layout);

    let visualizer = registry.lookup(&snapshot.value(name, object.address)).unwrap().unwrap();
    assert_eq!(visualizer.kind(), VisualizerKind::Vector);
    assert_eq!(visualizer.summary().unwrap(), "my::small_vector<int> of length 2");
}

#[test]
fn test_earlier_registration_shadows_builtin()
{
    let mut registry = PatternRegistry::new();
    registry.register(r"^std::__1::list<.*>$", VisualizerKind::Vector).unwrap();
    registry.register(r"^std::__1::list<.*>$", VisualizerKind::List).unwrap();
    assert_eq!(registry.resolve(LIST_TYPE), Some(VisualizerKind::Vector));
}

#[test]
fn test_registry_is_shareable_across_requests()
{
    let registry = PatternRegistry::with_builtins().unwrap();
    let mut snapshot = Snapshot::new();
    let first = sample::vector(&mut snapshot, &[1, 2, 3]).unwrap();
    let second = sample::list(&mut snapshot, &[4]).unwrap();

    let a = registry.lookup(&first.value(&snapshot)).unwrap().unwrap();
    let b = registry.lookup(&second.value(&snapshot)).unwrap().unwrap();
    assert_eq!(a.kind(), VisualizerKind::Vector);
    assert_eq!(b.kind(), VisualizerKind::List);
    assert_eq!(registry.len(), 5);
}
