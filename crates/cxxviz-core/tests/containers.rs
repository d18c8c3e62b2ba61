//! Tests for each container visualizer against real libc++ byte layouts

use cxxviz_core::memory::sample::{self, SampleObject, DEQUE_TYPE, QUEUE_TYPE, STACK_TYPE, VECTOR_TYPE};
use cxxviz_core::prelude::*;

fn registry() -> PatternRegistry
{
    PatternRegistry::with_builtins().unwrap()
}

fn bind<'a>(registry: &PatternRegistry, snapshot: &'a Snapshot, object: &SampleObject) -> Visualizer<ImageValue<'a>>
{
    registry.lookup(&object.value(snapshot)).unwrap().expect("pattern should match")
}

/// `(label, rendered value)` for every child.
fn elements(visualizer: &Visualizer<ImageValue<'_>>) -> Vec<(String, String)>
{
    visualizer
        .children()
        .unwrap()
        .expect("container has children")
        .map(|child| {
            let child = child.unwrap();
            (child.label, child.value.render().unwrap())
        })
        .collect()
}

fn expected(values: &[i32]) -> Vec<(String, String)>
{
    values
        .iter()
        .enumerate()
        .map(|(i, v)| (format!("[{i}]"), v.to_string()))
        .collect()
}

fn string_summary(text: &str) -> String
{
    let registry = registry();
    let mut snapshot = Snapshot::new();
    let object = sample::string(&mut snapshot, text, &StringLayout::LIBCXX).unwrap();
    bind(&registry, &snapshot, &object).summary().unwrap()
}

#[test]
fn test_short_string_summary()
{
    let registry = registry();
    let mut snapshot = Snapshot::new();
    let object = sample::string(&mut snapshot, "hello", &StringLayout::LIBCXX).unwrap();
    let visualizer = bind(&registry, &snapshot, &object);

    assert_eq!(visualizer.kind(), VisualizerKind::String);
    assert_eq!(visualizer.summary().unwrap(), "\"hello\"");
    assert_eq!(visualizer.display_hint(), Some(DisplayHint::String));
    assert!(visualizer.children().unwrap().is_none());
}

#[test]
fn test_empty_string_is_empty_literal()
{
    assert_eq!(string_summary(""), "\"\"");
}

#[test]
fn test_string_at_inline_capacity_stays_short()
{
    let text = "a".repeat(22);
    let mut snapshot = Snapshot::new();
    let object = sample::string(&mut snapshot, &text, &StringLayout::LIBCXX).unwrap();
    let flag = snapshot.memory.read_uint(object.address, 1).unwrap();

    assert_eq!(flag & 1, 0);
    assert_eq!(string_summary(&text), format!("\"{text}\""));
}

#[test]
fn test_string_past_inline_capacity_goes_long()
{
    let text = "b".repeat(23);
    let mut snapshot = Snapshot::new();
    let object = sample::string(&mut snapshot, &text, &StringLayout::LIBCXX).unwrap();
    let flag = snapshot.memory.read_uint(object.address, 1).unwrap();

    assert_eq!(flag & 1, 1);
    assert_eq!(string_summary(&text), format!("\"{text}\""));
}

#[test]
fn test_long_string_round_trip()
{
    let text: String = (0..300).map(|i| char::from(b'a' + (i % 26) as u8)).collect();
    let summary = string_summary(&text);
    assert_eq!(summary.len(), text.len() + 2);
    assert_eq!(&summary[1..summary.len() - 1], text);
}

#[test]
fn test_string_passes_embedded_nul_through()
{
    assert_eq!(string_summary("a\0b"), "\"a\0b\"");
}

#[test]
fn test_vector_children_in_order()
{
    let registry = registry();
    let mut snapshot = Snapshot::new();
    let values = [10, -20, 30, 40, 50];
    let object = sample::vector(&mut snapshot, &values).unwrap();
    let visualizer = bind(&registry, &snapshot, &object);

    assert_eq!(visualizer.summary().unwrap(), format!("{VECTOR_TYPE} of length 5"));
    assert_eq!(visualizer.display_hint(), Some(DisplayHint::Array));
    assert_eq!(elements(&visualizer), expected(&values));
}

#[test]
fn test_empty_vector_has_no_children()
{
    let registry = registry();
    let mut snapshot = Snapshot::new();
    let object = sample::vector(&mut snapshot, &[]).unwrap();
    let visualizer = bind(&registry, &snapshot, &object);

    assert_eq!(visualizer.summary().unwrap(), format!("{VECTOR_TYPE} of length 0"));
    assert!(elements(&visualizer).is_empty());
}

#[test]
fn test_list_children_in_order()
{
    let registry = registry();
    let mut snapshot = Snapshot::new();
    let values = [3, 1, 4, 1, 5, 9];
    let object = sample::list(&mut snapshot, &values).unwrap();
    let visualizer = bind(&registry, &snapshot, &object);

    assert!(visualizer.summary().unwrap().ends_with(" of length 6"));
    assert_eq!(elements(&visualizer), expected(&values));
}

#[test]
fn test_empty_list_is_sentinel_only()
{
    let registry = registry();
    let mut snapshot = Snapshot::new();
    let object = sample::list(&mut snapshot, &[]).unwrap();
    let visualizer = bind(&registry, &snapshot, &object);

    assert!(visualizer.summary().unwrap().ends_with(" of length 0"));
    assert!(elements(&visualizer).is_empty());
}

#[test]
fn test_list_stops_at_stored_size()
{
    let registry = registry();
    let mut snapshot = Snapshot::new();
    let object = sample::list(&mut snapshot, &[1, 2, 3, 4]).unwrap();
    let size = Address::new(object.address.value() + 16);

    snapshot.memory.write_uint(size, 8, 2).unwrap();
    assert_eq!(elements(&bind(&registry, &snapshot, &object)), expected(&[1, 2]));

    // A size larger than the ring walks through the sentinel but still stops.
    snapshot.memory.write_uint(size, 8, 7).unwrap();
    let visualizer = bind(&registry, &snapshot, &object);
    let children: Vec<_> = visualizer.children().unwrap().unwrap().collect();
    assert_eq!(children.len(), 7);
    assert!(children.iter().all(|child| child.is_ok()));
}

/// Element `i` read straight from the block map, bypassing the visualizer.
fn physical_element(snapshot: &Snapshot, object: &SampleObject, block_size: u64, start: u64, i: u64) -> String
{
    let map_begin = snapshot
        .memory
        .read_uint(Address::new(object.address.value() + 8), 8)
        .unwrap();
    let absolute = i + start;
    let block = snapshot
        .memory
        .read_uint(Address::new(map_begin + 8 * (absolute / block_size)), 8)
        .unwrap();
    let raw = snapshot
        .memory
        .read_uint(Address::new(block + 4 * (absolute % block_size)), 4)
        .unwrap();
    (raw as u32 as i32).to_string()
}

#[test]
fn test_deque_wraps_across_blocks()
{
    let registry = registry();
    let mut snapshot = Snapshot::new();
    let (block_size, start) = (4, 3);
    let values: Vec<i32> = (100..110).collect();
    let object = sample::deque(&mut snapshot, &values, block_size, start).unwrap();
    let visualizer = bind(&registry, &snapshot, &object);

    assert_eq!(visualizer.summary().unwrap(), format!("{DEQUE_TYPE} of length 10"));
    let children = elements(&visualizer);
    assert_eq!(children, expected(&values));
    for (i, (_, rendered)) in children.iter().enumerate() {
        assert_eq!(*rendered, physical_element(&snapshot, &object, block_size, start, i as u64));
    }
}

#[test]
fn test_deque_start_past_first_block()
{
    let registry = registry();
    let mut snapshot = Snapshot::new();
    let values: Vec<i32> = (0..20).map(|v| v * 7).collect();
    let object = sample::deque(&mut snapshot, &values, 8, 13).unwrap();

    assert_eq!(elements(&bind(&registry, &snapshot, &object)), expected(&values));
}

#[test]
fn test_deque_default_block_size()
{
    let registry = registry();
    let mut snapshot = Snapshot::new();
    let object = sample::deque(&mut snapshot, &[5, 6], sample::INT_BLOCK_SIZE, 0).unwrap();

    assert_eq!(elements(&bind(&registry, &snapshot, &object)), expected(&[5, 6]));
}

#[test]
fn test_empty_deque()
{
    let registry = registry();
    let mut snapshot = Snapshot::new();
    let object = sample::deque(&mut snapshot, &[], 4, 2).unwrap();

    assert!(elements(&bind(&registry, &snapshot, &object)).is_empty());
}

fn assert_adapter_forwards(type_name: &str, build: fn(&mut Snapshot, &[i32]) -> Result<SampleObject>)
{
    let registry = registry();
    let mut snapshot = Snapshot::new();
    let values = [8, 6, 7, 5, 3, 0, 9];
    let object = build(&mut snapshot, &values).unwrap();
    let visualizer = bind(&registry, &snapshot, &object);

    let Visualizer::Adapter(adapter) = &visualizer else {
        panic!("expected an adapter, got {:?}", visualizer.kind());
    };
    let inner = adapter.inner().expect("deque visualizer");
    assert_eq!(inner.kind(), VisualizerKind::Deque);

    assert_eq!(
        visualizer.summary().unwrap(),
        format!("{type_name} wrapping: {}", inner.summary().unwrap())
    );
    assert_eq!(elements(&visualizer), elements(inner));
    assert_eq!(elements(&visualizer), expected(&values));
    assert_eq!(visualizer.display_hint(), inner.display_hint());
}

#[test]
fn test_stack_forwards_to_deque()
{
    assert_adapter_forwards(STACK_TYPE, sample::stack);
}

#[test]
fn test_queue_forwards_to_deque()
{
    assert_adapter_forwards(QUEUE_TYPE, sample::queue);
}

#[test]
fn test_adapter_over_unknown_container_renders_generically()
{
    let registry = registry();
    let mut snapshot = Snapshot::new();
    let adapter_type = "std::__1::stack<int, my::ring<int> >";
    snapshot
        .types
        .insert_struct("my::ring<int>", StructLayout::new(8).field("head", 0, "int").field("tail", 4, "int"));
    snapshot
        .types
        .insert_struct(adapter_type, StructLayout::new(8).field("c", 0, "my::ring<int>"));
    let address = snapshot.memory.alloc_zeroed(8).unwrap();
    snapshot.memory.write_uint(address, 4, 1).unwrap();
    snapshot
        .memory
        .write_uint(Address::new(address.value() + 4), 4, 2)
        .unwrap();

    let visualizer = registry.lookup(&snapshot.value(adapter_type, address)).unwrap().unwrap();
    assert_eq!(
        visualizer.summary().unwrap(),
        format!("{adapter_type} wrapping: {{head = 1, tail = 2}}")
    );
    assert!(visualizer.children().unwrap().is_none());
    assert_eq!(visualizer.display_hint(), None);
}

#[test]
fn test_adapter_over_vector()
{
    let registry = registry();
    let mut snapshot = Snapshot::new();
    let vector = sample::vector(&mut snapshot, &[1, 2]).unwrap();
    let adapter_type = "std::__1::stack<int, std::__1::vector<int, std::__1::allocator<int> > >";
    snapshot
        .types
        .insert_struct(adapter_type, StructLayout::new(24).field("c", 0, VECTOR_TYPE));

    let visualizer = registry.lookup(&snapshot.value(adapter_type, vector.address)).unwrap().unwrap();
    assert_eq!(
        visualizer.summary().unwrap(),
        format!("{adapter_type} wrapping: {VECTOR_TYPE} of length 2")
    );
    assert_eq!(elements(&visualizer), expected(&[1, 2]));
}
