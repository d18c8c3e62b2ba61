//! Synthesized libc++ containers.
//!
//! Each builder lays out one container in a [`Snapshot`] exactly as libc++
//! (64-bit, little-endian, `__1` ABI) would: the same member names, offsets and
//! bit packing. Builders register the layouts they need, allocate heap storage
//! for elements and return the container object.
//!
//! Elements are `int` throughout.

use crate::error::{Result, VisualizerError};
use crate::memory::handle::{ImageValue, Snapshot};
use crate::memory::layout::{StructLayout, TypeLayout, POINTER_SIZE};
use crate::types::Address;
use crate::visualizers::StringLayout;

/// `std::string`
pub const STRING_TYPE: &str = "std::__1::basic_string<char, std::__1::char_traits<char>, std::__1::allocator<char> >";
/// `std::vector<int>`
pub const VECTOR_TYPE: &str = "std::__1::vector<int, std::__1::allocator<int> >";
/// `std::list<int>`
pub const LIST_TYPE: &str = "std::__1::list<int, std::__1::allocator<int> >";
/// `std::deque<int>`
pub const DEQUE_TYPE: &str = "std::__1::deque<int, std::__1::allocator<int> >";
/// `std::stack<int>`
pub const STACK_TYPE: &str = "std::__1::stack<int, std::__1::deque<int, std::__1::allocator<int> > >";
/// `std::queue<int>`
pub const QUEUE_TYPE: &str = "std::__1::queue<int, std::__1::deque<int, std::__1::allocator<int> > >";

/// libc++ block size for `deque<int>`: 4096 bytes of 4-byte elements.
pub const INT_BLOCK_SIZE: u64 = 1024;

const INT_SIZE: u64 = 4;
const WORD: u64 = POINTER_SIZE as u64;

/// Largest block map a sample deque may allocate.
const MAX_SAMPLE_BLOCKS: u64 = 1 << 16;
/// Largest single deque block, in bytes.
const MAX_SAMPLE_BLOCK_BYTES: u64 = 1 << 20;

const LIST_NODE: &str = "std::__1::__list_node<int, void *>";
const LIST_NODE_BASE: &str = "std::__1::__list_node_base<int, void *>";
const LIST_SIZE_PAIR: &str =
    "std::__1::__compressed_pair<unsigned long, std::__1::allocator<std::__1::__list_node<int, void *> > >";
const DEQUE_MAP: &str = "std::__1::__split_buffer<int *, std::__1::allocator<int *> >";
const DEQUE_SIZE_PAIR: &str = "std::__1::__compressed_pair<unsigned long, std::__1::allocator<int> >";

/// A container object placed in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleObject
{
    /// Type name of the container
    pub type_name: String,
    /// Address of the container object
    pub address: Address,
}

impl SampleObject
{
    fn new(type_name: &str, address: Address) -> Self
    {
        Self {
            type_name: type_name.to_string(),
            address,
        }
    }

    /// Handle to the container inside `snapshot`.
    #[must_use]
    pub fn value<'a>(&self, snapshot: &'a Snapshot) -> ImageValue<'a>
    {
        snapshot.value(&self.type_name, self.address)
    }
}

fn at(base: Address, offset: u64) -> Address
{
    Address::new(base.value() + offset)
}

fn write_int(snapshot: &mut Snapshot, address: Address, value: i32) -> Result<()>
{
    snapshot
        .memory
        .write_uint(address, INT_SIZE as usize, u64::from(value as u32))
}

fn int_bytes(values: &[i32]) -> Vec<u8>
{
    values.iter().flat_map(|value| value.to_le_bytes()).collect()
}

fn register_string_types(snapshot: &mut Snapshot, layout: &StringLayout) -> Result<()>
{
    let inline = usize::try_from(layout.short_capacity + 1)
        .map_err(|_| VisualizerError::InvalidArgument("inline capacity out of range".to_string()))?;
    let array = format!("char[{inline}]");
    let long = format!("{STRING_TYPE}::__long");
    let short = format!("{STRING_TYPE}::__short");
    let rep = format!("{STRING_TYPE}::__rep");
    let pair = format!("std::__1::__compressed_pair<{rep}, std::__1::allocator<char> >");

    let types = &mut snapshot.types;
    let char_ptr = types.insert_pointer("char");
    types.insert(
        &array,
        TypeLayout::Array {
            element: "char".to_string(),
            count: inline,
        },
    );
    types.insert_struct(
        &long,
        StructLayout::new(24)
            .field("__cap_", 0, "unsigned long")
            .field("__size_", 8, "unsigned long")
            .field("__data_", 16, &char_ptr),
    );
    types.insert_struct(
        &short,
        StructLayout::new(24).field("__size_", 0, "unsigned char").field("__data_", 1, &array),
    );
    types.insert_struct(&rep, StructLayout::new(24).field("__l", 0, &long).field("__s", 0, &short));
    types.insert_struct(&pair, StructLayout::new(24).field("__first_", 0, &rep));
    types.insert_struct(STRING_TYPE, StructLayout::new(24).field("__r_", 0, &pair));
    Ok(())
}

/// Lay out a `std::string` holding `text`.
///
/// Text up to `layout.short_capacity` bytes is stored inline; longer text goes
/// to a heap buffer and the long-form size word is written so that
/// `stored + layout.long_size_bias == text.len()`.
///
/// ## Errors
///
/// `InvalidArgument` if a long text is shorter than the size bias.
pub fn string(snapshot: &mut Snapshot, text: &str, layout: &StringLayout) -> Result<SampleObject>
{
    register_string_types(snapshot, layout)?;

    let bytes = text.as_bytes();
    let len = bytes.len() as u64;
    let object = snapshot.memory.alloc_zeroed(24)?;

    if len <= layout.short_capacity {
        snapshot
            .memory
            .write_uint(object, 1, len << layout.short_size_shift)?;
        snapshot.memory.write(at(object, 1), bytes)?;
    } else {
        let stored = len.checked_sub(layout.long_size_bias).ok_or_else(|| {
            VisualizerError::InvalidArgument(format!("string of {len} bytes is shorter than the size bias"))
        })?;
        let mut heap = bytes.to_vec();
        heap.push(0);
        let capacity = (len + 1).next_multiple_of(16);
        let data = snapshot.memory.alloc(heap)?;

        snapshot
            .memory
            .write_uint(object, 8, capacity | layout.long_flag_mask)?;
        snapshot.memory.write_uint(at(object, 8), 8, stored)?;
        snapshot.memory.write_pointer(at(object, 16), data)?;
    }

    Ok(SampleObject::new(STRING_TYPE, object))
}

/// Lay out a `std::vector<int>`. An empty vector has null bounds.
///
/// ## Errors
///
/// Propagates image allocation failures.
pub fn vector(snapshot: &mut Snapshot, values: &[i32]) -> Result<SampleObject>
{
    let int_ptr = snapshot.types.insert_pointer("int");
    snapshot.types.insert_struct(
        VECTOR_TYPE,
        StructLayout::new(24)
            .field("__begin_", 0, &int_ptr)
            .field("__end_", 8, &int_ptr)
            .field("__end_cap_", 16, &int_ptr),
    );

    let object = snapshot.memory.alloc_zeroed(24)?;
    if !values.is_empty() {
        let begin = snapshot.memory.alloc(int_bytes(values))?;
        let end = at(begin, values.len() as u64 * INT_SIZE);
        snapshot.memory.write_pointer(object, begin)?;
        snapshot.memory.write_pointer(at(object, 8), end)?;
        snapshot.memory.write_pointer(at(object, 16), end)?;
    }

    Ok(SampleObject::new(VECTOR_TYPE, object))
}

/// Lay out a `std::list<int>` as a ring through the sentinel `__end_`.
///
/// ## Errors
///
/// Propagates image allocation failures.
pub fn list(snapshot: &mut Snapshot, values: &[i32]) -> Result<SampleObject>
{
    let types = &mut snapshot.types;
    let node_ptr = types.insert_pointer(LIST_NODE);
    types.insert_struct(
        LIST_NODE,
        StructLayout::new(24)
            .field("__prev_", 0, &node_ptr)
            .field("__next_", 8, &node_ptr)
            .field("__value_", 16, "int"),
    );
    types.insert_struct(
        LIST_NODE_BASE,
        StructLayout::new(16).field("__prev_", 0, &node_ptr).field("__next_", 8, &node_ptr),
    );
    types.insert_struct(LIST_SIZE_PAIR, StructLayout::new(8).field("__first_", 0, "unsigned long"));
    types.insert_struct(
        LIST_TYPE,
        StructLayout::new(24)
            .field("__end_", 0, LIST_NODE_BASE)
            .field("__size_alloc_", 16, LIST_SIZE_PAIR),
    );

    let object = snapshot.memory.alloc_zeroed(24)?;
    let mut ring = vec![object];
    for &value in values {
        let node = snapshot.memory.alloc_zeroed(24)?;
        write_int(snapshot, at(node, 16), value)?;
        ring.push(node);
    }

    for (index, &node) in ring.iter().enumerate() {
        let prev = ring[(index + ring.len() - 1) % ring.len()];
        let next = ring[(index + 1) % ring.len()];
        snapshot.memory.write_pointer(node, prev)?;
        snapshot.memory.write_pointer(at(node, 8), next)?;
    }
    snapshot
        .memory
        .write_uint(at(object, 16), 8, values.len() as u64)?;

    Ok(SampleObject::new(LIST_TYPE, object))
}

/// Struct layout of `std::deque<int>` with the given block size.
#[must_use]
pub fn deque_layout(block_size: u64) -> StructLayout
{
    StructLayout::new(48)
        .field("__map_", 0, DEQUE_MAP)
        .field("__start_", 32, "unsigned long")
        .field("__size_", 40, DEQUE_SIZE_PAIR)
        .constant("__block_size", "long", block_size)
}

fn register_deque_types(snapshot: &mut Snapshot, block_size: u64)
{
    let types = &mut snapshot.types;
    let int_ptr = types.insert_pointer("int");
    let block_ptr = types.insert_pointer(&int_ptr);
    types.insert_struct(
        DEQUE_MAP,
        StructLayout::new(32)
            .field("__first_", 0, &block_ptr)
            .field("__begin_", 8, &block_ptr)
            .field("__end_", 16, &block_ptr)
            .field("__end_cap_", 24, &block_ptr),
    );
    types.insert_struct(DEQUE_SIZE_PAIR, StructLayout::new(8).field("__first_", 0, "unsigned long"));
    types.insert_struct(DEQUE_TYPE, deque_layout(block_size));
}

/// Fill the deque header at `object` and allocate its block map.
///
/// The map keeps one spare slot in front of `__begin_`, as a deque that has
/// been pushed at the front would.
fn write_deque(snapshot: &mut Snapshot, object: Address, values: &[i32], block_size: u64, start: u64) -> Result<()>
{
    if block_size == 0 {
        return Err(VisualizerError::InvalidArgument("deque block size must be non-zero".to_string()));
    }
    let too_large = || {
        VisualizerError::InvalidArgument(format!("deque of block size {block_size} starting at {start} is too large"))
    };

    let len = values.len() as u64;
    let end = start.checked_add(len).ok_or_else(too_large)?;
    let blocks = if len == 0 { 0 } else { end.div_ceil(block_size) };
    if blocks > MAX_SAMPLE_BLOCKS {
        return Err(too_large());
    }
    let block_bytes = block_size
        .checked_mul(INT_SIZE)
        .filter(|&bytes| bytes <= MAX_SAMPLE_BLOCK_BYTES)
        .ok_or_else(too_large)?;
    let block_bytes = usize::try_from(block_bytes).map_err(|_| too_large())?;

    // Bounded above, so the map size and offsets below cannot overflow.
    let map_len = usize::try_from((blocks + 1) * WORD).map_err(|_| too_large())?;
    let map = snapshot.memory.alloc_zeroed(map_len)?;
    let map_begin = at(map, WORD);
    let map_end = at(map_begin, blocks * WORD);

    let mut block_addresses = Vec::new();
    for block in 0..blocks {
        let address = snapshot.memory.alloc_zeroed(block_bytes)?;
        snapshot.memory.write_pointer(at(map_begin, block * WORD), address)?;
        block_addresses.push(address);
    }

    for (absolute, &value) in (start..end).zip(values) {
        let block = usize::try_from(absolute / block_size)
            .ok()
            .and_then(|block| block_addresses.get(block))
            .copied()
            .ok_or_else(too_large)?;
        write_int(snapshot, at(block, (absolute % block_size) * INT_SIZE), value)?;
    }

    snapshot.memory.write_pointer(object, map)?;
    snapshot.memory.write_pointer(at(object, 8), map_begin)?;
    snapshot.memory.write_pointer(at(object, 16), map_end)?;
    snapshot.memory.write_pointer(at(object, 24), map_end)?;
    snapshot.memory.write_uint(at(object, 32), 8, start)?;
    snapshot.memory.write_uint(at(object, 40), 8, len)?;
    Ok(())
}

/// Lay out a `std::deque<int>` whose first element sits at absolute position
/// `start` of a map with `block_size` elements per block.
///
/// The block size is recorded on the `deque<int>` type, so all deques in one
/// snapshot share the most recently used value.
///
/// ## Errors
///
/// `InvalidArgument` for a zero block size, or when `start`, `block_size` and
/// the element count need more map or block storage than a sample allows.
pub fn deque(snapshot: &mut Snapshot, values: &[i32], block_size: u64, start: u64) -> Result<SampleObject>
{
    register_deque_types(snapshot, block_size);
    let object = snapshot.memory.alloc_zeroed(48)?;
    write_deque(snapshot, object, values, block_size, start)?;
    Ok(SampleObject::new(DEQUE_TYPE, object))
}

fn adapter(snapshot: &mut Snapshot, type_name: &str, values: &[i32]) -> Result<SampleObject>
{
    register_deque_types(snapshot, INT_BLOCK_SIZE);
    snapshot
        .types
        .insert_struct(type_name, StructLayout::new(48).field("c", 0, DEQUE_TYPE));
    let object = snapshot.memory.alloc_zeroed(48)?;
    write_deque(snapshot, object, values, INT_BLOCK_SIZE, 0)?;
    Ok(SampleObject::new(type_name, object))
}

/// Lay out a `std::stack<int>` over its default `deque<int>` container.
///
/// ## Errors
///
/// Propagates image allocation failures.
pub fn stack(snapshot: &mut Snapshot, values: &[i32]) -> Result<SampleObject>
{
    adapter(snapshot, STACK_TYPE, values)
}

/// Lay out a `std::queue<int>` over its default `deque<int>` container.
///
/// ## Errors
///
/// Propagates image allocation failures.
pub fn queue(snapshot: &mut Snapshot, values: &[i32]) -> Result<SampleObject>
{
    adapter(snapshot, QUEUE_TYPE, values)
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::value::ValueHandle;

    #[test]
    fn test_short_string_bytes()
    {
        let mut snapshot = Snapshot::new();
        let object = string(&mut snapshot, "abc", &StringLayout::LIBCXX).unwrap();
        let raw = snapshot.memory.read(object.address, 5).unwrap();
        assert_eq!(raw, vec![3 << 1, b'a', b'b', b'c', 0]);
    }

    #[test]
    fn test_long_string_header()
    {
        let mut snapshot = Snapshot::new();
        let text = "a string that is too long for the inline buffer";
        let object = string(&mut snapshot, text, &StringLayout::LIBCXX).unwrap();
        let cap = snapshot.memory.read_uint(object.address, 8).unwrap();
        let size = snapshot.memory.read_uint(at(object.address, 8), 8).unwrap();
        assert_eq!(cap & 1, 1);
        assert_eq!(size + 1, text.len() as u64);
    }

    #[test]
    fn test_list_ring_closes_on_sentinel()
    {
        let mut snapshot = Snapshot::new();
        let object = list(&mut snapshot, &[1, 2]).unwrap();
        let value = object.value(&snapshot);
        let first = value.field_path(&["__end_", "__next_"]).unwrap();
        let second = first.dereference().unwrap().field("__next_").unwrap();
        let back = second.dereference().unwrap().field("__next_").unwrap();
        assert_eq!(back.as_u64().unwrap(), object.address.value());
    }

    #[test]
    fn test_deque_map_has_front_spare()
    {
        let mut snapshot = Snapshot::new();
        let object = deque(&mut snapshot, &[1, 2, 3], 2, 1).unwrap();
        let map = object.value(&snapshot).field("__map_").unwrap();
        let first = map.field("__first_").unwrap().as_u64().unwrap();
        let begin = map.field("__begin_").unwrap().as_u64().unwrap();
        let end = map.field("__end_").unwrap().as_u64().unwrap();
        assert_eq!(begin - first, WORD);
        assert_eq!((end - begin) / WORD, 2);
    }

    #[test]
    fn test_deque_rejects_zero_block_size()
    {
        let mut snapshot = Snapshot::new();
        assert!(deque(&mut snapshot, &[1], 0, 0).is_err());
    }

    #[test]
    fn test_deque_rejects_overflowing_start()
    {
        let mut snapshot = Snapshot::new();
        let result = deque(&mut snapshot, &[1, 2, 3], 4, u64::MAX);
        assert!(matches!(result, Err(VisualizerError::InvalidArgument(_))));
    }

    #[test]
    fn test_deque_rejects_overflowing_block_size()
    {
        let mut snapshot = Snapshot::new();
        let result = deque(&mut snapshot, &[1], u64::MAX / 2, 0);
        assert!(matches!(result, Err(VisualizerError::InvalidArgument(_))));
    }

    #[test]
    fn test_deque_rejects_oversized_map()
    {
        let mut snapshot = Snapshot::new();
        let result = deque(&mut snapshot, &[1], 1, 1_000_000_000_000);
        assert!(matches!(result, Err(VisualizerError::InvalidArgument(_))));

        // Far start with a block size that keeps the map small is still fine.
        let object = deque(&mut snapshot, &[7, 8], 1 << 16, 1 << 20).unwrap();
        let size = object.value(&snapshot).field("__size_").unwrap();
        assert_eq!(size.field("__first_").unwrap().as_u64().unwrap(), 2);
    }
}
