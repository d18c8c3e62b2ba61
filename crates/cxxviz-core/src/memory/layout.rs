//! Type layouts for the memory image.
//!
//! A [`TypeTable`] maps type names to their byte layout: scalars, pointers,
//! fixed arrays and structs with member offsets. Static members (constants
//! such as a deque's block size) are recorded on the struct layout and read
//! like fields.

use std::collections::HashMap;

use crate::error::{Result, VisualizerError};

/// Pointer width of the modelled target, in bytes.
pub const POINTER_SIZE: usize = 8;

/// Interpretation of a scalar's bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind
{
    /// Unsigned integer
    Unsigned,
    /// Two's complement signed integer
    Signed,
    /// Character (one byte)
    Char,
}

/// A named data member at a byte offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldLayout
{
    /// Member name
    pub name: String,
    /// Offset from the start of the enclosing struct
    pub offset: usize,
    /// Type name of the member
    pub type_name: String,
}

/// A static member with a known value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstantLayout
{
    /// Member name
    pub name: String,
    /// Type name of the member (a scalar)
    pub type_name: String,
    /// Value of the member
    pub value: u64,
}

/// Layout of a struct or union.
///
/// Union members simply share an offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructLayout
{
    /// Total size in bytes
    pub size: usize,
    /// Data members
    pub fields: Vec<FieldLayout>,
    /// Static members
    pub constants: Vec<ConstantLayout>,
}

impl StructLayout
{
    /// Start a struct layout of `size` bytes.
    #[must_use]
    pub fn new(size: usize) -> Self
    {
        Self {
            size,
            fields: Vec::new(),
            constants: Vec::new(),
        }
    }

    /// Add a data member.
    #[must_use]
    pub fn field(mut self, name: &str, offset: usize, type_name: &str) -> Self
    {
        self.fields.push(FieldLayout {
            name: name.to_string(),
            offset,
            type_name: type_name.to_string(),
        });
        self
    }

    /// Add a static member.
    #[must_use]
    pub fn constant(mut self, name: &str, type_name: &str, value: u64) -> Self
    {
        self.constants.push(ConstantLayout {
            name: name.to_string(),
            type_name: type_name.to_string(),
            value,
        });
        self
    }
}

/// Byte layout of one type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeLayout
{
    /// Integer or character of `size` bytes
    Scalar
    {
        /// Size in bytes (1 to 8)
        size: usize,
        /// How the bits are read
        kind: ScalarKind,
    },
    /// Pointer to `pointee`
    Pointer
    {
        /// Type name of the pointed-to value
        pointee: String,
    },
    /// Fixed-size array
    Array
    {
        /// Element type name
        element: String,
        /// Number of elements
        count: usize,
    },
    /// Struct or union
    Struct(StructLayout),
}

/// Type name to layout map.
#[derive(Debug, Clone, Default)]
pub struct TypeTable
{
    types: HashMap<String, TypeLayout>,
}

impl TypeTable
{
    /// Create a table holding the fundamental C++ types.
    #[must_use]
    pub fn new() -> Self
    {
        let mut table = Self::default();
        for (name, size, kind) in [
            ("char", 1, ScalarKind::Char),
            ("unsigned char", 1, ScalarKind::Unsigned),
            ("short", 2, ScalarKind::Signed),
            ("int", 4, ScalarKind::Signed),
            ("unsigned int", 4, ScalarKind::Unsigned),
            ("long", 8, ScalarKind::Signed),
            ("unsigned long", 8, ScalarKind::Unsigned),
        ] {
            table.insert(name, TypeLayout::Scalar { size, kind });
        }
        table
    }

    /// Add or replace a layout.
    pub fn insert(&mut self, name: &str, layout: TypeLayout) -> &mut Self
    {
        self.types.insert(name.to_string(), layout);
        self
    }

    /// Add a struct layout.
    pub fn insert_struct(&mut self, name: &str, layout: StructLayout) -> &mut Self
    {
        self.insert(name, TypeLayout::Struct(layout))
    }

    /// Add `{pointee} *` and return its name.
    pub fn insert_pointer(&mut self, pointee: &str) -> String
    {
        let name = pointer_name(pointee);
        self.insert(
            &name,
            TypeLayout::Pointer {
                pointee: pointee.to_string(),
            },
        );
        name
    }

    /// Layout of `name`.
    ///
    /// ## Errors
    ///
    /// `UnknownType` if the name is not in the table.
    pub fn get(&self, name: &str) -> Result<&TypeLayout>
    {
        self.types
            .get(name)
            .ok_or_else(|| VisualizerError::UnknownType(name.to_string()))
    }

    /// Size of `name` in bytes.
    ///
    /// ## Errors
    ///
    /// `UnknownType` for the type or an array element type.
    pub fn size_of(&self, name: &str) -> Result<usize>
    {
        match self.get(name)? {
            TypeLayout::Scalar { size, .. } => Ok(*size),
            TypeLayout::Pointer { .. } => Ok(POINTER_SIZE),
            TypeLayout::Array { element, count } => {
                let element = self.size_of(element)?;
                element.checked_mul(*count).ok_or_else(|| {
                    VisualizerError::LayoutViolation(format!("array `{name}` is larger than the address space"))
                })
            }
            TypeLayout::Struct(layout) => Ok(layout.size),
        }
    }

    /// Whether `name` has a layout.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool
    {
        self.types.contains_key(name)
    }
}

/// Spelling of a pointer type name, `T *`.
#[must_use]
pub fn pointer_name(pointee: &str) -> String
{
    if pointee.ends_with('*') {
        format!("{pointee}*")
    } else {
        format!("{pointee} *")
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_fundamental_sizes()
    {
        let table = TypeTable::new();
        assert_eq!(table.size_of("char").unwrap(), 1);
        assert_eq!(table.size_of("int").unwrap(), 4);
        assert_eq!(table.size_of("unsigned long").unwrap(), 8);
        assert!(matches!(table.size_of("float"), Err(VisualizerError::UnknownType(_))));
    }

    #[test]
    fn test_pointer_names_nest()
    {
        assert_eq!(pointer_name("int"), "int *");
        assert_eq!(pointer_name("int *"), "int **");
    }

    #[test]
    fn test_array_and_struct_sizes()
    {
        let mut table = TypeTable::new();
        table.insert(
            "char[23]",
            TypeLayout::Array {
                element: "char".to_string(),
                count: 23,
            },
        );
        table.insert_struct("pair", StructLayout::new(16).field("a", 0, "int").field("b", 8, "long"));
        let ptr = table.insert_pointer("pair");
        assert_eq!(table.size_of("char[23]").unwrap(), 23);
        assert_eq!(table.size_of("pair").unwrap(), 16);
        assert_eq!(table.size_of(&ptr).unwrap(), POINTER_SIZE);
    }
}
